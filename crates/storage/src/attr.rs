//! Attribute values stored on container nodes

use modelvault_core::NdArray;
use serde::{Deserialize, Serialize};

/// Value of one node attribute
///
/// Attributes hold primitives, text, opaque byte blobs (single-byte-element
/// layout) or whole numeric arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    /// UTF-8 text
    Str(String),
    /// Signed integer
    Int(i64),
    /// Float
    Float(f64),
    /// Opaque bytes
    Opaque(Vec<u8>),
    /// Numeric array
    Array(NdArray),
}

impl AttrValue {
    /// Kind name, for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            AttrValue::Str(_) => "Str",
            AttrValue::Int(_) => "Int",
            AttrValue::Float(_) => "Float",
            AttrValue::Opaque(_) => "Opaque",
            AttrValue::Array(_) => "Array",
        }
    }

    /// Get as &str if this is text
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get as i64 if this is an integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as bytes if this is an opaque blob
    pub fn as_opaque(&self) -> Option<&[u8]> {
        match self {
            AttrValue::Opaque(b) => Some(b),
            _ => None,
        }
    }

    /// Get as &NdArray if this is an array
    pub fn as_array(&self) -> Option<&NdArray> {
        match self {
            AttrValue::Array(a) => Some(a),
            _ => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Str(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Str(s)
    }
}

impl From<i64> for AttrValue {
    fn from(i: i64) -> Self {
        AttrValue::Int(i)
    }
}

impl From<f64> for AttrValue {
    fn from(f: f64) -> Self {
        AttrValue::Float(f)
    }
}

impl From<NdArray> for AttrValue {
    fn from(a: NdArray) -> Self {
        AttrValue::Array(a)
    }
}
