//! In-memory node tree backing an open container
//!
//! The tree is the container index: names, small attributes and the
//! locations of blobs. Opaque bytes, array attributes and datasets live in
//! the [`BlobStore`] unless the container has no file.

use crate::attr::AttrValue;
use crate::blob::{BlobRef, BlobStore};
use modelvault_core::{Error, NdArray, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stored form of one attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) enum AttrSlot {
    Inline(AttrValue),
    /// Raw bytes of an `Opaque` value
    Opaque(BlobRef),
    /// MessagePack of an `Array` value
    Array(BlobRef),
}

impl AttrSlot {
    pub(crate) fn store(value: AttrValue, blobs: &mut BlobStore) -> Result<Self> {
        if blobs.is_inline() {
            return Ok(AttrSlot::Inline(value));
        }
        match value {
            AttrValue::Opaque(bytes) => Ok(match blobs.append(&bytes)? {
                Some(blob) => AttrSlot::Opaque(blob),
                None => AttrSlot::Inline(AttrValue::Opaque(bytes)),
            }),
            AttrValue::Array(array) => Ok(match blobs.append(&encode_array(&array)?)? {
                Some(blob) => AttrSlot::Array(blob),
                None => AttrSlot::Inline(AttrValue::Array(array)),
            }),
            other => Ok(AttrSlot::Inline(other)),
        }
    }

    pub(crate) fn load(&self, blobs: &BlobStore) -> Result<AttrValue> {
        match self {
            AttrSlot::Inline(value) => Ok(value.clone()),
            AttrSlot::Opaque(blob) => Ok(AttrValue::Opaque(blobs.read(blob)?)),
            AttrSlot::Array(blob) => Ok(AttrValue::Array(decode_array(&blobs.read(blob)?)?)),
        }
    }
}

/// Stored form of a node dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) enum DataSlot {
    Inline(NdArray),
    Blob(BlobRef),
}

impl DataSlot {
    pub(crate) fn store(data: NdArray, blobs: &mut BlobStore) -> Result<Self> {
        if blobs.is_inline() {
            return Ok(DataSlot::Inline(data));
        }
        Ok(match blobs.append(&encode_array(&data)?)? {
            Some(blob) => DataSlot::Blob(blob),
            None => DataSlot::Inline(data),
        })
    }

    pub(crate) fn load(&self, blobs: &BlobStore) -> Result<NdArray> {
        match self {
            DataSlot::Inline(data) => Ok(data.clone()),
            DataSlot::Blob(blob) => decode_array(&blobs.read(blob)?),
        }
    }
}

fn encode_array(array: &NdArray) -> Result<Vec<u8>> {
    rmp_serde::to_vec_named(array).map_err(|e| Error::Serialization(e.to_string()))
}

fn decode_array(bytes: &[u8]) -> Result<NdArray> {
    rmp_serde::from_slice(bytes).map_err(|e| Error::Corruption(format!("invalid array blob: {}", e)))
}

/// One node: attributes, optional dataset, named children.
///
/// `order` records child insertion order; it is the enumeration order only
/// when `track_order` is set, otherwise children enumerate by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct NodeData {
    pub(crate) attrs: BTreeMap<String, AttrSlot>,
    pub(crate) children: BTreeMap<String, NodeData>,
    pub(crate) order: Vec<String>,
    pub(crate) data: Option<DataSlot>,
    pub(crate) track_order: bool,
}

impl NodeData {
    pub(crate) fn new(track_order: bool) -> Self {
        NodeData {
            track_order,
            ..NodeData::default()
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.attrs.is_empty() && self.children.is_empty() && self.data.is_none()
    }

    pub(crate) fn child_names(&self) -> Vec<String> {
        if self.track_order {
            self.order.clone()
        } else {
            self.children.keys().cloned().collect()
        }
    }

    /// Fails if `name` is invalid or taken
    pub(crate) fn check_new_child(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        if self.children.contains_key(name) {
            return Err(Error::InvalidPath(format!("child '{}' already exists", name)));
        }
        Ok(())
    }

    pub(crate) fn insert_child(&mut self, name: &str, child: NodeData) -> Result<()> {
        self.check_new_child(name)?;
        self.children.insert(name.to_string(), child);
        self.order.push(name.to_string());
        Ok(())
    }

    pub(crate) fn resolve(&self, path: &[String]) -> Option<&NodeData> {
        path.iter()
            .try_fold(self, |node, segment| node.children.get(segment))
    }

    pub(crate) fn resolve_mut(&mut self, path: &[String]) -> Option<&mut NodeData> {
        path.iter()
            .try_fold(self, |node, segment| node.children.get_mut(segment))
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains('/') || name == "." || name == ".." {
        return Err(Error::InvalidPath(format!("invalid child name '{}'", name)));
    }
    Ok(())
}
