//! Numeric array codec

use super::{layout, Codec, CodecDescriptor};
use crate::payload::{Decoded, Payload};
use modelvault_core::{Error, Result, Value};
use modelvault_storage::{AttrValue, Node};

/// Stores one dense array as the `value` attribute.
#[derive(Debug, Clone, Copy, Default)]
pub struct NdArrayCodec;

impl NdArrayCodec {
    /// Codec tag
    pub const TAG: &'static str = "ndarray";
}

impl Codec for NdArrayCodec {
    fn descriptor(&self) -> CodecDescriptor {
        CodecDescriptor {
            tag: Self::TAG,
            priority: -50,
            ordered_children: false,
        }
    }

    fn accepts(&self, payload: &Payload) -> bool {
        matches!(payload, Payload::Value(Value::Array(_)))
    }

    fn encode(&self, node: &Node, payload: Payload) -> Result<()> {
        match payload {
            Payload::Value(Value::Array(array)) => node.set_attr(layout::VALUE, array),
            other => Err(Error::Encode {
                codec: Self::TAG,
                reason: format!("expected an array, got {}", other.kind()),
            }),
        }
    }

    fn decode(&self, node: &Node) -> Result<Decoded> {
        match node.require_attr(layout::VALUE)? {
            AttrValue::Array(array) => Ok(Decoded::Value(Value::Array(array))),
            other => Err(Error::Corruption(format!(
                "ndarray value attribute holds {}",
                other.type_name()
            ))),
        }
    }
}
