//! Scalar / JSON codec

use super::{layout, Codec, CodecDescriptor};
use crate::payload::{Decoded, Payload};
use modelvault_core::{Error, Result, Value};
use modelvault_storage::{AttrValue, Node};

/// Stores JSON-compatible values as compact JSON text in the `value`
/// attribute. Non-finite floats are rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl JsonCodec {
    /// Codec tag
    pub const TAG: &'static str = "json";
}

impl Codec for JsonCodec {
    fn descriptor(&self) -> CodecDescriptor {
        CodecDescriptor {
            tag: Self::TAG,
            priority: -50,
            ordered_children: false,
        }
    }

    fn accepts(&self, payload: &Payload) -> bool {
        matches!(payload, Payload::Value(v) if v.is_json_compatible())
    }

    fn encode(&self, node: &Node, payload: Payload) -> Result<()> {
        let value = match payload {
            Payload::Value(v) => v,
            other => {
                return Err(Error::Encode {
                    codec: Self::TAG,
                    reason: format!("expected a value, got {}", other.kind()),
                })
            }
        };
        let text = value.to_json_text().map_err(|e| Error::Encode {
            codec: Self::TAG,
            reason: e.to_string(),
        })?;
        node.set_attr(layout::VALUE, AttrValue::Str(text))
    }

    fn decode(&self, node: &Node) -> Result<Decoded> {
        match node.require_attr(layout::VALUE)? {
            AttrValue::Str(text) => Ok(Decoded::Value(Value::from_json_text(&text)?)),
            other => Err(Error::Corruption(format!(
                "json value attribute holds {}",
                other.type_name()
            ))),
        }
    }
}
