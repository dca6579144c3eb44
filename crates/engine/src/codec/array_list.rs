//! Ordered numeric-array list codec

use super::{Codec, CodecDescriptor};
use crate::cursor::LazyChunkCursor;
use crate::payload::{Decoded, Payload};
use modelvault_core::{index_name, Error, NdArray, Result, Value};
use modelvault_storage::Node;

/// Stores a sequence of arrays, one dataset child per element, in order.
///
/// Accepts any list or sequence; every element must be an array.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrayListCodec;

impl ArrayListCodec {
    /// Codec tag
    pub const TAG: &'static str = "List[ndarray]";

    fn write_all(node: &Node, items: impl Iterator<Item = Value>) -> Result<()> {
        for (index, item) in (0u64..).zip(items) {
            let name = index_name(index)?;
            match item {
                Value::Array(array) => {
                    node.create_dataset(&name, array)?;
                }
                other => {
                    return Err(Error::TypeMismatch {
                        index,
                        expected: "Array",
                        actual: other.type_name(),
                    })
                }
            }
        }
        Ok(())
    }
}

fn read_array(child: &Node) -> Result<NdArray> {
    child
        .data()?
        .ok_or_else(|| Error::Corruption(format!("element {} holds no array", child.path())))
}

impl Codec for ArrayListCodec {
    fn descriptor(&self) -> CodecDescriptor {
        CodecDescriptor {
            tag: Self::TAG,
            priority: -100,
            ordered_children: true,
        }
    }

    fn accepts(&self, payload: &Payload) -> bool {
        matches!(
            payload,
            Payload::Value(Value::List(_)) | Payload::Sequence(_)
        )
    }

    fn encode(&self, node: &Node, payload: Payload) -> Result<()> {
        match payload {
            Payload::Value(Value::List(items)) => Self::write_all(node, items.into_iter()),
            Payload::Sequence(items) => Self::write_all(node, items),
            other => Err(Error::Encode {
                codec: Self::TAG,
                reason: format!("expected a list or sequence, got {}", other.kind()),
            }),
        }
    }

    fn decode(&self, node: &Node) -> Result<Decoded> {
        Ok(Decoded::Arrays(LazyChunkCursor::new(node.clone(), read_array)))
    }

    fn requires_open(&self) -> bool {
        true
    }
}
