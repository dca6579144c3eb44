//! Raw container passthrough codec

use super::{layout, Codec, CodecDescriptor};
use crate::payload::{Decoded, Payload};
use modelvault_core::{Error, Result};
use modelvault_storage::Node;

/// Deep-copies a container subtree under the child `value`.
///
/// Decoding returns a handle to that child, so the container must stay open
/// while it is used.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainerCodec;

impl ContainerCodec {
    /// Codec tag
    pub const TAG: &'static str = "container";
}

impl Codec for ContainerCodec {
    fn descriptor(&self) -> CodecDescriptor {
        CodecDescriptor {
            tag: Self::TAG,
            priority: 100,
            ordered_children: false,
        }
    }

    fn accepts(&self, payload: &Payload) -> bool {
        matches!(payload, Payload::Node(_))
    }

    fn encode(&self, node: &Node, payload: Payload) -> Result<()> {
        match payload {
            Payload::Node(source) => {
                node.copy_from(&source, layout::VALUE)?;
                Ok(())
            }
            other => Err(Error::Encode {
                codec: Self::TAG,
                reason: format!("expected a container node, got {}", other.kind()),
            }),
        }
    }

    fn decode(&self, node: &Node) -> Result<Decoded> {
        Ok(Decoded::Node(node.child(layout::VALUE)?))
    }

    fn requires_open(&self) -> bool {
        true
    }
}
