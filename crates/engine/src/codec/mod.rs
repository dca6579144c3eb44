//! Codec abstraction.
//!
//! A codec knows how to recognize one kind of payload, lay it out inside a
//! container node, and read it back. Codecs are selected by the
//! [`CodecRegistry`](crate::registry::CodecRegistry): by inspecting the
//! payload on save, and by the `codec_tag` attribute on load.
//!
//! # Built-in Codecs
//!
//! | Codec | Tag | Priority | Ordered children |
//! |-------|-----|----------|------------------|
//! | [`ContainerCodec`] | `container` | 100 | no |
//! | [`JsonCodec`] | `json` | -50 | no |
//! | [`NdArrayCodec`] | `ndarray` | -50 | no |
//! | [`BytesCodec`] | `bytes` | -50 | no |
//! | [`ArrayListCodec`] | `List[ndarray]` | -100 | yes |
//!
//! New payload kinds are added by implementing [`Codec`] and registering the
//! codec explicitly; there is no implicit discovery.

mod array_list;
mod bytes;
mod container;
mod json;
mod ndarray;

pub use array_list::ArrayListCodec;
pub use bytes::BytesCodec;
pub use container::ContainerCodec;
pub use json::JsonCodec;
pub use ndarray::NdArrayCodec;

use crate::payload::{Decoded, Payload};
use modelvault_core::Result;
use modelvault_storage::Node;
use std::sync::Arc;

/// Static identity of a codec
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecDescriptor {
    /// Unique name, stored in every node the codec writes
    pub tag: &'static str,
    /// Higher priorities are consulted first
    pub priority: i32,
    /// Containers written by this codec enumerate children in insertion order
    pub ordered_children: bool,
}

/// Encoder/decoder for one payload kind.
///
/// # Thread Safety
///
/// Codecs are shared through an `Arc` by the registry and must be
/// `Send + Sync`.
pub trait Codec: Send + Sync {
    /// Tag, priority and child ordering
    fn descriptor(&self) -> CodecDescriptor;

    /// True if this codec can encode `payload`
    fn accepts(&self, payload: &Payload) -> bool;

    /// Write `payload` into the (empty, already stamped) `node`
    fn encode(&self, node: &Node, payload: Payload) -> Result<()>;

    /// Reconstruct the payload stored under `node`
    fn decode(&self, node: &Node) -> Result<Decoded>;

    /// True if decoded values read from the container after `decode`
    /// returns, so the container must stay open while they are consumed.
    fn requires_open(&self) -> bool {
        false
    }

    /// Shorthand for `descriptor().tag`
    fn tag(&self) -> &'static str {
        self.descriptor().tag
    }
}

impl std::fmt::Debug for dyn Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let d = self.descriptor();
        f.debug_struct("Codec")
            .field("tag", &d.tag)
            .field("priority", &d.priority)
            .field("ordered_children", &d.ordered_children)
            .finish()
    }
}

/// The five built-in codecs, using `chunk_size` for byte streams
pub fn standard_codecs(chunk_size: usize) -> Vec<Arc<dyn Codec>> {
    vec![
        Arc::new(ContainerCodec),
        Arc::new(JsonCodec),
        Arc::new(NdArrayCodec),
        Arc::new(BytesCodec::new(chunk_size)),
        Arc::new(ArrayListCodec),
    ]
}

/// Attribute and child names of the persisted layout
pub mod layout {
    /// Child (container codec) or attribute (other codecs) holding the value
    pub const VALUE: &str = "value";
    /// Attribute recording the byte-stream chunk size
    pub const CHUNKSIZE: &str = "chunksize";
}
