//! Persistence engine for modelvault
//!
//! This crate turns in-memory values into container files and back:
//! - CodecRegistry: priority-ordered codec resolution by value and by tag
//! - Codecs: container passthrough, JSON, arrays, chunked bytes, array lists
//! - PersistenceEngine: save/load with the metadata envelope
//! - LazyChunkCursor: restartable reads of chunked payloads
//! - NameAllocator: collision-free paths under an owned or borrowed root
//! - Handles: ModelFile and ModelStore wrappers over paths
//!
//! Containers themselves live in `modelvault-storage`; values and errors in
//! `modelvault-core`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod config;
pub mod cursor;
pub mod envelope;
pub mod handle;
pub mod names;
pub mod payload;
pub mod persistence;
pub mod registry;

pub use codec::{
    ArrayListCodec, BytesCodec, Codec, CodecDescriptor, ContainerCodec, JsonCodec, NdArrayCodec,
};
pub use config::{VaultConfig, CONFIG_FILE_NAME};
pub use cursor::{ChunkIter, LazyChunkCursor};
pub use envelope::{Envelope, Info, InfoField, APP_TAG};
pub use handle::{ModelFile, ModelStore, TempModelFile, TempModelStore};
pub use names::NameAllocator;
pub use payload::{Decoded, Payload};
pub use persistence::{PersistenceEngine, SaveOptions, Target};
pub use registry::CodecRegistry;

pub use modelvault_core::{Error, NdArray, Result, Value};
pub use modelvault_storage::{AttrValue, Container, ContainerOptions, Node, OpenMode};
