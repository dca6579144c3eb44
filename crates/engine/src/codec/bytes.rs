//! Chunked byte-stream codec
//!
//! Bytes are split into fixed-size chunks, one child per chunk, named by a
//! zero-padded index. Each child carries its chunk as an opaque `value`
//! attribute; the chunk size is recorded in the `chunksize` attribute of the
//! payload node.

use super::{layout, Codec, CodecDescriptor};
use crate::cursor::LazyChunkCursor;
use crate::payload::{Decoded, Payload};
use modelvault_core::{index_name, Error, Result, Value, CHUNK_SIZE};
use modelvault_storage::{AttrValue, Node};
use std::io::Read;
use tracing::debug;

/// Stores byte buffers and byte streams as ordered chunks.
#[derive(Debug, Clone, Copy)]
pub struct BytesCodec {
    chunk_size: usize,
}

impl BytesCodec {
    /// Codec tag
    pub const TAG: &'static str = "bytes";

    /// Codec writing chunks of at most `chunk_size` bytes (clamped to 1..=32768)
    pub fn new(chunk_size: usize) -> Self {
        BytesCodec {
            chunk_size: chunk_size.clamp(1, CHUNK_SIZE),
        }
    }

    /// Chunk size used on encode
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn write_chunk(node: &Node, index: u64, chunk: Vec<u8>) -> Result<()> {
        let child = node.create_child(&index_name(index)?)?;
        child.set_attr(layout::VALUE, AttrValue::Opaque(chunk))
    }

    fn write_slice(&self, node: &Node, bytes: &[u8]) -> Result<u64> {
        let mut count = 0;
        for chunk in bytes.chunks(self.chunk_size) {
            Self::write_chunk(node, count, chunk.to_vec())?;
            count += 1;
        }
        Ok(count)
    }

    fn write_stream(&self, node: &Node, reader: &mut dyn Read) -> Result<u64> {
        let mut count = 0;
        loop {
            let mut chunk = Vec::with_capacity(self.chunk_size);
            (&mut *reader)
                .take(self.chunk_size as u64)
                .read_to_end(&mut chunk)?;
            if chunk.is_empty() {
                break;
            }
            Self::write_chunk(node, count, chunk)?;
            count += 1;
        }
        Ok(count)
    }
}

impl Default for BytesCodec {
    fn default() -> Self {
        BytesCodec::new(CHUNK_SIZE)
    }
}

fn read_chunk(child: &Node) -> Result<Vec<u8>> {
    match child.require_attr(layout::VALUE)? {
        AttrValue::Opaque(bytes) => Ok(bytes),
        other => Err(Error::Corruption(format!(
            "chunk {} holds {} instead of bytes",
            child.path(),
            other.type_name()
        ))),
    }
}

impl Codec for BytesCodec {
    fn descriptor(&self) -> CodecDescriptor {
        CodecDescriptor {
            tag: Self::TAG,
            priority: -50,
            ordered_children: false,
        }
    }

    fn accepts(&self, payload: &Payload) -> bool {
        matches!(payload, Payload::Value(Value::Bytes(_)) | Payload::Stream(_))
    }

    fn encode(&self, node: &Node, payload: Payload) -> Result<()> {
        node.set_attr(layout::CHUNKSIZE, self.chunk_size as i64)?;
        let chunks = match payload {
            Payload::Value(Value::Bytes(bytes)) => self.write_slice(node, &bytes)?,
            Payload::Stream(mut reader) => self.write_stream(node, &mut *reader)?,
            other => {
                return Err(Error::Encode {
                    codec: Self::TAG,
                    reason: format!("expected bytes or a byte stream, got {}", other.kind()),
                })
            }
        };
        debug!(target: "modelvault::codec", node = %node.path(), chunks, chunk_size = self.chunk_size, "Wrote byte chunks");
        Ok(())
    }

    fn decode(&self, node: &Node) -> Result<Decoded> {
        Ok(Decoded::Chunks(LazyChunkCursor::new(node.clone(), read_chunk)))
    }

    fn requires_open(&self) -> bool {
        true
    }
}
