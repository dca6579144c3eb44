//! Out-of-line storage for large values
//!
//! Opaque attributes, array attributes and datasets of file-backed
//! containers are not kept in the node tree. They are appended to the
//! container's blob region as they are written, and the tree records a
//! [`BlobRef`]. Reads fetch one blob at a time, so a container never holds
//! more than the value being accessed.
//!
//! In-memory containers have no file; their values stay inline in the tree.

use crate::format::container_file::CONTAINER_HEADER_SIZE;
use modelvault_core::{Error, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

/// Location of one blob in the container file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct BlobRef {
    pub(crate) offset: u64,
    pub(crate) len: u64,
    /// CRC32 of the blob bytes
    pub(crate) crc: u32,
}

#[derive(Debug)]
pub(crate) enum BlobStore {
    /// No backing file; values stay inline
    Memory,
    /// Temporary file of a writable container, sealed and renamed on close
    Spill {
        file: Mutex<File>,
        temp_path: PathBuf,
        /// End of the blob region (next append offset)
        end: u64,
    },
    /// Blob region of an existing container file
    Sealed { file: Mutex<File>, end: u64 },
}

impl BlobStore {
    /// True if values are kept in the tree rather than appended
    pub(crate) fn is_inline(&self) -> bool {
        matches!(self, BlobStore::Memory)
    }

    /// Append `bytes`, returning their location.
    ///
    /// `None` means the store keeps values inline.
    pub(crate) fn append(&mut self, bytes: &[u8]) -> Result<Option<BlobRef>> {
        match self {
            BlobStore::Memory => Ok(None),
            BlobStore::Spill { file, end, .. } => {
                let file = file.get_mut();
                // Reads move the cursor; appends always go to the region end
                file.seek(SeekFrom::Start(*end))?;
                file.write_all(bytes)?;
                let blob = BlobRef {
                    offset: *end,
                    len: bytes.len() as u64,
                    crc: crc32fast::hash(bytes),
                };
                *end += blob.len;
                Ok(Some(blob))
            }
            BlobStore::Sealed { .. } => Err(Error::Usage(
                "cannot append to a sealed container file".to_string(),
            )),
        }
    }

    /// Read and verify one blob
    pub(crate) fn read(&self, blob: &BlobRef) -> Result<Vec<u8>> {
        let (file, end) = match self {
            BlobStore::Memory => {
                return Err(Error::Corruption(
                    "blob reference in a container without a file".to_string(),
                ))
            }
            BlobStore::Spill { file, end, .. } | BlobStore::Sealed { file, end } => (file, *end),
        };

        let within = blob.offset >= CONTAINER_HEADER_SIZE as u64
            && blob.offset.checked_add(blob.len).is_some_and(|stop| stop <= end);
        if !within {
            return Err(Error::Corruption(format!(
                "blob at offset {} with length {} lies outside the blob region",
                blob.offset, blob.len
            )));
        }
        let len = usize::try_from(blob.len)
            .map_err(|_| Error::Corruption(format!("blob length {} too large", blob.len)))?;

        let mut bytes = vec![0u8; len];
        {
            let mut file = file.lock();
            file.seek(SeekFrom::Start(blob.offset))?;
            file.read_exact(&mut bytes)?;
        }

        let computed = crc32fast::hash(&bytes);
        if computed != blob.crc {
            return Err(Error::Corruption(format!(
                "blob checksum mismatch at offset {}: expected {:08x}, computed {:08x}",
                blob.offset, blob.crc, computed
            )));
        }
        Ok(bytes)
    }
}
