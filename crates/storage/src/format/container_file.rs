//! Container file format
//!
//! A container file holds a blob region followed by the serialized node tree
//! that indexes it.
//!
//! # Format
//!
//! ```text
//! +------------------+
//! | Magic: "MVLT"    | 4 bytes
//! | Format Version   | 4 bytes (u32 LE)
//! | Blob Region      | variable (opaque attributes, arrays, datasets)
//! | Index            | variable (MessagePack node tree)
//! | Index Offset     | 8 bytes (u64 LE)
//! | Index Length     | 8 bytes (u64 LE)
//! | CRC32            | 4 bytes
//! +------------------+
//! ```
//!
//! The trailer CRC covers the header, the index, and the index offset and
//! length. Each blob carries its own CRC32 in the index and is verified when
//! it is read, so opening a file costs only the index.
//!
//! A writable container appends blobs to `<path>.tmp` while it is open.
//! Sealing appends the index and trailer, then renames the file over
//! `<path>` (write-fsync-rename).

use crate::blob::BlobStore;
use crate::tree::NodeData;
use modelvault_core::{Error, Result};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Container magic bytes: "MVLT" (0x4D564C54)
pub const CONTAINER_MAGIC: [u8; 4] = *b"MVLT";

/// Current container format version
pub const CONTAINER_FORMAT_VERSION: u32 = 2;

/// Header size: magic(4) + version(4)
pub const CONTAINER_HEADER_SIZE: usize = 8;

/// Trailer size: index_offset(8) + index_len(8) + crc(4)
pub const CONTAINER_TRAILER_SIZE: usize = 20;

fn header() -> [u8; CONTAINER_HEADER_SIZE] {
    let mut header = [0u8; CONTAINER_HEADER_SIZE];
    header[0..4].copy_from_slice(&CONTAINER_MAGIC);
    header[4..8].copy_from_slice(&CONTAINER_FORMAT_VERSION.to_le_bytes());
    header
}

fn index_crc(header: &[u8], index: &[u8], offset_and_len: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(header);
    hasher.update(index);
    hasher.update(offset_and_len);
    hasher.finalize()
}

fn trailer(index_offset: u64, index: &[u8]) -> [u8; CONTAINER_TRAILER_SIZE] {
    let mut trailer = [0u8; CONTAINER_TRAILER_SIZE];
    trailer[0..8].copy_from_slice(&index_offset.to_le_bytes());
    trailer[8..16].copy_from_slice(&(index.len() as u64).to_le_bytes());
    let crc = index_crc(&header(), index, &trailer[0..16]);
    trailer[16..20].copy_from_slice(&crc.to_le_bytes());
    trailer
}

/// Start the temporary file a writable container spills blobs into
pub(crate) fn create_spill(path: &Path) -> Result<BlobStore> {
    let temp_path = temp_path_for(path);
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)?;
    file.write_all(&header())?;

    Ok(BlobStore::Spill {
        file: Mutex::new(file),
        temp_path,
        end: CONTAINER_HEADER_SIZE as u64,
    })
}

/// Append the index and trailer to a spill file and move it over `path`.
///
/// On failure the temporary file is removed and `path` is left as it was.
pub(crate) fn seal(path: &Path, root: &NodeData, blobs: BlobStore, sync: bool) -> Result<()> {
    let (file, temp_path, end) = match blobs {
        BlobStore::Spill {
            file,
            temp_path,
            end,
        } => (file.into_inner(), temp_path, end),
        _ => return Err(Error::Usage("only a spill file can be sealed".to_string())),
    };

    let written = write_index(file, root, end, sync)
        .and_then(|()| std::fs::rename(&temp_path, path).map_err(Error::from));
    if let Err(e) = written {
        if let Err(cleanup) = std::fs::remove_file(&temp_path) {
            debug!(
                target: "modelvault::storage",
                path = %temp_path.display(),
                error = %cleanup,
                "Could not remove temporary container file"
            );
        }
        return Err(e);
    }

    if sync {
        if let Some(parent) = path.parent() {
            if parent.exists() && !parent.as_os_str().is_empty() {
                let dir = File::open(parent)?;
                dir.sync_all()?;
            }
        }
    }

    Ok(())
}

fn write_index(mut file: File, root: &NodeData, index_offset: u64, sync: bool) -> Result<()> {
    let index = rmp_serde::to_vec_named(root).map_err(|e| Error::Serialization(e.to_string()))?;

    file.seek(SeekFrom::Start(index_offset))?;
    file.write_all(&index)?;
    file.write_all(&trailer(index_offset, &index))?;
    if sync {
        file.sync_all()?;
    }
    Ok(())
}

/// Open and validate a container file.
///
/// Reads the header, trailer and index; blobs stay on disk.
pub(crate) fn open(path: &Path) -> Result<(NodeData, BlobStore)> {
    let mut file = File::open(path)?;
    let file_len = file.metadata()?.len();
    if file_len < (CONTAINER_HEADER_SIZE + CONTAINER_TRAILER_SIZE) as u64 {
        return Err(Error::Corruption("container file too short".to_string()));
    }

    let mut header = [0u8; CONTAINER_HEADER_SIZE];
    file.read_exact(&mut header)?;
    if header[0..4] != CONTAINER_MAGIC {
        return Err(Error::Corruption("invalid container magic".to_string()));
    }

    let mut trailer = [0u8; CONTAINER_TRAILER_SIZE];
    file.seek(SeekFrom::Start(file_len - CONTAINER_TRAILER_SIZE as u64))?;
    file.read_exact(&mut trailer)?;
    let index_offset = read_u64(&trailer[0..8]);
    let index_len = read_u64(&trailer[8..16]);
    let stored_crc = read_u32(&trailer[16..20]);

    // Checked: offset and length come from the file
    let index_end = index_offset
        .checked_add(index_len)
        .and_then(|end| end.checked_add(CONTAINER_TRAILER_SIZE as u64));
    if index_offset < CONTAINER_HEADER_SIZE as u64 || index_end != Some(file_len) {
        return Err(Error::Corruption(format!(
            "index at offset {} with length {} does not match file size {}",
            index_offset, index_len, file_len
        )));
    }
    let index_len = usize::try_from(index_len)
        .map_err(|_| Error::Corruption(format!("index length {} too large", index_len)))?;

    let mut index = vec![0u8; index_len];
    file.seek(SeekFrom::Start(index_offset))?;
    file.read_exact(&mut index)?;

    let computed_crc = index_crc(&header, &index, &trailer[0..16]);
    if stored_crc != computed_crc {
        return Err(Error::Corruption(format!(
            "checksum mismatch: expected {:08x}, computed {:08x}",
            stored_crc, computed_crc
        )));
    }

    let version = read_u32(&header[4..8]);
    if version != CONTAINER_FORMAT_VERSION {
        return Err(Error::Corruption(format!(
            "unsupported container format version {}",
            version
        )));
    }

    let root = rmp_serde::from_slice(&index)
        .map_err(|e| Error::Corruption(format!("invalid container index: {}", e)))?;

    Ok((
        root,
        BlobStore::Sealed {
            file: Mutex::new(file),
            end: index_offset,
        },
    ))
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[..4]);
    u32::from_le_bytes(buf)
}

fn read_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[..8]);
    u64::from_le_bytes(buf)
}

pub(crate) fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
