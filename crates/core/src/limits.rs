//! Bounds for ordered payloads
//!
//! Streaming codecs store one child per element, named by a zero-padded
//! decimal index. The width is fixed by [`MAX_ROWS`] so that lexicographic
//! order of child names equals numeric order.
//!
//! These values are part of the persisted layout and cannot change without
//! breaking existing containers.

use crate::error::{Error, Result};

/// Maximum number of ordered children a payload may hold
pub const MAX_ROWS: u64 = 1_000_000_000;

/// Width of zero-padded child names (digit count of [`MAX_ROWS`])
pub const INDEX_WIDTH: usize = digit_count(MAX_ROWS);

/// Default and maximum byte-stream chunk size (32 KiB)
pub const CHUNK_SIZE: usize = 32 * 1024;

const fn digit_count(mut n: u64) -> usize {
    let mut digits = 1;
    while n >= 10 {
        n /= 10;
        digits += 1;
    }
    digits
}

/// Child name for the element at `index`
///
/// Fails with `CapacityExceeded` once `index` reaches [`MAX_ROWS`]; an empty
/// payload never reaches this check.
pub fn index_name(index: u64) -> Result<String> {
    if index >= MAX_ROWS {
        return Err(Error::CapacityExceeded { limit: MAX_ROWS });
    }
    Ok(format!("{:0width$}", index, width = INDEX_WIDTH))
}
