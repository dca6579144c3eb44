//! On-disk byte format for containers.
//!
//! Keeping serialization separate from operational logic (how containers are
//! opened and closed) makes format evolution easier to manage.
//!
//! # Module Structure
//!
//! - `container_file`: container file header, blob region, index and trailer

pub mod container_file;

pub use container_file::{
    CONTAINER_FORMAT_VERSION, CONTAINER_HEADER_SIZE, CONTAINER_MAGIC, CONTAINER_TRAILER_SIZE,
};
