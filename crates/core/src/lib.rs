//! Core types for modelvault
//!
//! This crate defines the foundational types used throughout the system:
//! - Value: Unified value enum for everything the engine persists
//! - NdArray: Dense numeric arrays
//! - Error: Error type hierarchy
//! - Limits: Ordered-payload bounds and child naming

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod limits;
pub mod ndarray;
pub mod value;

pub use error::{Error, Result};
pub use limits::{index_name, CHUNK_SIZE, INDEX_WIDTH, MAX_ROWS};
pub use ndarray::{ArrayData, Dtype, Element, NdArray};
pub use value::Value;
