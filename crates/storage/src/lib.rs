//! Hierarchical container store for modelvault
//!
//! This crate implements the container store the persistence engine writes
//! into:
//! - Container: a file-backed (or in-memory) tree with open modes
//!   `CreateExclusive`, `Truncate`, `ReadOnly`
//! - Node: path-addressed handle with attributes, an optional dataset and
//!   named children, enumerated in insertion or name order
//! - Deep copy of subtrees, across containers
//! - Closed-container detection from any node handle
//! - Atomic on-disk format with CRC32 validation; large values are stored
//!   out of line and read on demand

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod attr;
mod blob;
pub mod container;
pub mod format;
pub mod node;
mod tree;

pub use attr::AttrValue;
pub use container::{Container, ContainerOptions, OpenMode};
pub use node::Node;
