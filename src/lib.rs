//! modelvault - typed container serialization for model artifacts
//!
//! modelvault persists in-memory values (JSON-like structures, numeric
//! arrays, byte streams, lists of arrays, container subtrees) into
//! checksummed container files and reads them back losslessly. Each file
//! records which codec wrote it plus caller metadata and timestamps.
//!
//! # Quick Start
//!
//! ```ignore
//! use modelvault::{PersistenceEngine, SaveOptions, Value};
//!
//! let engine = PersistenceEngine::default();
//! engine.save("model.mvlt", Value::from("weights v1"), SaveOptions::new())?;
//! let value = engine.load("model.mvlt")?.into_value()?;
//! ```
//!
//! # Architecture
//!
//! - `modelvault-core`: values, arrays, errors, limits
//! - `modelvault-storage`: the container file and node tree
//! - `modelvault-engine`: codecs, registry, persistence, handles
//!
//! This crate re-exports the engine's public API.

pub use modelvault_engine::*;
