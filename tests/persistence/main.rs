//! Persistence engine integration tests
//!
//! End-to-end save/load through container files on disk.

#[path = "../common/mod.rs"]
mod common;

mod config;
mod dispatch;
mod envelope;
mod names;
mod round_trip;
mod store;
mod streaming;
