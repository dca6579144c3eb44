//! Error types for modelvault
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! # Categories
//!
//! | Category | Variants | Description |
//! |----------|----------|-------------|
//! | Resolution | `NoCodec`, `UnknownCodecTag` | No codec handles a value or a stored tag |
//! | Precondition | `DestinationExists`, `DestinationNotEmpty`, `InvalidMeta`, `TypeMismatch` | Caller input rejected before or during encode |
//! | Usage | `Usage` | Lazy payload requested without keeping its container open |
//! | Resource | `AlreadyClosed`, `ReadOnly` | Handle used against a closed or read-only container |
//! | Encoding | `Encode`, `Serialization` | Value failed type-specific serialization |
//! | Capacity | `CapacityExceeded` | Too many ordered children |
//! | Registry | `InvalidCodec`, `DuplicateCodecTag` | Registry construction rejected a codec |
//! | System | `Io`, `Corruption`, `NotFound`, `InvalidPath`, `InvalidConfig` | Store and filesystem failures |

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for modelvault operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for modelvault
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (file operations, directory management)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization/deserialization error of stored structures
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Container file failed validation
    #[error("Data corruption: {0}")]
    Corruption(String),

    /// No registered codec accepts the value
    #[error("no codec accepts value of kind {kind}")]
    NoCodec {
        /// Kind of the rejected value
        kind: &'static str,
    },

    /// No registered codec carries the stored tag
    #[error("no codec registered for tag '{0}'")]
    UnknownCodecTag(String),

    /// Two codecs share a tag
    #[error("duplicate codec tag '{0}'")]
    DuplicateCodecTag(String),

    /// Codec descriptor failed validation
    #[error("invalid codec: {0}")]
    InvalidCodec(String),

    /// Exclusive create against an existing path
    #[error("destination {} already exists; pass overwrite = true to replace it", path.display())]
    DestinationExists {
        /// Existing path
        path: PathBuf,
    },

    /// Target node already holds attributes, children or data
    #[error("destination node '{node}' is not empty")]
    DestinationNotEmpty {
        /// Path of the node inside its container
        node: String,
    },

    /// Meta was supplied but is not a mapping
    #[error("meta must be a mapping, got {actual}")]
    InvalidMeta {
        /// Kind of the supplied value
        actual: &'static str,
    },

    /// Element of an ordered payload has the wrong kind
    #[error("type mismatch at element {index}: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Position of the offending element
        index: u64,
        /// Expected kind
        expected: &'static str,
        /// Actual kind
        actual: &'static str,
    },

    /// API misuse detected at call time
    #[error("usage error: {0}")]
    Usage(String),

    /// Node handle used after its container was closed
    #[error("container is already closed")]
    AlreadyClosed,

    /// Write attempted on a read-only container
    #[error("container {} is opened read-only", path.display())]
    ReadOnly {
        /// Backing file
        path: PathBuf,
    },

    /// Codec failed to serialize a value
    #[error("{codec} encode failed: {reason}")]
    Encode {
        /// Tag of the failing codec
        codec: &'static str,
        /// Underlying failure
        reason: String,
    },

    /// Ordered payload exceeds the child limit
    #[error("payload exceeds {limit} ordered children")]
    CapacityExceeded {
        /// Maximum number of children
        limit: u64,
    },

    /// Attribute or child missing from a node
    #[error("not found: {0}")]
    NotFound(String),

    /// Path rejected by a store or allocator
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Configuration rejected
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Short name of the error category
    pub fn category(&self) -> &'static str {
        match self {
            Error::NoCodec { .. } | Error::UnknownCodecTag(_) => "resolution",
            Error::DestinationExists { .. }
            | Error::DestinationNotEmpty { .. }
            | Error::InvalidMeta { .. }
            | Error::TypeMismatch { .. } => "precondition",
            Error::Usage(_) => "usage",
            Error::AlreadyClosed | Error::ReadOnly { .. } => "resource",
            Error::Encode { .. } | Error::Serialization(_) => "encoding",
            Error::CapacityExceeded { .. } => "capacity",
            Error::InvalidCodec(_) | Error::DuplicateCodecTag(_) => "registry",
            Error::Io(_)
            | Error::Corruption(_)
            | Error::NotFound(_)
            | Error::InvalidPath(_)
            | Error::InvalidConfig(_) => "system",
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
