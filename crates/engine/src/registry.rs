//! Codec registry
//!
//! The registry decides which codec handles a payload on save and which
//! codec produced a node on load.
//!
//! ## Resolution Order
//!
//! Codecs are grouped by priority. Buckets are consulted from the highest
//! priority down; inside a bucket, codecs are consulted in registration
//! order. The first match wins, so registration order is the tie-break
//! between codecs of equal priority that accept the same payload.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let registry = Arc::new(CodecRegistry::standard());
//! let codec = registry.resolve_by_value(&Payload::from(Value::Int(1)));
//! assert_eq!(codec.unwrap().tag(), "json");
//! ```
//!
//! The registry is immutable once built; share it through an `Arc`.

use crate::codec::{standard_codecs, ArrayListCodec, Codec};
use crate::config::VaultConfig;
use crate::payload::Payload;
use modelvault_core::{Error, Result, CHUNK_SIZE};
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

/// Immutable set of codecs ordered for resolution
pub struct CodecRegistry {
    /// Priority (descending) -> codecs in registration order
    buckets: BTreeMap<Reverse<i32>, Vec<Arc<dyn Codec>>>,
}

impl CodecRegistry {
    /// Build a registry from an explicit codec list.
    ///
    /// # Errors
    ///
    /// - `InvalidCodec` if a codec has an empty tag
    /// - `DuplicateCodecTag` if two codecs share a tag
    pub fn new(codecs: impl IntoIterator<Item = Arc<dyn Codec>>) -> Result<Self> {
        let codecs: Vec<Arc<dyn Codec>> = codecs.into_iter().collect();

        let mut seen = HashSet::new();
        for codec in &codecs {
            let tag = codec.descriptor().tag;
            if tag.trim().is_empty() {
                return Err(Error::InvalidCodec("codec tag must not be empty".to_string()));
            }
            if !seen.insert(tag) {
                return Err(Error::DuplicateCodecTag(tag.to_string()));
            }
        }

        Ok(Self::bucketize(codecs))
    }

    /// Registry of the five built-in codecs
    pub fn standard() -> Self {
        Self::bucketize(standard_codecs(CHUNK_SIZE))
    }

    /// Registry of the built-in codecs configured by `config`
    pub fn from_config(config: &VaultConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::bucketize(standard_codecs(config.chunk_size)))
    }

    fn bucketize(codecs: Vec<Arc<dyn Codec>>) -> Self {
        let mut buckets: BTreeMap<Reverse<i32>, Vec<Arc<dyn Codec>>> = BTreeMap::new();
        for codec in codecs {
            buckets
                .entry(Reverse(codec.descriptor().priority))
                .or_default()
                .push(codec);
        }
        CodecRegistry { buckets }
    }

    /// Codecs in resolution order
    pub fn codecs(&self) -> impl Iterator<Item = &Arc<dyn Codec>> {
        self.buckets.values().flatten()
    }

    /// First codec, in resolution order, that accepts `payload`
    pub fn resolve_by_value(&self, payload: &Payload) -> Option<Arc<dyn Codec>> {
        self.codecs().find(|c| c.accepts(payload)).cloned()
    }

    /// First codec, in resolution order, whose tag equals `tag`
    pub fn resolve_by_tag(&self, tag: &str) -> Option<Arc<dyn Codec>> {
        self.codecs().find(|c| c.tag() == tag).cloned()
    }

    /// The array-list codec, used by `save_weights`
    pub fn array_list_codec(&self) -> Result<Arc<dyn Codec>> {
        self.resolve_by_tag(ArrayListCodec::TAG)
            .ok_or_else(|| Error::UnknownCodecTag(ArrayListCodec::TAG.to_string()))
    }

    /// Tags in resolution order
    pub fn tags(&self) -> Vec<&'static str> {
        self.codecs().map(|c| c.tag()).collect()
    }

    /// Number of registered codecs
    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// True if no codec is registered
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("codec_count", &self.len())
            .field("tags", &self.tags())
            .finish()
    }
}
