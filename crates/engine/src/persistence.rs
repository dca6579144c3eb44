//! Save and load orchestration
//!
//! [`PersistenceEngine`] ties the registry, the envelope and the container
//! store together:
//!
//! - **save**: resolve a codec, validate meta, open (or borrow) the target,
//!   require an empty node, stamp the envelope, encode.
//! - **load**: read the stored `codec_tag`, resolve the codec, decode.
//!
//! Targets are either a filesystem path, which the engine opens and always
//! closes before returning, or a [`Node`] owned by the caller, which the
//! engine never closes.
//!
//! ## Lazy payloads
//!
//! Codecs whose decoded values read from the container after `decode`
//! returns (`requires_open`) cannot be loaded from a path with a plain
//! [`PersistenceEngine::load`]: the container would be closed before the
//! caller consumed anything. Use [`PersistenceEngine::load_map`] or
//! [`PersistenceEngine::load_with`], which run caller code while the
//! container is open, or load from a node the caller keeps open.

use crate::codec::Codec;
use crate::config::VaultConfig;
use crate::envelope::{self, Envelope, Info, InfoField};
use crate::payload::{Decoded, Payload};
use crate::registry::CodecRegistry;
use modelvault_core::{Error, NdArray, Result, Value};
use modelvault_storage::{AttrValue, Container, ContainerOptions, Node, OpenMode};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Where a payload is saved to or loaded from
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    /// Container file; opened and closed by the engine
    Path(&'a Path),
    /// Node of a container owned by the caller
    Node(&'a Node),
}

impl<'a> From<&'a Path> for Target<'a> {
    fn from(p: &'a Path) -> Self {
        Target::Path(p)
    }
}

impl<'a> From<&'a PathBuf> for Target<'a> {
    fn from(p: &'a PathBuf) -> Self {
        Target::Path(p.as_path())
    }
}

impl<'a> From<&'a str> for Target<'a> {
    fn from(p: &'a str) -> Self {
        Target::Path(Path::new(p))
    }
}

impl<'a> From<&'a Node> for Target<'a> {
    fn from(n: &'a Node) -> Self {
        Target::Node(n)
    }
}

/// Options of a save
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    /// Caller metadata; must be a mapping when present
    pub meta: Option<Value>,
    /// Codec to use instead of value-based resolution
    pub codec: Option<Arc<dyn Codec>>,
    /// Replace an existing file instead of failing
    pub overwrite: bool,
}

impl SaveOptions {
    /// Default options: no meta, automatic codec, no overwrite
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach caller metadata
    pub fn meta(mut self, meta: impl Into<Value>) -> Self {
        self.meta = Some(meta.into());
        self
    }

    /// Force a codec
    pub fn codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Allow replacing an existing file
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

/// Save/load facade over a codec registry
#[derive(Debug, Clone)]
pub struct PersistenceEngine {
    registry: Arc<CodecRegistry>,
    config: VaultConfig,
}

impl Default for PersistenceEngine {
    fn default() -> Self {
        PersistenceEngine::new(Arc::new(CodecRegistry::standard()))
    }
}

impl PersistenceEngine {
    /// Engine with default configuration
    pub fn new(registry: Arc<CodecRegistry>) -> Self {
        Self::with_config(registry, VaultConfig::default())
    }

    /// Engine with explicit configuration
    pub fn with_config(registry: Arc<CodecRegistry>, config: VaultConfig) -> Self {
        PersistenceEngine { registry, config }
    }

    /// Engine over the built-in codecs, configured by `config`
    pub fn from_config(config: VaultConfig) -> Result<Self> {
        let registry = CodecRegistry::from_config(&config)?;
        Ok(Self::with_config(Arc::new(registry), config))
    }

    /// Registry used for resolution
    pub fn registry(&self) -> &Arc<CodecRegistry> {
        &self.registry
    }

    /// Active configuration
    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    // ========================================================================
    // Save
    // ========================================================================

    /// Save `payload` into `target`.
    ///
    /// # Errors
    ///
    /// - `NoCodec` if no codec accepts the payload
    /// - `InvalidMeta` if `options.meta` is not a mapping
    /// - `DestinationExists` if the path exists and `overwrite` is false
    /// - `DestinationNotEmpty` if the target node holds anything
    /// - any codec error; a failed encode may leave a partially written node
    pub fn save<'a>(
        &self,
        target: impl Into<Target<'a>>,
        payload: impl Into<Payload>,
        options: SaveOptions,
    ) -> Result<Target<'a>> {
        let target = target.into();
        let payload = payload.into();

        let codec = match options.codec {
            Some(codec) => codec,
            None => self
                .registry
                .resolve_by_value(&payload)
                .ok_or(Error::NoCodec {
                    kind: payload.kind(),
                })?,
        };
        debug!(target: "modelvault::engine", codec = codec.tag(), kind = payload.kind(), "Resolved codec");

        let meta = envelope::validate_meta(options.meta)?;

        match target {
            Target::Path(path) => {
                let carried = if options.overwrite {
                    Self::previous_created_at(path)
                } else {
                    None
                };
                let mode = if options.overwrite {
                    OpenMode::Truncate
                } else {
                    OpenMode::CreateExclusive
                };
                let container = Container::open_with(
                    path,
                    mode,
                    ContainerOptions {
                        track_order: codec.descriptor().ordered_children,
                        sync_on_close: self.config.sync_on_close,
                    },
                )?;

                let written = Self::write_into(&container.root(), codec.as_ref(), payload, &meta, carried);
                let closed = container.close();
                written.and(closed)?;

                info!(target: "modelvault::engine", path = %path.display(), codec = codec.tag(), "Saved");
            }
            Target::Node(node) => {
                if !node.is_open() {
                    return Err(Error::AlreadyClosed);
                }
                Self::write_into(node, codec.as_ref(), payload, &meta, None)?;
                debug!(target: "modelvault::engine", node = %node.path(), codec = codec.tag(), "Saved into node");
            }
        }

        Ok(target)
    }

    /// Save the contents of the file at `file_path` as a byte stream
    pub fn save_file<'a>(
        &self,
        target: impl Into<Target<'a>>,
        file_path: impl AsRef<Path>,
        options: SaveOptions,
    ) -> Result<Target<'a>> {
        let reader = BufReader::new(File::open(file_path.as_ref())?);
        self.save(target, Payload::stream(reader), options)
    }

    /// Save `arrays` through the array-list codec, whatever their shape
    pub fn save_weights<'a, I>(
        &self,
        target: impl Into<Target<'a>>,
        arrays: I,
        options: SaveOptions,
    ) -> Result<Target<'a>>
    where
        I: IntoIterator<Item = NdArray>,
        I::IntoIter: Send + 'static,
    {
        let options = SaveOptions {
            codec: Some(self.registry.array_list_codec()?),
            ..options
        };
        self.save(target, Payload::sequence(arrays), options)
    }

    fn write_into(
        node: &Node,
        codec: &dyn Codec,
        payload: Payload,
        meta: &BTreeMap<String, Value>,
        carried: Option<chrono::DateTime<chrono::Utc>>,
    ) -> Result<()> {
        if !node.is_empty()? {
            return Err(Error::DestinationNotEmpty { node: node.path() });
        }
        envelope::stamp(node, codec.tag(), meta, carried)?;
        codec.encode(node, payload)
    }

    /// `created_at` of the file about to be replaced, if readable
    fn previous_created_at(path: &Path) -> Option<chrono::DateTime<chrono::Utc>> {
        if !path.exists() {
            return None;
        }
        let read = Container::open(path, OpenMode::ReadOnly)
            .and_then(|container| envelope::created_at(&container.root()));
        match read {
            Ok(created_at) => created_at,
            Err(e) => {
                debug!(target: "modelvault::engine", path = %path.display(), error = %e, "Replacing unreadable container");
                None
            }
        }
    }

    // ========================================================================
    // Load
    // ========================================================================

    /// Codec that wrote `node`, by its stored `codec_tag`
    pub fn codec_for(&self, node: &Node) -> Result<Arc<dyn Codec>> {
        let tag = match node.require_attr(envelope::attrs::CODEC_TAG)? {
            AttrValue::Str(tag) => tag,
            other => {
                return Err(Error::Corruption(format!(
                    "codec_tag holds {} instead of text",
                    other.type_name()
                )))
            }
        };
        self.registry
            .resolve_by_tag(&tag)
            .ok_or(Error::UnknownCodecTag(tag))
    }

    /// Load the payload stored at `source`.
    ///
    /// # Errors
    ///
    /// - `UnknownCodecTag` if no registered codec wrote the node
    /// - `Usage` if `source` is a path and the codec decodes lazily
    pub fn load<'a>(&self, source: impl Into<Target<'a>>) -> Result<Decoded> {
        match source.into() {
            Target::Path(path) => {
                let container = Container::open(path, OpenMode::ReadOnly)?;
                let root = container.root();
                let codec = self.codec_for(&root)?;
                if codec.requires_open() {
                    return Err(Error::Usage(format!(
                        "codec '{}' reads lazily from an open container; \
                         use load_map or load_with, or load from an open node",
                        codec.tag()
                    )));
                }
                let decoded = codec.decode(&root)?;
                container.close()?;
                debug!(target: "modelvault::engine", path = %path.display(), codec = codec.tag(), "Loaded");
                Ok(decoded)
            }
            Target::Node(node) => self.codec_for(node)?.decode(node),
        }
    }

    /// Load and apply `transform` while the container is open.
    ///
    /// Works for every codec, including lazy ones, as long as `transform`
    /// consumes what it needs.
    pub fn load_map<'a, T>(
        &self,
        source: impl Into<Target<'a>>,
        transform: impl FnOnce(Decoded) -> Result<T>,
    ) -> Result<T> {
        self.with_node(source.into(), |node| {
            let decoded = self.codec_for(node)?.decode(node)?;
            transform(decoded)
        })
    }

    /// Open the container at `path` for the duration of `block`.
    ///
    /// `block` receives the decoded payload and the container root. The
    /// container is closed when `block` returns, errors or panics.
    pub fn load_with<T>(
        &self,
        path: impl AsRef<Path>,
        block: impl FnOnce(Decoded, &Node) -> Result<T>,
    ) -> Result<T> {
        let container = Container::open(path.as_ref(), OpenMode::ReadOnly)?;
        let root = container.root();
        let decoded = self.codec_for(&root)?.decode(&root)?;
        let out = block(decoded, &root)?;
        container.close()?;
        Ok(out)
    }

    /// Caller metadata stored at `source`
    pub fn load_meta<'a>(&self, source: impl Into<Target<'a>>) -> Result<BTreeMap<String, Value>> {
        self.with_node(source.into(), envelope::read_meta)
    }

    /// Selected envelope fields stored at `source`
    pub fn load_info<'a>(&self, source: impl Into<Target<'a>>, fields: &[InfoField]) -> Result<Info> {
        self.with_node(source.into(), |node| Envelope::info(node, fields))
    }

    /// Full typed envelope stored at `source`
    pub fn load_envelope<'a>(&self, source: impl Into<Target<'a>>) -> Result<Envelope> {
        self.with_node(source.into(), Envelope::read)
    }

    fn with_node<T>(&self, source: Target<'_>, f: impl FnOnce(&Node) -> Result<T>) -> Result<T> {
        match source {
            Target::Path(path) => {
                let container = Container::open(path, OpenMode::ReadOnly)?;
                let out = f(&container.root())?;
                container.close()?;
                Ok(out)
            }
            Target::Node(node) => f(node),
        }
    }
}
