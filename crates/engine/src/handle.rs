//! Path handles over the persistence engine
//!
//! - [`ModelFile`]: one container file plus the engine that reads and
//!   writes it.
//! - [`TempModelFile`]: a `ModelFile` at a generated path inside an
//!   ephemeral directory, removed on drop.
//! - [`ModelStore`]: a directory of container files addressed by relative
//!   names that cannot escape the directory.
//! - [`TempModelStore`]: a `ModelStore` over an ephemeral directory.

use crate::config::{VaultConfig, CONFIG_FILE_NAME};
use crate::envelope::{Envelope, Info, InfoField};
use crate::names::NameAllocator;
use crate::payload::{Decoded, Payload};
use crate::persistence::{PersistenceEngine, SaveOptions};
use modelvault_core::{Error, NdArray, Result, Value};
use modelvault_storage::Node;
use std::collections::BTreeMap;
use std::ops::Deref;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::debug;

// ============================================================================
// ModelFile
// ============================================================================

/// A container file and the engine used to access it
#[derive(Debug, Clone)]
pub struct ModelFile {
    path: PathBuf,
    engine: Arc<PersistenceEngine>,
}

impl ModelFile {
    /// Handle for `path`; nothing is touched on disk
    pub fn new(path: impl Into<PathBuf>, engine: Arc<PersistenceEngine>) -> Self {
        ModelFile {
            path: path.into(),
            engine,
        }
    }

    /// Backing path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Engine used by this handle
    pub fn engine(&self) -> &Arc<PersistenceEngine> {
        &self.engine
    }

    /// True if the file exists
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Save `payload` to this file
    pub fn save(&self, payload: impl Into<Payload>, options: SaveOptions) -> Result<()> {
        self.engine.save(&self.path, payload, options).map(|_| ())
    }

    /// Save the contents of `file_path` as a byte stream
    pub fn save_file(&self, file_path: impl AsRef<Path>, options: SaveOptions) -> Result<()> {
        self.engine
            .save_file(&self.path, file_path, options)
            .map(|_| ())
    }

    /// Save arrays through the array-list codec
    pub fn save_weights<I>(&self, arrays: I, options: SaveOptions) -> Result<()>
    where
        I: IntoIterator<Item = NdArray>,
        I::IntoIter: Send + 'static,
    {
        self.engine
            .save_weights(&self.path, arrays, options)
            .map(|_| ())
    }

    /// Load an eagerly decoded payload
    pub fn load(&self) -> Result<Decoded> {
        self.engine.load(&self.path)
    }

    /// Load and transform while the file is open
    pub fn load_map<T>(&self, transform: impl FnOnce(Decoded) -> Result<T>) -> Result<T> {
        self.engine.load_map(&self.path, transform)
    }

    /// Run `block` with the decoded payload while the file is open
    pub fn load_with<T>(&self, block: impl FnOnce(Decoded, &Node) -> Result<T>) -> Result<T> {
        self.engine.load_with(&self.path, block)
    }

    /// Caller metadata
    pub fn load_meta(&self) -> Result<BTreeMap<String, Value>> {
        self.engine.load_meta(&self.path)
    }

    /// Selected envelope fields
    pub fn load_info(&self, fields: &[InfoField]) -> Result<Info> {
        self.engine.load_info(&self.path, fields)
    }

    /// Full typed envelope
    pub fn load_envelope(&self) -> Result<Envelope> {
        self.engine.load_envelope(&self.path)
    }
}

// ============================================================================
// TempModelFile
// ============================================================================

/// A [`ModelFile`] at a generated path, removed with its directory on drop
#[derive(Debug)]
pub struct TempModelFile {
    file: ModelFile,
    names: NameAllocator,
}

impl TempModelFile {
    /// Allocate a fresh path using the engine's configured file suffix
    pub fn new(engine: Arc<PersistenceEngine>) -> Result<Self> {
        let mut names = NameAllocator::ephemeral()?;
        let path = names.next(&engine.config().file_suffix)?;
        Ok(TempModelFile {
            file: ModelFile::new(path, engine),
            names,
        })
    }

    /// The wrapped handle
    pub fn file(&self) -> &ModelFile {
        &self.file
    }

    /// Remove the file and its directory
    pub fn close(self) -> Result<()> {
        self.names.close()
    }
}

impl Deref for TempModelFile {
    type Target = ModelFile;

    fn deref(&self) -> &ModelFile {
        &self.file
    }
}

// ============================================================================
// ModelStore
// ============================================================================

/// Directory of container files addressed by relative name
#[derive(Debug, Clone)]
pub struct ModelStore {
    root: PathBuf,
    engine: Arc<PersistenceEngine>,
}

impl ModelStore {
    /// Store over `root`, created if missing
    pub fn open(root: impl Into<PathBuf>, engine: Arc<PersistenceEngine>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(ModelStore { root, engine })
    }

    /// Store over `root` whose engine is configured by `root/modelvault.toml`.
    ///
    /// The config file is written with defaults when missing.
    pub fn open_configured(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        let config_path = root.join(CONFIG_FILE_NAME);
        VaultConfig::write_default_if_missing(&config_path)?;
        let engine = PersistenceEngine::from_config(VaultConfig::from_file(&config_path)?)?;
        debug!(target: "modelvault::store", root = %root.display(), "Opened configured store");
        Ok(ModelStore {
            root,
            engine: Arc::new(engine),
        })
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Engine used by this store
    pub fn engine(&self) -> &Arc<PersistenceEngine> {
        &self.engine
    }

    /// Resolve `name` under the root.
    ///
    /// # Errors
    ///
    /// `InvalidPath` if `name` is empty, absolute, or contains `.`/`..`
    /// components.
    pub fn join(&self, name: &str) -> Result<PathBuf> {
        let relative = Path::new(name);
        let escapes = name.is_empty()
            || relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_)));
        if escapes {
            return Err(Error::InvalidPath(format!(
                "'{}' is not a relative name inside the store",
                name
            )));
        }
        Ok(self.root.join(relative))
    }

    /// Handle for `name`
    pub fn file(&self, name: &str) -> Result<ModelFile> {
        Ok(ModelFile::new(self.join(name)?, Arc::clone(&self.engine)))
    }

    /// True if `name` exists
    pub fn contains(&self, name: &str) -> Result<bool> {
        Ok(self.join(name)?.is_file())
    }

    /// Save `payload` as `name`
    pub fn save(&self, name: &str, payload: impl Into<Payload>, options: SaveOptions) -> Result<()> {
        self.file(name)?.save(payload, options)
    }

    /// Save the contents of `file_path` as `name`
    pub fn save_file(&self, name: &str, file_path: impl AsRef<Path>, options: SaveOptions) -> Result<()> {
        self.file(name)?.save_file(file_path, options)
    }

    /// Save arrays as `name` through the array-list codec
    pub fn save_weights<I>(&self, name: &str, arrays: I, options: SaveOptions) -> Result<()>
    where
        I: IntoIterator<Item = NdArray>,
        I::IntoIter: Send + 'static,
    {
        self.file(name)?.save_weights(arrays, options)
    }

    /// Load `name`
    pub fn load(&self, name: &str) -> Result<Decoded> {
        self.file(name)?.load()
    }

    /// Load `name` and transform while it is open
    pub fn load_map<T>(&self, name: &str, transform: impl FnOnce(Decoded) -> Result<T>) -> Result<T> {
        self.file(name)?.load_map(transform)
    }

    /// Run `block` with `name` open
    pub fn load_with<T>(&self, name: &str, block: impl FnOnce(Decoded, &Node) -> Result<T>) -> Result<T> {
        self.file(name)?.load_with(block)
    }

    /// Caller metadata of `name`
    pub fn load_meta(&self, name: &str) -> Result<BTreeMap<String, Value>> {
        self.file(name)?.load_meta()
    }

    /// Selected envelope fields of `name`
    pub fn load_info(&self, name: &str, fields: &[InfoField]) -> Result<Info> {
        self.file(name)?.load_info(fields)
    }

    /// Delete `name`
    pub fn remove(&self, name: &str) -> Result<()> {
        std::fs::remove_file(self.join(name)?)?;
        Ok(())
    }

    /// Regular files in the root ordered by modification time, newest first
    /// when `descending`. The config file is not listed.
    pub fn list_by_updated_at(&self, descending: bool) -> Result<Vec<PathBuf>> {
        let mut entries: Vec<(SystemTime, PathBuf)> = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            let meta = entry.metadata()?;
            if !meta.is_file() || entry.file_name() == CONFIG_FILE_NAME {
                continue;
            }
            entries.push((meta.modified()?, entry.path()));
        }

        entries.sort();
        if descending {
            entries.reverse();
        }
        Ok(entries.into_iter().map(|(_, path)| path).collect())
    }
}

// ============================================================================
// TempModelStore
// ============================================================================

/// A [`ModelStore`] over an ephemeral directory, removed on drop
#[derive(Debug)]
pub struct TempModelStore {
    store: ModelStore,
    names: NameAllocator,
}

impl TempModelStore {
    /// Store over a fresh temporary directory
    pub fn new(engine: Arc<PersistenceEngine>) -> Result<Self> {
        let names = NameAllocator::ephemeral()?;
        let store = ModelStore::open(names.root(), engine)?;
        Ok(TempModelStore { store, names })
    }

    /// Handle for `name + suffix`, or for a generated name when `name` is
    /// `None`
    pub fn file(&mut self, name: Option<&str>, suffix: &str) -> Result<ModelFile> {
        let path = match name {
            Some(name) => self.store.join(&format!("{}{}", name, suffix))?,
            None => self.names.next(suffix)?,
        };
        Ok(ModelFile::new(path, Arc::clone(&self.store.engine)))
    }

    /// The wrapped store
    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    /// Remove the directory and everything in it
    pub fn close(self) -> Result<()> {
        self.names.close()
    }
}

impl Deref for TempModelStore {
    type Target = ModelStore;

    fn deref(&self) -> &ModelStore {
        &self.store
    }
}
