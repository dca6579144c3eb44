//! Container lifecycle
//!
//! A [`Container`] owns one node tree and its blob store. Read-only opens
//! load the tree (the index) and read blobs on demand. Create modes start
//! from an empty root and append blobs to a temporary file as they are
//! written; close seals that file and moves it into place. Every [`Node`]
//! handle shares the container state, so closing the container invalidates
//! all of them; later use fails with `Error::AlreadyClosed`.
//!
//! The container is the unique owner: dropping it closes it.

use crate::blob::BlobStore;
use crate::format::container_file;
use crate::node::Node;
use crate::tree::NodeData;
use modelvault_core::{Error, Result};
use parking_lot::RwLock;
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// How a container file is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Create a new file; fail if the path exists
    CreateExclusive,
    /// Create a new file, replacing any existing one
    Truncate,
    /// Open an existing file without write access
    ReadOnly,
}

impl OpenMode {
    /// True for modes that allow mutation
    pub fn is_writable(&self) -> bool {
        !matches!(self, OpenMode::ReadOnly)
    }
}

/// Options applied when a container is created or opened
#[derive(Debug, Clone, Copy)]
pub struct ContainerOptions {
    /// Enumerate children of new nodes in insertion order
    pub track_order: bool,
    /// fsync the file and its directory when the container is written back
    pub sync_on_close: bool,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        ContainerOptions {
            track_order: false,
            sync_on_close: true,
        }
    }
}

pub(crate) struct State {
    pub(crate) root: NodeData,
    pub(crate) blobs: BlobStore,
}

pub(crate) struct Shared {
    pub(crate) path: Option<PathBuf>,
    pub(crate) mode: OpenMode,
    pub(crate) sync_on_close: bool,
    /// `None` once closed
    pub(crate) state: RwLock<Option<State>>,
}

impl Shared {
    pub(crate) fn is_open(&self) -> bool {
        self.state.read().is_some()
    }
}

/// An open hierarchical container
pub struct Container {
    shared: Arc<Shared>,
}

impl Container {
    /// Open a container file with default options
    pub fn open(path: impl AsRef<Path>, mode: OpenMode) -> Result<Self> {
        Container::open_with(path, mode, ContainerOptions::default())
    }

    /// Open a container file
    ///
    /// # Errors
    ///
    /// - `DestinationExists` when `mode` is `CreateExclusive` and the path exists
    /// - `Io` when the file cannot be created or read
    /// - `Corruption` when a read-only open finds an invalid file
    pub fn open_with(path: impl AsRef<Path>, mode: OpenMode, options: ContainerOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let state = match mode {
            OpenMode::CreateExclusive => {
                // Claim the path now so a concurrent creator fails early
                match OpenOptions::new().write(true).create_new(true).open(&path) {
                    Ok(_) => {}
                    Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                        return Err(Error::DestinationExists { path });
                    }
                    Err(e) => return Err(e.into()),
                }
                let blobs = match container_file::create_spill(&path) {
                    Ok(blobs) => blobs,
                    Err(e) => {
                        // Release the claim
                        if let Err(cleanup) = std::fs::remove_file(&path) {
                            warn!(
                                target: "modelvault::storage",
                                path = %path.display(),
                                error = %cleanup,
                                "Failed to release claimed path"
                            );
                        }
                        return Err(e);
                    }
                };
                State {
                    root: NodeData::new(options.track_order),
                    blobs,
                }
            }
            OpenMode::Truncate => {
                OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(&path)?;
                State {
                    root: NodeData::new(options.track_order),
                    blobs: container_file::create_spill(&path)?,
                }
            }
            OpenMode::ReadOnly => {
                let (root, blobs) = container_file::open(&path)?;
                State { root, blobs }
            }
        };

        debug!(target: "modelvault::storage", path = %path.display(), ?mode, "Opened container");

        Ok(Container {
            shared: Arc::new(Shared {
                path: Some(path),
                mode,
                sync_on_close: options.sync_on_close,
                state: RwLock::new(Some(state)),
            }),
        })
    }

    /// Create a writable container with no backing file
    pub fn in_memory() -> Self {
        Container::in_memory_with(ContainerOptions::default())
    }

    /// Create a writable container with no backing file
    pub fn in_memory_with(options: ContainerOptions) -> Self {
        Container {
            shared: Arc::new(Shared {
                path: None,
                mode: OpenMode::Truncate,
                sync_on_close: false,
                state: RwLock::new(Some(State {
                    root: NodeData::new(options.track_order),
                    blobs: BlobStore::Memory,
                })),
            }),
        }
    }

    /// Handle to the root node
    pub fn root(&self) -> Node {
        Node::root(Arc::clone(&self.shared))
    }

    /// Backing file, if any
    pub fn path(&self) -> Option<&Path> {
        self.shared.path.as_deref()
    }

    /// Mode the container was opened with
    pub fn mode(&self) -> OpenMode {
        self.shared.mode
    }

    /// True until [`Container::close`] runs
    pub fn is_open(&self) -> bool {
        self.shared.is_open()
    }

    /// Close the container, sealing writable file-backed containers to disk.
    ///
    /// Idempotent. All node handles observe the container as closed
    /// afterwards, even if sealing fails.
    pub fn close(&self) -> Result<()> {
        let state = match self.shared.state.write().take() {
            Some(state) => state,
            None => return Ok(()),
        };

        if let (Some(path), true) = (&self.shared.path, self.shared.mode.is_writable()) {
            container_file::seal(path, &state.root, state.blobs, self.shared.sync_on_close)?;
            debug!(target: "modelvault::storage", path = %path.display(), "Container written and closed");
        }

        Ok(())
    }
}

impl Drop for Container {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(
                target: "modelvault::storage",
                path = ?self.shared.path,
                error = %e,
                "Failed to write container on drop"
            );
        }
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("path", &self.shared.path)
            .field("mode", &self.shared.mode)
            .field("open", &self.is_open())
            .finish()
    }
}
