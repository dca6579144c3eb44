//! Collision-free path allocation
//!
//! A [`NameAllocator`] hands out paths under one root directory. Every path
//! it returns is new: it did not exist on disk when it was generated and the
//! allocator never returns it twice.
//!
//! The root is either an ephemeral directory created by the allocator and
//! removed when the allocator is closed or dropped, or a caller-owned
//! directory that is left untouched.

use modelvault_core::{Error, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;
use uuid::Uuid;

enum Root {
    Ephemeral(TempDir),
    Fixed(PathBuf),
}

impl Root {
    fn path(&self) -> &Path {
        match self {
            Root::Ephemeral(dir) => dir.path(),
            Root::Fixed(path) => path,
        }
    }
}

/// Generates unique paths under a root directory
pub struct NameAllocator {
    root: Root,
    published: HashSet<PathBuf>,
}

impl NameAllocator {
    /// Allocator over a fresh temporary directory
    pub fn ephemeral() -> Result<Self> {
        let dir = TempDir::new()?;
        debug!(target: "modelvault::names", root = %dir.path().display(), "Created ephemeral root");
        Ok(NameAllocator {
            root: Root::Ephemeral(dir),
            published: HashSet::new(),
        })
    }

    /// Allocator over an existing directory owned by the caller
    pub fn fixed_root(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(Error::InvalidPath(format!(
                "{} is not a directory",
                path.display()
            )));
        }
        Ok(NameAllocator {
            root: Root::Fixed(path.to_path_buf()),
            published: HashSet::new(),
        })
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// True if the root is removed on close
    pub fn is_ephemeral(&self) -> bool {
        matches!(self.root, Root::Ephemeral(_))
    }

    /// Generate a new path `root/<uuid><suffix>`.
    ///
    /// # Errors
    ///
    /// `InvalidPath` if `suffix` contains a path separator.
    pub fn next(&mut self, suffix: &str) -> Result<PathBuf> {
        if suffix.contains('/') || suffix.contains('\\') {
            return Err(Error::InvalidPath(format!(
                "name suffix must not contain a path separator: '{}'",
                suffix
            )));
        }

        let path = loop {
            let candidate = self
                .root
                .path()
                .join(format!("{}{}", Uuid::new_v4().simple(), suffix));
            if !self.is_taken(&candidate) {
                break candidate;
            }
        };

        self.published.insert(path.clone());
        debug!(target: "modelvault::names", path = %path.display(), "Allocated name");
        Ok(path)
    }

    /// True if `candidate` was handed out or any directory entry occupies it.
    ///
    /// Uses `symlink_metadata` so a dangling symlink counts as occupied.
    fn is_taken(&self, candidate: &Path) -> bool {
        self.published.contains(candidate) || std::fs::symlink_metadata(candidate).is_ok()
    }

    /// Unbounded sequence of new paths with `suffix`
    pub fn iter<'a>(&'a mut self, suffix: &'a str) -> Names<'a> {
        Names {
            allocator: self,
            suffix,
        }
    }

    /// Every path returned so far
    pub fn names(&self) -> impl Iterator<Item = &Path> {
        self.published.iter().map(PathBuf::as_path)
    }

    /// Number of paths returned so far
    pub fn len(&self) -> usize {
        self.published.len()
    }

    /// True if no path has been returned yet
    pub fn is_empty(&self) -> bool {
        self.published.is_empty()
    }

    /// Release the allocator, removing an ephemeral root and everything in it
    pub fn close(self) -> Result<()> {
        match self.root {
            Root::Ephemeral(dir) => {
                let path = dir.path().to_path_buf();
                dir.close()?;
                debug!(target: "modelvault::names", root = %path.display(), "Removed ephemeral root");
                Ok(())
            }
            Root::Fixed(_) => Ok(()),
        }
    }
}

impl std::fmt::Debug for NameAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NameAllocator")
            .field("root", &self.root())
            .field("ephemeral", &self.is_ephemeral())
            .field("published", &self.published.len())
            .finish()
    }
}

/// Iterator returned by [`NameAllocator::iter`]; never ends
pub struct Names<'a> {
    allocator: &'a mut NameAllocator,
    suffix: &'a str,
}

impl Iterator for Names<'_> {
    type Item = Result<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.allocator.next(self.suffix))
    }
}
