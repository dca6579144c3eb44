//! Restartable lazy cursor over a node's ordered children
//!
//! Streaming codecs decode to a [`LazyChunkCursor`] instead of reading every
//! child up front. Nothing is cached: each call to [`LazyChunkCursor::iter`]
//! checks that the container is still open and starts a fresh traversal that
//! re-reads child names and contents. Once the container closes, every
//! traversal attempt fails with `Error::AlreadyClosed`, not only the first.

use modelvault_core::{Error, Result};
use modelvault_storage::Node;

/// Reads one element from one child node
pub type ChildReader<T> = fn(&Node) -> Result<T>;

/// Lazy, restartable sequence over the children of a node
pub struct LazyChunkCursor<T> {
    node: Node,
    read: ChildReader<T>,
}

impl<T> LazyChunkCursor<T> {
    /// Cursor over the children of `node`, each decoded by `read`
    pub fn new(node: Node, read: ChildReader<T>) -> Self {
        LazyChunkCursor { node, read }
    }

    /// Node whose children are traversed
    pub fn node(&self) -> &Node {
        &self.node
    }

    /// True while the backing container is open
    pub fn is_open(&self) -> bool {
        self.node.is_open()
    }

    /// Start an independent traversal from the first child.
    ///
    /// # Errors
    ///
    /// `AlreadyClosed` if the backing container has been closed.
    pub fn iter(&self) -> Result<ChunkIter<T>> {
        if !self.node.is_open() {
            return Err(Error::AlreadyClosed);
        }
        let names = self.node.child_names()?;
        Ok(ChunkIter {
            node: self.node.clone(),
            names: names.into_iter(),
            read: self.read,
        })
    }

    /// Number of children
    pub fn len(&self) -> Result<usize> {
        self.node.len()
    }

    /// True if there are no children
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Run one full traversal and collect every element
    pub fn collect_all(&self) -> Result<Vec<T>> {
        self.iter()?.collect()
    }
}

impl LazyChunkCursor<Vec<u8>> {
    /// Run one full traversal and concatenate the chunks
    pub fn read_to_vec(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        for chunk in self.iter()? {
            out.extend_from_slice(&chunk?);
        }
        Ok(out)
    }
}

impl<T> Clone for LazyChunkCursor<T> {
    fn clone(&self) -> Self {
        LazyChunkCursor {
            node: self.node.clone(),
            read: self.read,
        }
    }
}

impl<T> std::fmt::Debug for LazyChunkCursor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyChunkCursor")
            .field("node", &self.node)
            .finish()
    }
}

/// One traversal of a [`LazyChunkCursor`]
pub struct ChunkIter<T> {
    node: Node,
    names: std::vec::IntoIter<String>,
    read: ChildReader<T>,
}

impl<T> Iterator for ChunkIter<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let name = self.names.next()?;
        Some(self.node.child(&name).and_then(|child| (self.read)(&child)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.names.size_hint()
    }
}
