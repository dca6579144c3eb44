//! Node handles
//!
//! A [`Node`] addresses one entity in a container by its path from the
//! root. Handles are cheap to clone and resolve their path on every access,
//! so they observe writes made through other handles and fail once the
//! container closes.
//!
//! Opaque attributes, array attributes and datasets are read from the blob
//! store on every access; nothing is cached on the handle.

use crate::attr::AttrValue;
use crate::blob::BlobStore;
use crate::container::{Shared, State};
use crate::tree::{AttrSlot, DataSlot, NodeData};
use modelvault_core::{Error, NdArray, Result};
use std::path::Path;
use std::sync::Arc;

/// Handle to a node inside an open container
#[derive(Clone)]
pub struct Node {
    shared: Arc<Shared>,
    segments: Vec<String>,
}

impl Node {
    pub(crate) fn root(shared: Arc<Shared>) -> Self {
        Node {
            shared,
            segments: Vec::new(),
        }
    }

    fn descend(&self, name: &str) -> Node {
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Node {
            shared: Arc::clone(&self.shared),
            segments,
        }
    }

    /// Absolute path inside the container (`"/"` for the root)
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }

    /// Last path segment (`"/"` for the root)
    pub fn name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or("/")
    }

    /// Backing file of the owning container, if any
    pub fn container_path(&self) -> Option<&Path> {
        self.shared.path.as_deref()
    }

    /// True while the owning container is open
    pub fn is_open(&self) -> bool {
        self.shared.is_open()
    }

    fn read_state<R>(&self, f: impl FnOnce(&State) -> Result<R>) -> Result<R> {
        let guard = self.shared.state.read();
        let state = guard.as_ref().ok_or(Error::AlreadyClosed)?;
        f(state)
    }

    fn write_state<R>(&self, f: impl FnOnce(&mut State) -> Result<R>) -> Result<R> {
        let mut guard = self.shared.state.write();
        let state = guard.as_mut().ok_or(Error::AlreadyClosed)?;
        if !self.shared.mode.is_writable() {
            return Err(Error::ReadOnly {
                path: self.shared.path.clone().unwrap_or_default(),
            });
        }
        f(state)
    }

    fn with<R>(&self, f: impl FnOnce(&NodeData, &State) -> Result<R>) -> Result<R> {
        self.read_state(|state| {
            let node = state
                .root
                .resolve(&self.segments)
                .ok_or_else(|| Error::NotFound(format!("node {}", self.path())))?;
            f(node, state)
        })
    }

    fn with_mut<R>(
        &self,
        f: impl FnOnce(&mut NodeData, &mut BlobStore) -> Result<R>,
    ) -> Result<R> {
        let path = self.path();
        self.write_state(|state| {
            let State { root, blobs } = state;
            let node = root
                .resolve_mut(&self.segments)
                .ok_or_else(|| Error::NotFound(format!("node {}", path)))?;
            f(node, blobs)
        })
    }

    /// True if the node has no attributes, no children and no dataset
    pub fn is_empty(&self) -> Result<bool> {
        self.with(|n, _| Ok(n.is_empty()))
    }

    /// True if children enumerate in insertion order
    pub fn tracks_order(&self) -> Result<bool> {
        self.with(|n, _| Ok(n.track_order))
    }

    /// Read one attribute
    pub fn attr(&self, key: &str) -> Result<Option<AttrValue>> {
        self.with(|n, state| {
            n.attrs
                .get(key)
                .map(|slot| slot.load(&state.blobs))
                .transpose()
        })
    }

    /// Read one attribute that must exist
    pub fn require_attr(&self, key: &str) -> Result<AttrValue> {
        self.attr(key)?.ok_or_else(|| {
            Error::NotFound(format!("attribute '{}' on node {}", key, self.path()))
        })
    }

    /// Set (or replace) one attribute
    pub fn set_attr(&self, key: &str, value: impl Into<AttrValue>) -> Result<()> {
        let value = value.into();
        self.with_mut(|n, blobs| {
            let slot = AttrSlot::store(value, blobs)?;
            n.attrs.insert(key.to_string(), slot);
            Ok(())
        })
    }

    /// Attribute names, sorted
    pub fn attr_keys(&self) -> Result<Vec<String>> {
        self.with(|n, _| Ok(n.attrs.keys().cloned().collect()))
    }

    /// Create an empty child; fails if the name is taken.
    ///
    /// The child inherits this node's order tracking.
    pub fn create_child(&self, name: &str) -> Result<Node> {
        self.with_mut(|n, _| {
            let child = NodeData::new(n.track_order);
            n.insert_child(name, child)
        })?;
        Ok(self.descend(name))
    }

    /// Create a child holding `data` as its dataset
    pub fn create_dataset(&self, name: &str, data: NdArray) -> Result<Node> {
        self.with_mut(|n, blobs| {
            // Check first so a rejected name leaves no blob behind
            n.check_new_child(name)?;
            let mut child = NodeData::new(n.track_order);
            child.data = Some(DataSlot::store(data, blobs)?);
            n.insert_child(name, child)
        })?;
        Ok(self.descend(name))
    }

    /// Dataset stored directly on this node
    pub fn data(&self) -> Result<Option<NdArray>> {
        self.with(|n, state| {
            n.data
                .as_ref()
                .map(|slot| slot.load(&state.blobs))
                .transpose()
        })
    }

    /// Handle to an existing child
    pub fn child(&self, name: &str) -> Result<Node> {
        if self.has_child(name)? {
            Ok(self.descend(name))
        } else {
            Err(Error::NotFound(format!(
                "child '{}' of node {}",
                name,
                self.path()
            )))
        }
    }

    /// True if a child with this name exists
    pub fn has_child(&self, name: &str) -> Result<bool> {
        self.with(|n, _| Ok(n.children.contains_key(name)))
    }

    /// Child names in enumeration order
    pub fn child_names(&self) -> Result<Vec<String>> {
        self.with(|n, _| Ok(n.child_names()))
    }

    /// Child handles in enumeration order
    pub fn children(&self) -> Result<Vec<Node>> {
        Ok(self
            .child_names()?
            .iter()
            .map(|name| self.descend(name))
            .collect())
    }

    /// Number of children
    pub fn len(&self) -> Result<usize> {
        self.with(|n, _| Ok(n.children.len()))
    }

    /// Deep-copy the subtree rooted at `source` into a new child `name`.
    ///
    /// `source` may live in another container, or in this one (including
    /// an ancestor of `self`): the subtree is cloned before insertion.
    /// Within one container blobs are shared; across containers they are
    /// copied one at a time.
    pub fn copy_from(&self, source: &Node, name: &str) -> Result<Node> {
        let mut subtree = source.with(|n, _| Ok(n.clone()))?;
        if !Arc::ptr_eq(&self.shared, &source.shared) {
            self.with_mut(|n, _| n.check_new_child(name))?;
            self.relocate(source, &mut subtree)?;
        }
        self.with_mut(|n, _| n.insert_child(name, subtree))?;
        Ok(self.descend(name))
    }

    /// Re-store every slot of `node` (taken from `source`'s container) in
    /// this container. The two containers are never locked together.
    fn relocate(&self, source: &Node, node: &mut NodeData) -> Result<()> {
        for slot in node.attrs.values_mut() {
            let value = source.read_state(|state| slot.load(&state.blobs))?;
            *slot = self.write_state(|state| AttrSlot::store(value, &mut state.blobs))?;
        }
        if let Some(slot) = node.data.as_mut() {
            let data = source.read_state(|state| slot.load(&state.blobs))?;
            *slot = self.write_state(|state| DataSlot::store(data, &mut state.blobs))?;
        }
        for child in node.children.values_mut() {
            self.relocate(source, child)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("container", &self.shared.path)
            .field("path", &self.path())
            .field("open", &self.is_open())
            .finish()
    }
}
