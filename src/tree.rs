//! Tree Module — retained node arena and its edit operations.
//!
//! Responsibilities:
//! - Handle allocation (sequential u32, never recycled; 0 is the invalid sentinel)
//! - Node creation/destruction
//! - Parent-child relationships (append, insert-before, remove)
//! - Triggering invalidation before every edit returns

use std::collections::HashMap;

use tracing::debug;

use crate::error::{Result, TuiError};
use crate::invalidation::{mark_children_changed, mark_self_dirty};
use crate::types::{DirtyFlags, Node, NodeType, PropValue};

#[derive(Debug)]
pub struct NodeTree {
    pub(crate) nodes: HashMap<u32, Node>,
    next_handle: u32,
    pub(crate) root: Option<u32>,
    /// Bumped by every edit that can change the painted output.
    generation: u64,
}

impl Default for NodeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeTree {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            next_handle: 1, // Handle(0) is permanently invalid
            root: None,
            generation: 0,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn touch(&mut self) {
        self.generation += 1;
    }

    pub fn get(&self, handle: u32) -> Option<&Node> {
        self.nodes.get(&handle)
    }

    pub(crate) fn get_mut(&mut self, handle: u32) -> Option<&mut Node> {
        self.nodes.get_mut(&handle)
    }

    pub fn root(&self) -> Option<u32> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Validate that a handle refers to an existing node.
    pub fn validate_handle(&self, handle: u32) -> Result<()> {
        if handle == 0 {
            return Err(TuiError::InvalidSentinel);
        }
        if !self.nodes.contains_key(&handle) {
            return Err(TuiError::InvalidHandle(handle));
        }
        Ok(())
    }

    fn node(&self, handle: u32) -> Result<&Node> {
        self.validate_handle(handle)?;
        self.nodes.get(&handle).ok_or(TuiError::InvalidHandle(handle))
    }

    fn node_mut(&mut self, handle: u32) -> Result<&mut Node> {
        self.validate_handle(handle)?;
        self.nodes.get_mut(&handle).ok_or(TuiError::InvalidHandle(handle))
    }

    /// Whether `ancestor` appears on the parent chain of `handle` (or is `handle`).
    pub fn is_ancestor(&self, ancestor: u32, handle: u32) -> bool {
        let mut current = Some(handle);
        while let Some(h) = current {
            if h == ancestor {
                return true;
            }
            current = self.nodes.get(&h).and_then(|n| n.parent);
        }
        false
    }
}

/// Allocate a new handle and create a detached node.
pub fn create_node(tree: &mut NodeTree, node_type: NodeType) -> u32 {
    let handle = tree.next_handle;
    tree.next_handle += 1;
    tree.nodes.insert(handle, Node::new(node_type));
    debug!(handle, ?node_type, "create_node");
    handle
}

/// Make `handle` the root of the painted tree.
pub fn set_root(tree: &mut NodeTree, handle: u32) -> Result<()> {
    tree.validate_handle(handle)?;
    tree.root = Some(handle);
    tree.touch();
    debug!(handle, "set_root");
    Ok(())
}

/// Replace the text payload of a leaf.
pub fn set_text(tree: &mut NodeTree, handle: u32, text: &str) -> Result<()> {
    let node = tree.node_mut(handle)?;
    match node.text.as_mut() {
        Some(payload) => {
            payload.clear();
            payload.push_str(text);
        }
        None => return Err(TuiError::NotALeaf(handle)),
    }
    node.dirty |= DirtyFlags::LAYOUT;
    mark_self_dirty(tree, handle);
    tree.touch();
    Ok(())
}

/// Set a property. Properties may affect both output and geometry.
pub fn set_prop(tree: &mut NodeTree, handle: u32, key: &str, value: impl Into<PropValue>) -> Result<()> {
    let node = tree.node_mut(handle)?;
    node.props.insert(key.to_string(), value.into());
    node.dirty |= DirtyFlags::LAYOUT;
    mark_self_dirty(tree, handle);
    tree.touch();
    Ok(())
}

/// Remove a property. Returns the previous value, if any.
pub fn remove_prop(tree: &mut NodeTree, handle: u32, key: &str) -> Result<Option<PropValue>> {
    let node = tree.node_mut(handle)?;
    let previous = node.props.remove(key);
    if previous.is_some() {
        node.dirty |= DirtyFlags::LAYOUT;
        mark_self_dirty(tree, handle);
        tree.touch();
    }
    Ok(previous)
}

/// Append a child to a parent node.
pub fn append_child(tree: &mut NodeTree, parent: u32, child: u32) -> Result<()> {
    insert_child(tree, parent, child, None)
}

/// Insert `child` under `parent`, before `anchor` when given, else at the end.
/// A child that already has a parent is moved.
pub fn insert_child(tree: &mut NodeTree, parent: u32, child: u32, anchor: Option<u32>) -> Result<()> {
    if tree.node(parent)?.node_type.is_leaf() {
        return Err(TuiError::NotAContainer(parent));
    }
    tree.validate_handle(child)?;
    if tree.is_ancestor(child, parent) {
        return Err(TuiError::Cycle { parent, child });
    }
    if let Some(anchor) = anchor {
        if anchor == child || tree.node(anchor)?.parent != Some(parent) {
            return Err(TuiError::NotAChild { parent, child: anchor });
        }
    }

    // Detach from previous parent if any
    if let Some(old_parent) = tree.node(child)?.parent {
        if let Some(old) = tree.get_mut(old_parent) {
            old.children.retain(|&h| h != child);
        }
        if old_parent != parent {
            mark_children_changed(tree, old_parent);
        }
    }

    let p = tree.node_mut(parent)?;
    let index = anchor
        .and_then(|a| p.children.iter().position(|&h| h == a))
        .unwrap_or(p.children.len());
    p.children.insert(index, child);

    let c = tree.node_mut(child)?;
    c.parent = Some(parent);
    c.dirty |= DirtyFlags::LAYOUT;

    mark_children_changed(tree, parent);
    tree.touch();
    debug!(parent, child, index, "insert_child");
    Ok(())
}

/// Remove a child from a parent node. The child stays in the arena, cleared
/// of caches and detached, so the reactive layer may re-insert it.
pub fn remove_child(tree: &mut NodeTree, parent: u32, child: u32) -> Result<()> {
    tree.validate_handle(parent)?;
    if tree.node(child)?.parent != Some(parent) {
        return Err(TuiError::NotAChild { parent, child });
    }

    tree.node_mut(parent)?.children.retain(|&h| h != child);
    tree.node_mut(child)?.sever();

    mark_children_changed(tree, parent);
    tree.touch();
    debug!(parent, child, "remove_child");
    Ok(())
}

/// Destroy a node and its whole subtree. Returns the number of nodes freed.
pub fn destroy_node(tree: &mut NodeTree, handle: u32) -> Result<usize> {
    if let Some(parent) = tree.node(handle)?.parent {
        if let Some(p) = tree.get_mut(parent) {
            p.children.retain(|&h| h != handle);
        }
        mark_children_changed(tree, parent);
    }

    let mut worklist = vec![handle];
    let mut freed = 0;
    while let Some(h) = worklist.pop() {
        if let Some(mut node) = tree.nodes.remove(&h) {
            worklist.append(&mut node.children);
            freed += 1;
        }
        if tree.root == Some(h) {
            tree.root = None;
        }
    }

    tree.touch();
    debug!(handle, freed, "destroy_node");
    Ok(freed)
}
