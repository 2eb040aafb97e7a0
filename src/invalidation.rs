//! Invalidation Module — dirty-bit propagation and render-output caching.
//!
//! Responsibilities:
//! - Mark nodes stale and propagate `CHILDREN` to ancestors, stopping at the
//!   first ancestor that is already marked
//! - Invalidate single nodes or whole subtrees (explicit worklist, capped)
//! - Serve cached per-node and joined-children output during a render pass
//!
//! Invariant: `cached_output.is_some()` implies neither `SELF` nor `CHILDREN` is set.

use tracing::trace;

use crate::error::{Result, TuiError};
use crate::tree::NodeTree;
use crate::types::{DirtyFlags, NodeType};

pub(crate) mod sealed {
    use crate::tree::NodeTree;

    /// Write access to the tree. Not nameable outside the crate, so a frame
    /// source cannot edit the tree behind the deferred-edit queue.
    pub trait TreeWrite {
        fn tree_mut(&mut self) -> &mut NodeTree;
    }
}

use sealed::TreeWrite;

/// Anything that can lend out the node tree during a render pass.
///
/// Outside this crate only reads are possible; the cache helpers below write
/// through the sealed supertrait.
pub trait TreeAccess: TreeWrite {
    fn tree(&self) -> &NodeTree;
}

impl TreeWrite for NodeTree {
    fn tree_mut(&mut self) -> &mut NodeTree {
        self
    }
}

impl TreeAccess for NodeTree {
    fn tree(&self) -> &NodeTree {
        self
    }
}

/// Outcome of [`invalidate_cache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InvalidateReport {
    pub processed: usize,
    /// The node cap was hit before the subtree was exhausted.
    pub truncated: bool,
}

/// Mark a node's own output stale. Ancestors are left untouched.
pub fn mark_dirty(tree: &mut NodeTree, handle: u32) {
    if let Some(node) = tree.get_mut(handle) {
        node.dirty |= DirtyFlags::SELF;
        node.cached_output = None;
        node.render_version += 1;
    }
}

/// Mark a node stale and propagate `CHILDREN` up to the root.
pub fn mark_self_dirty(tree: &mut NodeTree, handle: u32) {
    mark_dirty(tree, handle);
    let parent = tree.get(handle).and_then(|n| n.parent);
    propagate(tree, parent);
}

/// Structural change under `handle`: its child list (and so its geometry) changed.
pub fn mark_children_changed(tree: &mut NodeTree, handle: u32) {
    if let Some(node) = tree.get_mut(handle) {
        node.dirty |= DirtyFlags::SELF | DirtyFlags::CHILDREN | DirtyFlags::LAYOUT;
        node.cached_output = None;
        node.cached_children = None;
        node.render_version += 1;
    }
    let parent = tree.get(handle).and_then(|n| n.parent);
    propagate(tree, parent);
}

fn propagate(tree: &mut NodeTree, start: Option<u32>) {
    let mut current = start;
    while let Some(handle) = current {
        let Some(node) = tree.get_mut(handle) else {
            break;
        };
        if node.dirty.contains(DirtyFlags::CHILDREN) {
            break;
        }
        node.dirty |= DirtyFlags::CHILDREN;
        node.cached_output = None;
        node.cached_children = None;
        node.render_version += 1;
        current = node.parent;
    }
}

/// Drop cached output on `handle` (and its descendants when `recursive`).
///
/// Caches are nulled and the `SELF`/`CHILDREN` bits cleared, so the node is
/// re-rendered on the next pass and later edits below it propagate all the way
/// up again. The recursive form visits at most `max_nodes` nodes.
pub fn invalidate_cache(
    tree: &mut NodeTree,
    handle: u32,
    recursive: bool,
    max_nodes: usize,
) -> Result<InvalidateReport> {
    tree.validate_handle(handle)?;
    let mut report = InvalidateReport::default();
    let mut worklist = vec![handle];

    while let Some(h) = worklist.pop() {
        if report.processed >= max_nodes {
            report.truncated = true;
            break;
        }
        let Some(node) = tree.get_mut(h) else {
            continue;
        };
        node.cached_output = None;
        node.cached_children = None;
        node.dirty.remove(DirtyFlags::SELF | DirtyFlags::CHILDREN);
        node.render_version += 1;
        report.processed += 1;

        if recursive {
            worklist.extend(node.children.iter().rev().copied());
        }
    }

    trace!(handle, recursive, ?report, "invalidate_cache");
    Ok(report)
}

pub fn can_skip_render(tree: &NodeTree, handle: u32) -> bool {
    tree.get(handle).is_some_and(|n| {
        !n.dirty.intersects(DirtyFlags::SELF | DirtyFlags::CHILDREN) && n.cached_output.is_some()
    })
}

/// Render one node through its output cache.
pub fn render_cached<T, F>(target: &mut T, handle: u32, render: &mut F) -> Result<String>
where
    T: TreeAccess + ?Sized,
    F: FnMut(&mut T, u32) -> Result<String>,
{
    if can_skip_render(target.tree(), handle) {
        if let Some(cached) = target.tree().get(handle).and_then(|n| n.cached_output.clone()) {
            return Ok(cached);
        }
    }

    let output = render(target, handle)?;
    let node = target
        .tree_mut()
        .get_mut(handle)
        .ok_or(TuiError::InvalidHandle(handle))?;
    node.cached_output = Some(output.clone());
    node.dirty.remove(DirtyFlags::SELF | DirtyFlags::CHILDREN);
    Ok(output)
}

/// Render and join the direct children of `handle`.
///
/// When `CHILDREN` is clear and a joined output is cached, it is returned as is
/// and `render_child` is never called. Comment nodes produce no output.
pub fn render_children_cached<T, F>(target: &mut T, handle: u32, render_child: &mut F) -> Result<String>
where
    T: TreeAccess + ?Sized,
    F: FnMut(&mut T, u32) -> Result<String>,
{
    let node = target
        .tree()
        .get(handle)
        .ok_or(TuiError::InvalidHandle(handle))?;
    if !node.dirty.contains(DirtyFlags::CHILDREN) {
        if let Some(cached) = &node.cached_children {
            return Ok(cached.clone());
        }
    }

    let children = node.children.clone();
    let mut parts = Vec::with_capacity(children.len());
    for child in children {
        let is_comment = target
            .tree()
            .get(child)
            .is_some_and(|n| n.node_type == NodeType::Comment);
        if is_comment {
            continue;
        }
        parts.push(render_cached(target, child, render_child)?);
    }
    let joined = parts.join("\n");

    let node = target
        .tree_mut()
        .get_mut(handle)
        .ok_or(TuiError::InvalidHandle(handle))?;
    node.cached_children = Some(joined.clone());
    node.dirty.remove(DirtyFlags::CHILDREN);
    Ok(joined)
}

/// Nodes whose geometry must be recomputed, in handle order.
pub fn layout_dirty_nodes(tree: &NodeTree) -> Vec<u32> {
    let mut handles: Vec<u32> = tree
        .nodes
        .iter()
        .filter(|(_, n)| n.dirty.contains(DirtyFlags::LAYOUT))
        .map(|(&h, _)| h)
        .collect();
    handles.sort_unstable();
    handles
}

/// Clear `LAYOUT` on all nodes once the layout engine has run.
pub fn clear_layout_flags(tree: &mut NodeTree) {
    for node in tree.nodes.values_mut() {
        node.dirty.remove(DirtyFlags::LAYOUT);
    }
}
