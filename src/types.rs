//! Shared types, enums, and constants.
//!
//! All types that cross module boundaries live here.

use std::collections::BTreeMap;

use bitflags::bitflags;

// ============================================================================
// Node Types
// ============================================================================

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Root = 0,
    Container = 1,
    Text = 2,
    Comment = 3,
}

impl NodeType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Root),
            1 => Some(Self::Container),
            2 => Some(Self::Text),
            3 => Some(Self::Comment),
            _ => None,
        }
    }

    /// Whether this node type is a leaf (cannot have children, carries text).
    pub fn is_leaf(self) -> bool {
        matches!(self, Self::Text | Self::Comment)
    }
}

// ============================================================================
// Dirty Flags
// ============================================================================

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DirtyFlags: u8 {
        /// The node's own output is stale.
        const SELF     = 0b0000_0001;
        /// At least one descendant's output is stale.
        const CHILDREN = 0b0000_0010;
        /// Geometry must be recomputed by the layout engine.
        const LAYOUT   = 0b0000_0100;
    }
}

// ============================================================================
// Node
// ============================================================================

/// Property values are untyped; the reactive layer owns their meaning.
pub type PropValue = serde_json::Value;

#[derive(Debug, Clone)]
pub struct Node {
    pub node_type: NodeType,
    pub props: BTreeMap<String, PropValue>,
    pub children: Vec<u32>,
    pub parent: Option<u32>,
    /// Text payload; only leaves carry one.
    pub text: Option<String>,
    pub dirty: DirtyFlags,
    pub cached_output: Option<String>,
    pub cached_children: Option<String>,
    pub render_version: u64,
}

impl Node {
    pub fn new(node_type: NodeType) -> Self {
        Self {
            node_type,
            props: BTreeMap::new(),
            children: Vec::new(),
            parent: None,
            text: node_type.is_leaf().then(String::new),
            dirty: DirtyFlags::all(),
            cached_output: None,
            cached_children: None,
            render_version: 0,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.intersects(DirtyFlags::SELF | DirtyFlags::CHILDREN)
    }

    /// Drop both caches and the parent link.
    pub(crate) fn sever(&mut self) {
        self.parent = None;
        self.cached_output = None;
        self.cached_children = None;
        self.dirty = DirtyFlags::all();
        self.render_version += 1;
    }
}

// ============================================================================
// Geometry from the layout engine
// ============================================================================

/// An interactive rectangle in absolute content coordinates, as resolved by the
/// layout engine. Paint order is the position in the list handed to the click map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRegion {
    pub component_id: String,
    pub x: u32,
    pub absolute_y: u32,
    pub width: u32,
    pub height: u32,
}

impl RawRegion {
    pub fn new(component_id: impl Into<String>, x: u32, absolute_y: u32, width: u32, height: u32) -> Self {
        Self {
            component_id: component_id.into(),
            x,
            absolute_y,
            width,
            height,
        }
    }
}

// ============================================================================
// Terminal input
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerAction {
    Press,
    Release,
    Move,
    WheelUp,
    WheelDown,
}

/// Raw terminal input, normalized by the backend.
/// Pointer coordinates are 1-indexed, as terminals report them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalInputEvent {
    Pointer { x: u16, y: u16, action: PointerAction },
    Resize { width: u16, height: u16 },
}
