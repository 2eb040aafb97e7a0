//! Kraken Paint — retained-tree terminal rendering core.
//!
//! Edits to the node tree only flip dirty bits. A flush composes the tree into
//! text through a [`FrameSource`], slices it to the viewport, fits each row to
//! the terminal width and lets the differ write the rows that changed.
//!
//! Modules:
//! - `tree`, `invalidation`: node arena, edit operations, render caches
//! - `writer`: line-level terminal differ
//! - `line_cache`, `text_utils`: bounded width/truncation memoization
//! - `click_map`: pointer hit-testing over the painted regions
//! - `viewport`: scroll state and throttling
//! - `context`, `render`, `event`: the engine and its render/input loops
//!
//! The library logs through `tracing` and never installs a subscriber.

pub mod click_map;
pub mod config;
pub mod context;
pub mod error;
pub mod event;
pub mod invalidation;
pub mod line_cache;
pub mod render;
pub mod terminal;
pub mod text_utils;
pub mod tree;
pub mod types;
pub mod viewport;
pub mod writer;

pub use click_map::{ClickMap, ClickRegion, ScrollAdjust};
pub use config::EngineConfig;
pub use context::TuiContext;
pub use error::{Result, TuiError};
pub use event::{handle_input, read_input, InputOutcome};
pub use invalidation::{InvalidateReport, TreeAccess};
pub use line_cache::LineCache;
pub use render::{flush, paint_frame, tick, ComposedFrame, Edit, FrameSource, RenderScope, TextFrameSource};
pub use terminal::{CrosstermBackend, HeadlessBackend, TerminalBackend};
pub use tree::NodeTree;
pub use types::{DirtyFlags, Node, NodeType, PointerAction, PropValue, RawRegion, TerminalInputEvent};
pub use viewport::{ScrollAction, Viewport, ViewportState};
pub use writer::{DiffReport, RedrawStrategy, TerminalWriter};
