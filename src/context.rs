//! TuiContext — owner of all engine state.
//!
//! The context owns the node tree, the differ, both caches, the viewport and
//! the terminal backend. Edits go through it so that every mutation also arms
//! the next render; many edits between two flushes collapse into one frame.

use tracing::{debug, warn};

use crate::click_map::ClickMap;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::invalidation::{self, InvalidateReport};
use crate::line_cache::LineCache;
use crate::terminal::TerminalBackend;
use crate::tree::{self, NodeTree};
use crate::types::{NodeType, PropValue, RawRegion};
use crate::viewport::Viewport;
use crate::writer::TerminalWriter;

pub struct TuiContext {
    // Tree Module
    pub tree: NodeTree,

    // Render Module
    pub writer: TerminalWriter,
    pub line_cache: LineCache,
    pub backend: Box<dyn TerminalBackend>,
    /// Full text of the last composed frame, before viewport slicing.
    pub last_frame: String,
    pub render_pending: bool,

    // Event Module
    pub click_map: ClickMap,
    pub viewport: Viewport,
    /// Regions of the last composed frame, kept for click map rebuilds.
    pub last_regions: Vec<RawRegion>,

    pub config: EngineConfig,

    // Diagnostics
    pub perf_render_us: u64,
    pub perf_rows_written: u32,
    pub perf_frames_painted: u64,
    pub perf_compose_failures: u64,
    pub perf_deferred_edit_failures: u64,
    pub perf_invalidate_truncations: u64,
}

impl TuiContext {
    pub fn new(backend: Box<dyn TerminalBackend>, config: EngineConfig) -> Self {
        let config = config.normalized();
        let (w, h) = backend.size();
        Self {
            tree: NodeTree::new(),

            writer: TerminalWriter::new(&config.differ),
            line_cache: LineCache::new(&config.line_cache),
            backend,
            last_frame: String::new(),
            render_pending: true,

            click_map: ClickMap::new(&config.click_map),
            viewport: Viewport::new(&config.viewport, w, h),
            last_regions: Vec::new(),

            config,

            perf_render_us: 0,
            perf_rows_written: 0,
            perf_frames_painted: 0,
            perf_compose_failures: 0,
            perf_deferred_edit_failures: 0,
            perf_invalidate_truncations: 0,
        }
    }

    // ========================================================================
    // Edits
    // ========================================================================

    pub fn create_node(&mut self, node_type: NodeType) -> u32 {
        tree::create_node(&mut self.tree, node_type)
    }

    pub fn set_root(&mut self, handle: u32) -> Result<()> {
        tree::set_root(&mut self.tree, handle)?;
        self.render_pending = true;
        Ok(())
    }

    pub fn set_text(&mut self, handle: u32, text: &str) -> Result<()> {
        tree::set_text(&mut self.tree, handle, text)?;
        self.render_pending = true;
        Ok(())
    }

    pub fn set_prop(&mut self, handle: u32, key: &str, value: impl Into<PropValue>) -> Result<()> {
        tree::set_prop(&mut self.tree, handle, key, value)?;
        self.render_pending = true;
        Ok(())
    }

    pub fn remove_prop(&mut self, handle: u32, key: &str) -> Result<Option<PropValue>> {
        let old = tree::remove_prop(&mut self.tree, handle, key)?;
        self.render_pending = true;
        Ok(old)
    }

    pub fn append_child(&mut self, parent: u32, child: u32) -> Result<()> {
        self.insert_child(parent, child, None)
    }

    pub fn insert_child(&mut self, parent: u32, child: u32, anchor: Option<u32>) -> Result<()> {
        tree::insert_child(&mut self.tree, parent, child, anchor)?;
        self.render_pending = true;
        Ok(())
    }

    pub fn remove_child(&mut self, parent: u32, child: u32) -> Result<()> {
        tree::remove_child(&mut self.tree, parent, child)?;
        self.render_pending = true;
        Ok(())
    }

    pub fn destroy_node(&mut self, handle: u32) -> Result<usize> {
        let freed = tree::destroy_node(&mut self.tree, handle)?;
        self.render_pending = true;
        Ok(freed)
    }

    /// Drop cached output under `handle`, bounded by the configured node cap.
    pub fn invalidate_cache(&mut self, handle: u32, recursive: bool) -> Result<InvalidateReport> {
        let max_nodes = self.config.invalidation.max_nodes;
        let report = invalidation::invalidate_cache(&mut self.tree, handle, recursive, max_nodes)?;
        if report.truncated {
            self.perf_invalidate_truncations += 1;
            warn!(handle, max_nodes, "invalidation truncated at node cap");
        }
        self.render_pending = true;
        Ok(report)
    }

    // ========================================================================
    // Terminal
    // ========================================================================

    /// Apply new terminal dimensions.
    ///
    /// Everything that depends on the old geometry is invalidated in this one
    /// call: the line cache (when the width changed), the click map, the
    /// differ's previous frame and any pending scroll.
    pub fn resize(&mut self, width: u16, height: u16) {
        let width_changed = self.viewport.resize(width, height);
        if width_changed {
            self.line_cache.clear_all();
        }
        self.click_map.invalidate();
        self.writer.clear();
        self.render_pending = true;
        debug!(width, height, width_changed, "resize");
    }

    /// Show the cursor and release the terminal.
    pub fn shutdown(&mut self) -> Result<()> {
        self.writer.done(self.backend.as_mut())?;
        self.backend.shutdown()
    }
}
