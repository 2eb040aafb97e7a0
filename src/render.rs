//! Render Module — frame scheduling and the paint pipeline.
//!
//! Responsibilities:
//! - Compose a frame from the tree through a [`FrameSource`] when edits are pending
//! - Queue edits requested during composition and apply them after the pass
//! - Slice the frame to the viewport, fit lines to the width, hand it to the differ
//! - Rebuild the click map from the regions of the new frame
//! - Repaint on throttled scroll, re-basing the click map when possible

use std::time::Instant;

use tracing::{debug, warn};

use crate::click_map::ScrollAdjust;
use crate::context::TuiContext;
use crate::error::Result;
use crate::invalidation::sealed::TreeWrite;
use crate::invalidation::{self, TreeAccess};
use crate::text_utils::{display_width, truncate_to_width};
use crate::tree::NodeTree;
use crate::types::{NodeType, PropValue, RawRegion};
use crate::viewport::ScrollAction;
use crate::writer::DiffReport;

// ============================================================================
// Frame Source
// ============================================================================

/// Output of one composition pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposedFrame {
    /// Newline-separated rows of the whole content, before scrolling.
    pub text: String,
    /// Interactive rectangles in paint order.
    pub regions: Vec<RawRegion>,
}

/// Serializes the tree into text and lays it out.
pub trait FrameSource {
    fn compose(&mut self, scope: &mut RenderScope<'_>) -> Result<ComposedFrame>;
}

/// A tree edit requested while a frame is being composed.
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    SetText { handle: u32, text: String },
    SetProp { handle: u32, key: String, value: PropValue },
    RemoveProp { handle: u32, key: String },
    InsertChild { parent: u32, child: u32, anchor: Option<u32> },
    RemoveChild { parent: u32, child: u32 },
    Destroy(u32),
}

/// Tree access handed to a [`FrameSource`] for one pass.
///
/// Reads and the cached render helpers go straight to the tree. Structural or
/// content edits must go through [`RenderScope::defer`]; they are applied once
/// the pass is over and arm the next render.
pub struct RenderScope<'a> {
    tree: &'a mut NodeTree,
    width: u16,
    height: u16,
    deferred: Vec<Edit>,
}

impl<'a> RenderScope<'a> {
    fn new(tree: &'a mut NodeTree, width: u16, height: u16) -> Self {
        Self {
            tree,
            width,
            height,
            deferred: Vec::new(),
        }
    }

    pub fn root(&self) -> Option<u32> {
        self.tree.root()
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Nodes whose geometry changed since the last pass.
    pub fn layout_dirty_nodes(&self) -> Vec<u32> {
        invalidation::layout_dirty_nodes(self.tree)
    }

    /// Render `handle` through its output cache.
    pub fn render_node<F>(&mut self, handle: u32, render: &mut F) -> Result<String>
    where
        F: FnMut(&mut Self, u32) -> Result<String>,
    {
        invalidation::render_cached(self, handle, render)
    }

    /// Render and join the children of `handle` through the join cache.
    pub fn render_children<F>(&mut self, handle: u32, render_child: &mut F) -> Result<String>
    where
        F: FnMut(&mut Self, u32) -> Result<String>,
    {
        invalidation::render_children_cached(self, handle, render_child)
    }

    pub fn defer(&mut self, edit: Edit) {
        self.deferred.push(edit);
    }

    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }

    fn into_deferred(self) -> Vec<Edit> {
        self.deferred
    }
}

impl TreeWrite for RenderScope<'_> {
    fn tree_mut(&mut self) -> &mut NodeTree {
        self.tree
    }
}

impl TreeAccess for RenderScope<'_> {
    fn tree(&self) -> &NodeTree {
        self.tree
    }
}

// ============================================================================
// Render Pipeline
// ============================================================================

/// Compose and paint a frame if any edit happened since the last one.
///
/// Returns `Ok(None)` when nothing was pending. A failed composition or a
/// failed write leaves the render armed so the next flush retries. Deferred
/// edits are applied in every case; one that fails is logged and skipped.
pub fn flush(ctx: &mut TuiContext, source: &mut dyn FrameSource) -> Result<Option<DiffReport>> {
    if !ctx.render_pending {
        return Ok(None);
    }

    let generation = ctx.tree.generation();
    let state = ctx.viewport.state();
    let mut scope = RenderScope::new(&mut ctx.tree, state.terminal_width, state.terminal_height);
    let composed = source.compose(&mut scope);
    let deferred = scope.into_deferred();
    let edited_mid_pass = ctx.tree.generation() != generation;
    if edited_mid_pass {
        warn!("tree edited during compose, scheduling another pass");
    }

    let outcome = match composed {
        Ok(frame) => {
            invalidation::clear_layout_flags(&mut ctx.tree);
            let painted = paint_frame(ctx, frame.text, frame.regions);
            ctx.render_pending = painted.is_err() || edited_mid_pass;
            painted.map(Some)
        }
        Err(e) => {
            ctx.perf_compose_failures += 1;
            warn!(error = %e, "compose failed, keeping last frame");
            Err(e)
        }
    };

    if !deferred.is_empty() {
        debug!(count = deferred.len(), "applying deferred edits");
        apply_edits(ctx, deferred);
    }
    outcome
}

fn apply_edits(ctx: &mut TuiContext, edits: Vec<Edit>) {
    for edit in edits {
        let applied = match &edit {
            Edit::SetText { handle, text } => ctx.set_text(*handle, text),
            Edit::SetProp { handle, key, value } => ctx.set_prop(*handle, key, value.clone()),
            Edit::RemoveProp { handle, key } => ctx.remove_prop(*handle, key).map(drop),
            Edit::InsertChild { parent, child, anchor } => ctx.insert_child(*parent, *child, *anchor),
            Edit::RemoveChild { parent, child } => ctx.remove_child(*parent, *child),
            Edit::Destroy(handle) => ctx.destroy_node(*handle).map(drop),
        };
        if let Err(e) = applied {
            ctx.perf_deferred_edit_failures += 1;
            warn!(error = %e, ?edit, "deferred edit failed");
        }
    }
}

/// Adopt a composed frame: update the content height, rebuild the click map
/// and paint the visible rows.
pub fn paint_frame(ctx: &mut TuiContext, text: String, regions: Vec<RawRegion>) -> Result<DiffReport> {
    let content_height = split_rows(&text).len() as u32;
    ctx.viewport.set_content_height(content_height);
    ctx.last_frame = text;
    ctx.last_regions = regions;

    let offset = ctx.viewport.scroll_offset();
    let rows = ctx.viewport.viewport_rows();
    ctx.click_map.build(&ctx.last_regions, offset, rows);

    repaint(ctx)
}

/// Fire a due trailing scroll, if any.
pub fn tick(ctx: &mut TuiContext, now: Instant) -> Result<Option<DiffReport>> {
    let action = ctx.viewport.poll(now);
    apply_scroll(ctx, action)
}

/// Jump to an absolute offset (clamped) and repaint if it moved.
pub fn scroll_to(ctx: &mut TuiContext, offset: u32) -> Result<Option<DiffReport>> {
    let before = ctx.viewport.scroll_offset();
    if !ctx.viewport.scroll_to(offset) {
        return Ok(None);
    }
    let distance = ctx.viewport.scroll_offset().abs_diff(before);
    let full = distance > ctx.viewport.state().terminal_height as u32 / 2;
    apply_scroll(ctx, ScrollAction::Repaint { full })
}

pub(crate) fn apply_scroll(ctx: &mut TuiContext, action: ScrollAction) -> Result<Option<DiffReport>> {
    let ScrollAction::Repaint { full } = action else {
        return Ok(None);
    };

    let offset = ctx.viewport.scroll_offset();
    if ctx.click_map.adjust_for_scroll(offset) == ScrollAdjust::NeedsRebuild {
        let rows = ctx.viewport.viewport_rows();
        ctx.click_map.build(&ctx.last_regions, offset, rows);
    }
    if full {
        ctx.writer.clear();
    }
    repaint(ctx).map(Some)
}

/// Paint the visible slice of the last composed frame.
fn repaint(ctx: &mut TuiContext) -> Result<DiffReport> {
    let start = Instant::now();
    let width = ctx.viewport.state().terminal_width as usize;
    let fill = ctx.config.viewport.fill_code.as_deref();

    let rows = split_rows(&ctx.last_frame);
    let visible = ctx.viewport.slice(&rows);
    let mut lines =
        ctx.line_cache
            .process_visible_lines(visible, width, display_width, truncate_to_width, fill);
    if let Some(indicator) = ctx.viewport.indicator_line() {
        lines.extend(ctx.line_cache.process_visible_lines(
            &[indicator.as_str()],
            width,
            display_width,
            truncate_to_width,
            fill,
        ));
    }

    let report = ctx.writer.render(&lines.join("\n"), ctx.backend.as_mut())?;

    ctx.perf_render_us = start.elapsed().as_micros() as u64;
    ctx.perf_rows_written = report.changed_rows.len() as u32;
    ctx.perf_frames_painted += 1;
    debug!(
        strategy = ?report.strategy,
        rows = report.changed_rows.len(),
        bytes = report.bytes_written,
        us = ctx.perf_render_us,
        "frame painted"
    );
    Ok(report)
}

fn split_rows(text: &str) -> Vec<&str> {
    if text.is_empty() {
        Vec::new()
    } else {
        text.split('\n').collect()
    }
}

// ============================================================================
// Default serialization
// ============================================================================

/// Plain-text [`FrameSource`]: text leaves render their content, containers
/// join their children one per line, comments render nothing. Every node
/// carrying a string `"id"` prop becomes a full-width click region over the
/// rows it occupies.
#[derive(Debug, Default)]
pub struct TextFrameSource;

impl TextFrameSource {
    fn render(scope: &mut RenderScope<'_>, handle: u32) -> Result<String> {
        let Some((node_type, text)) = scope.tree().get(handle).map(|n| (n.node_type, n.text.clone())) else {
            return Ok(String::new());
        };
        match node_type {
            NodeType::Text => Ok(text.unwrap_or_default()),
            NodeType::Comment => Ok(String::new()),
            NodeType::Root | NodeType::Container => {
                scope.render_children(handle, &mut |s, child| s.render_node(child, &mut Self::render))
            }
        }
    }

    /// Assign rows to `handle` starting at `row`; returns the rows it occupies.
    fn collect_regions(tree: &NodeTree, handle: u32, row: u32, width: u32, out: &mut Vec<RawRegion>) -> u32 {
        let Some(node) = tree.get(handle) else {
            return 0;
        };
        let height = match node.node_type {
            NodeType::Comment => return 0,
            NodeType::Text => node.text.as_deref().unwrap_or("").split('\n').count() as u32,
            NodeType::Root | NodeType::Container => {
                let mut used = 0;
                for &child in &node.children {
                    used += Self::collect_regions(tree, child, row + used, width, out);
                }
                // An empty join still occupies its row
                used.max(1)
            }
        };
        if let Some(id) = node.props.get("id").and_then(|v| v.as_str()) {
            out.push(RawRegion::new(id, 0, row, width, height));
        }
        height
    }
}

impl FrameSource for TextFrameSource {
    fn compose(&mut self, scope: &mut RenderScope<'_>) -> Result<ComposedFrame> {
        let Some(root) = scope.root() else {
            return Ok(ComposedFrame::default());
        };
        let text = scope.render_node(root, &mut Self::render)?;
        let mut regions = Vec::new();
        Self::collect_regions(scope.tree(), root, 0, scope.width() as u32, &mut regions);

        // Empty containers claim a row the text does not have
        let rows = split_rows(&text).len() as u32;
        regions.retain_mut(|r| {
            r.height = r.height.min(rows.saturating_sub(r.absolute_y));
            r.height > 0
        });
        Ok(ComposedFrame { text, regions })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EngineConfig, ViewportConfig};
    use crate::error::TuiError;
    use crate::terminal::MockBackend;
    use crate::writer::RedrawStrategy;
    use std::time::Duration;

    fn test_ctx() -> TuiContext {
        TuiContext::new(Box::new(MockBackend::new(80, 24)), EngineConfig::default())
    }

    fn mock(ctx: &mut TuiContext) -> &mut MockBackend {
        ctx.backend
            .as_any_mut()
            .downcast_mut::<MockBackend>()
            .unwrap()
    }

    fn build_list(ctx: &mut TuiContext, items: &[&str]) -> Vec<u32> {
        let root = ctx.create_node(NodeType::Root);
        ctx.set_root(root).unwrap();
        items
            .iter()
            .map(|text| {
                let h = ctx.create_node(NodeType::Text);
                ctx.set_text(h, text).unwrap();
                ctx.append_child(root, h).unwrap();
                h
            })
            .collect()
    }

    struct FailingSource;

    impl FrameSource for FailingSource {
        fn compose(&mut self, _scope: &mut RenderScope<'_>) -> Result<ComposedFrame> {
            Err(TuiError::Compose("layout exploded".to_string()))
        }
    }

    struct DeferringSource {
        target: u32,
        fired: bool,
    }

    impl FrameSource for DeferringSource {
        fn compose(&mut self, scope: &mut RenderScope<'_>) -> Result<ComposedFrame> {
            if !self.fired {
                self.fired = true;
                scope.defer(Edit::SetText {
                    handle: self.target,
                    text: "later".to_string(),
                });
            }
            TextFrameSource.compose(scope)
        }
    }

    struct BatchDeferringSource {
        edits: Vec<Edit>,
    }

    impl FrameSource for BatchDeferringSource {
        fn compose(&mut self, scope: &mut RenderScope<'_>) -> Result<ComposedFrame> {
            for edit in self.edits.drain(..) {
                scope.defer(edit);
            }
            TextFrameSource.compose(scope)
        }
    }

    /// Edits the tree directly once its frame is composed.
    struct EditingSource {
        target: u32,
        fired: bool,
    }

    impl FrameSource for EditingSource {
        fn compose(&mut self, scope: &mut RenderScope<'_>) -> Result<ComposedFrame> {
            let frame = TextFrameSource.compose(scope)?;
            if !self.fired {
                self.fired = true;
                crate::tree::set_text(scope.tree_mut(), self.target, "late")?;
            }
            Ok(frame)
        }
    }

    #[test]
    fn test_flush_paints_once_per_batch() {
        let mut ctx = test_ctx();
        build_list(&mut ctx, &["A", "B", "C"]);

        let report = flush(&mut ctx, &mut TextFrameSource).unwrap().unwrap();
        assert_eq!(report.strategy, RedrawStrategy::Full);
        assert_eq!(ctx.last_frame, "A\nB\nC");
        assert!(!ctx.render_pending);

        assert_eq!(flush(&mut ctx, &mut TextFrameSource).unwrap(), None);
        assert_eq!(mock(&mut ctx).writes.len(), 1);
    }

    #[test]
    fn test_text_edit_rewrites_one_row() {
        let mut ctx = test_ctx();
        let items = build_list(&mut ctx, &["A", "B", "C"]);
        flush(&mut ctx, &mut TextFrameSource).unwrap();

        ctx.set_text(items[1], "X").unwrap();
        let report = flush(&mut ctx, &mut TextFrameSource).unwrap().unwrap();
        assert_eq!(report.strategy, RedrawStrategy::Incremental);
        assert_eq!(report.changed_rows, vec![1]);

        let out = mock(&mut ctx).last_write().unwrap();
        assert!(out.contains("\x1b[2;1H\x1b[2KX"));
        assert!(!out.contains("\x1b[1;1H"));
    }

    #[test]
    fn test_unchanged_siblings_served_from_cache() {
        let mut ctx = test_ctx();
        let items = build_list(&mut ctx, &["A", "B"]);
        flush(&mut ctx, &mut TextFrameSource).unwrap();
        let version = ctx.tree.get(items[0]).unwrap().render_version;

        ctx.set_text(items[1], "Z").unwrap();
        flush(&mut ctx, &mut TextFrameSource).unwrap();
        let first = ctx.tree.get(items[0]).unwrap();
        assert_eq!(first.render_version, version);
        assert_eq!(first.cached_output.as_deref(), Some("A"));
        assert_eq!(ctx.last_frame, "A\nZ");
    }

    #[test]
    fn test_comments_render_nothing() {
        let mut ctx = test_ctx();
        let items = build_list(&mut ctx, &["A", "B"]);
        let root = ctx.tree.root().unwrap();
        let comment = ctx.create_node(NodeType::Comment);
        ctx.insert_child(root, comment, Some(items[1])).unwrap();
        flush(&mut ctx, &mut TextFrameSource).unwrap();
        assert_eq!(ctx.last_frame, "A\nB");
    }

    #[test]
    fn test_compose_failure_keeps_last_frame() {
        let mut ctx = test_ctx();
        let items = build_list(&mut ctx, &["A", "B"]);
        flush(&mut ctx, &mut TextFrameSource).unwrap();

        ctx.set_text(items[0], "changed").unwrap();
        assert!(flush(&mut ctx, &mut FailingSource).is_err());
        assert_eq!(mock(&mut ctx).writes.len(), 1);
        assert_eq!(ctx.last_frame, "A\nB");
        assert!(ctx.render_pending);
        assert_eq!(ctx.perf_compose_failures, 1);

        flush(&mut ctx, &mut TextFrameSource).unwrap();
        assert_eq!(ctx.last_frame, "changed\nB");
    }

    #[test]
    fn test_deferred_edit_applies_after_pass() {
        let mut ctx = test_ctx();
        let items = build_list(&mut ctx, &["A", "B"]);
        let mut source = DeferringSource {
            target: items[0],
            fired: false,
        };

        flush(&mut ctx, &mut source).unwrap();
        assert_eq!(ctx.last_frame, "A\nB");
        assert_eq!(ctx.tree.get(items[0]).unwrap().text.as_deref(), Some("later"));
        assert!(ctx.render_pending);

        flush(&mut ctx, &mut source).unwrap();
        assert_eq!(ctx.last_frame, "later\nB");
        assert!(!ctx.render_pending);
    }

    #[test]
    fn test_layout_flags_cleared_after_compose() {
        let mut ctx = test_ctx();
        build_list(&mut ctx, &["A"]);
        assert!(!invalidation::layout_dirty_nodes(&ctx.tree).is_empty());
        flush(&mut ctx, &mut TextFrameSource).unwrap();
        assert!(invalidation::layout_dirty_nodes(&ctx.tree).is_empty());
    }

    #[test]
    fn test_regions_from_id_props() {
        let mut ctx = test_ctx();
        let items = build_list(&mut ctx, &["first", "second\nwraps"]);
        ctx.set_prop(items[0], "id", "one").unwrap();
        ctx.set_prop(items[1], "id", "two").unwrap();
        flush(&mut ctx, &mut TextFrameSource).unwrap();

        assert_eq!(ctx.click_map.hit_test(1, 1), Some("one"));
        assert_eq!(ctx.click_map.hit_test(80, 2), Some("two"));
        assert_eq!(ctx.click_map.hit_test(3, 3), Some("two"));
        assert_eq!(ctx.click_map.hit_test(1, 4), None);
    }

    #[test]
    fn test_throttled_scroll_repaints_and_rebases_click_map() {
        let mut ctx = TuiContext::new(Box::new(MockBackend::new(80, 10)), EngineConfig::default());
        let text: Vec<String> = (0..100).map(|i| format!("line {i}")).collect();
        paint_frame(&mut ctx, text.join("\n"), vec![RawRegion::new("row5", 0, 5, 10, 1)]).unwrap();

        let t0 = Instant::now();
        let action = ctx.viewport.scroll_by(1, t0);
        assert!(apply_scroll(&mut ctx, action).unwrap().is_some());

        let action = ctx.viewport.scroll_by(1, t0 + Duration::from_millis(1));
        assert_eq!(action, ScrollAction::Deferred);
        assert_eq!(apply_scroll(&mut ctx, action).unwrap(), None);

        assert_eq!(tick(&mut ctx, t0 + Duration::from_millis(5)).unwrap(), None);
        assert!(tick(&mut ctx, t0 + Duration::from_millis(20)).unwrap().is_some());

        assert_eq!(ctx.viewport.scroll_offset(), 2);
        assert_eq!(ctx.click_map.regions()[0].screen_y, 3);
        assert_eq!(ctx.click_map.hit_test(1, 4), Some("row5"));
    }

    #[test]
    fn test_long_jump_rebuilds_click_map_and_redraws() {
        let mut ctx = TuiContext::new(Box::new(MockBackend::new(80, 10)), EngineConfig::default());
        let text: Vec<String> = (0..300).map(|i| format!("line {i}")).collect();
        let regions = vec![RawRegion::new("top", 0, 0, 5, 1), RawRegion::new("far", 0, 200, 5, 1)];
        paint_frame(&mut ctx, text.join("\n"), regions).unwrap();
        assert_eq!(ctx.click_map.len(), 1);

        let report = scroll_to(&mut ctx, 200).unwrap().unwrap();
        assert_eq!(report.strategy, RedrawStrategy::Full);
        assert_eq!(ctx.click_map.hit_test(1, 1), Some("far"));
        assert_eq!(scroll_to(&mut ctx, 200).unwrap(), None);
    }

    #[test]
    fn test_resize_forces_full_redraw() {
        let mut ctx = test_ctx();
        build_list(&mut ctx, &["A", "B"]);
        flush(&mut ctx, &mut TextFrameSource).unwrap();

        ctx.resize(60, 24);
        let report = flush(&mut ctx, &mut TextFrameSource).unwrap().unwrap();
        assert_eq!(report.strategy, RedrawStrategy::Full);
    }

    #[test]
    fn test_overlong_lines_truncated_to_width() {
        let mut ctx = TuiContext::new(Box::new(MockBackend::new(4, 24)), EngineConfig::default());
        build_list(&mut ctx, &["abcdefgh"]);
        flush(&mut ctx, &mut TextFrameSource).unwrap();
        let out = mock(&mut ctx).last_write().unwrap();
        assert!(out.contains("abcd"));
        assert!(!out.contains("abcde"));
    }

    #[test]
    fn test_indicator_row_painted() {
        let config = EngineConfig {
            viewport: ViewportConfig {
                show_indicator: true,
                ..ViewportConfig::default()
            },
            ..EngineConfig::default()
        };
        let mut ctx = TuiContext::new(Box::new(MockBackend::new(80, 5)), config);
        let text: Vec<String> = (0..12).map(|i| format!("l{i}")).collect();
        paint_frame(&mut ctx, text.join("\n"), Vec::new()).unwrap();

        let out = mock(&mut ctx).last_write().unwrap();
        assert!(out.contains("l3"));
        assert!(!out.contains("l4"));
        assert!(out.contains("-- rows 1-4 of 12 --"));
    }

    #[test]
    fn test_edit_during_compose_schedules_another_pass() {
        let mut ctx = test_ctx();
        let items = build_list(&mut ctx, &["A", "B"]);
        let mut source = EditingSource {
            target: items[1],
            fired: false,
        };

        flush(&mut ctx, &mut source).unwrap();
        assert_eq!(ctx.last_frame, "A\nB");
        assert!(ctx.render_pending);

        flush(&mut ctx, &mut source).unwrap();
        assert_eq!(ctx.last_frame, "A\nlate");
        assert!(!ctx.render_pending);
    }

    #[test]
    fn test_failed_deferred_edit_does_not_drop_the_rest() {
        let mut ctx = test_ctx();
        let items = build_list(&mut ctx, &["A", "B"]);
        let mut source = BatchDeferringSource {
            edits: vec![
                Edit::SetText {
                    handle: 999,
                    text: "nowhere".to_string(),
                },
                Edit::SetText {
                    handle: items[0],
                    text: "later".to_string(),
                },
            ],
        };

        let report = flush(&mut ctx, &mut source).unwrap();
        assert!(report.is_some());
        assert_eq!(ctx.tree.get(items[0]).unwrap().text.as_deref(), Some("later"));
        assert_eq!(ctx.perf_deferred_edit_failures, 1);
        assert!(ctx.render_pending);
    }

    #[test]
    fn test_failed_write_keeps_render_armed() {
        let mut ctx = test_ctx();
        let items = build_list(&mut ctx, &["A", "B"]);
        flush(&mut ctx, &mut TextFrameSource).unwrap();

        ctx.set_text(items[1], "Z").unwrap();
        mock(&mut ctx).fail_writes = true;
        assert!(flush(&mut ctx, &mut TextFrameSource).is_err());
        assert!(ctx.render_pending);

        mock(&mut ctx).fail_writes = false;
        let report = flush(&mut ctx, &mut TextFrameSource).unwrap().unwrap();
        assert_eq!(report.strategy, RedrawStrategy::Full);
        assert!(mock(&mut ctx).last_write().unwrap().contains('Z'));
        assert!(!ctx.render_pending);
    }

    #[test]
    fn test_structural_edits_after_paint() {
        let mut ctx = test_ctx();
        let root = ctx.create_node(NodeType::Root);
        ctx.set_root(root).unwrap();
        let boxed = ctx.create_node(NodeType::Container);
        let moved = ctx.create_node(NodeType::Text);
        let tail = ctx.create_node(NodeType::Text);
        ctx.set_text(moved, "moved").unwrap();
        ctx.set_text(tail, "u").unwrap();
        ctx.append_child(root, boxed).unwrap();
        ctx.append_child(boxed, moved).unwrap();
        ctx.append_child(root, tail).unwrap();
        flush(&mut ctx, &mut TextFrameSource).unwrap();
        assert_eq!(ctx.last_frame, "moved\nu");

        // Move to another parent: both the old and the new parent go stale
        ctx.append_child(root, moved).unwrap();
        assert!(ctx.tree.get(root).unwrap().cached_output.is_none());
        assert!(ctx.tree.get(boxed).unwrap().cached_output.is_none());
        flush(&mut ctx, &mut TextFrameSource).unwrap();
        assert_eq!(ctx.last_frame, "\nu\nmoved");

        ctx.remove_child(root, tail).unwrap();
        assert!(ctx.tree.get(root).unwrap().cached_output.is_none());
        flush(&mut ctx, &mut TextFrameSource).unwrap();
        assert_eq!(ctx.last_frame, "\nmoved");

        let writes = mock(&mut ctx).writes.len();
        ctx.destroy_node(moved).unwrap();
        assert!(ctx.tree.get(moved).is_none());
        assert!(ctx.tree.get(root).unwrap().cached_output.is_none());
        flush(&mut ctx, &mut TextFrameSource).unwrap();
        assert_eq!(ctx.last_frame, "");
        assert_eq!(mock(&mut ctx).writes.len(), writes + 1);
    }

    #[test]
    fn test_empty_container_region_clipped() {
        let mut ctx = test_ctx();
        let root = ctx.create_node(NodeType::Root);
        ctx.set_root(root).unwrap();
        ctx.set_prop(root, "id", "app").unwrap();
        flush(&mut ctx, &mut TextFrameSource).unwrap();

        assert_eq!(ctx.last_frame, "");
        assert!(ctx.last_regions.is_empty());
        assert_eq!(ctx.click_map.hit_test(1, 1), None);
    }
}
