//! Viewport Module — scroll state for the painted frame.
//!
//! Responsibilities:
//! - Own the authoritative scroll offset and clamp it after every mutation
//! - Throttle wheel scrolling: leading edge applies at once, later deltas in
//!   the same window accumulate into one trailing repaint
//! - Follow the bottom of growing content when auto-scroll is on
//! - Slice the visible rows out of a frame

use std::ops::Range;
use std::time::{Duration, Instant};

use crate::config::ViewportConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewportState {
    pub scroll_offset: u32,
    pub content_height: u32,
    pub terminal_height: u16,
    pub terminal_width: u16,
    pub max_scroll_offset: u32,
}

/// What the caller should do after a scroll request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollAction {
    /// Position unchanged.
    None,
    /// Accumulated; a trailing repaint fires from [`Viewport::poll`].
    Deferred,
    /// Repaint now. `full` asks for a non-incremental redraw.
    Repaint { full: bool },
}

#[derive(Debug)]
pub struct Viewport {
    state: ViewportState,
    auto_scroll: bool,
    show_indicator: bool,
    throttle: Duration,
    window_start: Option<Instant>,
    pending: Option<i64>,
}

impl Viewport {
    pub fn new(config: &ViewportConfig, width: u16, height: u16) -> Self {
        Self {
            state: ViewportState {
                terminal_width: width,
                terminal_height: height,
                ..ViewportState::default()
            },
            auto_scroll: config.auto_scroll,
            show_indicator: config.show_indicator,
            throttle: config.throttle(),
            window_start: None,
            pending: None,
        }
    }

    pub fn state(&self) -> ViewportState {
        self.state
    }

    pub fn scroll_offset(&self) -> u32 {
        self.state.scroll_offset
    }

    fn indicator_visible(&self) -> bool {
        self.show_indicator
            && self.state.terminal_height > 1
            && self.state.content_height > self.state.terminal_height as u32
    }

    /// Rows available to content (the indicator takes one when shown).
    pub fn viewport_rows(&self) -> u32 {
        let rows = self.state.terminal_height as u32;
        if self.indicator_visible() {
            rows - 1
        } else {
            rows
        }
    }

    fn clamp(&mut self) {
        self.state.max_scroll_offset = self.state.content_height.saturating_sub(self.viewport_rows());
        self.state.scroll_offset = self.state.scroll_offset.min(self.state.max_scroll_offset);
    }

    /// Apply `delta` rows. Returns true if the offset moved.
    fn apply(&mut self, delta: i64) -> bool {
        let before = self.state.scroll_offset;
        let target = (before as i64 + delta).clamp(0, self.state.max_scroll_offset as i64);
        self.state.scroll_offset = target as u32;
        self.state.scroll_offset != before
    }

    fn repaint_for(&self, magnitude: i64) -> ScrollAction {
        ScrollAction::Repaint {
            full: magnitude.unsigned_abs() > self.state.terminal_height as u64 / 2,
        }
    }

    /// Update the content height from the latest frame. Returns true if the
    /// offset changed.
    pub fn set_content_height(&mut self, height: u32) -> bool {
        let before = self.state.scroll_offset;
        let was_at_bottom = before + 1 >= self.state.max_scroll_offset;
        let grew = height > self.state.content_height;

        self.state.content_height = height;
        self.clamp();
        if self.auto_scroll && was_at_bottom && grew {
            self.state.scroll_offset = self.state.max_scroll_offset;
        }
        self.state.scroll_offset != before
    }

    /// Returns true if the width changed (width-dependent caches are stale).
    pub fn resize(&mut self, width: u16, height: u16) -> bool {
        let width_changed = width != self.state.terminal_width;
        self.state.terminal_width = width;
        self.state.terminal_height = height;
        self.cancel_pending();
        self.clamp();
        width_changed
    }

    /// Scroll by `delta` rows (positive is down).
    pub fn scroll_by(&mut self, delta: i64, now: Instant) -> ScrollAction {
        if let Some(start) = self.window_start {
            if now < start + self.throttle {
                *self.pending.get_or_insert(0) += delta;
                return ScrollAction::Deferred;
            }
        }

        let total = self.pending.take().unwrap_or(0) + delta;
        self.window_start = Some(now);
        if self.apply(total) {
            self.repaint_for(total)
        } else {
            ScrollAction::None
        }
    }

    /// Fire the trailing scroll once its window has elapsed.
    pub fn poll(&mut self, now: Instant) -> ScrollAction {
        let Some(start) = self.window_start else {
            return ScrollAction::None;
        };
        if self.pending.is_none() || now < start + self.throttle {
            return ScrollAction::None;
        }
        let total = self.pending.take().unwrap_or(0);
        self.window_start = Some(now);
        if self.apply(total) {
            self.repaint_for(total)
        } else {
            ScrollAction::None
        }
    }

    /// When the pending trailing scroll is due, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.pending, self.window_start) {
            (Some(_), Some(start)) => Some(start + self.throttle),
            _ => None,
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn cancel_pending(&mut self) {
        self.pending = None;
        self.window_start = None;
    }

    /// Jump to an absolute offset. Returns true if the offset moved.
    pub fn scroll_to(&mut self, offset: u32) -> bool {
        self.cancel_pending();
        let before = self.state.scroll_offset;
        self.state.scroll_offset = offset.min(self.state.max_scroll_offset);
        self.state.scroll_offset != before
    }

    pub fn scroll_to_top(&mut self) -> bool {
        self.scroll_to(0)
    }

    pub fn scroll_to_bottom(&mut self) -> bool {
        self.scroll_to(self.state.max_scroll_offset)
    }

    pub fn visible_range(&self) -> Range<usize> {
        let start = self.state.scroll_offset as usize;
        let end = (start + self.viewport_rows() as usize).min(self.state.content_height as usize);
        start..end.max(start)
    }

    /// The visible rows of `lines`.
    pub fn slice<'a, T>(&self, lines: &'a [T]) -> &'a [T] {
        let range = self.visible_range();
        let end = range.end.min(lines.len());
        let start = range.start.min(end);
        &lines[start..end]
    }

    /// One-line position indicator, when enabled and the content overflows.
    pub fn indicator_line(&self) -> Option<String> {
        if !self.indicator_visible() {
            return None;
        }
        let range = self.visible_range();
        Some(format!(
            "-- rows {}-{} of {} --",
            range.start + 1,
            range.end,
            self.state.content_height
        ))
    }
}
