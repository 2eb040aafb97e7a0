//! Click Map Module — spatial index over interactive rectangles.
//!
//! Responsibilities:
//! - Rebuild the region list from the layout pass (absolute → screen rows)
//! - Keep only regions near the viewport, capped to the most recently painted
//! - Answer hit-tests topmost-first
//! - Re-base screen rows on small scrolls without a rebuild

use tracing::debug;

use crate::config::ClickMapConfig;
use crate::types::RawRegion;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickRegion {
    pub component_id: String,
    pub x: u32,
    pub absolute_y: u32,
    /// Row relative to the current scroll position; negative above the viewport.
    pub screen_y: i64,
    pub width: u32,
    pub height: u32,
    pub paint_order: usize,
}

impl ClickRegion {
    /// Half-open containment in 0-indexed screen coordinates.
    fn contains(&self, x: i64, y: i64) -> bool {
        x >= self.x as i64
            && x < self.x as i64 + self.width as i64
            && y >= self.screen_y
            && y < self.screen_y + self.height as i64
    }
}

/// Result of [`ClickMap::adjust_for_scroll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollAdjust {
    Adjusted,
    /// The viewport left the buffered zone; regions outside it were never
    /// indexed, so the map is stale until rebuilt.
    NeedsRebuild,
}

#[derive(Debug)]
pub struct ClickMap {
    regions: Vec<ClickRegion>,
    scroll_offset: u32,
    built_offset: u32,
    viewport_height: u32,
    buffer_rows: u32,
    max_regions: usize,
    stale: bool,
}

impl ClickMap {
    pub fn new(config: &ClickMapConfig) -> Self {
        Self {
            regions: Vec::new(),
            scroll_offset: 0,
            built_offset: 0,
            viewport_height: 0,
            buffer_rows: config.buffer_rows,
            max_regions: config.max_regions.max(1),
            stale: true,
        }
    }

    /// Rebuild from the regions of one layout pass, given in paint order.
    pub fn build(&mut self, raw_regions: &[RawRegion], scroll_offset: u32, viewport_height: u32) {
        let top = -(self.buffer_rows as i64);
        let bottom = viewport_height as i64 + self.buffer_rows as i64;

        self.regions.clear();
        for (paint_order, raw) in raw_regions.iter().enumerate() {
            let screen_y = raw.absolute_y as i64 - scroll_offset as i64;
            if screen_y + raw.height as i64 <= top || screen_y >= bottom {
                continue;
            }
            self.regions.push(ClickRegion {
                component_id: raw.component_id.clone(),
                x: raw.x,
                absolute_y: raw.absolute_y,
                screen_y,
                width: raw.width,
                height: raw.height,
                paint_order,
            });
        }

        if self.regions.len() > self.max_regions {
            let excess = self.regions.len() - self.max_regions;
            self.regions.drain(..excess);
        }

        self.scroll_offset = scroll_offset;
        self.built_offset = scroll_offset;
        self.viewport_height = viewport_height;
        self.stale = false;
        debug!(
            raw = raw_regions.len(),
            kept = self.regions.len(),
            scroll_offset,
            "click map built"
        );
    }

    /// Topmost region under a 1-indexed terminal coordinate.
    pub fn hit_test(&self, terminal_x: u16, terminal_y: u16) -> Option<&str> {
        if terminal_x == 0 || terminal_y == 0 {
            return None;
        }
        let x = terminal_x as i64 - 1;
        let y = terminal_y as i64 - 1;
        self.regions
            .iter()
            .rev()
            .find(|r| r.contains(x, y))
            .map(|r| r.component_id.as_str())
    }

    /// Shift every region by the scroll delta.
    pub fn adjust_for_scroll(&mut self, new_offset: u32) -> ScrollAdjust {
        if self.stale || new_offset.abs_diff(self.built_offset) > self.buffer_rows {
            self.stale = true;
            return ScrollAdjust::NeedsRebuild;
        }
        let delta = new_offset as i64 - self.scroll_offset as i64;
        if delta != 0 {
            for region in &mut self.regions {
                region.screen_y -= delta;
            }
            self.scroll_offset = new_offset;
        }
        ScrollAdjust::Adjusted
    }

    /// Mark the index out of date; hit-tests keep answering from the old data.
    pub fn invalidate(&mut self) {
        self.stale = true;
    }

    pub fn clear(&mut self) {
        self.regions.clear();
        self.stale = true;
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn regions(&self) -> &[ClickRegion] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn scroll_offset(&self) -> u32 {
        self.scroll_offset
    }
}
