//! Config Module — tuning constants for every subsystem.
//!
//! All thresholds are defaults, not invariants. A host may override any of them
//! from JSON; missing fields keep their default.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub differ: DifferConfig,
    pub line_cache: LineCacheConfig,
    pub click_map: ClickMapConfig,
    pub viewport: ViewportConfig,
    pub invalidation: InvalidationConfig,
}

impl EngineConfig {
    /// Parse a (possibly partial) JSON document and normalize it.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        Ok(config.normalized())
    }

    /// Replace zero capacities with one and keep ratios within `[0, 1]`.
    pub fn normalized(mut self) -> Self {
        self.differ.full_redraw_change_ratio = self.differ.full_redraw_change_ratio.clamp(0.0, 1.0);
        self.line_cache.width_capacity = self.line_cache.width_capacity.max(1);
        self.line_cache.truncate_buckets = self.line_cache.truncate_buckets.max(1);
        self.line_cache.truncate_bucket_capacity = self.line_cache.truncate_bucket_capacity.max(1);
        self.click_map.max_regions = self.click_map.max_regions.max(1);
        self.invalidation.max_nodes = self.invalidation.max_nodes.max(1);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifferConfig {
    /// Line-count change above which the differ repaints everything.
    pub full_redraw_line_delta: usize,
    /// Fraction of changed lines (of the larger frame) above which the differ repaints everything.
    pub full_redraw_change_ratio: f64,
    /// Rows whose cursor-move sequence is precomputed.
    pub row_table_size: u16,
}

impl Default for DifferConfig {
    fn default() -> Self {
        Self {
            full_redraw_line_delta: 20,
            full_redraw_change_ratio: 0.7,
            row_table_size: 64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineCacheConfig {
    pub width_capacity: usize,
    pub truncate_buckets: usize,
    pub truncate_bucket_capacity: usize,
}

impl Default for LineCacheConfig {
    fn default() -> Self {
        Self {
            width_capacity: 2000,
            truncate_buckets: 5,
            truncate_bucket_capacity: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClickMapConfig {
    /// Rows kept above and below the viewport so small scrolls can re-base instead of rebuild.
    pub buffer_rows: u32,
    pub max_regions: usize,
}

impl Default for ClickMapConfig {
    fn default() -> Self {
        Self {
            buffer_rows: 50,
            max_regions: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub scroll_throttle_ms: u64,
    pub wheel_step: u32,
    pub auto_scroll: bool,
    pub show_indicator: bool,
    /// SGR sequence used to pad every visible line to the full terminal width.
    pub fill_code: Option<String>,
}

impl ViewportConfig {
    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.scroll_throttle_ms)
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            scroll_throttle_ms: 16,
            wheel_step: 3,
            auto_scroll: false,
            show_indicator: false,
            fill_code: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvalidationConfig {
    /// Upper bound on nodes visited by one recursive invalidation.
    pub max_nodes: usize,
}

impl Default for InvalidationConfig {
    fn default() -> Self {
        Self { max_nodes: 10_000 }
    }
}
