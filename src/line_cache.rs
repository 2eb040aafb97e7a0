//! Line Cache Module — bounded memoization of width and truncation.
//!
//! Responsibilities:
//! - Memoize line display width (one LRU)
//! - Memoize truncated forms, sharded by target width into LRU buckets
//! - Prepare the visible slice of a frame: truncate overlong lines, optionally
//!   pad every line to the full width with a fill code
//!
//! Worst-case entry count is `width_capacity + buckets * bucket_capacity`,
//! however many distinct widths a session requests.

use std::num::NonZeroUsize;

use lru::LruCache;
use tracing::trace;

use crate::config::LineCacheConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineCacheStats {
    pub width_hits: u64,
    pub width_misses: u64,
    pub truncate_hits: u64,
    pub truncate_misses: u64,
}

pub struct LineCache {
    widths: LruCache<String, usize>,
    truncated: LruCache<usize, LruCache<String, String>>,
    bucket_capacity: NonZeroUsize,
    stats: LineCacheStats,
}

fn non_zero(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).unwrap_or(NonZeroUsize::MIN)
}

impl LineCache {
    pub fn new(config: &LineCacheConfig) -> Self {
        Self {
            widths: LruCache::new(non_zero(config.width_capacity)),
            truncated: LruCache::new(non_zero(config.truncate_buckets)),
            bucket_capacity: non_zero(config.truncate_bucket_capacity),
            stats: LineCacheStats::default(),
        }
    }

    /// Width of `line`, computed by `width_fn` on a miss.
    pub fn get_cached_width(&mut self, line: &str, width_fn: impl FnOnce(&str) -> usize) -> usize {
        if let Some(&width) = self.widths.get(line) {
            self.stats.width_hits += 1;
            return width;
        }
        self.stats.width_misses += 1;
        let width = width_fn(line);
        self.widths.put(line.to_string(), width);
        width
    }

    /// `line` cut to `max_width`, computed by `truncate_fn` on a miss.
    pub fn get_cached_truncate(
        &mut self,
        line: &str,
        max_width: usize,
        truncate_fn: impl FnOnce(&str, usize) -> String,
    ) -> String {
        if let Some(hit) = self.truncated.get_mut(&max_width).and_then(|b| b.get(line)) {
            self.stats.truncate_hits += 1;
            return hit.clone();
        }
        self.stats.truncate_misses += 1;
        let result = truncate_fn(line, max_width);

        let bucket_capacity = self.bucket_capacity;
        let bucket = self
            .truncated
            .get_or_insert_mut(max_width, || LruCache::new(bucket_capacity));
        bucket.put(line.to_string(), result.clone());
        trace!(max_width, buckets = self.truncated.len(), "truncate cache miss");
        result
    }

    /// Fit every line to `max_width`.
    ///
    /// Lines wider than `max_width` are truncated. With a `fill_code`, every line
    /// is padded with spaces to exactly `max_width`, the fill re-applied after
    /// the content in case the line reset its own styling.
    pub fn process_visible_lines<W, T>(
        &mut self,
        lines: &[&str],
        max_width: usize,
        mut width_fn: W,
        mut truncate_fn: T,
        fill_code: Option<&str>,
    ) -> Vec<String>
    where
        W: FnMut(&str) -> usize,
        T: FnMut(&str, usize) -> String,
    {
        let mut out = Vec::with_capacity(lines.len());
        for &line in lines {
            let width = self.get_cached_width(line, &mut width_fn);
            let (mut text, width) = if width > max_width {
                let cut = self.get_cached_truncate(line, max_width, &mut truncate_fn);
                let cut_width = self.get_cached_width(&cut, &mut width_fn);
                (cut, cut_width)
            } else {
                (line.to_string(), width)
            };

            if let Some(fill) = fill_code {
                let mut padded = String::with_capacity(fill.len() * 2 + text.len() + max_width);
                padded.push_str(fill);
                padded.push_str(&text);
                padded.push_str(fill);
                padded.extend(std::iter::repeat(' ').take(max_width.saturating_sub(width)));
                text = padded;
            }
            out.push(text);
        }
        out
    }

    /// Drop every entry. Must be called when the terminal width changes.
    pub fn clear_all(&mut self) {
        self.widths.clear();
        self.truncated.clear();
    }

    pub fn width_len(&self) -> usize {
        self.widths.len()
    }

    pub fn truncate_len(&self) -> usize {
        self.truncated.iter().map(|(_, bucket)| bucket.len()).sum()
    }

    pub fn bucket_count(&self) -> usize {
        self.truncated.len()
    }

    pub fn len(&self) -> usize {
        self.width_len() + self.truncate_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> LineCacheStats {
        self.stats
    }
}
