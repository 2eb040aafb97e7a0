//! Writer Module — line-level terminal differ.
//!
//! Responsibilities:
//! - Compare the new frame to the previously painted one, line by line
//! - Choose between a full redraw and per-row patches
//! - Emit the bytes inside one synchronized-update envelope, in one write
//!
//! Rows are 0-based here and 1-based on the wire (crossterm's `MoveTo` handles
//! the shift).

use crossterm::cursor::{MoveTo, Show};
use crossterm::terminal::{BeginSynchronizedUpdate, Clear, ClearType, EndSynchronizedUpdate};
use crossterm::Command;
use tracing::{debug, warn};

use crate::config::DifferConfig;
use crate::error::Result;
use crate::terminal::TerminalBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedrawStrategy {
    /// Nothing changed; no bytes were written.
    Skipped,
    Full,
    Incremental,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffReport {
    pub strategy: RedrawStrategy,
    /// Rows whose content differed from the previous frame.
    pub changed_rows: Vec<usize>,
    pub bytes_written: usize,
}

impl DiffReport {
    fn skipped() -> Self {
        Self {
            strategy: RedrawStrategy::Skipped,
            changed_rows: Vec::new(),
            bytes_written: 0,
        }
    }
}

/// Append a command's escape sequence. Formatting into a `String` cannot fail.
fn push_command(out: &mut String, command: impl Command) {
    let _ = command.write_ansi(out);
}

pub struct TerminalWriter {
    prev_text: String,
    prev_lines: Vec<String>,
    out: String,
    row_table: Vec<String>,
    /// Set until a frame is fully painted; the screen contents are unknown.
    force_full: bool,
    config: DifferConfig,
}

impl TerminalWriter {
    pub fn new(config: &DifferConfig) -> Self {
        let row_table = (0..config.row_table_size)
            .map(|row| {
                let mut seq = String::new();
                push_command(&mut seq, MoveTo(0, row));
                seq
            })
            .collect();
        Self {
            prev_text: String::new(),
            prev_lines: Vec::new(),
            out: String::new(),
            row_table,
            force_full: true,
            config: config.clone(),
        }
    }

    fn move_to_row(&mut self, row: usize) {
        match self.row_table.get(row) {
            Some(seq) => self.out.push_str(seq),
            None => push_command(&mut self.out, MoveTo(0, row.min(u16::MAX as usize) as u16)),
        }
    }

    fn wants_full_redraw(&self, old_len: usize, new_len: usize, changed: usize) -> bool {
        if old_len == 0 || old_len.abs_diff(new_len) > self.config.full_redraw_line_delta {
            return true;
        }
        let larger = old_len.max(new_len) as f64;
        changed as f64 > larger * self.config.full_redraw_change_ratio
    }

    /// Paint `frame`, writing only what changed since the last call.
    pub fn render(&mut self, frame: &str, backend: &mut dyn TerminalBackend) -> Result<DiffReport> {
        if !self.force_full && frame == self.prev_text {
            return Ok(DiffReport::skipped());
        }

        let new_lines: Vec<&str> = if frame.is_empty() {
            Vec::new()
        } else {
            frame.split('\n').collect()
        };
        let old_len = self.prev_lines.len();
        let new_len = new_lines.len();

        let changed_rows: Vec<usize> = (0..old_len.max(new_len))
            .filter(|&i| self.prev_lines.get(i).map(String::as_str) != new_lines.get(i).copied())
            .collect();

        if changed_rows.is_empty() && !self.force_full {
            self.store(frame, &new_lines);
            return Ok(DiffReport::skipped());
        }

        let strategy = if self.force_full || self.wants_full_redraw(old_len, new_len, changed_rows.len()) {
            RedrawStrategy::Full
        } else {
            RedrawStrategy::Incremental
        };

        self.out.clear();
        push_command(&mut self.out, BeginSynchronizedUpdate);
        match strategy {
            RedrawStrategy::Full => self.write_full(&new_lines),
            _ => self.write_incremental(&new_lines, &changed_rows, old_len),
        }
        push_command(&mut self.out, EndSynchronizedUpdate);

        let written = backend.write(self.out.as_bytes()).and_then(|()| backend.flush());
        if let Err(e) = written {
            // The terminal's contents are unknown; repaint everything next time.
            warn!(error = %e, "frame write failed");
            self.clear();
            return Err(e);
        }

        let report = DiffReport {
            strategy,
            changed_rows,
            bytes_written: self.out.len(),
        };
        self.store(frame, &new_lines);
        self.force_full = false;
        debug!(
            ?report.strategy,
            rows = report.changed_rows.len(),
            bytes = report.bytes_written,
            "frame written"
        );
        Ok(report)
    }

    fn write_full(&mut self, lines: &[&str]) {
        push_command(&mut self.out, MoveTo(0, 0));
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                self.out.push_str("\r\n");
            }
            push_command(&mut self.out, Clear(ClearType::CurrentLine));
            self.out.push_str(line);
        }
        push_command(&mut self.out, Clear(ClearType::FromCursorDown));
    }

    fn write_incremental(&mut self, lines: &[&str], changed_rows: &[usize], old_len: usize) {
        for &row in changed_rows {
            let Some(line) = lines.get(row) else {
                break;
            };
            self.move_to_row(row);
            push_command(&mut self.out, Clear(ClearType::CurrentLine));
            self.out.push_str(line);
        }
        if lines.len() < old_len {
            self.move_to_row(lines.len());
            push_command(&mut self.out, Clear(ClearType::FromCursorDown));
        }
    }

    fn store(&mut self, frame: &str, lines: &[&str]) {
        self.prev_text.clear();
        self.prev_text.push_str(frame);
        self.prev_lines.clear();
        self.prev_lines.extend(lines.iter().map(|l| l.to_string()));
    }

    /// Forget the painted frame so the next render is a full redraw.
    pub fn clear(&mut self) {
        self.prev_text.clear();
        self.prev_lines.clear();
        self.force_full = true;
    }

    /// Reveal the cursor and forget all state.
    pub fn done(&mut self, backend: &mut dyn TerminalBackend) -> Result<()> {
        self.out.clear();
        push_command(&mut self.out, Show);
        self.clear();
        backend.write(self.out.as_bytes())?;
        backend.flush()
    }

    pub fn previous_line_count(&self) -> usize {
        self.prev_lines.len()
    }
}
