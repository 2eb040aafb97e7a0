//! TerminalBackend trait + CrosstermBackend implementation.
//!
//! The writer and the event router depend on this trait, not on crossterm
//! directly. This enables mock backends for testing and future backend
//! substitution.

use std::io::Write;
use std::time::Duration;

use crate::error::Result;
use crate::types::{PointerAction, TerminalInputEvent};

// ============================================================================
// TerminalBackend Trait
// ============================================================================

pub trait TerminalBackend {
    fn init(&mut self) -> Result<()>;
    fn shutdown(&mut self) -> Result<()>;
    fn size(&self) -> (u16, u16);
    /// Queue bytes for the terminal. One call per painted frame.
    fn write(&mut self, bytes: &[u8]) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
    fn read_events(&mut self, timeout: Duration) -> Vec<TerminalInputEvent>;

    /// Downcast support for test code.
    #[cfg(test)]
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;
}

// ============================================================================
// CrosstermBackend
// ============================================================================

pub struct CrosstermBackend {
    width: u16,
    height: u16,
    out: std::io::BufWriter<std::io::Stdout>,
}

impl CrosstermBackend {
    pub fn new() -> Self {
        let (w, h) = crossterm::terminal::size().unwrap_or((80, 24));
        Self {
            width: w,
            height: h,
            out: std::io::BufWriter::new(std::io::stdout()),
        }
    }
}

impl Default for CrosstermBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalBackend for CrosstermBackend {
    fn init(&mut self) -> Result<()> {
        use crossterm::{
            cursor,
            event::EnableMouseCapture,
            terminal::{enable_raw_mode, EnterAlternateScreen},
            ExecutableCommand,
        };

        enable_raw_mode()?;
        self.out.execute(EnterAlternateScreen)?;
        self.out.execute(EnableMouseCapture)?;
        // The writer paints whole lines; the OS cursor would otherwise trail
        // the last written row.
        self.out.execute(cursor::Hide)?;

        let (w, h) = crossterm::terminal::size().unwrap_or((80, 24));
        self.width = w;
        self.height = h;
        Ok(())
    }

    fn shutdown(&mut self) -> Result<()> {
        use crossterm::{
            cursor,
            event::DisableMouseCapture,
            terminal::{disable_raw_mode, LeaveAlternateScreen},
            ExecutableCommand,
        };

        self.out.execute(cursor::Show)?;
        self.out.execute(DisableMouseCapture)?;
        self.out.execute(LeaveAlternateScreen)?;
        disable_raw_mode()?;
        Ok(())
    }

    fn size(&self) -> (u16, u16) {
        crossterm::terminal::size().unwrap_or((self.width, self.height))
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.out.write_all(bytes)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    fn read_events(&mut self, timeout: Duration) -> Vec<TerminalInputEvent> {
        use crossterm::event::{self, Event, MouseButton, MouseEventKind};

        let mut events = Vec::new();

        if event::poll(timeout).unwrap_or(false) {
            while event::poll(Duration::ZERO).unwrap_or(false) {
                match event::read() {
                    Ok(Event::Mouse(mouse_event)) => {
                        let action = match mouse_event.kind {
                            MouseEventKind::Down(MouseButton::Left) => PointerAction::Press,
                            MouseEventKind::Up(MouseButton::Left) => PointerAction::Release,
                            MouseEventKind::Moved | MouseEventKind::Drag(_) => PointerAction::Move,
                            MouseEventKind::ScrollUp => PointerAction::WheelUp,
                            MouseEventKind::ScrollDown => PointerAction::WheelDown,
                            _ => continue,
                        };
                        // crossterm reports 0-based cells; terminals and the click map use 1-based
                        events.push(TerminalInputEvent::Pointer {
                            x: mouse_event.column.saturating_add(1),
                            y: mouse_event.row.saturating_add(1),
                            action,
                        });
                    }
                    Ok(Event::Resize(w, h)) => {
                        self.width = w;
                        self.height = h;
                        events.push(TerminalInputEvent::Resize {
                            width: w,
                            height: h,
                        });
                    }
                    Ok(_) => {}
                    Err(_) => break,
                }
            }
        }

        events
    }

    #[cfg(test)]
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

// ============================================================================
// HeadlessBackend (for CI environments without a terminal)
// ============================================================================

pub struct HeadlessBackend {
    pub width: u16,
    pub height: u16,
}

impl HeadlessBackend {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

impl TerminalBackend for HeadlessBackend {
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    fn shutdown(&mut self) -> Result<()> {
        Ok(())
    }

    fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    fn write(&mut self, _bytes: &[u8]) -> Result<()> {
        Ok(()) // Discard output
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_events(&mut self, _timeout: Duration) -> Vec<TerminalInputEvent> {
        Vec::new()
    }

    #[cfg(test)]
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

// ============================================================================
// MockBackend (for Rust unit tests only)
// ============================================================================

#[cfg(test)]
pub struct MockBackend {
    pub width: u16,
    pub height: u16,
    /// Every `write` call, in order.
    pub writes: Vec<Vec<u8>>,
    pub flushes: usize,
    pub injected_events: Vec<TerminalInputEvent>,
    pub fail_writes: bool,
}

#[cfg(test)]
impl MockBackend {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            writes: Vec::new(),
            flushes: 0,
            injected_events: Vec::new(),
            fail_writes: false,
        }
    }

    /// Everything written so far, as text.
    pub fn output(&self) -> String {
        self.writes
            .iter()
            .map(|w| String::from_utf8_lossy(w).into_owned())
            .collect()
    }

    pub fn last_write(&self) -> Option<String> {
        self.writes
            .last()
            .map(|w| String::from_utf8_lossy(w).into_owned())
    }
}

#[cfg(test)]
impl TerminalBackend for MockBackend {
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    fn shutdown(&mut self) -> Result<()> {
        Ok(())
    }

    fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        if self.fail_writes {
            return Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "mock write failure").into());
        }
        self.writes.push(bytes.to_vec());
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.flushes += 1;
        Ok(())
    }

    fn read_events(&mut self, _timeout: Duration) -> Vec<TerminalInputEvent> {
        std::mem::take(&mut self.injected_events)
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}
