//! Shared helpers for the integration tests.

use std::time::Duration;

use kraken_paint::{Result, TerminalBackend, TerminalInputEvent};

/// Backend that records every byte written.
#[derive(Debug)]
pub struct RecordingBackend {
    pub width: u16,
    pub height: u16,
    pub bytes: Vec<u8>,
    pub writes: usize,
}

#[allow(dead_code)]
impl RecordingBackend {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            bytes: Vec::new(),
            writes: 0,
        }
    }

    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

impl TerminalBackend for RecordingBackend {
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
        self.bytes.extend_from_slice(bytes);
        self.writes += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_events(&mut self, _timeout: Duration) -> Vec<TerminalInputEvent> {
        Vec::new()
    }
}
