//! Error type shared by every module.
//!
//! Only the edit API, configuration parsing and terminal I/O are fallible.
//! Scroll clamping, hit-test misses and cache misses are not errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TuiError {
    #[error("Handle(0) is the invalid sentinel")]
    InvalidSentinel,

    #[error("Invalid handle: {0}")]
    InvalidHandle(u32),

    #[error("Node {0} cannot have children")]
    NotAContainer(u32),

    #[error("Node {0} does not carry a text payload")]
    NotALeaf(u32),

    #[error("Node {child} is not a child of {parent}")]
    NotAChild { parent: u32, child: u32 },

    #[error("Inserting {child} under {parent} would create a cycle")]
    Cycle { parent: u32, child: u32 },

    #[error("Frame composition failed: {0}")]
    Compose(String),

    #[error("Terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T, E = TuiError> = std::result::Result<T, E>;
