//! Event Module — pointer and resize routing.
//!
//! Responsibilities:
//! - Read terminal input via TerminalBackend
//! - Resolve pointer presses to component ids through the click map
//! - Turn wheel input into throttled scrolling
//! - Apply resizes to every geometry-dependent component at once

use std::time::{Duration, Instant};

use tracing::trace;

use crate::context::TuiContext;
use crate::error::Result;
use crate::render;
use crate::types::{PointerAction, TerminalInputEvent};
use crate::writer::DiffReport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputOutcome {
    /// A press landed on an interactive region.
    Clicked { component_id: String, x: u16, y: u16 },
    /// Wheel input moved (or queued a move of) the viewport. `report` is set
    /// when a frame was painted right away.
    Scrolled { report: Option<DiffReport> },
    /// Dimensions applied; the next flush redraws in full.
    Resized { width: u16, height: u16 },
    Ignored,
}

/// Route one input event.
pub fn handle_input(ctx: &mut TuiContext, event: TerminalInputEvent, now: Instant) -> Result<InputOutcome> {
    match event {
        TerminalInputEvent::Pointer { x, y, action } => match action {
            PointerAction::Press => {
                let hit = ctx.click_map.hit_test(x, y).map(str::to_string);
                trace!(x, y, ?hit, "pointer press");
                Ok(match hit {
                    Some(component_id) => InputOutcome::Clicked { component_id, x, y },
                    None => InputOutcome::Ignored,
                })
            }
            PointerAction::WheelUp | PointerAction::WheelDown => {
                let step = ctx.config.viewport.wheel_step as i64;
                let delta = if action == PointerAction::WheelUp { -step } else { step };
                let scroll = ctx.viewport.scroll_by(delta, now);
                let report = render::apply_scroll(ctx, scroll)?;
                Ok(InputOutcome::Scrolled { report })
            }
            PointerAction::Release | PointerAction::Move => Ok(InputOutcome::Ignored),
        },
        TerminalInputEvent::Resize { width, height } => {
            ctx.resize(width, height);
            Ok(InputOutcome::Resized { width, height })
        }
    }
}

/// Read pending terminal input and route it. Returns every non-ignored outcome.
pub fn read_input(ctx: &mut TuiContext, timeout: Duration) -> Result<Vec<InputOutcome>> {
    let raw_events = ctx.backend.read_events(timeout);
    let now = Instant::now();
    let mut outcomes = Vec::with_capacity(raw_events.len());
    for raw in raw_events {
        let outcome = handle_input(ctx, raw, now)?;
        if outcome != InputOutcome::Ignored {
            outcomes.push(outcome);
        }
    }
    Ok(outcomes)
}
