//! Pointer gesture recognition for press-and-hold radial menus.
//!
//! Recognizers consume raw [`PointerEvent`]s on the input path and only
//! touch shared cells or post messages; side effects happen wherever the
//! matching [`crate::dispatch::UiReceiver`] is drained.

pub mod hook;
pub mod long_press;
pub mod pan;

pub use hook::{
    GestureMsg, GestureShared, Pressable, RadialOverlay, RadialOverlayBindings,
    RadialOverlayController, RadialOverlayHook,
};
pub use long_press::LongPressGesture;
pub use pan::PanGesture;

use crate::geom::Point;
use serde::{Deserialize, Serialize};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    Cancel,
}

impl PointerPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Up | Self::Cancel)
    }
}

/// One pointer sample in absolute screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    pub position: Point,
    /// Pointers currently touching, including this one.
    pub pointers: u8,
    pub at: Instant,
}

impl PointerEvent {
    pub fn new(phase: PointerPhase, position: Point, at: Instant) -> Self {
        Self {
            phase,
            position,
            pointers: 1,
            at,
        }
    }

    pub fn with_pointers(mut self, pointers: u8) -> Self {
        self.pointers = pointers;
        self
    }
}

pub trait GestureRecognizer {
    fn handle(&mut self, event: &PointerEvent);

    /// Time-driven transitions (hold thresholds) that need no new event.
    fn poll(&mut self, _now: Instant) {}

    /// Runs once after a terminal event reached every recognizer of a group.
    fn finalize(&mut self);
}

/// Recognizers that observe the same pointer stream at once.
///
/// Each event reaches every member in insertion order; on a terminal event
/// all members are finalized only after all of them handled it.
#[derive(Default)]
pub struct Simultaneous {
    members: Vec<Box<dyn GestureRecognizer + Send>>,
}

impl Simultaneous {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, recognizer: impl GestureRecognizer + Send + 'static) -> Self {
        self.members.push(Box::new(recognizer));
        self
    }
}

impl GestureRecognizer for Simultaneous {
    fn handle(&mut self, event: &PointerEvent) {
        for member in &mut self.members {
            member.handle(event);
        }
        if event.phase.is_terminal() {
            self.finalize();
        }
    }

    fn poll(&mut self, now: Instant) {
        for member in &mut self.members {
            member.poll(now);
        }
    }

    fn finalize(&mut self) {
        for member in &mut self.members {
            member.finalize();
        }
    }
}
