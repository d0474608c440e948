use super::hook::{GestureMsg, GestureShared};
use super::{GestureRecognizer, PointerEvent, PointerPhase};
use crate::dispatch::UiSender;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Possible,
    Active,
    Failed,
}

/// Streams the pointer into [`GestureShared::pointer`] once the sibling long
/// press has qualified, and raises the release signal when the pointer lifts
/// while the overlay is open. Single pointer only.
pub struct PanGesture {
    state: State,
    shared: GestureShared,
    tx: UiSender<GestureMsg>,
}

impl PanGesture {
    pub fn new(shared: GestureShared, tx: UiSender<GestureMsg>) -> Self {
        Self {
            state: State::Idle,
            shared,
            tx,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == State::Active
    }

    fn try_activate(&mut self) {
        if self.state == State::Possible && self.shared.is_long_pressed.get() {
            self.state = State::Active;
        }
    }
}

impl GestureRecognizer for PanGesture {
    fn handle(&mut self, event: &PointerEvent) {
        if event.pointers > 1 {
            if self.state == State::Active && self.shared.overlay_open.get() {
                self.tx.post(GestureMsg::Interrupted);
            }
            self.state = State::Failed;
            return;
        }

        match event.phase {
            PointerPhase::Down => {
                if self.state == State::Idle {
                    self.state = State::Possible;
                }
            }
            PointerPhase::Move => {
                self.try_activate();
                if self.state == State::Active {
                    self.shared.pointer.set(event.position);
                }
            }
            PointerPhase::Up => {
                self.try_activate();
                if self.state == State::Active {
                    self.shared.pointer.set(event.position);
                    if self.shared.overlay_open.get() {
                        let n = self.shared.release.raise();
                        log::debug!("pan ended, release #{n}");
                    }
                }
            }
            PointerPhase::Cancel => {
                if self.state == State::Active && self.shared.overlay_open.get() {
                    self.tx.post(GestureMsg::Interrupted);
                }
            }
        }
    }

    fn poll(&mut self, _now: Instant) {
        self.try_activate();
    }

    fn finalize(&mut self) {
        self.state = State::Idle;
    }
}
