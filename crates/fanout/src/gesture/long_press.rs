use super::hook::{GestureMsg, GestureShared};
use super::{GestureRecognizer, PointerEvent, PointerPhase};
use crate::config::RadialConfig;
use crate::dispatch::UiSender;
use crate::geom::Point;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    Idle,
    Pending { origin: Point, last: Point, down_at: Instant },
    Active,
    Failed,
}

/// Qualifies a press held for `min_duration` without travelling further
/// than `max_travel`.
pub struct LongPressGesture {
    min_duration: Duration,
    max_travel: f64,
    state: State,
    shared: GestureShared,
    tx: UiSender<GestureMsg>,
}

impl LongPressGesture {
    pub fn new(cfg: &RadialConfig, shared: GestureShared, tx: UiSender<GestureMsg>) -> Self {
        Self {
            min_duration: cfg.long_press_duration(),
            max_travel: cfg.long_press_max_travel,
            state: State::Idle,
            shared,
            tx,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == State::Active
    }

    fn fail(&mut self, reason: &str) {
        log::debug!("long press failed: {reason}");
        self.state = State::Failed;
    }

    fn activate(&mut self, at: Point) {
        self.state = State::Active;
        self.shared.is_long_pressed.set(true);
        self.shared.origin.set(at);
        self.shared.pointer.set(at);
        log::debug!("long press began at ({:.0}, {:.0})", at.x, at.y);
        self.tx.post(GestureMsg::LongPressStarted(at));
    }
}

impl GestureRecognizer for LongPressGesture {
    fn handle(&mut self, event: &PointerEvent) {
        match (self.state, event.phase) {
            (_, PointerPhase::Down) if event.pointers > 1 => {
                if self.state != State::Active {
                    self.fail("multiple pointers");
                }
            }
            (State::Idle, PointerPhase::Down) => {
                self.state = State::Pending {
                    origin: event.position,
                    last: event.position,
                    down_at: event.at,
                };
            }
            (State::Pending { origin, down_at, .. }, PointerPhase::Move) => {
                if event.pointers > 1 {
                    self.fail("multiple pointers");
                } else if event.position.distance(origin) > self.max_travel {
                    self.fail("moved too far");
                } else if event.at.saturating_duration_since(down_at) >= self.min_duration {
                    self.activate(event.position);
                } else {
                    self.state = State::Pending {
                        origin,
                        last: event.position,
                        down_at,
                    };
                }
            }
            (State::Pending { .. }, phase) if phase.is_terminal() => {
                self.fail("released before threshold");
            }
            _ => {}
        }
    }

    fn poll(&mut self, now: Instant) {
        if let State::Pending { last, down_at, .. } = self.state
            && now.saturating_duration_since(down_at) >= self.min_duration
        {
            self.activate(last);
        }
    }

    fn finalize(&mut self) {
        let was_active = self.state == State::Active;
        self.state = State::Idle;
        self.shared.is_long_pressed.set(false);
        if was_active {
            self.tx.post(GestureMsg::Finalized);
        }
    }
}
