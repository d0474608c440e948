use crate::config::SpringConfig;
use crate::geom::lerp;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

const MAX_STEP: f64 = 1.0 / 240.0;
const MAX_FRAME: f64 = 0.05; // a stalled frame must not blow the spring up
const REST_DISTANCE: f64 = 1e-3;
const REST_VELOCITY: f64 = 1e-2;

/// Damped spring driven by frame deltas.
#[derive(Debug, Clone)]
pub struct Spring {
    cfg: SpringConfig,
    value: f64,
    velocity: f64,
    target: f64,
    settled: bool,
}

impl Spring {
    pub fn new(cfg: SpringConfig, from: f64, to: f64) -> Self {
        Self {
            cfg,
            value: from,
            velocity: 0.0,
            target: to,
            settled: from == to,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn is_settled(&self) -> bool {
        self.settled
    }

    pub fn retarget(&mut self, to: f64) {
        self.target = to;
        self.settled = self.value == to && self.velocity == 0.0;
    }

    pub fn step(&mut self, dt: Duration) -> f64 {
        if self.settled {
            return self.value;
        }

        let mut remaining = dt.as_secs_f64().min(MAX_FRAME);
        while remaining > 0.0 {
            let h = remaining.min(MAX_STEP);
            let force = -self.cfg.stiffness * (self.value - self.target);
            let damping = -self.cfg.damping * self.velocity;
            self.velocity += (force + damping) / self.cfg.mass.max(f64::EPSILON) * h;
            self.value += self.velocity * h;
            remaining -= h;
        }

        if (self.value - self.target).abs() < REST_DISTANCE && self.velocity.abs() < REST_VELOCITY {
            self.value = self.target;
            self.velocity = 0.0;
            self.settled = true;
        }
        self.value
    }
}

/// Source of frame timestamps.
pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock(Arc<Mutex<Instant>>);

impl ManualClock {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(at: Instant) -> Self {
        Self(Arc::new(Mutex::new(at)))
    }

    pub fn advance(&self, by: Duration) {
        *self.0.lock() += by;
    }

    pub fn set(&self, at: Instant) {
        *self.0.lock() = at;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.0.lock()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    Linear,
    #[default]
    EaseOutCubic,
    EaseInCubic,
}

impl Easing {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            Self::EaseInCubic => t * t * t,
        }
    }
}

/// Fixed-duration interpolation anchored at a start instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    pub from: f64,
    pub to: f64,
    pub start: Instant,
    pub duration: Duration,
    pub easing: Easing,
}

impl Tween {
    pub fn new(from: f64, to: f64, start: Instant, duration: Duration, easing: Easing) -> Self {
        Self {
            from,
            to,
            start,
            duration,
            easing,
        }
    }

    pub fn progress(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.start);
        elapsed.as_secs_f64() / self.duration.as_secs_f64()
    }

    pub fn value_at(&self, now: Instant) -> f64 {
        lerp(self.from, self.to, self.easing.apply(self.progress(now)))
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        self.progress(now) >= 1.0
    }

    pub fn end(&self) -> Instant {
        self.start + self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spring_settles_on_target() {
        let mut spring = Spring::new(SpringConfig::default(), 0.0, 1.0);
        let frame = Duration::from_millis(16);
        let mut peak: f64 = 0.0;
        for _ in 0..120 {
            peak = peak.max(spring.step(frame));
        }
        assert!(spring.is_settled());
        assert_eq!(spring.value(), 1.0);
        assert!(peak < 1.3, "overshoot too large: {peak}");
    }

    #[test]
    fn spring_ignores_huge_frame_gaps() {
        let mut spring = Spring::new(SpringConfig::default(), 0.0, 1.0);
        let v = spring.step(Duration::from_secs(10));
        assert!(v.is_finite());
        assert!(v < 1.5);
    }

    #[test]
    fn tween_endpoints() {
        let start = Instant::now();
        let tween = Tween::new(0.0, 10.0, start, Duration::from_millis(200), Easing::Linear);
        assert_eq!(tween.value_at(start), 0.0);
        assert!((tween.value_at(start + Duration::from_millis(100)) - 5.0).abs() < 1e-9);
        assert_eq!(tween.value_at(start + Duration::from_millis(400)), 10.0);
        assert!(!tween.is_finished(start + Duration::from_millis(199)));
        assert!(tween.is_finished(tween.end()));
    }

    #[test]
    fn easing_is_clamped() {
        for easing in [Easing::Linear, Easing::EaseOutCubic, Easing::EaseInCubic] {
            assert_eq!(easing.apply(-1.0), 0.0);
            assert_eq!(easing.apply(2.0), 1.0);
        }
    }
}
