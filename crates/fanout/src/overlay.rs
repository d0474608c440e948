//! Single-slot full-screen overlay.
//!
//! At most one session exists. `show` on a live session swaps its content in
//! place; `hide` fades out and the content is only dropped once the exit
//! duration has fully elapsed, so it stays queryable until then.

use crate::anim::{Clock, Easing, SystemClock, Tween};
use crate::config::RadialConfig;
use crate::geom::lerp;
use parking_lot::{Mutex, MutexGuard};
use rand::Rng;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const MAX_BLUR: f64 = 14.0;

/// Identifies one piece of content shown by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlayTicket(u64);

/// Small tilt and zoom applied to injected content as it appears.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Flourish {
    pub rotation: f64,
    pub scale: f64,
}

impl Flourish {
    pub const NONE: Self = Self {
        rotation: 0.0,
        scale: 1.0,
    };

    pub fn random(rng: &mut impl Rng) -> Self {
        let rotation = rng.random_range(2.0..=4.0);
        Self {
            rotation: if rng.random_bool(0.5) { rotation } else { -rotation },
            scale: rng.random_range(1.02..=1.06),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayLayer {
    Backdrop,
    Content,
}

impl OverlayLayer {
    /// The blurred backdrop lets touches through; the content takes them.
    pub fn intercepts_pointer(self) -> bool {
        matches!(self, Self::Content)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Transition {
    Entering(Tween),
    Visible,
    Exiting { fade: Tween, unmount_at: Instant },
}

#[derive(Debug)]
pub struct OverlaySession<C> {
    content: Option<C>,
    ticket: OverlayTicket,
    transition: Transition,
    flourish: Flourish,
    shown_at: Instant,
}

impl<C> OverlaySession<C> {
    pub fn content(&self) -> Option<&C> {
        self.content.as_ref()
    }

    pub fn ticket(&self) -> OverlayTicket {
        self.ticket
    }

    pub fn is_exiting(&self) -> bool {
        matches!(self.transition, Transition::Exiting { .. })
    }

    fn opacity(&self, now: Instant) -> f64 {
        match self.transition {
            Transition::Entering(tween) => tween.value_at(now),
            Transition::Visible => 1.0,
            Transition::Exiting { fade, .. } => fade.value_at(now),
        }
    }
}

/// Per-frame presentation values for the backdrop and the content layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayFrame {
    pub opacity: f64,
    pub blur: f64,
    pub content_rotation: f64,
    pub content_scale: f64,
}

pub struct OverlayHost<C> {
    slot: Option<OverlaySession<C>>,
    show_duration: Duration,
    hide_duration: Duration,
    next_ticket: u64,
    clock: Box<dyn Clock + Send>,
}

impl<C> OverlayHost<C> {
    pub fn new(cfg: &RadialConfig) -> Self {
        Self::with_clock(cfg, SystemClock)
    }

    pub fn with_clock(cfg: &RadialConfig, clock: impl Clock + Send + 'static) -> Self {
        Self {
            slot: None,
            show_duration: cfg.show_duration(),
            hide_duration: cfg.hide_duration(),
            next_ticket: 0,
            clock: Box::new(clock),
        }
    }

    pub fn set_durations(&mut self, show: Duration, hide: Duration) {
        self.show_duration = show;
        self.hide_duration = hide;
    }

    fn ticket(&mut self) -> OverlayTicket {
        self.next_ticket += 1;
        OverlayTicket(self.next_ticket)
    }

    pub fn show(&mut self, content: Option<C>) -> OverlayTicket {
        let now = self.clock.now();
        let ticket = self.ticket();
        let show_duration = self.show_duration;

        match self.slot.as_mut() {
            Some(session) => {
                if let Transition::Exiting { .. } = session.transition {
                    let from = session.opacity(now);
                    session.transition = Transition::Entering(Tween::new(
                        from,
                        1.0,
                        now,
                        show_duration,
                        Easing::EaseOutCubic,
                    ));
                    log::debug!("overlay exit cancelled by show");
                }
                session.content = content;
                session.ticket = ticket;
            }
            None => {
                let flourish = if content.is_some() {
                    Flourish::random(&mut rand::rng())
                } else {
                    Flourish::NONE
                };
                self.slot = Some(OverlaySession {
                    content,
                    ticket,
                    transition: Transition::Entering(Tween::new(
                        0.0,
                        1.0,
                        now,
                        show_duration,
                        Easing::EaseOutCubic,
                    )),
                    flourish,
                    shown_at: now,
                });
                log::info!("overlay shown");
            }
        }
        ticket
    }

    pub fn hide(&mut self) {
        let now = self.clock.now();
        let hide_duration = self.hide_duration;
        let Some(session) = self.slot.as_mut() else {
            return;
        };
        if session.is_exiting() {
            return;
        }
        let fade = Tween::new(
            session.opacity(now),
            0.0,
            now,
            hide_duration,
            Easing::EaseInCubic,
        );
        session.transition = Transition::Exiting {
            fade,
            unmount_at: now + hide_duration,
        };
        log::debug!("overlay hiding");
    }

    /// Hides only if `ticket` still names the current content.
    pub fn hide_ticket(&mut self, ticket: OverlayTicket) -> bool {
        if self.slot.as_ref().is_some_and(|s| s.ticket == ticket) {
            self.hide();
            true
        } else {
            false
        }
    }

    /// Advances transitions and unmounts a session whose exit has finished.
    pub fn tick(&mut self) -> Option<OverlayFrame> {
        let now = self.clock.now();
        let session = self.slot.as_mut()?;
        let transition = session.transition;
        match transition {
            Transition::Exiting { unmount_at, .. } if now >= unmount_at => {
                self.slot = None;
                log::info!("overlay unmounted");
                return None;
            }
            Transition::Entering(tween) if tween.is_finished(now) => {
                session.transition = Transition::Visible;
            }
            _ => {}
        }

        let opacity = session.opacity(now);
        let entrance = Easing::EaseOutCubic.apply(
            now.saturating_duration_since(session.shown_at).as_secs_f64()
                / self.show_duration.as_secs_f64().max(f64::EPSILON),
        );
        Some(OverlayFrame {
            opacity,
            blur: opacity * MAX_BLUR,
            content_rotation: session.flourish.rotation * entrance,
            content_scale: lerp(1.0, session.flourish.scale, entrance),
        })
    }

    pub fn session(&self) -> Option<&OverlaySession<C>> {
        self.slot.as_ref()
    }

    pub fn content(&self) -> Option<&C> {
        self.slot.as_ref()?.content.as_ref()
    }

    pub fn content_mut(&mut self) -> Option<&mut C> {
        self.slot.as_mut()?.content.as_mut()
    }

    pub fn is_mounted(&self) -> bool {
        self.slot.is_some()
    }

    /// Mounted and not on its way out.
    pub fn is_visible(&self) -> bool {
        self.slot.as_ref().is_some_and(|s| !s.is_exiting())
    }
}

/// Shared handle to the one overlay host, handed to whoever needs to present.
pub struct OverlayHandle<C> {
    host: Arc<Mutex<OverlayHost<C>>>,
}

impl<C> Clone for OverlayHandle<C> {
    fn clone(&self) -> Self {
        Self {
            host: Arc::clone(&self.host),
        }
    }
}

impl<C: 'static> OverlayHandle<C> {
    pub fn new(host: OverlayHost<C>) -> Self {
        Self {
            host: Arc::new(Mutex::new(host)),
        }
    }

    /// Locks the host. Do not call back into the handle while holding it.
    pub fn lock(&self) -> MutexGuard<'_, OverlayHost<C>> {
        self.host.lock()
    }

    pub fn show(&self, content: Option<C>) -> OverlayTicket {
        self.host.lock().show(content)
    }

    pub fn hide(&self) {
        self.host.lock().hide();
    }

    pub fn hide_ticket(&self, ticket: OverlayTicket) -> bool {
        self.host.lock().hide_ticket(ticket)
    }

    pub fn tick(&self) -> Option<OverlayFrame> {
        self.host.lock().tick()
    }

    pub fn is_visible(&self) -> bool {
        self.host.lock().is_visible()
    }

    pub fn is_mounted(&self) -> bool {
        self.host.lock().is_mounted()
    }

    pub fn with_content<R>(&self, f: impl FnOnce(&mut C) -> R) -> Option<R> {
        self.host.lock().content_mut().map(f)
    }

    /// Guard that hides `ticket`'s content when dropped.
    pub fn close_guard(&self, ticket: OverlayTicket) -> CloseGuard {
        let handle = self.clone();
        CloseGuard::new(move || {
            handle.hide_ticket(ticket);
        })
    }
}

/// Runs its close action exactly once: on `close` or on drop, whichever
/// comes first. Dropping it on an error or panic path still closes.
#[must_use = "dropping the guard closes the overlay immediately"]
pub struct CloseGuard {
    on_close: Option<Box<dyn FnOnce()>>,
}

impl CloseGuard {
    pub fn new(on_close: impl FnOnce() + 'static) -> Self {
        Self {
            on_close: Some(Box::new(on_close)),
        }
    }

    /// Adds `f` to run after the existing close action.
    pub fn then(mut self, f: impl FnOnce() + 'static) -> Self {
        let first = self.on_close.take();
        self.on_close = Some(Box::new(move || {
            if let Some(first) = first {
                first();
            }
            f();
        }));
        self
    }

    pub fn close(mut self) {
        self.run();
    }

    fn run(&mut self) {
        if let Some(f) = self.on_close.take() {
            f();
        }
    }
}

impl Drop for CloseGuard {
    fn drop(&mut self) {
        self.run();
    }
}

impl std::fmt::Debug for CloseGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloseGuard")
            .field("armed", &self.on_close.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anim::ManualClock;
    use std::cell::Cell;
    use std::rc::Rc;

    fn host() -> (OverlayHost<&'static str>, ManualClock) {
        let clock = ManualClock::new();
        (
            OverlayHost::with_clock(&RadialConfig::default(), clock.clone()),
            clock,
        )
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn show_fades_in_over_show_duration() {
        let (mut host, clock) = host();
        host.show(Some("card"));
        assert_eq!(host.tick().unwrap().opacity, 0.0);
        clock.advance(ms(150));
        let mid = host.tick().unwrap().opacity;
        assert!(mid > 0.0 && mid < 1.0);
        clock.advance(ms(150));
        let frame = host.tick().unwrap();
        assert_eq!(frame.opacity, 1.0);
        assert!((frame.blur - MAX_BLUR).abs() < 1e-9);
        assert!(frame.content_rotation.abs() >= 2.0);
        assert!(frame.content_scale > 1.0);
    }

    #[test]
    fn hide_keeps_content_for_the_full_exit() {
        let (mut host, clock) = host();
        host.show(Some("card"));
        clock.advance(ms(400));
        host.tick();

        host.hide();
        assert!(!host.is_visible());
        clock.advance(ms(199));
        assert!(host.tick().is_some());
        assert_eq!(host.content(), Some(&"card"));

        clock.advance(ms(1));
        assert!(host.tick().is_none());
        assert!(!host.is_mounted());
        assert_eq!(host.content(), None);
    }

    #[test]
    fn show_while_visible_swaps_content_without_replaying() {
        let (mut host, clock) = host();
        let first = host.show(Some("a"));
        clock.advance(ms(400));
        host.tick();

        let second = host.show(Some("b"));
        assert_ne!(first, second);
        assert_eq!(host.content(), Some(&"b"));
        assert_eq!(host.tick().unwrap().opacity, 1.0);
    }

    #[test]
    fn show_during_exit_cancels_unmount() {
        let (mut host, clock) = host();
        host.show(Some("a"));
        clock.advance(ms(400));
        host.hide();
        clock.advance(ms(100));
        let fading = host.tick().unwrap().opacity;

        host.show(Some("b"));
        assert!(host.is_visible());
        assert!((host.tick().unwrap().opacity - fading).abs() < 1e-9);
        clock.advance(ms(500));
        assert!(host.tick().is_some());
        assert_eq!(host.content(), Some(&"b"));
    }

    #[test]
    fn hide_twice_does_not_extend_exit() {
        let (mut host, clock) = host();
        host.show(None);
        host.hide();
        clock.advance(ms(150));
        host.hide();
        clock.advance(ms(50));
        assert!(host.tick().is_none());
    }

    #[test]
    fn stale_ticket_does_not_close_newer_content() {
        let (mut host, _clock) = host();
        let old = host.show(Some("a"));
        let new = host.show(Some("b"));
        assert!(!host.hide_ticket(old));
        assert!(host.is_visible());
        assert!(host.hide_ticket(new));
        assert!(!host.is_visible());
    }

    #[test]
    fn close_guard_hides_on_drop_even_after_panic() {
        let clock = ManualClock::new();
        let handle = OverlayHandle::new(OverlayHost::<u8>::with_clock(
            &RadialConfig::default(),
            clock.clone(),
        ));
        let ticket = handle.show(Some(1));
        let guard = handle.close_guard(ticket);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _guard = guard;
            panic!("action failed");
        }));
        assert!(result.is_err());
        assert!(!handle.is_visible());
        clock.advance(ms(200));
        assert!(handle.tick().is_none());
    }

    #[test]
    fn close_guard_runs_once() {
        let runs = Rc::new(Cell::new(0));
        let counter = runs.clone();
        let guard = CloseGuard::new(move || counter.set(counter.get() + 1));
        let after = runs.clone();
        let guard = guard.then(move || after.set(after.get() + 10));
        guard.close();
        assert_eq!(runs.get(), 11);
    }

    #[test]
    fn only_content_layer_takes_touches() {
        assert!(!OverlayLayer::Backdrop.intercepts_pointer());
        assert!(OverlayLayer::Content.intercepts_pointer());
    }
}
