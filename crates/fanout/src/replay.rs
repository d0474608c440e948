//! Replays a recorded pointer script through the recognizers, the hook and
//! the menu on a scripted clock, reporting how the session resolved.

use crate::action::{ActionId, ActionSpec, Symbol};
use crate::anim::ManualClock;
use crate::config::RadialConfig;
use crate::geom::{Point, Rect, Size};
use crate::gesture::{
    GestureRecognizer, PointerEvent, PointerPhase, Pressable, RadialOverlayHook, Simultaneous,
};
use crate::haptics::{Haptics, ImpactStyle};
use crate::overlay::{OverlayHandle, OverlayHost};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

fn default_frame_ms() -> u64 {
    16
}

fn default_actions() -> Vec<Symbol> {
    vec![Symbol::Star, Symbol::Bookmark, Symbol::Share]
}

#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    pub viewport: Size,
    /// Bounds of the pressed element; `null` replays a vanished element.
    #[serde(default)]
    pub element: Option<Rect>,
    #[serde(default = "default_actions")]
    pub actions: Vec<Symbol>,
    #[serde(default = "default_frame_ms")]
    pub frame_ms: u64,
    pub events: Vec<ScriptEvent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScriptEvent {
    pub phase: PointerPhase,
    pub at_ms: u64,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    /// Moves to the laid-out center of this action instead of `x`/`y`.
    #[serde(default)]
    pub target: Option<ActionId>,
    #[serde(default = "one")]
    pub pointers: u8,
}

fn one() -> u8 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum Outcome {
    Selected { action: ActionId },
    Cancelled,
    /// The overlay never opened.
    Idle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    #[serde(flatten)]
    pub outcome: Outcome,
    /// Base angle of the menu layout, if one was shown.
    pub base_angle: Option<f64>,
    pub haptics: Vec<String>,
}

#[derive(Debug, Default)]
struct TraceHaptics(RefCell<Vec<String>>);

impl Haptics for TraceHaptics {
    fn impact(&self, style: ImpactStyle) {
        log::debug!("haptic impact ({style})");
        self.0.borrow_mut().push(format!("impact:{style}"));
    }

    fn selection_changed(&self) {
        log::debug!("haptic selection");
        self.0.borrow_mut().push("selection".to_string());
    }
}

struct ScriptElement {
    bounds: Option<Rect>,
    viewport: Size,
}

impl Pressable for ScriptElement {
    type Visual = ();

    fn measure(&self) -> Option<Rect> {
        self.bounds
    }

    fn visual(&self) {}

    fn viewport(&self) -> Size {
        self.viewport
    }
}

pub fn run(script: &Script, cfg: &RadialConfig) -> Report {
    let t0 = Instant::now();
    let clock = ManualClock::starting_at(t0);
    let overlay = OverlayHandle::new(OverlayHost::with_clock(cfg, clock.clone()));
    let haptics = Rc::new(TraceHaptics::default());
    let outcome = Rc::new(RefCell::new(Outcome::Idle));

    let (selected, cancelled) = (outcome.clone(), outcome.clone());
    let (bindings, mut controller) = RadialOverlayHook::new(overlay.clone(), haptics.clone())
        .config(cfg)
        .actions(script.actions.iter().copied().map(ActionSpec::from_symbol).collect())
        .on_select(move |action, guard| {
            *selected.borrow_mut() = Outcome::Selected { action };
            guard.close();
        })
        .on_cancel(move || *cancelled.borrow_mut() = Outcome::Cancelled)
        .build(ScriptElement {
            bounds: script.element,
            viewport: script.viewport,
        });
    let mut gesture: Simultaneous = bindings.into_gesture();

    let frame = Duration::from_millis(script.frame_ms.max(1));
    let mut base_angle = None;
    let mut now = t0;

    let mut run_until = |until: Instant, gesture: &mut Simultaneous, now: &mut Instant| {
        while *now + frame <= until {
            *now += frame;
            clock.set(*now);
            gesture.poll(*now);
            controller.process();
            overlay.frame_menu(frame);
            controller.process();
            overlay.tick();
            if let Some(angle) = overlay.with_content(|c| c.menu.layout().base_angle) {
                base_angle = Some(angle);
            }
        }
    };

    for event in &script.events {
        let at = t0 + Duration::from_millis(event.at_ms);
        run_until(at, &mut gesture, &mut now);

        let position = event
            .target
            .as_ref()
            .and_then(|id| {
                overlay
                    .with_content(|c| c.menu.layout().target(id).map(|t| t.center))
                    .flatten()
            })
            .unwrap_or(Point::new(event.x, event.y));
        log::debug!("replay {:?} at {:?} (+{}ms)", event.phase, position, event.at_ms);
        gesture.handle(&PointerEvent::new(event.phase, position, at).with_pointers(event.pointers));
    }

    let settle = now + cfg.hide_duration() + frame * 4;
    run_until(settle, &mut gesture, &mut now);

    let outcome = outcome.borrow().clone();
    let haptics = haptics.0.borrow().clone();
    Report {
        outcome,
        base_angle,
        haptics,
    }
}
