use crate::action::{ActionId, ActionSpec};
use crate::anim::Spring;
use crate::config::RadialConfig;
use crate::dispatch::UiSender;
use crate::geom::{Point, Size, lerp};
use crate::haptics::{Haptics, ImpactStyle};
use crate::hover::HoverTracker;
use crate::layout::{ButtonTarget, RadialLayout};
use crate::signal::{ReleaseObserver, ReleaseSignal, SharedValue};
use std::time::Duration;

const MIN_ENTRANCE_SIZE: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuPhase {
    Entering,
    Tracking,
    Resolved,
}

/// What the menu reports to the UI context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuEvent {
    HoverEntered(ActionId),
    Selected(ActionId),
    Cancelled,
}

impl MenuEvent {
    pub fn apply_haptics(&self, haptics: &dyn Haptics) {
        match self {
            Self::HoverEntered(_) => haptics.selection_changed(),
            Self::Selected(_) => haptics.impact(ImpactStyle::Light),
            Self::Cancelled => {}
        }
    }
}

/// Render model for one button in the current frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ButtonVisual<'a> {
    pub action: &'a ActionSpec,
    pub center: Point,
    pub diameter: f64,
    pub opacity: f64,
    pub proximity: f64,
    pub active: bool,
}

/// Floating menu anchored at a press point.
///
/// Positions, opacity and size follow the entrance progress; size is also
/// multiplied by the proximity scale. Hit-testing always uses the resolved
/// target positions, not the animated ones, so a release before the entrance
/// finishes still resolves against where the buttons are going.
pub struct RadialMenu {
    cfg: RadialConfig,
    actions: Vec<ActionSpec>,
    layout: RadialLayout,
    progress: Spring,
    entrance_started: bool,
    hover: HoverTracker,
    scales: Vec<f64>,
    pointer: Option<SharedValue<Point>>,
    release: Option<ReleaseObserver>,
    phase: MenuPhase,
    events: UiSender<MenuEvent>,
}

impl RadialMenu {
    pub fn new(
        origin: Point,
        viewport: Size,
        actions: Vec<ActionSpec>,
        cfg: &RadialConfig,
        events: UiSender<MenuEvent>,
    ) -> Self {
        let layout = RadialLayout::resolve(origin, viewport, &actions, cfg);
        let clipped = layout.clipped_targets(cfg.button_radius).count();
        if clipped > 0 {
            log::debug!("{clipped} radial button(s) extend past the viewport");
        }

        Self {
            cfg: cfg.clone(),
            scales: vec![1.0; actions.len()],
            actions,
            layout,
            progress: Spring::new(cfg.spring, 0.0, 0.0),
            entrance_started: false,
            hover: HoverTracker::new(cfg),
            pointer: None,
            release: None,
            phase: MenuPhase::Entering,
            events,
        }
    }

    /// Follows a live pointer and resolves whenever `release` is raised.
    pub fn track(mut self, pointer: SharedValue<Point>, release: &ReleaseSignal) -> Self {
        self.pointer = Some(pointer);
        self.release = Some(release.observer());
        self
    }

    /// Starts the entrance animation. Only the first call has an effect.
    pub fn mount(&mut self) {
        if self.entrance_started {
            return;
        }
        self.entrance_started = true;
        self.progress.retarget(1.0);
    }

    pub fn phase(&self) -> MenuPhase {
        self.phase
    }

    pub fn progress(&self) -> f64 {
        self.progress.value()
    }

    pub fn layout(&self) -> &RadialLayout {
        &self.layout
    }

    pub fn actions(&self) -> &[ActionSpec] {
        &self.actions
    }

    pub fn active(&self) -> Option<&ActionId> {
        self.hover.active()
    }

    pub fn active_action(&self) -> Option<&ActionSpec> {
        let id = self.hover.active()?;
        self.actions.iter().find(|a| &a.id == id)
    }

    pub fn pointer_events_enabled(&self) -> bool {
        self.pointer.is_some() && self.phase != MenuPhase::Resolved
    }

    /// Recomputes targets for a new viewport, dropping a hover that no longer
    /// matches a rendered button.
    pub fn set_viewport(&mut self, viewport: Size) {
        if viewport == self.layout.viewport {
            return;
        }
        self.layout = RadialLayout::resolve(self.layout.origin, viewport, &self.actions, &self.cfg);
        self.hover.retain(&self.layout.targets);
    }

    /// Advances animation and hover tracking by one frame. Returns whether
    /// anything visible changed.
    pub fn frame(&mut self, dt: Duration) -> bool {
        if self.phase == MenuPhase::Resolved {
            return false;
        }

        let before = self.progress.value();
        let progress = self.progress.step(dt);
        let mut dirty = progress != before;
        if self.phase == MenuPhase::Entering && self.entrance_started && self.progress.is_settled()
        {
            self.phase = MenuPhase::Tracking;
        }

        if let Some(pointer) = &self.pointer {
            let (frame, update) = self.hover.update(&self.layout.targets, pointer.get());
            dirty |= frame.scales != self.scales || update.changed;
            self.scales = frame.scales;
            if update.haptic
                && let Some(id) = self.hover.active()
            {
                self.events.post(MenuEvent::HoverEntered(id.clone()));
            }
        }

        if self.release.as_mut().and_then(ReleaseObserver::poll).is_some() {
            self.resolve();
            dirty = true;
        }
        dirty
    }

    /// Resolves the session: the active button is selected, otherwise the
    /// menu is cancelled. Later calls do nothing.
    pub fn resolve(&mut self) -> Option<MenuEvent> {
        if self.phase == MenuPhase::Resolved {
            return None;
        }
        let event = match self.hover.active() {
            Some(id) => MenuEvent::Selected(id.clone()),
            None => MenuEvent::Cancelled,
        };
        log::debug!("radial menu resolved: {event:?}");

        self.hover.reset();
        self.scales = vec![1.0; self.actions.len()];
        self.phase = MenuPhase::Resolved;
        self.events.post(event.clone());
        Some(event)
    }

    /// Direct tap on a rendered button.
    /// The button whose activation area contains `point`, by final position.
    pub fn button_at(&self, point: Point) -> Option<&ButtonTarget> {
        let index = self.hover.score(&self.layout.targets, point).active?;
        self.layout.targets.get(index)
    }

    pub fn press_at(&mut self, point: Point) -> Option<MenuEvent> {
        if !self.pointer_events_enabled() {
            return None;
        }
        let id = self.button_at(point)?.id.clone();
        if let Some(pointer) = &self.pointer {
            pointer.set(point);
        }
        self.hover.update(&self.layout.targets, point);
        debug_assert_eq!(self.hover.active(), Some(&id));
        self.resolve()
    }

    pub fn buttons(&self) -> Vec<ButtonVisual<'_>> {
        let progress = self.progress.value();
        let opacity = progress.clamp(0.0, 1.0);
        let entrance_size = lerp(MIN_ENTRANCE_SIZE, 1.0, progress.max(0.0));
        let active = self.hover.active();

        self.actions
            .iter()
            .zip(&self.layout.targets)
            .zip(&self.scales)
            .map(|((action, target), &proximity)| ButtonVisual {
                action,
                center: self.layout.origin.lerp(target.center, progress),
                diameter: 2.0 * self.cfg.button_radius * entrance_size * proximity,
                opacity,
                proximity,
                active: active == Some(&target.id),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Symbol;
    use crate::dispatch::{UiReceiver, ui_channel};
    use crate::haptics::testing::{Pulse, RecordingHaptics};

    const FRAME: Duration = Duration::from_millis(16);
    const VIEWPORT: Size = Size {
        width: 400.0,
        height: 800.0,
    };

    struct Fixture {
        menu: RadialMenu,
        pointer: SharedValue<Point>,
        release: ReleaseSignal,
        rx: UiReceiver<MenuEvent>,
        cfg: RadialConfig,
    }

    fn fixture() -> Fixture {
        let cfg = RadialConfig::default();
        let (tx, rx) = ui_channel();
        let origin = Point::new(200.0, 600.0);
        let pointer = SharedValue::new(origin);
        let release = ReleaseSignal::new();
        let actions = [Symbol::Star, Symbol::Bookmark, Symbol::Share]
            .into_iter()
            .map(ActionSpec::from_symbol)
            .collect();
        let menu =
            RadialMenu::new(origin, VIEWPORT, actions, &cfg, tx).track(pointer.clone(), &release);
        Fixture {
            menu,
            pointer,
            release,
            rx,
            cfg,
        }
    }

    fn events(rx: &UiReceiver<MenuEvent>) -> Vec<MenuEvent> {
        let mut out = Vec::new();
        rx.drain(|e| out.push(e));
        out
    }

    #[test]
    fn release_over_bookmark_selects_it() {
        let mut f = fixture();
        f.menu.mount();
        f.menu.frame(FRAME);
        assert_eq!(f.menu.active(), None);

        let bookmark = f.menu.layout().target(&ActionId::from("bookmark")).unwrap().center;
        f.pointer.set(bookmark);
        f.menu.frame(FRAME);
        assert_eq!(f.menu.active(), Some(&ActionId::from("bookmark")));

        f.release.raise();
        f.menu.frame(FRAME);
        assert_eq!(f.menu.phase(), MenuPhase::Resolved);
        assert_eq!(f.menu.active(), None);
        assert_eq!(
            events(&f.rx),
            vec![
                MenuEvent::HoverEntered(ActionId::from("bookmark")),
                MenuEvent::Selected(ActionId::from("bookmark")),
            ]
        );
    }

    #[test]
    fn release_in_dead_space_cancels() {
        let mut f = fixture();
        f.menu.mount();
        let target = f.menu.layout().targets[1].clone();
        let outside = f
            .menu
            .layout()
            .origin
            .polar(f.cfg.menu_radius + 1.5 * f.cfg.button_radius, target.angle);
        f.pointer.set(outside);
        f.menu.frame(FRAME);
        assert_eq!(f.menu.active(), None);

        f.release.raise();
        f.menu.frame(FRAME);
        assert_eq!(events(&f.rx), vec![MenuEvent::Cancelled]);
    }

    #[test]
    fn release_right_after_open_cancels() {
        let mut f = fixture();
        f.menu.mount();
        f.release.raise();
        f.menu.frame(FRAME);
        assert_eq!(events(&f.rx), vec![MenuEvent::Cancelled]);
    }

    #[test]
    fn resolves_once_per_session() {
        let mut f = fixture();
        f.menu.mount();
        f.release.raise();
        f.menu.frame(FRAME);
        f.release.raise();
        f.menu.frame(FRAME);
        assert_eq!(f.menu.resolve(), None);
        assert_eq!(events(&f.rx).len(), 1);
    }

    #[test]
    fn entrance_runs_once() {
        let mut f = fixture();
        f.menu.mount();
        for _ in 0..200 {
            f.menu.frame(FRAME);
        }
        assert_eq!(f.menu.progress(), 1.0);
        assert_eq!(f.menu.phase(), MenuPhase::Tracking);

        f.menu.mount();
        f.menu.frame(FRAME);
        assert_eq!(f.menu.progress(), 1.0);
    }

    #[test]
    fn buttons_start_at_origin_and_end_on_targets() {
        let mut f = fixture();
        let origin = f.menu.layout().origin;
        for b in f.menu.buttons() {
            assert_eq!(b.center, origin);
            assert_eq!(b.opacity, 0.0);
        }

        f.menu.mount();
        for _ in 0..200 {
            f.menu.frame(FRAME);
        }
        let targets = f.menu.layout().targets.clone();
        for (b, t) in f.menu.buttons().iter().zip(&targets) {
            assert!(b.center.distance(t.center) < 1e-9);
            assert_eq!(b.opacity, 1.0);
        }
    }

    #[test]
    fn proximity_grows_only_the_nearby_button() {
        let mut f = fixture();
        f.menu.mount();
        for _ in 0..200 {
            f.menu.frame(FRAME);
        }
        let share = f.menu.layout().targets[2].center;
        f.pointer.set(share);
        f.menu.frame(FRAME);

        let buttons = f.menu.buttons();
        assert!(buttons[2].active);
        assert!((buttons[2].proximity - 1.4).abs() < 1e-9);
        assert_eq!(buttons[0].proximity, 1.0);
        assert!(buttons[2].diameter > buttons[0].diameter);
    }

    #[test]
    fn press_at_requires_pointer_tracking() {
        let cfg = RadialConfig::default();
        let (tx, _rx) = ui_channel();
        let actions = vec![ActionSpec::from_symbol(Symbol::Star)];
        let mut menu = RadialMenu::new(Point::new(200.0, 600.0), VIEWPORT, actions, &cfg, tx);
        let star = menu.layout().targets[0].center;
        assert!(!menu.pointer_events_enabled());
        assert_eq!(menu.press_at(star), None);

        let mut f = fixture();
        let star = f.menu.layout().targets[0].center;
        assert_eq!(
            f.menu.press_at(star),
            Some(MenuEvent::Selected(ActionId::from("star")))
        );
        assert!(!f.menu.pointer_events_enabled());
    }

    #[test]
    fn viewport_change_drops_stale_hover() {
        let mut f = fixture();
        let star = f.menu.layout().targets[0].center;
        f.pointer.set(star);
        f.menu.frame(FRAME);
        assert!(f.menu.active().is_some());

        f.menu.set_viewport(Size::new(1200.0, 800.0));
        f.menu.frame(FRAME);
        let active = f.menu.active().cloned();
        if let Some(id) = active {
            assert!(f.menu.layout().target(&id).is_some());
        }
    }

    #[test]
    fn event_haptics() {
        let haptics = RecordingHaptics::default();
        MenuEvent::HoverEntered(ActionId::from("star")).apply_haptics(&haptics);
        MenuEvent::Selected(ActionId::from("star")).apply_haptics(&haptics);
        MenuEvent::Cancelled.apply_haptics(&haptics);
        assert_eq!(
            haptics.take(),
            vec![Pulse::Selection, Pulse::Impact(ImpactStyle::Light)]
        );
    }
}
