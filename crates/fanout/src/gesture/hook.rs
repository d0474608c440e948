//! Press-and-hold radial overlay for any pressable element.
//!
//! [`RadialOverlayHook::build`] returns two halves. The
//! [`RadialOverlayBindings`] go to the input path: a long press that opens the
//! overlay and a pan that streams the pointer and signals release. The
//! [`RadialOverlayController`] stays on the UI context and turns their
//! messages into haptics, measurement, overlay sessions and callbacks.

use super::{LongPressGesture, PanGesture, Simultaneous};
use crate::action::{ActionId, ActionSpec};
use crate::config::RadialConfig;
use crate::dispatch::{UiReceiver, UiSender, ui_channel};
use crate::geom::{Point, Rect, Size};
use crate::haptics::{Haptics, ImpactStyle};
use crate::menu::{MenuEvent, RadialMenu};
use crate::overlay::{CloseGuard, OverlayHandle, OverlayLayer, OverlayTicket};
use crate::signal::{ReleaseSignal, SharedValue};
use std::rc::Rc;
use std::time::Duration;

/// State written on the input path and read by the menu and the caller.
/// One instance per pressable element.
#[derive(Debug, Clone, Default)]
pub struct GestureShared {
    pub is_long_pressed: SharedValue<bool>,
    pub overlay_open: SharedValue<bool>,
    pub origin: SharedValue<Point>,
    pub pointer: SharedValue<Point>,
    pub release: ReleaseSignal,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureMsg {
    LongPressStarted(Point),
    /// The pointer went away without a release while the overlay was open.
    Interrupted,
    /// A long press that had started has finished.
    Finalized,
}

/// An element that can anchor a radial overlay.
pub trait Pressable {
    /// Snapshot of the element drawn above the backdrop.
    type Visual;

    /// On-screen bounds, or `None` if the element is gone.
    fn measure(&self) -> Option<Rect>;

    fn visual(&self) -> Self::Visual;

    fn viewport(&self) -> Size;
}

/// Overlay content: the lifted element plus its menu.
pub struct RadialOverlay<V> {
    pub visual: V,
    pub bounds: Rect,
    pub menu: RadialMenu,
}

impl<V> RadialOverlay<V> {
    /// Which layer a press at `point` lands on. Only the lifted element and
    /// the buttons belong to the content layer.
    pub fn layer_at(&self, point: Point) -> OverlayLayer {
        if self.bounds.contains(point) || self.menu.button_at(point).is_some() {
            OverlayLayer::Content
        } else {
            OverlayLayer::Backdrop
        }
    }
}

impl<V: 'static> OverlayHandle<RadialOverlay<V>> {
    /// Advances the mounted menu, if any, by one frame.
    pub fn frame_menu(&self, dt: Duration) -> bool {
        self.with_content(|overlay| overlay.menu.frame(dt))
            .unwrap_or(false)
    }

    /// Layer under `point`, or `None` while nothing is mounted.
    pub fn layer_at(&self, point: Point) -> Option<OverlayLayer> {
        self.with_content(|overlay| overlay.layer_at(point))
    }

    /// Re-resolves the mounted menu's targets after the surface was resized.
    pub fn set_viewport(&self, viewport: Size) {
        self.with_content(|overlay| overlay.menu.set_viewport(viewport));
    }
}

pub struct RadialOverlayBindings {
    pub long_press: LongPressGesture,
    pub pan: PanGesture,
    pub is_long_pressed: SharedValue<bool>,
    pub overlay_open: SharedValue<bool>,
}

impl RadialOverlayBindings {
    /// Both recognizers over the same pointer stream.
    pub fn into_gesture(self) -> Simultaneous {
        Simultaneous::new().with(self.long_press).with(self.pan)
    }
}

type SelectHandler = Box<dyn FnMut(ActionId, CloseGuard)>;
type CancelHandler = Box<dyn FnMut()>;

pub struct RadialOverlayHook<V> {
    overlay: OverlayHandle<RadialOverlay<V>>,
    haptics: Rc<dyn Haptics>,
    cfg: RadialConfig,
    actions: Vec<ActionSpec>,
    on_select: Option<SelectHandler>,
    on_cancel: Option<CancelHandler>,
}

impl<V: 'static> RadialOverlayHook<V> {
    pub fn new(overlay: OverlayHandle<RadialOverlay<V>>, haptics: Rc<dyn Haptics>) -> Self {
        Self {
            overlay,
            haptics,
            cfg: RadialConfig::default(),
            actions: Vec::new(),
            on_select: None,
            on_cancel: None,
        }
    }

    pub fn config(mut self, cfg: &RadialConfig) -> Self {
        self.cfg = cfg.clone();
        self
    }

    pub fn actions(mut self, actions: Vec<ActionSpec>) -> Self {
        self.actions = actions;
        self
    }

    /// Called with the chosen action and a guard that closes the overlay
    /// when dropped. Hold the guard until the action has finished.
    pub fn on_select(mut self, f: impl FnMut(ActionId, CloseGuard) + 'static) -> Self {
        self.on_select = Some(Box::new(f));
        self
    }

    pub fn on_cancel(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_cancel = Some(Box::new(f));
        self
    }

    pub fn build<P>(self, pressable: P) -> (RadialOverlayBindings, RadialOverlayController<P>)
    where
        P: Pressable<Visual = V>,
    {
        let shared = GestureShared::default();
        let (gesture_tx, gesture_rx) = ui_channel();
        let (menu_tx, menu_rx) = ui_channel();

        let bindings = RadialOverlayBindings {
            long_press: LongPressGesture::new(&self.cfg, shared.clone(), gesture_tx.clone()),
            pan: PanGesture::new(shared.clone(), gesture_tx),
            is_long_pressed: shared.is_long_pressed.clone(),
            overlay_open: shared.overlay_open.clone(),
        };

        let controller = RadialOverlayController {
            pressable,
            cfg: self.cfg,
            actions: self.actions,
            shared,
            gestures: gesture_rx,
            menu_tx,
            menu_rx,
            overlay: self.overlay,
            haptics: self.haptics,
            on_select: self.on_select.unwrap_or_else(|| Box::new(|_, _| {})),
            on_cancel: self.on_cancel,
            session: None,
        };

        (bindings, controller)
    }
}

#[derive(Debug, Clone, Copy)]
struct OpenSession {
    ticket: OverlayTicket,
    release_at_open: u64,
}

pub struct RadialOverlayController<P: Pressable> {
    pressable: P,
    cfg: RadialConfig,
    actions: Vec<ActionSpec>,
    shared: GestureShared,
    gestures: UiReceiver<GestureMsg>,
    menu_tx: UiSender<MenuEvent>,
    menu_rx: UiReceiver<MenuEvent>,
    overlay: OverlayHandle<RadialOverlay<P::Visual>>,
    haptics: Rc<dyn Haptics>,
    on_select: SelectHandler,
    on_cancel: Option<CancelHandler>,
    session: Option<OpenSession>,
}

impl<P: Pressable> RadialOverlayController<P>
where
    P::Visual: 'static,
{
    pub fn pressable(&self) -> &P {
        &self.pressable
    }

    pub fn shared(&self) -> &GestureShared {
        &self.shared
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Applies to the next session; an open menu keeps its layout.
    pub fn set_config(&mut self, cfg: &RadialConfig) {
        self.cfg = cfg.clone();
    }

    pub fn set_actions(&mut self, actions: Vec<ActionSpec>) {
        self.actions = actions;
    }

    /// Handles everything queued by the gesture path and the menu. Returns
    /// the number of messages handled.
    pub fn process(&mut self) -> usize {
        let mut gestures = Vec::new();
        let mut handled = self.gestures.drain(|m| gestures.push(m));
        for msg in gestures {
            self.on_gesture(msg);
        }

        let mut events = Vec::new();
        handled += self.menu_rx.drain(|e| events.push(e));
        for event in events {
            self.on_menu(event);
        }
        handled
    }

    fn on_gesture(&mut self, msg: GestureMsg) {
        match msg {
            GestureMsg::LongPressStarted(origin) => {
                self.haptics.impact(ImpactStyle::Medium);
                self.open(origin);
            }
            GestureMsg::Finalized => {
                // The pointer can lift before the overlay opened on this side,
                // in which case the pan saw no open overlay and raised nothing.
                if let Some(session) = self.session
                    && self.shared.release.count() == session.release_at_open
                {
                    self.shared.release.raise();
                }
            }
            GestureMsg::Interrupted => {
                if self.close() {
                    self.cancel();
                }
            }
        }
    }

    fn open(&mut self, origin: Point) {
        let Some(bounds) = self.pressable.measure() else {
            log::debug!("pressable vanished before the overlay opened");
            return;
        };

        let mut menu = RadialMenu::new(
            origin,
            self.pressable.viewport(),
            self.actions.clone(),
            &self.cfg,
            self.menu_tx.clone(),
        )
        .track(self.shared.pointer.clone(), &self.shared.release);
        menu.mount();

        let ticket = self.overlay.show(Some(RadialOverlay {
            visual: self.pressable.visual(),
            bounds,
            menu,
        }));
        self.session = Some(OpenSession {
            ticket,
            release_at_open: self.shared.release.count(),
        });
        self.shared.overlay_open.set(true);
    }

    fn on_menu(&mut self, event: MenuEvent) {
        event.apply_haptics(self.haptics.as_ref());
        match event {
            MenuEvent::HoverEntered(_) => {}
            MenuEvent::Selected(id) => {
                let Some(session) = self.session.take() else {
                    return;
                };
                let overlay_open = self.shared.overlay_open.clone();
                let guard = self
                    .overlay
                    .close_guard(session.ticket)
                    .then(move || {
                        overlay_open.set(false);
                    });
                log::info!("radial action selected: {id}");
                (self.on_select)(id, guard);
            }
            MenuEvent::Cancelled => {
                if self.close() {
                    self.cancel();
                }
            }
        }
    }

    fn close(&mut self) -> bool {
        let Some(session) = self.session.take() else {
            return false;
        };
        self.overlay.hide_ticket(session.ticket);
        self.shared.overlay_open.set(false);
        true
    }

    fn cancel(&mut self) {
        log::debug!("radial menu cancelled");
        if let Some(on_cancel) = self.on_cancel.as_mut() {
            on_cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Symbol;
    use crate::anim::ManualClock;
    use crate::gesture::{GestureRecognizer, PointerEvent, PointerPhase};
    use crate::haptics::testing::{Pulse, RecordingHaptics};
    use crate::overlay::OverlayHost;
    use std::cell::{Cell, RefCell};
    use std::time::Instant;

    const FRAME: Duration = Duration::from_millis(16);

    struct Card {
        bounds: Option<Rect>,
    }

    impl Pressable for Card {
        type Visual = &'static str;

        fn measure(&self) -> Option<Rect> {
            self.bounds
        }

        fn visual(&self) -> &'static str {
            "card"
        }

        fn viewport(&self) -> Size {
            Size::new(400.0, 800.0)
        }
    }

    struct Harness {
        gesture: Simultaneous,
        is_long_pressed: SharedValue<bool>,
        overlay_open: SharedValue<bool>,
        controller: RadialOverlayController<Card>,
        overlay: OverlayHandle<RadialOverlay<&'static str>>,
        clock: ManualClock,
        haptics: Rc<RecordingHaptics>,
        selected: Rc<RefCell<Vec<ActionId>>>,
        guards: Rc<RefCell<Vec<CloseGuard>>>,
        cancels: Rc<Cell<u32>>,
        t0: Instant,
    }

    impl Harness {
        fn new(bounds: Option<Rect>) -> Self {
            let cfg = RadialConfig::default();
            let clock = ManualClock::new();
            let overlay = OverlayHandle::new(OverlayHost::with_clock(&cfg, clock.clone()));
            let haptics = Rc::new(RecordingHaptics::default());
            let selected = Rc::new(RefCell::new(Vec::new()));
            let guards = Rc::new(RefCell::new(Vec::new()));
            let cancels = Rc::new(Cell::new(0));

            let (sel, held, cancelled) = (selected.clone(), guards.clone(), cancels.clone());
            let (bindings, controller) = RadialOverlayHook::new(overlay.clone(), haptics.clone())
                .config(&cfg)
                .actions(
                    [Symbol::Star, Symbol::Bookmark, Symbol::Share]
                        .into_iter()
                        .map(ActionSpec::from_symbol)
                        .collect(),
                )
                .on_select(move |id, guard| {
                    sel.borrow_mut().push(id);
                    held.borrow_mut().push(guard);
                })
                .on_cancel(move || cancelled.set(cancelled.get() + 1))
                .build(Card { bounds });

            let is_long_pressed = bindings.is_long_pressed.clone();
            let overlay_open = bindings.overlay_open.clone();
            Self {
                gesture: bindings.into_gesture(),
                is_long_pressed,
                overlay_open,
                controller,
                overlay,
                clock,
                haptics,
                selected,
                guards,
                cancels,
                t0: Instant::now(),
            }
        }

        fn at(&self, ms: u64) -> Instant {
            self.t0 + Duration::from_millis(ms)
        }

        fn send(&mut self, phase: PointerPhase, p: Point, ms: u64) {
            let event = PointerEvent::new(phase, p, self.at(ms));
            self.gesture.handle(&event);
        }

        fn hold(&mut self, p: Point) {
            self.send(PointerPhase::Down, p, 0);
            let at = self.at(500);
            self.gesture.poll(at);
        }

        fn target(&self, id: &str) -> Point {
            self.overlay
                .with_content(|c| c.menu.layout().target(&ActionId::from(id)).unwrap().center)
                .unwrap()
        }
    }

    const PRESS: Point = Point { x: 200.0, y: 600.0 };

    fn bounds() -> Option<Rect> {
        Some(Rect::new(150.0, 550.0, 100.0, 120.0))
    }

    #[test]
    fn hold_drag_release_selects_and_closes_after_action() {
        let mut h = Harness::new(bounds());
        h.hold(PRESS);
        assert!(h.is_long_pressed.get());

        h.controller.process();
        assert!(h.overlay.is_visible());
        assert!(h.overlay_open.get());
        assert!(h.controller.is_open());
        assert_eq!(h.haptics.take(), vec![Pulse::Impact(ImpactStyle::Medium)]);

        let bookmark = h.target("bookmark");
        h.send(PointerPhase::Move, bookmark, 600);
        h.overlay.frame_menu(FRAME);
        h.send(PointerPhase::Up, bookmark, 700);
        assert!(!h.is_long_pressed.get());
        h.overlay.frame_menu(FRAME);
        h.controller.process();

        assert_eq!(*h.selected.borrow(), vec![ActionId::from("bookmark")]);
        assert_eq!(
            h.haptics.take(),
            vec![Pulse::Selection, Pulse::Impact(ImpactStyle::Light)]
        );
        // still open while the action holds its guard
        assert!(h.overlay.is_visible());
        assert_eq!(h.cancels.get(), 0);

        h.guards.borrow_mut().clear();
        assert!(!h.overlay.is_visible());
        assert!(!h.overlay_open.get());
        h.clock.advance(Duration::from_millis(200));
        assert!(h.overlay.tick().is_none());
    }

    #[test]
    fn backdrop_presses_pass_through() {
        let mut h = Harness::new(bounds());
        assert_eq!(h.overlay.layer_at(PRESS), None);

        h.hold(PRESS);
        h.controller.process();
        let share = h.target("share");
        assert_eq!(h.overlay.layer_at(PRESS), Some(OverlayLayer::Content));
        assert_eq!(h.overlay.layer_at(share), Some(OverlayLayer::Content));
        assert_eq!(
            h.overlay.layer_at(Point::new(10.0, 10.0)),
            Some(OverlayLayer::Backdrop)
        );
        assert!(!OverlayLayer::Backdrop.intercepts_pointer());
    }

    #[test]
    fn resize_re_resolves_open_menu() {
        let mut h = Harness::new(bounds());
        h.hold(PRESS);
        h.controller.process();

        let wide = Size::new(1200.0, 800.0);
        h.overlay.set_viewport(wide);
        let viewport = h.overlay.with_content(|c| c.menu.layout().viewport);
        assert_eq!(viewport, Some(wide));
    }

    #[test]
    fn release_away_from_buttons_cancels() {
        let mut h = Harness::new(bounds());
        h.hold(PRESS);
        h.controller.process();
        h.send(PointerPhase::Move, Point::new(210.0, 590.0), 600);
        h.send(PointerPhase::Up, Point::new(210.0, 590.0), 650);
        h.overlay.frame_menu(FRAME);
        h.controller.process();

        assert_eq!(h.cancels.get(), 1);
        assert!(h.selected.borrow().is_empty());
        assert!(!h.overlay.is_visible());
        assert!(!h.overlay_open.get());
    }

    #[test]
    fn short_tap_opens_nothing() {
        let mut h = Harness::new(bounds());
        h.send(PointerPhase::Down, PRESS, 0);
        h.send(PointerPhase::Up, PRESS, 150);
        h.gesture.poll(h.at(800));
        h.controller.process();

        assert!(!h.overlay.is_mounted());
        assert!(!h.is_long_pressed.get());
        assert_eq!(h.cancels.get(), 0);
        assert!(h.haptics.take().is_empty());
    }

    #[test]
    fn vanished_element_skips_the_overlay() {
        let mut h = Harness::new(None);
        h.hold(PRESS);
        h.send(PointerPhase::Up, PRESS, 700);
        h.controller.process();
        h.overlay.frame_menu(FRAME);
        h.controller.process();

        assert!(!h.overlay.is_mounted());
        assert!(!h.overlay_open.get());
        assert_eq!(h.cancels.get(), 0);
    }

    #[test]
    fn release_before_ui_catches_up_still_resolves() {
        let mut h = Harness::new(bounds());
        h.hold(PRESS);
        h.send(PointerPhase::Up, PRESS, 520);
        assert!(h.controller.shared().release.count() == 0);

        h.controller.process();
        assert!(h.overlay.is_visible());
        h.overlay.frame_menu(FRAME);
        h.controller.process();

        assert_eq!(h.cancels.get(), 1);
        assert!(!h.overlay.is_visible());
    }

    #[test]
    fn pointer_cancel_while_open_closes_overlay() {
        let mut h = Harness::new(bounds());
        h.hold(PRESS);
        h.controller.process();
        h.send(PointerPhase::Move, Point::new(205.0, 595.0), 600);
        h.send(PointerPhase::Cancel, Point::new(205.0, 595.0), 650);
        h.controller.process();

        assert_eq!(h.cancels.get(), 1);
        assert!(!h.overlay.is_visible());
        assert!(!h.controller.is_open());
    }
}
