//! Pressable cards: the data behind one grid tile, its snapshot for the
//! overlay, and the pointer wiring into the gesture recognizers.

use crate::config::Tint;
use crate::gui::radial::view::paint_cover;
use crate::sys::store::{Collection, Item};
use fanout::dispatch::UiSender;
use fanout::gesture::{GestureRecognizer, PointerEvent, PointerPhase, Pressable, Simultaneous};
use fanout::services::{CollectionId, ItemId, Route};
use fanout::signal::SharedValue;
use fanout::{ActionSpec, Point, Rect, Size, Symbol};
use gdk_pixbuf::Pixbuf;
use gtk::graphene;
use gtk::prelude::*;
use gtk4 as gtk;
use std::cell::{Cell, RefCell};
use std::path::Path;
use std::rc::Rc;
use std::time::Instant;

pub const CARD_WIDTH: i32 = 168;
pub const COVER_HEIGHT: i32 = 132;
const TAP_SLOP: f64 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub enum CardKind {
    Collection(CollectionId),
    Item {
        collection: CollectionId,
        item: ItemId,
    },
}

#[derive(Debug, Clone)]
pub struct CardData {
    pub kind: CardKind,
    pub title: String,
    pub subtitle: String,
    pub tint: Tint,
    pub cover: Option<Pixbuf>,
}

fn load_cover(path: Option<&Path>) -> Option<Pixbuf> {
    let path = path?;
    match Pixbuf::from_file_at_scale(path, CARD_WIDTH, COVER_HEIGHT, true) {
        Ok(pixbuf) => Some(pixbuf),
        Err(e) => {
            log::warn!("Failed to load cover {}: {}", path.display(), e);
            None
        }
    }
}

impl CardData {
    pub fn from_collection(collection: &Collection) -> Self {
        let count = collection.items.len();
        Self {
            kind: CardKind::Collection(collection.id.clone()),
            title: collection.title.clone(),
            subtitle: match count {
                1 => "1 item".to_string(),
                n => format!("{n} items"),
            },
            tint: collection.tint,
            cover: load_cover(collection.cover.as_deref()),
        }
    }

    pub fn from_item(collection: &CollectionId, item: &Item) -> Self {
        Self {
            kind: CardKind::Item {
                collection: collection.clone(),
                item: item.id.clone(),
            },
            title: item.title.clone(),
            subtitle: item.subtitle.clone(),
            tint: item.tint,
            cover: load_cover(item.cover.as_deref()),
        }
    }

    pub fn route(&self) -> Route {
        match &self.kind {
            CardKind::Collection(id) => Route::Collection(id.clone()),
            CardKind::Item { collection, item } => Route::Item {
                collection: collection.clone(),
                item: item.clone(),
            },
        }
    }

    pub fn actions(&self) -> Vec<ActionSpec> {
        let symbols: &[Symbol] = match self.kind {
            CardKind::Collection(_) => &[Symbol::Edit, Symbol::Delete],
            CardKind::Item { .. } => &[Symbol::Star, Symbol::Bookmark, Symbol::Share, Symbol::Delete],
        };
        symbols.iter().copied().map(ActionSpec::from_symbol).collect()
    }
}

/// What the overlay draws in place of the lifted card.
pub type CardVisual = CardData;

/// A card widget as seen by the radial overlay hook.
pub struct CardPressable {
    widget: gtk::Widget,
    root: gtk::Widget,
    data: CardData,
}

impl CardPressable {
    pub fn new(widget: &impl IsA<gtk::Widget>, root: &impl IsA<gtk::Widget>, data: CardData) -> Self {
        Self {
            widget: widget.clone().upcast(),
            root: root.clone().upcast(),
            data,
        }
    }

    pub fn data(&self) -> &CardData {
        &self.data
    }
}

impl Pressable for CardPressable {
    type Visual = CardVisual;

    fn measure(&self) -> Option<Rect> {
        if !self.widget.is_mapped() {
            return None;
        }
        let bounds = self.widget.compute_bounds(&self.root)?;
        Some(Rect::new(
            bounds.x() as f64,
            bounds.y() as f64,
            bounds.width() as f64,
            bounds.height() as f64,
        ))
    }

    fn visual(&self) -> CardVisual {
        self.data.clone()
    }

    fn viewport(&self) -> Size {
        Size::new(self.root.width() as f64, self.root.height() as f64)
    }
}

/// Ordinary activation: a short press released near where it started,
/// unless a long press took over meanwhile.
pub struct TapGesture {
    is_long_pressed: SharedValue<bool>,
    down: Option<Point>,
    tx: UiSender<()>,
}

impl TapGesture {
    pub fn new(is_long_pressed: SharedValue<bool>, tx: UiSender<()>) -> Self {
        Self {
            is_long_pressed,
            down: None,
            tx,
        }
    }
}

impl GestureRecognizer for TapGesture {
    fn handle(&mut self, event: &PointerEvent) {
        if event.pointers > 1 {
            self.down = None;
            return;
        }
        match event.phase {
            PointerPhase::Down => self.down = Some(event.position),
            PointerPhase::Move => {
                if self
                    .down
                    .is_some_and(|start| start.distance(event.position) > TAP_SLOP)
                {
                    self.down = None;
                }
            }
            PointerPhase::Up => {
                if let Some(start) = self.down.take()
                    && start.distance(event.position) <= TAP_SLOP
                    && !self.is_long_pressed.get()
                {
                    self.tx.post(());
                }
            }
            PointerPhase::Cancel => self.down = None,
        }
    }

    fn finalize(&mut self) {
        self.down = None;
    }
}

/// Builds the tile: cover on top, title and subtitle below.
pub fn build_card(data: &CardData) -> gtk::Box {
    let card = gtk::Box::new(gtk::Orientation::Vertical, 0);
    card.add_css_class("shelf-card");
    card.add_css_class("card");
    card.set_size_request(CARD_WIDTH, -1);

    let cover = gtk::DrawingArea::new();
    cover.add_css_class("shelf-card-cover");
    cover.set_content_width(CARD_WIDTH);
    cover.set_content_height(COVER_HEIGHT);
    let painted = data.clone();
    cover.set_draw_func(move |_, cr, w, h| {
        if let Err(e) = paint_cover(cr, &painted, w as f64, h as f64) {
            log::error!("Drawing error: {}", e);
        }
    });
    card.append(&cover);

    let title = gtk::Label::new(Some(&data.title));
    title.add_css_class("shelf-card-title");
    title.set_xalign(0.0);
    title.set_ellipsize(gtk::pango::EllipsizeMode::End);
    card.append(&title);

    let subtitle = gtk::Label::new(Some(&data.subtitle));
    subtitle.add_css_class("shelf-card-subtitle");
    subtitle.set_xalign(0.0);
    subtitle.set_ellipsize(gtk::pango::EllipsizeMode::End);
    card.append(&subtitle);

    card
}

/// Feeds the widget's pointer stream, in `root` coordinates, to `gesture`.
pub fn attach_pointer(
    widget: &impl IsA<gtk::Widget>,
    root: &impl IsA<gtk::Widget>,
    gesture: Rc<RefCell<Simultaneous>>,
) {
    let drag = gtk::GestureDrag::new();
    drag.set_button(0);
    drag.set_propagation_phase(gtk::PropagationPhase::Capture);
    widget.add_controller(drag.clone());

    let widget: gtk::Widget = widget.clone().upcast();
    let root: gtk::Widget = root.clone().upcast();
    let last = Rc::new(Cell::new(Point::default()));

    let to_root = move |x: f64, y: f64| -> Point {
        widget
            .compute_point(&root, &graphene::Point::new(x as f32, y as f32))
            .map(|p| Point::new(p.x() as f64, p.y() as f64))
            .unwrap_or(Point::new(x, y))
    };
    let to_root = Rc::new(to_root);

    let send = {
        let last = last.clone();
        move |phase: PointerPhase, p: Point| {
            last.set(p);
            gesture
                .borrow_mut()
                .handle(&PointerEvent::new(phase, p, Instant::now()));
        }
    };
    let send = Rc::new(send);

    {
        let (send, to_root) = (send.clone(), to_root.clone());
        drag.connect_drag_begin(move |_, x, y| send(PointerPhase::Down, to_root(x, y)));
    }
    {
        let (send, to_root) = (send.clone(), to_root.clone());
        drag.connect_drag_update(move |g, dx, dy| {
            if let Some((x, y)) = g.start_point() {
                send(PointerPhase::Move, to_root(x + dx, y + dy));
            }
        });
    }
    {
        let (send, to_root) = (send.clone(), to_root.clone());
        drag.connect_drag_end(move |g, dx, dy| {
            if let Some((x, y)) = g.start_point() {
                send(PointerPhase::Up, to_root(x + dx, y + dy));
            }
        });
    }
    drag.connect_cancel(move |_, _| send(PointerPhase::Cancel, last.get()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use fanout::RadialConfig;
    use fanout::dispatch::ui_channel;
    use fanout::gesture::{GestureShared, LongPressGesture};
    use std::time::Duration;

    fn ev(phase: PointerPhase, x: f64, at: Instant) -> PointerEvent {
        PointerEvent::new(phase, Point::new(x, 100.0), at)
    }

    fn tap_and_hold() -> (Simultaneous, fanout::dispatch::UiReceiver<()>) {
        let shared = GestureShared::default();
        let (gesture_tx, _gesture_rx) = ui_channel();
        let (tap_tx, tap_rx) = ui_channel();
        let gesture = Simultaneous::new()
            .with(LongPressGesture::new(
                &RadialConfig::default(),
                shared.clone(),
                gesture_tx,
            ))
            .with(TapGesture::new(shared.is_long_pressed.clone(), tap_tx));
        (gesture, tap_rx)
    }

    #[test]
    fn short_press_taps() {
        let (mut g, taps) = tap_and_hold();
        let t0 = Instant::now();
        g.handle(&ev(PointerPhase::Down, 10.0, t0));
        g.handle(&ev(PointerPhase::Up, 14.0, t0 + Duration::from_millis(120)));
        assert_eq!(taps.drain(|_| {}), 1);
    }

    #[test]
    fn long_press_suppresses_tap() {
        let (mut g, taps) = tap_and_hold();
        let t0 = Instant::now();
        g.handle(&ev(PointerPhase::Down, 10.0, t0));
        g.poll(t0 + Duration::from_millis(600));
        g.handle(&ev(PointerPhase::Up, 10.0, t0 + Duration::from_millis(700)));
        assert_eq!(taps.drain(|_| {}), 0);
    }

    #[test]
    fn drag_away_is_not_a_tap() {
        let (mut g, taps) = tap_and_hold();
        let t0 = Instant::now();
        g.handle(&ev(PointerPhase::Down, 10.0, t0));
        g.handle(&ev(PointerPhase::Move, 40.0, t0 + Duration::from_millis(50)));
        g.handle(&ev(PointerPhase::Up, 12.0, t0 + Duration::from_millis(100)));
        assert_eq!(taps.drain(|_| {}), 0);
    }
}
