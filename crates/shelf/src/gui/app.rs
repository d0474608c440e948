use crate::config::{self, BOOKMARKS, Config, STARRED};
use crate::events::AppEvent;
use crate::gui::card::{self, CardData, CardKind, CardPressable, CardVisual, TapGesture};
use crate::gui::nav::StackNavigator;
use crate::gui::radial::{self, IconCache};
use crate::gui::theme::{self, ThemeColors};
use crate::gui::toast::ToastStrip;
use crate::sys::store::MemoryStore;
use fanout::ActionId;
use fanout::dispatch::{UiReceiver, ui_channel};
use fanout::gesture::{
    GestureRecognizer, RadialOverlay, RadialOverlayController, RadialOverlayHook, Simultaneous,
};
use fanout::haptics::{Haptics, LogHaptics};
use fanout::overlay::{OverlayFrame, OverlayHandle, OverlayHost};
use fanout::services::{
    CollectionId, CollectionService, ItemId, Navigator, Route, ServiceError, Toast, ToastSurface,
};
use fanout::{Point, Size};
use gtk::prelude::*;
use gtk4 as gtk;
use relm4::prelude::*;
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;
use std::time::Instant;

pub type CardOverlay = OverlayHandle<RadialOverlay<CardVisual>>;

/// Input wiring of one mounted card.
struct CardBinding {
    gesture: Rc<RefCell<Simultaneous>>,
    controller: RadialOverlayController<CardPressable>,
    taps: UiReceiver<()>,
    route: Route,
}

struct Pages {
    collections: gtk::FlowBox,
    collection: gtk::FlowBox,
    rename: gtk::Entry,
    item: gtk::Box,
}

pub struct AppModel {
    pub config: Config,
    pub store: MemoryStore,
    pub overlay: CardOverlay,
    pub page_title: String,
    pub can_go_back: bool,
    navigator: StackNavigator,
    toasts: ToastStrip,
    haptics: Rc<dyn Haptics>,
    cards: Rc<RefCell<Vec<CardBinding>>>,
    editing: Option<CollectionId>,
    surface: gtk::Overlay,
    stack: gtk::Stack,
    pages: Option<Pages>,
}

#[derive(Debug)]
pub enum AppMsg {
    Navigate(Route),
    RouteChanged,
    Back,
    Refresh,
    Edit(CollectionId),
    Rename(String),
    SetOffline(bool),
    OpenConfig,
    ConfigReload,
}

impl From<AppEvent> for AppMsg {
    fn from(event: AppEvent) -> Self {
        match event {
            AppEvent::ConfigReload => AppMsg::ConfigReload,
        }
    }
}

#[relm4::component(pub)]
impl SimpleComponent for AppModel {
    type Init = (Config, async_channel::Receiver<AppEvent>);
    type Input = AppMsg;
    type Output = ();

    view! {
        #[root]
        gtk::ApplicationWindow {
            set_title: Some("Shelf"),
            set_default_size: (420, 820),

            add_controller = gtk::EventControllerKey {
                connect_key_pressed[sender] => move |_, key, _, _| {
                    if key == gtk::gdk::Key::Escape {
                        sender.input(AppMsg::Back);
                        return glib::Propagation::Stop;
                    }
                    glib::Propagation::Proceed
                }
            },

            #[name = "surface"]
            gtk::Overlay {
                #[wrap(Some)]
                set_child = &gtk::Box {
                    set_orientation: gtk::Orientation::Vertical,

                    gtk::CenterBox {
                        add_css_class: "toolbar",

                        #[wrap(Some)]
                        set_start_widget = &gtk::Button {
                            set_icon_name: "go-previous-symbolic",
                            set_tooltip_text: Some("Back"),
                            #[watch]
                            set_sensitive: model.can_go_back,
                            connect_clicked => AppMsg::Back,
                        },

                        #[wrap(Some)]
                        set_center_widget = &gtk::Label {
                            add_css_class: "title-3",
                            #[watch]
                            set_label: &model.page_title,
                        },

                        #[wrap(Some)]
                        set_end_widget = &gtk::Box {
                            set_spacing: 4,

                            gtk::ToggleButton {
                                set_icon_name: "network-offline-symbolic",
                                set_tooltip_text: Some("Simulate offline backend"),
                                connect_toggled[sender] => move |b| {
                                    sender.input(AppMsg::SetOffline(b.is_active()));
                                },
                            },

                            gtk::Button {
                                set_icon_name: "document-properties-symbolic",
                                set_tooltip_text: Some("Open configuration"),
                                connect_clicked => AppMsg::OpenConfig,
                            },
                        },
                    },

                    #[name = "stack"]
                    gtk::Stack {
                        set_vexpand: true,
                        set_transition_type: gtk::StackTransitionType::SlideLeftRight,
                    },
                },
            }
        }
    }

    fn init(
        init: Self::Init,
        root: Self::Root,
        sender: ComponentSender<Self>,
    ) -> ComponentParts<Self> {
        let (config, rx) = init;

        theme::load_css();

        let nav_sender = sender.clone();
        let model = AppModel {
            store: MemoryStore::new(&config.collections, config.store.latency()),
            overlay: OverlayHandle::new(OverlayHost::new(&config.radial)),
            config,
            page_title: String::new(),
            can_go_back: false,
            navigator: StackNavigator::new(move |_| nav_sender.input(AppMsg::RouteChanged)),
            toasts: ToastStrip::new(),
            haptics: Rc::new(LogHaptics),
            cards: Rc::default(),
            editing: None,
            surface: gtk::Overlay::default(),
            stack: gtk::Stack::default(),
            pages: None,
        };

        let widgets = view_output!();

        let mut model = model;
        model.surface = widgets.surface.clone();
        model.stack = widgets.stack.clone();
        model.pages = Some(build_pages(&widgets.stack, &sender));

        let frame = Rc::new(Cell::new(None::<OverlayFrame>));
        let scrim = build_scrim(&model.overlay, frame.clone());
        widgets.surface.add_overlay(&scrim);
        widgets.surface.add_overlay(&model.toasts.revealer);
        route_overlay_presses(&widgets.surface, &model.overlay);

        let cards = model.cards.clone();
        let overlay = model.overlay.clone();
        let toasts = model.toasts.clone();
        let tick_sender = sender.clone();
        let last = Cell::new(Instant::now());
        widgets.surface.add_tick_callback(move |surface, _| {
            let now = Instant::now();
            let dt = now.saturating_duration_since(last.replace(now));
            overlay.set_viewport(Size::new(surface.width() as f64, surface.height() as f64));

            let mut cards = cards.borrow_mut();
            for card in cards.iter_mut() {
                card.gesture.borrow_mut().poll(now);
                card.controller.process();
            }
            overlay.frame_menu(dt);
            for card in cards.iter_mut() {
                card.controller.process();
                if card.taps.drain(|_| {}) > 0 {
                    tick_sender.input(AppMsg::Navigate(card.route.clone()));
                }
            }
            drop(cards);

            let next = overlay.tick();
            if next.is_some() || frame.get().is_some() {
                scrim.queue_draw();
            }
            frame.set(next);
            toasts.tick(now);
            glib::ControlFlow::Continue
        });

        let sender_clone = sender.clone();
        relm4::spawn(async move {
            while let Ok(event) = rx.recv().await {
                sender_clone.input(AppMsg::from(event));
            }
        });

        model.render(&sender);

        ComponentParts { model, widgets }
    }

    fn update(&mut self, msg: Self::Input, sender: ComponentSender<Self>) {
        match msg {
            AppMsg::Navigate(route) => self.navigator.push(route),
            AppMsg::Back => {
                self.navigator.back();
            }
            AppMsg::RouteChanged => {
                let route = self.navigator.current();
                if !matches!(&route, Route::Collection(id) if Some(id) == self.editing.as_ref()) {
                    self.editing = None;
                }
                self.render(&sender);
            }
            AppMsg::Refresh => {
                let store = self.store.clone();
                self.navigator.retain(|route| match route {
                    Route::Collections => true,
                    Route::Collection(id) => store.collection(id).is_some(),
                    Route::Item { collection, item } => store
                        .collection(collection)
                        .is_some_and(|c| c.items.contains(item)),
                });
                self.render(&sender);
            }
            AppMsg::Edit(id) => {
                self.editing = Some(id.clone());
                let route = Route::Collection(id);
                if self.navigator.current() == route {
                    self.render(&sender);
                } else {
                    self.navigator.push(route);
                }
            }
            AppMsg::Rename(title) => {
                let Some(id) = self.editing.take() else {
                    return;
                };
                let title = title.trim();
                if !title.is_empty() {
                    match self.store.rename(&id, title) {
                        Ok(()) => self.toasts.show(Toast::new(format!("Renamed to “{title}”"))),
                        Err(e) => log::error!("Failed to rename {}: {}", id, e),
                    }
                }
                self.render(&sender);
            }
            AppMsg::SetOffline(offline) => {
                self.store.set_offline(offline);
                log::info!("store offline: {offline}");
            }
            AppMsg::OpenConfig => match config::write_default_config() {
                Ok(path) => {
                    if let Err(e) = std::process::Command::new("xdg-open").arg(&path).spawn() {
                        log::error!("Failed to open {}: {}", path.display(), e);
                    }
                }
                Err(e) => log::error!("Failed to write default config: {}", e),
            },
            AppMsg::ConfigReload => match config::load_config() {
                Ok(new_config) => {
                    self.config.radial = new_config.radial;
                    self.overlay.lock().set_durations(
                        self.config.radial.show_duration(),
                        self.config.radial.hide_duration(),
                    );
                    self.render(&sender);
                    log::info!("Configuration reloaded");
                }
                Err(e) => log::error!("Failed to reload config: {}", e),
            },
        }
    }
}

impl AppModel {
    /// Rebuilds the page for the current route, rebinding every card.
    fn render(&mut self, sender: &ComponentSender<Self>) {
        let Some(pages) = self.pages.as_ref() else {
            return;
        };
        if self.overlay.is_visible() {
            self.overlay.hide();
        }

        let mut bindings = Vec::new();
        let route = self.navigator.current();
        match &route {
            Route::Collections => {
                clear(&pages.collections);
                for collection in self.store.collections() {
                    let (widget, binding) =
                        self.bind_card(CardData::from_collection(&collection), sender);
                    pages.collections.insert(&widget, -1);
                    bindings.push(binding);
                }
                self.page_title = "Collections".to_string();
                self.stack.set_visible_child_name("collections");
            }
            Route::Collection(id) => {
                clear(&pages.collection);
                let title = self
                    .store
                    .collection(id)
                    .map(|c| c.title)
                    .unwrap_or_default();
                for item in self.store.items_of(id) {
                    let (widget, binding) = self.bind_card(CardData::from_item(id, &item), sender);
                    pages.collection.insert(&widget, -1);
                    bindings.push(binding);
                }
                let editing = self.editing.as_ref() == Some(id);
                pages.rename.set_visible(editing);
                if editing {
                    pages.rename.set_text(&title);
                    pages.rename.grab_focus();
                }
                self.page_title = title;
                self.stack.set_visible_child_name("collection");
            }
            Route::Item { collection, item } => {
                clear_box(&pages.item);
                if let Some(item) = self.store.item(item) {
                    let (widget, binding) =
                        self.bind_card(CardData::from_item(collection, &item), sender);
                    widget.set_halign(gtk::Align::Center);
                    pages.item.append(&widget);
                    bindings.push(binding);

                    let subtitle = gtk::Label::new(Some(&item.subtitle));
                    subtitle.add_css_class("title-4");
                    pages.item.append(&subtitle);

                    let title = self
                        .store
                        .collection(collection)
                        .map(|c| c.title)
                        .unwrap_or_else(|| collection.to_string());
                    let from = gtk::Label::new(Some(&format!("In {title}")));
                    from.add_css_class("dim-label");
                    pages.item.append(&from);

                    self.page_title = item.title;
                }
                self.stack.set_visible_child_name("item");
            }
        }

        log::debug!("rendered {:?} with {} cards", route, bindings.len());
        *self.cards.borrow_mut() = bindings;
        self.can_go_back = self.navigator.can_go_back();
    }

    fn bind_card(&self, data: CardData, sender: &ComponentSender<Self>) -> (gtk::Box, CardBinding) {
        let widget = card::build_card(&data);
        let route = data.route();
        let actions = CardActions {
            store: self.store.clone(),
            toasts: self.toasts.clone(),
            sender: sender.clone(),
            card: data.clone(),
        };

        let (bindings, controller) =
            RadialOverlayHook::new(self.overlay.clone(), self.haptics.clone())
                .config(&self.config.radial)
                .actions(data.actions())
                .on_select(move |action, guard| {
                    let actions = actions.clone();
                    relm4::spawn_local(async move {
                        // the overlay stays up until the action settles
                        let _guard = guard;
                        actions.run(action).await;
                    });
                })
                .on_cancel(|| log::debug!("card menu dismissed"))
                .build(CardPressable::new(&widget, &self.surface, data));

        let (tap_tx, taps) = ui_channel();
        let tap = TapGesture::new(bindings.is_long_pressed.clone(), tap_tx);
        let gesture = Rc::new(RefCell::new(bindings.into_gesture().with(tap)));
        card::attach_pointer(&widget, &self.surface, gesture.clone());

        (
            widget,
            CardBinding {
                gesture,
                controller,
                taps,
                route,
            },
        )
    }
}

/// What a card's menu actions do once selected.
#[derive(Clone)]
struct CardActions {
    store: MemoryStore,
    toasts: ToastStrip,
    sender: ComponentSender<AppModel>,
    card: CardData,
}

impl CardActions {
    async fn run(self, action: ActionId) {
        let result = match (&self.card.kind, action.as_str()) {
            (CardKind::Item { item, .. }, "star") => self.save_to(STARRED, item, "Starred").await,
            (CardKind::Item { item, .. }, "bookmark") => {
                self.save_to(BOOKMARKS, item, "Bookmarked").await
            }
            (CardKind::Item { .. }, "share") => {
                self.share();
                Ok(())
            }
            (CardKind::Item { collection, item }, "delete") => self.remove(collection, item).await,
            (CardKind::Collection(id), "edit") => {
                self.sender.input(AppMsg::Edit(id.clone()));
                Ok(())
            }
            (CardKind::Collection(id), "delete") => self.delete(id).await,
            (_, other) => {
                log::warn!("No handler for action {}", other);
                Ok(())
            }
        };

        if let Err(e) = result {
            log::warn!("{} on {} failed: {}", action, self.card.title, e);
            self.toasts
                .show(Toast::new(format!("Couldn’t {action} “{}”: {e}", self.card.title)));
        }
    }

    async fn save_to(&self, collection: &str, item: &ItemId, verb: &str) -> Result<(), ServiceError> {
        let target = CollectionId::from(collection);
        match self.store.add_item(&target, item).await {
            Ok(()) => {
                self.sender.input(AppMsg::Refresh);
                let (target, item) = (target.clone(), item.clone());
                self.undo_toast(format!("{verb} “{}”", self.card.title), move |store| async move {
                    store.remove_item(&target, &item).await
                });
                Ok(())
            }
            Err(ServiceError::Duplicate { .. }) => {
                self.toasts
                    .show(Toast::new(format!("“{}” is already there", self.card.title)));
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn share(&self) {
        if let Some(display) = gtk::gdk::Display::default() {
            display.clipboard().set_text(&self.card.title);
            self.toasts
                .show(Toast::new(format!("Copied “{}”", self.card.title)));
        }
    }

    async fn remove(&self, collection: &CollectionId, item: &ItemId) -> Result<(), ServiceError> {
        self.store.remove_item(collection, item).await?;
        self.sender.input(AppMsg::Refresh);
        let (collection, item) = (collection.clone(), item.clone());
        self.undo_toast(format!("Removed “{}”", self.card.title), move |store| async move {
            store.add_item(&collection, &item).await
        });
        Ok(())
    }

    async fn delete(&self, collection: &CollectionId) -> Result<(), ServiceError> {
        self.store.delete(collection).await?;
        self.sender.input(AppMsg::Refresh);
        let collection = collection.clone();
        self.undo_toast(format!("Deleted “{}”", self.card.title), move |store| async move {
            store.restore(&collection).await
        });
        Ok(())
    }

    fn undo_toast<F, Fut>(&self, message: String, undo: F)
    where
        F: FnOnce(MemoryStore) -> Fut + 'static,
        Fut: Future<Output = Result<(), ServiceError>> + 'static,
    {
        let store = self.store.clone();
        let sender = self.sender.clone();
        let toasts = self.toasts.clone();
        self.toasts.show(Toast::new(message).action("Undo", move || {
            relm4::spawn_local(async move {
                match undo(store).await {
                    Ok(()) => sender.input(AppMsg::Refresh),
                    Err(e) => {
                        log::warn!("Undo failed: {}", e);
                        toasts.show(Toast::new(format!("Undo failed: {e}")));
                    }
                }
            });
        }));
    }
}

fn flow_box() -> gtk::FlowBox {
    let grid = gtk::FlowBox::new();
    grid.set_selection_mode(gtk::SelectionMode::None);
    grid.set_homogeneous(true);
    grid.set_min_children_per_line(2);
    grid.set_max_children_per_line(6);
    grid.set_column_spacing(12);
    grid.set_row_spacing(12);
    grid.set_valign(gtk::Align::Start);
    grid.set_margin_top(12);
    grid.set_margin_bottom(12);
    grid.set_margin_start(12);
    grid.set_margin_end(12);
    grid
}

fn scrolled(child: &impl IsA<gtk::Widget>) -> gtk::ScrolledWindow {
    let scroll = gtk::ScrolledWindow::new();
    scroll.set_hscrollbar_policy(gtk::PolicyType::Never);
    scroll.set_vexpand(true);
    scroll.set_child(Some(child));
    scroll
}

fn build_pages(stack: &gtk::Stack, sender: &ComponentSender<AppModel>) -> Pages {
    let collections = flow_box();
    stack.add_named(&scrolled(&collections), Some("collections"));

    let collection = flow_box();
    let rename = gtk::Entry::new();
    rename.set_placeholder_text(Some("Collection name"));
    rename.set_margin_start(12);
    rename.set_margin_end(12);
    rename.set_margin_top(12);
    rename.set_visible(false);
    let rename_sender = sender.clone();
    rename.connect_activate(move |entry| {
        rename_sender.input(AppMsg::Rename(entry.text().to_string()));
    });
    let collection_page = gtk::Box::new(gtk::Orientation::Vertical, 0);
    collection_page.append(&rename);
    collection_page.append(&scrolled(&collection));
    stack.add_named(&collection_page, Some("collection"));

    let item = gtk::Box::new(gtk::Orientation::Vertical, 8);
    item.set_margin_top(24);
    item.set_valign(gtk::Align::Start);
    stack.add_named(&scrolled(&item), Some("item"));

    Pages {
        collections,
        collection,
        rename,
        item,
    }
}

/// Full-window drawing layer for the overlay session. It never takes pointer
/// input itself; see [`route_overlay_presses`].
fn build_scrim(overlay: &CardOverlay, frame: Rc<Cell<Option<OverlayFrame>>>) -> gtk::DrawingArea {
    let scrim = gtk::DrawingArea::new();
    scrim.add_css_class("shelf-scrim");
    scrim.set_hexpand(true);
    scrim.set_vexpand(true);
    scrim.set_can_target(false);

    let icons = IconCache::default();
    let draw_overlay = overlay.clone();
    scrim.set_draw_func(move |area, cr, w, h| {
        let Some(frame) = frame.get() else {
            return;
        };
        let style_context = area.style_context();
        let colors = ThemeColors::from_context(&style_context);
        let host = draw_overlay.lock();
        if let Err(e) = radial::draw(cr, host.content(), &frame, (w as f64, h as f64), &colors, &icons) {
            log::error!("Drawing error: {}", e);
        }
    });
    scrim
}

/// Claims presses that land on the lifted card or a button while a session is
/// mounted. Backdrop presses reach the page underneath.
fn route_overlay_presses(surface: &gtk::Overlay, overlay: &CardOverlay) {
    let click = gtk::GestureClick::new();
    click.set_button(0);
    click.set_propagation_phase(gtk::PropagationPhase::Capture);

    let overlay = overlay.clone();
    click.connect_pressed(move |gesture, _, x, y| {
        let point = Point::new(x, y);
        match overlay.layer_at(point) {
            Some(layer) if layer.intercepts_pointer() => {
                gesture.set_state(gtk::EventSequenceState::Claimed);
                let resolved = overlay.with_content(|c| c.menu.press_at(point)).flatten();
                log::debug!("overlay press at {:?}: {:?}", point, resolved);
            }
            Some(_) => log::debug!("backdrop press at {:?} passes through", point),
            None => {}
        }
    });
    surface.add_controller(click);
}

fn clear(grid: &gtk::FlowBox) {
    while let Some(child) = grid.first_child() {
        grid.remove(&child);
    }
}

fn clear_box(container: &gtk::Box) {
    while let Some(child) = container.first_child() {
        container.remove(&child);
    }
}
