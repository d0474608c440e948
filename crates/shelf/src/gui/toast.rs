use fanout::services::{Toast, ToastSurface};
use gtk::prelude::*;
use gtk4 as gtk;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Instant;

struct Shown {
    toast: Toast,
    until: Instant,
}

/// FIFO of toasts, one visible at a time.
#[derive(Default)]
pub struct ToastQueue {
    pending: VecDeque<Toast>,
    current: Option<Shown>,
}

impl ToastQueue {
    /// Returns whether the visible toast changed.
    pub fn push(&mut self, toast: Toast, now: Instant) -> bool {
        self.pending.push_back(toast);
        self.tick(now)
    }

    /// Expires the visible toast and promotes the next one. Returns whether
    /// the visible toast changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut changed = false;
        if self.current.as_ref().is_some_and(|s| now >= s.until) {
            self.current = None;
            changed = true;
        }
        if self.current.is_none()
            && let Some(toast) = self.pending.pop_front()
        {
            log::debug!("toast: {}", toast.message);
            self.current = Some(Shown {
                until: now + toast.duration,
                toast,
            });
            changed = true;
        }
        changed
    }

    pub fn current(&self) -> Option<&Toast> {
        self.current.as_ref().map(|s| &s.toast)
    }

    pub fn len(&self) -> usize {
        self.pending.len() + usize::from(self.current.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dismisses the visible toast and hands back its action, if it had
    /// one. The caller runs it once the queue is no longer borrowed.
    pub fn take_action(&mut self, now: Instant) -> Option<Box<dyn FnOnce()>> {
        let action = self.current.take()?.toast.on_action;
        self.tick(now);
        action
    }

    pub fn dismiss(&mut self, now: Instant) -> bool {
        if self.current.take().is_none() {
            return false;
        }
        self.tick(now);
        true
    }
}

/// Bottom-of-window strip showing the queue head.
#[derive(Clone)]
pub struct ToastStrip {
    queue: Rc<RefCell<ToastQueue>>,
    pub revealer: gtk::Revealer,
    label: gtk::Label,
    button: gtk::Button,
}

impl ToastStrip {
    pub fn new() -> Self {
        let label = gtk::Label::new(None);
        label.set_wrap(true);
        let button = gtk::Button::new();
        button.add_css_class("flat");
        let row = gtk::Box::new(gtk::Orientation::Horizontal, 12);
        row.add_css_class("shelf-toast");
        row.append(&label);
        row.append(&button);

        let revealer = gtk::Revealer::new();
        revealer.set_transition_type(gtk::RevealerTransitionType::SlideUp);
        revealer.set_halign(gtk::Align::Center);
        revealer.set_valign(gtk::Align::End);
        revealer.set_child(Some(&row));

        let strip = Self {
            queue: Rc::new(RefCell::new(ToastQueue::default())),
            revealer,
            label,
            button,
        };

        let on_click = strip.clone();
        strip.button.connect_clicked(move |_| {
            let action = on_click.queue.borrow_mut().take_action(Instant::now());
            on_click.sync();
            if let Some(action) = action {
                action();
            }
        });
        strip
    }

    pub fn tick(&self, now: Instant) {
        let changed = self.queue.borrow_mut().tick(now);
        if changed {
            self.sync();
        }
    }

    fn sync(&self) {
        let queue = self.queue.borrow();
        match queue.current() {
            Some(toast) => {
                self.label.set_label(&toast.message);
                match &toast.action_text {
                    Some(text) => {
                        self.button.set_label(text);
                        self.button.set_visible(true);
                    }
                    None => self.button.set_visible(false),
                }
                self.revealer.set_reveal_child(true);
            }
            None => self.revealer.set_reveal_child(false),
        }
    }
}

impl Default for ToastStrip {
    fn default() -> Self {
        Self::new()
    }
}

impl ToastSurface for ToastStrip {
    fn show(&self, toast: Toast) {
        let changed = self.queue.borrow_mut().push(toast, Instant::now());
        if changed {
            self.sync();
        }
    }
}
