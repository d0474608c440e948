use fanout::services::{Navigator, Route};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub struct History {
    stack: Vec<Route>,
}

impl Default for History {
    fn default() -> Self {
        Self {
            stack: vec![Route::Collections],
        }
    }
}

impl History {
    pub fn current(&self) -> &Route {
        // never empty: the root is not popped
        &self.stack[self.stack.len() - 1]
    }

    /// Pushing the current route again is a no-op.
    pub fn push(&mut self, route: Route) -> bool {
        if *self.current() == route {
            return false;
        }
        self.stack.push(route);
        true
    }

    pub fn back(&mut self) -> bool {
        if !self.can_go_back() {
            return false;
        }
        self.stack.pop();
        true
    }

    pub fn can_go_back(&self) -> bool {
        self.stack.len() > 1
    }

    /// Drops routes that no longer resolve, keeping the root.
    pub fn retain(&mut self, mut exists: impl FnMut(&Route) -> bool) {
        let mut i = 1;
        while i < self.stack.len() {
            if exists(&self.stack[i]) {
                i += 1;
            } else {
                self.stack.truncate(i);
            }
        }
    }
}

/// Navigator over a shared [`History`] that reports every route change.
#[derive(Clone)]
pub struct StackNavigator {
    history: Rc<RefCell<History>>,
    on_change: Rc<dyn Fn(&Route)>,
}

impl StackNavigator {
    pub fn new(on_change: impl Fn(&Route) + 'static) -> Self {
        Self {
            history: Rc::default(),
            on_change: Rc::new(on_change),
        }
    }

    pub fn current(&self) -> Route {
        self.history.borrow().current().clone()
    }

    pub fn can_go_back(&self) -> bool {
        self.history.borrow().can_go_back()
    }

    pub fn retain(&self, exists: impl FnMut(&Route) -> bool) {
        let before = self.current();
        self.history.borrow_mut().retain(exists);
        let after = self.current();
        if before != after {
            (self.on_change)(&after);
        }
    }
}

impl Navigator for StackNavigator {
    fn push(&self, route: Route) {
        let pushed = self.history.borrow_mut().push(route);
        if pushed {
            let current = self.current();
            log::debug!("navigate to {:?}", current);
            (self.on_change)(&current);
        }
    }

    fn back(&self) -> bool {
        let popped = self.history.borrow_mut().back();
        if popped {
            let current = self.current();
            (self.on_change)(&current);
        }
        popped
    }
}
