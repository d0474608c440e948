//! Observable cells shared between the gesture path and the menu.
//!
//! The producer writes, consumers either read the latest value each frame or
//! subscribe to changes. Listeners run on the writing thread with no lock
//! held, so a listener may write back to its own cell or (un)subscribe.

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Inner<T> {
    value: RwLock<T>,
    version: AtomicU64,
    next_id: AtomicU64,
    listeners: Mutex<Vec<(SubscriptionId, Listener<T>)>>,
}

pub struct SharedValue<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for SharedValue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for SharedValue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedValue")
            .field("value", &*self.inner.value.read())
            .field("version", &self.inner.version.load(Ordering::Relaxed))
            .finish()
    }
}

impl<T: Default + Clone + PartialEq + Send + Sync + 'static> Default for SharedValue<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + PartialEq + Send + Sync + 'static> SharedValue<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Inner {
                value: RwLock::new(value),
                version: AtomicU64::new(0),
                next_id: AtomicU64::new(0),
                listeners: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn get(&self) -> T {
        self.inner.value.read().clone()
    }

    /// Number of changes written so far.
    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::Acquire)
    }

    /// Stores `value`, notifying subscribers if it differs from the current
    /// one. Returns whether it changed.
    pub fn set(&self, value: T) -> bool {
        self.update(|v| *v = value)
    }

    pub fn update(&self, f: impl FnOnce(&mut T)) -> bool {
        let snapshot = {
            let mut guard = self.inner.value.write();
            let before = (*guard).clone();
            f(&mut *guard);
            if *guard == before {
                return false;
            }
            self.inner.version.fetch_add(1, Ordering::AcqRel);
            guard.clone()
        };
        self.notify(&snapshot);
        true
    }

    pub fn subscribe(&self, listener: impl Fn(&T) + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.inner.listeners.lock().push((id, Arc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.inner.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    fn notify(&self, value: &T) {
        let listeners: Vec<Listener<T>> = self
            .inner
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(value);
        }
    }
}

/// Edge-triggered "gesture ended" counter. Each `raise` is a distinct value,
/// so a reaction keyed on change never misses a release the way a boolean
/// flipped twice could.
#[derive(Debug, Clone, Default)]
pub struct ReleaseSignal(SharedValue<u64>);

impl ReleaseSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) -> u64 {
        let mut raised = 0;
        self.0.update(|v| {
            *v += 1;
            raised = *v;
        });
        raised
    }

    pub fn count(&self) -> u64 {
        self.0.get()
    }

    pub fn subscribe(&self, listener: impl Fn(&u64) + Send + Sync + 'static) -> SubscriptionId {
        self.0.subscribe(listener)
    }

    pub fn observer(&self) -> ReleaseObserver {
        ReleaseObserver {
            signal: self.clone(),
            seen: self.count(),
        }
    }
}

/// Consumer side of a [`ReleaseSignal`], remembering the last value reacted to.
#[derive(Debug, Clone)]
pub struct ReleaseObserver {
    signal: ReleaseSignal,
    seen: u64,
}

impl ReleaseObserver {
    /// Returns the new counter value if it moved since the last call.
    pub fn poll(&mut self) -> Option<u64> {
        let now = self.signal.count();
        (now != self.seen).then(|| {
            self.seen = now;
            now
        })
    }
}
