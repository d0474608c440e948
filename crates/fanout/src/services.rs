//! Collaborators that menu action callbacks talk to. Nothing in the gesture
//! core calls these; the caller of the hook does.

use derive_more::{AsRef, Deref, Display, From, Into};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, Deref, From, Into, AsRef,
)]
#[serde(transparent)]
pub struct CollectionId(String);

crate::string_newtype!(CollectionId);

#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, Deref, From, Into, AsRef,
)]
#[serde(transparent)]
pub struct ItemId(String);

crate::string_newtype!(ItemId);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("collection not found: {0}")]
    CollectionNotFound(CollectionId),

    #[error("item {item} is already in {collection}")]
    Duplicate {
        collection: CollectionId,
        item: ItemId,
    },

    #[error("item {item} is not in {collection}")]
    ItemNotFound {
        collection: CollectionId,
        item: ItemId,
    },

    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Collection mutations. Each call is a single request/response round trip.
pub trait CollectionService {
    fn add_item(
        &self,
        collection: &CollectionId,
        item: &ItemId,
    ) -> impl Future<Output = Result<(), ServiceError>>;

    fn remove_item(
        &self,
        collection: &CollectionId,
        item: &ItemId,
    ) -> impl Future<Output = Result<(), ServiceError>>;

    fn delete(&self, collection: &CollectionId) -> impl Future<Output = Result<(), ServiceError>>;

    /// Brings back a collection removed by [`delete`](Self::delete).
    fn restore(&self, collection: &CollectionId)
    -> impl Future<Output = Result<(), ServiceError>>;
}

pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_millis(3000);

pub struct Toast {
    pub message: String,
    pub action_text: Option<String>,
    pub on_action: Option<Box<dyn FnOnce()>>,
    pub duration: Duration,
}

impl Toast {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            action_text: None,
            on_action: None,
            duration: DEFAULT_TOAST_DURATION,
        }
    }

    pub fn action(mut self, text: impl Into<String>, on_press: impl FnOnce() + 'static) -> Self {
        self.action_text = Some(text.into());
        self.on_action = Some(Box::new(on_press));
        self
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Runs the action callback, at most once.
    pub fn press_action(&mut self) -> bool {
        match self.on_action.take() {
            Some(f) => {
                f();
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for Toast {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toast")
            .field("message", &self.message)
            .field("action_text", &self.action_text)
            .field("duration", &self.duration)
            .finish_non_exhaustive()
    }
}

pub trait ToastSurface {
    fn show(&self, toast: Toast);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Route {
    Collections,
    Collection(CollectionId),
    Item {
        collection: CollectionId,
        item: ItemId,
    },
}

pub trait Navigator {
    fn push(&self, route: Route);

    /// Returns `false` when already at the root.
    fn back(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn toast_action_runs_once() {
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let mut toast = Toast::new("Deleted").action("Undo", move || counter.set(counter.get() + 1));

        assert_eq!(toast.action_text.as_deref(), Some("Undo"));
        assert!(toast.press_action());
        assert!(!toast.press_action());
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn error_messages_name_the_ids() {
        let err = ServiceError::Duplicate {
            collection: "reading".into(),
            item: "dune".into(),
        };
        assert_eq!(err.to_string(), "item dune is already in reading");
    }

    #[test]
    fn route_round_trips_through_json() {
        let route = Route::Item {
            collection: "reading".into(),
            item: "dune".into(),
        };
        let json = serde_json::to_string(&route).unwrap();
        assert_eq!(json, r#"{"Item":{"collection":"reading","item":"dune"}}"#);
        assert_eq!(serde_json::from_str::<Route>(&json).unwrap(), route);
    }
}
