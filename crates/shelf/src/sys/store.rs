//! In-memory stand-in for the collection backend. Every mutation is one
//! simulated round trip on the GTK main context.

use crate::config::{BOOKMARKS, STARRED, SeedCollection, SeedItem, Tint};
use fanout::services::{CollectionId, CollectionService, ItemId, ServiceError};
use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    pub subtitle: String,
    pub cover: Option<PathBuf>,
    pub tint: Tint,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    pub id: CollectionId,
    pub title: String,
    pub cover: Option<PathBuf>,
    pub tint: Tint,
    pub items: Vec<ItemId>,
}

impl From<&SeedItem> for Item {
    fn from(seed: &SeedItem) -> Self {
        Self {
            id: seed.id.clone(),
            title: seed.title.clone(),
            subtitle: seed.subtitle.clone(),
            cover: seed.cover.clone(),
            tint: seed.tint,
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    collections: Vec<Collection>,
    /// Deleted collections with the position they held.
    trash: Vec<(usize, Collection)>,
    items: Vec<Item>,
}

impl Inner {
    fn collection_mut(&mut self, id: &CollectionId) -> Result<&mut Collection, ServiceError> {
        self.collections
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| ServiceError::CollectionNotFound(id.clone()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<Inner>>,
    latency: Duration,
    offline: Rc<Cell<bool>>,
}

impl MemoryStore {
    pub fn new(seed: &[SeedCollection], latency: Duration) -> Self {
        let mut inner = Inner::default();
        for c in seed {
            for item in &c.items {
                if !inner.items.iter().any(|i| i.id == item.id) {
                    inner.items.push(Item::from(item));
                }
            }
            inner.collections.push(Collection {
                id: c.id.clone(),
                title: c.title.clone(),
                cover: c.cover.clone(),
                tint: c.tint,
                items: c.items.iter().map(|i| i.id.clone()).collect(),
            });
        }
        for (id, title) in [(STARRED, "Starred"), (BOOKMARKS, "Bookmarks")] {
            if !inner.collections.iter().any(|c| c.id.as_str() == id) {
                inner.collections.push(Collection {
                    id: CollectionId::from(id),
                    title: title.to_string(),
                    cover: None,
                    tint: Tint::default(),
                    items: Vec::new(),
                });
            }
        }

        Self {
            inner: Rc::new(RefCell::new(inner)),
            latency,
            offline: Rc::new(Cell::new(false)),
        }
    }

    /// While offline every mutation fails with [`ServiceError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.set(offline);
    }

    pub fn collections(&self) -> Vec<Collection> {
        self.inner.borrow().collections.clone()
    }

    pub fn collection(&self, id: &CollectionId) -> Option<Collection> {
        self.inner
            .borrow()
            .collections
            .iter()
            .find(|c| &c.id == id)
            .cloned()
    }

    pub fn item(&self, id: &ItemId) -> Option<Item> {
        self.inner.borrow().items.iter().find(|i| &i.id == id).cloned()
    }

    pub fn items_of(&self, id: &CollectionId) -> Vec<Item> {
        let inner = self.inner.borrow();
        let Some(collection) = inner.collections.iter().find(|c| &c.id == id) else {
            return Vec::new();
        };
        collection
            .items
            .iter()
            .filter_map(|item| inner.items.iter().find(|i| &i.id == item).cloned())
            .collect()
    }

    /// Local-only edit; the backend has no rename call.
    pub fn rename(&self, id: &CollectionId, title: &str) -> Result<(), ServiceError> {
        self.inner.borrow_mut().collection_mut(id)?.title = title.to_string();
        Ok(())
    }

    async fn round_trip(&self) -> Result<(), ServiceError> {
        if !self.latency.is_zero() {
            glib::timeout_future(self.latency).await;
        }
        if self.offline.get() {
            return Err(ServiceError::Unavailable("store is offline".to_string()));
        }
        Ok(())
    }
}

impl CollectionService for MemoryStore {
    async fn add_item(&self, collection: &CollectionId, item: &ItemId) -> Result<(), ServiceError> {
        self.round_trip().await?;
        let mut inner = self.inner.borrow_mut();
        let target = inner.collection_mut(collection)?;
        if target.items.contains(item) {
            return Err(ServiceError::Duplicate {
                collection: collection.clone(),
                item: item.clone(),
            });
        }
        target.items.push(item.clone());
        log::info!("added {item} to {collection}");
        Ok(())
    }

    async fn remove_item(
        &self,
        collection: &CollectionId,
        item: &ItemId,
    ) -> Result<(), ServiceError> {
        self.round_trip().await?;
        let mut inner = self.inner.borrow_mut();
        let target = inner.collection_mut(collection)?;
        let Some(pos) = target.items.iter().position(|i| i == item) else {
            return Err(ServiceError::ItemNotFound {
                collection: collection.clone(),
                item: item.clone(),
            });
        };
        target.items.remove(pos);
        log::info!("removed {item} from {collection}");
        Ok(())
    }

    async fn delete(&self, collection: &CollectionId) -> Result<(), ServiceError> {
        self.round_trip().await?;
        let mut inner = self.inner.borrow_mut();
        let Some(pos) = inner.collections.iter().position(|c| &c.id == collection) else {
            return Err(ServiceError::CollectionNotFound(collection.clone()));
        };
        let removed = inner.collections.remove(pos);
        inner.trash.push((pos, removed));
        log::info!("deleted collection {collection}");
        Ok(())
    }

    async fn restore(&self, collection: &CollectionId) -> Result<(), ServiceError> {
        self.round_trip().await?;
        let mut inner = self.inner.borrow_mut();
        let Some(idx) = inner.trash.iter().rposition(|(_, c)| &c.id == collection) else {
            return Err(ServiceError::CollectionNotFound(collection.clone()));
        };
        let (pos, restored) = inner.trash.remove(idx);
        let pos = pos.min(inner.collections.len());
        inner.collections.insert(pos, restored);
        log::info!("restored collection {collection}");
        Ok(())
    }
}
