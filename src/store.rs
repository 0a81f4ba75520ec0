use std::{collections::BTreeMap, sync::Mutex};

use chrono::{DateTime, Utc};

use crate::{
    catalog::CatalogItem,
    config::{Config, StorageKind},
    date::DateKey,
    dishfile::FileStore,
    error::Error,
};

pub type DishMap = BTreeMap<DateKey, CatalogItem>;

/// Date-keyed record of the dish chosen for each day.
///
/// Reads never fail: unreadable backing storage looks like an empty store.
pub trait Store: Send + Sync {
    fn get(&self, date: &DateKey) -> Option<CatalogItem>;

    /// Insert or overwrite the record for `date`.
    fn set(&self, date: DateKey, item: CatalogItem) -> Result<(), Error>;

    fn get_all(&self) -> DishMap;

    fn last_modified(&self) -> Option<DateTime<Utc>>;
}

/// Volatile backing, lost when the process exits.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    data: DishMap,
    updated: Option<DateTime<Utc>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.data.clear();
        inner.updated = None;
    }

    pub fn remove(&self, date: &DateKey) -> Option<CatalogItem> {
        self.lock().data.remove(date)
    }

    pub fn is_empty(&self) -> bool {
        self.lock().data.is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
        // A panicked writer leaves the map itself intact
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Store for MemoryStore {
    fn get(&self, date: &DateKey) -> Option<CatalogItem> {
        self.lock().data.get(date).cloned()
    }

    fn set(&self, date: DateKey, item: CatalogItem) -> Result<(), Error> {
        let mut inner = self.lock();
        inner.data.insert(date, item);
        inner.updated = Some(Utc::now());
        Ok(())
    }

    fn get_all(&self) -> DishMap {
        self.lock().data.clone()
    }

    fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.lock().updated
    }
}

/// Durable store that keeps records it failed to write in memory.
///
/// Overlay records shadow the durable ones until a later write succeeds, at
/// which point they are flushed to the durable backing.
pub struct OverlayStore<S> {
    durable: S,
    overlay: MemoryStore,
}

impl<S: Store> OverlayStore<S> {
    pub fn new(durable: S) -> Self {
        OverlayStore {
            durable,
            overlay: MemoryStore::new(),
        }
    }

    fn flush_overlay(&self) {
        if self.overlay.is_empty() {
            return;
        }
        for (date, item) in self.overlay.get_all() {
            if let Err(e) = self.durable.set(date, item) {
                tracing::warn!(%date, error = %e, "overlay flush failed, keeping records in memory");
                return;
            }
        }
        tracing::info!("durable dish store recovered, overlay flushed");
        self.overlay.reset();
    }
}

impl<S: Store> Store for OverlayStore<S> {
    fn get(&self, date: &DateKey) -> Option<CatalogItem> {
        self.overlay.get(date).or_else(|| self.durable.get(date))
    }

    fn set(&self, date: DateKey, item: CatalogItem) -> Result<(), Error> {
        match self.durable.set(date, item.clone()) {
            Ok(()) => {
                self.overlay.remove(&date);
                self.flush_overlay();
                Ok(())
            }
            Err(e) => {
                tracing::warn!(%date, error = %e, "durable write failed, keeping record in memory");
                self.overlay.set(date, item)?;
                Err(e)
            }
        }
    }

    fn get_all(&self) -> DishMap {
        let mut all = self.durable.get_all();
        all.extend(self.overlay.get_all());
        all
    }

    fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.durable.last_modified().max(self.overlay.last_modified())
    }
}

/// Pick the backing named by `config`. A durable backing that cannot be
/// prepared degrades to memory.
pub fn open_store(config: &Config) -> anyhow::Result<Box<dyn Store>> {
    match config.storage()? {
        StorageKind::Memory => {
            tracing::info!("using in-memory dish store");
            Ok(Box::new(MemoryStore::new()))
        }
        StorageKind::File => {
            let path = config.db_path();
            match FileStore::open(&path) {
                Ok(store) => {
                    tracing::info!(path = %store.path().display(), "using file dish store");
                    Ok(Box::new(OverlayStore::new(store)))
                }
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "dish file not writable, falling back to in-memory store"
                    );
                    Ok(Box::new(MemoryStore::new()))
                }
            }
        }
    }
}
