use chrono::{DateTime, Local, TimeZone, Utc};

use crate::{
    catalog::{default_catalog, validate, CatalogItem},
    config::Config,
    date::{effective_date, DateKey},
    error::{Degraded, Error, Resolution},
    selector::select,
    store::{open_store, DishMap, Store},
};

/// Resolves and persists the dish of the day.
pub struct State {
    catalog: Vec<CatalogItem>,
    store: Box<dyn Store>,
}

impl State {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let store = open_store(config)?;
        let state = State::with_store(default_catalog(), store)?;
        tracing::info!(dishes = state.catalog().len(), "catalog loaded");
        Ok(state)
    }

    pub fn with_store(catalog: Vec<CatalogItem>, store: Box<dyn Store>) -> Result<Self, Error> {
        validate(&catalog)?;
        Ok(State { catalog, store })
    }

    pub fn catalog(&self) -> &[CatalogItem] {
        &self.catalog
    }

    /// Item served when nothing better can be resolved.
    pub fn fallback_item(&self) -> &CatalogItem {
        &self.catalog[0]
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub fn all_dishes(&self) -> DishMap {
        self.store.get_all()
    }

    pub fn today(&self) -> DateKey {
        effective_date(&Local::now())
    }

    /// The stored dish for `date`, choosing and persisting one on first use.
    pub fn resolve_for_date(&self, date: DateKey) -> Resolution {
        if let Some(item) = self.store.get(&date) {
            return Ok(item);
        }
        let item = self.select(date.seed())?;
        tracing::info!(%date, dish = %item.name, "chose dish for new date");
        self.persist(date, item)
    }

    /// Replace the dish for `date` with one chosen from the current time.
    pub fn force_reroll(&self, date: DateKey) -> Resolution {
        let seed = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
        self.reroll_with_seed(date, seed)
    }

    fn reroll_with_seed(&self, date: DateKey, seed: u64) -> Resolution {
        let item = self.select(seed)?;
        tracing::info!(%date, dish = %item.name, seed, "re-rolled dish");
        self.persist(date, item)
    }

    /// Today's dish along with the effective date it was resolved for.
    pub fn current(&self) -> (DateKey, Resolution) {
        self.current_at(&Local::now())
    }

    pub fn current_at<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> (DateKey, Resolution) {
        let date = effective_date(now);
        (date, self.resolve_for_date(date))
    }

    fn select(&self, seed: u64) -> Result<CatalogItem, Degraded> {
        match select(seed, &self.catalog) {
            Ok(item) => Ok(item.clone()),
            Err(source) => {
                tracing::error!(error = %source, "dish selection failed");
                Err(Degraded {
                    fallback: self.fallback_item().clone(),
                    source,
                })
            }
        }
    }

    fn persist(&self, date: DateKey, item: CatalogItem) -> Resolution {
        match self.store.set(date, item.clone()) {
            Ok(()) => Ok(item),
            Err(source) => {
                tracing::warn!(%date, error = %source, "failed to persist dish");
                Err(Degraded {
                    fallback: item,
                    source,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, FixedOffset, TimeZone, Utc};

    use super::State;
    use crate::{
        catalog::{default_catalog, CatalogItem},
        date::DateKey,
        error::{Error, Resolution},
        dishfile::FileStore,
        selector::select,
        store::{DishMap, MemoryStore, OverlayStore, Store},
    };

    fn key(s: &str) -> DateKey {
        s.parse().unwrap()
    }

    fn state() -> State {
        State::with_store(default_catalog(), Box::new(MemoryStore::new())).unwrap()
    }

    /// Store whose writes always fail.
    struct ReadOnlyStore;

    impl Store for ReadOnlyStore {
        fn get(&self, _date: &DateKey) -> Option<CatalogItem> {
            None
        }

        fn set(&self, _date: DateKey, _item: CatalogItem) -> Result<(), Error> {
            Err(Error::StorageUnavailable("read-only".into()))
        }

        fn get_all(&self) -> DishMap {
            DishMap::new()
        }

        fn last_modified(&self) -> Option<DateTime<Utc>> {
            None
        }
    }

    #[test]
    fn resolve_selects_from_date_seed_and_persists() {
        let state = state();
        let date = key("2024-01-15");
        let item = state.resolve_for_date(date).unwrap();
        let expected = select(20240115, state.catalog()).unwrap();
        assert_eq!(&item, expected);
        assert_eq!(state.store().get(&date), Some(item));
    }

    #[test]
    fn resolve_is_idempotent() {
        let state = state();
        let date = key("2024-03-09");
        let first = state.resolve_for_date(date).unwrap();
        for _ in 0..3 {
            assert_eq!(state.resolve_for_date(date).unwrap(), first);
        }
        assert_eq!(state.all_dishes().len(), 1);
    }

    #[test]
    fn stored_record_wins_over_selection() {
        let state = state();
        let date = key("2024-01-15");
        let stored = CatalogItem::new("Retired dish", "old.jpg", 2);
        state.store().set(date, stored.clone()).unwrap();
        assert_eq!(state.resolve_for_date(date).unwrap(), stored);
    }

    #[test]
    fn reroll_overwrites_record() {
        let state = state();
        let date = key("2024-01-15");
        let original = state.resolve_for_date(date).unwrap();
        assert_eq!(original.name, "Cơm sườn");

        // (2 * 9301 + 49297) % 15 = 9 -> fourth dish
        let rerolled = state.reroll_with_seed(date, 2).unwrap();
        assert_eq!(rerolled.name, "Cơm như ý ");
        assert_eq!(state.resolve_for_date(date).unwrap(), rerolled);
        assert_eq!(state.all_dishes().len(), 1);
    }

    #[test]
    fn force_reroll_persists_its_choice() {
        let state = state();
        let date = key("2024-01-15");
        let rerolled = state.force_reroll(date).unwrap();
        assert_eq!(state.store().get(&date), Some(rerolled.clone()));
        assert_eq!(state.resolve_for_date(date).unwrap(), rerolled);
    }

    #[test]
    fn current_uses_effective_date() {
        let state = state();
        let tz = FixedOffset::east_opt(7 * 3600).unwrap();

        let before = tz.with_ymd_and_hms(2024, 1, 16, 9, 59, 59).unwrap();
        let (date, item) = state.current_at(&before);
        assert_eq!(date, key("2024-01-15"));
        assert_eq!(state.store().get(&date), Some(item.unwrap()));
        assert!(state.store().get(&key("2024-01-16")).is_none());

        let after = tz.with_ymd_and_hms(2024, 1, 16, 10, 0, 0).unwrap();
        let (date, item) = state.current_at(&after);
        assert_eq!(date, key("2024-01-16"));
        assert_eq!(item.unwrap(), state.resolve_for_date(date).unwrap());
    }

    #[test]
    fn failed_write_degrades_with_selected_item() {
        let state = State::with_store(default_catalog(), Box::new(ReadOnlyStore)).unwrap();
        let result: Resolution = state.resolve_for_date(key("2024-01-15"));
        let degraded = result.unwrap_err();
        assert_eq!(degraded.fallback.name, "Cơm sườn");
        assert!(matches!(degraded.source, Error::StorageUnavailable(_)));
    }

    #[test]
    fn invalid_catalog_is_rejected() {
        let result = State::with_store(Vec::new(), Box::new(MemoryStore::new()));
        assert!(matches!(result, Err(Error::InvalidCatalog(_))));

        let result = State::with_store(
            vec![CatalogItem::new("A", "a.jpg", 0)],
            Box::new(MemoryStore::new()),
        );
        assert!(matches!(result, Err(Error::InvalidCatalog(_))));
    }

    #[test]
    fn reroll_survives_losing_the_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("data");
        let store = OverlayStore::new(FileStore::open(data_dir.join("dishes.json")).unwrap());
        let state = State::with_store(default_catalog(), Box::new(store)).unwrap();
        let date = key("2024-01-15");
        assert_eq!(state.resolve_for_date(date).unwrap().name, "Cơm sườn");

        std::fs::remove_dir_all(&data_dir).unwrap();
        let degraded = state.reroll_with_seed(date, 2).unwrap_err();
        assert_eq!(degraded.fallback.name, "Cơm như ý ");
        assert!(matches!(degraded.source, Error::StorageUnavailable(_)));

        assert_eq!(state.resolve_for_date(date).unwrap(), degraded.fallback);
        assert_eq!(state.all_dishes()[&date], degraded.fallback);
    }
}
