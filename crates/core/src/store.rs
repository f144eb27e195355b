use std::{
    collections::VecDeque,
    sync::{Arc, PoisonError, RwLock},
};

use chrono::Utc;
use tracing::warn;

use crate::{
    error::{Result, TrackerError},
    storage::Storage,
    types::EventRecord,
};

pub const STORAGE_KEY: &str = "softham_analytics";
pub const MAX_EVENTS: usize = 1000;

/// Path of the page currently being viewed.
#[derive(Clone, Debug)]
pub struct CurrentPage {
    path: Arc<RwLock<String>>,
}

impl CurrentPage {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: Arc::new(RwLock::new(path.into())),
        }
    }

    pub fn navigate(&self, path: impl Into<String>) {
        *self.path.write().unwrap_or_else(PoisonError::into_inner) = path.into();
    }

    pub fn path(&self) -> String {
        self.path
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for CurrentPage {
    fn default() -> Self {
        Self::new("/")
    }
}

/// Bounded, persisted, append-only event log.
#[derive(Clone)]
pub struct EventStore {
    inner: Arc<EventStoreInner>,
}

struct EventStoreInner {
    storage: Arc<dyn Storage>,
    current_page: CurrentPage,
    key: String,
    capacity: usize,
}

impl EventStore {
    pub fn new(storage: Arc<dyn Storage>, current_page: CurrentPage) -> Self {
        Self {
            inner: Arc::new(EventStoreInner {
                storage,
                current_page,
                key: STORAGE_KEY.to_string(),
                capacity: MAX_EVENTS,
            }),
        }
    }

    pub fn with_key(self, key: impl Into<String>) -> Self {
        self.rebuild(|inner| inner.key = key.into())
    }

    /// A capacity of zero is raised to one.
    pub fn with_capacity(self, capacity: usize) -> Self {
        self.rebuild(|inner| inner.capacity = capacity.max(1))
    }

    fn rebuild(self, f: impl FnOnce(&mut EventStoreInner)) -> Self {
        let mut inner = EventStoreInner {
            storage: Arc::clone(&self.inner.storage),
            current_page: self.inner.current_page.clone(),
            key: self.inner.key.clone(),
            capacity: self.inner.capacity,
        };
        f(&mut inner);
        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    pub fn current_page(&self) -> &CurrentPage {
        &self.inner.current_page
    }

    /// Append one record, evicting the oldest ones once the log is full.
    ///
    /// Corrupted persisted data is discarded and overwritten by this write.
    pub fn append(
        &self,
        category: &str,
        action: &str,
        label: Option<&str>,
        value: Option<f64>,
    ) -> Result<EventRecord> {
        if category.trim().is_empty() {
            return Err(TrackerError::InvalidEvent {
                reason: "category must not be empty".to_string(),
            });
        }
        if action.trim().is_empty() {
            return Err(TrackerError::InvalidEvent {
                reason: "action must not be empty".to_string(),
            });
        }

        let record = EventRecord {
            timestamp: Utc::now().timestamp_millis(),
            category: category.to_string(),
            action: action.to_string(),
            label: label.map(str::to_string),
            value,
            page: self.inner.current_page.path(),
        };

        let raw = self.inner.storage.get_item(&self.inner.key)?;
        let mut events = match raw.as_deref().map(parse_events) {
            Some(Ok(events)) => events,
            Some(Err(e)) => {
                warn!(key = %self.inner.key, error = %e, "discarding corrupted event log");
                VecDeque::new()
            }
            None => VecDeque::new(),
        };

        while events.len() >= self.inner.capacity {
            let _ = events.pop_front();
        }
        events.push_back(record.clone());

        let serialized = serde_json::to_string(&events)?;
        self.inner.storage.set_item(&self.inner.key, &serialized)?;
        Ok(record)
    }

    /// Snapshot of the log, oldest first. Unreadable or corrupted data reads as empty.
    pub fn read_all(&self) -> Vec<EventRecord> {
        let raw = match self.inner.storage.get_item(&self.inner.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(key = %self.inner.key, error = %e, "failed to read event log");
                return Vec::new();
            }
        };

        match parse_events(&raw) {
            Ok(events) => events.into(),
            Err(e) => {
                warn!(key = %self.inner.key, error = %e, "event log is corrupted, treating as empty");
                Vec::new()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.read_all().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) -> Result<()> {
        self.inner.storage.remove_item(&self.inner.key)
    }
}

fn parse_events(raw: &str) -> serde_json::Result<VecDeque<EventRecord>> {
    serde_json::from_str(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn store() -> (Arc<MemoryStorage>, EventStore) {
        let storage = Arc::new(MemoryStorage::new());
        let store = EventStore::new(storage.clone(), CurrentPage::default());
        (storage, store)
    }

    #[test]
    fn append_fills_timestamp_and_page() {
        let (_, store) = store();
        store.current_page().navigate("/contato");

        let before = Utc::now().timestamp_millis();
        let record = store
            .append("Lead", "submit_form", Some("geral"), None)
            .unwrap();
        let after = Utc::now().timestamp_millis();

        assert_eq!(record.page, "/contato");
        assert!(record.timestamp >= before && record.timestamp <= after);
        assert_eq!(store.read_all(), vec![record]);
    }

    #[test]
    fn rejects_blank_category_or_action() {
        let (_, store) = store();
        assert!(matches!(
            store.append(" ", "click", None, None),
            Err(TrackerError::InvalidEvent { .. })
        ));
        assert!(matches!(
            store.append("CTA", "", None, None),
            Err(TrackerError::InvalidEvent { .. })
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn evicts_oldest_past_capacity() {
        let (_, store) = store();
        let store = store.with_capacity(3);
        for i in 0..5 {
            store
                .append("CTA", "click_cta", Some(&i.to_string()), None)
                .unwrap();
        }
        let labels: Vec<_> = store
            .read_all()
            .into_iter()
            .filter_map(|e| e.label)
            .collect();
        assert_eq!(labels, ["2", "3", "4"]);
    }

    #[test]
    fn zero_capacity_keeps_latest_event() {
        let (_, store) = store();
        let store = store.with_capacity(0);
        assert_eq!(store.capacity(), 1);

        store.append("CTA", "click_cta", Some("a"), None).unwrap();
        store.append("CTA", "click_cta", Some("b"), None).unwrap();
        let events = store.read_all();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].label.as_deref(), Some("b"));
    }

    #[test]
    fn poisoned_current_page_still_reads() {
        let page = CurrentPage::new("/sistemas");
        let poisoner = page.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.path.write().unwrap();
            panic!("poison the lock");
        })
        .join();

        assert_eq!(page.path(), "/sistemas");
        page.navigate("/contato");
        assert_eq!(page.path(), "/contato");
    }

    #[test]
    fn corrupted_log_reads_empty_and_is_overwritten() {
        let (storage, store) = store();
        storage.set_item(STORAGE_KEY, "{not json").unwrap();
        assert!(store.read_all().is_empty());

        store.append("Video", "click_video", None, None).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn custom_key_is_isolated() {
        let (storage, store) = store();
        let other = store.clone().with_key("other_log");
        other.append("CTA", "click_cta", None, None).unwrap();

        assert!(store.is_empty());
        assert!(storage.get_item("other_log").unwrap().is_some());
    }

    #[test]
    fn clear_removes_everything() {
        let (_, store) = store();
        store.append("CTA", "click_cta", None, None).unwrap();
        store.clear().unwrap();
        assert!(store.read_all().is_empty());
        store.clear().unwrap();
    }
}
