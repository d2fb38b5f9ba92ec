use crate::error::{MtError, MtResult};
use crate::store::{entry_name, expiry_from_now, CacheInfo, CacheStore};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: String,
    expires_at: DateTime<Utc>,
}

impl MemoryEntry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Process-local store. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryCacheStore {
    entries: Arc<Mutex<HashMap<(String, String), MemoryEntry>>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn stored_len(&self) -> usize {
        self.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    fn lock(&self) -> MtResult<MutexGuard<'_, HashMap<(String, String), MemoryEntry>>> {
        self.entries
            .lock()
            .map_err(|_| MtError::Store("memory cache lock poisoned".to_string()))
    }
}

impl CacheStore for MemoryCacheStore {
    fn save_for(&self, namespace: &str, key: &str, value: &str, ttl: Duration) -> MtResult<()> {
        let expires_at = expiry_from_now(ttl)?;
        let mut entries = self.lock()?;
        let now = Utc::now();
        entries.retain(|_, entry| entry.is_live(now));
        entries.insert(
            (namespace.to_string(), key.to_string()),
            MemoryEntry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    fn get_for(&self, namespace: &str, key: &str) -> MtResult<Option<String>> {
        let now = Utc::now();
        let entries = self.lock()?;
        Ok(entries
            .get(&(namespace.to_string(), key.to_string()))
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone()))
    }

    fn delete_for(&self, namespace: &str) -> MtResult<()> {
        self.lock()?.retain(|(ns, _), _| ns != namespace);
        Ok(())
    }

    fn get_info(&self) -> MtResult<Vec<CacheInfo>> {
        let now = Utc::now();
        let entries = self.lock()?;
        Ok(entries
            .iter()
            .filter(|(_, entry)| entry.is_live(now))
            .map(|((ns, key), entry)| CacheInfo {
                name: entry_name(ns, key),
                expires_at: entry.expires_at,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    #[test]
    fn test_save_and_get() {
        let store = MemoryCacheStore::new();
        store.save_for("ns", "key", "value", HOUR).unwrap();
        assert_eq!(store.get_for("ns", "key").unwrap(), Some("value".to_string()));
    }

    #[test]
    fn test_get_missing() {
        let store = MemoryCacheStore::new();
        assert_eq!(store.get_for("ns", "key").unwrap(), None);
    }

    #[test]
    fn test_namespaces_are_isolated() {
        let store = MemoryCacheStore::new();
        store.save_for("a", "key", "1", HOUR).unwrap();
        store.save_for("b", "key", "2", HOUR).unwrap();
        assert_eq!(store.get_for("a", "key").unwrap(), Some("1".to_string()));
        assert_eq!(store.get_for("b", "key").unwrap(), Some("2".to_string()));
    }

    #[test]
    fn test_save_overwrites_identical_key() {
        let store = MemoryCacheStore::new();
        store.save_for("ns", "key", "old", HOUR).unwrap();
        store.save_for("ns", "key", "new", HOUR).unwrap();
        assert_eq!(store.get_for("ns", "key").unwrap(), Some("new".to_string()));
        assert_eq!(store.get_info().unwrap().len(), 1);
    }

    #[test]
    fn test_zero_ttl_expires_immediately() {
        let store = MemoryCacheStore::new();
        store.save_for("ns", "key", "value", Duration::ZERO).unwrap();
        assert_eq!(store.get_for("ns", "key").unwrap(), None);
        assert!(store.get_info().unwrap().is_empty());
    }

    #[test]
    fn test_save_drops_expired_entries() {
        let store = MemoryCacheStore::new();
        store.save_for("ns", "stale-1", "x", Duration::ZERO).unwrap();
        store.save_for("other", "stale-2", "x", Duration::ZERO).unwrap();
        assert_eq!(store.stored_len(), 1);

        store.save_for("ns", "fresh", "y", HOUR).unwrap();
        assert_eq!(store.stored_len(), 1);
        assert_eq!(store.get_for("ns", "fresh").unwrap(), Some("y".to_string()));
    }

    #[test]
    fn test_out_of_range_ttl_is_an_error() {
        let store = MemoryCacheStore::new();
        let ttl = Duration::from_secs(100_000_000_000_000);
        let result = store.save_for("ns", "key", "value", ttl);
        assert!(matches!(result, Err(MtError::Store(_))));
        assert_eq!(store.get_for("ns", "key").unwrap(), None);
        assert_eq!(store.stored_len(), 0);
    }

    #[test]
    fn test_delete_for_only_clears_namespace() {
        let store = MemoryCacheStore::new();
        store.save_for("a", "1", "x", HOUR).unwrap();
        store.save_for("a", "2", "x", HOUR).unwrap();
        store.save_for("b", "1", "x", HOUR).unwrap();

        store.delete_for("a").unwrap();

        let names: Vec<_> = store
            .get_info()
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["b:1".to_string()]);
    }

    #[test]
    fn test_clone_shares_entries() {
        let store = MemoryCacheStore::new();
        let clone = store.clone();
        store.save_for("ns", "key", "value", HOUR).unwrap();
        assert_eq!(clone.get_for("ns", "key").unwrap(), Some("value".to_string()));
    }
}
