use crate::error::{MtError, MtResult};
use crate::store::{entry_name, expiry_from_now, CacheInfo, CacheStore};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

/// SQLite-backed store, shared across clones through one connection.
#[derive(Clone)]
pub struct SqliteCacheStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCacheStore {
    /// Open (or create) the cache database and its table.
    ///
    /// `":memory:"` opens a private in-memory database.
    pub fn open(database_path: &str) -> MtResult<Self> {
        let conn = Connection::open(database_path)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS cache_entries (
                namespace TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                expires_at INTEGER NOT NULL,
                PRIMARY KEY (namespace, key)
            )",
            [],
        )?;

        debug!("Opened cache database at {}", database_path);

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> MtResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| MtError::Store("cache database lock poisoned".to_string()))
    }
}

impl std::fmt::Debug for SqliteCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteCacheStore").finish_non_exhaustive()
    }
}

impl CacheStore for SqliteCacheStore {
    fn save_for(&self, namespace: &str, key: &str, value: &str, ttl: Duration) -> MtResult<()> {
        let expires_at = expiry_from_now(ttl)?.timestamp_millis();
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO cache_entries (namespace, key, value, expires_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![namespace, key, value, expires_at],
        )?;
        Ok(())
    }

    fn get_for(&self, namespace: &str, key: &str) -> MtResult<Option<String>> {
        let now = Utc::now().timestamp_millis();
        let conn = self.lock()?;
        let value = conn
            .query_row(
                "SELECT value FROM cache_entries
                 WHERE namespace = ?1 AND key = ?2 AND expires_at > ?3",
                params![namespace, key, now],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn delete_for(&self, namespace: &str) -> MtResult<()> {
        let conn = self.lock()?;
        let removed = conn.execute(
            "DELETE FROM cache_entries WHERE namespace = ?1",
            params![namespace],
        )?;
        debug!("Deleted {} cache entries from {}", removed, namespace);
        Ok(())
    }

    fn get_info(&self) -> MtResult<Vec<CacheInfo>> {
        let now = Utc::now().timestamp_millis();
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT namespace, key, expires_at FROM cache_entries
             WHERE expires_at > ?1
             ORDER BY namespace, key",
        )?;

        let infos = stmt
            .query_map(params![now], |row| {
                let namespace: String = row.get(0)?;
                let key: String = row.get(1)?;
                let expires_at: i64 = row.get(2)?;
                Ok(CacheInfo {
                    name: entry_name(&namespace, &key),
                    expires_at: DateTime::<Utc>::from_timestamp_millis(expires_at)
                        .unwrap_or(DateTime::<Utc>::MIN_UTC),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(infos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const HOUR: Duration = Duration::from_secs(3600);

    fn create_test_store() -> (SqliteCacheStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("cache.db");
        let store = SqliteCacheStore::open(db_path.to_str().unwrap())
            .expect("Failed to open store");
        (store, temp_dir)
    }

    #[test]
    fn test_open_creates_table() {
        let (store, _temp_dir) = create_test_store();
        assert!(store.get_info().unwrap().is_empty());
    }

    #[test]
    fn test_open_in_memory() {
        let store = SqliteCacheStore::open(":memory:").unwrap();
        store.save_for("ns", "k", "v", HOUR).unwrap();
        assert_eq!(store.get_for("ns", "k").unwrap(), Some("v".to_string()));
    }

    #[test]
    fn test_invalid_database_path() {
        let result = SqliteCacheStore::open("/nonexistent/directory/cache.db");
        assert!(result.is_err());
    }

    #[test]
    fn test_save_and_get() {
        let (store, _temp_dir) = create_test_store();
        store.save_for("ns", "key", r#"{"a":1}"#, HOUR).unwrap();
        assert_eq!(
            store.get_for("ns", "key").unwrap(),
            Some(r#"{"a":1}"#.to_string())
        );
    }

    #[test]
    fn test_get_missing() {
        let (store, _temp_dir) = create_test_store();
        assert_eq!(store.get_for("ns", "missing").unwrap(), None);
    }

    #[test]
    fn test_save_overwrites_identical_key() {
        let (store, _temp_dir) = create_test_store();
        store.save_for("ns", "key", "old", HOUR).unwrap();
        store.save_for("ns", "key", "new", HOUR).unwrap();
        assert_eq!(store.get_for("ns", "key").unwrap(), Some("new".to_string()));
        assert_eq!(store.get_info().unwrap().len(), 1);
    }

    #[test]
    fn test_zero_ttl_is_invisible() {
        let (store, _temp_dir) = create_test_store();
        store.save_for("ns", "key", "value", Duration::ZERO).unwrap();
        assert_eq!(store.get_for("ns", "key").unwrap(), None);
        assert!(store.get_info().unwrap().is_empty());
    }

    #[test]
    fn test_out_of_range_ttl_is_an_error() {
        let (store, _temp_dir) = create_test_store();
        let ttl = Duration::from_secs(100_000_000_000_000);
        let result = store.save_for("ns", "key", "value", ttl);
        assert!(matches!(result, Err(MtError::Store(_))));
        assert_eq!(store.get_for("ns", "key").unwrap(), None);
    }

    #[test]
    fn test_delete_for_only_clears_namespace() {
        let (store, _temp_dir) = create_test_store();
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
    fn test_get_info_reports_expiry() {
        let (store, _temp_dir) = create_test_store();
        let before = Utc::now();
        store.save_for("ns", "key", "value", HOUR).unwrap();

        let info = store.get_info().unwrap();
        assert_eq!(info.len(), 1);
        assert_eq!(info[0].name, "ns:key");
        assert!(info[0].expires_at > before + chrono::Duration::minutes(59));
    }

    #[test]
    fn test_entries_survive_reopening() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("cache.db");
        let path = db_path.to_str().unwrap();

        {
            let store = SqliteCacheStore::open(path).unwrap();
            store.save_for("ns", "key", "persisted", HOUR).unwrap();
        }

        let reopened = SqliteCacheStore::open(path).unwrap();
        assert_eq!(
            reopened.get_for("ns", "key").unwrap(),
            Some("persisted".to_string())
        );
    }

    #[test]
    fn test_special_characters_in_key_and_value() {
        let (store, _temp_dir) = create_test_store();
        let value = "'; DROP TABLE cache_entries; --";
        store.save_for("ns", value, value, HOUR).unwrap();
        assert_eq!(store.get_for("ns", value).unwrap(), Some(value.to_string()));
    }

    #[test]
    fn test_clone_shares_connection() {
        let (store, _temp_dir) = create_test_store();
        let clone = store.clone();
        store.save_for("ns", "key", "value", HOUR).unwrap();
        assert_eq!(clone.get_for("ns", "key").unwrap(), Some("value".to_string()));
    }
}
