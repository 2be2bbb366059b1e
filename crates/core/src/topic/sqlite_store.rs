//! SQLite-backed topic store implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{TopicRecord, TopicStore, TopicStoreError};

/// SQLite-backed topic store.
pub struct SqliteTopicStore {
    conn: Mutex<Connection>,
}

impl SqliteTopicStore {
    /// Create a new SQLite topic store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, TopicStoreError> {
        let conn = Connection::open(path).map_err(|e| TopicStoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite topic store (useful for testing).
    pub fn in_memory() -> Result<Self, TopicStoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| TopicStoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), TopicStoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS topic (
                guid TEXT PRIMARY KEY,
                publish_date TEXT NOT NULL,
                last_check_date TEXT
            );
            "#,
        )
        .map_err(|e| TopicStoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, TopicStoreError> {
        self.conn
            .lock()
            .map_err(|e| TopicStoreError::Database(format!("Lock poisoned: {}", e)))
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<TopicRecord> {
        let guid: String = row.get(0)?;
        let publish_date_str: String = row.get(1)?;
        let last_check_str: Option<String> = row.get(2)?;

        // Unparseable dates degrade to the epoch / never-checked
        let publish_date = parse_timestamp(&publish_date_str).unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        let last_check_date = last_check_str.as_deref().and_then(parse_timestamp);

        Ok(TopicRecord {
            guid,
            publish_date,
            last_check_date,
        })
    }

    fn find_locked(
        conn: &Connection,
        guid: &str,
    ) -> Result<Option<TopicRecord>, TopicStoreError> {
        conn.query_row(
            "SELECT guid, publish_date, last_check_date FROM topic WHERE guid = ?1",
            params![guid],
            Self::row_to_record,
        )
        .optional()
        .map_err(|e| TopicStoreError::Database(e.to_string()))
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

impl TopicStore for SqliteTopicStore {
    fn find_by_guid(&self, guid: &str) -> Result<Option<TopicRecord>, TopicStoreError> {
        let conn = self.lock()?;
        Self::find_locked(&conn, guid)
    }

    fn register(
        &self,
        guid: &str,
        publish_date: DateTime<Utc>,
    ) -> Result<TopicRecord, TopicStoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR IGNORE INTO topic (guid, publish_date, last_check_date) VALUES (?1, ?2, NULL)",
            params![guid, publish_date.to_rfc3339()],
        )
        .map_err(|e| TopicStoreError::Database(e.to_string()))?;

        Self::find_locked(&conn, guid)?.ok_or_else(|| TopicStoreError::NotFound(guid.to_string()))
    }

    fn set_publish_date(
        &self,
        guid: &str,
        publish_date: DateTime<Utc>,
    ) -> Result<(), TopicStoreError> {
        let conn = self.lock()?;
        let rows = conn
            .execute(
                "UPDATE topic SET publish_date = ?1 WHERE guid = ?2",
                params![publish_date.to_rfc3339(), guid],
            )
            .map_err(|e| TopicStoreError::Database(e.to_string()))?;

        if rows == 0 {
            return Err(TopicStoreError::NotFound(guid.to_string()));
        }
        Ok(())
    }

    fn set_last_check_date(
        &self,
        guid: &str,
        checked_at: DateTime<Utc>,
    ) -> Result<(), TopicStoreError> {
        let conn = self.lock()?;
        let rows = conn
            .execute(
                "UPDATE topic SET last_check_date = ?1 WHERE guid = ?2",
                params![checked_at.to_rfc3339(), guid],
            )
            .map_err(|e| TopicStoreError::Database(e.to_string()))?;

        if rows == 0 {
            return Err(TopicStoreError::NotFound(guid.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn date(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 11, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_find_missing_topic() {
        let store = SqliteTopicStore::in_memory().unwrap();
        assert!(store.find_by_guid("missing").unwrap().is_none());
    }

    #[test]
    fn test_register_and_find() {
        let store = SqliteTopicStore::in_memory().unwrap();
        let record = store.register("guid-1", date(9, 12)).unwrap();

        assert_eq!(record.guid, "guid-1");
        assert_eq!(record.publish_date, date(9, 12));
        assert!(record.last_check_date.is_none());

        let found = store.find_by_guid("guid-1").unwrap().unwrap();
        assert_eq!(found, record);
    }

    #[test]
    fn test_register_keeps_existing_record() {
        let store = SqliteTopicStore::in_memory().unwrap();
        store.register("guid-1", date(9, 12)).unwrap();
        store.set_last_check_date("guid-1", date(10, 9)).unwrap();

        let again = store.register("guid-1", DateTime::<Utc>::UNIX_EPOCH).unwrap();
        assert_eq!(again.publish_date, date(9, 12));
        assert_eq!(again.last_check_date, Some(date(10, 9)));
    }

    #[test]
    fn test_update_dates() {
        let store = SqliteTopicStore::in_memory().unwrap();
        store.register("guid-1", date(9, 12)).unwrap();

        store.set_publish_date("guid-1", date(16, 12)).unwrap();
        store.set_last_check_date("guid-1", date(16, 9)).unwrap();

        let record = store.find_by_guid("guid-1").unwrap().unwrap();
        assert_eq!(record.publish_date, date(16, 12));
        assert_eq!(record.last_check_date, Some(date(16, 9)));
    }

    #[test]
    fn test_update_missing_topic_fails() {
        let store = SqliteTopicStore::in_memory().unwrap();
        let result = store.set_last_check_date("missing", date(1, 0));
        assert!(matches!(result, Err(TopicStoreError::NotFound(_))));

        let result = store.set_publish_date("missing", date(1, 0));
        assert!(matches!(result, Err(TopicStoreError::NotFound(_))));
    }

    #[test]
    fn test_persists_across_connections() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("topics.db");

        {
            let store = SqliteTopicStore::new(&db_path).unwrap();
            store.register("guid-1", date(9, 12)).unwrap();
            store.set_last_check_date("guid-1", date(10, 9)).unwrap();
        }

        let store = SqliteTopicStore::new(&db_path).unwrap();
        let record = store.find_by_guid("guid-1").unwrap().unwrap();
        assert_eq!(record.last_check_date, Some(date(10, 9)));
    }
}
