//! SQLite record store used when the collection outgrows the primary store.

use rusqlite::Connection;
use std::path::Path;

use super::schema::SCHEMA;
use super::{RecordStore, StorageError};

const UPSERT: &str = r#"
    INSERT INTO albums (id, record) VALUES (?, ?)
    ON CONFLICT(id) DO UPDATE SET record = excluded.record, stored_at = CURRENT_TIMESTAMP
"#;

pub struct SqliteRecordStore {
    pub(crate) conn: Connection,
}

impl SqliteRecordStore {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let db = Self {
            conn: Connection::open_in_memory()?,
        };
        db.initialize()?;
        Ok(db)
    }

    fn initialize(&self) -> Result<(), StorageError> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    pub fn count(&self) -> Result<usize, StorageError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM albums", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

impl RecordStore for SqliteRecordStore {
    fn load_all(&self) -> Result<Vec<(String, String)>, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, record FROM albums ORDER BY rowid")?;
        let records = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(records)
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.conn.execute("DELETE FROM albums", [])?;
        Ok(())
    }

    fn put(&mut self, id: &str, record: &str) -> Result<(), StorageError> {
        self.conn.execute(UPSERT, rusqlite::params![id, record])?;
        Ok(())
    }

    fn replace_all(&mut self, records: &[(String, String)]) -> Result<(), StorageError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM albums", [])?;
        {
            let mut stmt = tx.prepare(UPSERT)?;
            for (id, record) in records {
                stmt.execute(rusqlite::params![id, record])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_put_load_clear() {
        let mut db = SqliteRecordStore::open_in_memory().unwrap();
        db.put("2", "{\"b\":1}").unwrap();
        db.put("1", "{\"a\":1}").unwrap();
        db.put("2", "{\"b\":2}").unwrap();

        let records = db.load_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], ("2".to_string(), "{\"b\":2}".to_string()));
        assert_eq!(records[1].0, "1");

        db.clear().unwrap();
        assert_eq!(db.count().unwrap(), 0);
    }

    #[test]
    fn test_replace_all_is_atomic() {
        let mut db = SqliteRecordStore::open_in_memory().unwrap();
        db.put("1", "{}").unwrap();
        db.conn
            .execute_batch(
                "CREATE TRIGGER reject_bad BEFORE INSERT ON albums WHEN NEW.id = 'bad'
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .unwrap();

        let records = vec![("2".to_string(), "{}".to_string()), ("bad".to_string(), "{}".to_string())];
        assert!(db.replace_all(&records).is_err());
        let ids: Vec<_> = db.load_all().unwrap().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, ["1"]);

        let records = vec![("3".to_string(), "{}".to_string()), ("2".to_string(), "{}".to_string())];
        db.replace_all(&records).unwrap();
        let ids: Vec<_> = db.load_all().unwrap().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, ["3", "2"]);
    }

    #[test]
    fn test_reopen_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("GalleryPixDB.db");
        {
            let mut db = SqliteRecordStore::open(&path).unwrap();
            db.put("1", "{}").unwrap();
        }
        let db = SqliteRecordStore::open(&path).unwrap();
        assert_eq!(db.load_all().unwrap().len(), 1);
    }
}
