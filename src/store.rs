//! The authoritative album collection and its write-through persistence.
//!
//! Every mutation persists the whole collection. The primary key-value store
//! is tried first; when the serialized collection is over its capacity (or
//! the write fails) every album is written as its own record to the
//! secondary store instead. Storage failures are logged and never returned:
//! the in-memory collection stays authoritative for the session.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::album::{Album, AlbumCollection, AlbumId};
use crate::config::StorageConfig;
use crate::ingest::ValidationError;
use crate::order::SortOrder;
use crate::storage::{KeyValueStore, LocalStore, RecordStore, SqliteRecordStore, StorageError};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("index {index} out of range (length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("album {0} not found")]
    NotFound(AlbumId),

    #[error("album {0} already exists")]
    DuplicateId(AlbumId),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Where the last write-through landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    Primary,
    Secondary,
    Failed,
}

struct Backends {
    primary: Box<dyn KeyValueStore>,
    secondary: Option<Box<dyn RecordStore>>,
    primary_key: String,
}

impl Backends {
    fn load_primary(&self) -> Option<AlbumCollection> {
        let raw = match self.primary.get(&self.primary_key) {
            Ok(Some(raw)) if !raw.trim().is_empty() => raw,
            Ok(_) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "Primary store unreadable");
                return None;
            }
        };

        match serde_json::from_str::<AlbumCollection>(&raw) {
            Ok(albums) if albums.is_empty() => None,
            Ok(albums) => Some(albums),
            Err(e) => {
                tracing::warn!(error = %StorageError::from(e), "Ignoring corrupt primary store data");
                None
            }
        }
    }

    fn load_secondary(&self) -> Option<AlbumCollection> {
        let secondary = self.secondary.as_ref()?;
        let records = match secondary.load_all() {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(error = %e, "Record store unreadable");
                return None;
            }
        };

        let albums: AlbumCollection = records
            .into_iter()
            .filter_map(|(id, record)| match serde_json::from_str::<Album>(&record) {
                Ok(album) => Some(album),
                Err(e) => {
                    tracing::warn!(id = %id, error = %e, "Skipping corrupt album record");
                    None
                }
            })
            .collect();

        (!albums.is_empty()).then_some(albums)
    }

    fn persist(&mut self, albums: &[Album]) -> PersistOutcome {
        let serialized = match serde_json::to_string(albums) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize album collection");
                return PersistOutcome::Failed;
            }
        };

        let capacity = self.primary.capacity();
        if serialized.len() <= capacity {
            match self.primary.set(&self.primary_key, &serialized) {
                Ok(()) => {
                    // The record store must not hold an older copy that a
                    // later hydrate could pick up.
                    if let Some(secondary) = self.secondary.as_mut() {
                        if let Err(e) = secondary.clear() {
                            tracing::warn!(error = %e, "Failed to clear record store");
                        }
                    }
                    tracing::debug!(albums = albums.len(), bytes = serialized.len(), "Persisted to primary store");
                    return PersistOutcome::Primary;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Primary store write failed, falling back to record store");
                }
            }
        } else {
            tracing::info!(
                bytes = serialized.len(),
                capacity,
                "Collection exceeds primary store capacity, using record store"
            );
        }

        match self.write_records(albums) {
            Ok(()) => {
                if let Err(e) = self.primary.remove(&self.primary_key) {
                    tracing::warn!(error = %e, "Failed to remove stale primary copy");
                }
                tracing::debug!(albums = albums.len(), "Persisted to record store");
                PersistOutcome::Secondary
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to persist albums; changes are kept in memory only");
                PersistOutcome::Failed
            }
        }
    }

    fn write_records(&mut self, albums: &[Album]) -> Result<(), StorageError> {
        let secondary = self
            .secondary
            .as_mut()
            .ok_or_else(|| StorageError::Unavailable("record store not open".to_string()))?;
        let records = albums
            .iter()
            .map(|album| -> Result<(String, String), StorageError> {
                Ok((album.id.to_string(), serde_json::to_string(album)?))
            })
            .collect::<Result<Vec<_>, StorageError>>()?;
        secondary.replace_all(&records)
    }
}

pub struct AlbumStore {
    albums: AlbumCollection,
    backends: Backends,
    last_persist: Option<PersistOutcome>,
}

impl AlbumStore {
    pub fn new(
        primary: Box<dyn KeyValueStore>,
        secondary: Option<Box<dyn RecordStore>>,
        primary_key: impl Into<String>,
    ) -> Self {
        Self {
            albums: Vec::new(),
            backends: Backends {
                primary,
                secondary,
                primary_key: primary_key.into(),
            },
            last_persist: None,
        }
    }

    /// Open the configured backends. A record store that cannot be opened is
    /// logged and treated as unavailable.
    pub fn open(config: &StorageConfig) -> Result<Self, StorageError> {
        let primary = LocalStore::open(&config.primary_dir(), config.primary_capacity_bytes)?;
        let secondary: Option<Box<dyn RecordStore>> =
            match SqliteRecordStore::open(&config.secondary_path()) {
                Ok(db) => Some(Box::new(db)),
                Err(e) => {
                    tracing::warn!(error = %e, path = ?config.secondary_path(), "Record store unavailable");
                    None
                }
            };
        Ok(Self::new(Box::new(primary), secondary, config.primary_key.clone()))
    }

    /// Load the collection: primary store first, record store second, empty
    /// when neither has data.
    pub fn hydrate(&mut self) -> &[Album] {
        self.albums = match self.backends.load_primary() {
            Some(albums) => albums,
            None => self.backends.load_secondary().unwrap_or_default(),
        };
        tracing::info!(albums = self.albums.len(), "Album collection loaded");
        &self.albums
    }

    /// Write the whole collection through to storage.
    pub fn persist(&mut self) -> PersistOutcome {
        let outcome = self.backends.persist(&self.albums);
        self.last_persist = Some(outcome);
        outcome
    }

    pub fn last_persist(&self) -> Option<PersistOutcome> {
        self.last_persist
    }

    pub fn albums(&self) -> &[Album] {
        &self.albums
    }

    pub fn len(&self) -> usize {
        self.albums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.albums.is_empty()
    }

    pub fn get(&self, id: &AlbumId) -> Option<&Album> {
        self.albums.iter().find(|a| &a.id == id)
    }

    pub fn position(&self, id: &AlbumId) -> Option<usize> {
        self.albums.iter().position(|a| &a.id == id)
    }

    /// Id derived from `now`, bumped until it is unused.
    pub fn allocate_id(&self, now: DateTime<Utc>) -> AlbumId {
        let mut millis = now.timestamp_millis();
        loop {
            let id = AlbumId::from_millis(millis);
            if self.get(&id).is_none() {
                return id;
            }
            millis += 1;
        }
    }

    /// Prepend `album`; it becomes index 0.
    pub fn insert(&mut self, album: Album) -> Result<(), StoreError> {
        if self.get(&album.id).is_some() {
            return Err(StoreError::DuplicateId(album.id));
        }
        tracing::info!(id = %album.id, name = %album.name, photos = album.photos.len(), "Album created");
        self.albums.insert(0, album);
        self.persist();
        Ok(())
    }

    pub fn remove_at(&mut self, index: usize) -> Result<Album, StoreError> {
        if index >= self.albums.len() {
            return Err(StoreError::IndexOutOfRange {
                index,
                len: self.albums.len(),
            });
        }
        let removed = self.albums.remove(index);
        tracing::info!(id = %removed.id, "Album deleted");
        self.persist();
        Ok(removed)
    }

    pub fn remove_by_id(&mut self, id: &AlbumId) -> Result<Album, StoreError> {
        let index = self
            .position(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        self.remove_at(index)
    }

    /// Remove one photo (and its name) from an album.
    pub fn remove_photo(&mut self, album_index: usize, photo_index: usize) -> Result<String, StoreError> {
        let len = self.albums.len();
        let album = self
            .albums
            .get_mut(album_index)
            .ok_or(StoreError::IndexOutOfRange { index: album_index, len })?;
        let photo_len = album.photos.len();
        let removed = album
            .remove_photo(photo_index)
            .ok_or(StoreError::IndexOutOfRange {
                index: photo_index,
                len: photo_len,
            })?;
        tracing::info!(id = %album.id, index = photo_index, "Photo removed");
        self.persist();
        Ok(removed)
    }

    pub fn remove_photo_by_id(&mut self, id: &AlbumId, photo_index: usize) -> Result<String, StoreError> {
        let index = self
            .position(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        self.remove_photo(index, photo_index)
    }

    /// Rename an album and replace its description.
    pub fn update_metadata(
        &mut self,
        id: &AlbumId,
        name: &str,
        description: Option<&str>,
    ) -> Result<(), StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingName.into());
        }
        let album = self
            .albums
            .iter_mut()
            .find(|a| &a.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        album.name = name.to_string();
        album.description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);
        self.persist();
        Ok(())
    }

    /// Reorder the whole collection. The sort is stable.
    pub fn sort(&mut self, order: SortOrder) {
        order.sort(&mut self.albums);
        self.persist();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::album::fixtures::album;
    use crate::storage::local::DEFAULT_CAPACITY;
    use proptest::prelude::*;
    use tempfile::{tempdir, TempDir};

    struct Fixture {
        dir: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            Self { dir: tempdir().unwrap() }
        }

        fn store(&self, capacity: usize) -> AlbumStore {
            let primary = LocalStore::open(&self.dir.path().join("local"), capacity).unwrap();
            let secondary = SqliteRecordStore::open(&self.dir.path().join("GalleryPixDB.db")).unwrap();
            AlbumStore::new(Box::new(primary), Some(Box::new(secondary)), "albumsDB")
        }

        fn primary_raw(&self) -> Option<String> {
            std::fs::read_to_string(self.dir.path().join("local").join("albumsDB")).ok()
        }
    }

    /// Record store that refuses every operation.
    struct BrokenRecords;

    impl RecordStore for BrokenRecords {
        fn load_all(&self) -> Result<Vec<(String, String)>, StorageError> {
            Err(StorageError::Unavailable("broken".into()))
        }
        fn clear(&mut self) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("broken".into()))
        }
        fn put(&mut self, _id: &str, _record: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("broken".into()))
        }
    }

    #[test]
    fn test_create_trip_persists_under_primary_key() {
        let fx = Fixture::new();
        let mut store = fx.store(DEFAULT_CAPACITY);
        store.hydrate();
        store.insert(album(1, "Older", 0, 1)).unwrap();
        store.insert(album(2, "Trip", 1, 2)).unwrap();

        assert_eq!(store.albums()[0].name, "Trip");
        assert_eq!(store.last_persist(), Some(PersistOutcome::Primary));

        let raw = fx.primary_raw().unwrap();
        let saved: Vec<Album> = serde_json::from_str(&raw).unwrap();
        assert_eq!(saved[0].name, "Trip");
        assert_eq!(saved[0].photos.len(), 2);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let fx = Fixture::new();
        let mut store = fx.store(DEFAULT_CAPACITY);
        store.insert(album(1, "A", 0, 1)).unwrap();
        let err = store.insert(album(1, "B", 0, 1)).unwrap_err();
        assert_eq!(err, StoreError::DuplicateId(AlbumId::from_millis(1)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_delete_index_two_of_five() {
        let fx = Fixture::new();
        let mut store = fx.store(DEFAULT_CAPACITY);
        for i in (0..5).rev() {
            store.insert(album(i, &format!("album{}", i), i as u32, 1)).unwrap();
        }
        let next = store.albums()[3].id.clone();

        store.remove_at(2).unwrap();
        assert_eq!(store.len(), 4);
        assert_eq!(store.albums()[2].id, next);

        assert_eq!(
            store.remove_at(4),
            Err(StoreError::IndexOutOfRange { index: 4, len: 4 })
        );
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_remove_by_id_and_photo_by_id() {
        let fx = Fixture::new();
        let mut store = fx.store(DEFAULT_CAPACITY);
        store.insert(album(1, "A", 0, 3)).unwrap();
        store.insert(album(2, "B", 0, 1)).unwrap();

        let id = AlbumId::from_millis(1);
        store.remove_photo_by_id(&id, 0).unwrap();
        let a = store.get(&id).unwrap();
        assert_eq!(a.cover, a.photos[0]);
        assert!(a.names_aligned());

        assert!(matches!(store.remove_photo_by_id(&id, 9), Err(StoreError::IndexOutOfRange { .. })));
        store.remove_by_id(&id).unwrap();
        assert!(matches!(store.remove_by_id(&id), Err(StoreError::NotFound(_))));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_update_metadata() {
        let fx = Fixture::new();
        let mut store = fx.store(DEFAULT_CAPACITY);
        store.insert(album(1, "A", 0, 1)).unwrap();
        let id = AlbumId::from_millis(1);

        store.update_metadata(&id, "  Renamed ", Some("  ")).unwrap();
        let a = store.get(&id).unwrap();
        assert_eq!(a.name, "Renamed");
        assert_eq!(a.description, None);

        assert_eq!(
            store.update_metadata(&id, " ", None),
            Err(StoreError::Validation(ValidationError::MissingName))
        );
    }

    #[test]
    fn test_allocate_id_skips_taken() {
        let fx = Fixture::new();
        let mut store = fx.store(DEFAULT_CAPACITY);
        let now = Utc::now();
        let first = store.allocate_id(now);
        let mut a = album(0, "A", 0, 1);
        a.id = first.clone();
        store.insert(a).unwrap();
        let second = store.allocate_id(now);
        assert_ne!(first, second);
    }

    #[test]
    fn test_oversized_collection_falls_back_and_reloads() {
        let fx = Fixture::new();
        let mut store = fx.store(2048);
        store.insert(album(1, "small", 0, 1)).unwrap();
        assert_eq!(store.last_persist(), Some(PersistOutcome::Primary));

        let mut big = album(2, "big", 1, 1);
        big.photos = vec![format!("data:image/jpeg;base64,{}", "A".repeat(4096))];
        store.insert(big).unwrap();
        assert_eq!(store.last_persist(), Some(PersistOutcome::Secondary));
        // stale primary copy is gone
        assert!(fx.primary_raw().is_none());

        let expected: Vec<Album> = store.albums().to_vec();
        drop(store);

        let mut reloaded = fx.store(2048);
        let mut loaded = reloaded.hydrate().to_vec();
        let mut expected = expected;
        loaded.sort_by(|a, b| a.id.cmp(&b.id));
        expected.sort_by(|a, b| a.id.cmp(&b.id));
        assert_eq!(loaded, expected);
    }

    #[test]
    fn test_shrinking_back_clears_record_store() {
        let fx = Fixture::new();
        let mut store = fx.store(2048);
        let mut big = album(2, "big", 1, 1);
        big.photos = vec![format!("data:image/jpeg;base64,{}", "A".repeat(4096))];
        store.insert(big).unwrap();
        assert_eq!(store.last_persist(), Some(PersistOutcome::Secondary));

        store.remove_at(0).unwrap();
        assert_eq!(store.last_persist(), Some(PersistOutcome::Primary));
        drop(store);

        let mut reloaded = fx.store(2048);
        assert!(reloaded.hydrate().is_empty());
    }

    #[test]
    fn test_corrupt_primary_falls_back_to_records() {
        let fx = Fixture::new();
        {
            let mut records = SqliteRecordStore::open(&fx.dir.path().join("GalleryPixDB.db")).unwrap();
            let a = album(7, "from records", 0, 1);
            records.put("7", &serde_json::to_string(&a).unwrap()).unwrap();
            records.put("8", "{not json").unwrap();
        }
        let mut store = fx.store(DEFAULT_CAPACITY);
        std::fs::write(fx.dir.path().join("local").join("albumsDB"), "{oops").unwrap();

        let albums = store.hydrate();
        assert_eq!(albums.len(), 1);
        assert_eq!(albums[0].name, "from records");
    }

    #[test]
    fn test_nothing_stored_starts_empty() {
        let fx = Fixture::new();
        let mut store = fx.store(DEFAULT_CAPACITY);
        assert!(store.hydrate().is_empty());
        assert_eq!(store.last_persist(), None);
    }

    #[test]
    fn test_failed_writes_keep_memory_state() {
        let dir = tempdir().unwrap();
        let primary = LocalStore::open(dir.path(), 16).unwrap();
        let mut store = AlbumStore::new(Box::new(primary), Some(Box::new(BrokenRecords)), "albumsDB");

        store.insert(album(1, "kept", 0, 1)).unwrap();
        assert_eq!(store.last_persist(), Some(PersistOutcome::Failed));
        assert_eq!(store.albums()[0].name, "kept");

        // no record store at all behaves the same
        let primary = LocalStore::open(dir.path(), 16).unwrap();
        let mut store = AlbumStore::new(Box::new(primary), None, "albumsDB");
        store.insert(album(1, "kept", 0, 1)).unwrap();
        assert_eq!(store.last_persist(), Some(PersistOutcome::Failed));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_sort_persists_new_order() {
        let fx = Fixture::new();
        let mut store = fx.store(DEFAULT_CAPACITY);
        store.insert(album(1, "b", 0, 1)).unwrap();
        store.insert(album(2, "a", 1, 1)).unwrap();
        store.insert(album(3, "c", 2, 1)).unwrap();

        store.sort(SortOrder::NameAsc);
        drop(store);
        let mut reloaded = fx.store(DEFAULT_CAPACITY);
        let names: Vec<_> = reloaded.hydrate().iter().map(|a| a.name.clone()).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    proptest! {
        #[test]
        fn prop_insert_is_lifo(count in 1usize..8) {
            let dir = tempdir().unwrap();
            let mut store = AlbumStore::new(
                Box::new(LocalStore::open(dir.path(), DEFAULT_CAPACITY).unwrap()),
                None,
                "albumsDB",
            );
            for i in 0..count {
                store.insert(album(i as i64, &format!("a{}", i), 0, 1)).unwrap();
                prop_assert_eq!(store.albums()[0].id.clone(), AlbumId::from_millis(i as i64));
            }
        }

        #[test]
        fn prop_photo_removal_keeps_alignment(photos in 1usize..10, removals in prop::collection::vec(0usize..12, 1..10)) {
            let dir = tempdir().unwrap();
            let mut store = AlbumStore::new(
                Box::new(LocalStore::open(dir.path(), DEFAULT_CAPACITY).unwrap()),
                None,
                "albumsDB",
            );
            store.insert(album(1, "a", 0, photos)).unwrap();
            for index in removals {
                let had_first = store.albums()[0].photos.len() > 1;
                let ok = store.remove_photo(0, index).is_ok();
                let a = &store.albums()[0];
                prop_assert!(a.names_aligned());
                if ok && index == 0 && had_first {
                    prop_assert_eq!(&a.cover, &a.photos[0]);
                }
            }
        }
    }
}
