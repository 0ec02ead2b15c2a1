//! Typed record store over a `KeyValueBackend`.
//!
//! Each record type lives under one `Collection` key as a JSON array inside
//! a schema envelope. Every operation reads the whole collection, mutates
//! it in memory and writes the whole collection back. Records are decoded
//! one by one: an entry that does not decode is skipped on read (logged)
//! and written back untouched, so it never blocks the rest. Writers are
//! serialized by a store-level lock, so read-modify-write cycles from
//! different threads of one process never interleave. Nothing coordinates
//! separate processes sharing a backend: the last writer wins.

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

use super::backend::{FileBackend, KeyValueBackend, MemoryBackend};
use super::migrations::{self, Envelope, SCHEMA_VERSION};
use super::StorageError;
use crate::config::StoreConfig;
use crate::events::{EventBus, StoreEvent};

// ═══════════════════════════════════════════
// Collections and record traits
// ═══════════════════════════════════════════

/// Every storage key the store owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Appointments,
    FamilyMembers,
    Notifications,
    UserProfile,
    Prescriptions,
    FollowUps,
    ChatMessages,
    Doctors,
}

impl Collection {
    pub const ALL: [Collection; 8] = [
        Collection::Appointments,
        Collection::FamilyMembers,
        Collection::Notifications,
        Collection::UserProfile,
        Collection::Prescriptions,
        Collection::FollowUps,
        Collection::ChatMessages,
        Collection::Doctors,
    ];

    /// Backend key. Matches the names the web client has always used.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Appointments => "appointments",
            Self::FamilyMembers => "familyMembers",
            Self::Notifications => "notifications",
            Self::UserProfile => "userProfile",
            Self::Prescriptions => "prescriptions",
            Self::FollowUps => "followUps",
            Self::ChatMessages => "chatMessages",
            Self::Doctors => "doctors",
        }
    }
}

/// Where `create` places a new record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    Append,
    /// Newest-first collections (notifications).
    Prepend,
}

/// A record stored in a collection and addressed by a string id.
pub trait Record: Serialize + DeserializeOwned + Clone {
    const COLLECTION: Collection;
    /// Prefix of generated ids, e.g. `apt` in `apt-1717171717171`.
    const ID_PREFIX: &'static str;
    const INSERTION: Insertion = Insertion::Append;

    /// Caller-supplied fields for a new record.
    type Draft;
    /// Partial update; `None` fields leave the record untouched.
    type Update: Patch<Self>;

    fn id(&self) -> &str;

    /// Build the stored record from a draft plus the store-assigned fields.
    fn from_draft(draft: Self::Draft, id: String, created_at: DateTime<Utc>) -> Self;
}

/// Shallow merge of a partial update into a record.
pub trait Patch<T> {
    fn apply_to(self, target: &mut T);
    fn is_empty(&self) -> bool;
}

/// A single value stored under its own key (the user profile).
pub trait Singleton: Serialize + DeserializeOwned + Clone + Default {
    const COLLECTION: Collection;
}

// ═══════════════════════════════════════════
// LocalStore
// ═══════════════════════════════════════════

pub struct LocalStore {
    backend: Box<dyn KeyValueBackend>,
    events: EventBus,
    write_lock: Mutex<()>,
    last_id_millis: Mutex<i64>,
}

impl std::fmt::Debug for LocalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalStore")
            .field("subscribers", &self.events.subscriber_count())
            .finish_non_exhaustive()
    }
}

impl LocalStore {
    /// Open a store over `backend`, migrating stored data to the current schema.
    pub fn open(backend: Box<dyn KeyValueBackend>) -> Result<Self, StorageError> {
        Self::open_with_events(backend, EventBus::default())
    }

    pub fn open_with_events(
        backend: Box<dyn KeyValueBackend>,
        events: EventBus,
    ) -> Result<Self, StorageError> {
        let report = migrations::migrate(backend.as_ref())?;
        if !report.migrated.is_empty() {
            tracing::info!(migrated = ?report.migrated, "Store schema upgraded to v{SCHEMA_VERSION}");
        }
        Ok(Self {
            backend,
            events,
            write_lock: Mutex::new(()),
            last_id_millis: Mutex::new(0),
        })
    }

    /// Open an empty in-memory store (tests, throwaway sessions).
    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::open(Box::new(MemoryBackend::new()))
    }

    /// Open the on-disk store described by `config`.
    pub fn open_with_config(config: &StoreConfig) -> Result<Self, StorageError> {
        let backend = FileBackend::open(&config.data_dir)?;
        tracing::info!(dir = %config.data_dir.display(), "Opening local store");
        Self::open_with_events(Box::new(backend), EventBus::new(config.event_capacity))
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Shorthand for `events().subscribe()`.
    pub fn subscribe(&self) -> mpsc::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    // ── Collection reads ────────────────────────────────────

    /// Every decodable record of `T`. A missing key is an empty collection.
    pub fn get_all<T: Record>(&self) -> Result<Vec<T>, StorageError> {
        Ok(self
            .read_items(T::COLLECTION)?
            .iter()
            .filter_map(decode_item::<T>)
            .collect())
    }

    /// Like `get_all`, but any failure is logged and read as empty.
    pub fn get_all_or_default<T: Record>(&self) -> Vec<T> {
        self.get_all().unwrap_or_else(|e| {
            tracing::warn!(key = T::COLLECTION.key(), error = %e, "Reading as empty collection");
            Vec::new()
        })
    }

    pub fn find<T: Record>(&self, id: &str) -> Result<Option<T>, StorageError> {
        Ok(self.get_all::<T>()?.into_iter().find(|r| r.id() == id))
    }

    // ── Collection writes ───────────────────────────────────

    /// Assign id and creation time, insert, persist and return the new record.
    pub fn create<T: Record>(&self, draft: T::Draft) -> Result<T, StorageError> {
        let _guard = self.lock_writes()?;
        let now = Utc::now();
        let id = self.next_id(T::ID_PREFIX, now)?;
        let record = T::from_draft(draft, id, now);

        let mut items = self.read_items(T::COLLECTION)?;
        let encoded = serde_json::to_value(&record)?;
        match T::INSERTION {
            Insertion::Append => items.push(encoded),
            Insertion::Prepend => items.insert(0, encoded),
        }
        self.write_value(T::COLLECTION, &items)?;

        tracing::debug!(key = T::COLLECTION.key(), id = record.id(), "Record created");
        self.events.publish(StoreEvent::Created {
            collection: T::COLLECTION,
            id: record.id().to_string(),
        });
        Ok(record)
    }

    /// Shallow-merge `patch` into the record with `id`.
    ///
    /// Returns the updated record, or `None` without writing when no record
    /// has that id.
    pub fn update<T: Record>(&self, id: &str, patch: T::Update) -> Result<Option<T>, StorageError> {
        if patch.is_empty() {
            return self.find(id);
        }
        self.modify(id, |record: &mut T| patch.apply_to(record))
    }

    /// Apply `f` to the record with `id` and persist. `None` when absent.
    pub fn modify<T: Record>(
        &self,
        id: &str,
        f: impl FnOnce(&mut T),
    ) -> Result<Option<T>, StorageError> {
        let _guard = self.lock_writes()?;
        let mut items = self.read_items(T::COLLECTION)?;

        let Some(slot) = items.iter_mut().find(|item| item_id(item) == Some(id)) else {
            tracing::debug!(key = T::COLLECTION.key(), id, "Update skipped, id not found");
            return Ok(None);
        };
        let mut updated: T = T::deserialize(&*slot).map_err(|source| StorageError::Corrupt {
            key: T::COLLECTION.key().to_string(),
            source,
        })?;
        f(&mut updated);
        *slot = serde_json::to_value(&updated)?;

        self.write_value(T::COLLECTION, &items)?;
        self.events.publish(StoreEvent::Updated {
            collection: T::COLLECTION,
            id: id.to_string(),
        });
        Ok(Some(updated))
    }

    /// Apply `f` to every record matching `predicate`. Returns how many changed.
    pub fn update_where<T: Record>(
        &self,
        predicate: impl Fn(&T) -> bool,
        mut f: impl FnMut(&mut T),
    ) -> Result<usize, StorageError> {
        let _guard = self.lock_writes()?;
        let mut items = self.read_items(T::COLLECTION)?;

        let mut touched = Vec::new();
        for slot in items.iter_mut() {
            let Some(mut record) = decode_item::<T>(slot) else {
                continue;
            };
            if !predicate(&record) {
                continue;
            }
            f(&mut record);
            *slot = serde_json::to_value(&record)?;
            touched.push(record.id().to_string());
        }
        if touched.is_empty() {
            return Ok(0);
        }

        self.write_value(T::COLLECTION, &items)?;
        for id in &touched {
            self.events.publish(StoreEvent::Updated {
                collection: T::COLLECTION,
                id: id.clone(),
            });
        }
        Ok(touched.len())
    }

    /// Delete the record with `id`. `false` (and no write) when absent.
    pub fn remove<T: Record>(&self, id: &str) -> Result<bool, StorageError> {
        let _guard = self.lock_writes()?;
        let mut items = self.read_items(T::COLLECTION)?;

        let before = items.len();
        items.retain(|item| item_id(item) != Some(id));
        if items.len() == before {
            return Ok(false);
        }

        self.write_value(T::COLLECTION, &items)?;
        self.events.publish(StoreEvent::Removed {
            collection: T::COLLECTION,
            id: id.to_string(),
        });
        Ok(true)
    }

    /// Replace the collection with an empty one. Safe to repeat.
    pub fn clear<T: Record>(&self) -> Result<(), StorageError> {
        let _guard = self.lock_writes()?;
        self.write_value::<Vec<T>>(T::COLLECTION, &Vec::new())?;
        self.events.publish(StoreEvent::Cleared {
            collection: T::COLLECTION,
        });
        Ok(())
    }

    // ── Singletons ──────────────────────────────────────────

    pub fn get_singleton<S: Singleton>(&self) -> Result<Option<S>, StorageError> {
        self.read_value(S::COLLECTION)
    }

    pub fn put_singleton<S: Singleton>(&self, value: &S) -> Result<(), StorageError> {
        let _guard = self.lock_writes()?;
        self.write_singleton(value)
    }

    /// Stored value, or `seed()` persisted and returned when absent.
    pub fn get_or_seed_singleton<S: Singleton>(
        &self,
        seed: impl FnOnce() -> S,
    ) -> Result<S, StorageError> {
        let _guard = self.lock_writes()?;
        if let Some(existing) = self.read_value(S::COLLECTION)? {
            return Ok(existing);
        }
        let seeded = seed();
        tracing::info!(key = S::COLLECTION.key(), "Seeding default value");
        self.write_singleton(&seeded)?;
        Ok(seeded)
    }

    /// Mutate the singleton in place, starting from `Default` when absent.
    pub fn modify_singleton<S: Singleton>(&self, f: impl FnOnce(&mut S)) -> Result<S, StorageError> {
        let _guard = self.lock_writes()?;
        let mut value: S = self.read_value(S::COLLECTION)?.unwrap_or_default();
        f(&mut value);
        self.write_singleton(&value)?;
        Ok(value)
    }

    // ── Internals ───────────────────────────────────────────

    fn lock_writes(&self) -> Result<MutexGuard<'_, ()>, StorageError> {
        self.write_lock.lock().map_err(|_| StorageError::LockPoisoned)
    }

    /// `<prefix>-<unix millis>`, strictly increasing per store so two calls
    /// in the same millisecond still get distinct ids.
    fn next_id(&self, prefix: &str, now: DateTime<Utc>) -> Result<String, StorageError> {
        let mut last = self
            .last_id_millis
            .lock()
            .map_err(|_| StorageError::LockPoisoned)?;
        let millis = now.timestamp_millis().max(*last + 1);
        *last = millis;
        Ok(format!("{prefix}-{millis}"))
    }

    /// Raw entries of a collection, undecoded.
    fn read_items(&self, collection: Collection) -> Result<Vec<Value>, StorageError> {
        self.read_value(collection).map(|items: Option<Vec<Value>>| items.unwrap_or_default())
    }

    fn write_singleton<S: Singleton>(&self, value: &S) -> Result<(), StorageError> {
        self.write_value(S::COLLECTION, value)?;
        self.events.publish(StoreEvent::Replaced {
            collection: S::COLLECTION,
        });
        Ok(())
    }

    fn read_value<V: DeserializeOwned>(&self, collection: Collection) -> Result<Option<V>, StorageError> {
        let key = collection.key();
        let Some(raw) = self.backend.get(key)? else {
            return Ok(None);
        };

        let envelope: Envelope<serde_json::Value> = serde_json::from_str(&raw)
            .map_err(|source| StorageError::Corrupt {
                key: key.to_string(),
                source,
            })?;
        if envelope.version > SCHEMA_VERSION {
            return Err(StorageError::UnsupportedVersion {
                key: key.to_string(),
                found: envelope.version,
                supported: SCHEMA_VERSION,
            });
        }

        serde_json::from_value(envelope.data)
            .map(Some)
            .map_err(|source| StorageError::Corrupt {
                key: key.to_string(),
                source,
            })
    }

    fn write_value<V: Serialize + ?Sized>(&self, collection: Collection, value: &V) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(&Envelope {
            version: SCHEMA_VERSION,
            data: value,
        })?;
        self.backend.set(collection.key(), &encoded)
    }
}

fn item_id(item: &Value) -> Option<&str> {
    item.get("id").and_then(Value::as_str)
}

/// Decode one stored entry, logging and skipping it when it does not fit `T`.
fn decode_item<T: Record>(item: &Value) -> Option<T> {
    match T::deserialize(item) {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::warn!(
                key = T::COLLECTION.key(),
                id = item_id(item).unwrap_or("?"),
                error = %e,
                "Skipping undecodable record"
            );
            None
        }
    }
}
