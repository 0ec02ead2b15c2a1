//! Schema envelope and the upgrade pass run when a store opens.
//!
//! Every stored value is wrapped as `{"version": N, "data": ...}`. Data
//! written before versioning existed is a bare JSON array (or a bare object
//! for the profile) and counts as version 0. `migrate` walks every known
//! collection key and upgrades it step by step to `SCHEMA_VERSION`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::backend::KeyValueBackend;
use super::store::Collection;
use super::StorageError;

/// Version written by this build.
pub const SCHEMA_VERSION: u32 = 1;

/// Versioned wrapper around one stored collection or singleton.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub version: u32,
    pub data: T,
}

/// Outcome of a migration pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Keys rewritten to the current version.
    pub migrated: Vec<String>,
    /// Keys left untouched because their content could not be parsed.
    pub skipped: Vec<String>,
}

/// Upgrade every known collection to `SCHEMA_VERSION`. Idempotent.
pub fn migrate(backend: &dyn KeyValueBackend) -> Result<MigrationReport, StorageError> {
    let mut report = MigrationReport::default();

    for collection in Collection::ALL {
        let key = collection.key();
        let Some(raw) = backend.get(key)? else {
            continue;
        };

        let value: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "Leaving unparseable value in place");
                report.skipped.push(key.to_string());
                continue;
            }
        };

        let (version, data) = split_envelope(value);
        if version == SCHEMA_VERSION {
            continue;
        }
        if version > SCHEMA_VERSION {
            return Err(StorageError::UnsupportedVersion {
                key: key.to_string(),
                found: version,
                supported: SCHEMA_VERSION,
            });
        }

        let mut data = data;
        for from in version..SCHEMA_VERSION {
            tracing::info!(key, from, to = from + 1, "Running migration");
            data = upgrade_step(collection, from, data);
        }

        let upgraded = serde_json::to_string(&Envelope {
            version: SCHEMA_VERSION,
            data,
        })?;
        backend.set(key, &upgraded)?;
        report.migrated.push(key.to_string());
    }

    Ok(report)
}

/// Split a stored value into (version, payload). Anything that is not an
/// envelope is legacy version-0 data.
fn split_envelope(value: Value) -> (u32, Value) {
    match value {
        Value::Object(mut map) => match envelope_version(&map) {
            Some(version) => {
                let data = map.remove("data").unwrap_or(Value::Null);
                (version, data)
            }
            None => (0, Value::Object(map)),
        },
        other => (0, other),
    }
}

fn envelope_version(map: &serde_json::Map<String, Value>) -> Option<u32> {
    if map.len() != 2 || !map.contains_key("data") {
        return None;
    }
    map.get("version")
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
}

/// One version step for one collection.
fn upgrade_step(collection: Collection, from: u32, data: Value) -> Value {
    match from {
        // v0 -> v1: legacy values only gain the envelope. A null payload
        // (key written but never filled) becomes an empty collection.
        0 => match (collection, data) {
            (Collection::UserProfile, data) => data,
            (_, Value::Null) => Value::Array(Vec::new()),
            (_, data) => data,
        },
        _ => data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryBackend;

    #[test]
    fn empty_backend_needs_nothing() {
        let backend = MemoryBackend::new();
        let report = migrate(&backend).unwrap();
        assert_eq!(report, MigrationReport::default());
    }

    #[test]
    fn legacy_array_is_wrapped() {
        let backend = MemoryBackend::new();
        backend
            .set("familyMembers", r#"[{"id":"fam-1","name":"Ana"}]"#)
            .unwrap();

        let report = migrate(&backend).unwrap();
        assert_eq!(report.migrated, vec!["familyMembers"]);

        let stored: Value =
            serde_json::from_str(&backend.get("familyMembers").unwrap().unwrap()).unwrap();
        assert_eq!(stored["version"], 1);
        assert_eq!(stored["data"][0]["name"], "Ana");
    }

    #[test]
    fn legacy_profile_object_is_wrapped() {
        let backend = MemoryBackend::new();
        backend
            .set("userProfile", r#"{"name":"Ana","email":"ana@example.com"}"#)
            .unwrap();

        migrate(&backend).unwrap();

        let stored: Value =
            serde_json::from_str(&backend.get("userProfile").unwrap().unwrap()).unwrap();
        assert_eq!(stored["version"], 1);
        assert_eq!(stored["data"]["email"], "ana@example.com");
    }

    #[test]
    fn legacy_null_becomes_empty_collection() {
        let backend = MemoryBackend::new();
        backend.set("notifications", "null").unwrap();

        migrate(&backend).unwrap();

        let stored: Value =
            serde_json::from_str(&backend.get("notifications").unwrap().unwrap()).unwrap();
        assert_eq!(stored["data"], Value::Array(Vec::new()));
    }

    #[test]
    fn migration_idempotent() {
        let backend = MemoryBackend::new();
        backend.set("appointments", "[]").unwrap();

        let first = migrate(&backend).unwrap();
        let after_first = backend.get("appointments").unwrap();
        let second = migrate(&backend).unwrap();

        assert_eq!(first.migrated, vec!["appointments"]);
        assert!(second.migrated.is_empty());
        assert_eq!(backend.get("appointments").unwrap(), after_first);
    }

    #[test]
    fn newer_version_is_refused() {
        let backend = MemoryBackend::new();
        backend
            .set("appointments", r#"{"version":7,"data":[]}"#)
            .unwrap();

        let err = migrate(&backend).unwrap_err();
        assert!(matches!(
            err,
            StorageError::UnsupportedVersion { found: 7, supported: 1, .. }
        ));
    }

    #[test]
    fn unparseable_value_skipped_untouched() {
        let backend = MemoryBackend::new();
        backend.set("doctors", "{not json").unwrap();

        let report = migrate(&backend).unwrap();
        assert_eq!(report.skipped, vec!["doctors"]);
        assert_eq!(backend.get("doctors").unwrap().as_deref(), Some("{not json"));
    }

    #[test]
    fn unknown_keys_ignored() {
        let backend = MemoryBackend::new();
        backend.set("isLoggedIn", "true").unwrap();

        let report = migrate(&backend).unwrap();
        assert!(report.migrated.is_empty());
        assert_eq!(backend.get("isLoggedIn").unwrap().as_deref(), Some("true"));
    }

    #[test]
    fn object_with_version_but_extra_fields_is_legacy() {
        let (version, data) =
            split_envelope(serde_json::json!({"version": 1, "data": [], "name": "x"}));
        assert_eq!(version, 0);
        assert_eq!(data["name"], "x");
    }
}
