//! Shared JSON-document storage.
//!
//! Every TransTrack entity is persisted the same way: one pretty-printed JSON document per
//! record, filed at `<collection>/<s1>/<s2>/<id>.json` where `s1`/`s2` are the first two and
//! next two hex characters of the record id. Sharding keeps per-directory fan-out bounded as
//! collections grow. The typed repository modules in this tree are thin wrappers over these
//! helpers.
//!
//! Writes are last-write-wins and there is no locking: handlers are stateless, every
//! collection except `patients` is append-only in practice, and two concurrent updates to
//! the same patient may race. That race is accepted rather than hidden behind a lock.

use crate::config::CoreConfig;
use crate::error::{TrackError, TrackResult};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use transtrack_types::EntityId;

/// Envelope persisted around every stored entity.
///
/// `data` is flattened, so a stored document reads as one flat JSON object with `id`,
/// `created_at` and `updated_at` alongside the entity fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<T> {
    pub id: EntityId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub data: T,
}

/// Allocates a fresh record id and its sharded file path within `collection`.
///
/// Guards against pathological id collisions (or pre-existing files from external
/// interference) by retrying up to 5 times with different ids.
///
/// # Errors
///
/// Returns `TrackError::StorageDirCreation` if the shard directory cannot be created, or
/// `TrackError::IdAllocation` if no free path was found after 5 attempts.
fn allocate_record_path(cfg: &CoreConfig, collection: &str) -> TrackResult<(EntityId, PathBuf)> {
    let base = cfg.collection_dir(collection);

    for _attempt in 0..5 {
        let id = EntityId::generate();
        let candidate = id.sharded_file(&base);

        if candidate.exists() {
            continue;
        }

        if let Some(parent) = candidate.parent() {
            fs::create_dir_all(parent).map_err(TrackError::StorageDirCreation)?;
        }

        return Ok((id, candidate));
    }

    Err(TrackError::IdAllocation)
}

fn write_record<T: Serialize>(path: &Path, record: &Record<T>) -> TrackResult<()> {
    let json = serde_json::to_string_pretty(record).map_err(TrackError::Serialization)?;
    fs::write(path, json).map_err(TrackError::FileWrite)
}

fn read_record<T: DeserializeOwned>(path: &Path) -> TrackResult<Record<T>> {
    let contents = fs::read_to_string(path).map_err(TrackError::FileRead)?;
    serde_json::from_str(&contents).map_err(TrackError::Deserialization)
}

/// Persists `data` as a new record with a server-assigned id and timestamps.
///
/// # Errors
///
/// Returns an error if id allocation, serialization or the write fails.
pub fn create_record<T>(cfg: &CoreConfig, collection: &str, data: T) -> TrackResult<Record<T>>
where
    T: Serialize + DeserializeOwned,
{
    let (id, path) = allocate_record_path(cfg, collection)?;
    let now = Utc::now();
    let record = Record {
        id,
        created_at: now,
        updated_at: now,
        data,
    };
    write_record(&path, &record)?;
    Ok(record)
}

/// Loads one record by id.
///
/// # Errors
///
/// Returns `TrackError::NotFound` if no document exists for `id`, or a read/deserialize
/// error if the document cannot be loaded.
pub fn get_record<T: DeserializeOwned>(
    cfg: &CoreConfig,
    collection: &'static str,
    id: &EntityId,
) -> TrackResult<Record<T>> {
    let path = id.sharded_file(&cfg.collection_dir(collection));
    if !path.is_file() {
        return Err(TrackError::NotFound {
            collection,
            id: id.to_string(),
        });
    }
    read_record(&path)
}

/// Replaces the entity fields of an existing record.
///
/// `created_at` is preserved from the stored document; `updated_at` is bumped to now.
///
/// # Errors
///
/// Returns `TrackError::NotFound` if no document exists for `id`.
pub fn update_record<T>(
    cfg: &CoreConfig,
    collection: &'static str,
    id: &EntityId,
    data: T,
) -> TrackResult<Record<T>>
where
    T: Serialize + DeserializeOwned,
{
    let path = id.sharded_file(&cfg.collection_dir(collection));
    if !path.is_file() {
        return Err(TrackError::NotFound {
            collection,
            id: id.to_string(),
        });
    }

    let existing: Record<T> = read_record(&path)?;
    let record = Record {
        id: *id,
        created_at: existing.created_at,
        updated_at: Utc::now(),
        data,
    };
    write_record(&path, &record)?;
    Ok(record)
}

/// Loads every readable record in `collection`, in directory-walk order.
///
/// A missing collection directory yields an empty list. Documents that cannot be read or
/// parsed are logged as warnings and skipped; one corrupt file must not take down a listing.
pub fn list_records<T: DeserializeOwned>(cfg: &CoreConfig, collection: &str) -> Vec<Record<T>> {
    let collection_dir = cfg.collection_dir(collection);

    let mut records = Vec::new();

    let s1_iter = match fs::read_dir(&collection_dir) {
        Ok(it) => it,
        Err(_) => return records,
    };
    for s1 in s1_iter.flatten() {
        let s1_path = s1.path();
        if !s1_path.is_dir() {
            continue;
        }

        let s2_iter = match fs::read_dir(&s1_path) {
            Ok(it) => it,
            Err(_) => continue,
        };

        for s2 in s2_iter.flatten() {
            let s2_path = s2.path();
            if !s2_path.is_dir() {
                continue;
            }

            let doc_iter = match fs::read_dir(&s2_path) {
                Ok(it) => it,
                Err(_) => continue,
            };

            for doc in doc_iter.flatten() {
                let doc_path = doc.path();
                if doc_path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                    continue;
                }

                match read_record(&doc_path) {
                    Ok(record) => records.push(record),
                    Err(e) => {
                        tracing::warn!(
                            "skipping unreadable record {}: {}",
                            doc_path.display(),
                            e
                        );
                    }
                }
            }
        }
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Sample {
        label: String,
        points: i64,
    }

    fn test_cfg(dir: &TempDir) -> CoreConfig {
        CoreConfig::new(dir.path().to_path_buf())
    }

    fn sample(label: &str) -> Sample {
        Sample {
            label: label.to_string(),
            points: 7,
        }
    }

    #[test]
    fn create_then_get_round_trips() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = test_cfg(&dir);

        let created = create_record(&cfg, "samples", sample("alpha")).expect("create");
        let fetched: Record<Sample> = get_record(&cfg, "samples", &created.id).expect("get");

        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.data.label, "alpha");
        assert_eq!(fetched.created_at, created.created_at);
    }

    #[test]
    fn records_are_sharded_by_id_prefix() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = test_cfg(&dir);

        let created = create_record(&cfg, "samples", sample("alpha")).expect("create");

        let id = created.id.to_string();
        let expected: PathBuf = dir
            .path()
            .join("samples")
            .join(&id[0..2])
            .join(&id[2..4])
            .join(format!("{id}.json"));
        assert!(expected.is_file());
    }

    #[test]
    fn get_missing_record_is_not_found() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = test_cfg(&dir);

        let err = get_record::<Sample>(&cfg, "samples", &EntityId::generate())
            .expect_err("nothing stored");
        assert!(matches!(err, TrackError::NotFound { collection: "samples", .. }));
    }

    #[test]
    fn update_preserves_created_at_and_bumps_updated_at() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = test_cfg(&dir);

        let created = create_record(&cfg, "samples", sample("alpha")).expect("create");
        let updated =
            update_record(&cfg, "samples", &created.id, sample("beta")).expect("update");

        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(updated.data.label, "beta");

        let fetched: Record<Sample> = get_record(&cfg, "samples", &created.id).expect("get");
        assert_eq!(fetched.data.label, "beta");
    }

    #[test]
    fn update_missing_record_is_not_found() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = test_cfg(&dir);

        let err = update_record(&cfg, "samples", &EntityId::generate(), sample("beta"))
            .expect_err("nothing stored");
        assert!(matches!(err, TrackError::NotFound { .. }));
    }

    #[test]
    fn list_returns_empty_for_missing_collection() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = test_cfg(&dir);

        let records: Vec<Record<Sample>> = list_records(&cfg, "samples");
        assert!(records.is_empty());
    }

    #[test]
    fn list_skips_corrupt_documents() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = test_cfg(&dir);

        create_record(&cfg, "samples", sample("alpha")).expect("create");
        create_record(&cfg, "samples", sample("beta")).expect("create");

        let rogue = dir.path().join("samples").join("zz").join("zz");
        fs::create_dir_all(&rogue).expect("should create directory");
        fs::write(rogue.join("zzzz.json"), "{ not json").expect("should write file");

        let records: Vec<Record<Sample>> = list_records(&cfg, "samples");
        assert_eq!(records.len(), 2);
    }
}
