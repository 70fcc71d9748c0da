//! JSON file attempt store.
//!
//! The whole store is one JSON document. Every call reads the document, and
//! every mutating call writes a changed copy to a temp file next to the
//! target and renames it into place, so a failed call leaves the file as it
//! was.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use quizline_core::error::StoreError;
use quizline_core::model::{Attempt, AttemptId, AttemptPatch, NewAttempt};
use quizline_core::store::{StoreData, STORE_VERSION};
use quizline_core::traits::{AttemptQuery, AttemptStore};

/// Attempt store backed by a single JSON file.
pub struct JsonFileStore {
    path: PathBuf,
    /// Serializes calls within this process.
    lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open (or lazily create) the store at `path`.
    ///
    /// A missing file is an empty store; it is created on the first write.
    /// An unreadable file or one written by an unknown layout version fails
    /// with [`StoreError::Init`].
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let data = read_document(&path).await?;
        tracing::debug!(
            path = %path.display(),
            attempts = data.attempts.len(),
            "opened attempt store"
        );
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of the whole document.
    pub async fn data(&self) -> Result<StoreData, StoreError> {
        let _guard = self.lock.lock().await;
        read_document(&self.path).await
    }

    async fn read<T>(&self, f: impl FnOnce(&StoreData) -> T) -> Result<T, StoreError> {
        let _guard = self.lock.lock().await;
        let data = read_document(&self.path).await?;
        Ok(f(&data))
    }

    /// Load, apply `f` to a copy, and commit the copy only if `f` succeeds.
    async fn mutate<T>(
        &self,
        f: impl FnOnce(&mut StoreData) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let _guard = self.lock.lock().await;
        let mut data = read_document(&self.path).await?;
        let out = f(&mut data)?;
        write_document(&self.path, &data).await?;
        Ok(out)
    }
}

async fn read_document(path: &Path) -> Result<StoreData, StoreError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(StoreData::default()),
        Err(e) => return Err(StoreError::Io(e)),
    };

    let data: StoreData = serde_json::from_str(&content).map_err(|e| StoreError::Init {
        path: path.to_path_buf(),
        reason: format!("unreadable store document: {e}"),
    })?;

    if data.version != STORE_VERSION {
        return Err(StoreError::Init {
            path: path.to_path_buf(),
            reason: format!(
                "unsupported store version {} (expected {STORE_VERSION})",
                data.version
            ),
        });
    }

    Ok(data)
}

async fn write_document(path: &Path, data: &StoreData) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec_pretty(data)?;
    let path = path.to_path_buf();

    tokio::task::spawn_blocking(move || -> Result<(), std::io::Error> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        std::io::Write::write_all(&mut tmp, &bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(())
    })
    .await
    .map_err(|e| StoreError::Io(std::io::Error::other(e)))??;

    Ok(())
}

#[async_trait]
impl AttemptStore for JsonFileStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn create(&self, attempt: NewAttempt) -> Result<Attempt, StoreError> {
        let created = self
            .mutate(|data| Ok(data.create(attempt, Utc::now())))
            .await?;
        tracing::info!(id = created.id, path = %self.path.display(), "attempt created");
        Ok(created)
    }

    async fn update(&self, id: AttemptId, patch: AttemptPatch) -> Result<Attempt, StoreError> {
        let updated = self
            .mutate(|data| data.update(id, patch, Utc::now()))
            .await?;
        tracing::info!(id, "attempt updated");
        Ok(updated)
    }

    async fn get(&self, id: AttemptId) -> Result<Option<Attempt>, StoreError> {
        self.read(|data| data.get(id).cloned()).await
    }

    async fn query_all(&self, query: &AttemptQuery) -> Result<Vec<Attempt>, StoreError> {
        self.read(|data| data.query(query)).await
    }

    async fn query_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Attempt>, StoreError> {
        self.read(|data| data.range(start, end)).await
    }

    async fn delete(&self, id: AttemptId) -> Result<bool, StoreError> {
        let removed = self.mutate(|data| Ok(data.delete(id))).await?;
        if removed {
            tracing::info!(id, "attempt deleted");
        } else {
            tracing::debug!(id, "delete of unknown attempt ignored");
        }
        Ok(removed)
    }

    async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        let removed = self.mutate(|data| Ok(data.prune_before(cutoff))).await?;
        tracing::info!(removed, cutoff = %cutoff, "pruned old attempts");
        Ok(removed)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.mutate(|data| {
            data.clear();
            Ok(())
        })
        .await?;
        tracing::info!(path = %self.path.display(), "store cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_attempt(name: &str, score: u32, completed_at: DateTime<Utc>) -> NewAttempt {
        NewAttempt {
            participant_name: name.into(),
            character_label: "⚔️ Knight".into(),
            score,
            total_questions: 10,
            completed_at,
        }
    }

    async fn temp_store() -> (tempfile::TempDir, JsonFileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("data").join("attempts.json"))
            .await
            .unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn missing_file_is_an_empty_store() {
        let (_dir, store) = temp_store().await;
        assert!(store
            .query_all(&AttemptQuery::default())
            .await
            .unwrap()
            .is_empty());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn attempts_survive_reopen() {
        let (_dir, store) = temp_store().await;
        let created = store
            .create(new_attempt("ada", 8, Utc::now()))
            .await
            .unwrap();
        assert_eq!(created.id, 1);

        let reopened = JsonFileStore::open(store.path()).await.unwrap();
        let all = reopened.query_all(&AttemptQuery::default()).await.unwrap();
        assert_eq!(all, vec![created]);

        let second = reopened
            .create(new_attempt("bob", 3, Utc::now()))
            .await
            .unwrap();
        assert_eq!(second.id, 2);
    }

    #[tokio::test]
    async fn document_layout() {
        let (_dir, store) = temp_store().await;
        store
            .create(new_attempt("ada", 8, Utc::now()))
            .await
            .unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["version"], 1);
        assert_eq!(json["next_id"], 2);
        assert_eq!(json["attempts"][0]["participant_name"], "ada");
        assert!(json["users"].is_object());
        assert!(json["settings"].is_object());
    }

    #[tokio::test]
    async fn failed_update_leaves_file_untouched() {
        let (_dir, store) = temp_store().await;
        store
            .create(new_attempt("ada", 8, Utc::now()))
            .await
            .unwrap();
        let before = std::fs::read(store.path()).unwrap();

        let err = store
            .update(42, AttemptPatch::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(std::fs::read(store.path()).unwrap(), before);
    }

    #[tokio::test]
    async fn ids_keep_counting_after_clear() {
        let (_dir, store) = temp_store().await;
        store
            .create(new_attempt("ada", 8, Utc::now()))
            .await
            .unwrap();
        store.clear().await.unwrap();
        assert!(store.data().await.unwrap().attempts.is_empty());

        let next = store
            .create(new_attempt("bob", 1, Utc::now()))
            .await
            .unwrap();
        assert_eq!(next.id, 2);
    }

    #[tokio::test]
    async fn prune_and_delete() {
        let (_dir, store) = temp_store().await;
        let now = Utc::now();
        let old = store
            .create(new_attempt("old", 1, now - Duration::days(40)))
            .await
            .unwrap();
        let recent = store
            .create(new_attempt("recent", 2, now - Duration::hours(1)))
            .await
            .unwrap();

        assert_eq!(store.prune_older_than(Duration::days(30)).await.unwrap(), 1);
        assert_eq!(store.get(old.id).await.unwrap(), None);

        assert!(store.delete(recent.id).await.unwrap());
        assert!(!store.delete(recent.id).await.unwrap());
        assert!(store
            .query_all(&AttemptQuery::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn corrupt_file_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("attempts.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = JsonFileStore::open(&path).await.err().unwrap();
        assert!(matches!(err, StoreError::Init { .. }));
    }

    #[tokio::test]
    async fn unknown_version_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("attempts.json");
        std::fs::write(&path, r#"{"version": 99, "next_id": 1}"#).unwrap();

        let err = JsonFileStore::open(&path).await.err().unwrap();
        assert!(err.to_string().contains("unsupported store version 99"));
    }

    #[tokio::test]
    async fn concurrent_creates_get_distinct_ids() {
        let (_dir, store) = temp_store().await;
        let store = std::sync::Arc::new(store);

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = std::sync::Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .create(new_attempt(&format!("p{i}"), i, Utc::now()))
                    .await
                    .unwrap()
                    .id
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.sort_unstable();
        assert_eq!(ids, (1..=8).collect::<Vec<_>>());
    }
}
