use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use snafu::{OptionExt, ResultExt};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::model::{NewVideo, VideoId, VideoRecord};

pub use error::*;

mod error;

type Entry = Arc<Mutex<VideoRecord>>;

/// Durable keyed storage for [`VideoRecord`]s.
///
/// Every record lives in its own JSON file under the data directory and is
/// mirrored by an in-memory entry. All writes to one id go through that
/// entry's mutex, so interleaved read-modify-write cycles never lose an
/// update.
#[derive(Debug)]
pub struct VideoStore {
    data_dir: PathBuf,
    records: DashMap<VideoId, Entry>,
}

impl VideoStore {
    /// Opens the store rooted at `data_dir`, creating the directory on first
    /// boot and loading every record file already present.
    pub async fn open(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();

        tokio::fs::create_dir_all(&data_dir)
            .await
            .context(CreateDirSnafu {
                path: data_dir.clone(),
            })?;

        let records = DashMap::new();

        let mut entries = tokio::fs::read_dir(&data_dir).await.context(ScanDirSnafu {
            path: data_dir.clone(),
        })?;

        while let Some(file) = entries.next_entry().await.context(ScanDirSnafu {
            path: data_dir.clone(),
        })? {
            let path = file.path();

            if path.extension().map_or(true, |extension| extension != "json") {
                continue;
            }

            let bytes = tokio::fs::read(&path)
                .await
                .context(ReadRecordSnafu { path: path.clone() })?;

            let record: VideoRecord = match serde_json::from_slice(&bytes) {
                Ok(record) => record,
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "skipping unreadable record file");
                    continue;
                }
            };

            records.insert(record.id.clone(), Arc::new(Mutex::new(record)));
        }

        tracing::debug!(records = records.len(), data_dir = %data_dir.display(), "video store opened");

        Ok(Self { data_dir, records })
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Snapshot of every record, in storage order.
    pub async fn all(&self) -> Vec<VideoRecord> {
        // collect the handles first, a shard guard must not be held across an await
        let entries: Vec<Entry> = self
            .records
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        let mut records = Vec::with_capacity(entries.len());

        for entry in entries {
            records.push(entry.lock().await.clone());
        }

        records
    }

    pub async fn get(&self, id: &VideoId) -> Option<VideoRecord> {
        let entry = self.entry(id)?;
        let record = entry.lock().await.clone();

        Some(record)
    }

    /// Persists a fresh record built from `video` and returns it.
    pub async fn insert(&self, video: NewVideo) -> Result<VideoRecord> {
        let record = VideoRecord::from(video);

        self.persist(&record).await?;
        self.records
            .insert(record.id.clone(), Arc::new(Mutex::new(record.clone())));

        Ok(record)
    }

    /// Applies `apply` to the record under its entry lock and persists the
    /// result before it becomes visible. The closure runs on a scratch copy,
    /// so a failed persist leaves the stored record untouched.
    pub async fn mutate(
        &self,
        id: &VideoId,
        apply: impl FnOnce(&mut VideoRecord),
    ) -> Result<VideoRecord> {
        let entry = self.entry(id).context(RecordNotFoundSnafu { id: id.clone() })?;

        let mut current = entry.lock().await;

        // the id may have been removed while we waited for the lock
        if !self.records.contains_key(id) {
            return RecordNotFoundSnafu { id: id.clone() }.fail();
        }

        let mut next = current.clone();
        apply(&mut next);

        self.persist(&next).await?;
        *current = next.clone();

        Ok(next)
    }

    /// Deletes the record and its file. Returns `false` when the id was
    /// already absent; repeated deletes are not an error.
    pub async fn remove(&self, id: &VideoId) -> Result<bool> {
        let Some(entry) = self.entry(id) else {
            return Ok(false);
        };

        let _guard = entry.lock().await;

        let path = self.record_path(id);

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => return Err(source).context(RemoveRecordSnafu { path }),
        }

        Ok(self.records.remove(id).is_some())
    }

    fn entry(&self, id: &VideoId) -> Option<Entry> {
        self.records.get(id).map(|entry| entry.value().clone())
    }

    /// Encode to a scratch file, fsync, then rename over the final path, so
    /// a crash never leaves a half-written record behind.
    async fn persist(&self, record: &VideoRecord) -> Result<()> {
        let path = self.record_path(&record.id);
        let scratch = path.with_extension("json.tmp");

        let bytes = serde_json::to_vec_pretty(record).context(EncodeRecordSnafu {
            id: record.id.clone(),
        })?;

        let mut file = tokio::fs::File::create(&scratch)
            .await
            .context(WriteRecordSnafu {
                path: scratch.clone(),
            })?;

        file.write_all(&bytes).await.context(WriteRecordSnafu {
            path: scratch.clone(),
        })?;

        file.sync_all().await.context(WriteRecordSnafu {
            path: scratch.clone(),
        })?;

        drop(file);

        tokio::fs::rename(&scratch, &path)
            .await
            .context(WriteRecordSnafu { path })?;

        Ok(())
    }

    fn record_path(&self, id: &VideoId) -> PathBuf {
        self.data_dir.join(format!("{id}.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NewVideo {
        NewVideo::new(
            "First clip".to_string(),
            "life".to_string(),
            "media/first.mp4".to_string(),
            "u1".to_string(),
            "Admin".to_string(),
        )
    }

    async fn open_store(dir: &tempfile::TempDir) -> VideoStore {
        VideoStore::open(dir.path()).await.expect("open store")
    }

    #[tokio::test]
    async fn inserted_records_come_back_by_id() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let store = open_store(&dir).await;

        let record = store.insert(sample()).await.expect("insert record");
        let found = store.get(&record.id).await.expect("record is present");

        assert_eq!(record, found);
        assert!(
            store.record_path(&record.id).exists(),
            "every record must be backed by its own file"
        );
    }

    #[tokio::test]
    async fn records_survive_a_reopen() {
        let dir = tempfile::tempdir().expect("create temp dir");

        let id = {
            let store = open_store(&dir).await;
            let record = store.insert(sample()).await.expect("insert record");

            store
                .mutate(&record.id, |record| record.views += 1)
                .await
                .expect("mutate record");

            record.id
        };

        let store = open_store(&dir).await;
        let record = store.get(&id).await.expect("record survives a restart");

        assert_eq!(record.views, 1, "mutations must be durable across restarts");
    }

    #[tokio::test]
    async fn mutating_an_unknown_id_reports_not_found() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let store = open_store(&dir).await;

        let error = store
            .mutate(&VideoId::random(), |record| record.views += 1)
            .await
            .expect_err("unknown ids cannot be mutated");

        assert!(matches!(error, StoreError::RecordNotFound { .. }));
    }

    #[tokio::test]
    async fn remove_reports_whether_anything_was_there() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let store = open_store(&dir).await;

        let record = store.insert(sample()).await.expect("insert record");

        assert!(store.remove(&record.id).await.expect("first remove"));
        assert!(
            !store.remove(&record.id).await.expect("second remove"),
            "removing an absent id is not an error, it just reports false"
        );
        assert!(store.get(&record.id).await.is_none());
        assert!(!store.record_path(&record.id).exists());
    }

    #[tokio::test]
    async fn mutate_after_remove_does_not_resurrect_the_record() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let store = open_store(&dir).await;

        let record = store.insert(sample()).await.expect("insert record");
        store.remove(&record.id).await.expect("remove record");

        let error = store
            .mutate(&record.id, |record| record.views += 1)
            .await
            .expect_err("removed records are gone for good");

        assert!(matches!(error, StoreError::RecordNotFound { .. }));

        let store = open_store(&dir).await;
        assert!(
            store.get(&record.id).await.is_none(),
            "a removed record must not reappear after a restart"
        );
    }

    #[tokio::test]
    async fn legacy_files_without_comments_load_as_empty() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let id = VideoId::random();

        let raw = serde_json::json!({
            "id": id,
            "title": "old record",
            "topic": "life",
            "media_ref": "media/old.mp4",
            "author_id": "u1",
            "author_name": "Admin",
            "views": 7,
            "likes": 2,
            "created_at": "2024-02-01T00:00:00+00:00",
        });

        std::fs::write(dir.path().join(format!("{id}.json")), raw.to_string())
            .expect("write legacy file");

        let store = open_store(&dir).await;
        let record = store.get(&id).await.expect("legacy record loads");

        assert_eq!(record.views, 7);
        assert!(record.comments.is_empty());
    }

    #[tokio::test]
    async fn unreadable_files_are_skipped_without_failing_the_boot() {
        let dir = tempfile::tempdir().expect("create temp dir");

        std::fs::write(
            dir.path().join(format!("{}.json", VideoId::random())),
            "certainly not json",
        )
        .expect("write corrupt file");
        std::fs::write(dir.path().join("notes.txt"), "not a record").expect("write stray file");

        let store = open_store(&dir).await;
        assert!(store.is_empty(), "neither file should have produced a record");

        let record = store.insert(sample()).await.expect("store still works");
        assert!(store.get(&record.id).await.is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn interleaved_mutations_never_lose_an_update() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let store = Arc::new(open_store(&dir).await);

        let record = store.insert(sample()).await.expect("insert record");

        let tasks = (0..32).map(|_| {
            let store = store.clone();
            let id = record.id.clone();

            tokio::spawn(async move {
                store
                    .mutate(&id, |record| record.views += 1)
                    .await
                    .expect("mutate record")
            })
        });

        futures::future::join_all(tasks).await;

        let after = store.get(&record.id).await.expect("record is present");
        assert_eq!(after.views, 32, "every increment must land exactly once");
    }
}
