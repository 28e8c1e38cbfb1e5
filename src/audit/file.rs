//! File-backed audit store.
//!
//! Each table is an append-only JSON-lines file. On open the file is replayed
//! into an in-memory index where the last line for a key wins, which gives
//! upsert semantics without rewriting the file.

use async_trait::async_trait;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::audit::record::AuditRecord;
use crate::audit::store::{AuditStore, StoreResult};

pub struct FileAuditStore {
    table: String,
    path: PathBuf,
    sync_writes: bool,
    tail: Mutex<Tail>,
    index: DashMap<String, AuditRecord>,
}

/// The append handle, plus whether the file currently ends mid-line.
struct Tail {
    file: File,
    torn: bool,
}

impl Tail {
    /// Append one line. When the file ends mid-line the record is written
    /// on a fresh line so it never merges with the fragment.
    async fn append(&mut self, line: &[u8], sync: bool) -> std::io::Result<()> {
        let mut buf = Vec::with_capacity(line.len() + 1);
        if self.torn {
            buf.push(b'\n');
        }
        buf.extend_from_slice(line);

        self.file.write_all(&buf).await?;
        self.file.flush().await?;
        if sync {
            self.file.sync_data().await?;
        }
        self.torn = false;
        Ok(())
    }

    /// Cut a failed append back to `len`. If that fails too, the next append
    /// starts on a new line.
    async fn rollback(&mut self, len: u64) {
        if let Err(e) = self.file.set_len(len).await {
            tracing::error!(error = %e, "Failed to truncate partial audit write");
            self.torn = true;
        }
    }
}

impl FileAuditStore {
    /// Open (or create) the table `<directory>/<table>.jsonl`.
    pub async fn open(directory: &Path, table: &str, sync_writes: bool) -> StoreResult<Self> {
        fs::create_dir_all(directory).await?;
        let path = directory.join(format!("{}.jsonl", table));

        let index = DashMap::new();
        let mut torn = false;
        if fs::try_exists(&path).await? {
            let content = fs::read_to_string(&path).await?;
            let mut skipped = 0usize;
            for line in content.lines().filter(|l| !l.trim().is_empty()) {
                match serde_json::from_str::<AuditRecord>(line) {
                    Ok(record) => {
                        index.insert(record.request_id.clone(), record);
                    }
                    // A torn trailing line from an interrupted write.
                    Err(_) => skipped += 1,
                }
            }
            if skipped > 0 {
                tracing::warn!(path = ?path, skipped, "Skipped unreadable audit lines during replay");
            }
            tracing::info!(path = ?path, records = index.len(), "Replayed audit table");
            torn = !content.is_empty() && !content.ends_with('\n');
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        Ok(Self {
            table: table.to_string(),
            path,
            sync_writes,
            tail: Mutex::new(Tail { file, torn }),
            index,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AuditStore for FileAuditStore {
    async fn upsert(&self, record: AuditRecord) -> StoreResult<()> {
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');

        {
            let mut tail = self.tail.lock().await;
            let len = tail.file.metadata().await?.len();
            if let Err(e) = tail.append(&line, self.sync_writes).await {
                tail.rollback(len).await;
                return Err(e.into());
            }
        }

        self.index.insert(record.request_id.clone(), record);
        Ok(())
    }

    async fn get(&self, request_id: &str) -> StoreResult<Option<AuditRecord>> {
        Ok(self.index.get(request_id).map(|r| r.value().clone()))
    }

    async fn len(&self) -> StoreResult<usize> {
        Ok(self.index.len())
    }

    fn table(&self) -> &str {
        &self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, auth: &str) -> AuditRecord {
        AuditRecord {
            request_id: id.to_string(),
            source_ip: "10.0.0.1".to_string(),
            credential: auth.to_string(),
            received_at: 42,
        }
    }

    #[tokio::test]
    async fn test_replay_last_write_wins() {
        let dir = tempfile::tempdir().unwrap();

        {
            let store = FileAuditStore::open(dir.path(), "history", true).await.unwrap();
            store.upsert(record("a", "first")).await.unwrap();
            store.upsert(record("b", "")).await.unwrap();
            store.upsert(record("a", "second")).await.unwrap();
            assert_eq!(store.len().await.unwrap(), 2);
        }

        let reopened = FileAuditStore::open(dir.path(), "history", true).await.unwrap();
        assert_eq!(reopened.len().await.unwrap(), 2);
        let a = reopened.get("a").await.unwrap().unwrap();
        assert_eq!(a.credential, "second");
        assert!(reopened.path().ends_with("history.jsonl"));
    }

    #[tokio::test]
    async fn test_torn_line_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.jsonl");
        std::fs::write(
            &path,
            "{\"request_id\":\"ok\",\"source_ip\":\"1.1.1.1\",\"auth\":\"\",\"epoch\":1}\n{\"request_id\":\"torn\",\"sou",
        )
        .unwrap();

        let store = FileAuditStore::open(dir.path(), "t", false).await.unwrap();
        assert_eq!(store.len().await.unwrap(), 1);
        assert!(store.get("ok").await.unwrap().is_some());
        assert!(store.get("torn").await.unwrap().is_none());

        store.upsert(record("after", "x")).await.unwrap();
        drop(store);

        let reopened = FileAuditStore::open(dir.path(), "t", false).await.unwrap();
        assert_eq!(reopened.len().await.unwrap(), 2);
        assert!(reopened.get("after").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_failed_append_is_rolled_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileAuditStore::open(dir.path(), "t", true).await.unwrap();
        store.upsert(record("first", "a")).await.unwrap();

        // A write that died halfway through its line.
        {
            let mut tail = store.tail.lock().await;
            let len = tail.file.metadata().await.unwrap().len();
            tail.file.write_all(b"{\"request_id\":\"x\",\"sou").await.unwrap();
            tail.file.flush().await.unwrap();
            tail.rollback(len).await;
        }

        store.upsert(record("second", "b")).await.unwrap();
        drop(store);

        let content = std::fs::read_to_string(dir.path().join("t.jsonl")).unwrap();
        assert_eq!(content.lines().count(), 2);

        let reopened = FileAuditStore::open(dir.path(), "t", true).await.unwrap();
        assert!(reopened.get("first").await.unwrap().is_some());
        assert!(reopened.get("second").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_write_after_torn_tail_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileAuditStore::open(dir.path(), "t", false).await.unwrap();

        // A fragment left behind when truncation was not possible.
        {
            let mut tail = store.tail.lock().await;
            tail.file.write_all(b"{\"request_id\":\"x\",\"sou").await.unwrap();
            tail.file.flush().await.unwrap();
            tail.torn = true;
        }

        store.upsert(record("kept", "k")).await.unwrap();
        drop(store);

        let reopened = FileAuditStore::open(dir.path(), "t", false).await.unwrap();
        assert_eq!(reopened.len().await.unwrap(), 1);
        assert_eq!(reopened.get("kept").await.unwrap().unwrap().credential, "k");
    }
}
