//! Durable store backend.
//!
//! Each namespace is one JSON snapshot at `<dir>/<namespace>.json`:
//!
//! ```json
//! {
//!   "schema_version": 1,
//!   "namespace": "posts",
//!   "saved_at": "2024-05-01T12:00:00Z",
//!   "entries": { "abc123": "art1" }
//! }
//! ```
//!
//! Every mutation is applied to a copy of the table, written with
//! `write_atomic` on the blocking pool, and only then made visible. A failed
//! write leaves both the file and the in-memory view unchanged. The namespace
//! lock is held across the write so mutations reach disk in order.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::fsync::write_atomic;
use super::table::Table;
use super::{AppendOutcome, KeyValueStore, Result, StoreError};

/// Current snapshot schema version.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    schema_version: u32,
    namespace: String,
    saved_at: DateTime<Utc>,
    entries: Table,
}

#[derive(Debug)]
struct Inner {
    path: PathBuf,
    namespace: String,
    table: Table,
}

/// A namespace persisted to a JSON file. Clones share contents.
#[derive(Debug, Clone)]
pub struct FileStore {
    inner: Arc<Mutex<Inner>>,
}

fn load(path: &Path) -> Result<Option<Table>> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
    if snapshot.schema_version != SCHEMA_VERSION {
        return Err(StoreError::SchemaMismatch {
            expected: SCHEMA_VERSION,
            got: snapshot.schema_version,
        });
    }
    Ok(Some(snapshot.entries))
}

fn save(path: &Path, namespace: &str, table: &Table) -> Result<()> {
    let snapshot = Snapshot {
        schema_version: SCHEMA_VERSION,
        namespace: namespace.to_string(),
        saved_at: Utc::now(),
        entries: table.clone(),
    };
    let bytes = serde_json::to_vec_pretty(&snapshot)?;
    write_atomic(path, &bytes)?;
    Ok(())
}

impl FileStore {
    /// Opens `<dir>/<namespace>.json`, starting empty if it doesn't exist.
    pub fn open(dir: impl AsRef<Path>, namespace: &str) -> Result<Self> {
        let path = dir.as_ref().join(format!("{}.json", namespace));
        let table = match load(&path)? {
            Some(table) => {
                info!(namespace, keys = table.len(), path = %path.display(), "Loaded store snapshot");
                table
            }
            None => {
                debug!(namespace, path = %path.display(), "No store snapshot, starting empty");
                Table::new()
            }
        };

        Ok(Self {
            inner: Arc::new(Mutex::new(Inner {
                path,
                namespace: namespace.to_string(),
                table,
            })),
        })
    }

    pub async fn path(&self) -> PathBuf {
        self.inner.lock().await.path.clone()
    }

    async fn read<T>(&self, op: impl FnOnce(&Inner) -> Result<T>) -> Result<T> {
        let inner = self.inner.lock().await;
        op(&inner)
    }

    /// Applies `op` to a copy of the table and persists it if anything changed.
    async fn mutate<T>(&self, op: impl FnOnce(&mut Table) -> Result<T>) -> Result<T> {
        let mut inner = self.inner.lock().await;
        let mut next = inner.table.clone();
        let out = op(&mut next)?;
        if next != inner.table {
            let (path, namespace) = (inner.path.clone(), inner.namespace.clone());
            inner.table = tokio::task::spawn_blocking(move || {
                save(&path, &namespace, &next).map(|()| next)
            })
            .await??;
        }
        Ok(out)
    }
}

impl KeyValueStore for FileStore {
    async fn exists(&self, key: &str) -> Result<bool> {
        self.read(|i| Ok(i.table.exists(key))).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.read(|i| i.table.get(key)).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.mutate(|t| {
            t.set(key, value);
            Ok(())
        })
        .await
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.mutate(|t| Ok(t.delete(key))).await
    }

    async fn append_to_list(&self, key: &str, value: &str) -> Result<u64> {
        self.mutate(|t| t.append_to_list(key, value)).await
    }

    async fn list_length(&self, key: &str) -> Result<u64> {
        self.read(|i| i.table.list_length(key)).await
    }

    async fn list_range(&self, key: &str, start: i64, end: i64) -> Result<Vec<String>> {
        self.read(|i| i.table.list_range(key, start, end)).await
    }

    async fn take(&self, key: &str) -> Result<Option<String>> {
        self.mutate(|t| t.take(key)).await
    }

    async fn take_list(&self, key: &str) -> Result<Vec<String>> {
        self.mutate(|t| t.take_list(key)).await
    }

    async fn append_unique(&self, key: &str, value: &str) -> Result<AppendOutcome> {
        self.mutate(|t| t.append_unique(key, value)).await
    }

    async fn remove_from_list(&self, key: &str, value: &str) -> Result<bool> {
        self.mutate(|t| t.remove_from_list(key, value)).await
    }
}
