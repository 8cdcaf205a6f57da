//! Volatile store backend.

use std::sync::{Arc, Mutex};

use super::table::Table;
use super::{AppendOutcome, KeyValueStore, Result, StoreError};

/// An in-memory namespace. Clones share contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    table: Arc<Mutex<Table>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> Result<Table> {
        self.with_table(|table| Ok(table.clone()))
    }

    fn with_table<T>(&self, op: impl FnOnce(&mut Table) -> Result<T>) -> Result<T> {
        let mut table = self.table.lock().map_err(|_| StoreError::Poisoned)?;
        op(&mut table)
    }
}

impl KeyValueStore for MemoryStore {
    async fn exists(&self, key: &str) -> Result<bool> {
        self.with_table(|t| Ok(t.exists(key)))
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.with_table(|t| t.get(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.with_table(|t| {
            t.set(key, value);
            Ok(())
        })
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.with_table(|t| Ok(t.delete(key)))
    }

    async fn append_to_list(&self, key: &str, value: &str) -> Result<u64> {
        self.with_table(|t| t.append_to_list(key, value))
    }

    async fn list_length(&self, key: &str) -> Result<u64> {
        self.with_table(|t| t.list_length(key))
    }

    async fn list_range(&self, key: &str, start: i64, end: i64) -> Result<Vec<String>> {
        self.with_table(|t| t.list_range(key, start, end))
    }

    async fn take(&self, key: &str) -> Result<Option<String>> {
        self.with_table(|t| t.take(key))
    }

    async fn take_list(&self, key: &str) -> Result<Vec<String>> {
        self.with_table(|t| t.take_list(key))
    }

    async fn append_unique(&self, key: &str, value: &str) -> Result<AppendOutcome> {
        self.with_table(|t| t.append_unique(key, value))
    }

    async fn remove_from_list(&self, key: &str, value: &str) -> Result<bool> {
        self.with_table(|t| t.remove_from_list(key, value))
    }
}
