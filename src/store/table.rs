//! In-memory key-value table shared by both store backends.
//!
//! A key holds either a single string or a list of strings. Operations that
//! expect one shape and find the other fail with `StoreError::WrongType`
//! rather than silently coercing, the same contract Redis gives.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{AppendOutcome, Result, StoreError};

/// A stored value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Single(String),
    List(Vec<String>),
}

impl Value {
    fn kind(&self) -> &'static str {
        match self {
            Value::Single(_) => "string",
            Value::List(_) => "list",
        }
    }
}

/// Contents of one namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Table {
    entries: BTreeMap<String, Value>,
}

fn wrong_type(key: &str, expected: &'static str, found: &Value) -> StoreError {
    StoreError::WrongType {
        key: key.to_string(),
        expected,
        found: found.kind(),
    }
}

/// Resolves a Redis-style inclusive index (negative counts from the end).
fn resolve_index(index: i64, len: usize) -> i64 {
    if index < 0 { len as i64 + index } else { index }
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn exists(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(Value::Single(value)) => Ok(Some(value.clone())),
            Some(other) => Err(wrong_type(key, "string", other)),
        }
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.entries
            .insert(key.to_string(), Value::Single(value.to_string()));
    }

    /// Removes `key`; returns whether it existed.
    pub fn delete(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    fn list_mut(&mut self, key: &str) -> Result<&mut Vec<String>> {
        let value = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Value::List(Vec::new()));
        match value {
            Value::List(list) => Ok(list),
            Value::Single(_) => Err(StoreError::WrongType {
                key: key.to_string(),
                expected: "list",
                found: "string",
            }),
        }
    }

    fn list(&self, key: &str) -> Result<&[String]> {
        match self.entries.get(key) {
            None => Ok(&[]),
            Some(Value::List(list)) => Ok(list),
            Some(other) => Err(wrong_type(key, "list", other)),
        }
    }

    /// Appends to the list at `key`, creating it; returns the new length.
    pub fn append_to_list(&mut self, key: &str, value: &str) -> Result<u64> {
        let list = self.list_mut(key)?;
        list.push(value.to_string());
        Ok(list.len() as u64)
    }

    pub fn list_length(&self, key: &str) -> Result<u64> {
        Ok(self.list(key)?.len() as u64)
    }

    /// Returns elements `start..=end`; negative indexes count from the end.
    pub fn list_range(&self, key: &str, start: i64, end: i64) -> Result<Vec<String>> {
        let list = self.list(key)?;
        let len = list.len();
        let start = resolve_index(start, len).max(0);
        let end = resolve_index(end, len).min(len as i64 - 1);
        if len == 0 || start > end {
            return Ok(Vec::new());
        }
        Ok(list[start as usize..=end as usize].to_vec())
    }

    /// Gets and removes a string value.
    pub fn take(&mut self, key: &str) -> Result<Option<String>> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(other @ Value::List(_)) => Err(wrong_type(key, "string", other)),
            Some(Value::Single(_)) => match self.entries.remove(key) {
                Some(Value::Single(value)) => Ok(Some(value)),
                _ => Ok(None),
            },
        }
    }

    /// Gets and removes a list; an absent key yields an empty list.
    pub fn take_list(&mut self, key: &str) -> Result<Vec<String>> {
        match self.entries.get(key) {
            None => Ok(Vec::new()),
            Some(Value::Single(_)) => Err(StoreError::WrongType {
                key: key.to_string(),
                expected: "list",
                found: "string",
            }),
            Some(Value::List(_)) => match self.entries.remove(key) {
                Some(Value::List(list)) => Ok(list),
                _ => Ok(Vec::new()),
            },
        }
    }

    /// Appends `value` unless the list already contains it.
    pub fn append_unique(&mut self, key: &str, value: &str) -> Result<AppendOutcome> {
        if self.list(key)?.iter().any(|v| v == value) {
            return Ok(AppendOutcome::AlreadyPresent);
        }
        self.append_to_list(key, value).map(AppendOutcome::Appended)
    }

    /// Removes `value` from the list at `key`. An emptied list is deleted.
    pub fn remove_from_list(&mut self, key: &str, value: &str) -> Result<bool> {
        let Some(position) = self.list(key)?.iter().position(|v| v == value) else {
            return Ok(false);
        };
        let list = self.list_mut(key)?;
        list.remove(position);
        if list.is_empty() {
            self.entries.remove(key);
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn list_of(items: &[&str]) -> Table {
        let mut table = Table::new();
        for item in items {
            table.append_to_list("k", item).unwrap();
        }
        table
    }

    #[test]
    fn string_roundtrip_and_delete() {
        let mut table = Table::new();
        assert!(!table.exists("abc123"));
        table.set("abc123", "art1");
        assert!(table.exists("abc123"));
        assert_eq!(table.get("abc123").unwrap().as_deref(), Some("art1"));
        assert!(table.delete("abc123"));
        assert!(!table.delete("abc123"));
        assert_eq!(table.get("abc123").unwrap(), None);
    }

    #[test]
    fn append_returns_new_length() {
        let mut table = Table::new();
        assert_eq!(table.append_to_list("k", "a").unwrap(), 1);
        assert_eq!(table.append_to_list("k", "b").unwrap(), 2);
        assert_eq!(table.list_length("k").unwrap(), 2);
        assert_eq!(table.list_length("missing").unwrap(), 0);
    }

    #[test]
    fn list_range_follows_redis_indexing() {
        let table = list_of(&["a", "b", "c", "d"]);
        assert_eq!(table.list_range("k", 0, -1).unwrap(), vec!["a", "b", "c", "d"]);
        assert_eq!(table.list_range("k", 1, 2).unwrap(), vec!["b", "c"]);
        assert_eq!(table.list_range("k", -2, -1).unwrap(), vec!["c", "d"]);
        assert_eq!(table.list_range("k", 0, 100).unwrap(), vec!["a", "b", "c", "d"]);
        assert!(table.list_range("k", 3, 1).unwrap().is_empty());
        assert!(table.list_range("missing", 0, -1).unwrap().is_empty());
    }

    #[test]
    fn wrong_type_is_reported() {
        let mut table = Table::new();
        table.set("s", "x");
        table.append_to_list("l", "y").unwrap();

        assert!(matches!(
            table.append_to_list("s", "z"),
            Err(StoreError::WrongType { expected: "list", .. })
        ));
        assert!(matches!(
            table.get("l"),
            Err(StoreError::WrongType { expected: "string", .. })
        ));
        assert!(table.take("l").is_err());
        assert!(table.take_list("s").is_err());
        // Failed operations leave the value in place.
        assert_eq!(table.get("s").unwrap().as_deref(), Some("x"));
        assert_eq!(table.list_length("l").unwrap(), 1);
    }

    #[test]
    fn take_removes_exactly_once() {
        let mut table = Table::new();
        table.set("abc123", "art1");
        assert_eq!(table.take("abc123").unwrap().as_deref(), Some("art1"));
        assert_eq!(table.take("abc123").unwrap(), None);
        assert!(!table.exists("abc123"));
    }

    #[test]
    fn take_list_removes_key() {
        let mut table = list_of(&["alice", "bob"]);
        assert_eq!(table.take_list("k").unwrap(), vec!["alice", "bob"]);
        assert!(!table.exists("k"));
        assert!(table.take_list("k").unwrap().is_empty());
    }

    #[test]
    fn append_unique_skips_duplicates() {
        let mut table = Table::new();
        assert_eq!(
            table.append_unique("k", "alice").unwrap(),
            AppendOutcome::Appended(1)
        );
        assert_eq!(
            table.append_unique("k", "alice").unwrap(),
            AppendOutcome::AlreadyPresent
        );
        assert_eq!(
            table.append_unique("k", "bob").unwrap(),
            AppendOutcome::Appended(2)
        );
    }

    #[test]
    fn remove_from_list_deletes_emptied_key() {
        let mut table = list_of(&["alice", "bob"]);
        assert!(table.remove_from_list("k", "alice").unwrap());
        assert!(!table.remove_from_list("k", "alice").unwrap());
        assert_eq!(table.list_range("k", 0, -1).unwrap(), vec!["bob"]);

        assert!(table.remove_from_list("k", "bob").unwrap());
        assert!(!table.exists("k"));
        assert!(!table.remove_from_list("missing", "bob").unwrap());
        assert!(!table.exists("missing"));
    }

    #[test]
    fn serializes_as_plain_json_map() {
        let mut table = list_of(&["alice"]);
        table.set("abc123", "art1");
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json, serde_json::json!({"abc123": "art1", "k": ["alice"]}));
        let back: Table = serde_json::from_value(json).unwrap();
        assert_eq!(back, table);
    }

    proptest! {
        #[test]
        fn append_unique_never_duplicates(names in prop::collection::vec("[a-d]", 0..30)) {
            let mut table = Table::new();
            for name in &names {
                table.append_unique("k", name).unwrap();
            }
            let list = table.list_range("k", 0, -1).unwrap();
            let mut deduped = list.clone();
            deduped.sort();
            deduped.dedup();
            prop_assert_eq!(deduped.len(), list.len());
            for name in &names {
                prop_assert!(list.contains(name));
            }
        }

        #[test]
        fn full_range_matches_length(count in 0usize..20, start in -25i64..25, end in -25i64..25) {
            let mut table = Table::new();
            for i in 0..count {
                table.append_to_list("k", &i.to_string()).unwrap();
            }
            let full = table.list_range("k", 0, -1).unwrap();
            prop_assert_eq!(full.len() as u64, table.list_length("k").unwrap());
            prop_assert!(table.list_range("k", start, end).unwrap().len() <= count);
        }
    }
}
