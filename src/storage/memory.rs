//! In-memory backend for tests and throwaway sessions.

use std::collections::BTreeMap;

use crate::errors::Result;
use crate::storage::KvStore;

#[derive(Debug, Default, Clone)]
pub struct MemoryKv {
    entries: BTreeMap<String, String>,
    writes: usize,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `put` calls so far.
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KvStore for MemoryKv {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_put_get_remove() {
        let mut kv = MemoryKv::new();
        assert!(kv.is_empty());
        kv.put("visitors", "[]").unwrap();
        kv.put("visitors", "[1]").unwrap();
        assert_eq!(kv.get("visitors").unwrap().as_deref(), Some("[1]"));
        assert_eq!(kv.len(), 1);
        assert_eq!(kv.writes(), 2);

        kv.remove("visitors").unwrap();
        kv.remove("visitors").unwrap();
        assert_eq!(kv.get("visitors").unwrap(), None);
    }
}
