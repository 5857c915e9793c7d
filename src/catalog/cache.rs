//! Key to value caches joining host metadata onto videos.

use std::collections::HashMap;

/// Resource-id keyed store. One instance per metadata kind per assembly;
/// entries are written once from the batch load, then read during the
/// merge. No eviction and no size bound, the working set is one query's
/// result.
#[derive(Debug)]
pub struct MetadataCache<T> {
    entries: HashMap<String, T>,
}

impl<T> MetadataCache<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Insert or overwrite the entry for `key`.
    pub fn set(&mut self, key: &str, value: T) {
        self.entries.insert(key.to_string(), value);
    }

    /// Absent keys yield `None`, never a failure.
    pub fn get(&self, key: &str) -> Option<&T> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for MetadataCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
