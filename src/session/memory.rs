use super::{SessionStore, StoreError};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// In-process store. State is lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn update(&self, set: &[(&str, &str)], remove: &[&str]) -> Result<(), StoreError> {
        let mut guard = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        for (key, value) in set {
            guard.insert((*key).to_string(), (*value).to_string());
        }
        for key in remove {
            guard.remove(*key);
        }
        Ok(())
    }
}
