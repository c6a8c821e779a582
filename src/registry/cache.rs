use crate::core::Result;
use once_cell::sync::OnceCell;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Write-once-per-key cache keyed by type identity.
///
/// Each key owns a `OnceCell`, so concurrent first users of one key run the
/// initializer once while other keys proceed independently. The map lock is
/// never held while an initializer runs. A failed initializer leaves the
/// cell empty.
pub(crate) struct TypeCache<V> {
    entries: RwLock<HashMap<TypeId, Arc<OnceCell<V>>>>,
}

impl<V: Clone> TypeCache<V> {
    pub(crate) fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub(crate) fn get(&self, key: TypeId) -> Result<Option<V>> {
        let entries = self.entries.read()?;
        Ok(entries.get(&key).and_then(|cell| cell.get().cloned()))
    }

    pub(crate) fn get_or_try_init<F>(&self, key: TypeId, init: F) -> Result<V>
    where
        F: FnOnce() -> Result<V>,
    {
        if let Some(value) = self.get(key)? {
            return Ok(value);
        }

        let cell = {
            let mut entries = self.entries.write()?;
            entries
                .entry(key)
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        cell.get_or_try_init(init).cloned()
    }

    /// Number of published entries.
    pub(crate) fn len(&self) -> Result<usize> {
        let entries = self.entries.read()?;
        Ok(entries.values().filter(|cell| cell.get().is_some()).count())
    }
}
