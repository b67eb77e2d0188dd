//! Compute-once slots scoped to a single revision group.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::content::Content;
use crate::error::StoreError;
use crate::source::ContentClass;

/// A value computed at most once, even under concurrent callers.
///
/// A failed initialisation leaves the slot empty so a later caller retries.
#[derive(Debug)]
pub(crate) struct OnceSlot<T> {
    value: Mutex<Option<T>>,
}

impl<T> Default for OnceSlot<T> {
    fn default() -> Self {
        Self { value: Mutex::new(None) }
    }
}

impl<T: Clone> OnceSlot<T> {
    pub(crate) fn get_or_try_init<F>(&self, init: F) -> Result<T, StoreError>
    where
        F: FnOnce() -> Result<T, StoreError>,
    {
        let mut value = self.value.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(v) = value.as_ref() {
            return Ok(v.clone());
        }
        let v = init()?;
        *value = Some(v.clone());
        Ok(v)
    }
}

/// Loaded content of one revision, keyed by content class.
///
/// `None` entries record files missing from the tree so the lookup is not
/// repeated for later comments on the same path.
#[derive(Debug, Default)]
pub(crate) struct ContentCache {
    slots: Mutex<HashMap<ContentClass, Arc<OnceSlot<Option<Arc<Content>>>>>>,
}

impl ContentCache {
    pub(crate) fn get_or_load<F>(
        &self,
        class: &ContentClass,
        load: F,
    ) -> Result<Option<Arc<Content>>, StoreError>
    where
        F: FnOnce() -> Result<Option<Content>, StoreError>,
    {
        // The map lock is released before loading so distinct classes load
        // independently; the per-class slot serialises loads of one class.
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(class.clone()).or_default())
        };
        slot.get_or_try_init(|| Ok(load()?.map(Arc::new)))
    }
}
