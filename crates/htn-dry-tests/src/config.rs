// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory config store fake for testing without filesystem I/O.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use htn_app_core::config::{ConfigError, ConfigStore};

/// In-memory [`ConfigStore`] that records how it was used.
///
/// Clones share the same backing map, so a test can hand one clone to a
/// `ConfigService` and inspect the other.
///
/// # Example
///
/// ```
/// use htn_app_core::{ConfigService, PlannerPrefs, PrefsPort};
/// use htn_dry_tests::InMemoryConfigStore;
///
/// let store = InMemoryConfigStore::new();
/// let service = ConfigService::new(store.clone());
/// service.save_prefs(&PlannerPrefs::default()).unwrap();
/// assert_eq!(store.save_count(), 1);
/// assert!(store.contains_key("planner"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryConfigStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    data: BTreeMap<String, Vec<u8>>,
    loads: usize,
    saves: usize,
    fail_loads: bool,
    fail_saves: bool,
}

impl InMemoryConfigStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with one blob.
    pub fn with_entry(key: &str, data: impl Into<Vec<u8>>) -> Self {
        let store = Self::new();
        store.lock().data.insert(key.to_owned(), data.into());
        store
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Makes every subsequent `load_raw` fail with [`ConfigError::Other`].
    pub fn set_fail_on_load(&self, fail: bool) {
        self.lock().fail_loads = fail;
    }

    /// Makes every subsequent `save_raw` fail with [`ConfigError::Other`].
    pub fn set_fail_on_save(&self, fail: bool) {
        self.lock().fail_saves = fail;
    }

    /// `load_raw` calls attempted so far, failed ones included.
    pub fn load_count(&self) -> usize {
        self.lock().loads
    }

    /// `save_raw` calls attempted so far, failed ones included.
    pub fn save_count(&self) -> usize {
        self.lock().saves
    }

    /// Stored keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        self.lock().data.keys().cloned().collect()
    }

    /// True if a blob is stored under `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.lock().data.contains_key(key)
    }

    /// Raw blob under `key`, decoded as UTF-8 for assertions.
    pub fn text(&self, key: &str) -> Option<String> {
        self.lock()
            .data
            .get(key)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Clears data, counters, and failure flags.
    pub fn reset(&self) {
        *self.lock() = Inner::default();
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        let mut inner = self.lock();
        inner.loads += 1;
        if inner.fail_loads {
            return Err(ConfigError::Other("simulated load failure".into()));
        }
        inner
            .data
            .get(key)
            .cloned()
            .ok_or_else(|| ConfigError::NotFound(key.to_owned()))
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let mut inner = self.lock();
        inner.saves += 1;
        if inner.fail_saves {
            return Err(ConfigError::Other("simulated save failure".into()));
        }
        inner.data.insert(key.to_owned(), data.to_vec());
        Ok(())
    }
}
