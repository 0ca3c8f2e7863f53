// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Preferences port used by planner front-ends.

use crate::config::{ConfigError, ConfigService, ConfigStore};
use crate::prefs::{PlannerPrefs, PLANNER_PREFS_KEY};

/// Loads and saves [`PlannerPrefs`] without exposing the storage backend.
pub trait PrefsPort {
    /// Stored preferences, or defaults when none were saved.
    fn load_prefs(&self) -> Result<PlannerPrefs, ConfigError>;
    /// Persists `prefs`.
    fn save_prefs(&self, prefs: &PlannerPrefs) -> Result<(), ConfigError>;
}

impl<S: ConfigStore> PrefsPort for ConfigService<S> {
    fn load_prefs(&self) -> Result<PlannerPrefs, ConfigError> {
        self.load_or_default(PLANNER_PREFS_KEY)
    }

    fn save_prefs(&self, prefs: &PlannerPrefs) -> Result<(), ConfigError> {
        self.save(PLANNER_PREFS_KEY, prefs)
    }
}
