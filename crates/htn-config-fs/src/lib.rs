// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Filesystem-backed `ConfigStore` for planner tools (uses platform config dir).

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use htn_app_core::config::{ConfigError, ConfigStore};

/// Stores each config key as `<key>.json` under one directory.
#[derive(Debug, Clone)]
pub struct FsConfigStore {
    base: PathBuf,
}

impl FsConfigStore {
    /// Store rooted at the user config directory (e.g. `~/.config/htn-planner`).
    pub fn new() -> Result<Self, ConfigError> {
        let dirs = ProjectDirs::from("dev", "flyingrobots", "htn-planner")
            .ok_or_else(|| ConfigError::Other("could not resolve config dir".into()))?;
        Self::at(dirs.config_dir())
    }

    /// Store rooted at `base`, created if missing.
    pub fn at(base: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let base = base.as_ref().to_path_buf();
        fs::create_dir_all(&base)?;
        Ok(Self { base })
    }

    /// Directory holding the config files.
    pub fn base(&self) -> &Path {
        &self.base
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, ConfigError> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(ConfigError::Other(format!("invalid config key: {key:?}")));
        }
        Ok(self.base.join(format!("{key}.json")))
    }
}

impl ConfigStore for FsConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        match fs::read(self.path_for(key)?) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(ConfigError::NotFound(key.to_owned()))
            }
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.base)?;
        fs::write(path, data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use htn_app_core::{ConfigService, PlannerPrefs, PrefsPort, Strategy};

    #[test]
    fn writes_one_json_file_per_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsConfigStore::at(dir.path()).unwrap();
        store.save_raw("planner", b"{}").unwrap();
        assert!(dir.path().join("planner.json").is_file());
        assert_eq!(store.load_raw("planner").unwrap(), b"{}");
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsConfigStore::at(dir.path().join("nested")).unwrap();
        assert!(matches!(store.load_raw("planner"), Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn path_like_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsConfigStore::at(dir.path()).unwrap();
        assert!(matches!(store.save_raw("../escape", b"x"), Err(ConfigError::Other(_))));
        assert!(matches!(store.load_raw(""), Err(ConfigError::Other(_))));
    }

    #[test]
    fn prefs_survive_a_new_store() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = PlannerPrefs {
            strategy: Strategy::Gbfs,
            seed: 42,
            ..PlannerPrefs::default()
        };
        ConfigService::new(FsConfigStore::at(dir.path()).unwrap())
            .save_prefs(&prefs)
            .unwrap();
        let reloaded = ConfigService::new(FsConfigStore::at(dir.path()).unwrap())
            .load_prefs()
            .unwrap();
        assert_eq!(reloaded, prefs);
    }
}
