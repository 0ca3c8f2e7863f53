// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use htn_app_core::prefs::PLANNER_PREFS_KEY;
use htn_app_core::{ConfigError, ConfigService, LogLevel, PlannerPrefs, PrefsPort, Strategy};
use htn_dry_tests::InMemoryConfigStore;

#[test]
fn missing_prefs_load_as_defaults() {
    let store = InMemoryConfigStore::new();
    let service = ConfigService::new(store.clone());
    assert_eq!(service.load_prefs().unwrap(), PlannerPrefs::default());
    assert_eq!(store.load_count(), 1);
}

#[test]
fn saved_prefs_are_pretty_json_under_planner_key() {
    let store = InMemoryConfigStore::new();
    let service = ConfigService::new(store.clone());
    let prefs = PlannerPrefs {
        strategy: Strategy::Astar,
        log_level: LogLevel::Debug,
        node_budget: Some(5_000),
        ..PlannerPrefs::default()
    };
    service.save_prefs(&prefs).unwrap();

    let text = store.text(PLANNER_PREFS_KEY).unwrap();
    assert!(text.contains("\"strategy\": \"astar\""));
    assert!(text.contains("\"log_level\": \"debug\""));
    assert_eq!(service.load_prefs().unwrap(), prefs);
}

#[test]
fn empty_blob_counts_as_missing() {
    let service = ConfigService::new(InMemoryConfigStore::with_entry(PLANNER_PREFS_KEY, ""));
    assert_eq!(service.load_prefs().unwrap(), PlannerPrefs::default());
}

#[test]
fn corrupt_prefs_surface_serde_errors() {
    let service = ConfigService::new(InMemoryConfigStore::with_entry(
        PLANNER_PREFS_KEY,
        r#"{"strategy": "sideways"}"#,
    ));
    assert!(matches!(service.load_prefs(), Err(ConfigError::Serde(_))));
}

#[test]
fn store_failures_propagate() {
    let store = InMemoryConfigStore::new();
    let service = ConfigService::new(store.clone());
    store.set_fail_on_save(true);
    assert!(matches!(
        service.save_prefs(&PlannerPrefs::default()),
        Err(ConfigError::Other(_))
    ));
    store.set_fail_on_load(true);
    assert!(service.load_prefs().is_err());
    assert_eq!(store.save_count(), 1);
}
