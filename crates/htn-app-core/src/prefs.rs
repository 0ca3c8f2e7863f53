// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Persisted planner preferences.

use std::fmt;
use std::str::FromStr;

use htn_core::{PlannerConfig, SearchMode, DEFAULT_MAX_DEPTH};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Config key under which [`PlannerPrefs`] are stored.
pub const PLANNER_PREFS_KEY: &str = "planner";

/// Default number of planning attempts for lazy lookahead.
pub const DEFAULT_MAX_REPLANS: usize = 10;

/// Which planner a tool runs by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Backtracking depth-first decomposition.
    #[default]
    Dfs,
    /// Greedy best-first search.
    Gbfs,
    /// A* search.
    Astar,
}

impl Strategy {
    /// Heuristic search mode, or `None` for depth-first.
    pub fn search_mode(self) -> Option<SearchMode> {
        match self {
            Self::Dfs => None,
            Self::Gbfs => Some(SearchMode::Greedy),
            Self::Astar => Some(SearchMode::AStar),
        }
    }
}

/// Verbosity of planner logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Errors only.
    Error,
    /// Deviations and exhausted budgets.
    #[default]
    Warn,
    /// Problems and results.
    Info,
    /// Every decomposition step.
    Debug,
    /// Method choices and backtracking.
    Trace,
}

impl LogLevel {
    /// Level `n` steps more verbose than `self`, saturating at [`LogLevel::Trace`].
    pub fn raised_by(self, n: u8) -> Self {
        const ORDER: [LogLevel; 5] = [
            LogLevel::Error,
            LogLevel::Warn,
            LogLevel::Info,
            LogLevel::Debug,
            LogLevel::Trace,
        ];
        let at = ORDER.iter().position(|l| *l == self).unwrap_or(1);
        ORDER[(at + usize::from(n)).min(ORDER.len() - 1)]
    }
}

/// Unrecognised strategy or level name.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {what}: {name}")]
pub struct ParseError {
    what: &'static str,
    name: String,
}

macro_rules! lowercase_names {
    ($ty:ty, $what:literal, { $($variant:path => $name:literal),+ $(,)? }) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(match self { $($variant => $name),+ })
            }
        }

        impl FromStr for $ty {
            type Err = ParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_ascii_lowercase().as_str() {
                    $($name => Ok($variant),)+
                    _ => Err(ParseError { what: $what, name: s.to_owned() }),
                }
            }
        }
    };
}

lowercase_names!(Strategy, "strategy", {
    Strategy::Dfs => "dfs",
    Strategy::Gbfs => "gbfs",
    Strategy::Astar => "astar",
});

lowercase_names!(LogLevel, "log level", {
    LogLevel::Error => "error",
    LogLevel::Warn => "warn",
    LogLevel::Info => "info",
    LogLevel::Debug => "debug",
    LogLevel::Trace => "trace",
});

/// Saved defaults for planner tools. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerPrefs {
    /// Planner used by `plan` when none is given.
    pub strategy: Strategy,
    /// Recursion limit; `None` disables it.
    pub max_depth: Option<usize>,
    /// Expansion budget; `None` means unbounded.
    pub node_budget: Option<usize>,
    /// Planning attempts allowed in lazy lookahead.
    pub max_replans: usize,
    /// Base log verbosity.
    pub log_level: LogLevel,
    /// Seed for domains with randomised commands or generators.
    pub seed: u64,
}

impl Default for PlannerPrefs {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            max_depth: Some(DEFAULT_MAX_DEPTH),
            node_budget: None,
            max_replans: DEFAULT_MAX_REPLANS,
            log_level: LogLevel::default(),
            seed: 0,
        }
    }
}

impl PlannerPrefs {
    /// Search bounds for [`htn_core::Planner::with_config`].
    pub fn planner_config(&self) -> PlannerConfig {
        PlannerConfig {
            max_depth: self.max_depth,
            node_budget: self.node_budget,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let prefs: PlannerPrefs =
            serde_json::from_str(r#"{"strategy":"astar","seed":7}"#).unwrap();
        assert_eq!(prefs.strategy, Strategy::Astar);
        assert_eq!(prefs.seed, 7);
        assert_eq!(prefs.max_replans, DEFAULT_MAX_REPLANS);
        assert_eq!(prefs.max_depth, Some(DEFAULT_MAX_DEPTH));
    }

    #[test]
    fn planner_config_carries_bounds() {
        let prefs = PlannerPrefs {
            max_depth: None,
            node_budget: Some(50),
            ..PlannerPrefs::default()
        };
        assert_eq!(
            prefs.planner_config(),
            PlannerConfig {
                max_depth: None,
                node_budget: Some(50)
            }
        );
    }

    #[test]
    fn names_parse_case_insensitively() {
        assert_eq!("AStar".parse::<Strategy>(), Ok(Strategy::Astar));
        assert_eq!(Strategy::Gbfs.to_string(), "gbfs");
        assert!("bfs".parse::<Strategy>().is_err());
        assert_eq!("debug".parse::<LogLevel>(), Ok(LogLevel::Debug));
    }

    #[test]
    fn log_level_raise_saturates() {
        assert_eq!(LogLevel::Warn.raised_by(0), LogLevel::Warn);
        assert_eq!(LogLevel::Warn.raised_by(2), LogLevel::Debug);
        assert_eq!(LogLevel::Info.raised_by(9), LogLevel::Trace);
    }

    #[test]
    fn strategy_maps_to_search_mode() {
        assert_eq!(Strategy::Dfs.search_mode(), None);
        assert_eq!(Strategy::Astar.search_mode(), Some(SearchMode::AStar));
    }
}
