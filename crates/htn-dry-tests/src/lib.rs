// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for the HTN crates.
#![forbid(unsafe_code)]
//!
//! # Modules
//!
//! - [`config`] - In-memory config store fake for testing without filesystem
//! - [`fixtures`] - Synthetic planning domains (lights, ladder, looping)

pub mod config;
pub mod fixtures;

pub use config::InMemoryConfigStore;
pub use fixtures::{
    flaky_lights_domain, ladder_cost, ladder_domain, ladder_heuristic, lights_domain,
    lights_state, looping_domain,
};
