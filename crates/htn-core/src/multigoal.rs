// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Conjunctive partial goals over state relations.

use std::collections::BTreeMap;
use std::fmt;

use crate::state::{write_relation, Relation, State};
use crate::todo::Goal;
use crate::value::Value;

/// Desired values for some `(relation, key)` pairs; everything else is
/// unconstrained.
///
/// Once a multigoal is placed in a todo list it is shared behind an `Arc` and
/// never mutated; methods only read it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Multigoal {
    name: String,
    goals: BTreeMap<String, Relation>,
}

impl Multigoal {
    /// Creates an empty multigoal.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            goals: BTreeMap::new(),
        }
    }

    /// Name used in logs and displays.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Builder: requires `relation[key] == value`.
    pub fn with_goal(
        mut self,
        relation: &str,
        key: impl Into<Value>,
        value: impl Into<Value>,
    ) -> Self {
        self.set(relation, key, value);
        self
    }

    /// Builder: requires every pair in `entries` for `relation`.
    pub fn with_relation<I, K, V>(mut self, relation: &str, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Value>,
        V: Into<Value>,
    {
        for (k, v) in entries {
            self.set(relation, k, v);
        }
        self
    }

    /// Requires `relation[key] == value`.
    pub fn set(&mut self, relation: &str, key: impl Into<Value>, value: impl Into<Value>) {
        self.goals
            .entry(relation.to_owned())
            .or_default()
            .insert(key.into(), value.into());
    }

    /// Desired value for `relation[key]`, if constrained.
    pub fn get(&self, relation: &str, key: impl Into<Value>) -> Option<&Value> {
        self.goals.get(relation)?.get(&key.into())
    }

    /// Desired values for one relation.
    pub fn relation(&self, relation: &str) -> Option<&Relation> {
        self.goals.get(relation)
    }

    /// Every `(relation, key, value)` constraint in deterministic order.
    pub fn goals(&self) -> impl Iterator<Item = (&str, &Value, &Value)> {
        self.goals
            .iter()
            .flat_map(|(rel, entries)| entries.iter().map(move |(k, v)| (rel.as_str(), k, v)))
    }

    /// True when the multigoal constrains nothing.
    pub fn is_empty(&self) -> bool {
        self.goals.values().all(BTreeMap::is_empty)
    }

    /// Constraints not yet true in `state`, in deterministic order.
    pub fn unsatisfied(&self, state: &State) -> Vec<Goal> {
        self.goals()
            .filter(|(rel, key, value)| !state.holds(rel, key, value))
            .map(|(rel, key, value)| Goal::new(rel, key.clone(), value.clone()))
            .collect()
    }
}

impl fmt::Display for Multigoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "{} has no goals", self.name);
        }
        for (i, (name, rel)) in self.goals.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write_relation(f, &self.name, name, rel)?;
        }
        Ok(())
    }
}
