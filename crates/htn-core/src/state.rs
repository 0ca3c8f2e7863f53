// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! World state: named relations plus opaque auxiliary data.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::multigoal::Multigoal;
use crate::value::Value;

/// One relation: entity id → value, iterated in key order.
pub type Relation = BTreeMap<Value, Value>;

type Aux = Arc<dyn Any + Send + Sync>;

/// A planning state.
///
/// Relation maps are owned by the state, so cloning a state deep-copies every
/// relation while auxiliary fields (rigid data attached by a domain) are
/// shared. The planner clones before each mutation performed on a branch that
/// may be abandoned; sibling branches never alias relation maps.
#[derive(Clone, Default)]
pub struct State {
    name: String,
    relations: BTreeMap<String, Relation>,
    aux: BTreeMap<String, Aux>,
}

impl State {
    /// Creates an empty state.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Name used in logs and displays.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Copies the state under a new name (deep relations, shared aux).
    pub fn copy(&self, name: impl Into<String>) -> Self {
        let mut copy = self.clone();
        copy.name = name.into();
        copy
    }

    /// Builder: inserts every `(key, value)` pair into `relation`.
    pub fn with_relation<I, K, V>(mut self, relation: &str, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Value>,
        V: Into<Value>,
    {
        let rel = self.relations.entry(relation.to_owned()).or_default();
        for (k, v) in entries {
            rel.insert(k.into(), v.into());
        }
        self
    }

    /// Builder: attaches an auxiliary field.
    pub fn with_aux<T: Any + Send + Sync>(mut self, name: &str, value: T) -> Self {
        self.set_aux(name, value);
        self
    }

    /// Sets `relation[key] = value`, returning the previous value.
    pub fn set(
        &mut self,
        relation: &str,
        key: impl Into<Value>,
        value: impl Into<Value>,
    ) -> Option<Value> {
        self.relations
            .entry(relation.to_owned())
            .or_default()
            .insert(key.into(), value.into())
    }

    /// Removes `relation[key]`, returning the old value.
    pub fn remove(&mut self, relation: &str, key: impl Into<Value>) -> Option<Value> {
        self.relations.get_mut(relation)?.remove(&key.into())
    }

    /// Reads `relation[key]`.
    pub fn get(&self, relation: &str, key: impl Into<Value>) -> Option<&Value> {
        self.relations.get(relation)?.get(&key.into())
    }

    /// Full relation map, if the relation exists.
    pub fn relation(&self, relation: &str) -> Option<&Relation> {
        self.relations.get(relation)
    }

    /// All relations in name order.
    pub fn relations(&self) -> impl Iterator<Item = (&str, &Relation)> {
        self.relations.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Attaches an opaque auxiliary field. The planner never reads these.
    pub fn set_aux<T: Any + Send + Sync>(&mut self, name: &str, value: T) {
        self.aux.insert(name.to_owned(), Arc::new(value));
    }

    /// Downcasts an auxiliary field.
    pub fn aux<T: Any + Send + Sync>(&self, name: &str) -> Option<&T> {
        self.aux.get(name)?.downcast_ref::<T>()
    }

    /// True when `relation[key] == value`.
    pub fn holds(&self, relation: &str, key: &Value, value: &Value) -> bool {
        self.relations
            .get(relation)
            .and_then(|rel| rel.get(key))
            .is_some_and(|current| current == value)
    }

    /// True when every `(relation, key)` constrained by `goal` has the desired value.
    pub fn satisfies(&self, goal: &Multigoal) -> bool {
        goal.goals().all(|(rel, key, value)| self.holds(rel, key, value))
    }
}

impl PartialEq for State {
    /// Compares relation contents only; names and auxiliary fields are ignored.
    fn eq(&self, other: &Self) -> bool {
        self.relations == other.relations
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("name", &self.name)
            .field("relations", &self.relations)
            .field("aux", &self.aux.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.relations.is_empty() {
            return write!(f, "{} has no relations", self.name);
        }
        for (i, (name, rel)) in self.relations.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write_relation(f, &self.name, name, rel)?;
        }
        Ok(())
    }
}

pub(crate) fn write_relation(
    f: &mut fmt::Formatter<'_>,
    owner: &str,
    name: &str,
    rel: &Relation,
) -> fmt::Result {
    write!(f, "  - {owner}.{name} = {{")?;
    for (i, (k, v)) in rel.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{k}: {v}")?;
    }
    f.write_str("}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocks() -> State {
        State::new("s")
            .with_relation("pos", [("a", "b"), ("b", "table")])
            .with_relation("clear", [("a", true), ("b", false)])
    }

    #[test]
    fn copy_does_not_alias_relations() {
        let original = blocks();
        let mut branch = original.copy("branch");
        branch.set("pos", "a", "table");
        assert!(original.holds("pos", &"a".into(), &"b".into()));
        assert!(branch.holds("pos", &"a".into(), &"table".into()));
        assert_eq!(branch.name(), "branch");
    }

    #[test]
    fn copy_shares_aux_fields() {
        let original = blocks().with_aux("rigid", vec![1_u8, 2, 3]);
        let branch = original.copy("branch");
        let a = original.aux::<Vec<u8>>("rigid").map(std::ptr::from_ref);
        let b = branch.aux::<Vec<u8>>("rigid").map(std::ptr::from_ref);
        assert!(a.is_some());
        assert_eq!(a, b);
    }

    #[test]
    fn equality_ignores_name_and_aux() {
        let a = blocks();
        let b = blocks().copy("other").with_aux("x", 1_i32);
        assert_eq!(a, b);
    }

    #[test]
    fn satisfies_checks_only_constrained_entries() {
        let state = blocks();
        let goal = Multigoal::new("g").with_goal("pos", "a", "b");
        assert!(state.satisfies(&goal));
        let goal = goal.with_goal("clear", "b", true);
        assert!(!state.satisfies(&goal));
        assert!(state.satisfies(&Multigoal::new("empty")));
    }

    #[test]
    fn missing_relation_never_holds() {
        let state = blocks();
        assert!(!state.holds("holding", &"hand".into(), &false.into()));
        assert_eq!(state.get("holding", "hand"), None);
    }
}
