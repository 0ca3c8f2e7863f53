// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Planning domains: actions, commands, and decomposition methods.
//!
//! A [`Domain`] is an owned table of callables keyed by name. Method lists are
//! append-only and keep declaration order, which is the only tie-break the
//! planners use. [`DomainRegistry`] holds several domains and tracks which one
//! is current; planners never consult it implicitly and always receive a
//! `&Domain`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::DomainError;
use crate::multigoal::Multigoal;
use crate::state::State;
use crate::todo::Todo;
use crate::value::Value;

/// Result of invoking an action, command, or method.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Precondition failed or method not applicable.
    Failure,
    /// Method succeeded with these subtasks (possibly none).
    Decomposed(Vec<Todo>),
    /// Action or command succeeded, producing this state.
    Applied(State),
}

impl Outcome {
    /// `Applied(state)` when `Some`, otherwise `Failure`.
    pub fn applied_if(state: Option<State>) -> Self {
        state.map_or(Self::Failure, Self::Applied)
    }
}

/// Action and command body: receives an owned copy of the state.
pub type ActionFn = dyn Fn(State, &[Value]) -> Outcome + Send + Sync;

/// Task method body: reads the state and the task arguments.
pub type TaskMethodFn = dyn Fn(&State, &[Value]) -> Outcome + Send + Sync;

/// Goal method body: reads the state, the entity key, and the desired value.
pub type GoalMethodFn = dyn Fn(&State, &Value, &Value) -> Outcome + Send + Sync;

/// Multigoal method body: reads the state and the (shared, immutable) multigoal.
pub type MultigoalMethodFn = dyn Fn(&State, &Arc<Multigoal>) -> Outcome + Send + Sync;

/// A primitive state transition with a fixed arity.
#[derive(Clone)]
pub struct Action {
    name: String,
    arity: usize,
    run: Arc<ActionFn>,
}

/// Execution-time counterpart of an action, keyed by the action's name.
///
/// Commands follow the action calling convention but may fail or behave
/// differently from the idealised model the planner uses.
pub type Command = Action;

impl Action {
    /// Wraps `run` as an action called `name` taking `arity` arguments.
    pub fn new<F>(name: impl Into<String>, arity: usize, run: F) -> Self
    where
        F: Fn(State, &[Value]) -> Outcome + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            arity,
            run: Arc::new(run),
        }
    }

    /// Action name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared argument count.
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Invokes the body. Callers are responsible for the arity check.
    pub fn apply(&self, state: State, args: &[Value]) -> Outcome {
        (self.run)(state, args)
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// One way to decompose a task.
#[derive(Clone)]
pub struct TaskMethod {
    name: String,
    arity: usize,
    run: Arc<TaskMethodFn>,
}

impl TaskMethod {
    /// Wraps `run` as a method called `name` for tasks taking `arity` arguments.
    pub fn new<F>(name: impl Into<String>, arity: usize, run: F) -> Self
    where
        F: Fn(&State, &[Value]) -> Outcome + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            arity,
            run: Arc::new(run),
        }
    }

    /// Method name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared argument count.
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Invokes the body.
    pub fn apply(&self, state: &State, args: &[Value]) -> Outcome {
        (self.run)(state, args)
    }
}

impl fmt::Debug for TaskMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskMethod")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// One way to achieve `relation[key] == value` for a given relation.
#[derive(Clone)]
pub struct GoalMethod {
    name: String,
    run: Arc<GoalMethodFn>,
}

impl GoalMethod {
    /// Wraps `run` as a goal method called `name`.
    pub fn new<F>(name: impl Into<String>, run: F) -> Self
    where
        F: Fn(&State, &Value, &Value) -> Outcome + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            run: Arc::new(run),
        }
    }

    /// Method name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invokes the body.
    pub fn apply(&self, state: &State, key: &Value, value: &Value) -> Outcome {
        (self.run)(state, key, value)
    }
}

impl fmt::Debug for GoalMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoalMethod")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// One way to achieve a multigoal.
#[derive(Clone)]
pub struct MultigoalMethod {
    name: String,
    run: Arc<MultigoalMethodFn>,
}

impl MultigoalMethod {
    /// Wraps `run` as a multigoal method called `name`.
    pub fn new<F>(name: impl Into<String>, run: F) -> Self
    where
        F: Fn(&State, &Arc<Multigoal>) -> Outcome + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            run: Arc::new(run),
        }
    }

    /// Method name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invokes the body.
    pub fn apply(&self, state: &State, goal: &Arc<Multigoal>) -> Outcome {
        (self.run)(state, goal)
    }
}

impl fmt::Debug for MultigoalMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultigoalMethod")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Actions, commands, and methods of one planning domain.
#[derive(Debug, Clone, Default)]
pub struct Domain {
    name: String,
    actions: BTreeMap<String, Action>,
    commands: BTreeMap<String, Command>,
    task_methods: BTreeMap<String, Vec<TaskMethod>>,
    goal_methods: BTreeMap<String, Vec<GoalMethod>>,
    multigoal_methods: Vec<MultigoalMethod>,
}

impl Domain {
    /// Creates an empty domain.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Domain name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declares primitive actions.
    ///
    /// # Errors
    /// [`DomainError::DuplicateAction`] if a name is already declared; actions
    /// declared before the duplicate in the same call are kept.
    pub fn declare_actions(
        &mut self,
        actions: impl IntoIterator<Item = Action>,
    ) -> Result<(), DomainError> {
        for action in actions {
            if self.actions.contains_key(action.name()) {
                return Err(DomainError::DuplicateAction(action.name));
            }
            self.actions.insert(action.name.clone(), action);
        }
        Ok(())
    }

    /// Declares execution-time commands; each is keyed by the action name it
    /// stands in for.
    ///
    /// # Errors
    /// [`DomainError::DuplicateCommand`] if a command for that name exists.
    pub fn declare_commands(
        &mut self,
        commands: impl IntoIterator<Item = Command>,
    ) -> Result<(), DomainError> {
        for command in commands {
            if self.commands.contains_key(command.name()) {
                return Err(DomainError::DuplicateCommand(command.name));
            }
            self.commands.insert(command.name.clone(), command);
        }
        Ok(())
    }

    /// Appends methods for `task`, after any declared earlier.
    pub fn declare_task_methods(
        &mut self,
        task: impl Into<String>,
        methods: impl IntoIterator<Item = TaskMethod>,
    ) {
        self.task_methods
            .entry(task.into())
            .or_default()
            .extend(methods);
    }

    /// Appends goal methods for `relation`, after any declared earlier.
    pub fn declare_goal_methods(
        &mut self,
        relation: impl Into<String>,
        methods: impl IntoIterator<Item = GoalMethod>,
    ) {
        self.goal_methods
            .entry(relation.into())
            .or_default()
            .extend(methods);
    }

    /// Appends multigoal methods, after any declared earlier.
    pub fn declare_multigoal_methods(&mut self, methods: impl IntoIterator<Item = MultigoalMethod>) {
        self.multigoal_methods.extend(methods);
    }

    /// Clears every table, keeping the name.
    pub fn reset(&mut self) {
        *self = Self::new(std::mem::take(&mut self.name));
    }

    /// Looks up an action.
    pub fn action(&self, name: &str) -> Option<&Action> {
        self.actions.get(name)
    }

    /// Looks up the command for an action name.
    pub fn command(&self, name: &str) -> Option<&Command> {
        self.commands.get(name)
    }

    /// Methods for `task`, in declaration order.
    pub fn task_methods(&self, task: &str) -> Option<&[TaskMethod]> {
        self.task_methods.get(task).map(Vec::as_slice)
    }

    /// Goal methods for `relation`, in declaration order.
    pub fn goal_methods(&self, relation: &str) -> Option<&[GoalMethod]> {
        self.goal_methods.get(relation).map(Vec::as_slice)
    }

    /// Multigoal methods, in declaration order.
    pub fn multigoal_methods(&self) -> &[MultigoalMethod] {
        &self.multigoal_methods
    }

    /// Printable overview of everything declared.
    pub fn summary(&self) -> DomainSummary {
        let names = |methods: &[TaskMethod]| methods.iter().map(|m| m.name.clone()).collect();
        DomainSummary {
            name: self.name.clone(),
            actions: self
                .actions
                .values()
                .map(|a| format!("{}/{}", a.name, a.arity))
                .collect(),
            commands: self.commands.keys().cloned().collect(),
            task_methods: self
                .task_methods
                .iter()
                .map(|(task, methods)| (task.clone(), names(methods)))
                .collect(),
            goal_methods: self
                .goal_methods
                .iter()
                .map(|(rel, methods)| {
                    (rel.clone(), methods.iter().map(|m| m.name.clone()).collect())
                })
                .collect(),
            multigoal_methods: self
                .multigoal_methods
                .iter()
                .map(|m| m.name.clone())
                .collect(),
        }
    }
}

/// Names of everything a domain declares, for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainSummary {
    /// Domain name.
    pub name: String,
    /// `name/arity` for each action.
    pub actions: Vec<String>,
    /// Action names that have commands.
    pub commands: Vec<String>,
    /// Task → method names in declaration order.
    pub task_methods: Vec<(String, Vec<String>)>,
    /// Relation → goal method names in declaration order.
    pub goal_methods: Vec<(String, Vec<String>)>,
    /// Multigoal method names in declaration order.
    pub multigoal_methods: Vec<String>,
}

impl fmt::Display for DomainSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn line(f: &mut fmt::Formatter<'_>, label: &str, items: &[String]) -> fmt::Result {
            if items.is_empty() {
                writeln!(f, "-- {label}: none")
            } else {
                writeln!(f, "-- {label}: {}", items.join(", "))
            }
        }
        writeln!(f, "Domain name: {}", self.name)?;
        line(f, "Actions", &self.actions)?;
        line(f, "Commands", &self.commands)?;
        if self.task_methods.is_empty() {
            writeln!(f, "-- There are no task methods")?;
        } else {
            writeln!(f, "-- Task methods:")?;
            for (task, methods) in &self.task_methods {
                writeln!(f, "   {task}: {}", methods.join(", "))?;
            }
        }
        if self.goal_methods.is_empty() {
            writeln!(f, "-- There are no goal methods")?;
        } else {
            writeln!(f, "-- Goal methods:")?;
            for (rel, methods) in &self.goal_methods {
                writeln!(f, "   {rel}: {}", methods.join(", "))?;
            }
        }
        line(f, "Multigoal methods", &self.multigoal_methods)
    }
}

/// A set of named domains, one of which is current.
///
/// Creating a domain makes it current. Domains are replaced, never dropped
/// individually.
#[derive(Debug, Default)]
pub struct DomainRegistry {
    domains: BTreeMap<String, Domain>,
    current: Option<String>,
}

impl DomainRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty domain called `name` (superseding any previous one)
    /// and makes it current.
    pub fn create_domain(&mut self, name: &str) -> &mut Domain {
        self.insert(Domain::new(name))
    }

    /// Registers a prebuilt domain (superseding any with the same name) and
    /// makes it current.
    pub fn insert(&mut self, domain: Domain) -> &mut Domain {
        let name = domain.name().to_owned();
        self.current = Some(name.clone());
        let slot = self.domains.entry(name).or_default();
        *slot = domain;
        slot
    }

    /// Switches the current domain.
    ///
    /// # Errors
    /// [`DomainError::UnknownDomain`] if `name` was never created.
    pub fn set_current_domain(&mut self, name: &str) -> Result<&Domain, DomainError> {
        let Some(domain) = self.domains.get(name) else {
            return Err(DomainError::UnknownDomain(name.to_owned()));
        };
        self.current = Some(name.to_owned());
        Ok(domain)
    }

    /// The current domain, if any was created.
    pub fn current(&self) -> Option<&Domain> {
        self.domains.get(self.current.as_deref()?)
    }

    /// Mutable access to the current domain.
    pub fn current_mut(&mut self) -> Option<&mut Domain> {
        let name = self.current.as_deref()?;
        self.domains.get_mut(name)
    }

    /// Looks up a domain by name.
    pub fn get(&self, name: &str) -> Option<&Domain> {
        self.domains.get(name)
    }

    /// Domain names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.domains.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(name: &str) -> TaskMethod {
        TaskMethod::new(name, 0, |_, _| Outcome::Decomposed(Vec::new()))
    }

    #[test]
    fn redeclaring_methods_extends_in_order() {
        let mut domain = Domain::new("d");
        domain.declare_task_methods("t", [noop("m1"), noop("m2")]);
        domain.declare_task_methods("t", [noop("m3")]);
        let names: Vec<_> = domain
            .task_methods("t")
            .unwrap_or_default()
            .iter()
            .map(TaskMethod::name)
            .collect();
        assert_eq!(names, ["m1", "m2", "m3"]);
    }

    #[test]
    fn duplicate_action_is_rejected() {
        let mut domain = Domain::new("d");
        let act = || Action::new("a", 0, |s, _| Outcome::Applied(s));
        assert!(domain.declare_actions([act()]).is_ok());
        assert_eq!(
            domain.declare_actions([act()]),
            Err(DomainError::DuplicateAction("a".into()))
        );
    }

    #[test]
    fn reset_clears_tables_but_keeps_name() {
        let mut domain = Domain::new("d");
        domain.declare_task_methods("t", [noop("m")]);
        domain.reset();
        assert_eq!(domain.name(), "d");
        assert!(domain.task_methods("t").is_none());
    }

    #[test]
    fn registry_tracks_current_domain() {
        let mut registry = DomainRegistry::new();
        assert!(registry.current().is_none());
        registry.create_domain("first");
        registry.create_domain("second");
        assert_eq!(registry.current().map(Domain::name), Some("second"));
        assert!(registry.set_current_domain("first").is_ok());
        assert_eq!(registry.current().map(Domain::name), Some("first"));
        assert_eq!(
            registry.set_current_domain("missing").map(Domain::name),
            Err(DomainError::UnknownDomain("missing".into()))
        );
        assert_eq!(registry.names().collect::<Vec<_>>(), ["first", "second"]);
    }

    #[test]
    fn summary_lists_declarations() {
        let mut domain = Domain::new("d");
        let _ = domain.declare_actions([Action::new("pickup", 1, |s, _| Outcome::Applied(s))]);
        domain.declare_task_methods("t", [noop("m")]);
        let text = domain.summary().to_string();
        assert!(text.contains("Domain name: d"));
        assert!(text.contains("pickup/1"));
        assert!(text.contains("t: m"));
        assert!(text.contains("-- There are no goal methods"));
    }
}
