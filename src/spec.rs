//! Machine specifications: states, transitions, and lifecycle callbacks.
//!
//! A [`Spec`] is the static description of one machine design: a map from
//! state name to [`StateDef`], where each state carries optional `entry`/`exit`
//! callbacks and a transition table from event name to target state. Specs
//! are plain data; they are validated once when a machine is built and never
//! change afterwards.

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;

use crate::error::SpecError;

/// Callback invoked when a state is entered or exited.
///
/// Receives the caller-owned context; the machine never inspects it.
pub type StateFn<C> = Box<dyn FnMut(&mut C) + Send>;

/// Callback invoked while transitioning, with the extra arguments that were
/// posted alongside the event.
pub type ActionFn<C, A> = Box<dyn FnMut(&mut C, Vec<A>) + Send>;

/// One entry in a state's transition table: the target state plus an optional
/// action callback.
pub(crate) struct Transition<S, C, A = ()> {
    pub(crate) target: S,
    pub(crate) action: Option<ActionFn<C, A>>,
}

/// Definition of a single state: optional lifecycle callbacks and the
/// transition table consulted when events arrive in this state.
///
/// Events keep their insertion order so diagnostics walk the table the way it
/// was written.
pub struct StateDef<S, E, C, A = ()> {
    pub(crate) entry: Option<StateFn<C>>,
    pub(crate) exit: Option<StateFn<C>>,
    pub(crate) transitions: HashMap<E, Transition<S, C, A>>,
    pub(crate) order: Vec<E>,
}

impl<S, E, C, A> StateDef<S, E, C, A>
where
    E: Clone + Eq + Hash,
{
    /// Create an empty state definition.
    pub fn new() -> Self {
        Self {
            entry: None,
            exit: None,
            transitions: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Set the callback invoked immediately after this state is entered.
    pub fn entry<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut C) + Send + 'static,
    {
        self.entry = Some(Box::new(f));
        self
    }

    /// Set the callback invoked immediately before this state is left.
    pub fn exit<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut C) + Send + 'static,
    {
        self.exit = Some(Box::new(f));
        self
    }

    /// Add a transition for `event` to `target` with no action callback.
    pub fn on(self, event: E, target: S) -> Self {
        self.insert(
            event,
            Transition {
                target,
                action: None,
            },
        )
    }

    /// Add a transition for `event` to `target` whose action receives the
    /// arguments posted with the event.
    pub fn on_with<F>(self, event: E, target: S, action: F) -> Self
    where
        F: FnMut(&mut C, Vec<A>) + Send + 'static,
    {
        self.insert(
            event,
            Transition {
                target,
                action: Some(Box::new(action)),
            },
        )
    }

    fn insert(mut self, event: E, transition: Transition<S, C, A>) -> Self {
        if self.transitions.insert(event.clone(), transition).is_none() {
            self.order.push(event);
        }
        self
    }
}

impl<S, E, C, A> Default for StateDef<S, E, C, A>
where
    E: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

/// The static description of a machine: state names mapped to definitions,
/// kept in declaration order.
pub struct Spec<S, E, C, A = ()> {
    pub(crate) states: HashMap<S, StateDef<S, E, C, A>>,
    pub(crate) order: Vec<S>,
}

impl<S, E, C, A> Spec<S, E, C, A>
where
    S: Clone + Eq + Hash,
{
    /// Create an empty spec.
    pub fn new() -> Self {
        Self {
            states: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Declare a state. Re-declaring a name replaces the earlier definition
    /// but keeps its original position.
    pub fn state(mut self, name: S, def: StateDef<S, E, C, A>) -> Self {
        if self.states.insert(name.clone(), def).is_none() {
            self.order.push(name);
        }
        self
    }

    /// Number of declared states.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether the spec declares no states at all.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Check the spec for structural soundness against a start state and an
    /// end sentinel.
    ///
    /// Every transition target must either be a declared state or equal `end`
    /// (the end sentinel needs no declaration of its own), and `start` must
    /// itself be such a valid target. All invalid targets are reported in one
    /// [`SpecError::InvalidTargets`], deduplicated, in the order first seen:
    /// states in declaration order, transitions within a state in the order
    /// they were added.
    ///
    /// Validation is pure: no side effects, no I/O, same result for the same
    /// input.
    pub fn validate(&self, start: &S, end: &S) -> Result<(), SpecError<S>>
    where
        S: Debug,
        E: Eq + Hash,
    {
        if !self.states.contains_key(start) && start != end {
            return Err(SpecError::MissingStart(start.clone()));
        }

        let mut seen = HashSet::new();
        let mut invalid = Vec::new();
        for name in &self.order {
            let Some(def) = self.states.get(name) else {
                continue;
            };
            for event in &def.order {
                let Some(transition) = def.transitions.get(event) else {
                    continue;
                };
                let target = &transition.target;
                if !seen.insert(target) {
                    continue;
                }
                if !self.states.contains_key(target) && target != end {
                    invalid.push(target.clone());
                }
            }
        }

        if invalid.is_empty() {
            Ok(())
        } else {
            Err(SpecError::InvalidTargets(invalid))
        }
    }
}

impl<S, E, C, A> Default for Spec<S, E, C, A>
where
    S: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestSpec = Spec<&'static str, &'static str, (), ()>;

    fn two_step() -> TestSpec {
        Spec::new()
            .state("START", StateDef::new().on("go", "MID"))
            .state("MID", StateDef::new().on("finish", "END"))
    }

    #[test]
    fn valid_spec_passes() {
        assert!(two_step().validate(&"START", &"END").is_ok());
    }

    #[test]
    fn end_sentinel_needs_no_declaration() {
        let spec: TestSpec = Spec::new().state("ONLY", StateDef::new().on("done", "END"));
        assert!(spec.validate(&"ONLY", &"END").is_ok());
    }

    #[test]
    fn start_may_equal_end_sentinel() {
        let spec: TestSpec = Spec::new();
        assert!(spec.validate(&"DONE", &"DONE").is_ok());
    }

    #[test]
    fn missing_start_is_rejected() {
        assert_eq!(
            two_step().validate(&"ELSEWHERE", &"END"),
            Err(SpecError::MissingStart("ELSEWHERE"))
        );
    }

    #[test]
    fn undeclared_target_is_rejected() {
        let spec: TestSpec = Spec::new().state("START", StateDef::new().on("go", "LIMBO"));
        assert_eq!(
            spec.validate(&"START", &"END"),
            Err(SpecError::InvalidTargets(vec!["LIMBO"]))
        );
    }

    #[test]
    fn all_invalid_targets_are_reported_once() {
        let spec: TestSpec = Spec::new().state(
            "START",
            StateDef::new()
                .on("a", "LIMBO")
                .on("b", "NOWHERE")
                .on("c", "LIMBO"),
        );
        assert_eq!(
            spec.validate(&"START", &"END"),
            Err(SpecError::InvalidTargets(vec!["LIMBO", "NOWHERE"]))
        );
    }

    #[test]
    fn invalid_targets_follow_declaration_order() {
        let spec: TestSpec = Spec::new()
            .state("S0", StateDef::new().on("go", "BAD3"))
            .state("S1", StateDef::new().on("go", "BAD2"))
            .state("S2", StateDef::new().on("go", "BAD1"))
            .state("S3", StateDef::new().on("go", "BAD0"));
        assert_eq!(
            spec.validate(&"S0", &"END"),
            Err(SpecError::InvalidTargets(vec![
                "BAD3", "BAD2", "BAD1", "BAD0"
            ]))
        );
    }

    #[test]
    fn validation_has_no_side_effects() {
        let spec = two_step();
        let _ = spec.validate(&"START", &"END");
        let _ = spec.validate(&"START", &"END");
        assert_eq!(spec.len(), 2);
    }
}
