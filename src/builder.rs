//! Builder for assembling, validating, and launching machines.

use std::fmt::Debug;
use std::hash::Hash;

use crate::error::SpecError;
use crate::machine::{Core, Machine, Options};
use crate::spec::{Spec, StateDef};

/// Builder for a [`Machine`].
///
/// Collects the context, the spec, the start/end names, and the behavior
/// options; [`build`](Self::build) validates the spec once and, on success,
/// spawns the machine's processing task.
///
/// [`MachineBuilder::new`] pins the event-argument type to `()`, which covers
/// machines whose actions take no extra arguments. Use
/// [`MachineBuilder::with_event_args`] when actions should receive a payload.
pub struct MachineBuilder<S, E, C, A = ()>
where
    S: Clone + Debug + Eq + Hash + Send + Sync + 'static,
    E: Debug + Eq + Hash + Send + 'static,
    C: Send + 'static,
    A: Send + 'static,
{
    context: C,
    spec: Spec<S, E, C, A>,
    start: S,
    end: S,
    options: Options,
}

impl<S, E, C> MachineBuilder<S, E, C, ()>
where
    S: Clone + Debug + Eq + Hash + Send + Sync + 'static,
    E: Debug + Eq + Hash + Send + 'static,
    C: Send + 'static,
{
    /// Create a builder for a machine without event arguments.
    ///
    /// `context` is the caller-owned value passed to every callback; `start`
    /// names the state entered by `post_start`; `end` is the end sentinel,
    /// which does not need a state declaration of its own.
    pub fn new(context: C, start: S, end: S) -> Self {
        Self::with_event_args(context, start, end)
    }
}

impl<S, E, C, A> MachineBuilder<S, E, C, A>
where
    S: Clone + Debug + Eq + Hash + Send + Sync + 'static,
    E: Debug + Eq + Hash + Send + 'static,
    C: Send + 'static,
    A: Send + 'static,
{
    /// Create a builder for a machine whose actions receive `Vec<A>` event
    /// arguments.
    pub fn with_event_args(context: C, start: S, end: S) -> Self {
        Self {
            context,
            spec: Spec::new(),
            start,
            end,
            options: Options::default(),
        }
    }

    /// Declare a state.
    pub fn state(mut self, name: S, def: StateDef<S, E, C, A>) -> Self {
        self.spec = self.spec.state(name, def);
        self
    }

    /// Replace the accumulated states with a prebuilt [`Spec`].
    pub fn spec(mut self, spec: Spec<S, E, C, A>) -> Self {
        self.spec = spec;
        self
    }

    /// Silently accept events that arrive before start, after finish, or with
    /// no entry in the current state's transition table.
    pub fn ignore_unexpected_events(mut self, ignore: bool) -> Self {
        self.options.ignore_unexpected_events = ignore;
        self
    }

    /// Whether a restart runs the current state's `exit` callback before
    /// re-entering the start state. Defaults to `true`.
    pub fn exit_on_restart(mut self, exit: bool) -> Self {
        self.options.exit_on_restart = exit;
        self
    }

    /// Validate the spec and launch the machine.
    ///
    /// Validation failures are reported synchronously and produce no machine.
    /// Must be called within a tokio runtime, since the machine's processing
    /// task is spawned here.
    pub fn build(self) -> Result<Machine<S, E, A>, SpecError<S>> {
        self.spec.validate(&self.start, &self.end)?;
        let core = Core::new(self.spec, self.context, self.start, self.end, self.options);
        Ok(Machine::new(core))
    }
}
