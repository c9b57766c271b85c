//! Machine instances: the cloneable [`Machine`] handle and the transition
//! engine behind it.
//!
//! A machine is built from a validated [`Spec`](crate::Spec) and processes
//! posted events one at a time, in posting order, on its own task. `post_start`
//! and `post_event` never run a transition on the caller's stack: they enqueue
//! work on the machine's run queue and return a future that resolves once that
//! work has completed. Because only the machine's task ever touches the current
//! state, a callback that posts further events cannot corrupt an in-flight
//! transition; the new events are simply queued behind it.
//!
//! For each transition the callbacks fire in the fixed order
//! `exit -> action -> entry`, and the `entry` of the newly entered state always
//! fires before the posted future resolves.

use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;

use tokio::sync::{mpsc, oneshot, watch};

use crate::error::{Error, Result};
use crate::scheduler::{self, Command};
use crate::spec::{Spec, StateDef};

/// Where a machine is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status<S> {
    /// No start event has completed yet.
    Unstarted,
    /// The machine is in the named state.
    Running(S),
    /// The machine has reached the end sentinel; no further productive
    /// transitions will occur.
    Finished,
}

/// Behavior switches for a machine instance.
#[derive(Debug, Clone, Copy)]
pub struct Options {
    /// When `true`, events posted before start, after finish, or with no entry
    /// in the current state's transition table resolve successfully with no
    /// state change and no callbacks, instead of rejecting with
    /// [`Error::UnexpectedEvent`].
    pub ignore_unexpected_events: bool,
    /// When `true` (the default), restarting an already-running machine via
    /// `post_start` runs the current state's `exit` callback before re-entering
    /// the start state. When `false`, the `exit` is skipped.
    pub exit_on_restart: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            ignore_unexpected_events: false,
            exit_on_restart: true,
        }
    }
}

/// Handle to a running machine.
///
/// Cheap to clone; all clones post into the same run queue. Dropping every
/// handle closes the queue, and the machine's task exits after draining the
/// events that were already posted.
///
/// A callback that wants to post events into its own machine can hold a clone
/// of this handle reachable from the context `C`, e.g. behind an
/// `Arc<Mutex<..>>` populated after `build`. Posting enqueues synchronously, so
/// doing it from inside a callback is always safe.
pub struct Machine<S, E, A = ()>
where
    S: Clone + Debug + Eq + Hash + Send + Sync + 'static,
    E: Debug + Eq + Hash + Send + 'static,
    A: Send + 'static,
{
    commands: mpsc::UnboundedSender<Command<S, E, A>>,
    status: watch::Receiver<Status<S>>,
}

impl<S, E, A> Machine<S, E, A>
where
    S: Clone + Debug + Eq + Hash + Send + Sync + 'static,
    E: Debug + Eq + Hash + Send + 'static,
    A: Send + 'static,
{
    pub(crate) fn new<C>(core: Core<S, E, C, A>) -> Self
    where
        C: Send + 'static,
    {
        let (commands, queue) = mpsc::unbounded_channel();
        let status = core.subscribe();
        scheduler::spawn(core, queue);
        Self { commands, status }
    }

    /// Enqueue the synthetic start transition.
    ///
    /// The returned future resolves once the machine has entered the start
    /// state and its `entry` callback (if any) has run. Posting a start on an
    /// already-running machine is a reset: it unconditionally re-enters the
    /// start state, running `exit` on the current state first unless
    /// [`Options::exit_on_restart`] is off.
    pub fn post_start(&self) -> impl Future<Output = Result<(), S, E>> + Send + 'static {
        self.post(|reply| Command::Start { reply })
    }

    /// Enqueue processing of `event` with no extra arguments.
    ///
    /// The command joins the run queue synchronously, at call time; the
    /// returned future only awaits the outcome. Dropping the future does not
    /// cancel the posted event.
    pub fn post_event(&self, event: E) -> impl Future<Output = Result<(), S, E>> + Send + 'static {
        self.post_event_with(event, Vec::new())
    }

    /// Enqueue processing of `event`, passing `args` to the transition's
    /// action callback.
    pub fn post_event_with(
        &self,
        event: E,
        args: Vec<A>,
    ) -> impl Future<Output = Result<(), S, E>> + Send + 'static {
        self.post(|reply| Command::Event { event, args, reply })
    }

    fn post(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<(), S, E>>) -> Command<S, E, A>,
    ) -> impl Future<Output = Result<(), S, E>> + Send + 'static {
        let (reply_tx, reply_rx) = oneshot::channel();
        let sent = self.commands.send(make(reply_tx)).is_ok();
        async move {
            if !sent {
                return Err(Error::Closed);
            }
            reply_rx.await.unwrap_or(Err(Error::Closed))
        }
    }

    /// Current lifecycle status. Read-only; observing it has no effect on the
    /// run queue or on pending futures.
    pub fn status(&self) -> Status<S> {
        self.status.borrow().clone()
    }

    /// Name of the current state, or `None` before start and after finish.
    pub fn current_state(&self) -> Option<S> {
        match &*self.status.borrow() {
            Status::Running(name) => Some(name.clone()),
            _ => None,
        }
    }

    /// Whether a start event has completed.
    pub fn has_started(&self) -> bool {
        !matches!(*self.status.borrow(), Status::Unstarted)
    }

    /// Whether the machine has reached the end sentinel.
    pub fn is_finished(&self) -> bool {
        matches!(*self.status.borrow(), Status::Finished)
    }
}

impl<S, E, A> Clone for Machine<S, E, A>
where
    S: Clone + Debug + Eq + Hash + Send + Sync + 'static,
    E: Debug + Eq + Hash + Send + 'static,
    A: Send + 'static,
{
    fn clone(&self) -> Self {
        Self {
            commands: self.commands.clone(),
            status: self.status.clone(),
        }
    }
}

/// The transition engine. Owned by the machine's task; processes one command
/// at a time, so `current` is never touched concurrently.
pub(crate) struct Core<S, E, C, A>
where
    S: Clone + Debug + Eq + Hash + Send + Sync + 'static,
    E: Debug + Eq + Hash + Send + 'static,
    C: Send + 'static,
    A: Send + 'static,
{
    spec: Spec<S, E, C, A>,
    context: C,
    start: S,
    end: S,
    options: Options,
    status: watch::Sender<Status<S>>,
}

impl<S, E, C, A> Core<S, E, C, A>
where
    S: Clone + Debug + Eq + Hash + Send + Sync + 'static,
    E: Debug + Eq + Hash + Send + 'static,
    C: Send + 'static,
    A: Send + 'static,
{
    pub(crate) fn new(spec: Spec<S, E, C, A>, context: C, start: S, end: S, options: Options) -> Self {
        let (status, _) = watch::channel(Status::Unstarted);
        Self {
            spec,
            context,
            start,
            end,
            options,
            status,
        }
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Status<S>> {
        self.status.subscribe()
    }

    fn current(&self) -> Status<S> {
        self.status.borrow().clone()
    }

    /// Enter (or re-enter) the start state. On an already-running machine this
    /// is a reset.
    pub(crate) fn apply_start(&mut self) -> Result<(), S, E> {
        if self.options.exit_on_restart {
            if let Status::Running(name) = self.current() {
                if let Some(def) = self.spec.states.get_mut(&name) {
                    if let Some(exit) = def.exit.as_mut() {
                        exit(&mut self.context);
                    }
                }
            }
        }
        let start = self.start.clone();
        self.enter(start, None)
    }

    /// Process one posted event: look it up in the current state's transition
    /// table, run `exit -> action -> entry`, and advance.
    pub(crate) fn apply_event(&mut self, event: E, args: Vec<A>) -> Result<(), S, E> {
        let name = match self.current() {
            Status::Running(name) => name,
            _ => {
                if self.options.ignore_unexpected_events {
                    tracing::debug!(event = ?event, "ignoring event posted outside a running state");
                    return Ok(());
                }
                return Err(Error::UnexpectedEvent { state: None, event });
            }
        };

        // A Running status always names a declared state (enter checks
        // membership), so the lookup failing means the spec and status
        // disagree; treat the event as unexpected rather than guessing.
        let Some(def) = self.spec.states.get_mut(&name) else {
            return Err(Error::UnexpectedEvent {
                state: Some(name),
                event,
            });
        };
        let StateDef {
            exit, transitions, ..
        } = def;

        let Some(transition) = transitions.get_mut(&event) else {
            if self.options.ignore_unexpected_events {
                tracing::debug!(state = ?name, event = ?event, "ignoring unexpected event");
                return Ok(());
            }
            return Err(Error::UnexpectedEvent {
                state: Some(name),
                event,
            });
        };

        if let Some(exit) = exit.as_mut() {
            exit(&mut self.context);
        }
        if let Some(action) = transition.action.as_mut() {
            action(&mut self.context, args);
        }
        let target = transition.target.clone();
        self.enter(target, Some(event))
    }

    /// Move into `target`, which must be a declared state or the end sentinel.
    /// On failure the current state is left unmodified.
    fn enter(&mut self, target: S, event: Option<E>) -> Result<(), S, E> {
        if let Some(def) = self.spec.states.get_mut(&target) {
            // Publish the new state before its entry callback runs, so the
            // callback observes the state it is entering.
            self.status.send_replace(Status::Running(target.clone()));
            tracing::debug!(state = ?target, "entered state");
            if let Some(entry) = def.entry.as_mut() {
                entry(&mut self.context);
            }
            Ok(())
        } else if target == self.end {
            self.status.send_replace(Status::Finished);
            tracing::debug!(end = ?target, "reached end sentinel");
            Ok(())
        } else {
            let state = match self.current() {
                Status::Running(name) => Some(name),
                _ => None,
            };
            Err(Error::InvalidNextState {
                state,
                event,
                target,
            })
        }
    }
}
