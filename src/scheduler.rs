//! The FIFO run queue that defers and serializes transition processing.
//!
//! Posting a start or an event sends a [`Command`] down an unbounded channel;
//! a single worker task receives commands and applies each one to completion
//! before looking at the next. That is the whole reentrancy story: transition
//! processing never runs on a caller's stack, and an event posted from inside
//! a callback is just another command queued behind the one currently being
//! serviced. No priorities, no cancellation; a command once sent always runs
//! (barring runtime shutdown).
//!
//! The worker holds no sender of its own, so once every [`Machine`] handle is
//! dropped the channel closes and the worker exits after draining whatever was
//! already queued.
//!
//! [`Machine`]: crate::Machine

use std::fmt::Debug;
use std::hash::Hash;

use tokio::sync::{mpsc, oneshot};

use crate::error::Result;
use crate::machine::Core;

/// One unit of deferred work: a posted start or event, plus the channel that
/// resolves the caller's future.
pub(crate) enum Command<S, E, A>
where
    S: Debug,
    E: Debug,
{
    Start {
        reply: oneshot::Sender<Result<(), S, E>>,
    },
    Event {
        event: E,
        args: Vec<A>,
        reply: oneshot::Sender<Result<(), S, E>>,
    },
}

/// Spawn the worker task servicing `queue` with `core`.
///
/// Replies are best-effort: a caller that dropped its future simply never
/// learns the outcome, but the command still ran.
pub(crate) fn spawn<S, E, C, A>(
    mut core: Core<S, E, C, A>,
    mut queue: mpsc::UnboundedReceiver<Command<S, E, A>>,
) where
    S: Clone + Debug + Eq + Hash + Send + Sync + 'static,
    E: Debug + Eq + Hash + Send + 'static,
    C: Send + 'static,
    A: Send + 'static,
{
    tokio::spawn(async move {
        while let Some(command) = queue.recv().await {
            match command {
                Command::Start { reply } => {
                    tracing::trace!("servicing start command");
                    let result = core.apply_start();
                    if let Err(err) = &result {
                        tracing::debug!(%err, "start rejected");
                    }
                    let _ = reply.send(result);
                }
                Command::Event { event, args, reply } => {
                    tracing::trace!(event = ?event, "servicing event");
                    let result = core.apply_event(event, args);
                    if let Err(err) = &result {
                        tracing::debug!(%err, "event rejected");
                    }
                    let _ = reply.send(result);
                }
            }
        }
        tracing::trace!("run queue closed, machine task exiting");
    });
}
