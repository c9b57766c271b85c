//! Error types for spec validation and event processing.

use std::fmt::Debug;
use thiserror::Error;

/// Result type alias for machine operations.
pub type Result<T, S, E> = std::result::Result<T, Error<S, E>>;

/// Errors detected while validating a machine spec, before any machine exists.
///
/// These are returned synchronously from [`MachineBuilder::build`]; no machine
/// is produced when validation fails.
///
/// [`MachineBuilder::build`]: crate::MachineBuilder::build
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SpecError<S: Debug> {
    /// The configured start state is neither a declared state nor the end sentinel.
    #[error("missing start state {0:?}")]
    MissingStart(S),

    /// One or more transition targets are neither declared states nor the end
    /// sentinel. Every offending target is listed, in the order first seen.
    #[error("invalid next state{} - {}", plural_suffix(.0), join_states(.0))]
    InvalidTargets(Vec<S>),
}

/// Errors surfaced through the future returned by `post_start`/`post_event`.
///
/// Each variant carries the event involved and the state that was active when
/// processing failed (`None` before the machine has started or after it has
/// finished).
#[derive(Error, Debug)]
pub enum Error<S: Debug, E: Debug> {
    /// The event is not recognized in the current context: the machine has not
    /// started, has already finished, or the current state's transition table
    /// has no entry for it.
    #[error("unexpected event {event:?} in state {}", fmt_state(.state))]
    UnexpectedEvent {
        /// State active when the event was processed.
        state: Option<S>,
        /// The offending event.
        event: E,
    },

    /// A transition named a target that is neither a declared state nor the
    /// end sentinel. The machine stays in its pre-transition state.
    #[error(
        "invalid next state {target:?} encountered while processing event {} in state {}",
        fmt_event(.event),
        fmt_state(.state)
    )]
    InvalidNextState {
        /// State active when the transition was attempted.
        state: Option<S>,
        /// Event that triggered the transition, if any (`None` for the start
        /// transition).
        event: Option<E>,
        /// The undeclared target.
        target: S,
    },

    /// The machine's processing task has shut down and can no longer accept
    /// or answer posted events.
    #[error("state machine is no longer running")]
    Closed,
}

fn plural_suffix<S>(states: &[S]) -> &'static str {
    if states.len() == 1 {
        ""
    } else {
        "s"
    }
}

fn join_states<S: Debug>(states: &[S]) -> String {
    states
        .iter()
        .map(|s| format!("{s:?}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn fmt_state<S: Debug>(state: &Option<S>) -> String {
    match state {
        Some(s) => format!("{s:?}"),
        None => "<none>".to_string(),
    }
}

fn fmt_event<E: Debug>(event: &Option<E>) -> String {
    match event {
        Some(e) => format!("{e:?}"),
        None => "<start>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_targets_message_is_singular_for_one_state() {
        let err = SpecError::InvalidTargets(vec!["LIMBO"]);
        assert_eq!(err.to_string(), r#"invalid next state - "LIMBO""#);
    }

    #[test]
    fn invalid_targets_message_is_plural_and_comma_joined() {
        let err = SpecError::InvalidTargets(vec!["LIMBO", "NOWHERE"]);
        assert_eq!(
            err.to_string(),
            r#"invalid next states - "LIMBO", "NOWHERE""#
        );
    }

    #[test]
    fn unexpected_event_before_start_prints_placeholder_state() {
        let err: Error<&str, &str> = Error::UnexpectedEvent {
            state: None,
            event: "go",
        };
        assert_eq!(err.to_string(), r#"unexpected event "go" in state <none>"#);
    }

    #[test]
    fn invalid_next_state_names_event_and_state() {
        let err: Error<&str, &str> = Error::InvalidNextState {
            state: Some("START"),
            event: Some("go"),
            target: "LIMBO",
        };
        assert_eq!(
            err.to_string(),
            r#"invalid next state "LIMBO" encountered while processing event "go" in state "START""#
        );
    }
}
