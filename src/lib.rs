//! # Deferred FSM
//!
//! An event-queued finite state machine whose transitions are deferred,
//! serialized, and reentrancy-safe.
//!
//! ## Features
//!
//! - 📬 **Deferred processing**: `post_start`/`post_event` never run a
//!   transition on the caller's stack; work is queued and a future reports the
//!   outcome
//! - 🔁 **Serialized transitions**: one event at a time, in posting order, so
//!   callbacks can safely post further events
//! - 📋 **Validated specs**: every transition target is checked once, at
//!   construction, before anything runs
//! - 🏁 **End sentinel**: a terminal state name that needs no declaration of
//!   its own
//! - 🛡️ **Typed errors**: rejected futures say what failed, where, and why
//!
//! ## Quick Start
//!
//! ```rust
//! use deferred_fsm::{MachineBuilder, StateDef};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let machine = MachineBuilder::new(Vec::<String>::new(), "START", "END")
//!     .state(
//!         "START",
//!         StateDef::new()
//!             .entry(|log: &mut Vec<String>| log.push("ready".into()))
//!             .on("go", "WORKING"),
//!     )
//!     .state("WORKING", StateDef::new().on("finish", "END"))
//!     .build()?;
//!
//! machine.post_start().await?;
//! machine.post_event("go").await?;
//! machine.post_event("finish").await?;
//! assert!(machine.is_finished());
//! # Ok(())
//! # }
//! ```
//!
//! Callbacks fire in the fixed order `exit -> action -> entry` for each
//! transition, and a state's `entry` always runs before the posted future
//! resolves. A callback may post events into its own machine (keep a
//! [`Machine`] clone reachable from the context); they are queued behind the
//! transition in flight, never processed inline.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

mod builder;
mod error;
mod machine;
mod scheduler;
mod spec;

pub use builder::MachineBuilder;
pub use error::{Error, Result, SpecError};
pub use machine::{Machine, Options, Status};
pub use spec::{ActionFn, Spec, StateDef, StateFn};

pub mod prelude {
    //! Prelude module for convenient imports
    pub use crate::{Error, Machine, MachineBuilder, Result, Spec, SpecError, StateDef, Status};
}
