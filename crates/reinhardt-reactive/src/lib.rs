//! Reinhardt Reactive - fine-grained reactivity for Reinhardt screens
//!
//! A small Leptos/Solid.js-style reactive system:
//!
//! - [`Signal`]: a value whose reads are tracked and whose writes queue the
//!   effects that read it
//! - [`Effect`]: a closure that re-runs when its tracked signals change, and
//!   can stop itself through its [`Computation`]
//! - [`flush`]: drains the queue of effects waiting to re-run
//! - [`untrack`]: runs a closure without recording dependencies
//!
//! The runtime is single-threaded and lives in thread-local storage.

#![warn(missing_docs)]

pub mod effect;
pub mod runtime;
pub mod signal;

pub use effect::{Computation, Effect, effect_count, flush};
pub use runtime::{NodeId, Runtime, clear_scheduler, set_scheduler, untrack, with_runtime};
pub use signal::Signal;
