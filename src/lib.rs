// Copyright 2025 Cowboy AI, LLC.

//! # CIM Outcome
//!
//! Result-wrapping building blocks that replace null checks, exception-driven
//! control flow and eager promise chains with explicit, chainable values:
//!
//! - **Maybe**: a value or nothing
//! - **Outcome**: a success value or a failure value, typed independently
//! - **Deferred**: a lazy, cancellable asynchronous computation settling on
//!   one of two channels, with sequential, parallel and batched aggregation
//!   and an imperative-style runner
//!
//! ## Design Principles
//!
//! 1. **Laziness**: building a `Deferred` does no work; triggers do
//! 2. **Failures are data**: every failure travels on the failure channel
//!    until a handler deals with it; only `.await` turns it into an `Err`
//! 3. **Single settlement**: each trigger settles exactly once
//! 4. **Cooperative cancellation**: cancelling suppresses the pending
//!    settlement and stops whatever stage is in flight
//! 5. **Immutability**: transformations build new values, never mutate

#![warn(missing_docs)]

mod concurrency;
mod deferred;
mod errors;
mod fp_adts;
mod maybe;
mod outcome;

pub use concurrency::Concurrency;
pub use deferred::{
    all, all_safe, all_safe_with, all_with, race, seq, seq_safe, Callback, Cancel, Coroutine,
    Deferred, Settlement, Step,
};
pub use errors::{DeferredError, DeferredResult};
pub use fp_adts::Either;
pub use maybe::Maybe;
pub use outcome::Outcome;
