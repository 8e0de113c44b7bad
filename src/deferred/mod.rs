// Copyright 2025 Cowboy AI, LLC.

//! Lazy, cancellable asynchronous results
//!
//! A [`Deferred<S, F>`] describes a computation that eventually succeeds with
//! an `S` or fails with an `F`. Nothing runs when it is built. Work starts
//! each time a trigger is invoked:
//!
//! - [`Deferred::extract`] runs the action with two callbacks and returns its
//!   [`Cancel`] handle
//! - [`Deferred::settle`] (or `.await`) resolves to `Result<S, F>`
//! - [`Deferred::await_or_else`] resolves to the success value or a default
//!
//! Computations are not memoized: every trigger runs the action again.
//! Transformations build new computations that close over their parent
//! without changing it.
//!
//! ```rust
//! use cim_outcome::Deferred;
//!
//! let price: Deferred<u32, String> = Deferred::of(40);
//! let total = price.map(|p| p + 2).flat_map(|p| {
//!     if p > 100 {
//!         Deferred::reject(format!("{p} is over budget"))
//!     } else {
//!         Deferred::of(p)
//!     }
//! });
//!
//! assert_eq!(tokio_test::block_on(total.settle()), Ok(42));
//! ```

mod bridge;
mod callback;
mod cancel;
mod combinators;
mod handoff;
mod runner;
mod settlement;
mod time;
mod transform;

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub use callback::Callback;
pub use cancel::Cancel;
pub use combinators::{all, all_safe, all_safe_with, all_with, race, seq, seq_safe};
pub use runner::{Coroutine, Step};
pub use settlement::Settlement;

use callback::Gate;

type Action<S, F> = dyn Fn(Callback<S>, Callback<F>) -> Cancel + Send + Sync;

/// A lazy computation settling with either `S` or `F`.
///
/// Cloning is cheap and shares the action.
pub struct Deferred<S, F> {
    action: Arc<Action<S, F>>,
}

impl<S, F> Clone for Deferred<S, F> {
    fn clone(&self) -> Self {
        Self {
            action: Arc::clone(&self.action),
        }
    }
}

impl<S, F> fmt::Debug for Deferred<S, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred").finish_non_exhaustive()
    }
}

impl<S, F> Deferred<S, F>
where
    S: Send + 'static,
    F: Send + 'static,
{
    /// Wrap an action.
    ///
    /// The action receives the success and failure callbacks, must settle
    /// through exactly one of them, and returns the function that cancels
    /// its pending work. It runs once per trigger and never at construction.
    pub fn new<A>(action: A) -> Self
    where
        A: Fn(Callback<S>, Callback<F>) -> Cancel + Send + Sync + 'static,
    {
        Self {
            action: Arc::new(action),
        }
    }

    /// A computation that succeeds with `value` as soon as it is triggered
    pub fn of(value: S) -> Self
    where
        S: Clone + Sync,
    {
        Self::new(move |ok, _| {
            ok.call(value.clone());
            Cancel::trivial()
        })
    }

    /// Like [`Deferred::of`], with a custom cancellation function
    pub fn of_with_cancel<C>(value: S, cancel: C) -> Self
    where
        S: Clone + Sync,
        C: Fn() -> bool + Send + Sync + 'static,
    {
        let cancel = Arc::new(cancel);
        Self::new(move |ok, _| {
            ok.call(value.clone());
            let cancel = Arc::clone(&cancel);
            Cancel::new(move || cancel())
        })
    }

    /// A computation that fails with `error` as soon as it is triggered
    pub fn reject(error: F) -> Self
    where
        F: Clone + Sync,
    {
        Self::new(move |_, err| {
            err.call(error.clone());
            Cancel::trivial()
        })
    }

    /// Like [`Deferred::reject`], with a custom cancellation function
    pub fn reject_with_cancel<C>(error: F, cancel: C) -> Self
    where
        F: Clone + Sync,
        C: Fn() -> bool + Send + Sync + 'static,
    {
        let cancel = Arc::new(cancel);
        Self::new(move |_, err| {
            err.call(error.clone());
            let cancel = Arc::clone(&cancel);
            Cancel::new(move || cancel())
        })
    }

    /// Run the action and report through the given callbacks.
    ///
    /// Exactly one callback fires, at most once. The returned handle closes
    /// the settlement before calling the action's own cancel function, so
    /// after a successful cancel neither callback fires. It returns `true`
    /// when a pending settlement was suppressed and `false` once settled.
    /// Dropping the handle does not cancel anything.
    pub fn extract<OS, OF>(&self, on_success: OS, on_failure: OF) -> Cancel
    where
        OS: FnOnce(S) + Send + 'static,
        OF: FnOnce(F) + Send + 'static,
    {
        let gate = Arc::new(Gate::default());
        let ok = Callback::new(Arc::clone(&gate), on_success);
        let err = Callback::new(Arc::clone(&gate), on_failure);
        let pending = (self.action)(ok, err);
        Cancel::new(move || {
            if gate.cancel() {
                pending.cancel();
                true
            } else {
                false
            }
        })
    }
}

/// Lock a mutex, recovering the data of a poisoned one.
///
/// Callbacks never leave shared state half-updated, so the data behind a
/// poisoned lock is still consistent.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
