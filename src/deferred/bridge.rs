// Copyright 2025 Cowboy AI, LLC.

//! Constructors bridging synchronous functions and native futures.
//!
//! Native futures are driven as Tokio tasks, so the async constructors must
//! be triggered (or, for [`Deferred::from_promise`], built) inside a Tokio
//! runtime.

use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures::FutureExt;
use tracing::error;

use super::{Cancel, Deferred};
use crate::errors::DeferredError;

impl<S, F> Deferred<S, F>
where
    S: Send + 'static,
    F: Send + 'static,
{
    /// Run a synchronous fallible function at trigger time.
    ///
    /// `Ok` settles the success channel and `Err` the failure channel.
    pub fn from_fn<G>(f: G) -> Self
    where
        G: Fn() -> Result<S, F> + Send + Sync + 'static,
    {
        Self::new(move |ok, err| {
            match f() {
                Ok(value) => ok.call(value),
                Err(error) => err.call(error),
            };
            Cancel::trivial()
        })
    }

    /// Bridge a lazily created native future.
    ///
    /// `factory` is called only when the computation is triggered, once per
    /// trigger. Its `Err` is mapped into the failure channel by `map_err`.
    /// Cancelling aborts the task driving the future.
    ///
    /// # Panics
    /// When triggered outside a Tokio runtime.
    pub fn from_promise_fn<P, Fut, E, M>(factory: P, map_err: M) -> Self
    where
        P: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<S, E>> + Send + 'static,
        E: Send + 'static,
        M: Fn(E) -> F + Send + Sync + 'static,
    {
        let map_err = Arc::new(map_err);
        Self::new(move |ok, err| {
            let pending = factory();
            let map_err = Arc::clone(&map_err);
            let task = tokio::spawn(async move {
                match pending.await {
                    Ok(value) => ok.call(value),
                    Err(error) => err.call(map_err(error)),
                };
            });
            Cancel::abort(task.abort_handle())
        })
    }

    /// [`Deferred::from_promise_fn`] for futures already failing with `F`.
    ///
    /// ```rust
    /// use cim_outcome::Deferred;
    ///
    /// # tokio_test::block_on(async {
    /// let lookup: Deferred<u64, String> = Deferred::from_async(|| async { Ok(42) });
    /// assert_eq!(lookup.await, Ok(42));
    /// # });
    /// ```
    pub fn from_async<P, Fut>(factory: P) -> Self
    where
        P: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<S, F>> + Send + 'static,
    {
        Self::from_promise_fn(factory, |error| error)
    }

    /// Bridge a native future that starts running right away.
    ///
    /// The future is spawned when this is called, not when the computation
    /// is triggered, and it runs once: every trigger observes the same
    /// result. Cancelling a trigger stops the observer, never the shared
    /// future itself.
    ///
    /// # Panics
    /// When called outside a Tokio runtime.
    pub fn from_promise<Fut, E, M>(promise: Fut, map_err: M) -> Self
    where
        Fut: Future<Output = Result<S, E>> + Send + 'static,
        S: Clone + Sync,
        E: Clone + Send + Sync + 'static,
        M: Fn(E) -> F + Send + Sync + 'static,
    {
        let shared = promise.boxed().shared();
        tokio::spawn(shared.clone());
        let map_err = Arc::new(map_err);
        Self::new(move |ok, err| {
            let shared = shared.clone();
            let map_err = Arc::clone(&map_err);
            let task = tokio::spawn(async move {
                match shared.await {
                    Ok(value) => ok.call(value),
                    Err(error) => err.call(map_err(error)),
                };
            });
            Cancel::abort(task.abort_handle())
        })
    }
}

impl<S> Deferred<S, DeferredError>
where
    S: Send + 'static,
{
    /// Run a synchronous function that may panic at trigger time.
    ///
    /// A panic settles the failure channel with [`DeferredError::Panicked`].
    pub fn catch_unwind<G>(f: G) -> Self
    where
        G: Fn() -> S + Send + Sync + 'static,
    {
        Self::new(move |ok, err| {
            match panic::catch_unwind(AssertUnwindSafe(&f)) {
                Ok(value) => ok.call(value),
                Err(payload) => {
                    let failure = DeferredError::from_panic(payload);
                    error!(error = %failure, "deferred computation panicked");
                    err.call(failure)
                }
            };
            Cancel::trivial()
        })
    }
}
