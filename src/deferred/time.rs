// Copyright 2025 Cowboy AI, LLC.

//! Timer-backed computations

use std::time::Duration;

use super::{Callback, Cancel, Deferred};

impl<S, F> Deferred<S, F>
where
    S: Send + 'static,
    F: Send + 'static,
{
    /// Succeed with `value` once `delay` has elapsed after the trigger.
    ///
    /// Cancelling clears the pending timer.
    ///
    /// # Panics
    /// When triggered outside a Tokio runtime.
    pub fn after(delay: Duration, value: S) -> Self
    where
        S: Clone + Sync,
    {
        Self::new(move |ok, _| timer(delay, ok, value.clone()))
    }

    /// Fail with `error` once `delay` has elapsed after the trigger.
    ///
    /// # Panics
    /// When triggered outside a Tokio runtime.
    pub fn reject_after(delay: Duration, error: F) -> Self
    where
        F: Clone + Sync,
    {
        Self::new(move |_, err| timer(delay, err, error.clone()))
    }
}

fn timer<T: Send + 'static>(delay: Duration, channel: Callback<T>, value: T) -> Cancel {
    let task = tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        channel.call(value);
    });
    Cancel::abort(task.abort_handle())
}
