// Copyright 2025 Cowboy AI, LLC.

//! Bridging a computation back into native `async`/`.await`.

use std::fmt;
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use futures::channel::oneshot;
use tracing::warn;

use super::{lock, Cancel, Deferred};
use crate::errors::{DeferredError, DeferredResult};
use crate::maybe::Maybe;
use crate::outcome::Outcome;

/// A triggered computation awaiting its settlement.
///
/// Resolves to `Ok(success)` or `Err(failure)`. Dropping it before it
/// resolves cancels the computation. A cancelled computation, or one whose
/// action drops its callbacks without settling, never resolves: it stays
/// `Pending` and the awaiting task is never woken again, so wrap it in a
/// timeout or use [`Settlement::checked`] to observe the latter.
#[must_use = "dropping a Settlement cancels the computation"]
pub struct Settlement<S, F> {
    receiver: oneshot::Receiver<Result<S, F>>,
    cancel: Cancel,
    abandoned: bool,
}

impl<S, F> Settlement<S, F> {
    /// Cancel the underlying computation.
    pub fn cancel(&self) -> bool {
        self.cancel.cancel()
    }

    /// Resolve to [`DeferredError::Abandoned`] instead of hanging when the
    /// action drops both callbacks without settling.
    pub async fn checked(mut self) -> DeferredResult<Result<S, F>> {
        (&mut self.receiver)
            .await
            .map_err(|_| DeferredError::Abandoned)
    }
}

impl<S, F> fmt::Debug for Settlement<S, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settlement")
            .field("cancel", &self.cancel)
            .field("abandoned", &self.abandoned)
            .finish_non_exhaustive()
    }
}

impl<S, F> Future for Settlement<S, F> {
    type Output = Result<S, F>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.receiver).poll(cx) {
            Poll::Ready(Ok(settled)) => Poll::Ready(settled),
            // Every sender is gone, so no waker is registered and this task is
            // never woken again.
            Poll::Ready(Err(oneshot::Canceled)) => {
                if !this.abandoned {
                    this.abandoned = true;
                    if !this.cancel.is_spent() {
                        warn!("deferred computation dropped its callbacks without settling");
                    }
                }
                Poll::Pending
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<S, F> Drop for Settlement<S, F> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl<S, F> Deferred<S, F>
where
    S: Send + 'static,
    F: Send + 'static,
{
    /// Trigger the computation now and await its result natively.
    ///
    /// The failure value arrives as `Err`, whatever its type. This is the
    /// one place where a failure leaves the computation as a plain error.
    pub fn settle(&self) -> Settlement<S, F> {
        let (sender, receiver) = oneshot::channel();
        let sender = Arc::new(Mutex::new(Some(sender)));
        let failure_sender = Arc::clone(&sender);
        let cancel = self.extract(
            move |value| {
                if let Some(sender) = lock(&sender).take() {
                    let _ = sender.send(Ok(value));
                }
            },
            move |error| {
                if let Some(sender) = lock(&failure_sender).take() {
                    let _ = sender.send(Err(error));
                }
            },
        );
        Settlement {
            receiver,
            cancel,
            abandoned: false,
        }
    }

    /// Trigger now; resolve to the success value, or `default` on failure.
    pub fn await_or_else(&self, default: S) -> impl Future<Output = S> + Send + 'static {
        let settlement = self.settle();
        async move { settlement.await.unwrap_or(default) }
    }

    /// Trigger now; success becomes present, any failure becomes empty.
    pub fn to_option(&self) -> impl Future<Output = Maybe<S>> + Send + 'static {
        let settlement = self.settle();
        async move {
            match settlement.await {
                Ok(value) => Maybe::present(value),
                Err(_) => Maybe::empty(),
            }
        }
    }

    /// Trigger now; resolve to the matching branch of an [`Outcome`].
    pub fn to_result(&self) -> impl Future<Output = Outcome<S, F>> + Send + 'static {
        let settlement = self.settle();
        async move {
            match settlement.await {
                Ok(value) => Outcome::success(value),
                Err(error) => Outcome::failure(error),
            }
        }
    }
}

impl<S, F> IntoFuture for Deferred<S, F>
where
    S: Send + 'static,
    F: Send + 'static,
{
    type Output = Result<S, F>;
    type IntoFuture = Settlement<S, F>;

    fn into_future(self) -> Self::IntoFuture {
        self.settle()
    }
}

impl<S, F> IntoFuture for &Deferred<S, F>
where
    S: Send + 'static,
    F: Send + 'static,
{
    type Output = Result<S, F>;
    type IntoFuture = Settlement<S, F>;

    fn into_future(self) -> Self::IntoFuture {
        self.settle()
    }
}
