// Copyright 2025 Cowboy AI, LLC.

//! Imperative-style runners
//!
//! Both runners give a sequential notation that behaves exactly like a chain
//! of nested `flat_map` calls: each yielded computation is awaited, its
//! success value is handed back to the body, and the first failure ends the
//! run without resuming the body.

use std::future::Future;
use std::sync::{Arc, Mutex};

use super::cancel::CancelGroup;
use super::handoff::Handoff;
use super::{lock, Callback, Deferred};

/// What a [`Coroutine`] does next
#[derive(Debug)]
pub enum Step<Y, R, F> {
    /// Wait for this computation and resume with its success value
    Yield(Deferred<Y, F>),
    /// Finish with a value
    Done(R),
}

/// An explicit step machine driven by [`Deferred::run_steps`].
///
/// `resume` is called with `None` first, then with the success value of each
/// yielded computation.
pub trait Coroutine: Send + 'static {
    /// Success type of the yielded computations
    type Yield: Send + 'static;
    /// Final value of the run
    type Return: Send + 'static;
    /// Failure type shared by every step
    type Error: Send + 'static;

    /// Advance to the next step
    fn resume(&mut self, input: Option<Self::Yield>) -> Step<Self::Yield, Self::Return, Self::Error>;
}

impl<S, F> Deferred<S, F>
where
    S: Send + 'static,
    F: Send + 'static,
{
    /// Run an async body where `deferred.await?` yields a computation.
    ///
    /// The body is created at trigger time and driven as a Tokio task; `?`
    /// short-circuits on the first failure. Cancelling aborts the task,
    /// which drops and so cancels the computation it was waiting on.
    ///
    /// ```rust
    /// use cim_outcome::Deferred;
    ///
    /// fn price(item: &'static str) -> Deferred<u32, String> {
    ///     match item {
    ///         "apple" => Deferred::of(3),
    ///         other => Deferred::reject(format!("unknown item {other}")),
    ///     }
    /// }
    ///
    /// let basket: Deferred<u32, String> = Deferred::run(|| async {
    ///     let apple = price("apple").await?;
    ///     let pear = price("pear").await?;
    ///     Ok::<_, String>(apple + pear)
    /// });
    ///
    /// # tokio_test::block_on(async {
    /// assert_eq!(basket.await, Err("unknown item pear".to_string()));
    /// # });
    /// ```
    ///
    /// # Panics
    /// When triggered outside a Tokio runtime.
    pub fn run<G, Fut>(body: G) -> Self
    where
        G: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<S, F>> + Send + 'static,
    {
        Self::from_async(body)
    }

    /// Drive a [`Coroutine`] built by `factory` at each trigger.
    ///
    /// Synchronous steps need no runtime and run in a loop, so a long
    /// coroutine does not grow the stack. A failing step ends the run without
    /// resuming the coroutine.
    pub fn run_steps<C, G>(factory: G) -> Self
    where
        C: Coroutine<Return = S, Error = F>,
        G: Fn() -> C + Send + Sync + 'static,
    {
        Self::new(move |ok, err| {
            let run = Arc::new(StepRun {
                coroutine: Mutex::new(factory()),
                ok,
                err,
                stages: CancelGroup::default(),
            });
            let handle = run.stages.handle();
            run.resume_with(None);
            handle
        })
    }
}

/// One trigger of [`Deferred::run_steps`]
struct StepRun<C: Coroutine> {
    coroutine: Mutex<C>,
    ok: Callback<C::Return>,
    err: Callback<C::Error>,
    stages: CancelGroup,
}

impl<C: Coroutine> StepRun<C> {
    /// Resume the coroutine and keep stepping in this loop while each
    /// yielded computation succeeds during its own `extract`.
    fn resume_with(self: Arc<Self>, mut input: Option<C::Yield>) {
        loop {
            if self.stages.is_cancelled() {
                return;
            }
            let step = lock(&self.coroutine).resume(input);
            let next = match step {
                Step::Done(value) => {
                    self.ok.call(value);
                    return;
                }
                Step::Yield(next) => next,
            };

            let handoff = Arc::new(Handoff::<C::Yield>::default());
            let on_success = {
                let (handoff, run) = (Arc::clone(&handoff), Arc::clone(&self));
                move |value: C::Yield| {
                    if let Some(value) = handoff.offer(value) {
                        run.resume_with(Some(value));
                    }
                }
            };
            let err = self.err.clone();
            let on_failure = move |error: C::Error| {
                err.call(error);
            };
            self.stages.push(next.extract(on_success, on_failure));

            match handoff.take_or_detach() {
                Some(value) => input = Some(value),
                None => return,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::block_on;

    /// Adds up yielded values until `limit` steps were taken.
    struct Summing {
        steps: u32,
        limit: u32,
        total: u32,
    }

    impl Coroutine for Summing {
        type Yield = u32;
        type Return = u32;
        type Error = String;

        fn resume(&mut self, input: Option<u32>) -> Step<u32, u32, String> {
            self.total += input.unwrap_or(0);
            if self.steps == self.limit {
                return Step::Done(self.total);
            }
            self.steps += 1;
            Step::Yield(Deferred::of(self.steps))
        }
    }

    #[test]
    fn test_run_steps_threads_values() {
        let sum: Deferred<u32, String> = Deferred::run_steps(|| Summing {
            steps: 0,
            limit: 3,
            total: 0,
        });
        assert_eq!(block_on(sum.settle()), Ok(6));
        assert_eq!(block_on(sum.settle()), Ok(6));
    }

    #[test]
    fn test_run_steps_finishing_immediately() {
        let done: Deferred<u32, String> = Deferred::run_steps(|| Summing {
            steps: 0,
            limit: 0,
            total: 10,
        });
        assert_eq!(block_on(done.settle()), Ok(10));
    }

    #[tokio::test]
    async fn test_run_async_body() {
        let doubled: Deferred<i32, String> = Deferred::run(|| async {
            let base = Deferred::<i32, String>::of(21).await?;
            Ok::<_, String>(base * 2)
        });
        assert_eq!(doubled.await, Ok(42));
    }
}
