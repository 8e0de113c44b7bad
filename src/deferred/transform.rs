// Copyright 2025 Cowboy AI, LLC.

//! Transformations: each builds a new computation over its parent.
//!
//! All of them reduce to `chain`, which runs the parent and turns its
//! settlement into a [`Next`] step. Transformers that can fail return
//! `Result`; an `Err` becomes the failure of the chain instead of escaping.

use std::sync::Arc;

use super::cancel::CancelGroup;
use super::{Callback, Deferred};
use crate::outcome::Outcome;

/// What a chain does after its parent settles
enum Next<U, E> {
    Success(U),
    Failure(E),
    Chain(Deferred<U, E>),
}

impl<U, E> Next<U, E> {
    fn from_value(value: Result<U, E>) -> Self {
        match value {
            Ok(value) => Next::Success(value),
            Err(error) => Next::Failure(error),
        }
    }

    fn from_chain(next: Result<Deferred<U, E>, E>) -> Self {
        match next {
            Ok(next) => Next::Chain(next),
            Err(error) => Next::Failure(error),
        }
    }
}

/// Settle `ok`/`err` from a step, starting the chained computation if any.
fn resume<U, E>(next: Next<U, E>, ok: Callback<U>, err: Callback<E>, stages: &CancelGroup)
where
    U: Send + 'static,
    E: Send + 'static,
{
    match next {
        Next::Success(value) => {
            ok.call(value);
        }
        Next::Failure(error) => {
            err.call(error);
        }
        Next::Chain(next) => {
            if stages.is_cancelled() {
                return;
            }
            let handle = next.extract(
                move |value| {
                    ok.call(value);
                },
                move |error| {
                    err.call(error);
                },
            );
            stages.push(handle);
        }
    }
}

impl<S, F> Deferred<S, F>
where
    S: Send + 'static,
    F: Send + 'static,
{
    fn chain<U, E, OS, OF>(&self, on_success: OS, on_failure: OF) -> Deferred<U, E>
    where
        U: Send + 'static,
        E: Send + 'static,
        OS: Fn(S) -> Next<U, E> + Send + Sync + 'static,
        OF: Fn(F) -> Next<U, E> + Send + Sync + 'static,
    {
        let parent = self.clone();
        let handlers = Arc::new((on_success, on_failure));
        Deferred::new(move |ok: Callback<U>, err: Callback<E>| {
            let stages = CancelGroup::default();
            let on_success = {
                let handlers = Arc::clone(&handlers);
                let (ok, err, stages) = (ok.clone(), err.clone(), stages.clone());
                move |value: S| resume((handlers.0)(value), ok, err, &stages)
            };
            let on_failure = {
                let handlers = Arc::clone(&handlers);
                let stages = stages.clone();
                move |error: F| resume((handlers.1)(error), ok, err, &stages)
            };
            stages.push(parent.extract(on_success, on_failure));
            stages.handle()
        })
    }

    /// Transform the success value; failures pass through untouched.
    pub fn map<U, M>(&self, f: M) -> Deferred<U, F>
    where
        U: Send + 'static,
        M: Fn(S) -> U + Send + Sync + 'static,
    {
        self.chain(move |value| Next::Success(f(value)), Next::Failure)
    }

    /// Transform the success value with a fallible function.
    ///
    /// An `Err` from `f` fails the chain with that error.
    pub fn try_map<U, M>(&self, f: M) -> Deferred<U, F>
    where
        U: Send + 'static,
        M: Fn(S) -> Result<U, F> + Send + Sync + 'static,
    {
        self.chain(move |value| Next::from_value(f(value)), Next::Failure)
    }

    /// Transform the failure value; successes pass through untouched.
    pub fn map_err<E, M>(&self, f: M) -> Deferred<S, E>
    where
        E: Send + 'static,
        M: Fn(F) -> E + Send + Sync + 'static,
    {
        self.chain(Next::Success, move |error| Next::Failure(f(error)))
    }

    /// Continue with another computation on success.
    ///
    /// On failure `f` is never called and the failure passes through.
    pub fn flat_map<U, M>(&self, f: M) -> Deferred<U, F>
    where
        U: Send + 'static,
        M: Fn(S) -> Deferred<U, F> + Send + Sync + 'static,
    {
        self.chain(move |value| Next::Chain(f(value)), Next::Failure)
    }

    /// [`Deferred::flat_map`] for a continuation that may fail before
    /// producing the next computation.
    pub fn try_flat_map<U, M>(&self, f: M) -> Deferred<U, F>
    where
        U: Send + 'static,
        M: Fn(S) -> Result<Deferred<U, F>, F> + Send + Sync + 'static,
    {
        self.chain(move |value| Next::from_chain(f(value)), Next::Failure)
    }

    /// Continue with another computation on failure (recovery).
    pub fn flat_map_err<E, M>(&self, f: M) -> Deferred<S, E>
    where
        E: Send + 'static,
        M: Fn(F) -> Deferred<S, E> + Send + Sync + 'static,
    {
        self.chain(Next::Success, move |error| Next::Chain(f(error)))
    }

    /// [`Deferred::flat_map_err`] for a recovery that may itself fail.
    pub fn try_flat_map_err<E, M>(&self, f: M) -> Deferred<S, E>
    where
        E: Send + 'static,
        M: Fn(F) -> Result<Deferred<S, E>, E> + Send + Sync + 'static,
    {
        self.chain(Next::Success, move |error| Next::from_chain(f(error)))
    }

    /// Exchange the success and failure channels.
    pub fn swap(&self) -> Deferred<F, S> {
        self.chain(Next::Failure, Next::Success)
    }

    /// Fold both channels into a success.
    ///
    /// The failure channel keeps its type but is never used.
    pub fn match_with<U, OS, OF>(&self, on_success: OS, on_failure: OF) -> Deferred<U, F>
    where
        U: Send + 'static,
        OS: Fn(S) -> U + Send + Sync + 'static,
        OF: Fn(F) -> U + Send + Sync + 'static,
    {
        self.chain(
            move |value| Next::Success(on_success(value)),
            move |error| Next::Success(on_failure(error)),
        )
    }

    /// Fold both channels into a failure.
    pub fn match_err_with<U, OS, OF>(&self, on_success: OS, on_failure: OF) -> Deferred<S, U>
    where
        U: Send + 'static,
        OS: Fn(S) -> U + Send + Sync + 'static,
        OF: Fn(F) -> U + Send + Sync + 'static,
    {
        self.chain(
            move |value| Next::Failure(on_success(value)),
            move |error| Next::Failure(on_failure(error)),
        )
    }

    /// Continue with the computation returned by the handler of whichever
    /// channel settled. The result is exactly that computation.
    pub fn flat_match<U, E, OS, OF>(&self, on_success: OS, on_failure: OF) -> Deferred<U, E>
    where
        U: Send + 'static,
        E: Send + 'static,
        OS: Fn(S) -> Deferred<U, E> + Send + Sync + 'static,
        OF: Fn(F) -> Deferred<U, E> + Send + Sync + 'static,
    {
        self.chain(
            move |value| Next::Chain(on_success(value)),
            move |error| Next::Chain(on_failure(error)),
        )
    }

    /// [`Deferred::flat_match`] landing on the failure channel: the handler's
    /// success becomes the chain's failure and its failure the chain's success.
    pub fn flat_match_err<U, E, OS, OF>(&self, on_success: OS, on_failure: OF) -> Deferred<E, U>
    where
        U: Send + 'static,
        E: Send + 'static,
        OS: Fn(S) -> Deferred<U, E> + Send + Sync + 'static,
        OF: Fn(F) -> Deferred<U, E> + Send + Sync + 'static,
    {
        self.flat_match(on_success, on_failure).swap()
    }

    /// Observe the success value without changing it.
    pub fn tap<T>(&self, f: T) -> Deferred<S, F>
    where
        T: Fn(&S) + Send + Sync + 'static,
    {
        self.chain(
            move |value| {
                f(&value);
                Next::Success(value)
            },
            Next::Failure,
        )
    }

    /// Observe the success value; an `Err` from `f` fails the chain.
    pub fn try_tap<T>(&self, f: T) -> Deferred<S, F>
    where
        T: Fn(&S) -> Result<(), F> + Send + Sync + 'static,
    {
        self.chain(
            move |value| match f(&value) {
                Ok(()) => Next::Success(value),
                Err(error) => Next::Failure(error),
            },
            Next::Failure,
        )
    }

    /// Observe the failure value without changing it.
    pub fn tap_err<T>(&self, f: T) -> Deferred<S, F>
    where
        T: Fn(&F) + Send + Sync + 'static,
    {
        self.chain(Next::Success, move |error| {
            f(&error);
            Next::Failure(error)
        })
    }

    /// Observe the failure value; an `Err` from `f` replaces the failure.
    pub fn try_tap_err<T>(&self, f: T) -> Deferred<S, F>
    where
        T: Fn(&F) -> Result<(), F> + Send + Sync + 'static,
    {
        self.chain(Next::Success, move |error| match f(&error) {
            Ok(()) => Next::Failure(error),
            Err(replaced) => Next::Failure(replaced),
        })
    }

    /// Always succeed with the outcome of this computation.
    pub fn reflect(&self) -> Deferred<Outcome<S, F>, F> {
        self.chain(
            |value| Next::Success(Outcome::Success(value)),
            |error| Next::Success(Outcome::Failure(error)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deferred::{lock, Cancel};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio_test::block_on;

    type Num = Deferred<i32, String>;

    fn ok(value: i32) -> Num {
        Deferred::of(value)
    }

    fn fail(error: &str) -> Num {
        Deferred::reject(error.to_string())
    }

    #[test]
    fn test_map_and_map_err() {
        assert_eq!(block_on(ok(2).map(|x| x * 10).settle()), Ok(20));
        assert_eq!(block_on(fail("e").map(|x| x * 10).settle()), Err("e".into()));

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let untouched = ok(4).map_err(move |e: String| {
            counter.fetch_add(1, Ordering::SeqCst);
            e.len()
        });
        assert_eq!(block_on(untouched.settle()), Ok(4));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert_eq!(block_on(fail("four").map_err(|e| e.len()).settle()), Err(4));
    }

    #[test]
    fn test_try_map_routes_errors_to_failure() {
        let parsed = Deferred::<&'static str, String>::of("12")
            .try_map(|s| s.parse::<i32>().map_err(|e| e.to_string()));
        assert_eq!(block_on(parsed.settle()), Ok(12));

        let broken = Deferred::<&'static str, String>::of("x")
            .try_map(|s| s.parse::<i32>().map_err(|e| e.to_string()));
        assert_eq!(
            block_on(broken.settle()),
            Err("invalid digit found in string".to_string())
        );
    }

    #[test]
    fn test_flat_map_variants() {
        let chained = ok(3).flat_map(|x| ok(x + 1));
        assert_eq!(block_on(chained.settle()), Ok(4));

        let refused = ok(3).try_flat_map(|x| {
            if x > 2 {
                Err(format!("{x} too big"))
            } else {
                Ok(ok(x))
            }
        });
        assert_eq!(block_on(refused.settle()), Err("3 too big".to_string()));

        let recovered = fail("e").flat_map_err(|e| Deferred::<i32, usize>::of(e.len() as i32));
        assert_eq!(block_on(recovered.settle()), Ok(1));

        let still_failing =
            fail("e").try_flat_map_err(|e| Err::<Deferred<i32, usize>, usize>(e.len() + 1));
        assert_eq!(block_on(still_failing.settle()), Err(2));
    }

    #[test]
    fn test_swap_exchanges_channels() {
        assert_eq!(block_on(ok(1).swap().settle()), Err(1));
        assert_eq!(block_on(fail("e").swap().settle()), Ok("e".to_string()));
    }

    #[test]
    fn test_match_variants() {
        let described = fail("e").match_with(|v| format!("ok {v}"), |e| format!("err {e}"));
        assert_eq!(block_on(described.settle()), Ok("err e".to_string()));

        let as_failure = ok(2).match_err_with(|v| v * 2, |e| e.len() as i32);
        assert_eq!(block_on(as_failure.settle()), Err(4));

        let flat = ok(2).flat_match(
            |v| Deferred::<String, ()>::of(v.to_string()),
            |_| Deferred::reject(()),
        );
        assert_eq!(block_on(flat.settle()), Ok("2".to_string()));

        let flat_err = fail("e").flat_match_err(
            |_| Deferred::<u8, String>::of(1),
            |e| Deferred::<u8, String>::of(e.len() as u8),
        );
        assert_eq!(block_on(flat_err.settle()), Err(1));
    }

    #[test]
    fn test_tap_observes_without_changing() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (on_ok, on_err) = (Arc::clone(&seen), Arc::clone(&seen));

        let tapped = ok(5).tap(move |v| lock(&on_ok).push(format!("ok {v}")));
        assert_eq!(block_on(tapped.settle()), Ok(5));

        let tapped = fail("e").tap(|_| panic!("tap must not run on failure"));
        assert_eq!(block_on(tapped.settle()), Err("e".to_string()));

        let tapped = fail("e").tap_err(move |e| lock(&on_err).push(format!("err {e}")));
        assert_eq!(block_on(tapped.settle()), Err("e".to_string()));

        assert_eq!(*lock(&seen), vec!["ok 5", "err e"]);
    }

    /// A failing tap callback becomes a chain failure
    #[test]
    fn test_try_tap_failure_propagates() {
        let rejected = ok(5).try_tap(|v| {
            if *v > 3 {
                Err(format!("{v} rejected by audit"))
            } else {
                Ok(())
            }
        });
        assert_eq!(block_on(rejected.settle()), Err("5 rejected by audit".to_string()));

        let replaced = fail("e").try_tap_err(|e| Err(format!("{e} (logged)")));
        assert_eq!(block_on(replaced.settle()), Err("e (logged)".to_string()));

        let kept = fail("e").try_tap_err(|_| Ok(()));
        assert_eq!(block_on(kept.settle()), Err("e".to_string()));
    }

    #[test]
    fn test_reflect_never_fails() {
        assert_eq!(block_on(ok(1).reflect().settle()), Ok(Outcome::success(1)));
        assert_eq!(
            block_on(fail("e").reflect().settle()),
            Ok(Outcome::failure("e".to_string()))
        );
    }

    /// Cancelling a chain stops the stage in flight and never starts the next
    #[test]
    fn test_cancel_stops_chain_before_next_stage() {
        let parked: Arc<Mutex<Option<Callback<i32>>>> = Arc::default();
        let slot = Arc::clone(&parked);
        let first: Num = Deferred::new(move |ok, _| {
            *lock(&slot) = Some(ok);
            Cancel::trivial()
        });

        let started = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&started);
        let chained = first.flat_map(move |x| {
            counter.fetch_add(1, Ordering::SeqCst);
            ok(x)
        });

        let cancel = chained.extract(|_| panic!("cancelled chain settled"), |_| {});
        assert!(cancel.cancel());

        let late = lock(&parked).take().unwrap();
        assert!(!late.call(1));
        assert_eq!(started.load(Ordering::SeqCst), 0);
    }
}
