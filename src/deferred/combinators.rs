// Copyright 2025 Cowboy AI, LLC.

//! List combinators
//!
//! - [`seq`] / [`seq_safe`]: one computation at a time, in input order
//! - [`all`] / [`all_safe`]: concurrently, optionally in batches
//! - [`race`]: the first settlement wins
//!
//! Results always follow input order. The `_safe` variants never fail and
//! report every element as an [`Outcome`].

use std::sync::{Arc, Mutex};

use tracing::{debug, trace};

use super::cancel::CancelGroup;
use super::handoff::Handoff;
use super::{lock, Callback, Cancel, Deferred};
use crate::concurrency::Concurrency;
use crate::outcome::Outcome;

/// Run computations one after another.
///
/// Computation `i + 1` starts only after computation `i` succeeded. The first
/// failure fails the whole sequence and the remaining computations are never
/// started. On success the values come back in input order.
///
/// ```rust
/// use cim_outcome::{seq, Deferred};
///
/// let steps: Vec<Deferred<u8, String>> = vec![Deferred::of(1), Deferred::of(2)];
/// assert_eq!(tokio_test::block_on(seq(steps).settle()), Ok(vec![1, 2]));
/// ```
pub fn seq<S, F, I>(futures: I) -> Deferred<Vec<S>, F>
where
    S: Send + 'static,
    F: Send + 'static,
    I: IntoIterator<Item = Deferred<S, F>>,
{
    let futures: Arc<[Deferred<S, F>]> = futures.into_iter().collect();
    Deferred::new(move |ok, err| {
        let sequence = Arc::new(Sequence {
            futures: Arc::clone(&futures),
            collected: Mutex::new(Vec::with_capacity(futures.len())),
            ok,
            err,
            stages: CancelGroup::default(),
        });
        let handle = sequence.stages.handle();
        sequence.run_from(0);
        handle
    })
}

/// One trigger of [`seq`]
struct Sequence<S, F> {
    futures: Arc<[Deferred<S, F>]>,
    collected: Mutex<Vec<S>>,
    ok: Callback<Vec<S>>,
    err: Callback<F>,
    stages: CancelGroup,
}

impl<S, F> Sequence<S, F>
where
    S: Send + 'static,
    F: Send + 'static,
{
    /// Start the computation at `index` and keep going in this loop while
    /// each one succeeds during its own `extract`.
    fn run_from(self: Arc<Self>, mut index: usize) {
        loop {
            if self.stages.is_cancelled() {
                return;
            }
            let Some(current) = self.futures.get(index).cloned() else {
                let values = std::mem::take(&mut *lock(&self.collected));
                self.ok.call(values);
                return;
            };

            let handoff = Arc::new(Handoff::<S>::default());
            let on_success = {
                let (handoff, sequence) = (Arc::clone(&handoff), Arc::clone(&self));
                move |value: S| {
                    if let Some(value) = handoff.offer(value) {
                        lock(&sequence.collected).push(value);
                        sequence.run_from(index + 1);
                    }
                }
            };
            let remaining = self.futures.len() - index - 1;
            let err = self.err.clone();
            let on_failure = move |error: F| {
                if remaining > 0 {
                    debug!(index, remaining, "sequence failed; remaining computations not started");
                }
                err.call(error);
            };
            self.stages.push(current.extract(on_success, on_failure));

            match handoff.take_or_detach() {
                Some(value) => {
                    lock(&self.collected).push(value);
                    index += 1;
                }
                None => return,
            }
        }
    }
}

/// Run computations one after another, collecting every outcome.
///
/// Never short-circuits and never fails: each slot holds the success or the
/// failure of the computation at that index.
pub fn seq_safe<S, F, I>(futures: I) -> Deferred<Vec<Outcome<S, F>>, F>
where
    S: Send + 'static,
    F: Send + 'static,
    I: IntoIterator<Item = Deferred<S, F>>,
{
    seq(futures.into_iter().map(|future| future.reflect()))
}

/// Run computations concurrently.
///
/// A `limit` of `0` starts every computation at trigger time. A limit of `n`
/// splits the input into consecutive batches of `n`; a batch starts only
/// after the previous one has fully succeeded. The first failure observed
/// fails the aggregate and cancels the computations still in flight. Values
/// come back in input order regardless of completion order.
pub fn all<S, F, I>(futures: I, limit: usize) -> Deferred<Vec<S>, F>
where
    S: Send + 'static,
    F: Send + 'static,
    I: IntoIterator<Item = Deferred<S, F>>,
{
    all_with(futures, Concurrency::from(limit))
}

/// [`all`] driven by a configured [`Concurrency`].
pub fn all_with<S, F, I>(futures: I, concurrency: Concurrency) -> Deferred<Vec<S>, F>
where
    S: Send + 'static,
    F: Send + 'static,
    I: IntoIterator<Item = Deferred<S, F>>,
{
    let futures: Vec<Deferred<S, F>> = futures.into_iter().collect();
    match concurrency {
        Concurrency::Unbounded => all_unbounded(futures.into()),
        Concurrency::Limited(limit) => {
            trace!(
                total = futures.len(),
                batch = limit.get(),
                "scheduling parallel computations in batches"
            );
            let batches: Vec<Deferred<Vec<S>, F>> = futures
                .chunks(limit.get())
                .map(|batch| all_unbounded(batch.into()))
                .collect();
            seq(batches).map(|batches| batches.into_iter().flatten().collect())
        }
    }
}

/// Run computations concurrently, collecting every outcome.
///
/// Batching follows [`all`]; the aggregate never fails.
pub fn all_safe<S, F, I>(futures: I, limit: usize) -> Deferred<Vec<Outcome<S, F>>, F>
where
    S: Send + 'static,
    F: Send + 'static,
    I: IntoIterator<Item = Deferred<S, F>>,
{
    all_safe_with(futures, Concurrency::from(limit))
}

/// [`all_safe`] driven by a configured [`Concurrency`].
pub fn all_safe_with<S, F, I>(
    futures: I,
    concurrency: Concurrency,
) -> Deferred<Vec<Outcome<S, F>>, F>
where
    S: Send + 'static,
    F: Send + 'static,
    I: IntoIterator<Item = Deferred<S, F>>,
{
    all_with(futures.into_iter().map(|future| future.reflect()), concurrency)
}

struct Slots<S> {
    values: Vec<Option<S>>,
    remaining: usize,
}

impl<S> Slots<S> {
    fn new(len: usize) -> Self {
        Self {
            values: (0..len).map(|_| None).collect(),
            remaining: len,
        }
    }

    /// Store a value; returns every value once the last slot is filled.
    fn fill(&mut self, index: usize, value: S) -> Option<Vec<S>> {
        self.values[index] = Some(value);
        self.remaining -= 1;
        if self.remaining > 0 {
            return None;
        }
        Some(std::mem::take(&mut self.values).into_iter().flatten().collect())
    }
}

fn all_unbounded<S, F>(futures: Arc<[Deferred<S, F>]>) -> Deferred<Vec<S>, F>
where
    S: Send + 'static,
    F: Send + 'static,
{
    Deferred::new(move |ok, err| {
        if futures.is_empty() {
            ok.call(Vec::new());
            return Cancel::trivial();
        }
        let slots = Arc::new(Mutex::new(Slots::new(futures.len())));
        let in_flight = CancelGroup::default();
        for (index, future) in futures.iter().enumerate() {
            if !ok.is_pending() {
                break;
            }
            let (slots, ok, err) = (Arc::clone(&slots), ok.clone(), err.clone());
            let siblings = in_flight.clone();
            let handle = future.extract(
                move |value| {
                    let filled = lock(&slots).fill(index, value);
                    if let Some(values) = filled {
                        ok.call(values);
                    }
                },
                move |error| {
                    if err.call(error) {
                        debug!(index, "parallel computation failed; cancelling the rest");
                        siblings.cancel();
                    }
                },
            );
            in_flight.push(handle);
        }
        in_flight.handle()
    })
}

/// Settle with whichever computation settles first, on either channel.
///
/// The others are cancelled. An empty input never settles.
pub fn race<S, F, I>(futures: I) -> Deferred<S, F>
where
    S: Send + 'static,
    F: Send + 'static,
    I: IntoIterator<Item = Deferred<S, F>>,
{
    let futures: Arc<[Deferred<S, F>]> = futures.into_iter().collect();
    Deferred::new(move |ok, err| {
        let contenders = CancelGroup::default();
        for (index, future) in futures.iter().enumerate() {
            if !ok.is_pending() {
                break;
            }
            let (ok, err) = (ok.clone(), err.clone());
            let (on_success, on_failure) = (contenders.clone(), contenders.clone());
            let handle = future.extract(
                move |value| {
                    if ok.call(value) {
                        trace!(index, "race won by success");
                        on_success.cancel();
                    }
                },
                move |error| {
                    if err.call(error) {
                        trace!(index, "race won by failure");
                        on_failure.cancel();
                    }
                },
            );
            contenders.push(handle);
        }
        contenders.handle()
    })
}

impl<S, F> Deferred<S, F>
where
    S: Send + 'static,
    F: Send + 'static,
{
    /// Run both computations concurrently and pair their values.
    ///
    /// Either failure fails the pair and cancels the other side.
    pub fn zip<T>(&self, other: &Deferred<T, F>) -> Deferred<(S, T), F>
    where
        T: Send + 'static,
    {
        let (left, right) = (self.clone(), other.clone());
        Deferred::new(move |ok: Callback<(S, T)>, err: Callback<F>| {
            let pair: Arc<Mutex<(Option<S>, Option<T>)>> = Arc::default();
            let sides = CancelGroup::default();

            let on_left = {
                let (pair, ok) = (Arc::clone(&pair), ok.clone());
                move |value: S| {
                    let both = {
                        let mut pair = lock(&pair);
                        pair.0 = Some(value);
                        take_pair(&mut pair)
                    };
                    if let Some(both) = both {
                        ok.call(both);
                    }
                }
            };
            let on_right = move |value: T| {
                let both = {
                    let mut pair = lock(&pair);
                    pair.1 = Some(value);
                    take_pair(&mut pair)
                };
                if let Some(both) = both {
                    ok.call(both);
                }
            };

            sides.push(left.extract(on_left, fail_and_cancel(err.clone(), sides.clone())));
            if err.is_pending() {
                sides.push(right.extract(on_right, fail_and_cancel(err, sides.clone())));
            }
            sides.handle()
        })
    }

    /// Run `other` after this computation succeeds and pair their values.
    pub fn zip_seq<T>(&self, other: &Deferred<T, F>) -> Deferred<(S, T), F>
    where
        T: Send + 'static,
    {
        let (first, second) = (self.clone(), other.clone());
        Deferred::new(move |ok: Callback<(S, T)>, err: Callback<F>| {
            let stages = CancelGroup::default();
            let then = {
                let (second, stages, err) = (second.clone(), stages.clone(), err.clone());
                move |value: S| {
                    if stages.is_cancelled() {
                        return;
                    }
                    let handle = second.extract(
                        move |other| {
                            ok.call((value, other));
                        },
                        move |error| {
                            err.call(error);
                        },
                    );
                    stages.push(handle);
                }
            };
            stages.push(first.extract(then, move |error| {
                err.call(error);
            }));
            stages.handle()
        })
    }
}

fn take_pair<S, T>(pair: &mut (Option<S>, Option<T>)) -> Option<(S, T)> {
    match pair {
        (Some(_), Some(_)) => pair.0.take().zip(pair.1.take()),
        _ => None,
    }
}

fn fail_and_cancel<F: Send + 'static>(
    err: Callback<F>,
    sides: CancelGroup,
) -> impl FnOnce(F) + Send + 'static {
    move |error| {
        if err.call(error) {
            sides.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_test::block_on;

    fn counted(counter: &Arc<AtomicUsize>, value: i32) -> Deferred<i32, String> {
        let counter = Arc::clone(counter);
        Deferred::new(move |ok, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            ok.call(value);
            Cancel::trivial()
        })
    }

    #[test]
    fn test_seq_collects_in_order() {
        let futures = vec![Deferred::of(1), Deferred::of(2), Deferred::of(3)];
        assert_eq!(block_on(seq::<i32, String, _>(futures).settle()), Ok(vec![1, 2, 3]));
    }

    #[test]
    fn test_seq_stops_at_first_failure() {
        let started = Arc::new(AtomicUsize::new(0));
        let futures = vec![
            counted(&started, 1),
            Deferred::reject("second".to_string()),
            counted(&started, 3),
        ];

        assert_eq!(block_on(seq(futures).settle()), Err("second".to_string()));
        assert_eq!(started.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_seq_safe_runs_everything() {
        let started = Arc::new(AtomicUsize::new(0));
        let futures = vec![
            counted(&started, 1),
            Deferred::reject("second".to_string()),
            counted(&started, 3),
        ];

        let outcomes = block_on(seq_safe(futures).settle()).unwrap();
        assert_eq!(
            outcomes,
            vec![
                Outcome::success(1),
                Outcome::failure("second".to_string()),
                Outcome::success(3)
            ]
        );
        assert_eq!(started.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_empty_inputs_resolve_to_empty_lists() {
        let none: Vec<Deferred<i32, ()>> = Vec::new();
        assert_eq!(block_on(seq(none.clone()).settle()), Ok(vec![]));
        assert_eq!(block_on(all(none.clone(), 0).settle()), Ok(vec![]));
        assert_eq!(block_on(all(none.clone(), 4).settle()), Ok(vec![]));
        assert_eq!(block_on(all_safe(none, 0).settle()), Ok(vec![]));
    }

    #[test]
    fn test_all_synchronous_failure_stops_starting_more() {
        let started = Arc::new(AtomicUsize::new(0));
        let futures = vec![
            Deferred::reject("first".to_string()),
            counted(&started, 2),
        ];
        assert_eq!(block_on(all(futures, 0).settle()), Err("first".to_string()));
        assert_eq!(started.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_race_takes_first_settlement() {
        let futures: Vec<Deferred<i32, String>> =
            vec![Deferred::reject("fast".to_string()), Deferred::of(1)];
        assert_eq!(block_on(race(futures).settle()), Err("fast".to_string()));
    }

    #[test]
    fn test_zip_pairs_values() {
        let left: Deferred<i32, String> = Deferred::of(1);
        let right: Deferred<&'static str, String> = Deferred::of("one");
        assert_eq!(block_on(left.zip(&right).settle()), Ok((1, "one")));
        assert_eq!(block_on(left.zip_seq(&right).settle()), Ok((1, "one")));

        let broken: Deferred<&'static str, String> = Deferred::reject("no".to_string());
        assert_eq!(block_on(left.zip(&broken).settle()), Err("no".to_string()));
        assert_eq!(block_on(left.zip_seq(&broken).settle()), Err("no".to_string()));
    }
}
