// Copyright 2025 Cowboy AI, LLC.

//! Hand-off slot for drivers that run computations one after another.
//!
//! A driver extracts the current computation with a success callback that
//! [`offer`](Handoff::offer)s its value here. When the computation settles
//! during `extract`, the driver finds the value with
//! [`take_or_detach`](Handoff::take_or_detach) and continues in its own loop,
//! so long runs of synchronous computations use constant stack. When the
//! value arrives after the driver returned, `offer` hands it back and the
//! callback resumes the driver itself.

use std::mem;
use std::sync::Mutex;

use super::lock;

enum State<T> {
    Waiting,
    Ready(T),
    Detached,
}

pub(crate) struct Handoff<T>(Mutex<State<T>>);

impl<T> Default for Handoff<T> {
    fn default() -> Self {
        Self(Mutex::new(State::Waiting))
    }
}

impl<T> Handoff<T> {
    /// Leave `value` for the driver if it is still inside `extract`.
    ///
    /// Returns the value back once the driver has detached; the caller must
    /// then continue the run.
    pub(crate) fn offer(&self, value: T) -> Option<T> {
        let mut state = lock(&self.0);
        if matches!(*state, State::Waiting) {
            *state = State::Ready(value);
            None
        } else {
            Some(value)
        }
    }

    /// Take a value settled during `extract`, or detach so that a later
    /// settlement continues the run through its callback.
    pub(crate) fn take_or_detach(&self) -> Option<T> {
        match mem::replace(&mut *lock(&self.0), State::Detached) {
            State::Ready(value) => Some(value),
            State::Waiting | State::Detached => None,
        }
    }
}
