// Copyright 2025 Cowboy AI, LLC.

//! Settlement callbacks handed to an action
//!
//! Each trigger creates one [`Gate`] shared by its success and failure
//! callbacks. The gate moves from pending to either settled or cancelled
//! exactly once, which is what makes settlement single-shot.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use super::lock;

const PENDING: u8 = 0;
const SETTLED: u8 = 1;
const CANCELLED: u8 = 2;

/// Settlement state of one trigger invocation
#[derive(Debug, Default)]
pub(crate) struct Gate(AtomicU8);

impl Gate {
    /// Claim the settlement. Only the first caller wins.
    pub(crate) fn settle(&self) -> bool {
        self.transition(SETTLED)
    }

    /// Close the gate before settlement. Returns `false` once settled.
    pub(crate) fn cancel(&self) -> bool {
        self.transition(CANCELLED)
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.0.load(Ordering::Acquire) == PENDING
    }

    fn transition(&self, to: u8) -> bool {
        self.0
            .compare_exchange(PENDING, to, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

type Handler<T> = Box<dyn FnOnce(T) + Send>;

/// One channel of a trigger: `on_success` or `on_failure`.
///
/// Callbacks are cheap to clone and may be called from any thread. Of the two
/// callbacks given to an action, only the first call has an effect; every
/// later call (on either channel) returns `false`, as does any call after
/// the trigger was cancelled.
pub struct Callback<T> {
    gate: Arc<Gate>,
    handler: Arc<Mutex<Option<Handler<T>>>>,
}

impl<T> Callback<T> {
    pub(crate) fn new(gate: Arc<Gate>, handler: impl FnOnce(T) + Send + 'static) -> Self {
        Self {
            gate,
            handler: Arc::new(Mutex::new(Some(Box::new(handler)))),
        }
    }

    /// Settle the trigger through this channel.
    ///
    /// Returns `true` if this call settled the trigger.
    pub fn call(&self, value: T) -> bool {
        if !self.gate.settle() {
            return false;
        }
        let handler = lock(&self.handler).take();
        match handler {
            Some(handler) => {
                handler(value);
                true
            }
            None => false,
        }
    }

    /// True while neither channel has settled and the trigger is not cancelled
    pub fn is_pending(&self) -> bool {
        self.gate.is_pending()
    }
}

impl<T> Clone for Callback<T> {
    fn clone(&self) -> Self {
        Self {
            gate: Arc::clone(&self.gate),
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<T> fmt::Debug for Callback<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("pending", &self.is_pending())
            .finish()
    }
}
