// Copyright 2025 Cowboy AI, LLC.

//! Cooperative cancellation handles

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::task::AbortHandle;

use super::lock;

type CancelFn = Box<dyn FnOnce() -> bool + Send>;

/// The cancellation function of one trigger.
///
/// A `Cancel` runs its function at most once; repeated calls return `false`.
/// Clones share the same function, so any clone may cancel.
#[derive(Clone)]
pub struct Cancel {
    inner: Arc<Mutex<Option<CancelFn>>>,
}

impl Cancel {
    /// Wrap a cancellation function
    pub fn new(cancel: impl FnOnce() -> bool + Send + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Some(Box::new(cancel)))),
        }
    }

    /// A cancellation function with nothing to stop; reports `true`
    pub fn trivial() -> Self {
        Self::new(|| true)
    }

    /// Abort a Tokio task, e.g. a pending timer.
    ///
    /// Reports `true` when the task had not finished yet.
    pub fn abort(handle: AbortHandle) -> Self {
        Self::new(move || {
            let running = !handle.is_finished();
            handle.abort();
            running
        })
    }

    /// Run the cancellation function if it has not run yet
    pub fn cancel(&self) -> bool {
        let cancel = lock(&self.inner).take();
        match cancel {
            Some(cancel) => cancel(),
            None => false,
        }
    }

    /// True once `cancel` has been called on any clone
    pub fn is_spent(&self) -> bool {
        lock(&self.inner).is_none()
    }
}

impl fmt::Debug for Cancel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cancel")
            .field("spent", &self.is_spent())
            .finish()
    }
}

/// Handles of every stage started by a chained computation.
///
/// Once cancelled, handles pushed later are cancelled on arrival, so a stage
/// that starts concurrently with cancellation is still stopped.
#[derive(Clone, Default)]
pub(crate) struct CancelGroup {
    inner: Arc<GroupInner>,
}

#[derive(Default)]
struct GroupInner {
    cancelled: AtomicBool,
    handles: Mutex<Vec<Cancel>>,
}

impl CancelGroup {
    pub(crate) fn push(&self, handle: Cancel) {
        let mut handles = lock(&self.inner.handles);
        if self.is_cancelled() {
            drop(handles);
            handle.cancel();
            return;
        }
        handles.push(handle);
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Cancel every stage; `true` if any pending settlement was suppressed
    pub(crate) fn cancel(&self) -> bool {
        let handles = {
            let mut handles = lock(&self.inner.handles);
            self.inner.cancelled.store(true, Ordering::Release);
            std::mem::take(&mut *handles)
        };
        handles
            .iter()
            .fold(false, |suppressed, handle| handle.cancel() || suppressed)
    }

    /// A `Cancel` that cancels the whole group
    pub(crate) fn handle(&self) -> Cancel {
        let group = self.clone();
        Cancel::new(move || group.cancel())
    }
}
