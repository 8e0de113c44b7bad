// Copyright 2025 Cowboy AI, LLC.

//! Error types for deferred computations

use std::any::Any;

use thiserror::Error;

/// Errors produced by the crate itself rather than by user computations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeferredError {
    /// A computation wrapped with `Deferred::catch_unwind` panicked
    #[error("Computation panicked: {message}")]
    Panicked {
        /// Panic payload rendered as text
        message: String,
    },

    /// The action dropped both callbacks without settling
    #[error("Computation abandoned without settling")]
    Abandoned,
}

/// Result type for crate-level failures
pub type DeferredResult<T> = Result<T, DeferredError>;

impl DeferredError {
    /// Build a `Panicked` error from a panic payload
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        DeferredError::Panicked {
            message: panic_message(payload.as_ref()),
        }
    }

    /// Check if this error records a panic
    pub fn is_panic(&self) -> bool {
        matches!(self, DeferredError::Panicked { .. })
    }
}

/// Render a panic payload the way the standard panic hook does.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}
