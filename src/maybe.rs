// Copyright 2025 Cowboy AI, LLC.

//! Optional-value container
//!
//! `Maybe<T>` holds either a value or nothing. It is immutable: every
//! transformation consumes the container and returns a new one. Operations on
//! `Empty` propagate emptiness (`map`, `flat_map`) or dispatch to the empty
//! handler (`match_with`, `flat_match`).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::outcome::Outcome;

/// A value that may be absent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", content = "value")]
pub enum Maybe<T> {
    /// No value
    Empty,
    /// A value is present
    Present(T),
}

impl<T> Maybe<T> {
    /// Wrap a value
    pub fn present(value: T) -> Self {
        Maybe::Present(value)
    }

    /// The empty container
    pub fn empty() -> Self {
        Maybe::Empty
    }

    /// Build from an `Option`; `None` normalizes to `Empty`.
    ///
    /// ```rust
    /// use cim_outcome::Maybe;
    ///
    /// assert_eq!(Maybe::from_nullable(Some(3)), Maybe::present(3));
    /// assert_eq!(Maybe::<i32>::from_nullable(None), Maybe::empty());
    /// ```
    pub fn from_nullable(value: Option<T>) -> Self {
        match value {
            Some(value) => Maybe::Present(value),
            None => Maybe::Empty,
        }
    }

    /// Transform the present value
    pub fn map<U, M>(self, f: M) -> Maybe<U>
    where
        M: FnOnce(T) -> U,
    {
        match self {
            Maybe::Present(value) => Maybe::Present(f(value)),
            Maybe::Empty => Maybe::Empty,
        }
    }

    /// Chain a computation that may itself be empty
    pub fn flat_map<U, M>(self, f: M) -> Maybe<U>
    where
        M: FnOnce(T) -> Maybe<U>,
    {
        match self {
            Maybe::Present(value) => f(value),
            Maybe::Empty => Maybe::Empty,
        }
    }

    /// Dispatch on the variant and return a plain value
    pub fn match_with<U>(self, present: impl FnOnce(T) -> U, empty: impl FnOnce() -> U) -> U {
        match self {
            Maybe::Present(value) => present(value),
            Maybe::Empty => empty(),
        }
    }

    /// Dispatch on the variant where both handlers return a new container
    pub fn flat_match<U>(
        self,
        present: impl FnOnce(T) -> Maybe<U>,
        empty: impl FnOnce() -> Maybe<U>,
    ) -> Maybe<U> {
        self.match_with(present, empty)
    }

    /// The present value, or `default`
    pub fn get_or_else(self, default: T) -> T {
        match self {
            Maybe::Present(value) => value,
            Maybe::Empty => default,
        }
    }

    /// The present value, or `None` as the absent sentinel
    pub fn extract(self) -> Option<T> {
        match self {
            Maybe::Present(value) => Some(value),
            Maybe::Empty => None,
        }
    }

    /// True when a value is present
    pub fn is_present(&self) -> bool {
        matches!(self, Maybe::Present(_))
    }

    /// True when no value is present
    pub fn is_empty(&self) -> bool {
        matches!(self, Maybe::Empty)
    }

    /// Borrow the contents
    pub fn as_ref(&self) -> Maybe<&T> {
        match self {
            Maybe::Present(value) => Maybe::Present(value),
            Maybe::Empty => Maybe::Empty,
        }
    }

    /// Convert into a two-branch result, using `error` for the empty case
    pub fn to_outcome<F>(self, error: F) -> Outcome<T, F> {
        match self {
            Maybe::Present(value) => Outcome::success(value),
            Maybe::Empty => Outcome::failure(error),
        }
    }
}

impl<T> Default for Maybe<T> {
    fn default() -> Self {
        Maybe::Empty
    }
}

impl<T> From<Option<T>> for Maybe<T> {
    fn from(value: Option<T>) -> Self {
        Maybe::from_nullable(value)
    }
}

impl<T> From<Maybe<T>> for Option<T> {
    fn from(value: Maybe<T>) -> Self {
        value.extract()
    }
}
