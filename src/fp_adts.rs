// Copyright (c) 2025 - Cowboy AI, LLC.

//! Simple algebraic data types (ADTs) shared by the containers.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A standard Either ADT: Left(L) or Right(R).
///
/// In this codebase we follow the convention that `Left` holds the
/// alternate representation and `Right` holds the expected value. The
/// total extraction of an [`Outcome`](crate::Outcome) therefore yields
/// `Either<F, S>`: `Left(failure)` or `Right(success)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", content = "value")]
pub enum Either<L, R> {
    /// Left branch
    Left(L),
    /// Right branch
    Right(R),
}

impl<L, R> Either<L, R> {
    /// Map over the Right value.
    pub fn map<T, F>(self, f: F) -> Either<L, T>
    where
        F: FnOnce(R) -> T,
    {
        match self {
            Either::Left(l) => Either::Left(l),
            Either::Right(r) => Either::Right(f(r)),
        }
    }

    /// Map over the Left value.
    pub fn map_left<T, F>(self, f: F) -> Either<T, R>
    where
        F: FnOnce(L) -> T,
    {
        match self {
            Either::Left(l) => Either::Left(f(l)),
            Either::Right(r) => Either::Right(r),
        }
    }

    /// Collapse both branches into one value.
    pub fn either<T>(self, on_left: impl FnOnce(L) -> T, on_right: impl FnOnce(R) -> T) -> T {
        match self {
            Either::Left(l) => on_left(l),
            Either::Right(r) => on_right(r),
        }
    }

    /// Exchange the branches.
    pub fn flip(self) -> Either<R, L> {
        match self {
            Either::Left(l) => Either::Right(l),
            Either::Right(r) => Either::Left(r),
        }
    }

    /// Get a reference to the Left value if present.
    pub fn left(&self) -> Option<&L> {
        match self {
            Either::Left(l) => Some(l),
            _ => None,
        }
    }

    /// Get a reference to the Right value if present.
    pub fn right(&self) -> Option<&R> {
        match self {
            Either::Right(r) => Some(r),
            _ => None,
        }
    }

    /// True for `Left`
    pub fn is_left(&self) -> bool {
        matches!(self, Either::Left(_))
    }

    /// True for `Right`
    pub fn is_right(&self) -> bool {
        matches!(self, Either::Right(_))
    }
}

impl<T> Either<T, T> {
    /// Unwrap whichever branch is populated.
    pub fn into_inner(self) -> T {
        match self {
            Either::Left(v) | Either::Right(v) => v,
        }
    }
}
