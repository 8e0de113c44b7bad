// Copyright 2025 Cowboy AI, LLC.

//! Two-branch success/failure container
//!
//! `Outcome<S, F>` is the value-level counterpart of
//! [`Deferred`](crate::Deferred): exactly one branch is populated and the
//! branch types evolve independently through `map` and `map_err`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::fp_adts::Either;
use crate::maybe::Maybe;

/// Either a success value or a failure value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", content = "value")]
pub enum Outcome<S, F> {
    /// Success branch
    Success(S),
    /// Failure branch
    Failure(F),
}

impl<S, F> Outcome<S, F> {
    /// Wrap a success value
    pub fn success(value: S) -> Self {
        Outcome::Success(value)
    }

    /// Wrap a failure value
    pub fn failure(error: F) -> Self {
        Outcome::Failure(error)
    }

    /// Transform the success branch; failures pass through
    pub fn map<U, M>(self, f: M) -> Outcome<U, F>
    where
        M: FnOnce(S) -> U,
    {
        match self {
            Outcome::Success(value) => Outcome::Success(f(value)),
            Outcome::Failure(error) => Outcome::Failure(error),
        }
    }

    /// Transform the failure branch; successes pass through
    pub fn map_err<E, M>(self, f: M) -> Outcome<S, E>
    where
        M: FnOnce(F) -> E,
    {
        match self {
            Outcome::Success(value) => Outcome::Success(value),
            Outcome::Failure(error) => Outcome::Failure(f(error)),
        }
    }

    /// Chain on success
    pub fn flat_map<U, M>(self, f: M) -> Outcome<U, F>
    where
        M: FnOnce(S) -> Outcome<U, F>,
    {
        match self {
            Outcome::Success(value) => f(value),
            Outcome::Failure(error) => Outcome::Failure(error),
        }
    }

    /// Chain on failure
    pub fn flat_map_err<E, M>(self, f: M) -> Outcome<S, E>
    where
        M: FnOnce(F) -> Outcome<S, E>,
    {
        match self {
            Outcome::Success(value) => Outcome::Success(value),
            Outcome::Failure(error) => f(error),
        }
    }

    /// Collapse both branches into a plain value
    pub fn match_with<U>(
        self,
        if_success: impl FnOnce(S) -> U,
        if_failure: impl FnOnce(F) -> U,
    ) -> U {
        match self {
            Outcome::Success(value) => if_success(value),
            Outcome::Failure(error) => if_failure(error),
        }
    }

    /// Dispatch on both branches, each handler producing a new outcome
    pub fn flat_match<U, E>(
        self,
        if_success: impl FnOnce(S) -> Outcome<U, E>,
        if_failure: impl FnOnce(F) -> Outcome<U, E>,
    ) -> Outcome<U, E> {
        self.match_with(if_success, if_failure)
    }

    /// Exchange the branches
    pub fn swap(self) -> Outcome<F, S> {
        match self {
            Outcome::Success(value) => Outcome::Failure(value),
            Outcome::Failure(error) => Outcome::Success(error),
        }
    }

    /// The success value, or `default`
    pub fn get_or_else(self, default: S) -> S {
        match self {
            Outcome::Success(value) => value,
            Outcome::Failure(_) => default,
        }
    }

    /// Total extraction: `Right(success)` or `Left(failure)`
    pub fn extract(self) -> Either<F, S> {
        match self {
            Outcome::Success(value) => Either::Right(value),
            Outcome::Failure(error) => Either::Left(error),
        }
    }

    /// True for the success branch
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// True for the failure branch
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure(_))
    }

    /// Success becomes present, failure becomes empty
    pub fn to_option(self) -> Maybe<S> {
        match self {
            Outcome::Success(value) => Maybe::present(value),
            Outcome::Failure(_) => Maybe::empty(),
        }
    }

    /// Convert into a standard `Result`
    pub fn into_result(self) -> Result<S, F> {
        self.into()
    }

    /// Run an imperative body where `?` short-circuits on the first failure.
    ///
    /// ```rust
    /// use cim_outcome::Outcome;
    ///
    /// fn parse(s: &str) -> Outcome<i32, String> {
    ///     s.parse().map_err(|_| format!("bad number: {s}")).into()
    /// }
    ///
    /// let sum: Outcome<i32, String> = Outcome::run(|| {
    ///     let a = parse("2").into_result()?;
    ///     let b = parse("x").into_result()?;
    ///     Ok(a + b)
    /// });
    /// assert_eq!(sum, Outcome::failure("bad number: x".to_string()));
    /// ```
    pub fn run(body: impl FnOnce() -> Result<S, F>) -> Self {
        body().into()
    }
}

impl<T> Outcome<T, T> {
    /// Unwrap whichever branch is populated
    pub fn into_inner(self) -> T {
        self.extract().into_inner()
    }
}

impl<S, F> From<Result<S, F>> for Outcome<S, F> {
    fn from(value: Result<S, F>) -> Self {
        match value {
            Ok(value) => Outcome::Success(value),
            Err(error) => Outcome::Failure(error),
        }
    }
}

impl<S, F> From<Outcome<S, F>> for Result<S, F> {
    fn from(value: Outcome<S, F>) -> Self {
        match value {
            Outcome::Success(value) => Ok(value),
            Outcome::Failure(error) => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_acts_on_success_only() {
        let ok: Outcome<i32, String> = Outcome::success(2);
        assert_eq!(ok.map(|x| x * 3), Outcome::success(6));

        let err: Outcome<i32, String> = Outcome::failure("boom".into());
        assert_eq!(err.map(|x| x * 3), Outcome::failure("boom".to_string()));
    }

    #[test]
    fn test_map_err_changes_failure_type() {
        let err: Outcome<i32, &str> = Outcome::failure("boom");
        let mapped: Outcome<i32, usize> = err.map_err(str::len);
        assert_eq!(mapped, Outcome::failure(4));

        let ok: Outcome<i32, &str> = Outcome::success(1);
        assert_eq!(ok.map_err(str::len), Outcome::success(1));
    }

    #[test]
    fn test_flat_map_and_flat_map_err() {
        let checked = |x: i32| {
            if x > 0 {
                Outcome::success(x)
            } else {
                Outcome::failure("not positive")
            }
        };
        assert_eq!(Outcome::success(3).flat_map(checked), Outcome::success(3));
        assert_eq!(
            Outcome::success(-1).flat_map(checked),
            Outcome::failure("not positive")
        );

        let recovered: Outcome<i32, ()> =
            Outcome::<i32, &str>::failure("x").flat_map_err(|_| Outcome::success(0));
        assert_eq!(recovered, Outcome::success(0));
    }

    #[test]
    fn test_match_and_flat_match() {
        let text = Outcome::<i32, &str>::failure("bad").match_with(|v| v.to_string(), String::from);
        assert_eq!(text, "bad");

        let flipped: Outcome<&str, i32> =
            Outcome::<i32, &str>::success(1).flat_match(Outcome::failure, Outcome::success);
        assert_eq!(flipped, Outcome::failure(1));
    }

    #[test]
    fn test_total_extraction() {
        assert_eq!(Outcome::<i32, &str>::success(1).extract(), Either::Right(1));
        assert_eq!(Outcome::<i32, &str>::failure("e").extract(), Either::Left("e"));
        assert_eq!(Outcome::<i32, i32>::failure(9).into_inner(), 9);
    }

    #[test]
    fn test_predicates_and_conversions() {
        let ok: Outcome<i32, &str> = Outcome::success(4);
        assert!(ok.is_success());
        assert!(!ok.is_failure());
        assert_eq!(ok.to_option(), Maybe::present(4));
        assert_eq!(ok.get_or_else(0), 4);

        let err: Outcome<i32, &str> = Outcome::failure("e");
        assert_eq!(err.to_option(), Maybe::empty());
        assert_eq!(err.get_or_else(0), 0);
        assert_eq!(err.into_result(), Err("e"));
        assert_eq!(err.swap(), Outcome::success("e"));
    }

    #[test]
    fn test_run_short_circuits() {
        let mut reached = false;
        let result: Outcome<i32, &str> = Outcome::run(|| {
            let a = Outcome::<i32, &str>::success(1).into_result()?;
            let _b = Outcome::<i32, &str>::failure("stop").into_result()?;
            reached = true;
            Ok(a)
        });
        assert_eq!(result, Outcome::failure("stop"));
        assert!(!reached);
    }
}
