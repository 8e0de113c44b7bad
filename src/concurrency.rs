// Copyright 2025 Cowboy AI, LLC.

//! Concurrency limits for parallel aggregation

use std::fmt;
use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

/// How many computations [`all_with`](crate::all_with) keeps in flight.
///
/// Serialized as a plain integer where `0` means unbounded, so it can sit in
/// configuration files next to other tuning knobs.
///
/// ```rust
/// use cim_outcome::Concurrency;
///
/// assert_eq!(Concurrency::from(0), Concurrency::Unbounded);
/// assert_eq!(Concurrency::from(3).limit(), Some(3));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "usize", into = "usize")]
pub enum Concurrency {
    /// Start every computation at once
    #[default]
    Unbounded,
    /// Run in consecutive batches of this size
    Limited(NonZeroUsize),
}

impl Concurrency {
    /// The batch size, if bounded
    pub fn limit(&self) -> Option<usize> {
        match self {
            Concurrency::Unbounded => None,
            Concurrency::Limited(limit) => Some(limit.get()),
        }
    }

    /// True when every computation starts at once
    pub fn is_unbounded(&self) -> bool {
        matches!(self, Concurrency::Unbounded)
    }
}

impl From<usize> for Concurrency {
    fn from(limit: usize) -> Self {
        match NonZeroUsize::new(limit) {
            Some(limit) => Concurrency::Limited(limit),
            None => Concurrency::Unbounded,
        }
    }
}

impl From<Concurrency> for usize {
    fn from(concurrency: Concurrency) -> Self {
        concurrency.limit().unwrap_or(0)
    }
}

impl fmt::Display for Concurrency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Concurrency::Unbounded => write!(f, "unbounded"),
            Concurrency::Limited(limit) => write!(f, "batches of {limit}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_means_unbounded() {
        assert!(Concurrency::from(0).is_unbounded());
        assert_eq!(Concurrency::default(), Concurrency::Unbounded);
        assert_eq!(usize::from(Concurrency::Unbounded), 0);
    }

    #[test]
    fn test_limit_round_trips_through_usize() {
        let limited = Concurrency::from(4);
        assert_eq!(limited.limit(), Some(4));
        assert_eq!(usize::from(limited), 4);
        assert_eq!(limited.to_string(), "batches of 4");
    }

    #[test]
    fn test_deserializes_from_config_integer() {
        #[derive(Deserialize)]
        struct Settings {
            fetch_concurrency: Concurrency,
        }

        let settings: Settings = serde_json::from_str(r#"{"fetch_concurrency": 8}"#).unwrap();
        assert_eq!(settings.fetch_concurrency.limit(), Some(8));

        let settings: Settings = serde_json::from_str(r#"{"fetch_concurrency": 0}"#).unwrap();
        assert!(settings.fetch_concurrency.is_unbounded());
        assert_eq!(serde_json::to_string(&Concurrency::from(2)).unwrap(), "2");
    }
}
