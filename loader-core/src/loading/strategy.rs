//! Loading Strategies and Fetch Priorities
//!
//! Value types for the two attributes the loader computes per tag.
//!
//! A declared strategy is only a request. The strategy actually emitted is
//! bounded by a [`StrategySet`] ceiling derived from the handle's dependents.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a script tag is executed relative to document parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Executes synchronously where it appears. No attribute is emitted.
    #[default]
    Blocking,

    /// Executes after parsing, in document order with other deferred scripts.
    Defer,

    /// Executes as soon as it arrives, in no particular order.
    Async,
}

impl Strategy {
    /// Whether this is one of the delayed strategies.
    pub fn is_delayed(self) -> bool {
        !matches!(self, Strategy::Blocking)
    }

    /// Get the strategy's registration string.
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Blocking => "blocking",
            Strategy::Defer => "defer",
            Strategy::Async => "async",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a strategy string is outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown strategy `{0}`")]
pub struct UnknownStrategy(pub String);

impl FromStr for Strategy {
    type Err = UnknownStrategy;

    /// The empty string is the absence of a strategy and reads as blocking.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "blocking" => Ok(Strategy::Blocking),
            "defer" => Ok(Strategy::Defer),
            "async" => Ok(Strategy::Async),
            other => Err(UnknownStrategy(other.to_string())),
        }
    }
}

/// A subset of the delayed strategies `{defer, async}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StrategySet {
    defer: bool,
    async_: bool,
}

impl StrategySet {
    /// No delayed strategy is allowed: the handle must block.
    pub const EMPTY: Self = Self { defer: false, async_: false };

    /// Only ordered delayed execution is allowed.
    pub const DEFER: Self = Self { defer: true, async_: false };

    /// Every delayed strategy is allowed.
    pub const ALL: Self = Self { defer: true, async_: true };

    /// Check whether `strategy` is in the set. Blocking never is.
    pub fn contains(self, strategy: Strategy) -> bool {
        match strategy {
            Strategy::Blocking => false,
            Strategy::Defer => self.defer,
            Strategy::Async => self.async_,
        }
    }

    /// Check whether the handle must block.
    pub fn is_empty(self) -> bool {
        !self.defer && !self.async_
    }

    /// Strategies allowed by both sets.
    pub fn intersect(self, other: Self) -> Self {
        Self {
            defer: self.defer && other.defer,
            async_: self.async_ && other.async_,
        }
    }

    /// The most permissive strategy in the set, `async` before `defer`.
    ///
    /// `async` can fall back to `defer`, never the other way around.
    pub fn best(self) -> Strategy {
        if self.async_ {
            Strategy::Async
        } else if self.defer {
            Strategy::Defer
        } else {
            Strategy::Blocking
        }
    }

    /// Iterate the members in `defer`, `async` order.
    pub fn iter(self) -> impl Iterator<Item = Strategy> {
        [
            self.defer.then_some(Strategy::Defer),
            self.async_.then_some(Strategy::Async),
        ]
        .into_iter()
        .flatten()
    }
}

impl Default for StrategySet {
    fn default() -> Self {
        Self::ALL
    }
}

/// Browser fetch priority hint for a tag.
///
/// Variants are declared in ascending priority so that `Ord` gives
/// `Low < Auto < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchPriority {
    Low,
    #[default]
    Auto,
    High,
}

impl FetchPriority {
    /// Get the priority's attribute value.
    pub fn as_str(self) -> &'static str {
        match self {
            FetchPriority::Low => "low",
            FetchPriority::Auto => "auto",
            FetchPriority::High => "high",
        }
    }
}

impl fmt::Display for FetchPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FetchPriority {
    type Err = String;

    /// An empty value means `auto`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "auto" => Ok(FetchPriority::Auto),
            "low" => Ok(FetchPriority::Low),
            "high" => Ok(FetchPriority::High),
            other => Err(other.to_string()),
        }
    }
}
