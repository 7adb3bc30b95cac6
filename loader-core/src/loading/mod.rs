//! Loading Resolution
//!
//! This module decides, per printed handle, which loading strategy and which
//! fetch priority its tag carries.
//!
//! # Concepts
//!
//! ## Strategies
//!
//! A script declares `blocking`, `defer` or `async`. The declaration is a
//! request: a delayed script that something synchronous depends on must block
//! after all, or the dependent would run before it.
//!
//! ## Fetch Priority
//!
//! A script declares `low`, `auto` or `high`. A dependency is bumped to the
//! highest priority among the scripts that need it.
//!
//! # Implementation Notes
//!
//! Both answers are recursive walks over dependents. They are memoized in a
//! [`LoadingPass`], which is created per print and dropped afterwards.

mod eligibility;
mod pass;
mod priority;
mod strategy;

pub use pass::LoadingPass;
pub use strategy::{FetchPriority, Strategy, StrategySet, UnknownStrategy};
