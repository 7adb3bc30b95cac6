//! Dependency Graph
//!
//! This module holds the registry of loadable handles and the resolution of
//! one print pass's ordered handle set.
//!
//! # Overview
//!
//! The dependency graph is a directed graph where:
//!
//! - Nodes are handles: leaves with a source URL, or aliases grouping other handles
//! - Edges are dependencies: if B depends on A, A must run before B
//!
//! Well-formed input is acyclic, but nothing here assumes it. Every traversal
//! tracks the handles it is currently walking and treats a re-entrant edge
//! as already satisfied.
//!
//! # Design Decisions
//!
//! 1. Handles are indexed by name, in registration order, so lookups are
//!    O(1) and iteration is deterministic.
//!
//! 2. Both directions are kept: each handle lists its dependencies, and the
//!    registry keeps a reverse index of dependents keyed by name.

mod handle;
mod registry;
mod resolve;

pub use handle::{AssetKind, AssetVersion, Dependencies, Handle, HandleKind, InlinePosition, Zone};
pub use registry::{Registration, Registry};
pub use resolve::Resolution;
