//! Loading Pass
//!
//! A pass is one print of a registry. It resolves the print set once and owns
//! the memoization caches for strategy eligibility and fetch priority.
//!
//! Eligibility depends on which handles are enqueued, so caches must never
//! outlive the pass that filled them. Build a new pass for every render.

use std::collections::{HashMap, HashSet};

use indexmap::IndexSet;

use super::strategy::{FetchPriority, StrategySet};
use crate::diagnostics::LoaderDiagnostic;
use crate::graph::{Registry, Resolution, Zone};

/// Handles on the current recursive walk, in walk order.
///
/// A handle's index is its depth. A walk that reaches a handle still on it
/// has closed a cycle at that depth.
pub(super) type Walk<'r> = IndexSet<&'r str>;

/// Cut depth of a result that never reached a handle still on the walk.
pub(super) const UNCUT: usize = usize::MAX;

/// One print pass over a registry snapshot.
#[derive(Debug)]
pub struct LoadingPass<'r> {
    pub(super) registry: &'r Registry,

    resolution: Resolution<'r>,

    /// Handles that will execute in this pass: resolved and not conditional.
    pub(super) enqueued: HashSet<&'r str>,

    /// Handle -> eligible delayed strategies.
    pub(super) eligible: HashMap<&'r str, StrategySet>,

    /// Handle -> highest fetch priority among itself and its dependents.
    pub(super) priorities: HashMap<&'r str, FetchPriority>,
}

impl<'r> LoadingPass<'r> {
    /// Start a pass: resolve the queue and set up empty caches.
    pub fn new(registry: &'r Registry) -> Self {
        let resolution = Resolution::resolve(registry);

        // Conditional handles stay in the resolution so their dependents
        // still print, but they never execute.
        let enqueued = resolution
            .order()
            .iter()
            .copied()
            .filter(|name| {
                registry
                    .get(name)
                    .is_some_and(|handle| handle.conditional().is_none())
            })
            .collect();

        Self {
            registry,
            resolution,
            enqueued,
            eligible: HashMap::new(),
            priorities: HashMap::new(),
        }
    }

    /// Get the registry this pass reads.
    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// Get the resolved print set.
    pub fn resolution(&self) -> &Resolution<'r> {
        &self.resolution
    }

    /// Whether the handle executes in this pass, directly enqueued or pulled
    /// in as a dependency.
    pub fn is_enqueued(&self, name: &str) -> bool {
        self.enqueued.contains(name)
    }

    /// Handles printed in `zone`, in dependency order.
    ///
    /// Conditional handles are resolved but never printed, so they are left out.
    pub fn print_order(&self, zone: Zone) -> Vec<&'r str> {
        self.resolution
            .in_zone(zone)
            .filter(|name| self.enqueued.contains(name))
            .collect()
    }

    /// Diagnostics raised while resolving this pass.
    pub fn diagnostics(&self) -> &[LoaderDiagnostic] {
        self.resolution.diagnostics()
    }

    /// Consume the pass, keeping only its diagnostics.
    pub fn into_diagnostics(self) -> Vec<LoaderDiagnostic> {
        self.resolution.into_diagnostics()
    }
}
