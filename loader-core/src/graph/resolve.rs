//! Print-Set Resolution
//!
//! Resolution turns the queue into the ordered set of handles one pass prints.
//!
//! # Algorithm
//!
//! 1. Walk each enqueued handle depth-first through its dependencies.
//!    A handle joins the order only after all of its dependencies did, so
//!    the order is topological.
//! 2. A handle with an unregistered dependency is dropped, with a
//!    diagnostic. Anything that needs a dropped handle is dropped too.
//! 3. A handle reached again while it is still being walked closes a cycle.
//!    That edge is ignored.
//! 4. Zones are assigned in order: a handle's zone is the latest of its own
//!    and its dependencies' zones, so footer placement bubbles toward the
//!    dependents and never the other way.

use std::collections::{HashMap, HashSet};

use super::handle::Zone;
use super::registry::Registry;
use crate::diagnostics::{Diagnostics, LoaderDiagnostic};

/// The handles one pass prints, in dependency order, with their zones.
#[derive(Debug)]
pub struct Resolution<'r> {
    order: Vec<&'r str>,
    zones: HashMap<&'r str, Zone>,
    args: HashMap<&'r str, &'r str>,
    diagnostics: Diagnostics,
}

impl<'r> Resolution<'r> {
    /// Resolve the registry's current queue.
    pub fn resolve(registry: &'r Registry) -> Self {
        let mut walker = Walker {
            registry,
            order: Vec::new(),
            queued: HashSet::new(),
            failed: HashSet::new(),
            visiting: HashSet::new(),
            diagnostics: Diagnostics::new(),
        };

        // Roots are walked in enqueue order, which breaks ties between
        // independent subgraphs.
        for (name, _) in registry.queue() {
            if !registry.is_registered(name) {
                tracing::debug!(handle = %name, "enqueued handle is not registered, skipping");
                continue;
            }
            walker.visit(name);
        }

        let Walker {
            order,
            failed,
            diagnostics,
            ..
        } = walker;

        // Dependencies come first in `order`, so their zones are final by the
        // time a dependent is reached.
        let mut zones = HashMap::with_capacity(order.len());
        for &name in &order {
            let Some(handle) = registry.get(name) else {
                continue;
            };
            let zone = handle
                .dependencies()
                .iter()
                // A conditional handle never prints, so it places nothing.
                .filter(|dep| {
                    registry
                        .get(dep)
                        .is_some_and(|dep| dep.conditional().is_none())
                })
                .filter_map(|dep| zones.get(dep.as_str()).copied())
                .fold(handle.zone(), Zone::max);
            if zone != handle.zone() {
                tracing::trace!(handle = %name, "moved to footer by a footer dependency");
            }
            zones.insert(name, zone);
        }

        let args = registry
            .queue()
            .filter_map(|(name, args)| Some((name, args?)))
            .filter(|(name, _)| zones.contains_key(name))
            .collect();

        tracing::debug!(
            printed = order.len(),
            dropped = failed.len(),
            "resolved print set"
        );

        Self {
            order,
            zones,
            args,
            diagnostics,
        }
    }

    /// Every resolved handle in dependency order, across zones.
    pub fn order(&self) -> &[&'r str] {
        &self.order
    }

    /// Check whether the handle is in this pass's print set.
    pub fn contains(&self, name: &str) -> bool {
        self.zones.contains_key(name)
    }

    /// Zone the handle prints in, `None` if it is not printed this pass.
    pub fn zone(&self, name: &str) -> Option<Zone> {
        self.zones.get(name).copied()
    }

    /// Handles of one zone, in dependency order.
    pub fn in_zone(&self, zone: Zone) -> impl Iterator<Item = &'r str> + '_ {
        self.order
            .iter()
            .copied()
            .filter(move |name| self.zones.get(name) == Some(&zone))
    }

    /// Query arguments the handle was enqueued with.
    pub fn args(&self, name: &str) -> Option<&'r str> {
        self.args.get(name).copied()
    }

    /// Diagnostics raised while resolving.
    pub fn diagnostics(&self) -> &[LoaderDiagnostic] {
        self.diagnostics.as_slice()
    }

    /// Consume the resolution, keeping only its diagnostics.
    pub fn into_diagnostics(self) -> Vec<LoaderDiagnostic> {
        self.diagnostics.into_vec()
    }
}

struct Walker<'r> {
    registry: &'r Registry,
    order: Vec<&'r str>,
    queued: HashSet<&'r str>,
    failed: HashSet<&'r str>,
    visiting: HashSet<&'r str>,
    diagnostics: Diagnostics,
}

impl<'r> Walker<'r> {
    /// Returns `false` if the handle cannot be printed.
    fn visit(&mut self, name: &str) -> bool {
        let registry = self.registry;
        let Some((key, handle)) = registry.entry(name) else {
            return false;
        };
        // Already placed, or already known to be unprintable.
        if self.queued.contains(key) {
            return true;
        }
        if self.failed.contains(key) {
            return false;
        }

        // Reached again while still walking its own dependencies.
        if self.visiting.contains(key) {
            tracing::trace!(handle = %key, "dependency cycle, ignoring edge");
            return true;
        }

        let missing: Vec<String> = handle
            .dependencies()
            .iter()
            .filter(|dep| !registry.is_registered(dep))
            .cloned()
            .collect();
        if !missing.is_empty() {
            // Only the handle that names the missing dependencies reports them.
            self.failed.insert(key);
            self.diagnostics.raise(LoaderDiagnostic::MissingDependencies {
                kind: registry.kind(),
                handle: key.to_string(),
                missing,
            });
            return false;
        }

        // Post-order: every dependency is placed before the handle itself.
        self.visiting.insert(key);
        let ready = handle.dependencies().iter().all(|dep| self.visit(dep));
        self.visiting.remove(key);

        if !ready {
            tracing::debug!(handle = %key, "dependency could not be printed, skipping");
            self.failed.insert(key);
            return false;
        }

        self.queued.insert(key);
        self.order.push(key);
        true
    }
}
