//! Fetch Priority Bumping
//!
//! A dependency must not be fetched at a lower priority than the handles
//! waiting on it. The effective priority of a handle is the highest of its own
//! declared priority and the effective priorities of its enqueued dependents.
//!
//! Aliases have no tag, so they contribute only what their dependents do.

use super::pass::{LoadingPass, Walk, UNCUT};
use super::strategy::FetchPriority;
use crate::graph::Handle;

impl<'r> LoadingPass<'r> {
    /// The fetch priority `name`'s tag is emitted with.
    pub fn effective_fetch_priority(&mut self, name: &str) -> FetchPriority {
        let registry = self.registry;
        let Some((key, handle)) = registry.entry(name) else {
            return FetchPriority::default();
        };
        let mut walk = Walk::new();
        self.priority_from(key, handle, &mut walk).0
    }

    /// Highest priority among `key` and its dependents, and the shallowest
    /// walk depth the result was cut at.
    fn priority_from(
        &mut self,
        key: &'r str,
        handle: &'r Handle,
        walk: &mut Walk<'r>,
    ) -> (FetchPriority, usize) {
        if let Some(&cached) = self.priorities.get(key) {
            return (cached, UNCUT);
        }

        let registry = self.registry;
        let depth = walk.len();
        let mut cut = UNCUT;

        // An alias starts at the bottom so it only relays its dependents.
        let mut highest = if handle.is_alias() {
            FetchPriority::Low
        } else {
            handle.fetch_priority()
        };

        if highest != FetchPriority::High {
            walk.insert(key);
            for dependent in registry.dependents(key) {
                let (bump, reached) = self.bump_from(dependent, walk);
                cut = cut.min(reached);
                if let Some(priority) = bump {
                    highest = highest.max(priority);
                    if highest == FetchPriority::High {
                        break;
                    }
                }
            }
            walk.pop();
        }

        // `high` is final whatever the walk missed.
        if cut < depth && highest != FetchPriority::High {
            return (highest, cut);
        }

        if !handle.is_alias() && highest != handle.fetch_priority() {
            tracing::debug!(
                handle = %key,
                declared = %handle.fetch_priority(),
                effective = %highest,
                "fetch priority bumped by dependents"
            );
        }
        self.priorities.insert(key, highest);
        (highest, UNCUT)
    }

    /// Priority one dependent asks of its dependencies, `None` when it asks
    /// nothing: unknown, not enqueued, or already on the walk.
    fn bump_from(&mut self, dependent: &str, walk: &mut Walk<'r>) -> (Option<FetchPriority>, usize) {
        let registry = self.registry;
        let Some((key, handle)) = registry.entry(dependent) else {
            return (None, UNCUT);
        };
        if let Some(depth) = walk.get_index_of(key) {
            return (None, depth);
        }
        if !self.enqueued.contains(key) {
            return (None, UNCUT);
        }

        let (priority, cut) = self.priority_from(key, handle, walk);
        (Some(priority), cut)
    }
}
