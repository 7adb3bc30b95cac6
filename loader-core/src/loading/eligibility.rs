//! Strategy Eligibility
//!
//! A script may only be delayed if nothing that runs after it synchronously
//! needs it. The eligible set of a handle is what its enqueued dependents
//! allow, recursively:
//!
//! - an `after` inline block on the handle itself gives the empty set
//! - each enqueued dependent allows its own ceiling intersected with its own
//!   eligible set
//! - a dependent's ceiling is empty when it blocks or has an `after` inline
//!   block, `{defer}` when it defers, and `{defer, async}` when it is async
//!   or an alias
//!
//! With no dependents the set is `{defer, async}`. It is a ceiling, not a
//! mandate: the handle's own declaration still bounds what is emitted.
//!
//! Unregistered and unenqueued dependents do not constrain. A dependent that
//! is already on the current walk closes a cycle and does not constrain
//! either.

use super::pass::{LoadingPass, Walk, UNCUT};
use super::strategy::{Strategy, StrategySet};
use crate::graph::{Handle, InlinePosition};

/// The most a handle allows on its own, before looking at dependents.
fn ceiling(handle: &Handle) -> StrategySet {
    if handle.has_inline(InlinePosition::After) {
        return StrategySet::EMPTY;
    }
    if handle.is_alias() {
        // No tag of its own, so only its members' declarations matter.
        return StrategySet::ALL;
    }
    match handle.strategy() {
        Strategy::Blocking => StrategySet::EMPTY,
        Strategy::Defer => StrategySet::DEFER,
        Strategy::Async => StrategySet::ALL,
    }
}

impl<'r> LoadingPass<'r> {
    /// Delayed strategies consistent with everything that depends on `name`.
    pub fn eligible_strategies(&mut self, name: &str) -> StrategySet {
        let registry = self.registry;
        let Some((key, handle)) = registry.entry(name) else {
            return StrategySet::ALL;
        };
        let mut walk = Walk::new();
        self.eligible_from(key, handle, &mut walk).0
    }

    /// Eligible set of `key`, and the shallowest walk depth it was cut at.
    ///
    /// A result cut above its own depth is missing the constraints of the
    /// cycle it sits on, so it is returned but not cached.
    fn eligible_from(
        &mut self,
        key: &'r str,
        handle: &'r Handle,
        walk: &mut Walk<'r>,
    ) -> (StrategySet, usize) {
        if let Some(&cached) = self.eligible.get(key) {
            return (cached, UNCUT);
        }
        if handle.has_inline(InlinePosition::After) {
            self.eligible.insert(key, StrategySet::EMPTY);
            return (StrategySet::EMPTY, UNCUT);
        }

        let registry = self.registry;
        let depth = walk.len();
        let mut eligible = StrategySet::ALL;
        let mut cut = UNCUT;

        walk.insert(key);
        for dependent in registry.dependents(key) {
            let (allowed, reached) = self.constraint_from(dependent, walk);
            eligible = eligible.intersect(allowed);
            cut = cut.min(reached);

            // Nothing can widen an empty set, so the rest of the walk is moot.
            if eligible.is_empty() {
                tracing::trace!(handle = %key, dependent = %dependent, "blocked by dependent");
                break;
            }
        }
        walk.pop();

        if cut >= depth || eligible.is_empty() {
            self.eligible.insert(key, eligible);
            cut = UNCUT;
        }
        (eligible, cut)
    }

    /// What one dependent allows its dependencies.
    fn constraint_from(&mut self, dependent: &str, walk: &mut Walk<'r>) -> (StrategySet, usize) {
        let registry = self.registry;
        let Some((key, handle)) = registry.entry(dependent) else {
            return (StrategySet::ALL, UNCUT);
        };
        // Re-entrant edge: no constraint, but everything above it is partial.
        if let Some(depth) = walk.get_index_of(key) {
            return (StrategySet::ALL, depth);
        }
        if !self.enqueued.contains(key) {
            return (StrategySet::ALL, UNCUT);
        }

        let (eligible, cut) = self.eligible_from(key, handle, walk);
        (ceiling(handle).intersect(eligible), cut)
    }

    /// The strategy `name`'s tag is emitted with.
    ///
    /// Blocking is never upgraded. A delayed declaration is kept when
    /// eligible, `async` falls back to `defer` when only that is eligible, and
    /// anything else degrades to blocking.
    pub fn effective_strategy(&mut self, name: &str) -> Strategy {
        let Some(handle) = self.registry.get(name) else {
            return Strategy::Blocking;
        };
        let declared = handle.strategy();
        if handle.is_alias() || !declared.is_delayed() {
            return Strategy::Blocking;
        }

        let effective = ceiling(handle)
            .intersect(self.eligible_strategies(name))
            .best();
        if effective != declared {
            tracing::debug!(handle = %name, %declared, %effective, "strategy downgraded");
        }
        effective
    }
}
