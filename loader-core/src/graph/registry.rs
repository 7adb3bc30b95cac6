//! Handle Registry
//!
//! The registry owns every registered handle, the enqueue queue and the
//! reverse dependency index. It is built once per render and read by the
//! print pass.
//!
//! Dependencies are stored by name, and a name may be referenced before it
//! is registered. The reverse index (`dependents`) is therefore keyed by name
//! too, not by handle, so a handle registered later immediately sees the
//! dependents that were waiting for it.

use indexmap::{IndexMap, IndexSet};
use serde_json::Value;

use super::handle::{AssetKind, AssetVersion, Handle, HandleKind, InlinePosition, Zone};
use crate::diagnostics::{Diagnostics, LoaderDiagnostic};
use crate::loading::{FetchPriority, Strategy};

/// Arguments for registering one handle.
///
/// Strategy and fetch priority are taken as raw strings so that invalid
/// values reach the same validation path as [`Registry::add_data`].
#[derive(Debug, Clone)]
pub struct Registration {
    name: String,
    src: Option<String>,
    deps: Vec<String>,
    version: AssetVersion,
    strategy: Option<String>,
    in_footer: bool,
    fetch_priority: Option<String>,
}

impl Registration {
    /// Register a leaf handle loading `src`.
    pub fn script(name: impl Into<String>, src: impl Into<String>) -> Self {
        Self::new(name.into(), Some(src.into()))
    }

    /// Register an alias grouping its dependencies.
    pub fn alias(name: impl Into<String>) -> Self {
        Self::new(name.into(), None)
    }

    fn new(name: String, src: Option<String>) -> Self {
        Self {
            name,
            src,
            deps: Vec::new(),
            version: AssetVersion::Default,
            strategy: None,
            in_footer: false,
            fetch_priority: None,
        }
    }

    /// Add dependencies, in the order they should be listed.
    pub fn deps<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deps.extend(deps.into_iter().map(Into::into));
        self
    }

    /// Pin the `ver=` query argument.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = AssetVersion::Fixed(version.into());
        self
    }

    /// Never append a version, not even the configured default.
    pub fn unversioned(mut self) -> Self {
        self.version = AssetVersion::Unversioned;
        self
    }

    /// Request a loading strategy: `defer`, `async` or `blocking`.
    pub fn strategy(mut self, strategy: impl Into<String>) -> Self {
        self.strategy = Some(strategy.into());
        self
    }

    /// Print in the footer zone.
    pub fn in_footer(mut self) -> Self {
        self.in_footer = true;
        self
    }

    /// Request a fetch priority: `low`, `auto` or `high`.
    pub fn fetchpriority(mut self, priority: impl Into<String>) -> Self {
        self.fetch_priority = Some(priority.into());
        self
    }
}

/// Registry of handles for one asset kind.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    kind: AssetKind,

    /// All handles, in registration order.
    handles: IndexMap<String, Handle>,

    /// Dependency name -> names of the handles that declare it.
    dependents: IndexMap<String, IndexSet<String>>,

    /// Enqueued names, in enqueue order, with optional query arguments.
    queue: IndexMap<String, Option<String>>,

    diagnostics: Diagnostics,
}

impl Registry {
    /// Create a new empty registry.
    pub fn new(kind: AssetKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// Create a registry for scripts.
    pub fn scripts() -> Self {
        Self::new(AssetKind::Script)
    }

    /// Create a registry for styles.
    pub fn styles() -> Self {
        Self::new(AssetKind::Style)
    }

    /// Get the asset kind this registry holds.
    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    /// Register a handle.
    ///
    /// Returns `false` if the name is already taken; the first registration wins.
    pub fn register(&mut self, registration: Registration) -> bool {
        let Registration {
            name,
            src,
            deps,
            version,
            strategy,
            in_footer,
            fetch_priority,
        } = registration;

        if self.handles.contains_key(&name) {
            tracing::debug!(handle = %name, "already registered");
            return false;
        }

        let kind = match src {
            Some(src) => HandleKind::Leaf { src },
            None => HandleKind::Alias,
        };
        let mut handle = Handle::new(name.clone(), kind);

        // Index dependents eagerly, even for names not yet registered.
        for dep in deps {
            if handle.add_dependency(dep.clone()) {
                self.index_dependent(&dep, &name);
            }
        }
        handle.set_version(version);
        if in_footer {
            handle.set_zone(Zone::Footer);
        }
        self.handles.insert(name.clone(), handle);
        tracing::trace!(handle = %name, "registered");

        // Same validation path as data added after registration
        if let Some(strategy) = strategy {
            self.add_data(&name, "strategy", strategy);
        }
        if let Some(priority) = fetch_priority {
            self.add_data(&name, "fetchpriority", priority);
        }
        true
    }

    /// Remove a handle.
    ///
    /// Handles that depend on it keep their dependency and will be reported
    /// as having a missing dependency if they are printed.
    pub fn deregister(&mut self, name: &str) -> Option<Handle> {
        let handle = self.handles.shift_remove(name)?;
        for dep in handle.dependencies() {
            if let Some(dependents) = self.dependents.get_mut(dep) {
                dependents.shift_remove(name);
            }
        }
        Some(handle)
    }

    /// Get a handle by name.
    pub fn get(&self, name: &str) -> Option<&Handle> {
        self.handles.get(name)
    }

    /// The registry-owned key and handle for `name`.
    pub(crate) fn entry(&self, name: &str) -> Option<(&str, &Handle)> {
        self.handles
            .get_key_value(name)
            .map(|(key, handle)| (key.as_str(), handle))
    }

    /// Check whether a handle is registered.
    pub fn is_registered(&self, name: &str) -> bool {
        self.handles.contains_key(name)
    }

    /// All handles in registration order.
    pub fn handles(&self) -> impl Iterator<Item = &Handle> {
        self.handles.values()
    }

    /// Get the number of registered handles.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Check whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Enqueue a handle for printing.
    ///
    /// `name?query` enqueues `name` and appends `query` to its source URL.
    /// Enqueueing a name again keeps its original queue position.
    pub fn enqueue(&mut self, name: &str) {
        let (name, args) = match name.split_once('?') {
            Some((name, args)) => (name, Some(args.to_string())),
            None => (name, None),
        };
        match self.queue.get_mut(name) {
            // Re-enqueueing without arguments keeps the earlier ones.
            Some(existing) => {
                if args.is_some() {
                    *existing = args;
                }
            }
            None => {
                self.queue.insert(name.to_string(), args);
            }
        }
    }

    /// Remove a handle from the queue. Returns `false` if it was not queued.
    pub fn dequeue(&mut self, name: &str) -> bool {
        self.queue.shift_remove(name).is_some()
    }

    /// Whether `name` was enqueued directly.
    pub fn is_queued(&self, name: &str) -> bool {
        self.queue.contains_key(name)
    }

    /// Enqueued names with their query arguments, in enqueue order.
    pub fn queue(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.queue
            .iter()
            .map(|(name, args)| (name.as_str(), args.as_deref()))
    }

    /// Add a dependency to a registered handle.
    pub fn add_dependency(&mut self, name: &str, dep: &str) -> bool {
        let Some(handle) = self.handles.get_mut(name) else {
            return false;
        };
        if !handle.add_dependency(dep) {
            return false;
        }
        self.index_dependent(dep, name);
        true
    }

    fn index_dependent(&mut self, dep: &str, dependent: &str) {
        self.dependents
            .entry(dep.to_string())
            .or_default()
            .insert(dependent.to_string());
    }

    /// Names of registered handles that list `name` as a dependency.
    pub fn dependents(&self, name: &str) -> impl Iterator<Item = &str> {
        self.dependents
            .get(name)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    /// Attach an inline block to a registered handle.
    pub fn add_inline(&mut self, name: &str, code: &str, position: InlinePosition) -> bool {
        if code.is_empty() {
            return false;
        }
        match self.handles.get_mut(name) {
            Some(handle) => {
                handle.add_inline(code, position);
                true
            }
            None => false,
        }
    }

    /// Inline blocks of `name` at `position`, empty for unknown handles.
    pub fn inline(&self, name: &str, position: InlinePosition) -> &[String] {
        self.handles
            .get(name)
            .map(|handle| handle.inline(position))
            .unwrap_or_default()
    }

    /// Set a piece of handle metadata.
    ///
    /// Known keys are `strategy`, `fetchpriority`, `conditional` and `group`.
    /// Returns `false` when the value was rejected or the handle is unknown.
    pub fn add_data(&mut self, name: &str, key: &str, value: impl Into<Value>) -> bool {
        let value = value.into();
        let kind = self.kind;
        let Some(handle) = self.handles.get_mut(name) else {
            return false;
        };

        match key {
            "strategy" if kind == AssetKind::Script => {
                set_strategy(kind, handle, &value, &mut self.diagnostics)
            }
            "fetchpriority" => set_fetch_priority(kind, handle, &value, &mut self.diagnostics),
            "conditional" => match value.as_str() {
                Some(expression) if !expression.is_empty() => {
                    handle.set_conditional(expression);
                    true
                }
                _ => false,
            },
            "group" => {
                let zone = match &value {
                    Value::Bool(in_footer) => Some(if *in_footer { Zone::Footer } else { Zone::Head }),
                    Value::Number(group) => group.as_u64().and_then(Zone::from_group),
                    _ => None,
                };
                match zone {
                    Some(zone) => {
                        handle.set_zone(zone);
                        true
                    }
                    None => {
                        self.diagnostics.raise(LoaderDiagnostic::InvalidGroup {
                            handle: name.to_string(),
                            value: value.to_string(),
                        });
                        false
                    }
                }
            }
            _ => {
                self.diagnostics.raise(LoaderDiagnostic::UnknownDataKey {
                    handle: name.to_string(),
                    key: key.to_string(),
                });
                false
            }
        }
    }

    /// Diagnostics raised while registering and configuring handles.
    pub fn diagnostics(&self) -> &[LoaderDiagnostic] {
        self.diagnostics.as_slice()
    }
}

fn set_strategy(
    kind: AssetKind,
    handle: &mut Handle,
    value: &Value,
    diagnostics: &mut Diagnostics,
) -> bool {
    // `null` and `false` both clear the strategy.
    let parsed = match value {
        Value::Null | Value::Bool(false) => Ok(Strategy::Blocking),
        Value::String(raw) => raw.parse::<Strategy>().map_err(|_| raw.clone()),
        other => Err(other.to_string()),
    };

    match parsed {
        Ok(strategy) => {
            if handle.is_alias() && strategy.is_delayed() {
                diagnostics.raise(LoaderDiagnostic::AliasStrategy {
                    kind,
                    handle: handle.name().to_string(),
                    value: strategy.to_string(),
                });
            }
            handle.set_strategy(strategy);
            true
        }
        // Unknown strategies degrade instead of keeping a stale value.
        Err(value) => {
            diagnostics.raise(LoaderDiagnostic::InvalidStrategy {
                kind,
                handle: handle.name().to_string(),
                value,
            });
            handle.set_strategy(Strategy::Blocking);
            false
        }
    }
}

fn set_fetch_priority(
    kind: AssetKind,
    handle: &mut Handle,
    value: &Value,
    diagnostics: &mut Diagnostics,
) -> bool {
    let priority = match value {
        Value::Null | Value::Bool(false) => FetchPriority::Auto,
        Value::String(raw) => match raw.parse::<FetchPriority>() {
            Ok(priority) => priority,
            Err(value) => {
                diagnostics.raise(LoaderDiagnostic::InvalidFetchPriority {
                    kind,
                    handle: handle.name().to_string(),
                    value,
                });
                return false;
            }
        },
        other => {
            diagnostics.raise(LoaderDiagnostic::InvalidFetchPriorityType {
                kind,
                handle: handle.name().to_string(),
                type_name: json_type_name(other),
            });
            return false;
        }
    };

    // Aliases have no tag to carry the attribute.
    if handle.is_alias() {
        diagnostics.raise(LoaderDiagnostic::AliasFetchPriority {
            kind,
            handle: handle.name().to_string(),
            value: priority.to_string(),
        });
        return false;
    }

    handle.set_fetch_priority(priority);
    true
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
