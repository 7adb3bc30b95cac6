//! Graph Handles
//!
//! This module defines the handles that live in the dependency graph.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::loading::{FetchPriority, Strategy};

/// Dependency names of a single handle. Most handles have only a few.
pub type Dependencies = SmallVec<[String; 4]>;

/// Which family of assets a registry holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    #[default]
    Script,
    Style,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Script => f.write_str("script"),
            AssetKind::Style => f.write_str("style"),
        }
    }
}

/// The output zone a handle is printed in.
///
/// Variants are declared in document order so that `Ord` gives `Head < Footer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    #[default]
    Head,
    Footer,
}

impl Zone {
    /// Map a numeric group (`0` head, `1` footer) to a zone.
    pub fn from_group(group: u64) -> Option<Self> {
        match group {
            0 => Some(Zone::Head),
            1 => Some(Zone::Footer),
            _ => None,
        }
    }
}

/// Where an inline block is printed relative to its owner's tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InlinePosition {
    Before,
    After,
}

/// Version query argument attached to a handle's source URL.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AssetVersion {
    /// Use the loader's configured default version, if any.
    #[default]
    Default,

    /// Never append a version.
    Unversioned,

    /// Append this exact version.
    Fixed(String),
}

/// What a handle loads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleKind {
    /// A real asset with its own source URL. Only leaves produce tags.
    Leaf { src: String },

    /// A sourceless handle grouping its dependencies under one name.
    Alias,
}

/// A handle in the dependency graph.
#[derive(Debug, Clone)]
pub struct Handle {
    /// Unique name of this handle.
    name: String,

    /// Leaf with a source, or alias.
    kind: HandleKind,

    /// Handles that must run before this one, in declaration order.
    /// For an alias these are its members.
    dependencies: Dependencies,

    version: AssetVersion,

    /// Requested strategy. The emitted one is computed per pass.
    strategy: Strategy,

    /// Requested fetch priority, `None` when never set.
    fetch_priority: Option<FetchPriority>,

    /// Declared zone, before footer placement bubbles through dependencies.
    zone: Zone,

    /// Legacy conditional-comment expression. A conditional handle is never printed.
    conditional: Option<String>,

    inline_before: Vec<String>,
    inline_after: Vec<String>,
}

impl Handle {
    /// Create a new handle with the given kind and no dependencies.
    pub fn new(name: impl Into<String>, kind: HandleKind) -> Self {
        Self {
            name: name.into(),
            kind,
            dependencies: Dependencies::new(),
            version: AssetVersion::Default,
            strategy: Strategy::Blocking,
            fetch_priority: None,
            zone: Zone::Head,
            conditional: None,
            inline_before: Vec::new(),
            inline_after: Vec::new(),
        }
    }

    /// Create a new leaf handle loading `src`.
    pub fn leaf(name: impl Into<String>, src: impl Into<String>) -> Self {
        Self::new(name, HandleKind::Leaf { src: src.into() })
    }

    /// Create a new alias handle.
    pub fn alias(name: impl Into<String>) -> Self {
        Self::new(name, HandleKind::Alias)
    }

    /// Get the handle's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the handle's kind.
    pub fn kind(&self) -> &HandleKind {
        &self.kind
    }

    /// Check if this is an alias.
    pub fn is_alias(&self) -> bool {
        matches!(self.kind, HandleKind::Alias)
    }

    /// Source URL as registered, `None` for aliases.
    pub fn src(&self) -> Option<&str> {
        match &self.kind {
            HandleKind::Leaf { src } => Some(src),
            HandleKind::Alias => None,
        }
    }

    /// Get the names this handle depends on.
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// Add a dependency. Duplicates are ignored.
    pub fn add_dependency(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.dependencies.contains(&name) {
            return false;
        }
        self.dependencies.push(name);
        true
    }

    /// Get the version policy.
    pub fn version(&self) -> &AssetVersion {
        &self.version
    }

    /// Set the version policy.
    pub fn set_version(&mut self, version: AssetVersion) {
        self.version = version;
    }

    /// Get the declared strategy.
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Set the declared strategy.
    pub fn set_strategy(&mut self, strategy: Strategy) {
        self.strategy = strategy;
    }

    /// Declared fetch priority, falling back to `auto`.
    pub fn fetch_priority(&self) -> FetchPriority {
        self.fetch_priority.unwrap_or_default()
    }

    /// Check whether a fetch priority was ever set.
    pub fn has_fetch_priority(&self) -> bool {
        self.fetch_priority.is_some()
    }

    /// Set the declared fetch priority.
    pub fn set_fetch_priority(&mut self, priority: FetchPriority) {
        self.fetch_priority = Some(priority);
    }

    /// Get the declared zone.
    pub fn zone(&self) -> Zone {
        self.zone
    }

    /// Set the declared zone.
    pub fn set_zone(&mut self, zone: Zone) {
        self.zone = zone;
    }

    /// Get the conditional-comment expression, if any.
    pub fn conditional(&self) -> Option<&str> {
        self.conditional.as_deref()
    }

    /// Mark the handle as conditional.
    pub fn set_conditional(&mut self, expression: impl Into<String>) {
        self.conditional = Some(expression.into());
    }

    /// Inline blocks at the given position, in insertion order.
    pub fn inline(&self, position: InlinePosition) -> &[String] {
        match position {
            InlinePosition::Before => &self.inline_before,
            InlinePosition::After => &self.inline_after,
        }
    }

    /// Check whether any inline block sits at `position`.
    pub fn has_inline(&self, position: InlinePosition) -> bool {
        !self.inline(position).is_empty()
    }

    /// Append an inline block.
    pub fn add_inline(&mut self, code: impl Into<String>, position: InlinePosition) {
        match position {
            InlinePosition::Before => self.inline_before.push(code.into()),
            InlinePosition::After => self.inline_after.push(code.into()),
        }
    }
}
