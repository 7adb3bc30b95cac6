//! Developer-facing diagnostics.
//!
//! Nothing the loader detects aborts a render. Malformed input is coerced or
//! the offending handle is dropped, and a diagnostic is recorded here.

use thiserror::Error;

use crate::graph::AssetKind;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoaderDiagnostic {
    #[error("The {kind} \"{handle}\" was enqueued with dependencies that are not registered: {}", .missing.join(", "))]
    MissingDependencies {
        kind: AssetKind,
        handle: String,
        missing: Vec<String>,
    },

    #[error("Invalid strategy `{value}` defined for `{handle}` during {kind} registration.")]
    InvalidStrategy {
        kind: AssetKind,
        handle: String,
        value: String,
    },

    #[error("Strategy `{value}` for {kind} `{handle}` is recorded only, because it is an alias (it lacks a `src` value).")]
    AliasStrategy {
        kind: AssetKind,
        handle: String,
        value: String,
    },

    #[error("Invalid fetchpriority `{value}` defined for `{handle}` during {kind} registration.")]
    InvalidFetchPriority {
        kind: AssetKind,
        handle: String,
        value: String,
    },

    #[error("Invalid fetchpriority of type `{type_name}` defined for `{handle}` during {kind} registration.")]
    InvalidFetchPriorityType {
        kind: AssetKind,
        handle: String,
        type_name: &'static str,
    },

    #[error("Cannot supply a fetchpriority `{value}` for {kind} `{handle}` because it is an alias (it lacks a `src` value).")]
    AliasFetchPriority {
        kind: AssetKind,
        handle: String,
        value: String,
    },

    #[error("Invalid group `{value}` defined for `{handle}`, expected 0 (head) or 1 (footer).")]
    InvalidGroup { handle: String, value: String },

    #[error("Unknown data key `{key}` for `{handle}` was ignored.")]
    UnknownDataKey { handle: String, key: String },
}

impl LoaderDiagnostic {
    /// Name of the handle the diagnostic is about.
    pub fn handle(&self) -> &str {
        match self {
            LoaderDiagnostic::MissingDependencies { handle, .. }
            | LoaderDiagnostic::InvalidStrategy { handle, .. }
            | LoaderDiagnostic::AliasStrategy { handle, .. }
            | LoaderDiagnostic::InvalidFetchPriority { handle, .. }
            | LoaderDiagnostic::InvalidFetchPriorityType { handle, .. }
            | LoaderDiagnostic::AliasFetchPriority { handle, .. }
            | LoaderDiagnostic::InvalidGroup { handle, .. }
            | LoaderDiagnostic::UnknownDataKey { handle, .. } => handle,
        }
    }
}

/// Ordered collection of raised diagnostics.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    raised: Vec<LoaderDiagnostic>,
}

impl Diagnostics {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and log it.
    pub fn raise(&mut self, diagnostic: LoaderDiagnostic) {
        tracing::warn!(handle = %diagnostic.handle(), "{diagnostic}");
        self.raised.push(diagnostic);
    }

    /// Get everything raised so far, in order.
    pub fn as_slice(&self) -> &[LoaderDiagnostic] {
        &self.raised
    }

    pub fn is_empty(&self) -> bool {
        self.raised.is_empty()
    }

    pub fn len(&self) -> usize {
        self.raised.len()
    }

    /// Consume the sink.
    pub fn into_vec(self) -> Vec<LoaderDiagnostic> {
        self.raised
    }
}
