//! Loader Core
//!
//! This crate resolves how a page's scripts are loaded. Given a registry of
//! named handles, their dependencies and the set of enqueued handles, it
//! computes:
//!
//! - Print order: every dependency before its dependents, split into head and footer zones
//! - Effective loading strategy: `defer`/`async` only where no synchronous dependent needs the script
//! - Effective fetch priority: dependencies bumped to their most urgent dependent
//! - Concatenation: adjacent blocking scripts merged into bundle requests
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `graph`: Handles, the registry and print-set resolution
//! - `loading`: Strategy eligibility and fetch-priority resolution for one pass
//! - `emit`: Emission records, concatenation policy and the printer
//! - `diagnostics`: Non-fatal problems found in the registered graph
//! - `config`: Loader configuration
//!
//! # Example
//!
//! ```rust
//! use loader_core::{LoaderConfig, Printer, Registration, Registry, Strategy};
//!
//! let mut registry = Registry::scripts();
//! registry.register(Registration::script("lib", "/lib.js").strategy("async"));
//! registry.register(Registration::script("app", "/app.js").deps(["lib"]).strategy("defer"));
//! registry.enqueue("app");
//!
//! let plan = Printer::new(LoaderConfig::default()).print(&registry);
//!
//! // `lib` wanted async, but `app` needs it to run first, in order.
//! assert_eq!(plan.tag("lib").unwrap().strategy, Strategy::Defer);
//! assert_eq!(plan.load_order(), vec!["lib", "app"]);
//! ```

pub mod config;
pub mod diagnostics;
pub mod emit;
pub mod graph;
pub mod loading;

pub use config::{ConfigError, LoaderConfig};
pub use diagnostics::{Diagnostics, LoaderDiagnostic};
pub use emit::{BundleRecord, ConcatPolicy, DefaultDirs, Emission, InlineRecord, NoConcat, PrintPlan, Printer, TagRecord};
pub use graph::{AssetKind, AssetVersion, Handle, HandleKind, InlinePosition, Registration, Registry, Resolution, Zone};
pub use loading::{FetchPriority, LoadingPass, Strategy, StrategySet};
