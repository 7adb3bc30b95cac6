//! Emission
//!
//! This module turns a resolved print pass into the records the renderer
//! consumes: script tags, inline blocks and concatenated bundles, split into
//! head and footer zones.
//!
//! Within a zone, records follow dependency order. The head zone is printed
//! before the footer zone, and nothing in the head depends on anything in
//! the footer, so the whole sequence is in dependency order.

mod concat;
mod printer;
mod record;

pub use concat::{ConcatPolicy, DefaultDirs, NoConcat};
pub use printer::Printer;
pub use record::{BundleRecord, Emission, InlineRecord, PrintPlan, TagRecord};
