//! Printer
//!
//! Runs one print pass and turns it into emission records, head zone first.
//!
//! For every printed handle, in dependency order:
//!
//! 1. its `before` inline blocks
//! 2. its tag, with effective strategy and fetch priority
//! 3. its `after` inline blocks
//!
//! Aliases have no tag, but their inline blocks are still printed.

use super::concat::{is_absolute, Bucket, ConcatPolicy, DefaultDirs, NoConcat};
use super::record::{Emission, InlineRecord, PrintPlan, TagRecord};
use crate::config::LoaderConfig;
use crate::graph::{AssetVersion, Handle, InlinePosition, Registry, Zone};
use crate::loading::{FetchPriority, LoadingPass, Strategy};

#[derive(Debug)]
pub struct Printer {
    config: LoaderConfig,
    policy: Box<dyn ConcatPolicy>,
}

impl Printer {
    /// Create a printer. Concatenation uses [`DefaultDirs`] when enabled.
    pub fn new(config: LoaderConfig) -> Self {
        let policy: Box<dyn ConcatPolicy> = if config.concatenate {
            Box::new(DefaultDirs::from_config(&config))
        } else {
            Box::new(NoConcat)
        };
        Self { config, policy }
    }

    /// Create a printer with a custom concatenation policy.
    ///
    /// An explicit policy turns concatenation on, whatever `config.concatenate`
    /// says.
    pub fn with_policy(mut config: LoaderConfig, policy: impl ConcatPolicy + 'static) -> Self {
        config.concatenate = true;
        Self {
            config,
            policy: Box::new(policy),
        }
    }

    /// Get the printer's configuration.
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Print the registry's current queue.
    ///
    /// Each call is an independent pass with fresh caches.
    pub fn print(&self, registry: &Registry) -> PrintPlan {
        let mut pass = LoadingPass::new(registry);

        // Head first: nothing in the head depends on the footer.
        let head = self.print_zone(&mut pass, Zone::Head);
        let footer = self.print_zone(&mut pass, Zone::Footer);
        tracing::debug!(head = head.len(), footer = footer.len(), "printed");

        PrintPlan {
            head,
            footer,
            diagnostics: pass.into_diagnostics(),
        }
    }

    fn print_zone(&self, pass: &mut LoadingPass<'_>, zone: Zone) -> Vec<Emission> {
        let registry = pass.registry();
        let mut out = Vec::new();
        let mut bucket = Bucket::default();

        for name in pass.print_order(zone) {
            let Some(handle) = registry.get(name) else {
                continue;
            };
            let before = inline_record(handle, InlinePosition::Before);
            let after = inline_record(handle, InlinePosition::After);

            // Aliases print their inline blocks but have no tag.
            let Some(src) = handle.src() else {
                if before.is_some() || after.is_some() {
                    bucket.flush(self.policy.as_ref(), &mut out);
                    out.extend(before.into_iter().chain(after).map(Emission::Inline));
                }
                continue;
            };

            let args = pass.resolution().args(name);
            let tag = self.tag_record(pass, handle, src, args);

            // Only plain blocking tags may share a request. A bundle has no
            // per-member attributes, so annotated tags print on their own.
            let bundleable = self.config.concatenate
                && before.is_none()
                && after.is_none()
                && args.is_none()
                && tag.strategy == Strategy::Blocking
                && tag.declared_strategy.is_none()
                && tag.fetch_priority == FetchPriority::Auto
                && tag.declared_fetch_priority.is_none()
                && self.policy.accepts(handle, src);
            if bundleable {
                bucket.push(tag);
                continue;
            }

            // Anything else ends the current run first, to keep load order.
            bucket.flush(self.policy.as_ref(), &mut out);
            out.extend(before.map(Emission::Inline));
            out.push(Emission::Tag(tag));
            out.extend(after.map(Emission::Inline));
        }

        bucket.flush(self.policy.as_ref(), &mut out);
        out
    }

    fn tag_record(
        &self,
        pass: &mut LoadingPass<'_>,
        handle: &Handle,
        src: &str,
        args: Option<&str>,
    ) -> TagRecord {
        let name = handle.name();
        let strategy = pass.effective_strategy(name);
        let fetch_priority = pass.effective_fetch_priority(name);

        // Declared values are kept only when they differ from what is emitted.
        TagRecord {
            name: name.to_string(),
            src: self.source_url(handle, src, args),
            strategy,
            declared_strategy: (strategy != handle.strategy()).then_some(handle.strategy()),
            fetch_priority,
            declared_fetch_priority: (fetch_priority != handle.fetch_priority())
                .then_some(handle.fetch_priority()),
        }
    }

    /// Resolve a registered source against the base URL and attach the
    /// version and enqueue arguments.
    pub fn source_url(&self, handle: &Handle, src: &str, args: Option<&str>) -> String {
        let mut url = if is_absolute(src) {
            src.to_string()
        } else {
            format!("{}{}", self.config.base_url, src)
        };

        // `ver=` always leads so the enqueue arguments read as an extension.
        let version = match handle.version() {
            AssetVersion::Default => self.config.default_version.as_deref(),
            AssetVersion::Unversioned => None,
            AssetVersion::Fixed(version) => Some(version.as_str()),
        };
        let query = match (version, args) {
            (Some(version), Some(args)) => Some(format!("ver={version}&{args}")),
            (Some(version), None) => Some(format!("ver={version}")),
            (None, Some(args)) => Some(args.to_string()),
            (None, None) => None,
        };

        if let Some(query) = query {
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str(&query);
        }
        url
    }
}

impl Default for Printer {
    fn default() -> Self {
        Self::new(LoaderConfig::default())
    }
}

fn inline_record(handle: &Handle, position: InlinePosition) -> Option<InlineRecord> {
    let blocks = handle.inline(position);
    if blocks.is_empty() {
        return None;
    }
    Some(InlineRecord {
        owner: handle.name().to_string(),
        position,
        text: blocks.join("\n"),
    })
}
