//! Concatenation
//!
//! Runs of adjacent blocking tags may be fetched as one bundle request. Which
//! sources may be bundled, and what the bundle URL looks like, belong to the
//! host's asset pipeline and sit behind [`ConcatPolicy`].
//!
//! The printer only ever offers a policy tags that are blocking, carry no
//! inline blocks, no enqueue arguments and no fetch priority other than
//! `auto`. Anything else flushes the current bucket first.

use std::fmt::Debug;

use super::record::{BundleRecord, Emission, TagRecord};
use crate::config::LoaderConfig;
use crate::graph::Handle;

/// Decides bundle membership and bundle URLs.
pub trait ConcatPolicy: Debug {
    /// Whether a blocking handle with registered source `src` may be bundled.
    fn accepts(&self, handle: &Handle, src: &str) -> bool;

    /// URL that loads all `members`, in order, in one request.
    fn bundle_url(&self, members: &[String]) -> String;
}

/// Never bundles.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoConcat;

impl ConcatPolicy for NoConcat {
    fn accepts(&self, _handle: &Handle, _src: &str) -> bool {
        false
    }

    fn bundle_url(&self, _members: &[String]) -> String {
        String::new()
    }
}

/// Bundles relative sources under a set of directory prefixes.
#[derive(Debug, Clone)]
pub struct DefaultDirs {
    dirs: Vec<String>,
    endpoint: String,
    version: Option<String>,
}

impl DefaultDirs {
    /// Create a policy bundling sources under `dirs` through `endpoint`.
    pub fn new(dirs: Vec<String>, endpoint: impl Into<String>) -> Self {
        Self {
            dirs,
            endpoint: endpoint.into(),
            version: None,
        }
    }

    /// Append `ver=` to bundle URLs.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Build the policy a [`LoaderConfig`] describes.
    pub fn from_config(config: &LoaderConfig) -> Self {
        Self {
            dirs: config.default_dirs.clone(),
            endpoint: format!("{}{}", config.base_url, config.concat_endpoint),
            version: config.default_version.clone(),
        }
    }
}

impl ConcatPolicy for DefaultDirs {
    fn accepts(&self, _handle: &Handle, src: &str) -> bool {
        if is_absolute(src) {
            return false;
        }
        self.dirs.is_empty() || self.dirs.iter().any(|dir| src.starts_with(dir.as_str()))
    }

    fn bundle_url(&self, members: &[String]) -> String {
        // Members are comma-separated, so each name is encoded on its own.
        let load = members
            .iter()
            .map(|member| encode_component(member))
            .collect::<Vec<_>>()
            .join(",");
        let mut url = format!("{}?c=0&load%5Bchunk_0%5D={load}", self.endpoint);
        if let Some(version) = &self.version {
            url.push_str("&ver=");
            url.push_str(&encode_component(version));
        }
        url
    }
}

/// Percent-encode every byte outside the URL unreserved set.
fn encode_component(raw: &str) -> String {
    let mut encoded = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(char::from(byte))
            }
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}

/// Whether `src` is a full or protocol-relative URL.
pub(crate) fn is_absolute(src: &str) -> bool {
    src.starts_with("http://") || src.starts_with("https://") || src.starts_with("//")
}

/// Tags waiting to be emitted as one bundle.
#[derive(Debug, Default)]
pub(crate) struct Bucket {
    pending: Vec<TagRecord>,
}

impl Bucket {
    pub(crate) fn push(&mut self, tag: TagRecord) {
        self.pending.push(tag);
    }

    /// Emit what is pending. A single tag is emitted as itself.
    pub(crate) fn flush(&mut self, policy: &dyn ConcatPolicy, out: &mut Vec<Emission>) {
        match self.pending.len() {
            0 => {}
            // A bundle of one would only hide the tag's own URL.
            1 => out.extend(self.pending.drain(..).map(Emission::Tag)),
            count => {
                let members: Vec<String> = self.pending.drain(..).map(|tag| tag.name).collect();
                let url = policy.bundle_url(&members);
                tracing::trace!(count, %url, "flushed concatenation bucket");
                out.push(Emission::ConcatenatedBundle(BundleRecord { members, url }));
            }
        }
    }
}
