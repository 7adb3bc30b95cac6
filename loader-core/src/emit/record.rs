//! Emission Records
//!
//! What a print pass hands to the renderer. Records serialize as JSON objects
//! tagged with `kind`.

use serde::Serialize;

use crate::diagnostics::LoaderDiagnostic;
use crate::graph::{InlinePosition, Zone};
use crate::loading::{FetchPriority, Strategy};

/// One script tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagRecord {
    pub name: String,

    /// Fully resolved URL, with version and enqueue arguments.
    pub src: String,

    /// Effective strategy.
    pub strategy: Strategy,

    /// Declared strategy, present only when it was downgraded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declared_strategy: Option<Strategy>,

    /// Effective fetch priority.
    pub fetch_priority: FetchPriority,

    /// Declared fetch priority, present only when it was bumped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declared_fetch_priority: Option<FetchPriority>,
}

/// Inline code printed next to its owner's tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineRecord {
    pub owner: String,
    pub position: InlinePosition,

    /// All blocks of this position, newline-joined.
    pub text: String,
}

/// Several blocking tags fetched as one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundleRecord {
    pub members: Vec<String>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Emission {
    Tag(TagRecord),
    Inline(InlineRecord),
    ConcatenatedBundle(BundleRecord),
}

impl Emission {
    /// Names of the handles whose tags this record loads.
    pub fn loads(&self) -> &[String] {
        match self {
            Emission::Tag(tag) => std::slice::from_ref(&tag.name),
            Emission::Inline(_) => &[],
            Emission::ConcatenatedBundle(bundle) => &bundle.members,
        }
    }
}

/// Output of one print pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PrintPlan {
    pub head: Vec<Emission>,
    pub footer: Vec<Emission>,

    #[serde(skip)]
    pub diagnostics: Vec<LoaderDiagnostic>,
}

impl PrintPlan {
    /// Records of one zone.
    pub fn zone(&self, zone: Zone) -> &[Emission] {
        match zone {
            Zone::Head => &self.head,
            Zone::Footer => &self.footer,
        }
    }

    /// Every record, head first.
    pub fn emissions(&self) -> impl Iterator<Item = &Emission> {
        self.head.iter().chain(self.footer.iter())
    }

    /// Every individually printed tag, head first.
    pub fn tags(&self) -> impl Iterator<Item = &TagRecord> {
        self.emissions().filter_map(|emission| match emission {
            Emission::Tag(tag) => Some(tag),
            _ => None,
        })
    }

    /// Find the individually printed tag of `name`. Bundle members have none.
    pub fn tag(&self, name: &str) -> Option<&TagRecord> {
        self.tags().find(|tag| tag.name == name)
    }

    /// Handle names in the order they are loaded, bundle members included.
    pub fn load_order(&self) -> Vec<&str> {
        self.emissions()
            .flat_map(Emission::loads)
            .map(String::as_str)
            .collect()
    }

    /// Whether the handle is loaded at all, as a tag or inside a bundle.
    pub fn loads(&self, name: &str) -> bool {
        self.emissions()
            .any(|emission| emission.loads().iter().any(|loaded| loaded == name))
    }

    /// Zone the handle is loaded in.
    pub fn zone_of(&self, name: &str) -> Option<Zone> {
        [Zone::Head, Zone::Footer].into_iter().find(|&zone| {
            self.zone(zone)
                .iter()
                .any(|emission| emission.loads().iter().any(|loaded| loaded == name))
        })
    }

    /// Serialize the plan, without diagnostics.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
