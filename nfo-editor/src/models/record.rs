//! Metadata record for one sidecar document
//!
//! Known fields are typed; every unrecognised top-level element is kept as
//! verbatim XML in the extra bag so it survives a parse/serialize cycle.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Document kind, selected by the root element name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Kind {
    #[default]
    #[serde(rename = "movie")]
    Movie,
    #[serde(rename = "tvshow")]
    TvShow,
    #[serde(rename = "episodedetails")]
    Episode,
}

impl Kind {
    /// Canonical root element name
    pub fn root_tag(self) -> &'static str {
        match self {
            Kind::Movie => "movie",
            Kind::TvShow => "tvshow",
            Kind::Episode => "episodedetails",
        }
    }

    /// Map a (lowercased) root tag to a kind; unknown roots are movies
    pub fn from_root_tag(tag: &str) -> Self {
        match tag {
            "tvshow" => Kind::TvShow,
            "episodedetails" => Kind::Episode,
            _ => Kind::Movie,
        }
    }

    /// Whether season / episode / aired are emitted for this kind
    pub fn has_episode_fields(self) -> bool {
        matches!(self, Kind::TvShow | Kind::Episode)
    }
}

/// One cast entry
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Actor {
    pub name: String,
    pub role: String,
    pub thumb: String,
    pub order: i64,
}

impl Actor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Verbatim fragment(s) for one unrecognised tag name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtraValue {
    Single(String),
    Multiple(Vec<String>),
}

impl ExtraValue {
    /// Fragments in document order
    pub fn fragments(&self) -> &[String] {
        match self {
            ExtraValue::Single(fragment) => std::slice::from_ref(fragment),
            ExtraValue::Multiple(fragments) => fragments,
        }
    }

    pub fn len(&self) -> usize {
        self.fragments().len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments().is_empty()
    }
}

/// Parsed sidecar document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Record {
    #[serde(rename = "nfo_type")]
    pub kind: Kind,
    pub title: String,
    #[serde(rename = "originaltitle")]
    pub original_title: String,
    pub year: String,
    pub plot: String,
    pub runtime: String,
    pub genres: Vec<String>,
    pub directors: Vec<String>,
    #[serde(rename = "actors")]
    pub cast: Vec<Actor>,
    pub studio: String,
    pub rating: String,
    #[serde(rename = "poster")]
    pub poster_path: String,
    #[serde(rename = "fanart")]
    pub fanart_path: String,
    pub season: String,
    pub episode: String,
    pub aired: String,
    #[serde(rename = "extra_tags")]
    pub extra: BTreeMap<String, ExtraValue>,
}

impl Record {
    /// Empty record of the given kind
    pub fn new(kind: Kind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// Title for display, or `fallback` when the title is empty
    pub fn display_title<'a>(&'a self, fallback: &'a str) -> &'a str {
        if self.title.is_empty() {
            fallback
        } else {
            &self.title
        }
    }

    /// Store one verbatim fragment under `tag`
    ///
    /// A second fragment for the same tag turns a `Single` into `Multiple`.
    pub fn push_extra(&mut self, tag: impl Into<String>, fragment: impl Into<String>) {
        let tag = tag.into();
        let fragment = fragment.into();
        let value = match self.extra.remove(&tag) {
            None => ExtraValue::Single(fragment),
            Some(ExtraValue::Single(first)) => ExtraValue::Multiple(vec![first, fragment]),
            Some(ExtraValue::Multiple(mut fragments)) => {
                fragments.push(fragment);
                ExtraValue::Multiple(fragments)
            }
        };
        self.extra.insert(tag, value);
    }
}
