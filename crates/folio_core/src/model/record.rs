//! Content record domain model.
//!
//! # Responsibility
//! - Define the canonical record rendered by list, card and modal views.
//! - Describe optional media and external links attached to a record.
//!
//! # Invariants
//! - `id` is unique within one collection snapshot.
//! - `domains` holds at least one member and no duplicates.
//! - `tags` keep source order; duplicates are allowed.

use serde::{Deserialize, Serialize};

/// Opaque identifier assigned by the document store.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type RecordId = String;

/// Media resource family attached to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Stable string id used in stored documents.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

/// Externally hosted media resource for one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    /// Remote URI; never blank when a `Media` value exists.
    pub uri: String,
    pub kind: MediaKind,
}

/// Named external URI such as `github` or `demo`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub name: String,
    pub uri: String,
}

/// Render-ready record for projects, certificates and similar collections.
///
/// Every field is populated after normalization; absent source values are
/// replaced with per-collection defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: RecordId,
    pub title: String,
    pub description: String,
    /// Display-ordered labels (technologies, skills).
    pub tags: Vec<String>,
    /// Single-valued classifier used for exclusive filtering.
    pub category: String,
    /// Multi-valued classifier; a record is grouped under each member.
    pub domains: Vec<String>,
    pub media: Option<Media>,
    pub links: Vec<Link>,
}

impl ContentRecord {
    /// Returns the media URI when the record carries media.
    pub fn media_uri(&self) -> Option<&str> {
        self.media.as_ref().map(|media| media.uri.as_str())
    }

    /// Returns whether this record belongs to `domain`.
    pub fn in_domain(&self, domain: &str) -> bool {
        self.domains.iter().any(|value| value == domain)
    }

    /// Returns the link registered under `name`, if any.
    pub fn link(&self, name: &str) -> Option<&str> {
        self.links
            .iter()
            .find(|link| link.name == name)
            .map(|link| link.uri.as_str())
    }
}
