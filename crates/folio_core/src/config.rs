//! Per-collection defaults table and selector constants.
//!
//! # Responsibility
//! - Declare every placeholder/fallback used by normalization as data.
//! - Load and validate operator overrides from a JSON document.
//!
//! # Invariants
//! - Each collection name appears at most once in a table.
//! - `domain_fallback` is never empty, so normalized records always have a domain.
//! - Built-in tables always carry `projects` and `certificates`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::Duration;

/// Reserved selector value meaning "apply no filter".
pub const ALL_SELECTOR: &str = "All";

/// Default upper bound for one media load before it is reported as timed out.
pub const DEFAULT_MEDIA_LOAD_TIMEOUT: Duration = Duration::from_secs(15);

/// Collection name for portfolio projects.
pub const COLLECTION_PROJECTS: &str = "projects";
/// Collection name for certificates.
pub const COLLECTION_CERTIFICATES: &str = "certificates";

/// Built-in collection kinds served by the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    Projects,
    Certificates,
}

impl CollectionKind {
    /// Document-store collection name.
    pub fn collection_name(self) -> &'static str {
        match self {
            Self::Projects => COLLECTION_PROJECTS,
            Self::Certificates => COLLECTION_CERTIFICATES,
        }
    }

    /// Parses a collection kind from its collection name.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            COLLECTION_PROJECTS => Some(Self::Projects),
            COLLECTION_CERTIFICATES => Some(Self::Certificates),
            _ => None,
        }
    }
}

/// Defaulting rules for one collection kind.
///
/// Missing keys in a JSON override fall back to the generic values of
/// [`CollectionDefaults::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionDefaults {
    /// Document-store collection name, e.g. `projects`.
    pub collection: String,
    pub title_placeholder: String,
    pub description_placeholder: String,
    pub category: String,
    /// Injected when a record has no usable domain.
    pub domain_fallback: String,
    /// Source keys probed in order for the tag list.
    pub tag_keys: Vec<String>,
    /// Top-level source keys promoted to named links.
    pub link_keys: Vec<String>,
}

impl Default for CollectionDefaults {
    fn default() -> Self {
        Self {
            collection: String::new(),
            title_placeholder: "Untitled".to_string(),
            description_placeholder: "No description available.".to_string(),
            category: "General".to_string(),
            domain_fallback: "General".to_string(),
            tag_keys: vec!["tags".to_string()],
            link_keys: Vec::new(),
        }
    }
}

impl CollectionDefaults {
    /// Returns the built-in defaults for `kind`.
    pub fn for_kind(kind: CollectionKind) -> Self {
        match kind {
            CollectionKind::Projects => Self {
                collection: COLLECTION_PROJECTS.to_string(),
                title_placeholder: "Untitled Project".to_string(),
                description_placeholder: "No description available.".to_string(),
                category: "General".to_string(),
                domain_fallback: "Other".to_string(),
                tag_keys: vec!["tags".to_string(), "technologies".to_string()],
                link_keys: vec!["github".to_string(), "demo".to_string()],
            },
            CollectionKind::Certificates => Self {
                collection: COLLECTION_CERTIFICATES.to_string(),
                title_placeholder: "Untitled Certificate".to_string(),
                description_placeholder: "No description available.".to_string(),
                category: "General".to_string(),
                domain_fallback: "General".to_string(),
                tag_keys: vec!["tags".to_string(), "skills".to_string()],
                link_keys: vec!["credentialUrl".to_string()],
            },
        }
    }

    /// Validates declaration-level invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let collection = self.collection.trim();
        if collection.is_empty() {
            return Err(ConfigError::EmptyCollection);
        }
        if self.title_placeholder.trim().is_empty() {
            return Err(ConfigError::EmptyValue {
                collection: collection.to_string(),
                field: "title_placeholder",
            });
        }
        if self.description_placeholder.trim().is_empty() {
            return Err(ConfigError::EmptyValue {
                collection: collection.to_string(),
                field: "description_placeholder",
            });
        }
        if self.category.trim().is_empty() {
            return Err(ConfigError::EmptyValue {
                collection: collection.to_string(),
                field: "category",
            });
        }
        if self.domain_fallback.trim().is_empty() {
            return Err(ConfigError::EmptyValue {
                collection: collection.to_string(),
                field: "domain_fallback",
            });
        }
        Ok(())
    }
}

/// Defaults keyed by collection name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefaultsTable {
    collections: Vec<CollectionDefaults>,
}

/// One entry of a defaults document; unset fields keep the base value.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CollectionOverride {
    collection: String,
    title_placeholder: Option<String>,
    description_placeholder: Option<String>,
    category: Option<String>,
    domain_fallback: Option<String>,
    tag_keys: Option<Vec<String>>,
    link_keys: Option<Vec<String>>,
}

impl CollectionOverride {
    /// Applies the set fields on top of the built-in entry for the same
    /// collection, or on top of the generic defaults for a new one.
    fn merge_into_base(self) -> CollectionDefaults {
        let collection = self.collection.trim().to_string();
        let mut merged = CollectionKind::parse(&collection)
            .map(CollectionDefaults::for_kind)
            .unwrap_or_default();
        merged.collection = collection;

        if let Some(value) = self.title_placeholder {
            merged.title_placeholder = value;
        }
        if let Some(value) = self.description_placeholder {
            merged.description_placeholder = value;
        }
        if let Some(value) = self.category {
            merged.category = value;
        }
        if let Some(value) = self.domain_fallback {
            merged.domain_fallback = value;
        }
        if let Some(value) = self.tag_keys {
            merged.tag_keys = value;
        }
        if let Some(value) = self.link_keys {
            merged.link_keys = value;
        }
        merged
    }
}

#[derive(Debug, Default, Deserialize)]
struct DefaultsDocument {
    #[serde(default)]
    collections: Vec<CollectionOverride>,
}

impl Default for DefaultsTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl DefaultsTable {
    /// Table holding the built-in projects and certificates defaults.
    pub fn builtin() -> Self {
        Self {
            collections: vec![
                CollectionDefaults::for_kind(CollectionKind::Projects),
                CollectionDefaults::for_kind(CollectionKind::Certificates),
            ],
        }
    }

    /// Parses a table from JSON and overlays it on the built-in entries.
    ///
    /// Accepted shape: `{"collections": [{"collection": "...", ...}]}`.
    /// An entry for a built-in collection only replaces the fields it sets;
    /// entries for other collections start from [`CollectionDefaults::default`]
    /// and are appended in document order.
    ///
    /// # Errors
    /// - `ConfigError::Parse` when the document is not valid JSON for this shape.
    /// - Validation errors for blank values or duplicate collections.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let document: DefaultsDocument =
            serde_json::from_str(raw).map_err(|err| ConfigError::Parse(err.to_string()))?;

        let mut seen = BTreeSet::new();
        let mut table = Self::builtin();
        for entry in document.collections {
            let merged = entry.merge_into_base();
            merged.validate()?;
            if !seen.insert(merged.collection.clone()) {
                return Err(ConfigError::DuplicateCollection(merged.collection));
            }

            match table
                .collections
                .iter_mut()
                .find(|existing| existing.collection == merged.collection)
            {
                Some(existing) => *existing = merged,
                None => table.collections.push(merged),
            }
        }
        Ok(table)
    }

    /// Reads and parses a JSON defaults file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| ConfigError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        Self::from_json_str(&raw)
    }

    /// Returns defaults for one collection name.
    pub fn get(&self, collection: &str) -> Option<&CollectionDefaults> {
        let collection = collection.trim();
        self.collections
            .iter()
            .find(|entry| entry.collection == collection)
    }

    /// Returns defaults for a built-in kind, falling back to built-ins.
    pub fn for_kind(&self, kind: CollectionKind) -> CollectionDefaults {
        self.get(kind.collection_name())
            .cloned()
            .unwrap_or_else(|| CollectionDefaults::for_kind(kind))
    }

    /// Returns configured collection names in table order.
    pub fn collection_names(&self) -> Vec<&str> {
        self.collections
            .iter()
            .map(|entry| entry.collection.as_str())
            .collect()
    }
}

/// Defaults table loading and validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Io { path: String, message: String },
    Parse(String),
    EmptyCollection,
    DuplicateCollection(String),
    EmptyValue {
        collection: String,
        field: &'static str,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, message } => {
                write!(f, "failed to read defaults file `{path}`: {message}")
            }
            Self::Parse(message) => write!(f, "invalid defaults document: {message}"),
            Self::EmptyCollection => write!(f, "collection name must not be empty"),
            Self::DuplicateCollection(name) => {
                write!(f, "collection declared more than once: {name}")
            }
            Self::EmptyValue { collection, field } => {
                write!(f, "collection `{collection}` has an empty `{field}`")
            }
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::{CollectionDefaults, CollectionKind, ConfigError, DefaultsTable};

    #[test]
    fn builtin_kinds_use_distinct_placeholders() {
        let projects = CollectionDefaults::for_kind(CollectionKind::Projects);
        let certificates = CollectionDefaults::for_kind(CollectionKind::Certificates);
        assert_eq!(projects.title_placeholder, "Untitled Project");
        assert_eq!(certificates.title_placeholder, "Untitled Certificate");
        assert_eq!(projects.domain_fallback, "Other");
        assert_eq!(certificates.domain_fallback, "General");
        assert!(projects.validate().is_ok());
        assert!(certificates.validate().is_ok());
    }

    #[test]
    fn parses_collection_kind_from_name() {
        assert_eq!(
            CollectionKind::parse(" projects "),
            Some(CollectionKind::Projects)
        );
        assert_eq!(
            CollectionKind::parse("certificates"),
            Some(CollectionKind::Certificates)
        );
        assert_eq!(CollectionKind::parse("blog"), None);
    }

    #[test]
    fn overrides_replace_builtin_and_append_new_collections() {
        let table = DefaultsTable::from_json_str(
            r#"{"collections": [
                {"collection": "projects", "title_placeholder": "Unnamed build"},
                {"collection": "talks", "title_placeholder": "Untitled Talk", "domain_fallback": "Speaking"}
            ]}"#,
        )
        .expect("valid overrides should parse");

        let projects = table.for_kind(CollectionKind::Projects);
        assert_eq!(projects.title_placeholder, "Unnamed build");
        assert_eq!(projects.category, "General");
        assert_eq!(projects.domain_fallback, "Other");

        let talks = table.get("talks").expect("talks should be appended");
        assert_eq!(talks.domain_fallback, "Speaking");
        assert_eq!(
            table.collection_names(),
            vec!["projects", "certificates", "talks"]
        );
    }

    #[test]
    fn partial_override_keeps_unset_builtin_fields() {
        let table = DefaultsTable::from_json_str(
            r#"{"collections": [{"collection": "projects", "title_placeholder": "Unnamed build"}]}"#,
        )
        .expect("title-only override should parse");

        let projects = table.for_kind(CollectionKind::Projects);
        let builtin = CollectionDefaults::for_kind(CollectionKind::Projects);
        assert_eq!(projects.title_placeholder, "Unnamed build");
        assert_eq!(projects.domain_fallback, "Other");
        assert_eq!(projects.tag_keys, builtin.tag_keys);
        assert_eq!(projects.link_keys, builtin.link_keys);
        assert_eq!(
            table.for_kind(CollectionKind::Certificates),
            CollectionDefaults::for_kind(CollectionKind::Certificates)
        );
    }

    #[test]
    fn new_collection_starts_from_generic_defaults() {
        let table = DefaultsTable::from_json_str(
            r#"{"collections": [{"collection": "talks", "link_keys": ["slides"]}]}"#,
        )
        .expect("new collection should parse");

        let talks = table.get("talks").expect("talks should be appended");
        assert_eq!(talks.title_placeholder, "Untitled");
        assert_eq!(talks.domain_fallback, "General");
        assert_eq!(talks.link_keys, vec!["slides".to_string()]);
    }

    #[test]
    fn empty_document_yields_builtin_table() {
        let table = DefaultsTable::from_json_str("{}").expect("empty document should parse");
        assert_eq!(table, DefaultsTable::builtin());
    }

    #[test]
    fn rejects_duplicate_collections() {
        let err = DefaultsTable::from_json_str(
            r#"{"collections": [{"collection": "talks"}, {"collection": " talks "}]}"#,
        )
        .expect_err("duplicate collections must fail");
        assert_eq!(err, ConfigError::DuplicateCollection("talks".to_string()));
    }

    #[test]
    fn rejects_blank_domain_fallback() {
        let err = DefaultsTable::from_json_str(
            r#"{"collections": [{"collection": "talks", "domain_fallback": "  "}]}"#,
        )
        .expect_err("blank fallback must fail");
        assert!(matches!(
            err,
            ConfigError::EmptyValue {
                field: "domain_fallback",
                ..
            }
        ));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = DefaultsTable::from_json_str("{not json").expect_err("must fail");
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
