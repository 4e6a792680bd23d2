//! Loosely-typed snapshot entry to `ContentRecord` mapping.
//!
//! # Responsibility
//! - Coerce document-store values into fully-populated records.
//! - Apply per-collection defaults from [`CollectionDefaults`].
//!
//! # Invariants
//! - Never fails: missing or wrong-typed fields fall back to defaults.
//! - Non-object entries are skipped and counted, never returned.
//! - Output order equals input order of accepted entries.
//! - Generated ids never collide with ids present in the same snapshot.

use crate::config::CollectionDefaults;
use crate::model::record::{ContentRecord, Link, Media, MediaKind};
use log::debug;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;

const DOMAIN_KEYS: &[&str] = &["domain", "domains"];
const VIDEO_KEYS: &[&str] = &["video", "videoUrl"];
const IMAGE_KEYS: &[&str] = &["image", "imageUrl"];
const MEDIA_URL_KEY: &str = "mediaUrl";
const MEDIA_KIND_KEY: &str = "mediaKind";
const LINKS_KEY: &str = "links";

/// Normalization result for one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeOutcome {
    /// Records in snapshot order, shared by every derived view.
    pub records: Vec<Arc<ContentRecord>>,
    /// Count of entries that were not objects.
    pub skipped: usize,
}

/// Normalizes one raw snapshot into render-ready records.
pub fn normalize(raw: &[Value], defaults: &CollectionDefaults) -> NormalizeOutcome {
    let mut outcome = NormalizeOutcome::default();
    let mut taken_ids: HashSet<String> = raw
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|object| object.get("id").and_then(scalar_to_string))
        .collect();

    for (index, entry) in raw.iter().enumerate() {
        match entry.as_object() {
            Some(object) => {
                let id = match object.get("id").and_then(scalar_to_string) {
                    Some(id) => id,
                    None => generate_id(&defaults.collection, index, &mut taken_ids),
                };
                outcome
                    .records
                    .push(Arc::new(normalize_object(id, object, defaults)));
            }
            None => {
                outcome.skipped += 1;
                debug!(
                    "event=record_skipped module=aggregate status=skipped collection={} index={} reason=not_object",
                    defaults.collection, index
                );
            }
        }
    }

    outcome
}

/// Returns `{collection}-{index}`, suffixed with `-{n}` while that id is taken.
fn generate_id(collection: &str, index: usize, taken: &mut HashSet<String>) -> String {
    let base = format!("{collection}-{index}");
    let mut candidate = base.clone();
    let mut suffix = 1usize;
    while taken.contains(&candidate) {
        candidate = format!("{base}-{suffix}");
        suffix += 1;
    }
    taken.insert(candidate.clone());
    candidate
}

fn normalize_object(
    id: String,
    object: &Map<String, Value>,
    defaults: &CollectionDefaults,
) -> ContentRecord {
    ContentRecord {
        id,
        title: non_blank_string(object.get("title"))
            .unwrap_or_else(|| defaults.title_placeholder.clone()),
        description: non_blank_string(object.get("description"))
            .unwrap_or_else(|| defaults.description_placeholder.clone()),
        tags: coerce_tags(object, &defaults.tag_keys),
        category: non_blank_string(object.get("category"))
            .unwrap_or_else(|| defaults.category.clone()),
        domains: coerce_domains(object, &defaults.domain_fallback),
        media: coerce_media(object),
        links: coerce_links(object, &defaults.link_keys),
    }
}

/// Returns the trimmed string when `value` is a non-blank string.
fn non_blank_string(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        _ => None,
    }
}

/// Coerces strings, numbers and booleans to non-blank strings.
fn scalar_to_string(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        _ => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn coerce_string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(scalar_to_string).collect(),
        other => scalar_to_string(other).into_iter().collect(),
    }
}

fn coerce_tags(object: &Map<String, Value>, tag_keys: &[String]) -> Vec<String> {
    tag_keys
        .iter()
        .find_map(|key| object.get(key.as_str()))
        .map(coerce_string_list)
        .unwrap_or_default()
}

/// First domain key yielding at least one usable value wins.
fn coerce_domains(object: &Map<String, Value>, fallback: &str) -> Vec<String> {
    DOMAIN_KEYS
        .iter()
        .filter_map(|key| object.get(*key))
        .map(|value| dedupe_in_order(coerce_string_list(value)))
        .find(|domains| !domains.is_empty())
        .unwrap_or_else(|| vec![fallback.to_string()])
}

fn dedupe_in_order(values: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        if !unique.contains(&value) {
            unique.push(value);
        }
    }
    unique
}

fn coerce_media(object: &Map<String, Value>) -> Option<Media> {
    let first_uri = |keys: &[&str]| {
        keys.iter()
            .find_map(|key| non_blank_string(object.get(*key)))
    };

    if let Some(uri) = first_uri(VIDEO_KEYS) {
        return Some(Media {
            uri,
            kind: MediaKind::Video,
        });
    }
    if let Some(uri) = first_uri(IMAGE_KEYS) {
        return Some(Media {
            uri,
            kind: MediaKind::Image,
        });
    }

    let uri = non_blank_string(object.get(MEDIA_URL_KEY))?;
    let kind = match non_blank_string(object.get(MEDIA_KIND_KEY)).as_deref() {
        Some(value) if value.eq_ignore_ascii_case("video") => MediaKind::Video,
        _ => MediaKind::Image,
    };
    Some(Media { uri, kind })
}

/// Nested `links` entries keep document order, then `link_keys` fill gaps.
fn coerce_links(object: &Map<String, Value>, link_keys: &[String]) -> Vec<Link> {
    let mut links = Vec::new();

    if let Some(Value::Object(named)) = object.get(LINKS_KEY) {
        for (name, value) in named {
            if let Some(uri) = non_blank_string(Some(value)) {
                links.push(Link {
                    name: name.clone(),
                    uri,
                });
            }
        }
    }

    for key in link_keys {
        if links.iter().any(|link| &link.name == key) {
            continue;
        }
        if let Some(uri) = non_blank_string(object.get(key.as_str())) {
            links.push(Link {
                name: key.clone(),
                uri,
            });
        }
    }

    links
}
