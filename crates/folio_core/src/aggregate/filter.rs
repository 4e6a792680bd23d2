//! Category/domain selectors over grouped views.
//!
//! # Invariants
//! - The `"All"` selector is the identity.
//! - Filtered views never contain empty buckets.
//! - Selector lists start with `"All"` followed by first-seen values.

use crate::aggregate::group::{Bucket, GroupedView};
use crate::config::ALL_SELECTOR;
use crate::model::record::ContentRecord;
use std::sync::Arc;

/// Keeps only records whose `category` equals `active_category`.
pub fn filter_by_category(groups: &GroupedView, active_category: &str) -> GroupedView {
    if active_category == ALL_SELECTOR {
        return groups.clone();
    }

    let mut filtered = GroupedView::new();
    for bucket in groups {
        filtered.push_bucket(Bucket {
            key: bucket.key.clone(),
            records: bucket
                .records
                .iter()
                .filter(|record| record.category == active_category)
                .cloned()
                .collect(),
        });
    }
    filtered
}

/// Restricts the view to the bucket keyed by `active_domain`.
pub fn filter_by_domain(groups: &GroupedView, active_domain: &str) -> GroupedView {
    if active_domain == ALL_SELECTOR {
        return groups.clone();
    }

    let mut filtered = GroupedView::new();
    if let Some(bucket) = groups.buckets().iter().find(|bucket| bucket.key == active_domain) {
        filtered.push_bucket(bucket.clone());
    }
    filtered
}

/// Returns `"All"` followed by distinct categories in first-seen order.
pub fn distinct_categories(records: &[Arc<ContentRecord>]) -> Vec<String> {
    selector_values(records.iter().map(|record| record.category.as_str()))
}

/// Returns `"All"` followed by distinct domains in first-seen order.
pub fn distinct_domains(records: &[Arc<ContentRecord>]) -> Vec<String> {
    selector_values(
        records
            .iter()
            .flat_map(|record| record.domains.iter().map(String::as_str)),
    )
}

fn selector_values<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut selectors = vec![ALL_SELECTOR.to_string()];
    for value in values {
        if !selectors.iter().any(|existing| existing == value) {
            selectors.push(value.to_string());
        }
    }
    selectors
}
