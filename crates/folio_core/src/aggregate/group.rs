//! Domain grouping and the grouped view model.
//!
//! # Invariants
//! - Bucket keys keep first-seen order; records keep snapshot order.
//! - A record with N domains is placed in N buckets (membership, not partition).
//! - A view produced by `group` or a filter never holds an empty bucket.

use crate::model::record::ContentRecord;
use serde::Serialize;
use std::sync::Arc;

/// Ordered records sharing one grouping key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bucket {
    pub key: String,
    pub records: Vec<Arc<ContentRecord>>,
}

/// Mapping from group key to ordered records, iterated in key insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct GroupedView {
    buckets: Vec<Bucket>,
}

impl GroupedView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Number of buckets.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Bucket keys in render order.
    pub fn keys(&self) -> Vec<&str> {
        self.buckets.iter().map(|bucket| bucket.key.as_str()).collect()
    }

    /// Records for one key.
    pub fn get(&self, key: &str) -> Option<&[Arc<ContentRecord>]> {
        self.buckets
            .iter()
            .find(|bucket| bucket.key == key)
            .map(|bucket| bucket.records.as_slice())
    }

    /// Record ids for one key, mostly useful for assertions and logs.
    pub fn ids(&self, key: &str) -> Vec<&str> {
        self.get(key)
            .map(|records| records.iter().map(|record| record.id.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    /// Total bucket memberships; a multi-domain record counts once per bucket.
    pub fn membership_count(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.records.len()).sum()
    }

    /// Appends `record` to the bucket for `key`, creating it on first use.
    pub(crate) fn push(&mut self, key: &str, record: Arc<ContentRecord>) {
        match self.buckets.iter_mut().find(|bucket| bucket.key == key) {
            Some(bucket) => bucket.records.push(record),
            None => self.buckets.push(Bucket {
                key: key.to_string(),
                records: vec![record],
            }),
        }
    }

    pub(crate) fn push_bucket(&mut self, bucket: Bucket) {
        if !bucket.records.is_empty() {
            self.buckets.push(bucket);
        }
    }
}

impl<'a> IntoIterator for &'a GroupedView {
    type Item = &'a Bucket;
    type IntoIter = std::slice::Iter<'a, Bucket>;

    fn into_iter(self) -> Self::IntoIter {
        self.buckets.iter()
    }
}

/// Groups records by every member of their `domains`.
pub fn group(records: &[Arc<ContentRecord>]) -> GroupedView {
    let mut view = GroupedView::new();
    for record in records {
        for domain in &record.domains {
            view.push(domain, Arc::clone(record));
        }
    }
    view
}

#[cfg(test)]
mod tests {
    use super::group;
    use crate::model::record::ContentRecord;
    use std::sync::Arc;

    fn record(id: &str, domains: &[&str]) -> Arc<ContentRecord> {
        Arc::new(ContentRecord {
            id: id.to_string(),
            title: id.to_string(),
            description: String::new(),
            tags: Vec::new(),
            category: "General".to_string(),
            domains: domains.iter().map(|value| value.to_string()).collect(),
            media: None,
            links: Vec::new(),
        })
    }

    #[test]
    fn multi_domain_record_lands_in_each_bucket() {
        let records = vec![record("p1", &["Cloud", "DevOps"]), record("p2", &["Cloud"])];
        let view = group(&records);

        assert_eq!(view.keys(), vec!["Cloud", "DevOps"]);
        assert_eq!(view.ids("Cloud"), vec!["p1", "p2"]);
        assert_eq!(view.ids("DevOps"), vec!["p1"]);
        assert_eq!(view.membership_count(), 3);
    }

    #[test]
    fn buckets_share_the_same_record_allocation() {
        let records = vec![record("p1", &["Cloud", "DevOps"])];
        let view = group(&records);
        let cloud = &view.get("Cloud").expect("cloud bucket")[0];
        let devops = &view.get("DevOps").expect("devops bucket")[0];
        assert!(Arc::ptr_eq(cloud, devops));
    }

    #[test]
    fn keys_follow_first_seen_order() {
        let records = vec![
            record("a", &["Web"]),
            record("b", &["AI", "Web"]),
            record("c", &["Cloud"]),
        ];
        let view = group(&records);
        assert_eq!(view.keys(), vec!["Web", "AI", "Cloud"]);
        assert_eq!(view.ids("Web"), vec!["a", "b"]);
    }

    #[test]
    fn empty_snapshot_groups_to_empty_view() {
        let view = group(&[]);
        assert!(view.is_empty());
        assert_eq!(view.len(), 0);
        assert!(view.get("Cloud").is_none());
    }
}
