//! Catalog use-case service.
//!
//! # Responsibility
//! - Fetch one collection through an injected [`SnapshotFetcher`].
//! - Install normalized snapshots atomically and serve filtered views.
//! - Drop late fetch results whose ticket has been superseded.
//!
//! # Invariants
//! - A snapshot is replaced whole; views are never patched in place.
//! - `ViewState::Empty` and `ViewState::Failed` are never conflated.
//! - The memoized view is keyed by `(snapshot version, selector)`.

use crate::aggregate::{
    distinct_categories, distinct_domains, filter_by_category, filter_by_domain, group,
    normalize, GroupedView,
};
use crate::config::{CollectionDefaults, ALL_SELECTOR};
use crate::model::record::ContentRecord;
use crate::snapshot::{FetchResult, SnapshotFetcher};
use log::{info, warn};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

/// Immutable normalized snapshot of one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Monotonic per-service version, starting at 1.
    pub version: u64,
    pub records: Vec<Arc<ContentRecord>>,
    /// Entries dropped by normalization because they were not objects.
    pub skipped: usize,
    /// Domain grouping of `records`, computed once per snapshot.
    pub groups: GroupedView,
}

/// Fetch lifecycle of the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// No fetch has been started yet.
    Idle,
    Loading,
    Ready,
    Failed { message: String },
}

/// Cancellation token for one in-flight fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
}

/// Result of completing a fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied { version: u64, records: usize, skipped: usize },
    Failed,
    /// Ticket was superseded or cancelled; the result was dropped.
    Stale,
}

/// Active category/domain selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ViewSelector {
    pub category: String,
    pub domain: String,
}

impl Default for ViewSelector {
    fn default() -> Self {
        Self::all()
    }
}

impl ViewSelector {
    /// Selector applying no filter.
    pub fn all() -> Self {
        Self {
            category: ALL_SELECTOR.to_string(),
            domain: ALL_SELECTOR.to_string(),
        }
    }

    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            domain: ALL_SELECTOR.to_string(),
        }
    }

    pub fn domain(domain: impl Into<String>) -> Self {
        Self {
            category: ALL_SELECTOR.to_string(),
            domain: domain.into(),
        }
    }
}

/// Render state for a list-of-sections view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    Loading,
    /// Fetch failed; the UI offers a retry.
    Failed { message: String },
    /// Fetch succeeded but nothing matched.
    Empty,
    Ready(GroupedView),
}

/// Orchestrates fetch, normalization and filtering for one collection.
pub struct CatalogService<F: SnapshotFetcher> {
    fetcher: F,
    defaults: CollectionDefaults,
    generation: u64,
    next_version: u64,
    status: LoadStatus,
    snapshot: Option<Arc<Snapshot>>,
    memo: Option<(u64, ViewSelector, GroupedView)>,
}

impl<F: SnapshotFetcher> CatalogService<F> {
    /// Creates a service for the collection described by `defaults`.
    pub fn new(fetcher: F, defaults: CollectionDefaults) -> Self {
        Self {
            fetcher,
            defaults,
            generation: 0,
            next_version: 1,
            status: LoadStatus::Idle,
            snapshot: None,
            memo: None,
        }
    }

    pub fn collection(&self) -> &str {
        &self.defaults.collection
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    /// Current snapshot, shared read-only.
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.snapshot.clone()
    }

    /// Starts a fetch and invalidates any earlier ticket.
    pub fn begin_refresh(&mut self) -> FetchTicket {
        self.generation += 1;
        self.status = LoadStatus::Loading;
        FetchTicket {
            generation: self.generation,
        }
    }

    /// Invalidates in-flight tickets without starting a new fetch.
    ///
    /// The status returns to `Ready` when a snapshot exists, `Idle` otherwise.
    pub fn cancel(&mut self) {
        self.generation += 1;
        if self.status == LoadStatus::Loading {
            self.status = if self.snapshot.is_some() {
                LoadStatus::Ready
            } else {
                LoadStatus::Idle
            };
        }
    }

    /// Applies a fetch result produced for `ticket`.
    pub fn complete_refresh(
        &mut self,
        ticket: FetchTicket,
        result: FetchResult<Vec<Value>>,
    ) -> RefreshOutcome {
        if ticket.generation != self.generation {
            info!(
                "event=catalog_refresh module=service status=stale collection={} ticket={} current={}",
                self.defaults.collection, ticket.generation, self.generation
            );
            return RefreshOutcome::Stale;
        }

        match result {
            Ok(raw) => self.install(&raw),
            Err(err) => {
                warn!(
                    "event=catalog_refresh module=service status=error collection={} error={}",
                    self.defaults.collection, err
                );
                self.status = LoadStatus::Failed {
                    message: err.to_string(),
                };
                RefreshOutcome::Failed
            }
        }
    }

    /// Fetches and applies a snapshot in one call.
    pub fn refresh(&mut self) -> RefreshOutcome {
        let ticket = self.begin_refresh();
        let result = self.fetcher.fetch_collection(&self.defaults.collection);
        self.complete_refresh(ticket, result)
    }

    /// Returns the view for `selector`, reusing the memo when still valid.
    pub fn view(&mut self, selector: &ViewSelector) -> ViewState {
        match &self.status {
            LoadStatus::Idle | LoadStatus::Loading if self.snapshot.is_none() => {
                return ViewState::Loading
            }
            LoadStatus::Failed { message } => {
                return ViewState::Failed {
                    message: message.clone(),
                }
            }
            _ => {}
        }

        let Some(snapshot) = self.snapshot.clone() else {
            return ViewState::Loading;
        };

        let groups = match &self.memo {
            Some((version, memo_selector, groups))
                if *version == snapshot.version && memo_selector == selector =>
            {
                groups.clone()
            }
            _ => {
                let groups = filter_by_category(
                    &filter_by_domain(&snapshot.groups, &selector.domain),
                    &selector.category,
                );
                self.memo = Some((snapshot.version, selector.clone(), groups.clone()));
                groups
            }
        };

        if groups.is_empty() {
            ViewState::Empty
        } else {
            ViewState::Ready(groups)
        }
    }

    /// Category selector values for the current snapshot.
    pub fn categories(&self) -> Vec<String> {
        match &self.snapshot {
            Some(snapshot) => distinct_categories(&snapshot.records),
            None => vec![ALL_SELECTOR.to_string()],
        }
    }

    /// Domain selector values for the current snapshot.
    pub fn domains(&self) -> Vec<String> {
        match &self.snapshot {
            Some(snapshot) => distinct_domains(&snapshot.records),
            None => vec![ALL_SELECTOR.to_string()],
        }
    }

    /// Returns whether the memo currently holds `selector` for the live snapshot.
    pub fn is_memoized(&self, selector: &ViewSelector) -> bool {
        match (&self.memo, &self.snapshot) {
            (Some((version, memo_selector, _)), Some(snapshot)) => {
                *version == snapshot.version && memo_selector == selector
            }
            _ => false,
        }
    }

    fn install(&mut self, raw: &[Value]) -> RefreshOutcome {
        let started_at = Instant::now();
        let outcome = normalize(raw, &self.defaults);
        let version = self.next_version;
        self.next_version += 1;

        let snapshot = Snapshot {
            version,
            groups: group(&outcome.records),
            records: outcome.records,
            skipped: outcome.skipped,
        };
        let records = snapshot.records.len();
        let skipped = snapshot.skipped;

        self.snapshot = Some(Arc::new(snapshot));
        self.memo = None;
        self.status = LoadStatus::Ready;

        info!(
            "event=catalog_refresh module=service status=ok collection={} version={} records={} skipped={} duration_ms={}",
            self.defaults.collection,
            version,
            records,
            skipped,
            started_at.elapsed().as_millis()
        );
        RefreshOutcome::Applied {
            version,
            records,
            skipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CatalogService, LoadStatus, RefreshOutcome, ViewSelector, ViewState};
    use crate::config::{CollectionDefaults, CollectionKind};
    use crate::snapshot::{FetchError, FetchResult, SnapshotFetcher};
    use serde_json::{json, Value};
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Fetcher replaying queued responses.
    struct ScriptedFetcher {
        responses: RefCell<VecDeque<FetchResult<Vec<Value>>>>,
    }

    impl ScriptedFetcher {
        fn new(responses: Vec<FetchResult<Vec<Value>>>) -> Self {
            Self {
                responses: RefCell::new(responses.into()),
            }
        }
    }

    impl SnapshotFetcher for ScriptedFetcher {
        fn fetch_collection(&self, _collection: &str) -> FetchResult<Vec<Value>> {
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn service(responses: Vec<FetchResult<Vec<Value>>>) -> CatalogService<ScriptedFetcher> {
        CatalogService::new(
            ScriptedFetcher::new(responses),
            CollectionDefaults::for_kind(CollectionKind::Projects),
        )
    }

    #[test]
    fn view_is_loading_before_first_refresh() {
        let mut service = service(vec![]);
        assert_eq!(service.status(), &LoadStatus::Idle);
        assert_eq!(service.view(&ViewSelector::all()), ViewState::Loading);
    }

    #[test]
    fn stale_ticket_is_dropped() {
        let mut service = service(vec![]);
        let first = service.begin_refresh();
        let second = service.begin_refresh();

        let late = service.complete_refresh(first, Ok(vec![json!({"id": "old"})]));
        assert_eq!(late, RefreshOutcome::Stale);
        assert!(service.snapshot().is_none());

        let applied = service.complete_refresh(second, Ok(vec![json!({"id": "new"})]));
        assert!(matches!(applied, RefreshOutcome::Applied { version: 1, .. }));
        let snapshot = service.snapshot().expect("snapshot installed");
        assert_eq!(snapshot.records[0].id, "new");
    }

    #[test]
    fn cancel_drops_in_flight_result() {
        let mut service = service(vec![]);
        let ticket = service.begin_refresh();
        service.cancel();
        assert_eq!(service.status(), &LoadStatus::Idle);
        assert_eq!(
            service.complete_refresh(ticket, Ok(vec![json!({})])),
            RefreshOutcome::Stale
        );
    }

    #[test]
    fn failure_and_empty_are_distinct() {
        let mut service = service(vec![
            Err(FetchError::Transport("offline".to_string())),
            Ok(vec![]),
        ]);

        assert_eq!(service.refresh(), RefreshOutcome::Failed);
        assert!(matches!(
            service.view(&ViewSelector::all()),
            ViewState::Failed { message } if message.contains("offline")
        ));

        assert!(matches!(service.refresh(), RefreshOutcome::Applied { .. }));
        assert_eq!(service.view(&ViewSelector::all()), ViewState::Empty);
    }

    #[test]
    fn memo_is_invalidated_by_new_snapshot() {
        let mut service = service(vec![
            Ok(vec![json!({"id": "p1", "category": "Tool", "domain": "Cloud"})]),
            Ok(vec![json!({"id": "p2", "category": "Tool", "domain": "Web"})]),
        ]);
        let selector = ViewSelector::category("Tool");

        service.refresh();
        let first = service.view(&selector);
        assert!(service.is_memoized(&selector));
        assert_eq!(service.view(&selector), first);

        service.refresh();
        assert!(!service.is_memoized(&selector));
        match service.view(&selector) {
            ViewState::Ready(groups) => assert_eq!(groups.keys(), vec!["Web"]),
            other => panic!("unexpected view: {other:?}"),
        }
    }

    #[test]
    fn selectors_reflect_current_snapshot() {
        let mut service = service(vec![Ok(vec![
            json!({"category": "Tool", "domain": ["Cloud", "DevOps"]}),
            json!({"category": "Lib"}),
        ])]);
        assert_eq!(service.categories(), vec!["All"]);

        service.refresh();
        assert_eq!(service.categories(), vec!["All", "Tool", "Lib"]);
        assert_eq!(service.domains(), vec!["All", "Cloud", "DevOps", "Other"]);
    }
}
