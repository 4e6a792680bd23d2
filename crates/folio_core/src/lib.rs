//! Core content logic for the Folio portfolio.
//! This crate owns normalization, grouping, filtering and media-load rules.

pub mod aggregate;
pub mod config;
pub mod db;
pub mod logging;
pub mod media;
pub mod model;
pub mod service;
pub mod snapshot;

pub use aggregate::{
    distinct_categories, distinct_domains, filter_by_category, filter_by_domain, group,
    normalize, Bucket, GroupedView, NormalizeOutcome,
};
pub use config::{
    CollectionDefaults, CollectionKind, ConfigError, DefaultsTable, ALL_SELECTOR,
    DEFAULT_MEDIA_LOAD_TIMEOUT,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use media::{
    MediaError, MediaErrorReason, MediaKey, MediaLoad, MediaRegistry, MediaState, SettleObserver,
    Transition,
};
pub use model::record::{ContentRecord, Link, Media, MediaKind, RecordId};
pub use service::catalog_service::{
    CatalogService, FetchTicket, LoadStatus, RefreshOutcome, Snapshot, ViewSelector, ViewState,
};
pub use snapshot::{FetchError, FetchResult, ImportReport, SnapshotFetcher, SqliteDocumentStore};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
