//! Content aggregation and presentation filters.
//!
//! # Responsibility
//! - Turn a raw snapshot into normalized records (`normalize`).
//! - Group records by domain and narrow views by category/domain selectors.
//!
//! # Invariants
//! - Every function is pure, synchronous and total; none performs I/O.
//! - Source records are never mutated; views are regenerated, not patched.

pub mod filter;
pub mod group;
pub mod normalize;

pub use filter::{distinct_categories, distinct_domains, filter_by_category, filter_by_domain};
pub use group::{group, Bucket, GroupedView};
pub use normalize::{normalize, NormalizeOutcome};
