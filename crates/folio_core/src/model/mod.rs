//! Content domain model shared by every portfolio collection.
//!
//! # Responsibility
//! - Define the fully-populated record shape consumed by views.
//! - Keep one shape for projects, certificates and future collection kinds.
//!
//! # Invariants
//! - A normalized record never has an empty `domains` list.
//! - Records are immutable once produced; views share them through `Arc`.

pub mod record;
