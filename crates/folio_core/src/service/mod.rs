//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate snapshot fetches and aggregation into view-level APIs.
//! - Keep UI/CLI layers decoupled from storage details.

pub mod catalog_service;
