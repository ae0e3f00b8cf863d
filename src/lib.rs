//! Gazette: a small publishing service with paginated post listings,
//! per-group and per-author feeds, and author-only editing.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
