//! Application layer: services, repository traits, and error plumbing.

pub mod error;
pub mod feed;
pub mod pagination;
pub mod posts;
pub mod repos;
