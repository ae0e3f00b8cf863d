//! Presentation layer: view models and askama template wiring.

pub mod views;
