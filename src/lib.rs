//! Gazetteer - place dataset builder and district resolver
//!
//! This library provides the shared pieces behind the `gazetteer` batch jobs:
//! boundary-polygon resolution, a rate-limited geocoding client, candidate
//! reconciliation and atomic dataset persistence.

pub mod config;
pub mod extract;
pub mod geocode;
pub mod jobs;
pub mod models;
pub mod notify;
pub mod pip;
pub mod reconcile;
pub mod store;

pub use config::Config;
pub use models::{Dataset, Place};
