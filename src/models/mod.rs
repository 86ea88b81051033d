//! Core data models for the place dataset.

pub mod address;
pub mod geocode;
pub mod place;

pub use address::{AddressMap, AdminField};
pub use geocode::GeocodeResult;
pub use place::{Dataset, DatasetMeta, Place};
