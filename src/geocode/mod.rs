//! Geocoding client: rate limited, retrying, cached access to an external
//! free-text / reverse geocoder.

mod cache;
mod client;
mod limiter;
mod transport;

use thiserror::Error;

pub use cache::GeocodeCache;
pub use client::{fallback_queries, GeocodingClient, MIN_REQUEST_INTERVAL};
pub use limiter::{RateLimiter, RetryPolicy};
pub use transport::{GeocodeTransport, NominatimTransport};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GeocodeError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("rate limited (HTTP 429)")]
    RateLimited,

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("geocoder user agent is not configured")]
    MissingUserAgent,
}
