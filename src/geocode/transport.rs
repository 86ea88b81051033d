//! Wire access to the geocoder. Transports do one request per call; pacing,
//! retries and caching belong to the client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::GeocodeError;
use crate::config::GeocoderConfig;

#[async_trait]
pub trait GeocodeTransport: Send + Sync {
    /// Free-text search; the body is expected to be a JSON array
    async fn search(&self, query: &str) -> Result<Value, GeocodeError>;

    /// Reverse lookup of one coordinate pair; the body is one JSON object
    async fn reverse(&self, lat: &str, lon: &str) -> Result<Value, GeocodeError>;
}

/// Nominatim-compatible HTTP transport
pub struct NominatimTransport {
    client: Client,
    search_url: Url,
    reverse_url: Url,
    result_limit: u32,
    reverse_zoom: u32,
    country_code: String,
}

impl NominatimTransport {
    pub fn new(config: &GeocoderConfig, country_code: &str) -> Result<Self, GeocodeError> {
        if config.user_agent.trim().is_empty() {
            return Err(GeocodeError::MissingUserAgent);
        }
        let client = Client::builder()
            .user_agent(config.user_agent.trim())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GeocodeError::Transport(e.to_string()))?;

        let parse = |raw: &str| {
            Url::parse(raw).map_err(|e| GeocodeError::Transport(format!("bad URL {raw}: {e}")))
        };

        Ok(Self {
            client,
            search_url: parse(&config.search_url)?,
            reverse_url: parse(&config.reverse_url)?,
            result_limit: config.result_limit,
            reverse_zoom: config.reverse_zoom,
            country_code: country_code.to_string(),
        })
    }

    async fn get_json(&self, url: Url) -> Result<Value, GeocodeError> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| GeocodeError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(GeocodeError::RateLimited);
        }
        if !status.is_success() {
            return Err(GeocodeError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| GeocodeError::Transport(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| GeocodeError::Decode(e.to_string()))
    }

    fn search_request(&self, query: &str) -> Url {
        let mut url = self.search_url.clone();
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("format", "jsonv2")
            .append_pair("addressdetails", "1")
            .append_pair("limit", &self.result_limit.to_string())
            .append_pair("countrycodes", &self.country_code);
        url
    }

    fn reverse_request(&self, lat: &str, lon: &str) -> Url {
        let mut url = self.reverse_url.clone();
        url.query_pairs_mut()
            .append_pair("format", "jsonv2")
            .append_pair("lat", lat)
            .append_pair("lon", lon)
            .append_pair("addressdetails", "1")
            .append_pair("zoom", &self.reverse_zoom.to_string())
            .append_pair("countrycodes", &self.country_code);
        url
    }
}

#[async_trait]
impl GeocodeTransport for NominatimTransport {
    async fn search(&self, query: &str) -> Result<Value, GeocodeError> {
        self.get_json(self.search_request(query)).await
    }

    async fn reverse(&self, lat: &str, lon: &str) -> Result<Value, GeocodeError> {
        self.get_json(self.reverse_request(lat, lon)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_user_agent() {
        let config = GeocoderConfig::default();
        assert!(matches!(
            NominatimTransport::new(&config, "in"),
            Err(GeocodeError::MissingUserAgent)
        ));

        let config = GeocoderConfig {
            user_agent: "PlacesBot/1.0 (ops@example.org)".to_string(),
            ..GeocoderConfig::default()
        };
        assert!(NominatimTransport::new(&config, "in").is_ok());
    }

    #[test]
    fn test_requests_are_restricted_to_country() {
        let config = GeocoderConfig {
            user_agent: "PlacesBot/1.0 (ops@example.org)".to_string(),
            ..GeocoderConfig::default()
        };
        let transport = NominatimTransport::new(&config, "in").unwrap();

        let reverse = transport.reverse_request("8.76", "78.13");
        let pairs: Vec<(String, String)> = reverse.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("lat".to_string(), "8.76".to_string())));
        assert!(pairs.contains(&("countrycodes".to_string(), "in".to_string())));

        let search = transport.search_request("Kayathar, Tamil Nadu, India");
        assert!(search
            .query_pairs()
            .any(|(k, v)| k == "countrycodes" && v == "in"));
        assert!(search
            .query_pairs()
            .any(|(k, v)| k == "q" && v == "Kayathar, Tamil Nadu, India"));
    }
}
