use std::future::Future;
use std::time::Duration;

use hashbrown::HashMap;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{GeocodeCache, GeocodeError, GeocodeTransport, RateLimiter, RetryPolicy};
use crate::config::GeocoderConfig;
use crate::models::GeocodeResult;
use crate::reconcile::Region;

/// Lowest request spacing accepted from configuration
pub const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(1000);

/// Geocoder access for one pipeline run.
///
/// Every outbound request, retries included, passes through the rate limiter.
/// Exhausted retries come back as "no result", never as an error.
pub struct GeocodingClient<T> {
    transport: T,
    limiter: RateLimiter,
    retry: RetryPolicy,
    cache: GeocodeCache,
    /// Text-search responses seen this run
    searches: HashMap<String, Vec<GeocodeResult>>,
    requests: usize,
}

impl<T: GeocodeTransport> GeocodingClient<T> {
    pub fn new(transport: T, min_interval: Duration, retry: RetryPolicy, cache: GeocodeCache) -> Self {
        Self {
            transport,
            limiter: RateLimiter::new(min_interval),
            retry,
            cache,
            searches: HashMap::new(),
            requests: 0,
        }
    }

    /// Configured client; intervals below [`MIN_REQUEST_INTERVAL`] are raised to it
    pub fn from_config(transport: T, config: &GeocoderConfig, cache: GeocodeCache) -> Self {
        let configured = Duration::from_millis(config.min_interval_ms);
        if configured < MIN_REQUEST_INTERVAL {
            warn!(
                "min_interval_ms = {} is below the geocoder's usage policy, using {:?}",
                config.min_interval_ms, MIN_REQUEST_INTERVAL
            );
        }
        Self::new(
            transport,
            configured.max(MIN_REQUEST_INTERVAL),
            RetryPolicy::from_config(config),
            cache,
        )
    }

    /// Reverse-geocode a coordinate pair, consulting the cache first.
    ///
    /// Failures are cached as an error marker so the coordinate is not asked
    /// for again.
    pub async fn reverse(&mut self, lat: &str, lon: &str) -> Option<GeocodeResult> {
        let key = format!("{},{}", lat, lon);
        if let Some(cached) = self.cache.get(&key) {
            debug!("Cache hit for {}", key);
            return GeocodeResult::from_value(cached);
        }

        let transport = &self.transport;
        let value = match send_with_retry(&self.limiter, &self.retry, &mut self.requests, || {
            transport.reverse(lat, lon)
        })
        .await
        {
            Ok(value) => value,
            Err(e) => {
                warn!("Reverse geocode failed for {}: {}", key, e);
                json!({ "error": e.to_string() })
            }
        };

        let result = GeocodeResult::from_value(&value);
        self.cache.insert(key, value);
        result
    }

    /// Try each query in order and return the first non-empty result set
    pub async fn search_by_text(&mut self, queries: &[String]) -> Vec<GeocodeResult> {
        for query in queries {
            let results = self.search_once(query).await;
            if !results.is_empty() {
                return results;
            }
        }
        Vec::new()
    }

    async fn search_once(&mut self, query: &str) -> Vec<GeocodeResult> {
        if let Some(results) = self.searches.get(query) {
            return results.clone();
        }

        let transport = &self.transport;
        let results = match send_with_retry(&self.limiter, &self.retry, &mut self.requests, || {
            transport.search(query)
        })
        .await
        {
            Ok(value) => GeocodeResult::list_from_value(&value),
            Err(e) => {
                warn!("Search failed for {:?}: {}", query, e);
                Vec::new()
            }
        };

        self.searches.insert(query.to_string(), results.clone());
        results
    }

    pub fn cache(&self) -> &GeocodeCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut GeocodeCache {
        &mut self.cache
    }

    /// Outbound requests issued so far, retries included
    pub fn requests_sent(&self) -> usize {
        self.requests
    }
}

async fn send_with_retry<F, Fut>(
    limiter: &RateLimiter,
    retry: &RetryPolicy,
    requests: &mut usize,
    send: F,
) -> Result<Value, GeocodeError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Value, GeocodeError>>,
{
    let mut retries = 0;
    let mut rate_limit_retries = 0;
    loop {
        limiter.acquire().await;
        *requests += 1;

        let error = match send().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        let Some(wait) = retry.backoff(&error, retries, rate_limit_retries) else {
            return Err(error);
        };
        if error == GeocodeError::RateLimited {
            rate_limit_retries += 1;
        } else {
            retries += 1;
        }
        warn!("Geocoder request failed ({}), retrying in {:?}", error, wait);
        tokio::time::sleep(wait).await;
    }
}

/// Increasingly generic text queries for a place name:
/// one per target spelling and search hint, then state-wide
pub fn fallback_queries(region: &Region, name: &str) -> Vec<String> {
    let clean = region.strip_qualifier(name);
    let mut queries = Vec::new();
    for sub_region in region.target_spellings().iter().chain(&region.search_hints) {
        let query = format!("{}, {}, {}, {}", clean, sub_region, region.state, region.country);
        if !queries.contains(&query) {
            queries.push(query);
        }
    }
    queries.push(format!("{}, {}, {}", clean, region.state, region.country));
    queries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegionConfig;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// Scripted transport recording the virtual time of every call
    #[derive(Default)]
    struct FakeTransport {
        script: Mutex<VecDeque<Result<Value, GeocodeError>>>,
        calls: Mutex<Vec<(Instant, String)>>,
    }

    impl FakeTransport {
        fn with_script(script: Vec<Result<Value, GeocodeError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: Mutex::default(),
            }
        }

        fn next(&self, what: String) -> Result<Value, GeocodeError> {
            self.calls.lock().unwrap().push((Instant::now(), what));
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(json!({ "address": { "state_district": "Default" } })))
        }
    }

    #[async_trait]
    impl GeocodeTransport for FakeTransport {
        async fn search(&self, query: &str) -> Result<Value, GeocodeError> {
            self.next(format!("search:{query}"))
        }

        async fn reverse(&self, lat: &str, lon: &str) -> Result<Value, GeocodeError> {
            self.next(format!("reverse:{lat},{lon}"))
        }
    }

    const INTERVAL: Duration = Duration::from_millis(1100);

    fn client(script: Vec<Result<Value, GeocodeError>>) -> GeocodingClient<FakeTransport> {
        GeocodingClient::new(
            FakeTransport::with_script(script),
            INTERVAL,
            RetryPolicy::default(),
            GeocodeCache::in_memory(),
        )
    }

    fn call_times(client: &GeocodingClient<FakeTransport>) -> Vec<Instant> {
        client.transport.calls.lock().unwrap().iter().map(|(t, _)| *t).collect()
    }

    fn assert_spaced(times: &[Instant]) {
        for pair in times.windows(2) {
            assert!(
                pair[1] - pair[0] >= INTERVAL,
                "requests {:?} apart",
                pair[1] - pair[0]
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_requests_respect_min_interval() {
        let mut client = client(vec![
            Err(GeocodeError::Status(500)),
            Ok(json!({})),
            Err(GeocodeError::RateLimited),
        ]);
        for i in 0..6 {
            client.reverse(&format!("{i}.0"), "78.0").await;
        }
        client.search_by_text(&["a".to_string(), "b".to_string()]).await;

        let times = call_times(&client);
        assert!(times.len() >= 8);
        assert_spaced(&times);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_then_success() {
        let mut client = client(vec![
            Err(GeocodeError::Transport("reset".into())),
            Err(GeocodeError::Status(503)),
            Ok(json!({ "address": { "district": "Madurai" } })),
        ]);
        let start = Instant::now();
        let result = client.reverse("9.9", "78.1").await.unwrap();
        assert_eq!(result.address["district"], "Madurai");
        assert_eq!(client.requests_sent(), 3);
        // 1500ms + 3000ms of backoff
        assert!(start.elapsed() >= Duration::from_millis(4500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_yield_no_result_and_are_cached() {
        let mut client = client(vec![
            Err(GeocodeError::Status(500)),
            Err(GeocodeError::Status(500)),
            Err(GeocodeError::Status(500)),
        ]);
        assert!(client.reverse("1", "2").await.is_none());
        assert_eq!(client.requests_sent(), 3);
        assert!(client.cache().get("1,2").unwrap().get("error").is_some());

        // Cached marker: no further network traffic for this coordinate
        assert!(client.reverse("1", "2").await.is_none());
        assert_eq!(client.requests_sent(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_schedule() {
        let mut client = client(vec![
            Err(GeocodeError::RateLimited),
            Err(GeocodeError::RateLimited),
            Err(GeocodeError::RateLimited),
            Ok(json!({ "address": { "county": "Theni" } })),
        ]);
        let start = Instant::now();
        assert!(client.reverse("1", "2").await.is_some());
        assert_eq!(client.requests_sent(), 4);
        // 2000 + 4000 + 6000
        assert!(start.elapsed() >= Duration::from_millis(12_000));

        let mut client = self::client(vec![Err(GeocodeError::RateLimited); 4]);
        assert!(client.reverse("1", "2").await.is_none());
        assert_eq!(client.requests_sent(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_hit_skips_network() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");

        let mut first = GeocodingClient::new(
            FakeTransport::default(),
            INTERVAL,
            RetryPolicy::default(),
            GeocodeCache::load(&path),
        );
        first.reverse("8.5", "77.9").await.unwrap();
        first.cache_mut().save().unwrap();
        assert_eq!(first.requests_sent(), 1);

        // Fresh process, same cache file
        let mut second = GeocodingClient::new(
            FakeTransport::default(),
            INTERVAL,
            RetryPolicy::default(),
            GeocodeCache::load(&path),
        );
        let hit = second.reverse("8.5", "77.9").await.unwrap();
        assert_eq!(hit.address["state_district"], "Default");
        assert_eq!(second.requests_sent(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_returns_first_non_empty_query() {
        let mut client = client(vec![
            Ok(json!([])),
            Ok(json!([{ "lat": "1", "lon": "2", "display_name": "B" }])),
            Ok(json!([{ "lat": "3", "lon": "4", "display_name": "C" }])),
        ]);
        let queries = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let results = client.search_by_text(&queries).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].display_name.as_deref(), Some("B"));
        assert_eq!(client.requests_sent(), 2);

        // Memoized within the run
        client.search_by_text(&queries).await;
        assert_eq!(client.requests_sent(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_configured_interval_has_a_floor() {
        let config = GeocoderConfig {
            min_interval_ms: 0,
            ..GeocoderConfig::default()
        };
        let mut client = GeocodingClient::from_config(
            FakeTransport::default(),
            &config,
            GeocodeCache::in_memory(),
        );
        assert_eq!(client.limiter.min_interval(), MIN_REQUEST_INTERVAL);

        for i in 0..3 {
            client.reverse(&format!("{i}.5"), "78.0").await;
        }
        let times = call_times(&client);
        assert_eq!(times.len(), 3);
        for pair in times.windows(2) {
            assert!(pair[1] - pair[0] >= MIN_REQUEST_INTERVAL);
        }

        let default = GeocodingClient::from_config(
            FakeTransport::default(),
            &GeocoderConfig::default(),
            GeocodeCache::in_memory(),
        );
        assert_eq!(default.limiter.min_interval(), Duration::from_millis(1200));
    }

    #[test]
    fn test_fallback_queries() {
        let mut config = RegionConfig {
            target: Some("Thoothukkudi".to_string()),
            ..RegionConfig::default()
        };
        config.search_hints.push("Tuticorin".to_string());
        let region = Region::from_config(&config).unwrap();

        assert_eq!(
            fallback_queries(&region, "Kayathar, Tamil Nadu"),
            [
                "Kayathar, Thoothukkudi, Tamil Nadu, India",
                "Kayathar, Thoothukudi, Tamil Nadu, India",
                "Kayathar, Tuticorin, Tamil Nadu, India",
                "Kayathar, Tamil Nadu, India",
            ]
        );
    }
}
