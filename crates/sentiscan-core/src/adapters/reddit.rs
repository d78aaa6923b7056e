use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Deserialize;

use crate::cache::ResponseCache;
use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
use crate::data_source::{DocumentSource, ListingRequest, SourceError};
use crate::http_client::{HttpClient, HttpRequest};
use crate::throttling::HostThrottle;
use crate::{ProviderId, TextDocument, UtcDateTime};

const REDDIT_ORIGIN: &str = "https://www.reddit.com";

/// Public JSON listings of forum communities.
///
/// Every request waits on the per-host politeness gate, passes through the
/// circuit breaker of its community, and is cached by URL for the configured
/// TTL. Breakers are per community: one failing community never blocks
/// requests to the others.
#[derive(Clone)]
pub struct RedditAdapter {
    http_client: Arc<dyn HttpClient>,
    throttle: Arc<HostThrottle>,
    cache: ResponseCache,
    breaker_config: CircuitBreakerConfig,
    circuit_breakers: Arc<Mutex<HashMap<String, Arc<CircuitBreaker>>>>,
    request_timeout: Duration,
}

impl RedditAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            throttle: Arc::new(HostThrottle::new(Duration::from_secs(1))),
            cache: ResponseCache::disabled(),
            breaker_config: CircuitBreakerConfig::default(),
            circuit_breakers: Arc::new(Mutex::new(HashMap::new())),
            request_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_throttle(mut self, throttle: Arc<HostThrottle>) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn with_cache(mut self, cache: ResponseCache) -> Self {
        self.cache = cache;
        self
    }

    /// Settings for the per-community breakers. Breakers created earlier are
    /// discarded.
    pub fn with_circuit_breaker_config(mut self, breaker_config: CircuitBreakerConfig) -> Self {
        self.breaker_config = breaker_config;
        self.circuit_breakers = Arc::new(Mutex::new(HashMap::new()));
        self
    }

    /// Breaker state for `community`; closed when it has never been called.
    pub fn circuit_state(&self, community: &str) -> CircuitState {
        self.lock_breakers()
            .get(&community.to_ascii_lowercase())
            .map(|breaker| breaker.state())
            .unwrap_or(CircuitState::Closed)
    }

    fn circuit_breaker(&self, community: &str) -> Arc<CircuitBreaker> {
        let breaker_config = self.breaker_config;
        let mut breakers = self.lock_breakers();
        let breaker = breakers
            .entry(community.to_ascii_lowercase())
            .or_insert_with(|| Arc::new(CircuitBreaker::new(ProviderId::Reddit, breaker_config)));
        Arc::clone(breaker)
    }

    fn lock_breakers(&self) -> MutexGuard<'_, HashMap<String, Arc<CircuitBreaker>>> {
        self.circuit_breakers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn listing_url(request: &ListingRequest) -> String {
        format!(
            "{REDDIT_ORIGIN}/r/{}/{}.json?limit={}",
            request.community, request.listing, request.limit
        )
    }

    async fn fetch_listing(&self, request: ListingRequest) -> Result<Vec<TextDocument>, SourceError> {
        let url = Self::listing_url(&request);

        if let Some(body) = self.cache.get(&url).await {
            tracing::debug!(%url, "listing served from cache");
            return parse_listing(&body, &request.community);
        }

        let circuit_breaker = self.circuit_breaker(&request.community);
        circuit_breaker.check()?;

        let http_request = HttpRequest::get(&url)
            .with_header("accept", "application/json")
            .with_timeout(self.request_timeout);
        self.throttle.acquire(http_request.host()).await;

        let response = self.http_client.execute(http_request).await.map_err(|error| {
            circuit_breaker.record_failure();
            SourceError::from_transport(ProviderId::Reddit, &error)
        })?;

        if !response.is_success() {
            if response.status == 429 || response.status >= 500 {
                circuit_breaker.record_failure();
            }
            return Err(SourceError::from_status(ProviderId::Reddit, response.status));
        }
        circuit_breaker.record_success();

        let documents = parse_listing(&response.body, &request.community)?;
        self.cache.put(url, response.body).await;
        Ok(documents)
    }
}

impl DocumentSource for RedditAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Reddit
    }

    fn fetch_documents<'a>(
        &'a self,
        request: ListingRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<TextDocument>, SourceError>> + Send + 'a>> {
        Box::pin(self.fetch_listing(request))
    }
}

fn parse_listing(body: &str, community: &str) -> Result<Vec<TextDocument>, SourceError> {
    let listing: RedditListing = serde_json::from_str(body).map_err(|e| {
        SourceError::invalid_response(format!("failed to parse r/{community} listing: {e}"))
    })?;

    Ok(listing
        .data
        .children
        .into_iter()
        .map(|child| child.data.into_document(community))
        .collect())
}

#[derive(Debug, Deserialize)]
struct RedditListing {
    data: RedditListingData,
}

#[derive(Debug, Deserialize)]
struct RedditListingData {
    #[serde(default)]
    children: Vec<RedditChild>,
}

#[derive(Debug, Deserialize)]
struct RedditChild {
    data: RedditPost,
}

#[derive(Debug, Deserialize)]
struct RedditPost {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    selftext: Option<String>,
    #[serde(default)]
    permalink: String,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    created_utc: Option<f64>,
}

impl RedditPost {
    fn into_document(self, community: &str) -> TextDocument {
        let mut document = TextDocument::new(
            community,
            self.title.unwrap_or_default(),
            format!("{REDDIT_ORIGIN}{}", self.permalink),
        )
        .with_body(self.selftext.unwrap_or_default())
        .with_score(self.score.map(|score| score as i64).unwrap_or(0));

        if let Some(created) = self
            .created_utc
            .and_then(|seconds| UtcDateTime::from_unix_seconds(seconds).ok())
        {
            document = document.with_published_at(created);
        }
        document
    }
}
