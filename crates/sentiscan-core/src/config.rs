use std::env;
use std::time::Duration;

use crate::ValidationError;

/// Browser-like user agent; the public listing endpoints throttle generic
/// library agents aggressively.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

pub const DEFAULT_COMMUNITIES: [&str; 4] = ["wallstreetbets", "stocks", "investing", "valueinvesting"];

/// Runtime settings for a [`Scanner`](crate::Scanner).
#[derive(Debug, Clone, PartialEq)]
pub struct ScannerConfig {
    /// Forum communities scanned for mentions and discussions.
    pub communities: Vec<String>,
    pub user_agent: String,
    /// Per-request HTTP timeout handed to the transport.
    pub http_timeout: Duration,
    /// Outer bound on any single source fetch, politeness wait included.
    pub fetch_timeout: Duration,
    /// Minimum spacing between requests to the forum host.
    pub politeness_delay: Duration,
    /// Minimum spacing between requests to a finance portal host.
    pub portal_politeness_delay: Duration,
    /// Maximum per-symbol enrichment fetches in flight.
    pub concurrency: usize,
    pub cache_ttl: Duration,
    /// Listing sizes used when looking up discussions of one symbol.
    pub discussion_hot_limit: usize,
    pub discussion_new_limit: usize,
    pub trending_top_k: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            communities: DEFAULT_COMMUNITIES.iter().map(|c| (*c).to_owned()).collect(),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            http_timeout: Duration::from_secs(10),
            fetch_timeout: Duration::from_secs(15),
            politeness_delay: Duration::from_secs(1),
            portal_politeness_delay: Duration::from_millis(200),
            concurrency: 4,
            cache_ttl: Duration::from_secs(60),
            discussion_hot_limit: 50,
            discussion_new_limit: 25,
            trending_top_k: 10,
        }
    }
}

impl ScannerConfig {
    /// Defaults overlaid with `SENTISCAN_*` environment variables.
    pub fn from_env() -> Result<Self, ValidationError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup("SENTISCAN_COMMUNITIES") {
            let communities = raw
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_owned)
                .collect::<Vec<_>>();
            if communities.is_empty() {
                return Err(ValidationError::InvalidConfig {
                    key: "SENTISCAN_COMMUNITIES",
                    value: raw,
                    reason: "expected a comma separated list of community names",
                });
            }
            config.communities = communities;
        }

        if let Some(agent) = lookup("SENTISCAN_USER_AGENT").filter(|a| !a.trim().is_empty()) {
            config.user_agent = agent;
        }

        if let Some(ms) = parse_u64(&lookup, "SENTISCAN_HTTP_TIMEOUT_MS")? {
            config.http_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_u64(&lookup, "SENTISCAN_FETCH_TIMEOUT_MS")? {
            config.fetch_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_u64(&lookup, "SENTISCAN_POLITENESS_MS")? {
            config.politeness_delay = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_u64(&lookup, "SENTISCAN_CACHE_TTL_SECS")? {
            config.cache_ttl = Duration::from_secs(secs);
        }
        if let Some(concurrency) = parse_u64(&lookup, "SENTISCAN_CONCURRENCY")? {
            if concurrency == 0 {
                return Err(ValidationError::InvalidConfig {
                    key: "SENTISCAN_CONCURRENCY",
                    value: concurrency.to_string(),
                    reason: "must be at least 1",
                });
            }
            config.concurrency = usize::try_from(concurrency).unwrap_or(usize::MAX);
        }

        Ok(config)
    }
}

fn parse_u64<F>(lookup: &F, key: &'static str) -> Result<Option<u64>, ValidationError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<u64>()
        .map(Some)
        .map_err(|_| ValidationError::InvalidConfig {
            key,
            value: raw,
            reason: "expected a non-negative integer",
        })
}
