//! Contracts between the pipeline and its upstream collaborators.
//!
//! | Trait | Implemented by | Purpose |
//! |-------|----------------|---------|
//! | [`DocumentSource`] | [`RedditAdapter`](crate::adapters::RedditAdapter) | Community listings as [`TextDocument`]s |
//! | [`MarketDataSource`] | [`YahooAdapter`](crate::adapters::YahooAdapter) | Snapshots, headlines, trending symbols |
//! | [`ReportGenerator`] | [`GeminiReportGenerator`](crate::adapters::GeminiReportGenerator) | Narrative analysis report |
//! | [`Notifier`] | [`TelegramNotifier`](crate::adapters::TelegramNotifier) | Digest delivery |
//!
//! Every method returns a boxed `Send` future so implementations can be held
//! as `Arc<dyn Trait>` and swapped for scripted fakes in tests.

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::http_client::HttpError;
use crate::{MarketSnapshot, ProviderId, Symbol, TextDocument};

/// Upper bound the forum API accepts for a single listing page.
pub const MAX_LISTING_LIMIT: usize = 100;

/// Failure classification for upstream calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    Unavailable,
    RateLimited,
    Timeout,
    InvalidRequest,
    InvalidResponse,
    NotConfigured,
    Internal,
}

/// Structured upstream error. Pipeline stages log these and continue with an
/// empty contribution instead of propagating them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    fn new(kind: SourceErrorKind, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Unavailable, message, true)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::RateLimited, message, true)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Timeout, message, true)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::InvalidRequest, message, false)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::InvalidResponse, message, false)
    }

    pub fn not_configured(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::NotConfigured, message, false)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Internal, message, false)
    }

    /// Maps a non-success HTTP status to an error kind.
    pub fn from_status(provider: ProviderId, status: u16) -> Self {
        match status {
            429 => Self::rate_limited(format!("{provider} rate limited the request (429)")),
            400..=499 => Self::invalid_request(format!("{provider} rejected the request ({status})")),
            _ => Self::unavailable(format!("{provider} upstream returned status {status}")),
        }
    }

    pub fn from_transport(provider: ProviderId, error: &HttpError) -> Self {
        if error.timed_out() {
            Self::timeout(format!("{provider} transport timeout: {}", error.message()))
        } else {
            Self::unavailable(format!("{provider} transport error: {}", error.message()))
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::Timeout => "source.timeout",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::InvalidResponse => "source.invalid_response",
            SourceErrorKind::NotConfigured => "source.not_configured",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Result of one upstream fetch as seen by the aggregator.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    Fetched(Vec<T>),
    Empty,
    Failed(SourceError),
}

impl<T> FetchOutcome<T> {
    pub fn from_result(result: Result<Vec<T>, SourceError>) -> Self {
        match result {
            Ok(items) if items.is_empty() => Self::Empty,
            Ok(items) => Self::Fetched(items),
            Err(error) => Self::Failed(error),
        }
    }

    /// Items contributed by this fetch; failures contribute nothing.
    pub fn into_items(self) -> Vec<T> {
        match self {
            Self::Fetched(items) => items,
            Self::Empty | Self::Failed(_) => Vec::new(),
        }
    }

    pub fn error(&self) -> Option<&SourceError> {
        match self {
            Self::Failed(error) => Some(error),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Community listing ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Listing {
    Hot,
    New,
}

impl Listing {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hot => "hot",
            Self::New => "new",
        }
    }
}

impl Display for Listing {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One page of one community listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRequest {
    pub community: String,
    pub listing: Listing,
    pub limit: usize,
}

impl ListingRequest {
    /// Validates the community name and caps `limit` at [`MAX_LISTING_LIMIT`].
    pub fn new(
        community: impl Into<String>,
        listing: Listing,
        limit: usize,
    ) -> Result<Self, SourceError> {
        let community = community.into();
        let valid_name = !community.is_empty()
            && community
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
        if !valid_name {
            return Err(SourceError::invalid_request(format!(
                "invalid community name '{community}'"
            )));
        }
        if limit == 0 {
            return Err(SourceError::invalid_request(
                "listing limit must be greater than zero",
            ));
        }

        Ok(Self {
            community,
            listing,
            limit: limit.min(MAX_LISTING_LIMIT),
        })
    }
}

/// Source of community text documents.
pub trait DocumentSource: Send + Sync {
    fn id(&self) -> ProviderId;

    fn fetch_documents<'a>(
        &'a self,
        request: ListingRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<TextDocument>, SourceError>> + Send + 'a>>;
}

/// Source of prices, short-interest data, and headlines.
pub trait MarketDataSource: Send + Sync {
    fn id(&self) -> ProviderId;

    /// `Ok(None)` means the symbol has no price (unknown or delisted).
    fn snapshot<'a>(
        &'a self,
        symbol: Symbol,
        extended: bool,
    ) -> Pin<Box<dyn Future<Output = Result<Option<MarketSnapshot>, SourceError>> + Send + 'a>>;

    /// Headlines for `symbol`, newest first.
    fn headlines<'a>(
        &'a self,
        symbol: Symbol,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<TextDocument>, SourceError>> + Send + 'a>>;

    /// Trending equity symbols, crypto and forex pairs removed.
    fn trending<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Symbol>, SourceError>> + Send + 'a>>;

    fn market_news<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<TextDocument>, SourceError>> + Send + 'a>>;
}

/// Inputs for a narrative report on one symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportContext {
    pub symbol: Symbol,
    pub snapshot: MarketSnapshot,
    pub discussions: Vec<TextDocument>,
    pub headlines: Vec<TextDocument>,
}

/// Produces a free-text analysis report. Failures are rendered into the
/// returned text rather than surfaced as errors.
pub trait ReportGenerator: Send + Sync {
    fn generate<'a>(
        &'a self,
        context: ReportContext,
    ) -> Pin<Box<dyn Future<Output = String> + Send + 'a>>;
}

/// Delivers a formatted message to an external channel.
pub trait Notifier: Send + Sync {
    fn id(&self) -> ProviderId;

    fn send<'a>(
        &'a self,
        message: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), SourceError>> + Send + 'a>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_limit_is_capped() {
        let request =
            ListingRequest::new("wallstreetbets", Listing::Hot, 500).expect("valid request");
        assert_eq!(request.limit, MAX_LISTING_LIMIT);
    }

    #[test]
    fn rejects_bad_community_and_zero_limit() {
        let err = ListingRequest::new("bad/name", Listing::New, 5).expect_err("must fail");
        assert_eq!(err.kind(), SourceErrorKind::InvalidRequest);

        let err = ListingRequest::new("stocks", Listing::New, 0).expect_err("must fail");
        assert_eq!(err.kind(), SourceErrorKind::InvalidRequest);
    }

    #[test]
    fn status_mapping_distinguishes_rate_limits() {
        assert_eq!(
            SourceError::from_status(ProviderId::Reddit, 429).kind(),
            SourceErrorKind::RateLimited
        );
        assert_eq!(
            SourceError::from_status(ProviderId::Reddit, 404).kind(),
            SourceErrorKind::InvalidRequest
        );
        let unavailable = SourceError::from_status(ProviderId::Yahoo, 503);
        assert_eq!(unavailable.code(), "source.unavailable");
        assert!(unavailable.retryable());
    }

    #[test]
    fn failed_outcome_contributes_nothing() {
        let failed: FetchOutcome<u32> =
            FetchOutcome::from_result(Err(SourceError::timeout("slow upstream")));
        assert!(failed.is_failed());
        assert_eq!(failed.error().map(SourceError::kind), Some(SourceErrorKind::Timeout));
        assert!(failed.into_items().is_empty());

        let empty: FetchOutcome<u32> = FetchOutcome::from_result(Ok(Vec::new()));
        assert_eq!(empty, FetchOutcome::Empty);

        let fetched = FetchOutcome::from_result(Ok(vec![1, 2]));
        assert_eq!(fetched.into_items(), vec![1, 2]);
    }
}
