//! The `Scanner` service: trending scans, discussion lookups, per-symbol
//! analysis, and squeeze ranking over injected sources.
//!
//! Every upstream fetch is bounded by [`ScannerConfig::fetch_timeout`] and
//! folded through [`FetchOutcome`]; a failed or timed-out fetch is logged and
//! contributes nothing. Per-symbol work fans out with at most
//! [`ScannerConfig::concurrency`] futures in flight and results are returned
//! in input order.

use std::future::Future;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};

use crate::adapters::{GeminiReportGenerator, RedditAdapter, YahooAdapter};
use crate::aggregator::{mean_compound, select_discussions, MentionCounts, ScoredText, SymbolMentionCount};
use crate::cache::ResponseCache;
use crate::config::ScannerConfig;
use crate::data_source::{
    DocumentSource, FetchOutcome, Listing, ListingRequest, MarketDataSource, ReportContext,
    ReportGenerator, SourceError,
};
use crate::extractor::SymbolExtractor;
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::sentiment::{SentimentScorer, VaderScorer};
use crate::signal::{rank_descending, squeeze_score, volume_ratio, Recommendation, SignalResult};
use crate::throttling::HostThrottle;
use crate::{MarketSnapshot, Symbol, TextDocument};

/// Discussions considered when analyzing one symbol. The same list feeds the
/// sentiment rollup and the mention volume.
pub const ANALYSIS_DISCUSSION_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalyzeOptions {
    /// Request a narrative report; only honored when a snapshot exists.
    pub use_llm: bool,
}

/// Sentiment section of an analysis record. Scores are rounded to two
/// decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentSummary {
    pub reddit_score: f64,
    pub news_score: f64,
    pub reddit_post_count: usize,
    pub news_item_count: usize,
}

/// Result of analyzing one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolAnalysis {
    pub ticker: Symbol,
    pub market_data: Option<MarketSnapshot>,
    pub sentiment: SentimentSummary,
    pub squeeze_score: f64,
    pub recommendation: Recommendation,
    pub signal: SignalResult,
    pub llm_report: Option<String>,
    /// Set when the symbol has no market snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SymbolAnalysis {
    pub fn has_market_data(&self) -> bool {
        self.market_data.is_some()
    }
}

/// One row of the squeeze ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqueezeRow {
    pub symbol: Symbol,
    pub squeeze_score: f64,
    pub short_float: f64,
    pub volume_ratio: Option<f64>,
    pub mentions: u32,
    pub current_price: f64,
    pub change_pct: f64,
}

/// Sentiment pipeline over one document source and one market-data source.
///
/// Construct once per process with [`ScannerBuilder`] and reuse; the
/// adapters it holds share one transport, one politeness gate per host, and
/// one listing cache.
pub struct Scanner {
    config: ScannerConfig,
    documents: Arc<dyn DocumentSource>,
    market: Arc<dyn MarketDataSource>,
    scorer: Arc<dyn SentimentScorer>,
    report_generator: Option<Arc<dyn ReportGenerator>>,
    extractor: SymbolExtractor,
}

impl Scanner {
    pub fn builder() -> ScannerBuilder {
        ScannerBuilder::new()
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Top symbols by mention count across the hot and new listings of every
    /// community, reading up to `limit` posts per listing.
    ///
    /// Each listing is an independent contribution; the result holds at most
    /// [`ScannerConfig::trending_top_k`] entries.
    pub async fn scan_trending(&self, limit: usize) -> Vec<SymbolMentionCount> {
        let requests = self.listing_requests(limit, limit);
        let outcomes = bounded_fan_out(requests, self.config.concurrency, |request| {
            self.fetch_listing(request)
        })
        .await;

        let mut counts = MentionCounts::new();
        for outcome in outcomes {
            let mut listing_counts = MentionCounts::new();
            listing_counts.record_documents(&self.extractor, &outcome.into_items());
            counts.merge(listing_counts);
        }

        tracing::debug!(distinct = counts.len(), "trending scan complete");
        counts.top(self.config.trending_top_k)
    }

    /// Trending symbols from the finance portal; empty on failure.
    pub async fn portal_trending(&self) -> Vec<Symbol> {
        let result = self.bounded("portal trending", self.market.trending()).await;
        let outcome = FetchOutcome::from_result(result);
        if let Some(error) = outcome.error() {
            tracing::warn!(source = %self.market.id(), error = %error, "portal trending unavailable");
        }
        outcome.into_items()
    }

    /// Posts mentioning `symbol`, deduplicated by URL, best scored first.
    pub async fn discussions(&self, symbol: &Symbol, limit: usize) -> Vec<TextDocument> {
        select_discussions(self.discussion_pool().await, symbol, limit)
    }

    /// Snapshot, discussions, headlines, sentiment rollups, and the signal for
    /// one symbol. Never fails; a missing snapshot is reported in
    /// [`SymbolAnalysis::error`].
    pub async fn analyze_symbol(&self, symbol: Symbol, options: AnalyzeOptions) -> SymbolAnalysis {
        let pool = self.discussion_pool().await;
        self.analyze_with_pool(symbol, &pool, options).await
    }

    /// [`analyze_symbol`](Self::analyze_symbol) for several symbols sharing
    /// one read of the community listings.
    pub async fn analyze_many(
        &self,
        symbols: Vec<Symbol>,
        options: AnalyzeOptions,
    ) -> Vec<SymbolAnalysis> {
        if symbols.is_empty() {
            return Vec::new();
        }

        let pool = self.discussion_pool().await;
        let pool = &pool;
        bounded_fan_out(symbols, self.config.concurrency, |symbol| {
            self.analyze_with_pool(symbol, pool, options)
        })
        .await
    }

    /// Extended snapshots for `symbols`, in input order; `None` where the
    /// symbol has no data or the fetch failed.
    pub async fn snapshots(&self, symbols: Vec<Symbol>, extended: bool) -> Vec<Option<MarketSnapshot>> {
        bounded_fan_out(symbols, self.config.concurrency, |symbol| {
            self.snapshot(symbol, extended)
        })
        .await
    }

    /// Trending symbols ranked by squeeze potential. Symbols without a
    /// snapshot are dropped; equal scores keep trending order.
    pub async fn squeeze_scan(&self, limit: usize) -> Vec<SqueezeRow> {
        let trending = self.scan_trending(limit).await;
        let symbols = trending.iter().map(|entry| entry.symbol.clone()).collect();
        let snapshots = self.snapshots(symbols, true).await;

        let mut rows = trending
            .into_iter()
            .zip(snapshots)
            .filter_map(|(entry, snapshot)| {
                let snapshot = snapshot?;
                let volume = snapshot.volume as f64;
                let avg_volume = snapshot.avg_volume_or_zero();
                Some(SqueezeRow {
                    squeeze_score: squeeze_score(entry.count, snapshot.short_float, volume, avg_volume),
                    short_float: snapshot.short_float_or_zero(),
                    volume_ratio: volume_ratio(volume, avg_volume),
                    mentions: entry.count,
                    current_price: snapshot.current_price,
                    change_pct: snapshot.change_pct,
                    symbol: entry.symbol,
                })
            })
            .collect::<Vec<_>>();

        rank_descending(&mut rows, |row| row.squeeze_score);
        rows
    }

    /// General market headlines; empty on failure.
    pub async fn market_news(&self) -> Vec<TextDocument> {
        let result = self.bounded("market news", self.market.market_news()).await;
        let outcome = FetchOutcome::from_result(result);
        if let Some(error) = outcome.error() {
            tracing::warn!(source = %self.market.id(), error = %error, "market news unavailable");
        }
        outcome.into_items()
    }

    async fn analyze_with_pool(
        &self,
        symbol: Symbol,
        pool: &[TextDocument],
        options: AnalyzeOptions,
    ) -> SymbolAnalysis {
        let discussions =
            select_discussions(pool.iter().cloned(), &symbol, ANALYSIS_DISCUSSION_LIMIT);
        let mentions = u32::try_from(discussions.len()).unwrap_or(u32::MAX);

        let (snapshot, headlines) =
            tokio::join!(self.snapshot(symbol.clone(), true), self.headlines(&symbol));

        let reddit_score = mean_compound(self.scorer.as_ref(), &discussions, ScoredText::TitleAndBody);
        let news_score = mean_compound(self.scorer.as_ref(), &headlines, ScoredText::TitleOnly);

        let (trend, short_float, volume, avg_volume) = match snapshot.as_ref() {
            Some(snapshot) => (
                snapshot.change_pct,
                snapshot.short_float,
                snapshot.volume as f64,
                snapshot.avg_volume_or_zero(),
            ),
            None => (0.0, None, 0.0, 0.0),
        };
        let squeeze = squeeze_score(mentions, short_float, volume, avg_volume);
        let signal = SignalResult::evaluate(symbol.clone(), mentions, reddit_score, news_score, trend, squeeze);

        let llm_report = match (&snapshot, &self.report_generator) {
            (Some(snapshot), Some(generator)) if options.use_llm => Some(
                generator
                    .generate(ReportContext {
                        symbol: symbol.clone(),
                        snapshot: snapshot.clone(),
                        discussions: discussions.clone(),
                        headlines: headlines.clone(),
                    })
                    .await,
            ),
            _ => None,
        };

        let error = snapshot
            .is_none()
            .then(|| format!("no market data available for {symbol}"));

        SymbolAnalysis {
            ticker: symbol,
            market_data: snapshot,
            sentiment: SentimentSummary {
                reddit_score: round2(reddit_score),
                news_score: round2(news_score),
                reddit_post_count: discussions.len(),
                news_item_count: headlines.len(),
            },
            squeeze_score: squeeze,
            recommendation: signal.recommendation,
            signal,
            llm_report,
            error,
        }
    }

    /// Every post from the discussion listings of every community, in
    /// community then listing order.
    async fn discussion_pool(&self) -> Vec<TextDocument> {
        let requests = self.discussion_requests();
        bounded_fan_out(requests, self.config.concurrency, |request| self.fetch_listing(request))
            .await
            .into_iter()
            .flat_map(FetchOutcome::into_items)
            .collect()
    }

    async fn fetch_listing(&self, request: ListingRequest) -> FetchOutcome<TextDocument> {
        let community = request.community.clone();
        let listing = request.listing;

        let result = self
            .bounded("community listing", self.documents.fetch_documents(request))
            .await;
        let outcome = FetchOutcome::from_result(result);
        if let Some(error) = outcome.error() {
            tracing::warn!(
                source = %self.documents.id(),
                community = %community,
                listing = %listing,
                error = %error,
                "listing fetch failed; contributing nothing"
            );
        }
        outcome
    }

    async fn snapshot(&self, symbol: Symbol, extended: bool) -> Option<MarketSnapshot> {
        let result = self
            .bounded("market snapshot", self.market.snapshot(symbol.clone(), extended))
            .await;
        match result {
            Ok(Some(snapshot)) => Some(snapshot),
            Ok(None) => {
                tracing::warn!(symbol = %symbol, "no market data for symbol");
                None
            }
            Err(error) => {
                tracing::warn!(
                    source = %self.market.id(),
                    symbol = %symbol,
                    error = %error,
                    "market snapshot unavailable"
                );
                None
            }
        }
    }

    async fn headlines(&self, symbol: &Symbol) -> Vec<TextDocument> {
        let result = self
            .bounded("headlines", self.market.headlines(symbol.clone()))
            .await;
        let outcome = FetchOutcome::from_result(result);
        if let Some(error) = outcome.error() {
            tracing::warn!(
                source = %self.market.id(),
                symbol = %symbol,
                error = %error,
                "headlines unavailable"
            );
        }
        outcome.into_items()
    }

    async fn bounded<T, F>(&self, what: &str, fetch: F) -> Result<T, SourceError>
    where
        F: Future<Output = Result<T, SourceError>>,
    {
        match tokio::time::timeout(self.config.fetch_timeout, fetch).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::timeout(format!(
                "{what} fetch exceeded {} ms",
                self.config.fetch_timeout.as_millis()
            ))),
        }
    }

    fn listing_requests(&self, hot_limit: usize, new_limit: usize) -> Vec<ListingRequest> {
        self.config
            .communities
            .iter()
            .flat_map(|community| {
                [(Listing::Hot, hot_limit), (Listing::New, new_limit)]
                    .into_iter()
                    .map(move |(listing, limit)| (community, listing, limit))
            })
            .filter_map(|(community, listing, limit)| {
                match ListingRequest::new(community.as_str(), listing, limit) {
                    Ok(request) => Some(request),
                    Err(error) => {
                        tracing::warn!(community = %community, error = %error, "skipping listing");
                        None
                    }
                }
            })
            .collect()
    }

    fn discussion_requests(&self) -> Vec<ListingRequest> {
        self.listing_requests(
            self.config.discussion_hot_limit,
            self.config.discussion_new_limit,
        )
    }
}

/// Builder for [`Scanner`]. Anything not supplied falls back to the
/// production adapters built from the config and one shared transport.
#[derive(Default)]
pub struct ScannerBuilder {
    config: ScannerConfig,
    http_client: Option<Arc<dyn HttpClient>>,
    documents: Option<Arc<dyn DocumentSource>>,
    market: Option<Arc<dyn MarketDataSource>>,
    scorer: Option<Arc<dyn SentimentScorer>>,
    report_generator: Option<Arc<dyn ReportGenerator>>,
}

impl ScannerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: ScannerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_http_client(mut self, http_client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(http_client);
        self
    }

    pub fn with_document_source(mut self, documents: Arc<dyn DocumentSource>) -> Self {
        self.documents = Some(documents);
        self
    }

    pub fn with_market_source(mut self, market: Arc<dyn MarketDataSource>) -> Self {
        self.market = Some(market);
        self
    }

    pub fn with_scorer(mut self, scorer: Arc<dyn SentimentScorer>) -> Self {
        self.scorer = Some(scorer);
        self
    }

    pub fn with_report_generator(mut self, report_generator: Arc<dyn ReportGenerator>) -> Self {
        self.report_generator = Some(report_generator);
        self
    }

    pub fn build(self) -> Scanner {
        let config = self.config;
        let http_client = self
            .http_client
            .unwrap_or_else(|| Arc::new(ReqwestHttpClient::new(&config.user_agent)));

        let documents = self.documents.unwrap_or_else(|| {
            Arc::new(
                RedditAdapter::new(http_client.clone())
                    .with_throttle(Arc::new(HostThrottle::new(config.politeness_delay)))
                    .with_cache(ResponseCache::new(config.cache_ttl))
                    .with_request_timeout(config.http_timeout),
            )
        });

        let market = self.market.unwrap_or_else(|| {
            Arc::new(
                YahooAdapter::new(http_client.clone())
                    .with_throttle(Arc::new(HostThrottle::new(config.portal_politeness_delay)))
                    .with_request_timeout(config.http_timeout),
            )
        });

        let report_generator = self
            .report_generator
            .unwrap_or_else(|| Arc::new(GeminiReportGenerator::from_env(http_client.clone())));

        Scanner {
            documents,
            market,
            scorer: self.scorer.unwrap_or_else(|| Arc::new(VaderScorer::new())),
            report_generator: Some(report_generator),
            extractor: SymbolExtractor::new(),
            config,
        }
    }
}

/// Runs `task` over `items` with at most `concurrency` futures in flight and
/// returns the outputs in input order.
pub async fn bounded_fan_out<T, R, F, Fut>(items: Vec<T>, concurrency: usize, mut task: F) -> Vec<R>
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = R>,
{
    let mut indexed = stream::iter(items.into_iter().enumerate())
        .map(|(index, item)| {
            let pending = task(item);
            async move { (index, pending.await) }
        })
        .buffer_unordered(concurrency.max(1))
        .collect::<Vec<_>>()
        .await;

    indexed.sort_by_key(|(index, _)| *index);
    indexed.into_iter().map(|(_, output)| output).collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn fan_out_restores_input_order() {
        let delays = vec![30_u64, 0, 20, 10];
        let outputs = bounded_fan_out(delays, 2, |delay| async move {
            tokio::time::sleep(Duration::from_millis(delay)).await;
            delay
        })
        .await;
        assert_eq!(outputs, vec![30, 0, 20, 10]);
    }

    #[tokio::test]
    async fn fan_out_treats_zero_concurrency_as_one() {
        let outputs = bounded_fan_out(vec![1, 2, 3], 0, |n| async move { n * 2 }).await;
        assert_eq!(outputs, vec![2, 4, 6]);
    }

    #[test]
    fn scores_round_to_two_decimals() {
        assert_eq!(round2(0.12345), 0.12);
        assert_eq!(round2(-0.456), -0.46);
        assert_eq!(round2(0.0), 0.0);
    }
}
