//! # Sentiscan Core
//!
//! Ticker extraction, sentiment scoring, and signal generation over public
//! community discussion and finance-portal data.
//!
//! ## Overview
//!
//! - **Symbol extraction** from free text with a fixed noise stop list
//! - **Sentiment scoring** through a pluggable lexicon scorer (VADER by default)
//! - **Aggregation** of mention counts, discussion lists, and sentiment rollups
//! - **Signal engine** mapping sentiment, mention volume, and price trend to a
//!   recommendation, plus a squeeze-potential score
//! - **Scanner** service tying the above to injected data sources with
//!   bounded concurrency, per-fetch timeouts, and partial-failure tolerance
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Reddit, Yahoo, Gemini, and Telegram adapters |
//! | [`aggregator`] | Mention counts, discussion selection, rollups |
//! | [`cache`] | Listing response cache |
//! | [`circuit_breaker`] | Circuit breaker for upstream calls |
//! | [`config`] | Scanner configuration and env overlay |
//! | [`data_source`] | Source traits, `SourceError`, `FetchOutcome` |
//! | [`domain`] | Symbol, TextDocument, MarketSnapshot, UtcDateTime |
//! | [`error`] | Core error types |
//! | [`extractor`] | Ticker candidate extraction |
//! | [`http_client`] | HTTP transport abstraction and scripted test client |
//! | [`pipeline`] | The `Scanner` service |
//! | [`sentiment`] | Sentiment scorer trait and VADER scorer |
//! | [`signal`] | Recommendation and squeeze scoring |
//! | [`source`] | Provider identifiers |
//! | [`throttling`] | Per-host politeness gate |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sentiscan_core::{AnalyzeOptions, Scanner, ScannerConfig, Symbol};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let scanner = Scanner::builder()
//!         .with_config(ScannerConfig::from_env()?)
//!         .build();
//!
//!     for entry in scanner.scan_trending(50).await {
//!         println!("{} {}", entry.symbol, entry.count);
//!     }
//!
//!     let analysis = scanner
//!         .analyze_symbol(Symbol::parse("GME")?, AnalyzeOptions::default())
//!         .await;
//!     println!("{}", analysis.recommendation);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Pipeline operations never fail outright. Upstream failures are logged
//! with `tracing` and contribute nothing; adapters return structured
//! [`SourceError`]s:
//!
//! ```rust
//! use sentiscan_core::{SourceError, SourceErrorKind};
//!
//! fn describe(error: &SourceError) -> &'static str {
//!     match error.kind() {
//!         SourceErrorKind::RateLimited => "slow down",
//!         SourceErrorKind::NotConfigured => "missing credentials",
//!         _ => "upstream problem",
//!     }
//! }
//!
//! assert_eq!(describe(&SourceError::rate_limited("429")), "slow down");
//! ```

pub mod adapters;
pub mod aggregator;
pub mod cache;
pub mod circuit_breaker;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod extractor;
pub mod http_client;
pub mod pipeline;
pub mod sentiment;
pub mod signal;
pub mod source;
pub mod throttling;

// Adapter implementations
pub use adapters::{GeminiReportGenerator, RedditAdapter, TelegramNotifier, YahooAdapter};

// Aggregation
pub use aggregator::{mean_compound, select_discussions, MentionCounts, ScoredText, SymbolMentionCount};

pub use cache::ResponseCache;
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use config::ScannerConfig;

// Data source traits and types
pub use data_source::{
    DocumentSource, FetchOutcome, Listing, ListingRequest, MarketDataSource, Notifier,
    ReportContext, ReportGenerator, SourceError, SourceErrorKind,
};

// Domain models
pub use domain::{MarketSnapshot, Symbol, TextDocument, UtcDateTime};

pub use error::ValidationError;
pub use extractor::SymbolExtractor;

// HTTP client types
pub use http_client::{
    HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse, ReqwestHttpClient,
    ScriptedHttpClient, ScriptedReply,
};

// Pipeline
pub use pipeline::{
    bounded_fan_out, AnalyzeOptions, Scanner, ScannerBuilder, SentimentSummary, SqueezeRow,
    SymbolAnalysis, ANALYSIS_DISCUSSION_LIMIT,
};

pub use sentiment::{SentimentScore, SentimentScorer, VaderScorer};
pub use signal::{recommend, squeeze_score, Recommendation, SignalResult};
pub use source::ProviderId;
pub use throttling::HostThrottle;
