//! Behavior-driven tests for degraded upstreams
//!
//! A failing, slow, or misconfigured source must never abort a scan; it
//! contributes nothing and the rest of the pipeline carries on.

use std::time::Duration;

use sentiscan_core::adapters::MISSING_KEY_NOTICE;
use sentiscan_core::{
    AnalyzeOptions, CircuitBreakerConfig, CircuitState, DocumentSource, GeminiReportGenerator,
    HostThrottle, Listing, ListingRequest, MarketSnapshot, Notifier, RedditAdapter,
    ReportContext, ReportGenerator, Scanner, SourceErrorKind, TelegramNotifier,
};
use sentiscan_tests::{
    chart_json, listing_json, quiet_config, sym, Arc, ScannerConfig, ScriptedHttpClient,
};

// =============================================================================
// Fixtures
// =============================================================================

fn scanner(client: ScriptedHttpClient) -> (Arc<ScriptedHttpClient>, Scanner) {
    let client = Arc::new(client);
    let scanner = Scanner::builder()
        .with_config(quiet_config(Duration::from_millis(200)))
        .with_http_client(client.clone())
        .build();
    (client, scanner)
}

/// One post per title, each with its own permalink.
fn listing(titles: &[&str]) -> String {
    let permalinks = titles
        .iter()
        .map(|title| format!("/r/x/comments/{}/", title.replace(' ', "_")))
        .collect::<Vec<_>>();
    let posts = titles
        .iter()
        .zip(&permalinks)
        .map(|(title, permalink)| (*title, "", permalink.as_str(), 1))
        .collect::<Vec<_>>();
    listing_json(&posts)
}

fn chart() -> String {
    chart_json(22.0, 20.0, 3_000_000)
}

// =============================================================================
// Listing Failures
// =============================================================================

#[tokio::test]
async fn when_one_community_fails_others_still_count() {
    // Given: The stocks hot listing errors at the transport
    let client = ScriptedHttpClient::new()
        .fail("/r/stocks/hot.json", "connection reset")
        .respond_json("/r/stocks/new.json", listing(&["PLTR breakout"]))
        .respond_json("/r/investing/hot.json", listing(&["PLTR and SOFI"]))
        .respond_status("/r/investing/new.json", 429);
    let (_, scanner) = scanner(client);

    // When: Scanning
    let trending = scanner.scan_trending(25).await;

    // Then: The healthy listings are counted
    let ranked = trending
        .iter()
        .map(|entry| (entry.symbol.as_str(), entry.count))
        .collect::<Vec<_>>();
    assert_eq!(ranked, vec![("PLTR", 2), ("SOFI", 1)]);
}

#[tokio::test]
async fn when_a_listing_hangs_it_times_out_and_contributes_nothing() {
    // Given: One listing never answers
    let client = ScriptedHttpClient::new()
        .hang("/r/stocks/hot.json")
        .respond_json("/r/investing/hot.json", listing(&["RIVN deliveries"]));
    let (_, scanner) = scanner(client);

    // When: Scanning
    let started = tokio::time::Instant::now();
    let trending = scanner.scan_trending(25).await;

    // Then: The scan finishes near the fetch timeout with the other listing
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(trending.len(), 1);
    assert_eq!(trending[0].symbol.as_str(), "RIVN");
}

#[tokio::test]
async fn when_every_source_is_down_scan_is_empty_not_an_error() {
    let (_, scanner) = scanner(ScriptedHttpClient::new().respond_status("reddit.com", 503));

    assert!(scanner.scan_trending(25).await.is_empty());
    assert!(scanner.discussions(&sym("GME"), 10).await.is_empty());
}

// =============================================================================
// Market Data Failures
// =============================================================================

#[tokio::test]
async fn when_portal_is_down_analysis_has_no_market_data_and_an_error() {
    // Given: Discussions are fine but every chart request fails
    let client = ScriptedHttpClient::new()
        .respond_json("/r/stocks/hot.json", listing(&["GME moon"]))
        .respond_status("/v8/finance/chart", 503)
        .respond_json("/v1/finance/search", r#"{"news":[]}"#);
    let (_, scanner) = scanner(client);

    // When: Analyzing
    let analysis = scanner
        .analyze_symbol(sym("GME"), AnalyzeOptions::default())
        .await;

    // Then: The record is still produced
    assert!(analysis.market_data.is_none());
    assert_eq!(analysis.sentiment.reddit_post_count, 1);
    assert_eq!(
        analysis.error.as_deref(),
        Some("no market data available for GME")
    );
    assert!((analysis.squeeze_score - 0.1).abs() < 1e-9);
}

#[tokio::test]
async fn when_key_statistics_are_unavailable_base_snapshot_is_kept() {
    // Given: Quotes work but no crumb can be obtained
    let client = ScriptedHttpClient::new()
        .respond_json("/v8/finance/chart/GME", chart())
        .respond_status("/v1/test/getcrumb", 403);
    let (_, scanner) = scanner(client);

    // When: Requesting extended snapshots
    let snapshots = scanner.snapshots(vec![sym("GME")], true).await;

    // Then: Price data survives and extended fields read as zero
    let snapshot: &MarketSnapshot = snapshots[0].as_ref().expect("base snapshot");
    assert_eq!(snapshot.current_price, 22.0);
    assert!((snapshot.change_pct - 10.0).abs() < 1e-9);
    assert_eq!(snapshot.short_float, Some(0.0));
    assert_eq!(snapshot.avg_volume, Some(0.0));
    assert_eq!(snapshot.market_cap, None);
}

#[tokio::test]
async fn when_headlines_fail_news_sentiment_is_zero() {
    let client = ScriptedHttpClient::new()
        .respond_json("/v8/finance/chart/GME", chart())
        .fail("/v1/finance/search", "dns failure");
    let (_, scanner) = scanner(client);

    let analysis = scanner
        .analyze_symbol(sym("GME"), AnalyzeOptions::default())
        .await;

    assert!(analysis.has_market_data());
    assert_eq!(analysis.sentiment.news_score, 0.0);
    assert_eq!(analysis.sentiment.news_item_count, 0);
}

#[tokio::test]
async fn when_portal_trending_fails_list_is_empty() {
    let (_, scanner) =
        scanner(ScriptedHttpClient::new().respond_status("/v1/finance/trending/US", 500));

    assert!(scanner.portal_trending().await.is_empty());
    assert!(scanner.market_news().await.is_empty());
}

// =============================================================================
// Circuit Breaker
// =============================================================================

#[tokio::test]
async fn when_forum_keeps_failing_breaker_opens_and_stops_calling() {
    // Given: Breakers that trip after two failures
    let client = Arc::new(ScriptedHttpClient::new().respond_status("/hot.json", 503));
    let adapter = RedditAdapter::new(client.clone())
        .with_throttle(Arc::new(HostThrottle::disabled()))
        .with_circuit_breaker_config(CircuitBreakerConfig {
            failure_threshold: 2,
            open_timeout: Duration::from_secs(60),
        });
    let request = || ListingRequest::new("stocks", Listing::Hot, 10).expect("valid request");

    // When: Fetching three times
    let first = adapter.fetch_documents(request()).await;
    let second = adapter.fetch_documents(request()).await;
    let third = adapter.fetch_documents(request()).await;

    // Then: The third call fails fast without reaching the transport
    assert_eq!(first.expect_err("503").kind(), SourceErrorKind::Unavailable);
    assert!(second.is_err());
    let third = third.expect_err("breaker open");
    assert!(third.message().contains("circuit breaker is open"));
    assert_eq!(adapter.circuit_state("stocks"), CircuitState::Open);
    assert_eq!(client.request_count("/hot.json"), 2);
}

#[tokio::test]
async fn when_two_communities_are_down_the_third_is_still_scanned() {
    // Given: Three communities scanned one listing at a time, two of them failing
    let client = ScriptedHttpClient::new()
        .respond_status("/r/aaa/", 503)
        .respond_status("/r/bbb/", 503)
        .respond_json("/r/ccc/hot.json", listing(&["GME earnings"]))
        .respond_json("/r/ccc/new.json", listing(&["GME rally"]));
    let client = Arc::new(client);
    let scanner = Scanner::builder()
        .with_config(ScannerConfig {
            communities: vec![
                String::from("aaa"),
                String::from("bbb"),
                String::from("ccc"),
            ],
            concurrency: 1,
            ..quiet_config(Duration::from_millis(200))
        })
        .with_http_client(client.clone())
        .build();

    // When: Scanning after four upstream failures
    let trending = scanner.scan_trending(25).await;

    // Then: The healthy community is fetched and counted in full
    let ranked = trending
        .iter()
        .map(|entry| (entry.symbol.as_str(), entry.count))
        .collect::<Vec<_>>();
    assert_eq!(ranked, vec![("GME", 2)]);
    assert_eq!(client.request_count("/r/ccc/"), 2);
}

// =============================================================================
// Collaborators
// =============================================================================

#[tokio::test]
async fn when_chat_credentials_are_missing_delivery_is_refused_without_a_request() {
    let client = Arc::new(ScriptedHttpClient::new());
    let notifier = TelegramNotifier::new(client.clone(), None, Some(String::from("42")));

    let error = notifier
        .send("digest")
        .await
        .expect_err("not configured");

    assert_eq!(error.kind(), SourceErrorKind::NotConfigured);
    assert!(client.recorded_requests().is_empty());
}

#[tokio::test]
async fn when_chat_api_rejects_the_message_delivery_fails() {
    let client = Arc::new(ScriptedHttpClient::new().respond_status("/sendMessage", 403));
    let notifier = TelegramNotifier::new(
        client,
        Some(String::from("token")),
        Some(String::from("42")),
    );

    let error = notifier.send("digest").await.expect_err("rejected");

    assert_eq!(error.kind(), SourceErrorKind::InvalidRequest);
}

#[tokio::test]
async fn when_report_key_is_missing_the_notice_is_returned() {
    let client = Arc::new(ScriptedHttpClient::new());
    let generator = GeminiReportGenerator::new(client.clone(), None);
    let context = ReportContext {
        symbol: sym("GME"),
        snapshot: MarketSnapshot::from_quote(sym("GME"), 22.0, Some(20.0), None, None)
            .expect("valid snapshot"),
        discussions: Vec::new(),
        headlines: Vec::new(),
    };

    let report = generator.generate(context).await;

    assert_eq!(report, MISSING_KEY_NOTICE);
    assert!(client.recorded_requests().is_empty());
}
