//! Behavior-driven tests for the Scanner pipeline
//!
//! These tests drive the full pipeline through a scripted transport: listing
//! scans, discussion lookups, per-symbol analysis, and squeeze ranking.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde_json::Value;

use sentiscan_core::{
    AnalyzeOptions, Recommendation, ReportContext, ReportGenerator, Scanner, SentimentScore,
    SentimentScorer, ANALYSIS_DISCUSSION_LIMIT,
};
use sentiscan_tests::{
    chart_json, listing_json, news_json, quiet_config, summary_json, sym, Arc, ScannerConfig,
    ScriptedHttpClient,
};

// =============================================================================
// Fixtures
// =============================================================================

/// Scores "moon" as bullish and "crash" as bearish so means are exact.
struct KeywordScorer;

impl SentimentScorer for KeywordScorer {
    fn score(&self, text: &str) -> SentimentScore {
        let lower = text.to_lowercase();
        let compound = if lower.contains("moon") {
            0.8
        } else if lower.contains("crash") {
            -0.6
        } else {
            0.0
        };
        SentimentScore {
            compound,
            ..SentimentScore::NEUTRAL
        }
    }
}

struct EchoReport;

impl ReportGenerator for EchoReport {
    fn generate<'a>(
        &'a self,
        context: ReportContext,
    ) -> Pin<Box<dyn Future<Output = String> + Send + 'a>> {
        Box::pin(async move {
            format!(
                "report for {} with {} posts",
                context.symbol,
                context.discussions.len()
            )
        })
    }
}

fn scanner(client: ScriptedHttpClient) -> (Arc<ScriptedHttpClient>, Scanner) {
    let client = Arc::new(client);
    let scanner = Scanner::builder()
        .with_config(quiet_config(Duration::from_secs(2)))
        .with_http_client(client.clone())
        .with_scorer(Arc::new(KeywordScorer))
        .with_report_generator(Arc::new(EchoReport))
        .build();
    (client, scanner)
}

/// Four listings: GME 3 mentions, TSLA 3, AMC 1.
fn trending_listings() -> ScriptedHttpClient {
    ScriptedHttpClient::new()
        .respond_json(
            "/r/stocks/hot.json",
            listing_json(&[
                ("GME to the moon", "", "/r/stocks/comments/1/", 10),
                ("AMC and GME", "", "/r/stocks/comments/2/", 4),
            ]),
        )
        .respond_json(
            "/r/stocks/new.json",
            listing_json(&[("TSLA delivery numbers", "", "/r/stocks/comments/3/", 2)]),
        )
        .respond_json(
            "/r/investing/hot.json",
            listing_json(&[("TSLA or not", "Thinking TSLA", "/r/investing/comments/4/", 8)]),
        )
        .respond_json(
            "/r/investing/new.json",
            listing_json(&[("GME again", "", "/r/investing/comments/5/", 1)]),
        )
}

// =============================================================================
// Trending Scan
// =============================================================================

#[tokio::test]
async fn when_scanning_trending_counts_are_merged_across_listings() {
    // Given: Hot and new listings for two communities
    let (client, scanner) = scanner(trending_listings());

    // When: Scanning with 50 posts per listing
    let trending = scanner.scan_trending(50).await;

    // Then: Counts are summed and ties keep first-seen order
    let ranked = trending
        .iter()
        .map(|entry| (entry.symbol.as_str(), entry.count))
        .collect::<Vec<_>>();
    assert_eq!(ranked, vec![("GME", 3), ("TSLA", 3), ("AMC", 1)]);

    // And: Every listing was requested once with the requested size
    let urls = client
        .recorded_requests()
        .into_iter()
        .map(|request| request.url)
        .collect::<Vec<_>>();
    assert_eq!(urls.len(), 4);
    assert!(urls.iter().all(|url| url.ends_with("limit=50")));
}

#[tokio::test]
async fn when_trending_limit_exceeds_listing_maximum_it_is_capped() {
    let (client, scanner) = scanner(trending_listings());

    scanner.scan_trending(500).await;

    assert!(client
        .recorded_requests()
        .iter()
        .all(|request| request.url.ends_with("limit=100")));
}

#[tokio::test]
async fn trending_scan_returns_at_most_top_k_symbols() {
    let client = Arc::new(trending_listings());
    let scanner = Scanner::builder()
        .with_config(ScannerConfig {
            trending_top_k: 2,
            ..quiet_config(Duration::from_secs(2))
        })
        .with_http_client(client)
        .build();

    let trending = scanner.scan_trending(25).await;

    assert_eq!(trending.len(), 2);
    assert_eq!(trending[0].symbol.as_str(), "GME");
}

#[tokio::test]
async fn portal_trending_lists_equities_only() {
    let (_, scanner) = scanner(ScriptedHttpClient::new().respond_json(
        "/v1/finance/trending/US",
        r#"{"finance":{"result":[{"quotes":[{"symbol":"NVDA"},{"symbol":"BTC-USD"},{"symbol":"PLTR"}]}]}}"#,
    ));

    let symbols = scanner.portal_trending().await;

    assert_eq!(symbols, vec![sym("NVDA"), sym("PLTR")]);
}

// =============================================================================
// Discussions
// =============================================================================

#[tokio::test]
async fn when_a_post_is_cross_listed_it_appears_once_with_latest_content() {
    // Given: The same permalink in two listings with different scores
    let client = ScriptedHttpClient::new()
        .respond_json(
            "/r/stocks/hot.json",
            listing_json(&[
                ("GME to the moon", "", "/r/stocks/comments/1/", 10),
                ("Unrelated post", "", "/r/stocks/comments/2/", 99),
            ]),
        )
        .respond_json(
            "/r/investing/hot.json",
            listing_json(&[
                ("GME to the moon", "", "/r/stocks/comments/1/", 12),
                ("small caps", "gme squeeze soon", "/r/investing/comments/3/", 30),
            ]),
        );
    let (_, scanner) = scanner(client);

    // When: Looking up discussions for GME
    let discussions = scanner.discussions(&sym("GME"), 10).await;

    // Then: One entry per URL, best scored first
    let scores = discussions.iter().map(|doc| doc.score).collect::<Vec<_>>();
    assert_eq!(scores, vec![30, 12]);
    assert_eq!(
        discussions[1].url,
        "https://www.reddit.com/r/stocks/comments/1/"
    );
}

#[tokio::test]
async fn discussion_lookup_reads_hot_fifty_and_new_twenty_five() {
    let (client, scanner) = scanner(ScriptedHttpClient::new());

    let discussions = scanner.discussions(&sym("GME"), 10).await;

    assert!(discussions.is_empty());
    assert_eq!(client.request_count("/hot.json?limit=50"), 2);
    assert_eq!(client.request_count("/new.json?limit=25"), 2);
}

// =============================================================================
// Symbol Analysis
// =============================================================================

fn busy_gme_client() -> ScriptedHttpClient {
    let stocks = (0..6)
        .map(|i| (format!("GME to the moon #{i}"), format!("/r/stocks/comments/g{i}/"), i))
        .collect::<Vec<_>>();
    let investing = (0..6)
        .map(|i| (format!("GME moon part {i}"), format!("/r/investing/comments/g{i}/"), 100 + i))
        .collect::<Vec<_>>();
    let as_posts = |posts: &[(String, String, i64)]| {
        listing_json(
            &posts
                .iter()
                .map(|(title, link, score)| (title.as_str(), "", link.as_str(), *score))
                .collect::<Vec<_>>(),
        )
    };

    ScriptedHttpClient::new()
        .respond_json("/r/stocks/hot.json", as_posts(&stocks))
        .respond_json("/r/investing/hot.json", as_posts(&investing))
        .respond_json("/v8/finance/chart/GME", chart_json(22.0, 20.0, 3_000_000))
        .respond_status("fc.yahoo.com", 404)
        .respond_json("/v1/test/getcrumb", "crumb-1")
        .respond_json("/v10/finance/quoteSummary/GME", summary_json(0.24, 1_000_000.0))
        .respond_json(
            "/v1/finance/search",
            news_json(&["GME shares go to the moon", "Retail piles into GME moon trade"]),
        )
}

#[tokio::test]
async fn when_sentiment_is_bullish_and_busy_with_rising_price_analysis_is_strong_buy() {
    // Given: Twelve bullish posts, bullish headlines, and a rising price
    let (_, scanner) = scanner(busy_gme_client());

    // When: Analyzing GME
    let analysis = scanner
        .analyze_symbol(sym("GME"), AnalyzeOptions::default())
        .await;

    // Then: The record carries market data, rollups, and the signal
    let market = analysis.market_data.as_ref().expect("snapshot present");
    assert_eq!(market.current_price, 22.0);
    assert_eq!(market.short_float, Some(0.24));
    assert_eq!(analysis.sentiment.reddit_post_count, 12);
    assert_eq!(analysis.sentiment.news_item_count, 2);
    assert_eq!(analysis.sentiment.reddit_score, 0.8);
    assert_eq!(analysis.sentiment.news_score, 0.8);
    assert_eq!(analysis.signal.mention_count, 12);
    assert_eq!(analysis.recommendation, Recommendation::StrongBuy);
    assert!((analysis.squeeze_score - 3.6).abs() < 1e-9, "got {}", analysis.squeeze_score);
    assert!(analysis.llm_report.is_none());
    assert!(analysis.error.is_none());
}

#[tokio::test]
async fn when_more_posts_match_than_are_read_post_count_and_mentions_agree() {
    // Given: Twenty-five distinct posts mention GME
    let posts = (0..25)
        .map(|i| (format!("GME to the moon #{i}"), format!("/r/stocks/comments/m{i}/")))
        .collect::<Vec<_>>();
    let listing = listing_json(
        &posts
            .iter()
            .map(|(title, link)| (title.as_str(), "", link.as_str(), 1))
            .collect::<Vec<_>>(),
    );
    let (_, scanner) =
        scanner(ScriptedHttpClient::new().respond_json("/r/stocks/hot.json", listing));

    // When: Analyzing GME
    let analysis = scanner
        .analyze_symbol(sym("GME"), AnalyzeOptions::default())
        .await;

    // Then: Both counts describe the same twenty discussions
    assert_eq!(analysis.sentiment.reddit_post_count, ANALYSIS_DISCUSSION_LIMIT);
    assert_eq!(
        analysis.signal.mention_count as usize,
        analysis.sentiment.reddit_post_count
    );
}

#[tokio::test]
async fn analysis_serializes_to_the_cli_record_shape() {
    let (_, scanner) = scanner(busy_gme_client());

    let analysis = scanner
        .analyze_symbol(sym("GME"), AnalyzeOptions::default())
        .await;
    let value: Value = serde_json::to_value(&analysis).expect("serializable");

    assert_eq!(value["ticker"], "GME");
    assert_eq!(value["recommendation"], "STRONG_BUY");
    assert_eq!(value["sentiment"]["reddit_post_count"], 12);
    assert_eq!(value["market_data"]["change_pct"].as_f64().map(|v| v.round()), Some(10.0));
    assert!(value["llm_report"].is_null());
    assert!(value.get("error").is_none());
}

#[tokio::test]
async fn when_report_is_requested_and_snapshot_exists_it_is_attached() {
    let (_, scanner) = scanner(busy_gme_client());

    let analysis = scanner
        .analyze_symbol(sym("GME"), AnalyzeOptions { use_llm: true })
        .await;

    assert_eq!(
        analysis.llm_report.as_deref(),
        Some("report for GME with 12 posts")
    );
}

#[tokio::test]
async fn when_symbol_has_no_market_data_record_carries_error_and_null_snapshot() {
    // Given: Discussions exist but the portal does not know the symbol
    let client = ScriptedHttpClient::new()
        .respond_json(
            "/r/stocks/hot.json",
            listing_json(&[("ZZZZ is going to crash", "", "/r/stocks/comments/z/", 3)]),
        )
        .respond_json("/v1/finance/search", news_json(&[]));
    let (_, scanner) = scanner(client);

    // When: Analyzing with a report requested
    let analysis = scanner
        .analyze_symbol(sym("ZZZZ"), AnalyzeOptions { use_llm: true })
        .await;

    // Then: Sentiment is still populated, market data is absent
    assert!(!analysis.has_market_data());
    assert_eq!(analysis.sentiment.reddit_post_count, 1);
    assert_eq!(analysis.sentiment.reddit_score, -0.6);
    assert_eq!(analysis.sentiment.news_score, 0.0);
    assert_eq!(analysis.recommendation, Recommendation::Avoid);
    assert!(analysis.llm_report.is_none());
    assert_eq!(
        analysis.error.as_deref(),
        Some("no market data available for ZZZZ")
    );

    let value = serde_json::to_value(&analysis).expect("serializable");
    assert!(value["market_data"].is_null());
}

#[tokio::test]
async fn analyzing_several_symbols_reads_each_listing_once() {
    let (client, scanner) = scanner(busy_gme_client());

    let analyses = scanner
        .analyze_many(vec![sym("GME"), sym("AMC")], AnalyzeOptions::default())
        .await;

    assert_eq!(analyses.len(), 2);
    assert_eq!(analyses[0].ticker.as_str(), "GME");
    assert_eq!(analyses[1].ticker.as_str(), "AMC");
    assert_eq!(analyses[1].sentiment.reddit_post_count, 0);
    assert_eq!(client.request_count("/r/stocks/hot.json"), 1);
    assert_eq!(client.request_count("/r/investing/new.json"), 1);
}

// =============================================================================
// Squeeze Ranking
// =============================================================================

#[tokio::test]
async fn squeeze_scan_ranks_by_score_and_drops_symbols_without_data() {
    // Given: GME and TSLA trend equally; only TSLA is heavily shorted; AMC has no chart
    let client = trending_listings()
        .respond_json("/v8/finance/chart/GME", chart_json(22.0, 20.0, 3_000_000))
        .respond_json("/v8/finance/chart/TSLA", chart_json(250.0, 240.0, 3_000_000))
        .respond_status("fc.yahoo.com", 404)
        .respond_json("/v1/test/getcrumb", "crumb-1")
        .respond_json("/v10/finance/quoteSummary/TSLA", summary_json(0.25, 1_000_000.0));
    let (_, scanner) = scanner(client);

    // When: Running the squeeze scan
    let rows = scanner.squeeze_scan(50).await;

    // Then: TSLA outranks GME and AMC is dropped
    let order = rows.iter().map(|row| row.symbol.as_str()).collect::<Vec<_>>();
    assert_eq!(order, vec!["TSLA", "GME"]);

    assert!((rows[0].squeeze_score - 0.9).abs() < 1e-9, "got {}", rows[0].squeeze_score);
    assert_eq!(rows[0].volume_ratio, Some(3.0));
    assert_eq!(rows[0].mentions, 3);

    assert!((rows[1].squeeze_score - 0.3).abs() < 1e-9);
    assert_eq!(rows[1].short_float, 0.0);
    assert_eq!(rows[1].volume_ratio, None);
}

#[tokio::test]
async fn market_news_is_newest_first() {
    let (_, scanner) = scanner(
        ScriptedHttpClient::new().respond_json("/v1/finance/search", news_json(&["Older", "Newer"])),
    );

    let items = scanner.market_news().await;

    let titles = items.iter().map(|item| item.title.as_str()).collect::<Vec<_>>();
    assert_eq!(titles, vec!["Newer", "Older"]);
}
