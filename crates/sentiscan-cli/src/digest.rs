//! Markdown digest for chat delivery.

use std::collections::HashMap;
use std::fmt::Write as _;

use sentiscan_core::{
    MarketSnapshot, Symbol, SymbolAnalysis, SymbolMentionCount, TextDocument, UtcDateTime,
};

pub const TABLE_ROWS: usize = 8;
pub const DEEP_DIVE_ROWS: usize = 3;
pub const MOVER_ROWS: usize = 6;
pub const NEWS_ROWS: usize = 3;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━";
const TITLE_MAX_CHARS: usize = 60;

/// Everything the digest shows, already fetched.
#[derive(Debug, Clone, Default)]
pub struct DigestInput {
    pub generated_at: Option<UtcDateTime>,
    /// Forum trending symbols with their mention counts.
    pub mentions: Vec<SymbolMentionCount>,
    /// Analyses of the leading forum symbols, in trending order.
    pub analyses: Vec<SymbolAnalysis>,
    /// Portal trending symbols with their snapshots.
    pub movers: Vec<(Symbol, Option<MarketSnapshot>)>,
    pub news: Vec<TextDocument>,
}

pub fn format_digest(input: &DigestInput) -> String {
    let mentions = input
        .mentions
        .iter()
        .map(|entry| (&entry.symbol, entry.count))
        .collect::<HashMap<_, _>>();
    let mentions_of = |symbol: &Symbol| mentions.get(symbol).copied().unwrap_or(0);

    let mut msg = String::from("📊 **Stock Scanner Digest**\n");
    let generated_at = input.generated_at.unwrap_or_else(UtcDateTime::now);
    let _ = writeln!(msg, "🕐 {} UTC", generated_at.format_digest());
    let _ = writeln!(msg, "{RULE}\n");

    msg.push_str("🔥 **REDDIT TRENDING**\n```\n");
    msg.push_str("Ticker  Price   Chg%  Sent Ment\n");
    msg.push_str(&"─".repeat(30));
    msg.push('\n');
    for analysis in input.analyses.iter().take(TABLE_ROWS) {
        let Some(market) = analysis.market_data.as_ref() else {
            continue;
        };
        let _ = writeln!(
            msg,
            "{:<6} ${:>5} {:>5.1}% {} {:>3}",
            analysis.ticker.as_str(),
            format_price(market.current_price),
            market.change_pct,
            sentiment_marker(analysis.sentiment.reddit_score),
            mentions_of(&analysis.ticker),
        );
    }
    msg.push_str("```\n\n");

    msg.push_str("🎯 **TOP 3 DEEP DIVE**\n");
    for (position, analysis) in input.analyses.iter().take(DEEP_DIVE_ROWS).enumerate() {
        let Some(market) = analysis.market_data.as_ref() else {
            continue;
        };
        let icon = if market.change_pct >= 0.0 { "🟢" } else { "🔴" };
        let _ = writeln!(msg, "\n**{}. {}** {icon}", position + 1, analysis.ticker);
        let _ = writeln!(
            msg,
            "├ Price: ${:.2} ({:+.2}%)",
            market.current_price, market.change_pct
        );
        let _ = writeln!(
            msg,
            "├ Mentions: {} | Posts: {}",
            mentions_of(&analysis.ticker),
            analysis.sentiment.reddit_post_count
        );
        let _ = writeln!(msg, "├ Short Interest: {:.1}%", market.short_float_or_zero() * 100.0);
        let _ = writeln!(msg, "├ Reddit Sentiment: {:+.2}", analysis.sentiment.reddit_score);
        let _ = writeln!(msg, "└ News Sentiment: {:+.2}", analysis.sentiment.news_score);
    }

    let _ = writeln!(msg, "\n{RULE}");
    msg.push_str("📈 **YAHOO MOVERS**\n```\n");
    msg.push_str("Ticker  Price   Change%\n");
    msg.push_str(&"─".repeat(26));
    msg.push('\n');
    for (symbol, snapshot) in input.movers.iter().take(MOVER_ROWS) {
        let Some(market) = snapshot.as_ref() else {
            continue;
        };
        let _ = writeln!(
            msg,
            "{:<6} ${:>6} {:>6.1}%",
            symbol.as_str(),
            format_price(market.current_price),
            market.change_pct
        );
    }
    msg.push_str("```\n\n");

    msg.push_str("📰 **MARKET NEWS**\n");
    if input.news.is_empty() {
        msg.push_str("No recent news available.\n");
    } else {
        for (position, item) in input.news.iter().take(NEWS_ROWS).enumerate() {
            let title = if item.title.is_empty() { "No title" } else { &item.title };
            let _ = writeln!(msg, "{}. [{}]({})", position + 1, truncate_title(title), item.url);
        }
    }

    msg
}

/// Fewer decimals for larger prices.
pub fn format_price(price: f64) -> String {
    if price > 1000.0 {
        format!("{price:.0}")
    } else if price > 10.0 {
        format!("{price:.1}")
    } else {
        format!("{price:.2}")
    }
}

pub fn sentiment_marker(score: f64) -> &'static str {
    if score > 0.2 {
        "🟢"
    } else if score < -0.2 {
        "🔴"
    } else {
        "⚪"
    }
}

fn truncate_title(title: &str) -> String {
    if title.chars().count() > TITLE_MAX_CHARS {
        let mut short = title.chars().take(TITLE_MAX_CHARS - 3).collect::<String>();
        short.push_str("...");
        short
    } else {
        title.to_owned()
    }
}
