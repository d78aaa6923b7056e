//! Rule-based recommendation and squeeze scoring.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::Symbol;

/// Overall sentiment above which a symbol is considered bullish.
pub const BULLISH_THRESHOLD: f64 = 0.2;
/// Overall sentiment below which a symbol is considered bearish.
pub const BEARISH_THRESHOLD: f64 = -0.2;
/// Overall sentiment below which a symbol is worth avoiding.
pub const AVOID_THRESHOLD: f64 = -0.05;
/// Mentions must exceed this for a directional call.
pub const MIN_MENTION_VOLUME: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    StrongBuy,
    Buy,
    Watch,
    Avoid,
    Sell,
}

impl Recommendation {
    pub const fn label(self) -> &'static str {
        match self {
            Self::StrongBuy => "STRONG BUY",
            Self::Buy => "BUY",
            Self::Watch => "WATCH",
            Self::Avoid => "AVOID",
            Self::Sell => "SELL",
        }
    }
}

impl Display for Recommendation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Maps sentiment, mention volume, and price trend to a recommendation.
/// All comparisons are strict.
pub fn recommend(overall_sentiment: f64, mention_volume: u32, price_trend_pct: f64) -> Recommendation {
    let busy = mention_volume > MIN_MENTION_VOLUME;
    if overall_sentiment > BULLISH_THRESHOLD && busy {
        if price_trend_pct > 0.0 {
            Recommendation::StrongBuy
        } else {
            Recommendation::Buy
        }
    } else if overall_sentiment < BEARISH_THRESHOLD && busy {
        Recommendation::Sell
    } else if overall_sentiment < AVOID_THRESHOLD {
        Recommendation::Avoid
    } else {
        Recommendation::Watch
    }
}

/// Squeeze potential: mentions scaled by short interest and unusual volume.
///
/// `short_float` is a fraction (0.25 = 25%); `None` counts as zero. The volume
/// multiplier is skipped when `avg_volume` is zero.
pub fn squeeze_score(mentions: u32, short_float: Option<f64>, volume: f64, avg_volume: f64) -> f64 {
    let mut score = f64::from(mentions) / 10.0;

    let short_float = short_float.unwrap_or(0.0);
    if short_float > 0.20 {
        score *= 2.0;
    } else if short_float > 0.10 {
        score *= 1.5;
    }

    if let Some(ratio) = volume_ratio(volume, avg_volume) {
        if ratio > 1.5 {
            score *= 1.5;
        }
    }

    score
}

/// Current volume over average volume; `None` when the average is zero.
pub fn volume_ratio(volume: f64, avg_volume: f64) -> Option<f64> {
    (avg_volume != 0.0).then(|| volume / avg_volume)
}

/// Combined signal for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalResult {
    pub symbol: Symbol,
    pub mention_count: u32,
    pub reddit_sentiment: f64,
    pub news_sentiment: f64,
    pub overall_sentiment: f64,
    pub price_trend_pct: f64,
    pub squeeze_score: f64,
    pub recommendation: Recommendation,
}

impl SignalResult {
    /// Derives the overall sentiment (mean of the two rollups) and the
    /// recommendation from the inputs.
    pub fn evaluate(
        symbol: Symbol,
        mention_count: u32,
        reddit_sentiment: f64,
        news_sentiment: f64,
        price_trend_pct: f64,
        squeeze_score: f64,
    ) -> Self {
        let overall_sentiment = (reddit_sentiment + news_sentiment) / 2.0;
        Self {
            recommendation: recommend(overall_sentiment, mention_count, price_trend_pct),
            symbol,
            mention_count,
            reddit_sentiment,
            news_sentiment,
            overall_sentiment,
            price_trend_pct,
            squeeze_score,
        }
    }
}

/// Stable descending sort by a score; NaN ranks last.
pub fn rank_descending<T, F>(items: &mut [T], score: F)
where
    F: Fn(&T) -> f64,
{
    items.sort_by(|a, b| {
        let (a, b) = (score(a), score(b));
        match (a.is_nan(), b.is_nan()) {
            (true, true) => std::cmp::Ordering::Equal,
            (true, false) => std::cmp::Ordering::Greater,
            (false, true) => std::cmp::Ordering::Less,
            (false, false) => b.total_cmp(&a),
        }
    });
}
