use serde::{Deserialize, Serialize};
use vader_sentiment::SentimentIntensityAnalyzer;

/// Lexicon-based polarity of a piece of text.
///
/// `compound` is the normalized overall score in [-1, 1]; `pos`, `neu`, `neg`
/// are proportions in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
    pub compound: f64,
    pub pos: f64,
    pub neu: f64,
    pub neg: f64,
}

impl SentimentScore {
    /// Score assigned to empty text.
    pub const NEUTRAL: Self = Self {
        compound: 0.0,
        pos: 0.0,
        neu: 1.0,
        neg: 0.0,
    };
}

impl Default for SentimentScore {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// Pluggable scorer so the lexicon can be swapped without touching the
/// pipeline.
pub trait SentimentScorer: Send + Sync {
    fn score(&self, text: &str) -> SentimentScore;
}

/// VADER lexicon scorer, tuned for short social-media text.
pub struct VaderScorer {
    analyzer: SentimentIntensityAnalyzer<'static>,
}

impl VaderScorer {
    pub fn new() -> Self {
        Self {
            analyzer: SentimentIntensityAnalyzer::new(),
        }
    }
}

impl Default for VaderScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for VaderScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("VaderScorer")
    }
}

impl SentimentScorer for VaderScorer {
    fn score(&self, text: &str) -> SentimentScore {
        // Whitespace-only input is empty for scoring purposes.
        if text.trim().is_empty() {
            return SentimentScore::NEUTRAL;
        }

        let scores = self.analyzer.polarity_scores(text);
        let read = |key: &str| scores.get(key).copied().unwrap_or(0.0);
        let (pos, neg) = (read("pos"), read("neg"));
        // The analyzer adds '!'/'?' emphasis to the sum even when no word
        // carries sentiment; such text stays neutral.
        let compound = if pos == 0.0 && neg == 0.0 {
            0.0
        } else {
            read("compound")
        };
        SentimentScore {
            compound,
            pos,
            neu: read("neu"),
            neg,
        }
    }
}
