//! Candidate ticker extraction from free text.
//!
//! Two token shapes are recognized: bare uppercase words of 3-5 letters on
//! word boundaries (`GME`) and cashtags of 2-5 letters (`$GM`). The `$` is
//! stripped and tokens on the stop list are dropped. Every occurrence is
//! returned, so repeated mentions in one document count repeatedly.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::Symbol;

const CANDIDATE_PATTERN: &str = r"\b[A-Z]{3,5}\b|\$[A-Z]{2,5}";

/// Uppercase tokens that look like tickers but are forum slang, acronyms, or
/// common words.
pub const STOP_WORDS: [&str; 58] = [
    "I", "A", "AND", "THE", "FOR", "IS", "TO", "IN", "OF", "IT", "YOU", "THAT", "ON", "WITH",
    "ARE", "WAS", "THIS", "TEXT", "POST", "YOLO", "DD", "WSB", "USA", "VIEW", "POLL", "AM", "PM",
    "EDIT", "NEW", "BUY", "SELL", "HOLD", "GDP", "CEO", "CFO", "CTO", "IRA", "ETF", "IRS", "SEC",
    "IPO", "COVID", "FOMC", "EPS", "P/E", "YTD", "ATH", "AI", "EV", "SAAS", "ROI", "FYI", "KPI",
    "ERP", "ARPU", "CAGR", "YOY", "QOQ",
];

/// Compiled extractor. Cheap to share; build once per process.
#[derive(Debug, Clone)]
pub struct SymbolExtractor {
    pattern: Regex,
    stop_words: HashSet<&'static str>,
}

impl Default for SymbolExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolExtractor {
    pub fn new() -> Self {
        Self {
            pattern: candidate_regex().clone(),
            stop_words: STOP_WORDS.into_iter().collect(),
        }
    }

    /// All candidate symbols in `text`, in order of appearance.
    pub fn extract(&self, text: &str) -> Vec<Symbol> {
        self.pattern
            .find_iter(text)
            .map(|found| found.as_str().trim_start_matches('$'))
            .filter(|token| !self.stop_words.contains(token))
            .filter_map(|token| Symbol::parse(token).ok())
            .collect()
    }

    pub fn is_stop_word(&self, token: &str) -> bool {
        self.stop_words.contains(token)
    }
}

fn candidate_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| match Regex::new(CANDIDATE_PATTERN) {
        Ok(regex) => regex,
        Err(error) => unreachable!("candidate pattern is a valid literal: {error}"),
    })
}
