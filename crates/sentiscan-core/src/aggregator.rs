//! Folding of per-source results into mention counts, discussion lists, and
//! sentiment rollups.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::extractor::SymbolExtractor;
use crate::sentiment::SentimentScorer;
use crate::{Symbol, TextDocument};

/// A symbol and how many times it was mentioned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolMentionCount {
    pub symbol: Symbol,
    pub count: u32,
}

/// Mention counter that remembers first-seen order for tie-breaking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MentionCounts {
    order: Vec<SymbolMentionCount>,
    index: HashMap<Symbol, usize>,
}

impl MentionCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, symbol: Symbol) {
        self.add(symbol, 1);
    }

    fn add(&mut self, symbol: Symbol, count: u32) {
        match self.index.get(&symbol) {
            Some(&position) => {
                let entry = &mut self.order[position];
                entry.count = entry.count.saturating_add(count);
            }
            None => {
                self.index.insert(symbol.clone(), self.order.len());
                self.order.push(SymbolMentionCount { symbol, count });
            }
        }
    }

    /// Extracts and records every candidate in each document's title and body.
    pub fn record_documents<'a, I>(&mut self, extractor: &SymbolExtractor, documents: I)
    where
        I: IntoIterator<Item = &'a TextDocument>,
    {
        for document in documents {
            for symbol in extractor.extract(&document.full_text()) {
                self.record(symbol);
            }
        }
    }

    /// Sums another counter into this one. Symbols new to `self` keep the
    /// order in which `other` first saw them.
    pub fn merge(&mut self, other: MentionCounts) {
        for entry in other.order {
            self.add(entry.symbol, entry.count);
        }
    }

    pub fn count(&self, symbol: &Symbol) -> u32 {
        self.index
            .get(symbol)
            .map(|&position| self.order[position].count)
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The `k` most mentioned symbols, count descending, ties in first-seen
    /// order.
    pub fn top(&self, k: usize) -> Vec<SymbolMentionCount> {
        let mut ranked = self.order.clone();
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked.truncate(k);
        ranked
    }
}

/// Documents that mention `symbol` anywhere in title or body
/// (case-insensitive substring), deduplicated by URL, sorted by score
/// descending and truncated to `limit`.
///
/// When a URL repeats, the entry keeps the position of its first occurrence
/// and the content of its last one.
pub fn select_discussions<I>(documents: I, symbol: &Symbol, limit: usize) -> Vec<TextDocument>
where
    I: IntoIterator<Item = TextDocument>,
{
    let needle = symbol.as_str().trim_start_matches('$').to_uppercase();

    let mut unique: Vec<TextDocument> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for document in documents {
        if !document.mentions(&needle) {
            continue;
        }
        match positions.get(&document.url) {
            Some(&position) => unique[position] = document,
            None => {
                positions.insert(document.url.clone(), unique.len());
                unique.push(document);
            }
        }
    }

    unique.sort_by(|a, b| b.score.cmp(&a.score));
    unique.truncate(limit);
    unique
}

/// Which text of a document is scored in a rollup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoredText {
    /// Title and body joined by a space (forum posts).
    TitleAndBody,
    /// Title only; documents with an empty title are skipped (headlines).
    TitleOnly,
}

/// Mean compound score over `documents`, 0.0 when nothing is scored.
pub fn mean_compound(
    scorer: &dyn SentimentScorer,
    documents: &[TextDocument],
    text: ScoredText,
) -> f64 {
    let scores = documents
        .iter()
        .filter_map(|document| match text {
            ScoredText::TitleAndBody => Some(document.full_text()),
            ScoredText::TitleOnly if document.title.is_empty() => None,
            ScoredText::TitleOnly => Some(document.title.clone()),
        })
        .map(|text| scorer.score(&text).compound)
        .collect::<Vec<_>>();

    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().sum::<f64>() / scores.len() as f64
}
