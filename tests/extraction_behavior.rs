//! Behavior-driven tests for ticker extraction and mention counting
//!
//! These tests verify WHAT symbols are pulled out of free text and how
//! mentions accumulate across documents and listings.

use sentiscan_core::{
    extractor::STOP_WORDS, MentionCounts, Symbol, SymbolExtractor, TextDocument,
};

fn names(symbols: &[Symbol]) -> Vec<&str> {
    symbols.iter().map(Symbol::as_str).collect()
}

// =============================================================================
// Extraction: Token Shapes
// =============================================================================

#[test]
fn when_text_uses_cashtag_or_bare_ticker_both_yield_the_same_symbol() {
    // Given: An extractor
    let extractor = SymbolExtractor::new();

    // When: The same ticker appears with and without the cash sign
    let cashtag = extractor.extract("$AAPL surged");
    let bare = extractor.extract("AAPL surged");

    // Then: Both produce AAPL
    assert_eq!(names(&cashtag), vec!["AAPL"]);
    assert_eq!(names(&bare), vec!["AAPL"]);
}

#[test]
fn when_ticker_is_two_letters_only_the_cashtag_form_is_recognized() {
    let extractor = SymbolExtractor::new();

    assert_eq!(names(&extractor.extract("Buying $GM today")), vec!["GM"]);
    assert!(extractor.extract("Buying GM today").is_empty());
}

#[test]
fn when_text_is_lowercase_or_too_long_nothing_is_extracted() {
    let extractor = SymbolExtractor::new();

    assert!(extractor.extract("aapl and tsla are up").is_empty());
    assert!(extractor.extract("TOOLONGWORD").is_empty());
    assert!(extractor.extract("").is_empty());
}

#[test]
fn when_a_ticker_repeats_every_occurrence_is_returned_in_order() {
    let extractor = SymbolExtractor::new();

    let found = extractor.extract("GME GME and then AMC, GME again");

    assert_eq!(names(&found), vec!["GME", "GME", "AMC", "GME"]);
}

// =============================================================================
// Extraction: Noise Suppression
// =============================================================================

#[test]
fn when_text_contains_blacklisted_words_they_are_not_emitted() {
    // Given: Text full of shouting and acronyms
    let extractor = SymbolExtractor::new();

    // When: Extracting
    let found = extractor.extract("THE CEO said YOLO on this ETF, NVDA looks great. $DD EDIT: FOMC");

    // Then: Only the real ticker survives
    assert_eq!(names(&found), vec!["NVDA"]);
}

#[test]
fn every_stop_word_is_recognized() {
    let extractor = SymbolExtractor::new();

    assert_eq!(STOP_WORDS.len(), 58);
    for word in STOP_WORDS {
        assert!(extractor.is_stop_word(word), "{word} should be a stop word");
    }
    assert!(!extractor.is_stop_word("TSLA"));
}

// =============================================================================
// Mention Counting
// =============================================================================

#[test]
fn when_documents_share_a_url_both_still_count_as_mentions() {
    // Given: The same post scraped twice
    let extractor = SymbolExtractor::new();
    let first = TextDocument::new("stocks", "PLTR earnings beat", "https://r.test/1");
    let second = TextDocument::new("stocks", "PLTR earnings beat", "https://r.test/1");

    // When: Counting mentions across both copies
    let mut counts = MentionCounts::new();
    counts.record_documents(&extractor, [&first, &second]);

    // Then: Both contribute
    let pltr = Symbol::parse("PLTR").expect("valid");
    assert_eq!(counts.count(&pltr), 2);
}

#[test]
fn when_counts_tie_first_seen_symbol_ranks_first() {
    let extractor = SymbolExtractor::new();
    let docs = [
        TextDocument::new("stocks", "SOFI then HOOD", "https://r.test/1"),
        TextDocument::new("stocks", "HOOD then SOFI", "https://r.test/2").with_body("AMD"),
    ];

    let mut counts = MentionCounts::new();
    counts.record_documents(&extractor, &docs);
    let top = counts.top(10);

    let ranked = top.iter().map(|e| (e.symbol.as_str(), e.count)).collect::<Vec<_>>();
    assert_eq!(ranked, vec![("SOFI", 2), ("HOOD", 2), ("AMD", 1)]);
}

#[test]
fn title_and_body_are_both_scanned() {
    let extractor = SymbolExtractor::new();
    let doc = TextDocument::new("investing", "Why I like RIVN", "https://r.test/1")
        .with_body("Also watching $LCID");

    let mut counts = MentionCounts::new();
    counts.record_documents(&extractor, [&doc]);

    assert_eq!(counts.len(), 2);
    assert_eq!(counts.count(&Symbol::parse("LCID").expect("valid")), 1);
}
