//! CLI argument definitions for sentiscan.
//!
//! # Modes
//!
//! | Mode | Description |
//! |------|-------------|
//! | `trending` | Most mentioned tickers plus the portal trending list |
//! | `analyze` | Market data, sentiment, and signal for one ticker |
//! | `squeeze` | Trending tickers ranked by squeeze potential |
//! | `digest` | Formatted digest text, optionally delivered |
//!
//! # Examples
//!
//! ```bash
//! sentiscan --mode trending
//! sentiscan --mode analyze --ticker gme --llm
//! sentiscan --mode digest --send
//! ```

use clap::{Parser, ValueEnum};

/// Stock sentiment scanner
///
/// Scans community discussion and finance-portal data for trending tickers
/// and derives a sentiment-weighted signal.
#[derive(Debug, Parser)]
#[command(
    name = "sentiscan",
    author,
    version,
    about = "Stock sentiment scanner",
    long_about = "Scans forum communities for trending tickers, scores discussion and headline \
sentiment, and combines it with price, volume, and short interest into a recommendation.\n\
\n\
Credentials for the optional report (GEMINI_API_KEY) and digest delivery \
(TELEGRAM_BOT_TOKEN, TELEGRAM_CHAT_ID) are read from the environment or a .env file."
)]
pub struct Cli {
    /// Action to perform.
    #[arg(long, value_enum)]
    pub mode: Mode,

    /// Ticker symbol (required for analyze mode).
    #[arg(long)]
    pub ticker: Option<String>,

    /// Request a narrative report for analyze mode (consumes API quota).
    #[arg(long, default_value_t = false)]
    pub llm: bool,

    /// Deliver the digest instead of only printing it.
    #[arg(long, default_value_t = false)]
    pub send: bool,

    /// Posts read per community listing for trending scans.
    #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u16).range(1..=100))]
    pub limit: u16,

    /// Print JSON on one line instead of indented.
    #[arg(long, default_value_t = false)]
    pub compact: bool,

    /// Log debug output to stderr.
    #[arg(long, short, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    Trending,
    Analyze,
    Squeeze,
    Digest,
}
