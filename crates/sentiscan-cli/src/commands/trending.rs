use serde::Serialize;

use sentiscan_core::{Scanner, Symbol};

use crate::cli::Cli;
use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct TrendingResponse {
    source: &'static str,
    #[serde(rename = "type")]
    kind: &'static str,
    reddit_trending: Vec<Symbol>,
    yahoo_trending: Vec<Symbol>,
}

pub async fn run(cli: &Cli, scanner: &Scanner) -> Result<CommandResult, CliError> {
    let (reddit, portal) = tokio::join!(
        scanner.scan_trending(usize::from(cli.limit)),
        scanner.portal_trending()
    );

    let response = TrendingResponse {
        source: "StockSentimentScanner",
        kind: "trending",
        reddit_trending: reddit.into_iter().map(|entry| entry.symbol).collect(),
        yahoo_trending: portal,
    };
    Ok(CommandResult::json(serde_json::to_value(response)?))
}
