use sentiscan_core::{AnalyzeOptions, Symbol, UtcDateTime};

use crate::cli::Cli;
use crate::digest::{format_digest, DigestInput, MOVER_ROWS, TABLE_ROWS};
use crate::error::CliError;

use super::{App, CommandResult};

pub async fn run(cli: &Cli, app: &App) -> Result<CommandResult, CliError> {
    let scanner = &app.scanner;
    let (mentions, portal, news) = tokio::join!(
        scanner.scan_trending(usize::from(cli.limit)),
        scanner.portal_trending(),
        scanner.market_news()
    );

    let leaders = mentions
        .iter()
        .take(TABLE_ROWS)
        .map(|entry| entry.symbol.clone())
        .collect();
    let movers = portal.into_iter().take(MOVER_ROWS).collect::<Vec<Symbol>>();

    let analyses = scanner.analyze_many(leaders, AnalyzeOptions::default()).await;
    let snapshots = scanner.snapshots(movers.clone(), false).await;

    let text = format_digest(&DigestInput {
        generated_at: Some(UtcDateTime::now()),
        mentions,
        analyses,
        movers: movers.into_iter().zip(snapshots).collect(),
        news,
    });

    if cli.send {
        app.notifier.send(&text).await.map_err(CliError::Delivery)?;
        tracing::info!(notifier = %app.notifier.id(), "digest delivered");
    }

    Ok(CommandResult::text(text))
}
