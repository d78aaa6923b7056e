use sentiscan_core::{AnalyzeOptions, Scanner, Symbol};

use crate::cli::Cli;
use crate::error::CliError;

use super::{CommandResult, MISSING_MARKET_DATA_EXIT};

pub async fn run(cli: &Cli, scanner: &Scanner) -> Result<CommandResult, CliError> {
    let Some(raw) = cli.ticker.as_deref() else {
        return Err(CliError::Usage(String::from(
            "--ticker is required for analyze mode",
        )));
    };
    let symbol = Symbol::parse(raw)?;

    let analysis = scanner
        .analyze_symbol(symbol, AnalyzeOptions { use_llm: cli.llm })
        .await;

    let exit_code = if analysis.has_market_data() {
        0
    } else {
        MISSING_MARKET_DATA_EXIT
    };
    Ok(CommandResult::json(serde_json::to_value(&analysis)?).with_exit_code(exit_code))
}
