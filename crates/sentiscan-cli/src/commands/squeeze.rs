use serde::Serialize;

use sentiscan_core::{Scanner, SqueezeRow};

use crate::cli::Cli;
use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct SqueezeResponse {
    #[serde(rename = "type")]
    kind: &'static str,
    rows: Vec<SqueezeRow>,
}

pub async fn run(cli: &Cli, scanner: &Scanner) -> Result<CommandResult, CliError> {
    let rows = scanner.squeeze_scan(usize::from(cli.limit)).await;
    Ok(CommandResult::json(serde_json::to_value(SqueezeResponse {
        kind: "squeeze",
        rows,
    })?))
}
