mod analyze;
mod digest;
mod squeeze;
mod trending;

use std::sync::Arc;

use serde_json::Value;

use sentiscan_core::{Notifier, Scanner};

use crate::cli::{Cli, Mode};
use crate::error::CliError;
use crate::output::Rendered;

/// Exit code for an analysis whose target has no market snapshot.
pub const MISSING_MARKET_DATA_EXIT: u8 = 3;

/// Services shared by every mode, built once per process.
pub struct App {
    pub scanner: Scanner,
    pub notifier: Arc<dyn Notifier>,
}

pub struct CommandResult {
    pub output: Rendered,
    pub exit_code: u8,
}

impl CommandResult {
    pub fn json(value: Value) -> Self {
        Self {
            output: Rendered::Json(value),
            exit_code: 0,
        }
    }

    pub fn text(text: String) -> Self {
        Self {
            output: Rendered::Text(text),
            exit_code: 0,
        }
    }

    pub fn with_exit_code(mut self, exit_code: u8) -> Self {
        self.exit_code = exit_code;
        self
    }
}

pub async fn run(cli: &Cli, app: &App) -> Result<CommandResult, CliError> {
    match cli.mode {
        Mode::Trending => trending::run(cli, &app.scanner).await,
        Mode::Analyze => analyze::run(cli, &app.scanner).await,
        Mode::Squeeze => squeeze::run(cli, &app.scanner).await,
        Mode::Digest => digest::run(cli, app).await,
    }
}
