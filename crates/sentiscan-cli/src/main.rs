mod cli;
mod commands;
mod digest;
mod error;
mod logging;
mod output;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use sentiscan_core::{HttpClient, ReqwestHttpClient, Scanner, ScannerConfig, TelegramNotifier};

use crate::cli::Cli;
use crate::commands::App;
use crate::error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let _ = dotenvy::dotenv();
    logging::init(cli.verbose);

    match run(&cli).await {
        Ok(code) => code,
        Err(error) => {
            let ticker = cli.ticker.as_deref().map(str::to_uppercase);
            if output::render_error(&error, ticker.as_deref()).is_err() {
                eprintln!("error: {error}");
            }
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run(cli: &Cli) -> Result<ExitCode, CliError> {
    let config = ScannerConfig::from_env()?;
    let http_client: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new(&config.user_agent));

    let app = App {
        scanner: Scanner::builder()
            .with_config(config)
            .with_http_client(http_client.clone())
            .build(),
        notifier: Arc::new(TelegramNotifier::from_env(http_client)),
    };

    let result = commands::run(cli, &app).await?;
    output::render(&result.output, cli.compact)?;

    Ok(ExitCode::from(result.exit_code))
}
