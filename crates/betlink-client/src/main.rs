//! betlink CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use betlink_client::cli::{Cli, Command, ConfigAction};
use betlink_client::commands;
use betlink_client::config::ClientConfig;
use betlink_client::error::{ClientError, ClientResult};
use betlink_core::{init_tracing, TracingConfig};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    // Load configuration, then let flags override it
    let mut config = if let Some(ref path) = cli.config {
        ClientConfig::load_from(path).map_err(ClientError::Config)?
    } else {
        ClientConfig::load().map_err(ClientError::Config)?
    };
    cli.apply_to(&mut config);

    init_tracing(TracingConfig::for_cli(cli.debug, cli.json_logs, &config.log.level)?)?;

    match cli.command {
        Some(Command::Config { action }) => match action {
            ConfigAction::Dump => commands::config::dump(&config),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(),
        },
        Some(Command::Send) | None => {
            let report = commands::send::run_until_signal(config).await?;
            println!(
                "sent {} batches ({} rejected), {} bets acknowledged",
                report.batches_sent, report.batches_rejected, report.bets_acknowledged
            );
            if let Some(winners) = report.winners {
                println!("winners: {}", winners.len());
            }
            Ok(())
        }
    }
}
