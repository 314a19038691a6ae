//! toolgate — tools registry and agent proxy service.

use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use toolgate::{
    cli::{Cli, Command},
    config::Settings,
    server, setup_tracing, store,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = setup_tracing(&cli.log_level, cli.log_format.as_deref()) {
        eprintln!("Failed to setup tracing: {e}");
        return ExitCode::FAILURE;
    }

    // Missing JWT_SECRET is fatal here, before anything binds
    let mut settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(host) = cli.host {
        settings.host = host;
    }
    if let Some(port) = cli.port {
        settings.port = port;
    }

    let result = match cli.command {
        Some(Command::Seed) => run_seed(settings).await,
        Some(Command::Serve) | None => server::run(settings).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Run the `seed` subcommand against the configured database.
async fn run_seed(settings: Settings) -> toolgate::Result<()> {
    let pool = store::init_pool(&settings.database_url).await?;
    store::ensure_schema(&pool).await?;
    store::seed(&pool, &settings).await?;
    Ok(())
}
