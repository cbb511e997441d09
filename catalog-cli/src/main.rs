use std::io;
use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use tracing::{debug, Level};
use tracing_subscriber::{
    fmt::{self, time::ChronoUtc},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use catalog_cli::{execute, AdminConfig, Cli};
use catalog_client::HttpCatalog;
use plan_catalog::AdminSession;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", format!("{err:#}").red());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AdminConfig::load(cli.config.as_deref())?.with_api_url(cli.api_url);
    init_tracing(cli.verbose, config.is_production())?;
    debug!(api_url = %config.api_url, "Using catalog backend");

    let backend = HttpCatalog::new(&config.client())?;
    let mut session = AdminSession::new(backend);
    let mut stdout = io::stdout().lock();
    execute(&mut session, cli.command, &mut stdout).await
}

/// Logs go to stderr so command output stays pipeable
fn init_tracing(verbose: bool, production: bool) -> anyhow::Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::WARN };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "planos_admin={level},catalog_cli={level},catalog_client={level},\
             plan_catalog={level},reqwest=warn"
        )
        .into()
    });

    if production {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(false)
                    .with_writer(io::stderr)
                    .json(),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(true)
                    .with_writer(io::stderr),
            )
            .try_init()?;
    }

    Ok(())
}
