//! probe - run network measurements from probes around the world.

use anyhow::Result;
use clap::{CommandFactory, Parser};
use probe_cli::cli::Cli;
use probe_cli::config::Config;
use probe_cli::logging::{self, LogConfig};
use probe_cli::view::{TerminalRenderer, ViewOptions};
use probe_core::{
    spawn_signal_listener, FileSessionStore, HttpClient, MeasurementClient, ProbeError,
    SessionEngine, SystemClock,
};
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_config = LogConfig::from_cli(
        cli.log.verbose,
        cli.log.debug,
        cli.log.trace,
        cli.log.quiet,
        cli.log.overrides.clone(),
        cli.log.format,
    );
    logging::init(&log_config);

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            let shows_help = e
                .downcast_ref::<ProbeError>()
                .is_some_and(ProbeError::shows_help);
            if shows_help {
                print_command_help(cli.command.name());
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    }
    .with_env();

    let request = cli.command.to_request(&cli.global)?;
    tracing::info!(
        target: "probe::startup",
        "Loaded configuration (api: {}, token: {})",
        config.api_url,
        if config.api_token.is_some() { "set" } else { "none" }
    );

    let client: Arc<dyn MeasurementClient> = Arc::new(HttpClient::new(config.http_config())?);
    let renderer = TerminalRenderer::new(
        client.clone(),
        ViewOptions {
            json: cli.global.json,
            latency: cli.global.latency,
            poll_interval: config.poll_interval(),
        },
    );
    let store = FileSessionStore::for_terminal_session(config.session_dir.as_deref());
    tracing::debug!(target: "probe::startup", "Session record at {}", store.path().display());

    let mut engine = SessionEngine::new(
        config.engine_config(),
        client,
        Box::new(renderer),
        Arc::new(SystemClock),
        Arc::new(store),
    );

    let cancel = CancellationToken::new();
    let listener = request
        .continuous
        .then(|| spawn_signal_listener(cancel.clone()));

    let result = engine.run(&request, &cancel).await;

    if let Some(listener) = listener {
        listener.abort();
    }
    result?;
    Ok(())
}

fn print_command_help(name: &str) {
    let command = Cli::command();
    let help = match command.find_subcommand(name) {
        Some(subcommand) => subcommand.clone().render_help(),
        None => command.clone().render_help(),
    };
    eprintln!();
    eprintln!("{}", help);
}
