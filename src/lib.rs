pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod repl;
pub mod session;
pub mod style;
pub mod thinking;
pub mod transport;

#[cfg(test)]
mod test_utils;

use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::process::ExitCode;
use tracing::info;

use cli::{Cli, Mode};
use config::Config;
use error::Error;
use repl::run_repl;
use session::Session;
use style::Style;
use transport::OpenAiTransport;
use transport::openai::build_client;

pub async fn run() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let _log_guard = logging::init(cli.debug);

    match execute(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err, cli.debug);
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: &Cli) -> Result<()> {
    let mode = cli.mode().map_err(Error::from)?;

    let cfg = Config::from_env();
    info!(
        base_url = %cfg.base_url,
        model = %cfg.model,
        stream = cfg.stream,
        strip_thinking = cfg.strip_thinking,
        has_api_key = cfg.api_key.is_some(),
        "loaded runtime configuration"
    );

    let client = build_client(&cfg).context("Failed to initialize HTTP client")?;
    let transport = OpenAiTransport::new(client, cfg.clone());
    let mut session = Session::new(transport, &cfg, io::stdout()).with_style(Style::detect());

    match mode {
        Mode::Interactive => {
            run_repl(&mut session, &cfg.model, io::stdin().lock(), cli.debug).await?;
        }
        Mode::OneShot(query) => {
            session.run_turn(&query).await?;
        }
    }
    Ok(())
}

fn report(err: &anyhow::Error, debug: bool) {
    match err.downcast_ref::<Error>() {
        Some(err) => eprintln!("{}", err.report(debug)),
        None if debug => eprintln!("error: {err:?}"),
        None => eprintln!("error: {err:#}"),
    }
}
