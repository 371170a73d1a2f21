mod cli;
mod client;
mod dashboard;
mod error;
mod models;
mod render;
mod repl;
mod session;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::CliConfig;
use repl::Repl;
use session::Session;

fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_filter())),
        )
        .init();

    let session = Session::load(config.state_path())?;
    tracing::debug!(path = %session.path().display(), "session loaded");
    let mut repl = Repl::new(config, session);
    repl.run();
    Ok(())
}
