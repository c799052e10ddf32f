use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
    let result = commands::run_command(cli);
    if let Err(err) = &result {
        if let Some(kind) = commands::error_kind(err).filter(|k| k.is_security_event()) {
            tracing::warn!(%kind, error = %err, "refused request");
        }
    }
    result
}
