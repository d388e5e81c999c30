use anyhow::{Context, Result};
use clap::Parser;
use inline_firewall::cli::Cli;
use inline_firewall::config::{LogFormat, LoggingSettings, Settings};
use inline_firewall::Application;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(&cli).context("Failed to load settings")?;

    init_tracing(&settings.logging);

    info!(
        listen = %settings.server.listen_addr,
        upstream = %settings.upstream.service_addr,
        rules = %settings.rules.path.display(),
        "Starting inline firewall"
    );

    let app = Application::new(settings).context("Failed to start firewall")?;
    app.run().await?;

    Ok(())
}

fn init_tracing(logging: &LoggingSettings) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter);

    match logging.format {
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Json => builder.json().with_target(true).init(),
    }
}
