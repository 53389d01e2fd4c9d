use anyhow::Context;
use clap::Parser;
use country_exchange_lib::config::{AppConfig, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    country_exchange_lib::init_tracing();

    let config = AppConfig::try_from(Cli::parse()).context("invalid configuration")?;
    country_exchange_lib::run(config)
        .await
        .context("country exchange service failed")?;

    Ok(())
}
