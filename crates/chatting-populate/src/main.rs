use anyhow::Context;
use clap::Parser;
use tracing::info;

use chatting_db::Database;
use chatting_populate::Config;

fn main() -> anyhow::Result<()> {
    // Load .env before parsing so env-backed flags see it
    let _ = dotenvy::dotenv();

    let config = Config::parse();

    let default_filter = if config.verbose {
        "populate=debug,chatting_populate=debug,chatting_db=debug"
    } else {
        "populate=info,chatting_populate=info,chatting_db=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    info!("Starting data generation with config: {:?}", config);

    let db = Database::connect(&config.db_url)
        .with_context(|| format!("Failed to open database {}", config.db_url))?;

    let snapshot = chatting_populate::run(&db, &config)?;
    snapshot.log_summary();

    Ok(())
}
