use clap::Parser;

pub const DEFAULT_DB_URL: &str = "sqlite://chatting.db";

/// Run parameters. Every flag can also come from the environment (or a
/// `.env` file loaded before parsing).
#[derive(Debug, Clone, Parser)]
#[command(
    name = "populate",
    about = "Chatting synthetic data generator",
    long_about = "Populate the chatting database with users, a contact graph, 1:1 and group conversations, and message history for load testing"
)]
pub struct Config {
    /// Number of users to generate
    #[arg(long, env = "POPULATE_USERS", default_value_t = 10_000)]
    pub users: usize,

    /// Number of conversations to generate (80% 1:1, 20% groups)
    #[arg(long, env = "POPULATE_CONVERSATIONS", default_value_t = 100_000)]
    pub conversations: usize,

    /// Message target, reported against the actual count. Per-conversation
    /// message counts are drawn independently of it.
    #[arg(long, env = "POPULATE_MESSAGES", default_value_t = 3_000_000)]
    pub messages: usize,

    /// Units per batch handed to a worker
    #[arg(long, env = "POPULATE_BATCH_SIZE", default_value_t = 1000, value_parser = parse_positive)]
    pub batch_size: usize,

    /// Number of concurrent workers
    #[arg(long, env = "POPULATE_WORKERS", default_value_t = 4, value_parser = parse_positive)]
    pub workers: usize,

    /// Database connection string (path, sqlite://path, or :memory:)
    #[arg(long, env = "CHATTING_DB_URL", default_value = DEFAULT_DB_URL)]
    pub db_url: String,

    /// Enable debug logging
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

fn parse_positive(raw: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(0) => Err("must be at least 1".into()),
        Ok(n) => Ok(n),
        Err(e) => Err(format!("'{}' is not a number: {}", raw, e)),
    }
}
