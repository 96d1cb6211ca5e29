//! Synthetic data generator for the chatting backend.
//!
//! Phases run in order, each writing through a [`Gateway`]:
//! users (worker pool) → contact graph → conversations → messages
//! (worker pool). All of them report into one shared [`Stats`].

pub mod config;
pub mod content;
pub mod conversations;
pub mod graph;
pub mod messages;
pub mod pool;
pub mod stats;
pub mod users;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use stats::{Stats, StatsSnapshot};

use anyhow::Result;
use tracing::{debug, info, warn};

use chatting_db::{DbError, Gateway};

/// Run every generation phase against `gateway`. Record-level failures are
/// skipped inside each phase; an error here means a whole phase failed.
pub fn run<G>(gateway: &G, config: &Config) -> Result<StatsSnapshot>
where
    G: Gateway + ?Sized,
{
    let stats = Stats::new();
    let mut rng = rand::rng();

    let all_users = users::generate_users(
        gateway,
        config.users,
        config.batch_size,
        config.workers,
        &stats,
    )?;
    info!("Generated {} users", all_users.len());

    let contact_count = graph::generate_contacts(gateway, &all_users, &mut rng, &stats);
    info!("Generated {} contact relationships", contact_count);

    let set = conversations::generate_conversations(
        gateway,
        &all_users,
        config.conversations,
        &mut rng,
        &stats,
    )?;
    info!(
        "Generated {} conversations ({} 1-on-1, {} groups)",
        set.conversations.len(),
        set.one_to_one,
        set.groups
    );

    let message_count = messages::generate_messages(
        gateway,
        &set.conversations,
        config.batch_size,
        config.workers,
        &stats,
    )?;
    info!(
        "Generated {} messages (target was {})",
        message_count, config.messages
    );

    stats.finish();
    Ok(stats.snapshot())
}

/// Log a skipped record. Constraint hits are expected noise.
pub(crate) fn log_record_error(what: &str, err: &DbError) {
    if err.is_constraint_violation() {
        debug!("Skipping {}: {}", what, err);
    } else {
        warn!("Failed to write {}: {}", what, err);
    }
}
