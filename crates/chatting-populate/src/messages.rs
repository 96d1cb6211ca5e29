use anyhow::{Context, Result};
use rand::Rng;
use tracing::{info, warn};

use chatting_db::{Gateway, NewMessage};
use chatting_types::Conversation;

use crate::content::{draft_messages, message_count};
use crate::log_record_error;
use crate::pool;
use crate::stats::{Stats, crossed};

/// Messages between progress lines.
pub const MESSAGE_PROGRESS_EVERY: u64 = 10_000;

/// Write a synthetic history for one conversation and return how many
/// messages were stored. Individual write failures are skipped.
pub fn generate_messages_for_conversation<G, R>(
    gateway: &G,
    conversation: &Conversation,
    rng: &mut R,
    stats: &Stats,
) -> Result<usize>
where
    G: Gateway + ?Sized,
    R: Rng + ?Sized,
{
    let participants = gateway
        .list_conversation_participants(conversation.id)
        .with_context(|| format!("Failed to list participants of {}", conversation.id))?;

    let count = message_count(conversation.is_group, rng);
    let mut stored = 0;

    for draft in draft_messages(&participants, count, rng) {
        let msg = NewMessage::text(conversation.id, draft.sender_id, &draft.content);
        match gateway.create_message(&msg) {
            Ok(_) => {
                stored += 1;
                let generated = stats.add_messages(1);
                if crossed(generated, 1, MESSAGE_PROGRESS_EVERY) {
                    info!("Generated {} messages...", generated);
                }
            }
            Err(e) => log_record_error("message", &e),
        }
    }

    Ok(stored)
}

/// Fan conversations out to the worker pool in batches of `batch_size`.
/// Returns the number of messages stored.
pub fn generate_messages<G>(
    gateway: &G,
    conversations: &[Conversation],
    batch_size: usize,
    workers: usize,
    stats: &Stats,
) -> Result<u64>
where
    G: Gateway + ?Sized,
{
    let per_batch = pool::run_batches(
        conversations.chunks(batch_size.max(1)),
        workers,
        |batch| {
            let mut rng = rand::rng();
            let mut stored = 0u64;
            for conversation in batch {
                match generate_messages_for_conversation(gateway, conversation, &mut rng, stats) {
                    Ok(n) => stored += n as u64,
                    Err(e) => warn!("Skipping messages for conversation {}: {:#}", conversation.id, e),
                }
            }
            Ok(stored)
        },
    )
    .context("Message generation failed")?;

    Ok(per_batch.into_iter().sum())
}
