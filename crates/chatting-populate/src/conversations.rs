//! Conversation synthesis in two sequential phases: 1:1 chats drawn from
//! existing contact edges, then group chats over random user subsets.

use std::ops::Range;

use anyhow::{Result, bail};
use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use tracing::{info, warn};

use chatting_db::Gateway;
use chatting_types::{Conversation, Role, User};

use crate::log_record_error;
use crate::stats::Stats;

/// Share of the requested conversations that should be 1:1.
pub const ONE_TO_ONE_SHARE: f64 = 0.8;

/// Chance that a given contact edge turns into a 1:1 conversation.
pub const CONVERSATION_CHANCE: f64 = 0.6;

pub const GROUP_SIZE: Range<usize> = 3..11;

/// Conversations between progress lines, per phase.
pub const CONVERSATION_PROGRESS_EVERY: usize = 1000;

/// Back-to-back group creation failures before the group phase gives up.
pub const MAX_CONSECUTIVE_GROUP_FAILURES: usize = 100;

const GROUP_NAMES: &[&str] = &[
    "Family Chat", "Work Team", "College Friends", "Book Club", "Gaming Squad",
    "Travel Buddies", "Fitness Group", "Cooking Club", "Tech Talk", "Movie Night",
    "Study Group", "Project Team", "Neighborhood Watch", "Parent Group", "Hobby Club",
];

/// Everything the synthesizer produced.
#[derive(Debug, Default)]
pub struct ConversationSet {
    pub conversations: Vec<Conversation>,
    pub one_to_one: usize,
    pub groups: usize,
}

/// Split a requested total into (1:1 target, group target).
pub fn split_target(total: usize) -> (usize, usize) {
    let one_to_one = ((total as f64) * ONE_TO_ONE_SHARE).round() as usize;
    let one_to_one = one_to_one.min(total);
    (one_to_one, total - one_to_one)
}

/// A group size from [`GROUP_SIZE`], capped at the population.
pub fn group_size<R: Rng + ?Sized>(rng: &mut R, population: usize) -> usize {
    rng.random_range(GROUP_SIZE).min(population)
}

pub fn generate_conversations<G, R>(
    gateway: &G,
    users: &[User],
    total: usize,
    rng: &mut R,
    stats: &Stats,
) -> Result<ConversationSet>
where
    G: Gateway + ?Sized,
    R: Rng + ?Sized,
{
    let (one_to_one_target, group_target) = split_target(total);
    let mut set = ConversationSet::default();

    info!("Generating {} 1-on-1 conversations...", one_to_one_target);
    set.one_to_one =
        generate_one_to_one(gateway, users, one_to_one_target, rng, stats, &mut set.conversations);
    if set.one_to_one < one_to_one_target {
        warn!(
            "Only {} of {} 1-on-1 conversations possible from contact data",
            set.one_to_one, one_to_one_target
        );
    }

    info!("Generating {} group conversations...", group_target);
    set.groups = generate_groups(gateway, users, group_target, rng, stats, &mut set.conversations)?;

    Ok(set)
}

/// Walk users in order and open a 1:1 chat with each contact at
/// [`CONVERSATION_CHANCE`], stopping as soon as `target` is reached.
/// Undershoots when contact data is sparse.
pub fn generate_one_to_one<G, R>(
    gateway: &G,
    users: &[User],
    target: usize,
    rng: &mut R,
    stats: &Stats,
    out: &mut Vec<Conversation>,
) -> usize
where
    G: Gateway + ?Sized,
    R: Rng + ?Sized,
{
    let mut created = 0;

    'users: for user in users {
        if created >= target {
            break;
        }

        let contacts = match gateway.list_user_contacts(user.id) {
            Ok(contacts) => contacts,
            Err(e) => {
                log_record_error("contact list", &e);
                continue;
            }
        };

        for contact in contacts {
            if created >= target {
                break 'users;
            }
            if !rng.random_bool(CONVERSATION_CHANCE) {
                continue;
            }

            let conv = match gateway.create_conversation(false, None, user.id) {
                Ok(conv) => conv,
                Err(e) => {
                    log_record_error("conversation", &e);
                    continue;
                }
            };

            for member in [user.id, contact.contact_id] {
                if let Err(e) = gateway.add_conversation_participant(conv.id, member, Role::Member) {
                    log_record_error("participant", &e);
                }
            }

            out.push(conv);
            stats.add_conversations(1);
            created += 1;

            if created % CONVERSATION_PROGRESS_EVERY == 0 {
                info!("Created {} 1-on-1 conversations...", created);
            }
        }
    }

    created
}

/// Create exactly `target` group chats. The first member of each shuffled
/// subset is the creator and sole admin.
pub fn generate_groups<G, R>(
    gateway: &G,
    users: &[User],
    target: usize,
    rng: &mut R,
    stats: &Stats,
    out: &mut Vec<Conversation>,
) -> Result<usize>
where
    G: Gateway + ?Sized,
    R: Rng + ?Sized,
{
    if target == 0 {
        return Ok(0);
    }
    if users.len() < 2 {
        warn!(
            "Skipping {} group conversations: need at least 2 users, have {}",
            target,
            users.len()
        );
        return Ok(0);
    }

    let mut shuffled: Vec<&User> = users.iter().collect();
    let mut created = 0;
    let mut failures = 0;

    while created < target {
        let size = group_size(rng, shuffled.len());
        shuffled.shuffle(rng);
        let members = &shuffled[..size];
        let creator = members[0];
        let title = GROUP_NAMES.choose(rng).copied();

        let conv = match gateway.create_conversation(true, title, creator.id) {
            Ok(conv) => conv,
            Err(e) => {
                log_record_error("group conversation", &e);
                failures += 1;
                if failures >= MAX_CONSECUTIVE_GROUP_FAILURES {
                    bail!(
                        "Group generation stalled after {} consecutive failures (last: {})",
                        failures,
                        e
                    );
                }
                continue;
            }
        };
        failures = 0;

        for (i, member) in members.iter().enumerate() {
            let role = if i == 0 { Role::Admin } else { Role::Member };
            if let Err(e) = gateway.add_conversation_participant(conv.id, member.id, role) {
                log_record_error("participant", &e);
            }
        }

        out.push(conv);
        stats.add_conversations(1);
        created += 1;

        if created % CONVERSATION_PROGRESS_EVERY == 0 {
            info!("Created {} group conversations...", created);
        }
    }

    Ok(created)
}
