//! Address-book graph: each user gets a tiered number of contacts picked by
//! rejection sampling over the whole population.

use std::collections::HashSet;
use std::ops::Range;

use rand::Rng;
use tracing::info;
use uuid::Uuid;

use chatting_db::Gateway;
use chatting_types::User;

use crate::log_record_error;
use crate::stats::Stats;

/// Candidate draws per contact slot before the slot is abandoned.
pub const MAX_CANDIDATE_DRAWS: usize = 10;

/// Owners between progress lines.
pub const CONTACT_PROGRESS_EVERY: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactTier {
    /// 10% of users, 30..80 contacts.
    Hub,
    /// 20% of users, 10..30 contacts.
    Moderate,
    /// 70% of users, 3..13 contacts.
    Regular,
}

impl ContactTier {
    /// Tier for a uniform draw `p` in [0, 1).
    pub fn from_draw(p: f64) -> Self {
        if p < 0.10 {
            Self::Hub
        } else if p < 0.30 {
            Self::Moderate
        } else {
            Self::Regular
        }
    }

    pub fn draw<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::from_draw(rng.random::<f64>())
    }

    pub fn contact_range(self) -> Range<usize> {
        match self {
            Self::Hub => 30..80,
            Self::Moderate => 10..30,
            Self::Regular => 3..13,
        }
    }

    pub fn contact_count<R: Rng + ?Sized>(self, rng: &mut R) -> usize {
        rng.random_range(self.contact_range())
    }
}

/// Draw up to [`MAX_CANDIDATE_DRAWS`] users, returning the first not in `used`.
pub fn pick_contact<'a, R: Rng + ?Sized>(
    users: &'a [User],
    used: &HashSet<Uuid>,
    rng: &mut R,
) -> Option<&'a User> {
    if users.is_empty() {
        return None;
    }
    (0..MAX_CANDIDATE_DRAWS)
        .map(|_| &users[rng.random_range(0..users.len())])
        .find(|candidate| !used.contains(&candidate.id))
}

/// Build contact edges for every user. Single-threaded; gateway failures on
/// individual edges are logged and skipped. Returns the edges written.
pub fn generate_contacts<G, R>(gateway: &G, users: &[User], rng: &mut R, stats: &Stats) -> u64
where
    G: Gateway + ?Sized,
    R: Rng + ?Sized,
{
    let mut created = 0u64;

    for (i, user) in users.iter().enumerate() {
        let wanted = ContactTier::draw(rng).contact_count(rng);

        let mut used = HashSet::with_capacity(wanted + 1);
        used.insert(user.id);

        for _ in 0..wanted {
            let Some(contact) = pick_contact(users, &used, rng) else {
                continue;
            };
            used.insert(contact.id);

            match gateway.add_contact(user.id, contact.id, &contact.display_name) {
                Ok(_) => {
                    stats.add_contacts(1);
                    created += 1;
                }
                Err(e) => log_record_error("contact", &e),
            }
        }

        if i > 0 && i % CONTACT_PROGRESS_EVERY == 0 {
            info!("Generated contacts for {} users...", i);
        }
    }

    created
}
