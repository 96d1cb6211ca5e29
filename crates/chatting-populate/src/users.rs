use anyhow::{Context, Result};
use fake::Fake;
use fake::faker::name::en::Name;
use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::{debug, info};

use chatting_db::Gateway;
use chatting_types::User;

use crate::pool;
use crate::stats::{Stats, crossed};

/// Users between progress lines.
pub const USER_PROGRESS_EVERY: u64 = 1000;

/// Attempts at a fresh phone number before a duplicate fails the batch.
pub const MAX_PHONE_ATTEMPTS: usize = 5;

const PROFESSIONS: &[&str] = &[
    "Software Engineer", "Teacher", "Photographer", "Student", "Doctor",
    "Nurse", "Lawyer", "Accountant", "Designer", "Manager",
    "Sales Rep", "Consultant", "Writer", "Artist", "Chef",
];

const INTERESTS: &[&str] = &[
    "technology", "travel", "photography", "cooking", "reading",
    "sports", "music", "movies", "gaming", "hiking",
    "art", "science", "politics", "fashion", "fitness",
];

/// A mobile number in one of five national formats (US, UK, DE, FR, CA).
pub fn phone_number<R: Rng + ?Sized>(rng: &mut R) -> String {
    match rng.random_range(0..5) {
        1 => format!("+447{:09}", rng.random_range(0..1_000_000_000u32)),
        2 => format!("+4917{:08}", rng.random_range(0..100_000_000u32)),
        3 => format!("+336{:08}", rng.random_range(0..100_000_000u32)),
        // US and Canada share the NANP layout
        _ => format!(
            "+1{:03}{:03}{:04}",
            rng.random_range(100..1000u32),
            rng.random_range(100..1000u32),
            rng.random_range(1000..10000u32),
        ),
    }
}

pub fn bio<R: Rng + ?Sized>(rng: &mut R) -> String {
    let profession = PROFESSIONS.choose(rng).copied().unwrap_or("Person");
    let interest = INTERESTS.choose(rng).copied().unwrap_or("life");
    format!("{} passionate about {}", profession, interest)
}

/// Create `count` users one after another. A phone collision is redrawn;
/// any other gateway error fails the whole batch.
pub fn generate_user_batch<G, R>(gateway: &G, count: usize, rng: &mut R) -> Result<Vec<User>>
where
    G: Gateway + ?Sized,
    R: Rng + ?Sized,
{
    let mut users = Vec::with_capacity(count);
    for _ in 0..count {
        let display_name: String = Name().fake();
        let bio = bio(rng);

        let mut attempt = 1;
        let user = loop {
            let phone = phone_number(rng);
            match gateway.create_user(&phone, &display_name, &bio) {
                Ok(user) => break user,
                Err(e) if e.is_constraint_violation() && attempt < MAX_PHONE_ATTEMPTS => {
                    debug!("Phone {} taken, redrawing: {}", phone, e);
                    attempt += 1;
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to create user {}", display_name));
                }
            }
        };
        users.push(user);
    }
    Ok(users)
}

/// Generate `total` users in batches of `batch_size` across `workers` threads.
/// Failed batches are skipped, so fewer users may come back than requested.
pub fn generate_users<G>(
    gateway: &G,
    total: usize,
    batch_size: usize,
    workers: usize,
    stats: &Stats,
) -> Result<Vec<User>>
where
    G: Gateway + ?Sized,
{
    let batches = pool::run_batches(pool::batch_sizes(total, batch_size), workers, |count| {
        let users = generate_user_batch(gateway, count, &mut rand::rng())?;
        let added = users.len() as u64;
        let generated = stats.add_users(added);
        if crossed(generated, added, USER_PROGRESS_EVERY) {
            info!("Generated {} users...", generated);
        }
        Ok(users)
    })
    .context("User generation failed")?;

    Ok(batches.into_iter().flatten().collect())
}
