use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tracing::info;

/// Counters shared by every generation phase. Each `add_*` returns the
/// counter's value after the increment so callers can report progress
/// without a second read racing other workers.
pub struct Stats {
    users: AtomicU64,
    contacts: AtomicU64,
    conversations: AtomicU64,
    messages: AtomicU64,
    started_at: Instant,
    finished_at: Mutex<Option<Instant>>,
}

impl Stats {
    pub fn new() -> Self {
        Self {
            users: AtomicU64::new(0),
            contacts: AtomicU64::new(0),
            conversations: AtomicU64::new(0),
            messages: AtomicU64::new(0),
            started_at: Instant::now(),
            finished_at: Mutex::new(None),
        }
    }

    pub fn add_users(&self, n: u64) -> u64 {
        self.users.fetch_add(n, Ordering::Relaxed) + n
    }

    pub fn add_contacts(&self, n: u64) -> u64 {
        self.contacts.fetch_add(n, Ordering::Relaxed) + n
    }

    pub fn add_conversations(&self, n: u64) -> u64 {
        self.conversations.fetch_add(n, Ordering::Relaxed) + n
    }

    pub fn add_messages(&self, n: u64) -> u64 {
        self.messages.fetch_add(n, Ordering::Relaxed) + n
    }

    /// Stamp the end time. Call once every producer has joined.
    pub fn finish(&self) {
        let mut finished = self.finished_at.lock().unwrap_or_else(|e| e.into_inner());
        finished.get_or_insert_with(Instant::now);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let finished = *self.finished_at.lock().unwrap_or_else(|e| e.into_inner());
        let end = finished.unwrap_or_else(Instant::now);
        StatsSnapshot {
            users: self.users.load(Ordering::Relaxed),
            contacts: self.contacts.load(Ordering::Relaxed),
            conversations: self.conversations.load(Ordering::Relaxed),
            messages: self.messages.load(Ordering::Relaxed),
            elapsed: end.duration_since(self.started_at),
        }
    }
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

/// Final totals of a population run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatsSnapshot {
    pub users: u64,
    pub contacts: u64,
    pub conversations: u64,
    pub messages: u64,
    pub elapsed: Duration,
}

impl StatsSnapshot {
    pub fn total_records(&self) -> u64 {
        self.users + self.contacts + self.conversations + self.messages
    }

    pub fn records_per_second(&self) -> Option<f64> {
        let secs = self.elapsed.as_secs_f64();
        (secs > 0.0).then(|| self.total_records() as f64 / secs)
    }

    pub fn log_summary(&self) {
        info!("=== Population Statistics ===");
        info!("Total duration:          {:?}", self.elapsed);
        info!("Users generated:         {}", self.users);
        info!("Contacts generated:      {}", self.contacts);
        info!("Conversations generated: {}", self.conversations);
        info!("Messages generated:      {}", self.messages);
        if let Some(rate) = self.records_per_second() {
            info!("Performance:             {:.2} records/second", rate);
        }
    }
}

/// True when adding `added` to reach `total` stepped over a multiple of `every`.
pub(crate) fn crossed(total: u64, added: u64, every: u64) -> bool {
    every > 0 && added > 0 && (total - added) / every != total / every
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn concurrent_increments_are_not_lost() {
        let stats = Stats::new();
        thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..1000 {
                        stats.add_users(1);
                        stats.add_messages(3);
                    }
                });
            }
        });

        let snap = stats.snapshot();
        assert_eq!(snap.users, 8000);
        assert_eq!(snap.messages, 24000);
        assert_eq!(snap.contacts, 0);
    }

    #[test]
    fn add_returns_running_total() {
        let stats = Stats::new();
        assert_eq!(stats.add_contacts(5), 5);
        assert_eq!(stats.add_contacts(2), 7);
        assert_eq!(stats.add_conversations(1), 1);
    }

    #[test]
    fn finish_freezes_elapsed() {
        let stats = Stats::new();
        stats.finish();
        let first = stats.snapshot().elapsed;
        thread::sleep(Duration::from_millis(5));
        assert_eq!(stats.snapshot().elapsed, first);
    }

    #[test]
    fn throughput_needs_elapsed_time() {
        let snap = StatsSnapshot {
            users: 10,
            contacts: 20,
            conversations: 30,
            messages: 40,
            elapsed: Duration::from_secs(2),
        };
        assert_eq!(snap.total_records(), 100);
        assert_eq!(snap.records_per_second(), Some(50.0));

        let instant = StatsSnapshot { elapsed: Duration::ZERO, ..snap };
        assert_eq!(instant.records_per_second(), None);
    }

    #[test]
    fn threshold_crossing() {
        assert!(crossed(1000, 1, 1000));
        assert!(crossed(1005, 10, 1000));
        assert!(!crossed(999, 10, 1000));
        assert!(!crossed(1001, 1, 1000));
        assert!(!crossed(0, 0, 1000));
    }
}
