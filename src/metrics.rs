//! Process-wide game counters.
//! Cheap atomics bumped by the engine and dictionary; read by `status` and at shutdown.
use std::sync::atomic::{AtomicU64, Ordering};

static ROUNDS_STARTED: AtomicU64 = AtomicU64::new(0);
static ROUNDS_QUIT: AtomicU64 = AtomicU64::new(0);
static WORDS_ACCEPTED: AtomicU64 = AtomicU64::new(0);
static WORDS_REJECTED: AtomicU64 = AtomicU64::new(0);
static BOT_CONCESSIONS: AtomicU64 = AtomicU64::new(0);
static LOOKUP_ACCEPTED: AtomicU64 = AtomicU64::new(0);
static LOOKUP_REJECTED: AtomicU64 = AtomicU64::new(0);
static LOOKUP_FAILED: AtomicU64 = AtomicU64::new(0);
static STORE_FAILURES: AtomicU64 = AtomicU64::new(0);

pub fn inc_rounds_started() {
    ROUNDS_STARTED.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_rounds_quit() {
    ROUNDS_QUIT.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_words_accepted() {
    WORDS_ACCEPTED.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_words_rejected() {
    WORDS_REJECTED.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_bot_concessions() {
    BOT_CONCESSIONS.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_lookup_accepted() {
    LOOKUP_ACCEPTED.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_lookup_rejected() {
    LOOKUP_REJECTED.fetch_add(1, Ordering::Relaxed);
}
/// Lookup errors and timeouts (counted separately from clean "not a word" answers).
pub fn inc_lookup_failed() {
    LOOKUP_FAILED.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_store_failures() {
    STORE_FAILURES.fetch_add(1, Ordering::Relaxed);
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Snapshot {
    pub rounds_started: u64,
    pub rounds_quit: u64,
    pub words_accepted: u64,
    pub words_rejected: u64,
    pub bot_concessions: u64,
    pub lookup_accepted: u64,
    pub lookup_rejected: u64,
    pub lookup_failed: u64,
    pub store_failures: u64,
}

pub fn snapshot() -> Snapshot {
    Snapshot {
        rounds_started: ROUNDS_STARTED.load(Ordering::Relaxed),
        rounds_quit: ROUNDS_QUIT.load(Ordering::Relaxed),
        words_accepted: WORDS_ACCEPTED.load(Ordering::Relaxed),
        words_rejected: WORDS_REJECTED.load(Ordering::Relaxed),
        bot_concessions: BOT_CONCESSIONS.load(Ordering::Relaxed),
        lookup_accepted: LOOKUP_ACCEPTED.load(Ordering::Relaxed),
        lookup_rejected: LOOKUP_REJECTED.load(Ordering::Relaxed),
        lookup_failed: LOOKUP_FAILED.load(Ordering::Relaxed),
        store_failures: STORE_FAILURES.load(Ordering::Relaxed),
    }
}

impl std::fmt::Display for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "rounds_started={} rounds_quit={} accepted={} rejected={} bot_concessions={} lookup(ok={} no={} failed={}) store_failures={}",
            self.rounds_started,
            self.rounds_quit,
            self.words_accepted,
            self.words_rejected,
            self.bot_concessions,
            self.lookup_accepted,
            self.lookup_rejected,
            self.lookup_failed,
            self.store_failures
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Counters are global and other tests bump them concurrently, so only monotonic growth is checked.
    #[test]
    fn counters_only_grow() {
        let before = snapshot();
        inc_words_accepted();
        inc_lookup_failed();
        let after = snapshot();
        assert!(after.words_accepted > before.words_accepted);
        assert!(after.lookup_failed > before.lookup_failed);
        assert!(after.to_string().contains("accepted="));
    }
}
