use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use crate::dictionary::last_char;

/// # Player Session
///
/// Per-user word-chain progress. One session exists per platform user id; it is created
/// lazily (as [`Session::default`]) on first contact and never deleted.
///
/// ## States
///
/// - **Inactive** (`active == false`) - no round running. `last_word` and `used_words` keep
///   the previous round's values for display but are never consulted for chaining.
/// - **Active** - a round is running; the next word must start with the last character of
///   `last_word` (any word may open the round while `last_word` is `None`).
///
/// ## Invariants
///
/// - `used_words` contains `last_word` whenever both are set by the engine.
/// - `score` counts words the user has had accepted in the current round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub active: bool,
    pub last_word: Option<String>,
    pub used_words: HashSet<String>,
    pub score: u32,
    #[serde(default)]
    pub rounds_played: u32,
    #[serde(default)]
    pub rounds_won: u32,
    /// Identifies the current round in logs; replaced on every start.
    #[serde(default)]
    pub round_id: Option<Uuid>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Reset for a new round. With `seed`, the round opens on that word.
    pub fn start_round(&mut self, seed: Option<String>) {
        self.active = true;
        self.used_words.clear();
        self.score = 0;
        self.rounds_played = self.rounds_played.saturating_add(1);
        self.round_id = Some(Uuid::new_v4());
        self.last_word = None;
        if let Some(word) = seed {
            self.play(word);
        }
        self.touch();
    }

    /// End the round without a winner (user quit).
    pub fn end_round(&mut self) {
        self.active = false;
        self.touch();
    }

    /// End the round with the user as winner (the bot ran out of words).
    pub fn concede(&mut self) {
        self.active = false;
        self.rounds_won = self.rounds_won.saturating_add(1);
        self.touch();
    }

    /// Record a word played by the user.
    pub fn accept_user_word(&mut self, word: &str) {
        self.play(word.to_string());
        self.score = self.score.saturating_add(1);
        self.touch();
    }

    /// Record the bot's counter-word.
    pub fn record_bot_word(&mut self, word: String) {
        self.play(word);
        self.touch();
    }

    pub fn is_used(&self, word: &str) -> bool {
        self.used_words.contains(word)
    }

    /// Character the next word must start with, if a chain is in progress.
    pub fn required_char(&self) -> Option<char> {
        if !self.active {
            return None;
        }
        self.last_word.as_deref().and_then(last_char)
    }

    fn play(&mut self, word: String) {
        self.used_words.insert(word.clone());
        self.last_word = Some(word);
    }

    fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }
}
