//! Word-chain game engine: the per-user turn state machine.
//!
//! [`GameEngine::handle_message`] is the single entry point. For one user it
//! 1. takes that user's lock (messages from one user never interleave; different users run
//!    in parallel),
//! 2. reads the session from the [`SessionStore`],
//! 3. applies the command or gameplay rules below,
//! 4. writes the session back only if it changed.
//!
//! Gameplay checks for an active round, in order:
//! too short → unknown word (after optional external lookup, which may teach the dictionary
//! the word) → already used → wrong starting character → accept → bot counter-word or
//! concession. Rejections never touch the session.
use anyhow::Result;
use log::{debug, error, info, warn};
use rand::seq::SliceRandom;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::commands::{CommandParser, GameCommand};
use super::replies::Reply;
use super::session::Session;
use crate::config::{BotConfig, Config, CounterWordPolicy, GameConfig, StartMode};
use crate::dictionary::{first_char, last_char, DictionaryService};
use crate::logutil::{escape_log, short_user};
use crate::metrics;
use crate::storage::{open_session_store, SessionStore};
use crate::validation::MAX_WORD_CHARS;

/// Lock table size that triggers pruning of idle per-user locks.
const LOCK_TABLE_PRUNE_AT: usize = 1024;

type UserLock = Arc<tokio::sync::Mutex<()>>;

pub struct GameEngine {
    dictionary: Arc<DictionaryService>,
    store: Arc<dyn SessionStore>,
    rules: GameConfig,
    parser: CommandParser,
    locks: Mutex<HashMap<String, UserLock>>,
}

impl GameEngine {
    pub fn new(
        bot: &BotConfig,
        rules: GameConfig,
        dictionary: Arc<DictionaryService>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            dictionary,
            store,
            rules,
            parser: CommandParser::new(bot),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Load the dictionary and open the session store named by `config`. Either failing is fatal.
    pub fn from_config(config: &Config) -> Result<Self> {
        let dictionary = Arc::new(DictionaryService::from_config(config)?);
        let store = open_session_store(&config.storage)?;
        Ok(Self::new(&config.bot, config.game.clone(), dictionary, store))
    }

    pub fn dictionary(&self) -> &Arc<DictionaryService> {
        &self.dictionary
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Process one message for one user and return the reply text.
    pub async fn handle_message(&self, user_id: &str, text: &str) -> String {
        self.process(user_id, text).await.to_string()
    }

    /// Process one message for one user and return the structured reply.
    pub async fn process(&self, user_id: &str, text: &str) -> Reply {
        let lock = self.user_lock(user_id);
        let _turn = lock.lock().await;

        let mut session = match self.store.get_session(user_id) {
            Ok(s) => s,
            Err(e) => {
                metrics::inc_store_failures();
                error!("session read failed for {}: {}", short_user(user_id), e);
                return Reply::Unavailable;
            }
        };
        let before = session.clone();

        let reply = self.apply(user_id, &mut session, text).await;

        if session != before {
            if let Err(e) = self.store.put_session(user_id, &session) {
                metrics::inc_store_failures();
                error!("session write failed for {}: {}", short_user(user_id), e);
                return Reply::Unavailable;
            }
        }
        record_outcome(&reply);
        reply
    }

    async fn apply(&self, user_id: &str, session: &mut Session, text: &str) -> Reply {
        match self.parser.parse(text) {
            GameCommand::Start => self.start_round(user_id, session),
            GameCommand::Quit => {
                if !session.active {
                    return Reply::NoRoundRunning {
                        start: self.start_phrase(),
                    };
                }
                let score = session.score;
                session.end_round();
                info!(
                    "round {} ended by {} (score {})",
                    round_tag(session),
                    short_user(user_id),
                    score
                );
                Reply::RoundEnded {
                    score,
                    start: self.start_phrase(),
                }
            }
            GameCommand::Help => Reply::Help {
                start: self.start_phrase(),
                quit: self.parser.primary_quit_phrase().to_string(),
                min_chars: self.rules.min_word_chars,
                no_repeats: self.rules.track_used_words,
            },
            GameCommand::Status => {
                if session.active {
                    Reply::Turn {
                        required: session.required_char(),
                        score: session.score,
                    }
                } else {
                    Reply::Idle {
                        rounds_played: session.rounds_played,
                        rounds_won: session.rounds_won,
                        start: self.start_phrase(),
                    }
                }
            }
            GameCommand::Play(word) => {
                if !session.active {
                    return Reply::StartPrompt {
                        start: self.start_phrase(),
                    };
                }
                let reply = self.play_turn(session, word).await;
                debug!(
                    "round {} {}: {}",
                    round_tag(session),
                    short_user(user_id),
                    escape_log(&reply.to_string())
                );
                reply
            }
        }
    }

    fn start_round(&self, user_id: &str, session: &mut Session) -> Reply {
        let seed = match self.rules.start_mode {
            StartMode::UserFirst => None,
            StartMode::BotSeeded => {
                let seed = self.pick_seed();
                if seed.is_none() {
                    warn!("bot-seeded start requested but the dictionary is empty; user plays first");
                }
                seed
            }
        };
        session.start_round(seed.clone());
        info!(
            "round {} started by {} (seed: {})",
            round_tag(session),
            short_user(user_id),
            seed.as_deref().map(escape_log).unwrap_or_else(|| "-".into())
        );
        match seed.and_then(|s| last_char(&s).map(|c| (s, c))) {
            Some((seed, next)) => Reply::RoundStartedSeeded { seed, next },
            None => Reply::RoundStarted,
        }
    }

    /// Random opening word, preferring one the user can actually continue.
    fn pick_seed(&self) -> Option<String> {
        self.dictionary
            .random_playable_word()
            .or_else(|| self.dictionary.random_word())
    }

    async fn play_turn(&self, session: &mut Session, word: String) -> Reply {
        let chars = word.chars().count();
        if chars < self.rules.min_word_chars {
            return Reply::TooShort {
                word,
                min_chars: self.rules.min_word_chars,
            };
        }
        if chars > MAX_WORD_CHARS {
            return Reply::NotAWord { word };
        }
        let (Some(first), Some(last)) = (first_char(&word), last_char(&word)) else {
            return Reply::NotAWord { word };
        };

        if !self.dictionary.contains(&word) {
            if !self.dictionary.validate_externally(&word).await {
                return Reply::NotAWord { word };
            }
            self.dictionary.add(&word);
        }

        if self.rules.track_used_words && session.is_used(&word) {
            return Reply::AlreadyUsed { word };
        }

        if let Some(required) = session.required_char() {
            if first != required {
                return Reply::WrongStart { required, word };
            }
        }

        session.accept_user_word(&word);

        let candidates: Vec<String> = self
            .dictionary
            .candidates_starting_with(last)
            .into_iter()
            .filter(|c| !self.rules.track_used_words || !session.is_used(c))
            .collect();

        let score = self.rules.show_score.then_some(session.score);
        match self.pick_counter_word(candidates) {
            None => {
                session.concede();
                Reply::UserWins { last, score }
            }
            Some(counter) => {
                session.record_bot_word(counter.clone());
                Reply::BotWord {
                    word: counter,
                    score,
                }
            }
        }
    }

    fn pick_counter_word(&self, mut candidates: Vec<String>) -> Option<String> {
        if candidates.is_empty() {
            return None;
        }
        match self.rules.counter_word {
            CounterWordPolicy::First => Some(candidates.swap_remove(0)),
            CounterWordPolicy::Random => candidates.choose(&mut rand::thread_rng()).cloned(),
        }
    }

    fn start_phrase(&self) -> String {
        self.parser.primary_start_phrase().to_string()
    }

    fn user_lock(&self, user_id: &str) -> UserLock {
        let mut table = self
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if table.len() >= LOCK_TABLE_PRUNE_AT && !table.contains_key(user_id) {
            table.retain(|_, lock| Arc::strong_count(lock) > 1);
        }
        table
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Drop per-user locks nobody holds or waits on. Returns how many were removed.
    pub fn prune_idle_locks(&self) -> usize {
        let mut table = self
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let before = table.len();
        table.retain(|_, lock| Arc::strong_count(lock) > 1);
        before - table.len()
    }

    /// Number of per-user locks currently tracked.
    pub fn lock_table_len(&self) -> usize {
        self.locks
            .lock()
            .map(|t| t.len())
            .unwrap_or_else(|poisoned| poisoned.into_inner().len())
    }
}

/// Count a reply whose session change, if any, has been stored.
fn record_outcome(reply: &Reply) {
    match reply {
        Reply::RoundStarted | Reply::RoundStartedSeeded { .. } => metrics::inc_rounds_started(),
        Reply::RoundEnded { .. } => metrics::inc_rounds_quit(),
        Reply::BotWord { .. } => metrics::inc_words_accepted(),
        Reply::UserWins { .. } => {
            metrics::inc_words_accepted();
            metrics::inc_bot_concessions();
        }
        r if r.is_rejection() => metrics::inc_words_rejected(),
        _ => {}
    }
}

fn round_tag(session: &Session) -> String {
    session
        .round_id
        .map(|id| id.simple().to_string()[..8].to_string())
        .unwrap_or_else(|| "-".into())
}
