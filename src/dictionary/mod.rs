//! # Dictionary Service
//!
//! The authoritative set of words eligible for play.
//!
//! - [`Dictionary`] - in-memory word set with a first-character index (dictionary order preserved)
//! - [`DictionaryService`] - thread-safe wrapper adding persistence of learned words and optional
//!   external validation with a bounded timeout
//! - [`wordlist`] - backing word list storage ([`WordStore`], [`WordListFile`])
//! - [`lookup`] - external reference sources ([`WordValidator`], `HttpLookup`)
//!
//! Membership checks are O(1); "words starting with `c`" is a single index lookup followed by
//! a walk over the matching words only.

pub mod lookup;
pub mod wordlist;

use anyhow::Result;
use log::{debug, info, warn};
use rand::seq::SliceRandom;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::config::Config;
use crate::logutil::escape_log;
use crate::metrics;

pub use lookup::WordValidator;
pub use wordlist::{MemoryWordStore, WordListFile, WordStore};

/// First character of a word, if any.
pub fn first_char(word: &str) -> Option<char> {
    word.chars().next()
}

/// Last character of a word, if any.
pub fn last_char(word: &str) -> Option<char> {
    word.chars().next_back()
}

/// Word set plus an index from starting character to word positions.
#[derive(Debug, Default, Clone)]
pub struct Dictionary {
    words: Vec<String>,
    members: HashSet<String>,
    by_first: HashMap<char, Vec<usize>>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from words in order; duplicates and empty strings are ignored.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut dict = Self::new();
        for word in words {
            dict.insert(word.as_ref());
        }
        dict
    }

    /// Insert a word. Returns false if it was already present or empty.
    pub fn insert(&mut self, word: &str) -> bool {
        let Some(first) = first_char(word) else {
            return false;
        };
        if self.members.contains(word) {
            return false;
        }
        let idx = self.words.len();
        self.words.push(word.to_string());
        self.members.insert(word.to_string());
        self.by_first.entry(first).or_default().push(idx);
        true
    }

    pub fn contains(&self, word: &str) -> bool {
        self.members.contains(word)
    }

    /// Words beginning with `ch`, in dictionary order.
    pub fn candidates_starting_with(&self, ch: char) -> impl Iterator<Item = &str> + '_ {
        self.by_first
            .get(&ch)
            .into_iter()
            .flatten()
            .map(move |&i| self.words[i].as_str())
    }

    pub fn random_word(&self) -> Option<&str> {
        self.words
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
    }

    /// Random word whose last character starts some other word, so it can be continued.
    pub fn random_playable_word(&self) -> Option<&str> {
        let playable: Vec<&str> = self
            .words
            .iter()
            .map(String::as_str)
            .filter(|word| {
                last_char(word).map_or(false, |c| {
                    self.candidates_starting_with(c).any(|next| next != *word)
                })
            })
            .collect();
        playable.choose(&mut rand::thread_rng()).copied()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Shared dictionary used by every session.
///
/// Reads take a shared lock; learning a word takes the write lock briefly and then appends to
/// the backing [`WordStore`] outside the lock.
pub struct DictionaryService {
    dict: RwLock<Dictionary>,
    store: Arc<dyn WordStore>,
    validator: Option<Arc<dyn WordValidator>>,
    lookup_timeout: Duration,
    persist_learned: bool,
}

impl DictionaryService {
    /// Load the initial words from `store`. Fails when the store cannot be read, which callers
    /// treat as fatal at startup.
    pub fn load(store: Arc<dyn WordStore>) -> Result<Self> {
        let words = store.load_initial_words()?;
        let dict = Dictionary::from_words(&words);
        if dict.len() < words.len() {
            debug!(
                "dictionary: ignored {} duplicate entries",
                words.len() - dict.len()
            );
        }
        Ok(Self {
            dict: RwLock::new(dict),
            store,
            validator: None,
            lookup_timeout: Duration::from_secs(3),
            persist_learned: true,
        })
    }

    /// Build the service described by `config`: the word list file, plus the HTTP validator when
    /// `[lookup]` is enabled and the `lookup` feature is compiled in.
    pub fn from_config(config: &Config) -> Result<Self> {
        let store: Arc<dyn WordStore> = Arc::new(WordListFile::new(&config.dictionary.words_file));
        let mut service = Self::load(store)?
            .persist_learned_words(config.dictionary.persist_learned_words);
        info!(
            "dictionary: loaded {} words from {}",
            service.len(),
            config.dictionary.words_file
        );

        if config.lookup.enabled {
            #[cfg(feature = "lookup")]
            {
                let validator = lookup::HttpLookup::new(config.lookup.clone())?;
                service = service.with_validator(
                    Arc::new(validator),
                    Duration::from_secs(config.lookup.timeout_seconds as u64),
                );
                info!("dictionary: external lookup via {}", config.lookup.url_template);
            }
            #[cfg(not(feature = "lookup"))]
            {
                warn!("dictionary: [lookup] enabled but built without the 'lookup' feature; unknown words will be rejected");
            }
        }
        Ok(service)
    }

    /// Attach an external validator; every lookup is cut off after `timeout`.
    pub fn with_validator(mut self, validator: Arc<dyn WordValidator>, timeout: Duration) -> Self {
        self.validator = Some(validator);
        self.lookup_timeout = timeout;
        self
    }

    pub fn persist_learned_words(mut self, persist: bool) -> Self {
        self.persist_learned = persist;
        self
    }

    pub fn lookup_enabled(&self) -> bool {
        self.validator.is_some()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.read().contains(word)
    }

    /// Owned copy of the words beginning with `ch`, in dictionary order.
    pub fn candidates_starting_with(&self, ch: char) -> Vec<String> {
        self.read()
            .candidates_starting_with(ch)
            .map(str::to_string)
            .collect()
    }

    pub fn random_word(&self) -> Option<String> {
        self.read().random_word().map(str::to_string)
    }

    pub fn random_playable_word(&self) -> Option<String> {
        self.read().random_playable_word().map(str::to_string)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Ask the external source about `word`. Disabled lookup, errors and timeouts all answer
    /// `false`; none of them is fatal.
    pub async fn validate_externally(&self, word: &str) -> bool {
        let Some(validator) = &self.validator else {
            return false;
        };
        match tokio::time::timeout(self.lookup_timeout, validator.lookup(word)).await {
            Ok(Ok(true)) => {
                metrics::inc_lookup_accepted();
                debug!("lookup: '{}' accepted", escape_log(word));
                true
            }
            Ok(Ok(false)) => {
                metrics::inc_lookup_rejected();
                debug!("lookup: '{}' unknown", escape_log(word));
                false
            }
            Ok(Err(e)) => {
                metrics::inc_lookup_failed();
                warn!("lookup: '{}' failed, treating as unknown: {}", escape_log(word), e);
                false
            }
            Err(_) => {
                metrics::inc_lookup_failed();
                warn!(
                    "lookup: '{}' timed out after {:?}, treating as unknown",
                    escape_log(word),
                    self.lookup_timeout
                );
                false
            }
        }
    }

    /// Insert a newly accepted word and append it to the backing store. Returns false when the
    /// word was already known. A persistence failure is logged; the word stays playable for the
    /// life of the process.
    pub fn add(&self, word: &str) -> bool {
        let inserted = match self.dict.write() {
            Ok(mut guard) => guard.insert(word),
            Err(poisoned) => poisoned.into_inner().insert(word),
        };
        if !inserted {
            return false;
        }
        info!("dictionary: learned '{}'", escape_log(word));
        if self.persist_learned {
            if let Err(e) = self.store.append_word(word) {
                warn!("dictionary: could not persist '{}': {:#}", escape_log(word), e);
            }
        }
        true
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Dictionary> {
        self.dict.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;

    struct Fixed(bool);

    #[async_trait]
    impl WordValidator for Fixed {
        async fn lookup(&self, _word: &str) -> Result<bool> {
            Ok(self.0)
        }
    }

    struct Broken;

    #[async_trait]
    impl WordValidator for Broken {
        async fn lookup(&self, _word: &str) -> Result<bool> {
            Err(anyhow!("connection refused"))
        }
    }

    struct Slow;

    #[async_trait]
    impl WordValidator for Slow {
        async fn lookup(&self, _word: &str) -> Result<bool> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(true)
        }
    }

    fn service(words: &[&str]) -> (Arc<MemoryWordStore>, DictionaryService) {
        let store = Arc::new(MemoryWordStore::new(words.iter().copied()));
        let svc = DictionaryService::load(store.clone()).unwrap();
        (store, svc)
    }

    #[test]
    fn index_preserves_dictionary_order() {
        let dict = Dictionary::from_words(["之乎者也", "天長地久", "之死靡它", "之乎者也", ""]);
        assert_eq!(dict.len(), 3);
        let got: Vec<&str> = dict.candidates_starting_with('之').collect();
        assert_eq!(got, vec!["之乎者也", "之死靡它"]);
        assert_eq!(dict.candidates_starting_with('龍').count(), 0);
    }

    #[test]
    fn playable_word_needs_another_word_to_follow() {
        // 天天 only continues into itself and nothing starts with 它.
        let dict = Dictionary::from_words(["天天", "久而久之", "之死靡它"]);
        for _ in 0..20 {
            assert_eq!(dict.random_playable_word(), Some("久而久之"));
        }
        let dead_ends = Dictionary::from_words(["天天", "之死靡它"]);
        assert_eq!(dead_ends.random_playable_word(), None);
        assert_eq!(Dictionary::new().random_playable_word(), None);
    }

    #[test]
    fn first_and_last_use_characters() {
        assert_eq!(first_char("果實纍纍"), Some('果'));
        assert_eq!(last_char("果實纍纍"), Some('纍'));
        assert_eq!(last_char(""), None);
    }

    #[test]
    fn add_then_contains_and_persisted_once() {
        let (store, svc) = service(&["天長地久"]);
        assert!(!svc.contains("久而久之"));
        assert!(svc.add("久而久之"));
        assert!(svc.contains("久而久之"));
        assert!(!svc.add("久而久之"));
        assert_eq!(store.words(), vec!["天長地久", "久而久之"]);
        assert_eq!(svc.candidates_starting_with('久'), vec!["久而久之"]);
    }

    #[test]
    fn learned_words_can_stay_in_memory_only() {
        let store = Arc::new(MemoryWordStore::new(["天長地久"]));
        let svc = DictionaryService::load(store.clone())
            .unwrap()
            .persist_learned_words(false);
        assert!(svc.add("久而久之"));
        assert!(svc.contains("久而久之"));
        assert_eq!(store.words(), vec!["天長地久"]);
    }

    #[tokio::test]
    async fn lookup_disabled_fails_closed() {
        let (_, svc) = service(&[]);
        assert!(!svc.lookup_enabled());
        assert!(!svc.validate_externally("久而久之").await);
    }

    #[tokio::test]
    async fn lookup_errors_fail_closed() {
        let (_, svc) = service(&[]);
        let svc = svc.with_validator(Arc::new(Broken), Duration::from_secs(1));
        assert!(!svc.validate_externally("久而久之").await);

        let (_, svc) = service(&[]);
        let svc = svc.with_validator(Arc::new(Fixed(true)), Duration::from_secs(1));
        assert!(svc.validate_externally("久而久之").await);
    }

    #[tokio::test]
    async fn lookup_timeout_fails_closed() {
        let (_, svc) = service(&[]);
        let svc = svc.with_validator(Arc::new(Slow), Duration::from_millis(50));
        assert!(!svc.validate_externally("久而久之").await);
    }
}
