mod common;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use jielong::config::Config;
use jielong::dictionary::{DictionaryService, WordListFile, WordValidator};
use jielong::game::{GameEngine, Reply};
use jielong::storage::MemorySessionStore;
use jielong::validation::MAX_WORD_CHARS;

/// Validator that knows a fixed set of words.
struct KnownWords(HashSet<&'static str>);

#[async_trait]
impl WordValidator for KnownWords {
    async fn lookup(&self, word: &str) -> Result<bool> {
        Ok(self.0.contains(word))
    }
}

/// Validator that vouches for anything.
struct AnyWord;

#[async_trait]
impl WordValidator for AnyWord {
    async fn lookup(&self, _word: &str) -> Result<bool> {
        Ok(true)
    }
}

struct Unreachable;

#[async_trait]
impl WordValidator for Unreachable {
    async fn lookup(&self, _word: &str) -> Result<bool> {
        Err(anyhow!("connection refused"))
    }
}

fn engine_with(dir: &std::path::Path, validator: Arc<dyn WordValidator>) -> GameEngine {
    let store = Arc::new(WordListFile::new(dir.join("words.txt")));
    let dict = DictionaryService::load(store)
        .unwrap()
        .with_validator(validator, Duration::from_secs(1));
    GameEngine::new(
        &Config::default().bot,
        Config::default().game,
        Arc::new(dict),
        Arc::new(MemorySessionStore::new()),
    )
}

#[tokio::test]
async fn externally_confirmed_word_is_learned_and_persisted() {
    let dir = common::writable_fixture();
    let engine = engine_with(
        dir.path(),
        Arc::new(KnownWords(["意氣相投"].into_iter().collect())),
    );
    assert!(!engine.dictionary().contains("意氣相投"));

    engine.process("U1", "開始").await;
    let reply = engine.process("U1", "意氣相投").await;
    assert_eq!(
        reply,
        Reply::UserWins {
            last: '投',
            score: Some(1)
        }
    );
    assert!(engine.dictionary().contains("意氣相投"));
    assert!(engine
        .dictionary()
        .candidates_starting_with('意')
        .contains(&"意氣相投".to_string()));

    let reloaded = DictionaryService::load(Arc::new(WordListFile::new(dir.path().join("words.txt"))))
        .unwrap();
    assert!(reloaded.contains("意氣相投"));
    assert_eq!(reloaded.len(), engine.dictionary().len());
}

#[tokio::test]
async fn learned_words_become_bot_candidates() {
    let dir = common::writable_fixture();
    let engine = engine_with(
        dir.path(),
        Arc::new(KnownWords(["相輔相成"].into_iter().collect())),
    );
    engine.process("U1", "開始").await;
    engine.process("U1", "相輔相成").await;

    // Another user's 相 word is now answered with the learned word.
    engine.process("U2", "開始").await;
    assert_eq!(
        engine.process("U2", "吉人天相").await,
        Reply::BotWord {
            word: "相輔相成".into(),
            score: Some(1)
        }
    );
}

#[tokio::test]
async fn rejected_or_failed_lookup_means_not_a_word() {
    let dir = common::writable_fixture();
    let engine = engine_with(dir.path(), Arc::new(KnownWords(HashSet::new())));
    engine.process("U1", "開始").await;
    assert_eq!(
        engine.process("U1", "胡說八道").await,
        Reply::NotAWord {
            word: "胡說八道".into()
        }
    );

    let broken = engine_with(dir.path(), Arc::new(Unreachable));
    broken.process("U1", "開始").await;
    let before = broken.store().get_session("U1").unwrap();
    assert_eq!(
        broken.process("U1", "胡說八道").await,
        Reply::NotAWord {
            word: "胡說八道".into()
        }
    );
    assert_eq!(broken.store().get_session("U1").unwrap(), before);
    assert!(!broken.dictionary().contains("胡說八道"));
}

#[tokio::test]
async fn overlong_text_is_never_learned() {
    let dir = common::writable_fixture();
    let words_file = dir.path().join("words.txt");
    let original = std::fs::read_to_string(&words_file).unwrap();
    let engine = engine_with(dir.path(), Arc::new(AnyWord));
    engine.process("U1", "開始").await;

    let long: String = "一心一意".chars().cycle().take(MAX_WORD_CHARS + 16).collect();
    assert_eq!(
        engine.process("U1", &long).await,
        Reply::NotAWord { word: long.clone() }
    );
    // Nor its first MAX_WORD_CHARS characters.
    let cut: String = long.chars().take(MAX_WORD_CHARS).collect();
    assert!(!engine.dictionary().contains(&long));
    assert!(!engine.dictionary().contains(&cut));
    assert_eq!(std::fs::read_to_string(&words_file).unwrap(), original);
    assert_eq!(engine.store().get_session("U1").unwrap().score, 0);
}
