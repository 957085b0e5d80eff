mod common;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

use jielong::bot::{ChatBot, IncomingMessage, RecordingSink, ReplySink};
use jielong::config::{Config, StorageBackend};

struct FailingSink;

#[async_trait]
impl ReplySink for FailingSink {
    async fn deliver(&self, _destination: &str, _text: &str) -> Result<()> {
        Err(anyhow!("platform returned 500"))
    }
}

#[tokio::test]
async fn run_loop_answers_each_user_in_order() {
    let dir = common::writable_fixture();
    let config = common::config_in(dir.path(), StorageBackend::Memory);
    let sink = Arc::new(RecordingSink::new());
    let bot = Arc::new(ChatBot::new(config, sink.clone()).unwrap());

    let (tx, rx) = mpsc::unbounded_channel();
    for user in ["alice", "bob"] {
        tx.send(IncomingMessage::new(user, "開始")).unwrap();
        tx.send(IncomingMessage::new(user, "天長地久")).unwrap();
        tx.send(IncomingMessage::new(user, "久別重逢")).unwrap();
    }
    drop(tx);
    bot.clone().run(rx).await.unwrap();

    let sent = sink.messages();
    assert_eq!(sent.len(), 6);
    for user in ["alice", "bob"] {
        let replies: Vec<&str> = sent
            .iter()
            .filter(|(dest, _)| dest == user)
            .map(|(_, text)| text.as_str())
            .collect();
        assert_eq!(
            replies,
            vec![
                "接龍開始！請先說一個詞語或成語～",
                "接得好～我接：「久而久之」！換你～（目前 1 分）",
                "要用「之」開頭的詞語或成語才行！你用了「久別重逢」",
            ]
        );
    }
}

#[tokio::test]
async fn shutdown_answers_messages_already_queued() {
    let dir = common::writable_fixture();
    let config = common::config_in(dir.path(), StorageBackend::Memory);
    let sink = Arc::new(RecordingSink::new());
    let bot = Arc::new(ChatBot::new(config, sink.clone()).unwrap());

    let (tx, rx) = mpsc::unbounded_channel();
    for user in ["alice", "bob", "carol"] {
        tx.send(IncomingMessage::new(user, "開始")).unwrap();
        tx.send(IncomingMessage::new(user, "天長地久")).unwrap();
    }
    // The sender stays open; only the shutdown signal ends the loop.
    bot.clone().run_until(rx, async {}).await.unwrap();

    let sent = sink.messages();
    assert_eq!(sent.len(), 6);
    for user in ["alice", "bob", "carol"] {
        let replies: Vec<&str> = sent
            .iter()
            .filter(|(dest, _)| dest == user)
            .map(|(_, text)| text.as_str())
            .collect();
        assert_eq!(
            replies,
            vec![
                "接龍開始！請先說一個詞語或成語～",
                "接得好～我接：「久而久之」！換你～（目前 1 分）",
            ]
        );
    }
    // Sends after shutdown are refused.
    assert!(tx.send(IncomingMessage::new("dave", "開始")).is_err());
}

#[tokio::test]
async fn delivery_failure_keeps_session_change() {
    let dir = common::writable_fixture();
    let config = common::config_in(dir.path(), StorageBackend::Memory);
    let bot = ChatBot::new(config, Arc::new(FailingSink)).unwrap();

    let reply = bot
        .route_text_event(IncomingMessage::new("U1", "開始"))
        .await
        .unwrap();
    assert_eq!(reply, "接龍開始！請先說一個詞語或成語～");
    assert!(bot.engine().store().get_session("U1").unwrap().active);
}

#[tokio::test]
async fn message_text_is_trimmed_before_matching() {
    let dir = common::writable_fixture();
    let config = common::config_in(dir.path(), StorageBackend::Memory);
    let sink = Arc::new(RecordingSink::new());
    let bot = ChatBot::new(config, sink.clone()).unwrap();

    bot.route_text_event(IncomingMessage::new("U1", "\u{3000}開始 \n"))
        .await
        .unwrap();
    let reply = bot
        .route_text_event(IncomingMessage::new("U1", "  天長地久\t"))
        .await
        .unwrap();
    assert_eq!(reply, "接得好～我接：「久而久之」！換你～（目前 1 分）");
}

#[tokio::test]
async fn default_config_keeps_the_round_between_bot_instances() {
    let dir = common::writable_fixture();
    let mut config = Config::default();
    config.dictionary.words_file = dir.path().join("words.txt").to_string_lossy().to_string();
    config.storage.data_dir = dir.path().join("data").to_string_lossy().to_string();
    config.logging.file = None;

    // Each `say` invocation builds a fresh bot from the same config.
    {
        let bot = ChatBot::new(config.clone(), Arc::new(RecordingSink::new())).unwrap();
        bot.route_text_event(IncomingMessage::new("U1", "開始"))
            .await
            .unwrap();
    }
    let bot = ChatBot::new(config, Arc::new(RecordingSink::new())).unwrap();
    let reply = bot
        .route_text_event(IncomingMessage::new("U1", "天長地久"))
        .await
        .unwrap();
    assert_eq!(reply, "接得好～我接：「久而久之」！換你～（目前 1 分）");
}

#[test]
fn missing_word_list_is_fatal_at_startup() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::config_in(dir.path(), StorageBackend::Memory);
    assert!(ChatBot::new(config, Arc::new(RecordingSink::new())).is_err());
}

#[test]
fn status_counts_stored_sessions() {
    let dir = common::writable_fixture();
    let config = common::config_in(dir.path(), StorageBackend::Sled);
    let bot = ChatBot::new(config, Arc::new(RecordingSink::new())).unwrap();
    let status = bot.status().unwrap();
    assert_eq!(status.dictionary_words, 9);
    assert_eq!(status.stored_sessions, 0);
    assert!(!status.lookup_enabled);
}
