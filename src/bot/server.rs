use anyhow::{anyhow, Context, Result};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Duration;

use super::delivery::ReplySink;
use crate::config::Config;
use crate::game::GameEngine;
use crate::logutil::{escape_log, short_user};
use crate::metrics;
use crate::validation::{normalize_message, validate_user_id};

macro_rules! sec_log {
    ($($arg:tt)*) => { log::warn!(target: "security", $($arg)*); };
}

/// How often idle per-user locks are pruned while the bot runs.
const HOUSEKEEPING_INTERVAL: Duration = Duration::from_secs(60);

/// A decoded inbound chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub user_id: String,
    pub text: String,
    /// Platform token for replying to this specific message. Replies go to `user_id` when absent.
    pub reply_token: Option<String>,
}

impl IncomingMessage {
    pub fn new(user_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            text: text.into(),
            reply_token: None,
        }
    }

    pub fn with_reply_token(mut self, token: impl Into<String>) -> Self {
        self.reply_token = Some(token.into());
        self
    }

    fn destination(&self) -> &str {
        self.reply_token.as_deref().unwrap_or(&self.user_id)
    }
}

/// Machine-readable status, printed by `jielong status --json`.
#[derive(Debug, Clone, Serialize)]
pub struct BotStatus {
    pub name: String,
    pub dictionary_words: usize,
    pub stored_sessions: usize,
    pub lookup_enabled: bool,
    pub counter_word: crate::config::CounterWordPolicy,
    pub start_mode: crate::config::StartMode,
    pub track_used_words: bool,
    pub min_word_chars: usize,
    pub metrics: metrics::Snapshot,
}

/// # Chat Bot - message routing shell
///
/// Owns the [`GameEngine`] and a [`ReplySink`]. Each inbound message is validated, handed to the
/// engine, and the reply is delivered best-effort:
///
/// ```text
/// IncomingMessage ──→ ChatBot ──→ GameEngine ──→ reply text ──→ ReplySink
/// ```
///
/// [`ChatBot::run`] drives a channel of inbound messages, processing each on its own task so
/// different users are served in parallel while each user's messages keep their arrival order.
/// It stops when the channel closes or Ctrl-C arrives; messages already queued at Ctrl-C are
/// still answered.
pub struct ChatBot {
    config: Config,
    engine: Arc<GameEngine>,
    sink: Arc<dyn ReplySink>,
}

impl ChatBot {
    /// Load the dictionary and open the session store. Either failing is fatal.
    pub fn new(config: Config, sink: Arc<dyn ReplySink>) -> Result<Self> {
        let engine = GameEngine::from_config(&config).context("failed to initialise game engine")?;
        Ok(Self::with_parts(config, Arc::new(engine), sink))
    }

    /// Assemble a bot from an already-built engine.
    pub fn with_parts(config: Config, engine: Arc<GameEngine>, sink: Arc<dyn ReplySink>) -> Self {
        Self {
            config,
            engine,
            sink,
        }
    }

    pub fn engine(&self) -> &Arc<GameEngine> {
        &self.engine
    }

    /// Process one message and deliver its reply. Returns the reply text.
    ///
    /// A malformed user id is refused before the engine sees it. Delivery failures are logged
    /// and do not undo the session change that produced the reply.
    pub async fn route_text_event(&self, msg: IncomingMessage) -> Result<String> {
        if let Err(e) = validate_user_id(&msg.user_id) {
            sec_log!("refusing message from invalid user id '{}': {}", escape_log(&msg.user_id), e);
            return Err(anyhow!("invalid user id: {}", e));
        }
        let text = normalize_message(&msg.text);
        debug!("<- {}: {}", short_user(&msg.user_id), escape_log(&text));

        let reply = self.engine.handle_message(&msg.user_id, &text).await;

        debug!("-> {}: {}", short_user(&msg.user_id), escape_log(&reply));
        if let Err(e) = self.sink.deliver(msg.destination(), &reply).await {
            warn!("reply delivery to {} failed: {:#}", short_user(&msg.user_id), e);
        }
        Ok(reply)
    }

    /// Serve messages from `rx` until it closes or Ctrl-C is received, then finish every
    /// accepted message and shut down.
    pub async fn run(self: Arc<Self>, rx: mpsc::UnboundedReceiver<IncomingMessage>) -> Result<()> {
        self.run_until(rx, async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Received shutdown signal"),
                Err(e) => {
                    warn!("cannot listen for Ctrl-C: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        })
        .await
    }

    /// Like [`ChatBot::run`], with `shutdown` in place of Ctrl-C.
    ///
    /// Once `shutdown` completes the channel is closed to new senders; messages already queued
    /// are still answered before the loop returns.
    pub async fn run_until<F>(
        self: Arc<Self>,
        mut rx: mpsc::UnboundedReceiver<IncomingMessage>,
        shutdown: F,
    ) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        info!(
            "{} started: {} words, start mode {:?}, counter-word {:?}",
            self.config.bot.name,
            self.engine.dictionary().len(),
            self.config.game.start_mode,
            self.config.game.counter_word
        );

        // Last task per user; each new message for that user waits on it so replies stay in order.
        let mut in_flight: HashMap<String, JoinHandle<()>> = HashMap::new();
        let mut housekeeping = tokio::time::interval(HOUSEKEEPING_INTERVAL);
        housekeeping.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                msg = rx.recv() => {
                    let Some(msg) = msg else {
                        info!("Inbound channel closed");
                        break;
                    };
                    self.dispatch(&mut in_flight, msg);
                }

                _ = housekeeping.tick() => {
                    in_flight.retain(|_, handle| !handle.is_finished());
                    let pruned = self.engine.prune_idle_locks();
                    if pruned > 0 {
                        debug!("pruned {} idle user locks", pruned);
                    }
                }

                _ = &mut shutdown => {
                    rx.close();
                    let mut drained = 0usize;
                    while let Some(msg) = rx.recv().await {
                        self.dispatch(&mut in_flight, msg);
                        drained += 1;
                    }
                    if drained > 0 {
                        info!("answering {} queued messages before shutdown", drained);
                    }
                    break;
                }
            }
        }

        for (_, handle) in in_flight.drain() {
            if let Err(e) = handle.await {
                warn!("message task failed: {}", e);
            }
        }
        self.shutdown();
        Ok(())
    }

    /// Spawn `msg` behind the previous task of the same user.
    fn dispatch(self: &Arc<Self>, in_flight: &mut HashMap<String, JoinHandle<()>>, msg: IncomingMessage) {
        let previous = in_flight.remove(&msg.user_id);
        let user_id = msg.user_id.clone();
        let bot = Arc::clone(self);
        let handle = tokio::spawn(async move {
            if let Some(previous) = previous {
                if let Err(e) = previous.await {
                    warn!("message task failed: {}", e);
                }
            }
            if let Err(e) = bot.route_text_event(msg).await {
                warn!("route_text_event error: {e:#}");
            }
        });
        in_flight.insert(user_id, handle);
    }

    pub fn status(&self) -> Result<BotStatus> {
        let stored_sessions = self
            .engine
            .store()
            .session_count()
            .context("failed to count stored sessions")?;
        Ok(BotStatus {
            name: self.config.bot.name.clone(),
            dictionary_words: self.engine.dictionary().len(),
            stored_sessions,
            lookup_enabled: self.engine.dictionary().lookup_enabled(),
            counter_word: self.config.game.counter_word,
            start_mode: self.config.game.start_mode,
            track_used_words: self.config.game.track_used_words,
            min_word_chars: self.config.game.min_word_chars,
            metrics: metrics::snapshot(),
        })
    }

    pub fn status_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.status()?)?)
    }

    pub fn show_status(&self) -> Result<()> {
        let status = self.status()?;
        println!("=== {} Status ===", status.name);
        println!("Dictionary Words: {}", status.dictionary_words);
        println!("Stored Sessions: {}", status.stored_sessions);
        println!(
            "External Lookup: {}",
            if status.lookup_enabled { "enabled" } else { "disabled" }
        );
        println!("Start Mode: {:?}", status.start_mode);
        println!("Counter Word: {:?}", status.counter_word);
        println!(
            "Used-Word Tracking: {}",
            if status.track_used_words { "on" } else { "off" }
        );
        println!("Minimum Word Length: {}", status.min_word_chars);
        println!("Metrics: {}", status.metrics);
        Ok(())
    }

    fn shutdown(&self) {
        info!("Shutting down {}...", self.config.bot.name);
        info!("metrics: {}", metrics::snapshot());
    }
}
