//! Outbound reply delivery.
//!
//! The game never talks to a chat platform directly; the bot hands each reply to a
//! [`ReplySink`]. Delivery is best-effort: a failure is logged by the caller and the session
//! change that produced the reply stands.
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Mutex;
use tokio::io::AsyncWriteExt;

#[async_trait]
pub trait ReplySink: Send + Sync {
    /// Send `text` to `destination` (a user id or a platform reply token).
    async fn deliver(&self, destination: &str, text: &str) -> Result<()>;
}

/// Writes replies to stdout as `destination<TAB>text` lines.
#[derive(Debug, Default)]
pub struct ConsoleSink;

#[async_trait]
impl ReplySink for ConsoleSink {
    async fn deliver(&self, destination: &str, text: &str) -> Result<()> {
        let line = format!("{}\t{}\n", destination, text);
        let mut out = tokio::io::stdout();
        out.write_all(line.as_bytes()).await?;
        out.flush().await?;
        Ok(())
    }
}

/// Collects replies in memory instead of sending them.
#[derive(Debug, Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<(String, String)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything delivered so far, in order.
    pub fn messages(&self) -> Vec<(String, String)> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

#[async_trait]
impl ReplySink for RecordingSink {
    async fn deliver(&self, destination: &str, text: &str) -> Result<()> {
        let mut guard = self
            .messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.push((destination.to_string(), text.to_string()));
        Ok(())
    }
}
