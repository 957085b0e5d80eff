//! # Jielong - a Chinese word-chain (接龍) chat bot
//!
//! Players and the bot take turns naming words or idioms; every word must begin with the last
//! character of the previous one. The bot answers each accepted word with a continuation from
//! its dictionary and concedes when it has none left.
//!
//! ## Features
//!
//! - **Per-user rounds**: start, give up, help and status commands with configurable phrases.
//! - **Dictionary**: per-character index over a plain-text word list, learning new words that an
//!   optional external lookup (feature `lookup`) confirms.
//! - **Policies**: first-in-order or random counter-words, optional no-repeat rule, user-first or
//!   bot-seeded openings.
//! - **Persistence**: in-memory or sled-backed sessions with versioned records.
//! - **Async Design**: per-user serialization with parallel handling of different users.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use jielong::bot::{ChatBot, ConsoleSink, IncomingMessage};
//! use jielong::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let bot = ChatBot::new(config, Arc::new(ConsoleSink))?;
//!     bot.route_text_event(IncomingMessage::new("U123", "開始")).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`bot`] - message routing shell, run loop and reply sinks
//! - [`game`] - sessions, commands, replies and the turn engine
//! - [`dictionary`] - word index, word-list persistence and external lookup
//! - [`storage`] - session stores
//! - [`config`] - configuration management and validation
//! - [`validation`] - inbound message checks
//!
//! ```text
//! ┌─────────────────┐
//! │    Chat Bot     │ ← routing and delivery
//! └─────────────────┘
//!          │
//! ┌─────────────────┐    ┌─────────────────┐
//! │   Game Engine   │───→│   Dictionary    │
//! └─────────────────┘    └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │  Session Store  │ ← memory or sled
//! └─────────────────┘
//! ```

pub mod bot;
pub mod config;
pub mod dictionary;
pub mod game;
pub mod logutil;
pub mod metrics;
pub mod storage;
pub mod validation;
