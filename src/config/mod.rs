//! # Configuration Management Module
//!
//! Centralized, typed configuration for the word-chain bot, loaded from a TOML file.
//!
//! ## Configuration Structure
//!
//! - [`BotConfig`] - Bot identity and the command phrases it listens for
//! - [`GameConfig`] - Rule policies (counter-word choice, repeat tracking, start mode)
//! - [`DictionaryConfig`] - Word list location and learning behavior
//! - [`LookupConfig`] - Optional external dictionary used to accept unknown words
//! - [`StorageConfig`] - Session store backend
//! - [`LoggingConfig`] - Logging settings
//!
//! Every section carries defaults, so a config file only needs the keys it changes.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use jielong::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     println!("Bot: {}", config.bot.name);
//!     println!("Word list: {}", config.dictionary.words_file);
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! ```toml
//! [bot]
//! name = "接龍機器人"
//! start_phrases = ["開始", "開始接龍", "start"]
//!
//! [game]
//! counter_word = "random"
//! track_used_words = true
//! start_mode = "bot_seeded"
//!
//! [dictionary]
//! words_file = "words.txt"
//!
//! [lookup]
//! enabled = true
//! url_template = "https://www.moedict.tw/a/{word}.json"
//! timeout_seconds = 3
//!
//! [storage]
//! backend = "sled"
//! data_dir = "./data"
//! ```

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub dictionary: DictionaryConfig,
    #[serde(default)]
    pub lookup: LookupConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Bot identity and command phrases. Phrases match the whole trimmed message, ignoring ASCII case.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub name: String,
    pub start_phrases: Vec<String>,
    pub quit_phrases: Vec<String>,
    pub help_phrases: Vec<String>,
    pub status_phrases: Vec<String>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "接龍機器人".to_string(),
            start_phrases: vec!["開始".into(), "開始接龍".into(), "start".into()],
            quit_phrases: vec![
                "結束".into(),
                "認輸".into(),
                "不玩了".into(),
                "quit".into(),
                "give up".into(),
            ],
            help_phrases: vec!["說明".into(), "規則".into(), "help".into()],
            status_phrases: vec!["狀態".into(), "status".into()],
        }
    }
}

/// How the bot picks its reply among the candidate words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CounterWordPolicy {
    /// First candidate in dictionary order (deterministic).
    #[default]
    First,
    /// Uniformly random candidate.
    Random,
}

/// Who plays the first word of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StartMode {
    /// The user opens with any dictionary word.
    #[default]
    UserFirst,
    /// The bot seeds the chain with a random dictionary word.
    BotSeeded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Minimum word length in characters (not bytes).
    pub min_word_chars: usize,
    pub counter_word: CounterWordPolicy,
    /// Reject words already played in the current round.
    pub track_used_words: bool,
    pub start_mode: StartMode,
    /// Append the running score to the bot's replies.
    pub show_score: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            min_word_chars: 2,
            counter_word: CounterWordPolicy::First,
            track_used_words: true,
            start_mode: StartMode::UserFirst,
            show_score: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DictionaryConfig {
    /// UTF-8 word list, one word per line. Relative paths resolve against the working directory.
    pub words_file: String,
    /// Persist words accepted through external lookup back to `words_file`.
    pub persist_learned_words: bool,
}

impl Default for DictionaryConfig {
    fn default() -> Self {
        Self {
            words_file: "words.txt".to_string(),
            persist_learned_words: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Consult the external dictionary for words missing from the word list.
    pub enabled: bool,
    /// Request URL; `{word}` is replaced by the percent-encoded word.
    pub url_template: String,
    /// Upper bound for a single lookup, including connection setup.
    pub timeout_seconds: u32,
    /// How long lookup results are remembered (0 disables the cache).
    pub cache_ttl_minutes: u32,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url_template: "https://www.moedict.tw/a/{word}.json".to_string(),
            timeout_seconds: 3,
            cache_ttl_minutes: 60,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Ephemeral sessions, lost on restart.
    Memory,
    /// Durable sessions in a sled database under `data_dir`.
    #[default]
    Sled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sled,
            data_dir: "./data".to_string(),
        }
    }
}

impl StorageConfig {
    /// Location of the sled session database.
    pub fn sessions_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join("sessions")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: Some("jielong.log".to_string()),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    /// Reject settings the game cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.game.min_word_chars < 1 {
            return Err(anyhow!("game.min_word_chars must be at least 1"));
        }
        if self.bot.start_phrases.iter().all(|p| p.trim().is_empty()) {
            return Err(anyhow!("bot.start_phrases must contain at least one phrase"));
        }
        if self.lookup.enabled {
            if !self.lookup.url_template.contains("{word}") {
                return Err(anyhow!(
                    "lookup.url_template must contain a {{word}} placeholder"
                ));
            }
            if self.lookup.timeout_seconds == 0 {
                return Err(anyhow!("lookup.timeout_seconds must be greater than 0"));
            }
        }
        Ok(())
    }
}
