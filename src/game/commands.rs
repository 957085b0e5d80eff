//! Chat command recognition.
//!
//! Commands are whole-message phrases (e.g. `開始`, `認輸`, `help`) compared after trimming and
//! ignoring ASCII case, so `START` and `Start` both start a round. Anything that is not a
//! command is gameplay text. Phrases come from `[bot]` in the config.
use log::trace;

use crate::config::BotConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameCommand {
    Start,
    Quit,
    Help,
    Status,
    /// Gameplay text (a candidate word), already trimmed.
    Play(String),
}

/// Minimal command parser over configured phrase lists
#[derive(Debug, Clone)]
pub struct CommandParser {
    start: Vec<String>,
    quit: Vec<String>,
    help: Vec<String>,
    status: Vec<String>,
}

fn clean(phrases: &[String]) -> Vec<String> {
    phrases
        .iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

fn matches_any(phrases: &[String], text: &str) -> bool {
    phrases.iter().any(|p| p.eq_ignore_ascii_case(text))
}

impl CommandParser {
    pub fn new(config: &BotConfig) -> Self {
        Self {
            start: clean(&config.start_phrases),
            quit: clean(&config.quit_phrases),
            help: clean(&config.help_phrases),
            status: clean(&config.status_phrases),
        }
    }

    pub fn parse(&self, raw: &str) -> GameCommand {
        let text = raw.trim();
        // Start wins over the other lists if an operator configures overlapping phrases.
        if matches_any(&self.start, text) {
            trace!("Parsed START from '{}'", raw);
            return GameCommand::Start;
        }
        if matches_any(&self.quit, text) {
            trace!("Parsed QUIT from '{}'", raw);
            return GameCommand::Quit;
        }
        if matches_any(&self.help, text) {
            trace!("Parsed HELP from '{}'", raw);
            return GameCommand::Help;
        }
        if matches_any(&self.status, text) {
            trace!("Parsed STATUS from '{}'", raw);
            return GameCommand::Status;
        }
        GameCommand::Play(text.to_string())
    }

    /// Phrase shown to users when prompting them to start.
    pub fn primary_start_phrase(&self) -> &str {
        self.start.first().map(String::as_str).unwrap_or("開始")
    }

    /// Phrase shown to users for giving up.
    pub fn primary_quit_phrase(&self) -> &str {
        self.quit.first().map(String::as_str).unwrap_or("結束")
    }
}

impl Default for CommandParser {
    fn default() -> Self {
        Self::new(&BotConfig::default())
    }
}
