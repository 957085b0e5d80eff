//! Backing word list for the dictionary.
//!
//! The canonical format is a UTF-8 text file with one word per line. Surrounding whitespace is
//! trimmed, blank lines and `#` comment lines are skipped. Words learned at runtime are appended
//! under an exclusive `fs2` lock so concurrent bot processes sharing one file never interleave
//! partial lines.

use anyhow::{anyhow, Context, Result};
use fs2::FileExt;
use std::fs::{self, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Persistence for the dictionary's word list.
pub trait WordStore: Send + Sync {
    /// Read every word available at startup, in file order. Missing or unreadable storage is an error.
    fn load_initial_words(&self) -> Result<Vec<String>>;

    /// Durably record a newly learned word.
    fn append_word(&self, word: &str) -> Result<()>;
}

/// Parse word list text into words, keeping first occurrence order.
pub fn parse_word_list(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.trim().trim_start_matches('\u{feff}'))
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Word list stored in a plain text file.
#[derive(Debug, Clone)]
pub struct WordListFile {
    path: PathBuf,
}

impl WordListFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a starter list, refusing to overwrite an existing file.
    pub fn create_with(&self, words: &[&str]) -> Result<bool> {
        if self.path.exists() {
            return Ok(false);
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut body = words.join("\n");
        body.push('\n');
        fs::write(&self.path, body)
            .with_context(|| format!("Failed to write word list {}", self.path.display()))?;
        Ok(true)
    }
}

impl WordStore for WordListFile {
    fn load_initial_words(&self) -> Result<Vec<String>> {
        let text = fs::read_to_string(&self.path)
            .map_err(|e| anyhow!("Failed to read word list {}: {}", self.path.display(), e))?;
        Ok(parse_word_list(&text))
    }

    fn append_word(&self, word: &str) -> Result<()> {
        let mut f = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open word list {}", self.path.display()))?;
        f.lock_exclusive()?;
        // A hand-edited file may lack its final newline; never glue the new word onto the last one.
        let len = f.metadata()?.len();
        let mut needs_newline = false;
        if len > 0 {
            f.seek(SeekFrom::Start(len - 1))?;
            let mut last = [0u8; 1];
            f.read_exact(&mut last)?;
            needs_newline = last[0] != b'\n';
        }
        let mut line = String::with_capacity(word.len() + 2);
        if needs_newline {
            line.push('\n');
        }
        line.push_str(word);
        line.push('\n');
        let result = f.write_all(line.as_bytes()).and_then(|_| f.sync_data());
        let _ = f.unlock();
        result.with_context(|| format!("Failed to append to word list {}", self.path.display()))
    }
}

/// In-memory word store for tests and ephemeral deployments.
#[derive(Debug, Default)]
pub struct MemoryWordStore {
    words: Mutex<Vec<String>>,
}

impl MemoryWordStore {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: Mutex::new(words.into_iter().map(Into::into).collect()),
        }
    }

    /// Everything stored so far, including appended words.
    pub fn words(&self) -> Vec<String> {
        self.words
            .lock()
            .map(|w| w.clone())
            .unwrap_or_default()
    }
}

impl WordStore for MemoryWordStore {
    fn load_initial_words(&self) -> Result<Vec<String>> {
        self.words
            .lock()
            .map(|w| w.clone())
            .map_err(|_| anyhow!("word store lock poisoned"))
    }

    fn append_word(&self, word: &str) -> Result<()> {
        self.words
            .lock()
            .map_err(|_| anyhow!("word store lock poisoned"))?
            .push(word.to_string());
        Ok(())
    }
}
