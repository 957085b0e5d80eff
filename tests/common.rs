//! Test utilities & fixtures.
//! Provides access to the integration word list under `tests/test-data-int`.
#![allow(dead_code)] // Each test binary uses a different subset of these helpers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use jielong::config::{Config, GameConfig, StorageBackend};
use jielong::dictionary::{DictionaryService, MemoryWordStore};
use jielong::game::GameEngine;
use jielong::storage::MemorySessionStore;

/// Return the path to the static integration test fixture directory.
pub fn fixture_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("test-data-int")
}

/// Return a writable temp dir holding a copy of the fixture word list as `words.txt`.
pub fn writable_fixture() -> tempfile::TempDir {
    let tmp = tempfile::tempdir().expect("tempdir");
    std::fs::copy(
        fixture_root().join("words.txt"),
        tmp.path().join("words.txt"),
    )
    .unwrap();
    tmp
}

/// Config rooted in `dir`: word list at `dir/words.txt`, sessions under `dir/data`, no log file.
pub fn config_in(dir: &Path, backend: StorageBackend) -> Config {
    let mut config = Config::default();
    config.dictionary.words_file = dir.join("words.txt").to_string_lossy().to_string();
    config.storage.backend = backend;
    config.storage.data_dir = dir.join("data").to_string_lossy().to_string();
    config.logging.file = None;
    config
}

/// Engine over an in-memory word list and in-memory sessions.
pub fn memory_engine(words: &[&str], rules: GameConfig) -> GameEngine {
    let dict = DictionaryService::load(Arc::new(MemoryWordStore::new(words.iter().copied())))
        .unwrap();
    GameEngine::new(
        &Config::default().bot,
        rules,
        Arc::new(dict),
        Arc::new(MemorySessionStore::new()),
    )
}
