//! External dictionary lookup used to accept words missing from the word list.
//!
//! The default HTTP implementation targets services that answer a per-word URL with a JSON
//! document when the word exists and `404` when it does not (the MOE dictionary mirror at
//! `moedict.tw` behaves this way). Results are cached in-process for `cache_ttl_minutes`.
//!
//! Callers treat any error as "not a word"; see [`super::DictionaryService::validate_externally`]
//! for the timeout wrapper that bounds every lookup.

use anyhow::Result;
use async_trait::async_trait;

/// A reference source that can vouch for words the local list does not know.
#[async_trait]
pub trait WordValidator: Send + Sync {
    /// `Ok(true)` when the source knows `word`, `Ok(false)` when it clearly does not,
    /// `Err` when the source could not answer.
    async fn lookup(&self, word: &str) -> Result<bool>;
}

#[cfg(feature = "lookup")]
pub use http::HttpLookup;

#[cfg(feature = "lookup")]
mod http {
    use super::WordValidator;
    use crate::config::LookupConfig;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use log::debug;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    /// Cached lookup verdicts are bounded so a flood of junk words cannot grow memory forever.
    const MAX_CACHE_ENTRIES: usize = 4096;

    #[derive(Debug, Clone, Copy)]
    struct CacheEntry {
        fetched_at: Instant,
        known: bool,
    }

    /// HTTP-backed word validator.
    ///
    /// Requests carry no timeout of their own; the owning
    /// [`DictionaryService`](crate::dictionary::DictionaryService) bounds each lookup with
    /// `lookup.timeout_seconds`.
    pub struct HttpLookup {
        config: LookupConfig,
        client: reqwest::Client,
        cache: Mutex<HashMap<String, CacheEntry>>,
    }

    impl HttpLookup {
        pub fn new(config: LookupConfig) -> Result<Self> {
            let client = reqwest::Client::builder()
                .user_agent(concat!("jielong/", env!("CARGO_PKG_VERSION")))
                .build()
                .map_err(|e| anyhow!("Failed to build HTTP client: {}", e))?;
            Ok(Self {
                config,
                client,
                cache: Mutex::new(HashMap::new()),
            })
        }

        /// Substitute the percent-encoded word into the configured template.
        pub fn build_url(&self, word: &str) -> String {
            self.config
                .url_template
                .replace("{word}", &urlencoding::encode(word))
        }

        fn cache_ttl(&self) -> Duration {
            Duration::from_secs(self.config.cache_ttl_minutes as u64 * 60)
        }

        fn cached(&self, word: &str) -> Option<bool> {
            let ttl = self.cache_ttl();
            if ttl.is_zero() {
                return None;
            }
            let guard = self.cache.lock().ok()?;
            guard
                .get(word)
                .filter(|entry| entry.fetched_at.elapsed() < ttl)
                .map(|entry| entry.known)
        }

        fn remember(&self, word: &str, known: bool) {
            if self.cache_ttl().is_zero() {
                return;
            }
            if let Ok(mut guard) = self.cache.lock() {
                if guard.len() >= MAX_CACHE_ENTRIES {
                    let ttl = self.cache_ttl();
                    guard.retain(|_, entry| entry.fetched_at.elapsed() < ttl);
                    if guard.len() >= MAX_CACHE_ENTRIES {
                        guard.clear();
                    }
                }
                guard.insert(
                    word.to_string(),
                    CacheEntry {
                        fetched_at: Instant::now(),
                        known,
                    },
                );
            }
        }

        async fn fetch(&self, word: &str) -> Result<bool> {
            let url = self.build_url(word);
            debug!("Looking up word at: {}", url);

            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| anyhow!("HTTP request failed: {}", e))?;

            let status = response.status();
            if status == reqwest::StatusCode::NOT_FOUND {
                return Ok(false);
            }
            if !status.is_success() {
                return Err(anyhow!("Lookup service returned status: {}", status));
            }

            let body: serde_json::Value = response
                .json()
                .await
                .map_err(|e| anyhow!("Failed to parse lookup response: {}", e))?;
            Ok(body.as_object().map(|o| !o.is_empty()).unwrap_or(false))
        }
    }

    #[async_trait]
    impl WordValidator for HttpLookup {
        async fn lookup(&self, word: &str) -> Result<bool> {
            if let Some(known) = self.cached(word) {
                debug!("Returning cached lookup verdict for {}: {}", word, known);
                return Ok(known);
            }
            let known = self.fetch(word).await?;
            self.remember(word, known);
            Ok(known)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::dictionary::{DictionaryService, MemoryWordStore};
        use std::sync::Arc;

        fn config() -> LookupConfig {
            LookupConfig {
                enabled: true,
                url_template: "https://dict.example.invalid/a/{word}.json".into(),
                timeout_seconds: 1,
                cache_ttl_minutes: 5,
            }
        }

        #[test]
        fn url_percent_encodes_the_word() {
            let lookup = HttpLookup::new(config()).unwrap();
            assert_eq!(
                lookup.build_url("天長地久"),
                "https://dict.example.invalid/a/%E5%A4%A9%E9%95%B7%E5%9C%B0%E4%B9%85.json"
            );
        }

        #[test]
        fn cache_answers_without_network() {
            let lookup = HttpLookup::new(config()).unwrap();
            lookup.remember("久而久之", true);
            lookup.remember("亂七八糟糟", false);
            let known = tokio_test::block_on(lookup.lookup("久而久之")).unwrap();
            let unknown = tokio_test::block_on(lookup.lookup("亂七八糟糟")).unwrap();
            assert!(known);
            assert!(!unknown);
            assert!(lookup.cached("一心一意").is_none());
        }

        #[test]
        fn zero_ttl_disables_cache() {
            let mut cfg = config();
            cfg.cache_ttl_minutes = 0;
            let lookup = HttpLookup::new(cfg).unwrap();
            lookup.remember("久而久之", true);
            assert!(lookup.cached("久而久之").is_none());
        }

        #[tokio::test]
        async fn silent_server_is_cut_off_by_service_timeout() {
            // Accepts connections and never answers.
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                let mut held = Vec::new();
                while let Ok((socket, _)) = listener.accept().await {
                    held.push(socket);
                }
            });

            let mut cfg = config();
            cfg.url_template = format!("http://{}/a/{{word}}.json", addr);
            cfg.cache_ttl_minutes = 0;
            let service = DictionaryService::load(Arc::new(MemoryWordStore::new(["天長地久"])))
                .unwrap()
                .with_validator(
                    Arc::new(HttpLookup::new(cfg).unwrap()),
                    Duration::from_millis(200),
                );

            let started = Instant::now();
            assert!(!service.validate_externally("久而久之").await);
            assert!(started.elapsed() < Duration::from_secs(5));
        }
    }
}
