/*!
 * Translation caching functionality.
 *
 * Documents repeat themselves (table headers, boilerplate lines, list
 * labels), so identical text is translated once per service lifetime.
 */

use log::debug;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Cache key combining source text, source language, and target language
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    source_text: String,
    source_language: String,
    target_language: String,
}

impl CacheKey {
    fn new(source_text: &str, source_language: &str, target_language: &str) -> Self {
        Self {
            source_text: source_text.to_string(),
            source_language: source_language.to_lowercase(),
            target_language: target_language.to_lowercase(),
        }
    }
}

#[derive(Debug, Default)]
struct CacheCounters {
    hits: AtomicUsize,
    misses: AtomicUsize,
}

/// Translation cache shared by clones of the same service
#[derive(Debug, Clone)]
pub struct TranslationCache {
    entries: Arc<RwLock<HashMap<CacheKey, String>>>,
    counters: Arc<CacheCounters>,
    enabled: bool,
}

impl TranslationCache {
    /// Create a new translation cache
    pub fn new(enabled: bool) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            counters: Arc::new(CacheCounters::default()),
            enabled,
        }
    }

    /// Get a translation from the cache
    pub fn get(&self, source_text: &str, source_language: &str, target_language: &str) -> Option<String> {
        if !self.enabled {
            return None;
        }

        let key = CacheKey::new(source_text, source_language, target_language);
        let found = self.entries.read().get(&key).cloned();
        match &found {
            Some(_) => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                debug!(
                    "Cache hit for '{}' ({} -> {})",
                    crate::providers::preview(source_text),
                    source_language,
                    target_language
                );
            }
            None => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
            }
        }
        found
    }

    /// Store a translation in the cache
    pub fn store(&self, source_text: &str, source_language: &str, target_language: &str, translation: &str) {
        if !self.enabled {
            return;
        }
        let key = CacheKey::new(source_text, source_language, target_language);
        self.entries.write().insert(key, translation.to_string());
    }

    /// Hits, misses and hit rate
    pub fn stats(&self) -> (usize, usize, f64) {
        let hits = self.counters.hits.load(Ordering::Relaxed);
        let misses = self.counters.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 { hits as f64 / total as f64 } else { 0.0 };
        (hits, misses, hit_rate)
    }

    /// Clear entries and counters
    pub fn clear(&self) {
        self.entries.write().clear();
        self.counters.hits.store(0, Ordering::Relaxed);
        self.counters.misses.store(0, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::new(true)
    }
}
