use std::num::NonZeroUsize;

use lru::LruCache;

pub const DEFAULT_CACHE_CAPACITY: usize = 1500;

/// Identity of one translation result: the target language paired with the
/// exact source text. Equality is plain string equality; trimming happens
/// upstream in the adapters.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    language: String,
    text: String,
}

impl CacheKey {
    pub fn new(language: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            text: text.into(),
        }
    }
}

/// Bounded least-recently-used map from cache keys to translated text.
///
/// Eviction happens only when an insert pushes the map past capacity, and
/// then exactly one entry (the least recently used) is discarded. There is
/// no time-based expiry.
pub struct TranslationCache {
    entries: LruCache<CacheKey, String>,
}

impl TranslationCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity)
            .unwrap_or_else(|| NonZeroUsize::new(DEFAULT_CACHE_CAPACITY).unwrap());
        Self {
            entries: LruCache::new(capacity),
        }
    }

    /// Returns the cached translation and marks it most recently used.
    pub fn get(&mut self, key: &CacheKey) -> Option<String> {
        self.entries.get(key).cloned()
    }

    /// Inserts or overwrites an entry and marks it most recently used.
    pub fn put(&mut self, key: CacheKey, translated: String) {
        self.entries.put(key, translated);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}
