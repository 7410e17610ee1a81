use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;
use tracing::debug;

use super::provider::TranslationProvider;
use crate::error::FetchError;
use crate::model::translation::TranslationEntry;

#[derive(Debug, Default)]
struct CacheInner {
    map: HashMap<String, Vec<TranslationEntry>>,
    // Least recently used at the front.
    order: VecDeque<String>,
}

impl CacheInner {
    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            if let Some(k) = self.order.remove(pos) {
                self.order.push_back(k);
            }
        }
    }
}

/// Bounded LRU of successful lookups, keyed by exact token text.
#[derive(Debug)]
pub struct TranslationCache {
    capacity: usize,
    inner: Mutex<CacheInner>,
}

impl TranslationCache {
    /// A capacity of zero disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(CacheInner::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, token: &str) -> Option<Vec<TranslationEntry>> {
        let mut inner = self.inner.lock();
        let hit = inner.map.get(token).cloned();
        if hit.is_some() {
            inner.touch(token);
        }
        hit
    }

    pub fn insert(&self, token: &str, entries: Vec<TranslationEntry>) {
        if self.capacity == 0 {
            return;
        }

        let mut inner = self.inner.lock();
        if inner.map.insert(token.to_string(), entries).is_some() {
            inner.touch(token);
            return;
        }

        inner.order.push_back(token.to_string());
        while inner.order.len() > self.capacity {
            if let Some(evicted) = inner.order.pop_front() {
                inner.map.remove(&evicted);
                debug!(token = %evicted, "evicted cached translation");
            }
        }
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.map.clear();
        inner.order.clear();
    }
}

/// Serves repeated tokens from a [`TranslationCache`] before asking `inner`.
pub struct CachedProvider<P> {
    inner: P,
    cache: TranslationCache,
}

impl<P: TranslationProvider> CachedProvider<P> {
    pub fn new(inner: P, capacity: usize) -> Self {
        Self {
            inner,
            cache: TranslationCache::new(capacity),
        }
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }
}

impl<P: TranslationProvider> TranslationProvider for CachedProvider<P> {
    fn fetch(&self, token: &str) -> Result<Vec<TranslationEntry>, FetchError> {
        if let Some(hit) = self.cache.get(token) {
            debug!(token, "translation cache hit");
            return Ok(hit);
        }

        let entries = self.inner.fetch(token)?;
        self.cache.insert(token, entries.clone());
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Flaky {
        calls: AtomicUsize,
    }

    impl TranslationProvider for Flaky {
        fn fetch(&self, token: &str) -> Result<Vec<TranslationEntry>, FetchError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if token == "失敗" {
                return Err(FetchError::Transport(format!("attempt {n}")));
            }
            Ok(vec![TranslationEntry::new(token, format!("call {n}"))])
        }
    }

    fn entry(s: &str) -> Vec<TranslationEntry> {
        vec![TranslationEntry::new(s, s)]
    }

    #[test]
    fn least_recently_used_is_evicted() {
        let cache = TranslationCache::new(2);
        cache.insert("一", entry("1"));
        cache.insert("二", entry("2"));

        // Touch "一" so "二" becomes the eviction candidate.
        assert!(cache.get("一").is_some());
        cache.insert("三", entry("3"));

        assert_eq!(cache.len(), 2);
        assert!(cache.get("二").is_none());
        assert_eq!(cache.get("一"), Some(entry("1")));
        assert_eq!(cache.get("三"), Some(entry("3")));
    }

    #[test]
    fn reinserting_replaces_without_growing() {
        let cache = TranslationCache::new(2);
        cache.insert("一", entry("old"));
        cache.insert("一", entry("new"));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("一"), Some(entry("new")));
    }

    #[test]
    fn zero_capacity_disables_caching() {
        let cache = TranslationCache::new(0);
        cache.insert("一", entry("1"));
        assert!(cache.is_empty());
    }

    #[test]
    fn repeated_tokens_hit_the_cache_but_errors_do_not() {
        let provider = CachedProvider::new(Flaky::default(), 8);

        let first = provider.fetch("猫").unwrap();
        let second = provider.fetch("猫").unwrap();
        assert_eq!(first, second);
        assert_eq!(provider.inner.calls.load(Ordering::SeqCst), 1);

        assert!(provider.fetch("失敗").is_err());
        assert!(provider.fetch("失敗").is_err());
        assert_eq!(provider.inner.calls.load(Ordering::SeqCst), 3);

        provider.cache().clear();
        provider.fetch("猫").unwrap();
        assert_eq!(provider.inner.calls.load(Ordering::SeqCst), 4);
    }
}
