//! Macro expansion cache
//!
//! Keyed by the digest of the normalized macro definitions, so two compiles
//! that pull in the same macros share one expansion no matter what source
//! they compile. Entries are never evicted.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Lowercase hex SHA-256 of a macro definitions text
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacroDigest(String);

impl MacroDigest {
    pub fn digest(text: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        MacroDigest(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex digits, for log lines
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl fmt::Display for MacroDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lookup counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Write-once map from macro digest to the expansion result
pub struct MacroCache<T> {
    entries: HashMap<MacroDigest, T>,
    stats: CacheStats,
}

impl<T> Default for MacroCache<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::default(),
        }
    }
}

impl<T> MacroCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an entry, counting the hit or miss
    pub fn get(&mut self, key: &MacroDigest) -> Option<&T> {
        match self.entries.get(key) {
            Some(entry) => {
                self.stats.hits += 1;
                debug!(target: "ki::cache", digest = %key.short(), "hit");
                Some(entry)
            }
            None => {
                self.stats.misses += 1;
                debug!(target: "ki::cache", digest = %key.short(), "miss");
                None
            }
        }
    }

    /// Store an entry. The first value stored under a key wins.
    pub fn put(&mut self, key: MacroDigest, entry: T) {
        if self.entries.contains_key(&key) {
            debug!(target: "ki::cache", digest = %key.short(), "entry already present, keeping first");
            return;
        }
        debug!(target: "ki::cache", digest = %key.short(), entries = self.entries.len() + 1, "store");
        self.entries.insert(key, entry);
    }

    pub fn contains(&self, key: &MacroDigest) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

impl<T> fmt::Debug for MacroCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MacroCache")
            .field("entries", &self.entries.len())
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_known_values() {
        assert_eq!(
            MacroDigest::digest("").as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            MacroDigest::digest("abc").as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_digest_deterministic_and_distinct() {
        let a = MacroDigest::digest("macro swap { rule {} => {} }");
        let b = MacroDigest::digest("macro swap { rule {} => {} }");
        let c = MacroDigest::digest("macro swap { rule {} => {}}");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.short().len(), 12);
        assert_eq!(a.to_string(), a.as_str());
    }

    #[test]
    fn test_get_counts_hits_and_misses() {
        let mut cache = MacroCache::new();
        let key = MacroDigest::digest("m");
        assert!(cache.get(&key).is_none());

        cache.put(key.clone(), 1);
        assert_eq!(cache.get(&key), Some(&1));
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1 });
    }

    #[test]
    fn test_put_is_write_once() {
        let mut cache = MacroCache::new();
        let key = MacroDigest::digest("m");
        cache.put(key.clone(), "first");
        cache.put(key.clone(), "second");
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&key), Some(&"first"));
    }

    #[test]
    fn test_empty() {
        let cache: MacroCache<()> = MacroCache::new();
        assert!(cache.is_empty());
        assert!(!cache.contains(&MacroDigest::digest("x")));
    }
}
