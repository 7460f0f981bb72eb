//! Memo tables for resolver lookups
//!
//! Every cache the resolver keeps is a [`MemoTable`]: an explicit
//! lookup / store / invalidate map with hit and miss counters. Lookups
//! and stores are separate calls so a value can be computed while no borrow
//! of the table is held.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

/// Memoized values keyed by `K`
#[derive(Debug)]
pub struct MemoTable<K, V> {
    entries: HashMap<K, V>,
    stats: MemoStats,
}

/// Memo table statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoStats {
    /// Lookups answered from the table
    pub hits: u64,
    /// Lookups that found nothing
    pub misses: u64,
    /// Entries dropped by invalidation or clearing
    pub invalidated: u64,
}

impl<K: Eq + Hash, V: Clone> MemoTable<K, V> {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            stats: MemoStats::default(),
        }
    }

    /// Look up a memoized value, counting the hit or miss
    pub fn lookup<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        match self.entries.get(key) {
            Some(value) => {
                self.stats.hits += 1;
                Some(value.clone())
            },
            None => {
                self.stats.misses += 1;
                None
            },
        }
    }

    /// Store a computed value and hand it back
    pub fn store(&mut self, key: K, value: V) -> V {
        self.entries.insert(key, value.clone());
        value
    }

    /// Look up `key`, computing and storing the value on a miss.
    ///
    /// `compute` must not touch this table.
    pub fn get_or_try_insert_with<E>(
        &mut self,
        key: K,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(value) = self.lookup(&key) {
            return Ok(value);
        }
        let value = compute()?;
        Ok(self.store(key, value))
    }

    /// Drop one entry
    pub fn invalidate<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.stats.invalidated += 1;
        }
        removed
    }

    /// Rewrite entries in place; entries for which `f` returns false are dropped
    pub fn retain(&mut self, mut f: impl FnMut(&K, &mut V) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, value| f(key, value));
        let removed = before - self.entries.len();
        self.stats.invalidated += removed as u64;
        removed
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.stats.invalidated += self.entries.len() as u64;
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> MemoStats {
        self.stats
    }
}

impl<K: Eq + Hash, V: Clone> Default for MemoTable<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
