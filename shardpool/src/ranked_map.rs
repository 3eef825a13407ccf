//! Hash map with an ordered secondary index over values.
//!
//! Supports O(1) lookup by key plus O(log n) access to the entry with the
//! lowest value, which is what the fault log needs for trim-by-count and
//! evict-by-age.

use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;

#[derive(Debug, Default)]
pub struct RankedMap<K, V> {
    by_key: HashMap<K, V>,
    by_value: BTreeSet<(V, K)>,
}

impl<K, V> RankedMap<K, V>
where
    K: Eq + Hash + Ord + Clone,
    V: Ord + Copy,
{
    pub fn new() -> Self {
        Self {
            by_key: HashMap::new(),
            by_value: BTreeSet::new(),
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.by_key.get(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.by_key.contains_key(key)
    }

    /// The entry whose value orders lowest (ties broken by key order).
    pub fn lowest(&self) -> Option<(&K, V)> {
        self.by_value.first().map(|(v, k)| (k, *v))
    }

    /// Insert or overwrite `key`, keeping both views consistent.
    pub fn update(&mut self, key: K, value: V) {
        if let Some(old) = self.by_key.insert(key.clone(), value) {
            if old == value {
                return;
            }
            self.by_value.remove(&(old, key.clone()));
        }
        self.by_value.insert((value, key));
    }

    pub fn remove(&mut self, key: &K) {
        if let Some(old) = self.by_key.remove(key) {
            self.by_value.remove(&(old, key.clone()));
        }
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.by_key.iter()
    }
}
