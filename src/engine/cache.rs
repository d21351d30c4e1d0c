//! Per-tick pairwise distance cache
//!
//! Agent-to-agent distances are symmetric, so each unordered pair is keyed
//! by `(min, max)` and computed once per tick. The map is concurrent: worker
//! threads race to insert, and because the computation is deterministic a
//! duplicate insert writes the same value, so last-write-wins is harmless.

use dashmap::DashMap;

/// Symmetric distance cache keyed by unordered agent-id pairs.
#[derive(Debug, Default)]
pub struct PairwiseCache {
    distances: DashMap<(usize, usize), f32, ahash::RandomState>,
}

impl PairwiseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all cached pairs. Called at the start of every tick.
    pub fn clear(&self) {
        self.distances.clear();
    }

    /// Distance between agents `i` and `j`, computing it via `compute` on a
    /// cache miss.
    pub fn distance<F>(&self, i: usize, j: usize, compute: F) -> f32
    where
        F: FnOnce() -> f32,
    {
        let key = (i.min(j), i.max(j));
        if let Some(cached) = self.distances.get(&key) {
            return *cached;
        }
        let value = compute();
        self.distances.insert(key, value);
        value
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.distances.len()
    }
}
