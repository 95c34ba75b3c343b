//! Size-bucketed pool of float and boolean arrays.
//!
//! [`ArrayPool`] is shared between simulation workers behind an `Arc`.
//! A single mutex guards all buckets; it is held only for the push/pop
//! of a `Vec`, never while an array is being zeroed or used.

use std::mem::size_of;
use std::sync::{Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
use resound_core::{BoolGrid, Grid3f, SceneSize};

use crate::config::PoolConfig;
use crate::stats::PoolStats;

/// Idle arrays of one element type, keyed by length.
struct Buckets<T> {
    idle: IndexMap<usize, Vec<Vec<T>>>,
}

impl<T> Buckets<T> {
    fn new() -> Self {
        Self {
            idle: IndexMap::new(),
        }
    }

    fn take(&mut self, len: usize) -> Option<Vec<T>> {
        self.idle.get_mut(&len).and_then(Vec::pop)
    }

    fn bucket_len(&self, len: usize) -> usize {
        self.idle.get(&len).map_or(0, Vec::len)
    }

    fn put(&mut self, array: Vec<T>) {
        self.idle.entry(array.len()).or_default().push(array);
    }

    fn idle_arrays(&self) -> usize {
        self.idle.values().map(Vec::len).sum()
    }
}

struct Inner {
    floats: Buckets<f32>,
    bools: Buckets<bool>,
    stats: PoolStats,
}

/// Lends zeroed arrays and reclaims them after use.
///
/// Leasing never fails: an empty bucket falls back to a fresh
/// allocation (a *miss*). Freed arrays are cleared before they are
/// stored, so every lease starts zeroed regardless of where it came from.
pub struct ArrayPool {
    config: PoolConfig,
    inner: Mutex<Inner>,
}

impl ArrayPool {
    /// Create a pool with the default retention limits.
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    /// Create a pool with explicit retention limits.
    pub fn with_config(config: PoolConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(Inner {
                floats: Buckets::new(),
                bools: Buckets::new(),
                stats: PoolStats::default(),
            }),
        }
    }

    /// The retention limits this pool was created with.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Buckets hold only zeroed arrays, so a poisoned lock is still consistent.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lease a zeroed float array of `len` elements.
    pub fn get_float(&self, len: usize) -> Vec<f32> {
        let mut inner = self.lock();
        inner.stats.outstanding += 1;
        match inner.floats.take(len) {
            Some(array) => {
                inner.stats.hits += 1;
                inner.stats.retained_bytes -= len * size_of::<f32>();
                array
            }
            None => {
                inner.stats.misses += 1;
                drop(inner);
                log::trace!("array pool miss: f32 x {len}");
                vec![0.0; len]
            }
        }
    }

    /// Return a float array to the pool.
    pub fn free_float(&self, mut array: Vec<f32>) {
        array.fill(0.0);
        let bytes = array.len() * size_of::<f32>();
        let mut inner = self.lock();
        inner.stats.outstanding -= 1;
        let keep = inner.floats.bucket_len(array.len()) < self.config.max_arrays_per_size
            && inner.stats.retained_bytes + bytes <= self.config.max_retained_bytes;
        if keep {
            inner.stats.returned += 1;
            inner.stats.retained_bytes += bytes;
            inner.floats.put(array);
        } else {
            inner.stats.discarded += 1;
        }
    }

    /// Lease a cleared boolean array of `len` elements.
    pub fn get_bool(&self, len: usize) -> Vec<bool> {
        let mut inner = self.lock();
        inner.stats.outstanding += 1;
        match inner.bools.take(len) {
            Some(array) => {
                inner.stats.hits += 1;
                inner.stats.retained_bytes -= len * size_of::<bool>();
                array
            }
            None => {
                inner.stats.misses += 1;
                drop(inner);
                log::trace!("array pool miss: bool x {len}");
                vec![false; len]
            }
        }
    }

    /// Return a boolean array to the pool.
    pub fn free_bool(&self, mut array: Vec<bool>) {
        array.fill(false);
        let bytes = array.len() * size_of::<bool>();
        let mut inner = self.lock();
        inner.stats.outstanding -= 1;
        let keep = inner.bools.bucket_len(array.len()) < self.config.max_arrays_per_size
            && inner.stats.retained_bytes + bytes <= self.config.max_retained_bytes;
        if keep {
            inner.stats.returned += 1;
            inner.stats.retained_bytes += bytes;
            inner.bools.put(array);
        } else {
            inner.stats.discarded += 1;
        }
    }

    /// Lease a zeroed float grid of the given extents.
    pub fn lease_grid3f(&self, size: SceneSize) -> Grid3f {
        let data = self.get_float(size.len());
        match Grid3f::from_vec(size, data) {
            Ok(grid) => grid,
            // get_float always returns exactly size.len() elements.
            Err(_) => Grid3f::zeroed(size),
        }
    }

    /// Return a float grid's backing array to the pool.
    pub fn free_grid3f(&self, grid: Grid3f) {
        self.free_float(grid.into_vec());
    }

    /// Lease a cleared boolean grid of the given extents.
    pub fn lease_bool_grid(&self, size: SceneSize) -> BoolGrid {
        let data = self.get_bool(size.len());
        match BoolGrid::from_vec(size, data) {
            Ok(grid) => grid,
            Err(_) => BoolGrid::filled(size, false),
        }
    }

    /// Return a boolean grid's backing array to the pool.
    pub fn free_bool_grid(&self, grid: BoolGrid) {
        self.free_bool(grid.into_vec());
    }

    /// Current lease accounting.
    pub fn stats(&self) -> PoolStats {
        self.lock().stats.clone()
    }

    /// Number of idle arrays currently held, across both kinds.
    pub fn idle_arrays(&self) -> usize {
        let inner = self.lock();
        inner.floats.idle_arrays() + inner.bools.idle_arrays()
    }

    /// Drop every idle array.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.floats = Buckets::new();
        inner.bools = Buckets::new();
        inner.stats.retained_bytes = 0;
    }
}

impl Default for ArrayPool {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ArrayPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArrayPool")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use resound_core::Grid3;
    use std::sync::Arc;

    #[test]
    fn first_lease_is_a_miss() {
        let pool = ArrayPool::new();
        let a = pool.get_float(8);
        assert_eq!(a.len(), 8);
        let s = pool.stats();
        assert_eq!(s.misses, 1);
        assert_eq!(s.hits, 0);
        assert_eq!(s.outstanding, 1);
    }

    #[test]
    fn freed_array_is_reused_and_zeroed() {
        let pool = ArrayPool::new();
        let mut a = pool.get_float(4);
        a[2] = 7.0;
        let ptr = a.as_ptr();
        pool.free_float(a);

        let b = pool.get_float(4);
        assert_eq!(b.as_ptr(), ptr);
        assert!(b.iter().all(|&v| v == 0.0));
        let s = pool.stats();
        assert_eq!(s.hits, 1);
        assert_eq!(s.misses, 1);
        assert_eq!(s.outstanding, 1);
        assert_eq!(s.retained_bytes, 0);
    }

    #[test]
    fn different_sizes_use_different_buckets() {
        let pool = ArrayPool::new();
        let a = pool.get_float(4);
        pool.free_float(a);
        let b = pool.get_float(5);
        assert_eq!(b.len(), 5);
        assert_eq!(pool.stats().misses, 2);
        assert_eq!(pool.idle_arrays(), 1);
    }

    #[test]
    fn unfreed_lease_stays_outstanding() {
        let pool = ArrayPool::new();
        let leaked = pool.get_float(16);
        drop(leaked);
        let again = pool.get_float(16);
        let s = pool.stats();
        assert_eq!(s.misses, 2, "leaked array is never reclaimed");
        assert_eq!(s.outstanding, 2);
        pool.free_float(again);
        assert_eq!(pool.stats().outstanding, 1);
    }

    #[test]
    fn full_bucket_discards() {
        let pool = ArrayPool::with_config(PoolConfig {
            max_arrays_per_size: 1,
            ..PoolConfig::default()
        });
        let a = pool.get_float(4);
        let b = pool.get_float(4);
        pool.free_float(a);
        pool.free_float(b);
        let s = pool.stats();
        assert_eq!(s.returned, 1);
        assert_eq!(s.discarded, 1);
        assert_eq!(pool.idle_arrays(), 1);
    }

    #[test]
    fn byte_limit_discards() {
        let pool = ArrayPool::with_config(PoolConfig {
            max_arrays_per_size: 16,
            max_retained_bytes: 4 * size_of::<f32>(),
        });
        let a = pool.get_float(8);
        pool.free_float(a);
        assert_eq!(pool.stats().discarded, 1);
        assert_eq!(pool.stats().retained_bytes, 0);
    }

    #[test]
    fn no_retention_always_misses() {
        let pool = ArrayPool::with_config(PoolConfig::no_retention());
        for _ in 0..3 {
            let a = pool.get_float(4);
            pool.free_float(a);
        }
        assert_eq!(pool.stats().hits, 0);
        assert_eq!(pool.stats().misses, 3);
    }

    #[test]
    fn bool_arrays_come_back_cleared() {
        let pool = ArrayPool::new();
        let mut a = pool.get_bool(3);
        a[1] = true;
        pool.free_bool(a);
        let b = pool.get_bool(3);
        assert_eq!(b, vec![false, false, false]);
        assert_eq!(pool.stats().hits, 1);
    }

    #[test]
    fn grid_lease_round_trip() {
        let pool = ArrayPool::new();
        let size = SceneSize::new(3, 2, 2);
        let mut g = pool.lease_grid3f(size);
        assert_eq!(g.dims(), size);
        g.set(2, 1, 1, 0.5);
        pool.free_grid3f(g);

        let g2 = pool.lease_grid3f(size);
        assert_eq!(g2.get(2, 1, 1), 0.0);
        assert_eq!(pool.stats().hits, 1);

        let v = pool.lease_bool_grid(size);
        assert_eq!(v.cell_count(), 12);
        pool.free_bool_grid(v);
        pool.free_grid3f(g2);
        assert_eq!(pool.stats().outstanding, 0);
    }

    #[test]
    fn clear_drops_idle_arrays() {
        let pool = ArrayPool::new();
        let a = pool.get_float(4);
        pool.free_float(a);
        pool.clear();
        assert_eq!(pool.idle_arrays(), 0);
        assert_eq!(pool.stats().retained_bytes, 0);
    }

    #[test]
    fn concurrent_leases_balance() {
        let pool = Arc::new(ArrayPool::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let pool = Arc::clone(&pool);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        let a = pool.get_float(64);
                        pool.free_float(a);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let s = pool.stats();
        assert_eq!(s.outstanding, 0);
        assert_eq!(s.hits + s.misses, 400);
        assert!(s.misses <= 4);
    }

    proptest! {
        #[test]
        fn retained_bytes_match_idle_arrays(lens in proptest::collection::vec(1usize..32, 1..20)) {
            let pool = ArrayPool::new();
            let leased: Vec<_> = lens.iter().map(|&n| pool.get_float(n)).collect();
            for a in leased {
                pool.free_float(a);
            }
            let s = pool.stats();
            let expected: usize = lens.iter().map(|n| n * size_of::<f32>()).sum();
            prop_assert_eq!(s.returned + s.discarded, lens.len() as u64);
            prop_assert!(s.retained_bytes <= expected);
            if s.discarded == 0 {
                prop_assert_eq!(s.retained_bytes, expected);
            }
            prop_assert_eq!(s.outstanding, 0);
        }
    }
}
