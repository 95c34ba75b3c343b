//! Lease accounting for the array pool.

/// A point-in-time view of [`ArrayPool`](crate::ArrayPool) activity.
///
/// Counters are cumulative since the pool was created, except
/// `outstanding` and `retained_bytes` which describe the current state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Leases served from an idle array.
    pub hits: u64,
    /// Leases that fell back to a fresh allocation.
    pub misses: u64,
    /// Arrays handed back and kept for reuse.
    pub returned: u64,
    /// Arrays handed back but dropped because a retention limit was hit.
    pub discarded: u64,
    /// Leases not yet freed. Negative if foreign arrays were freed into
    /// the pool.
    pub outstanding: i64,
    /// Bytes held by idle arrays.
    pub retained_bytes: usize,
}

impl PoolStats {
    /// Fraction of leases served from the pool, or 0 before any lease.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        self.hits as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stats_are_zero() {
        let s = PoolStats::default();
        assert_eq!(s.hits, 0);
        assert_eq!(s.misses, 0);
        assert_eq!(s.outstanding, 0);
        assert_eq!(s.hit_rate(), 0.0);
    }

    #[test]
    fn hit_rate_counts_hits_over_leases() {
        let s = PoolStats {
            hits: 3,
            misses: 1,
            ..PoolStats::default()
        };
        assert!((s.hit_rate() - 0.75).abs() < 1e-12);
    }
}
