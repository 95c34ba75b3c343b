//! Array pool configuration parameters.

/// Retention limits for an [`ArrayPool`](crate::ArrayPool).
///
/// The pool never refuses a lease; these limits only bound how much
/// freed memory it keeps around for reuse.
#[derive(Clone, Debug)]
pub struct PoolConfig {
    /// Maximum number of idle arrays kept per (kind, length) bucket.
    ///
    /// Default: 16. Arrays freed into a full bucket are dropped.
    pub max_arrays_per_size: usize,

    /// Upper bound on the total bytes of idle arrays across all buckets.
    ///
    /// Default: 256 MiB.
    pub max_retained_bytes: usize,
}

impl PoolConfig {
    /// Default idle arrays per bucket.
    pub const DEFAULT_MAX_ARRAYS_PER_SIZE: usize = 16;

    /// Default retained-bytes ceiling: 256 MiB.
    pub const DEFAULT_MAX_RETAINED_BYTES: usize = 256 * 1024 * 1024;

    /// A config that never retains freed arrays.
    ///
    /// Every lease is then a miss; useful for measuring allocation cost.
    pub fn no_retention() -> Self {
        Self {
            max_arrays_per_size: 0,
            max_retained_bytes: 0,
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_arrays_per_size: Self::DEFAULT_MAX_ARRAYS_PER_SIZE,
            max_retained_bytes: Self::DEFAULT_MAX_RETAINED_BYTES,
        }
    }
}
