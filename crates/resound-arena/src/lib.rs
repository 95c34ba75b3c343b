//! Pooled backing arrays for resound grids.
//!
//! Every simulation request needs at least one full-scene float grid, and
//! the incremental and staged solvers need a second (delta) grid plus a
//! boolean visited grid. [`ArrayPool`] lends those arrays out and takes
//! them back so steady-state simulation does no per-request heap churn.
//!
//! # Lease discipline
//!
//! ```text
//! ArrayPool
//! ├── float buckets: len → Vec<Vec<f32>>   (zeroed on return)
//! └── bool buckets:  len → Vec<Vec<bool>>  (cleared on return)
//! ```
//!
//! A leased array is owned exclusively by its borrower until it is freed.
//! An array that is never freed is simply dropped: the pool falls back
//! to a fresh allocation on the next miss, and [`PoolStats::outstanding`]
//! keeps counting the lease.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod pool;
pub mod stats;

pub use config::PoolConfig;
pub use pool::ArrayPool;
pub use stats::PoolStats;
