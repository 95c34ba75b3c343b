//! Volume propagation solvers for resound.
//!
//! Three ways to fill a volume grid from its seeded cells:
//!
//! - [`BestFirst`]: the authoritative solver. Settles every cell to its
//!   best path value from any source in one priority-ordered sweep.
//! - [`Respread`]: repairs a settled grid after a local edit by spreading
//!   generation by generation from the edited cells.
//! - [`ChunkedWavefront`]: a staged, multi-threaded approximation that
//!   advances round by round through the chunks the sound has reached.
//!
//! The [`spreading`] module holds the primitives the incremental solvers
//! are built from: single-step spreading, delta merges (sequential and
//! partitioned-parallel), and neighbour aggregation.
//!
//! # Per-step attenuation
//!
//! ```text
//! next = volume * passability(next cell) * attenuation
//! ```
//!
//! Volumes at or below [`DEFAULT_FLOOR`] are silence and stop spreading.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod best_first;
pub mod chunked;
pub(crate) mod grid_helpers;
pub mod incremental;
pub mod spreading;

pub use best_first::{BestFirst, BestFirstBuilder, PropagationStats, DEFAULT_EPSILON, DEFAULT_FLOOR};
pub use chunked::{ChunkedStats, ChunkedWavefront, ChunkedWavefrontBuilder};
pub use incremental::{Respread, RespreadBuilder, RespreadStats};
pub use spreading::{
    collect_volume, collect_volume_avg, collect_volume_weighted, spread_volume, transform_volume,
    transform_volume_deltas, transform_volume_parallel, SpreadParams, Spreader,
    DEFAULT_HYSTERESIS,
};
