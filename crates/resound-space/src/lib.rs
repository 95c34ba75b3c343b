//! Scene partitioning and passability scene storage for resound.
//!
//! # Chunking
//!
//! [`split_into_chunks`] covers a scene with fixed-size boxes (trailing
//! boxes clipped to the scene bounds) and [`ChunkMap`] addresses them by
//! chunk coordinate. Each [`AcousticChunk`] tracks whether the current
//! pass considers it (`is_active`) and how many of its cells have been
//! touched (`raised`), which lets staged solvers skip finished or
//! silent regions.
//!
//! # Scenes
//!
//! - [`PassabilityGrid`]: one loaded block of passability values.
//! - [`ChunkedView`]: several equally sized scenes stitched into one
//!   local coordinate system.
//! - [`SceneBank`]: per-world scene storage implementing
//!   [`SceneProvider`](resound_core::SceneProvider).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod bank;
pub mod chunk;
pub mod error;
pub mod scene;
pub mod view;

#[cfg(test)]
pub(crate) mod compliance;

pub use bank::SceneBank;
pub use chunk::{chunk_map_of, split_into_chunks, AcousticChunk, ChunkMap};
pub use error::SpaceError;
pub use scene::PassabilityGrid;
pub use view::{ChunkKey, ChunkedView, SceneDims, MAX_VIEW_CELLS};
