//! Resound: acoustic volume propagation over 3D voxel grids.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all resound sub-crates. For most users, adding `resound` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use resound::prelude::*;
//!
//! // One 16³ scene with a wall across x = 12.
//! let dims = SceneDims::new(16, 16, 16).unwrap();
//! let scene = PassabilityGrid::from_fn(dims.size(), |x, _, _| {
//!     if x == 12 { 0.0 } else { 1.0 }
//! })
//! .unwrap();
//! let bank = Arc::new(SceneBank::new(dims));
//! bank.insert_scene(WorldId(0), ChunkKey::new(0, 0, 0), scene).unwrap();
//!
//! let config = SimulatorConfig { range: 8, worker_threads: Some(1), ..Default::default() };
//! let sim = AcousticSimulator::new(bank, Arc::new(ArrayPool::new()), config).unwrap();
//!
//! let source = VoxelPos::new(8, 8, 8);
//! let result = sim.simulate_single_source(WorldId(0), source, 1.0, 1.0, 0.8).wait().unwrap();
//! assert_eq!(result.get_volume(source), Some(1.0));
//! assert!((result.get_volume(VoxelPos::new(10, 8, 8)).unwrap() - 0.64).abs() < 1e-6);
//! assert_eq!(result.get_volume(VoxelPos::new(13, 8, 8)), None);
//! result.finish();
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `resound-core` | Grids, positions, collaborator traits, error types |
//! | [`arena`] | `resound-arena` | `ArrayPool` of reusable float and bool arrays |
//! | [`space`] | `resound-space` | Chunk partitioning, passability scenes, `SceneBank` |
//! | [`propagators`] | `resound-propagators` | Best-first, incremental, and chunked solvers |
//! | [`engine`] | `resound-engine` | `AcousticSimulator` worker pool and results |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core grid types, positions, traits, and errors (`resound-core`).
///
/// Contains [`types::Grid3f`], [`types::VoxelPos`], and the collaborator
/// traits [`types::PassabilityView`], [`types::SceneProvider`] and
/// [`types::DebugSink`].
pub use resound_core as types;

/// Pooled array storage (`resound-arena`).
pub use resound_arena as arena;

/// Chunking and scene storage (`resound-space`).
///
/// [`space::SceneBank`] is the in-memory [`types::SceneProvider`].
pub use resound_space as space;

/// Volume propagation solvers (`resound-propagators`).
///
/// [`propagators::BestFirst`] for exact settled fields,
/// [`propagators::Respread`] for local repairs, and
/// [`propagators::ChunkedWavefront`] for staged multi-threaded solving.
pub use resound_propagators as propagators;

/// Simulation facade (`resound-engine`).
pub use resound_engine as engine;

/// Common imports for typical resound usage.
///
/// ```rust
/// use resound::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use resound_core::{
        DebugSink, Grid3, Grid3f, PassabilityView, SceneProvider, SceneSize, SceneWindow,
        VoxelPos, WorldId,
    };

    // Errors
    pub use resound_core::{PropagationError, SimulationError};
    pub use resound_engine::ConfigError;
    pub use resound_space::SpaceError;

    // Storage
    pub use resound_arena::{ArrayPool, PoolConfig};
    pub use resound_space::{ChunkKey, PassabilityGrid, SceneBank, SceneDims};

    // Solvers
    pub use resound_propagators::{BestFirst, ChunkedWavefront, Respread};

    // Engine
    pub use resound_engine::{
        AcousticSimulationResult, AcousticSimulator, SimulationMetrics, SimulatorConfig,
        SolverKind,
    };
}
