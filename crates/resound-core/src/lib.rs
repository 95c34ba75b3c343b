//! Core types and traits for the resound acoustic propagation workspace.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! dense 3D grid abstraction every solver writes into, the identifiers
//! used to locate scenes in a world, the collaborator traits the engine
//! is constructed with, and the error types shared across crates.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod grid;
pub mod id;
pub mod traits;

pub use error::{GridError, PropagationError, SimulationError};
pub use grid::{BoolGrid, GenericGrid3, Grid3, Grid3Range, Grid3f, SceneSize};
pub use id::{VoxelPos, WorldId};
pub use traits::{DebugSink, PassabilityView, SceneProvider, SceneWindow};
