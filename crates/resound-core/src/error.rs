//! Error types shared across the resound workspace.
//!
//! Organised by subsystem: grid construction, propagation (solver input
//! validation), and simulation requests issued through the engine facade.

use std::error::Error;
use std::fmt;

use crate::id::{VoxelPos, WorldId};

/// Errors from grid construction and bulk copies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GridError {
    /// A backing array or peer grid has the wrong number of cells.
    SizeMismatch {
        /// Number of cells required.
        expected: usize,
        /// Number of cells supplied.
        actual: usize,
    },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SizeMismatch { expected, actual } => {
                write!(f, "grid size mismatch: expected {expected} cells, got {actual}")
            }
        }
    }
}

impl Error for GridError {}

/// Errors from solver configuration and solver entry points.
#[derive(Clone, Debug, PartialEq)]
pub enum PropagationError {
    /// A solver parameter is out of its valid range.
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The rejected value.
        value: f32,
        /// Human-readable description of the valid range.
        expected: &'static str,
    },
    /// The volume grid and the passability view have different extents.
    SizeMismatch {
        /// Volume grid extents `(w, h, d)`.
        grid: (usize, usize, usize),
        /// Passability view extents `(w, h, d)`.
        view: (usize, usize, usize),
    },
}

impl fmt::Display for PropagationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParameter {
                name,
                value,
                expected,
            } => write!(f, "invalid {name}: {value} (expected {expected})"),
            Self::SizeMismatch { grid, view } => write!(
                f,
                "volume grid {}x{}x{} does not match passability view {}x{}x{}",
                grid.0, grid.1, grid.2, view.0, view.1, view.2
            ),
        }
    }
}

impl Error for PropagationError {}

/// Errors from a single-source simulation request.
#[derive(Clone, Debug, PartialEq)]
pub enum SimulationError {
    /// The world is not known to the scene provider.
    UnknownWorld {
        /// The requested world.
        world: WorldId,
    },
    /// No scene data is loaded around the requested position.
    SceneUnavailable {
        /// Description of what was missing.
        reason: String,
    },
    /// The source lies outside the scene window it was simulated in
    /// (e.g. above or below the loaded world height).
    InvalidSourcePosition {
        /// The rejected source position.
        pos: VoxelPos,
    },
    /// The solver rejected its input.
    Propagation(PropagationError),
    /// The simulator's worker pool has shut down.
    WorkerStopped,
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownWorld { world } => write!(f, "unknown world {world}"),
            Self::SceneUnavailable { reason } => write!(f, "scene unavailable: {reason}"),
            Self::InvalidSourcePosition { pos } => {
                write!(f, "source position {pos} is outside the simulated scene")
            }
            Self::Propagation(e) => write!(f, "propagation failed: {e}"),
            Self::WorkerStopped => write!(f, "simulation worker pool has stopped"),
        }
    }
}

impl Error for SimulationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Propagation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PropagationError> for SimulationError {
    fn from(e: PropagationError) -> Self {
        Self::Propagation(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn propagation_error_is_source_of_simulation_error() {
        let inner = PropagationError::InvalidParameter {
            name: "attenuation",
            value: 1.5,
            expected: "(0, 1]",
        };
        let outer = SimulationError::from(inner.clone());
        let source = outer.source().unwrap();
        assert_eq!(source.to_string(), inner.to_string());
        assert!(outer.to_string().contains("attenuation"));
    }

    #[test]
    fn size_mismatch_display_names_both_extents() {
        let e = PropagationError::SizeMismatch {
            grid: (4, 1, 1),
            view: (5, 1, 1),
        };
        assert_eq!(
            e.to_string(),
            "volume grid 4x1x1 does not match passability view 5x1x1"
        );
    }
}
