//! Error types for chunking and scene storage.

use resound_core::SceneSize;
use std::fmt;

use crate::view::ChunkKey;

/// Errors arising from chunk maps, scene construction, or scene storage.
#[derive(Debug, Clone, PartialEq)]
pub enum SpaceError {
    /// A chunk size of zero was requested.
    ZeroChunkSize,
    /// The supplied chunk list does not match the scene's chunk grid.
    ChunkCountMismatch {
        /// Number of chunks the scene needs.
        expected: usize,
        /// Number of chunks supplied.
        actual: usize,
    },
    /// A raw value array does not match the scene extents.
    CellCountMismatch {
        /// Number of cells the scene needs.
        expected: usize,
        /// Number of values supplied.
        actual: usize,
    },
    /// Scene extents must be powers of two so chunk lookup is a shift.
    NotPowerOfTwo {
        /// Axis name.
        axis: &'static str,
        /// The rejected extent.
        value: usize,
    },
    /// A scene does not have the extents its container expects.
    SceneSizeMismatch {
        /// Required extents.
        expected: SceneSize,
        /// Supplied extents.
        actual: SceneSize,
    },
    /// A scene key falls outside the view being assembled.
    KeyOutsideView {
        /// The offending key.
        key: ChunkKey,
    },
    /// Attempted to build a scene or view with zero cells.
    EmptyScene,
    /// A view would cover more cells than can be addressed.
    ViewTooLarge {
        /// Scenes along each axis.
        extent: [usize; 3],
    },
}

impl fmt::Display for SpaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroChunkSize => write!(f, "chunk size must be at least 1"),
            Self::ChunkCountMismatch { expected, actual } => {
                write!(f, "expected {expected} chunks, got {actual}")
            }
            Self::CellCountMismatch { expected, actual } => {
                write!(f, "expected {expected} passability values, got {actual}")
            }
            Self::NotPowerOfTwo { axis, value } => {
                write!(f, "scene {axis} must be a power of two, got {value}")
            }
            Self::SceneSizeMismatch { expected, actual } => write!(
                f,
                "scene size {}x{}x{} does not match expected {}x{}x{}",
                actual.width,
                actual.height,
                actual.depth,
                expected.width,
                expected.height,
                expected.depth
            ),
            Self::KeyOutsideView { key } => {
                write!(f, "scene key {key:?} lies outside the view")
            }
            Self::EmptyScene => write!(f, "scene must have at least one cell"),
            Self::ViewTooLarge { extent } => write!(
                f,
                "view of {}x{}x{} scenes exceeds the cell limit",
                extent[0], extent[1], extent[2]
            ),
        }
    }
}

impl std::error::Error for SpaceError {}
