//! Stitching equally sized scenes into one local coordinate system.

use std::sync::Arc;

use resound_core::{PassabilityView, SceneSize, VoxelPos};

use crate::error::SpaceError;
use crate::scene::PassabilityGrid;

/// Extents shared by every scene in a bank.
///
/// Each axis must be a power of two so that world-to-scene lookup is an
/// arithmetic shift and local offsets are a mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SceneDims {
    size: SceneSize,
    shift: [u32; 3],
}

impl SceneDims {
    /// Validate and wrap scene extents.
    pub fn new(width: usize, height: usize, depth: usize) -> Result<Self, SpaceError> {
        for (axis, value) in [("width", width), ("height", height), ("depth", depth)] {
            if !value.is_power_of_two() || value > (1 << 30) {
                return Err(SpaceError::NotPowerOfTwo { axis, value });
            }
        }
        Ok(Self {
            size: SceneSize::new(width, height, depth),
            shift: [
                width.trailing_zeros(),
                height.trailing_zeros(),
                depth.trailing_zeros(),
            ],
        })
    }

    /// Extents of one scene.
    pub fn size(&self) -> SceneSize {
        self.size
    }
}

/// Scene coordinate: world position divided by the scene extents,
/// rounding towards negative infinity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkKey {
    /// X coordinate in scenes.
    pub x: i32,
    /// Y coordinate in scenes.
    pub y: i32,
    /// Z coordinate in scenes.
    pub z: i32,
}

impl ChunkKey {
    /// Construct a key from its components.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Key of the scene containing world position `pos`.
    pub fn containing(pos: VoxelPos, dims: &SceneDims) -> Self {
        Self {
            x: pos.x >> dims.shift[0],
            y: pos.y >> dims.shift[1],
            z: pos.z >> dims.shift[2],
        }
    }

    /// World position of this scene's local `(0, 0, 0)`.
    pub fn origin(&self, dims: &SceneDims) -> VoxelPos {
        VoxelPos::new(
            self.x << dims.shift[0],
            self.y << dims.shift[1],
            self.z << dims.shift[2],
        )
    }
}

/// Largest number of cells a [`ChunkedView`] may cover.
pub const MAX_VIEW_CELLS: usize = 1 << 28;

/// A box of scenes `[min_key, max_key]` presented as one passability
/// view. Scenes that are not loaded read as fully blocked.
pub struct ChunkedView {
    dims: SceneDims,
    min_key: ChunkKey,
    extent: [usize; 3],
    scenes: Vec<Option<Arc<PassabilityGrid>>>,
}

impl ChunkedView {
    /// Assemble the scenes whose keys lie in the inclusive box
    /// `[min_key, max_key]`.
    ///
    /// Fails with [`SpaceError::ViewTooLarge`] if the box covers more than
    /// [`MAX_VIEW_CELLS`] cells.
    pub fn new<I>(
        dims: SceneDims,
        min_key: ChunkKey,
        max_key: ChunkKey,
        scenes: I,
    ) -> Result<Self, SpaceError>
    where
        I: IntoIterator<Item = (ChunkKey, Arc<PassabilityGrid>)>,
    {
        if max_key.x < min_key.x || max_key.y < min_key.y || max_key.z < min_key.z {
            return Err(SpaceError::EmptyScene);
        }
        let extent = [
            (i64::from(max_key.x) - i64::from(min_key.x) + 1) as usize,
            (i64::from(max_key.y) - i64::from(min_key.y) + 1) as usize,
            (i64::from(max_key.z) - i64::from(min_key.z) + 1) as usize,
        ];
        let s = dims.size;
        let cells = [s.width, s.height, s.depth]
            .into_iter()
            .zip(extent)
            .try_fold(1usize, |acc, (edge, n)| acc.checked_mul(edge.checked_mul(n)?))
            .filter(|&cells| cells <= MAX_VIEW_CELLS);
        if cells.is_none() {
            return Err(SpaceError::ViewTooLarge { extent });
        }
        let mut slots = vec![None; extent[0] * extent[1] * extent[2]];
        for (key, scene) in scenes {
            if scene.dims() != dims.size {
                return Err(SpaceError::SceneSizeMismatch {
                    expected: dims.size,
                    actual: scene.dims(),
                });
            }
            let inside = key.x >= min_key.x
                && key.y >= min_key.y
                && key.z >= min_key.z
                && key.x <= max_key.x
                && key.y <= max_key.y
                && key.z <= max_key.z;
            if !inside {
                return Err(SpaceError::KeyOutsideView { key });
            }
            let sx = (i64::from(key.x) - i64::from(min_key.x)) as usize;
            let sy = (i64::from(key.y) - i64::from(min_key.y)) as usize;
            let sz = (i64::from(key.z) - i64::from(min_key.z)) as usize;
            slots[sz * extent[0] * extent[1] + sy * extent[0] + sx] = Some(scene);
        }
        Ok(Self {
            dims,
            min_key,
            extent,
            scenes: slots,
        })
    }

    /// World position of local `(0, 0, 0)`.
    pub fn origin(&self) -> VoxelPos {
        self.min_key.origin(&self.dims)
    }

    /// Number of scene slots holding loaded data.
    pub fn loaded_scenes(&self) -> usize {
        self.scenes.iter().filter(|s| s.is_some()).count()
    }
}

impl PassabilityView for ChunkedView {
    fn size(&self) -> SceneSize {
        let s = self.dims.size;
        SceneSize::new(
            s.width * self.extent[0],
            s.height * self.extent[1],
            s.depth * self.extent[2],
        )
    }

    #[inline]
    fn passability(&self, x: usize, y: usize, z: usize) -> f32 {
        let [shx, shy, shz] = self.dims.shift;
        let slot = (z >> shz) * self.extent[0] * self.extent[1]
            + (y >> shy) * self.extent[0]
            + (x >> shx);
        let s = self.dims.size;
        match &self.scenes[slot] {
            Some(scene) => scene.get(x & (s.width - 1), y & (s.height - 1), z & (s.depth - 1)),
            None => 0.0,
        }
    }
}

impl std::fmt::Debug for ChunkedView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkedView")
            .field("min_key", &self.min_key)
            .field("extent", &self.extent)
            .field("loaded", &self.loaded_scenes())
            .finish()
    }
}
