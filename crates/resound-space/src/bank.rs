//! In-memory per-world scene storage.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;
use resound_core::{SceneProvider, SceneWindow, SimulationError, VoxelPos, WorldId};

use crate::error::SpaceError;
use crate::scene::PassabilityGrid;
use crate::view::{ChunkKey, ChunkedView, SceneDims};

type SceneMap = IndexMap<(WorldId, ChunkKey), Arc<PassabilityGrid>>;

/// Loaded passability scenes keyed by world and scene coordinate.
///
/// Scenes are shared with in-flight simulations through `Arc`, so edits
/// are copy-on-write: a simulation that already assembled its window
/// keeps reading the scene it started with.
pub struct SceneBank {
    dims: SceneDims,
    scenes: RwLock<SceneMap>,
}

impl SceneBank {
    /// An empty bank holding scenes of `dims`.
    pub fn new(dims: SceneDims) -> Self {
        Self {
            dims,
            scenes: RwLock::new(IndexMap::new()),
        }
    }

    /// Extents of every stored scene.
    pub fn dims(&self) -> SceneDims {
        self.dims
    }

    fn read(&self) -> RwLockReadGuard<'_, SceneMap> {
        self.scenes.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SceneMap> {
        self.scenes.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `scene` at `key`, returning whatever it replaced.
    pub fn insert_scene(
        &self,
        world: WorldId,
        key: ChunkKey,
        scene: PassabilityGrid,
    ) -> Result<Option<Arc<PassabilityGrid>>, SpaceError> {
        if scene.dims() != self.dims.size() {
            return Err(SpaceError::SceneSizeMismatch {
                expected: self.dims.size(),
                actual: scene.dims(),
            });
        }
        log::trace!("scene {key:?} loaded in world {world}");
        Ok(self.write().insert((world, key), Arc::new(scene)))
    }

    /// Drop the scene at `key`.
    pub fn remove_chunk(&self, world: WorldId, key: ChunkKey) -> Option<Arc<PassabilityGrid>> {
        self.write().shift_remove(&(world, key))
    }

    /// Drop every scene of `world`, returning how many were removed.
    pub fn remove_world(&self, world: WorldId) -> usize {
        let mut scenes = self.write();
        let before = scenes.len();
        scenes.retain(|(w, _), _| *w != world);
        before - scenes.len()
    }

    /// Number of stored scenes across all worlds.
    pub fn scene_count(&self) -> usize {
        self.read().len()
    }

    fn locate(&self, pos: VoxelPos) -> (ChunkKey, usize, usize, usize) {
        let key = ChunkKey::containing(pos, &self.dims);
        let origin = key.origin(&self.dims);
        (
            key,
            (pos.x - origin.x) as usize,
            (pos.y - origin.y) as usize,
            (pos.z - origin.z) as usize,
        )
    }

    /// Passability at world position `pos`, or `None` if its scene is not
    /// loaded.
    pub fn passability_at(&self, world: WorldId, pos: VoxelPos) -> Option<f32> {
        let (key, x, y, z) = self.locate(pos);
        self.read().get(&(world, key)).map(|scene| scene.get(x, y, z))
    }

    /// Overwrite the passability at world position `pos`.
    ///
    /// Returns `false` when the scene is not loaded or the value did not
    /// change.
    pub fn set_passability(&self, world: WorldId, pos: VoxelPos, value: f32) -> bool {
        let (key, x, y, z) = self.locate(pos);
        let mut scenes = self.write();
        match scenes.get_mut(&(world, key)) {
            Some(scene) => Arc::make_mut(scene).set(x, y, z, value),
            None => false,
        }
    }
}

impl SceneProvider for SceneBank {
    fn scene_around(
        &self,
        world: WorldId,
        center: VoxelPos,
        range: u32,
    ) -> Result<SceneWindow, SimulationError> {
        let r = i32::try_from(range).unwrap_or(i32::MAX);
        let min_key = ChunkKey::containing(center.offset(-r, -r, -r), &self.dims);
        let max_key = ChunkKey::containing(center.offset(r, r, r), &self.dims);

        let scenes = self.read();
        if !scenes.keys().any(|(w, _)| *w == world) {
            return Err(SimulationError::UnknownWorld { world });
        }
        let selected: Vec<_> = scenes
            .iter()
            .filter(|((w, key), _)| {
                *w == world
                    && (min_key.x..=max_key.x).contains(&key.x)
                    && (min_key.y..=max_key.y).contains(&key.y)
                    && (min_key.z..=max_key.z).contains(&key.z)
            })
            .map(|((_, key), scene)| (*key, Arc::clone(scene)))
            .collect();
        drop(scenes);

        if selected.is_empty() {
            return Err(SimulationError::SceneUnavailable {
                reason: format!("no scenes loaded within {range} of {center} in world {world}"),
            });
        }
        let loaded = selected.len();
        let view = ChunkedView::new(self.dims, min_key, max_key, selected).map_err(|e| {
            SimulationError::SceneUnavailable {
                reason: e.to_string(),
            }
        })?;
        log::debug!(
            "assembled {loaded} scenes {min_key:?}..={max_key:?} around {center} in world {world}"
        );
        Ok(SceneWindow::new(view.origin(), Arc::new(view)))
    }
}

impl std::fmt::Debug for SceneBank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneBank")
            .field("dims", &self.dims)
            .field("scenes", &self.scene_count())
            .finish()
    }
}
