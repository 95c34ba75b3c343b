//! Seeded random scenes and canned scene providers.
//!
//! - [`random_grid`] / [`random_view`]: reproducible passability scenes
//!   with scattered walls, driven by `ChaCha8Rng`.
//! - [`StaticProvider`]: serves one fixed window for a single world.
//! - [`FailingProvider`]: always returns a given error.

use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use resound_core::{
    PassabilityView, SceneProvider, SceneSize, SceneWindow, SimulationError, VoxelPos, WorldId,
};
use resound_space::PassabilityGrid;

/// Share of cells that are walls in a random scene.
pub const WALL_RATIO: f64 = 0.15;

/// A reproducible passability scene: roughly [`WALL_RATIO`] of the cells
/// are walls (0.0), the rest lie in `[0.3, 1.0)`.
pub fn random_grid(size: SceneSize, seed: u64) -> PassabilityGrid {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let values = (0..size.len())
        .map(|_| {
            if rng.random_bool(WALL_RATIO) {
                0.0
            } else {
                rng.random_range(0.3f32..1.0)
            }
        })
        .collect();
    match PassabilityGrid::from_vec(size, values) {
        Ok(grid) => grid,
        Err(e) => panic!("random scene of {size:?}: {e}"),
    }
}

/// [`random_grid`] behind an `Arc<dyn PassabilityView>`.
pub fn random_view(size: SceneSize, seed: u64) -> Arc<dyn PassabilityView> {
    Arc::new(random_grid(size, seed))
}

/// Serves the same window for one world, whatever the center and range.
pub struct StaticProvider {
    pub world: WorldId,
    pub window: SceneWindow,
}

impl StaticProvider {
    pub fn new(world: WorldId, origin: VoxelPos, view: Arc<dyn PassabilityView>) -> Self {
        Self {
            world,
            window: SceneWindow::new(origin, view),
        }
    }
}

impl SceneProvider for StaticProvider {
    fn scene_around(
        &self,
        world: WorldId,
        _center: VoxelPos,
        _range: u32,
    ) -> Result<SceneWindow, SimulationError> {
        if world != self.world {
            return Err(SimulationError::UnknownWorld { world });
        }
        Ok(self.window.clone())
    }
}

/// Always fails with the configured error.
pub struct FailingProvider {
    pub error: SimulationError,
}

impl SceneProvider for FailingProvider {
    fn scene_around(
        &self,
        _world: WorldId,
        _center: VoxelPos,
        _range: u32,
    ) -> Result<SceneWindow, SimulationError> {
        Err(self.error.clone())
    }
}
