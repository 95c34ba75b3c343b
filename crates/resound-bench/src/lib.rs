//! Benchmark scenes and utilities for resound.
//!
//! Provides deterministic scenes shared by the criterion benches:
//!
//! - [`reference_scene`]: a 32³ seeded random scene (32K cells)
//! - [`stress_scene`]: a 64³ seeded random scene (262K cells)
//! - [`reference_bank`]: the reference scene loaded into a [`SceneBank`]
//! - [`centered_source`]: a volume grid seeded at its center cell

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::sync::Arc;

use resound_core::{Grid3f, SceneSize, VoxelPos, WorldId};
use resound_space::{ChunkKey, PassabilityGrid, SceneBank, SceneDims};
use resound_test_utils::random_grid;

/// Edge length of [`reference_scene`].
pub const REFERENCE_EDGE: usize = 32;

/// Edge length of [`stress_scene`].
pub const STRESS_EDGE: usize = 64;

/// World every bank scene is loaded into.
pub const BENCH_WORLD: WorldId = WorldId(0);

/// Reference scene: 32³ cells with ~15% walls.
pub fn reference_scene(seed: u64) -> PassabilityGrid {
    random_grid(SceneSize::new(REFERENCE_EDGE, REFERENCE_EDGE, REFERENCE_EDGE), seed)
}

/// Stress scene: 64³ cells, same density as [`reference_scene`].
pub fn stress_scene(seed: u64) -> PassabilityGrid {
    random_grid(SceneSize::new(STRESS_EDGE, STRESS_EDGE, STRESS_EDGE), seed)
}

/// A bank holding [`reference_scene`] at chunk key `(0, 0, 0)` of
/// [`BENCH_WORLD`].
pub fn reference_bank(seed: u64) -> Arc<SceneBank> {
    let dims = SceneDims::new(REFERENCE_EDGE, REFERENCE_EDGE, REFERENCE_EDGE)
        .expect("reference edge is a power of two");
    let bank = Arc::new(SceneBank::new(dims));
    bank.insert_scene(BENCH_WORLD, ChunkKey::new(0, 0, 0), reference_scene(seed))
        .expect("reference scene matches bank dims");
    bank
}

/// World position at the center of the reference bank.
pub fn bank_center() -> VoxelPos {
    let c = (REFERENCE_EDGE / 2) as i32;
    VoxelPos::new(c, c, c)
}

/// A zeroed grid of `size` with `volume` at its center cell.
pub fn centered_source(size: SceneSize, volume: f32) -> Grid3f {
    let mut grid = Grid3f::zeroed(size);
    grid.set(size.width / 2, size.height / 2, size.depth / 2, volume);
    grid
}
