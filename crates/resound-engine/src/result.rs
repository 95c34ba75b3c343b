//! The settled volume field of one simulation request.

use std::sync::Arc;

use resound_arena::ArrayPool;
use resound_core::{
    DebugSink, Grid3, Grid3f, SceneProvider, SceneWindow, SimulationError, VoxelPos, WorldId,
};
use resound_propagators::{Respread, RespreadStats};

use crate::metrics::SimulationMetrics;

/// A settled volume field positioned in world space.
///
/// The volume grid is leased from the simulator's [`ArrayPool`] and is
/// returned by [`finish`](AcousticSimulationResult::finish), which
/// consumes the result. A result dropped without `finish` logs a warning
/// and its lease stays outstanding in the pool's accounting; the pool
/// simply allocates afresh on its next miss.
pub struct AcousticSimulationResult {
    world: WorldId,
    source: VoxelPos,
    range: u32,
    window: SceneWindow,
    volume: Option<Grid3f>,
    pool: Arc<ArrayPool>,
    provider: Arc<dyn SceneProvider>,
    respread: Respread,
    metrics: SimulationMetrics,
}

impl AcousticSimulationResult {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        world: WorldId,
        source: VoxelPos,
        range: u32,
        window: SceneWindow,
        volume: Grid3f,
        pool: Arc<ArrayPool>,
        provider: Arc<dyn SceneProvider>,
        respread: Respread,
        metrics: SimulationMetrics,
    ) -> Self {
        Self {
            world,
            source,
            range,
            window,
            volume: Some(volume),
            pool,
            provider,
            respread,
            metrics,
        }
    }

    /// World the source was simulated in.
    pub fn world(&self) -> WorldId {
        self.world
    }

    /// World position of the source.
    pub fn source(&self) -> VoxelPos {
        self.source
    }

    /// The scene window the field covers.
    pub fn window(&self) -> &SceneWindow {
        &self.window
    }

    /// Timing and solver counters.
    pub fn metrics(&self) -> &SimulationMetrics {
        &self.metrics
    }

    /// Volume heard at `pos`, or `None` if the position lies outside the
    /// window or was never reached.
    pub fn get_volume(&self, pos: VoxelPos) -> Option<f32> {
        let volume = self.volume.as_ref()?;
        let (x, y, z) = self.window.world_to_local(pos)?;
        let v = volume.get(x, y, z);
        (v > 0.0).then_some(v)
    }

    /// Number of cells holding volume.
    pub fn reached_cells(&self) -> usize {
        self.volume.as_ref().map_or(0, Grid3f::count_positive)
    }

    /// Emit every reached cell within Chebyshev distance `radius` of
    /// `observer`, in grid order, as one snapshot.
    pub fn debug(&self, observer: VoxelPos, sink: &mut dyn DebugSink, radius: u32) {
        let Some(volume) = self.volume.as_ref() else {
            return;
        };
        let mut snapshot = Vec::new();
        volume.for_each(|idx, x, y, z| {
            let v = volume[idx];
            if v <= 0.0 {
                return;
            }
            let pos = self.window.local_to_world(x, y, z);
            if pos.chebyshev(observer) <= radius {
                snapshot.push((pos, v));
            }
        });
        sink.emit(&snapshot);
    }

    /// Re-spread around edited world positions after a scene change.
    ///
    /// Fetches the current scene for the same window from the provider
    /// and repairs the field outward from `positions`. Positions outside
    /// the window are ignored. Only raises volumes.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::SceneUnavailable`] if the provider can
    /// no longer supply a window with the same placement, or any error
    /// the provider reports.
    pub fn update_cells(&mut self, positions: &[VoxelPos]) -> Result<RespreadStats, SimulationError> {
        let fresh = self
            .provider
            .scene_around(self.world, self.source, self.range)?;
        if fresh.origin != self.window.origin || fresh.size() != self.window.size() {
            return Err(SimulationError::SceneUnavailable {
                reason: format!(
                    "window around {} moved from {} to {}",
                    self.source, self.window.origin, fresh.origin
                ),
            });
        }
        self.window = fresh;

        let seeds: Vec<_> = positions
            .iter()
            .filter_map(|&p| self.window.world_to_local(p))
            .collect();
        let Some(volume) = self.volume.as_mut() else {
            return Ok(RespreadStats::default());
        };
        let stats = self
            .respread
            .run(volume, &*self.window.view, &self.pool, &seeds)?;
        self.metrics.cells_reached = volume.count_positive();
        log::debug!(
            "updated {} cells around {} in {} generations",
            stats.edited,
            self.source,
            stats.generations
        );
        Ok(stats)
    }

    /// Return the volume grid to the pool.
    pub fn finish(mut self) {
        if let Some(volume) = self.volume.take() {
            self.pool.free_grid3f(volume);
        }
    }
}

impl Drop for AcousticSimulationResult {
    fn drop(&mut self) {
        if self.volume.is_some() {
            log::warn!(
                "acoustic result for {} in world {} dropped without finish(); pooled grid not returned",
                self.source,
                self.world
            );
        }
    }
}

impl std::fmt::Debug for AcousticSimulationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AcousticSimulationResult")
            .field("world", &self.world)
            .field("source", &self.source)
            .field("window", &self.window)
            .field("reached", &self.reached_cells())
            .finish()
    }
}
