//! Collaborator traits the solvers and the engine are constructed with.
//!
//! Nothing in the propagation engine reaches for global state: passability
//! comes from a [`PassabilityView`], scenes from a [`SceneProvider`], and
//! visualization output goes to a [`DebugSink`].

use std::sync::Arc;

use crate::error::SimulationError;
use crate::grid::SceneSize;
use crate::id::{VoxelPos, WorldId};

/// Read-only passability lookup over a local scene.
///
/// Coordinates are local (`0 ≤ x < size().width` etc.) and values lie in
/// `[0, 1]`. Solvers query this once per traversed edge, so
/// implementations should be cheap and must not allocate.
pub trait PassabilityView: Send + Sync {
    /// Extents of the local scene.
    fn size(&self) -> SceneSize;

    /// Passability of the cell at local `(x, y, z)`.
    fn passability(&self, x: usize, y: usize, z: usize) -> f32;
}

impl<V: PassabilityView + ?Sized> PassabilityView for Arc<V> {
    fn size(&self) -> SceneSize {
        (**self).size()
    }

    fn passability(&self, x: usize, y: usize, z: usize) -> f32 {
        (**self).passability(x, y, z)
    }
}

/// A passability view positioned in world space.
#[derive(Clone)]
pub struct SceneWindow {
    /// World position of local cell `(0, 0, 0)`.
    pub origin: VoxelPos,
    /// The local scene.
    pub view: Arc<dyn PassabilityView>,
}

impl SceneWindow {
    /// Wrap a view whose local origin sits at `origin`.
    pub fn new(origin: VoxelPos, view: Arc<dyn PassabilityView>) -> Self {
        Self { origin, view }
    }

    /// Extents of the window.
    pub fn size(&self) -> SceneSize {
        self.view.size()
    }

    /// Convert a world position to local coordinates, or `None` when it
    /// falls outside the window.
    pub fn world_to_local(&self, pos: VoxelPos) -> Option<(usize, usize, usize)> {
        let size = self.size();
        let lx = i64::from(pos.x) - i64::from(self.origin.x);
        let ly = i64::from(pos.y) - i64::from(self.origin.y);
        let lz = i64::from(pos.z) - i64::from(self.origin.z);
        let inside = lx >= 0
            && ly >= 0
            && lz >= 0
            && (lx as u64) < size.width as u64
            && (ly as u64) < size.height as u64
            && (lz as u64) < size.depth as u64;
        inside.then_some((lx as usize, ly as usize, lz as usize))
    }

    /// Convert local coordinates back to a world position.
    ///
    /// Coordinates past the `i32` range saturate.
    pub fn local_to_world(&self, x: usize, y: usize, z: usize) -> VoxelPos {
        let clamp = |v: usize| i32::try_from(v).unwrap_or(i32::MAX);
        self.origin.offset(clamp(x), clamp(y), clamp(z))
    }
}

impl std::fmt::Debug for SceneWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneWindow")
            .field("origin", &self.origin)
            .field("size", &self.size())
            .finish()
    }
}

/// Supplies the passability scene around a position in a world.
pub trait SceneProvider: Send + Sync {
    /// Return a window covering at least `range` cells on every side of
    /// `center`, clipped to whatever scene data the world has loaded.
    fn scene_around(
        &self,
        world: WorldId,
        center: VoxelPos,
        range: u32,
    ) -> Result<SceneWindow, SimulationError>;
}

/// Receives visualization snapshots of a volume field.
///
/// The core only produces the ordered `(position, volume)` sequence;
/// rendering or transmitting it is the sink's business.
pub trait DebugSink {
    /// Accept one snapshot.
    fn emit(&mut self, volumes: &[(VoxelPos, f32)]);
}

impl<F> DebugSink for F
where
    F: FnMut(&[(VoxelPos, f32)]),
{
    fn emit(&mut self, volumes: &[(VoxelPos, f32)]) {
        self(volumes)
    }
}
