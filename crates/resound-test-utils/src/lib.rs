//! Test utilities and mock collaborators for resound development.
//!
//! Provides mock [`PassabilityView`]s, a recording [`DebugSink`], and
//! (in [`fixtures`]) seeded random scenes and canned scene providers.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{random_grid, random_view, FailingProvider, StaticProvider};

use resound_core::{DebugSink, PassabilityView, SceneSize, VoxelPos};

/// Every cell has the same passability.
#[derive(Clone, Copy, Debug)]
pub struct UniformView {
    size: SceneSize,
    value: f32,
}

impl UniformView {
    pub fn new(size: SceneSize, value: f32) -> Self {
        Self { size, value }
    }

    /// Fully passable scene.
    pub fn open(size: SceneSize) -> Self {
        Self::new(size, 1.0)
    }
}

impl PassabilityView for UniformView {
    fn size(&self) -> SceneSize {
        self.size
    }

    fn passability(&self, _x: usize, _y: usize, _z: usize) -> f32 {
        self.value
    }
}

/// Passability computed by a closure over local coordinates.
pub struct FnView<F> {
    size: SceneSize,
    f: F,
}

impl<F> FnView<F>
where
    F: Fn(usize, usize, usize) -> f32 + Send + Sync,
{
    pub fn new(size: SceneSize, f: F) -> Self {
        Self { size, f }
    }
}

impl<F> PassabilityView for FnView<F>
where
    F: Fn(usize, usize, usize) -> f32 + Send + Sync,
{
    fn size(&self) -> SceneSize {
        self.size
    }

    fn passability(&self, x: usize, y: usize, z: usize) -> f32 {
        (self.f)(x, y, z)
    }
}

/// A one-dimensional scene along X with explicit per-cell passability.
#[derive(Clone, Debug)]
pub struct LineView {
    cells: Vec<f32>,
}

impl LineView {
    pub fn new(cells: Vec<f32>) -> Self {
        Self { cells }
    }
}

impl PassabilityView for LineView {
    fn size(&self) -> SceneSize {
        SceneSize::new(self.cells.len(), 1, 1)
    }

    fn passability(&self, x: usize, _y: usize, _z: usize) -> f32 {
        self.cells[x]
    }
}

/// Records every snapshot it is given.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    pub snapshots: Vec<Vec<(VoxelPos, f32)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent snapshot, if any.
    pub fn last(&self) -> Option<&[(VoxelPos, f32)]> {
        self.snapshots.last().map(Vec::as_slice)
    }
}

impl DebugSink for RecordingSink {
    fn emit(&mut self, volumes: &[(VoxelPos, f32)]) {
        self.snapshots.push(volumes.to_vec());
    }
}
