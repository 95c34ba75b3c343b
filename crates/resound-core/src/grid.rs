//! Dense 3D grids addressed by `(x, y, z)` or by linear index.
//!
//! Every grid in the workspace shares one memory layout:
//!
//! ```text
//! index = z * (w * h) + y * w + x
//! ```
//!
//! Anything that stores or transmits a grid must keep this order.
//!
//! Accessors on the hot path (`get`, `set`, `Index`) perform no bounds
//! checking of their own beyond what the backing slice does. Callers are
//! expected to pre-filter coordinates with [`Grid3::in_bounds`] or
//! [`Grid3::contains`] before indexing.

use std::ops::{Index, IndexMut};

use crate::error::GridError;

/// Extents of a scene or grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SceneSize {
    /// Number of cells along X.
    pub width: usize,
    /// Number of cells along Y.
    pub height: usize,
    /// Number of cells along Z.
    pub depth: usize,
}

impl SceneSize {
    /// Construct a size from its three extents.
    pub const fn new(width: usize, height: usize, depth: usize) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    /// Total number of cells (`w * h * d`).
    pub const fn len(&self) -> usize {
        self.width * self.height * self.depth
    }

    /// Whether any extent is zero.
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The range covering the whole scene.
    pub const fn full_range(&self) -> Grid3Range {
        Grid3Range::new(0, self.width, 0, self.height, 0, self.depth)
    }
}

/// A half-open axis-aligned box `[x0, x1) × [y0, y1) × [z0, z1)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Grid3Range {
    /// Inclusive lower X bound.
    pub x0: usize,
    /// Exclusive upper X bound.
    pub x1: usize,
    /// Inclusive lower Y bound.
    pub y0: usize,
    /// Exclusive upper Y bound.
    pub y1: usize,
    /// Inclusive lower Z bound.
    pub z0: usize,
    /// Exclusive upper Z bound.
    pub z1: usize,
}

impl Grid3Range {
    /// Construct a range from its six bounds.
    pub const fn new(x0: usize, x1: usize, y0: usize, y1: usize, z0: usize, z1: usize) -> Self {
        Self {
            x0,
            x1,
            y0,
            y1,
            z0,
            z1,
        }
    }

    /// Number of cells inside the box. Inverted bounds count as empty.
    pub const fn cell_count(&self) -> usize {
        self.x1.saturating_sub(self.x0)
            * self.y1.saturating_sub(self.y0)
            * self.z1.saturating_sub(self.z0)
    }

    /// Whether `(x, y, z)` lies inside the box.
    pub const fn contains(&self, x: usize, y: usize, z: usize) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1 && z >= self.z0 && z < self.z1
    }
}

/// Addressing and iteration shared by every dense 3D grid.
///
/// Implementors only provide [`dims`](Grid3::dims); indexing and the
/// range walkers are derived from the fixed z-major layout.
pub trait Grid3 {
    /// Extents of the grid.
    fn dims(&self) -> SceneSize;

    /// Number of cells along X.
    fn w(&self) -> usize {
        self.dims().width
    }

    /// Number of cells along Y.
    fn h(&self) -> usize {
        self.dims().height
    }

    /// Number of cells along Z.
    fn d(&self) -> usize {
        self.dims().depth
    }

    /// Total number of cells.
    fn cell_count(&self) -> usize {
        self.dims().len()
    }

    /// Linear index of `(x, y, z)`. Does not check bounds.
    #[inline]
    fn index_of(&self, x: usize, y: usize, z: usize) -> usize {
        let dims = self.dims();
        z * (dims.width * dims.height) + y * dims.width + x
    }

    /// Inverse of [`index_of`](Grid3::index_of).
    #[inline]
    fn pos_of(&self, index: usize) -> (usize, usize, usize) {
        let dims = self.dims();
        let layer = dims.width * dims.height;
        let z = index / layer;
        let rem = index % layer;
        (rem % dims.width, rem / dims.width, z)
    }

    /// Whether a signed coordinate falls inside the grid.
    #[inline]
    fn in_bounds(&self, x: i64, y: i64, z: i64) -> bool {
        let dims = self.dims();
        x >= 0
            && y >= 0
            && z >= 0
            && (x as u64) < dims.width as u64
            && (y as u64) < dims.height as u64
            && (z as u64) < dims.depth as u64
    }

    /// Whether an unsigned coordinate falls inside the grid.
    #[inline]
    fn contains(&self, x: usize, y: usize, z: usize) -> bool {
        let dims = self.dims();
        x < dims.width && y < dims.height && z < dims.depth
    }

    /// Visit every cell of `range` in z, y, x nested order.
    ///
    /// The callback receives `(index, x, y, z)`. The range must lie
    /// inside the grid.
    fn for_each_in<F>(&self, range: &Grid3Range, mut f: F)
    where
        F: FnMut(usize, usize, usize, usize),
    {
        let dims = self.dims();
        let layer = dims.width * dims.height;
        for z in range.z0..range.z1 {
            let z_off = z * layer;
            for y in range.y0..range.y1 {
                let y_off = z_off + y * dims.width;
                for x in range.x0..range.x1 {
                    f(y_off + x, x, y, z);
                }
            }
        }
    }

    /// Visit every cell in the grid.
    fn for_each<F>(&self, f: F)
    where
        F: FnMut(usize, usize, usize, usize),
    {
        let range = self.dims().full_range();
        self.for_each_in(&range, f);
    }

    /// Visit the linear index range `[start, end)`.
    ///
    /// `end` is clamped to the cell count.
    fn for_each_linear<F>(&self, start: usize, end: usize, mut f: F)
    where
        F: FnMut(usize, usize, usize, usize),
    {
        let end = end.min(self.cell_count());
        for i in start..end {
            let (x, y, z) = self.pos_of(i);
            f(i, x, y, z);
        }
    }
}

/// A dense grid of arbitrary cells.
#[derive(Clone, Debug, PartialEq)]
pub struct GenericGrid3<T> {
    size: SceneSize,
    cells: Vec<T>,
}

/// Boolean grid, used as the "visited this generation" buffer.
pub type BoolGrid = GenericGrid3<bool>;

impl<T> GenericGrid3<T> {
    /// Build a grid by calling `f(index, x, y, z)` for every cell.
    pub fn from_fn<F>(size: SceneSize, mut f: F) -> Self
    where
        F: FnMut(usize, usize, usize, usize) -> T,
    {
        let layer = size.width * size.height;
        let cells = (0..size.len())
            .map(|i| {
                let z = i / layer;
                let rem = i % layer;
                f(i, rem % size.width, rem / size.width, z)
            })
            .collect();
        Self { size, cells }
    }

    /// Wrap an existing vector. Its length must equal `size.len()`.
    pub fn from_vec(size: SceneSize, cells: Vec<T>) -> Result<Self, GridError> {
        if cells.len() != size.len() {
            return Err(GridError::SizeMismatch {
                expected: size.len(),
                actual: cells.len(),
            });
        }
        Ok(Self { size, cells })
    }

    /// Release the backing vector.
    pub fn into_vec(self) -> Vec<T> {
        self.cells
    }

    /// Cell at `(x, y, z)`.
    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> &T {
        &self.cells[self.index_of(x, y, z)]
    }

    /// Mutable cell at `(x, y, z)`.
    #[inline]
    pub fn get_mut(&mut self, x: usize, y: usize, z: usize) -> &mut T {
        let i = self.index_of(x, y, z);
        &mut self.cells[i]
    }

    /// Replace the cell at `(x, y, z)`.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, z: usize, value: T) {
        let i = self.index_of(x, y, z);
        self.cells[i] = value;
    }

    /// All cells in linear order.
    pub fn as_slice(&self) -> &[T] {
        &self.cells
    }

    /// All cells in linear order, mutably.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.cells
    }

    /// Iterate cells in linear order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.cells.iter()
    }
}

impl<T: Clone> GenericGrid3<T> {
    /// A grid with every cell set to `value`.
    pub fn filled(size: SceneSize, value: T) -> Self {
        Self {
            size,
            cells: vec![value; size.len()],
        }
    }

    /// Overwrite every cell with `value`.
    pub fn fill(&mut self, value: T) {
        self.cells.fill(value);
    }
}

impl<T> Grid3 for GenericGrid3<T> {
    fn dims(&self) -> SceneSize {
        self.size
    }
}

impl<T> Index<usize> for GenericGrid3<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: usize) -> &T {
        &self.cells[index]
    }
}

impl<T> IndexMut<usize> for GenericGrid3<T> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.cells[index]
    }
}

/// A dense float grid holding per-cell volume or passability.
///
/// Backing arrays are normally leased from an array pool and handed back
/// with [`into_vec`](Grid3f::into_vec), so construction from an existing
/// vector is the primary constructor.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid3f {
    size: SceneSize,
    data: Vec<f32>,
}

impl Grid3f {
    /// A zero-filled grid backed by a fresh allocation.
    pub fn zeroed(size: SceneSize) -> Self {
        Self {
            size,
            data: vec![0.0; size.len()],
        }
    }

    /// Build a grid by calling `f(index, x, y, z)` for every cell.
    pub fn from_fn<F>(size: SceneSize, f: F) -> Self
    where
        F: FnMut(usize, usize, usize, usize) -> f32,
    {
        let grid = GenericGrid3::from_fn(size, f);
        Self {
            size,
            data: grid.into_vec(),
        }
    }

    /// Wrap an existing array. Its length must equal `size.len()`.
    pub fn from_vec(size: SceneSize, data: Vec<f32>) -> Result<Self, GridError> {
        if data.len() != size.len() {
            return Err(GridError::SizeMismatch {
                expected: size.len(),
                actual: data.len(),
            });
        }
        Ok(Self { size, data })
    }

    /// Release the backing array.
    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// Value at `(x, y, z)`.
    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> f32 {
        self.data[self.index_of(x, y, z)]
    }

    /// Replace the value at `(x, y, z)`.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, z: usize, value: f32) {
        let i = self.index_of(x, y, z);
        self.data[i] = value;
    }

    /// Overwrite every cell with `value`.
    pub fn fill(&mut self, value: f32) {
        self.data.fill(value);
    }

    /// Zero every cell.
    pub fn clear(&mut self) {
        self.fill(0.0);
    }

    /// Copy every cell into `other`, which must have the same length.
    pub fn copy_to(&self, other: &mut Grid3f) -> Result<(), GridError> {
        if self.data.len() != other.data.len() {
            return Err(GridError::SizeMismatch {
                expected: self.data.len(),
                actual: other.data.len(),
            });
        }
        other.data.copy_from_slice(&self.data);
        Ok(())
    }

    /// Overwrite the cells of `range` with `f(index, x, y, z)`.
    pub fn map<F>(&mut self, range: &Grid3Range, mut f: F)
    where
        F: FnMut(usize, usize, usize, usize) -> f32,
    {
        let dims = self.size;
        let layer = dims.width * dims.height;
        for z in range.z0..range.z1 {
            for y in range.y0..range.y1 {
                let row = z * layer + y * dims.width;
                for x in range.x0..range.x1 {
                    self.data[row + x] = f(row + x, x, y, z);
                }
            }
        }
    }

    /// All values in linear order.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// All values in linear order, mutably.
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Number of cells holding a positive value.
    pub fn count_positive(&self) -> usize {
        self.data.iter().filter(|&&v| v > 0.0).count()
    }
}

impl Grid3 for Grid3f {
    fn dims(&self) -> SceneSize {
        self.size
    }
}

impl Index<usize> for Grid3f {
    type Output = f32;

    #[inline]
    fn index(&self, index: usize) -> &f32 {
        &self.data[index]
    }
}

impl IndexMut<usize> for Grid3f {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut f32 {
        &mut self.data[index]
    }
}
