//! Fixed-size scene partitions with activation and progress tracking.

use resound_core::{GenericGrid3, Grid3, Grid3Range, Grid3f, SceneSize};

use crate::error::SpaceError;

/// One box of a partitioned scene.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AcousticChunk {
    /// Whether the current pass considers this chunk.
    pub is_active: bool,
    /// Cells touched so far in the current pass. Never exceeds
    /// [`cell_count`](AcousticChunk::cell_count).
    pub raised: usize,
    /// The scene cells covered by this chunk.
    pub grid: Grid3Range,
}

impl AcousticChunk {
    /// An inactive, untouched chunk covering `grid`.
    pub fn new(grid: Grid3Range) -> Self {
        Self {
            is_active: false,
            raised: 0,
            grid,
        }
    }

    /// Number of scene cells in the box.
    pub fn cell_count(&self) -> usize {
        self.grid.cell_count()
    }

    /// Every cell in the box has been touched once.
    pub fn is_raise_finished(&self) -> bool {
        self.raised >= self.cell_count()
    }
}

/// Number of chunks along one axis: `ceil(len / chunk_size)`.
fn chunks_along(len: usize, chunk_size: usize) -> usize {
    len.div_ceil(chunk_size)
}

/// Cover `size` with boxes of `chunk_size` cells per axis.
///
/// Boxes are emitted in z, y, x nested order (x fastest), matching the
/// linear layout of the chunk grid. Trailing boxes are clipped to the
/// scene bounds rather than padded.
pub fn split_into_chunks(size: SceneSize, chunk_size: usize) -> Result<Vec<AcousticChunk>, SpaceError> {
    if chunk_size == 0 {
        return Err(SpaceError::ZeroChunkSize);
    }
    let mut chunks = Vec::with_capacity(
        chunks_along(size.width, chunk_size)
            * chunks_along(size.height, chunk_size)
            * chunks_along(size.depth, chunk_size),
    );
    for z in (0..size.depth).step_by(chunk_size) {
        for y in (0..size.height).step_by(chunk_size) {
            for x in (0..size.width).step_by(chunk_size) {
                chunks.push(AcousticChunk::new(Grid3Range::new(
                    x,
                    (x + chunk_size).min(size.width),
                    y,
                    (y + chunk_size).min(size.height),
                    z,
                    (z + chunk_size).min(size.depth),
                )));
            }
        }
    }
    Ok(chunks)
}

/// Arrange a chunk list produced by [`split_into_chunks`] into a
/// [`ChunkMap`].
///
/// The chunk grid extents are the ceiling-divided scene extents; the
/// list length must match their product.
pub fn chunk_map_of(
    size: SceneSize,
    chunks: Vec<AcousticChunk>,
    chunk_size: usize,
) -> Result<ChunkMap, SpaceError> {
    if chunk_size == 0 {
        return Err(SpaceError::ZeroChunkSize);
    }
    let dims = SceneSize::new(
        chunks_along(size.width, chunk_size),
        chunks_along(size.height, chunk_size),
        chunks_along(size.depth, chunk_size),
    );
    let actual = chunks.len();
    let chunks = GenericGrid3::from_vec(dims, chunks).map_err(|_| SpaceError::ChunkCountMismatch {
        expected: dims.len(),
        actual,
    })?;
    Ok(ChunkMap {
        scene: size,
        chunk_size,
        chunks,
    })
}

/// A dense grid of [`AcousticChunk`]s addressed by chunk coordinate
/// (`scene coordinate / chunk_size`).
///
/// Owned by a single scheduler: activation flags and progress counters
/// are not designed for concurrent writers.
#[derive(Clone, Debug)]
pub struct ChunkMap {
    scene: SceneSize,
    chunk_size: usize,
    chunks: GenericGrid3<AcousticChunk>,
}

impl ChunkMap {
    /// Partition `size` into chunks of `chunk_size` cells per axis.
    pub fn new(size: SceneSize, chunk_size: usize) -> Result<Self, SpaceError> {
        let chunks = split_into_chunks(size, chunk_size)?;
        chunk_map_of(size, chunks, chunk_size)
    }

    /// Extents of the partitioned scene.
    pub fn scene_size(&self) -> SceneSize {
        self.scene
    }

    /// Cells per chunk along each axis (before clipping).
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of chunks.
    pub fn len(&self) -> usize {
        self.chunks.cell_count()
    }

    /// Whether the scene had no cells to partition.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Chunk at linear `index`.
    pub fn get(&self, index: usize) -> &AcousticChunk {
        &self.chunks[index]
    }

    /// Mutable chunk at linear `index`.
    pub fn get_mut(&mut self, index: usize) -> &mut AcousticChunk {
        &mut self.chunks[index]
    }

    /// Iterate chunks in linear order.
    pub fn iter(&self) -> std::slice::Iter<'_, AcousticChunk> {
        self.chunks.iter()
    }

    /// Index of the chunk containing scene cell `(x, y, z)`.
    pub fn chunk_of(&self, x: usize, y: usize, z: usize) -> usize {
        self.chunks.index_of(
            x / self.chunk_size,
            y / self.chunk_size,
            z / self.chunk_size,
        )
    }

    /// Index of the chunk at offset `(dx, dy, dz)` from chunk `index`, or
    /// `None` past the scene edge.
    pub fn neighbour_index(&self, index: usize, dx: i64, dy: i64, dz: i64) -> Option<usize> {
        let (cx, cy, cz) = self.chunks.pos_of(index);
        let nx = cx as i64 + dx;
        let ny = cy as i64 + dy;
        let nz = cz as i64 + dz;
        self.chunks
            .in_bounds(nx, ny, nz)
            .then(|| self.chunks.index_of(nx as usize, ny as usize, nz as usize))
    }

    /// Activate chunk `index`.
    pub fn activate(&mut self, index: usize) {
        self.chunks[index].is_active = true;
    }

    /// Activate every chunk holding at least one nonzero volume cell.
    ///
    /// Returns the number of chunks activated by this call.
    pub fn mark_active_if_seeded(&mut self, volume: &Grid3f) -> usize {
        let mut activated = 0;
        for i in 0..self.len() {
            let range = self.chunks[i].grid;
            let mut seeded = false;
            volume.for_each_in(&range, |idx, _, _, _| {
                seeded |= volume[idx] != 0.0;
            });
            let chunk = &mut self.chunks[i];
            if seeded && !chunk.is_active {
                chunk.is_active = true;
                activated += 1;
            }
        }
        activated
    }

    /// Record that one more cell of chunk `index` was touched.
    ///
    /// Saturates at the chunk's cell count. Returns whether the chunk is
    /// now finished.
    pub fn raise(&mut self, index: usize) -> bool {
        self.raise_by(index, 1)
    }

    /// Record that `n` more cells of chunk `index` were touched.
    ///
    /// Saturates at the chunk's cell count, like `n` calls to
    /// [`raise`](Self::raise).
    pub fn raise_by(&mut self, index: usize, n: usize) -> bool {
        let chunk = &mut self.chunks[index];
        chunk.raised = chunk.raised.saturating_add(n).min(chunk.cell_count());
        chunk.is_raise_finished()
    }

    /// Number of active chunks.
    pub fn active_count(&self) -> usize {
        self.chunks.iter().filter(|c| c.is_active).count()
    }

    /// Deactivate every chunk and zero its progress.
    pub fn reset(&mut self) {
        for chunk in self.chunks.as_mut_slice() {
            chunk.is_active = false;
            chunk.raised = 0;
        }
    }
}

impl Grid3 for ChunkMap {
    fn dims(&self) -> SceneSize {
        self.chunks.dims()
    }
}
