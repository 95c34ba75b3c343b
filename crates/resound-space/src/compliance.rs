//! Partition compliance helpers shared by the chunking tests.

use resound_core::{GenericGrid3, Grid3, SceneSize};

use crate::chunk::AcousticChunk;

/// Assert that the chunk boxes cover every scene cell exactly once.
pub fn assert_exact_cover(size: SceneSize, chunks: &[AcousticChunk]) {
    let mut hits = GenericGrid3::filled(size, 0u8);
    for chunk in chunks {
        assert!(chunk.grid.x1 <= size.width, "chunk {chunk:?} overruns width");
        assert!(chunk.grid.y1 <= size.height, "chunk {chunk:?} overruns height");
        assert!(chunk.grid.z1 <= size.depth, "chunk {chunk:?} overruns depth");
        let range = chunk.grid;
        let mut covered = Vec::with_capacity(range.cell_count());
        hits.for_each_in(&range, |idx, _, _, _| covered.push(idx));
        for idx in covered {
            hits[idx] += 1;
        }
    }
    for (i, &n) in hits.iter().enumerate() {
        assert_eq!(n, 1, "cell {:?} covered {n} times", hits.pos_of(i));
    }
}
