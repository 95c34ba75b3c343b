//! Staged wavefront solver over scene chunks.
//!
//! Where [`BestFirst`](crate::BestFirst) settles the whole scene in one
//! priority-ordered sweep, the wavefront advances in rounds and only
//! touches chunks the sound has reached:
//!
//! 1. Chunks holding a seeded cell start active.
//! 2. Each round, workers claim chunk indices from a shared counter. For
//!    every active, unfinished chunk they fill its silent cells from the
//!    volume-weighted mean of their neighbours, scaled by the cell's
//!    passability and the attenuation. A write on a chunk face wakes the
//!    chunk on the other side.
//! 3. After all workers join, their writes are merged into the volume
//!    grid through a pooled delta grid. A round that changes nothing ends
//!    the run.
//!
//! Workers only read the volume grid and return owned write lists, so
//! the round barrier is the end of a thread scope.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use resound_arena::ArrayPool;
use resound_core::{Grid3, Grid3f, PassabilityView, PropagationError};
use resound_space::ChunkMap;

use crate::best_first::DEFAULT_FLOOR;
use crate::grid_helpers::{check_extents, check_non_negative, check_positive, check_unit_interval};
use crate::spreading::{collect_volume_weighted, transform_volume_deltas, transform_volume_parallel};

/// Default number of rounds after the first.
pub const DEFAULT_STEPS: usize = 100;

/// Default chunk edge length.
pub const DEFAULT_CHUNK_SIZE: usize = 16;

/// Counters and timings from one [`ChunkedWavefront::propagate`] run.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ChunkedStats {
    /// Rounds executed.
    pub rounds: usize,
    /// Total cells written across all rounds.
    pub edited: usize,
    /// Chunks active when the run ended.
    pub active_chunks: usize,
    /// Chunks in the scene.
    pub total_chunks: usize,
    /// Time spent in worker rounds.
    pub compute: Duration,
    /// Time spent merging deltas.
    pub merge: Duration,
}

impl ChunkedStats {
    /// Share of chunks the wavefront reached, in `[0, 1]`.
    pub fn fill_ratio(&self) -> f32 {
        if self.total_chunks == 0 {
            0.0
        } else {
            self.active_chunks as f32 / self.total_chunks as f32
        }
    }
}

/// What one worker produced in one round.
#[derive(Default)]
struct RoundOutput {
    writes: Vec<(usize, f32)>,
    raised: Vec<(usize, usize)>,
    wake: Vec<usize>,
}

/// Staged solver that advances a volume wavefront chunk by chunk.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChunkedWavefront {
    steps: usize,
    chunk_size: usize,
    threads: usize,
    attenuation: f32,
    max_volume: f32,
    floor: f32,
}

/// Builder for [`ChunkedWavefront`].
#[derive(Clone, Copy, Debug)]
pub struct ChunkedWavefrontBuilder {
    steps: usize,
    chunk_size: usize,
    threads: usize,
    attenuation: f32,
    max_volume: f32,
    floor: f32,
}

impl ChunkedWavefront {
    /// Create a new builder with [`DEFAULT_STEPS`], [`DEFAULT_CHUNK_SIZE`],
    /// one thread per available core, attenuation 1.0 and max volume 1.0.
    pub fn builder() -> ChunkedWavefrontBuilder {
        ChunkedWavefrontBuilder {
            steps: DEFAULT_STEPS,
            chunk_size: DEFAULT_CHUNK_SIZE,
            threads: thread::available_parallelism().map_or(1, NonZeroUsize::get),
            attenuation: 1.0,
            max_volume: 1.0,
            floor: DEFAULT_FLOOR,
        }
    }

    /// Chunk edge length.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Worker threads per round.
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Advance the wavefront from the seeded cells of `volume`.
    ///
    /// Runs at most `steps + 1` rounds. The delta grid is leased from
    /// `pool` and returned before this returns.
    ///
    /// # Errors
    ///
    /// Returns [`PropagationError::SizeMismatch`] if `volume` and `view`
    /// have different extents.
    pub fn propagate(
        &self,
        volume: &mut Grid3f,
        view: &dyn PassabilityView,
        pool: &ArrayPool,
    ) -> Result<ChunkedStats, PropagationError> {
        check_extents(volume, view)?;
        let size = volume.dims();
        let mut map = ChunkMap::new(size, self.chunk_size).map_err(|_| {
            PropagationError::InvalidParameter {
                name: "chunk_size",
                value: self.chunk_size as f32,
                expected: "at least 1",
            }
        })?;

        for cell in volume.as_mut_slice() {
            *cell = cell.min(self.max_volume);
        }
        map.mark_active_if_seeded(volume);

        let total = map.len();
        let threads = self.threads.clamp(1, total.max(1));
        let mut delta = pool.lease_grid3f(size);
        let mut stats = ChunkedStats {
            total_chunks: total,
            ..ChunkedStats::default()
        };

        for _ in 0..=self.steps {
            let started = Instant::now();
            let outputs = self.round(volume, view, &map, threads);
            for out in outputs {
                for (idx, value) in out.writes {
                    delta[idx] = value;
                }
                for (chunk, count) in out.raised {
                    map.raise_by(chunk, count);
                }
                for chunk in out.wake {
                    map.activate(chunk);
                }
            }
            stats.compute += started.elapsed();

            let started = Instant::now();
            let edited = if self.max_volume <= 1.0 {
                transform_volume_parallel(volume, &delta, threads)
            } else {
                transform_volume_deltas(volume, &delta, self.max_volume)
            };
            delta.clear();
            stats.merge += started.elapsed();

            stats.rounds += 1;
            stats.edited += edited;
            if edited == 0 {
                break;
            }
        }

        pool.free_grid3f(delta);
        stats.active_chunks = map.active_count();
        log::debug!(
            "wavefront: {} rounds, {} cells, {}/{} chunks active, compute {:?}, merge {:?}",
            stats.rounds,
            stats.edited,
            stats.active_chunks,
            stats.total_chunks,
            stats.compute,
            stats.merge
        );
        Ok(stats)
    }

    /// Run one round across `threads` workers and collect their output.
    fn round(
        &self,
        volume: &Grid3f,
        view: &dyn PassabilityView,
        map: &ChunkMap,
        threads: usize,
    ) -> Vec<RoundOutput> {
        let cursor = AtomicUsize::new(0);
        if threads == 1 {
            return vec![self.work(volume, view, map, &cursor)];
        }
        thread::scope(|s| {
            let workers: Vec<_> = (0..threads)
                .map(|_| s.spawn(|| self.work(volume, view, map, &cursor)))
                .collect();
            workers
                .into_iter()
                .map(|w| w.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
                .collect()
        })
    }

    /// Claim chunks until none are left, filling silent cells.
    fn work(
        &self,
        volume: &Grid3f,
        view: &dyn PassabilityView,
        map: &ChunkMap,
        cursor: &AtomicUsize,
    ) -> RoundOutput {
        let mut out = RoundOutput::default();
        loop {
            let index = cursor.fetch_add(1, Ordering::Relaxed);
            if index >= map.len() {
                break;
            }
            let chunk = map.get(index);
            if !chunk.is_active || chunk.is_raise_finished() {
                continue;
            }
            let g = chunk.grid;
            let mut raised = 0;
            volume.for_each_in(&g, |idx, x, y, z| {
                if volume[idx] != 0.0 {
                    return;
                }
                let p = view.passability(x, y, z);
                if p <= 0.0 {
                    return;
                }
                let value = collect_volume_weighted(volume, x, y, z) * p * self.attenuation;
                if value <= self.floor {
                    return;
                }
                out.writes.push((idx, value.min(self.max_volume)));
                raised += 1;

                let mut wake = |dx, dy, dz| {
                    if let Some(n) = map.neighbour_index(index, dx, dy, dz) {
                        out.wake.push(n);
                    }
                };
                if x == g.x0 {
                    wake(-1, 0, 0);
                } else if x == g.x1 - 1 {
                    wake(1, 0, 0);
                }
                if y == g.y0 {
                    wake(0, -1, 0);
                } else if y == g.y1 - 1 {
                    wake(0, 1, 0);
                }
                if z == g.z0 {
                    wake(0, 0, -1);
                } else if z == g.z1 - 1 {
                    wake(0, 0, 1);
                }
            });
            if raised > 0 {
                out.raised.push((index, raised));
            }
        }
        out
    }
}

impl ChunkedWavefrontBuilder {
    /// Rounds after the first (default: [`DEFAULT_STEPS`]).
    pub fn steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    /// Chunk edge length (default: [`DEFAULT_CHUNK_SIZE`]). Must be >= 1.
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Worker threads per round (default: available parallelism). Must
    /// be >= 1.
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Per-step attenuation factor (default: 1.0). Must lie in `(0, 1]`.
    pub fn attenuation(mut self, attenuation: f32) -> Self {
        self.attenuation = attenuation;
        self
    }

    /// Volume ceiling (default: 1.0). Must be finite and > 0.
    pub fn max_volume(mut self, max_volume: f32) -> Self {
        self.max_volume = max_volume;
        self
    }

    /// Floor cutoff (default: [`DEFAULT_FLOOR`]). Must be >= 0.
    pub fn floor(mut self, floor: f32) -> Self {
        self.floor = floor;
        self
    }

    /// Build the solver, validating all parameters.
    ///
    /// # Errors
    ///
    /// Returns [`PropagationError::InvalidParameter`] if `chunk_size` or
    /// `threads` is zero, or a volume parameter is out of range.
    pub fn build(self) -> Result<ChunkedWavefront, PropagationError> {
        if self.chunk_size == 0 {
            return Err(PropagationError::InvalidParameter {
                name: "chunk_size",
                value: 0.0,
                expected: "at least 1",
            });
        }
        if self.threads == 0 {
            return Err(PropagationError::InvalidParameter {
                name: "threads",
                value: 0.0,
                expected: "at least 1",
            });
        }
        check_unit_interval("attenuation", self.attenuation)?;
        check_positive("max_volume", self.max_volume)?;
        check_non_negative("floor", self.floor)?;
        Ok(ChunkedWavefront {
            steps: self.steps,
            chunk_size: self.chunk_size,
            threads: self.threads,
            attenuation: self.attenuation,
            max_volume: self.max_volume,
            floor: self.floor,
        })
    }
}
