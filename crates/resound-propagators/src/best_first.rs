//! Best-first (Dijkstra-style) volume propagation.
//!
//! Volume flows outward from every seeded cell along face-adjacent edges,
//! losing a factor of `passability * attenuation` per step:
//!
//! ```text
//! candidate = min(volume * passability(neighbour) * attenuation, max_volume)
//! ```
//!
//! Cells are expanded in decreasing volume order from a max-heap. Because
//! the per-step factor never exceeds 1, a cell's value is final the first
//! time it is popped, so the settled grid holds, for every cell, the best
//! path value from any source. Superseded heap entries are discarded on
//! pop (lazy deletion) instead of being updated in place.
//!
//! Constructed via the builder pattern: [`BestFirst::builder`].

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use resound_core::{Grid3, Grid3f, PassabilityView, PropagationError};

use crate::grid_helpers::{
    check_extents, check_non_negative, check_positive, check_unit_interval, neighbours,
};

/// Minimum improvement before a cell is overwritten.
pub const DEFAULT_EPSILON: f32 = 1e-6;

/// Volumes at or below this are treated as silence and not propagated.
pub const DEFAULT_FLOOR: f32 = 0.01;

/// A pending heap entry. Orders by volume, then by lower linear index.
#[derive(Clone, Copy, Debug)]
struct Node {
    volume: f32,
    index: usize,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Node {}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        self.volume
            .total_cmp(&other.volume)
            .then_with(|| other.index.cmp(&self.index))
    }
}

/// Counters from one [`BestFirst::propagate`] run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PropagationStats {
    /// Cells holding volume before propagation started.
    pub seeded: usize,
    /// Heap entries popped.
    pub popped: usize,
    /// Popped entries discarded as superseded.
    pub stale: usize,
    /// Heap entries pushed after the initial seeding.
    pub pushed: usize,
    /// Cells holding volume after propagation.
    pub reached: usize,
}

/// The authoritative full-scene solver.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BestFirst {
    attenuation: f32,
    max_volume: f32,
    floor: f32,
    epsilon: f32,
}

/// Builder for [`BestFirst`].
#[derive(Clone, Copy, Debug)]
pub struct BestFirstBuilder {
    attenuation: f32,
    max_volume: f32,
    floor: f32,
    epsilon: f32,
}

impl BestFirst {
    /// Create a new builder with attenuation 1.0 and max volume 1.0.
    pub fn builder() -> BestFirstBuilder {
        BestFirstBuilder {
            attenuation: 1.0,
            max_volume: 1.0,
            floor: DEFAULT_FLOOR,
            epsilon: DEFAULT_EPSILON,
        }
    }

    /// Per-step attenuation factor.
    pub fn attenuation(&self) -> f32 {
        self.attenuation
    }

    /// Volume ceiling.
    pub fn max_volume(&self) -> f32 {
        self.max_volume
    }

    /// Floor cutoff.
    pub fn floor(&self) -> f32 {
        self.floor
    }

    /// Fill `volume` outward from its seeded cells.
    ///
    /// Every cell holding a positive value on entry is a source. Sources
    /// above the ceiling are clamped to it first.
    ///
    /// # Errors
    ///
    /// Returns [`PropagationError::SizeMismatch`] if `volume` and `view`
    /// have different extents.
    pub fn propagate(
        &self,
        volume: &mut Grid3f,
        view: &dyn PassabilityView,
    ) -> Result<PropagationStats, PropagationError> {
        check_extents(volume, view)?;

        let mut stats = PropagationStats::default();
        let mut heap = BinaryHeap::new();
        for (index, cell) in volume.as_mut_slice().iter_mut().enumerate() {
            if *cell > 0.0 {
                *cell = cell.min(self.max_volume);
                heap.push(Node {
                    volume: *cell,
                    index,
                });
            }
        }
        stats.seeded = heap.len();

        while let Some(node) = heap.pop() {
            stats.popped += 1;
            if volume[node.index] > node.volume + self.epsilon {
                stats.stale += 1;
                continue;
            }
            let (x, y, z) = volume.pos_of(node.index);
            for (ni, nx, ny, nz) in neighbours(&*volume, x, y, z) {
                let p = view.passability(nx, ny, nz);
                if p <= 0.0 {
                    continue;
                }
                let candidate = (node.volume * p * self.attenuation).min(self.max_volume);
                if candidate <= self.floor {
                    continue;
                }
                if candidate > volume[ni] + self.epsilon {
                    volume[ni] = candidate;
                    heap.push(Node {
                        volume: candidate,
                        index: ni,
                    });
                    stats.pushed += 1;
                }
            }
        }

        stats.reached = volume.count_positive();
        log::debug!(
            "best-first settled {} cells from {} seeds ({} pops, {} stale)",
            stats.reached,
            stats.seeded,
            stats.popped,
            stats.stale
        );
        Ok(stats)
    }
}

impl BestFirstBuilder {
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

    /// Overwrite margin (default: [`DEFAULT_EPSILON`]). Must be >= 0.
    pub fn epsilon(mut self, epsilon: f32) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Build the solver, validating all parameters.
    ///
    /// # Errors
    ///
    /// Returns [`PropagationError::InvalidParameter`] if:
    /// - `attenuation` is outside `(0, 1]` or NaN
    /// - `max_volume` is not finite and > 0
    /// - `floor` or `epsilon` is negative or not finite
    pub fn build(self) -> Result<BestFirst, PropagationError> {
        check_unit_interval("attenuation", self.attenuation)?;
        check_positive("max_volume", self.max_volume)?;
        check_non_negative("floor", self.floor)?;
        check_non_negative("epsilon", self.epsilon)?;
        Ok(BestFirst {
            attenuation: self.attenuation,
            max_volume: self.max_volume,
            floor: self.floor,
            epsilon: self.epsilon,
        })
    }
}
