//! Incremental re-spreading after local scene edits.
//!
//! When a few cells change (a door opens, a wall is removed) the settled
//! field is still correct almost everywhere. [`Respread`] repairs it by
//! running spreading generations outward from the edited cells only:
//!
//! ```text
//! frontier = edited cells + their face neighbours
//! loop:
//!     clear delta, clear forward
//!     spread every frontier cell into delta
//!     merge delta into the settled grid (capped at max_volume)
//!     frontier = cells the merge changed
//! ```
//!
//! Only raises volumes. A passability decrease needs a full re-solve.

use resound_arena::ArrayPool;
use resound_core::{Grid3, Grid3f, PassabilityView, PropagationError};

use crate::grid_helpers::{
    check_extents, check_non_negative, check_positive, check_unit_interval, neighbours,
};
use crate::spreading::{merge_deltas, SpreadParams, Spreader};

/// Default generation budget for one repair.
pub const DEFAULT_MAX_GENERATIONS: usize = 256;

/// Counters from one [`Respread::run`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RespreadStats {
    /// Generations executed.
    pub generations: usize,
    /// Total cell changes across all generations.
    pub edited: usize,
    /// The last generation changed nothing.
    pub converged: bool,
}

/// Generation-by-generation repair of a settled volume grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Respread {
    spreader: Spreader,
    attenuation: f32,
    max_volume: f32,
    max_generations: usize,
}

/// Builder for [`Respread`].
#[derive(Clone, Copy, Debug)]
pub struct RespreadBuilder {
    params: SpreadParams,
    attenuation: f32,
    max_volume: f32,
    max_generations: usize,
}

impl Respread {
    /// Create a new builder with attenuation 1.0, max volume 1.0 and the
    /// default spreading thresholds.
    pub fn builder() -> RespreadBuilder {
        RespreadBuilder {
            params: SpreadParams::default(),
            attenuation: 1.0,
            max_volume: 1.0,
            max_generations: DEFAULT_MAX_GENERATIONS,
        }
    }

    /// Repair `volume` around `seeds` (local coordinates).
    ///
    /// Seeds outside the grid are ignored. Delta and visited buffers are
    /// leased from `pool` and returned before this returns.
    ///
    /// # Errors
    ///
    /// Returns [`PropagationError::SizeMismatch`] if `volume` and `view`
    /// have different extents.
    pub fn run(
        &self,
        volume: &mut Grid3f,
        view: &dyn PassabilityView,
        pool: &ArrayPool,
        seeds: &[(usize, usize, usize)],
    ) -> Result<RespreadStats, PropagationError> {
        check_extents(volume, view)?;
        let size = volume.dims();

        let mut frontier = Vec::new();
        for &(x, y, z) in seeds {
            if !volume.contains(x, y, z) {
                continue;
            }
            frontier.push(volume.index_of(x, y, z));
            frontier.extend(neighbours(&*volume, x, y, z).iter().map(|n| n.0));
        }
        frontier.sort_unstable();
        frontier.dedup();

        let mut delta = pool.lease_grid3f(size);
        let mut forward = pool.lease_bool_grid(size);
        let mut next = Vec::new();
        let mut stats = RespreadStats::default();

        while !frontier.is_empty() && stats.generations < self.max_generations {
            delta.clear();
            forward.fill(false);
            for &i in &frontier {
                let (x, y, z) = volume.pos_of(i);
                self.spreader
                    .spread(volume, view, &mut delta, &mut forward, self.attenuation, x, y, z);
            }
            next.clear();
            stats.edited += merge_deltas(volume, &delta, self.max_volume, |i| next.push(i));
            stats.generations += 1;
            std::mem::swap(&mut frontier, &mut next);
        }
        stats.converged = frontier.is_empty();

        pool.free_grid3f(delta);
        pool.free_bool_grid(forward);

        if !stats.converged {
            log::debug!(
                "respread stopped after {} generations with {} cells pending",
                stats.generations,
                frontier.len()
            );
        }
        Ok(stats)
    }
}

impl RespreadBuilder {
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

    /// Spreading thresholds (default: [`SpreadParams::default`]).
    pub fn params(mut self, params: SpreadParams) -> Self {
        self.params = params;
        self
    }

    /// Generation budget (default: [`DEFAULT_MAX_GENERATIONS`]).
    pub fn max_generations(mut self, max_generations: usize) -> Self {
        self.max_generations = max_generations;
        self
    }

    /// Build the driver, validating all parameters.
    ///
    /// # Errors
    ///
    /// Returns [`PropagationError::InvalidParameter`] if `attenuation`
    /// is outside `(0, 1]`, `max_volume` is not positive and finite, or a
    /// threshold is negative.
    pub fn build(self) -> Result<Respread, PropagationError> {
        check_unit_interval("attenuation", self.attenuation)?;
        check_positive("max_volume", self.max_volume)?;
        check_non_negative("hysteresis", self.params.hysteresis)?;
        check_non_negative("floor", self.params.floor)?;
        Ok(Respread {
            spreader: Spreader::new(self.params),
            attenuation: self.attenuation,
            max_volume: self.max_volume,
            max_generations: self.max_generations,
        })
    }
}
