//! Per-request performance metrics.
//!
//! [`SimulationMetrics`] captures timing and solver counters for one
//! simulation request. Durations are in microseconds.

use resound_propagators::{ChunkedStats, PropagationStats};

/// Counters from whichever solver served the request.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SolverStats {
    /// Best-first propagation counters.
    BestFirst(PropagationStats),
    /// Chunked wavefront counters and timings.
    Chunked(ChunkedStats),
}

impl Default for SolverStats {
    fn default() -> Self {
        Self::BestFirst(PropagationStats::default())
    }
}

/// Timing and size metrics for one simulation request.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimulationMetrics {
    /// Wall-clock time from dequeue to result, in microseconds.
    pub total_us: u64,
    /// Time spent obtaining the scene window, in microseconds.
    pub scene_us: u64,
    /// Time spent in the solver, in microseconds.
    pub solve_us: u64,
    /// Cells of the window.
    pub window_cells: usize,
    /// Cells holding volume after the solve.
    pub cells_reached: usize,
    /// Solver counters.
    pub solver: SolverStats,
}
