//! Simulator configuration, validation, and error types.
//!
//! [`SimulatorConfig`] is the input to
//! [`AcousticSimulator::new`](crate::AcousticSimulator::new).
//! [`validate()`](SimulatorConfig::validate) is called by the constructor
//! before any worker thread is spawned.

use std::error::Error;
use std::fmt;

use resound_propagators::incremental::DEFAULT_MAX_GENERATIONS;

// ── SolverKind ─────────────────────────────────────────────────────

/// Which solver fills the volume grid for a request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SolverKind {
    /// Exact best-first propagation over the whole window.
    #[default]
    BestFirst,
    /// Staged multi-threaded wavefront over chunks of the window.
    Chunked,
}

// ── SimulatorConfig ────────────────────────────────────────────────

/// Default half-extent of the simulated window around a source.
pub const DEFAULT_RANGE: u32 = 32;

/// Largest accepted [`SimulatorConfig::range`].
pub const MAX_RANGE: u32 = 256;

/// Default chunk edge length for [`SolverKind::Chunked`].
pub const DEFAULT_CHUNK_SIZE: usize = 32;

/// Default round budget for [`SolverKind::Chunked`].
pub const DEFAULT_STEPS: usize = 100;

/// Configuration for an [`AcousticSimulator`](crate::AcousticSimulator).
#[derive(Clone, Debug, PartialEq)]
pub struct SimulatorConfig {
    /// Cells simulated on every side of the source. Default: 32.
    /// Must lie in `[1, MAX_RANGE]`.
    pub range: u32,
    /// Chunk edge length for the chunked solver. Default: 32.
    pub chunk_size: usize,
    /// Rounds after the first for the chunked solver. Default: 100.
    pub steps: usize,
    /// Solver used for new requests. Default: [`SolverKind::BestFirst`].
    pub solver: SolverKind,
    /// Number of simulation worker threads. `None` = auto-detect
    /// (`available_parallelism / 2`, clamped to `[1, 16]`).
    pub worker_threads: Option<usize>,
    /// Threads the chunked solver uses inside one request. `None` = one
    /// per available core.
    pub solver_threads: Option<usize>,
    /// Generation budget for incremental updates. Default: 256.
    pub respread_generations: usize,
    /// Log per-request timing at `info` level. Default: false.
    pub performance_debug: bool,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            range: DEFAULT_RANGE,
            chunk_size: DEFAULT_CHUNK_SIZE,
            steps: DEFAULT_STEPS,
            solver: SolverKind::default(),
            worker_threads: None,
            solver_threads: None,
            respread_generations: DEFAULT_MAX_GENERATIONS,
            performance_debug: false,
        }
    }
}

fn available_cores() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

impl SimulatorConfig {
    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.range == 0 {
            return Err(ConfigError::ZeroRange);
        }
        if self.range > MAX_RANGE {
            return Err(ConfigError::RangeTooLarge {
                range: self.range,
                max: MAX_RANGE,
            });
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        if self.worker_threads == Some(0) {
            return Err(ConfigError::ZeroThreads {
                field: "worker_threads",
            });
        }
        if self.solver_threads == Some(0) {
            return Err(ConfigError::ZeroThreads {
                field: "solver_threads",
            });
        }
        Ok(())
    }

    /// Resolve the worker count, applying auto-detection if `None`.
    ///
    /// Explicit values are clamped to `[1, 64]`.
    pub fn resolved_worker_threads(&self) -> usize {
        match self.worker_threads {
            Some(n) => n.clamp(1, 64),
            None => (available_cores() / 2).clamp(1, 16),
        }
    }

    /// Resolve the chunked solver's thread count.
    pub fn resolved_solver_threads(&self) -> usize {
        match self.solver_threads {
            Some(n) => n.max(1),
            None => available_cores(),
        }
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected while constructing a simulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `range` is zero.
    ZeroRange,
    /// `range` exceeds [`MAX_RANGE`].
    RangeTooLarge {
        /// Requested range.
        range: u32,
        /// Largest accepted range.
        max: u32,
    },
    /// `chunk_size` is zero.
    ZeroChunkSize,
    /// A thread count was explicitly set to zero.
    ZeroThreads {
        /// Which field.
        field: &'static str,
    },
    /// A worker thread could not be spawned.
    ThreadSpawnFailed {
        /// Description of the failure.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroRange => write!(f, "range must be at least 1"),
            Self::RangeTooLarge { range, max } => {
                write!(f, "range {range} exceeds the maximum of {max}")
            }
            Self::ZeroChunkSize => write!(f, "chunk_size must be at least 1"),
            Self::ZeroThreads { field } => write!(f, "{field} must be at least 1"),
            Self::ThreadSpawnFailed { reason } => write!(f, "thread spawn failed: {reason}"),
        }
    }
}

impl Error for ConfigError {}
