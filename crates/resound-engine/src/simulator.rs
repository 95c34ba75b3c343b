//! Simulation worker pool.
//!
//! [`AcousticSimulator`] owns a fixed set of named worker threads fed by a
//! crossbeam task channel. Each request carries its own bounded(1) reply
//! channel, so callers block only on the request they care about:
//!
//! ```text
//! caller ──SimTask──▶ [task channel] ──▶ resound-sim-{i}
//!    ▲                                        │ scene_around
//!    │                                        │ lease + seed
//!    │                                        │ solve
//!    └──────── bounded(1) reply ◀─────────────┘
//! ```
//!
//! The volume grid is moved into the worker, filled, and moved back out
//! inside the [`AcousticSimulationResult`].

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use resound_arena::ArrayPool;
use resound_core::{
    Grid3f, PassabilityView, PropagationError, SceneProvider, SimulationError, VoxelPos, WorldId,
};
use resound_propagators::{BestFirst, ChunkedWavefront, Respread};

use crate::config::{ConfigError, SimulatorConfig, SolverKind};
use crate::metrics::{SimulationMetrics, SolverStats};
use crate::result::AcousticSimulationResult;

type Reply = Result<AcousticSimulationResult, SimulationError>;

// ── SimTask ────────────────────────────────────────────────────────

struct SimTask {
    world: WorldId,
    source: VoxelPos,
    volume: f32,
    max_volume: f32,
    attenuation: f32,
    reply: Sender<Reply>,
}

/// State every worker reads.
struct WorkerShared {
    provider: Arc<dyn SceneProvider>,
    pool: Arc<ArrayPool>,
    config: SimulatorConfig,
    solver_threads: usize,
}

// ── PendingSimulation ──────────────────────────────────────────────

/// Handle to a request in flight.
///
/// The result is delivered exactly once: after [`try_wait`] or
/// [`wait_timeout`] has returned `Some`, further polling reports
/// [`SimulationError::WorkerStopped`].
///
/// [`try_wait`]: PendingSimulation::try_wait
/// [`wait_timeout`]: PendingSimulation::wait_timeout
#[derive(Debug)]
pub struct PendingSimulation {
    reply: Receiver<Reply>,
}

impl PendingSimulation {
    /// Block until the worker finishes.
    pub fn wait(self) -> Result<AcousticSimulationResult, SimulationError> {
        self.reply
            .recv()
            .unwrap_or(Err(SimulationError::WorkerStopped))
    }

    /// Return the outcome if the worker has finished, without blocking.
    pub fn try_wait(&self) -> Option<Result<AcousticSimulationResult, SimulationError>> {
        match self.reply.try_recv() {
            Ok(reply) => Some(reply),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(SimulationError::WorkerStopped)),
        }
    }

    /// Block for at most `timeout`.
    pub fn wait_timeout(
        &self,
        timeout: Duration,
    ) -> Option<Result<AcousticSimulationResult, SimulationError>> {
        match self.reply.recv_timeout(timeout) {
            Ok(reply) => Some(reply),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err(SimulationError::WorkerStopped)),
        }
    }
}

// ── ShutdownReport ─────────────────────────────────────────────────

/// Outcome of [`AcousticSimulator::shutdown`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Wall-clock time spent joining, in milliseconds.
    pub total_ms: u64,
    /// Workers that exited cleanly.
    pub workers_joined: usize,
    /// Workers that had panicked.
    pub workers_panicked: usize,
}

// ── AcousticSimulator ──────────────────────────────────────────────

/// Acoustic simulation facade backed by a worker pool.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use resound_arena::ArrayPool;
/// use resound_core::{VoxelPos, WorldId};
/// use resound_engine::{AcousticSimulator, SimulatorConfig};
/// use resound_space::{ChunkKey, PassabilityGrid, SceneBank, SceneDims};
///
/// let dims = SceneDims::new(16, 16, 16).unwrap();
/// let bank = Arc::new(SceneBank::new(dims));
/// let scene = PassabilityGrid::filled(dims.size(), 1.0).unwrap();
/// bank.insert_scene(WorldId(0), ChunkKey::new(0, 0, 0), scene).unwrap();
///
/// let config = SimulatorConfig { range: 4, worker_threads: Some(1), ..Default::default() };
/// let sim = AcousticSimulator::new(bank, Arc::new(ArrayPool::new()), config).unwrap();
///
/// let result = sim
///     .simulate_single_source(WorldId(0), VoxelPos::new(8, 8, 8), 1.0, 1.0, 0.5)
///     .wait()
///     .unwrap();
/// assert_eq!(result.get_volume(VoxelPos::new(9, 8, 8)), Some(0.5));
/// result.finish();
/// ```
pub struct AcousticSimulator {
    shared: Arc<WorkerShared>,
    task_tx: Option<Sender<SimTask>>,
    workers: Vec<JoinHandle<()>>,
}

impl AcousticSimulator {
    /// Validate `config` and spawn the worker pool.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration is invalid or a worker
    /// thread cannot be spawned. Workers spawned before a failure are
    /// shut down again.
    pub fn new(
        provider: Arc<dyn SceneProvider>,
        pool: Arc<ArrayPool>,
        config: SimulatorConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let worker_count = config.resolved_worker_threads();
        let solver_threads = config.resolved_solver_threads();
        let shared = Arc::new(WorkerShared {
            provider,
            pool,
            config,
            solver_threads,
        });

        let (task_tx, task_rx) = crossbeam_channel::unbounded::<SimTask>();
        let mut sim = Self {
            shared,
            task_tx: Some(task_tx),
            workers: Vec::with_capacity(worker_count),
        };
        for i in 0..worker_count {
            let rx = task_rx.clone();
            let shared = Arc::clone(&sim.shared);
            let handle = thread::Builder::new()
                .name(format!("resound-sim-{i}"))
                .spawn(move || worker_loop(&rx, &shared))
                .map_err(|e| ConfigError::ThreadSpawnFailed {
                    reason: e.to_string(),
                })?;
            sim.workers.push(handle);
        }
        log::debug!(
            "acoustic simulator started with {worker_count} workers ({:?} solver)",
            sim.shared.config.solver
        );
        Ok(sim)
    }

    /// The validated configuration.
    pub fn config(&self) -> &SimulatorConfig {
        &self.shared.config
    }

    /// The pool volume grids are leased from.
    pub fn pool(&self) -> &Arc<ArrayPool> {
        &self.shared.pool
    }

    /// Number of live worker threads.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Queue a single-source simulation.
    ///
    /// The source cell is seeded with `min(volume, max_volume)` and the
    /// field is propagated with per-step `attenuation`. Parameter and
    /// scene errors are reported through the returned handle. After
    /// [`shutdown`](Self::shutdown) every request resolves to
    /// [`SimulationError::WorkerStopped`].
    pub fn simulate_single_source(
        &self,
        world: WorldId,
        pos: VoxelPos,
        volume: f32,
        max_volume: f32,
        attenuation: f32,
    ) -> PendingSimulation {
        let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
        let task = SimTask {
            world,
            source: pos,
            volume,
            max_volume,
            attenuation,
            reply: reply_tx,
        };
        if let Some(tx) = &self.task_tx {
            // A failed send drops the reply sender; the handle then
            // reports WorkerStopped.
            let _ = tx.send(task);
        }
        PendingSimulation { reply: reply_rx }
    }

    /// Close the task channel and join every worker.
    ///
    /// Requests already queued are still served. Idempotent.
    pub fn shutdown(&mut self) -> ShutdownReport {
        let start = Instant::now();
        self.task_tx.take();

        let mut report = ShutdownReport::default();
        for handle in self.workers.drain(..) {
            let name = handle.thread().name().unwrap_or("resound-sim").to_owned();
            match handle.join() {
                Ok(()) => report.workers_joined += 1,
                Err(_) => {
                    log::warn!("simulation worker {name} panicked");
                    report.workers_panicked += 1;
                }
            }
        }
        report.total_ms = start.elapsed().as_millis() as u64;
        report
    }
}

impl Drop for AcousticSimulator {
    fn drop(&mut self) {
        if self.task_tx.is_some() || !self.workers.is_empty() {
            self.shutdown();
        }
    }
}

impl std::fmt::Debug for AcousticSimulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AcousticSimulator")
            .field("config", &self.shared.config)
            .field("workers", &self.workers.len())
            .field("running", &self.task_tx.is_some())
            .finish()
    }
}

// ── Worker ─────────────────────────────────────────────────────────

fn worker_loop(rx: &Receiver<SimTask>, shared: &WorkerShared) {
    for task in rx.iter() {
        let reply = simulate(shared, &task);
        // Caller dropped its handle: hand the grid back ourselves.
        if let Err(crossbeam_channel::SendError(Ok(orphan))) = task.reply.send(reply) {
            orphan.finish();
        }
    }
}

enum Solver {
    BestFirst(BestFirst),
    Chunked(ChunkedWavefront),
}

impl Solver {
    fn build(shared: &WorkerShared, task: &SimTask) -> Result<Self, PropagationError> {
        let config = &shared.config;
        Ok(match config.solver {
            SolverKind::BestFirst => Solver::BestFirst(
                BestFirst::builder()
                    .attenuation(task.attenuation)
                    .max_volume(task.max_volume)
                    .build()?,
            ),
            SolverKind::Chunked => Solver::Chunked(
                ChunkedWavefront::builder()
                    .attenuation(task.attenuation)
                    .max_volume(task.max_volume)
                    .steps(config.steps)
                    .chunk_size(config.chunk_size)
                    .threads(shared.solver_threads)
                    .build()?,
            ),
        })
    }

    fn run(
        &self,
        volume: &mut Grid3f,
        view: &dyn PassabilityView,
        pool: &ArrayPool,
    ) -> Result<SolverStats, PropagationError> {
        match self {
            Solver::BestFirst(s) => s.propagate(volume, view).map(SolverStats::BestFirst),
            Solver::Chunked(s) => s.propagate(volume, view, pool).map(SolverStats::Chunked),
        }
    }
}

fn simulate(shared: &WorkerShared, task: &SimTask) -> Reply {
    let start = Instant::now();

    let solver = Solver::build(shared, task)?;
    let respread = Respread::builder()
        .attenuation(task.attenuation)
        .max_volume(task.max_volume)
        .max_generations(shared.config.respread_generations)
        .build()?;
    if task.volume.is_nan() || task.volume < 0.0 {
        return Err(PropagationError::InvalidParameter {
            name: "volume",
            value: task.volume,
            expected: "a non-negative number",
        }
        .into());
    }

    let window = shared
        .provider
        .scene_around(task.world, task.source, shared.config.range)?;
    let scene_done = Instant::now();
    let (x, y, z) = window
        .world_to_local(task.source)
        .ok_or(SimulationError::InvalidSourcePosition { pos: task.source })?;

    let size = window.size();
    let mut volume = shared.pool.lease_grid3f(size);
    volume.set(x, y, z, task.volume.min(task.max_volume));

    let solver_stats = match solver.run(&mut volume, &*window.view, &shared.pool) {
        Ok(stats) => stats,
        Err(e) => {
            shared.pool.free_grid3f(volume);
            return Err(e.into());
        }
    };
    let solve_done = Instant::now();

    let metrics = SimulationMetrics {
        total_us: solve_done.duration_since(start).as_micros() as u64,
        scene_us: scene_done.duration_since(start).as_micros() as u64,
        solve_us: solve_done.duration_since(scene_done).as_micros() as u64,
        window_cells: size.len(),
        cells_reached: volume.count_positive(),
        solver: solver_stats,
    };
    if shared.config.performance_debug {
        log::info!(
            "simulated {} in world {}: {} of {} cells reached, scene {}us, solve {}us",
            task.source,
            task.world,
            metrics.cells_reached,
            metrics.window_cells,
            metrics.scene_us,
            metrics.solve_us
        );
    }

    Ok(AcousticSimulationResult::new(
        task.world,
        task.source,
        shared.config.range,
        window,
        volume,
        Arc::clone(&shared.pool),
        Arc::clone(&shared.provider),
        respread,
        metrics,
    ))
}
