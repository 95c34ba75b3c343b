//! Integration test: the simulator facade over an in-memory scene bank.
//!
//! Covers the request lifecycle end to end: scene lookup, seeding,
//! solving with either solver, per-position queries, incremental repair
//! after a scene edit, debug snapshots, and returning the grid to the
//! pool.

use std::sync::Arc;

use resound_arena::ArrayPool;
use resound_core::{SimulationError, VoxelPos, WorldId};
use resound_engine::{
    AcousticSimulator, ConfigError, SimulatorConfig, SolverKind, SolverStats, MAX_RANGE,
};
use resound_space::{ChunkKey, PassabilityGrid, SceneBank, SceneDims};
use resound_test_utils::{StaticProvider, UniformView};

const WORLD: WorldId = WorldId(7);
const SOURCE: VoxelPos = VoxelPos::new(6, 8, 8);
const DOOR: VoxelPos = VoxelPos::new(10, 8, 8);

// ── Helpers ─────────────────────────────────────────────────────────

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn open_bank() -> Arc<SceneBank> {
    let dims = SceneDims::new(16, 16, 16).unwrap();
    let bank = Arc::new(SceneBank::new(dims));
    let scene = PassabilityGrid::filled(dims.size(), 1.0).unwrap();
    bank.insert_scene(WORLD, ChunkKey::new(0, 0, 0), scene).unwrap();
    bank
}

/// A solid wall across x = 10.
fn walled_bank() -> Arc<SceneBank> {
    let dims = SceneDims::new(16, 16, 16).unwrap();
    let bank = Arc::new(SceneBank::new(dims));
    let scene =
        PassabilityGrid::from_fn(dims.size(), |x, _, _| if x == 10 { 0.0 } else { 1.0 }).unwrap();
    bank.insert_scene(WORLD, ChunkKey::new(0, 0, 0), scene).unwrap();
    bank
}

fn config(solver: SolverKind) -> SimulatorConfig {
    SimulatorConfig {
        range: 4,
        chunk_size: 4,
        solver,
        worker_threads: Some(2),
        solver_threads: Some(2),
        ..Default::default()
    }
}

fn simulator(bank: Arc<SceneBank>, pool: &Arc<ArrayPool>, solver: SolverKind) -> AcousticSimulator {
    init_logging();
    AcousticSimulator::new(bank, Arc::clone(pool), config(solver)).unwrap()
}

// ── Queries ─────────────────────────────────────────────────────────

#[test]
fn volume_is_present_at_source_and_absent_outside_window() {
    let pool = Arc::new(ArrayPool::new());
    let sim = simulator(open_bank(), &pool, SolverKind::BestFirst);
    let result = sim
        .simulate_single_source(WORLD, SOURCE, 1.0, 1.0, 0.5)
        .wait()
        .unwrap();

    assert_eq!(result.get_volume(SOURCE), Some(1.0));
    assert_eq!(result.get_volume(SOURCE.offset(1, 0, 0)), Some(0.5));
    assert_eq!(result.get_volume(SOURCE.offset(0, -2, 0)), Some(0.25));
    // Beyond the floor cutoff.
    assert_eq!(result.get_volume(SOURCE.offset(7, 0, 0)), None);
    // Outside the loaded window.
    assert_eq!(result.get_volume(VoxelPos::new(-1, 8, 8)), None);
    assert_eq!(result.get_volume(VoxelPos::new(16, 8, 8)), None);

    assert!(matches!(result.metrics().solver, SolverStats::BestFirst(_)));
    assert_eq!(result.metrics().window_cells, 16 * 16 * 16);
    result.finish();
    assert_eq!(pool.stats().outstanding, 0);
}

#[test]
fn walls_block_sound() {
    let pool = Arc::new(ArrayPool::new());
    let sim = simulator(walled_bank(), &pool, SolverKind::BestFirst);
    let result = sim
        .simulate_single_source(WORLD, SOURCE, 1.0, 1.0, 0.9)
        .wait()
        .unwrap();
    assert!(result.get_volume(VoxelPos::new(9, 8, 8)).is_some());
    assert_eq!(result.get_volume(DOOR), None);
    assert_eq!(result.get_volume(VoxelPos::new(11, 8, 8)), None);
    result.finish();
}

#[test]
fn chunked_solver_serves_requests() {
    let pool = Arc::new(ArrayPool::new());
    let sim = simulator(open_bank(), &pool, SolverKind::Chunked);
    let result = sim
        .simulate_single_source(WORLD, SOURCE, 1.0, 1.0, 0.5)
        .wait()
        .unwrap();

    assert_eq!(result.get_volume(SOURCE), Some(1.0));
    assert_eq!(result.get_volume(SOURCE.offset(1, 0, 0)), Some(0.5));
    assert_eq!(result.get_volume(SOURCE.offset(2, 0, 0)), Some(0.25));
    match result.metrics().solver {
        SolverStats::Chunked(stats) => {
            assert_eq!(stats.total_chunks, 64);
            assert!(stats.rounds > 1);
            assert!(stats.active_chunks > 1);
        }
        other => panic!("expected chunked stats, got {other:?}"),
    }
    result.finish();
    assert_eq!(pool.stats().outstanding, 0);
}

// ── Errors ──────────────────────────────────────────────────────────

#[test]
fn unknown_world_is_reported() {
    let pool = Arc::new(ArrayPool::new());
    let sim = simulator(open_bank(), &pool, SolverKind::BestFirst);
    let err = sim
        .simulate_single_source(WorldId(99), SOURCE, 1.0, 1.0, 0.5)
        .wait()
        .unwrap_err();
    assert_eq!(err, SimulationError::UnknownWorld { world: WorldId(99) });
    assert_eq!(pool.stats().outstanding, 0);
}

#[test]
fn source_outside_window_is_rejected() {
    init_logging();
    let view = Arc::new(UniformView::open(resound_core::SceneSize::new(8, 4, 8)));
    let provider = Arc::new(StaticProvider::new(WORLD, VoxelPos::new(0, 60, 0), view));
    let pool = Arc::new(ArrayPool::new());
    let sim = AcousticSimulator::new(provider, Arc::clone(&pool), config(SolverKind::BestFirst))
        .unwrap();

    let above = VoxelPos::new(2, 70, 2);
    let err = sim
        .simulate_single_source(WORLD, above, 1.0, 1.0, 0.5)
        .wait()
        .unwrap_err();
    assert_eq!(err, SimulationError::InvalidSourcePosition { pos: above });
    assert_eq!(pool.stats().outstanding, 0);
}

#[test]
fn requests_at_coordinate_limits_keep_the_worker_alive() {
    let bank = open_bank();
    let edge = ChunkKey::new(i32::MAX >> 4, 0, 0);
    let scene = PassabilityGrid::filled(SceneDims::new(16, 16, 16).unwrap().size(), 1.0).unwrap();
    bank.insert_scene(WORLD, edge, scene).unwrap();

    init_logging();
    let pool = Arc::new(ArrayPool::new());
    let single = SimulatorConfig {
        worker_threads: Some(1),
        ..config(SolverKind::BestFirst)
    };
    let sim = AcousticSimulator::new(bank, Arc::clone(&pool), single).unwrap();

    let near_max = VoxelPos::new(i32::MAX - 1, 8, 8);
    let result = sim
        .simulate_single_source(WORLD, near_max, 1.0, 1.0, 0.5)
        .wait()
        .unwrap();
    assert_eq!(result.get_volume(near_max), Some(1.0));
    assert_eq!(result.get_volume(VoxelPos::new(i32::MAX, 8, 8)), Some(0.5));
    result.finish();

    let err = sim
        .simulate_single_source(WORLD, VoxelPos::new(i32::MIN, i32::MIN, i32::MAX), 1.0, 1.0, 0.5)
        .wait()
        .unwrap_err();
    assert!(matches!(err, SimulationError::SceneUnavailable { .. }), "{err}");

    let result = sim
        .simulate_single_source(WORLD, SOURCE, 1.0, 1.0, 0.5)
        .wait()
        .unwrap();
    assert_eq!(result.get_volume(SOURCE), Some(1.0));
    result.finish();
    assert_eq!(pool.stats().outstanding, 0);
}

#[test]
fn oversized_range_is_rejected_at_construction() {
    let pool = Arc::new(ArrayPool::new());
    let huge = SimulatorConfig {
        range: MAX_RANGE + 1,
        ..config(SolverKind::Chunked)
    };
    let err = AcousticSimulator::new(open_bank(), pool, huge).unwrap_err();
    assert_eq!(
        err,
        ConfigError::RangeTooLarge {
            range: MAX_RANGE + 1,
            max: MAX_RANGE
        }
    );
}

// ── Pool lifecycle ──────────────────────────────────────────────────

#[test]
fn finish_returns_grid_for_the_next_request() {
    let pool = Arc::new(ArrayPool::new());
    let sim = simulator(open_bank(), &pool, SolverKind::BestFirst);

    let first = sim
        .simulate_single_source(WORLD, SOURCE, 1.0, 1.0, 0.5)
        .wait()
        .unwrap();
    assert_eq!(pool.stats().misses, 1);
    first.finish();

    let second = sim
        .simulate_single_source(WORLD, SOURCE, 1.0, 1.0, 0.5)
        .wait()
        .unwrap();
    let stats = pool.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(second.get_volume(SOURCE.offset(0, 0, 1)), Some(0.5));
    second.finish();
}

#[test]
fn dropping_without_finish_leaks_but_does_not_crash() {
    let pool = Arc::new(ArrayPool::new());
    let sim = simulator(open_bank(), &pool, SolverKind::BestFirst);

    let leaked = sim
        .simulate_single_source(WORLD, SOURCE, 1.0, 1.0, 0.5)
        .wait()
        .unwrap();
    drop(leaked);
    assert_eq!(pool.stats().outstanding, 1);

    // The pool falls back to a fresh allocation.
    let next = sim
        .simulate_single_source(WORLD, SOURCE, 1.0, 1.0, 0.5)
        .wait()
        .unwrap();
    assert_eq!(pool.stats().misses, 2);
    next.finish();
    assert_eq!(pool.stats().outstanding, 1);
}

// ── Incremental updates ─────────────────────────────────────────────

#[test]
fn opening_a_door_matches_a_fresh_simulation() {
    let bank = walled_bank();
    let pool = Arc::new(ArrayPool::new());
    let sim = simulator(Arc::clone(&bank), &pool, SolverKind::BestFirst);

    let mut result = sim
        .simulate_single_source(WORLD, SOURCE, 1.0, 1.0, 0.5)
        .wait()
        .unwrap();
    assert_eq!(result.get_volume(DOOR), None);

    assert!(bank.set_passability(WORLD, DOOR, 1.0));
    let stats = result.update_cells(&[DOOR]).unwrap();
    assert!(stats.converged);
    assert!(stats.edited > 0);

    let fresh = sim
        .simulate_single_source(WORLD, SOURCE, 1.0, 1.0, 0.5)
        .wait()
        .unwrap();
    assert_eq!(result.get_volume(DOOR), Some(0.0625));
    for z in 0..16 {
        for y in 0..16 {
            for x in 0..16 {
                let pos = VoxelPos::new(x, y, z);
                let expected = fresh.get_volume(pos).unwrap_or(0.0);
                let actual = result.get_volume(pos).unwrap_or(0.0);
                assert!(
                    (actual - expected).abs() <= expected * 0.02 + 1e-6,
                    "{pos}: {actual} vs {expected}"
                );
            }
        }
    }
    assert_eq!(result.metrics().cells_reached, fresh.metrics().cells_reached);
    fresh.finish();
    result.finish();
    assert_eq!(pool.stats().outstanding, 0);
}

#[test]
fn update_fails_once_the_world_is_unloaded() {
    let bank = open_bank();
    let pool = Arc::new(ArrayPool::new());
    let sim = simulator(Arc::clone(&bank), &pool, SolverKind::BestFirst);
    let mut result = sim
        .simulate_single_source(WORLD, SOURCE, 1.0, 1.0, 0.5)
        .wait()
        .unwrap();

    assert_eq!(bank.remove_world(WORLD), 1);
    let err = result.update_cells(&[SOURCE]).unwrap_err();
    assert_eq!(err, SimulationError::UnknownWorld { world: WORLD });
    // The field itself is untouched.
    assert_eq!(result.get_volume(SOURCE), Some(1.0));
    result.finish();
}

// ── Debug output ────────────────────────────────────────────────────

#[test]
fn debug_emits_cube_around_observer_in_grid_order() {
    let pool = Arc::new(ArrayPool::new());
    let sim = simulator(open_bank(), &pool, SolverKind::BestFirst);
    let result = sim
        .simulate_single_source(WORLD, SOURCE, 1.0, 1.0, 0.5)
        .wait()
        .unwrap();

    let mut seen = Vec::new();
    let mut sink = |snapshot: &[(VoxelPos, f32)]| seen.extend_from_slice(snapshot);
    result.debug(SOURCE, &mut sink, 1);

    assert_eq!(seen.len(), 27);
    assert_eq!(seen[0], (SOURCE.offset(-1, -1, -1), 0.125));
    assert_eq!(seen[13], (SOURCE, 1.0));
    let keys: Vec<_> = seen.iter().map(|(p, _)| (p.z, p.y, p.x)).collect();
    let mut sorted = keys.clone();
    sorted.sort_unstable();
    assert_eq!(keys, sorted);
    result.finish();
}
