//! Resound quickstart: one sound source in a walled room.
//!
//! Demonstrates:
//!   1. Loading a passability scene into a `SceneBank`
//!   2. Starting an `AcousticSimulator` worker pool
//!   3. Simulating a single source and querying volumes
//!   4. Opening a door and repairing the field with `update_cells`
//!   5. Returning the pooled grid with `finish`
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example quickstart

use std::sync::Arc;

use resound_arena::ArrayPool;
use resound_core::{VoxelPos, WorldId};
use resound_engine::{AcousticSimulationResult, AcousticSimulator, SimulatorConfig};
use resound_space::{ChunkKey, PassabilityGrid, SceneBank, SceneDims};

// ─── Scene layout ───────────────────────────────────────────────

const WORLD: WorldId = WorldId(0);
const EDGE: usize = 16;
const WALL_X: usize = 10;
const DOOR: VoxelPos = VoxelPos { x: 10, y: 8, z: 8 };
const SOURCE: VoxelPos = VoxelPos { x: 4, y: 8, z: 8 };

fn print_row(label: &str, result: &AcousticSimulationResult) {
    let row: Vec<String> = (0..EDGE as i32)
        .map(|x| match result.get_volume(VoxelPos::new(x, SOURCE.y, SOURCE.z)) {
            Some(v) => format!("{v:4.2}"),
            None => "  · ".to_owned(),
        })
        .collect();
    println!("{label:>8}: {}", row.join(" "));
}

// ─── Main ───────────────────────────────────────────────────────

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    println!("=== Resound Quickstart ===\n");

    // A solid wall at x = 10 with a closed door in the middle.
    let dims = SceneDims::new(EDGE, EDGE, EDGE)?;
    let scene = PassabilityGrid::from_fn(dims.size(), |x, _, _| {
        if x == WALL_X {
            0.0
        } else {
            1.0
        }
    })?;
    let bank = Arc::new(SceneBank::new(dims));
    bank.insert_scene(WORLD, ChunkKey::new(0, 0, 0), scene)?;

    let pool = Arc::new(ArrayPool::new());
    let config = SimulatorConfig {
        range: 8,
        performance_debug: true,
        ..Default::default()
    };
    let sim = AcousticSimulator::new(bank.clone(), Arc::clone(&pool), config)?;
    println!("Simulator started with {} workers", sim.worker_count());

    let mut result = sim
        .simulate_single_source(WORLD, SOURCE, 1.0, 1.0, 0.9)
        .wait()?;
    println!(
        "Reached {} of {} cells in {}us\n",
        result.metrics().cells_reached,
        result.metrics().window_cells,
        result.metrics().total_us
    );
    print_row("closed", &result);

    bank.set_passability(WORLD, DOOR, 1.0);
    let stats = result.update_cells(&[DOOR])?;
    println!(
        "\nDoor opened: {} cells updated in {} generations",
        stats.edited, stats.generations
    );
    print_row("open", &result);

    result.finish();
    let stats = pool.stats();
    println!(
        "\nPool: {} hits, {} misses, {} outstanding",
        stats.hits, stats.misses, stats.outstanding
    );
    println!("Done.");
    Ok(())
}
