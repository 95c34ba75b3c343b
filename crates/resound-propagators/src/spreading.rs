//! Single-step spreading and grid merge primitives.
//!
//! These are the building blocks of the incremental solvers. Every
//! primitive keeps reads and writes apart: spreading reads the settled
//! base grid and writes proposals into a separate delta grid, and a merge
//! step folds the delta into the base at a defined synchronization point.
//!
//! ```text
//! spread_volume   base ──read──▶ delta (increments, max per cell)
//!                      forward (visited this generation)
//! transform_*     base ◀──merge── delta
//! ```

use std::thread;

use resound_core::{BoolGrid, Grid3, Grid3f, PassabilityView};

use crate::best_first::DEFAULT_FLOOR;
use crate::grid_helpers::neighbours;

/// Relative margin a proposal must beat the current value by.
pub const DEFAULT_HYSTERESIS: f32 = 0.02;

/// Thresholds applied when proposing spread values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpreadParams {
    /// A proposal must exceed `current * (1 + hysteresis)`.
    pub hysteresis: f32,
    /// Proposals at or below this are dropped.
    pub floor: f32,
}

impl Default for SpreadParams {
    fn default() -> Self {
        Self {
            hysteresis: DEFAULT_HYSTERESIS,
            floor: DEFAULT_FLOOR,
        }
    }
}

/// Spreads volume one step outward using a fixed set of [`SpreadParams`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Spreader {
    params: SpreadParams,
}

impl Spreader {
    /// A spreader with custom thresholds.
    pub fn new(params: SpreadParams) -> Self {
        Self { params }
    }

    /// Thresholds in use.
    pub fn params(&self) -> SpreadParams {
        self.params
    }

    /// Expand the cell at `(x, y, z)` one step into its neighbours.
    ///
    /// Marks the cell in `forward`; a cell already marked is skipped, so
    /// repeated calls in one generation are idempotent. For each
    /// neighbour the proposal `volume * passability * attenuation` is
    /// recorded in `delta` as the increment over the neighbour's current
    /// value, keeping the largest increment if several proposals land on
    /// the same cell.
    ///
    /// Returns the number of proposals recorded.
    #[allow(clippy::too_many_arguments)]
    pub fn spread(
        &self,
        vol: &Grid3f,
        view: &dyn PassabilityView,
        delta: &mut Grid3f,
        forward: &mut BoolGrid,
        attenuation: f32,
        x: usize,
        y: usize,
        z: usize,
    ) -> usize {
        let idx = vol.index_of(x, y, z);
        if forward[idx] {
            return 0;
        }
        forward[idx] = true;

        let volume = vol[idx];
        if volume <= 0.0 {
            return 0;
        }
        let mut proposed = 0;
        for (ni, nx, ny, nz) in neighbours(vol, x, y, z) {
            let p = view.passability(nx, ny, nz);
            if p <= 0.0 {
                continue;
            }
            let spread = volume * p * attenuation;
            if spread <= self.params.floor {
                continue;
            }
            let current = vol[ni];
            if spread > current * (1.0 + self.params.hysteresis) {
                let increment = spread - current;
                if increment > delta[ni] {
                    delta[ni] = increment;
                }
                proposed += 1;
            }
        }
        proposed
    }
}

/// [`Spreader::spread`] with the default thresholds.
#[allow(clippy::too_many_arguments)]
pub fn spread_volume(
    vol: &Grid3f,
    view: &dyn PassabilityView,
    delta: &mut Grid3f,
    forward: &mut BoolGrid,
    attenuation: f32,
    x: usize,
    y: usize,
    z: usize,
) -> usize {
    Spreader::default().spread(vol, view, delta, forward, attenuation, x, y, z)
}

/// Replace `base` with `new` cell by cell.
///
/// Both grids must have the same extents. Returns the number of cells
/// whose value changed.
pub fn transform_volume(base: &mut Grid3f, new: &Grid3f) -> usize {
    debug_assert_eq!(base.dims(), new.dims());
    let mut edited = 0;
    for (b, &n) in base.as_mut_slice().iter_mut().zip(new.as_slice()) {
        if *b != n {
            *b = n;
            edited += 1;
        }
    }
    edited
}

/// Add `delta` into `base`, capping each cell at `clamp`, and call
/// `on_change` with every index whose value changed.
pub(crate) fn merge_deltas<F>(base: &mut Grid3f, delta: &Grid3f, clamp: f32, mut on_change: F) -> usize
where
    F: FnMut(usize),
{
    debug_assert_eq!(base.dims(), delta.dims());
    let mut edited = 0;
    for (i, (b, &d)) in base
        .as_mut_slice()
        .iter_mut()
        .zip(delta.as_slice())
        .enumerate()
    {
        if d == 0.0 {
            continue;
        }
        let merged = (*b + d).min(clamp);
        if merged != *b {
            *b = merged;
            edited += 1;
            on_change(i);
        }
    }
    edited
}

/// Additive merge: `base[i] = min(base[i] + delta[i], clamp)`.
///
/// Both grids must have the same extents. Returns the number of cells
/// whose value changed.
pub fn transform_volume_deltas(base: &mut Grid3f, delta: &Grid3f, clamp: f32) -> usize {
    merge_deltas(base, delta, clamp, |_| {})
}

/// Fill the silent cells of one partition from its delta slice.
fn fill_silent(base: &mut [f32], delta: &[f32]) -> usize {
    let mut edited = 0;
    for (b, &d) in base.iter_mut().zip(delta) {
        if *b == 0.0 && d != 0.0 {
            let merged = (*b + d).clamp(0.0, 1.0);
            if merged != *b {
                *b = merged;
                edited += 1;
            }
        }
    }
    edited
}

/// Parallel merge over contiguous index partitions.
///
/// The linear index range is split into `threads` non-overlapping
/// partitions of `len / threads` cells, the last absorbing the
/// remainder. Each partition sets `base[i] = clamp01(base[i] + delta[i])`
/// where `base[i]` was zero and `delta[i]` is nonzero. All partitions
/// are joined before this returns.
///
/// Returns the number of cells whose value changed.
pub fn transform_volume_parallel(base: &mut Grid3f, delta: &Grid3f, threads: usize) -> usize {
    debug_assert_eq!(base.dims(), delta.dims());
    let threads = threads.max(1);
    let len = base.cell_count();
    let part = len / threads;
    if threads == 1 || part == 0 {
        return fill_silent(base.as_mut_slice(), delta.as_slice());
    }

    thread::scope(|s| {
        let mut rest = base.as_mut_slice();
        let mut rest_delta = delta.as_slice();
        let mut workers = Vec::with_capacity(threads);
        for t in 0..threads {
            let take = if t == threads - 1 { rest.len() } else { part };
            let (head, tail) = std::mem::take(&mut rest).split_at_mut(take);
            let (delta_head, delta_tail) = rest_delta.split_at(take);
            rest = tail;
            rest_delta = delta_tail;
            workers.push(s.spawn(move || fill_silent(head, delta_head)));
        }
        workers
            .into_iter()
            .map(|w| w.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
            .sum()
    })
}

/// Sum of the in-bounds face neighbours of `(x, y, z)`.
pub fn collect_volume(vol: &Grid3f, x: usize, y: usize, z: usize) -> f32 {
    neighbours(vol, x, y, z)
        .iter()
        .map(|&(ni, ..)| vol[ni])
        .sum()
}

/// Mean of the nonzero face neighbours of `(x, y, z)`, optionally
/// counting the cell itself when it is nonzero. Zero when nothing
/// qualifies.
pub fn collect_volume_avg(vol: &Grid3f, x: usize, y: usize, z: usize, include_self: bool) -> f32 {
    let mut sum = 0.0;
    let mut count = 0u32;
    if include_self {
        let own = vol.get(x, y, z);
        if own != 0.0 {
            sum += own;
            count += 1;
        }
    }
    for (ni, ..) in neighbours(vol, x, y, z) {
        let v = vol[ni];
        if v != 0.0 {
            sum += v;
            count += 1;
        }
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f32
    }
}

/// Volume-weighted mean of the positive face neighbours of `(x, y, z)`:
/// `Σ v² / Σ v`. Louder neighbours dominate quieter ones.
pub fn collect_volume_weighted(vol: &Grid3f, x: usize, y: usize, z: usize) -> f32 {
    let mut weighted = 0.0;
    let mut total = 0.0;
    for (ni, ..) in neighbours(vol, x, y, z) {
        let v = vol[ni];
        if v > 0.0 {
            weighted += v * v;
            total += v;
        }
    }
    if total > 0.0 {
        weighted / total
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use resound_core::SceneSize;
    use resound_test_utils::{FnView, UniformView};

    fn line(values: &[f32]) -> Grid3f {
        Grid3f::from_vec(SceneSize::new(values.len(), 1, 1), values.to_vec()).unwrap()
    }

    // ── spread_volume ───────────────────────────────────────────

    #[test]
    fn spread_proposes_increments_to_neighbours() {
        let vol = line(&[0.0, 1.0, 0.25]);
        let size = vol.dims();
        let mut delta = Grid3f::zeroed(size);
        let mut forward = BoolGrid::filled(size, false);
        let n = spread_volume(&vol, &UniformView::open(size), &mut delta, &mut forward, 0.5, 1, 0, 0);
        assert_eq!(n, 2);
        assert_eq!(delta.as_slice(), &[0.5, 0.0, 0.25]);
        assert!(forward[1]);
    }

    #[test]
    fn spread_is_idempotent_per_generation() {
        let vol = line(&[1.0, 0.0]);
        let size = vol.dims();
        let mut delta = Grid3f::zeroed(size);
        let mut forward = BoolGrid::filled(size, false);
        let view = UniformView::open(size);
        assert_eq!(spread_volume(&vol, &view, &mut delta, &mut forward, 0.5, 0, 0, 0), 1);
        assert_eq!(spread_volume(&vol, &view, &mut delta, &mut forward, 0.5, 0, 0, 0), 0);
        assert_eq!(delta.as_slice(), &[0.0, 0.5]);
    }

    #[test]
    fn spread_respects_hysteresis() {
        // 0.5 vs current 0.495: within 2%, not proposed.
        let vol = line(&[1.0, 0.495]);
        let size = vol.dims();
        let mut delta = Grid3f::zeroed(size);
        let mut forward = BoolGrid::filled(size, false);
        let n = spread_volume(&vol, &UniformView::open(size), &mut delta, &mut forward, 0.5, 0, 0, 0);
        assert_eq!(n, 0);
        assert_eq!(delta[1], 0.0);

        // With no hysteresis the same proposal goes through.
        let strict = Spreader::new(SpreadParams {
            hysteresis: 0.0,
            floor: DEFAULT_FLOOR,
        });
        forward.fill(false);
        let n = strict.spread(&vol, &UniformView::open(size), &mut delta, &mut forward, 0.5, 0, 0, 0);
        assert_eq!(n, 1);
    }

    #[test]
    fn spread_skips_floor_and_blocked_edges() {
        let vol = line(&[0.0, 0.015, 0.0]);
        let size = vol.dims();
        let view = FnView::new(size, |x, _, _| if x == 0 { 0.0 } else { 1.0 });
        let mut delta = Grid3f::zeroed(size);
        let mut forward = BoolGrid::filled(size, false);
        // x=0 blocked; x=2 gets 0.0075, below the floor.
        assert_eq!(spread_volume(&vol, &view, &mut delta, &mut forward, 0.5, 1, 0, 0), 0);
        assert_eq!(delta.count_positive(), 0);
    }

    #[test]
    fn spread_keeps_largest_increment() {
        let vol = line(&[1.0, 0.0, 0.5]);
        let size = vol.dims();
        let view = UniformView::open(size);
        let mut delta = Grid3f::zeroed(size);
        let mut forward = BoolGrid::filled(size, false);
        spread_volume(&vol, &view, &mut delta, &mut forward, 0.5, 2, 0, 0);
        spread_volume(&vol, &view, &mut delta, &mut forward, 0.5, 0, 0, 0);
        assert_eq!(delta[1], 0.5);
    }

    // ── Merges ──────────────────────────────────────────────────

    #[test]
    fn transform_volume_replaces_and_counts() {
        let mut base = line(&[0.0, 0.5, 1.0]);
        let new = line(&[0.0, 0.7, 0.2]);
        assert_eq!(transform_volume(&mut base, &new), 2);
        assert_eq!(base, new);
        assert_eq!(transform_volume(&mut base, &new), 0);
    }

    #[test]
    fn transform_volume_deltas_adds_and_clamps() {
        let mut base = line(&[0.0, 0.5, 0.9, 0.3]);
        let delta = line(&[0.25, 0.0, 0.5, 0.1]);
        let edited = transform_volume_deltas(&mut base, &delta, 1.0);
        assert_eq!(edited, 3);
        assert_eq!(base.get(0, 0, 0), 0.25);
        assert_eq!(base.get(1, 0, 0), 0.5);
        assert_eq!(base.get(2, 0, 0), 1.0);
        assert!((base.get(3, 0, 0) - 0.4).abs() < 1e-6);

        // Already at the cap: no change counted.
        let mut capped = line(&[1.0]);
        assert_eq!(transform_volume_deltas(&mut capped, &line(&[0.5]), 1.0), 0);
    }

    #[test]
    fn parallel_merge_only_fills_silent_cells() {
        let mut base = line(&[0.0, 0.4, 0.0, 0.0]);
        let delta = line(&[0.3, 0.3, 1.7, 0.0]);
        let edited = transform_volume_parallel(&mut base, &delta, 3);
        assert_eq!(edited, 2);
        assert_eq!(base.as_slice(), &[0.3, 0.4, 1.0, 0.0]);
    }

    #[test]
    fn parallel_merge_handles_more_threads_than_cells() {
        let mut base = line(&[0.0, 0.0]);
        let delta = line(&[0.5, 0.5]);
        assert_eq!(transform_volume_parallel(&mut base, &delta, 16), 2);
        assert_eq!(base.as_slice(), &[0.5, 0.5]);
    }

    // ── Aggregation ─────────────────────────────────────────────

    #[test]
    fn collect_volume_sums_neighbours() {
        let vol = line(&[0.25, 1.0, 0.5]);
        assert_eq!(collect_volume(&vol, 1, 0, 0), 0.75);
        assert_eq!(collect_volume(&vol, 0, 0, 0), 1.0);
    }

    #[test]
    fn collect_volume_avg_ignores_silent_neighbours() {
        let vol = line(&[0.0, 0.5, 1.0, 0.0]);
        assert_eq!(collect_volume_avg(&vol, 1, 0, 0, false), 1.0);
        assert_eq!(collect_volume_avg(&vol, 1, 0, 0, true), 0.75);
        assert_eq!(collect_volume_avg(&vol, 3, 0, 0, true), 1.0);
        assert_eq!(collect_volume_avg(&line(&[0.0, 0.0]), 0, 0, 0, true), 0.0);
    }

    #[test]
    fn collect_volume_weighted_favours_loud_neighbours() {
        let vol = line(&[1.0, 0.0, 0.5]);
        // (1 + 0.25) / 1.5
        let w = collect_volume_weighted(&vol, 1, 0, 0);
        assert!((w - 1.25 / 1.5).abs() < 1e-6);
        assert_eq!(collect_volume_weighted(&line(&[0.0, 0.0]), 0, 0, 0), 0.0);
    }

    proptest! {
        #[test]
        fn parallel_merge_fills_exactly_the_silent_cells(
            cells in proptest::collection::vec((0u8..3, 0.0f32..1.5), 1..200),
            threads in 1usize..9,
        ) {
            let size = SceneSize::new(cells.len(), 1, 1);
            let base_vals: Vec<f32> = cells
                .iter()
                .map(|&(kind, v)| if kind == 0 { 0.0 } else { v.min(1.0) })
                .collect();
            let delta_vals: Vec<f32> = cells
                .iter()
                .map(|&(kind, v)| if kind == 2 { 0.0 } else { v })
                .collect();

            let mut expected = base_vals.clone();
            let mut expected_edits = 0;
            for (b, &d) in expected.iter_mut().zip(&delta_vals) {
                if *b == 0.0 && d != 0.0 {
                    *b = (*b + d).clamp(0.0, 1.0);
                    expected_edits += 1;
                }
            }

            let delta = Grid3f::from_vec(size, delta_vals).unwrap();
            let mut merged = Grid3f::from_vec(size, base_vals).unwrap();
            let edited = transform_volume_parallel(&mut merged, &delta, threads);

            prop_assert_eq!(edited, expected_edits);
            prop_assert_eq!(merged.as_slice(), expected.as_slice());
        }
    }
}
