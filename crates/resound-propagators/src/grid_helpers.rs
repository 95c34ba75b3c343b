//! Neighbour lookup and entry-point checks shared by the solvers.

use resound_core::{Grid3, Grid3f, PassabilityView, PropagationError};
use smallvec::SmallVec;

/// The six face-adjacent offsets, `+x -x +y -y +z -z`.
pub(crate) const VON_NEUMANN: [(i64, i64, i64); 6] = [
    (1, 0, 0),
    (-1, 0, 0),
    (0, 1, 0),
    (0, -1, 0),
    (0, 0, 1),
    (0, 0, -1),
];

/// In-bounds face neighbours of `(x, y, z)` as `(index, x, y, z)`.
#[inline]
pub(crate) fn neighbours<G: Grid3 + ?Sized>(
    grid: &G,
    x: usize,
    y: usize,
    z: usize,
) -> SmallVec<[(usize, usize, usize, usize); 6]> {
    let mut result = SmallVec::new();
    for (dx, dy, dz) in VON_NEUMANN {
        let nx = x as i64 + dx;
        let ny = y as i64 + dy;
        let nz = z as i64 + dz;
        if grid.in_bounds(nx, ny, nz) {
            let (nx, ny, nz) = (nx as usize, ny as usize, nz as usize);
            result.push((grid.index_of(nx, ny, nz), nx, ny, nz));
        }
    }
    result
}

/// Reject a volume grid whose extents differ from the view's.
pub(crate) fn check_extents(
    grid: &Grid3f,
    view: &dyn PassabilityView,
) -> Result<(), PropagationError> {
    let g = grid.dims();
    let v = view.size();
    if g != v {
        return Err(PropagationError::SizeMismatch {
            grid: (g.width, g.height, g.depth),
            view: (v.width, v.height, v.depth),
        });
    }
    Ok(())
}

/// Validate that `value` lies in `(0, 1]`.
pub(crate) fn check_unit_interval(name: &'static str, value: f32) -> Result<(), PropagationError> {
    if !(value > 0.0 && value <= 1.0) {
        return Err(PropagationError::InvalidParameter {
            name,
            value,
            expected: "a value in (0, 1]",
        });
    }
    Ok(())
}

/// Validate that `value` is finite and `> 0`.
pub(crate) fn check_positive(name: &'static str, value: f32) -> Result<(), PropagationError> {
    if !(value > 0.0 && value.is_finite()) {
        return Err(PropagationError::InvalidParameter {
            name,
            value,
            expected: "a finite value > 0",
        });
    }
    Ok(())
}

/// Validate that `value` is finite and `>= 0`.
pub(crate) fn check_non_negative(
    name: &'static str,
    value: f32,
) -> Result<(), PropagationError> {
    if !(value >= 0.0 && value.is_finite()) {
        return Err(PropagationError::InvalidParameter {
            name,
            value,
            expected: "a finite value >= 0",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use resound_core::SceneSize;

    #[test]
    fn interior_cell_has_six_neighbours() {
        let g = Grid3f::zeroed(SceneSize::new(3, 3, 3));
        let nbs = neighbours(&g, 1, 1, 1);
        assert_eq!(nbs.len(), 6);
        let idx: Vec<_> = nbs.iter().map(|n| n.0).collect();
        assert_eq!(idx, vec![14, 12, 16, 10, 22, 4]);
    }

    #[test]
    fn corner_cell_has_three_neighbours() {
        let g = Grid3f::zeroed(SceneSize::new(3, 3, 3));
        let nbs = neighbours(&g, 0, 0, 0);
        assert_eq!(nbs.len(), 3);
        assert!(nbs.contains(&(1, 1, 0, 0)));
        assert!(nbs.contains(&(3, 0, 1, 0)));
        assert!(nbs.contains(&(9, 0, 0, 1)));
    }

    #[test]
    fn line_end_has_one_neighbour() {
        let g = Grid3f::zeroed(SceneSize::new(5, 1, 1));
        assert_eq!(neighbours(&g, 4, 0, 0).as_slice(), &[(3, 3, 0, 0)]);
    }

    #[test]
    fn parameter_checks() {
        assert!(check_unit_interval("a", 1.0).is_ok());
        assert!(check_unit_interval("a", 0.0).is_err());
        assert!(check_unit_interval("a", f32::NAN).is_err());
        assert!(check_positive("m", f32::INFINITY).is_err());
        assert!(check_non_negative("f", 0.0).is_ok());
        assert!(check_non_negative("f", -0.1).is_err());
    }
}
