//! A single loaded block of passability values.

use resound_core::{Grid3, Grid3f, PassabilityView, SceneSize};

use crate::error::SpaceError;

/// Clamp a raw passability into `[0, 1]`. NaN reads as blocked.
fn clamp_passability(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Dense passability scene in local coordinates.
///
/// Every stored value lies in `[0, 1]`; writes are clamped on the way in
/// so readers never see out-of-range passability.
#[derive(Clone, Debug, PartialEq)]
pub struct PassabilityGrid {
    cells: Grid3f,
}

impl PassabilityGrid {
    /// A scene where every cell has passability `value`.
    pub fn filled(size: SceneSize, value: f32) -> Result<Self, SpaceError> {
        if size.is_empty() {
            return Err(SpaceError::EmptyScene);
        }
        let mut cells = Grid3f::zeroed(size);
        cells.fill(clamp_passability(value));
        Ok(Self { cells })
    }

    /// Build a scene from `f(x, y, z)`.
    pub fn from_fn<F>(size: SceneSize, mut f: F) -> Result<Self, SpaceError>
    where
        F: FnMut(usize, usize, usize) -> f32,
    {
        if size.is_empty() {
            return Err(SpaceError::EmptyScene);
        }
        let cells = Grid3f::from_fn(size, |_, x, y, z| clamp_passability(f(x, y, z)));
        Ok(Self { cells })
    }

    /// Wrap raw values laid out in grid order.
    pub fn from_vec(size: SceneSize, mut data: Vec<f32>) -> Result<Self, SpaceError> {
        if size.is_empty() {
            return Err(SpaceError::EmptyScene);
        }
        if data.len() != size.len() {
            return Err(SpaceError::CellCountMismatch {
                expected: size.len(),
                actual: data.len(),
            });
        }
        for v in &mut data {
            *v = clamp_passability(*v);
        }
        let cells = Grid3f::from_vec(size, data).map_err(|e| match e {
            resound_core::GridError::SizeMismatch { expected, actual } => {
                SpaceError::CellCountMismatch { expected, actual }
            }
        })?;
        Ok(Self { cells })
    }

    /// Scene extents.
    pub fn dims(&self) -> SceneSize {
        self.cells.dims()
    }

    /// Passability at local `(x, y, z)`.
    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> f32 {
        self.cells.get(x, y, z)
    }

    /// Overwrite the passability at local `(x, y, z)`.
    ///
    /// Returns whether the stored value changed.
    pub fn set(&mut self, x: usize, y: usize, z: usize, value: f32) -> bool {
        let value = clamp_passability(value);
        let old = self.cells.get(x, y, z);
        self.cells.set(x, y, z, value);
        old != value
    }

    /// The backing grid.
    pub fn as_grid(&self) -> &Grid3f {
        &self.cells
    }
}

impl PassabilityView for PassabilityGrid {
    fn size(&self) -> SceneSize {
        self.cells.dims()
    }

    #[inline]
    fn passability(&self, x: usize, y: usize, z: usize) -> f32 {
        self.cells.get(x, y, z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_are_clamped() {
        let mut scene = PassabilityGrid::filled(SceneSize::new(2, 2, 2), 3.0).unwrap();
        assert_eq!(scene.get(1, 1, 1), 1.0);
        assert!(scene.set(0, 0, 0, -0.5));
        assert_eq!(scene.get(0, 0, 0), 0.0);
        assert!(scene.set(0, 1, 0, f32::NAN));
        assert_eq!(scene.passability(0, 1, 0), 0.0);
        assert!(!scene.set(0, 1, 0, 0.0));
    }

    #[test]
    fn from_fn_sees_coordinates() {
        let scene =
            PassabilityGrid::from_fn(SceneSize::new(4, 1, 1), |x, _, _| x as f32 * 0.25).unwrap();
        assert_eq!(scene.as_grid().as_slice(), &[0.0, 0.25, 0.5, 0.75]);
    }

    #[test]
    fn from_vec_checks_length() {
        assert!(PassabilityGrid::from_vec(SceneSize::new(2, 1, 1), vec![1.0]).is_err());
        let scene = PassabilityGrid::from_vec(SceneSize::new(2, 1, 1), vec![2.0, 0.5]).unwrap();
        assert_eq!(scene.as_grid().as_slice(), &[1.0, 0.5]);
    }

    #[test]
    fn empty_scene_rejected() {
        assert_eq!(
            PassabilityGrid::filled(SceneSize::new(0, 4, 4), 1.0).unwrap_err(),
            SpaceError::EmptyScene
        );
    }
}
