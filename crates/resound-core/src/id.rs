//! Strongly-typed identifiers and world-space voxel positions.

use std::fmt;

/// Identifies a loaded world whose scenes can be simulated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorldId(pub u64);

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for WorldId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// A voxel coordinate in world space.
///
/// World coordinates are signed; local grid coordinates (always
/// non-negative) are obtained through a [`SceneWindow`](crate::SceneWindow).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoxelPos {
    /// X coordinate.
    pub x: i32,
    /// Y coordinate (vertical).
    pub y: i32,
    /// Z coordinate.
    pub z: i32,
}

impl VoxelPos {
    /// Construct a position from its three components.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Return this position shifted by the given offsets.
    ///
    /// Each component saturates at the `i32` bounds.
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            z: self.z.saturating_add(dz),
        }
    }

    /// Chebyshev (L∞) distance to another position.
    pub fn chebyshev(self, other: VoxelPos) -> u32 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        let dz = self.z.abs_diff(other.z);
        dx.max(dy).max(dz)
    }
}

impl fmt::Display for VoxelPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

impl From<(i32, i32, i32)> for VoxelPos {
    fn from((x, y, z): (i32, i32, i32)) -> Self {
        Self { x, y, z }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_saturates_at_coordinate_limits() {
        let high = VoxelPos::new(i32::MAX - 1, 0, i32::MIN + 1);
        assert_eq!(high.offset(4, -4, -4), VoxelPos::new(i32::MAX, -4, i32::MIN));
        assert_eq!(high.offset(-4, 4, 4), VoxelPos::new(i32::MAX - 5, 4, i32::MIN + 5));
    }

    #[test]
    fn world_id_display() {
        assert_eq!(WorldId(7).to_string(), "7");
        assert_eq!(WorldId::from(3), WorldId(3));
    }

    #[test]
    fn offset_moves_each_axis() {
        let p = VoxelPos::new(1, 2, 3).offset(-1, 0, 4);
        assert_eq!(p, VoxelPos::new(0, 2, 7));
    }

    #[test]
    fn chebyshev_takes_largest_axis() {
        let a = VoxelPos::new(0, 0, 0);
        let b = VoxelPos::new(-3, 5, 1);
        assert_eq!(a.chebyshev(b), 5);
        assert_eq!(b.chebyshev(a), 5);
        assert_eq!(a.chebyshev(a), 0);
    }
}
