//! Fixed-point math and grid utilities for deterministic simulation.
//!
//! World positions and radii use fixed-point arithmetic so every
//! client computes identical distances. Grid cells are plain integers.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Fixed-point 2D vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    /// X coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Y coordinate.
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

impl Vec2Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Create a vector from whole world units.
    #[must_use]
    pub fn from_units(x: i32, y: i32) -> Self {
        Self::new(Fixed::from_num(x), Fixed::from_num(y))
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Calculate squared distance (avoids sqrt for comparisons).
    ///
    /// Saturates instead of overflowing for points far apart.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        let dx = self.x.saturating_sub(other.x);
        let dy = self.y.saturating_sub(other.y);
        dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy))
    }

    /// Check whether `other` lies within `radius` of this point (inclusive).
    #[must_use]
    pub fn is_within(self, other: Self, radius: Fixed) -> bool {
        if radius < Fixed::ZERO {
            return false;
        }
        self.distance_squared(other) <= radius.saturating_mul(radius)
    }
}

impl std::ops::Add for Vec2Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Sub for Vec2Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

/// A cell on the map grid.
///
/// One cell is one world unit wide. An actor's location is the cell
/// containing its center position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct CellPos {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl CellPos {
    /// Create a new cell position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The cell containing a world position.
    #[must_use]
    pub fn containing(position: Vec2Fixed) -> Self {
        Self {
            x: position.x.floor().to_num::<i32>(),
            y: position.y.floor().to_num::<i32>(),
        }
    }

    /// World position of this cell's center.
    #[must_use]
    pub fn center(self) -> Vec2Fixed {
        let half = Fixed::from_num(1) / Fixed::from_num(2);
        Vec2Fixed::new(
            Fixed::from_num(self.x) + half,
            Fixed::from_num(self.y) + half,
        )
    }

    /// Offset this cell by another cell vector.
    #[must_use]
    pub const fn offset(self, by: CellVec) -> Self {
        Self {
            x: self.x.saturating_add(by.x),
            y: self.y.saturating_add(by.y),
        }
    }
}

/// A relative cell offset, e.g. a docking offset from a building's top-left cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CellVec {
    /// Column delta.
    pub x: i32,
    /// Row delta.
    pub y: i32,
}

impl CellVec {
    /// Create a new cell offset.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Zero offset.
    pub const ZERO: Self = Self { x: 0, y: 0 };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec2_distance_squared() {
        let a = Vec2Fixed::from_units(3, 0);
        let b = Vec2Fixed::from_units(0, 4);
        // 3² + 4² = 25
        assert_eq!(a.distance_squared(b), Fixed::from_num(25));
    }

    #[test]
    fn test_is_within_is_inclusive() {
        let a = Vec2Fixed::from_units(0, 0);
        assert!(a.is_within(Vec2Fixed::from_units(3, 4), Fixed::from_num(5)));
        assert!(!a.is_within(Vec2Fixed::from_units(3, 5), Fixed::from_num(5)));
        assert!(!a.is_within(a, Fixed::from_num(-1)));
    }

    #[test]
    fn test_cell_containing_floors_negative_positions() {
        let pos = Vec2Fixed::new(Fixed::from_num(-0.5), Fixed::from_num(2.75));
        assert_eq!(CellPos::containing(pos), CellPos::new(-1, 2));
    }

    #[test]
    fn test_cell_center_round_trips() {
        let cell = CellPos::new(7, -3);
        assert_eq!(CellPos::containing(cell.center()), cell);
    }

    #[test]
    fn test_cell_offset() {
        let cell = CellPos::new(10, 10).offset(CellVec::new(1, -2));
        assert_eq!(cell, CellPos::new(11, 8));
    }
}
