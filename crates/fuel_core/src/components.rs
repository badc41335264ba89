//! Shared identifiers and plain-data components.
//!
//! Components are pure data with no behavior. The fuel capabilities
//! themselves live in their own modules.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::math::{fixed_serde, CellPos, Fixed};

/// Unique identifier for entities.
pub type EntityId = u64;

/// Unique identifier for players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player#{}", self.0)
    }
}

/// Footprint of a building on the cell grid.
///
/// The actor's location is the top-left cell of the footprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footprint {
    /// Footprint width in cells.
    pub width: u8,
    /// Footprint height in cells.
    pub height: u8,
}

impl Footprint {
    /// A single-cell footprint.
    pub const SINGLE: Self = Self {
        width: 1,
        height: 1,
    };

    /// Check whether `cell` is covered by this footprint anchored at `origin`.
    #[must_use]
    pub fn covers(&self, origin: CellPos, cell: CellPos) -> bool {
        let dx = i64::from(cell.x) - i64::from(origin.x);
        let dy = i64::from(cell.y) - i64::from(origin.y);
        dx >= 0 && dy >= 0 && dx < i64::from(self.width) && dy < i64::from(self.height)
    }
}

impl Default for Footprint {
    fn default() -> Self {
        Self::SINGLE
    }
}

/// Where a move order should take an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveDestination {
    /// Move onto a specific cell.
    Cell(CellPos),
    /// Move until within `range` of another actor.
    WithinRange {
        /// Actor to approach.
        target: EntityId,
        /// Distance at which the move is complete.
        #[serde(with = "fixed_serde")]
        range: Fixed,
    },
}

/// A movement request issued by the refuel coordinator.
///
/// Pathing is the host's job: it reads these from the tick events and
/// drives the actor, reporting new positions back to the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOrder {
    /// Actor to move.
    pub actor: EntityId,
    /// Destination.
    pub destination: MoveDestination,
}

/// Why an actor left the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemovalReason {
    /// Destroyed in combat or by a script.
    Killed,
    /// Sold back by its owner.
    Sold,
    /// Destroyed by the out-of-fuel kill policy.
    OutOfFuel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_footprint_covers() {
        let footprint = Footprint {
            width: 2,
            height: 3,
        };
        let origin = CellPos::new(4, 4);

        assert!(footprint.covers(origin, CellPos::new(4, 4)));
        assert!(footprint.covers(origin, CellPos::new(5, 6)));
        assert!(!footprint.covers(origin, CellPos::new(6, 4)));
        assert!(!footprint.covers(origin, CellPos::new(3, 5)));
    }

    #[test]
    fn test_player_id_display() {
        assert_eq!(PlayerId(3).to_string(), "player#3");
    }
}
