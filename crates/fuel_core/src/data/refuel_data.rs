//! Refueler and refuelable definitions.

use serde::{Deserialize, Serialize};

use crate::math::{fixed_serde, CellVec, Fixed};

/// Refuels one unit at a time parked on a docking cell.
///
/// # Example RON
///
/// ```ron
/// StationaryRefuelerData(
///     fuel_per_transfer: 4,
///     transfer_interval: 2,
///     dock_offset: (x: 1, y: 1),
///     use_shared_reserve: true,
/// )
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationaryRefuelerData {
    /// Fuel moved to the recipient per transfer.
    #[serde(default = "default_one")]
    pub fuel_per_transfer: i32,

    /// Ticks between transfers.
    #[serde(default = "default_one")]
    pub transfer_interval: i32,

    /// Docking cell relative to the building's top-left cell.
    #[serde(default)]
    pub dock_offset: CellVec,

    /// Draw from the owner's reserve instead of the actor's own tank.
    #[serde(default = "default_true")]
    pub use_shared_reserve: bool,
}

impl Default for StationaryRefuelerData {
    fn default() -> Self {
        Self {
            fuel_per_transfer: 1,
            transfer_interval: 1,
            dock_offset: CellVec::ZERO,
            use_shared_reserve: true,
        }
    }
}

/// Refuels every eligible unit within a radius.
///
/// # Example RON
///
/// ```ron
/// AreaRefuelerData(
///     fuel_per_transfer: 2,
///     transfer_interval: 5,
///     radius: 12884901888,  // Fixed-point for 3.0
///     refuel_while_source_moving: false,
///     refuel_moving_recipients: false,
///     show_range_indicator: true,
///     indicator_color: (238, 130, 238),
/// )
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaRefuelerData {
    /// Fuel moved to each recipient per transfer.
    #[serde(default = "default_one")]
    pub fuel_per_transfer: i32,

    /// Ticks between transfer sweeps.
    #[serde(default = "default_one")]
    pub transfer_interval: i32,

    /// Radius within which recipients receive fuel.
    #[serde(default = "default_radius", with = "fixed_serde")]
    pub radius: Fixed,

    /// Keep transferring while the source itself is moving.
    #[serde(default)]
    pub refuel_while_source_moving: bool,

    /// Transfer to recipients that are moving.
    #[serde(default)]
    pub refuel_moving_recipients: bool,

    /// Expose a range indicator to the renderer.
    #[serde(default = "default_true")]
    pub show_range_indicator: bool,

    /// Range indicator color (RGB).
    #[serde(default = "default_indicator_color")]
    pub indicator_color: [u8; 3],
}

impl Default for AreaRefuelerData {
    fn default() -> Self {
        Self {
            fuel_per_transfer: 1,
            transfer_interval: 1,
            radius: default_radius(),
            refuel_while_source_moving: false,
            refuel_moving_recipients: false,
            show_range_indicator: true,
            indicator_color: default_indicator_color(),
        }
    }
}

/// Marks an actor as able to take on fuel from refuelers.
///
/// # Example RON
///
/// ```ron
/// RefuelableData(allowed_refueler_types: ["fuel_depot", "tanker"])
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefuelableData {
    /// Actor types at which this actor may refuel.
    #[serde(default)]
    pub allowed_refueler_types: Vec<String>,
}

impl RefuelableData {
    /// Check whether `actor_type` is an allowed refueler.
    #[must_use]
    pub fn allows(&self, actor_type: &str) -> bool {
        self.allowed_refueler_types.iter().any(|t| t == actor_type)
    }
}

const fn default_one() -> i32 {
    1
}

const fn default_true() -> bool {
    true
}

/// One cell.
fn default_radius() -> Fixed {
    Fixed::from_num(1)
}

/// Violet.
const fn default_indicator_color() -> [u8; 3] {
    [238, 130, 238]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_area_refueler_radius_from_bits() {
        let data: AreaRefuelerData =
            ron::from_str("AreaRefuelerData(radius: 12884901888)").unwrap();
        assert_eq!(data.radius, Fixed::from_num(3));
        assert_eq!(data.indicator_color, [238, 130, 238]);
    }

    #[test]
    fn test_stationary_dock_offset() {
        let data: StationaryRefuelerData =
            ron::from_str("StationaryRefuelerData(dock_offset: (x: 1, y: 2))").unwrap();
        assert_eq!(data.dock_offset, CellVec::new(1, 2));
        assert!(data.use_shared_reserve);
    }

    #[test]
    fn test_refuelable_allows() {
        let data = RefuelableData {
            allowed_refueler_types: vec!["depot".to_string()],
        };
        assert!(data.allows("depot"));
        assert!(!data.allows("tanker"));
    }
}
