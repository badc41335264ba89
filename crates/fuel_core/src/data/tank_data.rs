//! Tank and storage definitions.

use serde::{Deserialize, Serialize};

/// Data-driven fuel tank definition.
///
/// Used both for an actor's own tank and for a player's global reserve.
///
/// # Example RON
///
/// ```ron
/// TankData(
///     capacity: 100,
///     start_empty: false,
///     low_fuel_warning_percent: 20,
///     low_fuel_conditions: ["low-fuel"],
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TankData {
    /// Total capacity of the tank.
    pub capacity: i32,

    /// Whether the tank is empty when the actor is created.
    #[serde(default)]
    pub start_empty: bool,

    /// Low fuel warning threshold (in percent).
    #[serde(default = "default_low_fuel_warning")]
    pub low_fuel_warning_percent: i32,

    /// Conditions granted to the holder while the tank is low on fuel.
    #[serde(default)]
    pub low_fuel_conditions: Vec<String>,
}

/// Default low fuel warning threshold.
const fn default_low_fuel_warning() -> i32 {
    20
}

impl TankData {
    /// A full tank with the default warning threshold and no conditions.
    #[must_use]
    pub fn with_capacity(capacity: i32) -> Self {
        Self {
            capacity,
            start_empty: false,
            low_fuel_warning_percent: default_low_fuel_warning(),
            low_fuel_conditions: Vec::new(),
        }
    }
}

impl Default for TankData {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

/// Extra reserve capacity provided by a storage building.
///
/// # Example RON
///
/// ```ron
/// StorageData(capacity: 500)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageData {
    /// Capacity added to the owner's reserve tank.
    pub capacity: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tank_data_defaults_from_ron() {
        let data: TankData = ron::from_str("TankData(capacity: 50)").unwrap();
        assert_eq!(data.capacity, 50);
        assert!(!data.start_empty);
        assert_eq!(data.low_fuel_warning_percent, 20);
        assert!(data.low_fuel_conditions.is_empty());
    }

    #[test]
    fn test_tank_data_full_ron() {
        let data: TankData = ron::from_str(
            r#"TankData(
                capacity: 80,
                start_empty: true,
                low_fuel_warning_percent: 35,
                low_fuel_conditions: ["low-fuel", "sputtering"],
            )"#,
        )
        .unwrap();
        assert!(data.start_empty);
        assert_eq!(data.low_fuel_warning_percent, 35);
        assert_eq!(data.low_fuel_conditions.len(), 2);
    }
}
