//! Consumer definitions.

use serde::{Deserialize, Serialize};

/// Burns fuel as the actor moves or idles.
///
/// # Example RON
///
/// ```ron
/// ConsumerData(
///     consumption_per_move: 2,
///     consumption_while_stopped: 1,
///     stopped_interval: 50,
///     kill_on_empty: true,
///     kill_delay: 100,
///     out_of_fuel_condition: Some("stranded"),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerData {
    /// Fuel consumed per cell-to-cell move.
    #[serde(default = "default_one")]
    pub consumption_per_move: i32,

    /// Fuel consumed per stopped interval. Zero disables idle burn.
    #[serde(default)]
    pub consumption_while_stopped: i32,

    /// Ticks between idle burns.
    #[serde(default)]
    pub stopped_interval: i32,

    /// Destroy the actor once it has been out of fuel for `kill_delay` ticks.
    #[serde(default)]
    pub kill_on_empty: bool,

    /// Ticks an actor survives without fuel.
    #[serde(default)]
    pub kill_delay: i32,

    /// Condition granted while the actor is out of fuel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_of_fuel_condition: Option<String>,

    /// Show fuel range in the actor's tooltip.
    #[serde(default = "default_true")]
    pub show_range_in_tooltip: bool,
}

impl Default for ConsumerData {
    fn default() -> Self {
        Self {
            consumption_per_move: 1,
            consumption_while_stopped: 0,
            stopped_interval: 0,
            kill_on_empty: false,
            kill_delay: 0,
            out_of_fuel_condition: None,
            show_range_in_tooltip: true,
        }
    }
}

const fn default_one() -> i32 {
    1
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consumer_ron_with_condition() {
        let data: ConsumerData = ron::from_str(
            r#"ConsumerData(consumption_per_move: 3, out_of_fuel_condition: Some("stranded"))"#,
        )
        .unwrap();
        assert_eq!(data.consumption_per_move, 3);
        assert_eq!(data.out_of_fuel_condition.as_deref(), Some("stranded"));
        assert!(data.show_range_in_tooltip);
    }
}
