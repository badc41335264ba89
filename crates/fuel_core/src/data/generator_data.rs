//! Generator definitions.

use serde::{Deserialize, Serialize};

/// Converts player cash into fuel at a fixed interval.
///
/// # Example RON
///
/// ```ron
/// GeneratorData(
///     fuel_per_interval: 10,
///     cost_per_interval: 5,
///     interval: 25,
///     use_shared_reserve: true,
/// )
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorData {
    /// Amount of fuel generated per interval.
    #[serde(default = "default_one")]
    pub fuel_per_interval: i32,

    /// Cash charged per interval. Partial batches are never reimbursed.
    #[serde(default = "default_one")]
    pub cost_per_interval: i32,

    /// Generation interval in ticks.
    #[serde(default = "default_generator_interval")]
    pub interval: i32,

    /// Deposit into the owner's reserve instead of the actor's own tank.
    #[serde(default = "default_true")]
    pub use_shared_reserve: bool,
}

impl Default for GeneratorData {
    fn default() -> Self {
        Self {
            fuel_per_interval: 1,
            cost_per_interval: 1,
            interval: default_generator_interval(),
            use_shared_reserve: true,
        }
    }
}

const fn default_one() -> i32 {
    1
}

const fn default_true() -> bool {
    true
}

const fn default_generator_interval() -> i32 {
    25
}
