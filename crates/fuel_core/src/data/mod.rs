//! Data structures for fuel configuration.
//!
//! This module contains pure data structures that define how each actor
//! type stores, produces, consumes and transfers fuel. All structs are
//! designed to be deserialized from RON files.
//!
//! **Note:** This module contains no IO - it only defines data types and
//! parses strings. File loading is handled by `fuel_headless`.

mod consumer_data;
mod generator_data;
mod refuel_data;
mod rules;
mod tank_data;

pub use consumer_data::ConsumerData;
pub use generator_data::GeneratorData;
pub use refuel_data::{AreaRefuelerData, RefuelableData, StationaryRefuelerData};
pub use rules::{ActorRules, PlayerRules, RulesSet};
pub use tank_data::{StorageData, TankData};
