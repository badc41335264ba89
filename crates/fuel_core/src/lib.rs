//! # Fuel Core
//!
//! Deterministic fuel simulation for a real-time strategy engine.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No system randomness
//! - No floating-point math (uses fixed-point)
//!
//! The host engine owns movement, pathing, orders and presentation. It
//! drives this crate with one [`World::tick`](world::World::tick) call per
//! simulation step and reads back [`TickEvents`](world::TickEvents).
//!
//! ## Crate Structure
//!
//! - [`tank`] - Fuel containers and threshold notices
//! - [`generator`] - Cash-to-fuel production
//! - [`consumer`] - Fuel burn, range and the out-of-fuel kill policy
//! - [`refuel`] - Stationary and area refuelers
//! - [`refuelable`] - Refuel orders and eligibility reasons
//! - [`storage`] - Reserve capacity from buildings
//! - [`world`] - Actor registry and the tick loop
//! - [`script`] - Read-only properties for mission scripts
//! - [`data`] - RON rules definitions

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod components;
pub mod conditions;
pub mod consumer;
mod coordinator;
pub mod data;
pub mod error;
pub mod generator;
pub mod math;
pub mod player;
pub mod refuel;
pub mod refuelable;
pub mod script;
pub mod storage;
pub mod tank;
pub mod world;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::components::*;
    pub use crate::conditions::{ConditionLedger, ConditionManager, ConditionToken};
    pub use crate::consumer::FuelRange;
    pub use crate::data::{ActorRules, RulesSet};
    pub use crate::error::{FuelError, Result};
    pub use crate::math::{CellPos, CellVec, Fixed, Vec2Fixed};
    pub use crate::refuel::{RangeIndicator, RefuelerKind};
    pub use crate::refuelable::{Ineligible, RefuelActivity};
    pub use crate::script::FuelProperties;
    pub use crate::tank::{FuelNotice, FuelStateObserver, TankId, TankStatus};
    pub use crate::world::{Capability, TickEvents, World};
}
