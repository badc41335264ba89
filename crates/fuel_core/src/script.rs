//! Read-only fuel properties and commands for mission scripts.
//!
//! Scripts see an actor's fuel through [`FuelProperties`] and can order
//! it to refuel with [`refuel`]. Unlike [`World::request_refuel`], the
//! script command reports why a request was rejected.

use crate::components::EntityId;
use crate::conditions::{ConditionLedger, ConditionManager};
use crate::consumer::FuelRange;
use crate::error::{FuelError, Result};
use crate::tank::Tank;
use crate::world::World;

/// Fuel properties of one actor.
#[derive(Debug)]
pub struct FuelProperties<'a, C = ConditionLedger> {
    world: &'a World<C>,
    actor: EntityId,
    tank: &'a Tank,
}

impl<'a, C: ConditionManager> FuelProperties<'a, C> {
    /// Properties of `actor`.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor doesn't exist or has no tank.
    pub fn new(world: &'a World<C>, actor: EntityId) -> Result<Self> {
        let tank_id = world
            .actor(actor)
            .ok_or(FuelError::EntityNotFound(actor))?
            .tank()
            .ok_or(FuelError::NoTank(actor))?;
        let tank = world
            .tanks()
            .get(tank_id)
            .ok_or(FuelError::TankNotFound(tank_id))?;
        Ok(Self { world, actor, tank })
    }

    /// Actor these properties describe.
    #[must_use]
    pub const fn actor(&self) -> EntityId {
        self.actor
    }

    /// Tank capacity.
    #[must_use]
    pub const fn fuel_capacity(&self) -> i32 {
        self.tank.capacity()
    }

    /// Fuel in the tank.
    #[must_use]
    pub const fn fuel_level(&self) -> i32 {
        self.tank.amount()
    }

    /// Whether the tank is empty.
    #[must_use]
    pub const fn is_out_of_fuel(&self) -> bool {
        self.tank.is_empty()
    }

    /// Whether the tank is at or below its warning threshold.
    #[must_use]
    pub fn is_low_on_fuel(&self) -> bool {
        self.tank.is_low()
    }

    /// Whether the tank is full.
    #[must_use]
    pub const fn has_full_fuel(&self) -> bool {
        self.tank.is_full()
    }

    /// Remaining range, if the actor consumes fuel.
    #[must_use]
    pub fn fuel_range(&self) -> Option<FuelRange> {
        let consumer = self.world.actor(self.actor)?.consumer()?;
        Some(consumer.range(self.tank))
    }

    /// Range on a full tank, if the actor consumes fuel.
    #[must_use]
    pub fn full_fuel_range(&self) -> Option<FuelRange> {
        let consumer = self.world.actor(self.actor)?.consumer()?;
        Some(consumer.max_range(self.tank))
    }
}

/// Order `actor` to refuel at `host`.
///
/// # Errors
///
/// Returns [`FuelError::RefuelRejected`] with the reason if the actor
/// cannot refuel there.
pub fn refuel<C: ConditionManager>(
    world: &mut World<C>,
    actor: EntityId,
    host: EntityId,
) -> Result<()> {
    world
        .try_request_refuel(actor, host)
        .map_err(|reason| FuelError::RefuelRejected {
            unit: actor,
            host,
            reason,
        })
}
