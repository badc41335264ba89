//! The fuel world: actors, players, tanks and the tick loop.
//!
//! The host simulation owns movement, orders and rendering. It spawns
//! actors here, reports their positions and motion, and calls
//! [`World::tick`] once per simulation step. Everything fuel related
//! happens inside that call and is reported back through [`TickEvents`].
//!
//! # Determinism
//!
//! - No floating-point math (positions and radii are [`Fixed`])
//! - Actors are stored in a `BTreeMap` and every phase visits them in
//!   ascending [`EntityId`] order
//! - Transfers read and write both tanks inside one call
//!
//! # Example
//!
//! ```
//! use fuel_core::data::RulesSet;
//! use fuel_core::math::CellPos;
//! use fuel_core::world::World;
//!
//! let rules = RulesSet::from_ron_str(r#"
//!     RulesSet(actors: [
//!         ActorRules(
//!             name: "truck",
//!             tank: Some(TankData(capacity: 10)),
//!             consumer: Some(ConsumerData()),
//!         ),
//!     ])
//! "#).unwrap();
//!
//! let mut world = World::new(rules).unwrap();
//! let player = world.add_player();
//! let truck = world.spawn("truck", player, CellPos::new(0, 0)).unwrap();
//!
//! world.move_to_cell(truck, CellPos::new(1, 0)).unwrap();
//! world.tick();
//! assert_eq!(world.fuel_level(truck), Some(9));
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::components::{EntityId, Footprint, MoveOrder, PlayerId, RemovalReason};
use crate::conditions::{ConditionLedger, ConditionManager};
use crate::consumer::Consumer;
use crate::data::{ActorRules, RulesSet};
use crate::error::{FuelError, Result};
use crate::generator::Generator;
use crate::math::{CellPos, Vec2Fixed};
use crate::player::Player;
use crate::refuel::{AreaRefueler, RangeIndicator, Refueler, StationaryRefueler};
use crate::refuelable::Refuelable;
use crate::storage::Storage;
use crate::tank::{FuelNotice, FuelStateObserver, Tank, TankId, TankStore, TransferOutcome};

/// Capability slots an actor may fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Own fuel tank.
    Tank,
    /// Cash-to-fuel generator.
    Generator,
    /// Burns fuel.
    Consumer,
    /// Exclusive docking refueler.
    StationaryRefueler,
    /// Radius refueler.
    AreaRefueler,
    /// Can receive fuel.
    Refuelable,
    /// Adds reserve capacity.
    Storage,
}

/// An actor with optional fuel capabilities.
///
/// Only capabilities that are `Some` are active. Coordinators query the
/// slots instead of discovering behavior at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub(crate) id: EntityId,
    pub(crate) actor_type: String,
    pub(crate) owner: PlayerId,
    pub(crate) position: Vec2Fixed,
    pub(crate) footprint: Footprint,
    pub(crate) rally_point: Option<CellPos>,
    pub(crate) in_world: bool,
    pub(crate) dead: bool,
    pub(crate) airborne: bool,
    pub(crate) moving: bool,
    pub(crate) tank: Option<TankId>,
    pub(crate) generator: Option<Generator>,
    pub(crate) consumer: Option<Consumer>,
    pub(crate) refueler: Option<Refueler>,
    pub(crate) refuelable: Option<Refuelable>,
    pub(crate) storage: Option<Storage>,
}

impl Actor {
    fn new(id: EntityId, rules: &ActorRules, owner: PlayerId, position: Vec2Fixed) -> Self {
        Self {
            id,
            actor_type: rules.name.clone(),
            owner,
            position,
            footprint: rules.footprint,
            rally_point: None,
            in_world: true,
            dead: false,
            airborne: false,
            moving: false,
            tank: None,
            generator: None,
            consumer: None,
            refueler: None,
            refuelable: None,
            storage: None,
        }
    }

    /// Unique identifier.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Actor type name.
    #[must_use]
    pub fn actor_type(&self) -> &str {
        &self.actor_type
    }

    /// Owning player.
    #[must_use]
    pub const fn owner(&self) -> PlayerId {
        self.owner
    }

    /// World position.
    #[must_use]
    pub const fn position(&self) -> Vec2Fixed {
        self.position
    }

    /// Cell containing the actor's position. For buildings this is the
    /// top-left cell of the footprint.
    #[must_use]
    pub fn location(&self) -> CellPos {
        CellPos::containing(self.position)
    }

    /// Cells occupied.
    #[must_use]
    pub const fn footprint(&self) -> Footprint {
        self.footprint
    }

    /// Where units go after refuelling here.
    #[must_use]
    pub const fn rally_point(&self) -> Option<CellPos> {
        self.rally_point
    }

    /// Whether the actor is placed in the world.
    #[must_use]
    pub const fn in_world(&self) -> bool {
        self.in_world
    }

    /// Whether the actor has been destroyed this tick.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.dead
    }

    /// Whether the actor is in the air.
    #[must_use]
    pub const fn is_airborne(&self) -> bool {
        self.airborne
    }

    /// Whether the actor is moving.
    #[must_use]
    pub const fn is_moving(&self) -> bool {
        self.moving
    }

    /// Alive and in the world.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.in_world && !self.dead
    }

    /// Own tank.
    #[must_use]
    pub const fn tank(&self) -> Option<TankId> {
        self.tank
    }

    /// Generator slot.
    #[must_use]
    pub const fn generator(&self) -> Option<&Generator> {
        self.generator.as_ref()
    }

    /// Consumer slot.
    #[must_use]
    pub const fn consumer(&self) -> Option<&Consumer> {
        self.consumer.as_ref()
    }

    /// Refueler slot.
    #[must_use]
    pub const fn refueler(&self) -> Option<&Refueler> {
        self.refueler.as_ref()
    }

    /// Refuelable slot.
    #[must_use]
    pub const fn refuelable(&self) -> Option<&Refuelable> {
        self.refuelable.as_ref()
    }

    /// Storage slot.
    #[must_use]
    pub const fn storage(&self) -> Option<&Storage> {
        self.storage.as_ref()
    }

    /// Check whether a capability slot is filled.
    #[must_use]
    pub fn has(&self, capability: Capability) -> bool {
        match capability {
            Capability::Tank => self.tank.is_some(),
            Capability::Generator => self.generator.is_some(),
            Capability::Consumer => self.consumer.is_some(),
            Capability::StationaryRefueler => {
                self.refueler.as_ref().and_then(Refueler::as_stationary).is_some()
            }
            Capability::AreaRefueler => self.refueler.as_ref().and_then(Refueler::as_area).is_some(),
            Capability::Refuelable => self.refuelable.is_some(),
            Capability::Storage => self.storage.is_some(),
        }
    }
}

/// A tank crossed a fuel threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuelEvent {
    /// Tank holder (a player actor for reserves).
    pub actor: EntityId,
    /// What happened.
    pub notice: FuelNotice,
}

/// Fuel moved from a refueler to a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuelTransfer {
    /// Refueler actor.
    pub source: EntityId,
    /// Receiving unit.
    pub recipient: EntityId,
    /// Amount moved.
    pub amount: i32,
}

/// A generator produced fuel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuelGenerated {
    /// Generator actor.
    pub generator: EntityId,
    /// Amount deposited.
    pub amount: i32,
}

/// Events generated during a world tick.
///
/// The host uses these to drive movement, play notifications and keep
/// its own bookkeeping in step with the fuel world.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickEvents {
    /// Threshold notices, in the order they fired.
    pub fuel_events: Vec<FuelEvent>,
    /// Refueler transfers.
    pub transfers: Vec<FuelTransfer>,
    /// Generator output.
    pub generated: Vec<FuelGenerated>,
    /// Movement the refuel protocols need from the host.
    pub move_orders: Vec<MoveOrder>,
    /// Actors destroyed by the out-of-fuel kill policy.
    pub destroyed: Vec<EntityId>,
}

impl TickEvents {
    /// Whether nothing happened.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fuel_events.is_empty()
            && self.transfers.is_empty()
            && self.generated.is_empty()
            && self.move_orders.is_empty()
            && self.destroyed.is_empty()
    }

    pub(crate) fn notice(&mut self, actor: EntityId, notice: Option<FuelNotice>) {
        if let Some(notice) = notice {
            self.fuel_events.push(FuelEvent { actor, notice });
        }
    }

    pub(crate) fn transfer(
        &mut self,
        tanks: &TankStore,
        source: EntityId,
        recipient: EntityId,
        source_tank: TankId,
        outcome: TransferOutcome,
    ) {
        if outcome.amount <= 0 {
            return;
        }
        let source_holder = tanks.get(source_tank).map_or(source, Tank::holder);
        self.notice(source_holder, outcome.source_notice);
        self.notice(recipient, outcome.recipient_notice);
        self.transfers.push(FuelTransfer {
            source,
            recipient,
            amount: outcome.amount,
        });
    }
}

/// The fuel simulation.
///
/// # Phase Order
///
/// Each tick runs these phases, every one in ascending [`EntityId`] order:
/// 1. **Generators** - buy fuel with cash
/// 2. **Consumers** - burn fuel, apply the kill policy
/// 3. **Stationary refuelers** - serve docked units
/// 4. **Area refuelers** - sweep units in range
/// 5. **Refuelables** - run refuel activities and passive docking
/// 6. **Removals** - drop actors destroyed this tick
///
/// Conditions are granted through `C`. [`World::new`] uses an in-memory
/// [`ConditionLedger`]; a host with its own condition system passes it to
/// [`World::with_conditions`].
#[derive(Debug)]
pub struct World<C = ConditionLedger> {
    pub(crate) tick: u64,
    pub(crate) rules: RulesSet,
    pub(crate) actors: BTreeMap<EntityId, Actor>,
    pub(crate) players: BTreeMap<PlayerId, Player>,
    pub(crate) tanks: TankStore,
    pub(crate) conditions: C,
    next_entity: EntityId,
    next_player: u32,
}

impl World {
    /// Create an empty world for a validated rules set.
    ///
    /// # Errors
    ///
    /// Returns an error if the rules fail validation.
    pub fn new(rules: RulesSet) -> Result<Self> {
        Self::with_conditions(rules, ConditionLedger::new())
    }
}

impl<C: ConditionManager> World<C> {
    /// Create an empty world that grants conditions through `conditions`.
    ///
    /// # Errors
    ///
    /// Returns an error if the rules fail validation.
    pub fn with_conditions(rules: RulesSet, conditions: C) -> Result<Self> {
        rules.validate()?;
        Ok(Self {
            tick: 0,
            rules,
            actors: BTreeMap::new(),
            players: BTreeMap::new(),
            tanks: TankStore::new(),
            conditions,
            next_entity: 1,
            next_player: 0,
        })
    }

    /// Get the current tick number.
    #[must_use]
    pub const fn get_tick(&self) -> u64 {
        self.tick
    }

    /// Rules this world was built from.
    #[must_use]
    pub const fn rules(&self) -> &RulesSet {
        &self.rules
    }

    /// Get an actor by id.
    #[must_use]
    pub fn actor(&self, id: EntityId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    /// Iterate over actors in id order.
    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.actors.values()
    }

    /// Get a player by id.
    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Iterate over players in id order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// All tanks.
    #[must_use]
    pub const fn tanks(&self) -> &TankStore {
        &self.tanks
    }

    /// Granted conditions.
    #[must_use]
    pub const fn conditions(&self) -> &C {
        &self.conditions
    }

    /// An actor's own tank.
    #[must_use]
    pub fn actor_tank(&self, id: EntityId) -> Option<&Tank> {
        self.tanks.get(self.actors.get(&id)?.tank?)
    }

    /// A player's reserve tank.
    #[must_use]
    pub fn reserve(&self, player: PlayerId) -> Option<&Tank> {
        self.tanks.get(self.players.get(&player)?.reserve())
    }

    /// Fuel in an actor's own tank.
    #[must_use]
    pub fn fuel_level(&self, id: EntityId) -> Option<i32> {
        self.actor_tank(id).map(Tank::amount)
    }

    fn allocate_entity(&mut self) -> EntityId {
        let id = self.next_entity;
        self.next_entity += 1;
        id
    }

    // ========================================================================
    // Players
    // ========================================================================

    /// Add a player with the default reserve and starting cash.
    pub fn add_player(&mut self) -> PlayerId {
        let id = PlayerId(self.next_player);
        self.next_player += 1;

        let actor = self.allocate_entity();
        let reserve = self
            .tanks
            .insert(Tank::new(actor, &self.rules.player.reserve));
        self.players.insert(
            id,
            Player::new(id, actor, reserve, self.rules.player.starting_cash),
        );

        debug!(player = %id, reserve = %reserve, "Player added");
        id
    }

    /// Make two players allies of each other.
    ///
    /// # Errors
    ///
    /// Returns [`FuelError::PlayerNotFound`] if either player is unknown.
    pub fn set_allied(&mut self, a: PlayerId, b: PlayerId) -> Result<()> {
        for id in [a, b] {
            if !self.players.contains_key(&id) {
                return Err(FuelError::PlayerNotFound(id));
            }
        }
        if let Some(player) = self.players.get_mut(&a) {
            player.add_ally(b);
        }
        if let Some(player) = self.players.get_mut(&b) {
            player.add_ally(a);
        }
        Ok(())
    }

    /// Add cash to a player.
    ///
    /// # Errors
    ///
    /// Returns [`FuelError::PlayerNotFound`] if the player is unknown.
    pub fn give_cash(&mut self, player: PlayerId, amount: i32) -> Result<()> {
        self.players
            .get_mut(&player)
            .ok_or(FuelError::PlayerNotFound(player))?
            .give_cash(amount);
        Ok(())
    }

    // ========================================================================
    // Actor lifecycle
    // ========================================================================

    /// Spawn an actor of `actor_type` at the center of `cell`.
    ///
    /// Buildings are anchored at their top-left cell. Storage capacity is
    /// added to the owner's reserve immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor type or owner is unknown.
    pub fn spawn(&mut self, actor_type: &str, owner: PlayerId, cell: CellPos) -> Result<EntityId> {
        let rules = self
            .rules
            .get(actor_type)
            .cloned()
            .ok_or_else(|| FuelError::UnknownActorType(actor_type.to_string()))?;
        let reserve = self
            .players
            .get(&owner)
            .ok_or(FuelError::PlayerNotFound(owner))?
            .reserve();

        let id = self.allocate_entity();
        let mut actor = Actor::new(id, &rules, owner, cell.center());

        let own_tank = rules
            .tank
            .as_ref()
            .map(|data| self.tanks.insert(Tank::new(id, data)));
        actor.tank = own_tank;

        if let Some(data) = rules.generator {
            let target = source_tank(data.use_shared_reserve, own_tank, reserve);
            actor.generator = Some(Generator::new(data, target, owner));
        }

        if let (Some(data), Some(tank)) = (rules.consumer, own_tank.and_then(|t| self.tanks.get(t))) {
            actor.consumer = Some(Consumer::new(data, cell, tank));
        }

        if let Some(data) = rules.stationary_refueler {
            let source = source_tank(data.use_shared_reserve, own_tank, reserve);
            actor.refueler = Some(Refueler::Stationary(StationaryRefueler::new(data, source)));
        } else if let (Some(data), Some(tank)) = (rules.area_refueler, own_tank) {
            actor.refueler = Some(Refueler::Area(AreaRefueler::new(data, tank)));
        }

        if let Some(data) = rules.refuelable {
            actor.refuelable = Some(Refuelable::new(data));
        }

        if let Some(data) = rules.storage {
            let storage = Storage::new(data);
            if let Some(tank) = self.tanks.get_mut(reserve) {
                storage.attach(tank);
            }
            actor.storage = Some(storage);
        }

        debug!(actor = id, actor_type, owner = %owner, ?cell, "Actor spawned");
        self.actors.insert(id, actor);
        Ok(id)
    }

    /// Remove an actor from the world.
    ///
    /// Storage capacity leaves the owner's reserve, the actor's tank is
    /// destroyed and every condition it held is revoked.
    ///
    /// # Errors
    ///
    /// Returns [`FuelError::EntityNotFound`] if the actor doesn't exist.
    pub fn remove_actor(&mut self, id: EntityId, reason: RemovalReason) -> Result<()> {
        let mut actor = self
            .actors
            .remove(&id)
            .ok_or(FuelError::EntityNotFound(id))?;

        if let Some(storage) = actor.storage {
            let reserve = self.players.get(&actor.owner).map(Player::reserve);
            if let Some(tank) = reserve.and_then(|r| self.tanks.get_mut(r)) {
                storage.detach(tank);
            }
        }

        if let Some(consumer) = actor.consumer.as_mut() {
            consumer.release_conditions(id, &mut self.conditions);
        }

        if let Some(mut tank) = actor.tank.and_then(|t| self.tanks.remove(t)) {
            tank.release_conditions(&mut self.conditions);
        }

        self.conditions.forget_actor(id);
        debug!(actor = id, ?reason, "Actor removed");
        Ok(())
    }

    /// Hand an actor to another player.
    ///
    /// Storage capacity moves between the reserves, and generators and
    /// stationary refuelers that use the shared reserve switch to the new
    /// owner's.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor or new owner doesn't exist.
    pub fn change_owner(&mut self, id: EntityId, new_owner: PlayerId) -> Result<()> {
        let new_reserve = self
            .players
            .get(&new_owner)
            .ok_or(FuelError::PlayerNotFound(new_owner))?
            .reserve();
        let actor = self
            .actors
            .get_mut(&id)
            .ok_or(FuelError::EntityNotFound(id))?;

        let old_owner = actor.owner;
        if old_owner == new_owner {
            return Ok(());
        }
        let old_reserve = self.players.get(&old_owner).map(Player::reserve);

        if let Some(storage) = actor.storage {
            match old_reserve {
                Some(old) if old != new_reserve => {
                    if let Some([from, to]) = self.tanks.get_pair_mut(old, new_reserve) {
                        storage.transfer(from, to);
                    }
                }
                Some(_) => {}
                None => {
                    if let Some(tank) = self.tanks.get_mut(new_reserve) {
                        storage.attach(tank);
                    }
                }
            }
        }

        if let Some(generator) = actor.generator.as_mut() {
            if generator.data().use_shared_reserve {
                generator.retarget(new_reserve);
            }
            generator.rebind_account(new_owner);
        }

        if let Some(Refueler::Stationary(refueler)) = actor.refueler.as_mut() {
            if refueler.data().use_shared_reserve {
                refueler.retarget(new_reserve);
            }
        }

        actor.owner = new_owner;
        debug!(actor = id, from = %old_owner, to = %new_owner, "Owner changed");
        Ok(())
    }

    fn actor_mut(&mut self, id: EntityId) -> Result<&mut Actor> {
        self.actors.get_mut(&id).ok_or(FuelError::EntityNotFound(id))
    }

    /// Report an actor's new world position.
    ///
    /// # Errors
    ///
    /// Returns [`FuelError::EntityNotFound`] if the actor doesn't exist.
    pub fn set_position(&mut self, id: EntityId, position: Vec2Fixed) -> Result<()> {
        self.actor_mut(id)?.position = position;
        Ok(())
    }

    /// Place an actor at the center of `cell`.
    ///
    /// # Errors
    ///
    /// Returns [`FuelError::EntityNotFound`] if the actor doesn't exist.
    pub fn move_to_cell(&mut self, id: EntityId, cell: CellPos) -> Result<()> {
        self.set_position(id, cell.center())
    }

    /// Report whether an actor is moving.
    ///
    /// # Errors
    ///
    /// Returns [`FuelError::EntityNotFound`] if the actor doesn't exist.
    pub fn set_moving(&mut self, id: EntityId, moving: bool) -> Result<()> {
        self.actor_mut(id)?.moving = moving;
        Ok(())
    }

    /// Report whether an actor is airborne.
    ///
    /// # Errors
    ///
    /// Returns [`FuelError::EntityNotFound`] if the actor doesn't exist.
    pub fn set_airborne(&mut self, id: EntityId, airborne: bool) -> Result<()> {
        self.actor_mut(id)?.airborne = airborne;
        Ok(())
    }

    /// Take an actor out of the world (e.g. loaded into a transport) or
    /// put it back.
    ///
    /// An actor coming back is not charged for the distance it was
    /// carried while out of the world.
    ///
    /// # Errors
    ///
    /// Returns [`FuelError::EntityNotFound`] if the actor doesn't exist.
    pub fn set_in_world(&mut self, id: EntityId, in_world: bool) -> Result<()> {
        let actor = self.actor_mut(id)?;
        if in_world && !actor.in_world {
            let location = actor.location();
            if let Some(consumer) = actor.consumer.as_mut() {
                consumer.placed(location);
            }
        }
        actor.in_world = in_world;
        Ok(())
    }

    /// Set where units go after refuelling at this actor.
    ///
    /// # Errors
    ///
    /// Returns [`FuelError::EntityNotFound`] if the actor doesn't exist.
    pub fn set_rally_point(&mut self, id: EntityId, rally_point: Option<CellPos>) -> Result<()> {
        self.actor_mut(id)?.rally_point = rally_point;
        Ok(())
    }

    /// Register an observer on an actor's own tank.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor doesn't exist or has no tank.
    pub fn subscribe(&mut self, id: EntityId, observer: Box<dyn FuelStateObserver>) -> Result<()> {
        let tank_id = self
            .actors
            .get(&id)
            .ok_or(FuelError::EntityNotFound(id))?
            .tank
            .ok_or(FuelError::NoTank(id))?;
        self.tanks
            .get_mut(tank_id)
            .ok_or(FuelError::TankNotFound(tank_id))?
            .subscribe(observer);
        Ok(())
    }

    /// Register an observer on a player's reserve tank.
    ///
    /// # Errors
    ///
    /// Returns an error if the player doesn't exist.
    pub fn subscribe_reserve(
        &mut self,
        player: PlayerId,
        observer: Box<dyn FuelStateObserver>,
    ) -> Result<()> {
        let tank_id = self
            .players
            .get(&player)
            .ok_or(FuelError::PlayerNotFound(player))?
            .reserve();
        self.tanks
            .get_mut(tank_id)
            .ok_or(FuelError::TankNotFound(tank_id))?
            .subscribe(observer);
        Ok(())
    }

    // ========================================================================
    // UI queries
    // ========================================================================

    /// Tooltip line for a consumer, as seen by `viewer`.
    #[must_use]
    pub fn tooltip(&self, id: EntityId, viewer: PlayerId) -> Option<String> {
        let actor = self.actors.get(&id)?;
        let consumer = actor.consumer.as_ref()?;
        let tank = self.tanks.get(actor.tank?)?;
        let allied = self
            .players
            .get(&actor.owner)
            .is_some_and(|owner| owner.is_allied_with(viewer));
        consumer.tooltip(tank, allied)
    }

    /// Range circle of an area refueler, as seen by `viewer`.
    #[must_use]
    pub fn range_indicator(&self, id: EntityId, viewer: PlayerId) -> Option<RangeIndicator> {
        let actor = self.actors.get(&id)?;
        let refueler = actor.refueler.as_ref()?.as_area()?;
        Some(refueler.range_indicator(actor.position, actor.moving, actor.owner == viewer))
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Advance the world by one tick.
    ///
    /// Runs every phase in order and increments the tick counter.
    pub fn tick(&mut self) -> TickEvents {
        let mut events = TickEvents::default();
        let ids: Vec<EntityId> = self.actors.keys().copied().collect();

        self.run_generators(&ids, &mut events);
        let doomed = self.run_consumers(&ids, &mut events);
        self.run_stationary_refuelers(&ids, &mut events);
        self.run_area_refuelers(&ids, &mut events);
        self.run_refuelables(&ids, &mut events);

        for id in doomed {
            if self.remove_actor(id, RemovalReason::OutOfFuel).is_ok() {
                events.destroyed.push(id);
            }
        }

        self.tick += 1;

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::trace!(tick = self.tick, state_hash = hash, "World state hash");
        }

        events
    }

    fn run_generators(&mut self, ids: &[EntityId], events: &mut TickEvents) {
        for &id in ids {
            let Some(actor) = self.actors.get_mut(&id) else {
                continue;
            };
            if actor.dead {
                continue;
            }
            let Some(generator) = actor.generator.as_mut() else {
                continue;
            };
            let (Some(tank), Some(payer)) = (
                self.tanks.get_mut(generator.target()),
                self.players.get_mut(&generator.account()),
            ) else {
                continue;
            };

            if let Some(generated) = generator.tick(tank, payer, &mut self.conditions) {
                events.notice(tank.holder(), generated.notice);
                events.generated.push(FuelGenerated {
                    generator: id,
                    amount: generated.amount,
                });
            }
        }
    }

    fn run_consumers(&mut self, ids: &[EntityId], events: &mut TickEvents) -> Vec<EntityId> {
        let mut doomed = Vec::new();

        for &id in ids {
            let Some(actor) = self.actors.get_mut(&id) else {
                continue;
            };
            if !actor.is_active() {
                continue;
            }
            let location = actor.location();
            let (Some(consumer), Some(tank_id)) = (actor.consumer.as_mut(), actor.tank) else {
                continue;
            };
            let Some(tank) = self.tanks.get_mut(tank_id) else {
                continue;
            };

            let result = consumer.tick(id, location, tank, &mut self.conditions);
            events.notice(id, result.notice);

            if result.kill {
                debug!(actor = id, "Actor ran out of fuel");
                actor.dead = true;
                doomed.push(id);
            }
        }

        doomed
    }

    fn run_stationary_refuelers(&mut self, ids: &[EntityId], events: &mut TickEvents) {
        for &id in ids {
            let Some(actor) = self.actors.get(&id) else {
                continue;
            };
            if !actor.is_active() {
                continue;
            }
            let Some(Refueler::Stationary(refueler)) = actor.refueler.as_ref() else {
                continue;
            };
            let Some(recipient) = refueler.current_unit() else {
                continue;
            };
            let recipient_position = self
                .actors
                .get(&recipient)
                .filter(|unit| unit.is_active())
                .map(Actor::position);

            let Some(Refueler::Stationary(refueler)) =
                self.actors.get_mut(&id).and_then(|a| a.refueler.as_mut())
            else {
                continue;
            };
            if let Some(transfer) =
                refueler.tick(recipient_position, &mut self.tanks, &mut self.conditions)
            {
                events.transfer(
                    &self.tanks,
                    id,
                    transfer.recipient,
                    refueler.source(),
                    transfer.outcome,
                );
            }
        }
    }

    fn run_area_refuelers(&mut self, ids: &[EntityId], events: &mut TickEvents) {
        for &id in ids {
            let due = match self.actors.get_mut(&id) {
                Some(actor) if actor.is_active() => {
                    let moving = actor.moving;
                    match actor.refueler.as_mut() {
                        Some(Refueler::Area(refueler)) => refueler.advance(moving),
                        _ => false,
                    }
                }
                _ => false,
            };
            if !due {
                continue;
            }

            let candidates = self.area_candidates(id);
            let Some(Refueler::Area(refueler)) =
                self.actors.get(&id).and_then(|a| a.refueler.as_ref())
            else {
                continue;
            };

            for (recipient, recipient_tank) in candidates {
                let outcome =
                    refueler.transfer_to(recipient_tank, &mut self.tanks, &mut self.conditions);
                events.transfer(&self.tanks, id, recipient, refueler.source(), outcome);
            }
        }
    }

    // ========================================================================
    // State hash
    // ========================================================================

    /// Calculate a hash of the current world state.
    ///
    /// Two worlds driven by identical inputs produce identical hashes.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);

        self.players.len().hash(&mut hasher);
        for player in self.players.values() {
            player.id().hash(&mut hasher);
            player.cash().hash(&mut hasher);
            player.reserve().hash(&mut hasher);
        }

        self.tanks.len().hash(&mut hasher);
        for (id, tank) in self.tanks.iter() {
            id.hash(&mut hasher);
            tank.holder().hash(&mut hasher);
            tank.capacity().hash(&mut hasher);
            tank.amount().hash(&mut hasher);
            tank.low_fuel_tokens().len().hash(&mut hasher);
        }

        self.actors.len().hash(&mut hasher);
        for actor in self.actors.values() {
            actor.id.hash(&mut hasher);
            actor.owner.hash(&mut hasher);
            hash_position(actor.position, &mut hasher);
            actor.in_world.hash(&mut hasher);
            actor.moving.hash(&mut hasher);
            actor.airborne.hash(&mut hasher);

            if let Some(generator) = &actor.generator {
                generator.ticks().hash(&mut hasher);
                generator.target().hash(&mut hasher);
            }

            if let Some(consumer) = &actor.consumer {
                consumer.last_location().hash(&mut hasher);
                consumer.was_empty().hash(&mut hasher);
                consumer.kill_countdown().hash(&mut hasher);
                consumer.stopped_countdown().hash(&mut hasher);
            }

            match &actor.refueler {
                Some(Refueler::Stationary(refueler)) => {
                    let session = refueler.session();
                    refueler.source().hash(&mut hasher);
                    session.recipient().hash(&mut hasher);
                    session.ticks().hash(&mut hasher);
                    hash_position(session.last_position(), &mut hasher);
                }
                Some(Refueler::Area(refueler)) => {
                    refueler.ticks().hash(&mut hasher);
                }
                None => {}
            }

            if let Some(refuelable) = &actor.refuelable {
                refuelable.bound_to().hash(&mut hasher);
                refuelable.activity().hash(&mut hasher);
            }
        }

        hasher.finish()
    }
}

fn hash_position(position: Vec2Fixed, hasher: &mut impl Hasher) {
    position.x.to_bits().hash(hasher);
    position.y.to_bits().hash(hasher);
}

/// The reserve for components configured to share it, otherwise the
/// actor's own tank. Rules validation guarantees the own tank exists.
fn source_tank(use_shared_reserve: bool, own: Option<TankId>, reserve: TankId) -> TankId {
    match own {
        Some(own) if !use_shared_reserve => own,
        _ => reserve,
    }
}
