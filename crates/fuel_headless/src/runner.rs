//! Headless host implementation.
//!
//! The fuel world leaves movement to its host. [`HeadlessRunner`] is the
//! smallest host that makes a scenario playable: it issues scripted
//! orders, walks units one cell per tick towards their destinations,
//! feeds the refuel protocols' move orders back into that walk and keeps
//! running totals of what happened.

use std::collections::BTreeMap;
use std::fmt;

use fuel_core::components::{EntityId, MoveDestination, PlayerId, RemovalReason};
use fuel_core::consumer::FuelRange;
use fuel_core::error::Result as FuelResult;
use fuel_core::math::CellPos;
use fuel_core::script::{self, FuelProperties};
use fuel_core::tank::FuelNotice;
use fuel_core::world::{Actor, TickEvents, World};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::scenario::{Order, Roster, Scenario, ScenarioError};

/// Final state of one actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorSummary {
    /// World id.
    pub id: EntityId,
    /// Scenario label, if any.
    pub label: Option<String>,
    /// Actor type.
    pub actor_type: String,
    /// Owner.
    pub owner: PlayerId,
    /// Cell (x, y).
    pub cell: (i32, i32),
    /// Fuel in the actor's own tank.
    pub fuel: Option<i32>,
    /// Capacity of the actor's own tank.
    pub capacity: Option<i32>,
}

/// Final state of one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSummary {
    /// Player id.
    pub player: PlayerId,
    /// Cash left.
    pub cash: i32,
    /// Fuel in the reserve.
    pub reserve: i32,
    /// Reserve capacity.
    pub reserve_capacity: i32,
}

/// Outcome of a headless run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Scenario name.
    pub scenario: String,
    /// Ticks simulated.
    pub ticks: u64,
    /// Final world state hash.
    pub state_hash: u64,
    /// Fuel moved by refuelers.
    pub fuel_transferred: i64,
    /// Number of refueler transfers.
    pub transfers: u64,
    /// Fuel produced by generators.
    pub fuel_generated: i64,
    /// Low fuel notices.
    pub low_fuel_notices: u64,
    /// Out of fuel notices.
    pub out_of_fuel_notices: u64,
    /// Refuelled notices.
    pub refuelled_notices: u64,
    /// Move orders issued by the refuel protocols.
    pub move_orders: u64,
    /// Scripted orders the world refused.
    pub rejected_orders: u64,
    /// Actors destroyed by the kill policy, in order.
    pub destroyed: Vec<EntityId>,
    /// Surviving actors.
    pub actors: Vec<ActorSummary>,
    /// Players.
    pub players: Vec<PlayerSummary>,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Scenario: {}", self.scenario)?;
        writeln!(f, "Ticks: {}  State hash: {:#018x}", self.ticks, self.state_hash)?;
        writeln!(
            f,
            "Fuel: {} generated, {} transferred in {} transfers",
            self.fuel_generated, self.fuel_transferred, self.transfers
        )?;
        writeln!(
            f,
            "Notices: {} low, {} out of fuel, {} refuelled",
            self.low_fuel_notices, self.out_of_fuel_notices, self.refuelled_notices
        )?;
        writeln!(
            f,
            "Orders: {} protocol moves, {} rejected",
            self.move_orders, self.rejected_orders
        )?;
        if !self.destroyed.is_empty() {
            writeln!(f, "Destroyed: {:?}", self.destroyed)?;
        }

        writeln!(f, "Players:")?;
        for p in &self.players {
            writeln!(
                f,
                "  {}: cash {}, reserve {}/{}",
                p.player, p.cash, p.reserve, p.reserve_capacity
            )?;
        }

        writeln!(f, "Actors:")?;
        for a in &self.actors {
            let name = a.label.as_deref().unwrap_or(&a.actor_type);
            write!(f, "  #{} {} ({}) at {:?}", a.id, name, a.owner, a.cell)?;
            if let (Some(fuel), Some(capacity)) = (a.fuel, a.capacity) {
                write!(f, " fuel {fuel}/{capacity}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Drives a [`World`] through a scenario.
pub struct HeadlessRunner {
    scenario: Scenario,
    world: World,
    roster: Roster,
    moves: BTreeMap<EntityId, MoveDestination>,
    totals: RunSummary,
}

impl HeadlessRunner {
    /// Build the scenario's world.
    ///
    /// # Errors
    ///
    /// Returns an error if the scenario cannot be built.
    pub fn new(scenario: Scenario) -> Result<Self, ScenarioError> {
        let (world, roster) = scenario.build()?;
        let totals = RunSummary {
            scenario: scenario.name.clone(),
            ..RunSummary::default()
        };
        Ok(Self {
            scenario,
            world,
            roster,
            moves: BTreeMap::new(),
            totals,
        })
    }

    /// The world being driven.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Label mapping.
    #[must_use]
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Destination of a unit the runner is currently moving.
    #[must_use]
    pub fn destination(&self, id: EntityId) -> Option<MoveDestination> {
        self.moves.get(&id).copied()
    }

    /// Run `ticks` ticks and summarize.
    ///
    /// # Errors
    ///
    /// Returns an error if the world rejects a host update.
    pub fn run(&mut self, ticks: u64) -> FuelResult<RunSummary> {
        info!(scenario = %self.scenario.name, ticks, "Starting run");
        for _ in 0..ticks {
            self.step()?;
        }
        let summary = self.summary();
        info!(
            ticks = summary.ticks,
            transferred = summary.fuel_transferred,
            destroyed = summary.destroyed.len(),
            state_hash = summary.state_hash,
            "Run complete"
        );
        Ok(summary)
    }

    /// Advance one tick: issue due orders, move units, tick the world.
    ///
    /// # Errors
    ///
    /// Returns an error if the world rejects a host update.
    pub fn step(&mut self) -> FuelResult<TickEvents> {
        self.issue_orders();
        self.advance_moves()?;
        let events = self.world.tick();
        self.record(&events);
        Ok(events)
    }

    /// Snapshot of the totals and the current world.
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        let actors = self
            .world
            .actors()
            .map(|actor| {
                let tank = self.world.actor_tank(actor.id());
                let cell = actor.location();
                ActorSummary {
                    id: actor.id(),
                    label: self.roster.label_of(actor.id()).map(str::to_string),
                    actor_type: actor.actor_type().to_string(),
                    owner: actor.owner(),
                    cell: (cell.x, cell.y),
                    fuel: tank.map(|t| t.amount()),
                    capacity: tank.map(|t| t.capacity()),
                }
            })
            .collect();

        let players = self
            .world
            .players()
            .map(|player| {
                let reserve = self.world.reserve(player.id());
                PlayerSummary {
                    player: player.id(),
                    cash: player.cash(),
                    reserve: reserve.map_or(0, |t| t.amount()),
                    reserve_capacity: reserve.map_or(0, |t| t.capacity()),
                }
            })
            .collect();

        RunSummary {
            ticks: self.world.get_tick(),
            state_hash: self.world.state_hash(),
            actors,
            players,
            ..self.totals.clone()
        }
    }

    fn issue_orders(&mut self) {
        let tick = self.world.get_tick();
        let due: Vec<Order> = self
            .scenario
            .orders
            .iter()
            .filter(|scripted| scripted.at_tick == tick)
            .map(|scripted| scripted.order.clone())
            .collect();

        for order in due {
            if let Err(err) = self.issue(&order) {
                warn!(tick, ?order, %err, "Scripted order rejected");
                self.totals.rejected_orders += 1;
            }
        }
    }

    fn issue(&mut self, order: &Order) -> Result<(), ScenarioError> {
        match order {
            Order::Move { unit, to } => {
                let id = self.roster.unit(unit)?;
                if self.world.actor(id).is_none() {
                    return Err(fuel_core::error::FuelError::EntityNotFound(id).into());
                }
                self.moves
                    .insert(id, MoveDestination::Cell(CellPos::new(to.0, to.1)));
                debug!(unit = id, ?to, "Move ordered");
            }
            Order::Refuel { unit, host } => {
                let id = self.roster.unit(unit)?;
                let host = self.roster.unit(host)?;
                script::refuel(&mut self.world, id, host)?;
                self.moves.remove(&id);
            }
            Order::CancelRefuel { unit } => {
                let id = self.roster.unit(unit)?;
                self.world.cancel_refuel(id);
            }
            Order::Capture { unit, new_owner } => {
                let id = self.roster.unit(unit)?;
                let owner = self.roster.player(*new_owner)?;
                self.world.change_owner(id, owner)?;
            }
            Order::Sell { unit } => {
                let id = self.roster.unit(unit)?;
                self.world.remove_actor(id, RemovalReason::Sold)?;
                self.moves.remove(&id);
            }
        }
        Ok(())
    }

    fn advance_moves(&mut self) -> FuelResult<()> {
        let pending: Vec<(EntityId, MoveDestination)> =
            self.moves.iter().map(|(&id, &dest)| (id, dest)).collect();

        for (id, destination) in pending {
            let Some(actor) = self.world.actor(id) else {
                self.moves.remove(&id);
                continue;
            };
            let here = actor.location();

            let goal = match destination {
                MoveDestination::Cell(cell) => (here != cell).then_some(cell),
                MoveDestination::WithinRange { target, range } => self
                    .world
                    .actor(target)
                    .filter(|t| !t.position().is_within(actor.position(), range))
                    .map(Actor::location),
            };

            let Some(goal) = goal else {
                self.world.set_moving(id, false)?;
                self.moves.remove(&id);
                continue;
            };

            if self.is_stranded(id) {
                self.world.set_moving(id, false)?;
                continue;
            }

            let next = CellPos::new(
                here.x + (goal.x - here.x).signum(),
                here.y + (goal.y - here.y).signum(),
            );
            self.world.move_to_cell(id, next)?;
            self.world.set_moving(id, true)?;
        }
        Ok(())
    }

    /// Out of fuel with a consumer that needs fuel to move.
    fn is_stranded(&self, id: EntityId) -> bool {
        FuelProperties::new(&self.world, id).is_ok_and(|props| {
            props.is_out_of_fuel() && matches!(props.fuel_range(), Some(FuelRange::Cells(_)))
        })
    }

    fn record(&mut self, events: &TickEvents) {
        let totals = &mut self.totals;

        for transfer in &events.transfers {
            totals.fuel_transferred += i64::from(transfer.amount);
            totals.transfers += 1;
        }
        for generated in &events.generated {
            totals.fuel_generated += i64::from(generated.amount);
        }
        for event in &events.fuel_events {
            match event.notice {
                FuelNotice::LowOnFuel => totals.low_fuel_notices += 1,
                FuelNotice::OutOfFuel => totals.out_of_fuel_notices += 1,
                FuelNotice::Refuelled => totals.refuelled_notices += 1,
            }
        }
        for order in &events.move_orders {
            totals.move_orders += 1;
            self.moves.insert(order.actor, order.destination);
        }
        for &id in &events.destroyed {
            info!(actor = id, "Destroyed by the out-of-fuel policy");
            totals.destroyed.push(id);
            self.moves.remove(&id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn depot_run() -> HeadlessRunner {
        let scenario =
            Scenario::from_ron_str(include_str!("../scenarios/depot_run.ron")).unwrap();
        HeadlessRunner::new(scenario).unwrap()
    }

    #[test]
    fn test_units_walk_one_cell_per_tick() {
        let mut runner = depot_run();
        let truck = runner.roster().unit("truck").unwrap();

        for _ in 0..3 {
            runner.step().unwrap();
        }

        let actor = runner.world().actor(truck).unwrap();
        assert_eq!(actor.location(), CellPos::new(7, 0));
        assert!(actor.is_moving());
        assert_eq!(runner.world().fuel_level(truck), Some(37));
    }

    #[test]
    fn test_depot_run_refuels_and_rallies() {
        let mut runner = depot_run();
        let truck = runner.roster().unit("truck").unwrap();

        let summary = runner.run(120).unwrap();

        let actor = runner.world().actor(truck).unwrap();
        assert_eq!(actor.location(), CellPos::new(3, 0));
        assert!(!actor.is_moving());
        assert_eq!(runner.world().fuel_level(truck), Some(38));
        assert_eq!(summary.fuel_transferred, 35);
        assert_eq!(summary.refuelled_notices, 1);
        assert!(summary.low_fuel_notices >= 1);
        assert!(summary.fuel_generated > 0);
        assert_eq!(summary.ticks, 120);
    }

    #[test]
    fn test_convoy_is_deterministic() {
        let first = HeadlessRunner::new(Scenario::convoy())
            .unwrap()
            .run(200)
            .unwrap();
        let second = HeadlessRunner::new(Scenario::convoy())
            .unwrap()
            .run(200)
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_convoy_outcomes() {
        let mut runner = HeadlessRunner::new(Scenario::convoy()).unwrap();
        let scout = runner.roster().unit("scout").unwrap();

        let summary = runner.run(300).unwrap();

        // The enemy truck is turned away from the depot.
        assert_eq!(summary.rejected_orders, 1);
        // The scout runs dry short of its destination and is lost.
        assert!(summary.destroyed.contains(&scout));
        assert!(runner.world().actor(scout).is_none());
        assert!(summary.fuel_transferred > 0);
        assert!(summary.move_orders >= 2);
    }

    #[test]
    fn test_stranded_units_stop() {
        let mut runner = HeadlessRunner::new(Scenario::convoy()).unwrap();
        let scout = runner.roster().unit("scout").unwrap();

        for _ in 0..8 {
            runner.step().unwrap();
        }

        let actor = runner.world().actor(scout).unwrap();
        assert_eq!(actor.location(), CellPos::new(3, 9));
        assert!(!actor.is_moving());
        assert!(runner.destination(scout).is_some());
    }

    #[test]
    fn test_summary_serializes_to_json() {
        let summary = depot_run().run(10).unwrap();
        let json = serde_json::to_string(&summary).unwrap();
        let back: RunSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(back, summary);
        assert!(summary.to_string().contains("Scenario: Depot run"));
    }
}
