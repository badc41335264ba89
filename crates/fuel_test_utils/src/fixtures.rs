//! Test fixtures and helpers.
//!
//! A shared rules set and pre-built worlds for consistent testing.
//!
//! # Actor Types
//!
//! | Name         | Capabilities                                           |
//! |--------------|--------------------------------------------------------|
//! | `truck`      | tank 100, consumer, refuelable at depots and tankers   |
//! | `scout`      | tank 10, consumer that dies 5 ticks after running dry  |
//! | `fuel_depot` | 2x2 stationary refueler (4 per 2 ticks), storage 500   |
//! | `tanker`     | tank 3, area refueler (2 per tick, radius 3)           |
//! | `refinery`   | generator (10 fuel for 5 cash every 25 ticks)          |
//! | `silo`       | storage 1000                                           |
//!
//! Every player starts with a full 200 fuel reserve and 1000 cash.

use std::cell::RefCell;
use std::rc::Rc;

use fixed::types::I32F32;
use fuel_core::components::{EntityId, PlayerId};
use fuel_core::data::RulesSet;
use fuel_core::math::CellPos;
use fuel_core::tank::{FuelNotice, FuelStateObserver, TankStatus};
use fuel_core::world::World;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Rules shared by the test suites.
pub const RULES_RON: &str = r#"
RulesSet(
    player: PlayerRules(
        reserve: TankData(capacity: 200),
        starting_cash: 1000,
    ),
    actors: [
        ActorRules(
            name: "truck",
            tank: Some(TankData(capacity: 100, low_fuel_conditions: ["low-fuel"])),
            consumer: Some(ConsumerData(consumption_per_move: 1)),
            refuelable: Some(RefuelableData(allowed_refueler_types: ["fuel_depot", "tanker"])),
        ),
        ActorRules(
            name: "scout",
            tank: Some(TankData(capacity: 10)),
            consumer: Some(ConsumerData(
                consumption_per_move: 2,
                kill_on_empty: true,
                kill_delay: 5,
                out_of_fuel_condition: Some("stranded"),
            )),
            refuelable: Some(RefuelableData(allowed_refueler_types: ["fuel_depot"])),
        ),
        ActorRules(
            name: "fuel_depot",
            footprint: (width: 2, height: 2),
            stationary_refueler: Some(StationaryRefuelerData(
                fuel_per_transfer: 4,
                transfer_interval: 2,
                dock_offset: (x: 1, y: 1),
            )),
            storage: Some(StorageData(capacity: 500)),
        ),
        ActorRules(
            name: "tanker",
            tank: Some(TankData(capacity: 3)),
            area_refueler: Some(AreaRefuelerData(
                fuel_per_transfer: 2,
                transfer_interval: 1,
                radius: 12884901888,
            )),
        ),
        ActorRules(
            name: "refinery",
            generator: Some(GeneratorData(fuel_per_interval: 10, cost_per_interval: 5, interval: 25)),
        ),
        ActorRules(
            name: "silo",
            storage: Some(StorageData(capacity: 1000)),
        ),
    ],
)
"#;

/// Parse [`RULES_RON`].
///
/// # Panics
///
/// Panics if the fixture rules fail to parse.
#[must_use]
pub fn rules() -> RulesSet {
    RulesSet::from_ron_str(RULES_RON).expect("fixture rules must parse")
}

/// An empty world using [`rules`].
///
/// # Panics
///
/// Panics if the fixture rules are invalid.
#[must_use]
pub fn world() -> World {
    World::new(rules()).expect("fixture rules must validate")
}

/// A world with two players that are not allied.
#[must_use]
pub fn two_player_world() -> (World, PlayerId, PlayerId) {
    let mut world = world();
    let a = world.add_player();
    let b = world.add_player();
    (world, a, b)
}

/// Spawn an actor, panicking on failure.
///
/// # Panics
///
/// Panics if the actor type or owner is unknown.
pub fn spawn(world: &mut World, actor_type: &str, owner: PlayerId, x: i32, y: i32) -> EntityId {
    world
        .spawn(actor_type, owner, CellPos::new(x, y))
        .expect("fixture spawn must succeed")
}

/// Walk an actor back and forth for `cells` moves, ticking after each.
///
/// # Panics
///
/// Panics if the actor doesn't exist.
pub fn burn(world: &mut World, actor: EntityId, cells: i32) {
    let start = world.actor(actor).expect("actor exists").location();
    for step in 1..=cells {
        let cell = if step % 2 == 1 {
            CellPos::new(start.x + 1, start.y)
        } else {
            start
        };
        world.move_to_cell(actor, cell).expect("actor exists");
        world.tick();
    }
}

/// A busy world for determinism and benchmark runs.
///
/// One player with a depot, a refinery, a tanker and a column of trucks
/// that wander back and forth on a fixed schedule via [`step_demo`].
///
/// # Panics
///
/// Panics if the fixture rules are invalid.
#[must_use]
pub fn demo_world(trucks: i32) -> World {
    let mut world = world();
    let player = world.add_player();
    let ally = world.add_player();
    world.set_allied(player, ally).expect("players exist");

    spawn(&mut world, "fuel_depot", player, 0, 0);
    spawn(&mut world, "refinery", player, 4, 0);
    spawn(&mut world, "tanker", ally, 10, 5);

    for i in 0..trucks {
        spawn(&mut world, "truck", if i % 2 == 0 { player } else { ally }, 8 + i % 5, 2 + i / 5);
    }

    world
}

/// Advance a [`demo_world`] one tick, moving trucks on a fixed pattern.
pub fn step_demo(world: &mut World) {
    let tick = world.get_tick();
    let trucks: Vec<(EntityId, CellPos)> = world
        .actors()
        .filter(|a| a.actor_type() == "truck")
        .map(|a| (a.id(), a.location()))
        .collect();

    for (index, (id, location)) in trucks.into_iter().enumerate() {
        let phase = (tick + index as u64) % 8;
        let dx = if phase < 4 { 1 } else { -1 };
        let moving = phase % 4 != 3;
        let target = if moving {
            CellPos::new(location.x + dx, location.y)
        } else {
            location
        };
        let _ = world.move_to_cell(id, target);
        let _ = world.set_moving(id, moving);
    }

    world.tick();
}

/// Observer that records every notice it receives.
///
/// Clones share the same log, so keep one clone and hand the other to the
/// tank.
#[derive(Debug, Clone, Default)]
pub struct NoticeRecorder {
    log: Rc<RefCell<Vec<(EntityId, FuelNotice)>>>,
}

impl NoticeRecorder {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Boxed clone for [`World::subscribe`].
    #[must_use]
    pub fn boxed(&self) -> Box<dyn FuelStateObserver> {
        Box::new(self.clone())
    }

    /// Everything recorded so far.
    #[must_use]
    pub fn notices(&self) -> Vec<(EntityId, FuelNotice)> {
        self.log.borrow().clone()
    }

    /// How often `notice` was recorded.
    #[must_use]
    pub fn count(&self, notice: FuelNotice) -> usize {
        self.log.borrow().iter().filter(|(_, n)| *n == notice).count()
    }
}

impl FuelStateObserver for NoticeRecorder {
    fn low_on_fuel(&mut self, holder: EntityId, _status: &TankStatus) {
        self.log.borrow_mut().push((holder, FuelNotice::LowOnFuel));
    }

    fn out_of_fuel(&mut self, holder: EntityId, _status: &TankStatus) {
        self.log.borrow_mut().push((holder, FuelNotice::OutOfFuel));
    }

    fn refuelled(&mut self, holder: EntityId, _status: &TankStatus) {
        self.log.borrow_mut().push((holder, FuelNotice::Refuelled));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_rules_parse() {
        let rules = rules();
        assert_eq!(rules.actors.len(), 6);
        assert_eq!(rules.player.starting_cash, 1000);
        assert_eq!(rules.player.reserve.capacity, 200);
        assert_eq!(
            rules.get("tanker").and_then(|r| r.area_refueler).map(|a| a.radius),
            Some(fixed(3))
        );
    }

    #[test]
    fn test_demo_world_populates() {
        let world = demo_world(6);
        assert_eq!(world.actors().count(), 9);
        assert_eq!(world.players().count(), 2);
    }

    #[test]
    fn test_fixed_helpers() {
        assert_eq!(fixed(3), I32F32::from_num(3));
        assert_eq!(fixed_f(0.5) * fixed(2), fixed(1));
    }
}
