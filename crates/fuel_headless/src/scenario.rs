//! Scenario loading and configuration.
//!
//! Scenarios define the initial world for headless runs: the rules set,
//! the players and their alliances, starting actors, and a script of
//! orders issued at fixed ticks.
//!
//! # Example RON
//!
//! ```ron
//! Scenario(
//!     name: "Depot run",
//!     ticks: 120,
//!     rules: RulesSet(actors: [/* ... */]),
//!     players: [PlayerSetup(name: "Blue", team: 1)],
//!     placements: [
//!         Placement(kind: "fuel_depot", owner: 0, position: (0, 0), label: Some("depot")),
//!         Placement(kind: "truck", owner: 0, position: (10, 0), label: Some("truck")),
//!     ],
//!     orders: [
//!         ScriptedOrder(at_tick: 5, order: Refuel(unit: "truck", host: "depot")),
//!     ],
//! )
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use fuel_core::components::{EntityId, Footprint, PlayerId};
use fuel_core::data::{
    ActorRules, AreaRefuelerData, ConsumerData, GeneratorData, PlayerRules, RefuelableData,
    RulesSet, StationaryRefuelerData, StorageData, TankData,
};
use fuel_core::error::FuelError;
use fuel_core::math::{CellPos, CellVec, Fixed};
use fuel_core::world::World;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// The rules or a placement were rejected by the world.
    #[error("Fuel simulation error: {0}")]
    Fuel(#[from] FuelError),
    /// A placement names a player index that doesn't exist.
    #[error("Placement owner {0} is not a scenario player")]
    UnknownPlayer(usize),
    /// An order names a label no placement defines.
    #[error("Unknown actor label: {0}")]
    UnknownLabel(String),
    /// Two placements share a label.
    #[error("Actor label defined more than once: {0}")]
    DuplicateLabel(String),
}

/// A complete scenario configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Ticks to run when the command line doesn't say.
    #[serde(default = "default_ticks")]
    pub ticks: u64,
    /// Fuel rules for every actor type in the scenario.
    pub rules: RulesSet,
    /// Players, in `PlayerId` order.
    pub players: Vec<PlayerSetup>,
    /// Starting actors.
    #[serde(default)]
    pub placements: Vec<Placement>,
    /// Orders issued during the run.
    #[serde(default)]
    pub orders: Vec<ScriptedOrder>,
}

fn default_ticks() -> u64 {
    600
}

impl Default for Scenario {
    fn default() -> Self {
        Self::convoy()
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        scenario.rules.validate()?;
        Ok(scenario)
    }

    /// The built-in demo: a convoy running down its tanks and refuelling.
    ///
    /// One side has a depot with a rally point, a refinery topping up the
    /// reserve, a silo, a tanker, three trucks and a scout that is sent
    /// further than its tank allows. An enemy truck tries to refuel at the
    /// depot and is turned away.
    #[must_use]
    pub fn convoy() -> Self {
        Self {
            name: "Convoy".to_string(),
            description: "Trucks drive out, run low and return to refuel".to_string(),
            ticks: 300,
            rules: demo_rules(),
            players: vec![PlayerSetup::new("Blue", 1), PlayerSetup::new("Red", 2)],
            placements: vec![
                Placement::new("fuel_depot", 0, 0, 0)
                    .labelled("depot")
                    .with_rally_point(4, 0),
                Placement::new("refinery", 0, 0, 4),
                Placement::new("silo", 0, 3, 4),
                Placement::new("tanker", 0, 20, 8).labelled("tanker"),
                Placement::new("truck", 0, 10, 0).labelled("convoy").times(3),
                Placement::new("scout", 0, 3, 3).labelled("scout"),
                Placement::new("truck", 1, 30, 30).labelled("raider"),
            ],
            orders: vec![
                ScriptedOrder::new(0, Order::Move {
                    unit: "convoy".to_string(),
                    to: (30, 0),
                }),
                ScriptedOrder::new(0, Order::Move {
                    unit: "convoy.1".to_string(),
                    to: (20, 12),
                }),
                ScriptedOrder::new(0, Order::Move {
                    unit: "scout".to_string(),
                    to: (3, 12),
                }),
                ScriptedOrder::new(5, Order::Refuel {
                    unit: "raider".to_string(),
                    host: "depot".to_string(),
                }),
                ScriptedOrder::new(20, Order::Refuel {
                    unit: "convoy.1".to_string(),
                    host: "tanker".to_string(),
                }),
                ScriptedOrder::new(35, Order::Refuel {
                    unit: "convoy".to_string(),
                    host: "depot".to_string(),
                }),
            ],
        }
    }

    /// Build the starting world.
    ///
    /// Players are added in order and players sharing a team are allied.
    /// A placement with `count > 1` spawns a row along +x; the first actor
    /// takes the label and later ones get `label.1`, `label.2`, ...
    ///
    /// # Errors
    ///
    /// Returns an error if the rules are invalid, a placement names an
    /// unknown actor type or player, or an order names an unknown label.
    pub fn build(&self) -> Result<(World, Roster), ScenarioError> {
        let mut world = World::new(self.rules.clone())?;
        let mut roster = Roster::default();

        for setup in &self.players {
            let id = world.add_player();
            world.give_cash(id, setup.extra_cash)?;
            roster.players.push(id);
        }

        for (i, a) in self.players.iter().enumerate() {
            for (j, b) in self.players.iter().enumerate().skip(i + 1) {
                if a.team == b.team {
                    world.set_allied(roster.players[i], roster.players[j])?;
                }
            }
        }

        for placement in &self.placements {
            let owner = roster.player(placement.owner)?;
            let (x, y) = placement.position;

            for n in 0..placement.count {
                let offset = i32::try_from(n).unwrap_or(i32::MAX);
                let id = world.spawn(&placement.kind, owner, CellPos::new(x.saturating_add(offset), y))?;
                if let Some((rx, ry)) = placement.rally_point {
                    world.set_rally_point(id, Some(CellPos::new(rx, ry)))?;
                }
                if let Some(label) = &placement.label {
                    let name = if n == 0 {
                        label.clone()
                    } else {
                        format!("{label}.{n}")
                    };
                    roster.insert(name, id)?;
                }
            }
        }

        for scripted in &self.orders {
            for label in scripted.order.labels() {
                roster.unit(label)?;
            }
        }

        debug!(
            scenario = %self.name,
            players = roster.players.len(),
            actors = world.actors().count(),
            "Scenario built"
        );
        Ok((world, roster))
    }
}

/// Load and validate a rules file.
pub fn load_rules<P: AsRef<Path>>(path: P) -> Result<RulesSet, ScenarioError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ScenarioError::FileNotFound(path.display().to_string()));
    }
    let contents = std::fs::read_to_string(path)?;
    Ok(RulesSet::from_ron_str(&contents)?)
}

/// Setup for a single player in the scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSetup {
    /// Display name.
    pub name: String,
    /// Players on the same team are allied.
    #[serde(default)]
    pub team: u32,
    /// Cash on top of the rules' starting cash.
    #[serde(default)]
    pub extra_cash: i32,
}

impl PlayerSetup {
    /// Create a player on `team` with the default cash.
    #[must_use]
    pub fn new(name: impl Into<String>, team: u32) -> Self {
        Self {
            name: name.into(),
            team,
            extra_cash: 0,
        }
    }
}

/// Placement of one or more actors at scenario start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Placement {
    /// Actor type name from the rules set.
    pub kind: String,
    /// Index into [`Scenario::players`].
    pub owner: usize,
    /// Cell (x, y).
    pub position: (i32, i32),
    /// Number of actors to spawn.
    #[serde(default = "default_count")]
    pub count: u32,
    /// Name used by scripted orders.
    #[serde(default)]
    pub label: Option<String>,
    /// Rally point for units refuelled here.
    #[serde(default)]
    pub rally_point: Option<(i32, i32)>,
}

fn default_count() -> u32 {
    1
}

impl Placement {
    /// Create a single unlabelled placement.
    #[must_use]
    pub fn new(kind: impl Into<String>, owner: usize, x: i32, y: i32) -> Self {
        Self {
            kind: kind.into(),
            owner,
            position: (x, y),
            count: 1,
            label: None,
            rally_point: None,
        }
    }

    /// Give the placement a label.
    #[must_use]
    pub fn labelled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Spawn `count` actors in a row.
    #[must_use]
    pub fn times(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    /// Set the rally point.
    #[must_use]
    pub fn with_rally_point(mut self, x: i32, y: i32) -> Self {
        self.rally_point = Some((x, y));
        self
    }
}

/// An order issued when the world reaches `at_tick`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptedOrder {
    /// Tick at which the order is issued, before that tick runs.
    pub at_tick: u64,
    /// The order.
    pub order: Order,
}

impl ScriptedOrder {
    /// Create a scripted order.
    #[must_use]
    pub fn new(at_tick: u64, order: Order) -> Self {
        Self { at_tick, order }
    }
}

/// Orders the headless host can issue. Units are named by label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Order {
    /// Drive to a cell, one cell per tick.
    Move {
        /// Unit label.
        unit: String,
        /// Destination cell.
        to: (i32, i32),
    },
    /// Refuel at a host.
    Refuel {
        /// Unit label.
        unit: String,
        /// Refueler label.
        host: String,
    },
    /// Abandon a refuel order.
    CancelRefuel {
        /// Unit label.
        unit: String,
    },
    /// Hand an actor to another player.
    Capture {
        /// Actor label.
        unit: String,
        /// Index into [`Scenario::players`].
        new_owner: usize,
    },
    /// Sell an actor.
    Sell {
        /// Actor label.
        unit: String,
    },
}

impl Order {
    /// Labels this order refers to.
    #[must_use]
    pub fn labels(&self) -> Vec<&str> {
        match self {
            Self::Move { unit, .. }
            | Self::CancelRefuel { unit }
            | Self::Capture { unit, .. }
            | Self::Sell { unit } => vec![unit.as_str()],
            Self::Refuel { unit, host } => vec![unit.as_str(), host.as_str()],
        }
    }
}

/// Mapping from scenario names to world identifiers.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    players: Vec<PlayerId>,
    labels: BTreeMap<String, EntityId>,
}

impl Roster {
    /// Player for a scenario player index.
    pub fn player(&self, index: usize) -> Result<PlayerId, ScenarioError> {
        self.players
            .get(index)
            .copied()
            .ok_or(ScenarioError::UnknownPlayer(index))
    }

    /// Actor for a label.
    pub fn unit(&self, label: &str) -> Result<EntityId, ScenarioError> {
        self.labels
            .get(label)
            .copied()
            .ok_or_else(|| ScenarioError::UnknownLabel(label.to_string()))
    }

    /// All players in order.
    #[must_use]
    pub fn players(&self) -> &[PlayerId] {
        &self.players
    }

    /// Label of an actor, if it has one.
    #[must_use]
    pub fn label_of(&self, id: EntityId) -> Option<&str> {
        self.labels
            .iter()
            .find(|(_, &v)| v == id)
            .map(|(k, _)| k.as_str())
    }

    fn insert(&mut self, label: String, id: EntityId) -> Result<(), ScenarioError> {
        if self.labels.contains_key(&label) {
            return Err(ScenarioError::DuplicateLabel(label));
        }
        self.labels.insert(label, id);
        Ok(())
    }
}

/// Rules used by [`Scenario::convoy`].
#[must_use]
pub fn demo_rules() -> RulesSet {
    let mut truck = ActorRules::named("truck");
    truck.tank = Some(TankData {
        low_fuel_conditions: vec!["low-fuel".to_string()],
        ..TankData::with_capacity(60)
    });
    truck.consumer = Some(ConsumerData::default());
    truck.refuelable = Some(RefuelableData {
        allowed_refueler_types: vec!["fuel_depot".to_string(), "tanker".to_string()],
    });

    let mut scout = ActorRules::named("scout");
    scout.tank = Some(TankData::with_capacity(12));
    scout.consumer = Some(ConsumerData {
        consumption_per_move: 2,
        kill_on_empty: true,
        kill_delay: 10,
        out_of_fuel_condition: Some("stranded".to_string()),
        ..ConsumerData::default()
    });
    scout.refuelable = Some(RefuelableData {
        allowed_refueler_types: vec!["fuel_depot".to_string()],
    });

    let mut depot = ActorRules::named("fuel_depot");
    depot.footprint = Footprint {
        width: 2,
        height: 2,
    };
    depot.stationary_refueler = Some(StationaryRefuelerData {
        fuel_per_transfer: 5,
        transfer_interval: 2,
        dock_offset: CellVec::new(1, 1),
        use_shared_reserve: true,
    });
    depot.storage = Some(StorageData { capacity: 400 });

    let mut tanker = ActorRules::named("tanker");
    tanker.tank = Some(TankData::with_capacity(40));
    tanker.area_refueler = Some(AreaRefuelerData {
        fuel_per_transfer: 2,
        transfer_interval: 3,
        radius: Fixed::from_num(3),
        ..AreaRefuelerData::default()
    });

    let mut refinery = ActorRules::named("refinery");
    refinery.generator = Some(GeneratorData {
        fuel_per_interval: 20,
        cost_per_interval: 10,
        ..GeneratorData::default()
    });

    let mut silo = ActorRules::named("silo");
    silo.storage = Some(StorageData { capacity: 600 });

    RulesSet {
        player: PlayerRules {
            reserve: TankData::with_capacity(100),
            starting_cash: 2000,
        },
        actors: vec![truck, scout, depot, tanker, refinery, silo],
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_convoy_builds() {
        let scenario = Scenario::convoy();
        let (world, roster) = scenario.build().unwrap();

        assert_eq!(roster.players().len(), 2);
        // Three trucks, plus one of each other placement.
        assert_eq!(world.actors().count(), 9);
        assert!(roster.unit("convoy.2").is_ok());
        assert!(roster.unit("convoy.3").is_err());

        let depot = roster.unit("depot").unwrap();
        assert_eq!(
            world.actor(depot).and_then(|a| a.rally_point()),
            Some(CellPos::new(4, 0))
        );
    }

    #[test]
    fn test_teams_decide_alliances() {
        let (world, roster) = Scenario::convoy().build().unwrap();
        let blue = world.player(roster.player(0).unwrap()).unwrap();
        assert!(!blue.is_allied_with(roster.player(1).unwrap()));
    }

    #[test]
    fn test_bundled_scenario_parses() {
        let scenario = Scenario::from_ron_str(include_str!("../scenarios/depot_run.ron")).unwrap();
        assert_eq!(scenario.name, "Depot run");
        assert!(scenario.build().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(include_str!("../scenarios/depot_run.ron").as_bytes())
            .unwrap();

        let scenario = Scenario::load(file.path()).unwrap();
        assert_eq!(scenario.players.len(), 1);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Scenario::load("/definitely/not/here.ron"),
            Err(ScenarioError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_unknown_label_rejected() {
        let mut scenario = Scenario::convoy();
        scenario.orders.push(ScriptedOrder::new(1, Order::Sell {
            unit: "ghost".to_string(),
        }));
        assert!(matches!(
            scenario.build(),
            Err(ScenarioError::UnknownLabel(label)) if label == "ghost"
        ));
    }

    #[test]
    fn test_unknown_owner_rejected() {
        let mut scenario = Scenario::convoy();
        scenario.placements.push(Placement::new("truck", 7, 0, 0));
        assert!(matches!(
            scenario.build(),
            Err(ScenarioError::UnknownPlayer(7))
        ));
    }

    #[test]
    fn test_duplicate_label_rejected() {
        let mut scenario = Scenario::convoy();
        scenario
            .placements
            .push(Placement::new("truck", 0, 0, 9).labelled("scout"));
        assert!(matches!(
            scenario.build(),
            Err(ScenarioError::DuplicateLabel(_))
        ));
    }

    #[test]
    fn test_invalid_rules_rejected() {
        let ron = r#"
            Scenario(
                name: "Broken",
                rules: RulesSet(actors: [
                    ActorRules(name: "glider", consumer: Some(ConsumerData())),
                ]),
                players: [],
            )
        "#;
        assert!(matches!(
            Scenario::from_ron_str(ron),
            Err(ScenarioError::Fuel(FuelError::MissingCapability { .. }))
        ));
    }

    #[test]
    fn test_load_rules_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"RulesSet(actors: [ActorRules(name: "silo", storage: Some(StorageData(capacity: 10)))])"#
        )
        .unwrap();

        let rules = load_rules(file.path()).unwrap();
        assert!(rules.get("silo").is_some());
    }

    #[test]
    fn test_demo_rules_validate() {
        assert!(demo_rules().validate().is_ok());
    }
}
