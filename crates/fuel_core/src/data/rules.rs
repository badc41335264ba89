//! Complete rules set: every actor type plus the player defaults.

use serde::{Deserialize, Serialize};

use super::consumer_data::ConsumerData;
use super::generator_data::GeneratorData;
use super::refuel_data::{AreaRefuelerData, RefuelableData, StationaryRefuelerData};
use super::tank_data::{StorageData, TankData};
use crate::components::Footprint;
use crate::error::{FuelError, Result};

/// Fuel capabilities of one actor type.
///
/// Each capability slot is optional; an actor type declares only what it
/// needs.
///
/// # Example RON
///
/// ```ron
/// ActorRules(
///     name: "truck",
///     tank: Some(TankData(capacity: 100)),
///     consumer: Some(ConsumerData(consumption_per_move: 1)),
///     refuelable: Some(RefuelableData(allowed_refueler_types: ["fuel_depot"])),
/// )
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActorRules {
    /// Actor type name, referenced by refuelable allow-lists.
    pub name: String,

    /// Cells occupied on the grid.
    #[serde(default)]
    pub footprint: Footprint,

    /// The actor's own fuel tank.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tank: Option<TankData>,

    /// Cash-to-fuel generator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator: Option<GeneratorData>,

    /// Fuel consumption.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumer: Option<ConsumerData>,

    /// Exclusive docking refueler.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stationary_refueler: Option<StationaryRefuelerData>,

    /// Radius refueler.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_refueler: Option<AreaRefuelerData>,

    /// Can receive fuel from refuelers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refuelable: Option<RefuelableData>,

    /// Adds capacity to the owner's reserve.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageData>,
}

impl ActorRules {
    /// Rules for an actor type with no capabilities.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Check capability dependencies and value ranges.
    pub fn validate(&self) -> Result<()> {
        let missing = |capability, requires| FuelError::MissingCapability {
            actor_type: self.name.clone(),
            capability,
            requires,
        };
        let invalid = |field, message: &str| FuelError::InvalidValue {
            actor_type: self.name.clone(),
            field,
            message: message.to_string(),
        };

        if self.stationary_refueler.is_some() && self.area_refueler.is_some() {
            return Err(FuelError::ConflictingCapabilities {
                actor_type: self.name.clone(),
                first: "stationary_refueler",
                second: "area_refueler",
            });
        }

        if let Some(tank) = &self.tank {
            if tank.capacity < 0 {
                return Err(invalid("tank.capacity", "must not be negative"));
            }
            if !(0..=100).contains(&tank.low_fuel_warning_percent) {
                return Err(invalid(
                    "tank.low_fuel_warning_percent",
                    "must be between 0 and 100",
                ));
            }
        }

        if let Some(consumer) = &self.consumer {
            if self.tank.is_none() {
                return Err(missing("consumer", "tank"));
            }
            if consumer.consumption_per_move < 0 || consumer.consumption_while_stopped < 0 {
                return Err(invalid("consumer", "consumption must not be negative"));
            }
        }

        if self.refuelable.is_some() {
            if self.tank.is_none() {
                return Err(missing("refuelable", "tank"));
            }
            if self.consumer.is_none() {
                return Err(missing("refuelable", "consumer"));
            }
        }

        if self.area_refueler.is_some() && self.tank.is_none() {
            return Err(missing("area_refueler", "tank"));
        }

        if let Some(refueler) = &self.stationary_refueler {
            if !refueler.use_shared_reserve && self.tank.is_none() {
                return Err(missing("stationary_refueler", "tank"));
            }
        }

        if let Some(generator) = &self.generator {
            if !generator.use_shared_reserve && self.tank.is_none() {
                return Err(missing("generator", "tank"));
            }
        }

        if let Some(storage) = &self.storage {
            if storage.capacity < 0 {
                return Err(invalid("storage.capacity", "must not be negative"));
            }
        }

        Ok(())
    }
}

/// Per-player defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerRules {
    /// The player's global fuel reserve.
    #[serde(default)]
    pub reserve: TankData,

    /// Cash available to generators at the start.
    #[serde(default)]
    pub starting_cash: i32,
}

impl Default for PlayerRules {
    fn default() -> Self {
        Self {
            reserve: TankData::default(),
            starting_cash: 0,
        }
    }
}

/// All fuel rules for a game.
///
/// # Example RON
///
/// ```ron
/// RulesSet(
///     player: PlayerRules(reserve: TankData(capacity: 0), starting_cash: 1000),
///     actors: [
///         ActorRules(name: "fuel_depot", stationary_refueler: Some(StationaryRefuelerData())),
///     ],
/// )
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesSet {
    /// Player defaults.
    #[serde(default)]
    pub player: PlayerRules,

    /// Actor type definitions.
    #[serde(default)]
    pub actors: Vec<ActorRules>,
}

impl RulesSet {
    /// Parse a rules set from a RON string and validate it.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        let rules: RulesSet = ron::from_str(ron)?;
        rules.validate()?;
        Ok(rules)
    }

    /// Find an actor type by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ActorRules> {
        self.actors.iter().find(|a| a.name == name)
    }

    /// Validate every actor type and the player reserve.
    pub fn validate(&self) -> Result<()> {
        for (index, actor) in self.actors.iter().enumerate() {
            if self.actors[..index].iter().any(|a| a.name == actor.name) {
                return Err(FuelError::InvalidValue {
                    actor_type: actor.name.clone(),
                    field: "name",
                    message: "defined more than once".to_string(),
                });
            }
            actor.validate()?;
        }

        if self.player.reserve.capacity < 0 {
            return Err(FuelError::InvalidValue {
                actor_type: "player".to_string(),
                field: "reserve.capacity",
                message: "must not be negative".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULES: &str = r#"
        RulesSet(
            player: PlayerRules(starting_cash: 500),
            actors: [
                ActorRules(
                    name: "truck",
                    tank: Some(TankData(capacity: 100)),
                    consumer: Some(ConsumerData()),
                    refuelable: Some(RefuelableData(allowed_refueler_types: ["fuel_depot"])),
                ),
                ActorRules(
                    name: "fuel_depot",
                    footprint: (width: 2, height: 2),
                    stationary_refueler: Some(StationaryRefuelerData(dock_offset: (x: 1, y: 1))),
                    storage: Some(StorageData(capacity: 500)),
                ),
            ],
        )
    "#;

    #[test]
    fn test_parse_rules() {
        let rules = RulesSet::from_ron_str(RULES).unwrap();
        assert_eq!(rules.player.starting_cash, 500);
        assert_eq!(rules.player.reserve.capacity, 0);
        assert!(rules.get("truck").unwrap().refuelable.is_some());
        assert_eq!(rules.get("fuel_depot").unwrap().footprint.width, 2);
        assert!(rules.get("tanker").is_none());
    }

    #[test]
    fn test_consumer_requires_tank() {
        let mut rules = ActorRules::named("glider");
        rules.consumer = Some(ConsumerData::default());
        assert!(matches!(
            rules.validate(),
            Err(FuelError::MissingCapability {
                requires: "tank",
                ..
            })
        ));
    }

    #[test]
    fn test_single_refueler_slot() {
        let mut rules = ActorRules::named("hybrid");
        rules.tank = Some(TankData::with_capacity(10));
        rules.stationary_refueler = Some(StationaryRefuelerData::default());
        rules.area_refueler = Some(AreaRefuelerData::default());
        assert!(matches!(
            rules.validate(),
            Err(FuelError::ConflictingCapabilities { .. })
        ));
    }

    #[test]
    fn test_own_tank_refueler_requires_tank() {
        let mut rules = ActorRules::named("pump");
        rules.stationary_refueler = Some(StationaryRefuelerData {
            use_shared_reserve: false,
            ..Default::default()
        });
        assert!(rules.validate().is_err());
    }

    #[test]
    fn test_warning_percent_range() {
        let mut rules = ActorRules::named("truck");
        rules.tank = Some(TankData {
            low_fuel_warning_percent: 120,
            ..TankData::with_capacity(10)
        });
        assert!(matches!(
            rules.validate(),
            Err(FuelError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let rules = RulesSet {
            player: PlayerRules::default(),
            actors: vec![ActorRules::named("a"), ActorRules::named("a")],
        };
        assert!(rules.validate().is_err());
    }

    #[test]
    fn test_malformed_ron() {
        assert!(matches!(
            RulesSet::from_ron_str("RulesSet(actors: [ActorRules(name: 5)])"),
            Err(FuelError::RulesParse(_))
        ));
    }
}
