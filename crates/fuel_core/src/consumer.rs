//! Fuel consumers.
//!
//! A consumer burns fuel from its actor's own tank: a fixed amount every
//! time the actor enters a new cell and, optionally, a trickle while it
//! stands still. Running dry can grant a condition and, after a delay,
//! destroy the actor.
//!
//! # Kill delay
//!
//! The kill countdown is edge-triggered. It is armed when the tank goes
//! from non-empty to empty and only decremented while the tank stays
//! empty. Refuelling stops the countdown; it is re-armed in full on the
//! next transition into empty.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::components::EntityId;
use crate::conditions::{ConditionManager, ConditionTokens};
use crate::data::ConsumerData;
use crate::math::CellPos;
use crate::tank::{FuelNotice, Tank};

/// How far an actor can travel on its fuel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FuelRange {
    /// A number of cells.
    Cells(i32),
    /// Movement costs nothing.
    Unlimited,
}

impl fmt::Display for FuelRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cells(cells) => write!(f, "{cells}"),
            Self::Unlimited => write!(f, "unlimited"),
        }
    }
}

/// What happened to a consumer during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConsumerTick {
    /// Fuel burned this tick.
    pub burned: i32,
    /// Notice raised by the tank.
    pub notice: Option<FuelNotice>,
    /// The kill policy decided the actor should be destroyed.
    pub kill: bool,
}

/// Consumer state for one actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Consumer {
    data: ConsumerData,
    last_location: CellPos,
    was_empty: bool,
    kill_countdown: i32,
    stopped_countdown: i32,
    out_of_fuel_tokens: ConditionTokens,
}

impl Consumer {
    /// Create a consumer for an actor standing at `location`.
    #[must_use]
    pub fn new(data: ConsumerData, location: CellPos, tank: &Tank) -> Self {
        Self {
            kill_countdown: 0,
            stopped_countdown: data.stopped_interval,
            data,
            last_location: location,
            was_empty: tank.is_empty(),
            out_of_fuel_tokens: ConditionTokens::new(),
        }
    }

    /// Configuration.
    #[must_use]
    pub const fn data(&self) -> &ConsumerData {
        &self.data
    }

    /// Cell the actor occupied at the end of the last tick.
    #[must_use]
    pub const fn last_location(&self) -> CellPos {
        self.last_location
    }

    /// Whether the tank was empty at the end of the last tick.
    #[must_use]
    pub const fn was_empty(&self) -> bool {
        self.was_empty
    }

    /// Ticks left before an empty actor is destroyed.
    #[must_use]
    pub const fn kill_countdown(&self) -> i32 {
        self.kill_countdown
    }

    /// Ticks left before the next idle burn.
    #[must_use]
    pub const fn stopped_countdown(&self) -> i32 {
        self.stopped_countdown
    }

    /// Whether the out-of-fuel condition is currently granted.
    #[must_use]
    pub fn has_out_of_fuel_condition(&self) -> bool {
        self.out_of_fuel_tokens.is_held()
    }

    /// Remaining range.
    #[must_use]
    pub fn range(&self, tank: &Tank) -> FuelRange {
        self.cells_for(tank.amount())
    }

    /// Range on a full tank.
    #[must_use]
    pub fn max_range(&self, tank: &Tank) -> FuelRange {
        self.cells_for(tank.capacity())
    }

    fn cells_for(&self, fuel: i32) -> FuelRange {
        if self.data.consumption_per_move <= 0 {
            FuelRange::Unlimited
        } else {
            FuelRange::Cells(fuel / self.data.consumption_per_move)
        }
    }

    /// Tooltip line, if enabled and the viewer is allied with the owner.
    #[must_use]
    pub fn tooltip(&self, tank: &Tank, viewer_is_ally: bool) -> Option<String> {
        if !self.data.show_range_in_tooltip || !viewer_is_ally {
            return None;
        }
        Some(format!(
            "Fuel range: {}/{} cells",
            self.range(tank),
            self.max_range(tank)
        ))
    }

    /// Advance one tick for an in-world actor at `location`.
    pub fn tick(
        &mut self,
        actor: EntityId,
        location: CellPos,
        tank: &mut Tank,
        conditions: &mut dyn ConditionManager,
    ) -> ConsumerTick {
        let mut result = ConsumerTick::default();
        let before = tank.amount();

        if location != self.last_location {
            result.notice = tank.take_fuel(self.data.consumption_per_move, conditions);
            self.last_location = location;
        } else if self.data.consumption_while_stopped > 0 {
            self.stopped_countdown -= 1;
            if self.stopped_countdown <= 0 {
                result.notice = tank.take_fuel(self.data.consumption_while_stopped, conditions);
                self.stopped_countdown = self.data.stopped_interval;
            }
        }
        result.burned = before - tank.amount();

        let is_empty = tank.is_empty();

        if let Some(condition) = &self.data.out_of_fuel_condition {
            if is_empty && !self.was_empty {
                self.out_of_fuel_tokens
                    .grant_all(conditions, actor, std::slice::from_ref(condition));
            } else if !is_empty && self.was_empty {
                self.out_of_fuel_tokens.revoke_all(conditions, actor);
            }
        }

        if self.data.kill_on_empty && is_empty {
            if self.was_empty {
                self.kill_countdown -= 1;
            } else {
                self.kill_countdown = self.data.kill_delay;
            }
            result.kill = self.kill_countdown <= 0;
        }

        self.was_empty = is_empty;
        result
    }

    /// The actor re-entered the world at `location`. Whatever carried it
    /// there did the moving, so the next tick charges nothing for it.
    pub(crate) fn placed(&mut self, location: CellPos) {
        self.last_location = location;
    }

    /// Release the out-of-fuel condition, e.g. when the actor is removed.
    pub fn release_conditions(&mut self, actor: EntityId, conditions: &mut dyn ConditionManager) {
        self.out_of_fuel_tokens.revoke_all(conditions, actor);
    }
}
