//! Radius refueler.
//!
//! Every `transfer_interval` ticks the refueler sweeps the friendly units
//! around it and gives each eligible one up to `fuel_per_transfer` from
//! its own tank. Candidate selection needs the whole world and lives with
//! the coordinator; this type owns the countdown and the transfer itself.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::conditions::ConditionManager;
use crate::data::AreaRefuelerData;
use crate::math::{fixed_serde, Fixed, Vec2Fixed};
use crate::tank::{TankId, TankStore, TransferOutcome};

/// Geometry of the range circle drawn around an area refueler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeIndicator {
    /// Circle center.
    pub center: Vec2Fixed,
    /// Circle radius.
    #[serde(with = "fixed_serde")]
    pub radius: Fixed,
    /// Line color (RGB).
    pub color: [u8; 3],
    /// Whether the renderer should draw it.
    pub visible: bool,
}

/// A refueler serving every eligible unit in range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AreaRefueler {
    data: AreaRefuelerData,
    source: TankId,
    ticks: i32,
}

impl AreaRefueler {
    /// Create a refueler drawing from its own tank `source`.
    #[must_use]
    pub const fn new(data: AreaRefuelerData, source: TankId) -> Self {
        Self {
            data,
            source,
            ticks: data.transfer_interval,
        }
    }

    /// Configuration.
    #[must_use]
    pub const fn data(&self) -> &AreaRefuelerData {
        &self.data
    }

    /// Tank fuel is drawn from.
    #[must_use]
    pub const fn source(&self) -> TankId {
        self.source
    }

    /// Ticks left before the next sweep.
    #[must_use]
    pub const fn ticks(&self) -> i32 {
        self.ticks
    }

    /// Transfer radius.
    #[must_use]
    pub const fn radius(&self) -> Fixed {
        self.data.radius
    }

    /// Whether there is fuel to give.
    #[must_use]
    pub fn can_refuel(&self, tanks: &TankStore) -> bool {
        tanks.get(self.source).is_some_and(|tank| !tank.is_empty())
    }

    /// Advance the countdown. Returns true when a sweep is due.
    ///
    /// The countdown keeps running while the refueler is held back by its
    /// own movement, so it sweeps as soon as it stops.
    pub fn advance(&mut self, source_moving: bool) -> bool {
        self.ticks -= 1;
        if self.ticks > 0 || (source_moving && !self.data.refuel_while_source_moving) {
            return false;
        }
        self.ticks = self.data.transfer_interval;
        true
    }

    /// Whether a recipient in its current motion state may be served.
    #[must_use]
    pub const fn accepts(&self, recipient_moving: bool) -> bool {
        self.data.refuel_moving_recipients || !recipient_moving
    }

    /// Give one recipient its share of this sweep.
    pub fn transfer_to(
        &self,
        recipient_tank: TankId,
        tanks: &mut TankStore,
        conditions: &mut dyn ConditionManager,
    ) -> TransferOutcome {
        let outcome = tanks.transfer(
            self.source,
            recipient_tank,
            self.data.fuel_per_transfer,
            conditions,
        );
        trace!(recipient = %recipient_tank, amount = outcome.amount, "Area transfer");
        outcome
    }

    /// Range circle as seen by a viewer.
    ///
    /// Hidden when disabled, while the refueler moves without serving, and
    /// for viewers other than the owner.
    #[must_use]
    pub const fn range_indicator(
        &self,
        center: Vec2Fixed,
        source_moving: bool,
        viewer_is_owner: bool,
    ) -> RangeIndicator {
        let visible = self.data.show_range_indicator
            && viewer_is_owner
            && (self.data.refuel_while_source_moving || !source_moving);
        RangeIndicator {
            center,
            radius: self.data.radius,
            color: self.data.indicator_color,
            visible,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::ConditionLedger;
    use crate::data::TankData;
    use crate::tank::Tank;

    fn refueler(interval: i32) -> AreaRefueler {
        AreaRefueler::new(
            AreaRefuelerData {
                fuel_per_transfer: 2,
                transfer_interval: interval,
                ..AreaRefuelerData::default()
            },
            TankId(0),
        )
    }

    #[test]
    fn test_countdown() {
        let mut refueler = refueler(3);
        assert!(!refueler.advance(false));
        assert!(!refueler.advance(false));
        assert!(refueler.advance(false));
        assert_eq!(refueler.ticks(), 3);
    }

    #[test]
    fn test_moving_source_holds_sweep() {
        let mut refueler = refueler(1);
        assert!(!refueler.advance(true));
        assert!(!refueler.advance(true));
        assert!(refueler.advance(false));
    }

    #[test]
    fn test_splits_available_fuel_in_order() {
        let mut ledger = ConditionLedger::new();
        let mut tanks = TankStore::new();
        let source = tanks.insert(Tank::new(
            1,
            &TankData {
                start_empty: true,
                ..TankData::with_capacity(3)
            },
        ));
        tanks.get_mut(source).unwrap().receive_fuel(3, &mut ledger);
        let empty = TankData {
            start_empty: true,
            ..TankData::with_capacity(10)
        };
        let first = tanks.insert(Tank::new(2, &empty));
        let second = tanks.insert(Tank::new(3, &empty));

        let refueler = refueler(1);
        assert_eq!(refueler.source(), source);
        assert_eq!(refueler.transfer_to(first, &mut tanks, &mut ledger).amount, 2);
        assert_eq!(refueler.transfer_to(second, &mut tanks, &mut ledger).amount, 1);
        assert!(!refueler.can_refuel(&tanks));
    }

    #[test]
    fn test_range_indicator_visibility() {
        let refueler = refueler(1);
        let center = Vec2Fixed::from_units(2, 2);

        let shown = refueler.range_indicator(center, false, true);
        assert!(shown.visible);
        assert_eq!(shown.radius, Fixed::from_num(1));
        assert_eq!(shown.color, [238, 130, 238]);

        assert!(!refueler.range_indicator(center, true, true).visible);
        assert!(!refueler.range_indicator(center, false, false).visible);
    }

    #[test]
    fn test_moving_recipients() {
        let refueler = refueler(1);
        assert!(refueler.accepts(false));
        assert!(!refueler.accepts(true));
    }
}
