//! Exclusive docking refueler.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::components::EntityId;
use crate::conditions::ConditionManager;
use crate::data::StationaryRefuelerData;
use crate::math::{CellPos, Vec2Fixed};
use crate::tank::{TankId, TankStore, TransferOutcome};

/// The unit currently bound to a stationary refueler.
///
/// The session ends as soon as the recipient is seen anywhere other than
/// where it was when fuel last flowed, or no longer exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransferSession {
    recipient: Option<EntityId>,
    recipient_tank: Option<TankId>,
    last_position: Vec2Fixed,
    ticks: i32,
}

impl TransferSession {
    /// Whether a unit is bound.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.recipient.is_some()
    }

    /// Bound unit.
    #[must_use]
    pub const fn recipient(&self) -> Option<EntityId> {
        self.recipient
    }

    /// Bound unit's tank.
    #[must_use]
    pub const fn recipient_tank(&self) -> Option<TankId> {
        self.recipient_tank
    }

    /// Position of the recipient when last observed.
    #[must_use]
    pub const fn last_position(&self) -> Vec2Fixed {
        self.last_position
    }

    /// Ticks until the next transfer.
    #[must_use]
    pub const fn ticks(&self) -> i32 {
        self.ticks
    }

    fn clear(&mut self) {
        self.recipient = None;
        self.recipient_tank = None;
    }
}

/// Fuel moved to the bound unit during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTransfer {
    /// Unit that received the fuel.
    pub recipient: EntityId,
    /// Amounts and notices.
    pub outcome: TransferOutcome,
}

/// A refueler serving one docked unit at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationaryRefueler {
    data: StationaryRefuelerData,
    source: TankId,
    session: TransferSession,
}

impl StationaryRefueler {
    /// Create a refueler drawing from `source`.
    #[must_use]
    pub fn new(data: StationaryRefuelerData, source: TankId) -> Self {
        Self {
            data,
            source,
            session: TransferSession::default(),
        }
    }

    /// Configuration.
    #[must_use]
    pub const fn data(&self) -> &StationaryRefuelerData {
        &self.data
    }

    /// Tank fuel is drawn from.
    #[must_use]
    pub const fn source(&self) -> TankId {
        self.source
    }

    /// Draw from a different tank, e.g. the new owner's reserve.
    pub fn retarget(&mut self, source: TankId) {
        self.source = source;
    }

    /// Current session.
    #[must_use]
    pub const fn session(&self) -> &TransferSession {
        &self.session
    }

    /// Unit currently bound, if any.
    #[must_use]
    pub const fn current_unit(&self) -> Option<EntityId> {
        self.session.recipient
    }

    /// Cell a unit must stand on to dock, for a building at `location`.
    #[must_use]
    pub const fn dock_cell(&self, location: CellPos) -> CellPos {
        location.offset(self.data.dock_offset)
    }

    /// Whether there is fuel to give. Does not reserve anything.
    #[must_use]
    pub fn can_refuel(&self, tanks: &TankStore) -> bool {
        tanks.get(self.source).is_some_and(|tank| !tank.is_empty())
    }

    /// Bind `unit` to this refueler.
    ///
    /// Eligibility is checked by the caller. Returns false without changing
    /// anything if another session is active.
    pub fn begin_session(&mut self, unit: EntityId, unit_tank: TankId, position: Vec2Fixed) -> bool {
        if self.session.is_active() {
            return false;
        }

        self.session = TransferSession {
            recipient: Some(unit),
            recipient_tank: Some(unit_tank),
            last_position: position,
            ticks: self.data.transfer_interval,
        };
        debug!(unit, source = %self.source, "Refuel session started");
        true
    }

    /// Drop the bound unit.
    pub fn end_session(&mut self) {
        self.session.clear();
    }

    /// Advance one tick.
    ///
    /// `recipient_position` is where the bound unit is now, or `None` if it
    /// no longer exists.
    pub fn tick(
        &mut self,
        recipient_position: Option<Vec2Fixed>,
        tanks: &mut TankStore,
        conditions: &mut dyn ConditionManager,
    ) -> Option<SessionTransfer> {
        let recipient = self.session.recipient?;

        let position = match recipient_position {
            Some(position) if position == self.session.last_position => position,
            _ => {
                debug!(unit = recipient, "Refuel session ended: recipient departed");
                self.session.clear();
                return None;
            }
        };

        self.session.ticks -= 1;
        if self.session.ticks > 0 {
            return None;
        }

        let tank_id = self.session.recipient_tank?;
        if tanks.get(tank_id).map_or(true, |tank| tank.is_full()) {
            return None;
        }

        let outcome = tanks.transfer(self.source, tank_id, self.data.fuel_per_transfer, conditions);
        trace!(unit = recipient, amount = outcome.amount, "Stationary transfer");

        self.session.last_position = position;
        self.session.ticks = self.data.transfer_interval;

        Some(SessionTransfer { recipient, outcome })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::ConditionLedger;
    use crate::data::TankData;
    use crate::tank::Tank;

    fn setup() -> (StationaryRefueler, TankStore, TankId) {
        let mut tanks = TankStore::new();
        let source = tanks.insert(Tank::new(1, &TankData::with_capacity(100)));
        let recipient = tanks.insert(Tank::new(
            2,
            &TankData {
                start_empty: true,
                ..TankData::with_capacity(10)
            },
        ));
        let refueler = StationaryRefueler::new(
            StationaryRefuelerData {
                fuel_per_transfer: 4,
                transfer_interval: 2,
                ..StationaryRefuelerData::default()
            },
            source,
        );
        (refueler, tanks, recipient)
    }

    #[test]
    fn test_transfers_after_interval() {
        let mut ledger = ConditionLedger::new();
        let (mut refueler, mut tanks, recipient) = setup();
        let here = Vec2Fixed::from_units(3, 3);

        assert!(refueler.begin_session(2, recipient, here));
        assert!(refueler.tick(Some(here), &mut tanks, &mut ledger).is_none());
        let transfer = refueler.tick(Some(here), &mut tanks, &mut ledger).unwrap();

        assert_eq!(transfer.recipient, 2);
        assert_eq!(transfer.outcome.amount, 4);
        assert_eq!(tanks.get(recipient).unwrap().amount(), 4);
        assert_eq!(tanks.get(refueler.source()).unwrap().amount(), 96);
    }

    #[test]
    fn test_session_is_exclusive() {
        let (mut refueler, _, recipient) = setup();
        let here = Vec2Fixed::from_units(3, 3);

        assert!(refueler.begin_session(2, recipient, here));
        assert!(!refueler.begin_session(7, recipient, here));
        assert_eq!(refueler.current_unit(), Some(2));
    }

    #[test]
    fn test_departure_clears_session() {
        let mut ledger = ConditionLedger::new();
        let (mut refueler, mut tanks, recipient) = setup();
        let here = Vec2Fixed::from_units(3, 3);

        refueler.begin_session(2, recipient, here);
        let moved = Vec2Fixed::from_units(4, 3);
        assert!(refueler.tick(Some(moved), &mut tanks, &mut ledger).is_none());
        assert!(!refueler.session().is_active());

        refueler.begin_session(2, recipient, here);
        assert!(refueler.tick(None, &mut tanks, &mut ledger).is_none());
        assert_eq!(refueler.current_unit(), None);
    }

    #[test]
    fn test_full_recipient_keeps_session() {
        let mut ledger = ConditionLedger::new();
        let (mut refueler, mut tanks, recipient) = setup();
        let here = Vec2Fixed::from_units(3, 3);
        tanks.get_mut(recipient).unwrap().receive_fuel(10, &mut ledger);

        refueler.begin_session(2, recipient, here);
        for _ in 0..5 {
            assert!(refueler.tick(Some(here), &mut tanks, &mut ledger).is_none());
        }
        assert_eq!(refueler.current_unit(), Some(2));
        assert_eq!(tanks.get(refueler.source()).unwrap().amount(), 100);
    }

    #[test]
    fn test_dock_cell() {
        let (refueler, _, _) = setup();
        assert_eq!(refueler.dock_cell(CellPos::new(5, 5)), CellPos::new(5, 5));

        let offset = StationaryRefueler::new(
            StationaryRefuelerData {
                dock_offset: crate::math::CellVec::new(1, 1),
                ..StationaryRefuelerData::default()
            },
            TankId(0),
        );
        assert_eq!(offset.dock_cell(CellPos::new(5, 5)), CellPos::new(6, 6));
    }
}
