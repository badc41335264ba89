//! Fuel tanks.
//!
//! A [`Tank`] is the fundamental fuel container. Every mutation is
//! saturating: requests for zero or negative amounts are no-ops, and no
//! sequence of calls can push the amount outside `0..=capacity`.
//!
//! Tanks live in a [`TankStore`] and are referenced by [`TankId`]. A
//! player's reserve tank is a single entry in the store shared by every
//! component that draws from or deposits into the reserve.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::components::EntityId;
use crate::conditions::{ConditionManager, ConditionTokens};
use crate::data::TankData;

/// Handle to a tank in the [`TankStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TankId(pub u32);

impl fmt::Display for TankId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tank#{}", self.0)
    }
}

/// Fuel state transitions reported to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FuelNotice {
    /// Dropped to or below the low fuel threshold, but not empty.
    LowOnFuel,
    /// Reached zero.
    OutOfFuel,
    /// Became full.
    Refuelled,
}

/// Snapshot of a tank passed to observers and queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TankStatus {
    /// Total capacity.
    pub capacity: i32,
    /// Current amount.
    pub amount: i32,
    /// Whether the tank is full.
    pub is_full: bool,
    /// Whether the tank is empty.
    pub is_empty: bool,
    /// Whether the tank is low on fuel.
    pub is_low: bool,
}

/// Receives fuel state changes for one tank.
///
/// Observers are called synchronously, in registration order, from inside
/// the mutation that caused the change.
pub trait FuelStateObserver {
    /// The tank dropped to its low fuel threshold.
    fn low_on_fuel(&mut self, _holder: EntityId, _status: &TankStatus) {}

    /// The tank ran dry.
    fn out_of_fuel(&mut self, _holder: EntityId, _status: &TankStatus) {}

    /// The tank was filled up.
    fn refuelled(&mut self, _holder: EntityId, _status: &TankStatus) {}
}

/// A fuel container with capacity, amount and low fuel threshold.
pub struct Tank {
    holder: EntityId,
    capacity: i32,
    amount: i32,
    low_fuel_warning_percent: i32,
    low_fuel_conditions: Vec<String>,
    low_fuel_tokens: ConditionTokens,
    observers: Vec<Box<dyn FuelStateObserver>>,
}

impl Tank {
    /// Create a tank held by `holder` from its data definition.
    ///
    /// Negative capacities are treated as zero and the warning threshold
    /// is clamped to `0..=100`.
    #[must_use]
    pub fn new(holder: EntityId, data: &TankData) -> Self {
        let capacity = data.capacity.max(0);
        Self {
            holder,
            capacity,
            amount: if data.start_empty { 0 } else { capacity },
            low_fuel_warning_percent: data.low_fuel_warning_percent.clamp(0, 100),
            low_fuel_conditions: data.low_fuel_conditions.clone(),
            low_fuel_tokens: ConditionTokens::new(),
            observers: Vec::new(),
        }
    }

    /// Actor that receives this tank's conditions.
    #[must_use]
    pub const fn holder(&self) -> EntityId {
        self.holder
    }

    /// Total capacity.
    #[must_use]
    pub const fn capacity(&self) -> i32 {
        self.capacity
    }

    /// Current amount.
    #[must_use]
    pub const fn amount(&self) -> i32 {
        self.amount
    }

    /// Remaining space.
    #[must_use]
    pub const fn free(&self) -> i32 {
        self.capacity - self.amount
    }

    /// Low fuel warning threshold in percent.
    #[must_use]
    pub const fn low_fuel_warning_percent(&self) -> i32 {
        self.low_fuel_warning_percent
    }

    /// Whether the tank is full.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.amount == self.capacity
    }

    /// Whether the tank is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.amount == 0
    }

    /// Whether the amount is at or below the warning threshold.
    ///
    /// A zero-capacity tank is never low.
    #[must_use]
    pub fn is_low(&self) -> bool {
        if self.capacity == 0 {
            return false;
        }
        i64::from(self.amount) * 100 / i64::from(self.capacity)
            <= i64::from(self.low_fuel_warning_percent)
    }

    /// Low fuel condition tokens currently held.
    #[must_use]
    pub const fn low_fuel_tokens(&self) -> &ConditionTokens {
        &self.low_fuel_tokens
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn status(&self) -> TankStatus {
        TankStatus {
            capacity: self.capacity,
            amount: self.amount,
            is_full: self.is_full(),
            is_empty: self.is_empty(),
            is_low: self.is_low(),
        }
    }

    /// Register an observer. Observers are notified in registration order.
    pub fn subscribe(&mut self, observer: Box<dyn FuelStateObserver>) {
        self.observers.push(observer);
    }

    /// Increase capacity, saturating at `i32::MAX`.
    pub fn add_capacity(&mut self, amount: i32) {
        if amount <= 0 {
            return;
        }
        self.capacity = self.capacity.saturating_add(amount);
    }

    /// Decrease capacity, flooring at zero and clamping the amount.
    pub fn remove_capacity(&mut self, amount: i32) {
        if amount <= 0 {
            return;
        }
        self.capacity = (self.capacity - amount).max(0);
        self.amount = self.amount.min(self.capacity);
    }

    /// How much of `amount` this tank could accept.
    #[must_use]
    pub fn receivable_fuel(&self, amount: i32) -> i32 {
        if amount <= 0 {
            return 0;
        }
        self.free().min(amount)
    }

    /// How much of `amount` this tank could give.
    #[must_use]
    pub fn available_fuel(&self, amount: i32) -> i32 {
        if amount <= 0 {
            return 0;
        }
        self.amount.min(amount)
    }

    /// Add up to `amount` fuel.
    ///
    /// Notifies `Refuelled` when the tank becomes full and revokes the low
    /// fuel conditions once it climbs back above the threshold.
    pub fn receive_fuel(
        &mut self,
        amount: i32,
        conditions: &mut dyn ConditionManager,
    ) -> Option<FuelNotice> {
        let received = self.receivable_fuel(amount);
        if received == 0 {
            return None;
        }

        let was_full = self.is_full();
        self.amount += received;

        let notice = (!was_full && self.is_full()).then_some(FuelNotice::Refuelled);
        if let Some(notice) = notice {
            self.notify(notice);
        }

        if self.low_fuel_tokens.is_held() && !self.is_low() {
            self.low_fuel_tokens.revoke_all(conditions, self.holder);
        }

        notice
    }

    /// Remove up to `amount` fuel.
    ///
    /// Notifies `LowOnFuel` when crossing into the low band (unless that
    /// empties the tank) and `OutOfFuel` when reaching zero. Grants the low
    /// fuel conditions while the tank is low.
    pub fn take_fuel(
        &mut self,
        amount: i32,
        conditions: &mut dyn ConditionManager,
    ) -> Option<FuelNotice> {
        let taken = self.available_fuel(amount);
        if taken == 0 {
            return None;
        }

        let was_low = self.is_low();
        let was_empty = self.is_empty();
        self.amount -= taken;

        let notice = if !was_low && self.is_low() && !self.is_empty() {
            Some(FuelNotice::LowOnFuel)
        } else if !was_empty && self.is_empty() {
            Some(FuelNotice::OutOfFuel)
        } else {
            None
        };
        if let Some(notice) = notice {
            self.notify(notice);
        }

        if !self.low_fuel_tokens.is_held() && self.is_low() {
            self.low_fuel_tokens
                .grant_all(conditions, self.holder, self.low_fuel_conditions.as_slice());
        }

        notice
    }

    /// Release any conditions still held, e.g. before the tank is dropped.
    pub fn release_conditions(&mut self, conditions: &mut dyn ConditionManager) {
        self.low_fuel_tokens.revoke_all(conditions, self.holder);
    }

    fn notify(&mut self, notice: FuelNotice) {
        let status = self.status();
        let holder = self.holder;
        for observer in &mut self.observers {
            match notice {
                FuelNotice::LowOnFuel => observer.low_on_fuel(holder, &status),
                FuelNotice::OutOfFuel => observer.out_of_fuel(holder, &status),
                FuelNotice::Refuelled => observer.refuelled(holder, &status),
            }
        }
    }
}

impl fmt::Debug for Tank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tank")
            .field("holder", &self.holder)
            .field("capacity", &self.capacity)
            .field("amount", &self.amount)
            .field("low_fuel_warning_percent", &self.low_fuel_warning_percent)
            .field("low_fuel_tokens", &self.low_fuel_tokens.len())
            .field("observers", &self.observers.len())
            .finish()
    }
}

/// Result of moving fuel between two tanks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransferOutcome {
    /// Fuel moved.
    pub amount: i32,
    /// Notice raised by the source tank.
    pub source_notice: Option<FuelNotice>,
    /// Notice raised by the recipient tank.
    pub recipient_notice: Option<FuelNotice>,
}

/// Storage for every tank in the simulation.
///
/// Ordered by id so iteration is deterministic.
#[derive(Debug, Default)]
pub struct TankStore {
    tanks: BTreeMap<TankId, Tank>,
    next_id: u32,
}

impl TankStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a tank and return its id.
    pub fn insert(&mut self, tank: Tank) -> TankId {
        let id = TankId(self.next_id);
        self.next_id += 1;
        self.tanks.insert(id, tank);
        id
    }

    /// Remove a tank.
    pub fn remove(&mut self, id: TankId) -> Option<Tank> {
        self.tanks.remove(&id)
    }

    /// Get a tank by id.
    #[must_use]
    pub fn get(&self, id: TankId) -> Option<&Tank> {
        self.tanks.get(&id)
    }

    /// Get a mutable tank by id.
    pub fn get_mut(&mut self, id: TankId) -> Option<&mut Tank> {
        self.tanks.get_mut(&id)
    }

    /// Get two distinct tanks mutably at once.
    ///
    /// Returns `None` if the ids are equal or either tank is missing.
    pub fn get_pair_mut(&mut self, a: TankId, b: TankId) -> Option<[&mut Tank; 2]> {
        if a == b {
            return None;
        }
        let mut first = None;
        let mut second = None;
        for (id, tank) in &mut self.tanks {
            if *id == a {
                first = Some(tank);
            } else if *id == b {
                second = Some(tank);
            }
        }
        Some([first?, second?])
    }

    /// Check if a tank exists.
    #[must_use]
    pub fn contains(&self, id: TankId) -> bool {
        self.tanks.contains_key(&id)
    }

    /// Number of tanks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tanks.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tanks.is_empty()
    }

    /// Iterate over tanks in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&TankId, &Tank)> {
        self.tanks.iter()
    }

    /// Move up to `max_amount` fuel from `source` to `recipient`.
    ///
    /// The amount is `min(available(source), receivable(recipient))`, read
    /// and applied within this call. Missing tanks, a tank transferring to
    /// itself, and non-positive amounts move nothing.
    pub fn transfer(
        &mut self,
        source: TankId,
        recipient: TankId,
        max_amount: i32,
        conditions: &mut dyn ConditionManager,
    ) -> TransferOutcome {
        if source == recipient {
            return TransferOutcome::default();
        }

        let (Some(from), Some(to)) = (self.tanks.get(&source), self.tanks.get(&recipient)) else {
            return TransferOutcome::default();
        };

        let amount = from
            .available_fuel(max_amount)
            .min(to.receivable_fuel(max_amount));
        if amount <= 0 {
            return TransferOutcome::default();
        }

        let source_notice = self
            .tanks
            .get_mut(&source)
            .and_then(|tank| tank.take_fuel(amount, conditions));
        let recipient_notice = self
            .tanks
            .get_mut(&recipient)
            .and_then(|tank| tank.receive_fuel(amount, conditions));

        TransferOutcome {
            amount,
            source_notice,
            recipient_notice,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::conditions::ConditionLedger;

    fn tank(capacity: i32, amount: i32) -> Tank {
        let mut tank = Tank::new(
            1,
            &TankData {
                start_empty: true,
                low_fuel_conditions: vec!["low-fuel".to_string()],
                ..TankData::with_capacity(capacity)
            },
        );
        tank.amount = amount;
        tank
    }

    #[test]
    fn test_get_pair_mut() {
        let mut store = TankStore::new();
        let a = store.insert(tank(10, 4));
        let b = store.insert(tank(20, 0));

        let [first, second] = store.get_pair_mut(b, a).unwrap();
        assert_eq!(first.capacity(), 20);
        assert_eq!(second.capacity(), 10);

        assert!(store.get_pair_mut(a, a).is_none());
        assert!(store.get_pair_mut(a, TankId(99)).is_none());
    }

    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Vec<FuelNotice>>>);

    impl FuelStateObserver for Recorder {
        fn low_on_fuel(&mut self, _holder: EntityId, _status: &TankStatus) {
            self.0.borrow_mut().push(FuelNotice::LowOnFuel);
        }

        fn out_of_fuel(&mut self, _holder: EntityId, _status: &TankStatus) {
            self.0.borrow_mut().push(FuelNotice::OutOfFuel);
        }

        fn refuelled(&mut self, _holder: EntityId, _status: &TankStatus) {
            self.0.borrow_mut().push(FuelNotice::Refuelled);
        }
    }

    #[test]
    fn test_new_tank_starts_full_or_empty() {
        let full = Tank::new(1, &TankData::with_capacity(50));
        assert!(full.is_full());
        assert_eq!(full.amount(), 50);

        let empty = Tank::new(
            1,
            &TankData {
                start_empty: true,
                ..TankData::with_capacity(50)
            },
        );
        assert!(empty.is_empty());
        assert_eq!(empty.free(), 50);
    }

    #[test]
    fn test_zero_capacity_tank_is_empty_not_low() {
        let tank = Tank::new(1, &TankData::with_capacity(0));
        assert!(tank.is_empty());
        assert!(tank.is_full());
        assert!(!tank.is_low());
    }

    #[test]
    fn test_add_capacity_saturates() {
        let mut tank = tank(i32::MAX - 5, 10);
        tank.add_capacity(100);
        assert_eq!(tank.capacity(), i32::MAX);
        assert_eq!(tank.amount(), 10);

        tank.add_capacity(-3);
        assert_eq!(tank.capacity(), i32::MAX);
    }

    #[test]
    fn test_remove_capacity_clamps_amount() {
        let mut tank = tank(100, 80);
        tank.remove_capacity(50);
        assert_eq!(tank.capacity(), 50);
        assert_eq!(tank.amount(), 50);

        tank.remove_capacity(1000);
        assert_eq!(tank.capacity(), 0);
        assert_eq!(tank.amount(), 0);
    }

    #[test]
    fn test_receivable_and_available() {
        let tank = tank(100, 30);
        assert_eq!(tank.receivable_fuel(50), 50);
        assert_eq!(tank.receivable_fuel(500), 70);
        assert_eq!(tank.receivable_fuel(-1), 0);
        assert_eq!(tank.available_fuel(10), 10);
        assert_eq!(tank.available_fuel(500), 30);
        assert_eq!(tank.available_fuel(0), 0);
    }

    #[test]
    fn test_invalid_amounts_are_noops() {
        let mut ledger = ConditionLedger::new();
        let mut tank = tank(100, 40);

        assert_eq!(tank.take_fuel(0, &mut ledger), None);
        assert_eq!(tank.receive_fuel(-5, &mut ledger), None);
        assert_eq!(tank.amount(), 40);
    }

    #[test]
    fn test_low_fuel_notice_and_token() {
        let mut ledger = ConditionLedger::new();
        let recorder = Recorder::default();
        let mut tank = tank(100, 100);
        tank.subscribe(Box::new(recorder.clone()));

        let notice = tank.take_fuel(85, &mut ledger);

        assert_eq!(notice, Some(FuelNotice::LowOnFuel));
        assert_eq!(tank.amount(), 15);
        assert!(tank.is_low());
        assert_eq!(*recorder.0.borrow(), vec![FuelNotice::LowOnFuel]);
        assert_eq!(tank.low_fuel_tokens().len(), 1);
        assert_eq!(ledger.grant_count(1, "low-fuel"), 1);
    }

    #[test]
    fn test_out_of_fuel_fires_once() {
        let mut ledger = ConditionLedger::new();
        let recorder = Recorder::default();
        let mut tank = tank(100, 100);
        tank.subscribe(Box::new(recorder.clone()));

        tank.take_fuel(85, &mut ledger);
        let notice = tank.take_fuel(15, &mut ledger);
        assert_eq!(notice, Some(FuelNotice::OutOfFuel));
        assert!(tank.is_empty());

        // Nothing left to take.
        assert_eq!(tank.take_fuel(15, &mut ledger), None);

        let outs = recorder
            .0
            .borrow()
            .iter()
            .filter(|n| **n == FuelNotice::OutOfFuel)
            .count();
        assert_eq!(outs, 1);
        assert_eq!(ledger.grant_count(1, "low-fuel"), 1);
    }

    #[test]
    fn test_refuelled_notice_and_revoke() {
        let mut ledger = ConditionLedger::new();
        let recorder = Recorder::default();
        let mut tank = tank(100, 100);
        tank.subscribe(Box::new(recorder.clone()));

        tank.take_fuel(90, &mut ledger);
        assert!(ledger.is_granted(1, "low-fuel"));

        // Still low: tokens stay.
        assert_eq!(tank.receive_fuel(5, &mut ledger), None);
        assert!(ledger.is_granted(1, "low-fuel"));

        assert_eq!(
            tank.receive_fuel(1000, &mut ledger),
            Some(FuelNotice::Refuelled)
        );
        assert!(tank.is_full());
        assert!(ledger.is_empty());
        assert!(tank.low_fuel_tokens().is_empty());
        assert_eq!(
            *recorder.0.borrow(),
            vec![FuelNotice::LowOnFuel, FuelNotice::Refuelled]
        );
    }

    #[test]
    fn test_observers_called_in_registration_order() {
        struct Tagged(u8, Rc<RefCell<Vec<u8>>>);
        impl FuelStateObserver for Tagged {
            fn out_of_fuel(&mut self, _holder: EntityId, _status: &TankStatus) {
                self.1.borrow_mut().push(self.0);
            }
        }

        let order = Rc::new(RefCell::new(Vec::new()));
        let mut ledger = ConditionLedger::new();
        let mut tank = tank(10, 10);
        tank.subscribe(Box::new(Tagged(1, order.clone())));
        tank.subscribe(Box::new(Tagged(2, order.clone())));
        tank.subscribe(Box::new(Tagged(3, order.clone())));

        tank.take_fuel(10, &mut ledger);
        assert_eq!(*order.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn test_round_trip_restores_amount() {
        let mut ledger = ConditionLedger::new();
        let mut tank = tank(100, 37);
        tank.receive_fuel(40, &mut ledger);
        tank.take_fuel(40, &mut ledger);
        assert_eq!(tank.amount(), 37);
    }

    #[test]
    fn test_store_transfer_conserves_fuel() {
        let mut ledger = ConditionLedger::new();
        let mut store = TankStore::new();
        let source = store.insert(tank(100, 3));
        let recipient = store.insert(tank(100, 0));

        let outcome = store.transfer(source, recipient, 10, &mut ledger);

        assert_eq!(outcome.amount, 3);
        assert_eq!(outcome.source_notice, Some(FuelNotice::OutOfFuel));
        assert_eq!(store.get(source).unwrap().amount(), 0);
        assert_eq!(store.get(recipient).unwrap().amount(), 3);
    }

    #[test]
    fn test_store_transfer_limited_by_recipient() {
        let mut ledger = ConditionLedger::new();
        let mut store = TankStore::new();
        let source = store.insert(tank(100, 100));
        let recipient = store.insert(tank(10, 8));

        let outcome = store.transfer(source, recipient, 5, &mut ledger);

        assert_eq!(outcome.amount, 2);
        assert_eq!(outcome.recipient_notice, Some(FuelNotice::Refuelled));
        assert_eq!(store.get(source).unwrap().amount(), 98);
    }

    #[test]
    fn test_store_transfer_to_self_is_noop() {
        let mut ledger = ConditionLedger::new();
        let mut store = TankStore::new();
        let id = store.insert(tank(100, 50));

        assert_eq!(store.transfer(id, id, 10, &mut ledger).amount, 0);
        assert_eq!(
            store.transfer(id, TankId(99), 10, &mut ledger),
            TransferOutcome::default()
        );
        assert_eq!(store.get(id).unwrap().amount(), 50);
    }
}
