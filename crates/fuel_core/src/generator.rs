//! Cash-to-fuel generators.
//!
//! A generator counts down an interval and, each time it expires, charges
//! its owner's cash account and deposits a fixed batch of fuel into its
//! target tank. The countdown resets whether or not the batch was paid
//! for, and a batch that only partly fits is never refunded.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::components::PlayerId;
use crate::conditions::ConditionManager;
use crate::data::GeneratorData;
use crate::player::Player;
use crate::tank::{FuelNotice, Tank, TankId};

/// Fuel produced by one generator tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generated {
    /// Fuel actually deposited.
    pub amount: i32,
    /// Notice raised by the target tank.
    pub notice: Option<FuelNotice>,
}

/// Generator state for one actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generator {
    data: GeneratorData,
    ticks: i32,
    target: TankId,
    account: PlayerId,
}

impl Generator {
    /// Create a generator depositing into `target` and charging `account`.
    #[must_use]
    pub const fn new(data: GeneratorData, target: TankId, account: PlayerId) -> Self {
        Self {
            data,
            ticks: data.interval,
            target,
            account,
        }
    }

    /// Configuration.
    #[must_use]
    pub const fn data(&self) -> &GeneratorData {
        &self.data
    }

    /// Ticks left before the next batch.
    #[must_use]
    pub const fn ticks(&self) -> i32 {
        self.ticks
    }

    /// Tank receiving the fuel.
    #[must_use]
    pub const fn target(&self) -> TankId {
        self.target
    }

    /// Player paying for the fuel.
    #[must_use]
    pub const fn account(&self) -> PlayerId {
        self.account
    }

    /// Deposit into a different tank, e.g. the new owner's reserve.
    pub fn retarget(&mut self, target: TankId) {
        self.target = target;
    }

    /// Charge a different player.
    pub fn rebind_account(&mut self, account: PlayerId) {
        self.account = account;
    }

    /// Advance one tick.
    ///
    /// `tank` must be the target tank and `payer` the bound account.
    pub fn tick(
        &mut self,
        tank: &mut Tank,
        payer: &mut Player,
        conditions: &mut dyn ConditionManager,
    ) -> Option<Generated> {
        if self.data.fuel_per_interval <= 0 {
            return None;
        }

        self.ticks -= 1;
        if self.ticks >= 0 {
            return None;
        }
        self.ticks = self.data.interval;

        if tank.receivable_fuel(self.data.fuel_per_interval) == 0 {
            return None;
        }

        if !payer.take_cash(self.data.cost_per_interval) {
            debug!(
                player = %payer.id(),
                cost = self.data.cost_per_interval,
                cash = payer.cash(),
                "Generator could not pay for fuel"
            );
            return None;
        }

        let before = tank.amount();
        let notice = tank.receive_fuel(self.data.fuel_per_interval, conditions);

        Some(Generated {
            amount: tank.amount() - before,
            notice,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::ConditionLedger;
    use crate::data::TankData;

    fn setup(cash: i32, capacity: i32) -> (Generator, Tank, Player) {
        let data = GeneratorData {
            fuel_per_interval: 10,
            cost_per_interval: 5,
            interval: 25,
            use_shared_reserve: true,
        };
        let tank = Tank::new(
            1,
            &TankData {
                start_empty: true,
                ..TankData::with_capacity(capacity)
            },
        );
        let player = Player::new(PlayerId(0), 1, TankId(0), cash);
        (Generator::new(data, TankId(0), PlayerId(0)), tank, player)
    }

    #[test]
    fn test_deposits_once_on_twenty_sixth_tick() {
        let mut ledger = ConditionLedger::new();
        let (mut generator, mut tank, mut player) = setup(1000, 100);

        for _ in 0..25 {
            assert_eq!(generator.tick(&mut tank, &mut player, &mut ledger), None);
        }
        assert_eq!(tank.amount(), 0);

        let generated = generator.tick(&mut tank, &mut player, &mut ledger);
        assert_eq!(generated.map(|g| g.amount), Some(10));
        assert_eq!(tank.amount(), 10);
        assert_eq!(player.cash(), 995);
        assert_eq!(generator.ticks(), 25);
    }

    #[test]
    fn test_no_cash_resets_countdown() {
        let mut ledger = ConditionLedger::new();
        let (mut generator, mut tank, mut player) = setup(4, 100);

        for _ in 0..26 {
            generator.tick(&mut tank, &mut player, &mut ledger);
        }
        assert_eq!(tank.amount(), 0);
        assert_eq!(player.cash(), 4);
        assert_eq!(generator.ticks(), 25);
    }

    #[test]
    fn test_full_tank_is_not_charged() {
        let mut ledger = ConditionLedger::new();
        let (mut generator, mut tank, mut player) = setup(100, 0);

        for _ in 0..26 {
            generator.tick(&mut tank, &mut player, &mut ledger);
        }
        assert_eq!(player.cash(), 100);
    }

    #[test]
    fn test_partial_batch_is_not_refunded() {
        let mut ledger = ConditionLedger::new();
        let (mut generator, mut tank, mut player) = setup(100, 4);

        for _ in 0..26 {
            generator.tick(&mut tank, &mut player, &mut ledger);
        }
        assert_eq!(tank.amount(), 4);
        assert_eq!(player.cash(), 95);
    }

    #[test]
    fn test_zero_output_never_counts_down() {
        let mut ledger = ConditionLedger::new();
        let (_, mut tank, mut player) = setup(100, 100);
        let mut generator = Generator::new(
            GeneratorData {
                fuel_per_interval: 0,
                ..GeneratorData::default()
            },
            TankId(0),
            PlayerId(0),
        );

        for _ in 0..100 {
            assert!(generator.tick(&mut tank, &mut player, &mut ledger).is_none());
        }
        assert_eq!(generator.ticks(), 25);
    }
}
