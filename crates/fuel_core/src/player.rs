//! Player records: cash account, alliances and the global fuel reserve.

use serde::{Deserialize, Serialize};

use crate::components::{EntityId, PlayerId};
use crate::tank::TankId;

/// A player taking part in the simulation.
///
/// The player record is the single owner of the reserve tank. Components
/// that draw from the reserve hold its [`TankId`] and look it up again
/// whenever their actor changes hands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    id: PlayerId,
    actor: EntityId,
    reserve: TankId,
    cash: i32,
    allies: Vec<PlayerId>,
}

impl Player {
    /// Create a player record.
    ///
    /// `actor` is the player's own (never in-world) actor, which holds the
    /// reserve tank and receives its conditions.
    #[must_use]
    pub const fn new(id: PlayerId, actor: EntityId, reserve: TankId, cash: i32) -> Self {
        Self {
            id,
            actor,
            reserve,
            cash,
            allies: Vec::new(),
        }
    }

    /// Player id.
    #[must_use]
    pub const fn id(&self) -> PlayerId {
        self.id
    }

    /// The player actor.
    #[must_use]
    pub const fn actor(&self) -> EntityId {
        self.actor
    }

    /// The player's reserve tank.
    #[must_use]
    pub const fn reserve(&self) -> TankId {
        self.reserve
    }

    /// Cash on hand.
    #[must_use]
    pub const fn cash(&self) -> i32 {
        self.cash
    }

    /// Add cash, saturating at `i32::MAX`. Non-positive amounts are ignored.
    pub fn give_cash(&mut self, amount: i32) {
        if amount > 0 {
            self.cash = self.cash.saturating_add(amount);
        }
    }

    /// Spend cash if available.
    ///
    /// Returns true if the transaction succeeded. Zero or negative costs
    /// always succeed and leave the balance untouched.
    pub fn take_cash(&mut self, amount: i32) -> bool {
        if amount <= 0 {
            return true;
        }
        if self.cash >= amount {
            self.cash -= amount;
            true
        } else {
            false
        }
    }

    /// Players this player is allied with (excluding itself).
    #[must_use]
    pub fn allies(&self) -> &[PlayerId] {
        &self.allies
    }

    /// Add an ally.
    pub fn add_ally(&mut self, other: PlayerId) {
        if other != self.id && !self.allies.contains(&other) {
            self.allies.push(other);
            self.allies.sort_unstable();
        }
    }

    /// Whether `other` is this player or one of its allies.
    #[must_use]
    pub fn is_allied_with(&self, other: PlayerId) -> bool {
        other == self.id || self.allies.contains(&other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(cash: i32) -> Player {
        Player::new(PlayerId(1), 100, TankId(0), cash)
    }

    #[test]
    fn test_take_cash() {
        let mut player = player(10);
        assert!(player.take_cash(4));
        assert_eq!(player.cash(), 6);
        assert!(!player.take_cash(7));
        assert_eq!(player.cash(), 6);
        assert!(player.take_cash(0));
        assert_eq!(player.cash(), 6);
    }

    #[test]
    fn test_give_cash_saturates() {
        let mut player = player(i32::MAX - 1);
        player.give_cash(10);
        assert_eq!(player.cash(), i32::MAX);
        player.give_cash(-10);
        assert_eq!(player.cash(), i32::MAX);
    }

    #[test]
    fn test_alliances() {
        let mut player = player(0);
        assert!(player.is_allied_with(PlayerId(1)));
        assert!(!player.is_allied_with(PlayerId(2)));

        player.add_ally(PlayerId(2));
        player.add_ally(PlayerId(2));
        player.add_ally(PlayerId(1));
        assert!(player.is_allied_with(PlayerId(2)));
        assert_eq!(player.allies(), &[PlayerId(2)]);
    }
}
