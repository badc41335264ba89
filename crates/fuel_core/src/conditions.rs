//! Condition grants for fuel status effects.
//!
//! Conditions ("low fuel", "out of fuel") are applied to actors by an
//! external condition manager. Granting returns an opaque token and
//! revoking consumes it, so every holder keeps the tokens it was issued
//! and hands each one back exactly once.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::components::EntityId;

/// Opaque handle for one outstanding condition grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConditionToken(pub u32);

/// The host's condition system, seen from the fuel simulation.
pub trait ConditionManager {
    /// Grant `condition` to `actor`, returning the token that revokes it.
    fn grant_condition(&mut self, actor: EntityId, condition: &str) -> ConditionToken;

    /// Revoke a previously granted condition.
    ///
    /// Returns false if the token was unknown (already revoked).
    fn revoke_condition(&mut self, actor: EntityId, token: ConditionToken) -> bool;

    /// The actor left play. Anything still granted to it can be dropped.
    fn forget_actor(&mut self, _actor: EntityId) {}
}

/// The set of tokens one holder currently owns for one condition category.
///
/// Granting is skipped while any token is held and revoking clears the
/// set, so a category is never granted twice or revoked twice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionTokens {
    tokens: Vec<ConditionToken>,
}

impl ConditionTokens {
    /// Create an empty token set.
    #[must_use]
    pub const fn new() -> Self {
        Self { tokens: Vec::new() }
    }

    /// Whether any grant is outstanding.
    #[must_use]
    pub fn is_held(&self) -> bool {
        !self.tokens.is_empty()
    }

    /// Number of outstanding grants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the set holds no tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Grant every condition in `conditions` unless tokens are already held.
    pub fn grant_all<S: AsRef<str>>(
        &mut self,
        manager: &mut dyn ConditionManager,
        actor: EntityId,
        conditions: &[S],
    ) {
        if self.is_held() {
            return;
        }

        for condition in conditions {
            self.tokens
                .push(manager.grant_condition(actor, condition.as_ref()));
        }
    }

    /// Revoke every held token and clear the set.
    pub fn revoke_all(&mut self, manager: &mut dyn ConditionManager, actor: EntityId) {
        for token in self.tokens.drain(..) {
            manager.revoke_condition(actor, token);
        }
    }
}

/// In-memory condition manager.
///
/// Tracks which conditions are granted to which actors. The world uses
/// one by default; hosts with their own condition system implement
/// [`ConditionManager`] and build the world with `World::with_conditions`.
#[derive(Debug, Clone, Default)]
pub struct ConditionLedger {
    grants: BTreeMap<ConditionToken, (EntityId, String)>,
    next_token: u32,
}

impl ConditionLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `actor` currently has `condition` granted at least once.
    #[must_use]
    pub fn is_granted(&self, actor: EntityId, condition: &str) -> bool {
        self.grants
            .values()
            .any(|(holder, name)| *holder == actor && name == condition)
    }

    /// Number of outstanding grants of `condition` on `actor`.
    #[must_use]
    pub fn grant_count(&self, actor: EntityId, condition: &str) -> usize {
        self.grants
            .values()
            .filter(|(holder, name)| *holder == actor && name == condition)
            .count()
    }

    /// Total outstanding grants across all actors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.grants.len()
    }

    /// Whether no grants are outstanding.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }

}

impl ConditionManager for ConditionLedger {
    fn grant_condition(&mut self, actor: EntityId, condition: &str) -> ConditionToken {
        let token = ConditionToken(self.next_token);
        self.next_token = self.next_token.wrapping_add(1);
        self.grants.insert(token, (actor, condition.to_string()));
        token
    }

    fn revoke_condition(&mut self, actor: EntityId, token: ConditionToken) -> bool {
        match self.grants.get(&token) {
            Some((holder, _)) if *holder == actor => {
                self.grants.remove(&token);
                true
            }
            _ => false,
        }
    }

    fn forget_actor(&mut self, actor: EntityId) {
        self.grants.retain(|_, (holder, _)| *holder != actor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_grant_and_revoke() {
        let mut ledger = ConditionLedger::new();
        let token = ledger.grant_condition(7, "low-fuel");

        assert!(ledger.is_granted(7, "low-fuel"));
        assert!(!ledger.is_granted(8, "low-fuel"));

        assert!(ledger.revoke_condition(7, token));
        assert!(!ledger.revoke_condition(7, token));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_revoke_requires_matching_actor() {
        let mut ledger = ConditionLedger::new();
        let token = ledger.grant_condition(1, "smoking");
        assert!(!ledger.revoke_condition(2, token));
        assert!(ledger.is_granted(1, "smoking"));
    }

    #[test]
    fn test_token_set_grants_once() {
        let mut ledger = ConditionLedger::new();
        let mut tokens = ConditionTokens::new();
        let conditions = ["low-fuel", "slowed"];

        tokens.grant_all(&mut ledger, 3, &conditions);
        tokens.grant_all(&mut ledger, 3, &conditions);

        assert_eq!(tokens.len(), 2);
        assert_eq!(ledger.grant_count(3, "low-fuel"), 1);
        assert_eq!(ledger.grant_count(3, "slowed"), 1);
    }

    #[test]
    fn test_token_set_revokes_and_clears() {
        let mut ledger = ConditionLedger::new();
        let mut tokens = ConditionTokens::new();
        tokens.grant_all(&mut ledger, 3, &["low-fuel"]);

        tokens.revoke_all(&mut ledger, 3);
        tokens.revoke_all(&mut ledger, 3);

        assert!(tokens.is_empty());
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_forget_actor() {
        let mut ledger = ConditionLedger::new();
        ledger.grant_condition(1, "a");
        ledger.grant_condition(2, "a");
        ledger.forget_actor(1);
        assert_eq!(ledger.len(), 1);
        assert!(ledger.is_granted(2, "a"));
    }
}
