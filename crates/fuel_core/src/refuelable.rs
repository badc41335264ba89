//! The refuelable capability: units that can take on fuel from refuelers.
//!
//! A refuelable unit remembers which stationary refueler it is bound to
//! and the refuel activity it is currently running. The protocols
//! themselves need the whole world and are driven by
//! [`World`](crate::world::World).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::components::EntityId;
use crate::data::RefuelableData;

/// Why a unit may not refuel at a host.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Ineligible {
    /// The unit does not exist.
    #[error("unit {0} does not exist")]
    UnitMissing(EntityId),

    /// The unit has no tank or is not refuelable.
    #[error("unit {0} cannot take on fuel")]
    NotRefuelable(EntityId),

    /// A unit asked to refuel at itself.
    #[error("a unit cannot refuel at itself")]
    SelfHost,

    /// The host does not exist.
    #[error("host {0} does not exist")]
    HostMissing(EntityId),

    /// The host is dead or not in the world.
    #[error("host {0} is dead or not in the world")]
    HostInactive(EntityId),

    /// The host belongs to a player that is not an ally.
    #[error("host {0} is not friendly")]
    NotFriendly(EntityId),

    /// The host's actor type is not on the unit's allow-list.
    #[error("refueler type '{0}' is not allowed")]
    NotAllowed(String),

    /// The host has no refueler capability.
    #[error("host {0} is not a refueler")]
    NoRefueler(EntityId),

    /// The host's refueler has no fuel to give.
    #[error("host {0} has no fuel to give")]
    Rejected(EntityId),
}

/// Progress of the docking protocol at a stationary refueler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DockPhase {
    /// Heading for the docking cell.
    MovingToPad {
        /// A move order has already been issued.
        ordered: bool,
    },
    /// Bound to the refueler and waiting for a full tank.
    Refuelling,
}

/// Refuel order a unit is carrying out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RefuelActivity {
    /// Dock at a stationary refueler, fill up, then head to its rally point.
    Dock {
        /// Refueler being docked at.
        host: EntityId,
        /// Current phase.
        phase: DockPhase,
    },
    /// Get within range of an area refueler.
    Approach {
        /// Refueler being approached.
        host: EntityId,
        /// A move order has already been issued.
        ordered: bool,
    },
}

impl RefuelActivity {
    /// Refueler this activity targets.
    #[must_use]
    pub const fn host(&self) -> EntityId {
        match self {
            Self::Dock { host, .. } | Self::Approach { host, .. } => *host,
        }
    }
}

/// Refuelable state for one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Refuelable {
    data: RefuelableData,
    bound_to: Option<EntityId>,
    activity: Option<RefuelActivity>,
}

impl Refuelable {
    /// Create the capability from its definition.
    #[must_use]
    pub const fn new(data: RefuelableData) -> Self {
        Self {
            data,
            bound_to: None,
            activity: None,
        }
    }

    /// Configuration.
    #[must_use]
    pub const fn data(&self) -> &RefuelableData {
        &self.data
    }

    /// Stationary refueler this unit last bound to.
    #[must_use]
    pub const fn bound_to(&self) -> Option<EntityId> {
        self.bound_to
    }

    /// Running refuel activity.
    #[must_use]
    pub const fn activity(&self) -> Option<RefuelActivity> {
        self.activity
    }

    /// Whether `actor_type` is an allowed refueler.
    #[must_use]
    pub fn allows(&self, actor_type: &str) -> bool {
        self.data.allows(actor_type)
    }

    pub(crate) fn bind(&mut self, host: EntityId) {
        self.bound_to = Some(host);
    }

    pub(crate) fn unbind(&mut self) {
        self.bound_to = None;
    }

    pub(crate) fn set_activity(&mut self, activity: Option<RefuelActivity>) {
        self.activity = activity;
    }

    /// Abandon the running activity.
    pub fn cancel(&mut self) {
        self.activity = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_host() {
        let dock = RefuelActivity::Dock {
            host: 4,
            phase: DockPhase::Refuelling,
        };
        let approach = RefuelActivity::Approach {
            host: 9,
            ordered: false,
        };
        assert_eq!(dock.host(), 4);
        assert_eq!(approach.host(), 9);
    }

    #[test]
    fn test_binding() {
        let mut refuelable = Refuelable::new(RefuelableData {
            allowed_refueler_types: vec!["depot".to_string()],
        });
        assert!(refuelable.allows("depot"));
        assert_eq!(refuelable.bound_to(), None);

        refuelable.bind(3);
        assert_eq!(refuelable.bound_to(), Some(3));
        refuelable.unbind();
        assert_eq!(refuelable.bound_to(), None);
    }

    #[test]
    fn test_ineligible_messages() {
        assert_eq!(
            Ineligible::NotAllowed("tanker".to_string()).to_string(),
            "refueler type 'tanker' is not allowed"
        );
        assert_eq!(Ineligible::Rejected(5).to_string(), "host 5 has no fuel to give");
    }
}
