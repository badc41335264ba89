//! Error types for the fuel simulation.
//!
//! Per-tick protocol failures are never errors: an invalid amount or an
//! ineligible refueler is a silent no-op. These errors cover the API
//! boundary, where a host hands the world an identifier it does not know
//! or a rules set that cannot be honoured.

use thiserror::Error;

use crate::components::{EntityId, PlayerId};
use crate::refuelable::Ineligible;
use crate::tank::TankId;

/// Result type alias using [`FuelError`].
pub type Result<T> = std::result::Result<T, FuelError>;

/// Top-level error type for all fuel simulation errors.
#[derive(Debug, Error)]
pub enum FuelError {
    /// Invalid entity reference.
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// Invalid player reference.
    #[error("Player not found: {0}")]
    PlayerNotFound(PlayerId),

    /// Invalid tank reference.
    #[error("Tank not found: {0}")]
    TankNotFound(TankId),

    /// The entity exists but carries no fuel tank.
    #[error("Entity {0} has no fuel tank")]
    NoTank(EntityId),

    /// A refuel command was rejected by the eligibility check.
    #[error("Entity {unit} cannot refuel at {host}: {reason}")]
    RefuelRejected {
        /// Unit asking for fuel.
        unit: EntityId,
        /// Requested refueler.
        host: EntityId,
        /// Why the request was rejected.
        reason: Ineligible,
    },

    /// No rules registered for an actor type.
    #[error("Unknown actor type: {0}")]
    UnknownActorType(String),

    /// Rules data could not be parsed.
    #[error("Failed to parse rules: {0}")]
    RulesParse(#[from] ron::error::SpannedError),

    /// An actor type declares a capability without the one it depends on.
    #[error("Actor type '{actor_type}': {capability} requires {requires}")]
    MissingCapability {
        /// Actor type being validated.
        actor_type: String,
        /// Capability that was declared.
        capability: &'static str,
        /// Capability it depends on.
        requires: &'static str,
    },

    /// An actor type declares two capabilities that share one slot.
    #[error("Actor type '{actor_type}' declares both {first} and {second}")]
    ConflictingCapabilities {
        /// Actor type being validated.
        actor_type: String,
        /// First capability.
        first: &'static str,
        /// Second capability.
        second: &'static str,
    },

    /// A configuration value is outside its valid range.
    #[error("Actor type '{actor_type}': invalid {field}: {message}")]
    InvalidValue {
        /// Actor type being validated.
        actor_type: String,
        /// Offending field.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },
}
