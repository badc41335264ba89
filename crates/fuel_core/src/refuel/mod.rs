//! Refuelers: actors that move fuel from their source tank into others.
//!
//! - [`StationaryRefueler`] serves one docked unit at a time.
//! - [`AreaRefueler`] serves every eligible unit within a radius.
//!
//! An actor carries at most one of the two, stored in its [`Refueler`]
//! slot.

mod area;
mod stationary;

use serde::{Deserialize, Serialize};

pub use area::{AreaRefueler, RangeIndicator};
pub use stationary::{SessionTransfer, StationaryRefueler, TransferSession};

use crate::tank::{TankId, TankStore};

/// Which kind of refueler an actor is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RefuelerKind {
    /// Exclusive docking.
    Stationary,
    /// Radius broadcast.
    Area,
}

/// The refueler slot of an actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refueler {
    /// Exclusive docking refueler.
    Stationary(StationaryRefueler),
    /// Radius refueler.
    Area(AreaRefueler),
}

impl Refueler {
    /// Kind of this refueler.
    #[must_use]
    pub const fn kind(&self) -> RefuelerKind {
        match self {
            Self::Stationary(_) => RefuelerKind::Stationary,
            Self::Area(_) => RefuelerKind::Area,
        }
    }

    /// Tank fuel is drawn from.
    #[must_use]
    pub const fn source(&self) -> TankId {
        match self {
            Self::Stationary(refueler) => refueler.source(),
            Self::Area(refueler) => refueler.source(),
        }
    }

    /// Whether this refueler currently has fuel to give.
    #[must_use]
    pub fn can_refuel(&self, tanks: &TankStore) -> bool {
        match self {
            Self::Stationary(refueler) => refueler.can_refuel(tanks),
            Self::Area(refueler) => refueler.can_refuel(tanks),
        }
    }

    /// The stationary refueler, if this is one.
    #[must_use]
    pub const fn as_stationary(&self) -> Option<&StationaryRefueler> {
        match self {
            Self::Stationary(refueler) => Some(refueler),
            Self::Area(_) => None,
        }
    }

    /// The area refueler, if this is one.
    #[must_use]
    pub const fn as_area(&self) -> Option<&AreaRefueler> {
        match self {
            Self::Area(refueler) => Some(refueler),
            Self::Stationary(_) => None,
        }
    }
}
