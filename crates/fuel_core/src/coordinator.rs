//! Refuel coordination: eligibility, refuel orders and the protocols that
//! bring units and refuelers together.
//!
//! - **Docking** (stationary refuelers): move onto the docking cell, bind
//!   the session, wait for a full tank, then head for the rally point.
//! - **Proximity** (area refuelers): move within range and let the sweep
//!   do the rest.
//! - **Passive docking**: a grounded unit standing on a friendly
//!   stationary refueler binds to it without an order.

use tracing::debug;

use crate::components::{EntityId, MoveDestination, MoveOrder};
use crate::conditions::ConditionManager;
use crate::math::CellPos;
use crate::refuel::{Refueler, RefuelerKind};
use crate::refuelable::{DockPhase, Ineligible, RefuelActivity};
use crate::tank::{Tank, TankId};
use crate::world::{TickEvents, World};

impl<C: ConditionManager> World<C> {
    /// Check whether `unit` may refuel at `host`, and why not.
    ///
    /// # Errors
    ///
    /// Returns the first reason the request fails, checked in this order:
    /// the unit itself, the host being the unit, the host being gone or
    /// inactive, friendliness, the allow-list, and finally whether the
    /// host's refueler has fuel to give.
    pub fn eligibility(&self, unit: EntityId, host: EntityId) -> Result<(), Ineligible> {
        let unit_actor = self.actors.get(&unit).ok_or(Ineligible::UnitMissing(unit))?;
        let refuelable = unit_actor
            .refuelable
            .as_ref()
            .filter(|_| unit_actor.tank.is_some())
            .ok_or(Ineligible::NotRefuelable(unit))?;

        if unit == host {
            return Err(Ineligible::SelfHost);
        }

        let host_actor = self.actors.get(&host).ok_or(Ineligible::HostMissing(host))?;
        if !host_actor.is_active() {
            return Err(Ineligible::HostInactive(host));
        }

        let friendly = self
            .players
            .get(&unit_actor.owner)
            .is_some_and(|player| player.is_allied_with(host_actor.owner));
        if !friendly {
            return Err(Ineligible::NotFriendly(host));
        }

        if !refuelable.allows(&host_actor.actor_type) {
            return Err(Ineligible::NotAllowed(host_actor.actor_type.clone()));
        }

        let refueler = host_actor
            .refueler
            .as_ref()
            .ok_or(Ineligible::NoRefueler(host))?;
        if !refueler.can_refuel(&self.tanks) {
            return Err(Ineligible::Rejected(host));
        }

        Ok(())
    }

    /// Whether `unit` may refuel at `host`.
    #[must_use]
    pub fn can_refuel_at(&self, unit: EntityId, host: EntityId) -> bool {
        self.eligibility(unit, host).is_ok()
    }

    /// Order `unit` to refuel at `host`, replacing any running refuel order.
    ///
    /// # Errors
    ///
    /// Returns the reason if the unit is not eligible; nothing is queued.
    pub fn try_request_refuel(&mut self, unit: EntityId, host: EntityId) -> Result<(), Ineligible> {
        if let Err(reason) = self.eligibility(unit, host) {
            debug!(unit, host, %reason, "Refuel request rejected");
            return Err(reason);
        }

        let kind = self
            .actors
            .get(&host)
            .and_then(|a| a.refueler.as_ref())
            .map(Refueler::kind)
            .ok_or(Ineligible::NoRefueler(host))?;
        let activity = match kind {
            RefuelerKind::Stationary => RefuelActivity::Dock {
                host,
                phase: DockPhase::MovingToPad { ordered: false },
            },
            RefuelerKind::Area => RefuelActivity::Approach {
                host,
                ordered: false,
            },
        };

        let refuelable = self
            .actors
            .get_mut(&unit)
            .and_then(|a| a.refuelable.as_mut())
            .ok_or(Ineligible::NotRefuelable(unit))?;
        refuelable.set_activity(Some(activity));
        debug!(unit, host, ?kind, "Refuel ordered");
        Ok(())
    }

    /// Order `unit` to refuel at `host`. Returns false if it is not eligible.
    pub fn request_refuel(&mut self, unit: EntityId, host: EntityId) -> bool {
        self.try_request_refuel(unit, host).is_ok()
    }

    /// Abandon a unit's refuel order.
    pub fn cancel_refuel(&mut self, unit: EntityId) {
        if let Some(refuelable) = self.actors.get_mut(&unit).and_then(|a| a.refuelable.as_mut()) {
            refuelable.cancel();
        }
    }

    /// Bind `unit` to the stationary refueler `host` if it is eligible and
    /// the refueler is free.
    pub fn begin_session(&mut self, unit: EntityId, host: EntityId) -> bool {
        if let Err(reason) = self.eligibility(unit, host) {
            debug!(unit, host, %reason, "Cannot begin refuel session");
            return false;
        }

        let Some((unit_tank, position)) = self
            .actors
            .get(&unit)
            .and_then(|a| Some((a.tank?, a.position)))
        else {
            return false;
        };

        let Some(Refueler::Stationary(refueler)) =
            self.actors.get_mut(&host).and_then(|a| a.refueler.as_mut())
        else {
            return false;
        };
        if !refueler.begin_session(unit, unit_tank, position) {
            return false;
        }

        if let Some(refuelable) = self.actors.get_mut(&unit).and_then(|a| a.refuelable.as_mut()) {
            refuelable.bind(host);
        }
        true
    }

    /// Units an area refueler would serve right now, in ascending id order.
    pub(crate) fn area_candidates(&self, host_id: EntityId) -> Vec<(EntityId, TankId)> {
        let Some(host) = self.actors.get(&host_id) else {
            return Vec::new();
        };
        let Some(refueler) = host.refueler.as_ref().and_then(Refueler::as_area) else {
            return Vec::new();
        };
        let Some(owner) = self.players.get(&host.owner) else {
            return Vec::new();
        };

        self.actors
            .values()
            .filter(|unit| unit.id != host_id && unit.is_active())
            .filter(|unit| owner.is_allied_with(unit.owner))
            .filter(|unit| host.position.is_within(unit.position, refueler.radius()))
            .filter(|unit| refueler.accepts(unit.moving))
            .filter(|unit| self.can_refuel_at(unit.id, host_id))
            .filter_map(|unit| {
                let tank_id = unit.tank?;
                let tank = self.tanks.get(tank_id)?;
                (!tank.is_full()).then_some((unit.id, tank_id))
            })
            .collect()
    }

    pub(crate) fn run_refuelables(&mut self, ids: &[EntityId], events: &mut TickEvents) {
        for &id in ids {
            let Some(actor) = self.actors.get(&id) else {
                continue;
            };
            if !actor.is_active() || actor.refuelable.is_none() {
                continue;
            }

            self.step_activity(id, events);
            self.passive_refuel(id);
        }
    }

    fn step_activity(&mut self, unit: EntityId, events: &mut TickEvents) {
        let Some(activity) = self
            .actors
            .get(&unit)
            .and_then(|a| a.refuelable.as_ref())
            .and_then(|r| r.activity())
        else {
            return;
        };

        let next = match activity {
            RefuelActivity::Dock { host, phase } => self.step_docking(unit, host, phase, events),
            RefuelActivity::Approach { host, ordered } => {
                self.step_approach(unit, host, ordered, events)
            }
        };

        if next.is_none() {
            debug!(unit, host = activity.host(), "Refuel activity finished");
        }
        if let Some(refuelable) = self.actors.get_mut(&unit).and_then(|a| a.refuelable.as_mut()) {
            refuelable.set_activity(next);
        }
    }

    fn step_docking(
        &mut self,
        unit: EntityId,
        host: EntityId,
        phase: DockPhase,
        events: &mut TickEvents,
    ) -> Option<RefuelActivity> {
        let host_actor = self.actors.get(&host).filter(|a| a.is_active())?;
        let refueler = host_actor.refueler.as_ref()?.as_stationary()?;
        let pad = refueler.dock_cell(host_actor.location());
        let current = refueler.current_unit();
        let rally_point = host_actor.rally_point;

        let unit_actor = self.actors.get(&unit)?;
        let at_pad = unit_actor.location() == pad && !unit_actor.moving;
        let full = self
            .tanks
            .get(unit_actor.tank?)
            .map_or(true, Tank::is_full);

        let dock = |phase| Some(RefuelActivity::Dock { host, phase });

        match phase {
            DockPhase::MovingToPad { ordered } => {
                if !at_pad {
                    if !ordered {
                        events.move_orders.push(MoveOrder {
                            actor: unit,
                            destination: MoveDestination::Cell(pad),
                        });
                    }
                    return dock(DockPhase::MovingToPad { ordered: true });
                }

                match current {
                    Some(bound) if bound == unit => dock(DockPhase::Refuelling),
                    // Another unit holds the pad; wait for it to leave.
                    Some(_) => dock(DockPhase::MovingToPad { ordered: true }),
                    None if self.begin_session(unit, host) => dock(DockPhase::Refuelling),
                    None => None,
                }
            }
            DockPhase::Refuelling => {
                if full {
                    if let Some(cell) = rally_point {
                        events.move_orders.push(MoveOrder {
                            actor: unit,
                            destination: MoveDestination::Cell(cell),
                        });
                    }
                    return None;
                }
                if current != Some(unit) {
                    debug!(unit, host, "Refuel session lost before tank was full");
                    return None;
                }
                dock(DockPhase::Refuelling)
            }
        }
    }

    fn step_approach(
        &self,
        unit: EntityId,
        host: EntityId,
        ordered: bool,
        events: &mut TickEvents,
    ) -> Option<RefuelActivity> {
        let host_actor = self.actors.get(&host).filter(|a| a.is_active())?;
        let radius = host_actor.refueler.as_ref()?.as_area()?.radius();
        let unit_actor = self.actors.get(&unit)?;

        if host_actor.position.is_within(unit_actor.position, radius) {
            return None;
        }
        if !ordered {
            events.move_orders.push(MoveOrder {
                actor: unit,
                destination: MoveDestination::WithinRange {
                    target: host,
                    range: radius,
                },
            });
        }
        Some(RefuelActivity::Approach {
            host,
            ordered: true,
        })
    }

    fn passive_refuel(&mut self, unit: EntityId) {
        let Some(actor) = self.actors.get(&unit) else {
            return;
        };
        if actor.airborne {
            return;
        }
        let location = actor.location();

        if let Some(host) = actor.refuelable.as_ref().and_then(|r| r.bound_to()) {
            let still_bound = self
                .actors
                .get(&host)
                .and_then(|a| a.refueler.as_ref())
                .and_then(Refueler::as_stationary)
                .is_some_and(|r| r.current_unit() == Some(unit));
            if still_bound {
                return;
            }
            if let Some(refuelable) = self.actors.get_mut(&unit).and_then(|a| a.refuelable.as_mut()) {
                refuelable.unbind();
            }
        }

        let Some(host) = self.stationary_refueler_at(location, unit) else {
            return;
        };
        if self.can_refuel_at(unit, host) {
            self.begin_session(unit, host);
        }
    }

    /// First stationary refueler (by id) whose footprint covers `cell`.
    fn stationary_refueler_at(&self, cell: CellPos, except: EntityId) -> Option<EntityId> {
        self.actors
            .values()
            .filter(|a| a.id != except && a.is_active())
            .filter(|a| a.refueler.as_ref().and_then(Refueler::as_stationary).is_some())
            .find(|a| a.footprint.covers(a.location(), cell))
            .map(|a| a.id)
    }
}
