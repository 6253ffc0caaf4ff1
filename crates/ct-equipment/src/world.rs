//! The hooks an equipment operation needs from the simulation world.

use ct_core::{EquipmentId, Tick, WiId};
use tracing::warn;

use crate::{EquipmentError, EquipmentRegistry, EquipmentResult, EquipmentStatus, OpKind, StampPoint};

/// Implemented by the world type `W` that operations run against.
///
/// Only the registry accessors and the event sink are required; status
/// transitions and timestamping are provided on top of them.
pub trait EquipmentWorld {
    fn registry(&self) -> &EquipmentRegistry;

    fn registry_mut(&mut self) -> &mut EquipmentRegistry;

    /// Sink for every status change, including forced `ERROR` transitions.
    fn record_equipment_event(
        &mut self,
        now:         Tick,
        wi:          Option<WiId>,
        id:          &EquipmentId,
        status:      EquipmentStatus,
        description: &str,
    );

    /// Move `id` to status `to` and record the event.
    ///
    /// A transition the table forbids puts the unit in `ERROR`, records that
    /// instead, and returns [`EquipmentError::InvalidTransition`].
    fn transition(
        &mut self,
        now:         Tick,
        wi:          Option<WiId>,
        id:          &EquipmentId,
        to:          EquipmentStatus,
        description: &str,
    ) -> EquipmentResult<()> {
        let (from, allowed) = {
            let eq = self.registry_mut().require_mut(id)?;
            let from = eq.status;
            let allowed = from.can_transition_to(to);
            eq.status = if allowed { to } else { EquipmentStatus::Error };
            if wi.is_some() {
                eq.last_wi = wi;
            }
            (from, allowed)
        };

        if allowed {
            self.record_equipment_event(now, wi, id, to, description);
            return Ok(());
        }

        warn!(tick = now.0, equipment = %id, %from, %to, "invalid equipment transition");
        let note = format!("invalid transition {from} -> {to}: {description}");
        self.record_equipment_event(now, wi, id, EquipmentStatus::Error, &note);
        Err(EquipmentError::InvalidTransition { id: id.clone(), from, to })
    }

    /// Record the dispatch or completion tick of an operation.
    fn stamp(&mut self, now: Tick, id: &EquipmentId, op: OpKind, point: StampPoint) -> EquipmentResult<()> {
        self.registry_mut().require_mut(id)?.times.stamp(op, point, now);
        Ok(())
    }
}
