//! The world every terminal process runs against.

use std::collections::BTreeMap;

use ct_core::{EquipmentId, SimClock, SimRng, Tick, WiId};
use ct_equipment::{EquipmentHandle, EquipmentRegistry, EquipmentStatus, EquipmentWorld, OpKind};
use ct_kernel::ProcessHandle;
use ct_pool::ResourcePool;
use tracing::debug;

use crate::journal::{self, Crew, EquipmentEventRecord, MoveRecord};
use crate::{Journal, TerminalConfig, WiStage, WorkInstruction, YardZones};

// ── Pools ─────────────────────────────────────────────────────────────────────

pub struct Pools {
    pub quay_cranes: ResourcePool<EquipmentHandle>,
    pub vehicles:    ResourcePool<EquipmentHandle>,
    pub yard_cranes: ResourcePool<EquipmentHandle>,
}

impl Default for Pools {
    fn default() -> Self {
        Self {
            quay_cranes: ResourcePool::new("quay cranes"),
            vehicles:    ResourcePool::new("transport vehicles"),
            yard_cranes: ResourcePool::new("yard cranes"),
        }
    }
}

// ── Outcome bookkeeping ───────────────────────────────────────────────────────

/// How a point of work ended, as reported by the point of work itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PowResult {
    /// Held its crane and dispatched `moves` instructions.
    Worked { moves: usize, skipped: usize },
    /// Lost the crane race to the vessel finishing.
    StoodDown,
}

#[derive(Clone, Debug)]
pub struct VesselRun {
    pub vessel_id: String,
    pub handle:    Option<ProcessHandle>,
}

#[derive(Clone, Debug)]
pub struct PowRun {
    pub vessel_id: String,
    pub pow:       String,
    pub handle:    Option<ProcessHandle>,
    pub result:    Option<PowResult>,
}

#[derive(Clone, Debug, Default)]
pub struct Outcomes {
    pub vessels:   Vec<VesselRun>,
    pub pows:      Vec<PowRun>,
    pub completed: Vec<WiId>,
    pub skipped:   Vec<WiId>,
}

// ── TerminalState ─────────────────────────────────────────────────────────────

/// Equipment, pools, work and journal of one terminal.
///
/// Fields are public so processes can borrow disjoint parts at once, e.g.
/// the registry immutably while drawing from the RNG.
pub struct TerminalState {
    pub registry: EquipmentRegistry,
    pub pools:    Pools,
    pub zones:    YardZones,
    pub work:     BTreeMap<WiId, WorkInstruction>,
    pub journal:  Journal,
    pub rng:      SimRng,
    pub config:   TerminalConfig,
    /// Tick ↔ seconds conversion for records.
    pub clock:    SimClock,
    pub outcomes: Outcomes,
}

impl TerminalState {
    pub fn new(config: TerminalConfig) -> Self {
        Self {
            registry: EquipmentRegistry::new(),
            pools:    Pools::default(),
            zones:    YardZones::new(),
            work:     BTreeMap::new(),
            journal:  Journal::new(),
            rng:      SimRng::new(config.sim.seed),
            clock:    config.sim.make_clock(),
            config,
            outcomes: Outcomes::default(),
        }
    }

    pub fn set_stage(&mut self, wi: WiId, stage: WiStage) {
        if let Some(w) = self.work.get_mut(&wi) {
            debug!(wi = wi.0, from = %w.stage, to = %stage, "wi stage");
            w.stage = stage;
        }
    }

    pub fn stage_of(&self, wi: WiId) -> Option<WiStage> {
        self.work.get(&wi).map(|w| w.stage)
    }

    /// Append a move record for a finished stage.
    ///
    /// Times come from the dispatch/completion stamps of the equipment that
    /// performed the stage; absent equipment leaves them empty.
    pub fn log_move(&mut self, now: Tick, carrier_id: &str, wi: WiId, stage: OpKind, crew: Crew<'_>) {
        let Some(w) = self.work.get(&wi) else {
            return;
        };
        let kind = w.move_kind;
        let (che, fm_che, to_che) = journal::stage_roles(kind, stage, crew);

        let span = che.and_then(|id| self.registry.get(id)).map(|eq| eq.times.span(stage));
        let dispatch_secs = span.and_then(|s| s.dispatch).map(|t| self.clock.secs_at(t));
        let end_secs = span.and_then(|s| s.complete).map(|t| self.clock.secs_at(t));
        let duration_secs = dispatch_secs.zip(end_secs).map(|(d, e)| e - d);

        let facility = self.config.facility_id.as_deref();
        let record = MoveRecord {
            pow_id:         w.pow.clone(),
            line_op:        w.container.line_op.clone(),
            carrier_visit:  w.carrier_visit.clone(),
            wi_id:          wi.0,
            move_id:        format!("{}{}", wi.0, journal::move_suffix(stage)),
            container_id:   w.container.id.clone(),
            category:       w.container.category.clone(),
            freight_kind:   w.container.freight_kind.clone(),
            carrier_id:     carrier_id.to_owned(),
            move_kind:      kind,
            stage,
            che_id:         che.cloned(),
            fm_che:         fm_che.cloned(),
            to_che:         to_che.cloned(),
            fm_block_ref:   kind.fm_block_ref(),
            fm_block_class: kind.fm_block_class(stage),
            fm_position:    journal::position_name(w, true, facility),
            to_block_ref:   kind.to_block_ref(),
            to_block_class: kind.to_block_class(stage),
            to_position:    journal::position_name(w, false, facility),
            dispatch_secs,
            end_secs,
            duration_secs,
            logged_at_secs: self.clock.secs_at(now),
        };
        debug!(tick = now.0, wi = wi.0, stage = stage.as_str(), che = ?record.che_id, "move logged");
        self.journal.moves.push(record);
    }
}

impl EquipmentWorld for TerminalState {
    fn registry(&self) -> &EquipmentRegistry {
        &self.registry
    }

    fn registry_mut(&mut self) -> &mut EquipmentRegistry {
        &mut self.registry
    }

    fn record_equipment_event(
        &mut self,
        now:         Tick,
        wi:          Option<WiId>,
        id:          &EquipmentId,
        status:      EquipmentStatus,
        description: &str,
    ) {
        let work = wi.and_then(|w| self.work.get(&w));
        let facility = self.config.facility_id.as_deref();
        let record = EquipmentEventRecord {
            sim_secs:      self.clock.secs_at(now),
            unix_secs:     self.clock.unix_secs_at(now),
            pow_id:        work.map(|w| w.pow.clone()),
            wi_id:         wi.map(|w| w.0),
            che_id:        id.clone(),
            status,
            move_kind:     work.map(|w| w.move_kind),
            move_stage:    work.and_then(|_| journal::stage_from_description(description)),
            description:   description.to_owned(),
            last_position: work.and_then(|w| journal::last_position(w, description, facility)),
        };
        self.journal.events.push(record);
    }
}
