//! Fetch → Carry → Put orchestration of one work instruction.
//!
//! ```text
//!            carry_request            put_request
//!   Fetch ─────────────────▶ Carry ─────────────────▶ Put ──▶ move_done
//!     │                        │
//!     └── done ──┐             └── fetch_completed
//!                ▼                       ▼
//!        point of work starts the next instruction once both fired
//! ```
//!
//! | Role        | Discharge (`DSCH`)        | Load (`LOAD`)              |
//! |-------------|---------------------------|----------------------------|
//! | source      | POW quay crane            | yard crane of `fm_block`   |
//! | destination | yard crane of `to_block`  | POW quay crane             |
//!
//! Quay cranes stay with their point of work; stages only name them.  Yard
//! cranes and vehicles are pool handles that travel between stages inside
//! the [`Handoff`] payloads.  A failing stage returns every handle it holds
//! and fails the hand-off events still pending, so the stages downstream and
//! the point of work hear about it without the failure escaping further.

use ct_core::{EquipmentId, EventId, WiId};
use ct_equipment::{
    EquipmentClass, EquipmentHandle, EquipmentStatus, EquipmentWorld, Job, OpKind, Operation,
};
use ct_kernel::{ProcessError, Step};
use ct_pool::ResourcePool;
use tracing::{debug, info, warn};

use crate::journal::Crew;
use crate::script::{Flow, Script, ScriptProcess, TerminalKernel, failure};
use crate::{MoveKind, TerminalState, WiStage};

// ── Hand-off payloads ─────────────────────────────────────────────────────────

/// Payload of the hand-off events between stages.
#[derive(Debug)]
pub enum Handoff {
    /// Fetch → Carry.  `yard_crane` is the source crane of a load.
    Carry {
        vehicle:    EquipmentHandle,
        yard_crane: Option<EquipmentHandle>,
    },
    /// Carry → Put.  `yard_crane` is the destination crane of a discharge.
    Put {
        vehicle:    EquipmentId,
        yard_crane: Option<EquipmentHandle>,
    },
}

/// The manual events linking the stages of one move.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MoveEvents {
    pub carry_request:   EventId,
    pub put_request:     EventId,
    pub fetch_completed: EventId,
    pub move_done:       EventId,
}

impl MoveEvents {
    /// Create the events, defused: a failed hand-off is always reported to
    /// the point of work through its own waits.
    pub fn new(kernel: &mut TerminalKernel) -> ct_kernel::KernelResult<Self> {
        let events = Self {
            carry_request:   kernel.event(),
            put_request:     kernel.event(),
            fetch_completed: kernel.event(),
            move_done:       kernel.event(),
        };
        for ev in events.all() {
            kernel.defuse(ev)?;
        }
        Ok(events)
    }

    fn all(self) -> [EventId; 4] {
        [self.carry_request, self.put_request, self.fetch_completed, self.move_done]
    }
}

/// What every stage of one move knows.
#[derive(Clone, Debug)]
pub struct MoveCtx {
    pub vessel:     String,
    pub carrier_id: String,
    pub pow:        String,
    /// The quay crane working `pow`.
    pub quay_crane: EquipmentId,
    pub wi:         WiId,
    pub kind:       MoveKind,
    pub container:  String,
    pub fm_block:   String,
    pub to_block:   String,
    pub events:     MoveEvents,
}

impl MoveCtx {
    fn job(&self) -> Job<'_> {
        Job { wi: Some(self.wi), container: &self.container }
    }

    fn fail_pending(&self, kernel: &mut TerminalKernel, events: &[EventId], err: &ProcessError) {
        for &ev in events {
            if !kernel.is_triggered(ev) && kernel.fail(ev, err.clone()).is_err() {
                warn!(wi = self.wi.0, event = ev.0, "could not fail hand-off event");
            }
        }
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Sample the operation duration for `id` from the class model.
fn sample_secs(world: &mut TerminalState, id: &EquipmentId) -> Result<f64, ct_equipment::EquipmentError> {
    let class = world.registry.require(id)?.class();
    world.config.durations.sample(class, &mut world.rng)
}

/// Filtered request for one specific unit.
fn request_unit(
    pool:   &mut ResourcePool<EquipmentHandle>,
    kernel: &mut TerminalKernel,
    id:     &EquipmentId,
) -> Result<EventId, ct_pool::PoolError> {
    let wanted = id.clone();
    pool.get_filtered(kernel, move |h: &EquipmentHandle| h.id() == &wanted)
}

/// Return a handle to its pool, logging instead of failing: used on abort
/// paths where the first error is the one worth reporting.
fn give_back(world: &mut TerminalState, kernel: &mut TerminalKernel, handle: EquipmentHandle) {
    let id = handle.id().clone();
    let pool = match handle.class() {
        EquipmentClass::QuayCrane => &mut world.pools.quay_cranes,
        EquipmentClass::TransportVehicle => &mut world.pools.vehicles,
        EquipmentClass::YardCrane => &mut world.pools.yard_cranes,
    };
    if let Err(e) = pool.put(kernel, handle) {
        warn!(equipment = %id, error = %e, "could not return unit");
    }
}

/// Yard crane serving `block`, or a configuration error.
fn yard_crane_for(world: &TerminalState, block: &str) -> Result<EquipmentId, String> {
    world
        .zones
        .resolve(block)
        .cloned()
        .ok_or_else(|| format!("configuration error: no yard crane serves block {block:?}"))
}

// ── Fetch ─────────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FetchPc {
    Start,
    CollectYardCrane,
    Fetch,
    AcquireVehicle,
    CollectVehicle,
}

/// Source crane lifts the box; a vehicle is assigned and the carry is
/// requested.  Spawns the Carry and Put stages.
pub struct FetchStage {
    name:       String,
    ctx:        MoveCtx,
    pc:         FetchPc,
    source:     Option<EquipmentId>,
    request:    Option<EventId>,
    yard_crane: Option<EquipmentHandle>,
}

impl FetchStage {
    pub fn new(ctx: MoveCtx) -> Self {
        Self {
            name: format!("fetch:{}", ctx.wi.0),
            ctx,
            pc: FetchPc::Start,
            source: None,
            request: None,
            yard_crane: None,
        }
    }

    fn err(&self, e: impl std::fmt::Display) -> ProcessError {
        failure(&self.name, e)
    }
}

impl Script for FetchStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn advance(&mut self, k: &mut TerminalKernel, w: &mut TerminalState) -> Result<Flow, ProcessError> {
        match self.pc {
            FetchPc::Start => {
                w.set_stage(self.ctx.wi, WiStage::Fetching);
                if self.ctx.kind == MoveKind::Load {
                    let id = yard_crane_for(w, &self.ctx.fm_block).map_err(|e| self.err(e))?;
                    let req = request_unit(&mut w.pools.yard_cranes, k, &id).map_err(|e| self.err(e))?;
                    self.request = Some(req);
                    self.pc = FetchPc::CollectYardCrane;
                    return Ok(Flow::Wait(req));
                }
                self.source = Some(self.ctx.quay_crane.clone());
                self.pc = FetchPc::Fetch;
                Ok(Flow::Next)
            }
            FetchPc::CollectYardCrane => {
                let handle = self
                    .request
                    .take()
                    .and_then(|r| w.pools.yard_cranes.take(r))
                    .ok_or_else(|| self.err("yard crane request fired without a crane"))?;
                self.source = Some(handle.id().clone());
                self.yard_crane = Some(handle);
                self.pc = FetchPc::Fetch;
                Ok(Flow::Next)
            }
            FetchPc::Fetch => {
                let source = self.source.clone().ok_or_else(|| self.err("no source crane"))?;
                let secs = sample_secs(w, &source).map_err(|e| self.err(e))?;
                let eq = w.registry.require(&source).map_err(|e| self.err(e))?;
                let op = Operation::fetch(eq, self.ctx.job(), secs).map_err(|e| self.err(e))?;
                self.pc = FetchPc::AcquireVehicle;
                Ok(Flow::Run(op))
            }
            FetchPc::AcquireVehicle => {
                let req = w.pools.vehicles.get(k).map_err(|e| self.err(e))?;
                self.request = Some(req);
                self.pc = FetchPc::CollectVehicle;
                Ok(Flow::Wait(req))
            }
            FetchPc::CollectVehicle => {
                let vehicle = self
                    .request
                    .take()
                    .and_then(|r| w.pools.vehicles.take(r))
                    .ok_or_else(|| self.err("vehicle request fired without a vehicle"))?;
                let crew = Crew {
                    quay_crane: Some(&self.ctx.quay_crane),
                    vehicle:    Some(vehicle.id()),
                    yard_crane: self.yard_crane.as_ref().map(EquipmentHandle::id),
                };
                w.log_move(k.now(), &self.ctx.carrier_id, self.ctx.wi, OpKind::Fetch, crew);
                w.set_stage(self.ctx.wi, WiStage::CarryReady);
                debug!(tick = k.now().0, wi = self.ctx.wi.0, vehicle = %vehicle.id(), "carry requested");

                let payload = Handoff::Carry { vehicle, yard_crane: self.yard_crane.take() };
                k.trigger(self.ctx.events.carry_request, Some(payload)).map_err(|e| self.err(e))?;

                let carry = k.spawn(ScriptProcess::new(CarryStage::new(self.ctx.clone())));
                let put = k.spawn(ScriptProcess::new(PutStage::new(self.ctx.clone())));
                k.defuse(carry.done).map_err(|e| self.err(e))?;
                k.defuse(put.done).map_err(|e| self.err(e))?;
                Ok(Flow::Done)
            }
        }
    }

    fn abort(&mut self, k: &mut TerminalKernel, w: &mut TerminalState, err: ProcessError) -> Step {
        if let Some(req) = self.request.take() {
            let pool = match self.pc {
                FetchPc::CollectYardCrane => &mut w.pools.yard_cranes,
                _ => &mut w.pools.vehicles,
            };
            if let Some(unit) = pool.take(req) {
                give_back(w, k, unit);
            }
        }
        if let Some(yc) = self.yard_crane.take() {
            give_back(w, k, yc);
        }
        let ev = self.ctx.events;
        self.ctx.fail_pending(k, &ev.all(), &err);
        Step::Fail(err)
    }
}

// ── Carry ─────────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum CarryPc {
    AwaitRequest,
    Couple,
    SourceHandshake,
    VehicleReady,
    FetchCompleted,
    Transit,
    AcquireDestination,
    CollectDestination,
    ReadyToPut,
    DestinationHandshake,
    Release,
    Finish,
}

/// Vehicle takes the box from the source crane, drives it to the
/// destination crane and is released there.
pub struct CarryStage {
    name:        String,
    ctx:         MoveCtx,
    pc:          CarryPc,
    vehicle:     Option<EquipmentHandle>,
    /// Source yard crane of a load, held until the box is on the vehicle.
    source_yc:   Option<EquipmentHandle>,
    source:      Option<EquipmentId>,
    request:     Option<EventId>,
    /// Destination yard crane of a discharge.
    dest_yc:     Option<EquipmentHandle>,
    destination: Option<EquipmentId>,
}

impl CarryStage {
    pub fn new(ctx: MoveCtx) -> Self {
        Self {
            name: format!("carry:{}", ctx.wi.0),
            ctx,
            pc: CarryPc::AwaitRequest,
            vehicle: None,
            source_yc: None,
            source: None,
            request: None,
            dest_yc: None,
            destination: None,
        }
    }

    fn err(&self, e: impl std::fmt::Display) -> ProcessError {
        failure(&self.name, e)
    }

    fn vehicle_id(&self) -> Result<EquipmentId, ProcessError> {
        self.vehicle.as_ref().map(|v| v.id().clone()).ok_or_else(|| self.err("no vehicle"))
    }
}

impl Script for CarryStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn advance(&mut self, k: &mut TerminalKernel, w: &mut TerminalState) -> Result<Flow, ProcessError> {
        match self.pc {
            CarryPc::AwaitRequest => {
                self.pc = CarryPc::Couple;
                Ok(Flow::Wait(self.ctx.events.carry_request))
            }
            CarryPc::Couple => {
                let Some(Handoff::Carry { vehicle, yard_crane }) = k.take_value(self.ctx.events.carry_request)
                else {
                    return Err(self.err("carry request without a vehicle"));
                };
                self.source = Some(match &yard_crane {
                    Some(yc) => yc.id().clone(),
                    None => self.ctx.quay_crane.clone(),
                });
                self.vehicle = Some(vehicle);
                self.source_yc = yard_crane;
                let secs = w.config.orchestration.carry_coupling.sample(&mut w.rng);
                let ev = k.timeout(secs).map_err(|e| self.err(e))?;
                self.pc = CarryPc::SourceHandshake;
                Ok(Flow::Wait(ev))
            }
            CarryPc::SourceHandshake => {
                let source = self.source.clone().ok_or_else(|| self.err("no source crane"))?;
                let vehicle = self.vehicle_id()?;
                let eq = w.registry.require(&source).map_err(|e| self.err(e))?;
                let op = Operation::crane_ready_to_put_to_vehicle(
                    eq,
                    self.ctx.job(),
                    Some(&vehicle),
                    &w.config.delays,
                    &mut w.rng,
                )
                .map_err(|e| self.err(e))?;
                self.pc = CarryPc::VehicleReady;
                Ok(Flow::Run(op))
            }
            CarryPc::VehicleReady => {
                let vehicle = self.vehicle_id()?;
                let eq = w.registry.require(&vehicle).map_err(|e| self.err(e))?;
                let op = Operation::ready_to_fetch(eq, self.ctx.job(), self.source.as_ref(), &w.config.delays, &mut w.rng)
                    .map_err(|e| self.err(e))?;
                self.pc = CarryPc::FetchCompleted;
                Ok(Flow::Run(op))
            }
            CarryPc::FetchCompleted => {
                k.trigger(self.ctx.events.fetch_completed, None).map_err(|e| self.err(e))?;
                if let Some(yc) = self.source_yc.take() {
                    let id = yc.id().clone();
                    let idle = w.registry.get(&id).is_some_and(|e| e.status == EquipmentStatus::Idle);
                    if !idle {
                        w.transition(k.now(), Some(self.ctx.wi), &id, EquipmentStatus::Idle, "RELEASED")
                            .map_err(|e| self.err(e))?;
                    }
                    w.pools.yard_cranes.put(k, yc).map_err(|e| self.err(e))?;
                }
                w.set_stage(self.ctx.wi, WiStage::CarryUnderway);
                self.pc = CarryPc::Transit;
                Ok(Flow::Next)
            }
            CarryPc::Transit => {
                let vehicle = self.vehicle_id()?;
                let secs = sample_secs(w, &vehicle).map_err(|e| self.err(e))?;
                let eq = w.registry.require(&vehicle).map_err(|e| self.err(e))?;
                let op = Operation::carry(eq, self.ctx.job(), secs, self.source.as_ref(), &w.config.delays, &mut w.rng)
                    .map_err(|e| self.err(e))?;
                self.pc = CarryPc::AcquireDestination;
                Ok(Flow::Run(op))
            }
            CarryPc::AcquireDestination => {
                if self.ctx.kind == MoveKind::Load {
                    self.destination = Some(self.ctx.quay_crane.clone());
                    self.pc = CarryPc::ReadyToPut;
                    return Ok(Flow::Next);
                }
                let id = yard_crane_for(w, &self.ctx.to_block).map_err(|e| self.err(e))?;
                let req = request_unit(&mut w.pools.yard_cranes, k, &id).map_err(|e| self.err(e))?;
                self.request = Some(req);
                self.pc = CarryPc::CollectDestination;
                Ok(Flow::Wait(req))
            }
            CarryPc::CollectDestination => {
                let handle = self
                    .request
                    .take()
                    .and_then(|r| w.pools.yard_cranes.take(r))
                    .ok_or_else(|| self.err("yard crane request fired without a crane"))?;
                self.destination = Some(handle.id().clone());
                self.dest_yc = Some(handle);
                self.pc = CarryPc::ReadyToPut;
                Ok(Flow::Next)
            }
            CarryPc::ReadyToPut => {
                let vehicle = self.vehicle_id()?;
                let eq = w.registry.require(&vehicle).map_err(|e| self.err(e))?;
                let op = Operation::ready_to_put(eq, self.ctx.job(), self.destination.as_ref(), &w.config.delays, &mut w.rng)
                    .map_err(|e| self.err(e))?;
                self.pc = CarryPc::DestinationHandshake;
                Ok(Flow::Run(op))
            }
            CarryPc::DestinationHandshake => {
                let vehicle = self.vehicle_id()?;
                let dest = self.destination.clone().ok_or_else(|| self.err("no destination crane"))?;
                let eq = w.registry.require(&dest).map_err(|e| self.err(e))?;
                let op = Operation::crane_ready_to_fetch_from_vehicle(
                    eq,
                    self.ctx.job(),
                    Some(&vehicle),
                    &w.config.delays,
                    &mut w.rng,
                )
                .map_err(|e| self.err(e))?;
                self.pc = CarryPc::Release;
                Ok(Flow::Run(op))
            }
            CarryPc::Release => {
                let vehicle = self.vehicle_id()?;
                let target = self.destination.as_ref().and_then(|d| w.registry.get(d));
                let eq = w.registry.require(&vehicle).map_err(|e| self.err(e))?;
                let op = Operation::release_from(eq, self.ctx.job(), target, &w.config.delays, &mut w.rng)
                    .map_err(|e| self.err(e))?;
                self.pc = CarryPc::Finish;
                Ok(Flow::Run(op))
            }
            CarryPc::Finish => {
                let vehicle = self.vehicle.take().ok_or_else(|| self.err("no vehicle"))?;
                let vehicle_id = vehicle.id().clone();
                let yard_crane = match self.ctx.kind {
                    MoveKind::Load => self.source.as_ref(),
                    _ => self.destination.as_ref(),
                };
                let crew = Crew {
                    quay_crane: Some(&self.ctx.quay_crane),
                    vehicle:    Some(&vehicle_id),
                    yard_crane,
                };
                w.log_move(k.now(), &self.ctx.carrier_id, self.ctx.wi, OpKind::Carry, crew);
                w.set_stage(self.ctx.wi, WiStage::CarryComplete);
                w.pools.vehicles.put(k, vehicle).map_err(|e| self.err(e))?;

                let payload = Handoff::Put { vehicle: vehicle_id, yard_crane: self.dest_yc.take() };
                k.trigger(self.ctx.events.put_request, Some(payload)).map_err(|e| self.err(e))?;
                Ok(Flow::Done)
            }
        }
    }

    fn abort(&mut self, k: &mut TerminalKernel, w: &mut TerminalState, err: ProcessError) -> Step {
        if let Some(req) = self.request.take() {
            if let Some(unit) = w.pools.yard_cranes.take(req) {
                give_back(w, k, unit);
            }
        }
        for unit in [self.vehicle.take(), self.source_yc.take(), self.dest_yc.take()].into_iter().flatten() {
            give_back(w, k, unit);
        }
        let ev = self.ctx.events;
        self.ctx.fail_pending(k, &[ev.fetch_completed, ev.put_request, ev.move_done], &err);
        Step::Fail(err)
    }
}

// ── Put ───────────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum PutPc {
    AwaitRequest,
    Put,
    Finish,
}

/// Destination crane sets the box down and goes idle.
pub struct PutStage {
    name:        String,
    ctx:         MoveCtx,
    pc:          PutPc,
    vehicle:     Option<EquipmentId>,
    yard_crane:  Option<EquipmentHandle>,
    destination: Option<EquipmentId>,
}

impl PutStage {
    pub fn new(ctx: MoveCtx) -> Self {
        Self {
            name: format!("put:{}", ctx.wi.0),
            ctx,
            pc: PutPc::AwaitRequest,
            vehicle: None,
            yard_crane: None,
            destination: None,
        }
    }

    fn err(&self, e: impl std::fmt::Display) -> ProcessError {
        failure(&self.name, e)
    }
}

impl Script for PutStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn advance(&mut self, k: &mut TerminalKernel, w: &mut TerminalState) -> Result<Flow, ProcessError> {
        match self.pc {
            PutPc::AwaitRequest => {
                self.pc = PutPc::Put;
                Ok(Flow::Wait(self.ctx.events.put_request))
            }
            PutPc::Put => {
                let Some(Handoff::Put { vehicle, yard_crane }) = k.take_value(self.ctx.events.put_request) else {
                    return Err(self.err("put request without a payload"));
                };
                let dest = match (&yard_crane, self.ctx.kind) {
                    (Some(yc), _) => yc.id().clone(),
                    (None, MoveKind::Load) => self.ctx.quay_crane.clone(),
                    (None, _) => return Err(self.err("discharge put without a yard crane")),
                };
                self.vehicle = Some(vehicle);
                self.yard_crane = yard_crane;
                let secs = sample_secs(w, &dest).map_err(|e| self.err(e))?;
                let eq = w.registry.require(&dest).map_err(|e| self.err(e))?;
                let op = Operation::put(eq, self.ctx.job(), secs).map_err(|e| self.err(e))?;
                self.destination = Some(dest);
                self.pc = PutPc::Finish;
                Ok(Flow::Run(op))
            }
            PutPc::Finish => {
                let dest = self.destination.clone().ok_or_else(|| self.err("no destination crane"))?;
                let crew = Crew {
                    quay_crane: Some(&self.ctx.quay_crane),
                    vehicle:    self.vehicle.as_ref(),
                    yard_crane: self.yard_crane.as_ref().map(EquipmentHandle::id),
                };
                w.log_move(k.now(), &self.ctx.carrier_id, self.ctx.wi, OpKind::Put, crew);
                w.transition(k.now(), Some(self.ctx.wi), &dest, EquipmentStatus::Idle, "PUT_COMPLETE")
                    .map_err(|e| self.err(e))?;
                if let Some(yc) = self.yard_crane.take() {
                    w.pools.yard_cranes.put(k, yc).map_err(|e| self.err(e))?;
                }
                w.set_stage(self.ctx.wi, WiStage::Complete);
                w.outcomes.completed.push(self.ctx.wi);
                k.trigger(self.ctx.events.move_done, None).map_err(|e| self.err(e))?;
                info!(
                    tick = k.now().0,
                    vessel = %self.ctx.vessel,
                    pow = %self.ctx.pow,
                    wi = self.ctx.wi.0,
                    kind = %self.ctx.kind,
                    "move complete"
                );
                Ok(Flow::Done)
            }
        }
    }

    fn abort(&mut self, k: &mut TerminalKernel, w: &mut TerminalState, err: ProcessError) -> Step {
        if let Some(yc) = self.yard_crane.take() {
            give_back(w, k, yc);
        }
        if k.failure(self.ctx.events.put_request).is_some() {
            // Carry never handed over; it already reported the failure.
            debug!(wi = self.ctx.wi.0, "put stands down after upstream failure");
            return Step::Done;
        }
        self.ctx.fail_pending(k, &[self.ctx.events.move_done], &err);
        Step::Fail(err)
    }
}
