//! Timed equipment operations.
//!
//! An [`Operation`] is a short script of steps against one unit:
//!
//! ```text
//! Stamp(kind, point)   — record dispatch / completion tick
//! Status(to, text)     — status transition + equipment event
//! Delay(secs)          — suspend on a kernel timeout
//! ```
//!
//! Random durations are drawn when the script is built.  A script either runs
//! as its own process ([`OperationProcess`]) or is driven inline by a stage
//! process through [`Operation::advance`], which keeps the steps after the
//! last delay in the same resumption as whatever the stage does next.

use std::collections::VecDeque;

use ct_core::{EquipmentId, EventId, SimRng, WiId};
use ct_kernel::{Kernel, Process, ProcessError, Step, Wake};

use crate::{
    EquipmentClass, EquipmentError, EquipmentResult, EquipmentStatus, EquipmentWorld, Equipment,
    HandshakeDelays, OpKind, StampPoint,
};

/// Rendered in place of a missing counterpart on the vehicle side.
pub const UNKNOWN_COUNTERPART: &str = "UNK-RES";

/// Rendered in place of a missing vehicle on the crane side.
pub const UNKNOWN_VEHICLE: &str = "UNK-ITV";

/// What an operation works on.
#[derive(Copy, Clone, Debug)]
pub struct Job<'a> {
    pub wi:        Option<WiId>,
    pub container: &'a str,
}

#[derive(Clone, Debug, PartialEq)]
pub enum OpStep {
    Status(EquipmentStatus, String),
    Delay(f64),
    Stamp(OpKind, StampPoint),
}

/// Result of driving an operation until it must suspend.
#[derive(Clone, Debug, PartialEq)]
pub enum OpProgress {
    Wait(EventId),
    Finished,
    Failed(ProcessError),
}

// ── Operation ─────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Operation {
    equipment: EquipmentId,
    wi:        Option<WiId>,
    label:     &'static str,
    steps:     VecDeque<OpStep>,
}

impl Operation {
    fn begin(eq: &Equipment, job: Job<'_>, label: &'static str) -> Self {
        Self { equipment: eq.id.clone(), wi: job.wi, label, steps: VecDeque::new() }
    }

    fn then(mut self, step: OpStep) -> Self {
        self.steps.push_back(step);
        self
    }

    fn status(self, to: EquipmentStatus, text: String) -> Self {
        self.then(OpStep::Status(to, text))
    }

    fn delay(self, secs: f64) -> Self {
        self.then(OpStep::Delay(secs))
    }

    fn stamp(self, op: OpKind, point: StampPoint) -> Self {
        self.then(OpStep::Stamp(op, point))
    }

    // ── Crane operations ──────────────────────────────────────────────────

    /// Lift the box: clamped duration, `BUSY` then `WAITING`.
    pub fn fetch(eq: &Equipment, job: Job<'_>, raw_secs: f64) -> EquipmentResult<Self> {
        require(eq, "fetch", "crane", EquipmentClass::is_crane)?;
        let c = job.container;
        Ok(Self::begin(eq, job, "FETCH")
            .stamp(OpKind::Fetch, StampPoint::Dispatch)
            .status(EquipmentStatus::Busy, format!("FETCH {c} dispatched"))
            .delay(eq.clamp(raw_secs))
            .status(EquipmentStatus::Waiting, format!("FETCH {c} complete"))
            .stamp(OpKind::Fetch, StampPoint::Complete))
    }

    /// Set the box down: clamped duration, `BUSY` then `WAITING`.
    pub fn put(eq: &Equipment, job: Job<'_>, raw_secs: f64) -> EquipmentResult<Self> {
        require(eq, "put", "crane", EquipmentClass::is_crane)?;
        let c = job.container;
        Ok(Self::begin(eq, job, "PUT")
            .stamp(OpKind::Put, StampPoint::Dispatch)
            .status(EquipmentStatus::Busy, format!("PUT {c} dispatched"))
            .delay(eq.clamp(raw_secs))
            .status(EquipmentStatus::Waiting, format!("PUT {c} complete"))
            .stamp(OpKind::Put, StampPoint::Complete))
    }

    /// Crane lowers the box onto the vehicle.
    pub fn crane_ready_to_put_to_vehicle(
        eq:      &Equipment,
        job:     Job<'_>,
        vehicle: Option<&EquipmentId>,
        delays:  &HandshakeDelays,
        rng:     &mut SimRng,
    ) -> EquipmentResult<Self> {
        require(eq, "ready to put to vehicle", "crane", EquipmentClass::is_crane)?;
        let target = vehicle.map_or(UNKNOWN_VEHICLE, EquipmentId::as_str);
        Ok(Self::begin(eq, job, "FETCH")
            .delay(delays.crane_ready_to_put_to_vehicle.sample(rng))
            .status(EquipmentStatus::Waiting, format!("FETCH ready to put {} to {target}", job.container)))
    }

    /// Crane picks the box off the vehicle.
    pub fn crane_ready_to_fetch_from_vehicle(
        eq:      &Equipment,
        job:     Job<'_>,
        vehicle: Option<&EquipmentId>,
        delays:  &HandshakeDelays,
        rng:     &mut SimRng,
    ) -> EquipmentResult<Self> {
        require(eq, "ready to fetch from vehicle", "crane", EquipmentClass::is_crane)?;
        let target = vehicle.map_or(UNKNOWN_VEHICLE, EquipmentId::as_str);
        Ok(Self::begin(eq, job, "PUT")
            .delay(delays.crane_ready_to_fetch_from_vehicle.sample(rng))
            .status(EquipmentStatus::Busy, format!("PUT ready to fetch {} from {target}", job.container)))
    }

    // ── Vehicle operations ────────────────────────────────────────────────

    /// Vehicle positions under the source and takes the box.
    pub fn ready_to_fetch(
        eq:     &Equipment,
        job:    Job<'_>,
        from:   Option<&EquipmentId>,
        delays: &HandshakeDelays,
        rng:    &mut SimRng,
    ) -> EquipmentResult<Self> {
        require(eq, "ready to fetch", "transport vehicle", is_vehicle)?;
        Ok(Self::begin(eq, job, "CARRY").ready_phase(job, from, delays, rng))
    }

    /// Full transit: ready-to-fetch phase, then the clamped carry duration.
    pub fn carry(
        eq:       &Equipment,
        job:      Job<'_>,
        raw_secs: f64,
        from:     Option<&EquipmentId>,
        delays:   &HandshakeDelays,
        rng:      &mut SimRng,
    ) -> EquipmentResult<Self> {
        require(eq, "carry", "transport vehicle", is_vehicle)?;
        let c = job.container;
        Ok(Self::begin(eq, job, "CARRY")
            .stamp(OpKind::Carry, StampPoint::Dispatch)
            .ready_phase(job, from, delays, rng)
            .status(EquipmentStatus::Moving, format!("CARRY {c} underway"))
            .delay(eq.clamp(raw_secs))
            .status(EquipmentStatus::Waiting, format!("CARRY {c} arrived")))
    }

    /// Vehicle positions under the destination crane.
    pub fn ready_to_put(
        eq:     &Equipment,
        job:    Job<'_>,
        to:     Option<&EquipmentId>,
        delays: &HandshakeDelays,
        rng:    &mut SimRng,
    ) -> EquipmentResult<Self> {
        require(eq, "ready to put", "transport vehicle", is_vehicle)?;
        let target = to.map_or(UNKNOWN_COUNTERPART, EquipmentId::as_str);
        Ok(Self::begin(eq, job, "CARRY")
            .delay(delays.vehicle_ready_to_put.sample(rng))
            .status(EquipmentStatus::Waiting, format!("CARRY ready to put {} to {target}", job.container)))
    }

    /// Vehicle is released by the destination crane and goes idle.
    pub fn release_from(
        eq:     &Equipment,
        job:    Job<'_>,
        target: Option<&Equipment>,
        delays: &HandshakeDelays,
        rng:    &mut SimRng,
    ) -> EquipmentResult<Self> {
        require(eq, "release", "transport vehicle", is_vehicle)?;
        let range = match target.map(Equipment::class) {
            Some(EquipmentClass::QuayCrane) => delays.vehicle_release_from_quay_crane,
            _ => delays.vehicle_release_from_yard_crane,
        };
        let name = target.map_or(UNKNOWN_COUNTERPART, |t| t.id.as_str());
        Ok(Self::begin(eq, job, "CARRY")
            .delay(range.sample(rng))
            .status(EquipmentStatus::Idle, format!("CARRY {} released from {name}", job.container))
            .stamp(OpKind::Carry, StampPoint::Complete))
    }

    fn ready_phase(
        self,
        job:    Job<'_>,
        from:   Option<&EquipmentId>,
        delays: &HandshakeDelays,
        rng:    &mut SimRng,
    ) -> Self {
        let source = from.map_or(UNKNOWN_COUNTERPART, EquipmentId::as_str);
        let positioning = delays.vehicle_ready_to_fetch.sample(rng);
        let settle = delays.vehicle_fetch_settle.sample(rng);
        self.delay(positioning)
            .status(EquipmentStatus::Moving, format!("CARRY ready to fetch {} from {source}", job.container))
            .delay(settle)
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn equipment(&self) -> &EquipmentId {
        &self.equipment
    }

    pub fn wi(&self) -> Option<WiId> {
        self.wi
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Remaining steps.
    pub fn steps(&self) -> impl Iterator<Item = &OpStep> {
        self.steps.iter()
    }

    /// Sum of the remaining delays, in seconds.
    pub fn total_delay(&self) -> f64 {
        self.steps
            .iter()
            .map(|s| if let OpStep::Delay(d) = s { *d } else { 0.0 })
            .sum()
    }

    pub fn is_finished(&self) -> bool {
        self.steps.is_empty()
    }

    fn error(&self, err: impl std::fmt::Display) -> ProcessError {
        ProcessError::new(format!("{}:{}", self.label, self.equipment), err.to_string())
    }

    // ── Execution ─────────────────────────────────────────────────────────

    /// Run steps until the next delay or the end of the script.
    pub fn advance<W: EquipmentWorld, P>(&mut self, kernel: &mut Kernel<W, P>, world: &mut W) -> OpProgress {
        while let Some(step) = self.steps.pop_front() {
            let now = kernel.now();
            match step {
                OpStep::Status(to, text) => {
                    if let Err(e) = world.transition(now, self.wi, &self.equipment, to, &text) {
                        self.steps.clear();
                        return OpProgress::Failed(self.error(e));
                    }
                }
                OpStep::Stamp(op, point) => {
                    if let Err(e) = world.stamp(now, &self.equipment, op, point) {
                        self.steps.clear();
                        return OpProgress::Failed(self.error(e));
                    }
                }
                OpStep::Delay(secs) => match kernel.timeout(secs) {
                    Ok(ev) => return OpProgress::Wait(ev),
                    Err(e) => {
                        self.steps.clear();
                        return OpProgress::Failed(self.error(e));
                    }
                },
            }
        }
        OpProgress::Finished
    }
}

fn is_vehicle(class: EquipmentClass) -> bool {
    class == EquipmentClass::TransportVehicle
}

fn require(
    eq:        &Equipment,
    operation: &'static str,
    expected:  &'static str,
    allowed:   fn(EquipmentClass) -> bool,
) -> EquipmentResult<()> {
    if allowed(eq.class()) {
        Ok(())
    } else {
        Err(EquipmentError::WrongKind { id: eq.id.clone(), operation, expected, actual: eq.class() })
    }
}

// ── OperationProcess ──────────────────────────────────────────────────────────

/// Runs an [`Operation`] as a stand-alone process.  Its completion event
/// fires when the script ends and fails if a step fails.
pub struct OperationProcess {
    name: String,
    op:   Operation,
}

impl OperationProcess {
    pub fn new(op: Operation) -> Self {
        let name = format!("{}:{}", op.label, op.equipment);
        Self { name, op }
    }
}

impl<W: EquipmentWorld, P> Process<W, P> for OperationProcess {
    fn name(&self) -> &str {
        &self.name
    }

    fn resume(&mut self, kernel: &mut Kernel<W, P>, world: &mut W, wake: Wake) -> Step {
        if let Wake::Failed(_, err) = wake {
            return Step::Fail(err);
        }
        match self.op.advance(kernel, world) {
            OpProgress::Wait(ev) => Step::Wait(ev),
            OpProgress::Finished => Step::Done,
            OpProgress::Failed(err) => Step::Fail(err),
        }
    }
}
