//! Vessel arrivals, berthing and points of work.
//!
//! Every point of work races its quay crane request against the vessel's
//! `unload_done` event.  The first point of work to finish its list fires
//! `unload_done`; a point of work that sees it fired when it wakes stands
//! down.  There is no cancellation: a losing request is drained, i.e.
//! waited for, collected and returned straight to the pool.

use std::collections::VecDeque;

use ct_core::{EquipmentId, EventId, WiId};
use ct_equipment::{EquipmentHandle, EquipmentStatus, EquipmentWorld};
use ct_kernel::{ProcessError, Step};
use tracing::{debug, info, warn};

use crate::orchestrator::{FetchStage, MoveCtx, MoveEvents};
use crate::script::{Flow, Script, ScriptProcess, TerminalKernel, failure};
use crate::state::{PowResult, PowRun, VesselRun};
use crate::{TerminalState, WiStage};

// ── Plans ─────────────────────────────────────────────────────────────────────

/// A point of work as the coordinator sees it: instruction ids only, the
/// instructions themselves live in [`TerminalState::work`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PowPlan {
    pub name: String,
    pub work: Vec<WiId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VesselPlan {
    pub id:         String,
    pub carrier_id: String,
    pub pows:       Vec<PowPlan>,
}

// ── Point of work ─────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum PowPc {
    Acquire,
    Settle,
    Decide,
    Drain,
    NextWi,
    AwaitMoves,
    Release,
}

pub struct PowStage {
    name:        String,
    vessel:      String,
    carrier_id:  String,
    pow:         String,
    crane:       EquipmentId,
    /// Sorted descending; popped from the back.
    queue:       Vec<WiId>,
    unload_done: EventId,
    /// Index into [`Outcomes::pows`][crate::state::Outcomes].
    slot:        usize,
    pc:          PowPc,
    request:     Option<EventId>,
    held:        Option<EquipmentHandle>,
    moves:       Vec<EventId>,
    skipped:     usize,
}

impl PowStage {
    pub fn new(vessel: &VesselPlan, plan: &PowPlan, unload_done: EventId, slot: usize) -> Self {
        let mut queue = plan.work.clone();
        queue.sort_unstable_by(|a, b| b.cmp(a));
        Self {
            name: format!("pow:{}:{}", vessel.id, plan.name),
            vessel: vessel.id.clone(),
            carrier_id: vessel.carrier_id.clone(),
            pow: plan.name.clone(),
            crane: EquipmentId::new(plan.name.as_str()),
            queue,
            unload_done,
            slot,
            pc: PowPc::Acquire,
            request: None,
            held: None,
            moves: Vec::new(),
            skipped: 0,
        }
    }

    fn err(&self, e: impl std::fmt::Display) -> ProcessError {
        failure(&self.name, e)
    }

    fn record(&self, w: &mut TerminalState, result: PowResult) {
        if let Some(run) = w.outcomes.pows.get_mut(self.slot) {
            run.result = Some(result);
        }
    }

    /// Start the next instruction, or move on once the list is empty.
    fn next_wi(&mut self, k: &mut TerminalKernel, w: &mut TerminalState) -> Result<Flow, ProcessError> {
        let Some(wi) = self.queue.pop() else {
            self.pc = PowPc::AwaitMoves;
            return Ok(Flow::Next);
        };
        let Some(instruction) = w.work.get(&wi) else {
            return Err(self.err(format!("unknown work instruction {}", wi.0)));
        };

        if !instruction.move_kind.is_orchestrated() {
            warn!(
                tick = k.now().0,
                vessel = %self.vessel,
                pow = %self.pow,
                wi = wi.0,
                kind = %instruction.move_kind,
                "move kind not dispatched, skipping"
            );
            w.set_stage(wi, WiStage::Skipped);
            w.outcomes.skipped.push(wi);
            self.skipped += 1;
            return Ok(Flow::Next);
        }

        let events = MoveEvents::new(k).map_err(|e| self.err(e))?;
        let ctx = MoveCtx {
            vessel: self.vessel.clone(),
            carrier_id: self.carrier_id.clone(),
            pow: self.pow.clone(),
            quay_crane: self.crane.clone(),
            wi,
            kind: instruction.move_kind,
            container: instruction.container.id.clone(),
            fm_block: instruction.from.block.clone(),
            to_block: instruction.to.block.clone(),
            events,
        };
        debug!(tick = k.now().0, pow = %self.pow, wi = wi.0, kind = %ctx.kind, "dispatch");

        let fetch = k.spawn(ScriptProcess::new(FetchStage::new(ctx)));
        k.defuse(fetch.done).map_err(|e| self.err(e))?;
        self.moves.push(events.move_done);

        // The crane is free for the next box once this one is on a vehicle.
        let ready = k.all_of(&[fetch.done, events.fetch_completed]).map_err(|e| self.err(e))?;
        Ok(Flow::Wait(ready))
    }
}

impl Script for PowStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn advance(&mut self, k: &mut TerminalKernel, w: &mut TerminalState) -> Result<Flow, ProcessError> {
        match self.pc {
            PowPc::Acquire => {
                let wanted = self.crane.clone();
                let req = w
                    .pools
                    .quay_cranes
                    .get_filtered(k, move |h: &EquipmentHandle| h.id() == &wanted)
                    .map_err(|e| self.err(e))?;
                self.request = Some(req);
                let race = k.any_of(&[req, self.unload_done]).map_err(|e| self.err(e))?;
                self.pc = PowPc::Settle;
                Ok(Flow::Wait(race))
            }
            PowPc::Settle => {
                let secs = w.config.orchestration.pow_settle.sample(&mut w.rng);
                let ev = k.timeout(secs).map_err(|e| self.err(e))?;
                self.pc = PowPc::Decide;
                Ok(Flow::Wait(ev))
            }
            PowPc::Decide => {
                let req = self.request.ok_or_else(|| self.err("no crane request"))?;
                if k.is_triggered(self.unload_done) {
                    info!(tick = k.now().0, vessel = %self.vessel, pow = %self.pow, "vessel done, point of work stands down");
                    self.pc = PowPc::Drain;
                    return Ok(if w.pools.quay_cranes.is_granted(req) { Flow::Next } else { Flow::Wait(req) });
                }
                let crane = w
                    .pools
                    .quay_cranes
                    .take(req)
                    .ok_or_else(|| self.err("crane request fired without a crane"))?;
                self.request = None;
                self.held = Some(crane);
                info!(tick = k.now().0, vessel = %self.vessel, pow = %self.pow, moves = self.queue.len(), "point of work started");
                self.pc = PowPc::NextWi;
                Ok(Flow::Next)
            }
            PowPc::Drain => {
                let req = self.request.take().ok_or_else(|| self.err("no crane request"))?;
                let crane = w
                    .pools
                    .quay_cranes
                    .take(req)
                    .ok_or_else(|| self.err("crane request fired without a crane"))?;
                w.pools.quay_cranes.put(k, crane).map_err(|e| self.err(e))?;
                self.record(w, PowResult::StoodDown);
                Ok(Flow::Done)
            }
            PowPc::NextWi => self.next_wi(k, w),
            PowPc::AwaitMoves => {
                let all = k.all_of(&self.moves).map_err(|e| self.err(e))?;
                self.pc = PowPc::Release;
                Ok(Flow::Wait(all))
            }
            PowPc::Release => {
                if k.try_trigger(self.unload_done, None) {
                    info!(tick = k.now().0, vessel = %self.vessel, pow = %self.pow, "unload done");
                }
                let idle = w.registry.get(&self.crane).is_some_and(|e| e.status == EquipmentStatus::Idle);
                if !idle {
                    w.transition(k.now(), None, &self.crane, EquipmentStatus::Idle, "RELEASED")
                        .map_err(|e| self.err(e))?;
                }
                let crane = self.held.take().ok_or_else(|| self.err("no crane held"))?;
                w.pools.quay_cranes.put(k, crane).map_err(|e| self.err(e))?;
                let result = PowResult::Worked { moves: self.moves.len(), skipped: self.skipped };
                info!(tick = k.now().0, vessel = %self.vessel, pow = %self.pow, ?result, "point of work finished");
                self.record(w, result);
                Ok(Flow::Done)
            }
        }
    }

    fn abort(&mut self, k: &mut TerminalKernel, w: &mut TerminalState, err: ProcessError) -> Step {
        let granted = self.request.take().and_then(|r| w.pools.quay_cranes.take(r));
        for crane in [self.held.take(), granted].into_iter().flatten() {
            if let Err(e) = w.pools.quay_cranes.put(k, crane) {
                warn!(pow = %self.pow, error = %e, "could not return quay crane");
            }
        }
        Step::Fail(err)
    }
}

// ── Vessel ────────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum VesselPc {
    Berth,
    Work,
    Finish,
}

pub struct VesselStage {
    name: String,
    plan: VesselPlan,
    pc:   VesselPc,
}

impl VesselStage {
    pub fn new(plan: VesselPlan) -> Self {
        Self { name: format!("vessel:{}", plan.id), plan, pc: VesselPc::Berth }
    }
}

impl Script for VesselStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn advance(&mut self, k: &mut TerminalKernel, w: &mut TerminalState) -> Result<Flow, ProcessError> {
        match self.pc {
            VesselPc::Berth => {
                let secs = w.config.orchestration.berth.sample(&mut w.rng);
                let ev = k.timeout(secs).map_err(|e| failure(&self.name, e))?;
                self.pc = VesselPc::Work;
                Ok(Flow::Wait(ev))
            }
            VesselPc::Work => {
                info!(tick = k.now().0, vessel = %self.plan.id, pows = self.plan.pows.len(), "vessel berthed");
                let unload_done = k.event();
                let mut done = Vec::with_capacity(self.plan.pows.len());
                for plan in &self.plan.pows {
                    let slot = w.outcomes.pows.len();
                    let handle = k.spawn(ScriptProcess::new(PowStage::new(&self.plan, plan, unload_done, slot)));
                    k.defuse(handle.done).map_err(|e| failure(&self.name, e))?;
                    w.outcomes.pows.push(PowRun {
                        vessel_id: self.plan.id.clone(),
                        pow:       plan.name.clone(),
                        handle:    Some(handle),
                        result:    None,
                    });
                    done.push(handle.done);
                }
                let all = k.all_of(&done).map_err(|e| failure(&self.name, e))?;
                self.pc = VesselPc::Finish;
                Ok(Flow::Wait(all))
            }
            VesselPc::Finish => {
                info!(tick = k.now().0, vessel = %self.plan.id, "vessel complete");
                Ok(Flow::Done)
            }
        }
    }

    fn abort(&mut self, _k: &mut TerminalKernel, _w: &mut TerminalState, err: ProcessError) -> Step {
        Step::Fail(err)
    }
}

// ── Arrivals ──────────────────────────────────────────────────────────────────

/// Gap before each vessel after the first.
#[derive(Clone, Debug, PartialEq)]
pub enum ArrivalGaps {
    /// Exponential with this mean, in seconds.
    Exponential(f64),
    /// Fixed gaps in seconds, one per vessel after the first.
    Fixed(VecDeque<f64>),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ArrivalPc {
    Next,
    Arrive,
}

/// Releases vessels onto the berth: the first at once, the rest after
/// their gaps.
pub struct ArrivalStage {
    queue:   VecDeque<VesselPlan>,
    gaps:    ArrivalGaps,
    arrived: usize,
    pc:      ArrivalPc,
}

impl ArrivalStage {
    pub fn new(vessels: Vec<VesselPlan>, gaps: ArrivalGaps) -> Self {
        Self { queue: vessels.into(), gaps, arrived: 0, pc: ArrivalPc::Next }
    }

    fn gap(&mut self, w: &mut TerminalState) -> Result<f64, ProcessError> {
        match &mut self.gaps {
            ArrivalGaps::Exponential(mean) => {
                w.rng.exponential(*mean).map_err(|e| failure("arrivals", e))
            }
            ArrivalGaps::Fixed(gaps) => gaps.pop_front().ok_or_else(|| failure("arrivals", "ran out of arrival gaps")),
        }
    }
}

impl Script for ArrivalStage {
    fn name(&self) -> &str {
        "arrivals"
    }

    fn advance(&mut self, k: &mut TerminalKernel, w: &mut TerminalState) -> Result<Flow, ProcessError> {
        match self.pc {
            ArrivalPc::Next => {
                if self.queue.is_empty() {
                    debug!(tick = k.now().0, vessels = self.arrived, "no more arrivals");
                    return Ok(Flow::Done);
                }
                self.pc = ArrivalPc::Arrive;
                if self.arrived == 0 {
                    return Ok(Flow::Next);
                }
                let secs = self.gap(w)?;
                let ev = k.timeout(secs).map_err(|e| failure("arrivals", e))?;
                Ok(Flow::Wait(ev))
            }
            ArrivalPc::Arrive => {
                let Some(plan) = self.queue.pop_front() else {
                    return Ok(Flow::Done);
                };
                info!(tick = k.now().0, vessel = %plan.id, carrier = %plan.carrier_id, "vessel arrived");
                let vessel_id = plan.id.clone();
                let handle = k.spawn(ScriptProcess::new(VesselStage::new(plan)));
                k.defuse(handle.done).map_err(|e| failure("arrivals", e))?;
                w.outcomes.vessels.push(VesselRun { vessel_id, handle: Some(handle) });
                self.arrived += 1;
                self.pc = ArrivalPc::Next;
                Ok(Flow::Next)
            }
        }
    }

    fn abort(&mut self, _k: &mut TerminalKernel, _w: &mut TerminalState, err: ProcessError) -> Step {
        Step::Fail(err)
    }
}
