//! `Terminal`: owns the kernel and the world, runs them, and reports.

use ct_core::{Tick, WiId};
use ct_kernel::{ProcessError, ProcessHandle, ProcessStatus};
use tracing::{error, info};

use crate::script::TerminalKernel;
use crate::state::PowResult;
use crate::{TerminalError, TerminalObserver, TerminalResult, TerminalState};

// ── Report ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub enum VesselOutcome {
    Completed,
    Failed(ProcessError),
    /// Still berthed when the run stopped.
    Unfinished,
    /// Not arrived before the horizon.
    NotArrived,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VesselReport {
    pub vessel_id: String,
    pub outcome:   VesselOutcome,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PowOutcome {
    Worked { moves: usize, skipped: usize },
    StoodDown,
    Failed(ProcessError),
    Unfinished,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PowReport {
    pub vessel_id: String,
    pub pow:       String,
    pub outcome:   PowOutcome,
}

/// Returned by [`Terminal::run`] and passed to
/// [`TerminalObserver::on_run_end`].
#[derive(Clone, Debug, PartialEq)]
pub struct TerminalReport {
    pub final_tick:     Tick,
    pub final_secs:     f64,
    /// In arrival order, then the vessels that never arrived.
    pub vessels:        Vec<VesselReport>,
    /// In spawn order.
    pub pows:           Vec<PowReport>,
    /// In completion order.
    pub completed:      Vec<WiId>,
    pub skipped:        Vec<WiId>,
    /// Processes still pending or suspended when the run stopped.
    pub live_processes: usize,
}

impl TerminalReport {
    /// The first failed vessel and its failure.
    pub fn first_failure(&self) -> Option<(&str, &ProcessError)> {
        self.vessels.iter().find_map(|v| match &v.outcome {
            VesselOutcome::Failed(err) => Some((v.vessel_id.as_str(), err)),
            _ => None,
        })
    }

    pub fn pow(&self, vessel_id: &str, pow: &str) -> Option<&PowOutcome> {
        self.pows
            .iter()
            .find(|p| p.vessel_id == vessel_id && p.pow == pow)
            .map(|p| &p.outcome)
    }

    pub fn vessel(&self, vessel_id: &str) -> Option<&VesselOutcome> {
        self.vessels.iter().find(|v| v.vessel_id == vessel_id).map(|v| &v.outcome)
    }
}

// ── Terminal ──────────────────────────────────────────────────────────────────

/// A built terminal, ready to run.  Construct with
/// [`TerminalBuilder`][crate::TerminalBuilder].
pub struct Terminal {
    kernel:     TerminalKernel,
    state:      TerminalState,
    until:      Option<Tick>,
    vessel_ids: Vec<String>,
    report:     Option<TerminalReport>,
}

impl Terminal {
    pub(crate) fn new(
        kernel:     TerminalKernel,
        state:      TerminalState,
        until:      Option<Tick>,
        vessel_ids: Vec<String>,
    ) -> Self {
        Self { kernel, state, until, vessel_ids, report: None }
    }

    /// Run until the horizon or until nothing is left to do.
    ///
    /// The journal recorded since the previous call is flushed to
    /// `observer` before any error is returned.  Fails with the kernel's
    /// error if a failure reached the top of the process tree, otherwise
    /// with [`TerminalError::VesselFailed`] for the first failed vessel.
    pub fn run<O: TerminalObserver>(&mut self, observer: &mut O) -> TerminalResult<TerminalReport> {
        info!(
            vessels = self.vessel_ids.len(),
            until = ?self.until.map(|t| t.0),
            "terminal run"
        );
        let outcome = self.kernel.run(&mut self.state, self.until, &mut ct_kernel::NoopObserver);

        let journal = self.state.journal.take();
        observer.on_equipment_configs(&journal.configs);
        observer.on_moves(&journal.moves);
        observer.on_equipment_events(&journal.events);

        let report = self.build_report();
        info!(
            tick = report.final_tick.0,
            completed = report.completed.len(),
            skipped = report.skipped.len(),
            live = report.live_processes,
            "terminal run finished"
        );
        observer.on_run_end(&report);
        self.report = Some(report.clone());

        if let Err(e) = outcome {
            error!(error = %e, "terminal run aborted");
            return Err(e.into());
        }
        if let Some((vessel, err)) = report.first_failure() {
            return Err(TerminalError::VesselFailed { vessel: vessel.to_owned(), error: err.clone() });
        }
        Ok(report)
    }

    fn build_report(&self) -> TerminalReport {
        let outcomes = &self.state.outcomes;

        let mut vessels: Vec<VesselReport> = outcomes
            .vessels
            .iter()
            .map(|v| {
                let outcome = match self.finished(v.handle) {
                    Some(Ok(())) => VesselOutcome::Completed,
                    Some(Err(err)) => VesselOutcome::Failed(err),
                    None => VesselOutcome::Unfinished,
                };
                VesselReport { vessel_id: v.vessel_id.clone(), outcome }
            })
            .collect();
        for id in &self.vessel_ids {
            if !vessels.iter().any(|v| &v.vessel_id == id) {
                vessels.push(VesselReport { vessel_id: id.clone(), outcome: VesselOutcome::NotArrived });
            }
        }

        let pows = outcomes
            .pows
            .iter()
            .map(|p| {
                let outcome = match (self.finished(p.handle), &p.result) {
                    (Some(Err(err)), _) => PowOutcome::Failed(err),
                    (Some(Ok(())), Some(PowResult::Worked { moves, skipped })) => {
                        PowOutcome::Worked { moves: *moves, skipped: *skipped }
                    }
                    (Some(Ok(())), Some(PowResult::StoodDown)) => PowOutcome::StoodDown,
                    _ => PowOutcome::Unfinished,
                };
                PowReport { vessel_id: p.vessel_id.clone(), pow: p.pow.clone(), outcome }
            })
            .collect();

        TerminalReport {
            final_tick: self.kernel.now(),
            final_secs: self.kernel.now_secs(),
            vessels,
            pows,
            completed: outcomes.completed.clone(),
            skipped: outcomes.skipped.clone(),
            live_processes: self.kernel.live_processes(),
        }
    }

    /// `None` while the process is live.
    fn finished(&self, handle: Option<ProcessHandle>) -> Option<Result<(), ProcessError>> {
        let handle = handle?;
        match self.kernel.process_status(handle.pid)? {
            ProcessStatus::Completed => Some(Ok(())),
            ProcessStatus::Failed => Some(Err(self
                .kernel
                .failure(handle.done)
                .cloned()
                .unwrap_or_else(|| ProcessError::new("unknown", "failed without a failure value")))),
            _ => None,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn state(&self) -> &TerminalState {
        &self.state
    }

    pub fn kernel(&self) -> &TerminalKernel {
        &self.kernel
    }

    /// Report of the most recent run.
    pub fn report(&self) -> Option<&TerminalReport> {
        self.report.as_ref()
    }
}
