//! Shared driver for the terminal's processes.
//!
//! Each process is written as a [`Script`]: a program counter plus an
//! `advance` method that performs one step and says what happens next.
//! [`ScriptProcess`] turns a script into a kernel [`Process`], running any
//! equipment [`Operation`] the script hands it inline so the step after an
//! operation's last status change happens in the same resumption.

use std::fmt;

use ct_core::EventId;
use ct_equipment::{OpProgress, Operation};
use ct_kernel::{Kernel, Process, ProcessError, Step, Wake};
use tracing::error;

use crate::{Handoff, TerminalState};

/// The kernel type every terminal process runs on.
pub type TerminalKernel = Kernel<TerminalState, Handoff>;

/// What a script wants after one step.
pub enum Flow {
    /// Run the next step right away.
    Next,
    /// Run an equipment operation to completion, then the next step.
    Run(Operation),
    /// Suspend until the event is processed.
    Wait(EventId),
    Done,
}

pub trait Script: 'static {
    fn name(&self) -> &str;

    fn advance(&mut self, kernel: &mut TerminalKernel, world: &mut TerminalState) -> Result<Flow, ProcessError>;

    /// Called once when a step, an operation or an awaited event fails.
    /// Returns held units and reports downstream; the returned step ends
    /// the process.
    fn abort(&mut self, kernel: &mut TerminalKernel, world: &mut TerminalState, err: ProcessError) -> Step;
}

pub struct ScriptProcess<S> {
    script:  S,
    running: Option<Operation>,
}

impl<S: Script> ScriptProcess<S> {
    pub fn new(script: S) -> Self {
        Self { script, running: None }
    }

    fn abort(&mut self, kernel: &mut TerminalKernel, world: &mut TerminalState, err: ProcessError) -> Step {
        self.running = None;
        error!(tick = kernel.now().0, process = self.script.name(), error = %err, "process aborted");
        self.script.abort(kernel, world, err)
    }
}

impl<S: Script> Process<TerminalState, Handoff> for ScriptProcess<S> {
    fn name(&self) -> &str {
        self.script.name()
    }

    fn resume(&mut self, kernel: &mut TerminalKernel, world: &mut TerminalState, wake: Wake) -> Step {
        if let Wake::Failed(_, err) = wake {
            return self.abort(kernel, world, err);
        }
        loop {
            if let Some(op) = &mut self.running {
                match op.advance(kernel, world) {
                    OpProgress::Wait(ev) => return Step::Wait(ev),
                    OpProgress::Finished => self.running = None,
                    OpProgress::Failed(err) => return self.abort(kernel, world, err),
                }
            }
            match self.script.advance(kernel, world) {
                Ok(Flow::Next) => {}
                Ok(Flow::Run(op)) => self.running = Some(op),
                Ok(Flow::Wait(ev)) => return Step::Wait(ev),
                Ok(Flow::Done) => return Step::Done,
                Err(err) => return self.abort(kernel, world, err),
            }
        }
    }
}

/// Wrap any error as a failure of process `name`.
pub fn failure(name: &str, err: impl fmt::Display) -> ProcessError {
    ProcessError::new(name, err.to_string())
}
