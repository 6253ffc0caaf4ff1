//! The `Process` trait — the unit of concurrent behaviour.

use std::fmt;

use ct_core::{EventId, ProcessId};

use crate::Kernel;

// ── ProcessError ──────────────────────────────────────────────────────────────

/// Failure value carried by a failed event.
///
/// Cloned to every waiter, so it stays a plain name + message pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessError {
    pub process: String,
    pub reason:  String,
}

impl ProcessError {
    pub fn new(process: impl Into<String>, reason: impl Into<String>) -> Self {
        Self { process: process.into(), reason: reason.into() }
    }
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.process, self.reason)
    }
}

impl std::error::Error for ProcessError {}

// ── Wake / Step ───────────────────────────────────────────────────────────────

/// Why a process is being resumed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Wake {
    /// First activation after `spawn`.
    Start,
    /// The awaited event fired successfully.
    Fired(EventId),
    /// The awaited event failed, or a failure nobody else handled was
    /// delivered to this process as an interrupt.
    Failed(EventId, ProcessError),
}

/// What a process wants to do next.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// Suspend until the event is processed.  An event that was already
    /// processed resumes the process immediately, at the same instant.
    Wait(EventId),
    /// Finish successfully.
    Done,
    /// Finish with a failure.
    Fail(ProcessError),
}

/// Life-cycle state of a spawned process.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ProcessStatus {
    /// Spawned, start event not processed yet.
    Pending,
    /// Suspended on an event.
    Waiting,
    Running,
    Completed,
    Failed,
}

impl ProcessStatus {
    /// Pending or waiting processes can still be resumed.
    #[inline]
    pub fn is_live(self) -> bool {
        matches!(self, ProcessStatus::Pending | ProcessStatus::Waiting)
    }
}

/// Returned by [`Kernel::spawn`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ProcessHandle {
    pub pid:  ProcessId,
    /// Fires when the process finishes.  Usable in `any_of` / `all_of`.
    pub done: EventId,
}

// ── Process ───────────────────────────────────────────────────────────────────

/// A cooperative state machine driven by the kernel.
///
/// `resume` is called once with [`Wake::Start`] and then once per awaited
/// event.  Each call returns the next [`Step`].  Implementations keep their
/// own program counter (usually an enum of stages) and borrow the world only
/// for the duration of one call.
pub trait Process<W, P = ()>: 'static {
    /// Short name used in logs and failure values.
    fn name(&self) -> &str;

    fn resume(&mut self, kernel: &mut Kernel<W, P>, world: &mut W, wake: Wake) -> Step;
}

// ── FnProcess ─────────────────────────────────────────────────────────────────

/// A process backed by a closure.  Handy for glue code and tests.
pub struct FnProcess<F> {
    name: String,
    f:    F,
}

/// Wrap a closure as a [`Process`].
pub fn from_fn<W, P, F>(name: impl Into<String>, f: F) -> FnProcess<F>
where
    F: FnMut(&mut Kernel<W, P>, &mut W, Wake) -> Step + 'static,
{
    FnProcess { name: name.into(), f }
}

impl<W, P, F> Process<W, P> for FnProcess<F>
where
    F: FnMut(&mut Kernel<W, P>, &mut W, Wake) -> Step + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn resume(&mut self, kernel: &mut Kernel<W, P>, world: &mut W, wake: Wake) -> Step {
        (self.f)(kernel, world, wake)
    }
}
