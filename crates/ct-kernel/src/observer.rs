//! Kernel observer trait for tracing and data collection.

use ct_core::{EventId, Tick};

use crate::RunSummary;

/// Callbacks invoked by [`Kernel::run`][crate::Kernel::run].
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
pub trait KernelObserver {
    /// Called just before an event's waiters are notified.
    fn on_event(&mut self, _tick: Tick, _event: EventId) {}

    /// Called once when `run` returns successfully.
    fn on_run_end(&mut self, _summary: &RunSummary) {}
}

/// A [`KernelObserver`] that does nothing.
pub struct NoopObserver;

impl KernelObserver for NoopObserver {}
