//! Terminal observer trait for journal flushing and run reporting.

use crate::TerminalReport;
use crate::journal::{EquipmentConfigRecord, EquipmentEventRecord, MoveRecord};

/// Callbacks invoked by [`Terminal::run`][crate::Terminal::run] after the
/// kernel stops.
///
/// The journal is flushed exactly once per run, configs first, whether the
/// run succeeded or failed.  All methods have default no-op implementations.
///
/// # Example — move counter
///
/// ```rust,ignore
/// struct Counter(usize);
///
/// impl TerminalObserver for Counter {
///     fn on_moves(&mut self, moves: &[MoveRecord]) {
///         self.0 += moves.len();
///     }
/// }
/// ```
pub trait TerminalObserver {
    fn on_equipment_configs(&mut self, _configs: &[EquipmentConfigRecord]) {}

    fn on_moves(&mut self, _moves: &[MoveRecord]) {}

    fn on_equipment_events(&mut self, _events: &[EquipmentEventRecord]) {}

    /// Called last, with the outcome of every vessel and point of work.
    fn on_run_end(&mut self, _report: &TerminalReport) {}
}

/// A [`TerminalObserver`] that does nothing.
pub struct NoopObserver;

impl TerminalObserver for NoopObserver {}
