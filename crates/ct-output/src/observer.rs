//! `JournalOutputObserver<W>` — bridges `TerminalObserver` to an
//! `OutputWriter`.

use tracing::{debug, warn};

use ct_terminal::{EquipmentConfigRecord, EquipmentEventRecord, MoveRecord, TerminalObserver, TerminalReport};

use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// A [`TerminalObserver`] that writes the run journal to any
/// [`OutputWriter`] backend.
///
/// Errors from the writer are stored internally because observer methods
/// have no return value.  After `terminal.run()` returns, check with
/// [`take_error`][Self::take_error].  The writer is finished in
/// `on_run_end`.
pub struct JournalOutputObserver<W: OutputWriter> {
    writer:     W,
    last_error: Option<OutputError>,
}

impl<W: OutputWriter> JournalOutputObserver<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, last_error: None }
    }

    /// Take the stored write error, if any.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Unwrap the inner writer.
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            warn!(error = %e, "journal write failed");
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: OutputWriter> TerminalObserver for JournalOutputObserver<W> {
    fn on_equipment_configs(&mut self, configs: &[EquipmentConfigRecord]) {
        let result = self.writer.write_equipment_configs(configs);
        self.store_err(result);
    }

    fn on_moves(&mut self, moves: &[MoveRecord]) {
        let result = self.writer.write_moves(moves);
        self.store_err(result);
    }

    fn on_equipment_events(&mut self, events: &[EquipmentEventRecord]) {
        let result = self.writer.write_equipment_events(events);
        self.store_err(result);
    }

    fn on_run_end(&mut self, report: &TerminalReport) {
        debug!(final_secs = report.final_secs, completed = report.completed.len(), "finishing journal output");
        let result = self.writer.finish();
        self.store_err(result);
    }
}
