//! The `OutputWriter` trait implemented by all backend writers.

use ct_terminal::{EquipmentConfigRecord, EquipmentEventRecord, MoveRecord};

use crate::OutputResult;

/// Trait implemented by the CSV and SQLite writers.
///
/// Observer callbacks cannot fail, so [`JournalOutputObserver`] keeps the
/// first error for [`take_error`].
///
/// [`JournalOutputObserver`]: crate::JournalOutputObserver
/// [`take_error`]: crate::JournalOutputObserver::take_error
pub trait OutputWriter {
    fn write_moves(&mut self, rows: &[MoveRecord]) -> OutputResult<()>;

    fn write_equipment_events(&mut self, rows: &[EquipmentEventRecord]) -> OutputResult<()>;

    fn write_equipment_configs(&mut self, rows: &[EquipmentConfigRecord]) -> OutputResult<()>;

    /// Flush and close all underlying handles.
    ///
    /// Idempotent.
    fn finish(&mut self) -> OutputResult<()>;
}
