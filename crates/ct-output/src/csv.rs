//! CSV output backend.
//!
//! Creates three files in the configured output directory:
//! - `moves.csv`
//! - `equipment_events.csv`
//! - `equipment_configs.csv`
//!
//! Missing values are written as empty cells.

use std::fs::File;
use std::path::Path;

use csv::Writer;
use ct_terminal::{EquipmentConfigRecord, EquipmentEventRecord, MoveRecord};

use crate::{OutputError, OutputResult};
use crate::row::{CONFIG_COLUMNS, EVENT_COLUMNS, MOVE_COLUMNS, ZONE_SEPARATOR, cell, che};
use crate::writer::OutputWriter;

const MOVES_FILE: &str = "moves.csv";
const EVENTS_FILE: &str = "equipment_events.csv";
const CONFIGS_FILE: &str = "equipment_configs.csv";

fn open(dir: &Path, file: &'static str, header: &[&str]) -> OutputResult<Writer<File>> {
    let mut writer = Writer::from_path(dir.join(file)).map_err(OutputError::csv(file))?;
    writer.write_record(header).map_err(OutputError::csv(file))?;
    Ok(writer)
}

/// Writes the run journal to three CSV files.
pub struct CsvWriter {
    moves:    Writer<File>,
    events:   Writer<File>,
    configs:  Writer<File>,
    finished: bool,
}

impl CsvWriter {
    /// Create the three CSV files in `dir` (creating `dir` if needed) and
    /// write the header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        std::fs::create_dir_all(dir).map_err(|source| OutputError::CreateDir { dir: dir.to_path_buf(), source })?;
        let moves = open(dir, MOVES_FILE, &MOVE_COLUMNS)?;
        let events = open(dir, EVENTS_FILE, &EVENT_COLUMNS)?;
        let configs = open(dir, CONFIGS_FILE, &CONFIG_COLUMNS)?;
        Ok(Self { moves, events, configs, finished: false })
    }
}

impl OutputWriter for CsvWriter {
    fn write_moves(&mut self, rows: &[MoveRecord]) -> OutputResult<()> {
        for row in rows {
            self.moves.write_record(&[
                row.pow_id.clone(),
                row.line_op.clone(),
                row.carrier_visit.clone(),
                row.wi_id.to_string(),
                row.move_id.clone(),
                row.container_id.clone(),
                row.category.clone(),
                row.freight_kind.clone(),
                row.carrier_id.clone(),
                row.move_kind.code().to_owned(),
                row.stage.as_str().to_owned(),
                cell(che(row.che_id.as_ref())),
                cell(che(row.fm_che.as_ref())),
                cell(che(row.to_che.as_ref())),
                row.fm_block_ref.to_owned(),
                cell(row.fm_block_class),
                row.fm_position.clone(),
                row.to_block_ref.to_owned(),
                cell(row.to_block_class),
                row.to_position.clone(),
                cell(row.dispatch_secs),
                cell(row.end_secs),
                cell(row.duration_secs),
                row.logged_at_secs.to_string(),
            ]).map_err(OutputError::csv(MOVES_FILE))?;
        }
        Ok(())
    }

    fn write_equipment_events(&mut self, rows: &[EquipmentEventRecord]) -> OutputResult<()> {
        for row in rows {
            self.events.write_record(&[
                row.sim_secs.to_string(),
                row.unix_secs.to_string(),
                cell(row.pow_id.as_deref()),
                cell(row.wi_id),
                row.che_id.to_string(),
                row.status.as_str().to_owned(),
                cell(row.move_kind.map(|k| k.code())),
                cell(row.move_stage.map(|s| s.as_str())),
                row.description.clone(),
                cell(row.last_position.as_deref()),
            ]).map_err(OutputError::csv(EVENTS_FILE))?;
        }
        Ok(())
    }

    fn write_equipment_configs(&mut self, rows: &[EquipmentConfigRecord]) -> OutputResult<()> {
        for row in rows {
            self.configs.write_record(&[
                row.che_id.to_string(),
                row.type_code.to_owned(),
                row.min_secs.to_string(),
                row.max_secs.to_string(),
                row.yard_zone.join(ZONE_SEPARATOR),
                cell(row.pool_id.as_deref()),
            ]).map_err(OutputError::csv(CONFIGS_FILE))?;
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.moves.flush().map_err(OutputError::flush(MOVES_FILE))?;
        self.events.flush().map_err(OutputError::flush(EVENTS_FILE))?;
        self.configs.flush().map_err(OutputError::flush(CONFIGS_FILE))?;
        Ok(())
    }
}
