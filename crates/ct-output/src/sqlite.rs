//! SQLite output backend (feature `sqlite`).
//!
//! Creates a single `output.db` file in the configured output directory with
//! three tables: `moves`, `equipment_events` and `equipment_configs`.
//! Missing values are stored as `NULL`.

use std::path::Path;

use rusqlite::{Connection, params};

use ct_terminal::{EquipmentConfigRecord, EquipmentEventRecord, MoveRecord};

use crate::{OutputError, OutputResult};
use crate::row::{ZONE_SEPARATOR, che};
use crate::writer::OutputWriter;

const DB_FILE: &str = "output.db";

/// Writes the run journal to an SQLite database.
pub struct SqliteWriter {
    conn:     Connection,
    finished: bool,
}

impl SqliteWriter {
    /// Open (or create) `output.db` in `dir` and initialise the schema.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        std::fs::create_dir_all(dir).map_err(|source| OutputError::CreateDir { dir: dir.to_path_buf(), source })?;
        let conn = Connection::open(dir.join(DB_FILE)).map_err(OutputError::sqlite(DB_FILE))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             CREATE TABLE IF NOT EXISTS moves (
                 pow_id         TEXT    NOT NULL,
                 line_op        TEXT    NOT NULL,
                 carrier_visit  TEXT    NOT NULL,
                 wi_id          INTEGER NOT NULL,
                 move_id        TEXT    NOT NULL,
                 container_id   TEXT    NOT NULL,
                 category       TEXT    NOT NULL,
                 freight_kind   TEXT    NOT NULL,
                 carrier_id     TEXT    NOT NULL,
                 move_kind      TEXT    NOT NULL,
                 move_stage     TEXT    NOT NULL,
                 che_id         TEXT,
                 fm_che         TEXT,
                 to_che         TEXT,
                 fm_block_ref   TEXT    NOT NULL,
                 fm_block_class TEXT,
                 fm_position    TEXT    NOT NULL,
                 to_block_ref   TEXT    NOT NULL,
                 to_block_class TEXT,
                 to_position    TEXT    NOT NULL,
                 dispatch_secs  REAL,
                 end_secs       REAL,
                 duration_secs  REAL,
                 logged_at_secs REAL    NOT NULL
             );
             CREATE TABLE IF NOT EXISTS equipment_events (
                 sim_secs      REAL    NOT NULL,
                 unix_secs     INTEGER NOT NULL,
                 pow_id        TEXT,
                 wi_id         INTEGER,
                 che_id        TEXT    NOT NULL,
                 status        TEXT    NOT NULL,
                 move_kind     TEXT,
                 move_stage    TEXT,
                 description   TEXT    NOT NULL,
                 last_position TEXT
             );
             CREATE TABLE IF NOT EXISTS equipment_configs (
                 che_id    TEXT PRIMARY KEY,
                 type_code TEXT NOT NULL,
                 min_secs  REAL NOT NULL,
                 max_secs  REAL NOT NULL,
                 yard_zone TEXT NOT NULL,
                 pool_id   TEXT
             );",
        )
        .map_err(OutputError::sqlite(DB_FILE))?;

        Ok(Self { conn, finished: false })
    }
}

impl OutputWriter for SqliteWriter {
    fn write_moves(&mut self, rows: &[MoveRecord]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let err = || OutputError::sqlite("moves");
        let tx = self.conn.unchecked_transaction().map_err(err())?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO moves VALUES \
                 (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, \
                  ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24)",
            )
            .map_err(err())?;
            for row in rows {
                stmt.execute(params![
                    row.pow_id,
                    row.line_op,
                    row.carrier_visit,
                    row.wi_id,
                    row.move_id,
                    row.container_id,
                    row.category,
                    row.freight_kind,
                    row.carrier_id,
                    row.move_kind.code(),
                    row.stage.as_str(),
                    che(row.che_id.as_ref()),
                    che(row.fm_che.as_ref()),
                    che(row.to_che.as_ref()),
                    row.fm_block_ref,
                    row.fm_block_class,
                    row.fm_position,
                    row.to_block_ref,
                    row.to_block_class,
                    row.to_position,
                    row.dispatch_secs,
                    row.end_secs,
                    row.duration_secs,
                    row.logged_at_secs,
                ])
                .map_err(err())?;
            }
        }
        tx.commit().map_err(err())?;
        Ok(())
    }

    fn write_equipment_events(&mut self, rows: &[EquipmentEventRecord]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let err = || OutputError::sqlite("equipment_events");
        let tx = self.conn.unchecked_transaction().map_err(err())?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO equipment_events VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )
            .map_err(err())?;
            for row in rows {
                stmt.execute(params![
                    row.sim_secs,
                    row.unix_secs,
                    row.pow_id,
                    row.wi_id,
                    row.che_id.as_str(),
                    row.status.as_str(),
                    row.move_kind.map(|k| k.code()),
                    row.move_stage.map(|s| s.as_str()),
                    row.description,
                    row.last_position,
                ])
                .map_err(err())?;
            }
        }
        tx.commit().map_err(err())?;
        Ok(())
    }

    fn write_equipment_configs(&mut self, rows: &[EquipmentConfigRecord]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let err = || OutputError::sqlite("equipment_configs");
        let tx = self.conn.unchecked_transaction().map_err(err())?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT OR REPLACE INTO equipment_configs VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .map_err(err())?;
            for row in rows {
                stmt.execute(params![
                    row.che_id.as_str(),
                    row.type_code,
                    row.min_secs,
                    row.max_secs,
                    row.yard_zone.join(ZONE_SEPARATOR),
                    row.pool_id,
                ])
                .map_err(err())?;
            }
        }
        tx.commit().map_err(err())?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);").map_err(OutputError::sqlite(DB_FILE))?;
        Ok(())
    }
}
