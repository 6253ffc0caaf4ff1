//! Unit tests for ct-output.

#[cfg(test)]
pub(crate) mod fixtures {
    use ct_core::EquipmentId;
    use ct_equipment::{EquipmentStatus, OpKind};
    use ct_terminal::{EquipmentConfigRecord, EquipmentEventRecord, MoveKind, MoveRecord};

    pub fn move_row(wi_id: u64, stage: OpKind) -> MoveRecord {
        MoveRecord {
            pow_id:         "QC01".into(),
            line_op:        "MSC".into(),
            carrier_visit:  "V001".into(),
            wi_id,
            move_id:        format!("{wi_id}F"),
            container_id:   "MSCU1234565".into(),
            category:       "IMPRT".into(),
            freight_kind:   "FCL".into(),
            carrier_id:     "V001".into(),
            move_kind:      MoveKind::Discharge,
            stage,
            che_id:         Some(EquipmentId::new("QC01")),
            fm_che:         Some(EquipmentId::new("QC01")),
            to_che:         Some(EquipmentId::new("TT001")),
            fm_block_ref:   "V",
            fm_block_class: Some("QC"),
            fm_position:    "V-V001-120482".into(),
            to_block_ref:   "Y",
            to_block_class: None,
            to_position:    "Y-UNKNOWN-A01".into(),
            dispatch_secs:  Some(6.0),
            end_secs:       Some(56.0),
            duration_secs:  Some(50.0),
            logged_at_secs: 56.0,
        }
    }

    pub fn event_row(che: &str) -> EquipmentEventRecord {
        EquipmentEventRecord {
            sim_secs:      6.0,
            unix_secs:     1_700_000_006,
            pow_id:        None,
            wi_id:         Some(1),
            che_id:        EquipmentId::new(che),
            status:        EquipmentStatus::Busy,
            move_kind:     Some(MoveKind::Discharge),
            move_stage:    Some(OpKind::Fetch),
            description:   "FETCH MSCU1234565".into(),
            last_position: None,
        }
    }

    pub fn config_row(che: &str, zone: &[&str]) -> EquipmentConfigRecord {
        EquipmentConfigRecord {
            che_id:    EquipmentId::new(che),
            type_code: "RTG",
            min_secs:  30.0,
            max_secs:  300.0,
            yard_zone: zone.iter().map(|b| b.to_string()).collect(),
            pool_id:   None,
        }
    }
}

#[cfg(test)]
mod csv_tests {
    use tempfile::TempDir;

    use ct_equipment::OpKind;

    use super::fixtures::{config_row, event_row, move_row};
    use crate::csv::CsvWriter;
    use crate::OutputError;
    use crate::row::{CONFIG_COLUMNS, EVENT_COLUMNS, MOVE_COLUMNS};
    use crate::writer::OutputWriter;

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    fn records(dir: &TempDir, file: &str) -> Vec<csv::StringRecord> {
        let mut rdr = csv::Reader::from_path(dir.path().join(file)).unwrap();
        rdr.records().map(|r| r.unwrap()).collect()
    }

    #[test]
    fn files_created_with_headers() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();

        for (file, columns) in [
            ("moves.csv", &MOVE_COLUMNS[..]),
            ("equipment_events.csv", &EVENT_COLUMNS[..]),
            ("equipment_configs.csv", &CONFIG_COLUMNS[..]),
        ] {
            let mut rdr = csv::Reader::from_path(dir.path().join(file)).unwrap();
            let headers: Vec<_> = rdr.headers().unwrap().iter().map(str::to_owned).collect();
            assert_eq!(headers, columns, "{file}");
        }
    }

    #[test]
    fn unusable_directory_names_the_path() {
        let blocker = tempfile::NamedTempFile::new().unwrap();
        let dir = blocker.path().join("journal");
        let err = CsvWriter::new(&dir).err().expect("directory under a file");
        assert!(matches!(&err, OutputError::CreateDir { dir: d, .. } if *d == dir));
        assert!(err.to_string().contains("journal"), "{err}");
    }

    #[test]
    fn creates_missing_output_dir() {
        let dir = tmp();
        let nested = dir.path().join("runs").join("001");
        let _w = CsvWriter::new(&nested).unwrap();
        assert!(nested.join("moves.csv").exists());
    }

    #[test]
    fn move_rows_leave_missing_values_empty() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_moves(&[move_row(1, OpKind::Fetch), move_row(2, OpKind::Carry)]).unwrap();
        w.finish().unwrap();

        let rows = records(&dir, "moves.csv");
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][3], "1");
        assert_eq!(&rows[0][9], "DSCH");
        assert_eq!(&rows[0][10], "FETCH");
        assert_eq!(&rows[1][10], "CARRY");
        assert_eq!(&rows[0][13], "TT001");
        assert_eq!(&rows[0][18], ""); // to_block_class
        assert_eq!(&rows[0][22], "50");
    }

    #[test]
    fn event_and_config_rows() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_equipment_events(&[event_row("QC01")]).unwrap();
        w.write_equipment_configs(&[config_row("RTG01", &["A01", "A02"])]).unwrap();
        w.finish().unwrap();

        let events = records(&dir, "equipment_events.csv");
        assert_eq!(&events[0][2], ""); // pow_id
        assert_eq!(&events[0][4], "QC01");
        assert_eq!(&events[0][5], "BUSY");
        assert_eq!(&events[0][7], "FETCH");

        let configs = records(&dir, "equipment_configs.csv");
        assert_eq!(&configs[0][1], "RTG");
        assert_eq!(&configs[0][4], "A01;A02");
    }

    #[test]
    fn finish_idempotent() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        w.finish().unwrap();
    }

    #[test]
    fn empty_batches_ok() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_moves(&[]).unwrap();
        w.write_equipment_events(&[]).unwrap();
        w.write_equipment_configs(&[]).unwrap();
    }
}

#[cfg(test)]
mod observer_tests {
    use ct_core::{IdGenerator, SimConfig, WiId};
    use ct_terminal::{Container, MoveKind, Position, TerminalBuilder, TerminalConfig, Vessel, WorkInstruction};

    use super::fixtures::move_row;
    use crate::csv::CsvWriter;
    use crate::writer::OutputWriter;
    use crate::{JournalOutputObserver, OutputError, OutputResult};
    use ct_terminal::{EquipmentConfigRecord, EquipmentEventRecord, MoveRecord, TerminalObserver};

    /// Fails every write after the first `ok` calls.
    struct Flaky {
        ok:       usize,
        calls:    usize,
        finished: bool,
    }

    impl Flaky {
        fn step(&mut self) -> OutputResult<()> {
            self.calls += 1;
            if self.calls > self.ok {
                let source = std::io::Error::other(format!("write {}", self.calls));
                Err(OutputError::Flush { file: "moves.csv", source })
            } else {
                Ok(())
            }
        }
    }

    impl OutputWriter for Flaky {
        fn write_moves(&mut self, _: &[MoveRecord]) -> OutputResult<()> {
            self.step()
        }
        fn write_equipment_events(&mut self, _: &[EquipmentEventRecord]) -> OutputResult<()> {
            self.step()
        }
        fn write_equipment_configs(&mut self, _: &[EquipmentConfigRecord]) -> OutputResult<()> {
            self.step()
        }
        fn finish(&mut self) -> OutputResult<()> {
            self.finished = true;
            Ok(())
        }
    }

    #[test]
    fn keeps_only_the_first_error() {
        let mut obs = JournalOutputObserver::new(Flaky { ok: 1, calls: 0, finished: false });
        obs.on_equipment_configs(&[]);
        obs.on_moves(&[move_row(1, ct_equipment::OpKind::Fetch)]);
        obs.on_equipment_events(&[]);

        let err = obs.take_error().expect("stored error");
        assert_eq!(err.to_string(), "moves.csv: flush failed: write 2");
        assert!(obs.take_error().is_none());
    }

    #[test]
    fn run_through_terminal_writes_every_stage() {
        let config = TerminalConfig {
            sim: SimConfig { until_secs: None, ..SimConfig::default() },
            ..TerminalConfig::default()
        };
        let wi = WorkInstruction::new(WiId(1), MoveKind::Discharge, "QC01", "V001", Container::new("MSCU1234565"))
            .from(Position::new("", "12", "04", "82"))
            .to(Position::block("A01"));
        let mut terminal = TerminalBuilder::new(config, IdGenerator::new())
            .quay_crane("QC01", "V001")
            .vehicles(2)
            .yard_crane(vec!["A01".into()], None)
            .vessel(Vessel::new("V001", "V001").pow("QC01", vec![wi]))
            .build()
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let mut obs = JournalOutputObserver::new(CsvWriter::new(dir.path()).unwrap());
        let report = terminal.run(&mut obs).unwrap();
        assert!(obs.take_error().is_none(), "no write errors expected");
        assert_eq!(report.completed, vec![WiId(1)]);

        let mut rdr = csv::Reader::from_path(dir.path().join("moves.csv")).unwrap();
        let stages: Vec<String> = rdr.records().map(|r| r.unwrap()[10].to_owned()).collect();
        assert_eq!(stages, ["FETCH", "CARRY", "PUT"]);

        let mut rdr = csv::Reader::from_path(dir.path().join("equipment_configs.csv")).unwrap();
        let ids: Vec<String> = rdr.records().map(|r| r.unwrap()[0].to_owned()).collect();
        assert_eq!(ids, ["QC01", "TT001", "TT002", "RTG01"]);

        let mut rdr = csv::Reader::from_path(dir.path().join("equipment_events.csv")).unwrap();
        assert!(rdr.records().count() > 0);
    }

    #[test]
    fn finish_runs_at_run_end() {
        let config = TerminalConfig {
            sim: SimConfig { until_secs: None, ..SimConfig::default() },
            ..TerminalConfig::default()
        };
        let mut terminal = TerminalBuilder::new(config, IdGenerator::new()).build().unwrap();
        let mut obs = JournalOutputObserver::new(Flaky { ok: usize::MAX, calls: 0, finished: false });
        terminal.run(&mut obs).unwrap();
        let writer = obs.into_writer();
        assert!(writer.finished);
        assert_eq!(writer.calls, 3);
    }
}

// ── SQLite tests ──────────────────────────────────────────────────────────────

#[cfg(all(test, feature = "sqlite"))]
mod sqlite_tests {
    use tempfile::TempDir;

    use ct_equipment::OpKind;

    use super::fixtures::{config_row, event_row, move_row};
    use crate::OutputError;
    use crate::sqlite::SqliteWriter;
    use crate::writer::OutputWriter;

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    fn open(dir: &TempDir) -> rusqlite::Connection {
        rusqlite::Connection::open(dir.path().join("output.db")).unwrap()
    }

    #[test]
    fn db_created() {
        let dir = tmp();
        let _w = SqliteWriter::new(dir.path()).unwrap();
        assert!(dir.path().join("output.db").exists());
    }

    #[test]
    fn failed_insert_names_the_table() {
        let dir = tmp();
        let mut w = SqliteWriter::new(dir.path()).unwrap();
        open(&dir).execute_batch("DROP TABLE equipment_events;").unwrap();

        let err = w.write_equipment_events(&[event_row("QC01")]).unwrap_err();
        assert!(matches!(err, OutputError::Sqlite { target: "equipment_events", .. }), "{err}");
        w.write_moves(&[move_row(1, OpKind::Fetch)]).unwrap();
    }

    #[test]
    fn move_count_and_nulls() {
        let dir = tmp();
        let mut w = SqliteWriter::new(dir.path()).unwrap();
        w.write_moves(&[move_row(1, OpKind::Fetch), move_row(1, OpKind::Carry), move_row(1, OpKind::Put)])
            .unwrap();
        w.finish().unwrap();

        let conn = open(&dir);
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM moves", [], |r| r.get(0)).unwrap();
        assert_eq!(count, 3);
        let class: Option<String> =
            conn.query_row("SELECT to_block_class FROM moves LIMIT 1", [], |r| r.get(0)).unwrap();
        assert_eq!(class, None);
        let duration: f64 = conn.query_row("SELECT duration_secs FROM moves LIMIT 1", [], |r| r.get(0)).unwrap();
        assert_eq!(duration, 50.0);
    }

    #[test]
    fn events_and_configs() {
        let dir = tmp();
        let mut w = SqliteWriter::new(dir.path()).unwrap();
        w.write_equipment_events(&[event_row("QC01"), event_row("TT001")]).unwrap();
        w.write_equipment_configs(&[config_row("RTG01", &["A01"]), config_row("RTG02", &["B01", "B02"])]).unwrap();
        w.finish().unwrap();

        let conn = open(&dir);
        let status: String = conn
            .query_row("SELECT status FROM equipment_events WHERE che_id = 'TT001'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(status, "BUSY");
        let zone: String = conn
            .query_row("SELECT yard_zone FROM equipment_configs WHERE che_id = 'RTG02'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(zone, "B01;B02");
    }

    #[test]
    fn finish_idempotent() {
        let dir = tmp();
        let mut w = SqliteWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        w.finish().unwrap();
    }
}
