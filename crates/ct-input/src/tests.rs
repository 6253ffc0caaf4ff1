//! Unit tests for ct-input.

#[cfg(test)]
mod loader {
    use std::io::{Cursor, Write};

    use ct_core::{IdGenerator, SimConfig, WiId};
    use ct_terminal::{MoveKind, NoopObserver, TerminalBuilder, TerminalConfig, VesselOutcome};

    use crate::{InputError, load_vessels_csv, load_vessels_reader, one_crane_per_block};

    const HEADER: &str = "id,move_kind,pow,carrier_visit,container_id,category,freight_kind,line_op,\
                          fm_block,fm_bay,fm_row,fm_tier,to_block,to_bay,to_row,to_tier\n";

    fn csv(rows: &str) -> Cursor<String> {
        Cursor::new(format!("{HEADER}{rows}"))
    }

    #[test]
    fn groups_by_visit_and_pow_in_first_seen_order() {
        let rows = "\
3,DSCH,QC02,V2,C3,IMPRT,FCL,MSC,,10,02,80,A02,,,
2,DSCH,QC01,V1,C2,IMPRT,FCL,MSC,,10,02,82,A01,,,
1,LOAD,QC01,V1,C1,EXPRT,FCL,MSC,B01,01,02,3,,14,06,84
4,SHOB,QC03,V1,C4,,,,,,,,,,,
";
        let vessels = load_vessels_reader(csv(rows), None).unwrap();
        let ids: Vec<_> = vessels.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, ["V2", "V1"]);
        assert_eq!(vessels[1].carrier_id, "V1");

        let pows: Vec<_> = vessels[1].pows.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(pows, ["QC01", "QC03"]);
        let qc01: Vec<_> = vessels[1].pows[0].work.iter().map(|w| w.id).collect();
        assert_eq!(qc01, [WiId(1), WiId(2)]);

        let load = &vessels[1].pows[0].work[0];
        assert_eq!(load.move_kind, MoveKind::Load);
        assert_eq!(load.from.to_string(), "B0101023");
        assert_eq!(load.container.category, "EXPRT");
        assert_eq!(vessels[1].pows[1].work[0].move_kind, MoveKind::ShiftOnBoard);
    }

    #[test]
    fn limit_keeps_file_order_then_sorts() {
        let rows = "\
5,DSCH,QC01,V1,FIRST,,,,,,,,A01,,,
5,DSCH,QC01,V1,SECOND,,,,,,,,A01,,,
7,DSCH,QC01,V1,C7,,,,,,,,A01,,,
6,DSCH,QC01,V1,C6,,,,,,,,A01,,,
";
        let vessels = load_vessels_reader(csv(rows), Some(2)).unwrap();
        let work = &vessels[0].pows[0].work;
        let ids: Vec<_> = work.iter().map(|w| w.id).collect();
        assert_eq!(ids, [WiId(5), WiId(7)]);
        assert_eq!(work[0].container.id, "FIRST");
    }

    #[test]
    fn duplicate_ids_are_scoped_to_their_point_of_work() {
        let rows = "\
1,DSCH,QC01,V1,C1,,,,,,,,A01,,,
1,DSCH,QC02,V1,C1B,,,,,,,,A01,,,
1,DSCH,QC01,V1,C1C,,,,,,,,A01,,,
";
        let vessels = load_vessels_reader(csv(rows), None).unwrap();
        let pows: Vec<_> = vessels[0].pows.iter().map(|p| (p.name.as_str(), p.work.len())).collect();
        assert_eq!(pows, [("QC01", 1), ("QC02", 1)]);
        assert_eq!(vessels[0].pows[0].work[0].container.id, "C1");
        assert_eq!(vessels[0].pows[1].work[0].container.id, "C1B");
    }

    #[test]
    fn optional_columns_may_be_absent() {
        let data = "id,move_kind,pow,carrier_visit,container_id\n9,DSCH,QC01,V1,C9\n";
        let vessels = load_vessels_reader(Cursor::new(data), None).unwrap();
        let wi = &vessels[0].pows[0].work[0];
        assert_eq!(wi.to.block, "");
        assert_eq!(wi.container.line_op, "");
    }

    #[test]
    fn unknown_move_kind_is_dropped_and_the_rest_still_runs() {
        let rows = "\
1,DSCH,QC01,V1,C1,,,,,,,,A01,,,
2,XXXX,QC01,V1,C2,,,,,,,,A01,,,
";
        let vessels = load_vessels_reader(csv(rows), None).unwrap();
        let ids: Vec<_> = vessels[0].pows[0].work.iter().map(|w| w.id).collect();
        assert_eq!(ids, [WiId(1)]);

        let config = TerminalConfig { sim: SimConfig { until_secs: None, ..SimConfig::default() }, ..TerminalConfig::default() };
        let mut terminal = TerminalBuilder::new(config, IdGenerator::new())
            .quay_crane("QC01", "V1")
            .vehicles(1)
            .yard_crane(vec!["A01".into()], None)
            .vessel(vessels.into_iter().next().unwrap())
            .build()
            .unwrap();
        let report = terminal.run(&mut NoopObserver).unwrap();
        assert_eq!(report.completed, vec![WiId(1)]);
        assert_eq!(report.vessel("V1"), Some(&VesselOutcome::Completed));
    }

    #[test]
    fn malformed_id_is_a_parse_error() {
        let err = load_vessels_reader(csv("one,DSCH,QC01,V1,C1,,,,,,,,,,,\n"), None).unwrap_err();
        assert!(matches!(err, InputError::Parse(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_vessels_csv(std::path::Path::new("/nonexistent/wi.csv"), None).unwrap_err();
        assert!(matches!(err, InputError::Io(_)));
    }

    #[test]
    fn loads_from_a_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{HEADER}1,DSCH,QC01,V1,C1,,,,,,,,A01,,,\n").unwrap();
        let vessels = load_vessels_csv(file.path(), None).unwrap();
        assert_eq!(vessels[0].wi_count(), 1);
    }

    #[test]
    fn one_zone_per_touched_yard_block() {
        let rows = "\
1,DSCH,QC01,V1,C1,,,,,,,,A02,,,
2,DSCH,QC01,V1,C2,,,,,,,,A01,,,
3,LOAD,QC01,V1,C3,,,,B01,,,,,,,
4,DSCH,QC02,V1,C4,,,,,,,,A02,,,
5,YARD,QC02,V1,C5,,,,Z01,,,,Z02,,,
";
        let vessels = load_vessels_reader(csv(rows), None).unwrap();
        let zones = one_crane_per_block(&vessels);
        assert_eq!(zones, vec![vec!["A01".to_string()], vec!["A02".to_string()], vec!["B01".to_string()]]);
    }
}
