//! berth — two vessel calls worked by two quay cranes.
//!
//! Usage: `berth [config.json]`.  The optional file is a serialized
//! `TerminalConfig`; any field left out keeps its default.  Logging follows
//! `RUST_LOG` and defaults to `info`.  CSV output lands in `output/berth`.

use std::io::Cursor;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use ct_core::IdGenerator;
use ct_input::{load_vessels_reader, one_crane_per_block};
use ct_output::{CsvWriter, JournalOutputObserver};
use ct_terminal::{PowOutcome, TerminalBuilder, TerminalConfig, TerminalReport, VesselOutcome};

// ── Constants ─────────────────────────────────────────────────────────────────

const VEHICLES:    usize = 4;
const PER_POW_MAX: usize = 20;
const OUTPUT_DIR:  &str  = "output/berth";

// ── Work instructions ─────────────────────────────────────────────────────────

// MSC001 is discharged and loaded at QC01 and QC02.  CMA002 arrives later
// and queues for QC01.  The SHOB restow is carried through and skipped.
const WI_CSV: &str = "\
id,move_kind,pow,carrier_visit,container_id,category,freight_kind,line_op,fm_block,fm_bay,fm_row,fm_tier,to_block,to_bay,to_row,to_tier
101,DSCH,QC01,MSC001,MSCU1000011,IMPRT,FCL,MSC,,12,04,82,A01,,,
102,DSCH,QC01,MSC001,MSCU1000022,IMPRT,FCL,MSC,,12,02,82,A01,,,
103,DSCH,QC01,MSC001,MSCU1000033,IMPRT,MTY,MSC,,12,00,82,A02,,,
104,LOAD,QC01,MSC001,MSCU2000011,EXPRT,FCL,MSC,B01,03,02,1,,14,06,84
201,DSCH,QC02,MSC001,MSCU1000044,IMPRT,FCL,MSC,,30,04,84,A02,,,
202,SHOB,QC02,MSC001,MSCU1000055,THRGH,FCL,MSC,,30,02,84,,34,02,84
203,DSCH,QC02,MSC001,MSCU1000066,IMPRT,FCL,MSC,,30,00,84,A01,,,
301,DSCH,QC01,CMA002,CMAU3000011,IMPRT,FCL,CMA,,08,01,82,A02,,,
302,DSCH,QC01,CMA002,CMAU3000022,IMPRT,FCL,CMA,,08,03,82,A01,,,
";

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // 1. Config.
    let config: TerminalConfig = match std::env::args().nth(1) {
        Some(path) => {
            let text = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {path}"))?
        }
        None => TerminalConfig::default(),
    };
    info!(seed = config.sim.seed, until_secs = ?config.sim.until_secs, "config loaded");

    // 2. Work instructions and yard layout.
    let vessels = load_vessels_reader(Cursor::new(WI_CSV), Some(PER_POW_MAX))?;
    let zones = one_crane_per_block(&vessels);
    println!("Vessels: {}  |  Yard cranes: {}  |  Vehicles: {VEHICLES}", vessels.len(), zones.len());

    // 3. Terminal.
    let mut builder = TerminalBuilder::new(config, IdGenerator::new()).vehicles(VEHICLES);
    let mut cranes: Vec<&str> = vessels.iter().flat_map(|v| &v.pows).map(|p| p.name.as_str()).collect();
    cranes.sort_unstable();
    cranes.dedup();
    for crane in cranes {
        builder = builder.quay_crane(crane, "QUAY");
    }
    for zone in zones {
        builder = builder.yard_crane(zone, None);
    }
    for vessel in vessels {
        builder = builder.vessel(vessel);
    }
    let mut terminal = builder.build()?;

    // 4. Run.
    let writer = CsvWriter::new(Path::new(OUTPUT_DIR))?;
    let mut obs = JournalOutputObserver::new(writer);
    let t0 = Instant::now();
    let result = terminal.run(&mut obs);
    let elapsed = t0.elapsed();

    if let Some(e) = obs.take_error() {
        eprintln!("output error: {e}");
    }
    if let Some(report) = terminal.report() {
        print_report(report);
    }
    println!("Simulation complete in {:.3} s, output in {OUTPUT_DIR}/", elapsed.as_secs_f64());

    result?;
    Ok(())
}

// ── Report ────────────────────────────────────────────────────────────────────

fn print_report(report: &TerminalReport) {
    println!();
    println!(
        "Stopped at {:.0} s ({})  |  completed {}  |  skipped {}  |  live processes {}",
        report.final_secs,
        report.final_tick,
        report.completed.len(),
        report.skipped.len(),
        report.live_processes,
    );
    println!();
    println!("{:<10} {:<8} {:<40}", "Vessel", "POW", "Outcome");
    println!("{}", "-".repeat(58));
    for vessel in &report.vessels {
        let outcome = match &vessel.outcome {
            VesselOutcome::Completed => "completed".to_owned(),
            VesselOutcome::Failed(err) => format!("failed: {err}"),
            VesselOutcome::Unfinished => "unfinished".to_owned(),
            VesselOutcome::NotArrived => "not arrived".to_owned(),
        };
        println!("{:<10} {:<8} {:<40}", vessel.vessel_id, "", outcome);
        for pow in report.pows.iter().filter(|p| p.vessel_id == vessel.vessel_id) {
            let outcome = match &pow.outcome {
                PowOutcome::Worked { moves, skipped } => format!("{moves} moves, {skipped} skipped"),
                PowOutcome::StoodDown => "stood down".to_owned(),
                PowOutcome::Failed(err) => format!("failed: {err}"),
                PowOutcome::Unfinished => "unfinished".to_owned(),
            };
            println!("{:<10} {:<8} {:<40}", "", pow.pow, outcome);
        }
    }
}
