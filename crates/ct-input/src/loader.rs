//! CSV work-instruction loader.
//!
//! # CSV format
//!
//! One row per work instruction.  Only the first five columns are required;
//! the rest default to empty.
//!
//! ```csv
//! id,move_kind,pow,carrier_visit,container_id,category,freight_kind,line_op,fm_block,fm_bay,fm_row,fm_tier,to_block,to_bay,to_row,to_tier
//! 101,DSCH,QC01,MSC001,MSCU1234565,IMPRT,FCL,MSC,,12,04,82,A01,,,
//! 102,LOAD,QC01,MSC001,MSCU7654321,EXPRT,FCL,MSC,B02,03,02,1,,14,06,84
//! ```
//!
//! Rows are grouped into one [`Vessel`] per carrier visit and one point of
//! work per `pow`, both in first-seen order.  The carrier visit doubles as
//! the vessel and carrier id.  Duplicate ids and the per-POW limit are
//! applied to each point of work in file order, before sorting by id.
//!
//! | `move_kind` | Meaning                    |
//! |-------------|----------------------------|
//! | `DSCH`      | discharge, vessel → yard   |
//! | `LOAD`      | load, yard → vessel        |
//! | `SHOB` `YARD` `SHFT` `DLVR` `RECV` `RLOD` `RDSC` | accepted, skipped at run time |
//!
//! Any other code is dropped with a warning; the rest of the file still loads.

use std::collections::{BTreeSet, HashSet};
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use ct_core::WiId;
use ct_terminal::{Container, MoveKind, PointOfWork, Position, Vessel, WorkInstruction};

use crate::{InputError, InputResult};

// ── CSV record ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct WiRecord {
    id:            u64,
    move_kind:     String,
    pow:           String,
    carrier_visit: String,
    container_id:  String,
    #[serde(default)]
    category:      String,
    #[serde(default)]
    freight_kind:  String,
    #[serde(default)]
    line_op:       String,
    #[serde(default)]
    fm_block:      String,
    #[serde(default)]
    fm_bay:        String,
    #[serde(default)]
    fm_row:        String,
    #[serde(default)]
    fm_tier:       String,
    #[serde(default)]
    to_block:      String,
    #[serde(default)]
    to_bay:        String,
    #[serde(default)]
    to_row:        String,
    #[serde(default)]
    to_tier:       String,
}

impl WiRecord {
    fn into_instruction(self) -> Option<WorkInstruction> {
        let Some(kind) = MoveKind::from_code(&self.move_kind) else {
            warn!(wi = self.id, pow = %self.pow, code = %self.move_kind, "unknown move kind, dropping row");
            return None;
        };
        let container = Container {
            id:           self.container_id,
            category:     self.category,
            freight_kind: self.freight_kind,
            line_op:      self.line_op,
        };
        Some(
            WorkInstruction::new(WiId(self.id), kind, self.pow, self.carrier_visit, container)
                .from(Position::new(self.fm_block, self.fm_bay, self.fm_row, self.fm_tier))
                .to(Position::new(self.to_block, self.to_bay, self.to_row, self.to_tier)),
        )
    }
}

// ── Grouping ──────────────────────────────────────────────────────────────────

/// Rows of one point of work in file order, before conversion.
struct PowRows {
    name:    String,
    seen:    HashSet<u64>,
    rows:    Vec<WiRecord>,
    dropped: usize,
}

struct VisitRows {
    visit: String,
    pows:  Vec<PowRows>,
}

impl PowRows {
    /// Keep `row` unless its id was already seen here or the limit is full.
    fn push(&mut self, row: WiRecord, limit: Option<usize>) {
        if !self.seen.insert(row.id) {
            warn!(wi = row.id, pow = %self.name, "duplicate work instruction id, keeping the first");
            return;
        }
        if limit.is_some_and(|n| self.rows.len() >= n) {
            self.dropped += 1;
            return;
        }
        self.rows.push(row);
    }

    fn into_pow(self) -> PointOfWork {
        let mut work: Vec<WorkInstruction> = self.rows.into_iter().filter_map(WiRecord::into_instruction).collect();
        work.sort_by_key(|wi| wi.id);
        PointOfWork { name: self.name, work }
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load vessels from a CSV file.
///
/// Within each point of work, duplicate ids are dropped (the first row
/// wins), then with `per_pow_limit` only the first N rows in file order are
/// kept, and finally the instructions are sorted by id.
pub fn load_vessels_csv(path: &Path, per_pow_limit: Option<usize>) -> InputResult<Vec<Vessel>> {
    let file = std::fs::File::open(path).map_err(InputError::Io)?;
    load_vessels_reader(file, per_pow_limit)
}

/// Like [`load_vessels_csv`] but accepts any `Read` source.
pub fn load_vessels_reader<R: Read>(reader: R, per_pow_limit: Option<usize>) -> InputResult<Vec<Vessel>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut visits: Vec<VisitRows> = Vec::new();

    for result in csv_reader.deserialize::<WiRecord>() {
        let row = result.map_err(|e| InputError::Parse(e.to_string()))?;

        let visit = match visits.iter().position(|v| v.visit == row.carrier_visit) {
            Some(i) => &mut visits[i],
            None => {
                visits.push(VisitRows { visit: row.carrier_visit.clone(), pows: Vec::new() });
                let last = visits.len() - 1;
                &mut visits[last]
            }
        };
        let pow = match visit.pows.iter().position(|p| p.name == row.pow) {
            Some(i) => &mut visit.pows[i],
            None => {
                visit.pows.push(PowRows { name: row.pow.clone(), seen: HashSet::new(), rows: Vec::new(), dropped: 0 });
                let last = visit.pows.len() - 1;
                &mut visit.pows[last]
            }
        };
        pow.push(row, per_pow_limit);
    }

    let vessels = visits
        .into_iter()
        .map(|v| {
            let dropped: usize = v.pows.iter().map(|p| p.dropped).sum();
            let mut vessel = Vessel::new(v.visit.as_str(), v.visit.as_str());
            vessel.pows = v.pows.into_iter().map(PowRows::into_pow).collect();
            debug!(
                vessel = %vessel.id,
                pows = vessel.pows.len(),
                instructions = vessel.wi_count(),
                over_limit = dropped,
                "vessel loaded"
            );
            vessel
        })
        .collect();
    Ok(vessels)
}

/// One yard zone per distinct yard block the orchestrated moves touch:
/// discharge destinations and load origins, sorted by name.
pub fn one_crane_per_block(vessels: &[Vessel]) -> Vec<Vec<String>> {
    let blocks: BTreeSet<&str> = vessels
        .iter()
        .flat_map(|v| &v.pows)
        .flat_map(|p| &p.work)
        .filter_map(|wi| match wi.move_kind {
            MoveKind::Discharge => Some(wi.to.block.as_str()),
            MoveKind::Load => Some(wi.from.block.as_str()),
            _ => None,
        })
        .filter(|b| !b.is_empty())
        .collect();
    blocks.into_iter().map(|b| vec![b.to_owned()]).collect()
}
