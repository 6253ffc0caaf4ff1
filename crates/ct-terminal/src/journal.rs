//! Append-only records of a run: stage completions, equipment status
//! events and equipment configuration.
//!
//! The journal is handed to a [`TerminalObserver`][crate::TerminalObserver]
//! once at the end of each run.

use ct_core::EquipmentId;
use ct_equipment::{Equipment, EquipmentStatus, OpKind};

use crate::{MoveKind, WorkInstruction};

// ── Records ───────────────────────────────────────────────────────────────────

/// One Fetch, Carry or Put stage of a work instruction.
#[derive(Clone, Debug, PartialEq)]
pub struct MoveRecord {
    pub pow_id:         String,
    pub line_op:        String,
    pub carrier_visit:  String,
    pub wi_id:          u64,
    /// `{wi}F`, `{wi}C` or `{wi}P`.
    pub move_id:        String,
    pub container_id:   String,
    pub category:       String,
    pub freight_kind:   String,
    pub carrier_id:     String,
    pub move_kind:      MoveKind,
    pub stage:          OpKind,
    /// Equipment performing the stage.
    pub che_id:         Option<EquipmentId>,
    pub fm_che:         Option<EquipmentId>,
    pub to_che:         Option<EquipmentId>,
    pub fm_block_ref:   &'static str,
    pub fm_block_class: Option<&'static str>,
    pub fm_position:    String,
    pub to_block_ref:   &'static str,
    pub to_block_class: Option<&'static str>,
    pub to_position:    String,
    pub dispatch_secs:  Option<f64>,
    pub end_secs:       Option<f64>,
    pub duration_secs:  Option<f64>,
    pub logged_at_secs: f64,
}

/// One equipment status change.
#[derive(Clone, Debug, PartialEq)]
pub struct EquipmentEventRecord {
    pub sim_secs:      f64,
    pub unix_secs:     i64,
    pub pow_id:        Option<String>,
    pub wi_id:         Option<u64>,
    pub che_id:        EquipmentId,
    pub status:        EquipmentStatus,
    pub move_kind:     Option<MoveKind>,
    /// Stage named by the description, if any.
    pub move_stage:    Option<OpKind>,
    pub description:   String,
    pub last_position: Option<String>,
}

/// Static description of one unit, recorded when the terminal is built.
#[derive(Clone, Debug, PartialEq)]
pub struct EquipmentConfigRecord {
    pub che_id:    EquipmentId,
    pub type_code: &'static str,
    pub min_secs:  f64,
    pub max_secs:  f64,
    pub yard_zone: Vec<String>,
    pub pool_id:   Option<String>,
}

impl EquipmentConfigRecord {
    pub fn from_equipment(eq: &Equipment) -> Self {
        Self {
            che_id:    eq.id.clone(),
            type_code: eq.class().type_code(),
            min_secs:  eq.bounds.min_secs,
            max_secs:  eq.bounds.max_secs,
            yard_zone: eq.yard_zone().to_vec(),
            pool_id:   eq.pool_id().map(str::to_owned),
        }
    }
}

// ── Journal ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default)]
pub struct Journal {
    pub moves:   Vec<MoveRecord>,
    pub events:  Vec<EquipmentEventRecord>,
    pub configs: Vec<EquipmentConfigRecord>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move everything recorded so far out of the journal.
    pub fn take(&mut self) -> Journal {
        std::mem::take(self)
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty() && self.events.is_empty() && self.configs.is_empty()
    }
}

// ── Derivations ───────────────────────────────────────────────────────────────

/// Equipment taking part in one move.
#[derive(Copy, Clone, Debug, Default)]
pub struct Crew<'a> {
    pub quay_crane: Option<&'a EquipmentId>,
    pub vehicle:    Option<&'a EquipmentId>,
    pub yard_crane: Option<&'a EquipmentId>,
}

/// Performer, origin and destination equipment of a stage, as
/// `(che, fm_che, to_che)`.  Only discharge and load have roles.
pub fn stage_roles<'a>(
    kind:  MoveKind,
    stage: OpKind,
    crew:  Crew<'a>,
) -> (Option<&'a EquipmentId>, Option<&'a EquipmentId>, Option<&'a EquipmentId>) {
    let Crew { quay_crane: qc, vehicle: itv, yard_crane: yc } = crew;
    let (source, sink) = match kind {
        MoveKind::Discharge => (qc, yc),
        MoveKind::Load => (yc, qc),
        _ => return (None, None, None),
    };
    match stage {
        OpKind::Fetch => (source, source, itv),
        OpKind::Carry => (itv, source, sink),
        OpKind::Put => (sink, itv, sink),
    }
}

pub fn move_suffix(stage: OpKind) -> char {
    match stage {
        OpKind::Fetch => 'F',
        OpKind::Carry => 'C',
        OpKind::Put => 'P',
    }
}

/// Stage named in an equipment event description.  `CARRY` wins over the
/// crane stages because vehicle handshakes mention both.
pub fn stage_from_description(description: &str) -> Option<OpKind> {
    if description.contains("CARRY") {
        Some(OpKind::Carry)
    } else if description.contains("FETCH") {
        Some(OpKind::Fetch)
    } else if description.contains("PUT") {
        Some(OpKind::Put)
    } else {
        None
    }
}

/// `{ref}-{visit}-{block}{bay}{row}{tier}`.  The visit is the carrier visit
/// for carrier-side positions and the facility otherwise.
pub fn position_name(wi: &WorkInstruction, origin: bool, facility_id: Option<&str>) -> String {
    let kind = wi.move_kind;
    let (block_ref, on_carrier, position) = if origin {
        (kind.fm_block_ref(), kind.fm_on_carrier(), &wi.from)
    } else {
        (kind.to_block_ref(), kind.to_on_carrier(), &wi.to)
    };
    let visit = if on_carrier { Some(wi.carrier_visit.as_str()) } else { facility_id };
    let visit = visit.filter(|v| !v.is_empty()).unwrap_or("UNKNOWN");
    format!("{block_ref}-{visit}-{position}")
}

/// Where the equipment was when it reported `description` for `wi`.
///
/// Fetch events sit at the origin and put events at the destination.  A
/// vehicle is at the origin until it has taken the box and at the
/// destination from arrival on.
pub fn last_position(wi: &WorkInstruction, description: &str, facility_id: Option<&str>) -> Option<String> {
    let stage = stage_from_description(description)?;
    if !wi.move_kind.has_stage(stage) {
        return None;
    }
    let origin = match stage {
        OpKind::Fetch => true,
        OpKind::Put => false,
        OpKind::Carry if description.contains("ready to fetch") || description.contains("underway") => true,
        OpKind::Carry
            if description.contains("ready to put")
                || description.contains("arrived")
                || description.contains("released") =>
        {
            false
        }
        OpKind::Carry => return None,
    };
    Some(position_name(wi, origin, facility_id))
}
