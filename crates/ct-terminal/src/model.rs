//! Work instructions, containers, vessels and the per-move-kind tables.

use std::fmt;

use ct_core::WiId;
use ct_equipment::OpKind;

// ── Container ─────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Container {
    pub id:           String,
    pub category:     String,
    pub freight_kind: String,
    pub line_op:      String,
}

impl Container {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), ..Self::default() }
    }
}

// ── MoveKind ──────────────────────────────────────────────────────────────────

/// Terminal move kinds.  Only discharge and load are orchestrated; the rest
/// are carried through the input and skipped by the coordinator.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MoveKind {
    /// `DSCH`: vessel → yard.
    Discharge,
    /// `LOAD`: yard → vessel.
    Load,
    /// `SHOB`: restow on board.
    ShiftOnBoard,
    /// `YARD`: yard → yard.
    YardMove,
    /// `SHFT`: housekeeping shift inside a block.
    YardShift,
    /// `DLVR`: yard → truck.
    Delivery,
    /// `RECV`: truck → yard.
    Receival,
    /// `RLOD`: yard → rail.
    RailLoad,
    /// `RDSC`: rail → yard.
    RailDischarge,
}

/// Block reference and block class columns of a move record.
///
/// ```text
/// kind   fm_ref to_ref │ fm class F/C/P       │ to class F/C/P
/// DSCH   V      Y      │ QC   QC   ITV        │ ITV  YC   YC
/// LOAD   Y      V      │ YC   YC   ITV        │ ITV  QC   QC
/// SHOB   V      V      │ QC   -    QC         │ QC   -    QC
/// YARD   Y      Y      │ YC   YC   ITV        │ YC   YC   YC
/// SHFT   Y      Y      │ YC   -    YC         │ YC   -    YC
/// DLVR   Y      T      │ YC   -    -          │ TIP  -    -
/// RECV   T      Y      │ -    -    TIP        │ -    -    YC
/// RLOD   Y      R      │ YC   YC   ITV        │ ITV  R-YC R-YC
/// RDSC   R      Y      │ R-YC R-YC ITV        │ ITV  YC   YC
/// ```
impl MoveKind {
    pub const ALL: [MoveKind; 9] = [
        MoveKind::Discharge,
        MoveKind::Load,
        MoveKind::ShiftOnBoard,
        MoveKind::YardMove,
        MoveKind::YardShift,
        MoveKind::Delivery,
        MoveKind::Receival,
        MoveKind::RailLoad,
        MoveKind::RailDischarge,
    ];

    pub fn code(self) -> &'static str {
        match self {
            MoveKind::Discharge => "DSCH",
            MoveKind::Load => "LOAD",
            MoveKind::ShiftOnBoard => "SHOB",
            MoveKind::YardMove => "YARD",
            MoveKind::YardShift => "SHFT",
            MoveKind::Delivery => "DLVR",
            MoveKind::Receival => "RECV",
            MoveKind::RailLoad => "RLOD",
            MoveKind::RailDischarge => "RDSC",
        }
    }

    pub fn from_code(code: &str) -> Option<MoveKind> {
        MoveKind::ALL.into_iter().find(|k| k.code() == code.trim())
    }

    /// Whether the coordinator runs Fetch/Carry/Put for this kind.
    pub fn is_orchestrated(self) -> bool {
        matches!(self, MoveKind::Discharge | MoveKind::Load)
    }

    pub fn fm_block_ref(self) -> &'static str {
        match self {
            MoveKind::Discharge | MoveKind::ShiftOnBoard => "V",
            MoveKind::Receival => "T",
            MoveKind::RailDischarge => "R",
            _ => "Y",
        }
    }

    pub fn to_block_ref(self) -> &'static str {
        match self {
            MoveKind::Load | MoveKind::ShiftOnBoard => "V",
            MoveKind::Delivery => "T",
            MoveKind::RailLoad => "R",
            _ => "Y",
        }
    }

    pub fn fm_block_class(self, stage: OpKind) -> Option<&'static str> {
        use MoveKind::*;
        use OpKind::*;
        match (self, stage) {
            (Discharge | ShiftOnBoard, Fetch) | (Discharge, Carry) | (ShiftOnBoard, Put) => Some("QC"),
            (Load | YardMove | RailLoad, Fetch | Carry) | (YardShift | Delivery, Fetch) | (YardShift, Put) => {
                Some("YC")
            }
            (RailDischarge, Fetch | Carry) => Some("R-YC"),
            (Discharge | Load | YardMove | RailLoad | RailDischarge, Put) => Some("ITV"),
            (Receival, Put) => Some("TIP"),
            _ => None,
        }
    }

    pub fn to_block_class(self, stage: OpKind) -> Option<&'static str> {
        use MoveKind::*;
        use OpKind::*;
        match (self, stage) {
            (Discharge | Load | RailLoad | RailDischarge, Fetch) => Some("ITV"),
            (Discharge | RailDischarge, Carry | Put) | (YardMove, _) | (YardShift, Fetch | Put) => Some("YC"),
            (Receival, Put) => Some("YC"),
            (Load, Carry | Put) | (ShiftOnBoard, Fetch | Put) => Some("QC"),
            (RailLoad, Carry | Put) => Some("R-YC"),
            (Delivery, Fetch) => Some("TIP"),
            _ => None,
        }
    }

    /// Whether the origin position lies on the carrier visit (vessel or rail).
    pub fn fm_on_carrier(self) -> bool {
        matches!(self, MoveKind::Discharge | MoveKind::ShiftOnBoard | MoveKind::RailDischarge)
    }

    pub fn to_on_carrier(self) -> bool {
        matches!(self, MoveKind::Load | MoveKind::ShiftOnBoard | MoveKind::RailLoad)
    }

    /// Stages that pass through a position of their own for this kind.
    pub fn has_stage(self, stage: OpKind) -> bool {
        use MoveKind::*;
        match stage {
            OpKind::Fetch => !matches!(self, Receival),
            OpKind::Carry => matches!(self, Discharge | Load | YardMove | RailLoad | RailDischarge),
            OpKind::Put => !matches!(self, Delivery),
        }
    }
}

impl fmt::Display for MoveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ── Position ──────────────────────────────────────────────────────────────────

/// Block / bay / row / tier slot.  Any part may be empty.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub block: String,
    pub bay:   String,
    pub row:   String,
    pub tier:  String,
}

impl Position {
    pub fn new(block: impl Into<String>, bay: impl Into<String>, row: impl Into<String>, tier: impl Into<String>) -> Self {
        Self { block: block.into(), bay: bay.into(), row: row.into(), tier: tier.into() }
    }

    /// Only the block is known.
    pub fn block(block: impl Into<String>) -> Self {
        Self { block: block.into(), ..Self::default() }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}{}", self.block, self.bay, self.row, self.tier)
    }
}

// ── WorkInstruction ───────────────────────────────────────────────────────────

/// Progress of a work instruction through its move.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WiStage {
    #[default]
    Planned,
    Fetching,
    CarryReady,
    CarryUnderway,
    CarryComplete,
    Complete,
    Skipped,
}

impl WiStage {
    pub fn as_str(self) -> &'static str {
        match self {
            WiStage::Planned => "PLANNED",
            WiStage::Fetching => "FETCHING",
            WiStage::CarryReady => "CARRY_READY",
            WiStage::CarryUnderway => "CARRY_UNDERWAY",
            WiStage::CarryComplete => "CARRY_COMPLETE",
            WiStage::Complete => "COMPLETE",
            WiStage::Skipped => "SKIPPED",
        }
    }
}

impl fmt::Display for WiStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One container move as planned by the terminal operating system.
///
/// Everything but `stage` is fixed once the instruction is handed to a
/// terminal.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorkInstruction {
    pub id:            WiId,
    pub move_kind:     MoveKind,
    /// Point of work; also the id of the quay crane working it.
    pub pow:           String,
    pub carrier_visit: String,
    pub container:     Container,
    pub from:          Position,
    pub to:            Position,
    pub stage:         WiStage,
}

impl WorkInstruction {
    pub fn new(
        id:            WiId,
        move_kind:     MoveKind,
        pow:           impl Into<String>,
        carrier_visit: impl Into<String>,
        container:     Container,
    ) -> Self {
        Self {
            id,
            move_kind,
            pow: pow.into(),
            carrier_visit: carrier_visit.into(),
            container,
            from: Position::default(),
            to: Position::default(),
            stage: WiStage::Planned,
        }
    }

    pub fn from(mut self, position: Position) -> Self {
        self.from = position;
        self
    }

    pub fn to(mut self, position: Position) -> Self {
        self.to = position;
        self
    }
}

// ── Vessel ────────────────────────────────────────────────────────────────────

/// A quay-side point of work with its ordered instructions.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PointOfWork {
    pub name: String,
    pub work: Vec<WorkInstruction>,
}

/// A vessel visit.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vessel {
    pub id:         String,
    pub carrier_id: String,
    pub pows:       Vec<PointOfWork>,
}

impl Vessel {
    pub fn new(id: impl Into<String>, carrier_id: impl Into<String>) -> Self {
        Self { id: id.into(), carrier_id: carrier_id.into(), pows: Vec::new() }
    }

    pub fn pow(mut self, name: impl Into<String>, work: Vec<WorkInstruction>) -> Self {
        self.pows.push(PointOfWork { name: name.into(), work });
        self
    }

    pub fn wi_count(&self) -> usize {
        self.pows.iter().map(|p| p.work.len()).sum()
    }
}
