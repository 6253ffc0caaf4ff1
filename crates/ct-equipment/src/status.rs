//! Equipment status and transition rules.

use std::fmt;

/// Operational status of one piece of equipment.
///
/// ```text
/// from \ to   IDLE  BUSY  MOVING  WAITING  ERROR
/// IDLE         ✓     ✓     ✓       ✓        ✓
/// BUSY               ✓     ✓       ✓        ✓
/// MOVING                   ✓       ✓        ✓
/// WAITING      ✓     ✓     ✓       ✓        ✓
/// ERROR        (terminal)
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EquipmentStatus {
    #[default]
    Idle,
    Busy,
    Moving,
    Waiting,
    Error,
}

impl EquipmentStatus {
    pub fn can_transition_to(self, to: EquipmentStatus) -> bool {
        use EquipmentStatus::*;
        match (self, to) {
            (Error, _) => false,
            (_, Error) => true,
            (Idle, _) | (Waiting, _) => true,
            (Busy, Busy | Moving | Waiting) => true,
            (Moving, Moving | Waiting) => true,
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EquipmentStatus::Idle => "IDLE",
            EquipmentStatus::Busy => "BUSY",
            EquipmentStatus::Moving => "MOVING",
            EquipmentStatus::Waiting => "WAITING",
            EquipmentStatus::Error => "ERROR",
        }
    }
}

impl fmt::Display for EquipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
