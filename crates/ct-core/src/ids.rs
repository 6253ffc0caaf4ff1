//! Strongly typed identifier wrappers.
//!
//! Integer ids (`EventId`, `ProcessId`, `WiId`) are `Copy + Ord + Hash` and
//! double as `Vec` indices inside the kernel.  Equipment is named by the
//! terminal (`TT001`, `RTG03`, a POW name for quay cranes), so
//! [`EquipmentId`] wraps a `String` instead.

use std::borrow::Borrow;
use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID" — the inner type's `MAX`.
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so uninitialized IDs are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Index of an event slot in the kernel's event table.
    pub struct EventId(u32);
}

typed_id! {
    /// Index of a process slot in the kernel's process table.
    pub struct ProcessId(u32);
}

typed_id! {
    /// Work-instruction id as issued by the terminal operating system.
    pub struct WiId(u64);
}

// ── EquipmentId ───────────────────────────────────────────────────────────────

/// Terminal-assigned name of a piece of container-handling equipment.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EquipmentId(pub String);

impl EquipmentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EquipmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EquipmentId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for EquipmentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for EquipmentId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// ── IdGenerator ───────────────────────────────────────────────────────────────

/// Type code prefix for transport vehicles (`TT001`).
pub const VEHICLE_PREFIX: &str = "TT";

/// Type code prefix for yard cranes (`RTG01`).
pub const YARD_CRANE_PREFIX: &str = "RTG";

/// Hands out sequential equipment names and work-instruction ids.
///
/// One generator is owned by each scenario builder, so two terminals built in
/// the same process never share numbering.
#[derive(Clone, Debug)]
pub struct IdGenerator {
    next_vehicle:    u32,
    next_yard_crane: u32,
    next_wi:         u64,
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator {
    /// All sequences start at 1.
    pub fn new() -> Self {
        Self { next_vehicle: 1, next_yard_crane: 1, next_wi: 1 }
    }

    /// Next transport-vehicle id: `TT001`, `TT002`, …
    pub fn vehicle(&mut self) -> EquipmentId {
        let id = EquipmentId(format!("{VEHICLE_PREFIX}{:03}", self.next_vehicle));
        self.next_vehicle += 1;
        id
    }

    /// Next yard-crane id: `RTG01`, `RTG02`, …
    pub fn yard_crane(&mut self) -> EquipmentId {
        let id = EquipmentId(format!("{YARD_CRANE_PREFIX}{:02}", self.next_yard_crane));
        self.next_yard_crane += 1;
        id
    }

    /// Next work-instruction id.
    pub fn wi(&mut self) -> WiId {
        let id = WiId(self.next_wi);
        self.next_wi += 1;
        id
    }
}
