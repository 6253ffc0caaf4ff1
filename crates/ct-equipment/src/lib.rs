//! `ct-equipment` — container-handling equipment for the terminal simulator.
//!
//! | Module          | Contents                                                  |
//! |-----------------|-----------------------------------------------------------|
//! | [`status`]      | `EquipmentStatus` and its transition table                |
//! | [`equipment`]   | `Equipment`, `EquipmentKind`, `EquipmentRegistry`, handles |
//! | [`model`]       | Log-normal duration model and uniform handshake delays    |
//! | [`operation`]   | Timed operation scripts and `OperationProcess`            |
//! | [`world`]       | `EquipmentWorld` — the hooks operations need from a world |
//!
//! Three kinds of equipment exist:
//!
//! | Kind               | Type code | Home             | Default bounds |
//! |--------------------|-----------|------------------|----------------|
//! | Quay crane         | `QC`      | carrier (vessel) | 40 s – 300 s   |
//! | Transport vehicle  | `TT`      | —                | 600 s – 1800 s |
//! | Yard crane         | `RTG`     | yard zone blocks | 60 s – 600 s   |

pub mod equipment;
pub mod error;
pub mod model;
pub mod operation;
pub mod status;
pub mod world;

#[cfg(test)]
mod tests;

pub use equipment::{
    DurationBounds, Equipment, EquipmentClass, EquipmentHandle, EquipmentKind, EquipmentRegistry,
    OpKind, OpSpan, OpTimes, StampPoint,
};
pub use error::{EquipmentError, EquipmentResult};
pub use model::{DelayRange, DurationModel, HandshakeDelays, LogNormalParams};
pub use operation::{Job, OpProgress, OpStep, Operation, OperationProcess};
pub use status::EquipmentStatus;
pub use world::EquipmentWorld;
