//! `ct-core` — foundational types for the container-terminal simulator.
//!
//! This crate is a dependency of every other `ct-*` crate.  It has no `ct-*`
//! dependencies and few external ones (`rand`, `rand_distr`, `thiserror`,
//! plus optional `serde`).
//!
//! # What lives here
//!
//! | Module    | Contents                                                    |
//! |-----------|-------------------------------------------------------------|
//! | [`ids`]   | `EventId`, `ProcessId`, `WiId`, `EquipmentId`, `IdGenerator` |
//! | [`time`]  | `Tick`, `SimClock`, `SimConfig`                             |
//! | [`rng`]   | `SimRng` with uniform, log-normal and exponential draws     |
//! | [`error`] | `CtError`, `CtResult`                                       |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod error;
pub mod ids;
pub mod rng;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CtError, CtResult};
pub use ids::{EquipmentId, EventId, IdGenerator, ProcessId, WiId};
pub use rng::SimRng;
pub use time::{SimClock, SimConfig, Tick};
