//! `ct-terminal` — move orchestration and vessel coordination for the
//! container-terminal simulator.
//!
//! # Process tree
//!
//! ```text
//! arrivals
//!   └─ vessel:{id}                 berth delay, waits all points of work
//!        └─ pow:{vessel}:{pow}     crane race vs unload_done, WI loop
//!             └─ fetch:{wi}        source crane, vehicle
//!                  ├─ carry:{wi}   handshakes, transit, destination crane
//!                  └─ put:{wi}     destination crane, move_done
//! ```
//!
//! # Modules
//!
//! | Module         | Contents                                              |
//! |----------------|-------------------------------------------------------|
//! | `model`        | Work instructions, move kinds, vessels                |
//! | `config`       | `TerminalConfig` and its delay and bound tables       |
//! | `state`        | `TerminalState`: registry, pools, work, journal       |
//! | `journal`      | Move, equipment-event and config records              |
//! | `script`       | `Script` / `ScriptProcess` process driver             |
//! | `orchestrator` | Fetch → Carry → Put stages of one instruction         |
//! | `coordinator`  | Arrivals, vessels, points of work                     |
//! | `builder`      | `TerminalBuilder`                                     |
//! | `terminal`     | `Terminal::run` and `TerminalReport`                  |
//!
//! # Cargo features
//!
//! | Feature | Effect                                             |
//! |---------|----------------------------------------------------|
//! | `serde` | Serialize/deserialize config and model types.      |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use ct_core::{IdGenerator, WiId};
//! use ct_terminal::{Container, MoveKind, NoopObserver, Position, TerminalBuilder, TerminalConfig, Vessel, WorkInstruction};
//!
//! let wi = WorkInstruction::new(WiId(1), MoveKind::Discharge, "QC01", "V001", Container::new("MSCU1234567"))
//!     .to(Position::block("A01"));
//! let mut terminal = TerminalBuilder::new(TerminalConfig::default(), IdGenerator::new())
//!     .quay_crane("QC01", "MSC")
//!     .vehicles(2)
//!     .yard_crane(vec!["A01".into()], None)
//!     .vessel(Vessel::new("V001", "MSC").pow("QC01", vec![wi]))
//!     .build()?;
//! let report = terminal.run(&mut NoopObserver)?;
//! ```

pub mod builder;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod journal;
pub mod model;
pub mod observer;
pub mod orchestrator;
pub mod script;
pub mod state;
pub mod terminal;
pub mod zones;


pub use builder::TerminalBuilder;
pub use config::{ClassBounds, OrchestrationDelays, TerminalConfig};
pub use error::{TerminalError, TerminalResult};
pub use journal::{EquipmentConfigRecord, EquipmentEventRecord, Journal, MoveRecord};
pub use model::{Container, MoveKind, PointOfWork, Position, Vessel, WiStage, WorkInstruction};
pub use observer::{NoopObserver, TerminalObserver};
pub use orchestrator::Handoff;
pub use state::TerminalState;
pub use terminal::{PowOutcome, PowReport, Terminal, TerminalReport, VesselOutcome, VesselReport};
pub use zones::YardZones;
