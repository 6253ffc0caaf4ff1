//! `ct-output` — journal writers for the container-terminal simulator.
//!
//! Two backends are provided behind Cargo features:
//!
//! | Feature   | Backend | Files created                                                  |
//! |-----------|---------|----------------------------------------------------------------|
//! | *(none)*  | CSV     | `moves.csv`, `equipment_events.csv`, `equipment_configs.csv`   |
//! | `sqlite`  | SQLite  | `output.db`                                                    |
//!
//! Both implement [`OutputWriter`] and are driven by
//! [`JournalOutputObserver`], which implements
//! `ct_terminal::TerminalObserver`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use ct_output::{CsvWriter, JournalOutputObserver};
//!
//! let mut obs = JournalOutputObserver::new(CsvWriter::new(Path::new("./output"))?);
//! let report = terminal.run(&mut obs)?;
//! if let Some(e) = obs.take_error() {
//!     eprintln!("output error: {e}");
//! }
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(test)]
mod tests;

pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::JournalOutputObserver;
pub use writer::OutputWriter;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteWriter;
