//! `ct-input` — loads work instructions for the container-terminal
//! simulator.
//!
//! ```rust,ignore
//! let vessels = ct_input::load_vessels_csv(Path::new("wi.csv"), Some(20))?;
//! let zones = ct_input::one_crane_per_block(&vessels);
//! ```

pub mod error;
pub mod loader;

#[cfg(test)]
mod tests;

pub use error::{InputError, InputResult};
pub use loader::{load_vessels_csv, load_vessels_reader, one_crane_per_block};
