//! `ct-pool` — blocking resource pools driven by `ct-kernel` events.
//!
//! A [`ResourcePool<T>`] owns its idle units.  Acquisition returns a kernel
//! event that fires once a unit has been reserved for the caller; the unit is
//! then collected with [`take`][ResourcePool::take] and later handed back
//! with [`put`][ResourcePool::put].
//!
//! ```text
//! get / get_filtered ─▶ idle match?  ─yes─▶ reserve + trigger now
//!                                    └no──▶ FIFO pending queue
//! put(unit)          ─▶ first pending request that accepts it?
//!                         ─yes─▶ reserve + trigger now
//!                         └no──▶ back to idle
//! ```
//!
//! Every unit is either idle or held (reserved or taken), never both:
//! `idle_len() + held_len() == total()` at all times.

pub mod error;
pub mod pool;


pub use error::{PoolError, PoolResult};
pub use pool::{PoolUnit, ResourcePool};
