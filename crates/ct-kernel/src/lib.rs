//! `ct-kernel` — discrete-event kernel for the container-terminal simulator.
//!
//! # Model
//!
//! ```text
//! Kernel<W, P>
//!   clock    — virtual time, advanced only by the run loop
//!   events   — Timeout | Manual | AnyOf | AllOf | process start/completion
//!   queue    — BTreeMap<Tick, VecDeque<EventId>>  (FIFO within a tick)
//!   procs    — boxed `Process<W, P>` state machines
//!
//! run(world, until):
//!   pop earliest firing → mark processed → notify waiters in order:
//!     Process waiter   → resume(kernel, world, Wake) → Step
//!     Condition waiter → re-evaluate AnyOf / AllOf
//! ```
//!
//! `W` is the shared world the processes mutate (pools, equipment, journal);
//! `P` is the payload type carried by manual events.
//!
//! # Failure propagation
//!
//! A process that returns [`Step::Fail`] fails its completion event.  Waiters
//! on that event (directly or through a condition) receive
//! [`Wake::Failed`].  If nobody waits and the event was not
//! [`defuse`][Kernel::defuse]d, the failure interrupts the nearest live
//! ancestor in the spawn chain.  With no live ancestor, [`Kernel::run`]
//! returns [`KernelError::UnhandledFailure`].
//!
//! # Quick-start
//!
//! ```rust,ignore
//! let mut kernel: Kernel<Vec<u64>> = Kernel::new(SimClock::default());
//! let mut armed = false;
//! kernel.spawn(from_fn("sleeper", move |k: &mut Kernel<Vec<u64>>, log: &mut Vec<u64>, _| {
//!     if !armed {
//!         armed = true;
//!         return Step::Wait(k.timeout_ticks(5));
//!     }
//!     log.push(k.now().0);
//!     Step::Done
//! }));
//! kernel.run(&mut log, None, &mut NoopObserver)?;
//! ```

pub mod error;
pub mod event;
pub mod kernel;
pub mod observer;
pub mod process;
pub mod queue;

#[cfg(test)]
mod tests;

pub use error::{KernelError, KernelResult};
pub use event::{EventKind, EventState};
pub use kernel::{Kernel, RunSummary};
pub use observer::{KernelObserver, NoopObserver};
pub use process::{FnProcess, Process, ProcessError, ProcessHandle, ProcessStatus, Step, Wake, from_fn};
pub use queue::EventQueue;
