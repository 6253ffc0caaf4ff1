//! Event slots and their life cycle.
//!
//! ```text
//! Pending ──trigger/fail/timeout──▶ Triggered ──popped by run loop──▶ Processed
//! ```
//!
//! An event's outcome and payload are fixed when it leaves `Pending`; its
//! waiters are notified when it is `Processed`.

use ct_core::{EventId, ProcessId};

use crate::ProcessError;

/// What kind of occurrence an event represents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventKind {
    /// Fires a fixed delay after creation.
    Timeout,
    /// Fired explicitly with [`Kernel::trigger`][crate::Kernel::trigger] or
    /// [`Kernel::fail`][crate::Kernel::fail].
    Manual,
    /// Fires when the first member fires.
    AnyOf(Vec<EventId>),
    /// Fires when every member has fired.
    AllOf {
        members:   Vec<EventId>,
        remaining: usize,
    },
    /// First activation of a spawned process.
    Start(ProcessId),
    /// Completion (or failure) of a spawned process.
    Completion(ProcessId),
}

/// Position of an event in its life cycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EventState {
    Pending,
    Triggered,
    Processed,
}

/// Something to notify when an event is processed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Waiter {
    Process(ProcessId),
    Condition(EventId),
}

pub(crate) struct EventSlot<P> {
    pub kind:        EventKind,
    pub state:       EventState,
    pub outcome:     Option<Result<(), ProcessError>>,
    pub value:       Option<P>,
    pub waiters:     Vec<Waiter>,
    pub defused:     bool,
    /// For `AnyOf`: the member that satisfied the condition.
    pub first_fired: Option<EventId>,
    /// Process that was running when the event was created.  Failures nobody
    /// waits for escalate from here.
    pub owner:       Option<ProcessId>,
}

impl<P> EventSlot<P> {
    pub fn new(kind: EventKind, owner: Option<ProcessId>) -> Self {
        Self {
            kind,
            state: EventState::Pending,
            outcome: None,
            value: None,
            waiters: Vec::new(),
            defused: false,
            first_fired: None,
            owner,
        }
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.state == EventState::Pending
    }
}
