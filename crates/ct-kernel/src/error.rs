use ct_core::{CtError, EventId};
use thiserror::Error;

use crate::ProcessError;

#[derive(Debug, Error)]
pub enum KernelError {
    #[error("invalid delay: {0}")]
    Time(#[from] CtError),

    #[error("event {0} does not exist")]
    UnknownEvent(EventId),

    #[error("event {0} has already been triggered")]
    AlreadyTriggered(EventId),

    #[error("event {0} is not a manual event")]
    NotManual(EventId),

    #[error("unhandled failure of event {event}: {error}")]
    UnhandledFailure {
        event: EventId,
        error: ProcessError,
    },
}

pub type KernelResult<T> = Result<T, KernelError>;
