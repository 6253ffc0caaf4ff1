use ct_core::CtError;
use ct_equipment::EquipmentError;
use ct_kernel::{KernelError, ProcessError};
use ct_pool::PoolError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TerminalError {
    #[error("terminal configuration error: {0}")]
    Config(String),

    #[error("vessel {vessel} failed: {error}")]
    VesselFailed {
        vessel: String,
        error:  ProcessError,
    },

    #[error(transparent)]
    Equipment(#[from] EquipmentError),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Kernel(#[from] KernelError),

    #[error(transparent)]
    Core(#[from] CtError),
}

pub type TerminalResult<T> = Result<T, TerminalError>;
