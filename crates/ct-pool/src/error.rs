use ct_kernel::KernelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("pool {pool}: unit {key} was returned but is not held")]
    NotHeld { pool: String, key: String },

    #[error("pool {pool}: unit {key} is already stocked")]
    Duplicate { pool: String, key: String },

    #[error("kernel error: {0}")]
    Kernel(#[from] KernelError),
}

pub type PoolResult<T> = Result<T, PoolError>;
