use ct_core::{CtError, EquipmentId};
use thiserror::Error;

use crate::{EquipmentClass, EquipmentStatus};

#[derive(Debug, Error)]
pub enum EquipmentError {
    #[error("equipment {0} not found")]
    Unknown(EquipmentId),

    #[error("equipment {0} is already registered")]
    Duplicate(EquipmentId),

    #[error("equipment {id}: invalid transition {from} -> {to}")]
    InvalidTransition {
        id:   EquipmentId,
        from: EquipmentStatus,
        to:   EquipmentStatus,
    },

    #[error("equipment {id} is a {actual}, {operation} needs a {expected}")]
    WrongKind {
        id:        EquipmentId,
        operation: &'static str,
        expected:  &'static str,
        actual:    EquipmentClass,
    },

    #[error("equipment configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] CtError),
}

pub type EquipmentResult<T> = Result<T, EquipmentError>;
