//! Column layout shared by the output backends.

use ct_core::EquipmentId;

pub const MOVE_COLUMNS: [&str; 24] = [
    "pow_id",
    "line_op",
    "carrier_visit",
    "wi_id",
    "move_id",
    "container_id",
    "category",
    "freight_kind",
    "carrier_id",
    "move_kind",
    "move_stage",
    "che_id",
    "fm_che",
    "to_che",
    "fm_block_ref",
    "fm_block_class",
    "fm_position",
    "to_block_ref",
    "to_block_class",
    "to_position",
    "dispatch_secs",
    "end_secs",
    "duration_secs",
    "logged_at_secs",
];

pub const EVENT_COLUMNS: [&str; 10] = [
    "sim_secs",
    "unix_secs",
    "pow_id",
    "wi_id",
    "che_id",
    "status",
    "move_kind",
    "move_stage",
    "description",
    "last_position",
];

pub const CONFIG_COLUMNS: [&str; 6] = ["che_id", "type_code", "min_secs", "max_secs", "yard_zone", "pool_id"];

/// Yard blocks are stored in one column, `;`-separated.
pub const ZONE_SEPARATOR: &str = ";";

pub(crate) fn che(id: Option<&EquipmentId>) -> Option<&str> {
    id.map(EquipmentId::as_str)
}

/// Empty string for a missing value.
pub(crate) fn cell<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
