//! Block → yard crane lookup.

use ct_core::EquipmentId;

/// Yard zones in registration order.  A block served by several cranes
/// resolves to the first one registered.
#[derive(Clone, Debug, Default)]
pub struct YardZones {
    entries: Vec<(EquipmentId, Vec<String>)>,
}

impl YardZones {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, crane: EquipmentId, blocks: Vec<String>) {
        self.entries.push((crane, blocks));
    }

    /// The yard crane serving `block`, if any.
    pub fn resolve(&self, block: &str) -> Option<&EquipmentId> {
        self.entries
            .iter()
            .find(|(_, blocks)| blocks.iter().any(|b| b == block))
            .map(|(id, _)| id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
