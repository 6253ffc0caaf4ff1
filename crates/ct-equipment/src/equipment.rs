//! Equipment records, pool handles and the registry.

use std::collections::BTreeMap;
use std::fmt;

use ct_core::{EquipmentId, Tick, WiId};
use ct_pool::PoolUnit;

use crate::{EquipmentError, EquipmentResult, EquipmentStatus};

// ── Kind / class ──────────────────────────────────────────────────────────────

/// Kind-specific attributes.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EquipmentKind {
    /// Works one point of work on one carrier.
    QuayCrane { carrier_id: String },
    TransportVehicle,
    /// Serves the blocks in `yard_zone`.
    YardCrane {
        yard_zone: Vec<String>,
        pool_id:   Option<String>,
    },
}

impl EquipmentKind {
    pub fn class(&self) -> EquipmentClass {
        match self {
            EquipmentKind::QuayCrane { .. } => EquipmentClass::QuayCrane,
            EquipmentKind::TransportVehicle => EquipmentClass::TransportVehicle,
            EquipmentKind::YardCrane { .. } => EquipmentClass::YardCrane,
        }
    }
}

/// Field-less discriminant of [`EquipmentKind`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EquipmentClass {
    QuayCrane,
    TransportVehicle,
    YardCrane,
}

impl EquipmentClass {
    /// Short type code used in equipment names and output tables.
    pub fn type_code(self) -> &'static str {
        match self {
            EquipmentClass::QuayCrane => "QC",
            EquipmentClass::TransportVehicle => "TT",
            EquipmentClass::YardCrane => "RTG",
        }
    }

    pub fn is_crane(self) -> bool {
        !matches!(self, EquipmentClass::TransportVehicle)
    }
}

impl fmt::Display for EquipmentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EquipmentClass::QuayCrane => "quay crane",
            EquipmentClass::TransportVehicle => "transport vehicle",
            EquipmentClass::YardCrane => "yard crane",
        };
        f.write_str(name)
    }
}

// ── Bounds ────────────────────────────────────────────────────────────────────

/// Inclusive limits applied to every sampled operation duration.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DurationBounds {
    pub min_secs: f64,
    pub max_secs: f64,
}

impl DurationBounds {
    pub fn new(min_secs: f64, max_secs: f64) -> EquipmentResult<Self> {
        let bounds = Self { min_secs, max_secs };
        bounds.validate()?;
        Ok(bounds)
    }

    /// Defaults per class: QC 40–300 s, vehicle 600–1800 s, yard crane 60–600 s.
    pub fn default_for(class: EquipmentClass) -> Self {
        match class {
            EquipmentClass::QuayCrane => Self { min_secs: 40.0, max_secs: 300.0 },
            EquipmentClass::TransportVehicle => Self { min_secs: 600.0, max_secs: 1_800.0 },
            EquipmentClass::YardCrane => Self { min_secs: 60.0, max_secs: 600.0 },
        }
    }

    pub fn validate(&self) -> EquipmentResult<()> {
        let ok = self.min_secs.is_finite()
            && self.max_secs.is_finite()
            && self.min_secs >= 0.0
            && self.min_secs <= self.max_secs;
        if !ok {
            return Err(EquipmentError::Config(format!(
                "duration bounds [{}, {}] are not a valid range",
                self.min_secs, self.max_secs
            )));
        }
        Ok(())
    }

    /// Clamp `secs` into `[min_secs, max_secs]`.
    #[inline]
    pub fn clamp(&self, secs: f64) -> f64 {
        secs.max(self.min_secs).min(self.max_secs)
    }
}

// ── Timestamps ────────────────────────────────────────────────────────────────

/// Operation families that carry dispatch/completion timestamps.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OpKind {
    Fetch,
    Carry,
    Put,
}

impl OpKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OpKind::Fetch => "FETCH",
            OpKind::Carry => "CARRY",
            OpKind::Put => "PUT",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StampPoint {
    Dispatch,
    Complete,
}

/// Dispatch and completion ticks of the most recent operation of one kind.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct OpSpan {
    pub dispatch: Option<Tick>,
    pub complete: Option<Tick>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OpTimes {
    pub fetch: OpSpan,
    pub carry: OpSpan,
    pub put:   OpSpan,
}

impl OpTimes {
    pub fn span(&self, op: OpKind) -> OpSpan {
        match op {
            OpKind::Fetch => self.fetch,
            OpKind::Carry => self.carry,
            OpKind::Put => self.put,
        }
    }

    pub fn stamp(&mut self, op: OpKind, point: StampPoint, now: Tick) {
        let span = match op {
            OpKind::Fetch => &mut self.fetch,
            OpKind::Carry => &mut self.carry,
            OpKind::Put => &mut self.put,
        };
        match point {
            StampPoint::Dispatch => {
                span.dispatch = Some(now);
                span.complete = None;
            }
            StampPoint::Complete => span.complete = Some(now),
        }
    }
}

// ── Equipment ─────────────────────────────────────────────────────────────────

/// One piece of container-handling equipment.
#[derive(Clone, Debug)]
pub struct Equipment {
    pub id:      EquipmentId,
    pub kind:    EquipmentKind,
    pub bounds:  DurationBounds,
    pub status:  EquipmentStatus,
    pub times:   OpTimes,
    /// Work instruction of the most recent status change.
    pub last_wi: Option<WiId>,
}

impl Equipment {
    pub fn new(id: EquipmentId, kind: EquipmentKind) -> Self {
        let bounds = DurationBounds::default_for(kind.class());
        Self {
            id,
            kind,
            bounds,
            status: EquipmentStatus::Idle,
            times: OpTimes::default(),
            last_wi: None,
        }
    }

    pub fn quay_crane(id: impl Into<EquipmentId>, carrier_id: impl Into<String>) -> Self {
        Self::new(id.into(), EquipmentKind::QuayCrane { carrier_id: carrier_id.into() })
    }

    pub fn transport_vehicle(id: impl Into<EquipmentId>) -> Self {
        Self::new(id.into(), EquipmentKind::TransportVehicle)
    }

    pub fn yard_crane(id: impl Into<EquipmentId>, yard_zone: Vec<String>, pool_id: Option<String>) -> Self {
        Self::new(id.into(), EquipmentKind::YardCrane { yard_zone, pool_id })
    }

    pub fn with_bounds(mut self, bounds: DurationBounds) -> Self {
        self.bounds = bounds;
        self
    }

    #[inline]
    pub fn class(&self) -> EquipmentClass {
        self.kind.class()
    }

    #[inline]
    pub fn clamp(&self, secs: f64) -> f64 {
        self.bounds.clamp(secs)
    }

    /// Blocks served by a yard crane; empty for other kinds.
    pub fn yard_zone(&self) -> &[String] {
        match &self.kind {
            EquipmentKind::YardCrane { yard_zone, .. } => yard_zone.as_slice(),
            _ => &[],
        }
    }

    pub fn pool_id(&self) -> Option<&str> {
        match &self.kind {
            EquipmentKind::YardCrane { pool_id, .. } => pool_id.as_deref(),
            _ => None,
        }
    }

    pub fn carrier_id(&self) -> Option<&str> {
        match &self.kind {
            EquipmentKind::QuayCrane { carrier_id } => Some(carrier_id.as_str()),
            _ => None,
        }
    }

    /// The pool token standing for this unit.
    pub fn handle(&self) -> EquipmentHandle {
        EquipmentHandle { id: self.id.clone(), class: self.class() }
    }
}

// ── EquipmentHandle ───────────────────────────────────────────────────────────

/// Exclusive token for one unit, moved in and out of a `ResourcePool`.
///
/// Not `Clone`: whoever owns the handle is the unit's single holder.
#[derive(Debug, PartialEq, Eq)]
pub struct EquipmentHandle {
    id:    EquipmentId,
    class: EquipmentClass,
}

impl EquipmentHandle {
    #[inline]
    pub fn id(&self) -> &EquipmentId {
        &self.id
    }

    #[inline]
    pub fn class(&self) -> EquipmentClass {
        self.class
    }
}

impl PoolUnit for EquipmentHandle {
    type Key = EquipmentId;

    fn key(&self) -> EquipmentId {
        self.id.clone()
    }
}

// ── EquipmentRegistry ─────────────────────────────────────────────────────────

/// All equipment of a terminal, keyed by id.
#[derive(Clone, Debug, Default)]
pub struct EquipmentRegistry {
    inner: BTreeMap<EquipmentId, Equipment>,
}

impl EquipmentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, equipment: Equipment) -> EquipmentResult<()> {
        if self.inner.contains_key(&equipment.id) {
            return Err(EquipmentError::Duplicate(equipment.id));
        }
        self.inner.insert(equipment.id.clone(), equipment);
        Ok(())
    }

    pub fn get(&self, id: &EquipmentId) -> Option<&Equipment> {
        self.inner.get(id)
    }

    pub fn get_mut(&mut self, id: &EquipmentId) -> Option<&mut Equipment> {
        self.inner.get_mut(id)
    }

    /// Like [`get`][Self::get] but an unknown id is an error.
    pub fn require(&self, id: &EquipmentId) -> EquipmentResult<&Equipment> {
        self.inner.get(id).ok_or_else(|| EquipmentError::Unknown(id.clone()))
    }

    pub fn require_mut(&mut self, id: &EquipmentId) -> EquipmentResult<&mut Equipment> {
        self.inner.get_mut(id).ok_or_else(|| EquipmentError::Unknown(id.clone()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Equipment> {
        self.inner.values()
    }

    /// Equipment of one class, in id order.
    pub fn of_class(&self, class: EquipmentClass) -> impl Iterator<Item = &Equipment> {
        self.inner.values().filter(move |e| e.class() == class)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
