//! Terminal-level configuration.

use ct_core::SimConfig;
use ct_equipment::{DelayRange, DurationBounds, DurationModel, EquipmentClass, HandshakeDelays};

use crate::{TerminalError, TerminalResult};

/// Duration bounds applied to every unit of a class.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ClassBounds {
    pub quay_crane:        DurationBounds,
    pub transport_vehicle: DurationBounds,
    pub yard_crane:        DurationBounds,
}

impl Default for ClassBounds {
    fn default() -> Self {
        Self {
            quay_crane:        DurationBounds::default_for(EquipmentClass::QuayCrane),
            transport_vehicle: DurationBounds::default_for(EquipmentClass::TransportVehicle),
            yard_crane:        DurationBounds::default_for(EquipmentClass::YardCrane),
        }
    }
}

impl ClassBounds {
    pub fn for_class(&self, class: EquipmentClass) -> DurationBounds {
        match class {
            EquipmentClass::QuayCrane => self.quay_crane,
            EquipmentClass::TransportVehicle => self.transport_vehicle,
            EquipmentClass::YardCrane => self.yard_crane,
        }
    }
}

/// Delays of the orchestration protocol itself.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OrchestrationDelays {
    /// Vehicle coupling before the source crane hands over.
    pub carry_coupling: DelayRange,
    /// After a point of work wins or loses its crane race.
    pub pow_settle:     DelayRange,
    /// Vessel berthing before its points of work start.
    pub berth:          DelayRange,
}

impl Default for OrchestrationDelays {
    fn default() -> Self {
        Self {
            carry_coupling: DelayRange::new(1.0, 3.0),
            pow_settle:     DelayRange::new(0.0, 2.0),
            berth:          DelayRange::new(5.0, 10.0),
        }
    }
}

/// Everything a [`TerminalBuilder`][crate::TerminalBuilder] needs besides
/// equipment and vessels.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TerminalConfig {
    pub sim:                    SimConfig,
    /// Facility named in yard-side positions.
    pub facility_id:            Option<String>,
    /// Mean gap between vessel arrivals.  Default: 5 hours.
    pub mean_interarrival_secs: f64,
    pub bounds:                 ClassBounds,
    pub durations:              DurationModel,
    pub delays:                 HandshakeDelays,
    pub orchestration:          OrchestrationDelays,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            sim:                    SimConfig::default(),
            facility_id:            None,
            mean_interarrival_secs: 5.0 * 3_600.0,
            bounds:                 ClassBounds::default(),
            durations:              DurationModel::default(),
            delays:                 HandshakeDelays::default(),
            orchestration:          OrchestrationDelays::default(),
        }
    }
}

impl TerminalConfig {
    pub fn validate(&self) -> TerminalResult<()> {
        let config = |e: ct_equipment::EquipmentError| TerminalError::Config(e.to_string());

        if !(self.mean_interarrival_secs.is_finite() && self.mean_interarrival_secs > 0.0) {
            return Err(TerminalError::Config(format!(
                "mean inter-arrival time {} s must be positive",
                self.mean_interarrival_secs
            )));
        }
        if let Some(until) = self.sim.until_secs {
            if !(until.is_finite() && until >= 0.0) {
                return Err(TerminalError::Config(format!("horizon {until} s is invalid")));
            }
        }
        self.bounds.quay_crane.validate().map_err(config)?;
        self.bounds.transport_vehicle.validate().map_err(config)?;
        self.bounds.yard_crane.validate().map_err(config)?;
        self.durations.validate().map_err(config)?;
        self.delays.validate().map_err(config)?;
        self.orchestration.carry_coupling.validate("carry coupling").map_err(config)?;
        self.orchestration.pow_settle.validate("point-of-work settle").map_err(config)?;
        self.orchestration.berth.validate("berth").map_err(config)?;
        Ok(())
    }
}
