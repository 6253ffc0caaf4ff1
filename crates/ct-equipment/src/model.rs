//! Stochastic timing models.
//!
//! Operation durations are log-normal per equipment class and clamped to the
//! unit's [`DurationBounds`][crate::DurationBounds].  Handshake delays are
//! uniform draws from fixed ranges.

use ct_core::SimRng;

use crate::{EquipmentClass, EquipmentError, EquipmentResult};

// ── Log-normal durations ──────────────────────────────────────────────────────

/// `ln(duration) ~ Normal(mu, sigma)`; the median duration is `e^mu` seconds.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LogNormalParams {
    pub mu:    f64,
    pub sigma: f64,
}

impl LogNormalParams {
    pub const fn new(mu: f64, sigma: f64) -> Self {
        Self { mu, sigma }
    }

    pub fn validate(&self, what: &str) -> EquipmentResult<()> {
        if !(self.mu.is_finite() && self.sigma.is_finite() && self.sigma > 0.0) {
            return Err(EquipmentError::Config(format!(
                "{what}: log-normal parameters mu={} sigma={} are invalid",
                self.mu, self.sigma
            )));
        }
        Ok(())
    }

    pub fn sample(&self, rng: &mut SimRng) -> EquipmentResult<f64> {
        Ok(rng.lognormal(self.mu, self.sigma)?)
    }
}

/// Per-class duration distributions.
///
/// Cranes use the same distribution for fetch and put; vehicles only carry.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DurationModel {
    pub quay_crane:        LogNormalParams,
    pub transport_vehicle: LogNormalParams,
    pub yard_crane:        LogNormalParams,
}

impl Default for DurationModel {
    fn default() -> Self {
        Self {
            quay_crane:        LogNormalParams::new(4.5, 0.55),
            transport_vehicle: LogNormalParams::new(6.7, 0.45),
            yard_crane:        LogNormalParams::new(5.5, 0.35),
        }
    }
}

impl DurationModel {
    pub fn params(&self, class: EquipmentClass) -> LogNormalParams {
        match class {
            EquipmentClass::QuayCrane => self.quay_crane,
            EquipmentClass::TransportVehicle => self.transport_vehicle,
            EquipmentClass::YardCrane => self.yard_crane,
        }
    }

    /// Raw (unclamped) duration in seconds for one operation of `class`.
    pub fn sample(&self, class: EquipmentClass, rng: &mut SimRng) -> EquipmentResult<f64> {
        self.params(class).sample(rng)
    }

    pub fn validate(&self) -> EquipmentResult<()> {
        self.quay_crane.validate("quay crane")?;
        self.transport_vehicle.validate("transport vehicle")?;
        self.yard_crane.validate("yard crane")
    }
}

// ── Uniform delays ────────────────────────────────────────────────────────────

/// Uniform delay in `[lo, hi)` seconds.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DelayRange {
    pub lo: f64,
    pub hi: f64,
}

impl DelayRange {
    pub const fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    #[inline]
    pub fn sample(&self, rng: &mut SimRng) -> f64 {
        rng.uniform(self.lo, self.hi)
    }

    pub fn validate(&self, what: &str) -> EquipmentResult<()> {
        if !(self.lo.is_finite() && self.hi.is_finite() && self.lo >= 0.0 && self.lo <= self.hi) {
            return Err(EquipmentError::Config(format!(
                "{what}: delay range [{}, {}) is invalid",
                self.lo, self.hi
            )));
        }
        Ok(())
    }
}

/// Delays of the crane ↔ vehicle handshakes.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HandshakeDelays {
    /// Vehicle positions under the source crane.
    pub vehicle_ready_to_fetch:            DelayRange,
    /// Vehicle settles after the box is on.
    pub vehicle_fetch_settle:              DelayRange,
    /// Vehicle positions under the destination crane.
    pub vehicle_ready_to_put:              DelayRange,
    pub vehicle_release_from_yard_crane:   DelayRange,
    pub vehicle_release_from_quay_crane:   DelayRange,
    pub crane_ready_to_fetch_from_vehicle: DelayRange,
    pub crane_ready_to_put_to_vehicle:     DelayRange,
}

impl Default for HandshakeDelays {
    fn default() -> Self {
        Self {
            vehicle_ready_to_fetch:            DelayRange::new(1.0, 10.0),
            vehicle_fetch_settle:              DelayRange::new(1.0, 10.0),
            vehicle_ready_to_put:              DelayRange::new(1.0, 10.0),
            vehicle_release_from_yard_crane:   DelayRange::new(1.0, 2.0),
            vehicle_release_from_quay_crane:   DelayRange::new(1.0, 15.0),
            crane_ready_to_fetch_from_vehicle: DelayRange::new(10.0, 30.0),
            crane_ready_to_put_to_vehicle:     DelayRange::new(2.0, 10.0),
        }
    }
}

impl HandshakeDelays {
    pub fn validate(&self) -> EquipmentResult<()> {
        self.vehicle_ready_to_fetch.validate("vehicle ready to fetch")?;
        self.vehicle_fetch_settle.validate("vehicle fetch settle")?;
        self.vehicle_ready_to_put.validate("vehicle ready to put")?;
        self.vehicle_release_from_yard_crane.validate("vehicle release from yard crane")?;
        self.vehicle_release_from_quay_crane.validate("vehicle release from quay crane")?;
        self.crane_ready_to_fetch_from_vehicle.validate("crane ready to fetch from vehicle")?;
        self.crane_ready_to_put_to_vehicle.validate("crane ready to put to vehicle")
    }
}
