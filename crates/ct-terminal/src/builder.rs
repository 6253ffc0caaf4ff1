//! Fluent builder for constructing a [`Terminal`].

use std::collections::VecDeque;

use ct_core::{EquipmentId, IdGenerator};
use ct_equipment::{Equipment, EquipmentClass};
use ct_kernel::Kernel;

use crate::coordinator::{ArrivalGaps, ArrivalStage, PowPlan, VesselPlan};
use crate::journal::EquipmentConfigRecord;
use crate::script::ScriptProcess;
use crate::{Terminal, TerminalConfig, TerminalError, TerminalResult, TerminalState, Vessel};

/// Fluent builder for [`Terminal`].
///
/// # Required inputs
///
/// - [`TerminalConfig`]: clock, seed, horizon, duration models, delays
/// - [`IdGenerator`]: names vehicles (`TT001…`) and yard cranes (`RTG01…`)
///
/// # Optional inputs
///
/// | Method                  | Default                                   |
/// |-------------------------|-------------------------------------------|
/// | `.quay_crane(id, c)`    | none; every point of work needs one       |
/// | `.vehicles(n)`          | none                                      |
/// | `.yard_crane(zone, p)`  | none                                      |
/// | `.vessel(v)`            | none; the terminal idles                  |
/// | `.arrival_gaps(v)`      | exponential, `mean_interarrival_secs`     |
///
/// # Example
///
/// ```rust,ignore
/// let mut terminal = TerminalBuilder::new(config, IdGenerator::new())
///     .quay_crane("QC01", "MSC")
///     .vehicles(4)
///     .yard_crane(vec!["A01".into()], None)
///     .vessel(vessel)
///     .build()?;
/// let report = terminal.run(&mut NoopObserver)?;
/// ```
pub struct TerminalBuilder {
    config:      TerminalConfig,
    ids:         IdGenerator,
    quay_cranes: Vec<(EquipmentId, String)>,
    vehicles:    Vec<EquipmentId>,
    yard_cranes: Vec<(EquipmentId, Vec<String>, Option<String>)>,
    vessels:     Vec<Vessel>,
    gaps:        Option<Vec<f64>>,
}

impl TerminalBuilder {
    pub fn new(config: TerminalConfig, ids: IdGenerator) -> Self {
        Self {
            config,
            ids,
            quay_cranes: Vec::new(),
            vehicles:    Vec::new(),
            yard_cranes: Vec::new(),
            vessels:     Vec::new(),
            gaps:        None,
        }
    }

    /// Add a quay crane.  Its id is the name of the point of work it serves.
    pub fn quay_crane(mut self, id: impl Into<EquipmentId>, carrier_id: impl Into<String>) -> Self {
        self.quay_cranes.push((id.into(), carrier_id.into()));
        self
    }

    /// Add `n` transport vehicles with generated ids.
    pub fn vehicles(mut self, n: usize) -> Self {
        for _ in 0..n {
            let id = self.ids.vehicle();
            self.vehicles.push(id);
        }
        self
    }

    /// Add a yard crane serving `zone` (a list of block names).  Blocks
    /// already served by an earlier crane keep resolving to that one.
    pub fn yard_crane(mut self, zone: Vec<String>, pool_id: Option<String>) -> Self {
        let id = self.ids.yard_crane();
        self.yard_cranes.push((id, zone, pool_id));
        self
    }

    pub fn vessel(mut self, vessel: Vessel) -> Self {
        self.vessels.push(vessel);
        self
    }

    /// Replace the exponential inter-arrival draw with fixed gaps, one per
    /// vessel after the first.
    pub fn arrival_gaps(mut self, gaps: Vec<f64>) -> Self {
        self.gaps = Some(gaps);
        self
    }

    /// Validate inputs, register and pool the equipment, and return a
    /// ready-to-run [`Terminal`].
    pub fn build(self) -> TerminalResult<Terminal> {
        self.config.validate()?;
        let bounds = self.config.bounds;
        let clock = self.config.sim.make_clock();
        let until = self.config.sim.end_tick()?;
        let mean_gap = self.config.mean_interarrival_secs;
        let mut state = TerminalState::new(self.config);

        // ── Equipment ─────────────────────────────────────────────────────
        let mut units = Vec::new();
        for (id, carrier) in self.quay_cranes {
            units.push(Equipment::quay_crane(id, carrier));
        }
        for id in self.vehicles {
            units.push(Equipment::transport_vehicle(id));
        }
        for (id, zone, pool_id) in self.yard_cranes {
            state.zones.add(id.clone(), zone.clone());
            units.push(Equipment::yard_crane(id, zone, pool_id));
        }
        for unit in units {
            let class = unit.class();
            let unit = unit.with_bounds(bounds.for_class(class));
            state.journal.configs.push(EquipmentConfigRecord::from_equipment(&unit));
            let handle = unit.handle();
            state.registry.insert(unit)?;
            match handle.class() {
                EquipmentClass::QuayCrane => state.pools.quay_cranes.stock(handle)?,
                EquipmentClass::TransportVehicle => state.pools.vehicles.stock(handle)?,
                EquipmentClass::YardCrane => state.pools.yard_cranes.stock(handle)?,
            }
        }

        // ── Work ──────────────────────────────────────────────────────────
        let mut plans = Vec::with_capacity(self.vessels.len());
        for vessel in self.vessels {
            let mut pows = Vec::with_capacity(vessel.pows.len());
            for pow in vessel.pows {
                let crane = state.registry.get(&EquipmentId::new(pow.name.as_str()));
                if crane.is_none_or(|eq| eq.class() != EquipmentClass::QuayCrane) {
                    return Err(TerminalError::Config(format!(
                        "vessel {}: point of work {:?} has no quay crane",
                        vessel.id, pow.name
                    )));
                }
                let mut work = Vec::with_capacity(pow.work.len());
                for wi in pow.work {
                    if wi.pow != pow.name {
                        return Err(TerminalError::Config(format!(
                            "work instruction {} names point of work {:?} but is listed under {:?}",
                            wi.id.0, wi.pow, pow.name
                        )));
                    }
                    let id = wi.id;
                    if state.work.insert(id, wi).is_some() {
                        return Err(TerminalError::Config(format!("duplicate work instruction id {}", id.0)));
                    }
                    work.push(id);
                }
                pows.push(PowPlan { name: pow.name, work });
            }
            plans.push(VesselPlan { id: vessel.id, carrier_id: vessel.carrier_id, pows });
        }

        let gaps = match self.gaps {
            Some(gaps) => {
                let needed = plans.len().saturating_sub(1);
                if gaps.len() < needed {
                    return Err(TerminalError::Config(format!(
                        "{} arrival gaps given, {needed} needed",
                        gaps.len()
                    )));
                }
                if let Some(bad) = gaps.iter().find(|g| !(g.is_finite() && **g >= 0.0)) {
                    return Err(TerminalError::Config(format!("arrival gap {bad} s is invalid")));
                }
                ArrivalGaps::Fixed(VecDeque::from(gaps))
            }
            None => ArrivalGaps::Exponential(mean_gap),
        };

        let vessel_ids = plans.iter().map(|p| p.id.clone()).collect();
        let mut kernel = Kernel::new(clock);
        kernel.spawn(ScriptProcess::new(ArrivalStage::new(plans, gaps)));

        Ok(Terminal::new(kernel, state, until, vessel_ids))
    }
}
