//! Unit tests for ct-equipment.

#[cfg(test)]
mod status {
    use crate::EquipmentStatus::{self, *};

    const ALL: [EquipmentStatus; 5] = [Idle, Busy, Moving, Waiting, Error];

    #[test]
    fn transition_table() {
        let allowed = |from: EquipmentStatus| -> Vec<EquipmentStatus> {
            ALL.into_iter().filter(|to| from.can_transition_to(*to)).collect()
        };
        assert_eq!(allowed(Idle), ALL.to_vec());
        assert_eq!(allowed(Waiting), ALL.to_vec());
        assert_eq!(allowed(Busy), vec![Busy, Moving, Waiting, Error]);
        assert_eq!(allowed(Moving), vec![Moving, Waiting, Error]);
        assert!(allowed(Error).is_empty());
    }

    #[test]
    fn renders_upper_case() {
        assert_eq!(Waiting.to_string(), "WAITING");
        assert_eq!(EquipmentStatus::default(), Idle);
    }
}

#[cfg(test)]
mod equipment {
    use ct_core::EquipmentId;
    use proptest::prelude::*;

    use crate::{DurationBounds, Equipment, EquipmentClass, EquipmentError, EquipmentRegistry};

    #[test]
    fn default_bounds_per_class() {
        let qc = Equipment::quay_crane("QC01", "V1");
        let tt = Equipment::transport_vehicle("TT001");
        let rtg = Equipment::yard_crane("RTG01", vec!["A1".into()], None);
        assert_eq!(qc.bounds, DurationBounds { min_secs: 40.0, max_secs: 300.0 });
        assert_eq!(tt.clamp(10.0), 600.0);
        assert_eq!(rtg.clamp(10_000.0), 600.0);
        assert_eq!(qc.carrier_id(), Some("V1"));
        assert_eq!(rtg.yard_zone(), ["A1".to_string()]);
        assert!(tt.yard_zone().is_empty());
        assert_eq!(rtg.class().type_code(), "RTG");
        assert!(!EquipmentClass::TransportVehicle.is_crane());
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        assert!(matches!(DurationBounds::new(10.0, 5.0), Err(EquipmentError::Config(_))));
        assert!(DurationBounds::new(f64::NAN, 5.0).is_err());
        assert!(DurationBounds::new(0.0, 0.0).is_ok());
    }

    #[test]
    fn registry_rejects_duplicate_ids() {
        let mut reg = EquipmentRegistry::new();
        reg.insert(Equipment::transport_vehicle("TT001")).unwrap();
        let err = reg.insert(Equipment::transport_vehicle("TT001")).unwrap_err();
        assert!(matches!(err, EquipmentError::Duplicate(id) if id.as_str() == "TT001"));
        assert!(matches!(reg.require(&EquipmentId::from("TT002")), Err(EquipmentError::Unknown(_))));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn of_class_filters_in_id_order() {
        let mut reg = EquipmentRegistry::new();
        reg.insert(Equipment::transport_vehicle("TT002")).unwrap();
        reg.insert(Equipment::quay_crane("QC01", "V1")).unwrap();
        reg.insert(Equipment::transport_vehicle("TT001")).unwrap();
        let ids: Vec<_> = reg.of_class(EquipmentClass::TransportVehicle).map(|e| e.id.to_string()).collect();
        assert_eq!(ids, ["TT001", "TT002"]);
    }

    proptest! {
        #[test]
        fn prop_clamp_stays_in_bounds(lo in 0.0f64..1_000.0, width in 0.0f64..1_000.0, x in -1e6f64..1e6) {
            let b = DurationBounds::new(lo, lo + width).unwrap();
            let y = b.clamp(x);
            prop_assert!(y >= b.min_secs && y <= b.max_secs);
            if x >= b.min_secs && x <= b.max_secs {
                prop_assert_eq!(y, x);
            }
        }
    }
}

#[cfg(test)]
mod model {
    use ct_core::SimRng;

    use crate::{DelayRange, DurationModel, EquipmentClass, HandshakeDelays, LogNormalParams};

    #[test]
    fn defaults_validate() {
        DurationModel::default().validate().unwrap();
        HandshakeDelays::default().validate().unwrap();
    }

    #[test]
    fn bad_parameters_are_rejected() {
        let mut m = DurationModel::default();
        m.yard_crane = LogNormalParams::new(5.5, 0.0);
        assert!(m.validate().is_err());
        assert!(DelayRange::new(3.0, 1.0).validate("x").is_err());
    }

    #[test]
    fn samples_are_positive_and_in_range() {
        let mut rng = SimRng::new(7);
        let m = DurationModel::default();
        let d = HandshakeDelays::default();
        for _ in 0..200 {
            assert!(m.sample(EquipmentClass::QuayCrane, &mut rng).unwrap() > 0.0);
            let r = d.crane_ready_to_fetch_from_vehicle.sample(&mut rng);
            assert!((10.0..30.0).contains(&r));
        }
    }
}

#[cfg(test)]
mod operation {
    use ct_core::{EquipmentId, SimClock, SimRng, Tick, WiId};
    use ct_kernel::{Kernel, NoopObserver, ProcessStatus};

    use crate::{
        Equipment, EquipmentError, EquipmentRegistry, EquipmentStatus, EquipmentWorld, HandshakeDelays, Job,
        OpKind, OpStep, Operation, OperationProcess,
    };

    #[derive(Default)]
    struct TestWorld {
        registry: EquipmentRegistry,
        events:   Vec<(u64, String, EquipmentStatus, String)>,
    }

    impl EquipmentWorld for TestWorld {
        fn registry(&self) -> &EquipmentRegistry {
            &self.registry
        }

        fn registry_mut(&mut self) -> &mut EquipmentRegistry {
            &mut self.registry
        }

        fn record_equipment_event(
            &mut self,
            now: Tick,
            _wi: Option<WiId>,
            id: &EquipmentId,
            status: EquipmentStatus,
            description: &str,
        ) {
            self.events.push((now.0, id.to_string(), status, description.to_owned()));
        }
    }

    fn setup() -> (Kernel<TestWorld>, TestWorld) {
        let mut world = TestWorld::default();
        world.registry.insert(Equipment::quay_crane("QC01", "V1")).unwrap();
        world.registry.insert(Equipment::yard_crane("RTG01", vec!["A1".into()], None)).unwrap();
        world.registry.insert(Equipment::transport_vehicle("TT001")).unwrap();
        (Kernel::new(SimClock::new(0, 1_000)), world)
    }

    fn job(container: &str) -> Job<'_> {
        Job { wi: Some(WiId(1)), container }
    }

    #[test]
    fn fetch_runs_clamped_and_stamps_times() {
        let (mut k, mut w) = setup();
        let qc = w.registry.require(&"QC01".into()).unwrap();
        let op = Operation::fetch(qc, job("C1"), 12.0).unwrap();
        assert_eq!(op.total_delay(), 40.0);
        k.spawn(OperationProcess::new(op));
        k.run(&mut w, None, &mut NoopObserver).unwrap();

        let statuses: Vec<_> = w.events.iter().map(|e| (e.0, e.2)).collect();
        assert_eq!(statuses, vec![(0, EquipmentStatus::Busy), (40, EquipmentStatus::Waiting)]);
        assert_eq!(w.events[0].3, "FETCH C1 dispatched");

        let qc = w.registry.require(&"QC01".into()).unwrap();
        let span = qc.times.span(OpKind::Fetch);
        assert_eq!((span.dispatch, span.complete), (Some(Tick(0)), Some(Tick(40))));
        assert_eq!(qc.last_wi, Some(WiId(1)));
    }

    #[test]
    fn wrong_kind_is_rejected() {
        let (_, w) = setup();
        let tt = w.registry.require(&"TT001".into()).unwrap();
        let err = Operation::put(tt, job("C1"), 100.0).unwrap_err();
        assert!(matches!(err, EquipmentError::WrongKind { operation: "put", .. }));

        let rtg = w.registry.require(&"RTG01".into()).unwrap();
        let mut rng = SimRng::new(1);
        let d = HandshakeDelays::default();
        assert!(Operation::carry(rtg, job("C1"), 900.0, None, &d, &mut rng).is_err());
    }

    #[test]
    fn carry_names_unknown_source() {
        let (_, w) = setup();
        let tt = w.registry.require(&"TT001".into()).unwrap();
        let mut rng = SimRng::new(3);
        let op = Operation::carry(tt, job("C9"), 100.0, None, &HandshakeDelays::default(), &mut rng).unwrap();
        let texts: Vec<_> = op
            .steps()
            .filter_map(|s| if let OpStep::Status(_, t) = s { Some(t.as_str()) } else { None })
            .collect();
        assert_eq!(texts, ["CARRY ready to fetch C9 from UNK-RES", "CARRY C9 underway", "CARRY C9 arrived"]);
        // Clamped transit 600 s plus two handshake delays of 1..10 s.
        assert!(op.total_delay() >= 602.0 && op.total_delay() < 620.0);
    }

    #[test]
    fn release_delay_depends_on_target_class() {
        let (_, w) = setup();
        let tt = w.registry.require(&"TT001".into()).unwrap();
        let qc = w.registry.require(&"QC01".into()).unwrap();
        let rtg = w.registry.require(&"RTG01".into()).unwrap();
        let d = HandshakeDelays::default();
        let mut rng = SimRng::new(11);
        for _ in 0..50 {
            let from_yc = Operation::release_from(tt, job("C1"), Some(rtg), &d, &mut rng).unwrap();
            assert!(from_yc.total_delay() < 2.0);
            let from_qc = Operation::release_from(tt, job("C1"), Some(qc), &d, &mut rng).unwrap();
            assert!((1.0..15.0).contains(&from_qc.total_delay()));
        }
    }

    #[test]
    fn invalid_transition_forces_error_and_fails_the_process() {
        let (mut k, mut w) = setup();
        w.registry.require_mut(&"TT001".into()).unwrap().status = EquipmentStatus::Moving;
        let mut rng = SimRng::new(5);
        let tt = w.registry.require(&"TT001".into()).unwrap();
        let op = Operation::release_from(tt, job("C1"), None, &HandshakeDelays::default(), &mut rng).unwrap();
        let handle = k.spawn(OperationProcess::new(op));
        k.defuse(handle.done).unwrap();
        k.run(&mut w, None, &mut NoopObserver).unwrap();

        assert_eq!(k.process_status(handle.pid), Some(ProcessStatus::Failed));
        assert!(k.failure(handle.done).is_some_and(|e| e.reason.contains("MOVING")));
        let tt = w.registry.require(&"TT001".into()).unwrap();
        assert_eq!(tt.status, EquipmentStatus::Error);
        let last = w.events.last().unwrap();
        assert_eq!(last.2, EquipmentStatus::Error);
        assert!(last.3.starts_with("invalid transition MOVING -> IDLE"));
    }
}
