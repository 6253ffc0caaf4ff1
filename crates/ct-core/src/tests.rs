//! Unit tests for ct-core primitives.

#[cfg(test)]
mod ids {
    use crate::{EquipmentId, EventId, IdGenerator, ProcessId, WiId};

    #[test]
    fn index_roundtrip() {
        let id = EventId(42);
        assert_eq!(id.index(), 42);
        assert_eq!(EventId::try_from(42usize).unwrap(), id);
    }

    #[test]
    fn invalid_sentinels_are_max() {
        assert_eq!(EventId::INVALID.0, u32::MAX);
        assert_eq!(ProcessId::INVALID.0, u32::MAX);
        assert_eq!(WiId::INVALID.0, u64::MAX);
        assert_eq!(WiId::default(), WiId::INVALID);
    }

    #[test]
    fn display() {
        assert_eq!(ProcessId(7).to_string(), "ProcessId(7)");
        assert_eq!(EquipmentId::from("QC01").to_string(), "QC01");
    }

    #[test]
    fn generator_formats_equipment_names() {
        let mut ids = IdGenerator::new();
        assert_eq!(ids.vehicle().as_str(), "TT001");
        assert_eq!(ids.vehicle().as_str(), "TT002");
        assert_eq!(ids.yard_crane().as_str(), "RTG01");
        assert_eq!(ids.wi(), WiId(1));
        assert_eq!(ids.wi(), WiId(2));
    }

    #[test]
    fn generators_are_independent() {
        let mut a = IdGenerator::new();
        let mut b = IdGenerator::new();
        a.vehicle();
        a.vehicle();
        assert_eq!(b.vehicle().as_str(), "TT001");
    }
}

#[cfg(test)]
mod time {
    use crate::{CtError, SimClock, SimConfig, Tick};

    #[test]
    fn tick_arithmetic() {
        let t = Tick(10);
        assert_eq!(t + 5, Tick(15));
        assert_eq!(t.offset(3), Tick(13));
        assert_eq!(Tick(15) - Tick(10), 5u64);
        assert_eq!(Tick(3).since(Tick(10)), 0);
    }

    #[test]
    fn ticks_round_up() {
        let clock = SimClock::new(0, 1_000); // 1 tick = 1 s
        assert_eq!(clock.ticks_for_secs(0.0).unwrap(), 0);
        assert_eq!(clock.ticks_for_secs(1.0).unwrap(), 1);
        assert_eq!(clock.ticks_for_secs(1.2).unwrap(), 2);
    }

    #[test]
    fn millisecond_resolution() {
        let clock = SimClock::default();
        assert_eq!(clock.ticks_for_secs(2.5).unwrap(), 2_500);
        assert!((clock.secs_at(Tick(1_500)) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn negative_and_nan_rejected() {
        let clock = SimClock::default();
        assert!(matches!(clock.ticks_for_secs(-1.0), Err(CtError::InvalidDuration(_))));
        assert!(clock.ticks_for_secs(f64::NAN).is_err());
        assert!(clock.ticks_for_secs(f64::INFINITY).is_err());
    }

    #[test]
    fn clock_never_moves_backwards() {
        let mut clock = SimClock::default();
        clock.advance_to(Tick(100));
        clock.advance_to(Tick(50));
        assert_eq!(clock.current_tick, Tick(100));
    }

    #[test]
    fn clock_dhm() {
        let mut clock = SimClock::new(0, 1_000);
        clock.advance_to(Tick(25 * 3_600 + 60));
        assert_eq!(clock.elapsed_dhm(), (1, 1, 1));
    }

    #[test]
    fn unix_offset() {
        let mut clock = SimClock::new(1_700_000_000, 1);
        clock.advance_to(Tick(2_999));
        assert_eq!(clock.unix_secs_at(clock.current_tick), 1_700_000_002);
    }

    #[test]
    fn config_end_tick() {
        let cfg = SimConfig::default();
        assert_eq!(cfg.end_tick().unwrap(), Some(Tick(8 * 3_600 * 1_000)));
        let open = SimConfig { until_secs: None, ..SimConfig::default() };
        assert_eq!(open.end_tick().unwrap(), None);
    }
}

#[cfg(test)]
mod rng {
    use proptest::prelude::*;

    use crate::SimRng;

    #[test]
    fn same_seed_same_stream() {
        let mut a = SimRng::new(7);
        let mut b = SimRng::new(7);
        for _ in 0..16 {
            assert_eq!(a.uniform(1.0, 10.0).to_bits(), b.uniform(1.0, 10.0).to_bits());
        }
    }

    #[test]
    fn degenerate_uniform_returns_low() {
        let mut rng = SimRng::new(1);
        assert_eq!(rng.uniform(3.0, 3.0), 3.0);
        assert_eq!(rng.uniform(5.0, 2.0), 5.0);
    }

    #[test]
    fn bad_distribution_parameters_error() {
        let mut rng = SimRng::new(1);
        assert!(rng.lognormal(4.5, -1.0).is_err());
        assert!(rng.exponential(0.0).is_err());
        assert!(rng.exponential(f64::NAN).is_err());
    }

    #[test]
    fn lognormal_median_near_scale() {
        let mut rng = SimRng::new(99);
        let mut draws: Vec<f64> = (0..2_001).map(|_| rng.lognormal(4.5, 0.55).unwrap()).collect();
        draws.sort_by(|a, b| a.total_cmp(b));
        let median = draws[1_000];
        let expected = 4.5f64.exp();
        assert!((median - expected).abs() / expected < 0.1, "median {median}");
    }

    #[test]
    fn exponential_mean_near_target() {
        let mut rng = SimRng::new(5);
        let n = 4_000;
        let mean = (0..n).map(|_| rng.exponential(18_000.0).unwrap()).sum::<f64>() / n as f64;
        assert!((mean - 18_000.0).abs() / 18_000.0 < 0.1, "mean {mean}");
    }

    proptest! {
        #[test]
        fn prop_uniform_within_bounds(seed in any::<u64>(), lo in 0.0f64..100.0, width in 0.001f64..100.0) {
            let mut rng = SimRng::new(seed);
            let x = rng.uniform(lo, lo + width);
            prop_assert!(x >= lo && x < lo + width);
        }

        #[test]
        fn prop_exponential_positive(seed in any::<u64>(), mean in 1.0f64..20_000.0) {
            let mut rng = SimRng::new(seed);
            prop_assert!(rng.exponential(mean).unwrap() >= 0.0);
        }
    }
}
