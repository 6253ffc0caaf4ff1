//! Unit tests for ct-kernel.

#[cfg(test)]
mod queue {
    use ct_core::{EventId, Tick};

    use crate::EventQueue;

    #[test]
    fn pops_in_time_then_insertion_order() {
        let mut q = EventQueue::new();
        q.push(Tick(5), EventId(0));
        q.push(Tick(2), EventId(1));
        q.push(Tick(5), EventId(2));
        q.push(Tick(2), EventId(3));
        assert_eq!(q.len(), 4);
        assert_eq!(q.tick_count(), 2);

        let order: Vec<_> = std::iter::from_fn(|| q.pop_next()).collect();
        assert_eq!(
            order,
            vec![(Tick(2), EventId(1)), (Tick(2), EventId(3)), (Tick(5), EventId(0)), (Tick(5), EventId(2))]
        );
        assert!(q.is_empty());
        assert_eq!(q.next_tick(), None);
    }
}

#[cfg(test)]
mod scheduling {
    use ct_core::{SimClock, Tick};
    use proptest::prelude::*;

    use crate::{Kernel, KernelError, NoopObserver, Step, from_fn};

    type Log = Vec<(u64, &'static str)>;

    fn kernel() -> Kernel<Log> {
        Kernel::new(SimClock::new(0, 1_000)) // 1 tick = 1 s
    }

    /// Spawn a process that sleeps `secs` then logs `name`.
    fn sleeper(k: &mut Kernel<Log>, name: &'static str, secs: f64) {
        let mut armed = false;
        k.spawn(from_fn(name, move |k: &mut Kernel<Log>, log: &mut Log, _| {
            if !armed {
                armed = true;
                return match k.timeout(secs) {
                    Ok(ev) => Step::Wait(ev),
                    Err(e) => Step::Fail(crate::ProcessError::new(name, e.to_string())),
                };
            }
            log.push((k.now().0, name));
            Step::Done
        }));
    }

    #[test]
    fn timeouts_fire_in_time_order() {
        let mut k = kernel();
        let mut log = Log::new();
        sleeper(&mut k, "c", 30.0);
        sleeper(&mut k, "a", 10.0);
        sleeper(&mut k, "b", 20.0);
        let summary = k.run(&mut log, None, &mut NoopObserver).unwrap();
        assert_eq!(log, vec![(10, "a"), (20, "b"), (30, "c")]);
        assert_eq!(summary.final_tick, Tick(30));
        assert_eq!(summary.live_processes, 0);
    }

    #[test]
    fn same_instant_is_fifo() {
        let mut k = kernel();
        let mut log = Log::new();
        sleeper(&mut k, "first", 5.0);
        sleeper(&mut k, "second", 5.0);
        sleeper(&mut k, "third", 5.0);
        k.run(&mut log, None, &mut NoopObserver).unwrap();
        let names: Vec<_> = log.iter().map(|(_, n)| *n).collect();
        assert_eq!(names, ["first", "second", "third"]);
    }

    #[test]
    fn durations_round_up_to_ticks() {
        let mut k = kernel();
        let mut log = Log::new();
        sleeper(&mut k, "x", 2.1);
        k.run(&mut log, None, &mut NoopObserver).unwrap();
        assert_eq!(log, vec![(3, "x")]);
    }

    #[test]
    fn run_stops_before_horizon_and_parks_clock_there() {
        let mut k = kernel();
        let mut log = Log::new();
        sleeper(&mut k, "early", 5.0);
        sleeper(&mut k, "on_horizon", 10.0);
        sleeper(&mut k, "late", 15.0);
        let summary = k.run(&mut log, Some(Tick(10)), &mut NoopObserver).unwrap();
        assert_eq!(log, vec![(5, "early")]);
        assert_eq!(summary.final_tick, Tick(10));
        assert_eq!(summary.live_processes, 2);
        assert_eq!(summary.pending_events, 2);

        // Resuming without a horizon finishes the rest.
        k.run(&mut log, None, &mut NoopObserver).unwrap();
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn negative_and_nan_delays_are_rejected() {
        let mut k = kernel();
        assert!(matches!(k.timeout(-1.0), Err(KernelError::Time(_))));
        assert!(k.timeout(f64::NAN).is_err());
        assert!(k.timeout(0.0).is_ok());
    }

    #[test]
    fn empty_run_is_ok() {
        let mut k = kernel();
        let summary = k.run(&mut Log::new(), None, &mut NoopObserver).unwrap();
        assert_eq!(summary.events_processed, 0);
        assert_eq!(summary.final_tick, Tick(0));
    }

    proptest! {
        #[test]
        fn prop_firing_order_is_stable_sort_of_delays(delays in proptest::collection::vec(0u8..20, 1..24)) {
            let names: [&'static str; 24] = [
                "p0", "p1", "p2", "p3", "p4", "p5", "p6", "p7", "p8", "p9", "p10", "p11",
                "p12", "p13", "p14", "p15", "p16", "p17", "p18", "p19", "p20", "p21", "p22", "p23",
            ];
            let mut k = kernel();
            let mut log = Log::new();
            for (i, d) in delays.iter().enumerate() {
                sleeper(&mut k, names[i], *d as f64);
            }
            k.run(&mut log, None, &mut NoopObserver).unwrap();

            let mut expected: Vec<(u64, &'static str)> =
                delays.iter().enumerate().map(|(i, d)| (*d as u64, names[i])).collect();
            expected.sort_by_key(|(t, _)| *t);
            prop_assert_eq!(log, expected);
        }
    }
}

#[cfg(test)]
mod events {
    use ct_core::{EventId, SimClock};

    use crate::{EventState, Kernel, KernelError, NoopObserver, Step, Wake, from_fn};

    type Seen = Vec<(u64, String)>;

    fn kernel() -> Kernel<Seen, &'static str> {
        Kernel::new(SimClock::new(0, 1_000))
    }

    #[test]
    fn manual_event_carries_payload_once() {
        let mut k = kernel();
        let ev = k.event();
        assert_eq!(k.state(ev), Some(EventState::Pending));
        k.trigger(ev, Some("hello")).unwrap();
        assert!(k.is_triggered(ev));
        assert!(matches!(k.trigger(ev, Some("again")), Err(KernelError::AlreadyTriggered(_))));
        assert!(!k.try_trigger(ev, Some("again")));
        assert_eq!(k.value(ev), Some(&"hello"));
        assert_eq!(k.take_value(ev), Some("hello"));
        assert_eq!(k.value(ev), None);
    }

    #[test]
    fn only_manual_events_can_be_triggered() {
        let mut k = kernel();
        let t = k.timeout_ticks(3);
        assert!(matches!(k.trigger(t, None), Err(KernelError::NotManual(_))));
        assert!(matches!(k.trigger(EventId(999), None), Err(KernelError::UnknownEvent(_))));
    }

    #[test]
    fn try_trigger_is_idempotent() {
        let mut k = kernel();
        let ev = k.event();
        assert!(k.try_trigger(ev, None));
        assert!(!k.try_trigger(ev, None));
        assert!(!k.try_trigger(ev, None));
    }

    #[test]
    fn waiter_sees_payload_at_trigger_instant() {
        let mut k = kernel();
        let mut seen = Seen::new();
        let ev = k.event();

        let mut waiting = false;
        k.spawn(from_fn("consumer", move |k: &mut Kernel<Seen, &'static str>, seen: &mut Seen, wake| {
            if !waiting {
                waiting = true;
                return Step::Wait(ev);
            }
            assert_eq!(wake, Wake::Fired(ev));
            let v = k.take_value(ev).unwrap_or("none");
            seen.push((k.now().0, v.to_string()));
            Step::Done
        }));

        let mut stage = 0;
        k.spawn(from_fn("producer", move |k: &mut Kernel<Seen, &'static str>, _: &mut Seen, _| {
            stage += 1;
            match stage {
                1 => Step::Wait(k.timeout_ticks(7)),
                _ => {
                    k.trigger(ev, Some("box-1")).unwrap();
                    Step::Done
                }
            }
        }));

        k.run(&mut seen, None, &mut NoopObserver).unwrap();
        assert_eq!(seen, vec![(7, "box-1".to_string())]);
    }

    #[test]
    fn waiting_on_processed_event_resumes_immediately() {
        let mut k = kernel();
        let mut seen = Seen::new();
        let ev = k.event();
        k.trigger(ev, None).unwrap();

        let mut stage = 0;
        k.spawn(from_fn("late", move |k: &mut Kernel<Seen, &'static str>, seen: &mut Seen, _| {
            stage += 1;
            match stage {
                1 => Step::Wait(k.timeout_ticks(4)),
                2 => Step::Wait(ev), // processed at t=0
                _ => {
                    seen.push((k.now().0, "resumed".into()));
                    Step::Done
                }
            }
        }));
        k.run(&mut seen, None, &mut NoopObserver).unwrap();
        assert_eq!(seen, vec![(4, "resumed".to_string())]);
    }

    #[test]
    fn any_of_records_first_member() {
        let mut k = kernel();
        let slow = k.timeout_ticks(10);
        let fast = k.timeout_ticks(3);
        let any = k.any_of(&[slow, fast]).unwrap();
        k.run(&mut Seen::new(), None, &mut NoopObserver).unwrap();
        assert!(k.is_processed(any));
        assert_eq!(k.first_fired(any), Some(fast));
    }

    #[test]
    fn any_of_with_processed_member_fires_at_creation_instant() {
        let mut k = kernel();
        let mut seen = Seen::new();
        let done = k.event();
        k.trigger(done, None).unwrap();
        let never = k.event();

        let mut stage = 0;
        k.spawn(from_fn("racer", move |k: &mut Kernel<Seen, &'static str>, seen: &mut Seen, _| {
            stage += 1;
            match stage {
                1 => Step::Wait(k.timeout_ticks(2)),
                2 => Step::Wait(k.any_of(&[never, done]).unwrap()),
                _ => {
                    seen.push((k.now().0, "raced".into()));
                    Step::Done
                }
            }
        }));
        k.run(&mut seen, None, &mut NoopObserver).unwrap();
        assert_eq!(seen, vec![(2, "raced".to_string())]);
    }

    #[test]
    fn all_of_waits_for_every_member() {
        let mut k = kernel();
        let a = k.timeout_ticks(3);
        let b = k.timeout_ticks(9);
        let all = k.all_of(&[a, b]).unwrap();
        let mut seen = Seen::new();
        let mut waiting = false;
        k.spawn(from_fn("joiner", move |k: &mut Kernel<Seen, &'static str>, seen: &mut Seen, _| {
            if !waiting {
                waiting = true;
                return Step::Wait(all);
            }
            seen.push((k.now().0, "joined".into()));
            Step::Done
        }));
        k.run(&mut seen, None, &mut NoopObserver).unwrap();
        assert_eq!(seen, vec![(9, "joined".to_string())]);
    }

    #[test]
    fn empty_conditions_fire_immediately() {
        let mut k = kernel();
        let all = k.all_of(&[]).unwrap();
        let any = k.any_of(&[]).unwrap();
        assert!(k.is_triggered(all));
        assert!(k.is_triggered(any));
        k.run(&mut Seen::new(), None, &mut NoopObserver).unwrap();
        assert!(k.is_processed(all));
    }

    #[test]
    fn condition_rejects_unknown_member() {
        let mut k = kernel();
        assert!(matches!(k.all_of(&[EventId(42)]), Err(KernelError::UnknownEvent(_))));
    }
}

#[cfg(test)]
mod processes {
    use ct_core::SimClock;

    use crate::{
        Kernel, KernelError, NoopObserver, ProcessError, ProcessHandle, ProcessStatus, Step, Wake,
        from_fn,
    };

    type Seen = Vec<String>;

    fn kernel() -> Kernel<Seen> {
        Kernel::new(SimClock::new(0, 1_000))
    }

    fn failing_child(k: &mut Kernel<Seen>, after: u64) -> ProcessHandle {
        let mut armed = false;
        k.spawn(from_fn("child", move |k: &mut Kernel<Seen>, _: &mut Seen, _| {
            if !armed {
                armed = true;
                return Step::Wait(k.timeout_ticks(after));
            }
            Step::Fail(ProcessError::new("child", "crane jammed"))
        }))
    }

    #[test]
    fn parent_waiting_on_child_sees_completion() {
        let mut k = kernel();
        let mut seen = Seen::new();
        let mut child = None;
        k.spawn(from_fn("parent", move |k: &mut Kernel<Seen>, seen: &mut Seen, wake| {
            match child {
                None => {
                    let mut armed = false;
                    let h = k.spawn(from_fn("child", move |k: &mut Kernel<Seen>, _: &mut Seen, _| {
                        if !armed {
                            armed = true;
                            return Step::Wait(k.timeout_ticks(5));
                        }
                        Step::Done
                    }));
                    child = Some(h);
                    Step::Wait(h.done)
                }
                Some(h) => {
                    assert_eq!(wake, Wake::Fired(h.done));
                    seen.push(format!("child done at {}", k.now().0));
                    Step::Done
                }
            }
        }));
        k.run(&mut seen, None, &mut NoopObserver).unwrap();
        assert_eq!(seen, vec!["child done at 5".to_string()]);
    }

    #[test]
    fn waiter_receives_child_failure() {
        let mut k = kernel();
        let mut seen = Seen::new();
        let mut child: Option<ProcessHandle> = None;
        k.spawn(from_fn("parent", move |k: &mut Kernel<Seen>, seen: &mut Seen, wake| {
            if child.is_none() {
                let h = failing_child(k, 2);
                child = Some(h);
                return Step::Wait(h.done);
            }
            if let Wake::Failed(_, err) = wake {
                seen.push(err.reason);
            }
            Step::Done
        }));
        k.run(&mut seen, None, &mut NoopObserver).unwrap();
        assert_eq!(seen, vec!["crane jammed".to_string()]);
    }

    #[test]
    fn unwatched_failure_interrupts_live_parent() {
        let mut k = kernel();
        let mut seen = Seen::new();
        let mut stage = 0;
        let parent = k.spawn(from_fn("parent", move |k: &mut Kernel<Seen>, seen: &mut Seen, wake| {
            stage += 1;
            match (stage, wake) {
                (1, _) => {
                    failing_child(k, 2);
                    Step::Wait(k.timeout_ticks(100))
                }
                (_, Wake::Failed(_, err)) => {
                    seen.push(format!("interrupted at {}: {}", k.now().0, err.reason));
                    Step::Done
                }
                _ => {
                    seen.push("slept through".into());
                    Step::Done
                }
            }
        }));
        k.run(&mut seen, None, &mut NoopObserver).unwrap();
        assert_eq!(seen, vec!["interrupted at 2: crane jammed".to_string()]);
        assert_eq!(k.process_status(parent.pid), Some(ProcessStatus::Completed));
    }

    #[test]
    fn failure_skips_dead_parent_and_reaches_grandparent() {
        let mut k = kernel();
        let mut seen = Seen::new();
        let mut stage = 0;
        k.spawn(from_fn("grandparent", move |k: &mut Kernel<Seen>, seen: &mut Seen, wake| {
            stage += 1;
            if stage == 1 {
                // The middle process spawns the failing child and exits at once.
                k.spawn(from_fn("parent", |k: &mut Kernel<Seen>, _: &mut Seen, _| {
                    failing_child(k, 3);
                    Step::Done
                }));
                return Step::Wait(k.timeout_ticks(50));
            }
            if let Wake::Failed(_, err) = wake {
                seen.push(err.process);
            }
            Step::Done
        }));
        k.run(&mut seen, None, &mut NoopObserver).unwrap();
        assert_eq!(seen, vec!["child".to_string()]);
    }

    #[test]
    fn orphan_failure_stops_the_run() {
        let mut k = kernel();
        let h = failing_child(&mut k, 1);
        let err = k.run(&mut Seen::new(), None, &mut NoopObserver).unwrap_err();
        match err {
            KernelError::UnhandledFailure { event, error } => {
                assert_eq!(event, h.done);
                assert_eq!(error.reason, "crane jammed");
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn defused_failure_is_contained() {
        let mut k = kernel();
        let h = failing_child(&mut k, 1);
        k.defuse(h.done).unwrap();
        k.run(&mut Seen::new(), None, &mut NoopObserver).unwrap();
        assert_eq!(k.process_status(h.pid), Some(ProcessStatus::Failed));
        assert_eq!(k.failure(h.done).map(|e| e.reason.as_str()), Some("crane jammed"));
    }

    #[test]
    fn all_of_fails_fast_on_member_failure() {
        let mut k = kernel();
        let mut seen = Seen::new();
        let mut stage = 0;
        k.spawn(from_fn("joiner", move |k: &mut Kernel<Seen>, seen: &mut Seen, wake| {
            stage += 1;
            if stage == 1 {
                let bad = failing_child(k, 2);
                let slow = k.timeout_ticks(40);
                return Step::Wait(k.all_of(&[slow, bad.done]).unwrap());
            }
            if let Wake::Failed(_, _) = wake {
                seen.push(format!("failed at {}", k.now().0));
            }
            Step::Done
        }));
        k.run(&mut seen, None, &mut NoopObserver).unwrap();
        assert_eq!(seen, vec!["failed at 2".to_string()]);
    }

    #[test]
    fn spawn_starts_at_current_instant_after_queued_work() {
        let mut k = kernel();
        let mut seen = Seen::new();
        k.spawn(from_fn("outer", |k: &mut Kernel<Seen>, seen: &mut Seen, _| {
            seen.push("outer".into());
            k.spawn(from_fn("inner", |_: &mut Kernel<Seen>, seen: &mut Seen, wake| {
                assert_eq!(wake, Wake::Start);
                seen.push("inner".into());
                Step::Done
            }));
            seen.push("outer-after-spawn".into());
            Step::Done
        }));
        k.run(&mut seen, None, &mut NoopObserver).unwrap();
        assert_eq!(seen, ["outer", "outer-after-spawn", "inner"]);
    }
}
