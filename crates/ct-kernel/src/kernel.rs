//! The `Kernel` struct and its run loop.

use ct_core::{EventId, ProcessId, SimClock, Tick};
use tracing::{debug, error, trace};

use crate::event::{EventKind, EventSlot, EventState, Waiter};
use crate::{
    EventQueue, KernelError, KernelObserver, KernelResult, Process, ProcessError, ProcessHandle,
    ProcessStatus, Step, Wake,
};

// ── Process slot ──────────────────────────────────────────────────────────────

struct ProcessSlot<W, P> {
    name:       String,
    /// Taken out while the process runs; dropped when it finishes.
    body:       Option<Box<dyn Process<W, P>>>,
    parent:     Option<ProcessId>,
    done:       EventId,
    waiting_on: Option<EventId>,
    status:     ProcessStatus,
}

// ── RunSummary ────────────────────────────────────────────────────────────────

/// Returned by [`Kernel::run`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
    /// Clock value when the run stopped.
    pub final_tick:       Tick,
    /// Events processed during this call.
    pub events_processed: u64,
    /// Processes still pending or suspended.
    pub live_processes:   usize,
    /// Firings still queued (at or after the horizon).
    pub pending_events:   usize,
}

// ── Kernel ────────────────────────────────────────────────────────────────────

/// Discrete-event kernel over a world `W` with event payloads `P`.
///
/// All scheduling goes through `&mut Kernel`: processes receive it in
/// [`Process::resume`] alongside `&mut W`.
pub struct Kernel<W, P = ()> {
    clock:     SimClock,
    events:    Vec<EventSlot<P>>,
    queue:     EventQueue,
    processes: Vec<ProcessSlot<W, P>>,
    current:   Option<ProcessId>,
    processed: u64,
    fatal:     Option<KernelError>,
}

impl<W, P> Kernel<W, P> {
    pub fn new(clock: SimClock) -> Self {
        Self {
            clock,
            events:    Vec::new(),
            queue:     EventQueue::new(),
            processes: Vec::new(),
            current:   None,
            processed: 0,
            fatal:     None,
        }
    }

    // ── Time ──────────────────────────────────────────────────────────────

    #[inline]
    pub fn now(&self) -> Tick {
        self.clock.current_tick
    }

    #[inline]
    pub fn now_secs(&self) -> f64 {
        self.clock.now_secs()
    }

    #[inline]
    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// Earliest queued firing, if any.
    pub fn peek(&self) -> Option<Tick> {
        self.queue.next_tick()
    }

    // ── Event creation ────────────────────────────────────────────────────

    /// An event that fires `secs` seconds from now (rounded up to whole ticks).
    pub fn timeout(&mut self, secs: f64) -> KernelResult<EventId> {
        let ticks = self.clock.ticks_for_secs(secs)?;
        Ok(self.timeout_ticks(ticks))
    }

    /// An event that fires `ticks` ticks from now.
    pub fn timeout_ticks(&mut self, ticks: u64) -> EventId {
        let ev = self.alloc(EventKind::Timeout);
        self.events[ev.index()].outcome = Some(Ok(()));
        let at = self.now() + ticks;
        self.schedule(ev, at);
        ev
    }

    /// A manual event, fired later with [`trigger`][Self::trigger] or
    /// [`fail`][Self::fail].
    pub fn event(&mut self) -> EventId {
        self.alloc(EventKind::Manual)
    }

    /// Fires when the first of `members` fires.  An empty set fires
    /// immediately.
    pub fn any_of(&mut self, members: &[EventId]) -> KernelResult<EventId> {
        self.condition(EventKind::AnyOf(members.to_vec()), members)
    }

    /// Fires when all of `members` have fired; fails as soon as one fails.
    /// An empty set fires immediately.
    pub fn all_of(&mut self, members: &[EventId]) -> KernelResult<EventId> {
        let kind = EventKind::AllOf { members: members.to_vec(), remaining: members.len() };
        self.condition(kind, members)
    }

    // ── Firing ────────────────────────────────────────────────────────────

    /// Fire a manual event now, attaching `value`.
    pub fn trigger(&mut self, ev: EventId, value: Option<P>) -> KernelResult<()> {
        self.check_manual(ev)?;
        self.settle(ev, Ok(()), value);
        Ok(())
    }

    /// Like [`trigger`][Self::trigger] but a no-op on an event that already
    /// fired.  Returns whether this call fired it.
    pub fn try_trigger(&mut self, ev: EventId, value: Option<P>) -> bool {
        self.trigger(ev, value).is_ok()
    }

    /// Fire a manual event now as failed.
    pub fn fail(&mut self, ev: EventId, error: ProcessError) -> KernelResult<()> {
        self.check_manual(ev)?;
        self.settle(ev, Err(error), None);
        Ok(())
    }

    /// Mark a failure of `ev` as handled even if nobody waits for it.
    pub fn defuse(&mut self, ev: EventId) -> KernelResult<()> {
        self.slot_mut(ev)?.defused = true;
        Ok(())
    }

    // ── Processes ─────────────────────────────────────────────────────────

    /// Register a process.  It first runs when its start event is processed,
    /// at the current instant after everything already queued.
    ///
    /// The spawning process (if any) becomes the parent for failure
    /// escalation.
    pub fn spawn(&mut self, process: impl Process<W, P>) -> ProcessHandle {
        let pid = ProcessId(self.processes.len() as u32);
        let name = process.name().to_owned();
        let start = self.alloc(EventKind::Start(pid));
        let done = self.alloc(EventKind::Completion(pid));
        self.events[start.index()].waiters.push(Waiter::Process(pid));
        self.events[start.index()].outcome = Some(Ok(()));
        let now = self.now();
        self.schedule(start, now);

        trace!(tick = now.0, pid = pid.0, name = %name, "spawn");
        self.processes.push(ProcessSlot {
            name,
            body:       Some(Box::new(process)),
            parent:     self.current,
            done,
            waiting_on: Some(start),
            status:     ProcessStatus::Pending,
        });
        ProcessHandle { pid, done }
    }

    /// The process currently being resumed.
    pub fn current_process(&self) -> Option<ProcessId> {
        self.current
    }

    pub fn process_status(&self, pid: ProcessId) -> Option<ProcessStatus> {
        self.processes.get(pid.index()).map(|p| p.status)
    }

    pub fn process_name(&self, pid: ProcessId) -> Option<&str> {
        self.processes.get(pid.index()).map(|p| p.name.as_str())
    }

    /// Processes that are pending or suspended.
    pub fn live_processes(&self) -> usize {
        self.processes.iter().filter(|p| p.status.is_live()).count()
    }

    // ── Event queries ─────────────────────────────────────────────────────

    pub fn state(&self, ev: EventId) -> Option<EventState> {
        self.events.get(ev.index()).map(|s| s.state)
    }

    /// Whether the event has left `Pending` (its outcome is fixed).
    pub fn is_triggered(&self, ev: EventId) -> bool {
        self.state(ev).is_some_and(|s| s != EventState::Pending)
    }

    pub fn is_processed(&self, ev: EventId) -> bool {
        self.state(ev) == Some(EventState::Processed)
    }

    pub fn kind(&self, ev: EventId) -> Option<&EventKind> {
        self.events.get(ev.index()).map(|s| &s.kind)
    }

    /// Payload attached when the event was triggered.
    pub fn value(&self, ev: EventId) -> Option<&P> {
        self.events.get(ev.index()).and_then(|s| s.value.as_ref())
    }

    /// Move the payload out of the event.
    pub fn take_value(&mut self, ev: EventId) -> Option<P> {
        self.events.get_mut(ev.index()).and_then(|s| s.value.take())
    }

    /// For an `AnyOf` condition: which member satisfied it.
    pub fn first_fired(&self, ev: EventId) -> Option<EventId> {
        self.events.get(ev.index()).and_then(|s| s.first_fired)
    }

    /// The failure value of a failed event.
    pub fn failure(&self, ev: EventId) -> Option<&ProcessError> {
        match self.events.get(ev.index()).and_then(|s| s.outcome.as_ref()) {
            Some(Err(e)) => Some(e),
            _ => None,
        }
    }

    // ── Run loop ──────────────────────────────────────────────────────────

    /// Process events in time order until the queue is empty or the next
    /// firing is at or after `until`.  With a horizon the clock finishes at
    /// `until`.
    pub fn run<O: KernelObserver>(
        &mut self,
        world: &mut W,
        until: Option<Tick>,
        observer: &mut O,
    ) -> KernelResult<RunSummary>
    where
        W: 'static,
        P: 'static,
    {
        debug!(tick = self.now().0, until = ?until.map(|t| t.0), "kernel run");
        let mut processed = 0u64;

        while let Some(next) = self.queue.next_tick() {
            if until.is_some_and(|u| next >= u) {
                break;
            }
            let Some((tick, ev)) = self.queue.pop_next() else { break };
            self.clock.advance_to(tick);
            observer.on_event(tick, ev);
            self.process_event(ev, world);
            processed += 1;
            self.processed += 1;

            if let Some(err) = self.fatal.take() {
                error!(tick = tick.0, error = %err, "kernel stopped");
                return Err(err);
            }
        }

        if let Some(u) = until {
            self.clock.advance_to(u);
        }

        let summary = RunSummary {
            final_tick:       self.now(),
            events_processed: processed,
            live_processes:   self.live_processes(),
            pending_events:   self.queue.len(),
        };
        debug!(
            tick = summary.final_tick.0,
            events = summary.events_processed,
            live = summary.live_processes,
            "kernel run finished"
        );
        observer.on_run_end(&summary);
        Ok(summary)
    }

    /// Events processed over the kernel's lifetime.
    pub fn total_processed(&self) -> u64 {
        self.processed
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn alloc(&mut self, kind: EventKind) -> EventId {
        let ev = EventId(self.events.len() as u32);
        self.events.push(EventSlot::new(kind, self.current));
        ev
    }

    fn slot_mut(&mut self, ev: EventId) -> KernelResult<&mut EventSlot<P>> {
        self.events.get_mut(ev.index()).ok_or(KernelError::UnknownEvent(ev))
    }

    fn check_manual(&self, ev: EventId) -> KernelResult<()> {
        let slot = self.events.get(ev.index()).ok_or(KernelError::UnknownEvent(ev))?;
        if slot.kind != EventKind::Manual {
            return Err(KernelError::NotManual(ev));
        }
        if !slot.is_pending() {
            return Err(KernelError::AlreadyTriggered(ev));
        }
        Ok(())
    }

    fn schedule(&mut self, ev: EventId, at: Tick) {
        self.events[ev.index()].state = EventState::Triggered;
        self.queue.push(at, ev);
    }

    /// Fix the outcome of a pending event and queue it at the current instant.
    fn settle(&mut self, ev: EventId, outcome: Result<(), ProcessError>, value: Option<P>) {
        let slot = &mut self.events[ev.index()];
        if !slot.is_pending() {
            return;
        }
        slot.outcome = Some(outcome);
        slot.value = value;
        let now = self.now();
        self.schedule(ev, now);
    }

    fn condition(&mut self, kind: EventKind, members: &[EventId]) -> KernelResult<EventId> {
        if let Some(&bad) = members.iter().find(|m| m.index() >= self.events.len()) {
            return Err(KernelError::UnknownEvent(bad));
        }
        let cond = self.alloc(kind);
        if members.is_empty() {
            self.settle(cond, Ok(()), None);
            return Ok(cond);
        }
        for &member in members {
            if self.events[member.index()].state == EventState::Processed {
                match self.events[member.index()].outcome.clone() {
                    Some(Err(err)) => {
                        self.member_failed(cond, &err);
                    }
                    _ => self.member_fired(cond, member),
                }
            } else {
                self.events[member.index()].waiters.push(Waiter::Condition(cond));
            }
        }
        Ok(cond)
    }

    fn member_fired(&mut self, cond: EventId, member: EventId) {
        let slot = &mut self.events[cond.index()];
        if !slot.is_pending() {
            return;
        }
        let satisfied = match &mut slot.kind {
            EventKind::AnyOf(_) => {
                slot.first_fired = Some(member);
                true
            }
            EventKind::AllOf { remaining, .. } => {
                *remaining = remaining.saturating_sub(1);
                *remaining == 0
            }
            _ => false,
        };
        if satisfied {
            self.settle(cond, Ok(()), None);
        }
    }

    /// A member failed.  Returns whether the condition took over the failure.
    fn member_failed(&mut self, cond: EventId, err: &ProcessError) -> bool {
        if !self.events[cond.index()].is_pending() {
            return false;
        }
        self.settle(cond, Err(err.clone()), None);
        true
    }

    fn wake_for(&self, ev: EventId) -> Wake {
        let slot = &self.events[ev.index()];
        match (&slot.kind, &slot.outcome) {
            (_, Some(Err(err))) => Wake::Failed(ev, err.clone()),
            (EventKind::Start(_), _) => Wake::Start,
            _ => Wake::Fired(ev),
        }
    }

    fn process_event(&mut self, ev: EventId, world: &mut W)
    where
        W: 'static,
        P: 'static,
    {
        let (waiters, outcome) = {
            let slot = &mut self.events[ev.index()];
            slot.state = EventState::Processed;
            (std::mem::take(&mut slot.waiters), slot.outcome.clone().unwrap_or(Ok(())))
        };
        trace!(tick = self.now().0, event = ev.0, waiters = waiters.len(), "process event");

        match outcome {
            Ok(()) => {
                for waiter in waiters {
                    match waiter {
                        Waiter::Process(pid) => {
                            if self.processes[pid.index()].waiting_on == Some(ev) {
                                let wake = self.wake_for(ev);
                                self.resume(pid, world, wake);
                            }
                        }
                        Waiter::Condition(cond) => self.member_fired(cond, ev),
                    }
                }
            }
            Err(err) => {
                let mut handled = self.events[ev.index()].defused;
                for waiter in waiters {
                    match waiter {
                        Waiter::Process(pid) => {
                            if self.processes[pid.index()].waiting_on == Some(ev) {
                                handled = true;
                                self.resume(pid, world, Wake::Failed(ev, err.clone()));
                            }
                        }
                        Waiter::Condition(cond) => handled |= self.member_failed(cond, &err),
                    }
                }
                if !handled {
                    self.escalate(ev, err, world);
                }
            }
        }
    }

    /// Deliver an unhandled failure to the nearest live ancestor of the
    /// event's owner.
    fn escalate(&mut self, ev: EventId, err: ProcessError, world: &mut W)
    where
        W: 'static,
        P: 'static,
    {
        let mut cursor = self.events[ev.index()].owner;
        while let Some(pid) = cursor {
            let slot = &self.processes[pid.index()];
            if slot.status.is_live() {
                debug!(event = ev.0, pid = pid.0, name = %slot.name, error = %err, "interrupt");
                if let Some(waiting) = self.processes[pid.index()].waiting_on.take() {
                    self.events[waiting.index()].waiters.retain(|w| *w != Waiter::Process(pid));
                }
                self.resume(pid, world, Wake::Failed(ev, err));
                return;
            }
            cursor = slot.parent;
        }
        error!(event = ev.0, error = %err, "failure reached the top of the process tree");
        if self.fatal.is_none() {
            self.fatal = Some(KernelError::UnhandledFailure { event: ev, error: err });
        }
    }

    fn resume(&mut self, pid: ProcessId, world: &mut W, mut wake: Wake)
    where
        W: 'static,
        P: 'static,
    {
        let Some(mut body) = self.processes[pid.index()].body.take() else {
            return;
        };
        let previous = self.current.replace(pid);
        {
            let slot = &mut self.processes[pid.index()];
            slot.status = ProcessStatus::Running;
            slot.waiting_on = None;
        }

        loop {
            match body.resume(self, world, wake) {
                Step::Wait(ev) => match self.state(ev) {
                    None => {
                        let err = ProcessError::new(body.name(), format!("waited on unknown event {ev}"));
                        self.finish(pid, Err(err));
                        break;
                    }
                    Some(EventState::Processed) => {
                        wake = self.wake_for(ev);
                    }
                    Some(_) => {
                        self.events[ev.index()].waiters.push(Waiter::Process(pid));
                        let slot = &mut self.processes[pid.index()];
                        slot.status = ProcessStatus::Waiting;
                        slot.waiting_on = Some(ev);
                        slot.body = Some(body);
                        break;
                    }
                },
                Step::Done => {
                    self.finish(pid, Ok(()));
                    break;
                }
                Step::Fail(err) => {
                    self.finish(pid, Err(err));
                    break;
                }
            }
        }

        self.current = previous;
    }

    fn finish(&mut self, pid: ProcessId, outcome: Result<(), ProcessError>) {
        let slot = &mut self.processes[pid.index()];
        slot.status = if outcome.is_ok() { ProcessStatus::Completed } else { ProcessStatus::Failed };
        let done = slot.done;
        if let Err(err) = &outcome {
            debug!(tick = self.clock.current_tick.0, pid = pid.0, error = %err, "process failed");
        }
        self.settle(done, outcome, None);
    }
}
