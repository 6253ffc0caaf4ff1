//! `EventQueue` — sparse per-tick firing queue.
//!
//! `BTreeMap` keyed by tick gives O(log T) insert and pop where T is the
//! number of distinct future ticks.  Within one tick a `VecDeque` keeps the
//! order in which events were scheduled, which is the kernel's tie-break rule.

use std::collections::{BTreeMap, VecDeque};

use ct_core::{EventId, Tick};

/// A priority queue mapping ticks → events scheduled to fire at that tick.
#[derive(Default)]
pub struct EventQueue {
    inner: BTreeMap<Tick, VecDeque<EventId>>,
    /// Cached total entry count for O(1) `len()`.
    total: usize,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `event` to fire at `tick`, after everything already queued
    /// for that tick.
    pub fn push(&mut self, tick: Tick, event: EventId) {
        self.inner.entry(tick).or_default().push_back(event);
        self.total += 1;
    }

    /// Remove and return the earliest scheduled firing.
    pub fn pop_next(&mut self) -> Option<(Tick, EventId)> {
        while let Some(mut entry) = self.inner.first_entry() {
            let tick = *entry.key();
            if let Some(event) = entry.get_mut().pop_front() {
                if entry.get().is_empty() {
                    entry.remove();
                }
                self.total -= 1;
                return Some((tick, event));
            }
            entry.remove();
        }
        None
    }

    /// The earliest tick with at least one queued event, or `None` if empty.
    pub fn next_tick(&self) -> Option<Tick> {
        self.inner.keys().next().copied()
    }

    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Number of distinct future ticks that have at least one queued event.
    pub fn tick_count(&self) -> usize {
        self.inner.len()
    }
}
