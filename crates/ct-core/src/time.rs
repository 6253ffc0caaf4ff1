//! Virtual time model.
//!
//! # Design
//!
//! Time is a monotonically non-decreasing `Tick` counter.  The mapping to
//! seconds is held in `SimClock`:
//!
//!   secs      = tick * tick_millis / 1000
//!   wall_time = start_unix_secs + secs
//!
//! Equipment durations are sampled as real-valued seconds and rounded *up* to
//! whole ticks when scheduled, so all queue arithmetic is exact integer
//! comparison and same-instant ordering is never subject to float drift.
//!
//! The default resolution is 1 ms per tick.

use std::fmt;

use crate::{CtError, CtResult};

// ── Tick ─────────────────────────────────────────────────────────────────────

/// An absolute simulation tick counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// Return the tick `n` steps after `self`.
    #[inline]
    pub fn offset(self, n: u64) -> Tick {
        Tick(self.0.saturating_add(n))
    }

    /// Ticks elapsed from `earlier` to `self` (zero if `earlier` is later).
    #[inline]
    pub fn since(self, earlier: Tick) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl std::ops::Add<u64> for Tick {
    type Output = Tick;
    #[inline]
    fn add(self, rhs: u64) -> Tick {
        self.offset(rhs)
    }
}

impl std::ops::Sub for Tick {
    type Output = u64;
    #[inline]
    fn sub(self, rhs: Tick) -> u64 {
        self.since(rhs)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Converts between tick counts and seconds.
///
/// Owned by the kernel; everything else reads `now` through it.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    /// Unix timestamp (seconds since epoch) of tick 0.
    pub start_unix_secs: i64,
    /// Milliseconds per tick.  Default: 1.
    pub tick_millis: u32,
    /// The current tick.
    pub current_tick: Tick,
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new(0, 1)
    }
}

impl SimClock {
    /// Create a clock starting at `start_unix_secs`.  A zero resolution is
    /// bumped to 1 ms.
    pub fn new(start_unix_secs: i64, tick_millis: u32) -> Self {
        Self {
            start_unix_secs,
            tick_millis: tick_millis.max(1),
            current_tick: Tick::ZERO,
        }
    }

    /// Move the clock forward to `tick`.  Never moves backwards.
    #[inline]
    pub fn advance_to(&mut self, tick: Tick) {
        if tick > self.current_tick {
            self.current_tick = tick;
        }
    }

    /// Seconds since tick 0 represented by `tick`.
    #[inline]
    pub fn secs_at(&self, tick: Tick) -> f64 {
        tick.0 as f64 * self.tick_millis as f64 / 1_000.0
    }

    /// Elapsed simulated seconds at the current tick.
    #[inline]
    pub fn now_secs(&self) -> f64 {
        self.secs_at(self.current_tick)
    }

    /// Unix timestamp (whole seconds) corresponding to `tick`.
    #[inline]
    pub fn unix_secs_at(&self, tick: Tick) -> i64 {
        self.start_unix_secs + self.secs_at(tick).floor() as i64
    }

    /// Break elapsed time into (day, hour, minute) components.
    pub fn elapsed_dhm(&self) -> (u64, u32, u32) {
        let total_secs = self.now_secs().max(0.0) as u64;
        let days = total_secs / 86_400;
        let hours = ((total_secs % 86_400) / 3_600) as u32;
        let minutes = ((total_secs % 3_600) / 60) as u32;
        (days, hours, minutes)
    }

    // ── Tick-count helpers ────────────────────────────────────────────────

    /// How many ticks span `secs` seconds?  Rounds up so an operation never
    /// finishes early.  Negative and non-finite durations are rejected.
    pub fn ticks_for_secs(&self, secs: f64) -> CtResult<u64> {
        if !secs.is_finite() || secs < 0.0 {
            return Err(CtError::InvalidDuration(secs));
        }
        let ticks = (secs * 1_000.0 / self.tick_millis as f64).ceil();
        Ok(ticks as u64)
    }

    /// Absolute tick reached `secs` seconds after tick 0.
    pub fn tick_at_secs(&self, secs: f64) -> CtResult<Tick> {
        self.ticks_for_secs(secs).map(Tick)
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (d, h, m) = self.elapsed_dhm();
        write!(f, "{} (day {} {:02}:{:02})", self.current_tick, d, h, m)
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Run-level configuration shared by every scenario.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    /// Unix timestamp for tick 0.
    pub start_unix_secs: i64,

    /// Milliseconds per tick.  Default: 1.
    pub tick_millis: u32,

    /// Master RNG seed.  The same seed always produces identical results.
    pub seed: u64,

    /// Horizon in simulated seconds.  `None` runs until no events remain.
    /// Default: 8 hours.
    pub until_secs: Option<f64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            start_unix_secs: 0,
            tick_millis:     1,
            seed:            42,
            until_secs:      Some(8.0 * 3_600.0),
        }
    }
}

impl SimConfig {
    /// Construct a `SimClock` pre-configured for this run.
    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.start_unix_secs, self.tick_millis)
    }

    /// The tick at which the run stops (exclusive), if a horizon is set.
    pub fn end_tick(&self) -> CtResult<Option<Tick>> {
        self.until_secs
            .map(|secs| self.make_clock().tick_at_secs(secs))
            .transpose()
    }
}
