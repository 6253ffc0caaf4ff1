//! The `ResourcePool` store.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

use ct_core::EventId;
use ct_kernel::Kernel;
use tracing::trace;

use crate::{PoolError, PoolResult};

/// A unit that can live in a [`ResourcePool`].
///
/// The key identifies the unit for bookkeeping: a pool never holds two units
/// with the same key.
pub trait PoolUnit {
    type Key: Ord + Clone + fmt::Debug + fmt::Display;

    fn key(&self) -> Self::Key;
}

type Filter<T> = Box<dyn Fn(&T) -> bool>;

struct PendingRequest<T> {
    event:  EventId,
    filter: Option<Filter<T>>,
}

impl<T> PendingRequest<T> {
    fn accepts(&self, unit: &T) -> bool {
        self.filter.as_ref().is_none_or(|f| f(unit))
    }
}

/// A pool of interchangeable or distinguishable units.
pub struct ResourcePool<T: PoolUnit> {
    name:    String,
    idle:    VecDeque<T>,
    pending: VecDeque<PendingRequest<T>>,
    /// Units reserved for a fired request and not yet collected.
    granted: BTreeMap<EventId, T>,
    held:    BTreeSet<T::Key>,
    known:   BTreeSet<T::Key>,
}

impl<T: PoolUnit> ResourcePool<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name:    name.into(),
            idle:    VecDeque::new(),
            pending: VecDeque::new(),
            granted: BTreeMap::new(),
            held:    BTreeSet::new(),
            known:   BTreeSet::new(),
        }
    }

    /// Build a pool pre-stocked with `units`, in order.
    pub fn with_units(name: impl Into<String>, units: impl IntoIterator<Item = T>) -> PoolResult<Self> {
        let mut pool = Self::new(name);
        for unit in units {
            pool.stock(unit)?;
        }
        Ok(pool)
    }

    /// Add a brand-new unit to the idle list.  Meant for scenario setup,
    /// before any request is pending.
    pub fn stock(&mut self, unit: T) -> PoolResult<()> {
        let key = unit.key();
        if !self.known.insert(key.clone()) {
            return Err(PoolError::Duplicate { pool: self.name.clone(), key: key.to_string() });
        }
        self.idle.push_back(unit);
        Ok(())
    }

    // ── Acquisition ───────────────────────────────────────────────────────

    /// Request any unit.  The returned event fires once one is reserved.
    pub fn get<W, P>(&mut self, kernel: &mut Kernel<W, P>) -> PoolResult<EventId> {
        let request = kernel.event();
        match self.idle.pop_front() {
            Some(unit) => self.grant(kernel, request, unit)?,
            None => {
                trace!(pool = %self.name, request = request.0, "get queued");
                self.pending.push_back(PendingRequest { event: request, filter: None });
            }
        }
        Ok(request)
    }

    /// Request the first unit satisfying `pred`.  If none is idle, the
    /// request waits and is matched against every unit returned afterwards.
    pub fn get_filtered<W, P, F>(&mut self, kernel: &mut Kernel<W, P>, pred: F) -> PoolResult<EventId>
    where
        F: Fn(&T) -> bool + 'static,
    {
        let request = kernel.event();
        match self.idle.iter().position(&pred) {
            Some(pos) => {
                if let Some(unit) = self.idle.remove(pos) {
                    self.grant(kernel, request, unit)?;
                }
            }
            None => {
                trace!(pool = %self.name, request = request.0, "filtered get queued");
                self.pending.push_back(PendingRequest { event: request, filter: Some(Box::new(pred)) });
            }
        }
        Ok(request)
    }

    /// Collect the unit reserved for `request`.  `None` until the request
    /// has been satisfied, and after the unit was already collected.
    pub fn take(&mut self, request: EventId) -> Option<T> {
        self.granted.remove(&request)
    }

    /// Whether a unit is reserved for `request` and waiting to be collected.
    pub fn is_granted(&self, request: EventId) -> bool {
        self.granted.contains_key(&request)
    }

    // ── Release ───────────────────────────────────────────────────────────

    /// Return a held unit.  It goes to the longest-waiting request that
    /// accepts it, or back to the idle list.
    pub fn put<W, P>(&mut self, kernel: &mut Kernel<W, P>, unit: T) -> PoolResult<()> {
        let key = unit.key();
        if !self.held.remove(&key) {
            return Err(PoolError::NotHeld { pool: self.name.clone(), key: key.to_string() });
        }
        match self.pending.iter().position(|r| r.accepts(&unit)) {
            Some(pos) => {
                if let Some(request) = self.pending.remove(pos) {
                    self.grant(kernel, request.event, unit)?;
                }
            }
            None => {
                trace!(pool = %self.name, unit = %key, "unit idle");
                self.idle.push_back(unit);
            }
        }
        Ok(())
    }

    fn grant<W, P>(&mut self, kernel: &mut Kernel<W, P>, request: EventId, unit: T) -> PoolResult<()> {
        let key = unit.key();
        trace!(pool = %self.name, request = request.0, unit = %key, tick = kernel.now().0, "grant");
        self.held.insert(key);
        self.granted.insert(request, unit);
        kernel.trigger(request, None)?;
        Ok(())
    }

    // ── Introspection ─────────────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn idle_len(&self) -> usize {
        self.idle.len()
    }

    /// Units reserved or taken.
    pub fn held_len(&self) -> usize {
        self.held.len()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn total(&self) -> usize {
        self.known.len()
    }

    pub fn is_idle(&self, key: &T::Key) -> bool {
        self.idle.iter().any(|u| &u.key() == key)
    }

    pub fn is_held(&self, key: &T::Key) -> bool {
        self.held.contains(key)
    }

    /// Keys of the idle units, in idle order.
    pub fn idle_keys(&self) -> Vec<T::Key> {
        self.idle.iter().map(|u| u.key()).collect()
    }
}
