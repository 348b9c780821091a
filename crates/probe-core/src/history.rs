//! Session history of created measurements.
//!
//! A fixed number of slots is recycled in creation order. The creation
//! counter keeps growing past the capacity, so a reference to an item that
//! was recycled fails with [`ProbeError::IndexOutOfRange`] while a reference
//! into an empty history fails with [`ProbeError::NoPreviousMeasurements`].

use crate::{ProbeError, Result};
use chrono::{DateTime, Utc};
use probe_types::{Measurement, MeasurementStatus};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::trace;

/// Number of measurements kept per session.
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// A measurement created during this session.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryItem {
    /// Identifier assigned by the measurement API.
    pub id: String,
    /// Overall status, never moves back to in-progress.
    pub status: MeasurementStatus,
    /// Per-probe statuses while a multi-probe measurement is running.
    pub probe_status: Vec<MeasurementStatus>,
    pub started_at: DateTime<Utc>,
    /// Some probes finished while others are still running.
    pub partially_finished: bool,
}

impl HistoryItem {
    pub fn new(id: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            status: MeasurementStatus::InProgress,
            probe_status: Vec::new(),
            started_at,
            partially_finished: false,
        }
    }

    /// Fold a poll result into this item.
    pub fn apply(&mut self, measurement: &Measurement) {
        if self.status == MeasurementStatus::InProgress {
            self.status = measurement.status;
        }
        if self.status == MeasurementStatus::InProgress && measurement.results.len() > 1 {
            self.probe_status = measurement.probe_statuses();
        } else {
            self.probe_status.clear();
        }
    }
}

/// Shared handle to a history item.
///
/// Equality of handles is identity: two handles are the same item only if
/// they point to the same allocation, even when the ids match.
#[derive(Debug, Clone)]
pub struct HistoryHandle(Arc<Mutex<HistoryItem>>);

impl HistoryHandle {
    pub fn new(item: HistoryItem) -> Self {
        Self(Arc::new(Mutex::new(item)))
    }

    fn lock(&self) -> MutexGuard<'_, HistoryItem> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn id(&self) -> String {
        self.lock().id.clone()
    }

    pub fn status(&self) -> MeasurementStatus {
        self.lock().status
    }

    pub fn is_partially_finished(&self) -> bool {
        self.lock().partially_finished
    }

    /// Copy of the current item state.
    pub fn snapshot(&self) -> HistoryItem {
        self.lock().clone()
    }

    /// Mutate the item in place.
    pub fn update<R>(&self, f: impl FnOnce(&mut HistoryItem) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn same_item(&self, other: &HistoryHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// A parsed history reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryRef {
    /// `last`, `previous`, `@-1`
    Last,
    /// `first`, `@1`: the oldest item still retained
    First,
    /// `@N`: the N-th measurement created this session
    FromStart(u64),
    /// `@-N`: the N-th most recent measurement
    FromEnd(u64),
}

impl HistoryRef {
    /// Parse a location token.
    ///
    /// Returns `Ok(None)` when the token is a plain location selector rather
    /// than a history reference.
    pub fn parse(input: &str) -> Result<Option<HistoryRef>> {
        let token = input.trim();
        match token {
            "last" | "previous" => return Ok(Some(HistoryRef::Last)),
            "first" => return Ok(Some(HistoryRef::First)),
            _ => {}
        }

        let Some(index) = token.strip_prefix('@') else {
            return Ok(None);
        };
        if index.starts_with('+') {
            return Err(ProbeError::InvalidIndex);
        }
        let index: i64 = index.parse().map_err(|_| ProbeError::InvalidIndex)?;
        let reference = match index {
            0 => return Err(ProbeError::InvalidIndex),
            1 => HistoryRef::First,
            -1 => HistoryRef::Last,
            n if n > 0 => HistoryRef::FromStart(n as u64),
            n => HistoryRef::FromEnd(n.unsigned_abs()),
        };
        Ok(Some(reference))
    }
}

/// Circular log of the measurements created in this session.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    slots: Vec<Option<HistoryHandle>>,
    write_index: usize,
    created_count: u64,
}

impl HistoryBuffer {
    /// Create an empty history. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity.max(1)],
            write_index: 0,
            created_count: 0,
        }
    }

    /// Rebuild a history from previously persisted ids, oldest first.
    pub fn restore<I, S>(capacity: usize, ids: I, started_at: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut history = Self::new(capacity);
        for id in ids {
            let mut item = HistoryItem::new(id, started_at);
            item.status = MeasurementStatus::Finished;
            history.push(item);
        }
        history
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of measurements ever pushed, including recycled ones.
    pub fn created_count(&self) -> u64 {
        self.created_count
    }

    /// Number of items currently retained.
    pub fn len(&self) -> usize {
        self.created_count.min(self.capacity() as u64) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.created_count == 0
    }

    /// Record a newly created measurement, recycling the oldest slot when full.
    pub fn push(&mut self, item: HistoryItem) -> HistoryHandle {
        trace!(target: "probe::history", "Recording measurement {} in slot {}", item.id, self.write_index);
        let handle = HistoryHandle::new(item);
        self.slots[self.write_index] = Some(handle.clone());
        self.write_index = (self.write_index + 1) % self.capacity();
        self.created_count += 1;
        handle
    }

    /// The most recently pushed item.
    pub fn last(&self) -> Option<HistoryHandle> {
        self.get(self.created_count)
    }

    /// The oldest item still retained.
    pub fn first(&self) -> Option<HistoryHandle> {
        self.get(self.oldest_retained())
    }

    /// The item with the given 1-based creation ordinal, if still retained.
    pub fn get(&self, ordinal: u64) -> Option<HistoryHandle> {
        if ordinal == 0 || ordinal > self.created_count || ordinal < self.oldest_retained() {
            return None;
        }
        let slot = ((ordinal - 1) % self.capacity() as u64) as usize;
        self.slots[slot].clone()
    }

    fn oldest_retained(&self) -> u64 {
        self.created_count
            .saturating_sub(self.capacity() as u64)
            .saturating_add(1)
    }

    /// Resolve a history reference such as `last`, `first`, `@3` or `@-2`.
    pub fn resolve(&self, reference: &str) -> Result<HistoryHandle> {
        match HistoryRef::parse(reference)? {
            Some(reference) => self.resolve_ref(reference),
            None => Err(ProbeError::InvalidIndex),
        }
    }

    pub fn resolve_ref(&self, reference: HistoryRef) -> Result<HistoryHandle> {
        if self.is_empty() {
            return Err(ProbeError::NoPreviousMeasurements);
        }
        let found = match reference {
            HistoryRef::Last => self.last(),
            HistoryRef::First => self.first(),
            HistoryRef::FromStart(n) => self.get(n),
            HistoryRef::FromEnd(n) => {
                if n > self.created_count {
                    None
                } else {
                    self.get(self.created_count - n + 1)
                }
            }
        };
        found.ok_or(ProbeError::IndexOutOfRange)
    }

    /// Look up a retained item by measurement id.
    pub fn find(&self, id: &str) -> Option<HistoryHandle> {
        self.slots
            .iter()
            .flatten()
            .find(|handle| handle.id() == id)
            .cloned()
    }

    /// Snapshots of the retained items, oldest first.
    pub fn items(&self) -> Vec<HistoryItem> {
        (self.oldest_retained()..=self.created_count)
            .filter_map(|ordinal| self.get(ordinal))
            .map(|handle| handle.snapshot())
            .collect()
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
