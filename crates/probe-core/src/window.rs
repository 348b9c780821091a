//! Sliding window of in-flight measurements for continuous mode.
//!
//! The window is swept once per round with [`PollingWindow::restart`] and
//! [`PollingWindow::next`]. Items may be removed mid-sweep; the cursor is
//! adjusted so the remaining items are each visited exactly once.

use crate::HistoryHandle;

/// Maximum number of overlapping measurements in continuous mode.
pub const DEFAULT_WINDOW_CAPACITY: usize = 2;

#[derive(Debug)]
pub struct PollingWindow {
    capacity: usize,
    items: Vec<HistoryHandle>,
    cursor: usize,
}

impl PollingWindow {
    /// Create an empty window. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            items: Vec::with_capacity(capacity),
            cursor: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Start a new sweep over the outstanding items.
    pub fn restart(&mut self) {
        self.cursor = 0;
    }

    /// The item under the cursor, advancing it. `None` once the sweep is done.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<HistoryHandle> {
        let item = self.items.get(self.cursor)?.clone();
        self.cursor += 1;
        Some(item)
    }

    /// Add a freshly created measurement.
    ///
    /// # Panics
    ///
    /// Panics when the window is full; check [`PollingWindow::can_append`].
    pub fn append(&mut self, item: HistoryHandle) {
        assert!(
            self.items.len() < self.capacity,
            "polling window is full ({} items)",
            self.capacity
        );
        self.items.push(item);
    }

    /// Whether a new measurement may overlap the outstanding ones: there must
    /// be room and at least one held item must already be partially finished.
    pub fn can_append(&self) -> bool {
        self.items.len() < self.capacity
            && self.items.iter().any(|item| item.is_partially_finished())
    }

    /// Remove an item by identity.
    pub fn remove(&mut self, item: &HistoryHandle) {
        if let Some(index) = self.items.iter().position(|held| held.same_item(item)) {
            self.items.remove(index);
            if index < self.cursor {
                self.cursor -= 1;
            }
        }
    }

    /// Ids of the outstanding items in sweep order.
    pub fn ids(&self) -> Vec<String> {
        self.items.iter().map(|item| item.id()).collect()
    }
}

impl Default for PollingWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_CAPACITY)
    }
}
