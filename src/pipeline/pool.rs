//! Pending-work pool for the batch driver

use std::collections::HashSet;
use std::collections::VecDeque;

use crate::model::HazmatInputItem;

/// Mutable pool of items awaiting classification.
///
/// Extraction pops from the back and re-queued items are pushed onto the
/// back, so input order is not preserved across a run. Owned and mutated
/// exclusively by the driver.
#[derive(Debug, Default)]
pub struct WorkPool {
    items: VecDeque<HazmatInputItem>,
}

impl WorkPool {
    pub fn new(items: impl IntoIterator<Item = HazmatInputItem>) -> Self {
        Self {
            items: items.into_iter().collect(),
        }
    }

    /// Re-queue a single item.
    pub fn push(&mut self, item: HazmatInputItem) {
        self.items.push_back(item);
    }

    /// Re-queue a group of items.
    pub fn extend(&mut self, items: impl IntoIterator<Item = HazmatInputItem>) {
        self.items.extend(items);
    }

    /// Pop up to `count` items from the back of the pool.
    pub fn pop_many(&mut self, count: usize) -> Vec<HazmatInputItem> {
        let take = count.min(self.items.len());
        let mut popped = Vec::with_capacity(take);
        for _ in 0..take {
            if let Some(item) = self.items.pop_back() {
                popped.push(item);
            }
        }
        popped
    }

    /// Drop items whose IDs were already processed (resume support).
    pub fn retain_unprocessed(&mut self, processed_ids: &HashSet<String>) {
        let before = self.items.len();
        self.items
            .retain(|item| !processed_ids.contains(&item.item_id));
        let skipped = before - self.items.len();
        if skipped > 0 {
            tracing::info!(
                skipped_items = skipped,
                remaining_items = self.items.len(),
                "Skipping items already present in the output"
            );
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
