use std::ops::RangeInclusive;

use ream_consensus::misc::{compute_end_slot_at_epoch, compute_start_slot_at_epoch};

/// Inclusive slot and epoch bounds for block range queries. Bounds combine, so a filter with
/// both slot and epoch bounds selects their intersection.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockFilter {
    start_slot: Option<u64>,
    end_slot: Option<u64>,
    start_epoch: Option<u64>,
    end_epoch: Option<u64>,
}

impl BlockFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_start_slot(mut self, slot: u64) -> Self {
        self.start_slot = Some(slot);
        self
    }

    pub fn set_end_slot(mut self, slot: u64) -> Self {
        self.end_slot = Some(slot);
        self
    }

    pub fn set_start_epoch(mut self, epoch: u64) -> Self {
        self.start_epoch = Some(epoch);
        self
    }

    pub fn set_end_epoch(mut self, epoch: u64) -> Self {
        self.end_epoch = Some(epoch);
        self
    }

    /// Returns ``None`` when the bounds select nothing.
    pub fn slot_range(&self) -> Option<RangeInclusive<u64>> {
        let start = self
            .start_slot
            .unwrap_or(0)
            .max(self.start_epoch.map_or(0, compute_start_slot_at_epoch));
        let end = self
            .end_slot
            .unwrap_or(u64::MAX)
            .min(self.end_epoch.map_or(u64::MAX, compute_end_slot_at_epoch));

        (start <= end).then_some(start..=end)
    }
}
