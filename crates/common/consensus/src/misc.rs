use crate::constants::{SECONDS_PER_SLOT, SLOTS_PER_EPOCH};

/// Return the epoch number at ``slot``.
pub fn compute_epoch_at_slot(slot: u64) -> u64 {
    slot / SLOTS_PER_EPOCH
}

/// Return the start slot of ``epoch``.
pub fn compute_start_slot_at_epoch(epoch: u64) -> u64 {
    epoch.saturating_mul(SLOTS_PER_EPOCH)
}

/// Return the last slot of ``epoch``.
pub fn compute_end_slot_at_epoch(epoch: u64) -> u64 {
    compute_start_slot_at_epoch(epoch.saturating_add(1)).saturating_sub(1)
}

/// Return the slot in progress at unix ``time``, zero before genesis.
pub fn compute_slot_at_time(genesis_time: u64, time: u64) -> u64 {
    time.saturating_sub(genesis_time) / SECONDS_PER_SLOT
}
