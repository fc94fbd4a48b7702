//! Minimal preset values.

pub const GENESIS_SLOT: u64 = 0;
pub const GENESIS_EPOCH: u64 = 0;
pub const FAR_FUTURE_EPOCH: u64 = u64::MAX;

pub const SECONDS_PER_SLOT: u64 = 6;
pub const SLOTS_PER_EPOCH: u64 = 8;
pub const SLOTS_PER_HISTORICAL_ROOT: u64 = 64;
pub const MIN_ATTESTATION_INCLUSION_DELAY: u64 = 1;

pub const MAX_EFFECTIVE_BALANCE: u64 = 32_000_000_000;
pub const EFFECTIVE_BALANCE_INCREMENT: u64 = 1_000_000_000;

pub const DEPOSIT_CONTRACT_TREE_DEPTH: u64 = 32;

pub const JUSTIFICATION_BITS_LENGTH: usize = 4;
