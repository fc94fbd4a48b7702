use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use tree_hash_derive::TreeHash;

use crate::constants::GENESIS_EPOCH;

/// An ``(epoch, root)`` pair naming the block justified or finalized as of ``epoch``.
#[derive(
    Debug,
    Default,
    Eq,
    Hash,
    PartialEq,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    Encode,
    Decode,
    TreeHash,
)]
pub struct Checkpoint {
    pub epoch: u64,
    pub root: B256,
}

impl Checkpoint {
    pub fn new(epoch: u64, root: B256) -> Self {
        Self { epoch, root }
    }

    /// The checkpoint every chain starts from.
    pub fn genesis(genesis_root: B256) -> Self {
        Self::new(GENESIS_EPOCH, genesis_root)
    }
}
