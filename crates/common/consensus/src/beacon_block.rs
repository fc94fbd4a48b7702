use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use tree_hash::TreeHash;
use tree_hash_derive::TreeHash;

use crate::{
    beacon_block_body::BeaconBlockBody, constants::GENESIS_SLOT, misc::compute_epoch_at_slot,
    signature::BlsSignature,
};

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct SignedBeaconBlock {
    pub message: BeaconBlock,
    pub signature: BlsSignature,
}

impl SignedBeaconBlock {
    /// The sentinel block anchoring a chain at ``GENESIS_SLOT``.
    pub fn genesis(genesis_state_root: B256) -> Self {
        Self {
            message: BeaconBlock {
                slot: GENESIS_SLOT,
                proposer_index: 0,
                parent_root: B256::ZERO,
                state_root: genesis_state_root,
                body: BeaconBlockBody::default(),
            },
            signature: BlsSignature::default(),
        }
    }

    /// Root of the unsigned block, the key blocks are stored and referenced by.
    pub fn block_root(&self) -> B256 {
        self.message.tree_hash_root()
    }

    pub fn slot(&self) -> u64 {
        self.message.slot
    }

    pub fn epoch(&self) -> u64 {
        compute_epoch_at_slot(self.message.slot)
    }

    pub fn parent_root(&self) -> B256 {
        self.message.parent_root
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct BeaconBlock {
    pub slot: u64,
    pub proposer_index: u64,
    pub parent_root: B256,
    pub state_root: B256,
    pub body: BeaconBlockBody,
}
