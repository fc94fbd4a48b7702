use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use ssz_types::{typenum::U33, FixedVector};
use tree_hash_derive::TreeHash;

use crate::{constants::DEPOSIT_CONTRACT_TREE_DEPTH, deposit_data::DepositData};

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct Deposit {
    /// Merkle path to the deposit root, checked by the eth1 deposit subsystem before the
    /// deposit reaches a block.
    pub proof: FixedVector<B256, U33>,
    pub data: DepositData,
}

impl Deposit {
    /// Wraps deposit data with an empty proof.
    pub fn unproven(data: DepositData) -> Self {
        Self {
            proof: FixedVector::from(vec![B256::ZERO; DEPOSIT_CONTRACT_TREE_DEPTH as usize + 1]),
            data,
        }
    }
}
