use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use ssz_types::{typenum, FixedVector};
use tree_hash_derive::TreeHash;

pub const BLS_SIGNATURE_BYTES_LEN: usize = 96;

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct BlsSignature {
    pub signature: FixedVector<u8, typenum::U96>,
}

impl Default for BlsSignature {
    /// The infinity signature carried by the genesis block.
    fn default() -> Self {
        Self {
            signature: FixedVector::from(vec![0; BLS_SIGNATURE_BYTES_LEN]),
        }
    }
}
