use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use ssz_types::{typenum, FixedVector};
use tree_hash_derive::TreeHash;

pub const PUBKEY_BYTES_LEN: usize = 48;

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct PubKey {
    pub inner: FixedVector<u8, typenum::U48>,
}

impl PubKey {
    /// Builds a key from raw bytes, zero padding or truncating to 48 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            inner: FixedVector::from(bytes.to_vec()),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.inner
    }
}
