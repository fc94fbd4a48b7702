use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use ssz_types::{typenum, BitList};
use tree_hash_derive::TreeHash;

use crate::{attestation_data::AttestationData, signature::BlsSignature};

pub type AggregationBits = BitList<typenum::U2048>;

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct Attestation {
    pub aggregation_bits: AggregationBits,
    pub data: AttestationData,
    pub signature: BlsSignature,
}

impl Attestation {
    /// Positions within the committee that took part in this attestation.
    pub fn set_positions(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.aggregation_bits.len())
            .filter(|&position| self.aggregation_bits.get(position).unwrap_or(false))
    }
}
