use alloy_primitives::B256;
use ream_consensus::attestation_data::AttestationData;

/// Proof that a validator signed two conflicting messages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlashingEvidence {
    DoubleProposal {
        proposer_index: u64,
        slot: u64,
        first_root: B256,
        second_root: B256,
    },
    DoubleVote {
        validator_index: u64,
        first: AttestationData,
        second: AttestationData,
    },
    SurroundVote {
        validator_index: u64,
        surrounding: AttestationData,
        surrounded: AttestationData,
    },
}

impl SlashingEvidence {
    pub fn offender(&self) -> u64 {
        match self {
            Self::DoubleProposal { proposer_index, .. } => *proposer_index,
            Self::DoubleVote {
                validator_index, ..
            }
            | Self::SurroundVote {
                validator_index, ..
            } => *validator_index,
        }
    }
}
