use std::collections::HashMap;

use alloy_primitives::B256;
use ream_consensus::{
    attestation_data::AttestationData, beacon_block::SignedBeaconBlock,
    misc::compute_start_slot_at_epoch,
};

use crate::evidence::SlashingEvidence;

/// Remembers every proposal and vote seen so far and reports the ones that conflict.
#[derive(Debug, Default)]
pub struct SlashingDetector {
    /// ``(proposer_index, slot)`` to the first block root seen.
    proposals: HashMap<(u64, u64), B256>,
    votes: HashMap<u64, Vec<AttestationData>>,
}

impl SlashingDetector {
    pub fn check_block(&mut self, block: &SignedBeaconBlock) -> Option<SlashingEvidence> {
        let proposer_index = block.message.proposer_index;
        let slot = block.slot();
        let block_root = block.block_root();

        let first_root = *self
            .proposals
            .entry((proposer_index, slot))
            .or_insert(block_root);
        (first_root != block_root).then_some(SlashingEvidence::DoubleProposal {
            proposer_index,
            slot,
            first_root,
            second_root: block_root,
        })
    }

    /// Records ``data`` for each validator in ``validator_indices``, returning at most one piece
    /// of evidence per validator.
    pub fn check_attestation(
        &mut self,
        validator_indices: &[u64],
        data: &AttestationData,
    ) -> Vec<SlashingEvidence> {
        let mut evidence = vec![];
        for &validator_index in validator_indices {
            let history = self.votes.entry(validator_index).or_default();
            if history.contains(data) {
                continue;
            }
            let conflict = history.iter().find_map(|previous| {
                if previous.is_double_vote(data) {
                    Some(SlashingEvidence::DoubleVote {
                        validator_index,
                        first: previous.clone(),
                        second: data.clone(),
                    })
                } else if previous.is_surround_vote(data) {
                    Some(SlashingEvidence::SurroundVote {
                        validator_index,
                        surrounding: previous.clone(),
                        surrounded: data.clone(),
                    })
                } else if data.is_surround_vote(previous) {
                    Some(SlashingEvidence::SurroundVote {
                        validator_index,
                        surrounding: data.clone(),
                        surrounded: previous.clone(),
                    })
                } else {
                    None
                }
            });
            evidence.extend(conflict);
            history.push(data.clone());
        }
        evidence
    }

    /// Forgets proposals and votes that can no longer be slashed once ``finalized_epoch`` is
    /// final.
    pub fn prune(&mut self, finalized_epoch: u64) {
        let finalized_slot = compute_start_slot_at_epoch(finalized_epoch);
        self.proposals.retain(|(_, slot), _| *slot >= finalized_slot);
        self.votes.retain(|_, history| {
            history.retain(|data| data.target.epoch >= finalized_epoch);
            !history.is_empty()
        });
    }

    pub fn tracked_validators(&self) -> usize {
        self.votes.len()
    }
}

#[cfg(test)]
mod tests {
    use ream_consensus::{
        beacon_block::BeaconBlock, beacon_block_body::BeaconBlockBody, checkpoint::Checkpoint,
        signature::BlsSignature,
    };
    use rstest::rstest;

    use super::*;

    fn block(proposer_index: u64, slot: u64, graffiti: u8) -> SignedBeaconBlock {
        SignedBeaconBlock {
            message: BeaconBlock {
                slot,
                proposer_index,
                parent_root: B256::ZERO,
                state_root: B256::ZERO,
                body: BeaconBlockBody {
                    graffiti: B256::repeat_byte(graffiti),
                    ..BeaconBlockBody::default()
                },
            },
            signature: BlsSignature::default(),
        }
    }

    fn vote(source: u64, target: u64, head: u8) -> AttestationData {
        AttestationData {
            slot: target * 8,
            index: 0,
            beacon_block_root: B256::repeat_byte(head),
            source: Checkpoint::new(source, B256::ZERO),
            target: Checkpoint::new(target, B256::ZERO),
        }
    }

    #[test]
    fn test_double_proposal() {
        let mut detector = SlashingDetector::default();
        let first = block(3, 10, 1);
        let second = block(3, 10, 2);

        assert_eq!(detector.check_block(&first), None);
        assert_eq!(detector.check_block(&first), None);
        assert_eq!(
            detector.check_block(&second),
            Some(SlashingEvidence::DoubleProposal {
                proposer_index: 3,
                slot: 10,
                first_root: first.block_root(),
                second_root: second.block_root(),
            })
        );
        assert_eq!(detector.check_block(&block(4, 10, 3)), None);
        assert_eq!(detector.check_block(&block(3, 11, 3)), None);
    }

    #[test]
    fn test_double_vote() {
        let mut detector = SlashingDetector::default();

        assert!(detector.check_attestation(&[1, 2], &vote(0, 1, 1)).is_empty());
        assert!(detector.check_attestation(&[1, 2], &vote(0, 1, 1)).is_empty());

        let evidence = detector.check_attestation(&[2, 3], &vote(0, 1, 2));
        assert_eq!(
            evidence,
            vec![SlashingEvidence::DoubleVote {
                validator_index: 2,
                first: vote(0, 1, 1),
                second: vote(0, 1, 2),
            }]
        );
    }

    #[rstest]
    #[case(vote(1, 4, 1), vote(2, 3, 1))]
    #[case(vote(2, 3, 1), vote(1, 4, 1))]
    fn test_surround_vote(#[case] first: AttestationData, #[case] second: AttestationData) {
        let mut detector = SlashingDetector::default();
        assert!(detector.check_attestation(&[7], &first).is_empty());

        let evidence = detector.check_attestation(&[7], &second);
        assert_eq!(
            evidence,
            vec![SlashingEvidence::SurroundVote {
                validator_index: 7,
                surrounding: vote(1, 4, 1),
                surrounded: vote(2, 3, 1),
            }]
        );
        assert_eq!(evidence[0].offender(), 7);
    }

    #[test]
    fn test_consecutive_votes_are_not_slashable() {
        let mut detector = SlashingDetector::default();
        for epoch in 1..5 {
            assert!(detector
                .check_attestation(&[0], &vote(epoch - 1, epoch, epoch as u8))
                .is_empty());
        }
    }

    #[test]
    fn test_prune() {
        let mut detector = SlashingDetector::default();
        detector.check_attestation(&[1], &vote(0, 1, 1));
        detector.check_attestation(&[2], &vote(2, 3, 1));
        detector.check_block(&block(0, 4, 0));

        detector.prune(2);
        assert_eq!(detector.tracked_validators(), 1);
        // The pruned proposal no longer conflicts
        assert_eq!(detector.check_block(&block(0, 4, 1)), None);
    }
}
