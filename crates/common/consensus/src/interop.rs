//! Deterministic chains for coordinated starts and tests.

use alloy_primitives::B256;
use anyhow::{anyhow, ensure};
use ssz_types::BitList;
use tree_hash::TreeHash;

use crate::{
    attestation::Attestation,
    attestation_data::AttestationData,
    beacon_block::{BeaconBlock, SignedBeaconBlock},
    beacon_block_body::BeaconBlockBody,
    beacon_state::BeaconState,
    checkpoint::Checkpoint,
    constants::MAX_EFFECTIVE_BALANCE,
    deposit::Deposit,
    deposit_data::DepositData,
    eth_1_data::Eth1Data,
    misc::compute_start_slot_at_epoch,
    pubkey::PubKey,
    signature::BlsSignature,
};

/// Eth1 block hash used by the mocked start.
pub const QUICK_START_ETH1_BLOCK_HASH: B256 = B256::repeat_byte(0x42);

pub fn interop_pubkey(validator_index: u64) -> PubKey {
    PubKey::from_bytes(&(validator_index + 1).to_le_bytes())
}

pub fn interop_deposits(validator_count: u64) -> Vec<Deposit> {
    (0..validator_count)
        .map(|index| {
            Deposit::unproven(DepositData {
                pubkey: interop_pubkey(index),
                withdrawal_credentials: B256::left_padding_from(&index.to_be_bytes()),
                amount: MAX_EFFECTIVE_BALANCE,
                signature: BlsSignature::default(),
            })
        })
        .collect()
}

/// Genesis state with ``validator_count`` validators, all active from the genesis epoch.
pub fn interop_genesis_state(
    genesis_time: u64,
    validator_count: u64,
) -> anyhow::Result<BeaconState> {
    ensure!(validator_count > 0, "Interop genesis needs at least one validator");
    let eth1_data = Eth1Data {
        deposit_root: B256::ZERO,
        deposit_count: validator_count,
        block_hash: QUICK_START_ETH1_BLOCK_HASH,
    };
    BeaconState::genesis(genesis_time, eth1_data, &interop_deposits(validator_count))
}

/// Proposes a block at ``slot`` on top of ``pre_state``, returning it with its post-state.
pub fn build_block(
    pre_state: &BeaconState,
    slot: u64,
    body: BeaconBlockBody,
) -> anyhow::Result<(SignedBeaconBlock, BeaconState)> {
    let mut state = pre_state.clone();
    state.process_slots(slot)?;

    let mut block = BeaconBlock {
        slot,
        proposer_index: state.get_beacon_proposer_index()?,
        parent_root: state.latest_block_header.tree_hash_root(),
        state_root: B256::ZERO,
        body,
    };
    state.process_block(&block)?;
    block.state_root = state.tree_hash_root();

    Ok((
        SignedBeaconBlock {
            message: block,
            signature: BlsSignature::default(),
        },
        state,
    ))
}

/// An attestation from the whole committee of ``state.slot`` voting for ``beacon_block_root``,
/// the block ``state`` is the post-state of.
pub fn full_attestation(
    state: &BeaconState,
    beacon_block_root: B256,
) -> anyhow::Result<Attestation> {
    let epoch = state.get_current_epoch();
    let target_root = if compute_start_slot_at_epoch(epoch) == state.slot {
        beacon_block_root
    } else {
        state.get_block_root(epoch)?
    };

    let committee = state.get_beacon_committee(state.slot, 0)?;
    let mut aggregation_bits = BitList::with_capacity(committee.len())
        .map_err(|err| anyhow!("Failed to create aggregation bits {err:?}"))?;
    for position in 0..committee.len() {
        aggregation_bits
            .set(position, true)
            .map_err(|err| anyhow!("Failed to set aggregation bit {err:?}"))?;
    }

    Ok(Attestation {
        aggregation_bits,
        data: AttestationData {
            slot: state.slot,
            index: 0,
            beacon_block_root,
            source: state.current_justified_checkpoint,
            target: Checkpoint::new(epoch, target_root),
        },
        signature: BlsSignature::default(),
    })
}
