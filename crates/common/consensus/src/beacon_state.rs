use std::{cmp::max, collections::HashSet};

use alloy_primitives::B256;
use anyhow::{anyhow, ensure};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use ssz_types::{
    typenum::{U1024, U1099511627776, U4, U64},
    BitVector, FixedVector, VariableList,
};
use tree_hash::TreeHash;
use tree_hash_derive::TreeHash;

use crate::{
    attestation::{AggregationBits, Attestation},
    attestation_data::AttestationData,
    beacon_block::{BeaconBlock, SignedBeaconBlock},
    beacon_block_body::BeaconBlockBody,
    beacon_block_header::BeaconBlockHeader,
    checkpoint::Checkpoint,
    constants::{
        EFFECTIVE_BALANCE_INCREMENT, GENESIS_EPOCH, JUSTIFICATION_BITS_LENGTH,
        MAX_EFFECTIVE_BALANCE, MIN_ATTESTATION_INCLUSION_DELAY, SLOTS_PER_EPOCH,
        SLOTS_PER_HISTORICAL_ROOT,
    },
    deposit::Deposit,
    eth_1_data::Eth1Data,
    misc::{compute_epoch_at_slot, compute_start_slot_at_epoch},
    pending_attestation::PendingAttestation,
    pubkey::PubKey,
    validator::Validator,
};

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct BeaconState {
    // Versioning
    pub genesis_time: u64,
    pub slot: u64,

    // History
    pub latest_block_header: BeaconBlockHeader,
    pub block_roots: FixedVector<B256, U64>,
    pub state_roots: FixedVector<B256, U64>,

    // Eth1
    pub eth1_data: Eth1Data,
    pub eth1_deposit_index: u64,

    // Registry
    pub validators: VariableList<Validator, U1099511627776>,
    pub balances: VariableList<u64, U1099511627776>,

    // Attestations
    pub previous_epoch_attestations: VariableList<PendingAttestation, U1024>,
    pub current_epoch_attestations: VariableList<PendingAttestation, U1024>,

    // Finality
    pub justification_bits: BitVector<U4>,
    pub previous_justified_checkpoint: Checkpoint,
    pub current_justified_checkpoint: Checkpoint,
    pub finalized_checkpoint: Checkpoint,
}

impl BeaconState {
    /// Builds the genesis state from the initial deposits, activating every validator that
    /// deposited the maximum effective balance.
    pub fn genesis(
        genesis_time: u64,
        eth1_data: Eth1Data,
        deposits: &[Deposit],
    ) -> anyhow::Result<Self> {
        let mut state = Self {
            genesis_time,
            slot: 0,
            latest_block_header: BeaconBlockHeader {
                body_root: BeaconBlockBody::default().tree_hash_root(),
                ..BeaconBlockHeader::default()
            },
            block_roots: FixedVector::from(vec![B256::ZERO; SLOTS_PER_HISTORICAL_ROOT as usize]),
            state_roots: FixedVector::from(vec![B256::ZERO; SLOTS_PER_HISTORICAL_ROOT as usize]),
            eth1_data: Eth1Data {
                deposit_count: deposits.len() as u64,
                ..eth1_data
            },
            eth1_deposit_index: 0,
            validators: vec![].into(),
            balances: vec![].into(),
            previous_epoch_attestations: vec![].into(),
            current_epoch_attestations: vec![].into(),
            justification_bits: BitVector::new(),
            previous_justified_checkpoint: Checkpoint::default(),
            current_justified_checkpoint: Checkpoint::default(),
            finalized_checkpoint: Checkpoint::default(),
        };

        for deposit in deposits {
            state.process_deposit(deposit)?;
        }

        for validator in state.validators.iter_mut() {
            if validator.effective_balance == MAX_EFFECTIVE_BALANCE {
                validator.activation_eligibility_epoch = GENESIS_EPOCH;
                validator.activation_epoch = GENESIS_EPOCH;
            }
        }

        Ok(state)
    }

    /// Return the current epoch.
    pub fn get_current_epoch(&self) -> u64 {
        compute_epoch_at_slot(self.slot)
    }

    /// Return the previous epoch (unless the current epoch is ``GENESIS_EPOCH``).
    pub fn get_previous_epoch(&self) -> u64 {
        let current_epoch = self.get_current_epoch();
        if current_epoch == GENESIS_EPOCH {
            GENESIS_EPOCH
        } else {
            current_epoch - 1
        }
    }

    /// Return the block root at the start of a recent ``epoch``.
    pub fn get_block_root(&self, epoch: u64) -> anyhow::Result<B256> {
        self.get_block_root_at_slot(compute_start_slot_at_epoch(epoch))
    }

    /// Return the block root at a recent ``slot``.
    pub fn get_block_root_at_slot(&self, slot: u64) -> anyhow::Result<B256> {
        ensure!(
            slot < self.slot && self.slot <= slot + SLOTS_PER_HISTORICAL_ROOT,
            "slot given was outside of block_roots range"
        );
        Ok(self.block_roots[(slot % SLOTS_PER_HISTORICAL_ROOT) as usize])
    }

    /// Return the sequence of active validator indices at ``epoch``.
    pub fn get_active_validator_indices(&self, epoch: u64) -> Vec<u64> {
        self.validators
            .iter()
            .enumerate()
            .filter(|(_, validator)| validator.is_active(epoch))
            .map(|(index, _)| index as u64)
            .collect()
    }

    /// Return the combined effective balance of the ``indices``.
    /// ``EFFECTIVE_BALANCE_INCREMENT`` Gwei minimum to avoid divisions by zero.
    pub fn get_total_balance(&self, indices: &HashSet<u64>) -> u64 {
        max(
            EFFECTIVE_BALANCE_INCREMENT,
            indices
                .iter()
                .filter_map(|index| self.validators.get(*index as usize))
                .map(|validator| validator.effective_balance)
                .sum(),
        )
    }

    /// Return the combined effective balance of the active validators.
    pub fn get_total_active_balance(&self) -> u64 {
        self.get_total_balance(
            &self
                .get_active_validator_indices(self.get_current_epoch())
                .into_iter()
                .collect(),
        )
    }

    /// Effective balance of every validator in the registry, zero for inactive ones.
    pub fn get_active_balances(&self) -> Vec<u64> {
        let epoch = self.get_current_epoch();
        self.validators
            .iter()
            .map(|validator| {
                if validator.is_active(epoch) {
                    validator.effective_balance
                } else {
                    0
                }
            })
            .collect()
    }

    /// Return the beacon proposer index at the current slot.
    ///
    /// Proposers rotate through the active set in index order.
    pub fn get_beacon_proposer_index(&self) -> anyhow::Result<u64> {
        let indices = self.get_active_validator_indices(self.get_current_epoch());
        ensure!(!indices.is_empty(), "No active validators to propose");
        Ok(indices[(self.slot % indices.len() as u64) as usize])
    }

    /// Return the beacon committee at ``slot`` for ``index``.
    ///
    /// There is a single committee per slot, made of the active validators whose index falls on
    /// the slot's position within the epoch.
    pub fn get_beacon_committee(&self, slot: u64, index: u64) -> anyhow::Result<Vec<u64>> {
        ensure!(index == 0, "Committee index {index} out of range");
        let position = slot % SLOTS_PER_EPOCH;
        Ok(self
            .get_active_validator_indices(compute_epoch_at_slot(slot))
            .into_iter()
            .filter(|validator_index| validator_index % SLOTS_PER_EPOCH == position)
            .collect())
    }

    /// Return the set of attesting indices corresponding to ``data`` and ``bits``.
    pub fn get_attesting_indices(
        &self,
        data: &AttestationData,
        bits: &AggregationBits,
    ) -> anyhow::Result<Vec<u64>> {
        let committee = self.get_beacon_committee(data.slot, data.index)?;
        ensure!(
            bits.len() == committee.len(),
            "Aggregation bits length {} does not match committee size {}",
            bits.len(),
            committee.len()
        );
        Ok(committee
            .into_iter()
            .enumerate()
            .filter(|(position, _)| bits.get(*position).unwrap_or(false))
            .map(|(_, index)| index)
            .unique()
            .collect())
    }

    /// Increase the validator balance at index ``index`` by ``delta``.
    pub fn increase_balance(&mut self, index: u64, delta: u64) {
        if let Some(balance) = self.balances.get_mut(index as usize) {
            *balance += delta;
        }
    }

    pub fn process_slots(&mut self, slot: u64) -> anyhow::Result<()> {
        self.process_slots_with_interrupt(slot, || false)
    }

    /// Advances to ``slot``, giving up before any slot once ``interrupted`` returns true.
    pub fn process_slots_with_interrupt(
        &mut self,
        slot: u64,
        interrupted: impl Fn() -> bool,
    ) -> anyhow::Result<()> {
        ensure!(
            self.slot < slot,
            "State slot {} must be lower than target slot {slot}",
            self.slot
        );
        while self.slot < slot {
            ensure!(!interrupted(), "Slot processing interrupted at slot {}", self.slot);
            self.process_slot();
            // Process epoch on the start slot of the next epoch
            if (self.slot + 1) % SLOTS_PER_EPOCH == 0 {
                self.process_epoch()?;
            }
            self.slot += 1;
        }
        Ok(())
    }

    pub fn process_slot(&mut self) {
        // Cache state root
        let previous_state_root = self.tree_hash_root();
        self.state_roots[(self.slot % SLOTS_PER_HISTORICAL_ROOT) as usize] = previous_state_root;

        // Cache latest block header state root
        if self.latest_block_header.state_root == B256::ZERO {
            self.latest_block_header.state_root = previous_state_root;
        }

        // Cache block root
        let previous_block_root = self.latest_block_header.tree_hash_root();
        self.block_roots[(self.slot % SLOTS_PER_HISTORICAL_ROOT) as usize] = previous_block_root;
    }

    pub fn process_epoch(&mut self) -> anyhow::Result<()> {
        self.process_justification_and_finalization()?;
        self.process_participation_record_updates();
        Ok(())
    }

    fn get_matching_source_attestations(
        &self,
        epoch: u64,
    ) -> anyhow::Result<&[PendingAttestation]> {
        ensure!(
            epoch == self.get_previous_epoch() || epoch == self.get_current_epoch(),
            "Epoch {epoch} must be the previous or current epoch"
        );
        Ok(if epoch == self.get_current_epoch() {
            &self.current_epoch_attestations[..]
        } else {
            &self.previous_epoch_attestations[..]
        })
    }

    fn get_matching_target_attestations(
        &self,
        epoch: u64,
    ) -> anyhow::Result<Vec<&PendingAttestation>> {
        let target_root = self.get_block_root(epoch)?;
        Ok(self
            .get_matching_source_attestations(epoch)?
            .iter()
            .filter(|attestation| attestation.data.target.root == target_root)
            .collect())
    }

    fn get_attesting_balance(&self, attestations: &[&PendingAttestation]) -> anyhow::Result<u64> {
        let mut indices = HashSet::new();
        for attestation in attestations {
            indices.extend(
                self.get_attesting_indices(&attestation.data, &attestation.aggregation_bits)?
                    .into_iter()
                    .filter(|index| !self.validators[*index as usize].slashed),
            );
        }
        Ok(self.get_total_balance(&indices))
    }

    pub fn process_justification_and_finalization(&mut self) -> anyhow::Result<()> {
        // Initial FFG checkpoint values have a `0x00` stub for `root`.
        // Skip FFG updates in the first two epochs to avoid corner cases that might result in
        // modifying this stub.
        if self.get_current_epoch() <= GENESIS_EPOCH + 1 {
            return Ok(());
        }
        let previous_attestations =
            self.get_matching_target_attestations(self.get_previous_epoch())?;
        let current_attestations =
            self.get_matching_target_attestations(self.get_current_epoch())?;
        let total_active_balance = self.get_total_active_balance();
        let previous_target_balance = self.get_attesting_balance(&previous_attestations)?;
        let current_target_balance = self.get_attesting_balance(&current_attestations)?;
        self.weigh_justification_and_finalization(
            total_active_balance,
            previous_target_balance,
            current_target_balance,
        )
    }

    pub fn weigh_justification_and_finalization(
        &mut self,
        total_active_balance: u64,
        previous_epoch_target_balance: u64,
        current_epoch_target_balance: u64,
    ) -> anyhow::Result<()> {
        let previous_epoch = self.get_previous_epoch();
        let current_epoch = self.get_current_epoch();
        let old_previous_justified_checkpoint = self.previous_justified_checkpoint;
        let old_current_justified_checkpoint = self.current_justified_checkpoint;

        // Process justifications
        self.previous_justified_checkpoint = self.current_justified_checkpoint;
        self.justification_bits
            .shift_up(1)
            .map_err(|err| anyhow!("Failed to shift justification bits {err:?}"))?;
        if previous_epoch_target_balance * 3 >= total_active_balance * 2 {
            self.current_justified_checkpoint =
                Checkpoint::new(previous_epoch, self.get_block_root(previous_epoch)?);
            self.justification_bits
                .set(1, true)
                .map_err(|err| anyhow!("Failed to set justification bit {err:?}"))?;
        }
        if current_epoch_target_balance * 3 >= total_active_balance * 2 {
            self.current_justified_checkpoint =
                Checkpoint::new(current_epoch, self.get_block_root(current_epoch)?);
            self.justification_bits
                .set(0, true)
                .map_err(|err| anyhow!("Failed to set justification bit {err:?}"))?;
        }

        // Process finalizations
        let bits = (0..JUSTIFICATION_BITS_LENGTH)
            .map(|i| self.justification_bits.get(i).unwrap_or(false))
            .collect::<Vec<_>>();
        // The 2nd/3rd/4th most recent epochs are justified, the 2nd using the 4th as source
        if bits[1..4].iter().all(|bit| *bit)
            && old_previous_justified_checkpoint.epoch + 3 == current_epoch
        {
            self.finalized_checkpoint = old_previous_justified_checkpoint;
        }
        // The 2nd/3rd most recent epochs are justified, the 2nd using the 3rd as source
        if bits[1..3].iter().all(|bit| *bit)
            && old_previous_justified_checkpoint.epoch + 2 == current_epoch
        {
            self.finalized_checkpoint = old_previous_justified_checkpoint;
        }
        // The 1st/2nd/3rd most recent epochs are justified, the 1st using the 3rd as source
        if bits[0..3].iter().all(|bit| *bit)
            && old_current_justified_checkpoint.epoch + 2 == current_epoch
        {
            self.finalized_checkpoint = old_current_justified_checkpoint;
        }
        // The 1st/2nd most recent epochs are justified, the 1st using the 2nd as source
        if bits[0..2].iter().all(|bit| *bit)
            && old_current_justified_checkpoint.epoch + 1 == current_epoch
        {
            self.finalized_checkpoint = old_current_justified_checkpoint;
        }
        Ok(())
    }

    pub fn process_participation_record_updates(&mut self) {
        // Rotate current/previous epoch attestations
        self.previous_epoch_attestations =
            std::mem::replace(&mut self.current_epoch_attestations, vec![].into());
    }

    pub fn process_block_header(&mut self, block: &BeaconBlock) -> anyhow::Result<()> {
        // Verify that the slots match
        ensure!(
            self.slot == block.slot,
            "State slot must be equal to block slot"
        );
        // Verify that the block is newer than latest block header
        ensure!(
            block.slot > self.latest_block_header.slot,
            "Block slot must be greater than latest block header slot of state"
        );
        // Verify that proposer index is the correct index
        ensure!(
            block.proposer_index == self.get_beacon_proposer_index()?,
            "Block proposer index must be equal to beacon proposer index"
        );
        // Verify that the parent matches
        ensure!(
            block.parent_root == self.latest_block_header.tree_hash_root(),
            "Block Parent Root must be equal root of latest block header"
        );

        // Cache current block as the new latest block
        self.latest_block_header = BeaconBlockHeader {
            state_root: B256::ZERO, // Overwritten in the next process_slot call
            ..BeaconBlockHeader::from(block)
        };

        // Verify proposer is not slashed
        let proposer = &self.validators[block.proposer_index as usize];
        ensure!(!proposer.slashed, "Block proposer must not be slashed");

        Ok(())
    }

    /// Deposits are taken as already verified against the deposit contract.
    pub fn process_deposit(&mut self, deposit: &Deposit) -> anyhow::Result<()> {
        // Deposits must be processed in order
        self.eth1_deposit_index += 1;

        self.apply_deposit(
            deposit.data.pubkey.clone(),
            deposit.data.withdrawal_credentials,
            deposit.data.amount,
        )
    }

    pub fn apply_deposit(
        &mut self,
        pubkey: PubKey,
        withdrawal_credentials: B256,
        amount: u64,
    ) -> anyhow::Result<()> {
        match self
            .validators
            .iter()
            .position(|validator| validator.pubkey == pubkey)
        {
            // Increase balance by deposit amount
            Some(index) => self.increase_balance(index as u64, amount),
            None => {
                self.validators
                    .push(Validator::from_deposit(pubkey, withdrawal_credentials, amount))
                    .map_err(|err| anyhow!("Couldn't push to validators {:?}", err))?;
                self.balances
                    .push(amount)
                    .map_err(|err| anyhow!("Couldn't push to balances {:?}", err))?;
            }
        }
        Ok(())
    }

    pub fn process_attestation(&mut self, attestation: &Attestation) -> anyhow::Result<()> {
        let data = &attestation.data;
        let current_epoch = self.get_current_epoch();
        ensure!(
            data.target.epoch == self.get_previous_epoch() || data.target.epoch == current_epoch,
            "Target epoch must be the previous or current epoch"
        );
        ensure!(
            data.target.epoch == compute_epoch_at_slot(data.slot),
            "Target epoch must match the attestation slot"
        );
        ensure!(
            data.slot + MIN_ATTESTATION_INCLUSION_DELAY <= self.slot
                && self.slot <= data.slot + SLOTS_PER_EPOCH,
            "Attestation for slot {} is outside the inclusion window",
            data.slot
        );

        let committee = self.get_beacon_committee(data.slot, data.index)?;
        ensure!(
            attestation.aggregation_bits.len() == committee.len(),
            "Aggregation bits length must match the committee size"
        );

        let pending_attestation = PendingAttestation {
            aggregation_bits: attestation.aggregation_bits.clone(),
            data: data.clone(),
            inclusion_delay: self.slot - data.slot,
            proposer_index: self.get_beacon_proposer_index()?,
        };

        if data.target.epoch == current_epoch {
            ensure!(
                data.source == self.current_justified_checkpoint,
                "Source must be the current justified checkpoint"
            );
            self.current_epoch_attestations
                .push(pending_attestation)
                .map_err(|err| anyhow!("Couldn't push pending attestation {err:?}"))?;
        } else {
            ensure!(
                data.source == self.previous_justified_checkpoint,
                "Source must be the previous justified checkpoint"
            );
            self.previous_epoch_attestations
                .push(pending_attestation)
                .map_err(|err| anyhow!("Couldn't push pending attestation {err:?}"))?;
        }
        Ok(())
    }

    pub fn process_block(&mut self, block: &BeaconBlock) -> anyhow::Result<()> {
        self.process_block_header(block)?;
        for deposit in block.body.deposits.iter() {
            self.process_deposit(deposit)?;
        }
        for attestation in block.body.attestations.iter() {
            self.process_attestation(attestation)?;
        }
        Ok(())
    }

    /// Advances the state to the block's slot and applies the block. Signatures are not checked.
    pub fn state_transition(
        &mut self,
        signed_block: &SignedBeaconBlock,
        validate_result: bool,
    ) -> anyhow::Result<()> {
        self.state_transition_with_interrupt(signed_block, validate_result, || false)
    }

    pub fn state_transition_with_interrupt(
        &mut self,
        signed_block: &SignedBeaconBlock,
        validate_result: bool,
        interrupted: impl Fn() -> bool,
    ) -> anyhow::Result<()> {
        let block = &signed_block.message;
        self.process_slots_with_interrupt(block.slot, interrupted)?;
        self.process_block(block)?;
        if validate_result {
            ensure!(
                block.state_root == self.tree_hash_root(),
                "Block state root must be equal to the post state root"
            );
        }
        Ok(())
    }
}
