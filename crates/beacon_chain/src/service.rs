use std::{
    future::Future,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use alloy_primitives::B256;
use parking_lot::{Mutex, RwLock};
use ream_consensus::{
    attestation::Attestation,
    beacon_block::{BeaconBlock, SignedBeaconBlock},
    beacon_state::BeaconState,
    checkpoint::Checkpoint,
    constants::{GENESIS_SLOT, SLOTS_PER_EPOCH},
    eth_1_data::Eth1Data,
    misc::{compute_epoch_at_slot, compute_slot_at_time, compute_start_slot_at_epoch},
};
use ream_fork_choice::store::ForkChoiceStore;
use ream_storage::{db::BeaconDB, filter::BlockFilter};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tree_hash::TreeHash;

use crate::{
    checkpoints::CheckpointStore,
    config::ChainConfig,
    error::{ChainError, CheckpointKind},
    head::HeadReference,
    notifications::{AttestationEvent, BlockEvent, Notifier, StateEvent},
};

/// Everything needed to build the genesis of a new chain.
#[derive(Clone, Debug)]
pub struct ChainStartData {
    pub genesis_time: u64,
    pub genesis_state: BeaconState,
    pub eth1_data: Eth1Data,
}

/// Slots a block may be ahead of the wall clock, covering clock disparity between nodes.
const MAXIMUM_FUTURE_SLOTS: u64 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct GenesisInfo {
    root: B256,
    time: u64,
}

/// Snapshot of the head and the three checkpoints, each resolved to the slot of its block.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChainHead {
    pub head_slot: u64,
    pub head_epoch: u64,
    pub head_block_root: B256,
    pub finalized_slot: u64,
    pub finalized_epoch: u64,
    pub finalized_block_root: B256,
    pub justified_slot: u64,
    pub justified_epoch: u64,
    pub justified_block_root: B256,
    pub previous_justified_slot: u64,
    pub previous_justified_epoch: u64,
    pub previous_justified_block_root: B256,
}

/// The checkpoints together with the head chosen under them. Readers never see one without the
/// other.
#[derive(Default)]
struct ChainView {
    checkpoints: CheckpointStore,
    head: Option<HeadReference>,
}

/// Keeps the canonical head, the checkpoints and the fork choice graph consistent with storage.
///
/// Locks are always taken in the order head update, fork choice, view.
pub struct BeaconChain {
    db: Arc<dyn BeaconDB>,
    fork_choice: Mutex<Box<dyn ForkChoiceStore>>,
    view: RwLock<ChainView>,
    head_update: Mutex<()>,
    genesis: RwLock<Option<GenesisInfo>>,
    notifier: Arc<Notifier>,
    config: ChainConfig,
    ingestion: tokio::sync::Mutex<()>,
    shutdown: CancellationToken,
}

impl BeaconChain {
    pub fn new(
        db: Arc<dyn BeaconDB>,
        fork_choice: Box<dyn ForkChoiceStore>,
        notifier: Arc<Notifier>,
        config: ChainConfig,
    ) -> Self {
        Self {
            db,
            fork_choice: Mutex::new(fork_choice),
            view: RwLock::new(ChainView::default()),
            head_update: Mutex::new(()),
            genesis: RwLock::new(None),
            notifier,
            config,
            ingestion: tokio::sync::Mutex::new(()),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn db(&self) -> &Arc<dyn BeaconDB> {
        &self.db
    }

    pub fn notifier(&self) -> &Arc<Notifier> {
        &self.notifier
    }

    /// Fires once [`BeaconChain::stop`] has been called.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Restores the head, the checkpoints and the graph from storage.
    pub fn initialize_chain_info(&self) -> Result<(), ChainError> {
        let genesis_root = self
            .db
            .genesis_block_root()?
            .ok_or(ChainError::UninitializedChain("genesis block root"))?;
        let head_root = self
            .db
            .head_block_root()?
            .ok_or(ChainError::UninitializedChain("head block root"))?;
        let head_block = self
            .db
            .block(&head_root)?
            .ok_or(ChainError::MissingBlock(head_root))?;
        let head_state = self
            .db
            .state(&head_root)?
            .ok_or(ChainError::MissingState(head_root))?;

        let genesis_checkpoint = Checkpoint::genesis(genesis_root);
        let finalized = self
            .db
            .finalized_checkpoint()?
            .unwrap_or(genesis_checkpoint);
        let mut justified = self
            .db
            .justified_checkpoint()?
            .unwrap_or(genesis_checkpoint);
        if justified.epoch < finalized.epoch {
            warn!(
                justified_epoch = justified.epoch,
                finalized_epoch = finalized.epoch,
                "Persisted justified checkpoint is behind finalization, using finalized checkpoint"
            );
            justified = finalized;
        }
        let checkpoints = CheckpointStore::from_parts(finalized, justified, justified)?;

        let finalized_block =
            self.db
                .block(&finalized.root)?
                .ok_or(ChainError::CheckpointUnresolved {
                    kind: CheckpointKind::Finalized,
                    root: finalized.root,
                })?;
        if !self.db.has_block(&justified.root) {
            return Err(ChainError::CheckpointUnresolved {
                kind: CheckpointKind::Justified,
                root: justified.root,
            });
        }

        {
            let mut fork_choice = self.fork_choice.lock();
            fork_choice.process_block(
                finalized_block.slot(),
                finalized.root,
                finalized_block.parent_root(),
                justified.epoch,
                finalized.epoch,
            )?;

            // Walk back from the head until reaching a node, then insert the blocks in between.
            let mut pending = vec![];
            let mut root = head_root;
            let mut block = head_block.clone();
            while !fork_choice.has_node(&root) {
                let parent_root = block.parent_root();
                if block.slot() <= finalized_block.slot() {
                    return Err(ChainError::OrphanBlock {
                        block_root: root,
                        parent_root,
                    });
                }
                pending.push((root, block));
                block = self
                    .db
                    .block(&parent_root)?
                    .ok_or(ChainError::MissingBlock(parent_root))?;
                root = parent_root;
            }
            for (root, block) in pending.into_iter().rev() {
                let (justified_epoch, finalized_epoch) = match self.db.state(&root)? {
                    Some(state) => (
                        state.current_justified_checkpoint.epoch,
                        state.finalized_checkpoint.epoch,
                    ),
                    None => (justified.epoch, finalized.epoch),
                };
                fork_choice.process_block(
                    block.slot(),
                    root,
                    block.parent_root(),
                    justified_epoch,
                    finalized_epoch,
                )?;
            }
        }

        *self.genesis.write() = Some(GenesisInfo {
            root: genesis_root,
            time: head_state.genesis_time,
        });
        info!(
            head_slot = head_block.slot(),
            ?head_root,
            finalized_epoch = finalized.epoch,
            justified_epoch = justified.epoch,
            "Loaded chain info from storage"
        );
        *self.view.write() = ChainView {
            checkpoints,
            head: Some(HeadReference::new(head_root, head_block, head_state)),
        };
        Ok(())
    }

    /// Persists the genesis block and state of a new chain and makes genesis the head.
    pub async fn initialize_beacon_chain(
        &self,
        genesis_time: u64,
        mut genesis_state: BeaconState,
        eth1_data: Eth1Data,
    ) -> Result<(), ChainError> {
        let _guard = self.ingestion.lock().await;
        if let Some(genesis_root) = self.db.genesis_block_root()? {
            return Err(ChainError::ChainStart(anyhow::anyhow!(
                "Chain already initialized with genesis {genesis_root}"
            )));
        }

        genesis_state.genesis_time = genesis_time;
        genesis_state.eth1_data = eth1_data;
        let genesis_block = SignedBeaconBlock::genesis(genesis_state.tree_hash_root());
        let genesis_root = self.db.save_block(&genesis_block)?;
        self.db.save_state(&genesis_state, genesis_root)?;
        for (index, validator) in genesis_state.validators.iter().enumerate() {
            self.db.save_validator_index(&validator.pubkey, index as u64)?;
        }
        self.db.save_genesis_block_root(genesis_root)?;
        self.db.save_head_block_root(genesis_root)?;

        let genesis_checkpoint = Checkpoint::genesis(genesis_root);
        self.db.save_justified_checkpoint(genesis_checkpoint)?;
        self.db.save_finalized_checkpoint(genesis_checkpoint)?;

        self.fork_choice.lock().process_block(
            GENESIS_SLOT,
            genesis_root,
            B256::ZERO,
            genesis_checkpoint.epoch,
            genesis_checkpoint.epoch,
        )?;
        *self.genesis.write() = Some(GenesisInfo {
            root: genesis_root,
            time: genesis_time,
        });
        info!(
            ?genesis_root,
            genesis_time,
            validators = genesis_state.validators.len(),
            "Initialized beacon chain genesis state"
        );
        *self.view.write() = ChainView {
            checkpoints: CheckpointStore::genesis(genesis_checkpoint),
            head: Some(HeadReference::new(
                genesis_root,
                genesis_block,
                genesis_state,
            )),
        };

        self.notifier.state_feed().publish(StateEvent::ChainStarted {
            start_time: genesis_time,
        });
        Ok(())
    }

    /// Adds ``block`` to the graph using the checkpoint epochs of its post-state.
    pub fn insert_block_to_fork_choice_store(
        &self,
        block: &BeaconBlock,
        block_root: B256,
        post_state: &BeaconState,
    ) -> Result<(), ChainError> {
        self.fork_choice.lock().process_block(
            block.slot,
            block_root,
            block.parent_root,
            post_state.current_justified_checkpoint.epoch,
            post_state.finalized_checkpoint.epoch,
        )?;
        Ok(())
    }

    /// Recomputes the head from the justified checkpoint and persists it.
    pub fn update_head(&self) -> Result<B256, ChainError> {
        let _serialized = self.head_update.lock();
        let checkpoints = self.view.read().checkpoints;
        self.install_head(checkpoints)
    }

    /// Chooses the head under ``checkpoints`` and installs both in one step. Callers hold
    /// ``head_update``.
    fn install_head(&self, checkpoints: CheckpointStore) -> Result<B256, ChainError> {
        let justified = checkpoints.justified();
        let justified_state = self
            .db
            .state(&justified.root)?
            .ok_or(ChainError::MissingState(justified.root))?;
        let head_root = self.fork_choice.lock().head(
            justified.epoch,
            justified.root,
            checkpoints.finalized().epoch,
            &justified_state.get_active_balances(),
        )?;

        let new_head = match self.head() {
            Some(head) if head.root == head_root => head,
            _ => {
                let block = self
                    .db
                    .block(&head_root)?
                    .ok_or(ChainError::MissingBlock(head_root))?;
                let state = self
                    .db
                    .state(&head_root)?
                    .ok_or(ChainError::MissingState(head_root))?;
                self.db.save_head_block_root(head_root)?;
                HeadReference::new(head_root, block, state)
            }
        };

        let mut view = self.view.write();
        if let Some(old_head) = view.head.as_ref().filter(|head| head.root != head_root) {
            if old_head.root != new_head.block.parent_root() {
                info!(
                    old_slot = old_head.slot(),
                    new_slot = new_head.slot(),
                    old_root = ?old_head.root,
                    new_root = ?head_root,
                    "Chain reorg occurred"
                );
            }
            debug!(slot = new_head.slot(), ?head_root, "Updated head");
        }
        view.checkpoints = checkpoints;
        view.head = Some(new_head);
        Ok(head_root)
    }

    /// Whether ``block_root`` is known to fork choice or to storage.
    pub fn has_block(&self, block_root: &B256) -> bool {
        self.fork_choice.lock().has_node(block_root) || self.db.has_block(block_root)
    }

    /// Deletes the states of blocks in slots ``[1, below_slot)``, keeping the head and
    /// checkpoint states. Returns how many states were deleted.
    pub fn prune_garbage_state(&self, below_slot: u64) -> Result<usize, ChainError> {
        if below_slot <= 1 {
            return Ok(0);
        }
        let checkpoints = self.view.read().checkpoints;
        let mut protected = vec![
            checkpoints.finalized().root,
            checkpoints.justified().root,
            checkpoints.previous_justified().root,
        ];
        protected.extend(self.head_root());
        protected.extend(self.genesis_root());

        let filter = BlockFilter::new()
            .set_start_slot(1)
            .set_end_slot(below_slot - 1);
        let roots = self
            .db
            .block_roots(&filter)?
            .into_iter()
            .filter(|root| !protected.contains(root) && self.db.has_state(root))
            .collect::<Vec<_>>();
        self.db.delete_states(&roots)?;
        debug!(below_slot, pruned = roots.len(), "Pruned garbage states");
        Ok(roots.len())
    }

    /// Prunes the graph at the finalized root.
    pub fn prune_fork_choice(&self) -> Result<(), ChainError> {
        let finalized = self.finalized_checkpoint();
        let mut fork_choice = self.fork_choice.lock();
        fork_choice.prune(finalized.root)?;
        debug!(
            finalized_root = ?finalized.root,
            nodes = fork_choice.node_count(),
            "Pruned fork choice"
        );
        Ok(())
    }

    pub fn fork_choice_node_count(&self) -> usize {
        self.fork_choice.lock().node_count()
    }

    pub fn chain_head_retrieval(&self) -> Result<ChainHead, ChainError> {
        let (head, checkpoints) = {
            let view = self.view.read();
            (view.head.clone().ok_or(ChainError::HeadUnset)?, view.checkpoints)
        };
        let resolve = |kind, checkpoint: Checkpoint| -> Result<u64, ChainError> {
            self.db
                .block(&checkpoint.root)?
                .map(|block| block.slot())
                .ok_or(ChainError::CheckpointUnresolved {
                    kind,
                    root: checkpoint.root,
                })
        };

        let finalized = checkpoints.finalized();
        let justified = checkpoints.justified();
        let previous_justified = checkpoints.previous_justified();
        Ok(ChainHead {
            head_slot: head.slot(),
            head_epoch: head.epoch(),
            head_block_root: head.root,
            finalized_slot: resolve(CheckpointKind::Finalized, finalized)?,
            finalized_epoch: finalized.epoch,
            finalized_block_root: finalized.root,
            justified_slot: resolve(CheckpointKind::Justified, justified)?,
            justified_epoch: justified.epoch,
            justified_block_root: justified.root,
            previous_justified_slot: resolve(
                CheckpointKind::PreviousJustified,
                previous_justified,
            )?,
            previous_justified_epoch: previous_justified.epoch,
            previous_justified_block_root: previous_justified.root,
        })
    }

    pub fn head(&self) -> Option<HeadReference> {
        self.view.read().head.clone()
    }

    pub fn head_root(&self) -> Option<B256> {
        self.view.read().head.as_ref().map(|head| head.root)
    }

    pub fn head_block(&self) -> Option<Arc<SignedBeaconBlock>> {
        self.view.read().head.as_ref().map(|head| head.block.clone())
    }

    /// Slot of the head block, zero before the chain is initialized.
    pub fn head_slot(&self) -> u64 {
        self.view.read().head.as_ref().map_or(0, HeadReference::slot)
    }

    pub fn head_state(&self) -> Option<Arc<BeaconState>> {
        self.view.read().head.as_ref().map(|head| head.state.clone())
    }

    pub fn genesis_root(&self) -> Option<B256> {
        self.genesis.read().map(|genesis| genesis.root)
    }

    pub fn genesis_time(&self) -> Option<u64> {
        self.genesis.read().map(|genesis| genesis.time)
    }

    pub fn finalized_checkpoint(&self) -> Checkpoint {
        self.view.read().checkpoints.finalized()
    }

    pub fn current_justified_checkpoint(&self) -> Checkpoint {
        self.view.read().checkpoints.justified()
    }

    pub fn previous_justified_checkpoint(&self) -> Checkpoint {
        self.view.read().checkpoints.previous_justified()
    }

    /// Validates ``block`` against its parent's state and makes it part of the chain.
    ///
    /// Nothing is committed if ``cancel`` fires before the state transition completes.
    pub async fn receive_block(
        &self,
        block: SignedBeaconBlock,
        cancel: &CancellationToken,
    ) -> Result<B256, ChainError> {
        let _guard = self.ingestion.lock().await;
        let block_root = block.block_root();
        if self.fork_choice.lock().has_node(&block_root) {
            debug!(slot = block.slot(), ?block_root, "Ignoring known block");
            return Ok(block_root);
        }

        let parent_root = block.parent_root();
        if !self.fork_choice.lock().has_node(&parent_root) {
            return Err(ChainError::OrphanBlock {
                block_root,
                parent_root,
            });
        }
        let finalized_slot = compute_start_slot_at_epoch(self.finalized_checkpoint().epoch);
        if block.slot() <= finalized_slot {
            return Err(ChainError::BlockBeforeFinalized {
                slot: block.slot(),
                finalized_slot,
            });
        }
        if let Some(genesis_time) = self.genesis_time() {
            let now = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_or(0, |elapsed| elapsed.as_secs());
            let current_slot = compute_slot_at_time(genesis_time, now);
            if block.slot() > current_slot + MAXIMUM_FUTURE_SLOTS {
                return Err(ChainError::FutureBlock {
                    slot: block.slot(),
                    current_slot,
                });
            }
        }

        let parent_state = self
            .db
            .state(&parent_root)?
            .ok_or(ChainError::MissingState(parent_root))?;
        if block.slot() > parent_state.slot.saturating_add(self.config.max_skip_slots) {
            return Err(ChainError::TooManySkippedSlots {
                slot: block.slot(),
                parent_slot: parent_state.slot,
            });
        }
        let known_validators = parent_state.validators.len();
        let (block, state) = self.run_state_transition(block, parent_state, cancel).await?;

        // Resolve every vote before anything is written
        let votes = block
            .message
            .body
            .attestations
            .iter()
            .map(|attestation| {
                state
                    .get_attesting_indices(&attestation.data, &attestation.aggregation_bits)
                    .map(|indices| (indices, &attestation.data))
                    .map_err(ChainError::InvalidAttestation)
            })
            .collect::<Result<Vec<_>, _>>()?;

        if cancel.is_cancelled() || self.shutdown.is_cancelled() {
            return Err(ChainError::Cancelled);
        }

        self.db.save_block(&block)?;
        self.db.save_state(&state, block_root)?;
        for (index, validator) in state
            .validators
            .iter()
            .enumerate()
            .skip(known_validators)
        {
            self.db.save_validator_index(&validator.pubkey, index as u64)?;
        }
        self.insert_block_to_fork_choice_store(&block.message, block_root, &state)?;
        {
            let mut fork_choice = self.fork_choice.lock();
            for (indices, data) in votes {
                fork_choice.process_attestation(
                    &indices,
                    data.beacon_block_root,
                    data.target.epoch,
                );
            }
        }

        let (justified, finalized) = {
            let _serialized = self.head_update.lock();
            let mut checkpoints = self.view.read().checkpoints;
            let advanced = advance_checkpoints(&mut checkpoints, &state)?;
            self.install_head(checkpoints)?;
            advanced
        };
        self.commit_checkpoints(justified, finalized)?;

        let block = Arc::new(block);
        self.notifier
            .block_feed()
            .publish(BlockEvent::ReceivedBlock(block.clone()));
        for attestation in block.message.body.attestations.iter() {
            self.notifier
                .attestation_feed()
                .publish(AttestationEvent::Received(Arc::new(attestation.clone())));
        }
        self.notifier.state_feed().publish(StateEvent::BlockProcessed {
            slot: block.slot(),
            block_root,
        });
        info!(slot = block.slot(), ?block_root, "Processed block");
        Ok(block_root)
    }

    /// Runs the state transition on the blocking pool. Slot processing stops as soon as
    /// ``cancel`` or the service shutdown fires.
    async fn run_state_transition(
        &self,
        block: SignedBeaconBlock,
        mut state: BeaconState,
        cancel: &CancellationToken,
    ) -> Result<(SignedBeaconBlock, BeaconState), ChainError> {
        let interrupt = (cancel.clone(), self.shutdown.clone());
        let transition = tokio::task::spawn_blocking(move || {
            let (cancel, shutdown) = interrupt;
            state
                .state_transition_with_interrupt(&block, true, || {
                    cancel.is_cancelled() || shutdown.is_cancelled()
                })
                .map(|()| (block, state))
        });

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ChainError::Cancelled),
            _ = self.shutdown.cancelled() => Err(ChainError::Cancelled),
            result = transition => match result {
                Ok(result) => result.map_err(ChainError::StateTransition),
                Err(err) => Err(ChainError::StateTransition(anyhow::anyhow!(
                    "State transition task failed: {err}"
                ))),
            },
        }
    }

    /// Persists checkpoints that just advanced and prunes behind a new finalized checkpoint.
    fn commit_checkpoints(
        &self,
        justified: Option<Checkpoint>,
        finalized: Option<Checkpoint>,
    ) -> Result<(), ChainError> {
        if let Some(justified) = justified {
            self.db.save_justified_checkpoint(justified)?;
            info!(epoch = justified.epoch, root = ?justified.root, "Justified checkpoint updated");
        }
        if let Some(finalized) = finalized {
            self.db.save_finalized_checkpoint(finalized)?;
            info!(epoch = finalized.epoch, root = ?finalized.root, "Finalized checkpoint updated");
            self.prune_fork_choice()?;
            if self.config.prune_finalized_states {
                let below_slot = compute_start_slot_at_epoch(finalized.epoch)
                    .saturating_sub(SLOTS_PER_EPOCH);
                self.prune_garbage_state(below_slot)?;
            }
        }
        Ok(())
    }

    /// Applies a gossiped attestation as fork choice votes and returns the attesting indices.
    pub fn on_attestation(
        &self,
        attestation: Attestation,
        cancel: &CancellationToken,
    ) -> Result<Vec<u64>, ChainError> {
        let data = &attestation.data;
        {
            let fork_choice = self.fork_choice.lock();
            for root in [data.target.root, data.beacon_block_root] {
                if !fork_choice.has_node(&root) {
                    return Err(ChainError::UnknownBlockRoot(root));
                }
            }
        }
        let head_state = self.head_state().ok_or(ChainError::HeadUnset)?;
        if data.target.epoch > compute_epoch_at_slot(head_state.slot) + 1 {
            return Err(ChainError::InvalidAttestation(anyhow::anyhow!(
                "Target epoch {} is ahead of head epoch {}",
                data.target.epoch,
                compute_epoch_at_slot(head_state.slot)
            )));
        }
        let indices = head_state
            .get_attesting_indices(data, &attestation.aggregation_bits)
            .map_err(ChainError::InvalidAttestation)?;

        if cancel.is_cancelled() {
            return Err(ChainError::Cancelled);
        }
        self.fork_choice.lock().process_attestation(
            &indices,
            data.beacon_block_root,
            data.target.epoch,
        );
        self.notifier
            .attestation_feed()
            .publish(AttestationEvent::Received(Arc::new(attestation)));
        Ok(indices)
    }

    /// Resumes from storage, or waits for ``chain_start`` and initializes a new chain.
    pub async fn start<F>(&self, chain_start: F) -> Result<(), ChainError>
    where
        F: Future<Output = anyhow::Result<ChainStartData>>,
    {
        match self.initialize_chain_info() {
            Ok(()) => {
                info!("Beacon chain data already exists, starting service");
            }
            Err(ChainError::UninitializedChain(missing)) => {
                info!(
                    missing,
                    "Waiting for chain start to initialize the beacon chain"
                );
                let data = tokio::select! {
                    biased;
                    _ = self.shutdown.cancelled() => return Err(ChainError::Cancelled),
                    data = chain_start => data.map_err(ChainError::ChainStart)?,
                };
                self.initialize_beacon_chain(data.genesis_time, data.genesis_state, data.eth1_data)
                    .await?;
            }
            Err(err) => return Err(err),
        }

        let start_time = self.genesis_time().unwrap_or_default();
        let state_slot = self.head().map_or(0, |head| head.state_slot());
        self.notifier.state_feed().publish(StateEvent::Initialized {
            start_time,
            state_slot,
        });
        Ok(())
    }

    /// Cancels in-flight work and ends every subscription.
    pub fn stop(&self) {
        info!("Stopping beacon chain service");
        self.shutdown.cancel();
        self.notifier.close();
    }
}

/// Adopts the checkpoints of ``state`` that are newer than those in ``checkpoints``, returning the
/// justified and finalized checkpoints that advanced.
fn advance_checkpoints(
    checkpoints: &mut CheckpointStore,
    state: &BeaconState,
) -> Result<(Option<Checkpoint>, Option<Checkpoint>), ChainError> {
    let justified = state.current_justified_checkpoint;
    let justified = (justified.epoch > checkpoints.justified().epoch
        && checkpoints.update_justified(justified)?)
    .then_some(justified);

    let finalized = state.finalized_checkpoint;
    let finalized = if finalized.epoch > checkpoints.finalized().epoch {
        checkpoints.set_finalized(finalized)?;
        Some(finalized)
    } else {
        None
    };
    Ok((justified, finalized))
}
