use alloy_primitives::B256;
use ream_consensus::{
    beacon_block::SignedBeaconBlock, beacon_state::BeaconState, checkpoint::Checkpoint,
    pubkey::PubKey,
};

use crate::filter::BlockFilter;

/// Durable storage for blocks, states and chain metadata. Blocks and states are keyed by block
/// root; states are pruned independently of blocks.
pub trait BeaconDB: Send + Sync {
    /// Persists ``block`` and returns its root.
    fn save_block(&self, block: &SignedBeaconBlock) -> anyhow::Result<B256>;

    fn block(&self, block_root: &B256) -> anyhow::Result<Option<SignedBeaconBlock>>;

    fn has_block(&self, block_root: &B256) -> bool;

    fn delete_block(&self, block_root: &B256) -> anyhow::Result<()>;

    /// Blocks within the filter's slot bounds, ordered by slot.
    fn blocks(&self, filter: &BlockFilter) -> anyhow::Result<Vec<SignedBeaconBlock>>;

    fn block_roots(&self, filter: &BlockFilter) -> anyhow::Result<Vec<B256>>;

    fn genesis_block(&self) -> anyhow::Result<Option<SignedBeaconBlock>>;

    fn save_genesis_block_root(&self, block_root: B256) -> anyhow::Result<()>;

    fn genesis_block_root(&self) -> anyhow::Result<Option<B256>>;

    /// Fails unless a state is stored for ``block_root``.
    fn save_head_block_root(&self, block_root: B256) -> anyhow::Result<()>;

    fn head_block_root(&self) -> anyhow::Result<Option<B256>>;

    fn head_block(&self) -> anyhow::Result<Option<SignedBeaconBlock>>;

    fn save_state(&self, state: &BeaconState, block_root: B256) -> anyhow::Result<()>;

    fn state(&self, block_root: &B256) -> anyhow::Result<Option<BeaconState>>;

    fn has_state(&self, block_root: &B256) -> bool;

    /// Refuses to delete the genesis, head or finalized state.
    fn delete_state(&self, block_root: &B256) -> anyhow::Result<()>;

    fn delete_states(&self, block_roots: &[B256]) -> anyhow::Result<()>;

    fn save_finalized_checkpoint(&self, checkpoint: Checkpoint) -> anyhow::Result<()>;

    fn finalized_checkpoint(&self) -> anyhow::Result<Option<Checkpoint>>;

    fn save_justified_checkpoint(&self, checkpoint: Checkpoint) -> anyhow::Result<()>;

    fn justified_checkpoint(&self) -> anyhow::Result<Option<Checkpoint>>;

    fn save_validator_index(&self, pubkey: &PubKey, index: u64) -> anyhow::Result<()>;

    fn validator_index(&self, pubkey: &PubKey) -> anyhow::Result<Option<u64>>;

    fn has_validator_index(&self, pubkey: &PubKey) -> bool;
}
