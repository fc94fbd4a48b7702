use std::collections::{BTreeMap, BTreeSet, HashMap};

use alloy_primitives::B256;
use anyhow::{bail, ensure};
use parking_lot::RwLock;
use ream_consensus::{
    beacon_block::SignedBeaconBlock, beacon_state::BeaconState, checkpoint::Checkpoint,
    pubkey::PubKey,
};
use tracing::debug;

use crate::{
    codec::{decode, encode},
    db::BeaconDB,
    filter::BlockFilter,
};

#[derive(Default)]
struct Tables {
    blocks: HashMap<B256, Vec<u8>>,
    /// slot -> roots of the blocks at that slot
    block_slots: BTreeMap<u64, BTreeSet<B256>>,
    states: HashMap<B256, Vec<u8>>,
    validator_indices: HashMap<Vec<u8>, u64>,
    genesis_block_root: Option<B256>,
    head_block_root: Option<B256>,
    finalized_checkpoint: Option<Checkpoint>,
    justified_checkpoint: Option<Checkpoint>,
}

impl Tables {
    fn block(&self, block_root: &B256) -> anyhow::Result<Option<SignedBeaconBlock>> {
        self.blocks
            .get(block_root)
            .map(|compressed| decode(compressed))
            .transpose()
    }

    fn block_roots(&self, filter: &BlockFilter) -> Vec<B256> {
        match filter.slot_range() {
            Some(range) => self
                .block_slots
                .range(range)
                .flat_map(|(_, roots)| roots.iter().copied())
                .collect(),
            None => vec![],
        }
    }
}

/// A [`BeaconDB`] holding compressed values in memory.
#[derive(Default)]
pub struct InMemoryDB {
    tables: RwLock<Tables>,
}

impl InMemoryDB {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total compressed size of the stored states.
    pub fn state_bytes(&self) -> usize {
        self.tables.read().states.values().map(Vec::len).sum()
    }

    pub fn state_count(&self) -> usize {
        self.tables.read().states.len()
    }
}

impl BeaconDB for InMemoryDB {
    fn save_block(&self, block: &SignedBeaconBlock) -> anyhow::Result<B256> {
        let block_root = block.block_root();
        let compressed = encode(block)?;

        let mut tables = self.tables.write();
        tables.blocks.insert(block_root, compressed);
        tables
            .block_slots
            .entry(block.slot())
            .or_default()
            .insert(block_root);

        debug!(slot = block.slot(), ?block_root, "Saved block");
        Ok(block_root)
    }

    fn block(&self, block_root: &B256) -> anyhow::Result<Option<SignedBeaconBlock>> {
        self.tables.read().block(block_root)
    }

    fn has_block(&self, block_root: &B256) -> bool {
        self.tables.read().blocks.contains_key(block_root)
    }

    fn delete_block(&self, block_root: &B256) -> anyhow::Result<()> {
        let mut tables = self.tables.write();
        let Some(block) = tables.block(block_root)? else {
            return Ok(());
        };
        tables.blocks.remove(block_root);
        if let Some(roots) = tables.block_slots.get_mut(&block.slot()) {
            roots.remove(block_root);
            if roots.is_empty() {
                tables.block_slots.remove(&block.slot());
            }
        }
        Ok(())
    }

    fn blocks(&self, filter: &BlockFilter) -> anyhow::Result<Vec<SignedBeaconBlock>> {
        let tables = self.tables.read();
        tables
            .block_roots(filter)
            .iter()
            .filter_map(|block_root| tables.block(block_root).transpose())
            .collect()
    }

    fn block_roots(&self, filter: &BlockFilter) -> anyhow::Result<Vec<B256>> {
        Ok(self.tables.read().block_roots(filter))
    }

    fn genesis_block(&self) -> anyhow::Result<Option<SignedBeaconBlock>> {
        let tables = self.tables.read();
        match tables.genesis_block_root {
            Some(block_root) => tables.block(&block_root),
            None => Ok(None),
        }
    }

    fn save_genesis_block_root(&self, block_root: B256) -> anyhow::Result<()> {
        self.tables.write().genesis_block_root = Some(block_root);
        Ok(())
    }

    fn genesis_block_root(&self) -> anyhow::Result<Option<B256>> {
        Ok(self.tables.read().genesis_block_root)
    }

    fn save_head_block_root(&self, block_root: B256) -> anyhow::Result<()> {
        let mut tables = self.tables.write();
        ensure!(
            tables.states.contains_key(&block_root),
            "No state found with head block root {block_root}"
        );
        tables.head_block_root = Some(block_root);
        Ok(())
    }

    fn head_block_root(&self) -> anyhow::Result<Option<B256>> {
        Ok(self.tables.read().head_block_root)
    }

    fn head_block(&self) -> anyhow::Result<Option<SignedBeaconBlock>> {
        let tables = self.tables.read();
        match tables.head_block_root {
            Some(block_root) => tables.block(&block_root),
            None => Ok(None),
        }
    }

    fn save_state(&self, state: &BeaconState, block_root: B256) -> anyhow::Result<()> {
        let compressed = encode(state)?;
        self.tables.write().states.insert(block_root, compressed);
        Ok(())
    }

    fn state(&self, block_root: &B256) -> anyhow::Result<Option<BeaconState>> {
        self.tables
            .read()
            .states
            .get(block_root)
            .map(|compressed| decode(compressed))
            .transpose()
    }

    fn has_state(&self, block_root: &B256) -> bool {
        self.tables.read().states.contains_key(block_root)
    }

    fn delete_state(&self, block_root: &B256) -> anyhow::Result<()> {
        self.delete_states(std::slice::from_ref(block_root))
    }

    fn delete_states(&self, block_roots: &[B256]) -> anyhow::Result<()> {
        let mut tables = self.tables.write();
        let protected = [
            tables.genesis_block_root,
            tables.head_block_root,
            tables.finalized_checkpoint.map(|checkpoint| checkpoint.root),
        ];
        for block_root in block_roots {
            if protected.contains(&Some(*block_root)) {
                bail!("Cannot delete genesis, finalized, or head state {block_root}");
            }
        }
        for block_root in block_roots {
            tables.states.remove(block_root);
        }
        Ok(())
    }

    fn save_finalized_checkpoint(&self, checkpoint: Checkpoint) -> anyhow::Result<()> {
        self.tables.write().finalized_checkpoint = Some(checkpoint);
        Ok(())
    }

    fn finalized_checkpoint(&self) -> anyhow::Result<Option<Checkpoint>> {
        Ok(self.tables.read().finalized_checkpoint)
    }

    fn save_justified_checkpoint(&self, checkpoint: Checkpoint) -> anyhow::Result<()> {
        self.tables.write().justified_checkpoint = Some(checkpoint);
        Ok(())
    }

    fn justified_checkpoint(&self) -> anyhow::Result<Option<Checkpoint>> {
        Ok(self.tables.read().justified_checkpoint)
    }

    fn save_validator_index(&self, pubkey: &PubKey, index: u64) -> anyhow::Result<()> {
        self.tables
            .write()
            .validator_indices
            .insert(pubkey.as_bytes().to_vec(), index);
        Ok(())
    }

    fn validator_index(&self, pubkey: &PubKey) -> anyhow::Result<Option<u64>> {
        Ok(self
            .tables
            .read()
            .validator_indices
            .get(pubkey.as_bytes())
            .copied())
    }

    fn has_validator_index(&self, pubkey: &PubKey) -> bool {
        self.tables
            .read()
            .validator_indices
            .contains_key(pubkey.as_bytes())
    }
}
