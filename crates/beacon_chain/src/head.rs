use std::sync::Arc;

use alloy_primitives::B256;
use ream_consensus::{beacon_block::SignedBeaconBlock, beacon_state::BeaconState};

/// The canonical head as last computed by fork choice.
#[derive(Clone, Debug)]
pub struct HeadReference {
    pub root: B256,
    pub block: Arc<SignedBeaconBlock>,
    pub state: Arc<BeaconState>,
}

impl HeadReference {
    pub fn new(root: B256, block: SignedBeaconBlock, state: BeaconState) -> Self {
        Self {
            root,
            block: Arc::new(block),
            state: Arc::new(state),
        }
    }

    pub fn slot(&self) -> u64 {
        self.block.slot()
    }

    pub fn epoch(&self) -> u64 {
        self.block.epoch()
    }

    pub fn state_slot(&self) -> u64 {
        self.state.slot
    }
}
