use alloy_primitives::B256;

use crate::error::ForkChoiceError;

/// A weighted block DAG that picks the canonical head.
///
/// Every node's parent must already be a node, except for the first node inserted, which anchors
/// the graph.
pub trait ForkChoiceStore: Send + Sync {
    /// Inserts a node for ``root``. Inserting a known root is a no-op.
    fn process_block(
        &mut self,
        slot: u64,
        root: B256,
        parent_root: B256,
        justified_epoch: u64,
        finalized_epoch: u64,
    ) -> Result<(), ForkChoiceError>;

    /// Records the latest message of each validator in ``validator_indices``. Only votes for a
    /// later target epoch replace a validator's previous vote.
    fn process_attestation(
        &mut self,
        validator_indices: &[u64],
        block_root: B256,
        target_epoch: u64,
    );

    /// Applies pending votes weighted by ``justified_state_balances`` and returns the best
    /// descendant of ``justified_root``.
    fn head(
        &mut self,
        justified_epoch: u64,
        justified_root: B256,
        finalized_epoch: u64,
        justified_state_balances: &[u64],
    ) -> Result<B256, ForkChoiceError>;

    fn has_node(&self, root: &B256) -> bool;

    /// Drops every node inserted before ``finalized_root`` once enough of them have accumulated.
    fn prune(&mut self, finalized_root: B256) -> Result<(), ForkChoiceError>;

    fn node_count(&self) -> usize;
}
