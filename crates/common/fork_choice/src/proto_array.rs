//! Proto-array LMD GHOST.
//!
//! Nodes are kept in insertion order, so a parent always sits at a lower index than its children
//! and a single reverse pass is enough to propagate weights and best descendants to the root.

use std::collections::HashMap;

use alloy_primitives::B256;
use tracing::debug;

use crate::{error::ForkChoiceError, store::ForkChoiceStore};

pub const DEFAULT_PRUNE_THRESHOLD: usize = 256;

#[derive(Clone, Debug, PartialEq)]
pub struct ProtoNode {
    pub slot: u64,
    pub root: B256,
    pub parent: Option<usize>,
    pub justified_epoch: u64,
    pub finalized_epoch: u64,
    pub weight: u64,
    pub best_child: Option<usize>,
    pub best_descendant: Option<usize>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct VoteTracker {
    current_root: B256,
    next_root: B256,
    next_epoch: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProtoArray {
    /// Do not attempt to prune the tree unless it has at least this many nodes. Small prunes
    /// simply waste time.
    pub prune_threshold: usize,
    pub justified_epoch: u64,
    pub finalized_epoch: u64,
    pub nodes: Vec<ProtoNode>,
    pub indices: HashMap<B256, usize>,
}

impl ProtoArray {
    /// Iterate backwards through the array, touching all nodes and their parents and potentially
    /// the best-child of each parent.
    ///
    /// The structure of the `self.nodes` array ensures that the child of each node is always
    /// touched before its parent.
    pub fn apply_score_changes(
        &mut self,
        mut deltas: Vec<i64>,
        justified_epoch: u64,
        finalized_epoch: u64,
    ) -> Result<(), ForkChoiceError> {
        if deltas.len() != self.indices.len() {
            return Err(ForkChoiceError::InvalidDeltaLen {
                deltas: deltas.len(),
                indices: self.indices.len(),
            });
        }

        if justified_epoch != self.justified_epoch || finalized_epoch != self.finalized_epoch {
            self.justified_epoch = justified_epoch;
            self.finalized_epoch = finalized_epoch;
        }

        for node_index in (0..self.nodes.len()).rev() {
            let node = self
                .nodes
                .get_mut(node_index)
                .ok_or(ForkChoiceError::InvalidNodeIndex(node_index))?;
            let node_delta = *deltas
                .get(node_index)
                .ok_or(ForkChoiceError::InvalidNodeDelta(node_index))?;

            node.weight = if node_delta < 0 {
                node.weight
                    .checked_sub(node_delta.unsigned_abs())
                    .ok_or(ForkChoiceError::DeltaOverflow(node_index))?
            } else {
                node.weight
                    .checked_add(node_delta as u64)
                    .ok_or(ForkChoiceError::DeltaOverflow(node_index))?
            };

            if let Some(parent_index) = node.parent {
                let parent_delta = deltas
                    .get_mut(parent_index)
                    .ok_or(ForkChoiceError::InvalidNodeDelta(parent_index))?;
                *parent_delta = parent_delta
                    .checked_add(node_delta)
                    .ok_or(ForkChoiceError::DeltaOverflow(parent_index))?;
            }
        }

        // A second pass so best children are chosen against final weights.
        for node_index in (0..self.nodes.len()).rev() {
            if let Some(parent_index) = self.nodes[node_index].parent {
                self.maybe_update_best_child_and_descendant(parent_index, node_index)?;
            }
        }

        Ok(())
    }

    /// Register a block with the fork choice.
    ///
    /// It is only sane to supply a `None` parent for the genesis block.
    pub fn on_block(
        &mut self,
        slot: u64,
        root: B256,
        parent: Option<usize>,
        justified_epoch: u64,
        finalized_epoch: u64,
    ) -> Result<(), ForkChoiceError> {
        // If the block is already known, simply ignore it.
        if self.indices.contains_key(&root) {
            return Ok(());
        }

        let node_index = self.nodes.len();
        self.indices.insert(root, node_index);
        self.nodes.push(ProtoNode {
            slot,
            root,
            parent,
            justified_epoch,
            finalized_epoch,
            weight: 0,
            best_child: None,
            best_descendant: None,
        });

        if let Some(parent_index) = parent {
            self.maybe_update_best_child_and_descendant(parent_index, node_index)?;
        }

        Ok(())
    }

    /// Follows the best-descendant links to find the best-block (i.e., head-block).
    pub fn find_head(&self, justified_root: &B256) -> Result<B256, ForkChoiceError> {
        let justified_index = *self
            .indices
            .get(justified_root)
            .ok_or(ForkChoiceError::JustifiedNodeUnknown(*justified_root))?;
        let justified_node = self
            .nodes
            .get(justified_index)
            .ok_or(ForkChoiceError::InvalidNodeIndex(justified_index))?;

        let best_descendant_index = justified_node.best_descendant.unwrap_or(justified_index);
        let best_node = self
            .nodes
            .get(best_descendant_index)
            .ok_or(ForkChoiceError::InvalidNodeIndex(best_descendant_index))?;

        // Perform a sanity check that the node is indeed valid to be the head.
        if !self.node_is_viable_for_head(best_node) {
            return Err(ForkChoiceError::InvalidBestNode {
                start_root: *justified_root,
                best_root: best_node.root,
                justified_epoch: self.justified_epoch,
                finalized_epoch: self.finalized_epoch,
                node_justified_epoch: best_node.justified_epoch,
                node_finalized_epoch: best_node.finalized_epoch,
            });
        }

        Ok(best_node.root)
    }

    /// Update the tree with new finalization information. The tree is only actually pruned if
    /// both of the two following criteria are met:
    ///
    /// - The supplied finalized epoch and root are different to the current values.
    /// - The number of nodes in `self` is at least `self.prune_threshold`.
    pub fn maybe_prune(&mut self, finalized_root: B256) -> Result<(), ForkChoiceError> {
        let finalized_index = *self
            .indices
            .get(&finalized_root)
            .ok_or(ForkChoiceError::FinalizedNodeUnknown(finalized_root))?;

        if finalized_index < self.prune_threshold {
            return Ok(());
        }

        // Remove the `self.indices` key/values for all the to-be-deleted nodes.
        for node in &self.nodes[..finalized_index] {
            self.indices.remove(&node.root);
        }

        // Drop all the nodes prior to finalization.
        self.nodes = self.nodes.split_off(finalized_index);

        // Adjust the indices map.
        for index in self.indices.values_mut() {
            *index = index
                .checked_sub(finalized_index)
                .ok_or(ForkChoiceError::IndexOverflow("indices"))?;
        }

        // Iterate through all the existing nodes and adjust their indices to match the new layout
        // of `self.nodes`.
        for node in self.nodes.iter_mut() {
            // If `node.parent` is less than `finalized_index`, set it to `None`.
            node.parent = node
                .parent
                .and_then(|parent| parent.checked_sub(finalized_index));
            if let Some(best_child) = node.best_child {
                node.best_child = Some(
                    best_child
                        .checked_sub(finalized_index)
                        .ok_or(ForkChoiceError::IndexOverflow("best_child"))?,
                );
            }
            if let Some(best_descendant) = node.best_descendant {
                node.best_descendant = Some(
                    best_descendant
                        .checked_sub(finalized_index)
                        .ok_or(ForkChoiceError::IndexOverflow("best_descendant"))?,
                );
            }
        }

        debug!(pruned = finalized_index, remaining = self.nodes.len(), "Pruned fork choice");
        Ok(())
    }

    /// Observe the parent at `parent_index` with respect to the child at `child_index` and
    /// potentially modify the `parent.best_child` and `parent.best_descendant` values.
    ///
    /// ## Detail
    ///
    /// There are four outcomes:
    ///
    /// - The child is already the best child but it's now invalid due to a FFG change and should
    ///   be removed.
    /// - The child is already the best child and the parent is updated with the new
    ///   best-descendant.
    /// - The child is not the best child but becomes the best child.
    /// - The child is not the best child and does not become the best child.
    fn maybe_update_best_child_and_descendant(
        &mut self,
        parent_index: usize,
        child_index: usize,
    ) -> Result<(), ForkChoiceError> {
        let child = self
            .nodes
            .get(child_index)
            .ok_or(ForkChoiceError::InvalidNodeIndex(child_index))?;
        let parent = self
            .nodes
            .get(parent_index)
            .ok_or(ForkChoiceError::InvalidNodeIndex(parent_index))?;

        let child_leads_to_viable_head = self.node_leads_to_viable_head(child)?;

        let change_to_none = (None, None);
        let change_to_child = (
            Some(child_index),
            child.best_descendant.or(Some(child_index)),
        );
        let no_change = (parent.best_child, parent.best_descendant);

        let (new_best_child, new_best_descendant) = match parent.best_child {
            Some(best_child_index) if best_child_index == child_index => {
                if child_leads_to_viable_head {
                    change_to_child
                } else {
                    change_to_none
                }
            }
            Some(best_child_index) => {
                let best_child = self
                    .nodes
                    .get(best_child_index)
                    .ok_or(ForkChoiceError::InvalidNodeIndex(best_child_index))?;
                let best_child_leads_to_viable_head = self.node_leads_to_viable_head(best_child)?;

                if child_leads_to_viable_head && !best_child_leads_to_viable_head {
                    change_to_child
                } else if !child_leads_to_viable_head && best_child_leads_to_viable_head {
                    no_change
                } else if child.weight == best_child.weight {
                    // Tie-breaker of equal weights by root.
                    if child.root >= best_child.root {
                        change_to_child
                    } else {
                        no_change
                    }
                } else if child.weight > best_child.weight {
                    change_to_child
                } else {
                    no_change
                }
            }
            None if child_leads_to_viable_head => change_to_child,
            None => no_change,
        };

        let parent = self
            .nodes
            .get_mut(parent_index)
            .ok_or(ForkChoiceError::InvalidNodeIndex(parent_index))?;
        parent.best_child = new_best_child;
        parent.best_descendant = new_best_descendant;

        Ok(())
    }

    /// Indicates if the node itself is viable for the head, or if its best descendant is viable
    /// for the head.
    fn node_leads_to_viable_head(&self, node: &ProtoNode) -> Result<bool, ForkChoiceError> {
        let best_descendant_is_viable_for_head = match node.best_descendant {
            Some(best_descendant_index) => {
                let best_descendant = self
                    .nodes
                    .get(best_descendant_index)
                    .ok_or(ForkChoiceError::InvalidNodeIndex(best_descendant_index))?;
                self.node_is_viable_for_head(best_descendant)
            }
            None => false,
        };

        Ok(best_descendant_is_viable_for_head || self.node_is_viable_for_head(node))
    }

    /// A node is viable for head when its checkpoints agree with the store's, unless the store is
    /// still at genesis.
    pub fn node_is_viable_for_head(&self, node: &ProtoNode) -> bool {
        (node.justified_epoch == self.justified_epoch || self.justified_epoch == 0)
            && (node.finalized_epoch == self.finalized_epoch || self.finalized_epoch == 0)
    }
}

/// The in-memory fork-choice graph.
#[derive(Clone, Debug, PartialEq)]
pub struct ProtoArrayForkChoice {
    proto_array: ProtoArray,
    finalized_root: B256,
    votes: Vec<VoteTracker>,
    balances: Vec<u64>,
}

impl ProtoArrayForkChoice {
    /// An empty graph that will be anchored at ``finalized_root``. A zero ``finalized_root``
    /// accepts whichever block is processed first as the anchor.
    pub fn new(justified_epoch: u64, finalized_epoch: u64, finalized_root: B256) -> Self {
        Self {
            proto_array: ProtoArray {
                prune_threshold: DEFAULT_PRUNE_THRESHOLD,
                justified_epoch,
                finalized_epoch,
                nodes: Vec::new(),
                indices: HashMap::new(),
            },
            finalized_root,
            votes: Vec::new(),
            balances: Vec::new(),
        }
    }

    pub fn with_prune_threshold(mut self, prune_threshold: usize) -> Self {
        self.proto_array.prune_threshold = prune_threshold;
        self
    }

    pub fn weight(&self, root: &B256) -> Option<u64> {
        self.node(root).map(|node| node.weight)
    }

    pub fn node(&self, root: &B256) -> Option<&ProtoNode> {
        self.proto_array
            .indices
            .get(root)
            .and_then(|index| self.proto_array.nodes.get(*index))
    }
}

impl ForkChoiceStore for ProtoArrayForkChoice {
    fn process_block(
        &mut self,
        slot: u64,
        root: B256,
        parent_root: B256,
        justified_epoch: u64,
        finalized_epoch: u64,
    ) -> Result<(), ForkChoiceError> {
        if self.proto_array.indices.contains_key(&root) {
            return Ok(());
        }

        let parent = self.proto_array.indices.get(&parent_root).copied();
        let is_anchor = self.proto_array.nodes.is_empty()
            && (self.finalized_root == B256::ZERO || self.finalized_root == root);
        if parent.is_none() && parent_root != B256::ZERO && !is_anchor {
            return Err(ForkChoiceError::OrphanBlock {
                block_root: root,
                parent_root,
            });
        }

        self.proto_array
            .on_block(slot, root, parent, justified_epoch, finalized_epoch)
    }

    fn process_attestation(
        &mut self,
        validator_indices: &[u64],
        block_root: B256,
        target_epoch: u64,
    ) {
        for &validator_index in validator_indices {
            let validator_index = validator_index as usize;
            if validator_index >= self.votes.len() {
                self.votes
                    .resize_with(validator_index + 1, VoteTracker::default);
            }
            let vote = &mut self.votes[validator_index];

            if target_epoch > vote.next_epoch || *vote == VoteTracker::default() {
                vote.next_root = block_root;
                vote.next_epoch = target_epoch;
            }
        }
    }

    fn head(
        &mut self,
        justified_epoch: u64,
        justified_root: B256,
        finalized_epoch: u64,
        justified_state_balances: &[u64],
    ) -> Result<B256, ForkChoiceError> {
        let deltas = compute_deltas(
            &self.proto_array.indices,
            &mut self.votes,
            &self.balances,
            justified_state_balances,
        )?;

        self.proto_array
            .apply_score_changes(deltas, justified_epoch, finalized_epoch)?;

        self.balances = justified_state_balances.to_vec();

        self.proto_array.find_head(&justified_root)
    }

    fn has_node(&self, root: &B256) -> bool {
        self.proto_array.indices.contains_key(root)
    }

    fn prune(&mut self, finalized_root: B256) -> Result<(), ForkChoiceError> {
        self.proto_array.maybe_prune(finalized_root)?;
        self.finalized_root = finalized_root;
        Ok(())
    }

    fn node_count(&self) -> usize {
        self.proto_array.nodes.len()
    }
}

/// Returns a list of `deltas`, where there is one delta for each of the indices in
/// `0..indices.len()`.
///
/// The deltas are formed by a change between `old_balances` and `new_balances`, and/or a change
/// of vote in `votes`.
///
/// ## Errors
///
/// - If a value in `indices` is greater to or equal to `indices.len()`.
/// - If some `B256` in `votes` is not a key in `indices` (except for `B256::ZERO`, this is
///   always valid).
fn compute_deltas(
    indices: &HashMap<B256, usize>,
    votes: &mut [VoteTracker],
    old_balances: &[u64],
    new_balances: &[u64],
) -> Result<Vec<i64>, ForkChoiceError> {
    let mut deltas = vec![0_i64; indices.len()];

    for (validator_index, vote) in votes.iter_mut().enumerate() {
        // There is no need to create a score change if the validator has never voted or both
        // their votes are for the zero hash (alias to the genesis block).
        if vote.current_root == B256::ZERO && vote.next_root == B256::ZERO {
            continue;
        }

        // If the validator was not included in the `old_balances` (i.e. it did not exist yet)
        // then say its balance was zero.
        let old_balance = old_balances.get(validator_index).copied().unwrap_or(0);

        // If the validators vote is not known in the `new_balances` then use a balance of zero.
        //
        // It is possible that there is a vote for an unknown validator if we change our justified
        // state to a new state with a higher epoch that is on a different fork because that fork
        // may have on-boarded less validators than the prior fork.
        let new_balance = new_balances.get(validator_index).copied().unwrap_or(0);

        if vote.current_root != vote.next_root || old_balance != new_balance {
            // We ignore the vote if it is not known in `indices`. We assume that it is outside
            // of our tree (i.e., pre-finalization) and therefore not interesting.
            if let Some(current_delta_index) = indices.get(&vote.current_root).copied() {
                let delta = deltas
                    .get_mut(current_delta_index)
                    .ok_or(ForkChoiceError::InvalidNodeDelta(current_delta_index))?;
                *delta = delta
                    .checked_sub(old_balance as i64)
                    .ok_or(ForkChoiceError::DeltaOverflow(current_delta_index))?;
            }

            // We ignore the vote if it is not known in `indices`. We assume that it is outside
            // of our tree (i.e., pre-finalization) and therefore not interesting.
            if let Some(next_delta_index) = indices.get(&vote.next_root).copied() {
                let delta = deltas
                    .get_mut(next_delta_index)
                    .ok_or(ForkChoiceError::InvalidNodeDelta(next_delta_index))?;
                *delta = delta
                    .checked_add(new_balance as i64)
                    .ok_or(ForkChoiceError::DeltaOverflow(next_delta_index))?;
            }

            vote.current_root = vote.next_root;
        }
    }

    Ok(deltas)
}
