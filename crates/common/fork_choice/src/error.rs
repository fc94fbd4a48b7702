use alloy_primitives::B256;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ForkChoiceError {
    #[error("block {block_root} has unknown parent {parent_root}")]
    OrphanBlock { block_root: B256, parent_root: B256 },
    #[error("justified node {0} is unknown")]
    JustifiedNodeUnknown(B256),
    #[error("finalized node {0} is unknown")]
    FinalizedNodeUnknown(B256),
    #[error("node index {0} is out of bounds")]
    InvalidNodeIndex(usize),
    #[error("node delta index {0} is out of bounds")]
    InvalidNodeDelta(usize),
    #[error("delta overflow at node index {0}")]
    DeltaOverflow(usize),
    #[error("index overflow while pruning {0}")]
    IndexOverflow(&'static str),
    #[error("deltas length {deltas} does not match indices length {indices}")]
    InvalidDeltaLen { deltas: usize, indices: usize },
    #[error(
        "best node {best_root} from {start_root} is not viable for head \
         (store justified epoch: {justified_epoch}, store finalized epoch: {finalized_epoch}, \
         node justified epoch: {node_justified_epoch}, node finalized epoch: {node_finalized_epoch})"
    )]
    InvalidBestNode {
        start_root: B256,
        best_root: B256,
        justified_epoch: u64,
        finalized_epoch: u64,
        node_justified_epoch: u64,
        node_finalized_epoch: u64,
    },
}
