use std::fmt;

use alloy_primitives::B256;
use ream_fork_choice::error::ForkChoiceError;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckpointKind {
    Finalized,
    Justified,
    PreviousJustified,
}

impl fmt::Display for CheckpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Finalized => "finalized",
            Self::Justified => "justified",
            Self::PreviousJustified => "previous justified",
        })
    }
}

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("beacon chain is not initialized: no {0} persisted")]
    UninitializedChain(&'static str),
    #[error("block {block_root} has unknown parent {parent_root}")]
    OrphanBlock { block_root: B256, parent_root: B256 },
    #[error("invalid {kind} checkpoint epoch {attempted} (current bound: {current})")]
    InvalidCheckpoint {
        kind: CheckpointKind,
        current: u64,
        attempted: u64,
    },
    #[error("block {0} is not known to fork choice")]
    UnknownBlockRoot(B256),
    #[error("block at slot {slot} is not later than finalized slot {finalized_slot}")]
    BlockBeforeFinalized { slot: u64, finalized_slot: u64 },
    #[error("block at slot {slot} skips too far past its parent at slot {parent_slot}")]
    TooManySkippedSlots { slot: u64, parent_slot: u64 },
    #[error("block at slot {slot} is ahead of the current slot {current_slot}")]
    FutureBlock { slot: u64, current_slot: u64 },
    #[error("state transition failed: {0:#}")]
    StateTransition(anyhow::Error),
    #[error("invalid attestation: {0:#}")]
    InvalidAttestation(anyhow::Error),
    #[error("block {0} is missing from storage")]
    MissingBlock(B256),
    #[error("state for block {0} is missing from storage")]
    MissingState(B256),
    #[error("head is not set")]
    HeadUnset,
    #[error("{kind} checkpoint root {root} does not resolve to a stored block")]
    CheckpointUnresolved { kind: CheckpointKind, root: B256 },
    #[error("fork choice: {0}")]
    ForkChoice(ForkChoiceError),
    #[error("storage: {0:#}")]
    Storage(#[from] anyhow::Error),
    #[error("chain start: {0:#}")]
    ChainStart(anyhow::Error),
    #[error("operation cancelled")]
    Cancelled,
}

impl From<ForkChoiceError> for ChainError {
    fn from(error: ForkChoiceError) -> Self {
        match error {
            ForkChoiceError::OrphanBlock {
                block_root,
                parent_root,
            } => Self::OrphanBlock {
                block_root,
                parent_root,
            },
            error => Self::ForkChoice(error),
        }
    }
}

impl ChainError {
    /// Errors raised when an invariant between the head, checkpoints, graph and storage no longer
    /// holds. Callers should stop rather than continue on top of them.
    pub fn is_consistency_fault(&self) -> bool {
        matches!(
            self,
            Self::MissingBlock(_)
                | Self::MissingState(_)
                | Self::HeadUnset
                | Self::CheckpointUnresolved { .. }
                | Self::ForkChoice(_)
                | Self::Storage(_)
        )
    }
}
