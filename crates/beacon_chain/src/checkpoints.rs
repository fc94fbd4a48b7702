use ream_consensus::checkpoint::Checkpoint;

use crate::error::{ChainError, CheckpointKind};

/// The finalized, justified and previous justified checkpoints.
///
/// Both `previous_justified.epoch <= justified.epoch` and `finalized.epoch <= justified.epoch`
/// hold after every successful update. A rejected update leaves the store unchanged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CheckpointStore {
    finalized: Checkpoint,
    justified: Checkpoint,
    previous_justified: Checkpoint,
}

impl CheckpointStore {
    pub fn genesis(genesis_checkpoint: Checkpoint) -> Self {
        Self {
            finalized: genesis_checkpoint,
            justified: genesis_checkpoint,
            previous_justified: genesis_checkpoint,
        }
    }

    pub fn from_parts(
        finalized: Checkpoint,
        justified: Checkpoint,
        previous_justified: Checkpoint,
    ) -> Result<Self, ChainError> {
        if finalized.epoch > justified.epoch {
            return Err(ChainError::InvalidCheckpoint {
                kind: CheckpointKind::Finalized,
                current: justified.epoch,
                attempted: finalized.epoch,
            });
        }
        if previous_justified.epoch > justified.epoch {
            return Err(ChainError::InvalidCheckpoint {
                kind: CheckpointKind::PreviousJustified,
                current: justified.epoch,
                attempted: previous_justified.epoch,
            });
        }
        Ok(Self {
            finalized,
            justified,
            previous_justified,
        })
    }

    pub fn finalized(&self) -> Checkpoint {
        self.finalized
    }

    pub fn justified(&self) -> Checkpoint {
        self.justified
    }

    pub fn previous_justified(&self) -> Checkpoint {
        self.previous_justified
    }

    /// Finalization never regresses and never overtakes justification.
    pub fn set_finalized(&mut self, checkpoint: Checkpoint) -> Result<(), ChainError> {
        if checkpoint.epoch < self.finalized.epoch {
            return Err(ChainError::InvalidCheckpoint {
                kind: CheckpointKind::Finalized,
                current: self.finalized.epoch,
                attempted: checkpoint.epoch,
            });
        }
        if checkpoint.epoch > self.justified.epoch {
            return Err(ChainError::InvalidCheckpoint {
                kind: CheckpointKind::Finalized,
                current: self.justified.epoch,
                attempted: checkpoint.epoch,
            });
        }
        self.finalized = checkpoint;
        Ok(())
    }

    pub fn set_justified(&mut self, checkpoint: Checkpoint) -> Result<(), ChainError> {
        if checkpoint.epoch < self.justified.epoch {
            return Err(ChainError::InvalidCheckpoint {
                kind: CheckpointKind::Justified,
                current: self.justified.epoch,
                attempted: checkpoint.epoch,
            });
        }
        self.justified = checkpoint;
        Ok(())
    }

    pub fn set_previous_justified(&mut self, checkpoint: Checkpoint) -> Result<(), ChainError> {
        if checkpoint.epoch > self.justified.epoch {
            return Err(ChainError::InvalidCheckpoint {
                kind: CheckpointKind::PreviousJustified,
                current: self.justified.epoch,
                attempted: checkpoint.epoch,
            });
        }
        self.previous_justified = checkpoint;
        Ok(())
    }

    /// Installs a newly justified checkpoint, demoting the current one to previous justified.
    /// Returns whether anything changed.
    pub fn update_justified(&mut self, checkpoint: Checkpoint) -> Result<bool, ChainError> {
        if checkpoint == self.justified {
            return Ok(false);
        }
        if checkpoint.epoch <= self.justified.epoch {
            return Err(ChainError::InvalidCheckpoint {
                kind: CheckpointKind::Justified,
                current: self.justified.epoch,
                attempted: checkpoint.epoch,
            });
        }
        self.previous_justified = self.justified;
        self.justified = checkpoint;
        Ok(true)
    }
}
