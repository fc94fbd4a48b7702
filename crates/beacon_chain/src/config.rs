/// Furthest a block may skip ahead of its parent.
pub const DEFAULT_MAX_SKIP_SLOTS: u64 = 700;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainConfig {
    /// Delete states below the finalized checkpoint whenever finalization advances.
    pub prune_finalized_states: bool,
    /// Blocks more than this many slots past their parent are rejected before any processing.
    pub max_skip_slots: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            prune_finalized_states: true,
            max_skip_slots: DEFAULT_MAX_SKIP_SLOTS,
        }
    }
}
