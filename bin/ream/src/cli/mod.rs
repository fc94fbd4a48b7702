use clap::{Parser, Subcommand};
use ream_beacon_chain::{
    config::{ChainConfig, DEFAULT_MAX_SKIP_SLOTS},
    notifications::DEFAULT_MAX_EVENTS,
};
use ream_rpc::config::{RpcConfig, DEFAULT_MAX_PAGE_SIZE, DEFAULT_PAGE_SIZE};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the node
    #[command(name = "node")]
    Node(NodeCommand),
}

#[derive(Debug, Parser)]
pub struct NodeCommand {
    /// Verbosity level
    #[arg(short, long, default_value_t = 3)]
    pub verbosity: u8,

    /// Unix time of the interop genesis. Defaults to the time the node starts.
    #[arg(long, env = "REAM_GENESIS_TIME")]
    pub genesis_time: Option<u64>,

    /// Number of deterministic validators in the interop genesis state
    #[arg(long, env = "REAM_INTEROP_VALIDATORS", default_value_t = 64)]
    pub interop_validator_count: u64,

    #[arg(long, env = "REAM_MAX_PAGE_SIZE", default_value_t = DEFAULT_MAX_PAGE_SIZE)]
    pub max_page_size: usize,

    #[arg(long, env = "REAM_DEFAULT_PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE)]
    pub default_page_size: usize,

    /// Events buffered per subscriber before the slowest ones start losing them
    #[arg(long, env = "REAM_SUBSCRIBER_CAPACITY", default_value_t = DEFAULT_MAX_EVENTS)]
    pub subscriber_capacity: usize,

    /// Keep every state even after it falls behind the finalized checkpoint
    #[arg(long, env = "REAM_DISABLE_STATE_PRUNING")]
    pub disable_state_pruning: bool,

    /// Reject blocks that skip more slots than this past their parent
    #[arg(long, env = "REAM_MAX_SKIP_SLOTS", default_value_t = DEFAULT_MAX_SKIP_SLOTS)]
    pub max_skip_slots: u64,
}

impl NodeCommand {
    pub fn chain_config(&self) -> ChainConfig {
        ChainConfig {
            prune_finalized_states: !self.disable_state_pruning,
            max_skip_slots: self.max_skip_slots,
        }
    }

    pub fn rpc_config(&self) -> RpcConfig {
        RpcConfig {
            max_page_size: self.max_page_size,
            default_page_size: self.default_page_size,
        }
    }
}
