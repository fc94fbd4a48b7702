use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use alloy_primitives::B256;
use clap::Parser;
use ream::cli::{Cli, Commands, NodeCommand};
use ream_beacon_chain::{
    notifications::Notifier,
    service::{BeaconChain, ChainStartData},
};
use ream_consensus::interop::interop_genesis_state;
use ream_executor::ReamExecutor;
use ream_fork_choice::proto_array::ProtoArrayForkChoice;
use ream_rpc::{
    beacon::BeaconChainServer,
    types::{ListBlocksRequest, QueryFilter},
};
use ream_slasher::service::DetectionService;
use ream_storage::in_memory::InMemoryDB;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Set the default log level to `info` if not set
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Node(cmd) => run_node(cmd),
    }
}

fn run_node(cmd: NodeCommand) -> anyhow::Result<()> {
    info!("Starting node");
    let executor = ReamExecutor::new()?;

    let chain = Arc::new(BeaconChain::new(
        Arc::new(InMemoryDB::new()),
        Box::new(ProtoArrayForkChoice::new(0, 0, B256::ZERO)),
        Arc::new(Notifier::new(cmd.subscriber_capacity)),
        cmd.chain_config(),
    ));
    let server = BeaconChainServer::new(chain.clone(), cmd.rpc_config());

    let slasher = Arc::new(DetectionService::new(chain.clone()));
    executor.spawn_cancellable(move |shutdown| async move { slasher.run(shutdown).await });

    // Log every head change through the same stream a remote client would use
    let (head_sender, mut head_receiver) = mpsc::channel(16);
    let head_stream = server.stream_chain_head(head_sender, executor.shutdown_token());
    executor.spawn(async move {
        let status = head_stream.await;
        info!(%status, "Chain head stream ended");
    });
    executor.spawn(async move {
        while let Some(head) = head_receiver.recv().await {
            info!(
                head_slot = head.head_slot,
                head_root = %head.head_block_root,
                finalized_epoch = head.finalized_epoch,
                justified_epoch = head.justified_epoch,
                "New chain head"
            );
        }
    });

    let genesis_time = match cmd.genesis_time {
        Some(genesis_time) => genesis_time,
        None => SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs(),
    };
    let validator_count = cmd.interop_validator_count;
    let chain_start = async move {
        let genesis_state = interop_genesis_state(genesis_time, validator_count)?;
        Ok(ChainStartData {
            genesis_time,
            eth1_data: genesis_state.eth1_data.clone(),
            genesis_state,
        })
    };

    let result = executor.block_on(async {
        tokio::select! {
            result = chain.start(chain_start) => result?,
            _ = tokio::signal::ctrl_c() => return Ok(()),
        }
        if let Ok(genesis) = server.list_blocks(&ListBlocksRequest::new(QueryFilter::Genesis)) {
            info!(blocks = genesis.total_size, head_slot = chain.head_slot(), "Node is ready");
        }
        tokio::signal::ctrl_c().await?;
        info!("Received shutdown signal");
        anyhow::Ok(())
    });
    if let Err(err) = &result {
        error!("Node stopped with error: {err:#}");
    }

    chain.stop();
    executor.shutdown();
    result
}
