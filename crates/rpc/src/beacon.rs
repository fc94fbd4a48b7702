use std::{future::Future, sync::Arc};

use ream_beacon_chain::{
    notifications::{BlockEvent, StateEvent},
    service::{BeaconChain, ChainHead},
};
use ream_consensus::beacon_block::SignedBeaconBlock;
use ream_storage::filter::BlockFilter;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
    config::RpcConfig,
    pagination::start_and_end_page,
    status::Status,
    types::{BlockContainer, ListBlocksRequest, ListBlocksResponse, QueryFilter},
};

/// Read-only queries and server-push streams over a running [`BeaconChain`].
#[derive(Clone)]
pub struct BeaconChainServer {
    chain: Arc<BeaconChain>,
    config: RpcConfig,
}

impl BeaconChainServer {
    pub fn new(chain: Arc<BeaconChain>, config: RpcConfig) -> Self {
        Self { chain, config }
    }

    /// Retrieves blocks by root, slot, epoch or the genesis block.
    ///
    /// Matching nothing is not an error: the response is empty with a ``"0"`` page token.
    pub fn list_blocks(&self, request: &ListBlocksRequest) -> Result<ListBlocksResponse, Status> {
        if request.page_size > self.config.max_page_size {
            return Err(Status::invalid_argument(format!(
                "Requested page size {} can not be greater than max size {}",
                request.page_size, self.config.max_page_size
            )));
        }
        let page_size = match request.page_size {
            0 => self.config.default_page_size,
            page_size => page_size,
        };

        let db = self.chain.db();
        match request.query_filter {
            Some(QueryFilter::Epoch(epoch)) => {
                let filter = BlockFilter::new()
                    .set_start_epoch(epoch)
                    .set_end_epoch(epoch);
                let blocks = db
                    .blocks(&filter)
                    .map_err(|err| Status::internal(format!("Failed to get blocks: {err:#}")))?;
                paginate(blocks, &request.page_token, page_size)
            }
            Some(QueryFilter::Slot(slot)) => {
                let filter = BlockFilter::new().set_start_slot(slot).set_end_slot(slot);
                let blocks = db.blocks(&filter).map_err(|err| {
                    Status::internal(format!(
                        "Could not retrieve blocks for slot {slot}: {err:#}"
                    ))
                })?;
                paginate(blocks, &request.page_token, page_size)
            }
            Some(QueryFilter::Root(root)) => {
                let block = db
                    .block(&root)
                    .map_err(|err| Status::internal(format!("Could not retrieve block: {err:#}")))?;
                Ok(match block {
                    Some(block) => ListBlocksResponse {
                        block_containers: vec![container(block)],
                        total_size: 1,
                        next_page_token: String::new(),
                    },
                    None => ListBlocksResponse::empty(),
                })
            }
            Some(QueryFilter::Genesis) => {
                let block = db.genesis_block().map_err(|err| {
                    Status::internal(format!(
                        "Could not retrieve blocks for genesis slot: {err:#}"
                    ))
                })?;
                Ok(match block {
                    Some(block) => ListBlocksResponse {
                        block_containers: vec![container(block)],
                        total_size: 1,
                        next_page_token: "0".to_string(),
                    },
                    None => ListBlocksResponse::empty(),
                })
            }
            None => Err(Status::invalid_argument(
                "Must specify a filter criteria for fetching blocks",
            )),
        }
    }

    pub fn get_chain_head(&self) -> Result<ChainHead, Status> {
        self.chain.chain_head_retrieval().map_err(|err| {
            Status::internal(format!("Could not retrieve chain head: {err}"))
        })
    }

    /// Pushes every block the chain receives into ``sink`` until the stream ends.
    ///
    /// The feed subscription is taken before this returns, so no block received afterwards is
    /// missed. The returned future resolves to the reason the stream ended.
    pub fn stream_blocks(
        &self,
        sink: mpsc::Sender<Arc<SignedBeaconBlock>>,
        connection: CancellationToken,
    ) -> impl Future<Output = Status> + Send + 'static {
        let mut subscription = self.chain.notifier().block_feed().subscribe();
        let shutdown = self.chain.shutdown_token();
        async move {
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => return Status::canceled("Context canceled"),
                    _ = connection.cancelled() => return Status::canceled("Context canceled"),
                    event = subscription.recv() => match event {
                        Some(BlockEvent::ReceivedBlock(block)) => {
                            if let Err(err) = sink.send(block).await {
                                return Status::unavailable(format!(
                                    "Could not send over stream: {err}"
                                ));
                            }
                        }
                        None => {
                            return Status::aborted("Subscriber closed, exiting stream");
                        }
                    },
                }
            }
        }
    }

    /// Pushes a chain head snapshot into ``sink`` each time the chain processes a block.
    pub fn stream_chain_head(
        &self,
        sink: mpsc::Sender<ChainHead>,
        connection: CancellationToken,
    ) -> impl Future<Output = Status> + Send + 'static {
        let mut subscription = self.chain.notifier().state_feed().subscribe();
        let shutdown = self.chain.shutdown_token();
        let chain = self.chain.clone();
        async move {
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => return Status::canceled("Context canceled"),
                    _ = connection.cancelled() => return Status::canceled("Context canceled"),
                    event = subscription.recv() => match event {
                        Some(StateEvent::BlockProcessed { slot, .. }) => {
                            let chain_head = match chain.chain_head_retrieval() {
                                Ok(chain_head) => chain_head,
                                Err(err) => {
                                    return Status::internal(format!(
                                        "Could not retrieve chain head: {err}"
                                    ));
                                }
                            };
                            debug!(
                                slot,
                                head_slot = chain_head.head_slot,
                                "Streaming chain head"
                            );
                            if let Err(err) = sink.send(chain_head).await {
                                return Status::unavailable(format!(
                                    "Could not send over stream: {err}"
                                ));
                            }
                        }
                        Some(_) => {}
                        None => {
                            return Status::aborted("Subscriber closed, exiting stream");
                        }
                    },
                }
            }
        }
    }
}

fn container(block: SignedBeaconBlock) -> BlockContainer {
    BlockContainer {
        block_root: block.block_root(),
        block,
    }
}

fn paginate(
    blocks: Vec<SignedBeaconBlock>,
    page_token: &str,
    page_size: usize,
) -> Result<ListBlocksResponse, Status> {
    if blocks.is_empty() {
        return Ok(ListBlocksResponse::empty());
    }

    let total_size = blocks.len();
    let page = start_and_end_page(page_token, page_size, total_size).map_err(|status| {
        Status::internal(format!("Could not paginate blocks: {}", status.message))
    })?;
    let block_containers = blocks
        .into_iter()
        .skip(page.start)
        .take(page.end - page.start)
        .map(container)
        .collect();

    Ok(ListBlocksResponse {
        block_containers,
        total_size,
        next_page_token: page.next_page_token,
    })
}
