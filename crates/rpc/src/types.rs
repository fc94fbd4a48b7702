use alloy_primitives::B256;
use ream_consensus::beacon_block::SignedBeaconBlock;
use serde::{Deserialize, Serialize};

/// Exactly one criterion selects the blocks of a [`ListBlocksRequest`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryFilter {
    Epoch(u64),
    Root(B256),
    Slot(u64),
    Genesis,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListBlocksRequest {
    pub query_filter: Option<QueryFilter>,
    /// Zero selects the configured default page size.
    pub page_size: usize,
    pub page_token: String,
}

impl ListBlocksRequest {
    pub fn new(query_filter: QueryFilter) -> Self {
        Self {
            query_filter: Some(query_filter),
            ..Self::default()
        }
    }

    pub fn with_page(mut self, page_size: usize, page_token: impl Into<String>) -> Self {
        self.page_size = page_size;
        self.page_token = page_token.into();
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockContainer {
    pub block: SignedBeaconBlock,
    pub block_root: B256,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ListBlocksResponse {
    pub block_containers: Vec<BlockContainer>,
    pub total_size: usize,
    pub next_page_token: String,
}

impl ListBlocksResponse {
    pub fn empty() -> Self {
        Self {
            block_containers: vec![],
            total_size: 0,
            next_page_token: "0".to_string(),
        }
    }
}
