//! Chain status methods
//!
//! `eth_blockNumber`, `eth_gasPrice`, `eth_mining`, `eth_syncing` and
//! `net_peerCount`. None of these take params.

use super::to_value;
use crate::convert::{encode_u256, encode_u64, satoshi_to_wei};
use crate::error::RpcResult;
use crate::proxy::EthProxy;
use crate::rpc::QtumClient;
use crate::types::{SyncProgress, SyncStatus};
use alloy_primitives::U256;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// `eth_blockNumber` from `getblockcount`.
pub struct BlockNumber {
    qtum: Arc<QtumClient>,
}

impl BlockNumber {
    pub fn new(qtum: Arc<QtumClient>) -> Self {
        Self { qtum }
    }
}

#[async_trait]
impl EthProxy for BlockNumber {
    fn method(&self) -> &'static str {
        "eth_blockNumber"
    }

    async fn request(&self, _params: &Value) -> RpcResult<Value> {
        let height = self.qtum.get_block_count().await?;
        Ok(Value::String(encode_u64(height)))
    }
}

/// `eth_gasPrice` from the governance minimum gas price.
pub struct GasPrice {
    qtum: Arc<QtumClient>,
}

impl GasPrice {
    pub fn new(qtum: Arc<QtumClient>) -> Self {
        Self { qtum }
    }
}

#[async_trait]
impl EthProxy for GasPrice {
    fn method(&self) -> &'static str {
        "eth_gasPrice"
    }

    async fn request(&self, _params: &Value) -> RpcResult<Value> {
        let dgp = self.qtum.get_dgp_info().await?;
        let wei = satoshi_to_wei(U256::from(dgp.min_gas_price));
        Ok(Value::String(encode_u256(wei)))
    }
}

/// `eth_mining`: whether the node is staking.
pub struct Mining {
    qtum: Arc<QtumClient>,
}

impl Mining {
    pub fn new(qtum: Arc<QtumClient>) -> Self {
        Self { qtum }
    }
}

#[async_trait]
impl EthProxy for Mining {
    fn method(&self) -> &'static str {
        "eth_mining"
    }

    async fn request(&self, _params: &Value) -> RpcResult<Value> {
        let info = self.qtum.get_staking_info().await?;
        Ok(Value::Bool(info.staking))
    }
}

/// `net_peerCount` from `getpeerinfo`.
pub struct NetPeerCount {
    qtum: Arc<QtumClient>,
}

impl NetPeerCount {
    pub fn new(qtum: Arc<QtumClient>) -> Self {
        Self { qtum }
    }
}

#[async_trait]
impl EthProxy for NetPeerCount {
    fn method(&self) -> &'static str {
        "net_peerCount"
    }

    async fn request(&self, _params: &Value) -> RpcResult<Value> {
        let peers = self.qtum.get_peer_info().await?;
        Ok(Value::String(encode_u64(peers.len() as u64)))
    }
}

/// `eth_syncing` from `getblockchaininfo`.
pub struct Syncing {
    qtum: Arc<QtumClient>,
}

impl Syncing {
    pub fn new(qtum: Arc<QtumClient>) -> Self {
        Self { qtum }
    }
}

#[async_trait]
impl EthProxy for Syncing {
    fn method(&self) -> &'static str {
        "eth_syncing"
    }

    async fn request(&self, _params: &Value) -> RpcResult<Value> {
        let info = self.qtum.get_blockchain_info().await?;
        let status = if info.is_syncing() {
            // The node does not report where the current sync started
            SyncStatus::Syncing(SyncProgress {
                starting_block: encode_u64(0),
                current_block: encode_u64(info.blocks),
                highest_block: encode_u64(info.headers),
            })
        } else {
            SyncStatus::NotSyncing(false)
        };
        to_value(status)
    }
}
