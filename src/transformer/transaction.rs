//! Transaction and receipt lookups
//!
//! Qtum transactions are UTXO transactions; contract calls and creates are
//! encoded in an output script. The handlers here decode that script to fill
//! in the Ethereum `from`, `to`, `gas`, `gasPrice` and `input` fields.

use super::{to_value, tx_hash_param};
use crate::asm::{parse_contract_asm, tokenize};
use crate::convert::{
    add_hex_prefix, encode_u256, encode_u64, hex_to_u256, qtum_amount_to_wei, satoshi_to_wei,
};
use crate::error::{RpcResult, UpstreamError};
use crate::proxy::EthProxy;
use crate::rpc::{QtumClient, RPC_INVALID_ADDRESS_OR_KEY};
use crate::types::{EthLog, EthReceipt, EthTransaction, RawTransaction, TransactionReceipt};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Reported as the sender of coinbase/coinstake transactions.
const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Bloom filters are not computed; every receipt reports an empty one.
fn empty_logs_bloom() -> String {
    format!("0x{}", "0".repeat(512))
}

/// `eth_getTransactionByHash`.
pub struct GetTransactionByHash {
    qtum: Arc<QtumClient>,
}

impl GetTransactionByHash {
    pub fn new(qtum: Arc<QtumClient>) -> Self {
        Self { qtum }
    }
}

#[async_trait]
impl EthProxy for GetTransactionByHash {
    fn method(&self) -> &'static str {
        "eth_getTransactionByHash"
    }

    async fn request(&self, params: &Value) -> RpcResult<Value> {
        let txid = tx_hash_param(params)?;
        let Some(tx) = fetch_raw_transaction(&self.qtum, &txid).await? else {
            return Ok(Value::Null);
        };
        let eth_tx = eth_transaction(&self.qtum, &tx).await?;
        to_value(eth_tx)
    }
}

/// `eth_getTransactionReceipt`.
pub struct GetTransactionReceipt {
    qtum: Arc<QtumClient>,
}

impl GetTransactionReceipt {
    pub fn new(qtum: Arc<QtumClient>) -> Self {
        Self { qtum }
    }
}

#[async_trait]
impl EthProxy for GetTransactionReceipt {
    fn method(&self) -> &'static str {
        "eth_getTransactionReceipt"
    }

    async fn request(&self, params: &Value) -> RpcResult<Value> {
        let txid = tx_hash_param(params)?;
        let Some(tx) = fetch_raw_transaction(&self.qtum, &txid).await? else {
            return Ok(Value::Null);
        };
        // Not mined yet
        if tx.block_hash.is_none() {
            return Ok(Value::Null);
        }

        let receipts = self.qtum.get_transaction_receipt(&txid).await?;
        let receipt = match receipts.into_iter().next() {
            Some(receipt) => {
                let decoded = self
                    .qtum
                    .decode_raw_transaction(&tx.hex)
                    .await
                    .with_context(|| format!("Failed to decode transaction {}", txid))?;
                contract_receipt(receipt, decoded.is_contract_creation())
            }
            // Only contract executions have native receipts
            None => plain_receipt(eth_transaction(&self.qtum, &tx).await?),
        };
        to_value(receipt)
    }
}

/// Look up a transaction, mapping "no such transaction" to None.
async fn fetch_raw_transaction(qtum: &QtumClient, txid: &str) -> Result<Option<RawTransaction>> {
    match qtum.get_raw_transaction(txid).await {
        Ok(tx) => Ok(Some(tx)),
        Err(err) if is_not_found(&err) => Ok(None),
        Err(err) => Err(err),
    }
}

fn is_not_found(err: &anyhow::Error) -> bool {
    err.downcast_ref::<UpstreamError>()
        .is_some_and(|e| e.code == RPC_INVALID_ADDRESS_OR_KEY)
}

/// Build the Ethereum view of a Qtum transaction.
///
/// Contract transactions take their fields from the decoded output script.
/// Plain payments report the first paid address as `to`.
pub(crate) async fn eth_transaction(qtum: &QtumClient, tx: &RawTransaction) -> Result<EthTransaction> {
    let (block_hash, block_number, transaction_index) = match &tx.block_hash {
        Some(hash) => {
            let block = qtum.get_block(hash).await?;
            let index = block
                .tx
                .iter()
                .position(|id| id == &tx.txid)
                .with_context(|| format!("Transaction {} is missing from block {}", tx.txid, hash))?;
            (
                Some(add_hex_prefix(hash)),
                Some(encode_u64(block.height)),
                Some(encode_u64(index as u64)),
            )
        }
        None => (None, None, None),
    };

    let mut eth_tx = EthTransaction {
        hash: add_hex_prefix(&tx.txid),
        nonce: encode_u64(0),
        block_hash,
        block_number,
        transaction_index,
        from: String::new(),
        to: None,
        value: encode_u64(0),
        gas_price: encode_u64(0),
        gas: encode_u64(0),
        input: "0x".to_string(),
    };

    if let Some(output) = tx.contract_output() {
        let tokens = tokenize(&output.script_pub_key.asm);
        let info = parse_contract_asm(&tokens).with_context(|| {
            format!("Failed to decode contract script of {} output {}", tx.txid, output.n)
        })?;

        eth_tx.from = if info.from.is_empty() {
            sender_address(qtum, tx).await?
        } else {
            add_hex_prefix(&info.from)
        };
        eth_tx.to = (!info.is_create()).then(|| add_hex_prefix(&info.to));
        eth_tx.gas = add_hex_prefix(&info.gas_limit);
        eth_tx.gas_price = encode_u256(satoshi_to_wei(hex_to_u256(&info.gas_price)?));
        eth_tx.input = add_hex_prefix(&info.call_data);
        eth_tx.value = encode_u256(qtum_amount_to_wei(output.value));
    } else {
        eth_tx.from = sender_address(qtum, tx).await?;
        let paid = tx
            .vout
            .iter()
            .find_map(|out| out.script_pub_key.first_address().map(|addr| (out, addr)));
        if let Some((output, address)) = paid {
            let hex_address = qtum.get_hex_address(address).await?;
            eth_tx.to = Some(add_hex_prefix(&hex_address));
            eth_tx.value = encode_u256(qtum_amount_to_wei(output.value));
        }
    }

    Ok(eth_tx)
}

/// Hex address owning the output spent by the first input.
async fn sender_address(qtum: &QtumClient, tx: &RawTransaction) -> Result<String> {
    if tx.is_coinbase() {
        return Ok(ZERO_ADDRESS.to_string());
    }
    let Some((prev_txid, index)) = tx
        .vin
        .first()
        .and_then(|vin| vin.txid.as_deref().zip(vin.vout))
    else {
        return Ok(ZERO_ADDRESS.to_string());
    };

    let prev = qtum
        .get_raw_transaction(prev_txid)
        .await
        .with_context(|| format!("Failed to look up input {} of {}", prev_txid, tx.txid))?;
    let address = prev
        .vout
        .iter()
        .find(|out| out.n == index)
        .and_then(|out| out.script_pub_key.first_address());

    match address {
        Some(address) => Ok(add_hex_prefix(&qtum.get_hex_address(address).await?)),
        None => Ok(ZERO_ADDRESS.to_string()),
    }
}

fn contract_receipt(receipt: TransactionReceipt, is_create: bool) -> EthReceipt {
    let block_hash = add_hex_prefix(&receipt.block_hash);
    let block_number = encode_u64(receipt.block_number);
    let transaction_hash = add_hex_prefix(&receipt.transaction_hash);
    let transaction_index = encode_u64(receipt.transaction_index);

    let logs = receipt
        .log
        .iter()
        .enumerate()
        .map(|(i, log)| EthLog {
            address: add_hex_prefix(&log.address),
            topics: log.topics.iter().map(|t| add_hex_prefix(t)).collect(),
            data: add_hex_prefix(&log.data),
            block_hash: block_hash.clone(),
            block_number: block_number.clone(),
            transaction_hash: transaction_hash.clone(),
            transaction_index: transaction_index.clone(),
            log_index: encode_u64(i as u64),
            removed: false,
        })
        .collect();

    // Creates report the new contract, calls report the callee
    EthReceipt {
        status: encode_u64(u64::from(receipt.is_success())),
        from: add_hex_prefix(&receipt.from),
        to: (!is_create).then(|| add_hex_prefix(&receipt.to)),
        contract_address: is_create.then(|| add_hex_prefix(&receipt.contract_address)),
        cumulative_gas_used: encode_u64(receipt.cumulative_gas_used),
        gas_used: encode_u64(receipt.gas_used),
        logs,
        logs_bloom: empty_logs_bloom(),
        transaction_hash,
        transaction_index,
        block_hash,
        block_number,
    }
}

/// Receipt for a transaction that executed no contract code.
fn plain_receipt(tx: EthTransaction) -> EthReceipt {
    EthReceipt {
        transaction_hash: tx.hash,
        transaction_index: tx.transaction_index.unwrap_or_else(|| encode_u64(0)),
        block_hash: tx.block_hash.unwrap_or_default(),
        block_number: tx.block_number.unwrap_or_default(),
        from: tx.from,
        to: tx.to,
        cumulative_gas_used: tx.gas.clone(),
        gas_used: tx.gas,
        contract_address: None,
        logs: Vec::new(),
        logs_bloom: empty_logs_bloom(),
        status: encode_u64(1),
    }
}
