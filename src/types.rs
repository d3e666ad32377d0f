//! JSON-RPC wire types
//!
//! Type definitions for the Qtum node responses the gateway reads, the
//! Ethereum-shaped responses it returns, and the JSON-RPC envelope.

use crate::asm::{OP_CALL, OP_CREATE};
use crate::error::RpcError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// Qtum node responses

/// Verbose `getrawtransaction` / `decoderawtransaction` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTransaction {
    pub txid: String,

    /// Serialized transaction (absent from `decoderawtransaction`)
    #[serde(default)]
    pub hex: String,

    #[serde(default)]
    pub vin: Vec<Vin>,

    #[serde(default)]
    pub vout: Vec<Vout>,

    /// Containing block, None while the transaction is in the mempool
    #[serde(rename = "blockhash", default)]
    pub block_hash: Option<String>,

    #[serde(default)]
    pub confirmations: u64,
}

impl RawTransaction {
    /// First output carrying a contract call or create script.
    pub fn contract_output(&self) -> Option<&Vout> {
        self.vout
            .iter()
            .find(|out| out.script_pub_key.is_contract_invocation())
    }

    /// Check if any output deploys a contract.
    pub fn is_contract_creation(&self) -> bool {
        self.vout.iter().any(|out| out.script_pub_key.is_create())
    }

    /// Check if this is a coinbase or coinstake reward with no real sender.
    pub fn is_coinbase(&self) -> bool {
        self.vin.first().is_some_and(|vin| vin.coinbase.is_some())
    }
}

/// Transaction input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vin {
    /// Spent transaction id (absent for coinbase inputs)
    #[serde(default)]
    pub txid: Option<String>,

    /// Spent output index (absent for coinbase inputs)
    #[serde(default)]
    pub vout: Option<u32>,

    #[serde(default)]
    pub coinbase: Option<String>,
}

/// Transaction output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vout {
    /// Amount in QTUM
    pub value: f64,

    pub n: u32,

    #[serde(rename = "scriptPubKey")]
    pub script_pub_key: ScriptPubKey,
}

/// Output script with its disassembly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptPubKey {
    pub asm: String,

    #[serde(default)]
    pub hex: String,

    #[serde(rename = "type", default)]
    pub kind: String,

    /// Legacy node versions report a list
    #[serde(default)]
    pub addresses: Vec<String>,

    #[serde(default)]
    pub address: Option<String>,
}

impl ScriptPubKey {
    fn last_opcode(&self) -> Option<&str> {
        self.asm.split_whitespace().last()
    }

    /// Check if the script calls or creates a contract.
    pub fn is_contract_invocation(&self) -> bool {
        matches!(self.last_opcode(), Some(OP_CALL) | Some(OP_CREATE))
    }

    pub fn is_create(&self) -> bool {
        self.last_opcode() == Some(OP_CREATE)
    }

    /// Base58 address paid by this output, if any.
    pub fn first_address(&self) -> Option<&str> {
        self.address
            .as_deref()
            .or_else(|| self.addresses.first().map(String::as_str))
    }
}

/// `getblock` result (verbosity 1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub hash: String,

    pub height: u64,

    #[serde(default)]
    pub time: u64,

    /// Transaction ids in block order
    #[serde(default)]
    pub tx: Vec<String>,
}

/// One entry of the `gettransactionreceipt` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub block_hash: String,
    pub block_number: u64,
    pub transaction_hash: String,
    pub transaction_index: u64,
    pub from: String,
    pub to: String,
    pub cumulative_gas_used: u64,
    pub gas_used: u64,
    pub contract_address: String,
    /// "None" when execution succeeded, otherwise the exception name
    pub excepted: String,
    #[serde(default)]
    pub log: Vec<ReceiptLog>,
}

impl TransactionReceipt {
    pub fn is_success(&self) -> bool {
        self.excepted == "None"
    }
}

/// Event log in a Qtum receipt. All fields are hex without prefix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptLog {
    pub address: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub data: String,
}

/// `getstakinginfo` result (subset).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakingInfo {
    #[serde(default)]
    pub enabled: bool,
    pub staking: bool,
}

/// `getblockchaininfo` result (subset).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockchainInfo {
    pub chain: String,
    pub blocks: u64,
    pub headers: u64,
    #[serde(rename = "initialblockdownload", default)]
    pub initial_block_download: bool,
}

impl BlockchainInfo {
    /// Still catching up with the best known header. The initial block
    /// download flag alone does not count.
    pub fn is_syncing(&self) -> bool {
        self.blocks < self.headers
    }
}

/// `getdgpinfo` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DgpInfo {
    #[serde(rename = "maxblocksize")]
    pub max_block_size: u64,

    /// Minimum gas price in satoshi
    #[serde(rename = "mingasprice")]
    pub min_gas_price: u64,

    #[serde(rename = "blockgaslimit")]
    pub block_gas_limit: u64,
}

// Ethereum responses

/// `eth_getTransactionByHash` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EthTransaction {
    pub hash: String,
    pub nonce: String,
    pub block_hash: Option<String>,
    pub block_number: Option<String>,
    pub transaction_index: Option<String>,
    pub from: String,
    /// None for contract creation
    pub to: Option<String>,
    pub value: String,
    pub gas_price: String,
    pub gas: String,
    pub input: String,
}

/// `eth_getTransactionReceipt` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EthReceipt {
    pub transaction_hash: String,
    pub transaction_index: String,
    pub block_hash: String,
    pub block_number: String,
    pub from: String,
    pub to: Option<String>,
    pub cumulative_gas_used: String,
    pub gas_used: String,
    pub contract_address: Option<String>,
    pub logs: Vec<EthLog>,
    pub logs_bloom: String,
    pub status: String,
}

/// Log entry inside an [`EthReceipt`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EthLog {
    pub address: String,
    pub topics: Vec<String>,
    pub data: String,
    pub block_hash: String,
    pub block_number: String,
    pub transaction_hash: String,
    pub transaction_index: String,
    pub log_index: String,
    pub removed: bool,
}

/// `eth_syncing` result: `false`, or the progress object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SyncStatus {
    NotSyncing(bool),
    Syncing(SyncProgress),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncProgress {
    pub starting_block: String,
    pub current_block: String,
    pub highest_block: String,
}

// JSON-RPC envelope

/// Incoming JSON-RPC request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub id: Value,
}

/// Outgoing JSON-RPC response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcErrorObject>,
    pub id: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i32,
    pub message: String,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn failure(id: Value, err: &RpcError) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            result: None,
            error: Some(JsonRpcErrorObject {
                code: err.code(),
                message: err.to_string(),
            }),
            id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_transaction() -> RawTransaction {
        serde_json::from_value(json!({
            "txid": "d20c5c31536e60decf175caf2cbfba980c3678c0f4b201c9b9fa1440102e6451",
            "hash": "d20c5c31536e60decf175caf2cbfba980c3678c0f4b201c9b9fa1440102e6451",
            "version": 2,
            "hex": "0200",
            "vin": [{ "txid": "aa", "vout": 1, "scriptSig": { "asm": "", "hex": "" } }],
            "vout": [
                {
                    "value": 0,
                    "n": 0,
                    "scriptPubKey": {
                        "asm": "4 90d003 28 095ea7b3 54fefdb5b31164f66ddb68becd7bdd864cacd65b OP_CALL",
                        "type": "call"
                    }
                },
                {
                    "value": 1.5,
                    "n": 1,
                    "scriptPubKey": {
                        "asm": "OP_DUP OP_HASH160 dfa6 OP_EQUALVERIFY OP_CHECKSIG",
                        "type": "pubkeyhash",
                        "addresses": ["qUbxboqjBRp96j3La8D1RYkyqx5uQbJPoW"]
                    }
                }
            ],
            "blockhash": "bb",
            "confirmations": 3
        }))
        .unwrap()
    }

    #[test]
    fn test_raw_transaction_outputs() {
        let tx = raw_transaction();
        assert_eq!(tx.contract_output().map(|o| o.n), Some(0));
        assert!(!tx.is_contract_creation());
        assert!(!tx.is_coinbase());
        assert_eq!(
            tx.vout[1].script_pub_key.first_address(),
            Some("qUbxboqjBRp96j3La8D1RYkyqx5uQbJPoW")
        );
        assert_eq!(tx.vout[0].script_pub_key.first_address(), None);
    }

    #[test]
    fn test_receipt_deserialization() {
        let receipt: TransactionReceipt = serde_json::from_value(json!({
            "blockHash": "bb",
            "blockNumber": 4000,
            "transactionHash": "cc",
            "transactionIndex": 2,
            "outputIndex": 0,
            "from": "7926223070547d2d15b2ef5e7383e541c338ffe9",
            "to": "54fefdb5b31164f66ddb68becd7bdd864cacd65b",
            "cumulativeGasUsed": 36562,
            "gasUsed": 36562,
            "contractAddress": "54fefdb5b31164f66ddb68becd7bdd864cacd65b",
            "excepted": "None",
            "log": [{ "address": "54fe", "topics": ["8c5b"], "data": "00" }]
        }))
        .unwrap();
        assert!(receipt.is_success());
        assert_eq!(receipt.log.len(), 1);
    }

    #[test]
    fn test_sync_status_serialization() {
        assert_eq!(serde_json::to_value(SyncStatus::NotSyncing(false)).unwrap(), json!(false));
        let syncing = SyncStatus::Syncing(SyncProgress {
            starting_block: "0x0".into(),
            current_block: "0x10".into(),
            highest_block: "0x20".into(),
        });
        assert_eq!(
            serde_json::to_value(syncing).unwrap(),
            json!({ "startingBlock": "0x0", "currentBlock": "0x10", "highestBlock": "0x20" })
        );
    }

    #[test]
    fn test_response_envelope() {
        let ok = serde_json::to_value(JsonRpcResponse::success(json!(1), json!("0x1"))).unwrap();
        assert_eq!(ok, json!({ "jsonrpc": "2.0", "result": "0x1", "id": 1 }));

        let err = RpcError::MethodNotFound("eth_foo".into());
        let failed = serde_json::to_value(JsonRpcResponse::failure(json!(2), &err)).unwrap();
        assert_eq!(failed["error"]["code"], json!(-32601));
        assert!(failed.get("result").is_none());
    }
}
