//! Ethereum → Qtum request transformers
//!
//! One [`EthProxy`] per supported Ethereum method. Chain status methods live
//! in [`chain`]; transaction and receipt lookups, which decode contract
//! scripts, live in [`transaction`].

pub mod chain;
pub mod transaction;

use crate::error::{RpcError, RpcResult};
use crate::proxy::EthProxy;
use crate::rpc::QtumClient;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Every handler the gateway serves.
pub fn default_proxies(qtum: Arc<QtumClient>) -> Vec<Box<dyn EthProxy>> {
    vec![
        Box::new(chain::BlockNumber::new(Arc::clone(&qtum))),
        Box::new(chain::GasPrice::new(Arc::clone(&qtum))),
        Box::new(chain::Mining::new(Arc::clone(&qtum))),
        Box::new(chain::NetPeerCount::new(Arc::clone(&qtum))),
        Box::new(chain::Syncing::new(Arc::clone(&qtum))),
        Box::new(transaction::GetTransactionByHash::new(Arc::clone(&qtum))),
        Box::new(transaction::GetTransactionReceipt::new(qtum)),
    ]
}

/// Read the first positional param as a transaction hash, without `0x`.
pub(crate) fn tx_hash_param(params: &Value) -> RpcResult<String> {
    let hash = params
        .as_array()
        .and_then(|p| p.first())
        .and_then(Value::as_str)
        .ok_or_else(|| RpcError::InvalidParams("expected [transactionHash]".into()))?;

    let hash = crate::convert::remove_hex_prefix(hash);
    if hash.is_empty() {
        return Err(RpcError::InvalidParams("transaction hash is empty".into()));
    }
    Ok(hash.to_string())
}

pub(crate) fn to_value<T: Serialize>(value: T) -> RpcResult<Value> {
    serde_json::to_value(value).map_err(|err| RpcError::InternalError(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tx_hash_param() {
        assert_eq!(tx_hash_param(&json!(["0xabc"])).unwrap(), "abc");
        assert_eq!(tx_hash_param(&json!(["abc"])).unwrap(), "abc");
        assert!(matches!(tx_hash_param(&json!(["0x"])), Err(RpcError::InvalidParams(_))));
        assert!(matches!(tx_hash_param(&json!([])), Err(RpcError::InvalidParams(_))));
        assert!(matches!(tx_hash_param(&json!([42])), Err(RpcError::InvalidParams(_))));
    }
}
