//! Ethereum method dispatch
//!
//! Each supported Ethereum method is an [`EthProxy`] that translates the call
//! into Qtum RPC calls. The [`ProxyRegistry`] routes incoming requests by
//! method name.

use crate::error::{RpcError, RpcResult};
use crate::rpc::QtumClient;
use crate::transformer;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Handler for one Ethereum JSON-RPC method.
#[async_trait]
pub trait EthProxy: Send + Sync {
    /// Ethereum method name, e.g. `eth_blockNumber`.
    fn method(&self) -> &'static str;

    /// Handle a request. `params` is the raw JSON-RPC params value.
    async fn request(&self, params: &Value) -> RpcResult<Value>;
}

/// Routes method names to their handlers.
#[derive(Default)]
pub struct ProxyRegistry {
    proxies: HashMap<&'static str, Box<dyn EthProxy>>,
}

impl ProxyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every handler the gateway implements.
    pub fn with_default_proxies(qtum: Arc<QtumClient>) -> Self {
        let mut registry = Self::new();
        for proxy in transformer::default_proxies(qtum) {
            registry.register(proxy);
        }
        registry
    }

    /// Add a handler, replacing any previous handler for the same method.
    pub fn register(&mut self, proxy: Box<dyn EthProxy>) {
        self.proxies.insert(proxy.method(), proxy);
    }

    /// Sorted list of supported methods.
    pub fn methods(&self) -> Vec<&'static str> {
        let mut methods: Vec<_> = self.proxies.keys().copied().collect();
        methods.sort_unstable();
        methods
    }

    /// Dispatch one request.
    pub async fn dispatch(&self, method: &str, params: &Value) -> RpcResult<Value> {
        let proxy = self
            .proxies
            .get(method)
            .ok_or_else(|| RpcError::MethodNotFound(method.to_string()))?;

        info!(method, "RPC request received");
        let result = proxy.request(params).await;
        if let Err(err) = &result {
            debug!(method, "RPC request failed: {}", err);
        }
        result
    }
}
