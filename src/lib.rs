//! Qtum Ethereum gateway
//!
//! This library translates Ethereum JSON-RPC requests into calls against a
//! Qtum node, decoding the contract scripts Qtum embeds in transaction
//! outputs and caching read-mostly upstream responses.

pub mod asm;
pub mod cache;
pub mod cli;
pub mod config;
pub mod convert;
pub mod error;

// Gateway modules
pub mod proxy;
pub mod rpc;
pub mod server;
pub mod shutdown;
pub mod transformer;
pub mod types;

// Re-export the main types for convenience
pub use asm::{parse_contract_asm, ContractInvokeInfo, ScriptShape};
pub use cache::{is_cachable, ResponseCache};
pub use error::{AsmError, CacheError, RpcError, RpcResult};
pub use proxy::{EthProxy, ProxyRegistry};
pub use rpc::QtumClient;
