//! Error types
//!
//! Typed errors for the script decoder, the response cache and the
//! Ethereum-facing RPC layer. Plumbing code uses `anyhow` and converts into
//! [`RpcError`] at the dispatch boundary.

use thiserror::Error;

/// Standard JSON-RPC error codes.
pub mod codes {
    /// Invalid JSON was received
    pub const PARSE_ERROR: i32 = -32700;
    /// The JSON sent is not a valid request object
    pub const INVALID_REQUEST: i32 = -32600;
    /// The method does not exist
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid method parameters
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal JSON-RPC error
    pub const INTERNAL_ERROR: i32 = -32603;
    /// Generic server-side failure (upstream node errors, undecodable data)
    pub const SERVER_ERROR: i32 = -32000;
}

/// A contract invocation script that does not match any known grammar.
///
/// Every variant names the token position (zero-based) and, where relevant,
/// the field that was being read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AsmError {
    #[error("malformed script: empty token stream")]
    Empty,

    #[error("malformed script: {shape} expects {expected} tokens, got {got}")]
    TokenCount {
        shape: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("malformed script: expected {expected} at position {position}, found {found:?}")]
    UnexpectedToken {
        position: usize,
        expected: &'static str,
        found: String,
    },

    #[error("malformed script: {field} at position {position} is not valid hex: {token:?}")]
    InvalidHex {
        field: &'static str,
        position: usize,
        token: String,
    },

    #[error("malformed script: {field} at position {position} has {len} hex digits, not whole bytes")]
    OddLength {
        field: &'static str,
        position: usize,
        len: usize,
    },

    #[error("malformed script: {field} at position {position} must be a 20-byte address, got {len} hex digits")]
    AddressLength {
        field: &'static str,
        position: usize,
        len: usize,
    },
}

/// Response cache failures. None of these should fail a client request.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to serialize params for {method}: {source}")]
    Serialization {
        method: String,
        #[source]
        source: serde_json::Error,
    },

    /// Expiry tasks are spawned on the ambient Tokio runtime.
    #[error("response cache used outside of a tokio runtime")]
    NoRuntime,
}

/// Error object returned by the upstream Qtum node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("qtum rpc error {code}: {message}")]
pub struct UpstreamError {
    pub code: i64,
    pub message: String,
}

/// Errors surfaced to Ethereum JSON-RPC clients.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error(transparent)]
    MalformedScript(#[from] AsmError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl RpcError {
    /// JSON-RPC error code for this error.
    pub fn code(&self) -> i32 {
        match self {
            RpcError::ParseError(_) => codes::PARSE_ERROR,
            RpcError::InvalidRequest(_) => codes::INVALID_REQUEST,
            RpcError::MethodNotFound(_) => codes::METHOD_NOT_FOUND,
            RpcError::InvalidParams(_) => codes::INVALID_PARAMS,
            RpcError::InternalError(_) => codes::INTERNAL_ERROR,
            RpcError::MalformedScript(_) | RpcError::Upstream(_) => codes::SERVER_ERROR,
        }
    }
}

impl From<anyhow::Error> for RpcError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(asm) = err.downcast_ref::<AsmError>() {
            return RpcError::MalformedScript(asm.clone());
        }
        if let Some(upstream) = err.downcast_ref::<UpstreamError>() {
            return RpcError::Upstream(upstream.clone());
        }
        RpcError::InternalError(format!("{:#}", err))
    }
}

/// Result type for Ethereum-facing handlers.
pub type RpcResult<T> = Result<T, RpcError>;
