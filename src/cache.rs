//! Upstream response cache
//!
//! In-memory cache of raw Qtum RPC results, keyed by method name and the
//! JSON serialization of the call parameters.
//!
//! Strategy:
//! - Only a fixed allow-list of read-mostly methods is ever cached
//! - The first response stored for a key wins until that entry expires
//! - Every entry owns a background task that evicts it after its TTL, or
//!   as soon as the gateway shutdown signal fires

use crate::error::CacheError;
use crate::rpc::methods;
use crate::shutdown::wait_for_shutdown;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::debug;

/// Default lifetime of a cached response.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(15);

/// Methods whose responses may be cached.
pub const CACHABLE_METHODS: &[&str] = &[
    methods::GET_BLOCK,
    methods::GET_HEX_ADDRESS,
    methods::GET_RAW_TRANSACTION,
    methods::GET_TX_OUT,
    methods::DECODE_RAW_TRANSACTION,
];

/// Check if responses for `method` may be cached. Case-sensitive.
pub fn is_cachable(method: &str) -> bool {
    CACHABLE_METHODS.contains(&method)
}

/// Serialized params -> response bytes, for one method.
type Responses = HashMap<String, Vec<u8>>;

/// Method name -> cached responses for that method.
type MethodTable = HashMap<String, Responses>;

/// Cache for upstream RPC responses.
///
/// Built once at startup and shared behind an `Arc`. Stores must happen
/// inside a Tokio runtime since each entry spawns its expiry task.
pub struct ResponseCache {
    methods: Arc<RwLock<MethodTable>>,
    default_ttl: Duration,
    /// Gateway shutdown signal, once attached. Expiry tasks watch this slot
    /// so entries stored before attachment still observe the signal.
    shutdown: watch::Sender<Option<watch::Receiver<bool>>>,
    /// Expiry tasks that have not yet evicted their entry
    pending_evictions: Arc<AtomicUsize>,
}

impl ResponseCache {
    /// Create an empty cache whose entries live for `default_ttl` unless a
    /// store says otherwise.
    pub fn new(default_ttl: Duration) -> Self {
        let (shutdown, _) = watch::channel(None);
        Self {
            methods: Arc::new(RwLock::new(HashMap::new())),
            default_ttl,
            shutdown,
            pending_evictions: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Attach the gateway shutdown signal.
    ///
    /// Only the first call has an effect. Every live entry is evicted as
    /// soon as the signal fires, including entries stored before this call.
    pub fn set_shutdown(&self, signal: watch::Receiver<bool>) {
        let attached = self.shutdown.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(signal);
            true
        });
        if !attached {
            debug!("shutdown signal already attached to response cache");
        }
    }

    /// Store a response with the default TTL.
    pub fn store_response<P>(&self, method: &str, params: &P, payload: Vec<u8>) -> Result<(), CacheError>
    where
        P: Serialize + ?Sized,
    {
        self.store_response_for(method, params, payload, None)
    }

    /// Store a response, expiring after `ttl` (`None` or zero means the
    /// default TTL).
    ///
    /// A no-op for methods outside the allow-list and for keys that already
    /// hold a live entry.
    pub fn store_response_for<P>(
        &self,
        method: &str,
        params: &P,
        payload: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError>
    where
        P: Serialize + ?Sized,
    {
        if !is_cachable(method) {
            debug!(method, "refusing to cache response for non-cachable method");
            return Ok(());
        }
        let key = params_key(method, params)?;
        let runtime = Handle::try_current().map_err(|_| CacheError::NoRuntime)?;

        let installed = {
            let mut methods = self.methods.write();
            let responses = methods.entry(method.to_string()).or_default();
            match responses.entry(key.clone()) {
                Entry::Occupied(_) => false,
                Entry::Vacant(slot) => {
                    slot.insert(payload);
                    true
                }
            }
        };

        if installed {
            let ttl = ttl.filter(|d| !d.is_zero()).unwrap_or(self.default_ttl);
            self.schedule_eviction(&runtime, method.to_string(), key, ttl);
        }
        Ok(())
    }

    /// Look up a cached response.
    ///
    /// Returns `Ok(None)` on a miss.
    pub fn get_response<P>(&self, method: &str, params: &P) -> Result<Option<Vec<u8>>, CacheError>
    where
        P: Serialize + ?Sized,
    {
        let key = params_key(method, params)?;
        let methods = self.methods.read();
        Ok(methods
            .get(method)
            .and_then(|responses| responses.get(&key))
            .cloned())
    }

    /// Number of live entries across all methods.
    pub fn len(&self) -> usize {
        self.methods.read().values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of expiry tasks still waiting to evict their entry.
    #[cfg(test)]
    pub fn pending_evictions(&self) -> usize {
        self.pending_evictions.load(Ordering::SeqCst)
    }

    fn schedule_eviction(&self, runtime: &Handle, method: String, key: String, ttl: Duration) {
        let methods = Arc::clone(&self.methods);
        let pending = Arc::clone(&self.pending_evictions);
        let shutdown = self.shutdown.subscribe();
        pending.fetch_add(1, Ordering::SeqCst);

        runtime.spawn(async move {
            let reason = tokio::select! {
                _ = tokio::time::sleep(ttl) => "timeout",
                _ = wait_for_attached_shutdown(shutdown) => "shutdown",
            };
            debug!(method = %method, reason, "flushing cached response");

            {
                let mut methods = methods.write();
                if let Some(responses) = methods.get_mut(&method) {
                    responses.remove(&key);
                    if responses.is_empty() {
                        methods.remove(&method);
                    }
                }
            }
            pending.fetch_sub(1, Ordering::SeqCst);
        });
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

fn params_key<P>(method: &str, params: &P) -> Result<String, CacheError>
where
    P: Serialize + ?Sized,
{
    serde_json::to_string(params).map_err(|source| CacheError::Serialization {
        method: method.to_string(),
        source,
    })
}

/// Wait for a shutdown signal to be attached, then for it to fire.
async fn wait_for_attached_shutdown(mut slot: watch::Receiver<Option<watch::Receiver<bool>>>) {
    let signal = slot.wait_for(Option::is_some).await.ok().and_then(|s| s.clone());
    match signal {
        Some(rx) => wait_for_shutdown(rx).await,
        None => std::future::pending().await,
    }
}
