//! Ethereum JSON-RPC gateway binary
//!
//! Serves Ethereum JSON-RPC requests by translating them into calls to a
//! Qtum node. Read-mostly upstream responses are cached briefly.

use anyhow::{Context, Result};
use clap::Parser;
use qtum_eth_gateway::cache::ResponseCache;
use qtum_eth_gateway::config::Config;
use qtum_eth_gateway::proxy::ProxyRegistry;
use qtum_eth_gateway::rpc::{HttpTransport, QtumClient};
use qtum_eth_gateway::server;
use qtum_eth_gateway::shutdown::Shutdown;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();

    // Initialize logging
    let default_level = if config.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    config.validate().context("Invalid configuration")?;

    info!("Starting Qtum Ethereum gateway");
    info!("Qtum RPC: {}", config.redacted_qtum_rpc());
    info!("Cache TTL: {:?}", config.cache_ttl());

    let shutdown = Shutdown::new();
    shutdown.listen_for_signals();

    // Cached entries are flushed as soon as shutdown starts
    let cache = Arc::new(ResponseCache::new(config.cache_ttl()));
    cache.set_shutdown(shutdown.subscribe());

    let transport = Arc::new(HttpTransport::new(&config.qtum_rpc)?);
    let qtum = Arc::new(QtumClient::new(transport, Arc::clone(&cache)));
    let registry = Arc::new(ProxyRegistry::with_default_proxies(qtum));
    info!("Serving methods: {}", registry.methods().join(", "));

    server::serve(config.listen_addr(), registry, shutdown.subscribe()).await?;

    info!("Gateway stopped");
    Ok(())
}
