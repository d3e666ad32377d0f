//! Gateway lifecycle signal
//!
//! A single `watch` channel shared by the HTTP server and the response
//! cache. Once triggered it stays triggered.

use tokio::sync::watch;
use tracing::{info, warn};

/// Shutdown signal for the gateway.
pub struct Shutdown {
    tx: watch::Sender<bool>,
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self { tx, rx }
    }

    /// Receiver that observes the signal. Receivers created after the signal
    /// fired see it immediately.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.rx.clone()
    }

    /// Fire the signal. Repeated calls have no further effect.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    /// Spawn a task that fires the signal on SIGINT or SIGTERM.
    pub fn listen_for_signals(&self) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let signal = wait_for_signal().await;
            info!("Received {}, shutting down gracefully...", signal);
            tx.send_replace(true);
        });
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve once the receiver has observed `true`.
///
/// Never resolves if every sender is dropped without firing.
pub async fn wait_for_shutdown(mut rx: watch::Receiver<bool>) {
    if rx.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(err) => {
            warn!("Failed to register SIGTERM handler: {}", err);
            return wait_for_ctrl_c().await;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        name = wait_for_ctrl_c() => name,
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    wait_for_ctrl_c().await
}

async fn wait_for_ctrl_c() -> &'static str {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", err);
        std::future::pending::<()>().await;
    }
    "SIGINT"
}
