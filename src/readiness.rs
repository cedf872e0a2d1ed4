use std::sync::atomic::{AtomicBool, Ordering};

/// Whether the gateway should receive traffic.
///
/// Flipped off when shutdown begins so load balancers stop routing to us
/// while in-flight requests drain.
pub struct Readiness {
    pub serving: AtomicBool,
}

impl Readiness {
    pub fn new() -> Self {
        Self {
            serving: AtomicBool::new(true),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.serving.load(Ordering::Relaxed)
    }

    pub fn begin_shutdown(&self) {
        self.serving.store(false, Ordering::Relaxed);
    }
}

impl Default for Readiness {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves `grace` after SIGINT or SIGTERM, marking the gateway not ready
/// as soon as the signal arrives.
pub async fn shutdown_signal(ready: std::sync::Arc<Readiness>, grace: std::time::Duration) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "installing ctrl-c handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "installing SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!(grace_ms = grace.as_millis() as u64, "shutdown signal received");
    ready.begin_shutdown();
    // keep accepting for a moment so /readyz can report 503
    tokio::time::sleep(grace).await;
}
