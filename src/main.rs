use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use staywindow::observability;
use staywindow::store::PropertyStore;
use staywindow::wire;

const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Server settings, read from `STAYWINDOW_*` environment variables.
struct Settings {
    bind: String,
    port: u16,
    config_dir: PathBuf,
    max_connections: usize,
    metrics_port: Option<u16>,
}

impl Settings {
    fn from_env() -> Self {
        fn var<T: std::str::FromStr>(name: &str) -> Option<T> {
            std::env::var(name).ok().and_then(|s| s.parse().ok())
        }
        Self {
            bind: var("STAYWINDOW_BIND").unwrap_or_else(|| "0.0.0.0".into()),
            port: var("STAYWINDOW_PORT").unwrap_or(5480),
            config_dir: var("STAYWINDOW_CONFIG_DIR").unwrap_or_else(|| PathBuf::from("./rules")),
            max_connections: var("STAYWINDOW_MAX_CONNECTIONS").unwrap_or(256),
            metrics_port: var("STAYWINDOW_METRICS_PORT"),
        }
    }
}

/// Number of `*.json` rule sets in the config dir, or `None` if it can't be read.
fn count_rule_sets(dir: &Path) -> Option<usize> {
    let entries = std::fs::read_dir(dir).ok()?;
    Some(
        entries
            .filter_map(Result::ok)
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
            .count(),
    )
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                warn!("SIGTERM handler unavailable: {e}");
                ctrl_c.await.ok();
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let settings = Settings::from_env();
    observability::init(settings.metrics_port)?;

    match count_rule_sets(&settings.config_dir) {
        Some(n) => info!("{n} rule sets available in {}", settings.config_dir.display()),
        None => warn!(
            "config dir {} is not readable; stored rule sets will not resolve",
            settings.config_dir.display()
        ),
    }

    let store = Arc::new(PropertyStore::new(settings.config_dir.clone()));
    let slots = Arc::new(Semaphore::new(settings.max_connections));

    let listener = TcpListener::bind((settings.bind.as_str(), settings.port)).await?;
    info!(
        addr = %listener.local_addr()?,
        max_connections = settings.max_connections,
        metrics_port = ?settings.metrics_port,
        "staywindow listening"
    );

    let mut connections = JoinSet::new();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (socket, peer) = match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        error!("accept error: {e}");
                        continue;
                    }
                };
                let Ok(slot) = slots.clone().try_acquire_owned() else {
                    warn!("connection limit reached, rejecting {peer}");
                    metrics::counter!(observability::CONNECTIONS_REJECTED_TOTAL).increment(1);
                    continue;
                };

                metrics::counter!(observability::CONNECTIONS_TOTAL).increment(1);
                metrics::gauge!(observability::CONNECTIONS_ACTIVE).increment(1.0);
                let store = store.clone();
                connections.spawn(async move {
                    let _slot = slot;
                    if let Err(e) = wire::process_connection(socket, store).await {
                        error!("connection error from {peer}: {e}");
                    }
                    metrics::gauge!(observability::CONNECTIONS_ACTIVE).decrement(1.0);
                });
            }
            Some(finished) = connections.join_next(), if !connections.is_empty() => {
                if let Err(e) = finished {
                    error!("connection task failed: {e}");
                }
            }
            _ = &mut shutdown => {
                info!("shutdown signal received, stopping accept loop");
                break;
            }
        }
    }

    drop(listener);
    info!(open = connections.len(), "draining connections");
    let drained = tokio::time::timeout(DRAIN_TIMEOUT, async {
        while connections.join_next().await.is_some() {}
    })
    .await;
    if drained.is_err() {
        warn!("drain timeout, aborting {} connections", connections.len());
        connections.shutdown().await;
    }

    info!("staywindow stopped");
    Ok(())
}
