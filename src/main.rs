use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use rip_router::api::rest::{self, AppState};
use rip_router::config::Config;
use rip_router::daemon::Daemon;
use rip_router::platform::udp::UdpPlatform;
use rip_router::platform::Platform;
use rip_router::router::Router;
use rip_router::routes::TableSnapshot;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.as_str().to_lowercase()))
        .init();
    tracing::info!("ripd starting...");

    // Get hostname
    let hostname = hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string());

    let platform = UdpPlatform::bind(config.router.interfaces.clone(), config.router.port).await?;
    let router = Router::new(config.router.clone(), platform.now());

    let (snapshots, snapshot_rx) = watch::channel(TableSnapshot::capture(&hostname, router.table()));

    if config.api_enabled {
        let state = AppState::new(snapshot_rx);
        let addr = config.api_bind;
        tokio::spawn(async move {
            if let Err(e) = rest::serve(addr, state).await {
                tracing::error!("Status API stopped: {}", e);
            }
        });
    }

    let mut daemon = Daemon::new(router, platform, hostname, snapshots);
    tokio::select! {
        _ = daemon.run() => {}
        result = tokio::signal::ctrl_c() => {
            result?;
            tracing::info!("Shutting down");
        }
    }

    Ok(())
}
