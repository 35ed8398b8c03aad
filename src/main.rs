// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Result};
use std::{env, sync::Arc};
use supportchat_rag::{
    api::{start_server, DashboardState},
    app::App,
    config::{AppConfig, StoreBackend},
    monitoring::{MetricSource, MetricsPoller, PprofHeapSource, ProcessMemorySource},
};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    println!("🚀 Starting support-chat dashboard...\n");

    let config = AppConfig::from_env();
    config.validate().map_err(|e| anyhow!(e))?;
    let bind_address = config.server.bind_address.clone();
    let poller_settings = config.poller.clone();

    let app = App::bootstrap(config).await?;
    match app.store.is_ready().await {
        Ok(true) => info!("Store is ready"),
        Ok(false) => warn!("Store reports not ready, dashboard will show degraded health"),
        Err(e) => warn!("Store readiness check failed: {}", e),
    }

    // The memory backend lives in this process; a Weaviate server is sampled
    // through its pprof endpoint.
    let source: Arc<dyn MetricSource> = match app.config.store.backend {
        StoreBackend::Memory => Arc::new(ProcessMemorySource::new()?),
        StoreBackend::Weaviate => Arc::new(PprofHeapSource::new(
            poller_settings.pprof_url.as_str(),
            poller_settings.pprof_timeout,
        )),
    };
    let poller = Arc::new(MetricsPoller::new(source, &poller_settings));

    let shutdown = CancellationToken::new();
    let poller_handle = poller.clone().spawn(shutdown.child_token());

    let state = DashboardState::new(
        app.store.clone(),
        app.collection(),
        Arc::new(app.search_service()),
    )
    .with_memory_poller(poller);
    if let Some(report) = app.seed_report.clone() {
        state.set_ingest_report(report).await;
    }

    let mut server = tokio::spawn({
        let token = shutdown.clone();
        async move { start_server(state, &bind_address, token).await }
    });

    println!("✅ Dashboard ready. Press Ctrl+C to stop.");
    let served = tokio::select! {
        _ = signal::ctrl_c() => {
            println!("\n🛑 Shutting down...");
            shutdown.cancel();
            server.await
        }
        result = &mut server => result,
    };
    shutdown.cancel();

    if let Err(e) = poller_handle.await {
        warn!("Poller task ended abnormally: {}", e);
    }
    served??;
    if let Err(e) = app.store.close().await {
        warn!("Error closing store: {}", e);
    }
    Ok(())
}
