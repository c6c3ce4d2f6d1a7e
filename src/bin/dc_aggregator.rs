use std::sync::Arc;

use netwatch::config::DcAggregatorConfig;
use netwatch::dc::{listener, summary, DcState};
use netwatch::{metrics, telemetry};
use tokio::sync::broadcast;
use tracing::info;

const DC_SUMMARY_INTERVAL_SECONDS: f64 = 10.0;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    telemetry::init();

    let cfg = DcAggregatorConfig::from_env()?;
    info!(
        "starting dc aggregator dc_id={} tcp={}:{} num_racks={}",
        cfg.dc_id, cfg.tcp_listen_host, cfg.tcp_listen_port, cfg.num_racks
    );

    let state = Arc::new(DcState::new(cfg.dc_id));

    let (shutdown_tx, _) = broadcast::channel(1);
    let shutdown_listener = shutdown_tx.subscribe();
    let shutdown_summary = shutdown_tx.subscribe();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutting down");
            let _ = shutdown_tx.send(());
        }
    });

    let metrics_server = metrics::start_web_server(cfg.metrics_port)?;
    let metrics_handle = tokio::spawn(metrics_server);

    let listener_state = Arc::clone(&state);
    let listener_handle = tokio::spawn(listener::run(
        listener_state,
        cfg.tcp_listen_host,
        cfg.tcp_listen_port,
        cfg.num_racks,
        shutdown_listener,
    ));

    summary::run(state, DC_SUMMARY_INTERVAL_SECONDS, shutdown_summary).await;

    metrics_handle.abort();
    listener_handle.await??;
    Ok(())
}
