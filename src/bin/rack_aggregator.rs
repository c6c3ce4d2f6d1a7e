use std::sync::Arc;

use netwatch::config::RackAggregatorConfig;
use netwatch::rack::reporter::Reporter;
use netwatch::rack::{ingress, summarizer, RackState};
use netwatch::{metrics, telemetry};
use tokio::sync::broadcast;
use tracing::info;

const SUMMARY_INTERVAL_SECONDS: f64 = 5.0;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    telemetry::init();

    let cfg = RackAggregatorConfig::from_env()?;
    info!(
        "starting rack aggregator rack_id={} udp={}:{} -> dc {}:{}",
        cfg.rack_id, cfg.udp_listen_host, cfg.udp_listen_port, cfg.dc_controller_host, cfg.dc_controller_port
    );

    let state = Arc::new(RackState::new(cfg.rack_id));

    let (shutdown_tx, _) = broadcast::channel(1);
    let shutdown_ingress = shutdown_tx.subscribe();
    let shutdown_summarizer = shutdown_tx.subscribe();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutting down");
            let _ = shutdown_tx.send(());
        }
    });

    let metrics_server = metrics::start_web_server(cfg.metrics_port)?;
    let metrics_handle = tokio::spawn(metrics_server);

    let ingress_state = Arc::clone(&state);
    let udp_host = cfg.udp_listen_host;
    let udp_port = cfg.udp_listen_port;
    let ingress_handle = std::thread::Builder::new()
        .name("ingress".to_string())
        .spawn(move || ingress::run(ingress_state, udp_host, udp_port, shutdown_ingress))?;

    let reporter = Reporter::new(cfg.dc_controller_host.clone(), cfg.dc_controller_port);
    summarizer::run(state, reporter, SUMMARY_INTERVAL_SECONDS, shutdown_summarizer).await;

    metrics_handle.abort();
    ingress_handle.join().expect("ingress thread panicked")?;
    Ok(())
}
