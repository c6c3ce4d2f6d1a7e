//! Periodic summarization: runs every `summary_interval_seconds`, invokes the
//! spectral analyzer per server, rolls up rack health, and hands the result
//! to the reporter.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::broadcast;
use tracing::info;

use crate::metrics;
use crate::protocol::{expected_frequency_hz, RackReport};
use crate::rack::reporter::Reporter;
use crate::rack::RackState;
use crate::spectral::{classify_health, mean_health_score};

const SAMPLE_RATE_HZ: f64 = 20.0;

fn now_unix_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

/// Run one summarization pass: compute each known server's spectral health,
/// roll up the rack health score, and return the report to send upstream.
/// Zeroes `window_counts` for all known servers before returning.
pub fn summarize_once(state: &RackState, interval_seconds: f64) -> Option<RackReport> {
    let server_ids: Vec<i64> = {
        let server_stats = state.server_stats.lock().unwrap();
        server_stats.keys().copied().collect()
    };

    if server_ids.is_empty() {
        info!("no samples yet for rack {}", state.rack_id);
        return None;
    }

    info!(
        "======== rack {} summary (last {:.1}s) ========",
        state.rack_id, interval_seconds
    );

    let mut spectral_errors = Vec::with_capacity(server_ids.len());
    for server_id in &server_ids {
        let expected_freq = expected_frequency_hz(state.rack_id, *server_id);
        let packets_in_window = {
            let window_counts = state.window_counts.lock().unwrap();
            window_counts.get(server_id).copied().unwrap_or(0)
        };

        let summary = {
            let server_stats = state.server_stats.lock().unwrap();
            server_stats
                .get(server_id)
                .unwrap()
                .summarize(SAMPLE_RATE_HZ, expected_freq, interval_seconds, packets_in_window)
        };

        let health = classify_health(summary.spectral_error);
        info!(
            server_id,
            recv_total = summary.received_total,
            lost_total = summary.lost_total,
            loss_rate = summary.loss_rate,
            arrival_rate_hz = summary.arrival_rate_hz,
            latency_mean_ms = summary.latency_mean_ms,
            latency_max_ms = summary.latency_max_ms,
            spectral_error = summary.spectral_error,
            snr_db = summary.spectral_snr_db,
            health = health.as_str(),
            "server summary",
        );

        metrics::record_spectral_metrics(
            state.rack_id,
            *server_id,
            summary.spectral_error,
            summary.spectral_snr_db,
        );
        spectral_errors.push(summary.spectral_error);
    }

    let rack_health = mean_health_score(&spectral_errors);
    info!("rack {} health_score={:.3}", state.rack_id, rack_health);
    metrics::record_rack_health(state.rack_id, rack_health);

    {
        let mut window_counts = state.window_counts.lock().unwrap();
        for server_id in &server_ids {
            window_counts.insert(*server_id, 0);
        }
    }

    Some(RackReport {
        rack_id: state.rack_id,
        health_score: rack_health,
        server_count: server_ids.len() as i64,
        timestamp: now_unix_secs(),
    })
}

/// Drive the summarizer forever on a fixed interval, reporting upstream
/// after every pass, until shutdown fires.
pub async fn run(
    state: Arc<RackState>,
    mut reporter: Reporter,
    summary_interval_seconds: f64,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(Duration::from_secs_f64(summary_interval_seconds));
    ticker.tick().await; // first tick fires immediately; consume it.
    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                info!("summarizer task stopping");
                return;
            }
            _ = ticker.tick() => {
                if let Some(report) = summarize_once(&state, summary_interval_seconds) {
                    reporter.send(&report).await;
                }
            }
        }
    }
}
