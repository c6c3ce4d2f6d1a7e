//! Periodic fleet-health summary: snapshots the rack report map, filters out
//! stale reports, and classifies the datacenter's health.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::dc::DcState;
use crate::metrics;
use crate::spectral::mean_health_score;

/// A report older than this many seconds is excluded from the fleet score.
const FRESHNESS_WINDOW_SECONDS: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DcHealthStatus {
    Healthy,
    Degraded,
    Critical,
}

impl DcHealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DcHealthStatus::Healthy => "healthy",
            DcHealthStatus::Degraded => "degraded",
            DcHealthStatus::Critical => "critical",
        }
    }
}

pub fn classify_dc_health(score: f64) -> DcHealthStatus {
    if score >= 0.8 {
        DcHealthStatus::Healthy
    } else if score >= 0.5 {
        DcHealthStatus::Degraded
    } else {
        DcHealthStatus::Critical
    }
}

fn now_unix_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

/// Run one summary pass. Returns the computed DC score, or `None` if there
/// were no reports at all, or every report was stale.
pub fn summarize_once(state: &DcState) -> Option<f64> {
    let mut reports: Vec<_> = {
        let rack_reports = state.rack_reports.lock().unwrap();
        if rack_reports.is_empty() {
            info!("dc {}: no reports yet", state.dc_id);
            return None;
        }
        rack_reports.values().copied().collect()
    };
    reports.sort_by_key(|r| r.rack_id);

    info!(
        "======== dc {} summary ({} racks reporting) ========",
        state.dc_id,
        reports.len()
    );

    let now = now_unix_secs();
    let mut fresh_scores = Vec::with_capacity(reports.len());
    for report in &reports {
        let age = now - report.timestamp;
        info!(
            "  rack={} health={:.3} servers={} age={:.1}s",
            report.rack_id, report.health_score, report.server_count, age
        );
        if age < FRESHNESS_WINDOW_SECONDS {
            fresh_scores.push(report.health_score);
        }
    }

    if fresh_scores.is_empty() {
        warn!("dc {}: all rack reports are stale", state.dc_id);
        return None;
    }

    let dc_score = mean_health_score(&fresh_scores);
    let status = classify_dc_health(dc_score);
    info!(
        "dc {} health_score={:.3} status={}",
        state.dc_id,
        dc_score,
        status.as_str()
    );
    metrics::record_dc_health(state.dc_id, dc_score);
    Some(dc_score)
}

/// Drive the summary loop forever on a fixed interval until shutdown fires.
pub async fn run(state: Arc<DcState>, interval_seconds: f64, mut shutdown: broadcast::Receiver<()>) {
    let mut ticker = tokio::time::interval(Duration::from_secs_f64(interval_seconds));
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                info!("dc summary task stopping");
                return;
            }
            _ = ticker.tick() => {
                summarize_once(&state);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::RackReport;

    #[test]
    fn no_reports_yields_none() {
        let state = DcState::new(0);
        assert!(summarize_once(&state).is_none());
    }

    #[test]
    fn stale_report_is_excluded_from_fleet_score() {
        let state = DcState::new(0);
        state.rack_reports.lock().unwrap().insert(
            1,
            RackReport {
                rack_id: 1,
                health_score: 0.9,
                server_count: 3,
                timestamp: now_unix_secs() - 35.0,
            },
        );
        assert!(summarize_once(&state).is_none());
    }

    #[test]
    fn fresh_report_is_included_and_classified() {
        let state = DcState::new(0);
        state.rack_reports.lock().unwrap().insert(
            1,
            RackReport {
                rack_id: 1,
                health_score: 0.95,
                server_count: 3,
                timestamp: now_unix_secs(),
            },
        );
        let score = summarize_once(&state).expect("one fresh report");
        assert!((score - 0.95).abs() < 1e-9);
        assert_eq!(classify_dc_health(score), DcHealthStatus::Healthy);
    }

    #[test]
    fn classification_thresholds() {
        assert_eq!(classify_dc_health(0.8), DcHealthStatus::Healthy);
        assert_eq!(classify_dc_health(0.79), DcHealthStatus::Degraded);
        assert_eq!(classify_dc_health(0.5), DcHealthStatus::Degraded);
        assert_eq!(classify_dc_health(0.49), DcHealthStatus::Critical);
    }
}
