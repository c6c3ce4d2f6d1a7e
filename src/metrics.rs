//! Prometheus metrics: the named gauges/counters/histogram exported over
//! HTTP via `prometheus` registries and an `actix-web` `/metrics` endpoint.

use actix_web::{dev::Server, get, App, HttpResponse, HttpServer, Responder};
use paste::paste;
use prometheus::{
    register_gauge_vec, register_histogram_vec, register_int_counter_vec, GaugeVec,
    HistogramVec, IntCounterVec, TextEncoder,
};
use std::sync::OnceLock;
use tracing::info;
use tracing_actix_web::TracingLogger;

const LATENCY_BUCKETS_MS: &[f64] = &[1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0];

macro_rules! static_prom {
    ($name:ident, $kind:ty, $create:expr) => {
        paste! {
            fn $name() -> &'static $kind {
                static [<$name:upper>]: OnceLock<$kind> = OnceLock::new();
                [<$name:upper>].get_or_init(|| { $create })
            }
        }
    };
}

static_prom!(
    server_spectral_error,
    GaugeVec,
    register_gauge_vec!(
        "server_spectral_error",
        "Latest spectral error for a server",
        &["rack_id", "server_id"]
    )
    .unwrap()
);
static_prom!(
    server_snr_db,
    GaugeVec,
    register_gauge_vec!(
        "server_snr_db",
        "Latest SNR in dB for a server",
        &["rack_id", "server_id"]
    )
    .unwrap()
);
static_prom!(
    rack_health_score,
    GaugeVec,
    register_gauge_vec!("rack_health_score", "Latest rack health score", &["rack_id"]).unwrap()
);
static_prom!(
    dc_health_score,
    GaugeVec,
    register_gauge_vec!("dc_health_score", "Latest datacenter health score", &["dc_id"]).unwrap()
);
static_prom!(
    packets_received_total,
    IntCounterVec,
    register_int_counter_vec!(
        "packets_received_total",
        "Cumulative packets received from a server",
        &["rack_id", "server_id"]
    )
    .unwrap()
);
static_prom!(
    packets_lost_total,
    IntCounterVec,
    register_int_counter_vec!(
        "packets_lost_total",
        "Cumulative gap-detected losses for a server",
        &["rack_id", "server_id"]
    )
    .unwrap()
);
static_prom!(
    latency_ms,
    HistogramVec,
    register_histogram_vec!(
        "latency_ms",
        "Packet latency in milliseconds",
        &["rack_id", "server_id"],
        LATENCY_BUCKETS_MS.to_vec()
    )
    .unwrap()
);

/// Update the per-packet counters and latency histogram for a server. Called
/// from the ingress hot path; deliberately does not touch
/// `server_spectral_error`/`server_snr_db` — those are only ever valid right
/// after a summarization pass, and setting them here would have the very
/// next packet stomp the summarizer's value back before a scrape ever sees
/// it.
pub fn record_ingress_metrics(
    rack_id: i64,
    server_id: i64,
    packets_received_delta: u64,
    packets_lost_delta: u64,
    latency_samples_ms: &[f64],
) {
    let rack_id = rack_id.to_string();
    let server_id = server_id.to_string();
    let labels: &[&str] = &[&rack_id, &server_id];

    if packets_received_delta > 0 {
        packets_received_total()
            .with_label_values(labels)
            .inc_by(packets_received_delta);
    }
    if packets_lost_delta > 0 {
        packets_lost_total()
            .with_label_values(labels)
            .inc_by(packets_lost_delta);
    }
    for &sample in latency_samples_ms {
        latency_ms().with_label_values(labels).observe(sample);
    }
}

/// Update the per-server spectral gauges. Called only from the summarizer,
/// once per server per summary interval, so a Prometheus scrape always sees
/// the most recently computed value rather than a zero from the next raw
/// packet.
pub fn record_spectral_metrics(rack_id: i64, server_id: i64, spectral_error: f64, snr_db: f64) {
    let rack_id = rack_id.to_string();
    let server_id = server_id.to_string();
    let labels: &[&str] = &[&rack_id, &server_id];

    server_spectral_error().with_label_values(labels).set(spectral_error);
    server_snr_db().with_label_values(labels).set(snr_db);
}

pub fn record_rack_health(rack_id: i64, score: f64) {
    rack_health_score()
        .with_label_values(&[&rack_id.to_string()])
        .set(score);
}

pub fn record_dc_health(dc_id: i64, score: f64) {
    dc_health_score()
        .with_label_values(&[&dc_id.to_string()])
        .set(score);
}

#[get("/metrics")]
async fn metrics_handler() -> impl Responder {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    match encoder.encode_to_string(&metric_families) {
        Ok(body) => HttpResponse::Ok().content_type("text/plain; version=0.0.4").body(body),
        Err(e) => HttpResponse::InternalServerError().body(e.to_string()),
    }
}

/// Start the metrics HTTP server and return the server future; the caller is
/// expected to `tokio::spawn` it alongside the rest of the process's tasks.
pub fn start_web_server(metrics_port: u16) -> eyre::Result<Server> {
    info!("starting metrics webserver on port {metrics_port}");
    let server = HttpServer::new(|| App::new().wrap(TracingLogger::default()).service(metrics_handler))
        .bind(("0.0.0.0", metrics_port))?
        .workers(1)
        .run();
    Ok(server)
}
