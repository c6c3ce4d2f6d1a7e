//! Reference leaf wave-emitter agent. Spec §6 treats this as an external
//! collaborator specified only by its wire contract; this binary is a
//! minimal, real implementation of that contract so the system can be
//! exercised end-to-end.

use std::net::UdpSocket;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use netwatch::config::ServerAgentConfig;
use netwatch::protocol::{expected_frequency_hz, SamplePacket};
use netwatch::telemetry;
use tracing::info;

fn now_unix_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

fn generate_wave_sample(freq_hz: f64, t: f64) -> f64 {
    (2.0 * std::f64::consts::PI * freq_hz * t).sin()
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    telemetry::init();

    let cfg = ServerAgentConfig::from_env()?;
    info!(
        "starting server agent rack_id={} server_id={} -> {}:{} interval={:.3}s",
        cfg.rack_id, cfg.server_id, cfg.rack_controller_host, cfg.rack_controller_port, cfg.interval_sec
    );

    let freq_hz = expected_frequency_hz(cfg.rack_id, cfg.server_id);
    info!("using frequency {:.3} Hz", freq_hz);

    let socket = UdpSocket::bind("0.0.0.0:0")?;
    let target = (cfg.rack_controller_host.as_str(), cfg.rack_controller_port);

    let start = now_unix_secs();
    let mut seq: i64 = 0;
    loop {
        let now = now_unix_secs();
        let t = now - start;
        let wave_sample = generate_wave_sample(freq_hz, t);

        let packet = SamplePacket {
            rack_id: cfg.rack_id,
            server_id: cfg.server_id,
            seq,
            sent_ts: now,
            wave_sample,
        };

        let encoded = serde_json::to_vec(&packet)?;
        socket.send_to(&encoded, target)?;
        if seq % 100 == 0 {
            info!("sent seq={seq} wave_sample={wave_sample:.4} t={t:.3}");
        }
        seq += 1;
        std::thread::sleep(Duration::from_secs_f64(cfg.interval_sec));
    }
}
