//! UDP ingress: binds a socket, decodes sample packets, and routes them into
//! the per-server stats store. Runs on a dedicated blocking OS thread so a
//! slow summarizer pass never stalls packet reception.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use socket2::{Domain, Socket, Type};
use tokio::sync::broadcast;
use tracing::warn;

use crate::error::IngressError;
use crate::metrics;
use crate::protocol::{SamplePacket, MAX_SAMPLE_PACKET_BYTES};
use crate::rack::RackState;
use crate::stats::ServerStats;

/// How often the ingress loop wakes up to check for a shutdown signal, even
/// with no datagrams arriving.
const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(200);

fn now_unix_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

fn bind_udp_socket(host: Ipv4Addr, port: u16) -> eyre::Result<UdpSocket> {
    let address = SocketAddrV4::new(host, port);
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, None)?;
    socket.set_reuse_address(true)?;
    socket
        .bind(&SocketAddr::V4(address).into())
        .map_err(|e| IngressError::Bind(address, e))?;
    socket.set_read_timeout(Some(SHUTDOWN_POLL_INTERVAL))?;
    Ok(socket.into())
}

/// Decode and route one already-received datagram. Returns `Ok(())` whether
/// or not the packet was usable — malformed/wrong-rack packets are logged
/// and dropped, never propagated as an error, per spec §7.
fn handle_datagram(state: &RackState, buf: &[u8]) {
    let recv_ts = now_unix_secs();

    let packet: SamplePacket = match serde_json::from_slice(buf) {
        Ok(p) => p,
        Err(e) => {
            warn!("dropping malformed sample packet: {e}");
            return;
        }
    };

    if packet.rack_id != state.rack_id {
        warn!(
            "dropping packet for rack_id={} on rack_id={} controller",
            packet.rack_id, state.rack_id
        );
        return;
    }

    let lost_delta = {
        let mut server_stats = state.server_stats.lock().unwrap();
        let entry = server_stats
            .entry(packet.server_id)
            .or_insert_with(ServerStats::new);
        let lost_before = entry.lost_count();
        entry.record_packet(packet.seq, packet.sent_ts, recv_ts, packet.wave_sample);
        entry.lost_count() - lost_before
    };

    {
        let mut window_counts = state.window_counts.lock().unwrap();
        *window_counts.entry(packet.server_id).or_insert(0) += 1;
    }

    let latency_ms = (recv_ts - packet.sent_ts) * 1000.0;
    metrics::record_ingress_metrics(state.rack_id, packet.server_id, 1, lost_delta, &[latency_ms]);
}

/// Run the UDP ingress loop until a shutdown signal arrives. Blocking: meant
/// to be run on its own OS thread, not inside the tokio runtime.
pub fn run(
    state: Arc<RackState>,
    host: Ipv4Addr,
    port: u16,
    mut shutdown: broadcast::Receiver<()>,
) -> eyre::Result<()> {
    let socket = bind_udp_socket(host, port)?;
    tracing::info!("rack {} listening on {host}:{port}/udp", state.rack_id);

    let mut buf = [0u8; MAX_SAMPLE_PACKET_BYTES];
    loop {
        if shutdown.try_recv().is_ok() {
            tracing::info!("ingress task stopping");
            return Ok(());
        }

        match socket.recv_from(&mut buf) {
            Ok((n, _addr)) => handle_datagram(&state, &buf[..n]),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => continue,
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => continue,
            Err(e) => {
                warn!("udp recv error, continuing: {e}");
                continue;
            }
        }
    }
}
