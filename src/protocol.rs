//! Wire types shared by every tier: the UDP sample packet emitted by a server
//! agent, and the TCP rack report sent on to the datacenter aggregator.

use serde::{Deserialize, Serialize};

/// Maximum reasonable size of a single UDP sample datagram.
pub const MAX_SAMPLE_PACKET_BYTES: usize = 4096;

/// One wave measurement, emitted once per sample interval by a server agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplePacket {
    pub rack_id: i64,
    pub server_id: i64,
    pub seq: i64,
    pub sent_ts: f64,
    pub wave_sample: f64,
}

/// One rack-health summary, sent once per summary interval over the
/// newline-delimited TCP stream from a rack aggregator to the DC aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RackReport {
    pub rack_id: i64,
    pub health_score: f64,
    pub server_count: i64,
    pub timestamp: f64,
}

impl RackReport {
    /// Encode as a single newline-terminated JSON frame, ready to write to the socket.
    pub fn to_frame(&self) -> eyre::Result<Vec<u8>> {
        let mut buf = serde_json::to_vec(self)?;
        buf.push(b'\n');
        Ok(buf)
    }
}

/// The fundamental frequency a server at `(rack_id, server_id)` is expected to
/// emit. This is a protocol-level contract shared by the emitter and the rack
/// aggregator's summarizer, not a tunable.
pub fn expected_frequency_hz(rack_id: i64, server_id: i64) -> f64 {
    (1.0 + rack_id as f64) + 0.05 * server_id as f64
}
