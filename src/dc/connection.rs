//! Per-connection handler: reads a newline-delimited JSON stream of rack
//! reports and upserts each into the shared report map.

use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{info, warn};

use crate::dc::DcState;
use crate::protocol::RackReport;

fn process_line(state: &DcState, line: &str) {
    if line.trim().is_empty() {
        return;
    }
    match serde_json::from_str::<RackReport>(line) {
        Ok(report) => {
            info!(
                "received report: rack={} health_score={:.3} servers={}",
                report.rack_id, report.health_score, report.server_count
            );
            state.rack_reports.lock().unwrap().insert(report.rack_id, report);
        }
        Err(e) => {
            let preview: String = line.chars().take(100).collect();
            warn!("invalid report: {preview} - {e}");
        }
    }
}

/// Drive one accepted connection until the peer closes or I/O fails. Never
/// propagates an error to the caller: it logs and returns.
pub async fn handle(state: Arc<DcState>, mut stream: TcpStream) {
    let mut pending = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let n = match stream.read(&mut chunk).await {
            Ok(0) => break, // peer closed
            Ok(n) => n,
            Err(e) => {
                warn!("error reading from rack connection: {e}");
                break;
            }
        };
        pending.extend_from_slice(&chunk[..n]);

        while let Some(pos) = pending.iter().position(|&b| b == b'\n') {
            let line_bytes: Vec<u8> = pending.drain(..=pos).collect();
            // Drop the trailing newline before decoding.
            let line = String::from_utf8_lossy(&line_bytes[..line_bytes.len() - 1]).into_owned();
            process_line(&state, &line);
        }
    }

    let _ = stream.shutdown().await;
}
