//! Upstream TCP reporter: a minimal `{Disconnected -> Connected ->
//! Disconnected on error}` state machine around exactly one socket, which
//! this task owns exclusively.

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::warn;

use crate::protocol::RackReport;

pub struct Reporter {
    dc_host: String,
    dc_port: u16,
    conn: Option<TcpStream>,
}

impl Reporter {
    pub fn new(dc_host: String, dc_port: u16) -> Self {
        Self {
            dc_host,
            dc_port,
            conn: None,
        }
    }

    /// Send one rack report. On any I/O failure the cached connection is
    /// dropped so the next call retries a fresh dial; this call never blocks
    /// the summarizer beyond a single connect + write, and never retries
    /// within itself.
    pub async fn send(&mut self, report: &RackReport) {
        if let Err(e) = self.send_inner(report).await {
            warn!("failed to report to DC controller, resetting connection: {e}");
            self.conn = None;
        }
    }

    async fn send_inner(&mut self, report: &RackReport) -> eyre::Result<()> {
        if self.conn.is_none() {
            let stream = TcpStream::connect((self.dc_host.as_str(), self.dc_port)).await?;
            tracing::info!(
                "connected to DC controller at {}:{}",
                self.dc_host,
                self.dc_port
            );
            self.conn = Some(stream);
        }

        let frame = report.to_frame()?;
        let stream = self.conn.as_mut().expect("just ensured connected");
        stream.write_all(&frame).await?;
        Ok(())
    }
}
