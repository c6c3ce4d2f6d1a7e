//! Per-server stats store: sequence/loss/latency accounting and the bounded
//! wave-sample ring the spectral analyzer reads from.

use std::collections::VecDeque;

use crate::spectral::{self, SpectralMetrics};

const LATENCY_HISTORY_CAPACITY: usize = 1000;
const WAVE_BUFFER_CAPACITY: usize = 2048;
const MIN_SAMPLES_FOR_ANALYSIS: usize = 64;
const ANALYZER_BANDWIDTH_HZ: f64 = 0.1;

/// Most-recent-wins bounded buffer: push evicts the oldest entry once full.
#[derive(Debug, Clone)]
struct BoundedBuffer {
    capacity: usize,
    data: VecDeque<f64>,
}

impl BoundedBuffer {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            data: VecDeque::with_capacity(capacity),
        }
    }

    fn push(&mut self, value: f64) {
        if self.data.len() == self.capacity {
            self.data.pop_front();
        }
        self.data.push_back(value);
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn iter(&self) -> impl Iterator<Item = &f64> {
        self.data.iter()
    }

    fn as_contiguous(&self) -> Vec<f64> {
        self.data.iter().copied().collect()
    }
}

/// Summary statistics produced once per summarization interval for a server.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServerSummary {
    pub received_total: u64,
    pub lost_total: u64,
    pub loss_rate: f64,
    pub latency_mean_ms: f64,
    pub latency_max_ms: f64,
    pub arrival_rate_hz: f64,
    pub spectral_error: f64,
    pub spectral_snr_db: f64,
}

impl ServerSummary {
    fn zero() -> Self {
        Self {
            received_total: 0,
            lost_total: 0,
            loss_rate: 0.0,
            latency_mean_ms: 0.0,
            latency_max_ms: 0.0,
            arrival_rate_hz: 0.0,
            spectral_error: 0.0,
            spectral_snr_db: 0.0,
        }
    }
}

/// Per-(rack, server) accumulation state. Lazily created on first packet,
/// never destroyed for the process lifetime.
#[derive(Debug, Clone)]
pub struct ServerStats {
    last_seq: i64,
    received_count: u64,
    lost_count: u64,
    latencies_ms: BoundedBuffer,
    wave_buffer: BoundedBuffer,
}

impl Default for ServerStats {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerStats {
    pub fn new() -> Self {
        Self {
            last_seq: -1,
            received_count: 0,
            lost_count: 0,
            latencies_ms: BoundedBuffer::new(LATENCY_HISTORY_CAPACITY),
            wave_buffer: BoundedBuffer::new(WAVE_BUFFER_CAPACITY),
        }
    }

    pub fn last_seq(&self) -> i64 {
        self.last_seq
    }

    pub fn received_count(&self) -> u64 {
        self.received_count
    }

    pub fn lost_count(&self) -> u64 {
        self.lost_count
    }

    pub fn wave_buffer_len(&self) -> usize {
        self.wave_buffer.len()
    }

    /// Account for one received datagram. Loss is strictly forward-gap
    /// accounting: out-of-order and duplicate packets (`seq <= last_seq`)
    /// still count towards `received_count` and still land in the bounded
    /// buffers, but never move `last_seq` backwards and never touch
    /// `lost_count`. This matches the source behavior verbatim (see
    /// DESIGN.md for the accompanying open question).
    pub fn record_packet(&mut self, seq: i64, sent_ts: f64, recv_ts: f64, wave_sample: f64) {
        if self.last_seq >= 0 && seq > self.last_seq + 1 {
            self.lost_count += (seq - self.last_seq - 1) as u64;
        }
        if seq > self.last_seq {
            self.last_seq = seq;
        }
        self.received_count += 1;

        let latency_ms = (recv_ts - sent_ts) * 1000.0;
        self.latencies_ms.push(latency_ms);
        self.wave_buffer.push(wave_sample);
    }

    /// Compute the windowed summary for this server, including a spectral
    /// analysis pass when the wave buffer holds enough samples.
    pub fn summarize(
        &self,
        sample_rate_hz: f64,
        expected_freq_hz: f64,
        window_seconds: f64,
        packets_in_window: u64,
    ) -> ServerSummary {
        if self.received_count == 0 {
            return ServerSummary::zero();
        }

        let received_total = self.received_count;
        let lost_total = self.lost_count;
        let denom = (received_total + lost_total).max(1) as f64;
        let loss_rate = lost_total as f64 / denom;

        let (latency_mean_ms, latency_max_ms) = if self.latencies_ms.is_empty() {
            (0.0, 0.0)
        } else {
            let sum: f64 = self.latencies_ms.iter().sum();
            let mean = sum / self.latencies_ms.len() as f64;
            let max = self
                .latencies_ms
                .iter()
                .copied()
                .fold(f64::NEG_INFINITY, f64::max);
            (mean, max)
        };

        let arrival_rate_hz = packets_in_window as f64 / window_seconds.max(1e-6);

        let (spectral_error, spectral_snr_db) = if self.wave_buffer.len() >= MIN_SAMPLES_FOR_ANALYSIS
        {
            let samples = self.wave_buffer.as_contiguous();
            let SpectralMetrics {
                snr_db,
                spectral_error,
                ..
            } = spectral::analyze(
                &samples,
                sample_rate_hz,
                expected_freq_hz,
                ANALYZER_BANDWIDTH_HZ,
            );
            (spectral_error, snr_db)
        } else {
            (0.0, 0.0)
        };

        ServerSummary {
            received_total,
            lost_total,
            loss_rate,
            latency_mean_ms,
            latency_max_ms,
            arrival_rate_hz,
            spectral_error,
            spectral_snr_db,
        }
    }
}
