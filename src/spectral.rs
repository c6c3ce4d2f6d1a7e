//! Pure, stateless spectral analysis of a windowed wave-sample sequence.
//!
//! Shared by the rack aggregator's summarizer and by unit tests, so the
//! numerical contract only has one implementation.

use rustfft::{num_complex::Complex64, FftPlanner};

/// Floor applied to signal/noise power before any division, to avoid NaNs
/// from a silent or all-zero window.
const POWER_FLOOR: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralMetrics {
    pub snr_db: f64,
    pub spectral_error: f64,
    pub peak_frequency_hz: f64,
    pub signal_power: f64,
    pub noise_power: f64,
}

impl SpectralMetrics {
    fn all_zero_with_max_error() -> Self {
        Self {
            snr_db: 0.0,
            spectral_error: 1.0,
            peak_frequency_hz: 0.0,
            signal_power: 0.0,
            noise_power: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Sev2,
    Sev1,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Sev2 => "sev2",
            HealthStatus::Sev1 => "sev1",
        }
    }
}

/// Classify a spectral error into the three-tier health status.
pub fn classify_health(spectral_error: f64) -> HealthStatus {
    if spectral_error < 0.2 {
        HealthStatus::Healthy
    } else if spectral_error < 0.5 {
        HealthStatus::Sev2
    } else {
        HealthStatus::Sev1
    }
}

/// Hann window of length `n`, using the `n - 1` denominator convention
/// (matches `numpy.hanning`).
pub fn hann_window(n: usize) -> Vec<f64> {
    if n <= 1 {
        return vec![1.0; n];
    }
    (0..n)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f64::consts::PI * i as f64 / (n - 1) as f64).cos()))
        .collect()
}

/// Magnitude spectrum of `windowed` for bins `0..=n/2` (real-input symmetry),
/// normalized by dividing each bin's magnitude by `n`.
pub fn magnitude_spectrum(windowed: &[f64]) -> Vec<f64> {
    let n = windowed.len();
    let mut buffer: Vec<Complex64> = windowed.iter().map(|&s| Complex64::new(s, 0.0)).collect();
    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n);
    fft.process(&mut buffer);

    let keep = n / 2 + 1;
    buffer[..keep].iter().map(|c| c.norm() / n as f64).collect()
}

/// Perform the full spectral analysis described in spec §4.1.
pub fn analyze(
    samples: &[f64],
    sample_rate_hz: f64,
    expected_freq_hz: f64,
    bandwidth_hz: f64,
) -> SpectralMetrics {
    let n = samples.len();
    if n == 0 {
        return SpectralMetrics::all_zero_with_max_error();
    }

    let window = hann_window(n);
    let windowed: Vec<f64> = samples.iter().zip(&window).map(|(s, w)| s * w).collect();
    let magnitudes = magnitude_spectrum(&windowed);

    // Bin k corresponds to k * sample_rate / n Hz.
    let bin_hz = sample_rate_hz / n as f64;

    let (peak_idx, _) = magnitudes
        .iter()
        .enumerate()
        .fold((0usize, f64::NEG_INFINITY), |(best_i, best_v), (i, &v)| {
            if v > best_v {
                (i, v)
            } else {
                (best_i, best_v)
            }
        });
    let peak_frequency_hz = peak_idx as f64 * bin_hz;

    let mut signal_power = 0.0;
    let mut noise_power = 0.0;
    for (k, &mag) in magnitudes.iter().enumerate() {
        let freq = k as f64 * bin_hz;
        let power = mag * mag;
        if (freq - expected_freq_hz).abs() <= bandwidth_hz {
            signal_power += power;
        } else {
            noise_power += power;
        }
    }

    let total_power = signal_power + noise_power;
    let spectral_error = if total_power < POWER_FLOOR {
        1.0
    } else {
        noise_power / total_power
    };

    let signal_power_clamped = signal_power.max(POWER_FLOOR);
    let noise_power_clamped = noise_power.max(POWER_FLOOR);
    let snr_db = 10.0 * (signal_power_clamped / noise_power_clamped).log10();

    SpectralMetrics {
        snr_db,
        spectral_error,
        peak_frequency_hz,
        signal_power,
        noise_power,
    }
}

/// Mean-based health score shared by rack and datacenter aggregation:
/// `clamp(1 - mean(errors), 0, 1)`, or `0.0` for an empty input.
pub fn mean_health_score(errors: &[f64]) -> f64 {
    if errors.is_empty() {
        return 0.0;
    }
    let mean = errors.iter().sum::<f64>() / errors.len() as f64;
    (1.0 - mean).clamp(0.0, 1.0)
}
