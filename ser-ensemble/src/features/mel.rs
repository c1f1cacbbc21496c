//! Mel filterbank, decibel scaling and MFCCs
//!
//! Slaney-style mel scale (linear below 1 kHz, logarithmic above) with
//! area-normalised triangular filters, matching the common Python audio
//! toolchain so trained models see the inputs they were fit on.

use ndarray::Array2;

use super::stft::{fft_frequencies, N_FFT};

/// Number of mel bands feeding the cepstrum
pub const N_MELS: usize = 128;

const F_SP: f64 = 200.0 / 3.0;
const MIN_LOG_HZ: f64 = 1000.0;
const MIN_LOG_MEL: f64 = MIN_LOG_HZ / F_SP;

/// Reference power for decibel conversion
const DB_REF: f32 = 1.0;
/// Floor applied before taking the logarithm
const DB_AMIN: f32 = 1e-10;
/// Dynamic range kept below the peak
const TOP_DB: f32 = 80.0;

fn log_step() -> f64 {
    6.4f64.ln() / 27.0
}

pub fn hz_to_mel(hz: f64) -> f64 {
    if hz >= MIN_LOG_HZ {
        MIN_LOG_MEL + (hz / MIN_LOG_HZ).ln() / log_step()
    } else {
        hz / F_SP
    }
}

pub fn mel_to_hz(mel: f64) -> f64 {
    if mel >= MIN_LOG_MEL {
        MIN_LOG_HZ * (log_step() * (mel - MIN_LOG_MEL)).exp()
    } else {
        F_SP * mel
    }
}

/// Mel filterbank of shape (n_mels, n_fft/2 + 1) spanning 0 Hz to Nyquist.
pub fn mel_filterbank(sample_rate: u32, n_fft: usize, n_mels: usize) -> Array2<f32> {
    let fft_freqs: Vec<f64> = fft_frequencies(sample_rate, n_fft)
        .into_iter()
        .map(f64::from)
        .collect();

    let min_mel = hz_to_mel(0.0);
    let max_mel = hz_to_mel(sample_rate as f64 / 2.0);
    let n_points = n_mels + 2;
    let mel_points: Vec<f64> = (0..n_points)
        .map(|i| {
            let mel = min_mel + (max_mel - min_mel) * i as f64 / (n_points - 1) as f64;
            mel_to_hz(mel)
        })
        .collect();

    let mut weights = Array2::<f32>::zeros((n_mels, fft_freqs.len()));

    for m in 0..n_mels {
        let lower_edge = mel_points[m];
        let centre = mel_points[m + 1];
        let upper_edge = mel_points[m + 2];
        let lower_width = centre - lower_edge;
        let upper_width = upper_edge - centre;
        let enorm = 2.0 / (upper_edge - lower_edge);

        for (k, &freq) in fft_freqs.iter().enumerate() {
            let lower = (freq - lower_edge) / lower_width;
            let upper = (upper_edge - freq) / upper_width;
            let w = lower.min(upper).max(0.0);
            weights[[m, k]] = (w * enorm) as f32;
        }
    }

    weights
}

/// Power to decibels: `10·log10(max(S, amin) / ref)`, clipped to 80 dB
/// below the global peak.
pub fn power_to_db(power: &Array2<f32>) -> Array2<f32> {
    let ref_db = 10.0 * DB_AMIN.max(DB_REF).log10();
    let mut db = power.mapv(|p| 10.0 * p.max(DB_AMIN).log10() - ref_db);

    let peak = db.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if peak.is_finite() {
        let floor = peak - TOP_DB;
        db.mapv_inplace(|v| v.max(floor));
    }

    db
}

/// Orthonormal DCT-II matrix of shape (n_out, n_in).
pub fn dct_matrix(n_out: usize, n_in: usize) -> Array2<f32> {
    let n = n_in as f64;
    let mut basis = Array2::<f32>::zeros((n_out, n_in));

    for k in 0..n_out {
        let scale = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
        for i in 0..n_in {
            let angle = std::f64::consts::PI * k as f64 * (2.0 * i as f64 + 1.0) / (2.0 * n);
            basis[[k, i]] = (scale * angle.cos()) as f32;
        }
    }

    basis
}

/// Precomputed mel and DCT bases for a fixed sample rate.
#[derive(Debug, Clone)]
pub struct MfccExtractor {
    filterbank: Array2<f32>,
    dct: Array2<f32>,
}

impl MfccExtractor {
    pub fn new(sample_rate: u32, n_mfcc: usize) -> Self {
        Self {
            filterbank: mel_filterbank(sample_rate, N_FFT, N_MELS),
            dct: dct_matrix(n_mfcc, N_MELS),
        }
    }

    pub fn n_mfcc(&self) -> usize {
        self.dct.nrows()
    }

    /// MFCCs of shape (n_mfcc, frames) from a power spectrogram.
    pub fn compute(&self, power: &Array2<f32>) -> Array2<f32> {
        let mel = self.filterbank.dot(power);
        self.dct.dot(&power_to_db(&mel))
    }
}
