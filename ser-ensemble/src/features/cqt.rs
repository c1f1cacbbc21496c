//! Constant-Q transform
//!
//! Bins are spaced [`BINS_PER_OCTAVE`] per octave upwards from `fmin`. Each
//! bin's filter is a Hann-windowed complex exponential whose length is the
//! same number of periods of its centre frequency, so low bins are long and
//! high bins short. Filters are applied in the frequency domain: each frame
//! is one rectangular-window FFT long enough for the lowest filter, centred
//! on the shared hop grid, and every bin takes the inner product of that
//! spectrum with its sparse kernel. Magnitudes are scaled by the square root
//! of the filter length.

use std::f64::consts::PI;

use ndarray::Array2;
use realfft::num_complex::Complex;
use realfft::RealFftPlanner;

use super::stft::{frame_count, HOP_LENGTH};
use crate::error::{PipelineError, PipelineResult};

/// Frequency resolution (three bins per semitone)
pub const BINS_PER_OCTAVE: usize = 36;

/// Octaves covered from `fmin`
pub const N_OCTAVES: usize = 7;

/// Total constant-Q bins
pub const N_CQT_BINS: usize = BINS_PER_OCTAVE * N_OCTAVES;

/// C1, the untuned lowest bin
pub const C1_HZ: f64 = 32.703_195_662_574_83;

/// Kernel support either side of its centre, in units of `n_fft / taps` bins
const KERNEL_SPAN: f64 = 6.0;

/// Centre frequencies of all bins
pub fn cqt_frequencies(fmin: f64) -> Vec<f64> {
    (0..N_CQT_BINS)
        .map(|k| fmin * 2f64.powf(k as f64 / BINS_PER_OCTAVE as f64))
        .collect()
}

/// Filter length in samples for a bin centred at `freq`.
fn filter_length(freq: f64, sample_rate: u32) -> f64 {
    let r2 = 2f64.powf(2.0 / BINS_PER_OCTAVE as f64);
    let alpha = (r2 - 1.0) / (r2 + 1.0);
    sample_rate as f64 / (alpha * freq)
}

/// Sum of `e^{-i phi m}` for m in 0..taps
fn dirichlet(phi: f64, taps: usize) -> Complex<f64> {
    let n = taps as f64;
    let half = (phi / 2.0).sin();
    if half.abs() < 1e-12 {
        return Complex::new(n, 0.0);
    }
    Complex::from_polar((phi * n / 2.0).sin() / half, -phi * (n - 1.0) / 2.0)
}

/// DTFT of a periodic Hann window of `taps` samples at `theta` rad/sample
fn hann_dtft(theta: f64, taps: usize) -> Complex<f64> {
    let step = 2.0 * PI / taps as f64;
    dirichlet(theta, taps) * 0.5 - (dirichlet(theta - step, taps) + dirichlet(theta + step, taps)) * 0.25
}

/// Conjugated, pre-scaled kernel spectrum over a contiguous run of FFT bins
#[derive(Debug, Clone)]
struct Kernel {
    first_bin: usize,
    weights: Vec<Complex<f32>>,
}

/// Constant-Q filterbank for one sample rate and lowest frequency
#[derive(Debug, Clone)]
pub struct ConstantQ {
    n_fft: usize,
    kernels: Vec<Kernel>,
}

impl ConstantQ {
    /// # Errors
    /// `PipelineError::Feature` if `fmin` is not positive or the top bin is
    /// at or above Nyquist.
    pub fn new(sample_rate: u32, fmin: f64) -> PipelineResult<Self> {
        let nyquist = sample_rate as f64 / 2.0;
        let freqs = cqt_frequencies(fmin);
        let top = freqs.last().copied().unwrap_or(0.0);
        if !(fmin > 0.0) || top >= nyquist {
            return Err(PipelineError::Feature(format!(
                "Constant-Q range {:.1}-{:.1} Hz does not fit below {} Hz",
                fmin, top, nyquist
            )));
        }

        let longest = filter_length(fmin, sample_rate);
        let n_fft = (longest.ceil() as usize).next_power_of_two();
        let kernels = freqs
            .iter()
            .map(|&freq| Self::kernel(freq, sample_rate, n_fft))
            .collect();

        Ok(Self { n_fft, kernels })
    }

    fn kernel(freq: f64, sample_rate: u32, n_fft: usize) -> Kernel {
        let sr = sample_rate as f64;
        let length = filter_length(freq, sample_rate);
        let taps = (length.round() as usize).clamp(2, n_fft);
        // filter occupies [start, start + taps) of the frame, peaking at its centre
        let start = n_fft / 2 - taps / 2;

        // unit-L1 filter, then sqrt(length) response scaling; 1/n_fft undoes the FFT gain
        let window_sum = taps as f64 / 2.0;
        let scale = length.sqrt() / (n_fft as f64 * window_sum);

        let omega = 2.0 * PI * freq / sr;
        let centre = freq * n_fft as f64 / sr;
        let span = KERNEL_SPAN * n_fft as f64 / taps as f64;
        let first_bin = (centre - span).floor().max(0.0) as usize;
        let last_bin = ((centre + span).ceil() as usize).min(n_fft / 2);

        let weights = (first_bin..=last_bin)
            .map(|j| {
                let theta = 2.0 * PI * j as f64 / n_fft as f64 - omega;
                let delay = -2.0 * PI * ((j * start) % n_fft) as f64 / n_fft as f64;
                let spectrum = Complex::from_polar(1.0, delay) * hann_dtft(theta, taps);
                let weight = spectrum.conj() * scale;
                Complex::new(weight.re as f32, weight.im as f32)
            })
            .collect();

        Kernel { first_bin, weights }
    }

    /// FFT size of each analysis frame
    pub fn n_fft(&self) -> usize {
        self.n_fft
    }

    /// Magnitudes (`N_CQT_BINS` × frames) of a mono signal.
    pub fn transform(&self, samples: &[f32]) -> PipelineResult<Array2<f32>> {
        if samples.is_empty() {
            return Err(PipelineError::Feature("Cannot transform an empty signal".to_string()));
        }

        let pad = self.n_fft / 2;
        let mut padded = vec![0.0f32; samples.len() + 2 * pad];
        padded[pad..pad + samples.len()].copy_from_slice(samples);

        let n_frames = frame_count(samples.len(), HOP_LENGTH);

        let mut planner = RealFftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(self.n_fft);
        let mut frame = fft.make_input_vec();
        let mut spectrum = fft.make_output_vec();

        let mut output = Array2::<f32>::zeros((N_CQT_BINS, n_frames));

        for t in 0..n_frames {
            let start = t * HOP_LENGTH;
            frame.copy_from_slice(&padded[start..start + self.n_fft]);

            fft.process(&mut frame, &mut spectrum)
                .map_err(|e| PipelineError::Feature(format!("FFT failed: {}", e)))?;

            for (k, kernel) in self.kernels.iter().enumerate() {
                let bins = &spectrum[kernel.first_bin..kernel.first_bin + kernel.weights.len()];
                let response: Complex<f32> = bins.iter().zip(&kernel.weights).map(|(x, w)| x * w).sum();
                output[[k, t]] = response.norm();
            }
        }

        Ok(output)
    }
}
