//! Short-time Fourier transform
//!
//! Conventions shared by every spectral feature:
//! - n_fft = 2048, hop = 512, periodic Hann window
//! - frames are centred: the signal is zero-padded by n_fft/2 on both sides,
//!   giving `1 + len / hop` frames
//!
//! Spectrograms are laid out as (frequency bins, frames).

use ndarray::Array2;
use realfft::num_complex::Complex;
use realfft::RealFftPlanner;

use crate::error::{PipelineError, PipelineResult};

/// FFT size
pub const N_FFT: usize = 2048;

/// Hop between successive frames
pub const HOP_LENGTH: usize = 512;

/// Number of frequency bins produced by [`stft`]
pub const N_BINS: usize = N_FFT / 2 + 1;

/// Complex spectrogram (bins × frames)
pub type ComplexSpectrogram = Array2<Complex<f32>>;

/// Periodic Hann window (the STFT variant, not the symmetric filter-design one)
pub fn hann_window(size: usize) -> Vec<f32> {
    let factor = 2.0 * std::f64::consts::PI / size as f64;
    (0..size)
        .map(|i| (0.5 - 0.5 * (i as f64 * factor).cos()) as f32)
        .collect()
}

/// Number of centred frames for a signal of `len` samples
pub fn frame_count(len: usize, hop_length: usize) -> usize {
    1 + len / hop_length
}

/// Centre frequency of each STFT bin
pub fn fft_frequencies(sample_rate: u32, n_fft: usize) -> Vec<f32> {
    (0..=n_fft / 2)
        .map(|k| (k as f64 * sample_rate as f64 / n_fft as f64) as f32)
        .collect()
}

/// Forward STFT of a mono signal.
pub fn stft(samples: &[f32]) -> PipelineResult<ComplexSpectrogram> {
    if samples.is_empty() {
        return Err(PipelineError::Feature("Cannot transform an empty signal".to_string()));
    }

    let pad = N_FFT / 2;
    let mut padded = vec![0.0f32; samples.len() + 2 * pad];
    padded[pad..pad + samples.len()].copy_from_slice(samples);

    let n_frames = frame_count(samples.len(), HOP_LENGTH);
    let window = hann_window(N_FFT);

    let mut planner = RealFftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(N_FFT);
    let mut frame = fft.make_input_vec();
    let mut spectrum = fft.make_output_vec();

    let mut output = Array2::from_elem((N_BINS, n_frames), Complex::new(0.0f32, 0.0));

    for t in 0..n_frames {
        let start = t * HOP_LENGTH;
        for (i, (dst, &w)) in frame.iter_mut().zip(window.iter()).enumerate() {
            *dst = padded[start + i] * w;
        }

        fft.process(&mut frame, &mut spectrum)
            .map_err(|e| PipelineError::Feature(format!("FFT failed: {}", e)))?;

        for (k, value) in spectrum.iter().enumerate() {
            output[[k, t]] = *value;
        }
    }

    Ok(output)
}

/// Inverse STFT with squared-window overlap-add normalisation.
///
/// The centre padding is removed and the result is trimmed or zero-extended
/// to exactly `length` samples.
pub fn istft(spectrogram: &ComplexSpectrogram, length: usize) -> PipelineResult<Vec<f32>> {
    let (n_bins, n_frames) = spectrogram.dim();
    if n_bins != N_BINS {
        return Err(PipelineError::Feature(format!(
            "Expected {} frequency bins, got {}",
            N_BINS, n_bins
        )));
    }
    if n_frames == 0 {
        return Ok(vec![0.0; length]);
    }

    let window = hann_window(N_FFT);

    let mut planner = RealFftPlanner::<f32>::new();
    let ifft = planner.plan_fft_inverse(N_FFT);
    let mut spectrum = ifft.make_input_vec();
    let mut frame = ifft.make_output_vec();

    let total_len = N_FFT + HOP_LENGTH * (n_frames - 1);
    let mut signal = vec![0.0f32; total_len];
    let mut window_sum = vec![0.0f32; total_len];
    let scale = 1.0 / N_FFT as f32;

    for t in 0..n_frames {
        for (k, dst) in spectrum.iter_mut().enumerate() {
            *dst = spectrogram[[k, t]];
        }
        // DC and Nyquist bins of a real signal carry no imaginary part
        spectrum[0].im = 0.0;
        spectrum[N_BINS - 1].im = 0.0;

        ifft.process(&mut spectrum, &mut frame)
            .map_err(|e| PipelineError::Feature(format!("Inverse FFT failed: {}", e)))?;

        let start = t * HOP_LENGTH;
        for i in 0..N_FFT {
            signal[start + i] += frame[i] * scale * window[i];
            window_sum[start + i] += window[i] * window[i];
        }
    }

    for (sample, &norm) in signal.iter_mut().zip(window_sum.iter()) {
        if norm > f32::MIN_POSITIVE {
            *sample /= norm;
        }
    }

    let mut output: Vec<f32> = signal.into_iter().skip(N_FFT / 2).take(length).collect();
    output.resize(length, 0.0);
    Ok(output)
}

/// |X| for every bin
pub fn magnitude(spectrogram: &ComplexSpectrogram) -> Array2<f32> {
    spectrogram.mapv(|c| c.norm())
}

/// |X|² for every bin
pub fn power(spectrogram: &ComplexSpectrogram) -> Array2<f32> {
    spectrogram.mapv(|c| c.norm_sqr())
}
