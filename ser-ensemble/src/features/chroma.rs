//! Chromagram and tonal centroid (tonnetz) features
//!
//! Two chromagrams fold energy onto 12 pitch classes:
//! - [`chroma_stft`]: the power spectrum through Gaussian bumps centred on
//!   each bin's (tuning-corrected) pitch class
//! - [`chroma_cqt`]: constant-Q magnitudes, three bins per pitch class per
//!   octave, with the transform's lowest bin shifted by the estimated tuning
//!
//! Tonnetz projects the normalised constant-Q chroma onto three interval circles.

use ndarray::Array2;

use super::cqt::{ConstantQ, BINS_PER_OCTAVE, C1_HZ};
use super::pitch::piptrack;
use super::stats;
use super::stft::{magnitude, stft, N_FFT};
use crate::error::PipelineResult;

/// Pitch classes per octave
pub const N_CHROMA: usize = 12;

/// Tonnetz dimensions (fifths, minor thirds, major thirds; x and y each)
pub const N_TONNETZ: usize = 6;

/// Tuning histogram resolution in fractions of a bin
const TUNING_RESOLUTION: f64 = 0.01;

/// Octave weighting centre and width (in octaves above C0-ish reference)
const OCTAVE_CENTRE: f64 = 5.0;
const OCTAVE_WIDTH: f64 = 2.0;

/// Octave number relative to A440/16, shifted by `tuning` fractions of a semitone.
fn hz_to_octs(freq: f64, tuning: f64) -> f64 {
    let a440 = 440.0 * 2f64.powf(tuning / N_CHROMA as f64);
    (freq / (a440 / 16.0)).log2()
}

/// Chroma filterbank of shape (12, n_fft/2 + 1), rows starting at C.
pub fn chroma_filterbank(sample_rate: u32, n_fft: usize, tuning: f64) -> Array2<f32> {
    let n_chroma = N_CHROMA as f64;
    let half_chroma = (n_chroma / 2.0).round();

    // pitch class of every non-DC bin; DC gets a value 1.5 octaves below bin 1
    let mut frqbins: Vec<f64> = (1..n_fft)
        .map(|k| n_chroma * hz_to_octs(k as f64 * sample_rate as f64 / n_fft as f64, tuning))
        .collect();
    let dc = frqbins[0] - 1.5 * n_chroma;
    frqbins.insert(0, dc);

    let mut binwidth: Vec<f64> = frqbins.windows(2).map(|w| (w[1] - w[0]).max(1.0)).collect();
    binwidth.push(1.0);

    let mut weights = Array2::<f64>::zeros((N_CHROMA, n_fft));
    for c in 0..N_CHROMA {
        for f in 0..n_fft {
            let distance = (frqbins[f] - c as f64 + half_chroma + 10.0 * n_chroma)
                .rem_euclid(n_chroma)
                - half_chroma;
            weights[[c, f]] = (-0.5 * (2.0 * distance / binwidth[f]).powi(2)).exp();
        }
    }

    for f in 0..n_fft {
        let mut column = weights.column_mut(f);
        let norm = column.iter().map(|w| w * w).sum::<f64>().sqrt();
        if norm > f64::MIN_POSITIVE {
            column.mapv_inplace(|w| w / norm);
        }

        let octave = frqbins[f] / n_chroma;
        let emphasis = (-0.5 * ((octave - OCTAVE_CENTRE) / OCTAVE_WIDTH).powi(2)).exp();
        column.mapv_inplace(|w| w * emphasis);
    }

    // rows are built relative to A; rotate so row 0 is C
    let n_bins = n_fft / 2 + 1;
    let mut rotated = Array2::<f32>::zeros((N_CHROMA, n_bins));
    for c in 0..N_CHROMA {
        let source = (c + 3) % N_CHROMA;
        for f in 0..n_bins {
            rotated[[c, f]] = weights[[source, f]] as f32;
        }
    }

    rotated
}

/// Estimate the tuning deviation from strong pitch-tracked peaks of a
/// spectrogram, in fractions of one `1 / bins_per_octave` octave step, in
/// [-0.5, 0.5). No peaks means no deviation.
pub fn estimate_tuning(spectrogram: &Array2<f32>, sample_rate: u32, bins_per_octave: usize) -> f64 {
    let grid = piptrack(spectrogram, sample_rate);

    let voiced_magnitudes: Vec<f32> = grid
        .pitches
        .iter()
        .zip(grid.magnitudes.iter())
        .filter(|(&p, _)| p > 0.0)
        .map(|(_, &m)| m)
        .collect();
    let threshold = if voiced_magnitudes.is_empty() {
        0.0
    } else {
        stats::median(&voiced_magnitudes)
    };

    let frequencies: Vec<f64> = grid
        .pitches
        .iter()
        .zip(grid.magnitudes.iter())
        .filter(|(&p, &m)| p > 0.0 && m >= threshold)
        .map(|(&p, _)| p as f64)
        .collect();

    pitch_tuning(&frequencies, bins_per_octave)
}

/// Most common fractional-bin offset of a set of frequencies.
fn pitch_tuning(frequencies: &[f64], bins_per_octave: usize) -> f64 {
    if frequencies.is_empty() {
        return 0.0;
    }

    let n_bins = (1.0 / TUNING_RESOLUTION).round() as usize;
    let mut counts = vec![0usize; n_bins];

    for &freq in frequencies {
        let mut residual = (bins_per_octave as f64 * hz_to_octs(freq, 0.0)).rem_euclid(1.0);
        if residual >= 0.5 {
            residual -= 1.0;
        }
        let bin = ((residual + 0.5) / TUNING_RESOLUTION).floor();
        let bin = (bin.max(0.0) as usize).min(n_bins - 1);
        counts[bin] += 1;
    }

    // first maximal bin
    let mut best = 0;
    for (i, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = i;
        }
    }

    -0.5 + best as f64 * TUNING_RESOLUTION
}

/// Chromagram (12 × frames) from a power spectrogram, each frame scaled so
/// its largest pitch class is 1.
pub fn chroma_stft(power: &Array2<f32>, sample_rate: u32) -> Array2<f32> {
    let tuning = estimate_tuning(power, sample_rate, N_CHROMA);
    let filterbank = chroma_filterbank(sample_rate, N_FFT, tuning);
    let mut chroma = filterbank.dot(power);
    normalise_peak(&mut chroma);
    chroma
}

/// Constant-Q chromagram (12 × frames) of a signal, each frame scaled so its
/// largest pitch class is 1.
pub fn chroma_cqt(samples: &[f32], sample_rate: u32) -> PipelineResult<Array2<f32>> {
    let tuning = estimate_tuning(&magnitude(&stft(samples)?), sample_rate, BINS_PER_OCTAVE);
    let fmin = C1_HZ * 2f64.powf(tuning / BINS_PER_OCTAVE as f64);
    let spectrum = ConstantQ::new(sample_rate, fmin)?.transform(samples)?;

    let mut chroma = Array2::<f32>::zeros((N_CHROMA, spectrum.ncols()));
    for (bin, row) in spectrum.rows().into_iter().enumerate() {
        let mut class = chroma.row_mut(cq_pitch_class(bin));
        class += &row;
    }

    normalise_peak(&mut chroma);
    Ok(chroma)
}

/// Pitch class (C = 0) of a constant-Q bin counted from C1. Each class
/// takes the bin on its semitone plus the bins a third of a semitone either side.
fn cq_pitch_class(bin: usize) -> usize {
    let per_class = BINS_PER_OCTAVE / N_CHROMA;
    ((bin % BINS_PER_OCTAVE + per_class / 2) % BINS_PER_OCTAVE) / per_class
}

fn normalise_peak(chroma: &mut Array2<f32>) {
    for mut column in chroma.columns_mut() {
        let peak = column.iter().fold(0.0f32, |acc, v| acc.max(v.abs()));
        if peak > f32::MIN_POSITIVE {
            column.mapv_inplace(|v| v / peak);
        }
    }
}

/// Tonal centroid features (6 × frames) from a chromagram.
pub fn tonnetz(chroma: &Array2<f32>) -> Array2<f32> {
    const SCALE: [f64; N_TONNETZ] = [7.0 / 6.0, 7.0 / 6.0, 3.0 / 2.0, 3.0 / 2.0, 2.0 / 3.0, 2.0 / 3.0];
    const RADIUS: [f64; N_TONNETZ] = [1.0, 1.0, 1.0, 1.0, 0.5, 0.5];

    let mut basis = Array2::<f32>::zeros((N_TONNETZ, N_CHROMA));
    for d in 0..N_TONNETZ {
        // even rows are the sine component
        let offset = if d % 2 == 0 { 0.5 } else { 0.0 };
        for c in 0..N_CHROMA {
            let angle = std::f64::consts::PI * (SCALE[d] * c as f64 - offset);
            basis[[d, c]] = (RADIUS[d] * angle.cos()) as f32;
        }
    }

    let mut normalised = chroma.clone();
    for mut column in normalised.columns_mut() {
        let total: f32 = column.iter().map(|v| v.abs()).sum();
        if total > f32::MIN_POSITIVE {
            column.mapv_inplace(|v| v / total);
        }
    }

    basis.dot(&normalised)
}
