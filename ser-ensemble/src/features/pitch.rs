//! Parabolic-interpolation pitch tracking
//!
//! For each frame, bins that are local maxima of the thresholded spectrum
//! inside [150 Hz, 4 kHz) get a refined frequency and magnitude. Everything
//! else stays zero.

use ndarray::Array2;

use super::stats;

/// Lowest tracked frequency
pub const PITCH_FMIN: f32 = 150.0;
/// Upper bound (exclusive) on tracked frequency
pub const PITCH_FMAX: f32 = 4000.0;
/// Fraction of the per-frame peak below which bins are ignored
pub const PITCH_THRESHOLD: f32 = 0.1;

/// Instantaneous pitch and magnitude per (bin, frame)
#[derive(Debug, Clone)]
pub struct PitchGrid {
    pub pitches: Array2<f32>,
    pub magnitudes: Array2<f32>,
}

/// Track pitch peaks in a (bins × frames) spectrogram.
///
/// `n_fft` is inferred from the bin count.
pub fn piptrack(spectrum: &Array2<f32>, sample_rate: u32) -> PitchGrid {
    let (n_bins, n_frames) = spectrum.dim();
    let mut pitches = Array2::<f32>::zeros((n_bins, n_frames));
    let mut magnitudes = Array2::<f32>::zeros((n_bins, n_frames));

    if n_bins < 3 {
        return PitchGrid { pitches, magnitudes };
    }

    let n_fft = 2 * (n_bins - 1);
    let bin_hz = sample_rate as f32 / n_fft as f32;
    let fmax = PITCH_FMAX.min(sample_rate as f32 / 2.0);
    let in_range = |k: usize| {
        let freq = k as f32 * bin_hz;
        freq >= PITCH_FMIN && freq < fmax
    };

    let mut column = vec![0.0f32; n_bins];
    let mut thresholded = vec![0.0f32; n_bins];

    for t in 0..n_frames {
        for (dst, &s) in column.iter_mut().zip(spectrum.column(t).iter()) {
            *dst = s;
        }

        let peak = column.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let floor = PITCH_THRESHOLD * peak;
        for (dst, &s) in thresholded.iter_mut().zip(column.iter()) {
            *dst = if s > floor { s } else { 0.0 };
        }

        for k in 0..n_bins {
            if !in_range(k) {
                continue;
            }

            let rises = k > 0 && thresholded[k] > thresholded[k - 1];
            let holds = k + 1 == n_bins || thresholded[k] >= thresholded[k + 1];
            if !(rises && holds) {
                continue;
            }

            let shift = parabolic_shift(&column, k);
            let dskew = 0.5 * gradient(&column, k) * shift;

            pitches[[k, t]] = (k as f32 + shift) * bin_hz;
            magnitudes[[k, t]] = column[k] + dskew;
        }
    }

    PitchGrid { pitches, magnitudes }
}

/// Vertex offset of the parabola through three neighbouring bins.
/// Edge bins have no stencil and shift by 0.
fn parabolic_shift(column: &[f32], k: usize) -> f32 {
    if k == 0 || k + 1 >= column.len() {
        return 0.0;
    }

    let a = column[k + 1] + column[k - 1] - 2.0 * column[k];
    let b = (column[k + 1] - column[k - 1]) / 2.0;
    if b.abs() >= a.abs() {
        0.0
    } else {
        -b / a
    }
}

/// Central difference, one-sided at the edges.
fn gradient(column: &[f32], k: usize) -> f32 {
    let last = column.len() - 1;
    if k == 0 {
        column[1] - column[0]
    } else if k == last {
        column[last] - column[last - 1]
    } else {
        (column[k + 1] - column[k - 1]) / 2.0
    }
}

/// Mean and standard deviation of the pitches whose magnitude exceeds the
/// median magnitude of the whole grid. `(0.0, 0.0)` when nothing qualifies.
pub fn pitch_statistics(grid: &PitchGrid) -> (f32, f32) {
    let magnitudes: Vec<f32> = grid.magnitudes.iter().copied().collect();
    let threshold = stats::median(&magnitudes);

    let selected: Vec<f32> = grid
        .pitches
        .iter()
        .zip(grid.magnitudes.iter())
        .filter(|(_, &m)| m > threshold)
        .map(|(&p, _)| p)
        .collect();

    if selected.is_empty() {
        return (0.0, 0.0);
    }

    stats::mean_std(selected)
}
