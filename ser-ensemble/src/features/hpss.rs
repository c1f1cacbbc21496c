//! Harmonic/percussive separation by median filtering
//!
//! Harmonic energy is smooth along time, percussive energy is smooth along
//! frequency. A soft mask built from the two median-filtered magnitudes is
//! applied to the complex STFT and the harmonic part is resynthesised.

use ndarray::{Array2, Axis};

use super::stft::{istft, magnitude, ComplexSpectrogram};
use crate::error::PipelineResult;

/// Median filter width in both directions
pub const KERNEL_SIZE: usize = 31;

/// Harmonic component of a signal, given its STFT. Output has `length` samples.
pub fn harmonic(spectrogram: &ComplexSpectrogram, length: usize) -> PipelineResult<Vec<f32>> {
    let mag = magnitude(spectrogram);
    let harmonic_mag = median_filter(&mag, Axis(1), KERNEL_SIZE);
    let percussive_mag = median_filter(&mag, Axis(0), KERNEL_SIZE);

    let mut masked = spectrogram.clone();
    for ((value, &h), &p) in masked
        .iter_mut()
        .zip(harmonic_mag.iter())
        .zip(percussive_mag.iter())
    {
        *value *= soft_mask(h, p);
    }

    istft(&masked, length)
}

/// Wiener-style mask `h² / (h² + p²)`; 0.5 when both are negligible.
fn soft_mask(h: f32, p: f32) -> f32 {
    let z = h.max(p);
    if z < f32::MIN_POSITIVE {
        return 0.5;
    }
    let h = (h / z).powi(2);
    let p = (p / z).powi(2);
    h / (h + p)
}

/// Running median along one axis with mirror ("reflect") borders.
pub fn median_filter(data: &Array2<f32>, axis: Axis, size: usize) -> Array2<f32> {
    let mut output = Array2::<f32>::zeros(data.raw_dim());
    let mut line = Vec::new();
    let mut window = Vec::with_capacity(size);

    for (src, mut dst) in data.lanes(axis).into_iter().zip(output.lanes_mut(axis)) {
        line.clear();
        line.extend(src.iter().copied());
        for (i, out) in dst.iter_mut().enumerate() {
            *out = window_median(&line, i, size, &mut window);
        }
    }

    output
}

fn window_median(line: &[f32], centre: usize, size: usize, window: &mut Vec<f32>) -> f32 {
    let half = size / 2;
    window.clear();
    for offset in 0..size {
        let index = centre as isize + offset as isize - half as isize;
        window.push(line[reflect_index(index, line.len())]);
    }
    let (_, median, _) = window.select_nth_unstable_by(half, |a, b| a.total_cmp(b));
    *median
}

/// Mirror an out-of-range index back into `0..len` (edge sample repeated).
fn reflect_index(index: isize, len: usize) -> usize {
    let period = 2 * len as isize;
    let wrapped = index.rem_euclid(period) as usize;
    if wrapped >= len {
        2 * len - 1 - wrapped
    } else {
        wrapped
    }
}
