//! Spectral contrast
//!
//! Octave sub-bands starting at 200 Hz; per frame, the contrast of a band is
//! the dB difference between the mean of its strongest and weakest 2% of bins.

use ndarray::Array2;

use super::mel::power_to_db;
use super::stft::fft_frequencies;

/// Octave bands above the lowest band edge
pub const N_BANDS: usize = 6;

/// Upper edge of the first band
const FMIN: f32 = 200.0;

/// Fraction of bins averaged for peak and valley
const QUANTILE: f64 = 0.02;

/// Spectral contrast (7 × frames) from a magnitude spectrogram.
pub fn spectral_contrast(magnitude: &Array2<f32>, sample_rate: u32) -> Array2<f32> {
    let (n_bins, n_frames) = magnitude.dim();
    let n_fft = 2 * n_bins.saturating_sub(1);
    let freqs = fft_frequencies(sample_rate, n_fft);

    let mut edges = [0.0f32; N_BANDS + 2];
    for (i, edge) in edges.iter_mut().enumerate().skip(1) {
        *edge = FMIN * 2f32.powi(i as i32 - 1);
    }

    let mut valley = Array2::<f32>::zeros((N_BANDS + 1, n_frames));
    let mut peak = Array2::<f32>::zeros((N_BANDS + 1, n_frames));

    for band in 0..=N_BANDS {
        let Some((member_count, rows)) = band_rows(&freqs, edges[band], edges[band + 1], band) else {
            continue;
        };
        let take = ((QUANTILE * member_count as f64).round_ties_even() as usize)
            .max(1)
            .min(rows.len());

        let mut values = Vec::with_capacity(rows.len());
        for t in 0..n_frames {
            values.clear();
            values.extend(rows.iter().map(|&r| magnitude[[r, t]]));
            values.sort_by(|a, b| a.total_cmp(b));

            let low: f32 = values[..take].iter().sum::<f32>() / take as f32;
            let high: f32 = values[values.len() - take..].iter().sum::<f32>() / take as f32;
            valley[[band, t]] = low;
            peak[[band, t]] = high;
        }
    }

    power_to_db(&peak) - power_to_db(&valley)
}

/// Bins belonging to one band, plus the member count the quantile is taken
/// from. Bands above the first borrow one bin below their lower edge; the top
/// band extends to Nyquist; all but the top band drop their last bin.
fn band_rows(freqs: &[f32], low: f32, high: f32, band: usize) -> Option<(usize, Vec<usize>)> {
    let mut member: Vec<bool> = freqs.iter().map(|&f| f >= low && f <= high).collect();
    let first = member.iter().position(|&m| m)?;
    let last = member.iter().rposition(|&m| m)?;

    if band > 0 && first > 0 {
        member[first - 1] = true;
    }
    if band == N_BANDS {
        for m in member.iter_mut().skip(last + 1) {
            *m = true;
        }
    }

    let count = member.iter().filter(|&&m| m).count();
    let mut rows: Vec<usize> = member
        .iter()
        .enumerate()
        .filter(|(_, &m)| m)
        .map(|(i, _)| i)
        .collect();
    if band < N_BANDS {
        rows.pop();
    }

    if rows.is_empty() {
        None
    } else {
        Some((count, rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::stft::{magnitude, stft, N_BINS, N_FFT};

    #[test]
    fn test_shape() {
        let mag = Array2::<f32>::ones((N_BINS, 9));
        let contrast = spectral_contrast(&mag, 22050);
        assert_eq!(contrast.dim(), (N_BANDS + 1, 9));
    }

    #[test]
    fn test_flat_spectrum_has_no_contrast() {
        let mag = Array2::<f32>::from_elem((N_BINS, 3), 0.5);
        let contrast = spectral_contrast(&mag, 22050);
        assert!(contrast.iter().all(|v| v.abs() < 1e-4));
    }

    #[test]
    fn test_tone_raises_contrast_in_its_band() {
        let samples: Vec<f32> = (0..22050)
            .map(|i| (2.0 * std::f32::consts::PI * 1000.0 * i as f32 / 22050.0).sin())
            .collect();
        let contrast = spectral_contrast(&magnitude(&stft(&samples).unwrap()), 22050);
        let frame = contrast.ncols() / 2;
        // 1 kHz sits in the 800-1600 Hz band
        assert!(contrast[[3, frame]] > 10.0);
    }

    #[test]
    fn test_top_band_reaches_nyquist() {
        let freqs = fft_frequencies(22050, N_FFT);
        let (_, rows) = band_rows(&freqs, 6400.0, 12800.0, N_BANDS).unwrap();
        assert_eq!(*rows.last().unwrap(), N_BINS - 1);
    }

    #[test]
    fn test_lower_bands_borrow_one_bin_below() {
        let freqs = fft_frequencies(22050, N_FFT);
        let (_, rows) = band_rows(&freqs, 200.0, 400.0, 1).unwrap();
        let first_member = freqs.iter().position(|&f| f >= 200.0).unwrap();
        assert_eq!(rows[0], first_member - 1);
    }
}
