//! Clip-level static feature vector (37 values)
//!
//! Layout, in order:
//!
//! | index  | feature                                   |
//! |--------|-------------------------------------------|
//! | 0..26  | MFCC 1..13, (mean, std) per coefficient   |
//! | 26, 27 | chroma mean, std                          |
//! | 28, 29 | spectral contrast mean, std               |
//! | 30, 31 | tonnetz (harmonic part) mean, std         |
//! | 32     | zero-crossing rate mean                   |
//! | 33, 34 | RMS mean, std                             |
//! | 35, 36 | pitch mean, std                           |

use ndarray::Array3;
use tracing::debug;

use super::mel::MfccExtractor;
use super::stft::{magnitude, power, stft};
use super::{chroma, contrast, hpss, pitch, stats, temporal};
use crate::audio::Waveform;
use crate::error::{PipelineError, PipelineResult};

/// Length of [`StaticFeatureVector`]
pub const STATIC_FEATURE_LEN: usize = 37;

/// Cepstral coefficients summarised in the static vector
pub const N_MFCC: usize = 13;

/// Fixed-length statistics vector for one clip
#[derive(Debug, Clone, PartialEq)]
pub struct StaticFeatureVector([f32; STATIC_FEATURE_LEN]);

impl StaticFeatureVector {
    pub fn new(values: [f32; STATIC_FEATURE_LEN]) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// (mean, std) of the `index`-th MFCC (0-based)
    pub fn mfcc(&self, index: usize) -> Option<(f32, f32)> {
        (index < N_MFCC).then(|| (self.0[2 * index], self.0[2 * index + 1]))
    }

    /// (mean, std) of the tracked pitch
    pub fn pitch(&self) -> (f32, f32) {
        (self.0[35], self.0[36])
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }

    /// Tensor of shape (1, 1, 37) for a single-step sequence model
    pub fn to_tensor(&self) -> Array3<f32> {
        Array3::from_shape_fn((1, 1, STATIC_FEATURE_LEN), |(_, _, i)| self.0[i])
    }
}

/// Computes [`StaticFeatureVector`]s for waveforms at a fixed sample rate.
#[derive(Debug, Clone)]
pub struct StaticFeatureExtractor {
    sample_rate: u32,
    mfcc: MfccExtractor,
}

impl StaticFeatureExtractor {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            mfcc: MfccExtractor::new(sample_rate, N_MFCC),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Extract the 37-value vector. Deterministic for a given waveform.
    pub fn extract(&self, waveform: &Waveform) -> PipelineResult<StaticFeatureVector> {
        if waveform.sample_rate != self.sample_rate {
            return Err(PipelineError::Feature(format!(
                "Expected {} Hz audio, got {} Hz",
                self.sample_rate, waveform.sample_rate
            )));
        }
        if waveform.is_empty() {
            return Err(PipelineError::Feature("Waveform contains no samples".to_string()));
        }

        let sr = self.sample_rate;
        let samples = &waveform.samples;
        let spectrogram = stft(samples)?;
        let power_spec = power(&spectrogram);
        let magnitude_spec = magnitude(&spectrogram);

        let mut values = Vec::with_capacity(STATIC_FEATURE_LEN);

        let mfcc = self.mfcc.compute(&power_spec);
        for row in mfcc.rows() {
            let (mean, std) = stats::mean_std(row.iter().copied());
            values.push(mean);
            values.push(std);
        }

        let chromagram = chroma::chroma_stft(&power_spec, sr);
        push_mean_std(&mut values, chromagram.iter().copied());

        let band_contrast = contrast::spectral_contrast(&magnitude_spec, sr);
        push_mean_std(&mut values, band_contrast.iter().copied());

        // tonal centroids of the harmonic part only
        let harmonic = hpss::harmonic(&spectrogram, samples.len())?;
        let centroids = chroma::tonnetz(&chroma::chroma_cqt(&harmonic, sr)?);
        push_mean_std(&mut values, centroids.iter().copied());

        values.push(stats::mean(temporal::zero_crossing_rate(samples)));

        push_mean_std(&mut values, temporal::rms(samples));

        let (pitch_mean, pitch_std) = pitch::pitch_statistics(&pitch::piptrack(&magnitude_spec, sr));
        values.push(pitch_mean);
        values.push(pitch_std);

        let values: [f32; STATIC_FEATURE_LEN] = values.try_into().map_err(|v: Vec<f32>| {
            PipelineError::Feature(format!(
                "Expected {} static features, produced {}",
                STATIC_FEATURE_LEN,
                v.len()
            ))
        })?;

        debug!(
            frames = spectrogram.ncols(),
            duration_s = waveform.duration_seconds(),
            "Extracted static features"
        );

        Ok(StaticFeatureVector(values))
    }
}

fn push_mean_std<I: IntoIterator<Item = f32>>(values: &mut Vec<f32>, source: I) {
    let (mean, std) = stats::mean_std(source);
    values.push(mean);
    values.push(std);
}
