//! Audio loading: decode → mono → 22050 Hz
//!
//! Both feature extractors consume a [`Waveform`]; the loader is the only
//! place that touches the file system.

pub mod decoder;
pub mod resampler;

use std::path::Path;

use crate::error::PipelineResult;

/// Sample rate every feature is computed at
pub const TARGET_SAMPLE_RATE: u32 = 22050;

/// Mono waveform at a known sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    /// Mono samples (f32, nominal range [-1.0, 1.0])
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Decode `path` to a mono waveform at [`TARGET_SAMPLE_RATE`].
///
/// # Errors
/// `PipelineError::Decode` if the file is unreadable, not audio, or empty.
pub fn load_waveform(path: &Path) -> PipelineResult<Waveform> {
    let decoded = decoder::decode_mono(path)?;

    let samples = resampler::resample_mono(
        decoded.samples,
        decoded.sample_rate,
        TARGET_SAMPLE_RATE,
    )?;

    Ok(Waveform::new(samples, TARGET_SAMPLE_RATE))
}
