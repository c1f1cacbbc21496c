//! Time-series feature for the CREMA-D model
//!
//! The first MFCC per frame, zero-padded or truncated at the end to the
//! model's declared time-step count.

use ndarray::Array3;

use super::mel::MfccExtractor;
use super::stft::{power, stft};
use crate::audio::Waveform;
use crate::classifier::TensorShape;
use crate::error::{PipelineError, PipelineResult};

/// Fixed-length per-frame sequence
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceFeature {
    values: Vec<f32>,
}

impl SequenceFeature {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    /// Tensor of shape (1, T, 1)
    pub fn to_tensor(&self) -> Array3<f32> {
        Array3::from_shape_fn((1, self.values.len(), 1), |(_, t, _)| self.values[t])
    }
}

/// Pad with trailing zeros or truncate at the end to exactly `target_length`.
pub fn fit_to_length(mut values: Vec<f32>, target_length: usize) -> Vec<f32> {
    values.resize(target_length, 0.0);
    values
}

/// Builds [`SequenceFeature`]s sized for one model input.
#[derive(Debug, Clone)]
pub struct SequenceFeatureExtractor {
    target_length: usize,
    sample_rate: u32,
    mfcc: MfccExtractor,
}

impl SequenceFeatureExtractor {
    pub fn new(target_length: usize, sample_rate: u32) -> PipelineResult<Self> {
        if target_length == 0 {
            return Err(PipelineError::Shape(
                "Sequence model declares zero time steps".to_string(),
            ));
        }
        Ok(Self {
            target_length,
            sample_rate,
            mfcc: MfccExtractor::new(sample_rate, 1),
        })
    }

    /// Derive the target length from a (batch, time, channels) input shape.
    ///
    /// # Errors
    /// `PipelineError::Shape` unless the shape has exactly one channel.
    pub fn for_input_shape(shape: TensorShape, sample_rate: u32) -> PipelineResult<Self> {
        if shape.channels != 1 {
            return Err(PipelineError::Shape(format!(
                "Sequence input {} must have exactly one channel",
                shape
            )));
        }
        Self::new(shape.steps, sample_rate)
    }

    pub fn target_length(&self) -> usize {
        self.target_length
    }

    pub fn extract(&self, waveform: &Waveform) -> PipelineResult<SequenceFeature> {
        if waveform.sample_rate != self.sample_rate {
            return Err(PipelineError::Feature(format!(
                "Expected {} Hz audio, got {} Hz",
                self.sample_rate, waveform.sample_rate
            )));
        }
        if waveform.is_empty() {
            return Err(PipelineError::Feature("Waveform contains no samples".to_string()));
        }

        let mfcc = self.mfcc.compute(&power(&stft(&waveform.samples)?));
        let first: Vec<f32> = mfcc.row(0).to_vec();
        let frames = first.len();

        tracing::debug!(frames, target = self.target_length, "Extracted sequence feature");

        Ok(SequenceFeature::new(fit_to_length(first, self.target_length)))
    }
}
