//! Sample-rate conversion using rubato
//!
//! Converts the decoded mono stream to the analysis rate. Sinc interpolation
//! with a BlackmanHarris2 window, processed as a single chunk and then
//! flushed so the filter tail is not lost.

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use tracing::debug;

use crate::error::{PipelineError, PipelineResult};

/// Resample mono samples from `source_rate` to `target_rate`.
///
/// Returns the input unchanged when the rates already match. Otherwise the
/// output holds exactly `ceil(len * target_rate / source_rate)` samples.
pub fn resample_mono(
    samples: Vec<f32>,
    source_rate: u32,
    target_rate: u32,
) -> PipelineResult<Vec<f32>> {
    if source_rate == target_rate || samples.is_empty() {
        return Ok(samples);
    }
    if source_rate == 0 {
        return Err(PipelineError::Decode("Source sample rate is zero".to_string()));
    }

    let num_frames = samples.len();

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let resample_ratio = target_rate as f64 / source_rate as f64;

    // Chunk size = input length for single-pass processing
    let mut resampler = SincFixedIn::<f32>::new(resample_ratio, 2.0, params, num_frames, 1)
        .map_err(|e| PipelineError::Decode(format!("Failed to create resampler: {}", e)))?;

    let input_channels = vec![samples];
    let mut resampled = resampler
        .process(&input_channels, None)
        .map_err(|e| PipelineError::Decode(format!("Resampling failed: {}", e)))?
        .pop()
        .unwrap_or_default();

    // drain the samples still held in the sinc filter
    let tail = resampler
        .process_partial(None::<&[Vec<f32>]>, None)
        .map_err(|e| PipelineError::Decode(format!("Resampler flush failed: {}", e)))?
        .pop()
        .unwrap_or_default();
    resampled.extend(tail);

    resampled.resize(expected_length(num_frames, source_rate, target_rate), 0.0);

    debug!(
        input_frames = num_frames,
        output_frames = resampled.len(),
        source_rate,
        target_rate,
        "Resampled audio"
    );

    Ok(resampled)
}

fn expected_length(num_frames: usize, source_rate: u32, target_rate: u32) -> usize {
    (num_frames as u64 * target_rate as u64).div_ceil(source_rate as u64) as usize
}
