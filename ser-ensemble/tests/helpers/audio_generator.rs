//! WAV fixture generator

use std::path::{Path, PathBuf};

/// Configuration for generated audio
#[derive(Debug, Clone)]
pub struct AudioConfig {
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub frequency: f32,
    pub amplitude: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            duration_seconds: 2.0,
            sample_rate: 44100,
            channels: 2,
            frequency: 440.0,
            amplitude: 0.3,
        }
    }
}

/// Write a 16-bit sine-tone WAV file
pub fn generate_test_wav(path: &Path, config: &AudioConfig) -> anyhow::Result<PathBuf> {
    let spec = hound::WavSpec {
        channels: config.channels,
        sample_rate: config.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    let total_samples = (config.duration_seconds * config.sample_rate as f64) as usize;

    for i in 0..total_samples {
        let t = i as f32 / config.sample_rate as f32;
        let value = config.amplitude * (2.0 * std::f32::consts::PI * config.frequency * t).sin();
        let sample = (value * i16::MAX as f32) as i16;

        for _ in 0..config.channels {
            writer.write_sample(sample)?;
        }
    }

    writer.finalize()?;
    Ok(path.to_path_buf())
}

/// Write a mono WAV file of digital silence
pub fn generate_silent_wav(path: &Path, duration_seconds: f64) -> anyhow::Result<PathBuf> {
    let config = AudioConfig {
        duration_seconds,
        sample_rate: 22050,
        channels: 1,
        amplitude: 0.0,
        ..AudioConfig::default()
    };
    generate_test_wav(path, &config)
}

/// WAV bytes for request bodies
pub fn wav_bytes(config: &AudioConfig) -> anyhow::Result<Vec<u8>> {
    let dir = tempfile::TempDir::new()?;
    let path = generate_test_wav(&dir.path().join("fixture.wav"), config)?;
    Ok(std::fs::read(path)?)
}
