//! File path → ensemble verdict

use std::path::Path;
use std::time::Instant;

use ndarray::Array3;
use tracing::{debug, info};

use super::aggregate::{aggregate, EnsembleResult};
use crate::audio::{self, Waveform, TARGET_SAMPLE_RATE};
use crate::classifier::{InputKind, ModelAdapter, ModelKind, OnnxBackend};
use crate::config::ServiceConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::features::{SequenceFeatureExtractor, StaticFeatureExtractor};

/// Extractors plus the three loaded adapters.
///
/// Immutable after construction and shared across requests.
#[derive(Debug)]
pub struct EnsemblePipeline {
    static_features: StaticFeatureExtractor,
    sequence_features: SequenceFeatureExtractor,
    adapters: [ModelAdapter; 3],
}

impl EnsemblePipeline {
    /// Assemble a pipeline from adapters given in TESS, RAVDESS, CREMA-D order.
    ///
    /// # Errors
    /// - `PipelineError::ModelLoad` if an adapter is in the wrong slot
    /// - `PipelineError::Shape` if the CREMA-D input is not single-channel
    pub fn new(tess: ModelAdapter, ravdess: ModelAdapter, crema_d: ModelAdapter) -> PipelineResult<Self> {
        let adapters = [tess, ravdess, crema_d];
        for (adapter, expected) in adapters.iter().zip(ModelKind::ALL) {
            if adapter.kind() != expected {
                return Err(PipelineError::ModelLoad(format!(
                    "Expected {} adapter, got {}",
                    expected,
                    adapter.kind()
                )));
            }
        }

        let sequence_features =
            SequenceFeatureExtractor::for_input_shape(adapters[2].input_shape(), TARGET_SAMPLE_RATE)?;

        Ok(Self {
            static_features: StaticFeatureExtractor::new(TARGET_SAMPLE_RATE),
            sequence_features,
            adapters,
        })
    }

    /// Load all three ONNX models described by `config`.
    pub fn load(config: &ServiceConfig) -> PipelineResult<Self> {
        let [tess, ravdess, crema_d] = ModelKind::ALL.map(|kind| load_adapter(config, kind));
        Self::new(tess?, ravdess?, crema_d?)
    }

    pub fn adapters(&self) -> &[ModelAdapter] {
        &self.adapters
    }

    /// Time steps fed to the sequence model
    pub fn sequence_length(&self) -> usize {
        self.sequence_features.target_length()
    }

    /// Decode an audio file and classify it.
    pub fn predict_file(&self, path: &Path) -> PipelineResult<EnsembleResult> {
        let started = Instant::now();
        let waveform = audio::load_waveform(path)?;
        debug!(
            path = %path.display(),
            samples = waveform.len(),
            duration_s = waveform.duration_seconds(),
            "Loaded waveform"
        );

        let result = self.predict_waveform(&waveform)?;

        info!(
            emotion = %result.ensemble_prediction.emotion,
            confidence = result.ensemble_prediction.confidence,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Prediction complete"
        );
        Ok(result)
    }

    /// Classify an already-decoded waveform. Any adapter failure aborts the
    /// whole ensemble.
    pub fn predict_waveform(&self, waveform: &Waveform) -> PipelineResult<EnsembleResult> {
        let static_input: Array3<f32> = self.static_features.extract(waveform)?.to_tensor();
        let sequence_input: Array3<f32> = self.sequence_features.extract(waveform)?.to_tensor();

        let predictions = self
            .adapters
            .iter()
            .map(|adapter| match adapter.kind().input_kind() {
                InputKind::Static => adapter.classify(&static_input),
                InputKind::Sequence => adapter.classify(&sequence_input),
            })
            .collect::<PipelineResult<Vec<_>>>()?;

        aggregate(&predictions)
    }
}

fn load_adapter(config: &ServiceConfig, kind: ModelKind) -> PipelineResult<ModelAdapter> {
    let model_config = config.models.get(kind);
    let vocabulary = model_config.vocabulary_for(kind)?;
    let path = config.model_path(kind);
    let backend = OnnxBackend::load(&path, model_config.input_name.as_deref())?;

    let adapter = ModelAdapter::from_backend(kind, model_config.input_shape, vocabulary, Box::new(backend))?;
    info!(
        model = %kind,
        input_shape = %adapter.input_shape(),
        labels = adapter.vocabulary().len(),
        "Model ready"
    );
    Ok(adapter)
}
