//! Deterministic in-process inference backends

use ndarray::ArrayView3;
use ser_ensemble::classifier::{InferenceBackend, ModelAdapter, ModelKind};
use ser_ensemble::ensemble::EnsemblePipeline;
use ser_ensemble::{PipelineError, PipelineResult};

/// Softmax over `bias + input mean * (i + 1)`, so outputs depend on the clip
pub struct SoftmaxStub {
    pub bias: Vec<f32>,
}

impl SoftmaxStub {
    pub fn new(classes: usize) -> Self {
        Self {
            bias: (0..classes).map(|i| (i as f32 * 0.37).sin()).collect(),
        }
    }
}

impl InferenceBackend for SoftmaxStub {
    fn predict(&self, input: ArrayView3<'_, f32>) -> PipelineResult<Vec<f32>> {
        let mean = input.iter().map(|&v| v as f64).sum::<f64>() / input.len().max(1) as f64;
        let scale = (mean.abs() + 1.0).ln() as f32;

        let logits: Vec<f32> = self
            .bias
            .iter()
            .enumerate()
            .map(|(i, b)| b + scale * 0.1 * (i as f32 + 1.0))
            .collect();
        let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let exps: Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
        let total: f32 = exps.iter().sum();
        Ok(exps.into_iter().map(|e| e / total).collect())
    }
}

/// Always returns the same scores
pub struct FixedBackend(pub Vec<f32>);

impl InferenceBackend for FixedBackend {
    fn predict(&self, _input: ArrayView3<'_, f32>) -> PipelineResult<Vec<f32>> {
        Ok(self.0.clone())
    }
}

/// Fixed scores from a model that declares its own input dimensions
pub struct DeclaredBackend {
    pub dims: Vec<i64>,
    pub scores: Vec<f32>,
}

impl InferenceBackend for DeclaredBackend {
    fn predict(&self, input: ArrayView3<'_, f32>) -> PipelineResult<Vec<f32>> {
        let (_, steps, channels) = input.dim();
        let fits = |declared: i64, actual: usize| declared <= 0 || declared == actual as i64;
        if !fits(self.dims[1], steps) || !fits(self.dims[2], channels) {
            return Err(PipelineError::Inference(format!("input {:?} rejected", input.dim())));
        }
        Ok(self.scores.clone())
    }

    fn declared_input(&self) -> Option<&[i64]> {
        Some(&self.dims)
    }
}

/// Simulates a runtime failure
pub struct FailingBackend;

impl InferenceBackend for FailingBackend {
    fn predict(&self, _input: ArrayView3<'_, f32>) -> PipelineResult<Vec<f32>> {
        Err(PipelineError::Inference("simulated runtime failure".to_string()))
    }
}

/// Adapter with default shape and labels over a softmax stub
pub fn stub_adapter(kind: ModelKind) -> ModelAdapter {
    let classes = kind.default_labels().len();
    ModelAdapter::with_defaults(kind, Box::new(SoftmaxStub::new(classes))).unwrap()
}

/// Full pipeline over softmax stubs
pub fn stub_pipeline() -> EnsemblePipeline {
    EnsemblePipeline::new(
        stub_adapter(ModelKind::Tess),
        stub_adapter(ModelKind::Ravdess),
        stub_adapter(ModelKind::CremaD),
    )
    .unwrap()
}
