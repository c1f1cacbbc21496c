//! Uniform `classify` over the three ensemble members

use ndarray::Array3;
use tracing::debug;

use super::backend::InferenceBackend;
use super::labels::{Emotion, Vocabulary};
use super::model::{InputKind, ModelKind, TensorShape};
use crate::error::{PipelineError, PipelineResult};
use crate::features::STATIC_FEATURE_LEN;

/// Index of the largest value; the first one wins on ties and NaN never wins.
pub fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some(b) if v <= values[b] => {}
            _ => best = Some(i),
        }
    }
    best
}

/// A model's probability vector paired with the labels it is indexed by
#[derive(Debug, Clone, PartialEq)]
pub struct NativePrediction {
    pub model: ModelKind,
    pub labels: Vocabulary,
    pub probabilities: Vec<f32>,
}

impl NativePrediction {
    /// Top-1 label and confidence in the model's own label space
    pub fn top(&self) -> Option<(Emotion, f32)> {
        let index = argmax(&self.probabilities)?;
        let label = self.labels.get(index)?;
        Some((label, self.probabilities[index]))
    }

    /// (label, probability) pairs in native order
    pub fn iter(&self) -> impl Iterator<Item = (Emotion, f32)> + '_ {
        self.labels
            .labels()
            .iter()
            .copied()
            .zip(self.probabilities.iter().copied())
    }
}

/// One trained classifier bound to its input shape and label order
pub struct ModelAdapter {
    kind: ModelKind,
    input_shape: TensorShape,
    vocabulary: Vocabulary,
    backend: Box<dyn InferenceBackend>,
}

impl std::fmt::Debug for ModelAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelAdapter")
            .field("kind", &self.kind)
            .field("input_shape", &self.input_shape)
            .field("vocabulary", &self.vocabulary)
            .finish_non_exhaustive()
    }
}

impl ModelAdapter {
    /// # Errors
    /// `PipelineError::Shape` if a static-feature model does not declare
    /// (1, 1, 37) or any model declares a batch other than 1.
    pub fn new(
        kind: ModelKind,
        input_shape: TensorShape,
        vocabulary: Vocabulary,
        backend: Box<dyn InferenceBackend>,
    ) -> PipelineResult<Self> {
        if input_shape.batch != 1 {
            return Err(PipelineError::Shape(format!(
                "{} input {} must have batch size 1",
                kind, input_shape
            )));
        }
        if kind.input_kind() == InputKind::Static
            && (input_shape.steps != 1 || input_shape.channels != STATIC_FEATURE_LEN)
        {
            return Err(PipelineError::Shape(format!(
                "{} input {} does not match the (1, 1, {}) static feature layout",
                kind, input_shape, STATIC_FEATURE_LEN
            )));
        }

        Ok(Self {
            kind,
            input_shape,
            vocabulary,
            backend,
        })
    }

    /// Adapter whose input shape follows the backend's declared input.
    /// `configured` (or the kind's default) only fills dynamic dimensions,
    /// and is used as-is when the backend declares nothing.
    ///
    /// # Errors
    /// As [`TensorShape::resolve`] and [`ModelAdapter::new`].
    pub fn from_backend(
        kind: ModelKind,
        configured: Option<TensorShape>,
        vocabulary: Vocabulary,
        backend: Box<dyn InferenceBackend>,
    ) -> PipelineResult<Self> {
        let input_shape = match backend.declared_input() {
            Some(declared) => TensorShape::resolve(declared, configured, kind.default_shape())?,
            None => configured.unwrap_or_else(|| kind.default_shape()),
        };
        Self::new(kind, input_shape, vocabulary, backend)
    }

    /// Adapter with the model's trained label order and default shape
    pub fn with_defaults(kind: ModelKind, backend: Box<dyn InferenceBackend>) -> PipelineResult<Self> {
        let vocabulary = Vocabulary::new(kind.default_labels().to_vec())?;
        Self::new(kind, kind.default_shape(), vocabulary, backend)
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn input_shape(&self) -> TensorShape {
        self.input_shape
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Run the model on one input tensor.
    ///
    /// # Errors
    /// `PipelineError::Inference` if the tensor does not have the declared
    /// shape, the backend fails, or the output length differs from the
    /// vocabulary size.
    pub fn classify(&self, input: &Array3<f32>) -> PipelineResult<NativePrediction> {
        if input.dim() != self.input_shape.dims() {
            let (b, t, c) = input.dim();
            return Err(PipelineError::Inference(format!(
                "{} expects input {}, got ({}, {}, {})",
                self.kind, self.input_shape, b, t, c
            )));
        }

        let probabilities = self.backend.predict(input.view())?;

        if probabilities.len() != self.vocabulary.len() {
            return Err(PipelineError::Inference(format!(
                "{} returned {} scores for {} labels",
                self.kind,
                probabilities.len(),
                self.vocabulary.len()
            )));
        }

        debug!(model = %self.kind, scores = ?probabilities, "Classified");

        Ok(NativePrediction {
            model: self.kind,
            labels: self.vocabulary.clone(),
            probabilities,
        })
    }
}
