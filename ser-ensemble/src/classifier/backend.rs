//! Inference runtimes behind the model adapters

use std::path::Path;
use std::sync::Mutex;

use ndarray::ArrayView3;
use ort::session::Session;
use ort::value::Tensor;
use tracing::{debug, info};

use crate::error::{PipelineError, PipelineResult};

/// Maps one (batch, steps, features) tensor to a flat probability vector.
///
/// Implementations must be deterministic: equal inputs give equal outputs.
pub trait InferenceBackend: Send + Sync {
    fn predict(&self, input: ArrayView3<'_, f32>) -> PipelineResult<Vec<f32>>;

    /// Input dimensions the model itself declares, non-positive where dynamic.
    fn declared_input(&self) -> Option<&[i64]> {
        None
    }
}

/// ONNX Runtime session loaded once and reused for every request
pub struct OnnxBackend {
    session: Mutex<Session>,
    input_name: String,
    input_dims: Option<Vec<i64>>,
}

impl OnnxBackend {
    /// Load a model file. `input_name` selects the graph input to feed,
    /// otherwise the first one is used; its declared dimensions are kept.
    ///
    /// # Errors
    /// `PipelineError::ModelLoad` if the file is missing, not a valid model,
    /// or has no such input.
    pub fn load(path: &Path, input_name: Option<&str>) -> PipelineResult<Self> {
        if !path.exists() {
            return Err(PipelineError::ModelLoad(format!(
                "Model not found: {}",
                path.display()
            )));
        }

        let session = Session::builder()
            .and_then(|b| b.with_intra_threads(1))
            .and_then(|b| b.commit_from_file(path))
            .map_err(|e| {
                PipelineError::ModelLoad(format!("{}: {}", path.display(), e))
            })?;

        let input = match input_name {
            Some(name) => session.inputs().iter().find(|input| input.name() == name).ok_or_else(|| {
                PipelineError::ModelLoad(format!("{} has no input named '{}'", path.display(), name))
            })?,
            None => session.inputs().first().ok_or_else(|| {
                PipelineError::ModelLoad(format!("{} declares no inputs", path.display()))
            })?,
        };
        let input_name = input.name().to_string();
        let input_dims = input
            .dtype()
            .tensor_shape()
            .map(|shape| shape.iter().copied().collect::<Vec<i64>>());

        info!(
            path = %path.display(),
            input = %input_name,
            dims = ?input_dims,
            "Loaded ONNX model"
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            input_dims,
        })
    }

    pub fn input_name(&self) -> &str {
        &self.input_name
    }
}

impl InferenceBackend for OnnxBackend {
    fn predict(&self, input: ArrayView3<'_, f32>) -> PipelineResult<Vec<f32>> {
        let tensor = Tensor::from_array(input.to_owned())
            .map_err(|e| PipelineError::Inference(format!("Tensor creation failed: {}", e)))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| PipelineError::Inference("Model session lock poisoned".to_string()))?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => tensor])
            .map_err(|e| PipelineError::Inference(e.to_string()))?;

        let (_, first) = outputs
            .iter()
            .next()
            .ok_or_else(|| PipelineError::Inference("Model produced no output".to_string()))?;

        let (shape, data) = first
            .try_extract_tensor::<f32>()
            .map_err(|e| PipelineError::Inference(format!("Output extraction failed: {}", e)))?;

        debug!(output_shape = ?shape, "Model run complete");
        Ok(data.to_vec())
    }

    fn declared_input(&self) -> Option<&[i64]> {
        self.input_dims.as_deref()
    }
}
