//! The three trained classifiers and their fixed properties

use std::fmt;

use serde::{Deserialize, Serialize};

use super::labels::Emotion;
use crate::error::{PipelineError, PipelineResult};

/// Which feature representation a model consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// 37-value clip statistics as (1, 1, 37)
    Static,
    /// First-MFCC sequence as (1, T, 1)
    Sequence,
}

/// Declared (batch, time steps, channels/features) input shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[usize; 3]", into = "[usize; 3]")]
pub struct TensorShape {
    pub batch: usize,
    pub steps: usize,
    pub channels: usize,
}

impl TensorShape {
    pub const fn new(batch: usize, steps: usize, channels: usize) -> Self {
        Self {
            batch,
            steps,
            channels,
        }
    }

    pub fn dims(&self) -> (usize, usize, usize) {
        (self.batch, self.steps, self.channels)
    }

    /// Shape from a model's own input declaration (non-positive = dynamic).
    ///
    /// Fixed dimensions are taken from the model. Dynamic ones come from
    /// `configured` when given, otherwise from `fallback`.
    ///
    /// # Errors
    /// - `PipelineError::Shape` if the declared input is not rank 3
    /// - `PipelineError::ModelLoad` if `configured` contradicts a fixed dimension
    pub fn resolve(
        declared: &[i64],
        configured: Option<TensorShape>,
        fallback: TensorShape,
    ) -> PipelineResult<Self> {
        if declared.len() != 3 {
            return Err(PipelineError::Shape(format!(
                "Model input {:?} has rank {}, expected (batch, steps, channels)",
                declared,
                declared.len()
            )));
        }

        let configured_dims = configured.map(<[usize; 3]>::from);
        let fallback_dims: [usize; 3] = fallback.into();
        let mut dims = [0usize; 3];

        for (i, &declared_dim) in declared.iter().enumerate() {
            dims[i] = if declared_dim > 0 {
                let fixed = declared_dim as usize;
                if let Some(wanted) = configured_dims {
                    if wanted[i] != fixed {
                        return Err(PipelineError::ModelLoad(format!(
                            "Configured input shape {} contradicts model input {:?}",
                            TensorShape::from(wanted),
                            declared
                        )));
                    }
                }
                fixed
            } else {
                configured_dims.map_or(fallback_dims[i], |wanted| wanted[i])
            };
        }

        Ok(dims.into())
    }
}

impl From<[usize; 3]> for TensorShape {
    fn from(dims: [usize; 3]) -> Self {
        Self::new(dims[0], dims[1], dims[2])
    }
}

impl From<TensorShape> for [usize; 3] {
    fn from(shape: TensorShape) -> Self {
        [shape.batch, shape.steps, shape.channels]
    }
}

impl fmt::Display for TensorShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.batch, self.steps, self.channels)
    }
}

/// One of the three ensemble members. Order of [`ModelKind::ALL`] is the
/// order of individual predictions in every response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ModelKind {
    #[serde(rename = "TESS")]
    Tess,
    #[serde(rename = "RAVDESS")]
    Ravdess,
    #[serde(rename = "CREMA-D")]
    CremaD,
}

impl ModelKind {
    pub const ALL: [ModelKind; 3] = [ModelKind::Tess, ModelKind::Ravdess, ModelKind::CremaD];

    /// Name reported in responses
    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::Tess => "TESS",
            ModelKind::Ravdess => "RAVDESS",
            ModelKind::CremaD => "CREMA-D",
        }
    }

    pub fn input_kind(self) -> InputKind {
        match self {
            ModelKind::Tess | ModelKind::Ravdess => InputKind::Static,
            ModelKind::CremaD => InputKind::Sequence,
        }
    }

    /// Output order the model was trained with
    pub fn default_labels(self) -> &'static [Emotion] {
        use Emotion::*;
        match self {
            ModelKind::Tess => &[Angry, Disgust, Fearful, Happy, Sad, Neutral, Surprised],
            ModelKind::Ravdess => &[Neutral, Calm, Happy, Sad, Angry, Fearful, Disgust, Surprised],
            ModelKind::CremaD => &[Neutral, Happy, Sad, Angry, Fearful, Disgust],
        }
    }

    pub fn default_file(self) -> &'static str {
        match self {
            ModelKind::Tess => "tess.onnx",
            ModelKind::Ravdess => "ravdess.onnx",
            ModelKind::CremaD => "crema_model.onnx",
        }
    }

    pub fn default_shape(self) -> TensorShape {
        match self {
            ModelKind::Tess | ModelKind::Ravdess => TensorShape::new(1, 1, 37),
            ModelKind::CremaD => TensorShape::new(1, 216, 1),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
