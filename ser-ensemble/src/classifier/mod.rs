//! Classifiers and the unified emotion label space
//!
//! A [`ModelAdapter`] binds one trained model (behind an
//! [`InferenceBackend`]) to its declared input shape and its native label
//! vocabulary.

pub mod adapter;
pub mod backend;
pub mod labels;
pub mod model;

pub use adapter::{ModelAdapter, NativePrediction};
pub use backend::{InferenceBackend, OnnxBackend};
pub use labels::{Emotion, Vocabulary};
pub use model::{InputKind, ModelKind, TensorShape};
