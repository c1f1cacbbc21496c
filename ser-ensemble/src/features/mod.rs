//! Feature extraction
//!
//! Two representations feed the three classifiers:
//! - [`StaticFeatureVector`]: 37 clip-level statistics (TESS and RAVDESS LSTMs)
//! - [`SequenceFeature`]: the first cepstral coefficient per frame, fitted to
//!   the CREMA-D model's time axis
//!
//! All spectral features share one STFT convention (see [`stft`]).

pub mod chroma;
pub mod contrast;
pub mod cqt;
pub mod hpss;
pub mod mel;
pub mod pitch;
pub mod sequence;
pub mod static_vector;
pub mod stats;
pub mod stft;
pub mod temporal;

pub use sequence::{fit_to_length, SequenceFeature, SequenceFeatureExtractor};
pub use static_vector::{StaticFeatureExtractor, StaticFeatureVector, STATIC_FEATURE_LEN};
