//! Service configuration
//!
//! Loaded from TOML (see `ser_common::config` for file resolution), then
//! overridden by CLI flags and their environment variables.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use ser_common::config::LoggingConfig;

use crate::classifier::{ModelKind, TensorShape, Vocabulary};
use crate::error::PipelineResult;

/// Default port (the upload page's original Flask port)
pub const DEFAULT_PORT: u16 = 5000;

/// Top-level configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Interface to bind
    pub bind_address: String,
    /// TCP port
    pub port: u16,
    /// Directory model files are resolved against
    pub model_dir: PathBuf,
    /// Where uploads are staged; OS temp dir when unset
    pub upload_dir: Option<PathBuf>,
    /// Request body limit in bytes
    pub max_upload_bytes: usize,
    /// Upper bound on one prediction, in seconds
    pub inference_timeout_secs: u64,
    pub logging: LoggingConfig,
    pub models: ModelsConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            model_dir: PathBuf::from("models"),
            upload_dir: None,
            max_upload_bytes: 25 * 1024 * 1024,
            inference_timeout_secs: 30,
            logging: LoggingConfig::default(),
            models: ModelsConfig::default(),
        }
    }
}

/// Per-model overrides; anything left out falls back to the model's defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub tess: ModelConfig,
    pub ravdess: ModelConfig,
    pub crema_d: ModelConfig,
}

impl ModelsConfig {
    pub fn get(&self, kind: ModelKind) -> &ModelConfig {
        match kind {
            ModelKind::Tess => &self.tess,
            ModelKind::Ravdess => &self.ravdess,
            ModelKind::CremaD => &self.crema_d,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model file, relative to `model_dir` unless absolute
    pub file: Option<PathBuf>,
    /// (batch, steps, channels) for dimensions the model leaves dynamic;
    /// must agree with any dimension the model fixes
    pub input_shape: Option<TensorShape>,
    /// Graph input name; first declared input when unset
    pub input_name: Option<String>,
    /// Native label order override
    pub labels: Option<Vec<String>>,
}

impl ModelConfig {
    /// Configured label order, or the order the model was trained with.
    ///
    /// # Errors
    /// `PipelineError::UnknownLabel` for a label outside the unified space.
    pub fn vocabulary_for(&self, kind: ModelKind) -> PipelineResult<Vocabulary> {
        match &self.labels {
            Some(labels) => Vocabulary::parse(labels),
            None => Vocabulary::new(kind.default_labels().to_vec()),
        }
    }
}

impl ServiceConfig {
    /// Load from an optional TOML file (missing file means defaults).
    pub fn load(path: Option<&Path>) -> ser_common::Result<Self> {
        ser_common::config::load_toml_config(path)
    }

    /// Apply CLI/ENV values on top of file values.
    pub fn apply_overrides(
        &mut self,
        port: Option<u16>,
        bind_address: Option<String>,
        model_dir: Option<PathBuf>,
    ) {
        if let Some(port) = port {
            self.port = port;
        }
        if let Some(bind_address) = bind_address {
            self.bind_address = bind_address;
        }
        if let Some(model_dir) = model_dir {
            self.model_dir = model_dir;
        }
    }

    /// Reject values the service cannot run with.
    pub fn validate(&self) -> ser_common::Result<()> {
        if self.bind_address.trim().is_empty() {
            return Err(ser_common::Error::InvalidInput("bind_address is empty".to_string()));
        }
        if self.max_upload_bytes == 0 {
            return Err(ser_common::Error::InvalidInput(
                "max_upload_bytes must be greater than zero".to_string(),
            ));
        }
        if self.inference_timeout_secs == 0 {
            return Err(ser_common::Error::InvalidInput(
                "inference_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn model_path(&self, kind: ModelKind) -> PathBuf {
        let file = self
            .models
            .get(kind)
            .file
            .clone()
            .unwrap_or_else(|| PathBuf::from(kind.default_file()));
        self.model_dir.join(file)
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}
