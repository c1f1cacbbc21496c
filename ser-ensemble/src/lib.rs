//! ser-ensemble: speech emotion recognition by a three-model ensemble
//!
//! A clip is decoded once, turned into a 37-value statistics vector and a
//! first-MFCC sequence, classified by the TESS, RAVDESS and CREMA-D models,
//! and the three outputs are averaged over a unified 8-label space.

pub mod api;
pub mod audio;
pub mod classifier;
pub mod config;
pub mod ensemble;
pub mod error;
pub mod features;

pub use crate::error::{ApiError, ApiResult, PipelineError, PipelineResult};

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServiceConfig;
use crate::ensemble::EnsemblePipeline;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Loaded models and extractors
    pub pipeline: Arc<EnsemblePipeline>,
    pub config: Arc<ServiceConfig>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last prediction failure, for diagnostics
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(pipeline: EnsemblePipeline, config: ServiceConfig) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            config: Arc::new(config),
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .merge(api::index_routes())
        .merge(api::predict_routes())
        .merge(api::health_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
