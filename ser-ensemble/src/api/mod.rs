//! HTTP handlers
//!
//! - `POST /api/predict`: multipart upload (`file`) → ensemble verdict
//! - `GET /api/`: upload page
//! - `GET /health`: liveness and loaded models

pub mod health;
pub mod index;
pub mod predict;

pub use health::health_routes;
pub use index::index_routes;
pub use predict::predict_routes;
