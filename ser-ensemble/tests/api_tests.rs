//! HTTP integration tests for the prediction service
//!
//! The router runs in-process over deterministic stub backends, so these
//! exercise the real decode / feature / reconcile / aggregate path.

mod helpers;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use helpers::{multipart_body, multipart_request, stub_adapter, wav_bytes, AudioConfig, FailingBackend};
use ser_ensemble::classifier::{ModelAdapter, ModelKind};
use ser_ensemble::config::ServiceConfig;
use ser_ensemble::ensemble::EnsemblePipeline;
use ser_ensemble::{build_router, AppState};

const UNIFIED_LABELS: [&str; 8] = [
    "neutral", "calm", "happy", "sad", "angry", "fearful", "disgust", "surprised",
];

fn test_state(config: ServiceConfig) -> AppState {
    AppState::new(helpers::stub_pipeline(), config)
}

async fn send(state: AppState, request: Request<Body>) -> (StatusCode, Value) {
    let response = build_router(state).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

fn sine_wav() -> Vec<u8> {
    wav_bytes(&AudioConfig::default()).unwrap()
}

#[tokio::test]
async fn test_predict_returns_full_ensemble_result() {
    let body = multipart_body("file", Some("speech.wav"), &sine_wav());
    let (status, json) = send(test_state(ServiceConfig::default()), multipart_request(body)).await;

    assert_eq!(status, StatusCode::OK, "body: {}", json);

    let individual = json["individual_predictions"].as_array().unwrap();
    assert_eq!(individual.len(), 3);
    let models: Vec<&str> = individual.iter().map(|p| p["model"].as_str().unwrap()).collect();
    assert_eq!(models, vec!["TESS", "RAVDESS", "CREMA-D"]);
    for prediction in individual {
        assert!(UNIFIED_LABELS.contains(&prediction["emotion"].as_str().unwrap()));
        let confidence = prediction["confidence"].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&confidence));
    }

    let probabilities = json["all_probabilities"].as_object().unwrap();
    assert_eq!(probabilities.len(), 8);
    for label in UNIFIED_LABELS {
        assert!(probabilities.contains_key(label), "missing {}", label);
    }
    let total: f64 = probabilities.values().map(|v| v.as_f64().unwrap()).sum();
    assert!((total - 1.0).abs() < 1e-4, "probabilities sum to {}", total);

    let emotion = json["ensemble_prediction"]["emotion"].as_str().unwrap();
    assert!(UNIFIED_LABELS.contains(&emotion));
    let confidence = json["ensemble_prediction"]["confidence"].as_f64().unwrap();
    let max = probabilities.values().map(|v| v.as_f64().unwrap()).fold(0.0, f64::max);
    assert_eq!(confidence, max);
}

#[tokio::test]
async fn test_identical_uploads_give_identical_responses() {
    let wav = sine_wav();
    let state = test_state(ServiceConfig::default());

    let (_, first) = send(state.clone(), multipart_request(multipart_body("file", Some("a.wav"), &wav))).await;
    let (_, second) = send(state, multipart_request(multipart_body("file", Some("a.wav"), &wav))).await;

    assert_eq!(first.to_string(), second.to_string());
}

#[tokio::test]
async fn test_missing_file_field() {
    let body = multipart_body("recording", Some("speech.wav"), b"RIFF");
    let (status, json) = send(test_state(ServiceConfig::default()), multipart_request(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json, serde_json::json!({ "error": "No file provided" }));
}

#[tokio::test]
async fn test_plain_form_value_is_not_a_file() {
    let body = multipart_body("file", None, b"speech.wav");
    let (status, json) = send(test_state(ServiceConfig::default()), multipart_request(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No file provided");
}

#[tokio::test]
async fn test_non_multipart_request() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let (status, json) = send(test_state(ServiceConfig::default()), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No file provided");
}

#[tokio::test]
async fn test_empty_filename() {
    let body = multipart_body("file", Some(""), b"RIFF");
    let (status, json) = send(test_state(ServiceConfig::default()), multipart_request(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No file selected");
}

#[tokio::test]
async fn test_non_wav_filename() {
    let body = multipart_body("file", Some("clip.mp3"), b"ID3");
    let (status, json) = send(test_state(ServiceConfig::default()), multipart_request(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json, serde_json::json!({ "error": "Only WAV files are supported" }));
}

#[tokio::test]
async fn test_extension_check_is_case_sensitive() {
    let body = multipart_body("file", Some("SPEECH.WAV"), &sine_wav());
    let (status, json) = send(test_state(ServiceConfig::default()), multipart_request(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Only WAV files are supported");
}

#[tokio::test]
async fn test_corrupt_wav_is_a_server_error() {
    let state = test_state(ServiceConfig::default());
    let body = multipart_body("file", Some("broken.wav"), b"this is not a riff file at all");
    let (status, json) = send(state.clone(), multipart_request(body)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = json["error"].as_str().unwrap();
    assert!(message.starts_with("Failed to decode audio"), "message: {}", message);

    // surfaced on /health for diagnostics
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (_, health) = send(state, request).await;
    assert_eq!(health["last_error"], message);
}

#[tokio::test]
async fn test_model_failure_aborts_the_ensemble() {
    let pipeline = EnsemblePipeline::new(
        stub_adapter(ModelKind::Tess),
        stub_adapter(ModelKind::Ravdess),
        ModelAdapter::with_defaults(ModelKind::CremaD, Box::new(FailingBackend)).unwrap(),
    )
    .unwrap();
    let state = AppState::new(pipeline, ServiceConfig::default());

    let body = multipart_body("file", Some("speech.wav"), &sine_wav());
    let (status, json) = send(state, multipart_request(body)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Inference error: simulated runtime failure");
    assert!(json.get("individual_predictions").is_none());
}

#[tokio::test]
async fn test_staged_uploads_are_removed() {
    let upload_dir = tempfile::TempDir::new().unwrap();
    let config = ServiceConfig {
        upload_dir: Some(upload_dir.path().to_path_buf()),
        ..ServiceConfig::default()
    };
    let state = test_state(config);

    let ok = multipart_body("file", Some("speech.wav"), &sine_wav());
    let (status, _) = send(state.clone(), multipart_request(ok)).await;
    assert_eq!(status, StatusCode::OK);

    let broken = multipart_body("file", Some("broken.wav"), b"garbage");
    let (status, _) = send(state, multipart_request(broken)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let leftovers: Vec<_> = std::fs::read_dir(upload_dir.path()).unwrap().collect();
    assert!(leftovers.is_empty(), "temp files left behind: {:?}", leftovers);
}

#[tokio::test]
async fn test_upload_over_limit() {
    let config = ServiceConfig {
        max_upload_bytes: 1024,
        ..ServiceConfig::default()
    };
    let body = multipart_body("file", Some("speech.wav"), &sine_wav());
    let (status, _) = send(test_state(config), multipart_request(body)).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_health_lists_models() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, json) = send(test_state(ServiceConfig::default()), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["module"], "ser-ensemble");
    assert!(json.get("last_error").is_none());

    let models = json["models"].as_array().unwrap();
    assert_eq!(models.len(), 3);
    assert_eq!(models[2]["model"], "CREMA-D");
    assert_eq!(models[2]["input_shape"], serde_json::json!([1, 216, 1]));
    assert_eq!(models[0]["labels"], 7);
}

#[tokio::test]
async fn test_index_page_is_html() {
    let request = Request::builder().uri("/api/").body(Body::empty()).unwrap();
    let response = build_router(test_state(ServiceConfig::default()))
        .oneshot(request)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers().get(header::CONTENT_TYPE).unwrap();
    assert!(content_type.to_str().unwrap().contains("text/html"));
}
