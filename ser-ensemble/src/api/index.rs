//! Minimal upload page

use axum::{
    response::{Html, IntoResponse},
    routing::get,
    Router,
};

use crate::AppState;

pub fn index_routes() -> Router<AppState> {
    Router::new().route("/api/", get(index_page))
}

/// GET /api/
async fn index_page() -> impl IntoResponse {
    Html(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Speech Emotion Ensemble</title>
    <style>
        body {
            font-family: system-ui, -apple-system, sans-serif;
            max-width: 720px;
            margin: 40px auto;
            padding: 20px;
            line-height: 1.6;
        }
        h1 {
            color: #333;
            border-bottom: 2px solid #0066cc;
            padding-bottom: 10px;
        }
        button {
            padding: 10px 20px;
            background: #0066cc;
            color: white;
            border: none;
            border-radius: 4px;
            cursor: pointer;
        }
        table { border-collapse: collapse; margin-top: 16px; }
        td, th { padding: 4px 12px; border-bottom: 1px solid #ddd; text-align: left; }
        .error { color: #b00020; }
    </style>
</head>
<body>
    <h1>Speech Emotion Ensemble</h1>
    <p>Upload a WAV recording to classify it with the TESS, RAVDESS and CREMA-D models.</p>
    <form id="upload">
        <input type="file" name="file" accept=".wav" required>
        <button type="submit">Predict</button>
    </form>
    <div id="result"></div>
    <script>
        const form = document.getElementById('upload');
        const result = document.getElementById('result');

        form.addEventListener('submit', async (event) => {
            event.preventDefault();
            result.textContent = 'Analysing...';

            const response = await fetch('/api/predict', { method: 'POST', body: new FormData(form) });
            const data = await response.json();

            if (!response.ok) {
                result.innerHTML = `<p class="error">${data.error}</p>`;
                return;
            }

            const rows = data.individual_predictions
                .map(p => `<tr><td>${p.model}</td><td>${p.emotion}</td><td>${(p.confidence * 100).toFixed(1)}%</td></tr>`)
                .join('');
            const probabilities = Object.entries(data.all_probabilities)
                .map(([label, p]) => `<tr><td>${label}</td><td>${(p * 100).toFixed(1)}%</td></tr>`)
                .join('');

            result.innerHTML = `
                <h2>${data.ensemble_prediction.emotion} (${(data.ensemble_prediction.confidence * 100).toFixed(1)}%)</h2>
                <table><tr><th>Model</th><th>Emotion</th><th>Confidence</th></tr>${rows}</table>
                <table><tr><th>Emotion</th><th>Probability</th></tr>${probabilities}</table>`;
        });
    </script>
</body>
</html>
"#,
    )
}
