//! Request handlers.

use crate::{error::ApiError, AppState};
use advisor_types::report::{
    AnalysisReport, AnalyzeRequest, ApiMessage, FeelingRequest, SessionSnapshot, StatusRes,
    StoredImageRes,
};
use advisor_imaging::ImagingError;
use advisor_types::{DataUrl, NonEmptyText};
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Json,
};
use serde_json::Value;
use tracing::info;

/// Absent, empty, and whitespace-only inputs are all "missing".
fn required(value: Option<&str>) -> Result<NonEmptyText, ApiError> {
    value
        .and_then(|v| NonEmptyText::new(v).ok())
        .ok_or(ApiError::MissingInformation)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Liveness check", body = StatusRes)
    )
)]
/// Liveness check for the process as a whole.
#[axum::debug_handler]
pub async fn health() -> Json<StatusRes> {
    Json(StatusRes {
        status: "ok".into(),
    })
}

#[utoipa::path(
    get,
    path = "/api/status",
    responses(
        (status = 200, description = "API liveness check", body = StatusRes)
    )
)]
/// Liveness check for the API surface.
#[axum::debug_handler]
pub async fn api_status() -> Json<StatusRes> {
    Json(StatusRes {
        status: "API is operational".into(),
    })
}

#[utoipa::path(
    post,
    path = "/api/analyze",
    request_body = AnalyzeRequest,
    responses(
        (status = 200, description = "Analysis report from the model", body = AnalysisReport),
        (status = 400, description = "Missing userFeeling or tongueImage", body = ApiMessage),
        (status = 502, description = "Provider failure", body = ApiMessage)
    )
)]
/// Runs one analysis.
///
/// Validates that both inputs are present and non-empty, forwards them
/// verbatim in the fixed prompt template, and returns the provider's JSON
/// unaltered. Missing input fails before any provider call is made; nothing
/// is retried. The extractor rejection is mapped by hand so that even a
/// malformed body gets the `{ "message": ... }` envelope.
#[axum::debug_handler]
pub async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::InvalidBody(e.body_text()))?;
    let user_feeling = required(req.user_feeling.as_deref())?;
    let tongue_image = required(req.tongue_image.as_deref())?;

    let analysis = state.analysis.analyze(&user_feeling, &tongue_image).await?;
    Ok(Json(analysis))
}

#[utoipa::path(
    post,
    path = "/api/session/feeling",
    request_body = FeelingRequest,
    responses(
        (status = 204, description = "Feeling stored"),
        (status = 400, description = "Empty feeling text", body = ApiMessage)
    )
)]
/// Stores the symptom description slot.
#[axum::debug_handler]
pub async fn put_feeling(
    State(state): State<AppState>,
    payload: Result<Json<FeelingRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::InvalidBody(e.body_text()))?;
    let feeling = required(req.user_feeling.as_deref())?;
    state.sessions.put_user_feeling(&feeling)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/session/tongue-image",
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Photo compressed and stored", body = StoredImageRes),
        (status = 400, description = "Body is not a decodable image", body = ApiMessage),
        (status = 413, description = "Photo over slot capacity even at the quality floor", body = ApiMessage)
    )
)]
/// Ingests a tongue photo.
///
/// The body is either the raw image file as captured or a data URL a client
/// pre-encoded; either way the image is decoded, bounded to the maximum
/// dimension, walked down the JPEG quality ladder until under the byte
/// budget, and stored as a data URL. The response carries the stored data
/// URL plus the final quality and dimensions.
#[axum::debug_handler]
pub async fn put_tongue_image(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<StoredImageRes>, ApiError> {
    if body.is_empty() {
        return Err(ApiError::MissingInformation);
    }

    let compressed = match std::str::from_utf8(&body) {
        Ok(text) if text.starts_with("data:") => {
            let url = DataUrl::parse(text).map_err(|e| ApiError::Image(ImagingError::from(e)))?;
            state.sessions.ingest_photo_data_url(&url, &state.compressor)?
        }
        _ => state.sessions.ingest_photo(&body, &state.compressor)?,
    };
    info!(
        quality = compressed.quality,
        width = compressed.width,
        height = compressed.height,
        bytes = compressed.bytes,
        "tongue photo stored"
    );

    Ok(Json(StoredImageRes {
        tongue_image: compressed.data_url.into_inner(),
        quality: compressed.quality,
        width: compressed.width,
        height: compressed.height,
        bytes: compressed.bytes,
    }))
}

#[utoipa::path(
    get,
    path = "/api/session",
    responses(
        (status = 200, description = "Current slot contents", body = SessionSnapshot)
    )
)]
/// Reads both session slots, as the results screen does.
#[axum::debug_handler]
pub async fn get_session(State(state): State<AppState>) -> Result<Json<SessionSnapshot>, ApiError> {
    Ok(Json(SessionSnapshot {
        user_feeling: state.sessions.user_feeling()?,
        tongue_image: state.sessions.tongue_image()?,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/session",
    responses(
        (status = 204, description = "Both slots cleared")
    )
)]
/// Clears both slots. The "start over" action.
#[axum::debug_handler]
pub async fn clear_session(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.sessions.clear()?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{limit::RateLimiter, router};
    use advisor_core::prompt::ChatRequest;
    use advisor_core::provider::CompletionBackend;
    use advisor_core::{AdvisorError, AdvisorResult, AnalysisService, SessionStore};
    use advisor_imaging::ImageCompressor;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header::CONTENT_TYPE, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;
    use tower::ServiceExt;

    struct RecordingBackend {
        calls: AtomicUsize,
        result: AdvisorResult<Value>,
    }

    impl RecordingBackend {
        fn returning(result: Value) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                result: Ok(result),
            })
        }

        fn failing(status: u16, detail: &str) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                result: Err(AdvisorError::Provider {
                    status,
                    detail: detail.into(),
                }),
            })
        }
    }

    #[async_trait]
    impl CompletionBackend for RecordingBackend {
        async fn complete(&self, _request: &ChatRequest) -> AdvisorResult<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.result {
                Ok(value) => Ok(value.clone()),
                Err(AdvisorError::Provider { status, detail }) => Err(AdvisorError::Provider {
                    status: *status,
                    detail: detail.clone(),
                }),
                Err(_) => unreachable!("test backend only fails with Provider errors"),
            }
        }
    }

    struct TestApp {
        _data_dir: TempDir,
        backend: Arc<RecordingBackend>,
        state: AppState,
    }

    fn test_app(backend: Arc<RecordingBackend>) -> TestApp {
        let data_dir = TempDir::new().expect("tempdir");
        let state = AppState {
            sessions: Arc::new(SessionStore::new(data_dir.path()).expect("store")),
            analysis: AnalysisService::with_backend("test-model", backend.clone()),
            compressor: ImageCompressor::new(),
            limiter: Arc::new(RateLimiter::new()),
            allowed_origins: vec!["http://localhost:5173".into()],
        };
        TestApp {
            _data_dir: data_dir,
            backend,
            state,
        }
    }

    async fn send_json(app: &TestApp, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = router(app.state.clone())
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn sample_report() -> Value {
        json!({
            "patientOverview": {
                "primaryConcerns": "风寒咳嗽",
                "tongueAnalysis": "舌苔白厚",
                "recommendationBasis": "散寒止咳"
            },
            "herbalFormula": {
                "emperor": {"herb": "Ephedra", "traditional_name": "麻黄", "role": "君", "specific_benefits": "宣肺"},
                "minister": {"herb": "Cinnamon", "traditional_name": "桂枝", "role": "臣", "specific_benefits": "温经"},
                "assistant": {"herb": "Apricot kernel", "traditional_name": "杏仁", "role": "佐", "specific_benefits": "降气"},
                "courier": {"herb": "Licorice", "traditional_name": "甘草", "role": "使", "specific_benefits": "调和"}
            }
        })
    }

    fn sample_png() -> Vec<u8> {
        use image::{DynamicImage, ImageFormat, RgbImage};
        use std::io::Cursor;
        let img = RgbImage::from_fn(64, 48, |x, y| image::Rgb([x as u8, y as u8, 128]));
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[tokio::test]
    async fn health_and_status_report_liveness() {
        let app = test_app(RecordingBackend::returning(json!({})));
        let (status, body) = send_json(&app, "GET", "/health", Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, body) = send_json(&app, "GET", "/api/status", Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "API is operational");
    }

    #[tokio::test]
    async fn missing_image_is_rejected_without_a_provider_call() {
        let app = test_app(RecordingBackend::returning(sample_report()));
        let (status, body) = send_json(
            &app,
            "POST",
            "/api/analyze",
            json!({"userFeeling": "咳嗽", "tongueImage": ""}),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["message"],
            "Missing required information (userFeeling or tongueImage)"
        );
        assert_eq!(app.backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn absent_image_key_gets_the_same_rejection_as_an_empty_one() {
        let app = test_app(RecordingBackend::returning(sample_report()));
        let (status, body) =
            send_json(&app, "POST", "/api/analyze", json!({"userFeeling": "咳嗽"})).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["message"],
            "Missing required information (userFeeling or tongueImage)"
        );
        assert_eq!(app.backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn malformed_body_gets_the_message_envelope() {
        let app = test_app(RecordingBackend::returning(sample_report()));
        let response = router(app.state.clone())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/analyze")
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["message"].is_string());
        assert_eq!(app.backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_feeling_is_rejected_without_a_provider_call() {
        let app = test_app(RecordingBackend::returning(sample_report()));
        let (status, _) = send_json(
            &app,
            "POST",
            "/api/analyze",
            json!({"userFeeling": "   ", "tongueImage": "data:image/jpeg;base64,Zm9v"}),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(app.backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn analyze_passes_provider_json_through_verbatim() {
        let report = sample_report();
        let app = test_app(RecordingBackend::returning(report.clone()));
        let (status, body) = send_json(
            &app,
            "POST",
            "/api/analyze",
            json!({"userFeeling": "咳嗽", "tongueImage": "data:image/jpeg;base64,Zm9v"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, report);
        assert_eq!(app.backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn provider_failure_becomes_a_bad_gateway_with_detail() {
        let app = test_app(RecordingBackend::failing(500, "model overloaded"));
        let (status, body) = send_json(
            &app,
            "POST",
            "/api/analyze",
            json!({"userFeeling": "咳嗽", "tongueImage": "data:image/jpeg;base64,Zm9v"}),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["message"]
            .as_str()
            .unwrap()
            .contains("model overloaded"));
    }

    #[tokio::test]
    async fn session_flow_stores_compresses_and_clears() {
        let app = test_app(RecordingBackend::returning(json!({})));

        let (status, _) = send_json(
            &app,
            "POST",
            "/api/session/feeling",
            json!({"userFeeling": "头晕"}),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let response = router(app.state.clone())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/session/tongue-image")
                    .header(CONTENT_TYPE, "application/octet-stream")
                    .body(Body::from(sample_png()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let stored: Value = serde_json::from_slice(&bytes).unwrap();
        assert!(stored["tongueImage"]
            .as_str()
            .unwrap()
            .starts_with("data:image/jpeg;base64,"));
        assert_eq!(stored["width"], 64);
        assert_eq!(stored["height"], 48);

        let (status, snapshot) = send_json(&app, "GET", "/api/session", Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(snapshot["userFeeling"], "头晕");
        assert_eq!(snapshot["tongueImage"], stored["tongueImage"]);

        let (status, _) = send_json(&app, "DELETE", "/api/session", Value::Null).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, snapshot) = send_json(&app, "GET", "/api/session", Value::Null).await;
        assert_eq!(snapshot["userFeeling"], Value::Null);
        assert_eq!(snapshot["tongueImage"], Value::Null);
    }

    #[tokio::test]
    async fn data_url_photo_body_is_recompressed_and_stored() {
        use base64::{engine::general_purpose::STANDARD, Engine as _};

        let app = test_app(RecordingBackend::returning(json!({})));
        let body = format!("data:image/png;base64,{}", STANDARD.encode(sample_png()));
        let response = router(app.state.clone())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/session/tongue-image")
                    .header(CONTENT_TYPE, "text/plain")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let stored: Value = serde_json::from_slice(&bytes).unwrap();
        assert!(stored["tongueImage"]
            .as_str()
            .unwrap()
            .starts_with("data:image/jpeg;base64,"));
        assert_eq!(stored["width"], 64);
        assert_eq!(stored["height"], 48);

        let (_, snapshot) = send_json(&app, "GET", "/api/session", Value::Null).await;
        assert_eq!(snapshot["tongueImage"], stored["tongueImage"]);
    }

    #[tokio::test]
    async fn undecodable_photo_is_a_client_error() {
        let app = test_app(RecordingBackend::returning(json!({})));
        let response = router(app.state.clone())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/session/tongue-image")
                    .header(CONTENT_TYPE, "application/octet-stream")
                    .body(Body::from(&b"not an image"[..]))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rate_limit_rejects_after_the_cap() {
        let mut app = test_app(RecordingBackend::returning(json!({})));
        app.state.limiter = Arc::new(RateLimiter::with_limits(Duration::from_secs(60), 2));

        for _ in 0..2 {
            let (status, _) = send_json(&app, "GET", "/health", Value::Null).await;
            assert_eq!(status, StatusCode::OK);
        }
        let (status, body) = send_json(&app, "GET", "/health", Value::Null).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert!(body["message"].as_str().unwrap().contains("Too many"));
    }
}
