//! HTTPバックエンドのテスト
//!
//! axumのモックサーバーを立てて、レスポンスごとの解釈を検証

use axum::extract::Multipart;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use laundry_advisor::analyzer::{AnalysisBackend, HttpBackend};
use laundry_advisor_common::{AnalysisError, AnalysisOutcome, AnalysisRow, SelectedImage};
use reqwest::Url;
use serde_json::{json, Value};
use std::time::Duration;

async fn spawn_server(app: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    Url::parse(&format!("http://{}", addr)).unwrap()
}

/// 固定レスポンスを返すサーバー
async fn fixed_server(status: StatusCode, body: &'static str) -> HttpBackend {
    let app = Router::new().route("/analyze-label", post(move || async move { (status, body) }));
    let url = spawn_server(app).await;
    HttpBackend::new(url, None).unwrap()
}

fn label_image() -> SelectedImage {
    SelectedImage::new("label.png", "image/png", vec![0x89, b'P', b'N', b'G', 0, 1, 2, 3])
}

#[tokio::test]
async fn test_valid_label_is_accepted() {
    let backend = fixed_server(
        StatusCode::OK,
        r###"{"valid": true, "analysis": "## Washing\n• [Wash cold]\n## Drying\n• [Hang to dry]"}"###,
    )
    .await;

    let outcome = backend.analyze(&label_image()).await.unwrap();
    let AnalysisOutcome::Accepted(report) = outcome else {
        panic!("expected accepted outcome");
    };
    assert_eq!(
        report.rows(),
        vec![
            AnalysisRow::new("Washing", "Wash cold"),
            AnalysisRow::new("Drying", "Hang to dry"),
        ]
    );
}

#[tokio::test]
async fn test_invalid_label_is_rejected() {
    let backend = fixed_server(StatusCode::OK, r#"{"valid": false, "message": "Not a care label"}"#).await;

    let outcome = backend.analyze(&label_image()).await.unwrap();
    assert_eq!(outcome, AnalysisOutcome::Rejected { message: "Not a care label".into() });
}

#[tokio::test]
async fn test_falsy_valid_is_rejected() {
    let backend = fixed_server(StatusCode::OK, r#"{"valid": 0, "message": "Not a care label"}"#).await;

    let outcome = backend.analyze(&label_image()).await.unwrap();
    assert_eq!(outcome, AnalysisOutcome::Rejected { message: "Not a care label".into() });
}

#[tokio::test]
async fn test_unusable_instructions_fall_back_to_text() {
    let backend = fixed_server(
        StatusCode::OK,
        r###"{"valid": true, "analysis": "## Washing\n• [Wash cold]", "instructions": "n/a"}"###,
    )
    .await;

    let AnalysisOutcome::Accepted(report) = backend.analyze(&label_image()).await.unwrap() else {
        panic!("expected accepted outcome");
    };
    assert_eq!(report.rows(), vec![AnalysisRow::new("Washing", "Wash cold")]);
}

#[tokio::test]
async fn test_error_detail_is_surfaced_verbatim() {
    let backend = fixed_server(StatusCode::BAD_REQUEST, r#"{"detail": "bad image"}"#).await;

    let err = backend.analyze(&label_image()).await.unwrap_err();
    assert_eq!(err.to_string(), "bad image");
    assert_eq!(err.status(), Some(400));
}

#[tokio::test]
async fn test_error_without_body_mentions_status() {
    let backend = fixed_server(StatusCode::INTERNAL_SERVER_ERROR, "").await;

    let err = backend.analyze(&label_image()).await.unwrap_err();
    assert!(err.to_string().contains("500"), "message: {}", err);
}

#[tokio::test]
async fn test_valid_without_analysis_is_malformed() {
    let backend = fixed_server(StatusCode::OK, r#"{"valid": true}"#).await;

    let err = backend.analyze(&label_image()).await.unwrap_err();
    assert_eq!(err, AnalysisError::Malformed("No analysis received from server".into()));
}

#[tokio::test]
async fn test_non_json_success_is_malformed() {
    let backend = fixed_server(StatusCode::OK, "<html>proxy page</html>").await;

    let err = backend.analyze(&label_image()).await.unwrap_err();
    assert!(matches!(err, AnalysisError::Malformed(_)));
}

#[tokio::test]
async fn test_multipart_upload_shape() {
    async fn echo_upload(mut multipart: Multipart) -> Json<Value> {
        let mut summary = String::new();
        while let Some(field) = multipart.next_field().await.unwrap() {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().unwrap_or_default().to_string();
            let len = field.bytes().await.unwrap().len();
            summary = format!("{}|{}|{}|{}", name, file_name, content_type, len);
        }
        Json(json!({ "valid": true, "analysis": format!("## Upload\n• [{}]", summary) }))
    }

    let app = Router::new().route("/analyze-label", post(echo_upload));
    let backend = HttpBackend::new(spawn_server(app).await, None).unwrap();

    let AnalysisOutcome::Accepted(report) = backend.analyze(&label_image()).await.unwrap() else {
        panic!("expected accepted outcome");
    };
    assert_eq!(report.rows()[0].instruction, "file|label.png|image/png|8");
}

#[tokio::test]
async fn test_base_url_path_is_kept() {
    let api = Router::new().route(
        "/analyze-label",
        post(|| async { Json(json!({ "valid": true, "analysis": "## Ironing\n• [Low heat]" })) }),
    );
    let app = Router::new().nest("/api", api);
    let url = spawn_server(app).await.join("api").unwrap();
    let backend = HttpBackend::new(url, None).unwrap();

    let outcome = backend.analyze(&label_image()).await.unwrap();
    assert!(matches!(outcome, AnalysisOutcome::Accepted(_)));
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let url = Url::parse(&format!("http://{}", addr)).unwrap();
    let backend = HttpBackend::new(url, None).unwrap();

    let err = backend.analyze(&label_image()).await.unwrap_err();
    assert!(matches!(err, AnalysisError::Transport(_)));
}

#[tokio::test]
async fn test_timeout_is_transport_error() {
    let app = Router::new().route(
        "/analyze-label",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            "late"
        }),
    );
    let url = spawn_server(app).await;
    let backend = HttpBackend::new(url, Some(Duration::from_millis(100))).unwrap();

    let err = backend.analyze(&label_image()).await.unwrap_err();
    assert_eq!(err, AnalysisError::Transport("request timed out".into()));
}

#[tokio::test]
async fn test_health_check() {
    let app = Router::new().route("/health", get(|| async { Json(json!({ "status": "healthy" })) }));
    let backend = HttpBackend::new(spawn_server(app).await, None).unwrap();

    let health = backend.health().await.unwrap();
    assert!(health.is_healthy());
}

#[tokio::test]
async fn test_health_check_failure() {
    let app = Router::new().route(
        "/health",
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "detail": "warming up" }))) }),
    );
    let backend = HttpBackend::new(spawn_server(app).await, None).unwrap();

    let err = backend.health().await.unwrap_err();
    assert_eq!(err.to_string(), "warming up");
}
