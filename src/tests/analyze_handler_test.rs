// POST /api/analyze tests

use crate::services::analysis::AnalysisError;
use crate::tests::common::{MockCompletion, analyze_request, create_test_app, json_body};
use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_analyze_splits_sections() {
    let completion = MockCompletion::text(
        "GAP ANALYSIS:\nMissing logout flow.\n\nDESIGN CHECKLIST:\n[ ] Add logout button",
    );
    let app = create_test_app(completion.clone(), false);

    let body = json!({"content": "As a user I want to log in"}).to_string();
    let response = app.oneshot(analyze_request(body)).await.expect("Failed to make request");

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(
        body,
        json!({"gapAnalysis": "Missing logout flow.", "checklist": "[ ] Add logout button"})
    );
    assert_eq!(completion.calls(), 1);
}

#[tokio::test]
async fn test_analyze_whitespace_content_is_rejected_without_upstream_call() {
    let completion = MockCompletion::text("unused");
    let app = create_test_app(completion.clone(), false);

    let response = app
        .oneshot(analyze_request(json!({"content": "   "}).to_string()))
        .await
        .expect("Failed to make request");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["details"], "invalid_input");
    assert!(body["error"].as_str().unwrap().contains("content must not be empty"));
    assert_eq!(completion.calls(), 0);
}

#[tokio::test]
async fn test_analyze_non_text_block_is_shape_error() {
    let completion = MockCompletion::failing(|| {
        AnalysisError::UnexpectedResponseShape(
            "first content block is 'image', expected 'text'".to_string(),
        )
    });
    let app = create_test_app(completion, false);

    let response = app
        .oneshot(analyze_request(json!({"content": "Epic"}).to_string()))
        .await
        .expect("Failed to make request");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["details"], "unexpected_response_shape");
}

#[tokio::test]
async fn test_analyze_transport_error_is_wrapped_and_not_retried() {
    let completion = MockCompletion::failing(|| {
        AnalysisError::upstream("Connection failed: connection refused", None)
    });
    let app = create_test_app(completion.clone(), false);

    let response = app
        .oneshot(analyze_request(json!({"content": "Epic"}).to_string()))
        .await
        .expect("Failed to make request");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["details"], "upstream_error");
    assert_eq!(
        body["error"],
        "Completion service error: Connection failed: connection refused"
    );
    assert_eq!(completion.calls(), 1);
}

#[tokio::test]
async fn test_analyze_without_marker_returns_fallback_checklist() {
    let completion = MockCompletion::text("Just some notes.");
    let app = create_test_app(completion, false);

    let response = app
        .oneshot(analyze_request(json!({"content": "Epic"}).to_string()))
        .await
        .expect("Failed to make request");

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(
        body,
        json!({"gapAnalysis": "Just some notes.", "checklist": "No checklist generated"})
    );
}

#[tokio::test]
async fn test_analyze_missing_credential() {
    let completion = MockCompletion::failing(|| AnalysisError::MissingCredential);
    let app = create_test_app(completion, false);

    let response = app
        .oneshot(analyze_request(json!({"content": "Epic"}).to_string()))
        .await
        .expect("Failed to make request");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["details"], "missing_credential");
    assert_eq!(body["error"], "Completion service credential not configured");
}

#[tokio::test]
async fn test_analyze_internal_error_is_generic() {
    let completion = MockCompletion::failing(|| {
        AnalysisError::Internal("api_key=sk-ant-leaked in config dump".to_string())
    });
    let app = create_test_app(completion, false);

    let response = app
        .oneshot(analyze_request(json!({"content": "Epic"}).to_string()))
        .await
        .expect("Failed to make request");

    let body = json_body(response).await;
    assert_eq!(body["details"], "internal");
    assert_eq!(body["error"], "Failed to analyze document");
    assert!(!body.to_string().contains("sk-ant"));
}

#[tokio::test]
async fn test_analyze_malformed_bodies_use_error_shape() {
    for raw in ["", "{not json", "[]", r#"{"content": 12}"#, r#"{"other": "x"}"#] {
        let completion = MockCompletion::text("unused");
        let app = create_test_app(completion.clone(), false);

        let response = app
            .oneshot(analyze_request(raw.to_string()))
            .await
            .expect("Failed to make request");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR, "body: {}", raw);
        let body = json_body(response).await;
        assert_eq!(body["details"], "invalid_input", "body: {}", raw);
        assert!(body["error"].is_string());
        assert_eq!(completion.calls(), 0);
    }
}

#[tokio::test]
async fn test_analyze_oversized_body_uses_error_shape() {
    let completion = MockCompletion::text("unused");
    let app = create_test_app(completion.clone(), false);

    let body = json!({"content": "a".repeat(3 * 1024 * 1024)}).to_string();
    let response = app.oneshot(analyze_request(body)).await.expect("Failed to make request");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["details"], "invalid_input");
    assert!(body["error"].as_str().unwrap().contains("request body could not be read"));
    assert_eq!(completion.calls(), 0);
}

#[tokio::test]
async fn test_analyze_strict_status_codes() {
    let completion = MockCompletion::text("unused");
    let app = create_test_app(completion, true);

    let response = app
        .oneshot(analyze_request(json!({"content": ""}).to_string()))
        .await
        .expect("Failed to make request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let completion = MockCompletion::failing(|| AnalysisError::Timeout(60));
    let app = create_test_app(completion, true);

    let response = app
        .oneshot(analyze_request(json!({"content": "Epic"}).to_string()))
        .await
        .expect("Failed to make request");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["details"], "upstream_error");
    assert_eq!(body["error"], "Completion service timed out after 60s");
}
