//! Router tests driven through `tower::ServiceExt::oneshot`.

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use pretty_assertions::assert_eq;
use serde_json::Value;
use tower::ServiceExt;
use treeline_server::{AppConfig, build_router};

const BOUNDARY: &str = "treeline-test-boundary";
const CHURN_CSV: &[u8] = include_bytes!("fixtures/churn.csv");

// ============================================================================
// Helper Functions
// ============================================================================

struct Part<'a> {
    name: &'a str,
    file_name: Option<&'a str>,
    data: &'a [u8],
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        let disposition = match part.file_name {
            Some(file_name) => format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                part.name, file_name
            ),
            None => format!("Content-Disposition: form-data; name=\"{}\"\r\n", part.name),
        };
        body.extend_from_slice(disposition.as_bytes());
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn train_request(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    let body = multipart_body(parts);
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(header::CONTENT_LENGTH, body.len())
        .body(Body::from(body))
        .unwrap()
}

fn churn_parts(config: &str) -> Vec<Part<'_>> {
    vec![
        Part {
            name: "file",
            file_name: Some("churn.csv"),
            data: CHURN_CSV,
        },
        Part {
            name: "config",
            file_name: None,
            data: config.as_bytes(),
        },
    ]
}

fn app() -> Router {
    build_router(&AppConfig::default())
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

const BINARY_CONFIG: &str = r#"{
    "target_column": "label",
    "task_type": "binary_classification",
    "parameters": {"n_estimators": 10, "learning_rate": 0.3},
    "random_seed": 7
}"#;

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health() {
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(app(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

// ============================================================================
// Training
// ============================================================================

#[tokio::test]
async fn test_train_binary() {
    let (status, json) = send(app(), train_request("/train", &churn_parts(BINARY_CONFIG))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "success");
    assert_eq!(json["task_type"], "binary_classification");
    assert_eq!(json["feature_names"], serde_json::json!(["age", "city"]));
    assert_eq!(json["class_mapping"]["0"], "no");
    assert_eq!(json["class_mapping"]["1"], "yes");
    assert_eq!(json["feature_importance"].as_array().unwrap().len(), 2);

    let accuracy = json["metrics"]["test_accuracy"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&accuracy));

    let data = json["artifacts"]["model"]["data"].as_str().unwrap();
    let bytes = BASE64_STANDARD.decode(data).unwrap();
    assert!(!bytes.is_empty());
    assert!(json["artifacts"].get("client_module").is_none());
}

#[tokio::test]
async fn test_train_with_typescript_client() {
    let request = train_request("/train?client=typescript", &churn_parts(BINARY_CONFIG));
    let (status, json) = send(app(), request).await;

    assert_eq!(status, StatusCode::OK);
    let source = json["artifacts"]["client_module"].as_str().unwrap();
    assert!(source.contains(r#"export const FEATURES: readonly string[] = ["age","city"];"#));
}

#[tokio::test]
async fn test_train_regression() {
    let config = r#"{
        "target_column": "age",
        "task_type": "regression",
        "parameters": {"n_estimators": 5},
        "random_seed": 3
    }"#;
    let (status, json) = send(app(), train_request("/train", &churn_parts(config))).await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["class_mapping"].is_null());
    assert!(json["metrics"]["test_rmse"].as_f64().unwrap() >= 0.0);
}

// ============================================================================
// Error Mapping
// ============================================================================

#[tokio::test]
async fn test_missing_target_is_bad_request() {
    let config = r#"{"target_column": "churned", "task_type": "binary_classification"}"#;
    let (status, json) = send(app(), train_request("/train", &churn_parts(config))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "TARGET_NOT_FOUND");
    assert!(json["message"].as_str().unwrap().contains("churned"));
}

#[tokio::test]
async fn test_invalid_config_is_bad_request() {
    let config = r#"{"target_column": "label", "task_type": "clustering"}"#;
    let (status, json) = send(app(), train_request("/train", &churn_parts(config))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "INVALID_CONFIG");
}

#[tokio::test]
async fn test_missing_config_part() {
    let parts = [Part {
        name: "file",
        file_name: Some("churn.csv"),
        data: CHURN_CSV,
    }];
    let (status, json) = send(app(), train_request("/train", &parts)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
    assert!(json["message"].as_str().unwrap().contains("config"));
}

#[tokio::test]
async fn test_empty_upload_is_bad_request() {
    let parts = [
        Part {
            name: "file",
            file_name: Some("empty.csv"),
            data: b"",
        },
        Part {
            name: "config",
            file_name: None,
            data: BINARY_CONFIG.as_bytes(),
        },
    ];
    let (status, json) = send(app(), train_request("/train", &parts)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "INVALID_UPLOAD");
}

#[tokio::test]
async fn test_unknown_client_language() {
    let request = train_request("/train?client=cobol", &churn_parts(BINARY_CONFIG));
    let (status, json) = send(app(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "INVALID_CONFIG");
}

#[tokio::test]
async fn test_upload_over_limit_is_rejected() {
    let config = AppConfig {
        max_upload_bytes: 64,
        ..AppConfig::default()
    };
    let request = train_request("/train", &churn_parts(BINARY_CONFIG));
    let (status, _) = send(build_router(&config), request).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}
