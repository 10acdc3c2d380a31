mod common;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{self, header, Request, Response, StatusCode},
};
use http_body_util::BodyExt;
use image_scan_server::api::{
    admission_review::AdmissionReviewResponse, image_review::ImageReviewResponse,
};
use rstest::*;
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{app, default_scanner, FakeScanner};

fn post_request(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(http::Method::POST)
        .header(header::CONTENT_TYPE, "application/json")
        .uri(uri)
        .body(body.into())
        .unwrap()
}

fn validate_request(uid: &str, images: &[&str]) -> Request<Body> {
    let containers: Vec<Value> = images
        .iter()
        .enumerate()
        .map(|(i, image)| json!({"name": format!("container-{i}"), "image": image}))
        .collect();
    let body = json!({
        "uid": uid,
        "object": {
            "metadata": {"name": "web", "namespace": "default"},
            "spec": {"containers": containers}
        }
    });

    post_request("/validate", body.to_string())
}

async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

#[tokio::test]
async fn test_validate_secure_image() {
    let app = app(default_scanner());

    let response = app
        .oneshot(validate_request("hello", &["nginx:1.0"]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let admission_review_response: AdmissionReviewResponse =
        serde_json::from_slice(&body_bytes(response).await).unwrap();

    assert!(admission_review_response.response.allowed);
    assert_eq!(admission_review_response.response.uid, "hello");
    assert_eq!(
        admission_review_response.response.status.message,
        "All containers are secure"
    );
}

#[tokio::test]
async fn test_validate_vulnerable_image() {
    let app = app(default_scanner());

    let response = app
        .oneshot(validate_request("hello", &["vuln-image:1.0"]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let admission_review_response: AdmissionReviewResponse =
        serde_json::from_slice(&body_bytes(response).await).unwrap();

    assert!(!admission_review_response.response.allowed);
    assert!(admission_review_response
        .response
        .status
        .message
        .contains("vuln-image:1.0"));
}

#[tokio::test]
async fn test_validate_lists_only_insecure_images() {
    let app = app(default_scanner());

    let response = app
        .oneshot(validate_request("hello", &["nginx:1.0", "vuln-image:1.0"]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let admission_review_response: AdmissionReviewResponse =
        serde_json::from_slice(&body_bytes(response).await).unwrap();

    assert!(!admission_review_response.response.allowed);
    assert_eq!(
        admission_review_response.response.status.message,
        "More than 3 CRITICAL vulnerabilities, rejected: [vuln-image:1.0]"
    );
}

#[tokio::test]
async fn test_validate_kubernetes_envelope() {
    let app = app(default_scanner());

    let response = app
        .oneshot(post_request(
            "/validate",
            include_str!("data/pod_with_vulnerable_container.json"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let admission_review_response: AdmissionReviewResponse =
        serde_json::from_slice(&body_bytes(response).await).unwrap();

    assert_eq!(
        admission_review_response.response.uid,
        "1299d386-525b-4032-98ae-1949f69f9cfc"
    );
    assert!(!admission_review_response.response.allowed);
    assert_eq!(
        admission_review_response.response.status.message,
        "More than 3 CRITICAL vulnerabilities, rejected: [vuln-image:1.0]"
    );
}

#[tokio::test]
async fn test_validate_without_containers() {
    let scanner = default_scanner();
    let app = app(scanner.clone());

    let response = app.oneshot(validate_request("hello", &[])).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let admission_review_response: AdmissionReviewResponse =
        serde_json::from_slice(&body_bytes(response).await).unwrap();

    assert!(admission_review_response.response.allowed);
    assert_eq!(scanner.scans(), 0);
}

#[tokio::test]
async fn test_validate_scanner_failure_rejects_image() {
    let app = app(default_scanner());

    let response = app
        .oneshot(validate_request("hello", &["nginx:1.0", "not-in-registry:1.0"]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let admission_review_response: AdmissionReviewResponse =
        serde_json::from_slice(&body_bytes(response).await).unwrap();

    assert!(!admission_review_response.response.allowed);
    assert_eq!(
        admission_review_response.response.status.message,
        "More than 3 CRITICAL vulnerabilities, rejected: [not-in-registry:1.0]"
    );
}

#[tokio::test]
async fn test_validate_generates_missing_uid() {
    let app = app(default_scanner());

    let response = app
        .oneshot(validate_request("", &["nginx:1.0"]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let admission_review_response: AdmissionReviewResponse =
        serde_json::from_slice(&body_bytes(response).await).unwrap();

    assert!(uuid::Uuid::parse_str(&admission_review_response.response.uid).is_ok());
}

#[tokio::test]
async fn test_scan_image_review() {
    let app = app(default_scanner());

    let response = app
        .oneshot(post_request("/scan", include_str!("data/image_review.json")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let image_review_response: ImageReviewResponse =
        serde_json::from_slice(&body_bytes(response).await).unwrap();

    assert!(image_review_response.status.allowed);
    assert_eq!(
        image_review_response.status.reason,
        "All containers are secure"
    );
}

#[tokio::test]
async fn test_scan_rejects_vulnerable_image() {
    let app = app(default_scanner());
    let body = json!({
        "apiVersion": "imagepolicy.k8s.io/v1alpha1",
        "kind": "ImageReview",
        "spec": {"containers": [{"image": "vuln-image:1.0"}, {"image": "nginx:1.0"}]}
    });

    let response = app
        .oneshot(post_request("/scan", body.to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let image_review_response: ImageReviewResponse =
        serde_json::from_slice(&body_bytes(response).await).unwrap();

    assert!(!image_review_response.status.allowed);
    assert_eq!(
        image_review_response.status.reason,
        "More than 3 CRITICAL vulnerabilities, rejected: [vuln-image:1.0]"
    );
}

#[rstest]
#[case::validate(
    validate_request("hello", &["nginx:1.0"]),
    r#"{"apiVersion":"admission.k8s.io/v1","kind":"AdmissionReview","#
)]
#[case::scan(
    post_request("/scan", include_str!("data/image_review.json")),
    r#"{"apiVersion":"imagepolicy.k8s.io/v1alpha1","kind":"ImageReview","#
)]
#[tokio::test]
async fn test_response_schema(#[case] request: Request<Body>, #[case] expected_prefix: &str) {
    let app = app(default_scanner());

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );

    let body = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(
        body.starts_with(expected_prefix),
        "unexpected response body: {body}"
    );
}

#[rstest]
#[case::validate_malformed_json("/validate", "{\"uid\": \"hello\", \"object\": ")]
#[case::validate_wrong_types("/validate", r#"{"object": {"spec": {"containers": "nginx:1.0"}}}"#)]
#[case::validate_not_an_object("/validate", "[]")]
#[case::scan_malformed_json("/scan", "not json")]
#[case::scan_wrong_types("/scan", r#"{"spec": {"containers": [{"image": 1}]}}"#)]
#[tokio::test]
async fn test_bad_request(#[case] uri: &str, #[case] body: &'static str) {
    let scanner = default_scanner();
    let app = app(scanner.clone());

    let response = app.oneshot(post_request(uri, body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let error: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(error["error"].is_string(), "unexpected error body: {error}");
    assert_eq!(scanner.scans(), 0);
}

#[tokio::test]
async fn test_missing_content_type() {
    let app = app(default_scanner());

    let request = Request::builder()
        .method(http::Method::POST)
        .uri("/validate")
        .body(Body::from(r#"{"uid": "hello"}"#))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_identical_requests_get_identical_decisions() {
    let scanner = Arc::new(
        FakeScanner::default()
            .with_image("nginx:1.0", 0)
            .with_image("vuln-image:1.0", 3),
    );

    let mut decisions = Vec::new();
    for _ in 0..2 {
        let response = app(scanner.clone())
            .oneshot(validate_request("hello", &["nginx:1.0", "vuln-image:1.0"]))
            .await
            .unwrap();
        let admission_review_response: AdmissionReviewResponse =
            serde_json::from_slice(&body_bytes(response).await).unwrap();
        decisions.push(admission_review_response.response);
    }

    assert_eq!(decisions[0], decisions[1]);
    assert!(!decisions[0].allowed);
    assert_eq!(scanner.scans(), 4);
}

#[tokio::test]
async fn test_readiness() {
    let app = app(default_scanner());

    let request = Request::builder()
        .uri("/readiness")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_route() {
    let app = app(default_scanner());

    let response = app
        .oneshot(post_request("/validate/pod-privileged", "{}"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
