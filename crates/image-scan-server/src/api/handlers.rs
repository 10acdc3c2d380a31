use axum::{
    extract::{self, FromRequest},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::{debug, Span};

use crate::{
    api::{
        admission_review::{AdmissionReviewRequest, AdmissionReviewResponse},
        api_error::ApiError,
        image_review::{ImageReviewRequest, ImageReviewResponse},
        state::ApiServerState,
    },
    review::{self, ReviewDecision, ReviewRequest},
};

// create an extractor that internally uses `axum::Json` but has a custom rejection
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub(crate) struct JsonExtractor<T>(T);

#[tracing::instrument(
    name = "validation",
    fields(
        request_uid=tracing::field::Empty,
        host=crate::config::HOSTNAME.as_str(),
        namespace=tracing::field::Empty,
        images=tracing::field::Empty,
        allowed=tracing::field::Empty,
        response_message=tracing::field::Empty,
    ),
    skip_all)]
/// Review the containers of an AdmissionReview.
pub(crate) async fn validate_handler(
    extract::State(state): extract::State<Arc<ApiServerState>>,
    JsonExtractor(admission_review): JsonExtractor<AdmissionReviewRequest>,
) -> Json<AdmissionReviewResponse> {
    let admission_request = admission_review.admission_request();
    debug!(
        operation = admission_request.operation.as_deref().unwrap_or_default(),
        name = admission_request.name.as_deref().unwrap_or_default(),
        "admission request received"
    );

    let review_request = ReviewRequest::from(admission_review);
    populate_span_with_review_request(&review_request);

    let decision = state.reviewer.review(review_request).await;
    populate_span_with_review_decision(&decision);
    review::record_decision("validate", &decision);

    Json(AdmissionReviewResponse::new(&decision))
}

#[tracing::instrument(
    name = "image_review",
    fields(
        host=crate::config::HOSTNAME.as_str(),
        namespace=tracing::field::Empty,
        images=tracing::field::Empty,
        allowed=tracing::field::Empty,
        response_message=tracing::field::Empty,
    ),
    skip_all)]
/// Review the containers of an ImageReview.
pub(crate) async fn scan_handler(
    extract::State(state): extract::State<Arc<ApiServerState>>,
    JsonExtractor(image_review): JsonExtractor<ImageReviewRequest>,
) -> Json<ImageReviewResponse> {
    debug!(image_review = ?image_review);

    let review_request = ReviewRequest::from(image_review);
    populate_span_with_review_request(&review_request);

    let decision = state.reviewer.review(review_request).await;
    populate_span_with_review_decision(&decision);
    review::record_decision("scan", &decision);

    Json(ImageReviewResponse::new(&decision))
}

pub(crate) async fn readiness_handler() -> StatusCode {
    StatusCode::OK
}

fn populate_span_with_review_request(review_request: &ReviewRequest) {
    if let Some(uid) = &review_request.uid {
        Span::current().record("request_uid", uid.as_str());
    }
    Span::current().record(
        "namespace",
        review_request.namespace.clone().unwrap_or_default().as_str(),
    );
    Span::current().record(
        "images",
        format!("{:?}", review_request.images).as_str(),
    );
}

fn populate_span_with_review_decision(decision: &ReviewDecision) {
    Span::current().record("allowed", decision.allowed);
    Span::current().record("response_message", decision.message.as_str());
}
