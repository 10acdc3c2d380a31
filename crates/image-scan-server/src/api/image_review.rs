use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::review::{ReviewDecision, ReviewRequest};

pub const IMAGE_REVIEW_API_VERSION: &str = "imagepolicy.k8s.io/v1alpha1";
pub const IMAGE_REVIEW_KIND: &str = "ImageReview";

/// Body of a `POST /scan` request, as sent by the ImagePolicyWebhook
/// admission controller.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageReviewRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default)]
    pub spec: ImageReviewSpec,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageReviewSpec {
    pub containers: Vec<ImageReviewContainerSpec>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageReviewContainerSpec {
    pub image: String,
}

impl From<ImageReviewRequest> for ReviewRequest {
    fn from(image_review: ImageReviewRequest) -> Self {
        ReviewRequest {
            uid: None,
            images: image_review
                .spec
                .containers
                .into_iter()
                .map(|container| container.image)
                .collect(),
            namespace: image_review.spec.namespace,
            annotations: image_review.spec.annotations,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageReviewResponse {
    pub api_version: String,
    pub kind: String,
    pub status: ImageReviewStatus,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageReviewStatus {
    pub allowed: bool,
    pub reason: String,
}

impl ImageReviewResponse {
    pub fn new(decision: &ReviewDecision) -> Self {
        ImageReviewResponse {
            api_version: String::from(IMAGE_REVIEW_API_VERSION),
            kind: String::from(IMAGE_REVIEW_KIND),
            status: ImageReviewStatus {
                allowed: decision.allowed,
                reason: decision.message.clone(),
            },
        }
    }
}
