use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::review::{ReviewDecision, ReviewRequest};

pub const ADMISSION_REVIEW_API_VERSION: &str = "admission.k8s.io/v1";
pub const ADMISSION_REVIEW_KIND: &str = "AdmissionReview";

/// Body of a `POST /validate` request.
///
/// Both the standard Kubernetes envelope, where the request lives under the
/// `request` key, and the bare form, where `uid` and `object` sit at the top
/// level, are accepted. When `request` is present it wins.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReviewRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<AdmissionRequest>,

    #[serde(flatten)]
    pub inline_request: AdmissionRequest,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdmissionRequest {
    pub uid: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<PodObject>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PodObject {
    pub metadata: ObjectMeta,
    pub spec: PodSpec,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PodSpec {
    pub containers: Vec<Container>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Container {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub image: String,
}

impl AdmissionReviewRequest {
    pub fn admission_request(&self) -> &AdmissionRequest {
        self.request.as_ref().unwrap_or(&self.inline_request)
    }
}

impl From<AdmissionReviewRequest> for ReviewRequest {
    fn from(admission_review: AdmissionReviewRequest) -> Self {
        let admission_request = admission_review
            .request
            .unwrap_or(admission_review.inline_request);
        let object = admission_request.object.unwrap_or_default();

        ReviewRequest {
            uid: Some(admission_request.uid),
            images: object
                .spec
                .containers
                .into_iter()
                .map(|container| container.image)
                .collect(),
            namespace: admission_request.namespace.or(object.metadata.namespace),
            annotations: object.metadata.annotations,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReviewResponse {
    pub api_version: String,
    pub kind: String,
    pub response: AdmissionResponse,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionResponse {
    pub uid: String,
    pub allowed: bool,
    pub status: AdmissionResponseStatus,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionResponseStatus {
    pub message: String,
}

impl AdmissionReviewResponse {
    pub fn new(decision: &ReviewDecision) -> Self {
        AdmissionReviewResponse {
            api_version: String::from(ADMISSION_REVIEW_API_VERSION),
            kind: String::from(ADMISSION_REVIEW_KIND),
            response: AdmissionResponse {
                uid: decision.uid.clone(),
                allowed: decision.allowed,
                status: AdmissionResponseStatus {
                    message: decision.message.clone(),
                },
            },
        }
    }
}
