use std::collections::BTreeMap;

use futures::future::join_all;
use tracing::{debug, info};

use crate::{metrics, policy::SecurityPolicy};

pub const ALL_CONTAINERS_SECURE_MESSAGE: &str = "All containers are secure";

/// The images a workload wants to run, with the metadata that came along with
/// them. Only the images take part in the decision.
#[derive(Clone, Debug, Default)]
pub struct ReviewRequest {
    pub uid: Option<String>,
    pub images: Vec<String>,
    pub namespace: Option<String>,
    pub annotations: BTreeMap<String, String>,
}

impl ReviewRequest {
    pub fn new(images: impl IntoIterator<Item = impl Into<String>>) -> Self {
        ReviewRequest {
            images: images.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReviewDecision {
    /// Correlation identifier of the review
    pub uid: String,
    pub allowed: bool,
    pub message: String,
    /// Images that failed the security policy, in request order
    pub rejected_images: Vec<String>,
}

/// Reviews all the images of a request against the [`SecurityPolicy`].
#[derive(Clone)]
pub struct ImageReviewer {
    policy: SecurityPolicy,
}

impl ImageReviewer {
    pub fn new(policy: SecurityPolicy) -> Self {
        ImageReviewer { policy }
    }

    /// Evaluate every image of the request. Images are scanned concurrently,
    /// the decision is taken once all of them are done. Duplicated images are
    /// scanned once per occurrence.
    pub async fn review(&self, request: ReviewRequest) -> ReviewDecision {
        let uid = match request.uid {
            Some(uid) if !uid.is_empty() => uid,
            _ => uuid::Uuid::new_v4().to_string(),
        };
        debug!(
            uid = uid.as_str(),
            images = ?request.images,
            namespace = request.namespace.as_deref().unwrap_or_default(),
            annotations = ?request.annotations,
            "reviewing images"
        );

        let verdicts = join_all(
            request
                .images
                .iter()
                .map(|image| self.policy.evaluate(image)),
        )
        .await;

        let rejected_images: Vec<String> = verdicts
            .into_iter()
            .filter(|verdict| !verdict.is_secure())
            .map(|verdict| verdict.image)
            .collect();

        let decision = if rejected_images.is_empty() {
            ReviewDecision {
                uid,
                allowed: true,
                message: ALL_CONTAINERS_SECURE_MESSAGE.to_owned(),
                rejected_images,
            }
        } else {
            ReviewDecision {
                uid,
                allowed: false,
                message: rejection_message(self.policy.threshold(), &rejected_images),
                rejected_images,
            }
        };

        info!(
            uid = decision.uid.as_str(),
            allowed = decision.allowed,
            rejected_images = ?decision.rejected_images,
            "review done"
        );

        decision
    }
}

fn rejection_message(threshold: usize, rejected_images: &[String]) -> String {
    format!(
        "More than {threshold} CRITICAL vulnerabilities, rejected: [{}]",
        rejected_images.join(" ")
    )
}

/// Record the outcome of a review served by `endpoint`
pub(crate) fn record_decision(endpoint: &'static str, decision: &ReviewDecision) {
    metrics::add_review(&metrics::Review {
        endpoint,
        allowed: decision.allowed,
        rejected_images: decision.rejected_images.len(),
    });
}
