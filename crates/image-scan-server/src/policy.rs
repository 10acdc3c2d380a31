use std::{fmt, sync::Arc};

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::{
    metrics,
    scanner::{ImageScanner, ScanReport},
};

/// An image with this many CRITICAL vulnerabilities, or more, is rejected.
pub const CRITICAL_VULNERABILITY_THRESHOLD: usize = 3;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerdictOutcome {
    Secure { critical: usize },
    Insecure { critical: usize },
    /// The scan could not produce a trustworthy count
    Unverified { reason: String },
}

impl fmt::Display for VerdictOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            VerdictOutcome::Secure { .. } => write!(f, "secure"),
            VerdictOutcome::Insecure { .. } => write!(f, "insecure"),
            VerdictOutcome::Unverified { .. } => write!(f, "unverified"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SecurityVerdict {
    pub image: String,
    pub outcome: VerdictOutcome,
}

impl SecurityVerdict {
    pub fn is_secure(&self) -> bool {
        matches!(self.outcome, VerdictOutcome::Secure { .. })
    }
}

/// Classifies a single image as secure or not, failing closed: an image is
/// secure only when its scan succeeded and reported fewer CRITICAL
/// vulnerabilities than the threshold.
#[derive(Clone)]
pub struct SecurityPolicy {
    scanner: Arc<dyn ImageScanner>,
    threshold: usize,
}

impl SecurityPolicy {
    pub fn new(scanner: Arc<dyn ImageScanner>, threshold: usize) -> Self {
        SecurityPolicy { scanner, threshold }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub async fn is_secure(&self, image: &str) -> bool {
        self.evaluate(image).await.is_secure()
    }

    pub async fn evaluate(&self, image: &str) -> SecurityVerdict {
        let start_time = Instant::now();
        let outcome = self.outcome(image).await;
        metrics::record_image_scan(start_time.elapsed(), &outcome);

        SecurityVerdict {
            image: image.to_owned(),
            outcome,
        }
    }

    async fn outcome(&self, image: &str) -> VerdictOutcome {
        let raw = match self.scanner.scan(image).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(image, error = %e, "cannot scan image, considering it insecure");
                return VerdictOutcome::Unverified {
                    reason: e.to_string(),
                };
            }
        };

        let report = match ScanReport::from_slice(&raw) {
            Ok(report) => report,
            Err(e) => {
                warn!(image, error = %e, "cannot read scan report, considering it insecure");
                return VerdictOutcome::Unverified {
                    reason: e.to_string(),
                };
            }
        };

        for result in &report.results {
            debug!(
                image,
                target = result.target.as_deref().unwrap_or_default(),
                critical = result.vulnerabilities.len(),
                "scan target"
            );
        }

        let critical = report.critical_vulnerabilities();
        if critical >= self.threshold {
            info!(
                image,
                artifact = report.artifact_name.as_deref().unwrap_or(image),
                critical,
                threshold = self.threshold,
                vulnerabilities = ?report.findings(),
                "found critical vulnerabilities"
            );
            VerdictOutcome::Insecure { critical }
        } else {
            debug!(image, critical, "image is secure");
            VerdictOutcome::Secure { critical }
        }
    }
}
