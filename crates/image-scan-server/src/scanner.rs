use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

pub mod errors;
pub mod report;
mod trivy;

pub use errors::ScanError;
pub use report::{count_critical_vulnerabilities, ScanReport};
pub use trivy::{TrivyScanner, DEFAULT_SCANNER_PATH};

/// An external vulnerability scanner.
///
/// Implementations return the raw report produced for `image`, the report
/// is decoded later by [`count_critical_vulnerabilities`].
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ImageScanner: Send + Sync {
    async fn scan(&self, image: &str) -> errors::Result<Vec<u8>>;
}
