use std::{
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};

use async_trait::async_trait;
use tokio::{process::Command, sync::Semaphore};
use tracing::{debug, info};

use super::{
    errors::{Result, ScanError},
    ImageScanner,
};

pub const DEFAULT_SCANNER_PATH: &str = "/usr/local/bin/trivy";

/// Runs the Trivy binary against a container image, asking only for
/// vulnerabilities of CRITICAL severity, in JSON format.
pub struct TrivyScanner {
    binary: PathBuf,
    timeout: Option<Duration>,
    permits: Semaphore,
}

impl TrivyScanner {
    /// Params:
    /// - `binary`: path to the scanner executable
    /// - `timeout`: when set, a scan running longer than this is killed
    /// - `max_concurrent_scans`: upper bound of scanner processes running at the same time
    pub fn new(
        binary: impl Into<PathBuf>,
        timeout: Option<Duration>,
        max_concurrent_scans: usize,
    ) -> Self {
        TrivyScanner {
            binary: binary.into(),
            timeout,
            permits: Semaphore::new(max_concurrent_scans.max(1)),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn command(&self, image: &str) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(scan_arguments(image))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // the child must not survive a timeout or a dropped request
            .kill_on_drop(true);
        cmd
    }

    fn command_line(&self, image: &str) -> String {
        std::iter::once(self.binary.display().to_string())
            .chain(scan_arguments(image).iter().map(|arg| arg.to_string()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

pub(crate) fn scan_arguments(image: &str) -> [&str; 8] {
    [
        "image",
        image,
        "--scanners",
        "vuln",
        "--format",
        "json",
        "--severity",
        "CRITICAL",
    ]
}

#[async_trait]
impl ImageScanner for TrivyScanner {
    async fn scan(&self, image: &str) -> Result<Vec<u8>> {
        if image.trim().is_empty() {
            return Err(ScanError::EmptyImageReference);
        }

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| ScanError::LimiterClosed)?;

        info!(command = self.command_line(image).as_str(), "running scanner");
        let mut cmd = self.command(image);
        let output = cmd.output();

        let output = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, output)
                .await
                .map_err(|_| ScanError::Timeout(timeout))?,
            None => output.await,
        }
        .map_err(|source| ScanError::Spawn {
            scanner: self.binary.display().to_string(),
            source,
        })?;

        if !output.status.success() {
            return Err(ScanError::Failed {
                exit_code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }

        debug!(image, bytes = output.stdout.len(), "scanner done");
        Ok(output.stdout)
    }
}
