use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScanError>;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("empty image reference")]
    EmptyImageReference,

    #[error("cannot start scanner {scanner}: {source}")]
    Spawn {
        scanner: String,
        #[source]
        source: std::io::Error,
    },

    #[error("scanner exited with {exit_code:?}: {stderr}")]
    Failed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("scan interrupted after {0:?}")]
    Timeout(Duration),

    #[error("cannot decode scan report: {0}")]
    InvalidReport(#[from] serde_json::Error),

    #[error("scan concurrency limiter closed")]
    LimiterClosed,
}
