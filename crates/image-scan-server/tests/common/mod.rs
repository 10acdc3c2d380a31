use async_trait::async_trait;
use axum::Router;
use image_scan_server::{
    config::Config,
    policy::CRITICAL_VULNERABILITY_THRESHOLD,
    scanner::{ImageScanner, ScanError},
    ImageScanServer,
};
use serde_json::json;
use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

/// Scanner that answers from a fixed table of images, without spawning
/// any process.
#[derive(Default)]
pub(crate) struct FakeScanner {
    reports: HashMap<String, Vec<u8>>,
    scans: AtomicUsize,
}

impl FakeScanner {
    pub(crate) fn with_image(mut self, image: &str, critical: usize) -> Self {
        self.reports
            .insert(image.to_owned(), report_with_vulnerabilities(image, critical));
        self
    }

    pub(crate) fn scans(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageScanner for FakeScanner {
    async fn scan(&self, image: &str) -> Result<Vec<u8>, ScanError> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        self.reports
            .get(image)
            .cloned()
            .ok_or_else(|| ScanError::Failed {
                exit_code: Some(1),
                stderr: format!("unknown image {image}"),
            })
    }
}

pub(crate) fn report_with_vulnerabilities(image: &str, critical: usize) -> Vec<u8> {
    let vulnerabilities: Vec<_> = (0..critical)
        .map(|i| {
            json!({
                "VulnerabilityID": format!("CVE-2024-{:04}", i),
                "PkgName": "openssl",
                "Severity": "CRITICAL"
            })
        })
        .collect();

    serde_json::to_vec(&json!({
        "SchemaVersion": 2,
        "ArtifactName": image,
        "ArtifactType": "container_image",
        "Results": [
            {
                "Target": format!("{image} (debian 12.5)"),
                "Class": "os-pkgs",
                "Type": "debian",
                "Vulnerabilities": vulnerabilities
            }
        ]
    }))
    .unwrap()
}

/// Scanner with the images used by the end-to-end scenarios.
pub(crate) fn default_scanner() -> Arc<FakeScanner> {
    Arc::new(
        FakeScanner::default()
            .with_image("nginx:1.0", 0)
            .with_image("redis:7.2", 2)
            .with_image("vuln-image:1.0", 5),
    )
}

pub(crate) fn default_test_config() -> Config {
    Config {
        addr: SocketAddr::from(([127, 0, 0, 1], 3001)),
        tls_config: None,
        scanner_path: "trivy".into(),
        scan_timeout: Some(Duration::from_secs(5)),
        max_concurrent_scans: 2,
        critical_vulnerability_threshold: CRITICAL_VULNERABILITY_THRESHOLD,
        metrics_enabled: false,
        log_level: "info".to_owned(),
        log_fmt: "text".to_owned(),
        log_no_color: true,
    }
}

pub(crate) fn app(scanner: Arc<dyn ImageScanner>) -> Router {
    ImageScanServer::new_with_scanner(default_test_config(), scanner).router()
}
