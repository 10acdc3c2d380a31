pub mod api;
mod certs;
pub mod cli;
pub mod config;
pub mod metrics;
pub mod policy;
pub mod review;
pub mod scanner;
pub mod tracing;

use ::tracing::{info, warn};
use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::trace::TraceLayer;

use api::{
    handlers::{readiness_handler, scan_handler, validate_handler},
    state::ApiServerState,
};
use config::{Config, TlsConfig};
use policy::SecurityPolicy;
use review::ImageReviewer;
use scanner::{ImageScanner, TrivyScanner};

const GRACEFUL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

pub struct ImageScanServer {
    router: Router,
    addr: SocketAddr,
    tls_config: Option<TlsConfig>,
}

impl ImageScanServer {
    /// Build a server that scans images with the trivy binary referenced by
    /// the configuration.
    pub fn new_from_config(config: Config) -> Self {
        let scanner = TrivyScanner::new(
            config.scanner_path.clone(),
            config.scan_timeout,
            config.max_concurrent_scans,
        );
        info!(
            scanner = scanner.binary().display().to_string().as_str(),
            timeout = ?config.scan_timeout,
            max_concurrent_scans = config.max_concurrent_scans,
            "image scanner ready"
        );

        Self::new_with_scanner(config, Arc::new(scanner))
    }

    pub fn new_with_scanner(config: Config, scanner: Arc<dyn ImageScanner>) -> Self {
        let policy = SecurityPolicy::new(scanner, config.critical_vulnerability_threshold);
        let state = Arc::new(ApiServerState {
            reviewer: ImageReviewer::new(policy),
        });

        let router = Router::new()
            .route("/validate", post(validate_handler))
            .route("/scan", post(scan_handler))
            .route("/readiness", get(readiness_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http());

        Self {
            router,
            addr: config.addr,
            tls_config: config.tls_config,
        }
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve requests until a termination signal is received.
    pub async fn run(self) -> Result<()> {
        let handle = axum_server::Handle::new();
        tokio::spawn(shutdown_on_signal(handle.clone()));

        match self.tls_config {
            Some(tls_config) => {
                let rustls_config = certs::create_tls_config(&tls_config).await?;
                info!(address = self.addr.to_string().as_str(), "started HTTPS server");
                axum_server::bind_rustls(self.addr, rustls_config)
                    .handle(handle)
                    .serve(self.router.into_make_service())
                    .await?;
            }
            None => {
                info!(address = self.addr.to_string().as_str(), "started HTTP server");
                axum_server::bind(self.addr)
                    .handle(handle)
                    .serve(self.router.into_make_service())
                    .await?;
            }
        }

        info!("server stopped");
        Ok(())
    }
}

async fn shutdown_on_signal(handle: axum_server::Handle) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for the shutdown signal");
        return;
    }
    info!("shutdown signal received");
    handle.graceful_shutdown(Some(GRACEFUL_SHUTDOWN_TIMEOUT));
}
