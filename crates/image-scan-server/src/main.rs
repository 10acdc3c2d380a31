use anyhow::Result;
use image_scan_server::{
    cli, config::Config, metrics::setup_metrics, tracing::setup_tracing, ImageScanServer,
};
use tracing::{debug, info};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli::build_cli().get_matches();
    let config = Config::from_args(&matches)?;

    // Setup the tracing system. This MUST be done inside of a tokio Runtime
    // because some collectors rely on it and would panic otherwise.
    setup_tracing(&config.log_level, &config.log_fmt, config.log_no_color)?;
    debug!("tracing system ready");

    if config.metrics_enabled {
        setup_metrics()?;
        info!("metrics exporter ready");
    }

    let server = ImageScanServer::new_from_config(config);
    server.run().await?;

    Ok(())
}
