use anyhow::Result;
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::{ExportConfig, WithExportConfig};

mod image_scans;
pub(crate) use image_scans::record_image_scan;
mod reviews_total;
pub(crate) use reviews_total::{add_review, Review};

const METER_NAME: &str = "image-scan-server";

/// Export metrics to an OpenTelemetry collector using OTLP over gRPC.
/// The collector endpoint is taken from the standard `OTEL_EXPORTER_OTLP_*`
/// environment variables.
pub fn setup_metrics() -> Result<()> {
    let metric_exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_tonic()
        .with_export_config(ExportConfig::default())
        .build()?;

    let periodic_reader =
        opentelemetry_sdk::metrics::PeriodicReader::builder(metric_exporter).build();
    let meter_provider = opentelemetry_sdk::metrics::SdkMeterProvider::builder()
        .with_reader(periodic_reader)
        .build();

    global::set_meter_provider(meter_provider);
    Ok(())
}

pub trait ImageScanMetric: Into<Vec<KeyValue>> {}
