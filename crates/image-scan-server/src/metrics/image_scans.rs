use lazy_static::lazy_static;
use opentelemetry::{
    metrics::{Counter, Histogram},
    KeyValue,
};
use std::time::Duration;

use crate::policy::VerdictOutcome;

lazy_static! {
    static ref IMAGE_SCANS_TOTAL: Counter<u64> = opentelemetry::global::meter(super::METER_NAME)
        .u64_counter("image_scan_image_scans_total")
        .build();
    static ref IMAGE_SCAN_LATENCY: Histogram<u64> =
        opentelemetry::global::meter(super::METER_NAME)
            .u64_histogram("image_scan_image_scan_latency_milliseconds")
            .build();
}

pub(crate) fn record_image_scan(latency: Duration, outcome: &VerdictOutcome) {
    let attributes = [KeyValue::new("outcome", outcome.to_string())];
    let millis_latency = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);

    IMAGE_SCANS_TOTAL.add(1, &attributes);
    IMAGE_SCAN_LATENCY.record(millis_latency, &attributes);
}
