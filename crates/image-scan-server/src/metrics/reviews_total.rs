use lazy_static::lazy_static;
use opentelemetry::{metrics::Counter, KeyValue};

use super::ImageScanMetric;

lazy_static! {
    static ref REVIEWS_TOTAL: Counter<u64> = opentelemetry::global::meter(super::METER_NAME)
        .u64_counter("image_scan_reviews_total")
        .build();
}

pub(crate) struct Review {
    pub(crate) endpoint: &'static str,
    pub(crate) allowed: bool,
    pub(crate) rejected_images: usize,
}

impl ImageScanMetric for &Review {}

#[allow(clippy::from_over_into)]
impl Into<Vec<KeyValue>> for &Review {
    fn into(self) -> Vec<KeyValue> {
        vec![
            KeyValue::new("endpoint", self.endpoint),
            KeyValue::new("allowed", self.allowed),
            KeyValue::new(
                "rejected_images",
                i64::try_from(self.rejected_images).unwrap_or(i64::MAX),
            ),
        ]
    }
}

pub(crate) fn add_review(review: impl ImageScanMetric) {
    REVIEWS_TOTAL.add(1, &Into::<Vec<KeyValue>>::into(review));
}
