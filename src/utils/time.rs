use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use rand::Rng;

/// Politeness delay between storefront requests, with jitter so the
/// crawl cadence does not look mechanical.
pub async fn sleep_with_jitter(base_ms: u64, jitter_ms: u64) {
    let jitter = rand::rng().random_range(0..=jitter_ms);
    tokio::time::sleep(Duration::from_millis(base_ms + jitter)).await;
}

/// Capture time stamped into snapshot filenames, minute precision.
pub fn capture_time() -> NaiveDateTime {
    Local::now().naive_local()
}
