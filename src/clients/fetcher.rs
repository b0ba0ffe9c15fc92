use std::sync::Arc;

use async_trait::async_trait;

use crate::clients::ClientPool;
use crate::error::Result;
use crate::extractors::PageFetcher;
use crate::utils::{retry_with_backoff, sleep_with_jitter};

const MAX_RETRIES: u32 = 3;
const BASE_DELAY_MS: u64 = 1000;

/// Network-backed [`PageFetcher`]: rotates pooled clients, retries
/// transient failures with backoff, and paces requests with a jittered
/// politeness delay.
pub struct HttpFetcher {
    pool: Arc<ClientPool>,
    page_delay_ms: u64,
}

impl HttpFetcher {
    pub fn new(pool: Arc<ClientPool>, page_delay_ms: u64) -> Self {
        Self {
            pool,
            page_delay_ms,
        }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        if self.page_delay_ms > 0 {
            sleep_with_jitter(self.page_delay_ms, self.page_delay_ms / 2).await;
        }

        retry_with_backoff(MAX_RETRIES, BASE_DELAY_MS, || async {
            let client = self.pool.next_client();
            let response = client.send(client.get(url)).await?;
            let response = response.error_for_status()?;
            Ok(response.text().await?)
        })
        .await
    }
}
