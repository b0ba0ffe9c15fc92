use std::sync::Arc;

use tracing::{error, info, warn};

use crate::clients::{ClientPool, HttpFetcher};
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::extractors::{self, FilterConfig, PageFetcher};
use crate::models::{RawListing, Shop, UnifiedRecord};
use crate::normalize::normalize;

/// Fans extraction out across shops and merges the results into one
/// deterministic, normalized record set.
pub struct ScrapeService {
    settings: Settings,
    fetcher: Arc<dyn PageFetcher>,
}

impl ScrapeService {
    pub fn new(settings: Settings) -> Result<Self> {
        let pool = Arc::new(ClientPool::new(&settings.http)?);
        let fetcher: Arc<dyn PageFetcher> =
            Arc::new(HttpFetcher::new(pool, settings.scraper.page_delay_ms));
        Ok(Self { settings, fetcher })
    }

    /// Injection point for fixture fetchers.
    pub fn with_fetcher(settings: Settings, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { settings, fetcher }
    }

    /// Runs the selected shops concurrently, one task per shop with no
    /// shared mutable state. A failing shop logs a warning and
    /// contributes zero listings; the merge restores canonical shop
    /// order regardless of completion order. Errors only when nothing
    /// at all was produced.
    pub async fn run(&self, shops: &[Shop], filters: &FilterConfig) -> Result<Vec<UnifiedRecord>> {
        let mut handles = Vec::with_capacity(shops.len());
        for &shop in shops {
            let fetcher = Arc::clone(&self.fetcher);
            let settings = self.settings.clone();
            let filters = filters.clone();
            handles.push((
                shop,
                tokio::spawn(async move {
                    let extractor = extractors::for_shop(shop, &settings);
                    extractor.extract(&*fetcher, &filters).await
                }),
            ));
        }

        let mut by_shop: Vec<(Shop, Vec<RawListing>)> = Vec::new();
        for (shop, handle) in handles {
            match handle.await {
                Ok(Ok(listings)) => {
                    info!(shop = %shop, listings = listings.len(), "Shop extraction finished");
                    by_shop.push((shop, listings));
                }
                Ok(Err(e)) => {
                    warn!(
                        shop = %shop,
                        error = %e,
                        "Shop extraction failed, contributing zero listings"
                    );
                }
                Err(e) => {
                    error!(shop = %shop, error = %e, "Shop extraction task aborted");
                }
            }
        }

        by_shop.sort_by_key(|(shop, _)| *shop);

        let mut records = Vec::new();
        for (_, listings) in by_shop {
            records.extend(normalize(listings, &self.settings.scraper));
        }

        if records.is_empty() {
            return Err(Error::NoData);
        }
        Ok(records)
    }
}
