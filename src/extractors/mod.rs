pub mod burosports;
pub mod megasport;
pub mod snowmania;
pub mod xtreme;

use async_trait::async_trait;

use crate::config::Settings;
use crate::error::Result;
use crate::models::{RawListing, Shop};

/// Price band and item cap handed to every extractor. `max_items` is
/// the `--test` cap and also bounds how many product pages a crawl
/// will fetch.
#[derive(Debug, Clone, Default)]
pub struct FilterConfig {
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub max_items: Option<usize>,
}

impl FilterConfig {
    pub fn admits(&self, price: f64) -> bool {
        if self.min_price.is_some_and(|min| price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| price > max) {
            return false;
        }
        true
    }
}

/// The seam between extraction and the network: extractors only ever
/// see fetched payloads, so they run unchanged against fixture pages.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// One storefront's layout knowledge. Implementations walk their
/// category pages through the fetcher and return raw listings with
/// prices already coerced and filters applied. They fail soft: a
/// malformed product page is skipped with a warning, never propagated.
#[async_trait]
pub trait ShopExtractor: Send + Sync {
    fn shop(&self) -> Shop;

    async fn extract(
        &self,
        fetcher: &dyn PageFetcher,
        filters: &FilterConfig,
    ) -> Result<Vec<RawListing>>;
}

pub fn for_shop(shop: Shop, settings: &Settings) -> Box<dyn ShopExtractor> {
    match shop {
        Shop::Xtreme => Box::new(xtreme::XtremeExtractor::new(settings.clone())),
        Shop::Snowmania => Box::new(snowmania::SnowmaniaExtractor::new()),
        Shop::Burosports => Box::new(burosports::BurosportsExtractor::new(settings.clone())),
        Shop::Megasport => Box::new(megasport::MegasportExtractor::new(settings.clone())),
    }
}

/// Applies the price band and item cap. Listings without any price are
/// passed through; the normalizer drops and logs them with context.
pub fn apply_filters(listings: Vec<RawListing>, filters: &FilterConfig) -> Vec<RawListing> {
    let mut kept: Vec<RawListing> = listings
        .into_iter()
        .filter(|l| match l.price.or(l.orig_price) {
            Some(price) => filters.admits(price),
            None => true,
        })
        .collect();
    if let Some(cap) = filters.max_items {
        kept.truncate(cap);
    }
    kept
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;

    use async_trait::async_trait;

    use crate::error::{Error, Result};

    use super::PageFetcher;

    /// In-memory fetcher serving fixture pages; unknown URLs 404.
    pub struct FixtureFetcher {
        pages: HashMap<String, String>,
    }

    impl FixtureFetcher {
        pub fn new(pages: &[(&str, &str)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(url, body)| (url.to_string(), body.to_string()))
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl PageFetcher for FixtureFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.pages
                .get(url)
                .cloned()
                .ok_or(Error::PageNotFound)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Condition;

    fn listing(price: Option<f64>) -> RawListing {
        RawListing {
            shop: Shop::Xtreme,
            url: "https://example.test".to_string(),
            title: "Atomic Redster".to_string(),
            brand: None,
            model: None,
            condition: Condition::New,
            orig_price: None,
            price,
            sizes: vec!["170".to_string()],
        }
    }

    #[test]
    fn price_band_is_inclusive() {
        let filters = FilterConfig {
            min_price: Some(150.0),
            max_price: Some(190.0),
            max_items: None,
        };
        assert!(!filters.admits(149.99));
        assert!(filters.admits(150.0));
        assert!(filters.admits(190.0));
        assert!(!filters.admits(190.01));
    }

    #[test]
    fn filter_drops_out_of_band_and_caps_count() {
        let filters = FilterConfig {
            min_price: Some(150.0),
            max_price: Some(190.0),
            max_items: Some(2),
        };
        let listings = vec![
            listing(Some(100.0)),
            listing(Some(160.0)),
            listing(Some(170.0)),
            listing(Some(180.0)),
            listing(Some(200.0)),
        ];
        let kept = apply_filters(listings, &filters);
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|l| filters.admits(l.price.unwrap())));
    }

    #[test]
    fn priceless_listings_survive_filtering() {
        let filters = FilterConfig {
            min_price: Some(150.0),
            ..Default::default()
        };
        let kept = apply_filters(vec![listing(None)], &filters);
        assert_eq!(kept.len(), 1);
    }
}
