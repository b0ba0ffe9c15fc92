//! xtreme.ge: Odoo storefront. Category pages carry product cards;
//! brand, model, prices and the size badges live on the product page.

use std::collections::HashSet;
use std::sync::LazyLock;

use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::models::{Condition, RawListing, Shop};
use crate::parse;

use super::{FilterConfig, PageFetcher, ShopExtractor, apply_filters};

const BASE_URL: &str = "https://www.xtreme.ge/en/shop/category/ski-skis-2";

static CARD: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.oe_product").expect("valid selector"));
static CARD_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.oe_product_image_link").expect("valid selector"));
static CARD_LINK_FALLBACK: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("h6.o_wsale_products_item_title a").expect("valid selector")
});
static BRAND: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("h1.o_wsale_product_page_title .brand-name-detail span")
        .expect("valid selector")
});
static MODEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("h1.o_wsale_product_page_title .product-name-detail span")
        .expect("valid selector")
});
static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").expect("valid selector"));
static PRICE_CURRENT: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div.product_price span.oe_price.text-danger").expect("valid selector")
});
static PRICE_OLD: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div.product_price span.oe_price.text-muted").expect("valid selector")
});
static PRICE_ANY: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div.product_price span.oe_price").expect("valid selector")
});
static PRICE_ITEMPROP: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span[itemprop='price']").expect("valid selector"));
static SIZE_MAIN: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div.main-product-sizes-grid span.main-size-badge").expect("valid selector")
});
static SIZE_ALT: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div.alternative-product-sizes-grid span.alternative-size-badge-clickable")
        .expect("valid selector")
});

pub struct XtremeExtractor {
    settings: Settings,
}

impl XtremeExtractor {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }
}

fn element_text(el: scraper::ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Absolute, query-stripped product URL so re-crawls key identically.
fn clean_url(href: &str) -> Option<String> {
    let base = Url::parse(BASE_URL).ok()?;
    let mut joined = base.join(href).ok()?;
    joined.set_query(None);
    joined.set_fragment(None);
    Some(joined.to_string())
}

/// Product links on one category page, deduplicated and sorted.
pub fn product_links(page: &str) -> Vec<String> {
    let document = Html::parse_document(page);
    let mut links: Vec<String> = Vec::new();

    for card in document.select(&CARD) {
        let anchor = card
            .select(&CARD_LINK)
            .next()
            .or_else(|| card.select(&CARD_LINK_FALLBACK).next());
        let Some(href) = anchor.and_then(|a| a.value().attr("href")) else {
            continue;
        };
        if let Some(url) = clean_url(href) {
            links.push(url);
        }
    }

    links.sort();
    links.dedup();
    links
}

/// Parses one product page into a raw listing. Returns None when the
/// page has no recognizable title block.
pub fn parse_product(page: &str, url: &str, brands: &[String]) -> Option<RawListing> {
    let document = Html::parse_document(page);

    let brand_tag = document.select(&BRAND).next().map(element_text);
    let model_tag = document.select(&MODEL).next().map(element_text);

    let (title, brand, model) = match (brand_tag, model_tag) {
        (Some(brand), Some(model)) if !brand.is_empty() || !model.is_empty() => {
            let title = format!("{brand} {model}").trim().to_string();
            (title, Some(brand), Some(model))
        }
        _ => {
            // older templates: plain h1, split against the brand list
            let title = document.select(&TITLE).next().map(element_text)?;
            if title.is_empty() {
                return None;
            }
            let (brand, model) = parse::split_brand_model(&title, brands);
            let brand = (!brand.is_empty()).then_some(brand);
            (title, brand, Some(model))
        }
    };

    let mut price = document
        .select(&PRICE_CURRENT)
        .next()
        .and_then(|el| parse::parse_price(&element_text(el)));
    let orig_price = document
        .select(&PRICE_OLD)
        .next()
        .and_then(|el| parse::parse_price(&element_text(el)));
    if price.is_none() {
        price = document
            .select(&PRICE_ANY)
            .next()
            .or_else(|| document.select(&PRICE_ITEMPROP).next())
            .and_then(|el| parse::parse_price(&element_text(el)));
    }

    let mut sizes: Vec<String> = Vec::new();
    for badge in document
        .select(&SIZE_MAIN)
        .chain(document.select(&SIZE_ALT))
    {
        let value = badge
            .value()
            .attr("title")
            .map(|t| t.to_string())
            .unwrap_or_else(|| element_text(badge));
        if !value.trim().is_empty() {
            sizes.push(value);
        }
    }

    Some(RawListing {
        shop: Shop::Xtreme,
        url: url.to_string(),
        title,
        brand,
        model,
        condition: Condition::New,
        orig_price,
        price,
        sizes,
    })
}

#[async_trait]
impl ShopExtractor for XtremeExtractor {
    fn shop(&self) -> Shop {
        Shop::Xtreme
    }

    async fn extract(
        &self,
        fetcher: &dyn PageFetcher,
        filters: &FilterConfig,
    ) -> Result<Vec<RawListing>> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut listings: Vec<RawListing> = Vec::new();
        let mut page = 1u32;

        'pages: loop {
            let page_url = if page == 1 {
                BASE_URL.to_string()
            } else {
                format!("{BASE_URL}?page={page}")
            };
            info!(shop = %self.shop(), page, url = %page_url, "Fetching category page");

            let body = match fetcher.fetch(&page_url).await {
                Ok(body) => body,
                Err(e) if page == 1 => return Err(e),
                Err(e) => {
                    debug!(shop = %self.shop(), page, error = %e, "Stopping pagination");
                    break;
                }
            };

            let links = product_links(&body);
            if page == 1 && links.is_empty() {
                return Err(Error::extraction(
                    self.shop(),
                    "no product cards on category page",
                ));
            }
            let fresh: Vec<String> = links
                .into_iter()
                .filter(|l| seen.insert(l.clone()))
                .collect();
            if fresh.is_empty() {
                debug!(shop = %self.shop(), page, "No new products, stopping");
                break;
            }

            for link in fresh {
                if filters
                    .max_items
                    .is_some_and(|cap| listings.len() >= cap)
                {
                    break 'pages;
                }
                let product = match fetcher.fetch(&link).await {
                    Ok(body) => body,
                    Err(e) => {
                        warn!(shop = %self.shop(), url = %link, error = %e, "Skipping product page");
                        continue;
                    }
                };
                match parse_product(&product, &link, &self.settings.scraper.brands) {
                    Some(listing) => listings.push(listing),
                    None => {
                        warn!(shop = %self.shop(), url = %link, "Unrecognized product page layout")
                    }
                }
            }

            page += 1;
        }

        info!(shop = %self.shop(), listings = listings.len(), "Extraction finished");
        Ok(apply_filters(listings, filters))
    }
}
