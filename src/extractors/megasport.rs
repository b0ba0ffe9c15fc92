//! megasport.ge: server-rendered product pages under `/products/`;
//! the skiing category mixes skis with boots, poles and helmets, so a
//! product only counts when it offers a plausible ski length.

use std::collections::HashSet;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::models::{Condition, RawListing, Shop};
use crate::parse;

use super::{FilterConfig, PageFetcher, ShopExtractor, apply_filters};

const BASE_DOMAIN: &str = "https://megasport.ge";
const CATEGORY_URL: &str = "https://megasport.ge/category/skiing";

/// Georgian stem for "pole"; present in every pole product name.
const POLE_MARKER: &str = "ჯოხ";

static ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid selector"));
static NAME: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h2[class*='text-heading']").expect("valid selector"));
static PRICE_BLOCK: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div.text-primary.text-heading.font-semibold").expect("valid selector")
});
static ANY_TEXT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span, div").expect("valid selector"));
static SIZE_LIST: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("ul[class*='colors'] li").expect("valid selector"));
static JSON_LD: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("script[type='application/ld+json']").expect("valid selector")
});

static LARI_PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([\d.,\s\u{a0}]+)\s*₾").expect("valid regex"));

pub struct MegasportExtractor {
    settings: Settings,
}

impl MegasportExtractor {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }
}

fn element_text(el: scraper::ElementRef<'_>) -> String {
    el.text().collect::<Vec<_>>().join(" ").trim().to_string()
}

/// All `/products/` links on the category page, absolute and sorted.
pub fn product_links(page: &str) -> Vec<String> {
    let document = Html::parse_document(page);
    let mut links: Vec<String> = Vec::new();

    for anchor in document.select(&ANCHOR) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if !href.contains("/products/") {
            continue;
        }
        let Some(base) = Url::parse(BASE_DOMAIN).ok() else {
            continue;
        };
        if let Ok(url) = base.join(href) {
            links.push(url.to_string());
        }
    }

    links.sort();
    links.dedup();
    links
}

/// Product price from the schema.org JSON-LD blob. The storefront
/// renders its visible price late via scripts, but the structured data
/// in the head is server-side and stable.
fn price_from_json_ld(document: &Html) -> Option<f64> {
    for script in document.select(&JSON_LD) {
        let text: String = script.text().collect();
        let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) else {
            continue;
        };
        let Some(offer_price) = value
            .pointer("/offers/price")
            .or_else(|| value.pointer("/offers/0/price"))
        else {
            continue;
        };
        match offer_price {
            serde_json::Value::Number(n) => return n.as_f64(),
            serde_json::Value::String(s) => {
                if let Some(v) = parse::parse_price(s) {
                    return Some(v);
                }
            }
            _ => {}
        }
    }
    None
}

/// The single displayed price: structured data first, then the styled
/// price block, then any element carrying the lari sign, then a
/// full-text sweep.
fn extract_price(document: &Html) -> Option<f64> {
    if let Some(v) = price_from_json_ld(document) {
        return Some(v);
    }

    if let Some(block) = document.select(&PRICE_BLOCK).next() {
        if let Some(v) = parse::parse_price(&element_text(block)) {
            return Some(v);
        }
    }

    for el in document.select(&ANY_TEXT) {
        let text = element_text(el);
        if text.contains('₾') {
            if let Some(v) = parse::parse_price(&text) {
                return Some(v);
            }
        }
    }

    let full_text = document
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ");
    LARI_PRICE_RE
        .captures(&full_text)
        .and_then(|c| parse::parse_price(&c[1]))
}

impl MegasportExtractor {
    /// Parses one product page; None for poles, accessories and
    /// anything without a plausible ski length.
    pub fn parse_product(&self, page: &str, url: &str) -> Option<RawListing> {
        let document = Html::parse_document(page);
        let scraper_cfg = &self.settings.scraper;

        let name = document.select(&NAME).next().map(element_text)?;
        if name.is_empty() || name.contains(POLE_MARKER) {
            return None;
        }

        let price = extract_price(&document)?;

        let sizes: Vec<String> = document
            .select(&SIZE_LIST)
            .map(element_text)
            .filter(|t| !t.is_empty())
            .collect();
        let lengths =
            parse::parse_lengths(&sizes, scraper_cfg.min_length_cm, scraper_cfg.max_length_cm);
        if lengths.is_empty() {
            // boots and helmets have size options too, just not in cm
            return None;
        }

        let (brand, model) = parse::split_brand_model(&name, &scraper_cfg.brands);

        Some(RawListing {
            shop: Shop::Megasport,
            url: url.to_string(),
            title: name,
            brand: (!brand.is_empty()).then_some(brand),
            model: Some(model),
            condition: Condition::New,
            orig_price: None,
            price: Some(price),
            sizes,
        })
    }
}

#[async_trait]
impl ShopExtractor for MegasportExtractor {
    fn shop(&self) -> Shop {
        Shop::Megasport
    }

    async fn extract(
        &self,
        fetcher: &dyn PageFetcher,
        filters: &FilterConfig,
    ) -> Result<Vec<RawListing>> {
        info!(shop = %self.shop(), url = CATEGORY_URL, "Fetching category page");
        let body = fetcher.fetch(CATEGORY_URL).await?;

        let links = product_links(&body);
        if links.is_empty() {
            return Err(Error::extraction(
                self.shop(),
                "no product links on category page",
            ));
        }
        info!(shop = %self.shop(), products = links.len(), "Category page parsed");

        let mut seen: HashSet<String> = HashSet::new();
        let mut listings: Vec<RawListing> = Vec::new();

        for link in links {
            if !seen.insert(link.clone()) {
                continue;
            }
            if filters
                .max_items
                .is_some_and(|cap| listings.len() >= cap)
            {
                break;
            }
            let product = match fetcher.fetch(&link).await {
                Ok(body) => body,
                Err(e) => {
                    warn!(shop = %self.shop(), url = %link, error = %e, "Skipping product page");
                    continue;
                }
            };
            match self.parse_product(&product, &link) {
                Some(listing) => listings.push(listing),
                None => debug!(shop = %self.shop(), url = %link, "Skipping non-ski product"),
            }
        }

        info!(shop = %self.shop(), listings = listings.len(), "Extraction finished");
        Ok(apply_filters(listings, filters))
    }
}
