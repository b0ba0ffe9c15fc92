//! snowmania.ge: WooCommerce. Two categories, new and used skis, so
//! the condition comes from the category being walked. Product pages
//! carry the attribute table with brand and sizes.

use std::collections::HashSet;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::Result;
use crate::models::{Condition, RawListing, Shop};
use crate::parse;

use super::{FilterConfig, PageFetcher, ShopExtractor, apply_filters};

const BASE_DOMAIN: &str = "https://snowmania.ge";

/// (category url, condition). The storefront splits new and used skis
/// into separate Georgian-slugged categories.
const CATEGORIES: [(&str, Condition); 2] = [
    (
        "https://snowmania.ge/product-category/%e1%83%90%e1%83%ae%e1%83%90%e1%83%9a%e1%83%98/%e1%83%97%e1%83%ae%e1%83%98%e1%83%9a%e1%83%90%e1%83%9b%e1%83%a3%e1%83%a0%e1%83%98/",
        Condition::New,
    ),
    (
        "https://snowmania.ge/product-category/%e1%83%9b%e1%83%94%e1%83%9d%e1%83%a0%e1%83%90%e1%83%93%e1%83%98/%e1%83%97%e1%83%ae%e1%83%98%e1%83%9a%e1%83%90%e1%83%9b%e1%83%a3%e1%83%a0%e1%83%98-%e1%83%9b%e1%83%94%e1%83%9d%e1%83%a0%e1%83%90%e1%83%93%e1%83%98/",
        Condition::Used,
    ),
];

/// Ski category marker ("tkhilamuri"); anything else in the product
/// meta is bindings, boots or accessories.
const SKI_CATEGORY_MARKER: &str = "თხილამური";
/// Attribute-table row labels: size and brand.
const SIZE_LABEL: &str = "ზომა";
const BRAND_LABEL: &str = "ბრენდი";

static HEADING_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h2 a, h3 a").expect("valid selector"));
static PRODUCT_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1.product_title, .product_title, h1").expect("valid selector"));
static META_CATEGORY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".product_meta .posted_in a").expect("valid selector"));
static ATTR_ROW: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("table.woocommerce-product-attributes tr").expect("valid selector")
});
static ATTR_LABEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("th").expect("valid selector"));
static ATTR_VALUE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td").expect("valid selector"));
static PRICE_BLOCK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p.price, span.price, div.price").expect("valid selector"));
static PRICE_DEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("del .woocommerce-Price-amount").expect("valid selector")
});
static PRICE_INS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("ins .woocommerce-Price-amount").expect("valid selector")
});
static PRICE_ANY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".woocommerce-Price-amount").expect("valid selector"));

static ORIG_PHRASE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Original price was:\s*([\d.,]+)").expect("valid regex"));
static CURR_PHRASE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Current price is:\s*([\d.,]+)").expect("valid regex"));
static NUMBER_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\d.,]+").expect("valid regex"));

/// Needs no configuration: brand and sizes come structured from the
/// product attribute table.
pub struct SnowmaniaExtractor;

impl SnowmaniaExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SnowmaniaExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn element_text(el: scraper::ElementRef<'_>) -> String {
    el.text().collect::<Vec<_>>().join(" ").trim().to_string()
}

/// WooCommerce paginates as `<base>/page/N/`; page 1 is the bare URL.
pub fn category_page_url(base: &str, page: u32) -> String {
    let base = base.trim_end_matches('/');
    if page <= 1 {
        format!("{base}/")
    } else {
        format!("{base}/page/{page}/")
    }
}

/// Product links from the category grid. The theme has no standard
/// `ul.products` markup, so heading anchors pointing at `/product/`
/// are the reliable signal.
pub fn product_links(page: &str) -> Vec<String> {
    let document = Html::parse_document(page);
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for anchor in document.select(&HEADING_LINK) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if !href.contains("/product/") {
            continue;
        }
        let Some(url) = absolutize(href) else { continue };
        if seen.insert(url.clone()) {
            links.push(url);
        }
    }

    links
}

fn absolutize(href: &str) -> Option<String> {
    let base = Url::parse(BASE_DOMAIN).ok()?;
    Some(base.join(href).ok()?.to_string())
}

/// Text fallback for themes that render the price as one blob.
/// Understands the accessibility phrasing and degrades to pairing the
/// largest number as the old price and the smallest as the current.
fn parse_price_text(text: &str) -> (Option<f64>, Option<f64>) {
    if text.trim().is_empty() {
        return (None, None);
    }

    let orig = ORIG_PHRASE_RE
        .captures(text)
        .and_then(|c| parse::parse_price(&c[1]));
    let curr = CURR_PHRASE_RE
        .captures(text)
        .and_then(|c| parse::parse_price(&c[1]));
    if orig.is_some() && curr.is_some() {
        return (orig, curr);
    }

    let mut numbers: Vec<f64> = Vec::new();
    for token in NUMBER_TOKEN_RE.find_iter(text) {
        if let Some(v) = parse::parse_price(token.as_str()) {
            if !numbers.contains(&v) {
                numbers.push(v);
            }
        }
    }

    match numbers.len() {
        0 => (None, None),
        1 => (None, Some(numbers[0])),
        _ => {
            let max = numbers.iter().cloned().fold(f64::MIN, f64::max);
            let min = numbers.iter().cloned().fold(f64::MAX, f64::min);
            (Some(max), Some(min))
        }
    }
}

fn parse_prices(document: &Html) -> (Option<f64>, Option<f64>) {
    if let Some(block) = document.select(&PRICE_BLOCK).next() {
        let orig = block
            .select(&PRICE_DEL)
            .next()
            .and_then(|el| parse::parse_price(&element_text(el)));
        let curr = block
            .select(&PRICE_INS)
            .next()
            .and_then(|el| parse::parse_price(&element_text(el)));

        match (orig, curr) {
            (Some(o), Some(c)) => return (Some(o), Some(c)),
            (None, None) => {
                if let Some(v) = block
                    .select(&PRICE_ANY)
                    .next()
                    .and_then(|el| parse::parse_price(&element_text(el)))
                {
                    return (None, Some(v));
                }
            }
            // one leg only: treat the single value as the current price
            (Some(v), None) | (None, Some(v)) => return (None, Some(v)),
        }

        return parse_price_text(&element_text(block));
    }

    (None, None)
}

/// Parses a product page. Returns None for non-ski products (the
/// categories also hold poles and accessories) and unusable layouts.
pub fn parse_product(page: &str, url: &str, condition: Condition) -> Option<RawListing> {
    let document = Html::parse_document(page);

    let is_ski = document
        .select(&META_CATEGORY)
        .any(|a| element_text(a).to_lowercase().contains(SKI_CATEGORY_MARKER));
    if !is_ski {
        return None;
    }

    let title = document.select(&PRODUCT_TITLE).next().map(element_text)?;
    if title.is_empty() {
        return None;
    }

    let mut brand: Option<String> = None;
    let mut sizes: Vec<String> = Vec::new();
    for row in document.select(&ATTR_ROW) {
        let Some(label) = row.select(&ATTR_LABEL).next().map(element_text) else {
            continue;
        };
        let Some(value) = row.select(&ATTR_VALUE).next().map(element_text) else {
            continue;
        };
        if value.is_empty() {
            continue;
        }
        let label = label.to_lowercase();
        if label.contains(SIZE_LABEL) {
            sizes.push(value);
        } else if label.contains(BRAND_LABEL) {
            brand = Some(value);
        }
    }

    let (orig_price, price) = parse_prices(&document);

    Some(RawListing {
        shop: Shop::Snowmania,
        url: url.to_string(),
        title,
        brand,
        model: None,
        condition,
        orig_price,
        price,
        sizes,
    })
}

#[async_trait]
impl ShopExtractor for SnowmaniaExtractor {
    fn shop(&self) -> Shop {
        Shop::Snowmania
    }

    async fn extract(
        &self,
        fetcher: &dyn PageFetcher,
        filters: &FilterConfig,
    ) -> Result<Vec<RawListing>> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut listings: Vec<RawListing> = Vec::new();

        'categories: for (category, condition) in CATEGORIES {
            let mut page = 1u32;
            loop {
                let page_url = category_page_url(category, page);
                info!(shop = %self.shop(), page, condition = %condition, "Fetching category page");

                let body = match fetcher.fetch(&page_url).await {
                    Ok(body) => body,
                    Err(e) => {
                        if page == 1 {
                            warn!(shop = %self.shop(), category, error = %e, "Category unavailable");
                        } else {
                            debug!(shop = %self.shop(), page, error = %e, "Stopping pagination");
                        }
                        break;
                    }
                };

                let links: Vec<String> = product_links(&body)
                    .into_iter()
                    .filter(|l| seen.insert(l.clone()))
                    .collect();
                if links.is_empty() {
                    debug!(shop = %self.shop(), page, "No new products, stopping");
                    break;
                }

                for link in links {
                    if filters
                        .max_items
                        .is_some_and(|cap| listings.len() >= cap)
                    {
                        break 'categories;
                    }
                    let product = match fetcher.fetch(&link).await {
                        Ok(body) => body,
                        Err(e) => {
                            warn!(shop = %self.shop(), url = %link, error = %e, "Skipping product page");
                            continue;
                        }
                    };
                    match parse_product(&product, &link, condition.clone()) {
                        Some(listing) => listings.push(listing),
                        None => {
                            debug!(shop = %self.shop(), url = %link, "Skipping non-ski product")
                        }
                    }
                }

                page += 1;
            }
        }

        info!(shop = %self.shop(), listings = listings.len(), "Extraction finished");
        Ok(apply_filters(listings, filters))
    }
}
