//! burusports.ge: prices live on the category cards as trailing
//! numeric tokens (the product page's "Similar products" block makes
//! on-page price scraping unreliable); model and sizes come from the
//! product page, the brand from its `<title>`.

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

const BASE_DOMAIN: &str = "https://burusports.ge";
const CATEGORY_URL: &str = "https://burusports.ge/en/products/tkhilamuri/tkhilamuri";

/// Words that end the "Size:" block on a product page.
const SIZE_STOP_WORDS: [&str; 4] = ["Adult:", "Quantity:", "Add to cart", "Similar products"];

static CARD: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.product-list-item").expect("valid selector"));
static MAIN_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1.main-title").expect("valid selector"));
static PAGE_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("valid selector"));

static PRICE_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{3,4}$").expect("valid regex"));
static SIZE_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{2,3}").expect("valid regex"));

/// One category card: the product link plus the prices printed on it.
#[derive(Debug, Clone, PartialEq)]
pub struct CardLead {
    pub url: String,
    pub orig_price: Option<f64>,
    pub price: Option<f64>,
}

pub struct BurosportsExtractor {
    settings: Settings,
}

impl BurosportsExtractor {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }
}

fn element_text(el: scraper::ElementRef<'_>) -> String {
    el.text().collect::<Vec<_>>().join(" ").trim().to_string()
}

/// Splits a card's text into title tokens and up to two trailing price
/// tokens: `"Escaper 97 Nano 2800 1600"` → old 2800, current 1600;
/// a single trailing token is the undiscounted price.
fn prices_from_card_text(text: &str) -> (Option<f64>, Option<f64>) {
    let mut tokens: Vec<&str> = text.split_whitespace().collect();
    let mut trailing: Vec<f64> = Vec::new();

    while trailing.len() < 2 {
        let Some(last) = tokens.last() else { break };
        if !PRICE_TOKEN_RE.is_match(last) {
            break;
        }
        match last.parse::<f64>() {
            Ok(v) => trailing.push(v),
            Err(_) => break,
        }
        tokens.pop();
    }

    // popped back-to-front, so the last element is the leftmost token
    match trailing.len() {
        0 => (None, None),
        1 => (None, Some(trailing[0])),
        _ => (Some(trailing[1]), Some(trailing[0])),
    }
}

/// Category cards with their list-page prices.
pub fn card_leads(page: &str) -> Vec<CardLead> {
    let document = Html::parse_document(page);
    let mut leads = Vec::new();

    for card in document.select(&CARD) {
        let Some(href) = card.value().attr("href") else {
            continue;
        };
        let Some(url) = absolutize(href) else { continue };
        if leads.iter().any(|l: &CardLead| l.url == url) {
            continue;
        }
        let (orig_price, price) = prices_from_card_text(&element_text(card));
        leads.push(CardLead {
            url,
            orig_price,
            price,
        });
    }

    leads
}

fn absolutize(href: &str) -> Option<String> {
    let base = Url::parse(BASE_DOMAIN).ok()?;
    Some(base.join(href).ok()?.to_string())
}

/// The "Size:" text block up to the first stop word, as raw tokens.
fn sizes_from_text(document: &Html) -> Vec<String> {
    let text = document
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join("\n");

    let Some((_, after)) = text.split_once("Size:") else {
        return Vec::new();
    };
    let mut block = after;
    for stop in SIZE_STOP_WORDS {
        if let Some((before, _)) = block.split_once(stop) {
            block = before;
        }
    }

    let mut sizes = Vec::new();
    for m in SIZE_TOKEN_RE.find_iter(block) {
        let token = m.as_str().to_string();
        if !sizes.contains(&token) {
            sizes.push(token);
        }
    }
    sizes
}

/// Parses a product page, with prices carried over from the card lead.
pub fn parse_product(page: &str, lead: &CardLead, brands: &[String]) -> Option<RawListing> {
    let document = Html::parse_document(page);

    let model = document.select(&MAIN_TITLE).next().map(element_text)?;
    if model.is_empty() {
        return None;
    }

    let brand = document
        .select(&PAGE_TITLE)
        .next()
        .map(element_text)
        .and_then(|title| parse::detect_brand(&title, brands));

    let sizes = sizes_from_text(&document);

    Some(RawListing {
        shop: Shop::Burosports,
        url: lead.url.clone(),
        title: model.clone(),
        brand,
        model: Some(model),
        condition: Condition::New,
        orig_price: lead.orig_price,
        price: lead.price.or(lead.orig_price),
        sizes,
    })
}

#[async_trait]
impl ShopExtractor for BurosportsExtractor {
    fn shop(&self) -> Shop {
        Shop::Burosports
    }

    async fn extract(
        &self,
        fetcher: &dyn PageFetcher,
        filters: &FilterConfig,
    ) -> Result<Vec<RawListing>> {
        let mut listings: Vec<RawListing> = Vec::new();
        let mut page = 1u32;

        'pages: loop {
            let page_url = if page == 1 {
                CATEGORY_URL.to_string()
            } else {
                format!("{CATEGORY_URL}?page={page}")
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

            let leads = card_leads(&body);
            if leads.is_empty() {
                if page == 1 {
                    return Err(Error::extraction(
                        self.shop(),
                        "no product cards on category page",
                    ));
                }
                debug!(shop = %self.shop(), page, "No products on page, stopping");
                break;
            }

            for lead in leads {
                if filters
                    .max_items
                    .is_some_and(|cap| listings.len() >= cap)
                {
                    break 'pages;
                }
                let product = match fetcher.fetch(&lead.url).await {
                    Ok(body) => body,
                    Err(e) => {
                        warn!(shop = %self.shop(), url = %lead.url, error = %e, "Skipping product page");
                        continue;
                    }
                };
                match parse_product(&product, &lead, &self.settings.scraper.brands) {
                    Some(listing) => listings.push(listing),
                    None => {
                        warn!(shop = %self.shop(), url = %lead.url, "Unrecognized product page layout")
                    }
                }
            }

            page += 1;
        }

        info!(shop = %self.shop(), listings = listings.len(), "Extraction finished");
        Ok(apply_filters(listings, filters))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_text_yields_discounted_pair() {
        assert_eq!(
            prices_from_card_text("Escaper 97 Nano 2800 1600"),
            (Some(2800.0), Some(1600.0))
        );
    }

    #[test]
    fn card_text_single_price_is_current() {
        assert_eq!(
            prices_from_card_text("SUPER VIRAGE VI TECH KONECT 2800"),
            (None, Some(2800.0))
        );
        assert_eq!(
            prices_from_card_text("Blaze 94 Grey/Red 2100"),
            (None, Some(2100.0))
        );
    }

    #[test]
    fn model_numbers_are_not_prices() {
        // "94" and "97" are two digits; only trailing 3-4 digit tokens count
        assert_eq!(prices_from_card_text("Blaze 94 Grey/Red"), (None, None));
    }

    #[test]
    fn leads_parse_links_and_prices() {
        let page = r#"
            <a class="product-list-item" href="/en/products/tkhilamuri/escaper-97">
              Escaper 97 Nano 2800 1600
            </a>
            <a class="product-list-item" href="/en/products/tkhilamuri/blaze-94">
              Blaze 94 Grey/Red 2100
            </a>
        "#;
        let leads = card_leads(page);
        assert_eq!(leads.len(), 2);
        assert_eq!(
            leads[0].url,
            "https://burusports.ge/en/products/tkhilamuri/escaper-97"
        );
        assert_eq!(leads[0].orig_price, Some(2800.0));
        assert_eq!(leads[0].price, Some(1600.0));
        assert_eq!(leads[1].orig_price, None);
        assert_eq!(leads[1].price, Some(2100.0));
    }

    #[test]
    fn product_page_parses_model_brand_and_sizes() {
        let page = r#"
            <html><head><title>Escaper 97 Nano | Rossignol | Buru Sports</title></head>
            <body>
              <h1 class="main-title">Escaper 97 Nano</h1>
              <div>Size: 165სმ 172სმ 179სმ Adult: yes Quantity: 3</div>
            </body></html>
        "#;
        let lead = CardLead {
            url: "https://burusports.ge/en/products/tkhilamuri/escaper-97".to_string(),
            orig_price: Some(2800.0),
            price: Some(1600.0),
        };
        let brands = vec!["Rossignol".to_string(), "Head".to_string()];

        let listing = parse_product(page, &lead, &brands).unwrap();
        assert_eq!(listing.model.as_deref(), Some("Escaper 97 Nano"));
        assert_eq!(listing.brand.as_deref(), Some("Rossignol"));
        assert_eq!(listing.sizes, vec!["165", "172", "179"]);
        assert_eq!(listing.orig_price, Some(2800.0));
        assert_eq!(listing.price, Some(1600.0));
    }

    #[test]
    fn missing_size_block_means_no_sizes() {
        let page = r#"
            <html><head><title>Something</title></head>
            <body><h1 class="main-title">Super Virage</h1></body></html>
        "#;
        let lead = CardLead {
            url: "https://burusports.ge/en/products/x".to_string(),
            orig_price: None,
            price: Some(2800.0),
        };
        let listing = parse_product(page, &lead, &[]).unwrap();
        assert!(listing.sizes.is_empty());
        assert!(listing.brand.is_none());
    }
}
