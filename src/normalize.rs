use tracing::{debug, warn};

use crate::config::ScraperConfig;
use crate::models::{RawListing, UnifiedRecord};
use crate::parse;

/// Maps one shop's raw listings into unified records, expanding each
/// listing into one row per distinct length, ascending.
///
/// Listings without a usable price, and listings where no plausible
/// length can be recovered (neither from the size selector nor from a
/// 3-digit token in the model name), are dropped with a warning; the
/// snapshot only ever contains fully valid rows.
pub fn normalize(listings: Vec<RawListing>, cfg: &ScraperConfig) -> Vec<UnifiedRecord> {
    let mut records = Vec::new();

    for listing in listings {
        let Some(price) = listing.price.or(listing.orig_price) else {
            warn!(
                shop = %listing.shop,
                title = %listing.title,
                url = %listing.url,
                "Dropping listing without a parseable price"
            );
            continue;
        };

        let (brand, model) = brand_and_model(&listing, cfg);

        let mut lengths = parse::parse_lengths(&listing.sizes, cfg.min_length_cm, cfg.max_length_cm);
        if lengths.is_empty() {
            if let Some(length) =
                parse::length_from_model(&model, cfg.min_length_cm, cfg.max_length_cm)
            {
                debug!(
                    shop = %listing.shop,
                    title = %listing.title,
                    length_cm = length,
                    "Recovered length from model name"
                );
                lengths.push(length);
            }
        }
        if lengths.is_empty() {
            warn!(
                shop = %listing.shop,
                title = %listing.title,
                url = %listing.url,
                "Dropping listing without a plausible length"
            );
            continue;
        }
        lengths.sort_unstable();

        // An "original" price equal to the current one is not a discount.
        let orig_price = listing
            .orig_price
            .filter(|orig| (orig - price).abs() > f64::EPSILON);

        for length_cm in lengths {
            records.push(UnifiedRecord {
                shop: listing.shop,
                brand: brand.clone(),
                model: model.clone(),
                condition: listing.condition.clone(),
                orig_price,
                price,
                length_cm,
                url: listing.url.clone(),
            });
        }
    }

    records
}

fn brand_and_model(listing: &RawListing, cfg: &ScraperConfig) -> (String, String) {
    match &listing.brand {
        Some(scraped) => {
            // Shops with structured brand fields still go through the
            // controlled list so the spelling keys identically everywhere.
            let brand = cfg
                .brands
                .iter()
                .find(|b| b.eq_ignore_ascii_case(scraped))
                .cloned()
                .unwrap_or_else(|| scraped.clone());
            let model = match &listing.model {
                Some(model) if !model.trim().is_empty() => model.trim().to_string(),
                _ => strip_brand_prefix(&listing.title, scraped),
            };
            (brand, model)
        }
        None => parse::split_brand_model(&listing.title, &cfg.brands),
    }
}

fn strip_brand_prefix(title: &str, brand: &str) -> String {
    let trimmed = title.trim();
    if trimmed.len() >= brand.len()
        && trimmed.is_char_boundary(brand.len())
        && trimmed[..brand.len()].eq_ignore_ascii_case(brand)
    {
        trimmed[brand.len()..].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Condition, Shop};

    fn cfg() -> ScraperConfig {
        ScraperConfig {
            brands: ["Rossignol", "Head", "Atomic"]
                .into_iter()
                .map(String::from)
                .collect(),
            min_length_cm: 100,
            max_length_cm: 210,
            page_delay_ms: 0,
        }
    }

    fn listing(sizes: &[&str]) -> RawListing {
        RawListing {
            shop: Shop::Xtreme,
            url: "https://example.test/p/1".to_string(),
            title: "Atomic Redster G9".to_string(),
            brand: Some("Atomic".to_string()),
            model: Some("Redster G9".to_string()),
            condition: Condition::New,
            orig_price: None,
            price: Some(300.0),
            sizes: sizes.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn expands_one_row_per_length_ascending() {
        let records = normalize(vec![listing(&["183", "165", "174"])], &cfg());
        assert_eq!(records.len(), 3);
        let lengths: Vec<u32> = records.iter().map(|r| r.length_cm).collect();
        assert_eq!(lengths, vec![165, 174, 183]);
    }

    #[test]
    fn length_order_is_numeric_not_lexicographic() {
        let mut cfg = cfg();
        cfg.min_length_cm = 90;
        let records = normalize(vec![listing(&["100", "95"])], &cfg);
        let lengths: Vec<u32> = records.iter().map(|r| r.length_cm).collect();
        assert_eq!(lengths, vec![95, 100]);
    }

    #[test]
    fn rows_differ_only_in_length() {
        let records = normalize(vec![listing(&["165", "174"])], &cfg());
        assert_eq!(records.len(), 2);
        let mut a = records[0].clone();
        let b = &records[1];
        a.length_cm = b.length_cm;
        assert_eq!(&a, b);
    }

    #[test]
    fn duplicate_lengths_collapse_to_one_row() {
        let records = normalize(vec![listing(&["170", "170სმ"])], &cfg());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].length_cm, 170);
    }

    #[test]
    fn missing_price_drops_listing() {
        let mut l = listing(&["170"]);
        l.price = None;
        l.orig_price = None;
        assert!(normalize(vec![l], &cfg()).is_empty());
    }

    #[test]
    fn length_recovered_from_model_name() {
        let mut l = listing(&[]);
        l.model = Some("Redster G9 177".to_string());
        let records = normalize(vec![l], &cfg());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].length_cm, 177);
    }

    #[test]
    fn no_length_anywhere_drops_listing() {
        let records = normalize(vec![listing(&[])], &cfg());
        assert!(records.is_empty());
    }

    #[test]
    fn equal_orig_price_means_no_discount() {
        let mut l = listing(&["170"]);
        l.orig_price = Some(300.0);
        let records = normalize(vec![l], &cfg());
        assert_eq!(records[0].orig_price, None);

        let mut l = listing(&["170"]);
        l.orig_price = Some(350.0);
        let records = normalize(vec![l], &cfg());
        assert_eq!(records[0].orig_price, Some(350.0));
    }

    #[test]
    fn unstructured_title_goes_through_brand_list() {
        let mut l = listing(&["170"]);
        l.brand = None;
        l.model = None;
        l.title = "UnknownBrandX Ski 170".to_string();
        let records = normalize(vec![l], &cfg());
        assert_eq!(records[0].brand, "");
        assert_eq!(records[0].model, "UnknownBrandX Ski 170");
    }
}
