use std::sync::LazyLock;

use regex::Regex;

static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d\s\u{a0},.]*").expect("valid regex"));

static LENGTH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{2,3}").expect("valid regex"));

static MODEL_LENGTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{3})\b").expect("valid regex"));

/// Coerces raw storefront price text to a number.
///
/// Tolerates currency symbols, surrounding words, thousands separators
/// and both decimal conventions: `"1,299.00 ₾"`, `"3 550,00 ₾"`,
/// `"₾.1,855.00"`, `"2800"`.
pub fn parse_price(text: &str) -> Option<f64> {
    let token = NUMBER_RE.find(text)?.as_str();
    let compact: String = token
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}')
        .collect();
    let compact = compact.trim_end_matches(['.', ',']);
    if compact.is_empty() {
        return None;
    }

    let normalized = match (compact.rfind('.'), compact.rfind(',')) {
        (Some(dot), Some(comma)) => {
            // The later separator is the decimal point.
            if dot > comma {
                compact.replace(',', "")
            } else {
                compact.replace('.', "").replace(',', ".")
            }
        }
        (None, Some(comma)) => {
            let fraction_digits = compact.len() - comma - 1;
            if compact.matches(',').count() == 1 && fraction_digits <= 2 {
                compact.replace(',', ".")
            } else {
                compact.replace(',', "")
            }
        }
        (Some(dot), None) => {
            let fraction_digits = compact.len() - dot - 1;
            if compact.matches('.').count() == 1 && fraction_digits <= 2 {
                compact.to_string()
            } else {
                compact.replace('.', "")
            }
        }
        (None, None) => compact.to_string(),
    };

    normalized.parse::<f64>().ok().filter(|v| *v >= 0.0)
}

/// Extracts distinct plausible ski lengths from raw size strings such
/// as `"165სმ"`, `"176 სმ"` or `"185"`. Input order is preserved;
/// values outside `[min_cm, max_cm]` are dropped as noise.
pub fn parse_lengths(sizes: &[String], min_cm: u32, max_cm: u32) -> Vec<u32> {
    let mut lengths = Vec::new();
    for size in sizes {
        for m in LENGTH_RE.find_iter(size) {
            let Ok(value) = m.as_str().parse::<u32>() else {
                continue;
            };
            if value >= min_cm && value <= max_cm && !lengths.contains(&value) {
                lengths.push(value);
            }
        }
    }
    lengths
}

/// Fallback for listings without explicit sizes: a lone 3-digit token
/// in the model name, when it sits inside the plausible band.
pub fn length_from_model(model: &str, min_cm: u32, max_cm: u32) -> Option<u32> {
    let m = MODEL_LENGTH_RE.find(model)?;
    let value = m.as_str().parse::<u32>().ok()?;
    (value >= min_cm && value <= max_cm).then_some(value)
}

/// Splits a free-text title into (brand, model) against the controlled
/// brand list. The brand is the first title token matched
/// case-insensitively; the configured spelling wins so that the same
/// brand keys identically across shops. Unrecognized titles keep an
/// empty brand and the full title as model.
pub fn split_brand_model(title: &str, brands: &[String]) -> (String, String) {
    let trimmed = title.trim();
    let Some(first) = trimmed.split_whitespace().next() else {
        return (String::new(), String::new());
    };

    match brands.iter().find(|b| b.eq_ignore_ascii_case(first)) {
        Some(brand) => {
            let model = trimmed[first.len()..].trim().to_string();
            (brand.clone(), model)
        }
        None => (String::new(), trimmed.to_string()),
    }
}

/// Case-insensitive brand lookup anywhere in a text blob, for shops
/// that only reveal the brand in the page `<title>`.
pub fn detect_brand(text: &str, brands: &[String]) -> Option<String> {
    let lower = text.to_lowercase();
    brands
        .iter()
        .find(|b| lower.contains(&b.to_lowercase()))
        .cloned()
}
