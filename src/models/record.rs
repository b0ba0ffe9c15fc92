use serde::{Deserialize, Serialize};

use super::{Condition, Shop};

/// One row of the unified snapshot: a single (product, length) pair.
/// A listing with N available lengths expands to N records that differ
/// only in `length_cm`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedRecord {
    pub shop: Shop,
    /// Empty when the title did not start with a known brand.
    pub brand: String,
    pub model: String,
    pub condition: Condition,
    /// Pre-discount price, when the shop shows one.
    pub orig_price: Option<f64>,
    /// Current effective price.
    pub price: f64,
    pub length_cm: u32,
    pub url: String,
}

/// Formats a price the way snapshots store it: two decimals when a
/// fractional part is present, bare integer otherwise.
pub fn format_price(value: f64) -> String {
    if (value - value.trunc()).abs() < f64::EPSILON {
        format!("{}", value.trunc() as i64)
    } else {
        format!("{value:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_prices_have_no_decimals() {
        assert_eq!(format_price(300.0), "300");
        assert_eq!(format_price(1855.0), "1855");
    }

    #[test]
    fn fractional_prices_keep_two_decimals() {
        assert_eq!(format_price(299.5), "299.50");
        assert_eq!(format_price(1299.99), "1299.99");
    }
}
