use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Shop;

/// Product condition as advertised by the storefront. Unrecognized
/// free-text values are carried through unchanged rather than dropped.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    New,
    Used,
    Other(String),
}

impl Condition {
    pub fn from_text(s: &str) -> Condition {
        match s.trim().to_ascii_lowercase().as_str() {
            "new" => Condition::New,
            "used" => Condition::Used,
            _ => Condition::Other(s.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Condition::New => "new",
            Condition::Used => "used",
            Condition::Other(s) => s,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Condition {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Condition::from_text(s))
    }
}

/// One scraped product as a shop's extractor saw it. Prices are already
/// coerced to numbers by the extractor; sizes are kept as the raw
/// selector strings and only parsed during normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawListing {
    pub shop: Shop,
    pub url: String,
    pub title: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub condition: Condition,
    pub orig_price: Option<f64>,
    pub price: Option<f64>,
    pub sizes: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condition_falls_back_to_free_text() {
        assert_eq!("New".parse::<Condition>().unwrap(), Condition::New);
        assert_eq!("USED".parse::<Condition>().unwrap(), Condition::Used);
        assert_eq!(
            "demo".parse::<Condition>().unwrap(),
            Condition::Other("demo".to_string())
        );
    }
}
