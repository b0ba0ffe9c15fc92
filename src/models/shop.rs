use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The closed set of supported storefronts. Declaration order is the
/// canonical merge order for exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shop {
    Xtreme,
    Snowmania,
    Burosports,
    Megasport,
}

impl Shop {
    pub const ALL: [Shop; 4] = [
        Shop::Xtreme,
        Shop::Snowmania,
        Shop::Burosports,
        Shop::Megasport,
    ];

    /// Short code used on the CLI and in the `shop` CSV column.
    pub fn code(&self) -> &'static str {
        match self {
            Shop::Xtreme => "xtreme",
            Shop::Snowmania => "snowmania",
            Shop::Burosports => "burosports",
            Shop::Megasport => "megasport",
        }
    }

    /// Storefront hostname, for logs.
    pub fn host(&self) -> &'static str {
        match self {
            Shop::Xtreme => "xtreme.ge",
            Shop::Snowmania => "snowmania.ge",
            Shop::Burosports => "burusports.ge",
            Shop::Megasport => "megasport.ge",
        }
    }
}

impl fmt::Display for Shop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Shop {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xtreme" => Ok(Shop::Xtreme),
            "snowmania" => Ok(Shop::Snowmania),
            "burosports" => Ok(Shop::Burosports),
            "megasport" => Ok(Shop::Megasport),
            other => Err(format!("unknown shop code '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_codes_case_insensitively() {
        assert_eq!("Xtreme".parse::<Shop>().unwrap(), Shop::Xtreme);
        assert_eq!(" megasport ".parse::<Shop>().unwrap(), Shop::Megasport);
        assert!("decathlon".parse::<Shop>().is_err());
    }

    #[test]
    fn code_round_trips() {
        for shop in Shop::ALL {
            assert_eq!(shop.code().parse::<Shop>().unwrap(), shop);
        }
    }
}
