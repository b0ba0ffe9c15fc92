use std::collections::HashMap;
use std::path::PathBuf;

use config::{Config, ConfigError};
use serde::Deserialize;

/// Process-wide settings, loaded once at startup. Embedded defaults are
/// overridable through `config/default.yaml` and `SKI_*` environment
/// variables, in that order.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub export: ExportConfig,
    pub scraper: ScraperConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExportConfig {
    /// Directory holding `skis_unified_*.csv` snapshots and diff reports.
    pub dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScraperConfig {
    /// Controlled brand list used to split titles into brand + model.
    pub brands: Vec<String>,
    /// Plausible ski length band in cm; values outside it are treated
    /// as noise (boot sizes, waist widths, prices).
    pub min_length_cm: u32,
    pub max_length_cm: u32,
    /// Politeness delay between page fetches, before jitter.
    pub page_delay_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub headers: HashMap<String, String>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .set_default("export.dir", "data/exports")?
            .set_default(
                "scraper.brands",
                vec![
                    "Rossignol",
                    "Head",
                    "Atomic",
                    "Fischer",
                    "Salomon",
                    "Scott",
                    "Volkl",
                    "Völkl",
                    "Voelkl",
                    "Blizzard",
                    "Nordica",
                    "Elan",
                    "K2",
                    "Dynastar",
                    "Armada",
                ],
            )?
            .set_default("scraper.min_length_cm", 100)?
            .set_default("scraper.max_length_cm", 210)?
            .set_default("scraper.page_delay_ms", 700)?
            .set_default(
                "http.headers.user-agent",
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                 AppleWebKit/537.36 (KHTML, like Gecko) \
                 Chrome/129.0 Safari/537.36",
            )?
            .set_default("http.headers.accept-language", "en-US,en;q=0.9")?
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::Environment::with_prefix("SKI").separator("__"));

        let config = builder.build()?;
        config.try_deserialize()
    }
}
