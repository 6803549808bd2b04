use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::engine::QuoteSettings;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub features: FeaturesConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    #[serde(default = "default_base_price")]
    pub base_price_per_evc: Decimal,
    #[serde(default = "default_currency")]
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CatalogConfig {
    /// Empty means the builtin catalog.
    #[serde(default)]
    pub path: String,
}

/// Toggles that used to be read from the environment by the UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturesConfig {
    #[serde(default = "default_true")]
    pub volume_discounts: bool,
    #[serde(default = "default_true")]
    pub custom_parameters: bool,
    #[serde(default)]
    pub show_notes: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_format")]
    pub format: String,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub base_price_per_evc: Option<Decimal>,
    pub currency: Option<String>,
    pub catalog_path: Option<PathBuf>,
    pub show_notes: Option<bool>,
}

impl Config {
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config/evc-quote/config.toml")
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed reading config: {}", path.display()))?;
        let parsed: Self = toml::from_str(&data)
            .with_context(|| format!("failed parsing TOML config: {}", path.display()))?;
        Ok(parsed)
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(price) = overrides.base_price_per_evc {
            self.pricing.base_price_per_evc = price;
        }
        if let Some(currency) = overrides.currency {
            self.pricing.currency = currency;
        }
        if let Some(path) = overrides.catalog_path {
            self.catalog.path = path.display().to_string();
        }
        if let Some(show_notes) = overrides.show_notes {
            self.features.show_notes = show_notes;
        }
    }

    pub fn write_template(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed creating config directory: {}", parent.display())
            })?;
        }
        fs::write(path, Self::default_template())
            .with_context(|| format!("failed writing config template: {}", path.display()))
    }

    pub fn catalog_path(&self) -> Option<PathBuf> {
        let trimmed = self.catalog.path.trim();
        if trimmed.is_empty() {
            return None;
        }
        let home_relative = trimmed
            .strip_prefix("~/")
            .and_then(|rest| dirs::home_dir().map(|home| home.join(rest)));
        Some(home_relative.unwrap_or_else(|| PathBuf::from(trimmed)))
    }

    pub fn settings(&self) -> QuoteSettings {
        QuoteSettings {
            base_price_per_evc: self.pricing.base_price_per_evc,
            apply_volume_discounts: self.features.volume_discounts,
            apply_custom_parameters: self.features.custom_parameters,
        }
    }

    pub fn default_template() -> String {
        let template = r#"[pricing]
base_price_per_evc = "100"
currency = "€"

[catalog]
# Leave empty to use the builtin catalog. JSON and TOML are supported.
path = ""

[features]
volume_discounts = true
custom_parameters = true
show_notes = false

[output]
format = "table"
"#;
        template.to_string()
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            base_price_per_evc: default_base_price(),
            currency: default_currency(),
        }
    }
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            volume_discounts: true,
            custom_parameters: true,
            show_notes: false,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
        }
    }
}

fn default_base_price() -> Decimal {
    Decimal::ONE_HUNDRED
}

fn default_currency() -> String {
    "€".to_string()
}

fn default_true() -> bool {
    true
}

fn default_format() -> String {
    "table".to_string()
}
