use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::loader::has_extension;
use crate::catalog::{VariantId, VariantParseError};

/// User choices fed to the pricing engine. Every field is optional in the
/// sense that missing entries fall back to engine defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Selection {
    #[serde(default)]
    pub modules: BTreeSet<String>,
    #[serde(default)]
    pub variants: BTreeMap<String, VariantId>,
    #[serde(default)]
    pub tier: Option<String>,
    #[serde(default)]
    pub allocation: Option<String>,
    #[serde(default)]
    pub payment: Option<String>,
    #[serde(default)]
    pub custom_parameters: BTreeMap<String, bool>,
    #[serde(default)]
    pub bandwidth: BTreeMap<String, u32>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_module(mut self, name: &str) -> Self {
        self.modules.insert(name.to_string());
        self
    }

    pub fn with_variant(mut self, name: &str, variant: VariantId) -> Self {
        self.modules.insert(name.to_string());
        self.variants.insert(name.to_string(), variant);
        self
    }

    pub fn with_bandwidth(mut self, name: &str, evcs_per_week: u32) -> Self {
        self.bandwidth.insert(name.to_string(), evcs_per_week);
        self
    }

    pub fn with_tier(mut self, id: &str) -> Self {
        self.tier = Some(id.to_string());
        self
    }

    pub fn with_allocation(mut self, id: &str) -> Self {
        self.allocation = Some(id.to_string());
        self
    }

    pub fn with_payment(mut self, id: &str) -> Self {
        self.payment = Some(id.to_string());
        self
    }

    pub fn with_parameter(mut self, id: &str, enabled: bool) -> Self {
        self.custom_parameters.insert(id.to_string(), enabled);
        self
    }

    pub fn variant_for(&self, module: &str) -> VariantId {
        self.variants.get(module).copied().unwrap_or_default()
    }

    pub fn bandwidth_for(&self, module: &str) -> Option<u32> {
        self.bandwidth.get(module).copied()
    }

    pub fn enabled_parameters(&self) -> impl Iterator<Item = &str> {
        self.custom_parameters
            .iter()
            .filter(|(_, enabled)| **enabled)
            .map(|(id, _)| id.as_str())
    }

    pub fn apply_module_spec(&mut self, spec: ModuleSpec) {
        self.modules.insert(spec.name.clone());
        if let Some(variant) = spec.variant {
            self.variants.insert(spec.name.clone(), variant);
        }
        if let Some(bandwidth) = spec.bandwidth {
            self.bandwidth.insert(spec.name, bandwidth);
        }
    }
}

/// Parsed form of `NAME[=VARIANT[@BANDWIDTH]]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSpec {
    pub name: String,
    pub variant: Option<VariantId>,
    pub bandwidth: Option<u32>,
}

#[derive(Debug, Error, PartialEq)]
pub enum SelectionParseError {
    #[error("module name is empty")]
    EmptyName,
    #[error(transparent)]
    Variant(#[from] VariantParseError),
    #[error("invalid bandwidth `{0}`: expected a whole number of EVCs per week")]
    Bandwidth(String),
}

impl FromStr for ModuleSpec {
    type Err = SelectionParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (name, rest) = match raw.split_once('=') {
            Some((name, rest)) => (name.trim(), Some(rest.trim())),
            None => (raw.trim(), None),
        };
        if name.is_empty() {
            return Err(SelectionParseError::EmptyName);
        }
        let (variant, bandwidth) = match rest {
            None => (None, None),
            Some(rest) => match rest.split_once('@') {
                Some((variant, bw)) => {
                    let bw = bw.trim();
                    let parsed = bw
                        .parse::<u32>()
                        .map_err(|_| SelectionParseError::Bandwidth(bw.to_string()))?;
                    (Some(VariantId::from_str(variant)?), Some(parsed))
                }
                None => (Some(VariantId::from_str(rest)?), None),
            },
        };
        Ok(Self {
            name: name.to_string(),
            variant,
            bandwidth,
        })
    }
}

/// Reads a selection snapshot from JSON or TOML, chosen by file extension.
pub fn load_selection(path: &Path) -> Result<Selection> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed reading selection: {}", path.display()))?;
    if has_extension(path, "toml") {
        toml::from_str(&data)
            .with_context(|| format!("failed parsing TOML selection: {}", path.display()))
    } else {
        serde_json::from_str(&data)
            .with_context(|| format!("failed parsing JSON selection: {}", path.display()))
    }
}
