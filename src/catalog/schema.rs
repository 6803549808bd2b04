use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Delivery mode of a module. The discriminant is the index into
/// [`Module::variants`].
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[serde(rename_all = "snake_case")]
pub enum VariantId {
    #[default]
    InsightPrimer,
    IntegratedExecution,
}

impl VariantId {
    pub fn index(self) -> usize {
        match self {
            Self::InsightPrimer => 0,
            Self::IntegratedExecution => 1,
        }
    }

    pub fn as_slug(&self) -> &'static str {
        match self {
            Self::InsightPrimer => "insight-primer",
            Self::IntegratedExecution => "integrated-execution",
        }
    }
}

impl Display for VariantId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let display = match self {
            Self::InsightPrimer => "Insight Primer",
            Self::IntegratedExecution => "Integrated Execution",
        };
        write!(f, "{display}")
    }
}

#[derive(Debug, Error, PartialEq)]
#[error("unknown variant: {0}")]
pub struct VariantParseError(pub String);

impl FromStr for VariantId {
    type Err = VariantParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "0" | "primer" | "insight-primer" | "insight" => Ok(Self::InsightPrimer),
            "1" | "execution" | "integrated-execution" | "integrated" => {
                Ok(Self::IntegratedExecution)
            }
            _ => Err(VariantParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Catalog {
    #[serde(default)]
    pub modules: Vec<Module>,
    #[serde(default)]
    pub tiers: Vec<ProductionCapacityTier>,
    #[serde(default)]
    pub allocations: Vec<ResourceAllocationStrategy>,
    #[serde(default)]
    pub payment_options: Vec<PaymentOption>,
    #[serde(default)]
    pub volume_discounts: Vec<VolumeDiscount>,
    #[serde(default)]
    pub custom_parameters: Vec<CustomParameter>,
}

impl Catalog {
    pub fn module(&self, name: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.name == name)
    }

    pub fn tier(&self, id: &str) -> Option<&ProductionCapacityTier> {
        self.tiers.iter().find(|t| t.id == id)
    }

    pub fn allocation(&self, id: &str) -> Option<&ResourceAllocationStrategy> {
        self.allocations.iter().find(|a| a.id == id)
    }

    pub fn payment(&self, id: &str) -> Option<&PaymentOption> {
        self.payment_options.iter().find(|p| p.id == id)
    }

    pub fn parameter(&self, id: &str) -> Option<&CustomParameter> {
        self.custom_parameters.iter().find(|p| p.id == id)
    }

    pub fn modules_by_pillar(&self) -> BTreeMap<&str, Vec<&Module>> {
        let mut grouped: BTreeMap<&str, Vec<&Module>> = BTreeMap::new();
        for module in &self.modules {
            grouped.entry(module.pillar.as_str()).or_default().push(module);
        }
        grouped
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Module {
    pub name: String,
    pub pillar: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub variants: Vec<Variant>,
}

impl Module {
    pub fn variant(&self, id: VariantId) -> Option<&Variant> {
        self.variants.get(id.index())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Variant {
    Fixed {
        #[serde(default)]
        label: Option<String>,
        evc_value: u32,
    },
    Flexible {
        #[serde(default)]
        label: Option<String>,
        min_evcs_per_week: u32,
        recommended_evcs_per_week: u32,
        max_evcs_per_week: u32,
    },
}

impl Variant {
    pub fn fixed(evc_value: u32) -> Self {
        Self::Fixed {
            label: None,
            evc_value,
        }
    }

    pub fn flexible(min: u32, recommended: u32, max: u32) -> Self {
        Self::Flexible {
            label: None,
            min_evcs_per_week: min,
            recommended_evcs_per_week: recommended,
            max_evcs_per_week: max,
        }
    }

    pub fn is_flexible(&self) -> bool {
        matches!(self, Self::Flexible { .. })
    }

    /// EVC value used when no bandwidth override applies.
    pub fn default_evcs(&self) -> u32 {
        match self {
            Self::Fixed { evc_value, .. } => *evc_value,
            Self::Flexible {
                recommended_evcs_per_week,
                ..
            } => *recommended_evcs_per_week,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductionCapacityTier {
    pub id: String,
    pub label: String,
    pub weekly_evcs: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceAllocationStrategy {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub description: String,
    pub switching_overhead_percent: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentOption {
    pub id: String,
    pub name: String,
    pub price_modifier: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VolumeDiscount {
    pub threshold: u32,
    pub discount_percent: Decimal,
}

/// How much capacity an enabled parameter uses up.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum EvcCost {
    /// Fixed EVCs per week.
    Absolute(u32),
    /// Fraction of the scaled weekly capacity, rounded up.
    Relative(Decimal),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterEffect {
    Scale(Decimal),
    Consume(EvcCost),
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomParameter {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifier: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evc_cost: Option<EvcCost>,
}

impl CustomParameter {
    /// Validation guarantees at most one of `modifier` / `evc_cost` is set;
    /// should both slip through, the multiplier wins.
    pub fn effect(&self) -> ParameterEffect {
        match (self.modifier, self.evc_cost) {
            (Some(modifier), _) => ParameterEffect::Scale(modifier),
            (None, Some(cost)) => ParameterEffect::Consume(cost),
            (None, None) => ParameterEffect::None,
        }
    }
}
