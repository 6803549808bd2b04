use std::collections::BTreeSet;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::catalog::{Catalog, EvcCost, Variant};

#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("module {0} has no variants")]
    NoVariants(String),
    #[error("duplicate {kind} id: {id}")]
    Duplicate { kind: &'static str, id: String },
    #[error("tier {0} has zero weekly capacity")]
    ZeroCapacityTier(String),
    #[error("module {module}: flexible bandwidth {min}/{recommended}/{max} is not ordered min <= recommended <= max")]
    InvalidBandwidth {
        module: String,
        min: u32,
        recommended: u32,
        max: u32,
    },
    #[error("allocation {id}: switching overhead {percent}% exceeds 100%")]
    OverheadOutOfRange { id: String, percent: u32 },
    #[error("payment option {0} has a negative price modifier")]
    NegativePriceModifier(String),
    #[error("volume discount at threshold {threshold}: {percent}% is outside [0, 100]")]
    DiscountOutOfRange { threshold: u32, percent: Decimal },
    #[error("custom parameter {0} defines both a modifier and an evc cost")]
    AmbiguousParameter(String),
    #[error("custom parameter {0} has a negative modifier or cost")]
    NegativeParameter(String),
}

pub fn validate_catalog(catalog: &Catalog) -> Result<(), CatalogError> {
    check_unique("module", catalog.modules.iter().map(|m| m.name.as_str()))?;
    check_unique("tier", catalog.tiers.iter().map(|t| t.id.as_str()))?;
    check_unique("allocation", catalog.allocations.iter().map(|a| a.id.as_str()))?;
    check_unique("payment", catalog.payment_options.iter().map(|p| p.id.as_str()))?;
    check_unique(
        "custom parameter",
        catalog.custom_parameters.iter().map(|p| p.id.as_str()),
    )?;

    for module in &catalog.modules {
        if module.variants.is_empty() {
            return Err(CatalogError::NoVariants(module.name.clone()));
        }
        for variant in &module.variants {
            if let Variant::Flexible {
                min_evcs_per_week,
                recommended_evcs_per_week,
                max_evcs_per_week,
                ..
            } = variant
            {
                if min_evcs_per_week > recommended_evcs_per_week
                    || recommended_evcs_per_week > max_evcs_per_week
                {
                    return Err(CatalogError::InvalidBandwidth {
                        module: module.name.clone(),
                        min: *min_evcs_per_week,
                        recommended: *recommended_evcs_per_week,
                        max: *max_evcs_per_week,
                    });
                }
            }
        }
    }

    for tier in &catalog.tiers {
        if tier.weekly_evcs == 0 {
            return Err(CatalogError::ZeroCapacityTier(tier.id.clone()));
        }
    }

    for allocation in &catalog.allocations {
        if allocation.switching_overhead_percent > 100 {
            return Err(CatalogError::OverheadOutOfRange {
                id: allocation.id.clone(),
                percent: allocation.switching_overhead_percent,
            });
        }
    }

    for payment in &catalog.payment_options {
        if payment.price_modifier < Decimal::ZERO {
            return Err(CatalogError::NegativePriceModifier(payment.id.clone()));
        }
    }

    let hundred = Decimal::ONE_HUNDRED;
    for discount in &catalog.volume_discounts {
        if discount.discount_percent < Decimal::ZERO || discount.discount_percent > hundred {
            return Err(CatalogError::DiscountOutOfRange {
                threshold: discount.threshold,
                percent: discount.discount_percent,
            });
        }
    }

    for parameter in &catalog.custom_parameters {
        if parameter.modifier.is_some() && parameter.evc_cost.is_some() {
            return Err(CatalogError::AmbiguousParameter(parameter.id.clone()));
        }
        let negative_modifier = parameter.modifier.is_some_and(|m| m < Decimal::ZERO);
        let negative_cost =
            matches!(parameter.evc_cost, Some(EvcCost::Relative(f)) if f < Decimal::ZERO);
        if negative_modifier || negative_cost {
            return Err(CatalogError::NegativeParameter(parameter.id.clone()));
        }
    }

    Ok(())
}

fn check_unique<'a>(
    kind: &'static str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<(), CatalogError> {
    let mut seen = BTreeSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(CatalogError::Duplicate {
                kind,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}
