//! EVC pricing engine.
//!
//! Turns a [`Selection`] and a [`Catalog`] into a [`Quote`]: module EVC
//! totals, allocation overhead, weekly capacity, price and completion time.
//! Every function here is pure and infallible; missing or unknown selection
//! data degrades to a zero or default-derived figure and is recorded as a
//! [`QuoteNote`].

pub mod capacity;
pub mod evc;
pub mod pricing;

use std::fmt::{Display, Formatter};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::{Catalog, VariantId};
use crate::selection::Selection;

pub use capacity::{compute_completion_weeks, compute_weekly_capacity, Capacity};
pub use evc::{aggregate_modules, compute_module_evc, compute_overhead, ModuleAggregate, Overhead};
pub use pricing::{compute_pricing, compute_volume_discount, Pricing, PricingError, Projections};

/// Inputs that come from configuration rather than the user's selection.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteSettings {
    pub base_price_per_evc: Decimal,
    pub apply_volume_discounts: bool,
    pub apply_custom_parameters: bool,
}

impl Default for QuoteSettings {
    fn default() -> Self {
        Self {
            base_price_per_evc: Decimal::ONE_HUNDRED,
            apply_volume_discounts: true,
            apply_custom_parameters: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModuleLine {
    pub name: String,
    pub pillar: String,
    pub category: String,
    pub variant: VariantId,
    pub flexible: bool,
    pub evcs: u32,
}

/// A default the engine substituted for missing or out-of-range input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuoteNote {
    UnknownModule {
        name: String,
    },
    NoVariants {
        module: String,
    },
    UnknownVariant {
        module: String,
        requested: VariantId,
    },
    BandwidthOutOfRange {
        module: String,
        requested: u32,
        min: u32,
        max: u32,
        used: u32,
    },
    TierNotSelected,
    UnknownTier {
        id: String,
    },
    UnknownAllocation {
        id: String,
    },
    UnknownPayment {
        id: String,
    },
    UnknownParameter {
        id: String,
    },
    CapacityExhausted {
        scaled: u64,
        consumed: u64,
    },
    ModifiersOverflowed {
        base: u64,
    },
    PriceOverflowed {
        reason: String,
    },
}

impl Display for QuoteNote {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownModule { name } => {
                write!(f, "module {name} is not in the catalog; skipped")
            }
            Self::NoVariants { module } => {
                write!(f, "module {module} has no variants; priced at 0 EVC")
            }
            Self::UnknownVariant { module, requested } => write!(
                f,
                "module {module} has no {requested} variant; priced as {}",
                VariantId::InsightPrimer
            ),
            Self::BandwidthOutOfRange {
                module,
                requested,
                min,
                max,
                used,
            } => write!(
                f,
                "module {module}: bandwidth {requested} outside [{min}, {max}]; \
                 using recommended {used}"
            ),
            Self::TierNotSelected => write!(f, "no capacity tier selected; capacity is 0"),
            Self::UnknownTier { id } => write!(f, "tier {id} is not in the catalog; capacity is 0"),
            Self::UnknownAllocation { id } => {
                write!(f, "allocation {id} is not in the catalog; no overhead applied")
            }
            Self::UnknownPayment { id } => {
                write!(f, "payment option {id} is not in the catalog; no modifier applied")
            }
            Self::UnknownParameter { id } => {
                write!(f, "custom parameter {id} is not in the catalog; ignored")
            }
            Self::CapacityExhausted { scaled, consumed } => write!(
                f,
                "custom parameters reserve {consumed} of {scaled} EVC/week; \
                 delivery estimated at 1 EVC/week"
            ),
            Self::ModifiersOverflowed { base } => write!(
                f,
                "capacity modifiers overflow; using base throughput {base} EVC/week"
            ),
            Self::PriceOverflowed { reason } => write!(f, "{reason}; price reported as 0"),
        }
    }
}

/// Everything derived from one selection snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Quote {
    pub module_lines: Vec<ModuleLine>,
    pub total_evc_sum: u64,
    pub tier: Option<String>,
    pub allocation: Option<String>,
    pub payment: Option<String>,
    pub enabled_parameters: Vec<String>,
    pub overhead_percent: u32,
    pub overhead_evcs: u64,
    pub total_evcs_with_overhead: u64,
    pub capacity: Capacity,
    pub weekly_production_capacity: u64,
    pub base_price_per_evc: Decimal,
    pub payment_modifier: Decimal,
    pub volume_discount_percent: Decimal,
    pub evc_price_per_unit: Decimal,
    pub total_price: Decimal,
    pub projections: Projections,
    pub completion_weeks: u64,
    pub notes: Vec<QuoteNote>,
}

pub fn compute_quote(catalog: &Catalog, selection: &Selection, settings: &QuoteSettings) -> Quote {
    let ModuleAggregate {
        lines: module_lines,
        total_evc_sum,
        mut notes,
    } = aggregate_modules(catalog, selection);

    let allocation = selection.allocation.as_deref().and_then(|id| {
        let found = catalog.allocation(id);
        if found.is_none() {
            warn!("allocation not found in catalog: {id}");
            notes.push(QuoteNote::UnknownAllocation { id: id.to_string() });
        }
        found
    });
    let overhead = compute_overhead(total_evc_sum, allocation);

    let tier = match selection.tier.as_deref() {
        None => {
            notes.push(QuoteNote::TierNotSelected);
            None
        }
        Some(id) => {
            let found = catalog.tier(id);
            if found.is_none() {
                warn!("tier not found in catalog: {id}");
                notes.push(QuoteNote::UnknownTier { id: id.to_string() });
            }
            found
        }
    };

    let mut parameters = Vec::new();
    if settings.apply_custom_parameters {
        for id in selection.enabled_parameters() {
            match catalog.parameter(id) {
                Some(parameter) => parameters.push(parameter),
                None => {
                    warn!("custom parameter not found in catalog: {id}");
                    notes.push(QuoteNote::UnknownParameter { id: id.to_string() });
                }
            }
        }
    }
    let capacity = compute_weekly_capacity(tier, parameters.iter().copied());
    if capacity.modifiers_overflowed {
        warn!("capacity modifiers overflowed, using base throughput");
        notes.push(QuoteNote::ModifiersOverflowed {
            base: capacity.base,
        });
    }
    let weekly_production_capacity = capacity.scaled;

    // Fully reserved capacity still delivers, just at the slowest rate.
    let delivery_capacity = if capacity.scaled > 0 && capacity.available == 0 {
        warn!(
            scaled = capacity.scaled,
            consumed = capacity.consumed,
            "custom parameters reserve all capacity"
        );
        notes.push(QuoteNote::CapacityExhausted {
            scaled: capacity.scaled,
            consumed: capacity.consumed,
        });
        1
    } else {
        capacity.available
    };

    let payment = selection.payment.as_deref().and_then(|id| {
        let found = catalog.payment(id);
        if found.is_none() {
            warn!("payment option not found in catalog: {id}");
            notes.push(QuoteNote::UnknownPayment { id: id.to_string() });
        }
        found
    });
    let payment_modifier = payment.map_or(Decimal::ONE, |p| p.price_modifier);

    let volume_discount_percent = if settings.apply_volume_discounts {
        compute_volume_discount(weekly_production_capacity, &catalog.volume_discounts)
    } else {
        Decimal::ZERO
    };

    let pricing = compute_pricing(
        weekly_production_capacity,
        settings.base_price_per_evc,
        payment_modifier,
        volume_discount_percent,
    )
    .unwrap_or_else(|err| {
        warn!("pricing failed: {err}");
        notes.push(QuoteNote::PriceOverflowed {
            reason: err.to_string(),
        });
        Pricing::default()
    });
    let completion_weeks =
        compute_completion_weeks(overhead.total_evcs_with_overhead, delivery_capacity);

    debug!(
        total_evc_sum,
        overhead_evcs = overhead.overhead_evcs,
        weekly_production_capacity,
        completion_weeks,
        "computed quote"
    );

    Quote {
        module_lines,
        total_evc_sum,
        tier: tier.map(|t| t.label.clone()),
        allocation: allocation.map(|a| a.label.clone()),
        payment: payment.map(|p| p.name.clone()),
        enabled_parameters: parameters.iter().map(|p| p.label.clone()).collect(),
        overhead_percent: overhead.percent,
        overhead_evcs: overhead.overhead_evcs,
        total_evcs_with_overhead: overhead.total_evcs_with_overhead,
        capacity,
        weekly_production_capacity,
        base_price_per_evc: settings.base_price_per_evc,
        payment_modifier,
        volume_discount_percent,
        evc_price_per_unit: pricing.evc_price_per_unit,
        total_price: pricing.total_price,
        projections: pricing.projections,
        completion_weeks,
        notes,
    }
}
