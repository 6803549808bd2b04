use std::fmt::{Display, Formatter};
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::Catalog;
use crate::engine::{compute_quote, Quote, QuoteSettings};
use crate::selection::Selection;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CompareAxis {
    Tier,
    Allocation,
    Payment,
}

impl Display for CompareAxis {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let display = match self {
            Self::Tier => "tier",
            Self::Allocation => "allocation",
            Self::Payment => "payment",
        };
        write!(f, "{display}")
    }
}

#[derive(Debug, Error)]
#[error("unknown comparison axis: {0} (expected tier, allocation or payment)")]
pub struct AxisParseError(pub String);

impl FromStr for CompareAxis {
    type Err = AxisParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tier" | "tiers" | "capacity" => Ok(Self::Tier),
            "allocation" | "allocations" | "strategy" => Ok(Self::Allocation),
            "payment" | "payments" => Ok(Self::Payment),
            _ => Err(AxisParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub id: String,
    pub label: String,
    pub current: bool,
    pub weekly_production_capacity: u64,
    pub evc_price_per_unit: Decimal,
    pub total_price: Decimal,
    pub completion_weeks: u64,
    pub price_delta: Decimal,
    pub weeks_delta: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comparison {
    pub axis: CompareAxis,
    pub baseline: Quote,
    pub rows: Vec<ComparisonRow>,
}

/// Re-prices the selection once per catalog entry on `axis`, keeping every
/// other choice fixed.
pub fn compare_options(
    catalog: &Catalog,
    selection: &Selection,
    settings: &QuoteSettings,
    axis: CompareAxis,
) -> Comparison {
    let baseline = compute_quote(catalog, selection, settings);

    let candidates: Vec<(String, String)> = match axis {
        CompareAxis::Tier => catalog
            .tiers
            .iter()
            .map(|t| (t.id.clone(), t.label.clone()))
            .collect(),
        CompareAxis::Allocation => catalog
            .allocations
            .iter()
            .map(|a| (a.id.clone(), a.label.clone()))
            .collect(),
        CompareAxis::Payment => catalog
            .payment_options
            .iter()
            .map(|p| (p.id.clone(), p.name.clone()))
            .collect(),
    };

    let current_id = match axis {
        CompareAxis::Tier => selection.tier.as_deref(),
        CompareAxis::Allocation => selection.allocation.as_deref(),
        CompareAxis::Payment => selection.payment.as_deref(),
    };

    let rows = candidates
        .into_iter()
        .map(|(id, label)| {
            let mut changed = selection.clone();
            match axis {
                CompareAxis::Tier => changed.tier = Some(id.clone()),
                CompareAxis::Allocation => changed.allocation = Some(id.clone()),
                CompareAxis::Payment => changed.payment = Some(id.clone()),
            }
            let quote = compute_quote(catalog, &changed, settings);
            ComparisonRow {
                current: current_id == Some(id.as_str()),
                id,
                label,
                weekly_production_capacity: quote.weekly_production_capacity,
                evc_price_per_unit: quote.evc_price_per_unit,
                total_price: quote.total_price,
                completion_weeks: quote.completion_weeks,
                price_delta: quote
                    .total_price
                    .checked_sub(baseline.total_price)
                    .unwrap_or_default(),
                weeks_delta: signed_delta(quote.completion_weeks, baseline.completion_weeks),
            }
        })
        .collect();

    Comparison {
        axis,
        baseline,
        rows,
    }
}

fn signed_delta(after: u64, before: u64) -> i64 {
    i64::try_from(after)
        .unwrap_or(i64::MAX)
        .saturating_sub(i64::try_from(before).unwrap_or(i64::MAX))
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{compare_options, CompareAxis};
    use crate::catalog::Catalog;
    use crate::engine::QuoteSettings;
    use crate::selection::Selection;

    #[test]
    fn parses_axis_names() {
        assert_eq!("Tier".parse::<CompareAxis>().ok(), Some(CompareAxis::Tier));
        assert_eq!(
            "strategy".parse::<CompareAxis>().ok(),
            Some(CompareAxis::Allocation)
        );
        assert!("colour".parse::<CompareAxis>().is_err());
    }

    #[test]
    fn compares_every_tier_against_current_selection() {
        let catalog = Catalog::builtin().expect("builtin catalog failed to load");
        let selection = Selection::new()
            .with_module("Data & Analytics Foundations")
            .with_module("Market Opportunity Scan")
            .with_tier("growth");
        let comparison = compare_options(
            &catalog,
            &selection,
            &QuoteSettings::default(),
            CompareAxis::Tier,
        );

        assert_eq!(comparison.rows.len(), catalog.tiers.len());
        let current = comparison
            .rows
            .iter()
            .find(|r| r.current)
            .expect("current tier missing");
        assert_eq!(current.id, "growth");
        assert_eq!(current.price_delta, Decimal::ZERO);
        assert_eq!(current.weeks_delta, 0);

        // 22 EVCs: growth (20/week) takes 2 weeks, starter (10/week) takes 3
        let starter = comparison
            .rows
            .iter()
            .find(|r| r.id == "starter")
            .expect("starter tier missing");
        assert_eq!(starter.completion_weeks, 3);
        assert_eq!(starter.weeks_delta, 1);
        assert!(starter.price_delta < Decimal::ZERO);
    }

    #[test]
    fn payment_comparison_keeps_capacity_fixed() {
        let catalog = Catalog::builtin().expect("builtin catalog failed to load");
        let selection = Selection::new().with_tier("scale");
        let comparison = compare_options(
            &catalog,
            &selection,
            &QuoteSettings::default(),
            CompareAxis::Payment,
        );
        assert!(comparison
            .rows
            .iter()
            .all(|r| r.weekly_production_capacity == 40));
        assert!(comparison.rows.iter().all(|r| !r.current));
    }
}
