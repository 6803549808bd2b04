use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::VolumeDiscount;

const WEEKS_PER_MONTH: u32 = 4;
const WEEKS_PER_QUARTER: u32 = 13;
const WEEKS_PER_YEAR: u32 = 52;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Projections {
    pub monthly: Decimal,
    pub quarterly: Decimal,
    pub annual: Decimal,
}

impl Projections {
    /// Week-count approximation of calendar periods.
    pub fn from_weekly(weekly: Decimal) -> Result<Self, PricingError> {
        let over = |weeks: u32| {
            weekly
                .checked_mul(Decimal::from(weeks))
                .ok_or(PricingError::Overflow("projection"))
        };
        Ok(Self {
            monthly: over(WEEKS_PER_MONTH)?,
            quarterly: over(WEEKS_PER_QUARTER)?,
            annual: over(WEEKS_PER_YEAR)?,
        })
    }
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum PricingError {
    #[error("{0} exceeds the representable decimal range")]
    Overflow(&'static str),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Pricing {
    pub evc_price_per_unit: Decimal,
    pub total_price: Decimal,
    pub projections: Projections,
}

/// Discount of the largest threshold strictly exceeded by `weekly_capacity`.
/// Thresholds do not stack.
pub fn compute_volume_discount(weekly_capacity: u64, table: &[VolumeDiscount]) -> Decimal {
    let mut ordered = table.iter().collect::<Vec<_>>();
    ordered.sort_by(|a, b| b.threshold.cmp(&a.threshold));
    ordered
        .into_iter()
        .find(|d| weekly_capacity > u64::from(d.threshold))
        .map_or(Decimal::ZERO, |d| d.discount_percent)
}

pub fn compute_pricing(
    weekly_capacity: u64,
    base_price: Decimal,
    payment_modifier: Decimal,
    volume_discount_percent: Decimal,
) -> Result<Pricing, PricingError> {
    let discount_factor = Decimal::ONE
        .checked_sub(volume_discount_percent / Decimal::ONE_HUNDRED)
        .ok_or(PricingError::Overflow("volume discount"))?;
    let evc_price_per_unit = base_price
        .checked_mul(payment_modifier)
        .and_then(|price| price.checked_mul(discount_factor))
        .ok_or(PricingError::Overflow("price per EVC"))?;
    let total_price = evc_price_per_unit
        .checked_mul(Decimal::from(weekly_capacity))
        .ok_or(PricingError::Overflow("weekly price"))?;
    Ok(Pricing {
        evc_price_per_unit,
        total_price,
        projections: Projections::from_weekly(total_price)?,
    })
}
