use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::catalog::{CustomParameter, EvcCost, ParameterEffect, ProductionCapacityTier};

/// Weekly throughput after custom parameters are applied.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Capacity {
    /// Tier throughput before any parameter.
    pub base: u64,
    /// Base scaled by every enabled modifier. This is the capacity that is priced.
    pub scaled: u64,
    /// EVCs per week reserved by cost-type parameters.
    pub consumed: u64,
    /// Capacity left for module work.
    pub available: u64,
    /// Set when the scaled figure fell outside the integer range and `scaled`
    /// kept the base throughput instead.
    #[serde(default)]
    pub modifiers_overflowed: bool,
}

pub fn compute_weekly_capacity<'a>(
    tier: Option<&ProductionCapacityTier>,
    enabled_parameters: impl IntoIterator<Item = &'a CustomParameter>,
) -> Capacity {
    let base = tier.map_or(0, |t| u64::from(t.weekly_evcs));

    let mut multiplier = Some(Decimal::ONE);
    let mut costs = Vec::new();
    for parameter in enabled_parameters {
        match parameter.effect() {
            ParameterEffect::Scale(modifier) => {
                multiplier = multiplier.and_then(|m| m.checked_mul(modifier));
            }
            ParameterEffect::Consume(cost) => costs.push(cost),
            ParameterEffect::None => {}
        }
    }

    let scaled = multiplier
        .and_then(|m| Decimal::from(base).checked_mul(m))
        .and_then(|value| {
            value
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                .to_u64()
        });
    let modifiers_overflowed = scaled.is_none();
    let scaled = scaled.unwrap_or(base);

    // A relative cost too large to represent reserves everything.
    let consumed = costs.iter().fold(0u64, |total, cost| {
        let evcs = match cost {
            EvcCost::Absolute(evcs) => u64::from(*evcs),
            EvcCost::Relative(fraction) => Decimal::from(scaled)
                .checked_mul(*fraction)
                .and_then(|value| value.ceil().to_u64())
                .unwrap_or(scaled),
        };
        total.saturating_add(evcs)
    });

    Capacity {
        base,
        scaled,
        consumed,
        available: scaled.saturating_sub(consumed),
        modifiers_overflowed,
    }
}

/// Whole weeks to deliver `total_evcs` at `weekly_capacity`, never less than
/// one once capacity is known. Zero capacity yields zero.
pub fn compute_completion_weeks(total_evcs: u64, weekly_capacity: u64) -> u64 {
    if weekly_capacity == 0 {
        return 0;
    }
    total_evcs.div_ceil(weekly_capacity).max(1)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    use super::{compute_completion_weeks, compute_weekly_capacity, Capacity};
    use crate::catalog::{CustomParameter, EvcCost, ProductionCapacityTier};

    fn tier(weekly_evcs: u32) -> ProductionCapacityTier {
        ProductionCapacityTier {
            id: "t".to_string(),
            label: "Tier".to_string(),
            weekly_evcs,
        }
    }

    fn parameter(modifier: Option<Decimal>, evc_cost: Option<EvcCost>) -> CustomParameter {
        CustomParameter {
            id: "p".to_string(),
            label: "Param".to_string(),
            description: String::new(),
            modifier,
            evc_cost,
        }
    }

    #[test]
    fn unset_tier_has_zero_capacity() {
        let none: Vec<&CustomParameter> = Vec::new();
        assert_eq!(compute_weekly_capacity(None, none), Capacity::default());
    }

    #[test]
    fn modifiers_scale_base_throughput() {
        let boost = parameter(Some(Decimal::new(125, 2)), None);
        let c = compute_weekly_capacity(Some(&tier(40)), [&boost]);
        assert_eq!(c.base, 40);
        assert_eq!(c.scaled, 50);
        assert_eq!(c.available, 50);
    }

    #[test]
    fn scaled_capacity_rounds_half_up() {
        let boost = parameter(Some(Decimal::new(125, 2)), None);
        // 10 * 1.25 = 12.5
        assert_eq!(compute_weekly_capacity(Some(&tier(10)), [&boost]).scaled, 13);
    }

    #[test]
    fn costs_consume_capacity_without_scaling() {
        let lead = parameter(None, Some(EvcCost::Absolute(2)));
        let review = parameter(None, Some(EvcCost::Relative(Decimal::new(1, 1))));
        let c = compute_weekly_capacity(Some(&tier(25)), [&lead, &review]);
        assert_eq!(c.scaled, 25);
        // 2 + ceil(2.5)
        assert_eq!(c.consumed, 5);
        assert_eq!(c.available, 20);
    }

    #[test]
    fn consumption_saturates_at_zero() {
        let heavy = parameter(None, Some(EvcCost::Absolute(50)));
        let c = compute_weekly_capacity(Some(&tier(10)), [&heavy]);
        assert_eq!(c.available, 0);
    }

    #[test]
    fn unrepresentable_scaling_keeps_base_throughput() {
        let huge = parameter(Some(Decimal::MAX), None);
        let c = compute_weekly_capacity(Some(&tier(80)), [&huge, &huge]);
        assert!(c.modifiers_overflowed);
        assert_eq!(c.scaled, 80);

        let wide = parameter(Some(Decimal::from(u64::MAX)), None);
        let c = compute_weekly_capacity(Some(&tier(80)), [&wide]);
        assert!(c.modifiers_overflowed);
        assert_eq!(c.scaled, 80);
    }

    #[test]
    fn completion_weeks_examples() {
        assert_eq!(compute_completion_weeks(120, 40), 3);
        assert_eq!(compute_completion_weeks(121, 40), 4);
        assert_eq!(compute_completion_weeks(0, 40), 1);
        assert_eq!(compute_completion_weeks(0, 0), 0);
        assert_eq!(compute_completion_weeks(500, 0), 0);
    }

    proptest! {
        #[test]
        fn completion_weeks_at_least_one_with_capacity(
            total in 0u64..1_000_000,
            cap in 1u64..10_000
        ) {
            prop_assert!(compute_completion_weeks(total, cap) >= 1);
        }

        #[test]
        fn completion_weeks_monotonic_in_total(
            total in 0u64..1_000_000,
            extra in 0u64..10_000,
            cap in 1u64..10_000
        ) {
            prop_assert!(
                compute_completion_weeks(total + extra, cap) >= compute_completion_weeks(total, cap)
            );
        }
    }
}
