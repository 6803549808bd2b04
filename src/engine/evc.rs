use tracing::warn;

use crate::catalog::{Catalog, Module, ResourceAllocationStrategy, Variant, VariantId};
use crate::engine::{ModuleLine, QuoteNote};
use crate::selection::Selection;

#[derive(Debug, Clone, PartialEq)]
pub struct ModuleEvc {
    pub evcs: u32,
    /// Variant actually priced; differs from the request after a fallback.
    pub variant: VariantId,
    pub note: Option<QuoteNote>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModuleAggregate {
    pub lines: Vec<ModuleLine>,
    pub total_evc_sum: u64,
    pub notes: Vec<QuoteNote>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Overhead {
    pub percent: u32,
    pub overhead_evcs: u64,
    pub total_evcs_with_overhead: u64,
}

/// EVC cost of one module in the requested variant.
///
/// Fixed variants cost their `evc_value`. Flexible variants cost the bandwidth
/// override when it lies within `[min, max]`, otherwise the recommended value.
/// A variant index the module does not define falls back to variant 0.
pub fn compute_module_evc(
    module: &Module,
    variant_id: VariantId,
    bandwidth_override: Option<u32>,
) -> ModuleEvc {
    let (variant, resolved, mut note) = match module.variant(variant_id) {
        Some(variant) => (variant, variant_id, None),
        None => match module.variants.first() {
            Some(variant) => (
                variant,
                VariantId::InsightPrimer,
                Some(QuoteNote::UnknownVariant {
                    module: module.name.clone(),
                    requested: variant_id,
                }),
            ),
            None => {
                return ModuleEvc {
                    evcs: 0,
                    variant: variant_id,
                    note: Some(QuoteNote::NoVariants {
                        module: module.name.clone(),
                    }),
                };
            }
        },
    };

    let evcs = match (variant, bandwidth_override) {
        (
            Variant::Flexible {
                min_evcs_per_week,
                recommended_evcs_per_week,
                max_evcs_per_week,
                ..
            },
            Some(requested),
        ) => {
            if (*min_evcs_per_week..=*max_evcs_per_week).contains(&requested) {
                requested
            } else {
                if note.is_none() {
                    note = Some(QuoteNote::BandwidthOutOfRange {
                        module: module.name.clone(),
                        requested,
                        min: *min_evcs_per_week,
                        max: *max_evcs_per_week,
                        used: *recommended_evcs_per_week,
                    });
                }
                *recommended_evcs_per_week
            }
        }
        (variant, _) => variant.default_evcs(),
    };

    ModuleEvc {
        evcs,
        variant: resolved,
        note,
    }
}

/// Sums module costs over the selection. Unknown module names contribute
/// nothing and are reported as notes.
pub fn aggregate_modules(catalog: &Catalog, selection: &Selection) -> ModuleAggregate {
    let mut aggregate = ModuleAggregate::default();
    for name in &selection.modules {
        let Some(module) = catalog.module(name) else {
            warn!("selected module not found in catalog: {name}");
            aggregate.notes.push(QuoteNote::UnknownModule { name: name.clone() });
            continue;
        };
        let priced = compute_module_evc(
            module,
            selection.variant_for(name),
            selection.bandwidth_for(name),
        );
        if let Some(note) = &priced.note {
            warn!("{note}");
            aggregate.notes.push(note.clone());
        }
        aggregate.total_evc_sum += u64::from(priced.evcs);
        aggregate.lines.push(ModuleLine {
            name: module.name.clone(),
            pillar: module.pillar.clone(),
            category: module.category.clone(),
            variant: priced.variant,
            flexible: module
                .variant(priced.variant)
                .is_some_and(Variant::is_flexible),
            evcs: priced.evcs,
        });
    }
    aggregate
}

/// Context-switching overhead, rounded up so resourcing is never under-counted.
pub fn compute_overhead(
    total_evc_sum: u64,
    strategy: Option<&ResourceAllocationStrategy>,
) -> Overhead {
    let percent = strategy.map_or(0, |s| s.switching_overhead_percent);
    let overhead_evcs = (total_evc_sum * u64::from(percent)).div_ceil(100);
    Overhead {
        percent,
        overhead_evcs,
        total_evcs_with_overhead: total_evc_sum + overhead_evcs,
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{aggregate_modules, compute_module_evc, compute_overhead};
    use crate::catalog::{Catalog, Module, ResourceAllocationStrategy, Variant, VariantId};
    use crate::engine::QuoteNote;
    use crate::selection::Selection;

    fn module(name: &str, variants: Vec<Variant>) -> Module {
        Module {
            name: name.to_string(),
            pillar: "Growth".to_string(),
            category: "Marketing".to_string(),
            description: String::new(),
            variants,
        }
    }

    fn strategy(percent: u32) -> ResourceAllocationStrategy {
        ResourceAllocationStrategy {
            id: format!("s{percent}"),
            label: format!("Strategy {percent}"),
            description: String::new(),
            switching_overhead_percent: percent,
        }
    }

    fn catalog() -> Catalog {
        Catalog {
            modules: vec![
                module("A", vec![Variant::fixed(30), Variant::fixed(60)]),
                module("B", vec![Variant::fixed(20), Variant::flexible(5, 10, 20)]),
                module("C", vec![Variant::fixed(50)]),
            ],
            tiers: Vec::new(),
            allocations: Vec::new(),
            payment_options: Vec::new(),
            volume_discounts: Vec::new(),
            custom_parameters: Vec::new(),
        }
    }

    #[test]
    fn fixed_variant_ignores_bandwidth_override() {
        let m = module("A", vec![Variant::fixed(30), Variant::fixed(60)]);
        let priced = compute_module_evc(&m, VariantId::IntegratedExecution, Some(3));
        assert_eq!(priced.evcs, 60);
        assert!(priced.note.is_none());
    }

    #[test]
    fn flexible_variant_uses_override_within_range() {
        let m = module("B", vec![Variant::fixed(20), Variant::flexible(5, 10, 20)]);
        assert_eq!(
            compute_module_evc(&m, VariantId::IntegratedExecution, Some(5)).evcs,
            5
        );
        assert_eq!(
            compute_module_evc(&m, VariantId::IntegratedExecution, Some(20)).evcs,
            20
        );
        assert_eq!(
            compute_module_evc(&m, VariantId::IntegratedExecution, None).evcs,
            10
        );
    }

    #[test]
    fn flexible_variant_out_of_range_uses_recommended() {
        let m = module("B", vec![Variant::fixed(20), Variant::flexible(5, 10, 20)]);
        let priced = compute_module_evc(&m, VariantId::IntegratedExecution, Some(21));
        assert_eq!(priced.evcs, 10);
        assert!(matches!(
            priced.note,
            Some(QuoteNote::BandwidthOutOfRange { requested: 21, used: 10, .. })
        ));
    }

    #[test]
    fn missing_variant_falls_back_to_first() {
        let m = module("C", vec![Variant::fixed(50)]);
        let priced = compute_module_evc(&m, VariantId::IntegratedExecution, None);
        assert_eq!(priced.evcs, 50);
        assert_eq!(priced.variant, VariantId::InsightPrimer);
        assert!(matches!(priced.note, Some(QuoteNote::UnknownVariant { .. })));
    }

    #[test]
    fn module_without_variants_costs_nothing() {
        let m = module("Empty", Vec::new());
        assert_eq!(compute_module_evc(&m, VariantId::InsightPrimer, None).evcs, 0);
    }

    #[test]
    fn aggregates_selected_modules_and_skips_unknown() {
        let selection = Selection::new()
            .with_module("A")
            .with_variant("B", VariantId::IntegratedExecution)
            .with_bandwidth("B", 15)
            .with_module("Ghost");
        let aggregate = aggregate_modules(&catalog(), &selection);
        assert_eq!(aggregate.total_evc_sum, 45);
        assert_eq!(aggregate.lines.len(), 2);
        assert!(aggregate.lines.iter().any(|l| l.name == "B" && l.flexible));
        assert_eq!(
            aggregate.notes,
            vec![QuoteNote::UnknownModule {
                name: "Ghost".to_string()
            }]
        );
    }

    #[test]
    fn empty_selection_sums_to_zero() {
        let aggregate = aggregate_modules(&catalog(), &Selection::new());
        assert_eq!(aggregate.total_evc_sum, 0);
        assert!(aggregate.lines.is_empty());
    }

    #[test]
    fn overhead_rounds_up() {
        let o = compute_overhead(100, Some(&strategy(20)));
        assert_eq!(o.overhead_evcs, 20);
        assert_eq!(o.total_evcs_with_overhead, 120);

        let o = compute_overhead(33, Some(&strategy(10)));
        assert_eq!(o.overhead_evcs, 4);

        let o = compute_overhead(50, None);
        assert_eq!(o.overhead_evcs, 0);
        assert_eq!(o.total_evcs_with_overhead, 50);
    }

    proptest! {
        #[test]
        fn overhead_is_ceiling_of_percentage(total in 0u64..100_000, pct in 0u32..=100) {
            let o = compute_overhead(total, Some(&strategy(pct)));
            let exact = total as f64 * f64::from(pct) / 100.0;
            prop_assert_eq!(o.overhead_evcs, exact.ceil() as u64);
            prop_assert_eq!(o.total_evcs_with_overhead, total + o.overhead_evcs);
        }

        #[test]
        fn aggregation_is_order_independent(
            names in proptest::sample::subsequence(vec!["A", "B", "C"], 0..=3)
        ) {
            let forward = names.iter().fold(Selection::new(), |s, n| s.with_module(n));
            let backward = names.iter().rev().fold(Selection::new(), |s, n| s.with_module(n));
            let catalog = catalog();
            prop_assert_eq!(
                aggregate_modules(&catalog, &forward).total_evc_sum,
                aggregate_modules(&catalog, &backward).total_evc_sum
            );
        }
    }
}
