use std::collections::BTreeMap;

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Row, Table};
use rust_decimal::Decimal;

use crate::catalog::{Catalog, EvcCost, ParameterEffect, Variant};
use crate::compare::Comparison;
use crate::engine::{ModuleLine, Quote};
use crate::output::{format_percent, ReportMeta};

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn or_dash(value: Option<&str>) -> String {
    value.map_or_else(|| "-".to_string(), str::to_string)
}

fn right(text: impl ToString) -> Cell {
    Cell::new(text.to_string()).set_alignment(CellAlignment::Right)
}

/// Compact sidebar view of a quote.
pub fn render_summary_table(quote: &Quote, meta: &ReportMeta) -> String {
    let mut table = new_table();
    table.set_header(vec!["Figure", "Value"]);
    let rows: Vec<(&str, String)> = vec![
        ("Modules selected", quote.module_lines.len().to_string()),
        ("Capacity tier", or_dash(quote.tier.as_deref())),
        ("Weekly capacity", format!("{} EVC", quote.weekly_production_capacity)),
        ("Price per EVC", meta.money(quote.evc_price_per_unit)),
        ("Weekly price", meta.money(quote.total_price)),
        ("Total EVCs", quote.total_evc_sum.to_string()),
        (
            "Overhead",
            format!("{} EVC ({}%)", quote.overhead_evcs, quote.overhead_percent),
        ),
        ("Total incl. overhead", quote.total_evcs_with_overhead.to_string()),
        ("Estimated completion", weeks_label(quote.completion_weeks)),
    ];
    for (label, value) in rows {
        table.add_row(Row::from(vec![Cell::new(label), right(value)]));
    }

    let mut out = table.to_string();
    append_notes(&mut out, quote, meta);
    out
}

/// Full solution brief: selection, module breakdown, capacity, pricing and
/// projections.
pub fn render_report(quote: &Quote, meta: &ReportMeta) -> String {
    let mut out = String::new();
    out.push_str("EVC Solution Brief\n");
    out.push_str(&format!(
        "Generated {} | catalog {}\n\n",
        meta.generated_at.format("%Y-%m-%d %H:%M UTC"),
        meta.catalog_digest.chars().take(12).collect::<String>()
    ));

    let mut selection = new_table();
    selection.set_header(vec!["Choice", "Selected"]);
    selection.add_row(vec!["Capacity tier".to_string(), or_dash(quote.tier.as_deref())]);
    selection.add_row(vec![
        "Resource allocation".to_string(),
        or_dash(quote.allocation.as_deref()),
    ]);
    selection.add_row(vec!["Payment".to_string(), or_dash(quote.payment.as_deref())]);
    selection.add_row(vec![
        "Custom parameters".to_string(),
        if quote.enabled_parameters.is_empty() {
            "-".to_string()
        } else {
            quote.enabled_parameters.join(", ")
        },
    ]);
    out.push_str(&selection.to_string());
    out.push_str("\n\n");

    out.push_str(&render_module_table(&quote.module_lines));
    out.push_str("\n\n");

    let mut capacity = new_table();
    capacity.set_header(vec!["Capacity", "EVC / week"]);
    capacity.add_row(Row::from(vec![
        Cell::new("Tier throughput"),
        right(quote.capacity.base),
    ]));
    capacity.add_row(Row::from(vec![
        Cell::new("After modifiers (priced)"),
        right(quote.capacity.scaled),
    ]));
    capacity.add_row(Row::from(vec![
        Cell::new("Reserved by parameters"),
        right(quote.capacity.consumed),
    ]));
    capacity.add_row(Row::from(vec![
        Cell::new("Available for modules"),
        right(quote.capacity.available),
    ]));
    out.push_str(&capacity.to_string());
    out.push_str("\n\n");

    let mut pricing = new_table();
    pricing.set_header(vec!["Pricing", "Value"]);
    let pricing_rows = vec![
        ("Base price per EVC", meta.money(quote.base_price_per_evc)),
        ("Payment modifier", format!("x{}", quote.payment_modifier.normalize())),
        (
            "Volume discount",
            format_percent(quote.volume_discount_percent),
        ),
        ("Price per EVC", meta.money(quote.evc_price_per_unit)),
        ("Weekly price", meta.money(quote.total_price)),
        ("Monthly (4 weeks)", meta.money(quote.projections.monthly)),
        ("Quarterly (13 weeks)", meta.money(quote.projections.quarterly)),
        ("Annual (52 weeks)", meta.money(quote.projections.annual)),
    ];
    for (label, value) in pricing_rows {
        pricing.add_row(Row::from(vec![Cell::new(label), right(value)]));
    }
    out.push_str(&pricing.to_string());

    out.push_str(&format!(
        "\n\nDelivery: {} EVC + {} EVC overhead ({}%) = {} EVC, estimated {}.",
        quote.total_evc_sum,
        quote.overhead_evcs,
        quote.overhead_percent,
        quote.total_evcs_with_overhead,
        weeks_label(quote.completion_weeks)
    ));
    append_notes(&mut out, quote, meta);
    out
}

fn render_module_table(lines: &[ModuleLine]) -> String {
    let mut table = new_table();
    table.set_header(vec!["Pillar", "Module", "Category", "Variant", "EVC"]);

    let mut by_pillar: BTreeMap<&str, Vec<&ModuleLine>> = BTreeMap::new();
    for line in lines {
        by_pillar.entry(line.pillar.as_str()).or_default().push(line);
    }
    for (pillar, lines) in by_pillar {
        let subtotal: u64 = lines.iter().map(|l| u64::from(l.evcs)).sum();
        for line in lines {
            let variant = if line.flexible {
                format!("{} (flexible)", line.variant)
            } else {
                line.variant.to_string()
            };
            table.add_row(Row::from(vec![
                Cell::new(pillar),
                Cell::new(&line.name),
                Cell::new(&line.category),
                Cell::new(variant),
                right(line.evcs),
            ]));
        }
        table.add_row(Row::from(vec![
            Cell::new(pillar).fg(Color::DarkGrey),
            Cell::new("subtotal").fg(Color::DarkGrey),
            Cell::new(""),
            Cell::new(""),
            right(subtotal).fg(Color::DarkGrey),
        ]));
    }
    table.to_string()
}

fn append_notes(out: &mut String, quote: &Quote, meta: &ReportMeta) {
    if !meta.show_notes || quote.notes.is_empty() {
        return;
    }
    out.push_str("\n\nNotes:");
    for note in &quote.notes {
        out.push_str(&format!("\n  - {note}"));
    }
}

fn weeks_label(weeks: u64) -> String {
    match weeks {
        0 => "n/a (no capacity)".to_string(),
        1 => "1 week".to_string(),
        n => format!("{n} weeks"),
    }
}

pub fn render_comparison_table(comparison: &Comparison, meta: &ReportMeta) -> String {
    let mut table = new_table();
    table.set_header(vec![
        "",
        "Option",
        "Capacity",
        "Price / EVC",
        "Weekly price",
        "Weeks",
        "Price change",
        "Weeks change",
    ]);
    for row in &comparison.rows {
        let marker = if row.current { "*" } else { "" };
        let price_delta = if row.price_delta.is_sign_negative() && !row.price_delta.is_zero() {
            Cell::new(meta.money(row.price_delta)).fg(Color::Green)
        } else if row.price_delta.is_zero() {
            Cell::new(meta.money(row.price_delta))
        } else {
            Cell::new(format!("+{}", meta.money(row.price_delta))).fg(Color::Red)
        };
        table.add_row(Row::from(vec![
            Cell::new(marker),
            Cell::new(format!("{} ({})", row.label, row.id)),
            right(row.weekly_production_capacity),
            right(meta.money(row.evc_price_per_unit)),
            right(meta.money(row.total_price)),
            right(row.completion_weeks),
            price_delta.set_alignment(CellAlignment::Right),
            right(format!("{:+}", row.weeks_delta)),
        ]));
    }
    format!(
        "Comparing by {}; * marks the current selection\n{}",
        comparison.axis, table
    )
}

fn describe_variant(variant: Option<&Variant>) -> String {
    match variant {
        None => "-".to_string(),
        Some(Variant::Fixed { evc_value, .. }) => format!("{evc_value} EVC"),
        Some(Variant::Flexible {
            min_evcs_per_week,
            recommended_evcs_per_week,
            max_evcs_per_week,
            ..
        }) => format!(
            "{min_evcs_per_week}-{max_evcs_per_week} EVC/wk (rec. {recommended_evcs_per_week})"
        ),
    }
}

pub fn render_catalog_table(catalog: &Catalog) -> String {
    let mut out = String::new();

    let mut modules = new_table();
    modules.set_header(vec![
        "Pillar",
        "Module",
        "Category",
        "Insight Primer",
        "Integrated Execution",
    ]);
    for (pillar, items) in catalog.modules_by_pillar() {
        for module in items {
            modules.add_row(vec![
                pillar.to_string(),
                module.name.clone(),
                module.category.clone(),
                describe_variant(module.variants.first()),
                describe_variant(module.variants.get(1)),
            ]);
        }
    }
    out.push_str(&modules.to_string());
    out.push_str("\n\n");

    let mut tiers = new_table();
    tiers.set_header(vec!["Tier", "Label", "EVC / week"]);
    for tier in &catalog.tiers {
        tiers.add_row(Row::from(vec![
            Cell::new(&tier.id),
            Cell::new(&tier.label),
            right(tier.weekly_evcs),
        ]));
    }
    out.push_str(&tiers.to_string());
    out.push_str("\n\n");

    let mut options = new_table();
    options.set_header(vec!["Kind", "Id", "Label", "Effect"]);
    for allocation in &catalog.allocations {
        options.add_row(vec![
            "allocation".to_string(),
            allocation.id.clone(),
            allocation.label.clone(),
            format!("+{}% overhead", allocation.switching_overhead_percent),
        ]);
    }
    for payment in &catalog.payment_options {
        options.add_row(vec![
            "payment".to_string(),
            payment.id.clone(),
            payment.name.clone(),
            format!("x{} price", payment.price_modifier.normalize()),
        ]);
    }
    for discount in &catalog.volume_discounts {
        options.add_row(vec![
            "volume discount".to_string(),
            format!("> {}", discount.threshold),
            String::new(),
            format!("-{}", format_percent(discount.discount_percent)),
        ]);
    }
    for parameter in &catalog.custom_parameters {
        let effect = match parameter.effect() {
            ParameterEffect::Scale(modifier) => format!("x{} capacity", modifier.normalize()),
            ParameterEffect::Consume(EvcCost::Absolute(evcs)) => format!("-{evcs} EVC/wk"),
            ParameterEffect::Consume(EvcCost::Relative(fraction)) => format!(
                "-{} of capacity",
                format_percent(fraction * Decimal::ONE_HUNDRED)
            ),
            ParameterEffect::None => "-".to_string(),
        };
        options.add_row(vec![
            "parameter".to_string(),
            parameter.id.clone(),
            parameter.label.clone(),
            effect,
        ]);
    }
    out.push_str(&options.to_string());
    out
}

#[cfg(test)]
mod tests {
    use super::{
        render_catalog_table, render_comparison_table, render_report, render_summary_table,
    };
    use crate::catalog::{Catalog, VariantId};
    use crate::compare::{compare_options, CompareAxis};
    use crate::engine::{compute_quote, QuoteSettings};
    use crate::output::ReportMeta;
    use crate::selection::Selection;

    fn quote_fixture() -> (Catalog, crate::engine::Quote) {
        let catalog = Catalog::builtin().expect("builtin catalog failed to load");
        let selection = Selection::new()
            .with_variant("Demand Generation Engine", VariantId::IntegratedExecution)
            .with_bandwidth("Demand Generation Engine", 20)
            .with_module("Pricing Architecture")
            .with_tier("scale")
            .with_allocation("parallel")
            .with_payment("prepaid")
            .with_module("Ghost Module");
        let quote = compute_quote(&catalog, &selection, &QuoteSettings::default());
        (catalog, quote)
    }

    #[test]
    fn summary_shows_headline_figures() {
        let (catalog, quote) = quote_fixture();
        let meta = ReportMeta::new(catalog.digest(), "€");
        let rendered = render_summary_table(&quote, &meta);
        assert!(rendered.contains("Weekly price"));
        assert!(rendered.contains("€80.75"));
        assert!(rendered.contains("€3,230.00"));
        assert!(!rendered.contains("Notes:"));
    }

    #[test]
    fn report_lists_modules_by_pillar_and_notes_when_enabled() {
        let (catalog, quote) = quote_fixture();
        let meta = ReportMeta::new(catalog.digest(), "€").with_notes(true);
        let rendered = render_report(&quote, &meta);
        assert!(rendered.contains("EVC Solution Brief"));
        assert!(rendered.contains("Demand Generation Engine"));
        assert!(rendered.contains("Growth"));
        assert!(rendered.contains("Annual (52 weeks)"));
        assert!(rendered.contains("€167,960.00"));
        assert!(rendered.contains("Ghost Module"));
        assert!(rendered.contains(&catalog.digest()[..12]));
    }

    #[test]
    fn report_shortens_any_digest_on_char_boundaries() {
        let (_, quote) = quote_fixture();
        let meta = ReportMeta::new("ééééééééééééé-catalog", "€");
        let rendered = render_report(&quote, &meta);
        assert!(rendered.contains("catalog éééééééééééé\n"));
    }

    #[test]
    fn comparison_marks_current_option() {
        let (catalog, _) = quote_fixture();
        let selection = Selection::new().with_module("Pricing Architecture").with_tier("growth");
        let comparison = compare_options(
            &catalog,
            &selection,
            &QuoteSettings::default(),
            CompareAxis::Tier,
        );
        let rendered = render_comparison_table(&comparison, &ReportMeta::new("", "€"));
        assert!(rendered.contains("Comparing by tier"));
        assert!(rendered.contains("Growth (growth)"));
        assert!(rendered.contains("Enterprise (enterprise)"));
    }

    #[test]
    fn catalog_listing_covers_every_section() {
        let catalog = Catalog::builtin().expect("builtin catalog failed to load");
        let rendered = render_catalog_table(&catalog);
        assert!(rendered.contains("Brand Narrative"));
        assert!(rendered.contains("4-16 EVC/wk (rec. 8)"));
        assert!(rendered.contains("enterprise"));
        assert!(rendered.contains("x0.85 price"));
        assert!(rendered.contains("-10% of capacity"));
    }
}
