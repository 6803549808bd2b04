use anyhow::Result;

use crate::compare::Comparison;
use crate::engine::Quote;

/// One row per module followed by the derived totals as `metric,value` rows.
pub fn quote_to_csv(quote: &Quote) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(["section", "name", "pillar", "variant", "evcs"])?;
    for line in &quote.module_lines {
        writer.write_record([
            "module".to_string(),
            line.name.clone(),
            line.pillar.clone(),
            line.variant.as_slug().to_string(),
            line.evcs.to_string(),
        ])?;
    }

    let totals = [
        ("total_evc_sum", quote.total_evc_sum.to_string()),
        ("overhead_evcs", quote.overhead_evcs.to_string()),
        (
            "total_evcs_with_overhead",
            quote.total_evcs_with_overhead.to_string(),
        ),
        (
            "weekly_production_capacity",
            quote.weekly_production_capacity.to_string(),
        ),
        ("available_capacity", quote.capacity.available.to_string()),
        (
            "volume_discount_percent",
            quote.volume_discount_percent.normalize().to_string(),
        ),
        (
            "evc_price_per_unit",
            quote.evc_price_per_unit.round_dp(2).to_string(),
        ),
        ("total_price", quote.total_price.round_dp(2).to_string()),
        ("monthly", quote.projections.monthly.round_dp(2).to_string()),
        ("quarterly", quote.projections.quarterly.round_dp(2).to_string()),
        ("annual", quote.projections.annual.round_dp(2).to_string()),
        ("completion_weeks", quote.completion_weeks.to_string()),
    ];
    for (metric, value) in totals {
        writer.write_record(["total", metric, "", "", value.as_str()])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

pub fn comparison_to_csv(comparison: &Comparison) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "axis",
        "id",
        "label",
        "current",
        "weekly_capacity",
        "evc_price",
        "weekly_price",
        "completion_weeks",
        "price_delta",
        "weeks_delta",
    ])?;
    for row in &comparison.rows {
        writer.write_record([
            comparison.axis.to_string(),
            row.id.clone(),
            row.label.clone(),
            row.current.to_string(),
            row.weekly_production_capacity.to_string(),
            row.evc_price_per_unit.round_dp(2).to_string(),
            row.total_price.round_dp(2).to_string(),
            row.completion_weeks.to_string(),
            row.price_delta.round_dp(2).to_string(),
            row.weeks_delta.to_string(),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}
