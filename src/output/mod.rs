pub mod csv;
pub mod json;
pub mod table;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Provenance printed alongside a quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMeta {
    pub generated_at: DateTime<Utc>,
    pub catalog_digest: String,
    pub currency: String,
    pub show_notes: bool,
}

impl ReportMeta {
    pub fn new(catalog_digest: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            generated_at: Utc::now(),
            catalog_digest: catalog_digest.into(),
            currency: currency.into(),
            show_notes: false,
        }
    }

    pub fn with_notes(mut self, show_notes: bool) -> Self {
        self.show_notes = show_notes;
        self
    }

    pub fn money(&self, amount: Decimal) -> String {
        format_money(amount, &self.currency)
    }
}

/// Two decimals with comma thousands separators, e.g. `€12,920.00`.
pub fn format_money(amount: Decimal, currency: &str) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let text = format!("{:.2}", rounded.abs());
    let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));
    format!("{sign}{currency}{}.{cents}", group_thousands(whole))
}

pub fn format_percent(value: Decimal) -> String {
    format!("{}%", value.normalize())
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{format_money, format_percent};

    #[test]
    fn formats_money_with_separators() {
        assert_eq!(format_money(Decimal::new(3230, 0), "€"), "€3,230.00");
        assert_eq!(format_money(Decimal::new(8075, 2), "€"), "€80.75");
        assert_eq!(format_money(Decimal::new(167960, 0), "$"), "$167,960.00");
        assert_eq!(format_money(Decimal::new(123456789, 3), ""), "123,456.79");
        assert_eq!(format_money(Decimal::new(-150000, 2), "€"), "-€1,500.00");
        assert_eq!(format_money(Decimal::ZERO, "€"), "€0.00");
    }

    #[test]
    fn formats_percentages_without_trailing_zeros() {
        assert_eq!(format_percent(Decimal::new(250, 2)), "2.5%");
        assert_eq!(format_percent(Decimal::new(5, 0)), "5%");
    }
}
