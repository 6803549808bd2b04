use anyhow::Result;
use serde::Serialize;

use crate::engine::Quote;
use crate::output::ReportMeta;

#[derive(Debug, Serialize)]
struct QuoteDocument<'a> {
    meta: &'a ReportMeta,
    quote: &'a Quote,
}

pub fn render_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Quote wrapped with its generation time and catalog digest.
pub fn render_quote_json(quote: &Quote, meta: &ReportMeta) -> Result<String> {
    render_json(&QuoteDocument { meta, quote })
}

#[cfg(test)]
mod tests {
    use super::render_quote_json;
    use crate::catalog::Catalog;
    use crate::engine::{compute_quote, QuoteSettings};
    use crate::output::ReportMeta;
    use crate::selection::Selection;

    #[test]
    fn quote_document_carries_meta_and_figures() {
        let catalog = Catalog::builtin().expect("builtin catalog failed to load");
        let selection = Selection::new().with_module("Brand Narrative").with_tier("scale");
        let quote = compute_quote(&catalog, &selection, &QuoteSettings::default());
        let meta = ReportMeta::new(catalog.digest(), "€");

        let rendered = render_quote_json(&quote, &meta).expect("failed rendering json");
        let value: serde_json::Value = serde_json::from_str(&rendered).expect("invalid json");
        assert_eq!(value["meta"]["catalog_digest"], catalog.digest());
        assert_eq!(value["quote"]["total_evc_sum"], 6);
        assert_eq!(value["quote"]["completion_weeks"], 1);
    }
}
