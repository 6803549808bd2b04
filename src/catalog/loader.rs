use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::catalog::validate::validate_catalog;
use crate::catalog::Catalog;

const BUILTIN_CATALOG: &str = include_str!("../../catalog/default.json");

impl Catalog {
    pub fn builtin() -> Result<Self> {
        let catalog: Self =
            serde_json::from_str(BUILTIN_CATALOG).context("failed parsing builtin catalog")?;
        validate_catalog(&catalog).context("builtin catalog is invalid")?;
        Ok(catalog)
    }

    /// Hex SHA-256 of the canonical JSON form.
    pub fn digest(&self) -> String {
        let canonical = serde_json::to_string(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// Reads a catalog from JSON or TOML, chosen by file extension.
pub fn load_catalog(path: &Path) -> Result<Catalog> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed reading catalog: {}", path.display()))?;
    let catalog: Catalog = if has_extension(path, "toml") {
        toml::from_str(&data)
            .with_context(|| format!("failed parsing TOML catalog: {}", path.display()))?
    } else {
        serde_json::from_str(&data)
            .with_context(|| format!("failed parsing JSON catalog: {}", path.display()))?
    };
    validate_catalog(&catalog)
        .with_context(|| format!("invalid catalog: {}", path.display()))?;
    debug!(
        modules = catalog.modules.len(),
        tiers = catalog.tiers.len(),
        "loaded catalog from {}",
        path.display()
    );
    Ok(catalog)
}

/// Loads the catalog at `path`, or the builtin one when no path is configured.
pub fn resolve_catalog(path: Option<&Path>) -> Result<Catalog> {
    match path {
        Some(path) => load_catalog(path),
        None => Catalog::builtin(),
    }
}

pub(crate) fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}
