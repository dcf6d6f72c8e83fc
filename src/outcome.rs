use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One rejected source row with a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    pub row: usize,
    #[serde(alias = "error")]
    pub reason: String,
}

/// Canonical result of one import run. Older casona releases (and the
/// hosted dashboard this tool replaced) recorded summaries as
/// `{importedCount, skippedCount, errors: [{row, error}]}`, sometimes
/// wrapped in a `results` object; current code writes
/// `{imported, skipped, errors: [{row, reason}]}`. All shape coalescing
/// lives here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportOutcome {
    #[serde(alias = "importedCount")]
    pub imported: usize,
    #[serde(alias = "skippedCount")]
    pub skipped: usize,
    #[serde(default)]
    pub errors: Vec<RowError>,
}

impl ImportOutcome {
    /// Parse a summary in any of the historical shapes.
    pub fn from_json(raw: &str) -> Result<ImportOutcome> {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        let inner = value.get("results").unwrap_or(&value);
        Ok(serde_json::from_value(inner.clone())?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
