//! Definition loading: the I/O boundary in front of the pure engine.
//!
//! Overlay, exception, and override definitions live as JSON lists in a
//! config directory. Loading is async and happens once per resolution
//! request; the engine itself never touches the filesystem. A missing file
//! means "no definitions of that kind" and loads as an empty list — but
//! malformed JSON is a hard error, since silently dropping a curated
//! override is worse than failing the request.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use parcelaw_core::{ExceptionRule, Override, OverlayAdjustment};

#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// One jurisdiction known to the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JurisdictionEntry {
    pub id: String,
    pub name: String,
    pub code_ids: Vec<String>,
    pub priority: u32,
}

/// All adjustment definitions for one resolution request.
#[derive(Debug, Clone, Default)]
pub struct DefinitionSet {
    pub overlays: Vec<OverlayAdjustment>,
    pub exceptions: Vec<ExceptionRule>,
    pub overrides: Vec<Override>,
}

/// Load a JSON list from `dir/name`, treating an absent file as empty.
async fn load_list<T: serde::de::DeserializeOwned>(
    dir: &Path,
    name: &str,
) -> Result<Vec<T>, DataError> {
    let path = dir.join(name);
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "definition file not found, treating as empty");
            return Ok(Vec::new());
        }
        Err(source) => return Err(DataError::Io { path, source }),
    };
    let list: Vec<T> =
        serde_json::from_slice(&bytes).map_err(|source| DataError::Json { path: path.clone(), source })?;
    info!(path = %path.display(), count = list.len(), "loaded definitions");
    Ok(list)
}

/// Load overlay adjustment definitions from `dir/overlays.json`.
pub async fn load_overlays(dir: &Path) -> Result<Vec<OverlayAdjustment>, DataError> {
    load_list(dir, "overlays.json").await
}

/// Load exception rules from `dir/exceptions.json`.
pub async fn load_exceptions(dir: &Path) -> Result<Vec<ExceptionRule>, DataError> {
    load_list(dir, "exceptions.json").await
}

/// Load overrides from `dir/overrides.json`.
pub async fn load_overrides(dir: &Path) -> Result<Vec<Override>, DataError> {
    load_list(dir, "overrides.json").await
}

/// Load the jurisdiction registry from `dir/jurisdictions.json`.
pub async fn load_registry(dir: &Path) -> Result<Vec<JurisdictionEntry>, DataError> {
    load_list(dir, "jurisdictions.json").await
}

/// Load all three definition lists for a resolution request.
pub async fn load_definitions(dir: &Path) -> Result<DefinitionSet, DataError> {
    Ok(DefinitionSet {
        overlays: load_overlays(dir).await?,
        exceptions: load_exceptions(dir).await?,
        overrides: load_overrides(dir).await?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, contents: &str) {
        std::fs::write(dir.join(name), contents).unwrap();
    }

    #[tokio::test]
    async fn loads_overlays_from_file() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "overlays.json",
            r#"[{
                "id": "HD",
                "name": "Historic District",
                "applies_to": ["front_setback"],
                "op": "min",
                "value": 30,
                "unit": "ft",
                "citations": [{"code_id": "austin_ldc_2024", "section": "25-2-900"}]
            }]"#,
        );
        let overlays = load_overlays(dir.path()).await.unwrap();
        assert_eq!(overlays.len(), 1);
        assert_eq!(overlays[0].id, "HD");
        assert_eq!(overlays[0].value, 30.0);
    }

    #[tokio::test]
    async fn missing_file_is_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        let overrides = load_overrides(dir.path()).await.unwrap();
        assert!(overrides.is_empty());
    }

    #[tokio::test]
    async fn malformed_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "exceptions.json", "{not json");
        let err = load_exceptions(dir.path()).await.unwrap_err();
        assert!(matches!(err, DataError::Json { .. }));
    }

    #[tokio::test]
    async fn loads_overrides_with_expiry_and_scope() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "overrides.json",
            r#"[{
                "district": "SF3",
                "intent": "front_setback",
                "value": 30,
                "unit": "ft",
                "citation": {"code_id": "austin_ldc_2024", "section": "25-2-492"},
                "rationale": "Corrected per ordinance 2024-118",
                "expires": "2026-01-01T00:00:00Z",
                "scope": "parcel",
                "apn": "0204050712"
            }]"#,
        );
        let overrides = load_overrides(dir.path()).await.unwrap();
        assert_eq!(overrides.len(), 1);
        assert_eq!(overrides[0].apn.as_deref(), Some("0204050712"));
        assert!(overrides[0].expires.is_some());
    }

    #[tokio::test]
    async fn load_definitions_bundles_all_lists() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "overlays.json", "[]");
        write(
            dir.path(),
            "exceptions.json",
            r#"[{
                "id": "corner-side",
                "predicate": "corner_lot",
                "adjustments": [{"intent": "side_setback", "op": "add", "value": 5, "unit": "ft"}],
                "citations": [{"code_id": "austin_ldc_2024", "section": "25-2-515"}]
            }]"#,
        );
        let defs = load_definitions(dir.path()).await.unwrap();
        assert!(defs.overlays.is_empty());
        assert_eq!(defs.exceptions.len(), 1);
        assert!(defs.overrides.is_empty());
    }

    #[tokio::test]
    async fn loads_jurisdiction_registry() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "jurisdictions.json",
            r#"[{"id": "austin", "name": "City of Austin", "code_ids": ["austin_ldc_2024"], "priority": 1}]"#,
        );
        let registry = load_registry(dir.path()).await.unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry[0].id, "austin");
    }
}
