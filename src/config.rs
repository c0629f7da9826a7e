//! Gate construction input
//!
//! Owners and threshold, either from CLI flags or a JSON file such as:
//!
//! ```json
//! { "owners": ["alice", "bob", "carol"], "threshold": 2, "label": "ops" }
//! ```

use crate::gate::{GateError, OwnerRegistry};
use crate::storage::StorageError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Owners and quorum threshold for a new gate
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GateConfig {
    pub owners: Vec<String>,
    pub threshold: usize,
    #[serde(default)]
    pub label: Option<String>,
}

impl GateConfig {
    pub fn new(owners: Vec<String>, threshold: usize, label: Option<String>) -> Self {
        Self {
            owners,
            threshold,
            label,
        }
    }

    /// Read a config from a JSON file
    pub fn load(path: &Path) -> Result<Self, StorageError> {
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Validate into an owner registry
    pub fn build_registry(&self) -> Result<OwnerRegistry, GateError> {
        OwnerRegistry::from_strings(&self.owners, self.threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("gate.json");
        fs::write(
            &path,
            r#"{ "owners": ["alice", "bob", "carol"], "threshold": 2 }"#,
        )
        .unwrap();

        let config = GateConfig::load(&path).unwrap();
        assert_eq!(config.owners.len(), 3);
        assert_eq!(config.label, None);

        let registry = config.build_registry().unwrap();
        assert_eq!(registry.description(), "2-of-3");
    }

    #[test]
    fn test_load_errors() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            GateConfig::load(&path),
            Err(StorageError::SerializationError(_))
        ));
        assert!(matches!(
            GateConfig::load(&temp_dir.path().join("missing.json")),
            Err(StorageError::IoError(_))
        ));
    }

    #[test]
    fn test_invalid_registry() {
        let config = GateConfig::new(vec!["alice".to_string()], 2, None);
        assert!(matches!(
            config.build_registry(),
            Err(GateError::InvalidConfiguration(_))
        ));
    }
}
