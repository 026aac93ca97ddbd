use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};

use crate::error::ConfigError;

/// Per-repository custom payloads, keyed by lowercase `owner/name`.
///
/// Keys are stored as written in the file. Lookups lowercase the repository
/// name, so a key containing uppercase letters never matches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowPayloads {
    entries: HashMap<String, Value>,
    source: Option<PathBuf>,
}

impl WorkflowPayloads {
    pub fn new(entries: HashMap<String, Value>) -> Self {
        Self {
            entries,
            source: None,
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        let entries: HashMap<String, Value> = serde_json::from_str(raw)?;
        Ok(Self::new(entries))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut payloads =
            Self::from_json_str(&raw).map_err(|source| ConfigError::InvalidPayloads {
                path: path.to_path_buf(),
                source,
            })?;
        payloads.source = Some(path.to_path_buf());
        Ok(payloads)
    }

    /// The file the map was loaded from, for log lines.
    pub fn source_name(&self) -> String {
        match &self.source {
            Some(path) => path.display().to_string(),
            None => "workflow payloads".to_string(),
        }
    }

    pub fn lookup(&self, full_name: &str) -> Option<&Value> {
        self.entries.get(&full_name.to_lowercase())
    }

    /// The `client_payload` sent for `full_name`, or `None` when unmapped.
    pub fn envelope_for(&self, full_name: &str) -> Option<Value> {
        self.lookup(full_name).map(|data| json!({ "data": data }))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
