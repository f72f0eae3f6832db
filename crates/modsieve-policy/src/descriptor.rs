//! Configuration descriptors
//!
//! Rule lists arrive already parsed as these structures; there is no on-disk
//! format owned by this crate, but YAML/JSON helpers are provided for hosts
//! that keep their lists in files.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use modsieve_core::{Error, Result};

use crate::filter_list::ListKind;

/// One mode (deny or allow) of a named filter list, with its filters and
/// list-wide default settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterListDescriptor {
    /// Filter-list name; globally unique, used as the external identity
    pub name: String,

    /// Description of what the list does
    pub description: String,

    /// Which mode this descriptor populates
    pub list_type: ListKind,

    /// The filters in this mode
    pub filters: Vec<FilterDescriptor>,

    /// Default settings for this mode, raw by setting name
    #[serde(default)]
    pub settings: Map<String, Value>,
}

/// A single filter within a list descriptor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterDescriptor {
    pub id: u64,

    /// The pattern/token the filter searches for
    pub content: String,

    pub description: String,

    /// Whether the pattern must match on word boundaries
    pub additional_field: bool,

    /// Per-filter setting overrides, raw by setting name
    #[serde(default)]
    pub settings: Map<String, Value>,
}

impl FilterListDescriptor {
    /// Load a descriptor from a YAML string
    pub fn from_yaml(yaml: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Load a descriptor from a file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content).map_err(|e| Error::config(format!("bad list descriptor: {e}")))
    }
}
