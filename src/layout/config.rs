//! Layout Configuration
//!
//! A layout file maps layout names to the pools that make up each layout:
//!
//! ```json
//! {
//!   "2xJBOD-mirror": [
//!     {
//!       "name": "tank",
//!       "redundancy": "mirror",
//!       "vdev": [[["jbod:1", 1], ["jbod:2", 1]], [["jbod:1", 2], ["jbod:2", 2]]],
//!       "log": [[["jbod:1", 24], ["jbod:2", 24]]],
//!       "cache": [["jbod:1", 23]]
//!     }
//!   ]
//! }
//! ```
//!
//! Files ending in `.yaml` or `.yml` are read as YAML with the same shape.

use crate::domain::ports::SlotRef;
use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Default layout file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "layouts.json";

// =============================================================================
// Pool Specification
// =============================================================================

/// One pool of a layout, as written in the layout file.
///
/// Required fields are optional here so that a missing field is reported as
/// a validation error naming the pool rather than a parse error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSpec {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub redundancy: Option<String>,
    #[serde(default)]
    pub vdev: Option<Vec<Vec<SlotRef>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<Vec<SlotRef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<Vec<Vec<SlotRef>>>,
}

impl PoolSpec {
    /// Pool name, for messages about a pool that may not have one
    pub fn label(&self, index: usize) -> String {
        match &self.name {
            Some(name) => format!("pool '{}'", name),
            None => format!("pool #{}", index + 1),
        }
    }
}

// =============================================================================
// Layout Configuration
// =============================================================================

/// Layout name -> pools, in file order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayoutConfig {
    layouts: IndexMap<String, Vec<PoolSpec>>,
}

impl LayoutConfig {
    /// Read and parse a layout file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        info!("Opening configuration file {}", path.display());
        let contents = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;

        info!("Parsing configuration file");
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        let config = if is_yaml {
            Self::from_yaml(&contents)
        } else {
            Self::from_json(&contents)
        }
        .map_err(|reason| Error::ConfigParse {
            path: path.to_path_buf(),
            reason,
        })?;

        if config.is_empty() {
            return Err(Error::Configuration(format!(
                "{} defines no layouts",
                path.display()
            )));
        }
        debug!("Loaded layouts: {:?}", config.names());
        Ok(config)
    }

    fn from_json(contents: &str) -> std::result::Result<Self, String> {
        serde_json::from_str(contents).map_err(|e| e.to_string())
    }

    fn from_yaml(contents: &str) -> std::result::Result<Self, String> {
        serde_yaml::from_str(contents).map_err(|e| e.to_string())
    }

    pub fn names(&self) -> Vec<String> {
        self.layouts.keys().cloned().collect()
    }

    pub fn get(&self, name: &str) -> Option<&[PoolSpec]> {
        self.layouts.get(name).map(Vec::as_slice)
    }

    /// Pools of a layout, failing for an unknown name
    pub fn pools(&self, name: &str) -> Result<&[PoolSpec]> {
        self.get(name).ok_or_else(|| Error::UnknownLayout {
            name: name.to_string(),
            available: self.names(),
        })
    }

    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }
}
