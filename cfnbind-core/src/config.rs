//! Generator configuration

use serde::{Deserialize, Serialize};

use crate::schema::SchemaFormat;

/// Generation options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Keep the catalog of successful entries when some entries fail
    pub partial_output: bool,

    /// Worker count for concurrent generation (default: 1, sequential)
    pub jobs: usize,

    /// Input format of schema files (default: specification)
    pub format: SchemaFormat,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            partial_output: false,
            jobs: 1,
            format: SchemaFormat::Specification,
        }
    }
}

impl GeneratorConfig {
    /// Read a config file body; missing keys keep their defaults
    pub fn from_json(input: &str) -> serde_json::Result<Self> {
        serde_json::from_str(input)
    }

    pub fn is_concurrent(&self) -> bool {
        self.jobs > 1
    }

    /// Worker count, never below one
    pub fn workers(&self) -> usize {
        self.jobs.max(1)
    }
}
