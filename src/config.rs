//! Output configuration.
//!
//! Deserialized from JSON; every field has a default so an empty object
//! is a valid configuration.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::resource::manager::ResourceManager;
use crate::resource::ResourceLevelDefaults;

/// Writer configuration: resource destinations and level defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct OutputConfig {
    /// Destination for external-level resources that carry no explicit
    /// URI.
    pub default_resource_group_uri: Option<String>,
    /// Default resource level per data object kind, e.g.
    /// `"image": "print-file"`.
    pub resource_levels: IndexMap<String, String>,
}

impl OutputConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse the configured level map into typed defaults.
    pub fn resource_level_defaults(&self) -> Result<ResourceLevelDefaults> {
        let mut defaults = ResourceLevelDefaults::default();
        for (kind, level) in &self.resource_levels {
            defaults.set_level(kind.parse()?, level.parse()?);
        }
        Ok(defaults)
    }

    /// Apply this configuration to a resource manager.
    pub fn apply(&self, manager: &mut ResourceManager) -> Result<()> {
        if let Some(uri) = &self.default_resource_group_uri {
            manager.set_default_resource_group_uri(uri);
        }
        manager.set_resource_level_defaults(&self.resource_level_defaults()?);
        Ok(())
    }
}
