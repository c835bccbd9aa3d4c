//! Value source configuration

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::script::ScriptValueType;

pub(crate) const NO_SOURCE: &str = "either a field or a script is required";

/// Where an aggregation reads its values from.
///
/// ```json
/// { "field": "price", "script": "_value * 1.2", "ensure_unique": true }
/// ```
///
/// With only `field`, values come from field data. With only `script`, the
/// script computes them per document. With both, the script transforms every
/// field value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValuesSourceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    /// Declared result type of `script`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<ScriptValueType>,
    /// Ask field data for precomputed value hashes
    #[serde(default)]
    pub needs_hashes: bool,
    /// Sort and deduplicate every document's values
    #[serde(default)]
    pub ensure_unique: bool,
}

impl ValuesSourceConfig {
    pub fn field(name: impl Into<String>) -> Self {
        Self {
            field: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn script(source: impl Into<String>) -> Self {
        Self {
            script: Some(source.into()),
            ..Default::default()
        }
    }

    pub fn with_script(mut self, source: impl Into<String>) -> Self {
        self.script = Some(source.into());
        self
    }

    pub fn with_value_type(mut self, value_type: ScriptValueType) -> Self {
        self.value_type = Some(value_type);
        self
    }

    pub fn with_needs_hashes(mut self, needs_hashes: bool) -> Self {
        self.needs_hashes = needs_hashes;
        self
    }

    pub fn with_ensure_unique(mut self, ensure_unique: bool) -> Self {
        self.ensure_unique = ensure_unique;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.field.is_none() && self.script.is_none() {
            return Err(Error::InvalidConfig(NO_SOURCE.to_string()));
        }
        Ok(())
    }
}
