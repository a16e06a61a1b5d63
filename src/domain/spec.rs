//! Bundle spec embedded in image labels
//!
//! A spec-bearing image carries a base64-encoded YAML document in its
//! `com.redhat.apb.spec` label. The document describes the bundle and the
//! plans it offers to a service catalog.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Runtime version assumed when an image has no runtime label
pub const DEFAULT_RUNTIME: u32 = 1;

/// Decoded bundle metadata for one image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spec {
    /// Spec format version (e.g. "1.0")
    #[serde(default, deserialize_with = "version_string")]
    pub version: String,
    /// Bundle runtime version, taken from the runtime label
    #[serde(default = "default_runtime")]
    pub runtime: u32,
    /// Bundle name
    pub name: String,
    /// Image reference the spec was read from
    #[serde(default)]
    pub image: String,
    /// Free-form catalog tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Whether the bundle supports binding
    #[serde(default)]
    pub bindable: bool,
    #[serde(default)]
    pub description: String,
    /// Display metadata (displayName, imageUrl, ...)
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
    /// Async provisioning mode: optional, required or unsupported
    #[serde(default, rename = "async")]
    pub async_mode: String,
    #[serde(default)]
    pub plans: Vec<Plan>,
}

/// A service plan offered by a bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
    #[serde(default)]
    pub free: bool,
    #[serde(default)]
    pub bindable: bool,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub bind_parameters: Vec<Parameter>,
}

/// One user-facing input of a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    /// Value type (string, int, bool, enum, ...)
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub updatable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Allowed values for enum parameters
    #[serde(default, rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub allowed: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxlength: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_group: Option<String>,
}

fn default_runtime() -> u32 {
    DEFAULT_RUNTIME
}

// `version: 1.0` is a float to YAML but a string to us.
fn version_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "invalid spec version: {}",
            other
        ))),
    }
}

impl Spec {
    /// Parse a spec from its YAML document
    ///
    /// JSON documents are accepted as well since JSON is valid YAML.
    pub fn from_yaml(document: &[u8]) -> Result<Self, String> {
        let spec: Spec = serde_yaml::from_slice(document).map_err(|e| e.to_string())?;
        if spec.name.trim().is_empty() {
            return Err("spec has an empty name".to_string());
        }
        Ok(spec)
    }

    /// Display name from metadata, falling back to the bundle name
    pub fn display_name(&self) -> &str {
        self.metadata
            .get("displayName")
            .and_then(Value::as_str)
            .unwrap_or(&self.name)
    }
}

impl fmt::Display for Spec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.image)
    }
}
