//! # Parameter Model
//!
//! The record type for one cluster-tunable parameter, in the JSON shape the
//! cluster's `config help` command and the baseline dataset both use.
//!
//! Loosely typed source fields are normalized here, once, at the
//! deserialization boundary:
//!
//! - `default` / `daemon_default` become a [`ScalarValue`]
//! - `min` / `max` become `Option<f64>` via [`parse_min_max`]
//! - `null` sequences become empty vectors

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Value types the cluster reports in the `type` field
pub const KNOWN_TYPES: &[&str] = &[
    "str",
    "uuid",
    "addr",
    "addrvec",
    "bool",
    "int",
    "float",
    "uint",
    "size",
    "secs",
    "millisecs",
];

/// Safety levels the cluster reports in the `level` field
pub const KNOWN_LEVELS: &[&str] = &["basic", "advanced", "dev"];

/// Daemon and client kinds a parameter can apply to
pub const KNOWN_SERVICES: &[&str] = &[
    "common",
    "mon",
    "mds",
    "osd",
    "mgr",
    "rgw",
    "rbd",
    "rbd-mirror",
    "immutable-object-cache",
    "mds_client",
    "cephfs-mirror",
    "ceph-exporter",
];

/// One cluster-tunable parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterInfo {
    /// Unique parameter name (catalog primary key)
    pub name: String,
    /// Value type tag (str, int, size, secs, ...)
    #[serde(rename = "type", default)]
    pub param_type: String,
    /// Safety classification (basic, advanced, dev, ...)
    #[serde(default)]
    pub level: String,
    #[serde(rename = "desc", default)]
    pub description: String,
    #[serde(rename = "long_desc", default)]
    pub long_description: String,
    #[serde(default)]
    pub default: ScalarValue,
    #[serde(default)]
    pub daemon_default: ScalarValue,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    /// Services the parameter applies to; order carries no meaning
    #[serde(default, deserialize_with = "null_as_empty")]
    pub services: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub see_also: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub enum_values: Vec<String>,
    #[serde(default, deserialize_with = "bound")]
    pub min: Option<f64>,
    #[serde(default, deserialize_with = "bound")]
    pub max: Option<f64>,
    #[serde(default)]
    pub can_update_at_runtime: bool,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub flags: Vec<String>,
}

impl ParameterInfo {
    /// Create a record with only a name and type set
    pub fn new(name: impl Into<String>, param_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            level: String::new(),
            description: String::new(),
            long_description: String::new(),
            default: ScalarValue::Absent,
            daemon_default: ScalarValue::Absent,
            tags: Vec::new(),
            services: Vec::new(),
            see_also: Vec::new(),
            enum_values: Vec::new(),
            min: None,
            max: None,
            can_update_at_runtime: false,
            flags: Vec::new(),
        }
    }

    pub fn with_level(mut self, level: &str) -> Self {
        self.level = level.to_string();
        self
    }

    pub fn with_services(mut self, services: &[&str]) -> Self {
        self.services = services.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = desc.to_string();
        self
    }

    /// First listed service, or "" (the `service` sort key)
    pub fn primary_service(&self) -> &str {
        self.services.first().map(String::as_str).unwrap_or("")
    }
}

/// A polymorphic default value: absent, boolean, numeric or text
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ScalarValue {
    #[default]
    Absent,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl ScalarValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, ScalarValue::Absent)
    }
}

impl From<Value> for ScalarValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => ScalarValue::Absent,
            Value::Bool(b) => ScalarValue::Bool(b),
            Value::Number(n) => ScalarValue::Number(n),
            Value::String(s) => ScalarValue::Text(s),
            // Arrays and objects are not expected here; keep their rendering
            other => ScalarValue::Text(other.to_string()),
        }
    }
}

impl fmt::Display for ScalarValue {
    /// Text used for full-text matching; absent renders as ""
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Absent => Ok(()),
            ScalarValue::Bool(b) => write!(f, "{}", b),
            ScalarValue::Number(n) => write!(f, "{}", n),
            ScalarValue::Text(s) => f.write_str(s),
        }
    }
}

impl Serialize for ScalarValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ScalarValue::Absent => serializer.serialize_none(),
            ScalarValue::Bool(b) => serializer.serialize_bool(*b),
            ScalarValue::Number(n) => n.serialize(serializer),
            ScalarValue::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for ScalarValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(ScalarValue::from)
    }
}

/// Normalize a numeric bound to an optional float.
///
/// Accepts a JSON number or a numeric string. Empty strings, `null`, strings
/// that do not parse and any other JSON shape all yield `None`; bounds are
/// advisory metadata and never fail a load.
pub fn parse_min_max(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
        }
        _ => None,
    }
}

fn bound<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(parse_min_max(&value))
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
