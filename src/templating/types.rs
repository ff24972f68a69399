//! Parameter type names and session values.

use chrono::{DateTime, FixedOffset};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use uuid::Uuid;

/// Canonical name of the string type. Parameters of this type are never converted.
pub const STRING_TYPE: &str = "System.String";

static TYPE_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("string", STRING_TYPE),
        ("bool", "System.Boolean"),
        ("char", "System.Char"),
        ("sbyte", "System.SByte"),
        ("byte", "System.Byte"),
        ("short", "System.Int16"),
        ("ushort", "System.UInt16"),
        ("int", "System.Int32"),
        ("uint", "System.UInt32"),
        ("long", "System.Int64"),
        ("ulong", "System.UInt64"),
        ("float", "System.Single"),
        ("double", "System.Double"),
        ("object", "System.Object"),
        ("DateTime", "System.DateTime"),
        ("Guid", "System.Guid"),
    ])
});

/// Maps a declared parameter type to its full name.
///
/// A missing or blank name means string. Keyword aliases (`int`, `bool`, ...)
/// expand to their `System.*` names; anything else is returned unchanged.
pub fn map_type_name(type_name: Option<&str>) -> String {
    let Some(name) = type_name.map(str::trim).filter(|n| !n.is_empty()) else {
        return STRING_TYPE.to_string();
    };
    TYPE_ALIASES
        .get(name)
        .map(|full| full.to_string())
        .unwrap_or_else(|| name.to_string())
}

/// A typed session parameter value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SessionValue {
    String(String),
    Bool(bool),
    Char(char),
    Int(i64),
    UInt(u64),
    Float(f64),
    DateTime(DateTime<FixedOffset>),
    Guid(Uuid),
}

impl SessionValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SessionValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Short type label used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SessionValue::String(_) => "string",
            SessionValue::Bool(_) => "bool",
            SessionValue::Char(_) => "char",
            SessionValue::Int(_) => "int",
            SessionValue::UInt(_) => "uint",
            SessionValue::Float(_) => "float",
            SessionValue::DateTime(_) => "datetime",
            SessionValue::Guid(_) => "guid",
        }
    }
}

impl fmt::Display for SessionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionValue::String(s) => f.write_str(s),
            SessionValue::Bool(b) => write!(f, "{}", b),
            SessionValue::Char(c) => write!(f, "{}", c),
            SessionValue::Int(n) => write!(f, "{}", n),
            SessionValue::UInt(n) => write!(f, "{}", n),
            SessionValue::Float(n) => write!(f, "{}", n),
            SessionValue::DateTime(d) => write!(f, "{}", d.to_rfc3339()),
            SessionValue::Guid(g) => write!(f, "{}", g),
        }
    }
}

impl From<&str> for SessionValue {
    fn from(value: &str) -> Self {
        SessionValue::String(value.to_string())
    }
}

impl From<String> for SessionValue {
    fn from(value: String) -> Self {
        SessionValue::String(value)
    }
}

/// Parameters passed into a template run, keyed by name.
pub type Session = BTreeMap<String, SessionValue>;
