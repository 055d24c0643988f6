//! Conversions between the JSON we fetch and load, and the values scripts
//! operate on.

use std::{collections::BTreeMap, ffi::OsStr, fs, path::Path, str::FromStr};

use flexscript::{Number, Value};
use serde_json::{Map as JsonMap, Number as JsonNumber, Value as JsonValue};

use crate::Error;

/// We use [`std::collections::BTreeMap`] as our default map structure.
pub type Map<K, V> = BTreeMap<K, V>;

/// The supported file formats from which we can load view definitions and
/// configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SupportedFormat {
    Json,
    Yaml,
    Toml,
}

impl FromStr for SupportedFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        Ok(match lower.as_ref() {
            "json" => Self::Json,
            "yaml" | "yml" => Self::Yaml,
            "toml" => Self::Toml,
            _ => return Err(Error::UnsupportedFileType(s.to_string())),
        })
    }
}

impl SupportedFormat {
    /// Attempts to parse the given content in this format.
    pub fn parse(&self, content: &str) -> Result<JsonValue, Error> {
        Ok(match self {
            Self::Json => serde_json::from_str(content)?,
            Self::Yaml => serde_yaml::from_str(content)?,
            Self::Toml => toml::from_str(content)?,
        })
    }
}

/// Attempts to load a value from the given file, automatically detecting the
/// file format from its extension.
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<JsonValue, Error> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(OsStr::to_str)
        .ok_or_else(|| Error::CannotDetermineFileType(path.to_path_buf()))?;
    let fmt = SupportedFormat::from_str(ext)
        .map_err(|e| Error::LoadFromFile(path.to_path_buf(), Box::new(e)))?;
    let content = fs::read_to_string(path)
        .map_err(|e| Error::Io(format!("while trying to read from {}", path.display()), e))?;
    fmt.parse(&content)
        .map_err(|e| Error::LoadFromFile(path.to_path_buf(), Box::new(e)))
}

/// Converts JSON into a script value. Floats that cannot be represented
/// (NaN, infinities, or magnitudes beyond 64 integer bits) become `null`.
pub fn to_script_value(v: &JsonValue) -> Value {
    match v {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Boolean(*b),
        JsonValue::Number(n) => from_json_number(n),
        JsonValue::String(s) => Value::String(s.clone()),
        JsonValue::Array(arr) => Value::Array(arr.iter().map(to_script_value).collect()),
        JsonValue::Object(obj) => Value::Object(
            obj.iter()
                .map(|(k, v)| (k.clone(), to_script_value(v)))
                .collect(),
        ),
    }
}

/// Converts a script value back into JSON, e.g. for output.
pub fn from_script_value(v: &Value) -> JsonValue {
    match v {
        Value::Null => JsonValue::Null,
        Value::Boolean(b) => JsonValue::Bool(*b),
        Value::Number(n) => to_json_number(n),
        Value::String(s) => JsonValue::String(s.clone()),
        Value::Array(arr) => JsonValue::Array(arr.iter().map(from_script_value).collect()),
        Value::Object(obj) => JsonValue::Object(JsonMap::from_iter(
            obj.iter().map(|(k, v)| (k.clone(), from_script_value(v))),
        )),
    }
}

fn from_json_number(n: &JsonNumber) -> Value {
    if let Some(u) = n.as_u64() {
        Value::Number(Number::Unsigned(u))
    } else if let Some(i) = n.as_i64() {
        Value::Number(Number::Signed(i))
    } else {
        n.as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or_default()
    }
}

fn to_json_number(n: &Number) -> JsonValue {
    match n {
        Number::Unsigned(u) => JsonValue::from(*u),
        Number::Signed(i) => JsonValue::from(*i),
        Number::Fixed(_) => match n.as_i64() {
            Some(i) => JsonValue::from(i),
            None => JsonNumber::from_f64(n.to_f64())
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
        },
    }
}
