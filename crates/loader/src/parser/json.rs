//! JSON parsing.
//!
//! A JSON file is a single document; objects flatten to dotted keys and
//! arrays to `key[index]`, like the YAML parser.

use std::collections::BTreeMap;

use confstack_env::MapSource;
use serde_json::Value;

use super::{DocumentParser, join_key, read_resource};
use crate::loader::LoadError;
use crate::resource::Resource;

pub struct JsonParser;

impl DocumentParser for JsonParser {
    fn name(&self) -> &'static str {
        "json"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["json"]
    }

    fn parse(&self, origin: &str, resource: &Resource) -> Result<Vec<MapSource>, LoadError> {
        let text = read_resource(resource)?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let value: Value = serde_json::from_str(&text).map_err(|source| LoadError::Json {
            path: resource.path().to_path_buf(),
            source,
        })?;
        let mut entries = BTreeMap::new();
        flatten(&value, "", &mut entries);
        if entries.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![MapSource::new(origin, entries)])
    }
}

fn flatten(value: &Value, prefix: &str, out: &mut BTreeMap<String, String>) {
    match value {
        Value::Object(object) => {
            for (key, value) in object {
                flatten(value, &join_key(prefix, key), out);
            }
        }
        Value::Array(array) => {
            for (index, value) in array.iter().enumerate() {
                flatten(value, &format!("{prefix}[{index}]"), out);
            }
        }
        Value::Null => {
            if !prefix.is_empty() {
                out.insert(prefix.to_string(), String::new());
            }
        }
        Value::Bool(b) => {
            out.insert(prefix.to_string(), b.to_string());
        }
        Value::Number(n) => {
            out.insert(prefix.to_string(), n.to_string());
        }
        Value::String(s) => {
            out.insert(prefix.to_string(), s.clone());
        }
    }
}
