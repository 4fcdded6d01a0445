//! YAML parsing.
//!
//! Each `---`-separated document becomes one property set. Nested mappings
//! flatten to dotted keys, sequences to `key[index]`, scalars to strings.

use std::collections::BTreeMap;

use confstack_env::MapSource;
use serde::Deserialize;
use serde_yaml::Value;

use super::{DocumentParser, document_name, join_key, read_resource};
use crate::loader::LoadError;
use crate::resource::Resource;

pub struct YamlParser;

impl DocumentParser for YamlParser {
    fn name(&self) -> &'static str {
        "yaml"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["yml", "yaml"]
    }

    fn parse(&self, origin: &str, resource: &Resource) -> Result<Vec<MapSource>, LoadError> {
        let text = read_resource(resource)?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let mut maps = Vec::new();
        for deserializer in serde_yaml::Deserializer::from_str(&text) {
            let value = Value::deserialize(deserializer).map_err(|source| LoadError::Yaml {
                path: resource.path().to_path_buf(),
                source,
            })?;
            let mut entries = BTreeMap::new();
            flatten(&value, "", &mut entries);
            if !entries.is_empty() {
                maps.push(entries);
            }
        }
        let total = maps.len();
        Ok(maps
            .into_iter()
            .enumerate()
            .map(|(index, entries)| MapSource::new(document_name(origin, index, total), entries))
            .collect())
    }
}

pub(crate) fn flatten(value: &Value, prefix: &str, out: &mut BTreeMap<String, String>) {
    match value {
        Value::Mapping(mapping) => {
            for (key, value) in mapping {
                let key = scalar_key(key);
                let path = join_key(prefix, &key);
                flatten(value, &path, out);
            }
        }
        Value::Sequence(sequence) => {
            for (index, value) in sequence.iter().enumerate() {
                flatten(value, &format!("{prefix}[{index}]"), out);
            }
        }
        Value::Tagged(tagged) => flatten(&tagged.value, prefix, out),
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

fn scalar_key(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confstack_env::PropertySource;
    use tempfile::TempDir;

    fn parse(content: &str) -> Result<Vec<MapSource>, LoadError> {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("application.yaml");
        std::fs::write(&path, content).unwrap();
        let resource = Resource::new("file:./application.yaml", &path);
        YamlParser.parse("test", &resource)
    }

    #[test]
    fn flattens_nested_mappings() {
        let sources = parse("server:\n  port: 8080\n  ssl:\n    enabled: true\n").unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].name(), "test");
        assert_eq!(sources[0].get("server.port"), Some("8080".to_string()));
        assert_eq!(sources[0].get("server.ssl.enabled"), Some("true".to_string()));
    }

    #[test]
    fn flattens_sequences_with_indexes() {
        let sources = parse("hosts:\n  - a\n  - b\n").unwrap();
        assert_eq!(sources[0].get("hosts[0]"), Some("a".to_string()));
        assert_eq!(sources[0].get("hosts[1]"), Some("b".to_string()));
    }

    #[test]
    fn splits_multi_document_files() {
        let sources = parse("a: 1\n---\napp.profiles: dev\na: 2\n").unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].name(), "test (document #0)");
        assert_eq!(sources[1].name(), "test (document #1)");
        assert_eq!(sources[1].get("app.profiles"), Some("dev".to_string()));
    }

    #[test]
    fn blank_and_null_documents_are_skipped() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("# only a comment\n").unwrap().is_empty());
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let result = parse("a: [unclosed\n");
        assert!(matches!(result, Err(LoadError::Yaml { .. })));
    }
}
