//! Document parsers.
//!
//! Responsibilities:
//! - Define the `DocumentParser` trait the loader discovers formats through.
//! - Provide the built-in parser set: properties, YAML, and JSON.
//!
//! Does NOT handle:
//! - Profile binding (the engine turns parsed property sets into documents).
//! - Resource resolution (see resource.rs).
//!
//! Invariants:
//! - Empty or blank files parse to zero property sets and are skipped by
//!   the engine.
//! - Multi-document files keep parse order; the engine applies within-file
//!   precedence.

mod json;
mod properties;
mod yaml;

pub use json::JsonParser;
pub use properties::PropertiesParser;
pub use yaml::YamlParser;

use confstack_env::MapSource;

use crate::loader::LoadError;
use crate::resource::Resource;

/// Parses a resource into zero or more flat property sets.
pub trait DocumentParser {
    /// Stable identity used for document cache keying.
    fn name(&self) -> &'static str;

    /// File extensions (without the dot) this parser supports.
    fn file_extensions(&self) -> &'static [&'static str];

    /// Parse the resource, naming each produced property set from `origin`.
    fn parse(&self, origin: &str, resource: &Resource) -> Result<Vec<MapSource>, LoadError>;
}

/// The built-in parser set, in lookup order.
pub fn default_parsers() -> Vec<Box<dyn DocumentParser>> {
    vec![
        Box::new(PropertiesParser),
        Box::new(YamlParser),
        Box::new(JsonParser),
    ]
}

/// Join a flattening prefix and a key into a dotted path.
pub(crate) fn join_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Name a document within a possibly multi-document origin.
pub(crate) fn document_name(origin: &str, index: usize, total: usize) -> String {
    if total > 1 {
        format!("{origin} (document #{index})")
    } else {
        origin.to_string()
    }
}

pub(crate) fn read_resource(resource: &Resource) -> Result<String, LoadError> {
    resource.read_to_string().map_err(|source| LoadError::Read {
        path: resource.path().to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_key_skips_empty_prefix() {
        assert_eq!(join_key("", "server"), "server");
        assert_eq!(join_key("server", "port"), "server.port");
    }

    #[test]
    fn document_names_index_only_multi_document_origins() {
        assert_eq!(document_name("app", 0, 1), "app");
        assert_eq!(document_name("app", 1, 3), "app (document #1)");
    }

    #[test]
    fn default_parsers_cover_known_extensions() {
        let extensions: Vec<&str> = default_parsers()
            .iter()
            .flat_map(|p| p.file_extensions().iter().copied())
            .collect();
        assert_eq!(extensions, ["properties", "yml", "yaml", "json"]);
    }
}
