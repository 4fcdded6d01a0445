//! `.properties` parsing.
//!
//! Supports `key=value` and `key: value` pairs, `#`/`!` comment lines, and
//! trailing-backslash line continuation. A line without a separator binds
//! the whole line as a key with an empty value. Produces a single document.

use std::collections::BTreeMap;

use confstack_env::MapSource;

use super::{DocumentParser, read_resource};
use crate::loader::LoadError;
use crate::resource::Resource;

pub struct PropertiesParser;

impl DocumentParser for PropertiesParser {
    fn name(&self) -> &'static str {
        "properties"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["properties"]
    }

    fn parse(&self, origin: &str, resource: &Resource) -> Result<Vec<MapSource>, LoadError> {
        let text = read_resource(resource)?;
        let mut entries = BTreeMap::new();
        for line in logical_lines(&text) {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            let (key, value) = split_pair(line);
            entries.insert(key.to_string(), value.to_string());
        }
        if entries.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![MapSource::new(origin, entries)])
    }
}

/// Join raw lines whose trailing backslash continues onto the next line.
fn logical_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut pending = String::new();
    for raw in text.lines() {
        let continued = ends_with_odd_backslashes(raw);
        let fragment = if continued { &raw[..raw.len() - 1] } else { raw };
        if pending.is_empty() {
            pending.push_str(fragment);
        } else {
            pending.push_str(fragment.trim_start());
        }
        if !continued {
            lines.push(std::mem::take(&mut pending));
        }
    }
    if !pending.is_empty() {
        lines.push(pending);
    }
    lines
}

fn ends_with_odd_backslashes(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

/// Split at the first `=` or `:`, whichever comes first.
fn split_pair(line: &str) -> (&str, &str) {
    let separator = line
        .char_indices()
        .find(|(_, c)| *c == '=' || *c == ':')
        .map(|(i, _)| i);
    match separator {
        Some(index) => (line[..index].trim_end(), line[index + 1..].trim()),
        None => (line, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confstack_env::PropertySource;
    use tempfile::TempDir;

    fn parse(content: &str) -> Vec<MapSource> {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("application.properties");
        std::fs::write(&path, content).unwrap();
        let resource = Resource::new("file:./application.properties", &path);
        PropertiesParser.parse("test", &resource).unwrap()
    }

    #[test]
    fn parses_pairs_and_comments() {
        let sources = parse("# comment\n! also comment\na=1\nb: two\n\nc = 3\n");
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].get("a"), Some("1".to_string()));
        assert_eq!(sources[0].get("b"), Some("two".to_string()));
        assert_eq!(sources[0].get("c"), Some("3".to_string()));
    }

    #[test]
    fn line_without_separator_is_a_bare_key() {
        let sources = parse("flag\n");
        assert_eq!(sources[0].get("flag"), Some(String::new()));
    }

    #[test]
    fn continuation_lines_join() {
        let sources = parse("list=a,\\\n    b,\\\n    c\n");
        assert_eq!(sources[0].get("list"), Some("a,b,c".to_string()));
    }

    #[test]
    fn empty_file_yields_no_documents() {
        assert!(parse("").is_empty());
        assert!(parse("# just a comment\n").is_empty());
    }
}
