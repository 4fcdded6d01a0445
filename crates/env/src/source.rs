//! Property source types.
//!
//! Responsibilities:
//! - Define the `PropertySource` lookup trait shared by all source kinds.
//! - Provide `MapSource` (named flat key/value set, what parsers produce).
//! - Provide `EnvSource` (process environment snapshot with dotted-key
//!   translation) and `CommandLineSource` (`--key=value` arguments).
//!
//! Does NOT handle:
//! - Source ordering or precedence (see sources.rs).
//! - Placeholder resolution (see placeholder.rs).
//!
//! Invariants:
//! - Sources are immutable after construction except `MapSource::insert`,
//!   which is only used while a document is being assembled.
//! - `EnvSource` captures the environment once; later process-env mutations
//!   are not visible through it.

use std::collections::BTreeMap;

/// A named set of configuration properties that can be looked up by key.
pub trait PropertySource {
    /// The unique name of this source within a [`crate::PropertySources`].
    fn name(&self) -> &str;

    /// Look up a property value by its dotted key.
    fn get(&self, key: &str) -> Option<String>;

    /// Whether this source contains the given key.
    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

/// A property source backed by an in-memory map.
///
/// This is the shape produced by the document parsers and merged into the
/// environment by the loader.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapSource {
    name: String,
    entries: BTreeMap<String, String>,
}

impl MapSource {
    pub fn new(name: impl Into<String>, entries: BTreeMap<String, String>) -> Self {
        Self {
            name: name.into(),
            entries,
        }
    }

    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, BTreeMap::new())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }
}

impl PropertySource for MapSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

/// A snapshot of the process environment.
///
/// Dotted keys are translated to environment-variable form on lookup:
/// `app.profiles.active` matches `APP_PROFILES_ACTIVE`. An exact-name match
/// is tried first so callers can also ask for variables verbatim.
#[derive(Debug, Clone)]
pub struct EnvSource {
    name: String,
    vars: BTreeMap<String, String>,
}

impl EnvSource {
    /// Capture the current process environment.
    pub fn capture(name: impl Into<String>) -> Self {
        Self::from_vars(name, std::env::vars())
    }

    /// Build a source from an explicit variable set (used in tests).
    pub fn from_vars(
        name: impl Into<String>,
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        Self {
            name: name.into(),
            vars: vars.into_iter().collect(),
        }
    }

    fn as_env_name(key: &str) -> String {
        key.chars()
            .map(|c| match c {
                '.' | '-' => '_',
                other => other.to_ascii_uppercase(),
            })
            .collect()
    }
}

impl PropertySource for EnvSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str) -> Option<String> {
        if let Some(value) = self.vars.get(key) {
            return Some(value.clone());
        }
        self.vars.get(&Self::as_env_name(key)).cloned()
    }
}

/// A property source parsed from command-line arguments.
///
/// Recognizes `--key=value` and bare `--flag` (empty value); anything not
/// starting with `--` is ignored.
#[derive(Debug, Clone)]
pub struct CommandLineSource {
    name: String,
    entries: BTreeMap<String, String>,
}

impl CommandLineSource {
    pub fn new<I, S>(name: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut entries = BTreeMap::new();
        for arg in args {
            let arg = arg.as_ref();
            if let Some(option) = arg.strip_prefix("--") {
                match option.split_once('=') {
                    Some((key, value)) => entries.insert(key.to_string(), value.to_string()),
                    None => entries.insert(option.to_string(), String::new()),
                };
            }
        }
        Self {
            name: name.into(),
            entries,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PropertySource for CommandLineSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }
}
