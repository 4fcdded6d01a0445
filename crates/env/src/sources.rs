//! Ordered container of named property sources.
//!
//! Responsibilities:
//! - Hold property sources in precedence order (index 0 is consulted first).
//! - Support the positional mutations the loader merge needs:
//!   `add_first`, `add_last`, `add_before`, `add_after`, `replace`, `remove`.
//!
//! Does NOT handle:
//! - Property lookup across sources (see environment.rs).
//!
//! Invariants:
//! - Source names are unique: every add operation first removes any existing
//!   source with the same name.

use crate::source::PropertySource;

/// Property sources in precedence order; the earliest source wins lookups.
#[derive(Default)]
pub struct PropertySources {
    sources: Vec<Box<dyn PropertySource>>,
}

impl PropertySources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&dyn PropertySource> {
        self.index_of(name).map(|i| self.sources[i].as_ref())
    }

    /// Iterate sources in precedence order (highest precedence first).
    pub fn iter(&self) -> impl Iterator<Item = &dyn PropertySource> {
        self.sources.iter().map(|s| s.as_ref())
    }

    /// Names of all sources, in precedence order.
    pub fn names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Add a source with the highest precedence.
    pub fn add_first(&mut self, source: Box<dyn PropertySource>) {
        self.remove(source.name());
        self.sources.insert(0, source);
    }

    /// Add a source with the lowest precedence.
    pub fn add_last(&mut self, source: Box<dyn PropertySource>) {
        self.remove(source.name());
        self.sources.push(source);
    }

    /// Add a source immediately before the named one (higher precedence).
    ///
    /// Falls back to `add_first` when `relative` is not present.
    pub fn add_before(&mut self, relative: &str, source: Box<dyn PropertySource>) {
        self.remove(source.name());
        match self.index_of(relative) {
            Some(index) => self.sources.insert(index, source),
            None => {
                tracing::warn!(relative, "relative property source missing, adding first");
                self.sources.insert(0, source);
            }
        }
    }

    /// Add a source immediately after the named one (lower precedence).
    ///
    /// Falls back to `add_last` when `relative` is not present.
    pub fn add_after(&mut self, relative: &str, source: Box<dyn PropertySource>) {
        self.remove(source.name());
        match self.index_of(relative) {
            Some(index) => self.sources.insert(index + 1, source),
            None => {
                tracing::warn!(relative, "relative property source missing, adding last");
                self.sources.push(source);
            }
        }
    }

    /// Replace the named source in place, keeping its position.
    pub fn replace(&mut self, name: &str, source: Box<dyn PropertySource>) {
        match self.index_of(name) {
            Some(index) => self.sources[index] = source,
            None => self.sources.push(source),
        }
    }

    /// Remove the named source, returning whether it was present.
    pub fn remove(&mut self, name: &str) -> bool {
        match self.index_of(name) {
            Some(index) => {
                self.sources.remove(index);
                true
            }
            None => false,
        }
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.sources.iter().position(|s| s.name() == name)
    }
}
