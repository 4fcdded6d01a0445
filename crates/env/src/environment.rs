//! The environment: property sources plus profile state.
//!
//! Responsibilities:
//! - First-match-wins property lookup across the ordered sources.
//! - Placeholder resolution and typed/list binding of property values.
//! - Active and default profile bookkeeping.
//!
//! Does NOT handle:
//! - Discovering or parsing configuration files (see the loader crate).
//! - Deciding which profiles become active (the loader drives that).
//!
//! Invariants:
//! - `active_profiles` holds no duplicates; `add_active_profile` is
//!   idempotent.
//! - `accepts_profiles` consults the default profiles only while no profile
//!   is active.
//! - List binding trims entries and drops empties.

use crate::placeholder;
use crate::sources::PropertySources;

/// Default profile name used when nothing was configured.
pub const DEFAULT_PROFILE: &str = "default";

/// Ordered property sources plus active/default profile state.
#[derive(Default)]
pub struct Environment {
    property_sources: PropertySources,
    active_profiles: Vec<String>,
    default_profiles: Vec<String>,
}

impl Environment {
    pub fn new() -> Self {
        Self {
            property_sources: PropertySources::new(),
            active_profiles: Vec::new(),
            default_profiles: vec![DEFAULT_PROFILE.to_string()],
        }
    }

    pub fn property_sources(&self) -> &PropertySources {
        &self.property_sources
    }

    pub fn property_sources_mut(&mut self) -> &mut PropertySources {
        &mut self.property_sources
    }

    /// Raw lookup without placeholder resolution; earliest source wins.
    pub fn get_raw(&self, key: &str) -> Option<String> {
        self.property_sources.iter().find_map(|s| s.get(key))
    }

    /// Lookup with placeholder resolution applied to the value.
    pub fn get_property(&self, key: &str) -> Option<String> {
        self.get_raw(key)
            .map(|value| self.resolve_placeholders(&value))
    }

    pub fn contains_property(&self, key: &str) -> bool {
        self.property_sources.iter().any(|s| s.contains(key))
    }

    /// Lookup and parse a property value.
    ///
    /// Returns `Ok(None)` when the key is absent, `Err` when the value does
    /// not parse.
    pub fn get_property_as<T>(&self, key: &str) -> Result<Option<T>, T::Err>
    where
        T: std::str::FromStr,
    {
        match self.get_property(key) {
            Some(value) => value.trim().parse().map(Some),
            None => Ok(None),
        }
    }

    /// Bind a comma-separated property to a list of trimmed, non-empty
    /// entries. Absent keys bind to an empty list.
    pub fn get_list(&self, key: &str) -> Vec<String> {
        match self.get_property(key) {
            Some(value) => split_csv(&value),
            None => Vec::new(),
        }
    }

    /// Resolve `${...}` placeholders in arbitrary text against this
    /// environment. Unresolvable placeholders are left verbatim.
    pub fn resolve_placeholders(&self, text: &str) -> String {
        placeholder::resolve(text, &|key: &str| self.get_raw(key))
    }

    pub fn active_profiles(&self) -> &[String] {
        &self.active_profiles
    }

    /// Register a profile as active, keeping registration order. Idempotent.
    pub fn add_active_profile(&mut self, profile: impl Into<String>) {
        let profile = profile.into();
        if !self.active_profiles.contains(&profile) {
            self.active_profiles.push(profile);
        }
    }

    pub fn set_active_profiles(&mut self, profiles: Vec<String>) {
        self.active_profiles = profiles;
        self.active_profiles.dedup();
    }

    pub fn default_profiles(&self) -> &[String] {
        &self.default_profiles
    }

    pub fn set_default_profiles(&mut self, profiles: Vec<String>) {
        self.default_profiles = profiles;
    }

    /// Whether any of the given profile expressions matches this
    /// environment. A leading `!` negates a profile name. The default
    /// profiles stand in while no profile is active.
    pub fn accepts_profiles(&self, profiles: &[String]) -> bool {
        profiles.iter().any(|expression| {
            match expression.strip_prefix('!') {
                Some(negated) => !self.is_profile_active(negated),
                None => self.is_profile_active(expression),
            }
        })
    }

    fn is_profile_active(&self, profile: &str) -> bool {
        let effective = if self.active_profiles.is_empty() {
            &self.default_profiles
        } else {
            &self.active_profiles
        };
        effective.iter().any(|p| p == profile)
    }
}

/// Split comma-separated text into trimmed, non-empty entries.
pub fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MapSource;
    use std::collections::BTreeMap;

    fn source(name: &str, pairs: &[(&str, &str)]) -> Box<MapSource> {
        let entries: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Box::new(MapSource::new(name, entries))
    }

    #[test]
    fn first_source_wins() {
        let mut env = Environment::new();
        env.property_sources_mut()
            .add_last(source("low", &[("k", "low"), ("only-low", "x")]));
        env.property_sources_mut().add_first(source("high", &[("k", "high")]));
        assert_eq!(env.get_property("k"), Some("high".to_string()));
        assert_eq!(env.get_property("only-low"), Some("x".to_string()));
    }

    #[test]
    fn property_values_resolve_placeholders() {
        let mut env = Environment::new();
        env.property_sources_mut().add_last(source(
            "s",
            &[("greeting", "hello ${name:world}"), ("name", "confstack")],
        ));
        assert_eq!(
            env.get_property("greeting"),
            Some("hello confstack".to_string())
        );
    }

    #[test]
    fn typed_binding() {
        let mut env = Environment::new();
        env.property_sources_mut()
            .add_last(source("s", &[("port", " 8080 "), ("bad", "ten")]));
        assert_eq!(env.get_property_as::<u16>("port"), Ok(Some(8080)));
        assert_eq!(env.get_property_as::<u16>("missing"), Ok(None));
        assert!(env.get_property_as::<u16>("bad").is_err());
    }

    #[test]
    fn list_binding_trims_and_drops_empties() {
        let mut env = Environment::new();
        env.property_sources_mut()
            .add_last(source("s", &[("profiles", "a , b,,c ")]));
        assert_eq!(env.get_list("profiles"), vec!["a", "b", "c"]);
        assert!(env.get_list("missing").is_empty());
    }

    #[test]
    fn add_active_profile_is_idempotent() {
        let mut env = Environment::new();
        env.add_active_profile("dev");
        env.add_active_profile("dev");
        env.add_active_profile("prod");
        assert_eq!(env.active_profiles(), ["dev", "prod"]);
    }

    #[test]
    fn accepts_profiles_with_negation() {
        let mut env = Environment::new();
        env.add_active_profile("prod");
        assert!(env.accepts_profiles(&["prod".to_string()]));
        assert!(!env.accepts_profiles(&["dev".to_string()]));
        assert!(env.accepts_profiles(&["!dev".to_string()]));
        assert!(!env.accepts_profiles(&["!prod".to_string()]));
    }

    #[test]
    fn defaults_stand_in_when_nothing_active() {
        let env = Environment::new();
        assert!(env.accepts_profiles(&["default".to_string()]));
        assert!(!env.accepts_profiles(&["prod".to_string()]));
    }
}
