//! High-level configuration resolver.
//!
//! Responsibilities:
//! - Assemble the environment the loader runs against: command-line
//!   arguments first, process environment snapshot, default properties last.
//! - Run the loader and expose the resolved properties behind a small
//!   resolver surface.
//! - Optionally load a `.env` file, gated by `DOTENV_DISABLED`.
//!
//! Does NOT handle:
//! - Discovery, filtering, or merge mechanics (see loader::engine).
//! - Format parsing (see parser).
//!
//! Invariants / Assumptions:
//! - `load_dotenv()` must be called explicitly to enable `.env` loading.
//! - Dotenv errors never include raw line contents.
//! - Each `load()` builds a fresh environment and loader; resolvers are
//!   single-use.

use std::collections::BTreeMap;
use std::path::PathBuf;

use confstack_env::{CommandLineSource, EnvSource, Environment, MapSource};

use crate::constants::{COMMAND_LINE_SOURCE, DEFAULT_PROPERTIES_SOURCE, SYSTEM_ENVIRONMENT_SOURCE};
use crate::loader::{LoadError, Loader};
use crate::parser::{DocumentParser, default_parsers};
use crate::resource::FsResourceLoader;

/// Builder that assembles an environment, runs the loader, and hands back
/// the resolved configuration.
pub struct ConfigResolver {
    args: Vec<String>,
    default_properties: BTreeMap<String, String>,
    additional_profiles: Vec<String>,
    default_profile_names: Option<Vec<String>>,
    search_locations: Option<String>,
    search_names: Option<String>,
    base_dir: PathBuf,
    classpath_roots: Vec<PathBuf>,
    parsers: Vec<Box<dyn DocumentParser>>,
    include_system_env: bool,
}

impl Default for ConfigResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigResolver {
    pub fn new() -> Self {
        Self {
            args: Vec::new(),
            default_properties: BTreeMap::new(),
            additional_profiles: Vec::new(),
            default_profile_names: None,
            search_locations: None,
            search_names: None,
            base_dir: PathBuf::from("."),
            classpath_roots: Vec::new(),
            parsers: default_parsers(),
            include_system_env: true,
        }
    }

    /// Command-line arguments; `--key=value` pairs become the
    /// highest-precedence property source.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Default properties, merged at the lowest precedence. Loaded
    /// configuration is inserted immediately before them.
    pub fn with_default_properties(mut self, properties: BTreeMap<String, String>) -> Self {
        self.default_properties = properties;
        self
    }

    /// Profiles to activate on top of anything declared via properties or
    /// discovered in documents.
    pub fn with_additional_profiles<I, S>(mut self, profiles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.additional_profiles = profiles.into_iter().map(Into::into).collect();
        self
    }

    /// Profile names to fall back to when nothing activates a profile.
    pub fn with_default_profile_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_profile_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Comma-separated search locations used when the location override
    /// property is absent.
    pub fn with_search_locations(mut self, locations: impl Into<String>) -> Self {
        self.search_locations = Some(locations.into());
        self
    }

    /// Comma-separated search names used when the name override property is
    /// absent.
    pub fn with_search_names(mut self, names: impl Into<String>) -> Self {
        self.search_names = Some(names.into());
        self
    }

    /// Directory that relative and `file:` locations resolve against.
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    /// Add a root directory for `classpath:` locations.
    pub fn with_classpath_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.classpath_roots.push(root.into());
        self
    }

    /// Register an additional document parser.
    pub fn with_parser(mut self, parser: Box<dyn DocumentParser>) -> Self {
        self.parsers.push(parser);
        self
    }

    /// Replace the parser set entirely.
    pub fn with_parsers(mut self, parsers: Vec<Box<dyn DocumentParser>>) -> Self {
        self.parsers = parsers;
        self
    }

    /// Skip the process-environment snapshot (primarily for testing).
    pub fn without_system_env(mut self) -> Self {
        self.include_system_env = false;
        self
    }

    /// Load environment variables from a `.env` file if present.
    ///
    /// If the `DOTENV_DISABLED` environment variable is set to "true" or
    /// "1", the `.env` file will not be loaded. Missing `.env` files are
    /// silently ignored. Error messages never include raw `.env` line
    /// contents.
    pub fn load_dotenv(self) -> Result<Self, LoadError> {
        if Self::dotenv_disabled() {
            return Ok(self);
        }
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if Self::is_not_found(&e) => Ok(self),
            Err(dotenvy::Error::LineParse(_, index)) => {
                Err(LoadError::DotenvParse { error_index: index })
            }
            Err(dotenvy::Error::Io(io_err)) => Err(LoadError::DotenvIo {
                kind: io_err.kind(),
            }),
            Err(_) => Err(LoadError::DotenvUnknown),
        }
    }

    fn dotenv_disabled() -> bool {
        matches!(
            std::env::var("DOTENV_DISABLED").ok().as_deref(),
            Some("true") | Some("1")
        )
    }

    fn is_not_found(err: &dotenvy::Error) -> bool {
        matches!(
            err,
            dotenvy::Error::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound
        )
    }

    /// Build the environment, run the loader, and return the resolved
    /// configuration.
    pub fn load(self) -> Result<ResolvedConfig, LoadError> {
        let mut environment = Environment::new();
        if let Some(names) = self.default_profile_names {
            environment.set_default_profiles(names);
        }
        if !self.args.is_empty() {
            environment
                .property_sources_mut()
                .add_first(Box::new(CommandLineSource::new(COMMAND_LINE_SOURCE, &self.args)));
        }
        if self.include_system_env {
            environment
                .property_sources_mut()
                .add_last(Box::new(EnvSource::capture(SYSTEM_ENVIRONMENT_SOURCE)));
        }
        if !self.default_properties.is_empty() {
            environment.property_sources_mut().add_last(Box::new(MapSource::new(
                DEFAULT_PROPERTIES_SOURCE,
                self.default_properties,
            )));
        }
        for profile in self.additional_profiles {
            environment.add_active_profile(profile);
        }

        let mut resource_loader = FsResourceLoader::new(self.base_dir);
        for root in self.classpath_roots {
            resource_loader.add_classpath_root(root);
        }

        let mut loader = Loader::new(&mut environment, &resource_loader, &self.parsers);
        if let Some(locations) = &self.search_locations {
            loader = loader.with_search_locations(locations.clone());
        }
        if let Some(names) = &self.search_names {
            loader = loader.with_search_names(names.clone());
        }
        loader.load()?;
        Ok(ResolvedConfig { environment })
    }
}

/// The merged, precedence-ordered configuration produced by a load run.
pub struct ResolvedConfig {
    environment: Environment,
}

impl ResolvedConfig {
    pub fn contains_property(&self, key: &str) -> bool {
        self.environment.contains_property(key)
    }

    pub fn get_property(&self, key: &str) -> Option<String> {
        self.environment.get_property(key)
    }

    pub fn get_property_or(&self, key: &str, default: &str) -> String {
        self.get_property(key)
            .unwrap_or_else(|| default.to_string())
    }

    pub fn get_required_property(&self, key: &str) -> Result<String, LoadError> {
        self.get_property(key)
            .ok_or_else(|| LoadError::MissingProperty(key.to_string()))
    }

    /// Look up and parse a property value.
    pub fn get_property_as<T>(&self, key: &str) -> Result<Option<T>, LoadError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.environment
            .get_property_as::<T>(key)
            .map_err(|e| LoadError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })
    }

    /// Active profiles in processing order, most generic first.
    pub fn active_profiles(&self) -> &[String] {
        self.environment.active_profiles()
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn into_environment(self) -> Environment {
        self.environment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn resolves_properties_from_base_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("application.properties"), "greeting=hello\n").unwrap();
        let config = ConfigResolver::new()
            .without_system_env()
            .with_base_dir(dir.path())
            .load()
            .unwrap();
        assert_eq!(config.get_property("greeting"), Some("hello".to_string()));
        assert!(config.active_profiles().is_empty());
    }

    #[test]
    fn command_line_args_have_highest_precedence() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("application.properties"), "port=1\n").unwrap();
        let config = ConfigResolver::new()
            .without_system_env()
            .with_base_dir(dir.path())
            .with_args(["--port=2"])
            .load()
            .unwrap();
        assert_eq!(config.get_property_as::<u16>("port").unwrap(), Some(2));
    }

    #[test]
    fn default_properties_have_lowest_precedence() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("application.properties"), "a=file\n").unwrap();
        let defaults =
            BTreeMap::from([("a".to_string(), "default".to_string()), ("b".to_string(), "kept".to_string())]);
        let config = ConfigResolver::new()
            .without_system_env()
            .with_base_dir(dir.path())
            .with_default_properties(defaults)
            .load()
            .unwrap();
        assert_eq!(config.get_property("a"), Some("file".to_string()));
        assert_eq!(config.get_property("b"), Some("kept".to_string()));
    }

    #[test]
    fn property_default_applies_only_when_missing() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("application.properties"), "present=yes\n").unwrap();
        let config = ConfigResolver::new()
            .without_system_env()
            .with_base_dir(dir.path())
            .load()
            .unwrap();
        assert_eq!(config.get_property_or("present", "fallback"), "yes");
        assert_eq!(config.get_property_or("absent", "fallback"), "fallback");
    }

    #[test]
    fn into_environment_keeps_merged_sources() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("application.properties"), "a=1\n").unwrap();
        let config = ConfigResolver::new()
            .without_system_env()
            .with_base_dir(dir.path())
            .load()
            .unwrap();
        let environment = config.into_environment();
        assert_eq!(environment.get_property("a"), Some("1".to_string()));
        assert!(!environment.property_sources().is_empty());
    }

    #[test]
    fn required_property_errors_when_missing() {
        let dir = TempDir::new().unwrap();
        let config = ConfigResolver::new()
            .without_system_env()
            .with_base_dir(dir.path())
            .load()
            .unwrap();
        assert!(matches!(
            config.get_required_property("nope"),
            Err(LoadError::MissingProperty(_))
        ));
    }

    #[test]
    fn invalid_typed_value_is_an_error() {
        let config = ConfigResolver::new()
            .without_system_env()
            .with_base_dir(TempDir::new().unwrap().path())
            .with_args(["--port=many"])
            .load()
            .unwrap();
        assert!(matches!(
            config.get_property_as::<u16>("port"),
            Err(LoadError::InvalidValue { .. })
        ));
    }

    #[test]
    #[serial]
    fn dotenv_gate_skips_loading() {
        temp_env::with_var("DOTENV_DISABLED", Some("1"), || {
            let resolver = ConfigResolver::new().load_dotenv();
            assert!(resolver.is_ok());
        });
    }
}
