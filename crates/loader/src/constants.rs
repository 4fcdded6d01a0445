//! Recognized property keys and built-in defaults.
//!
//! This module centralizes the well-known keys the loader consumes and the
//! default search configuration used when nothing overrides it.

/// Comma-separated profile names to activate. Highest-precedence activation
/// source when set externally (environment variables, command line).
pub const ACTIVE_PROFILES_PROPERTY: &str = "app.profiles.active";

/// Comma-separated profile names to pull into the processing queue ahead of
/// not-yet-processed profiles.
pub const INCLUDE_PROFILES_PROPERTY: &str = "app.profiles.include";

/// The profile selector a document declares for itself. A document without
/// this key applies unconditionally.
pub const DOCUMENT_PROFILES_PROPERTY: &str = "app.profiles";

/// Comma-separated search names, overriding [`DEFAULT_NAMES`].
pub const CONFIG_NAME_PROPERTY: &str = "app.config.name";

/// Comma-separated search locations, replacing the default list entirely.
pub const CONFIG_LOCATION_PROPERTY: &str = "app.config.location";

/// Comma-separated search locations, unioned with the default list.
pub const CONFIG_ADDITIONAL_LOCATION_PROPERTY: &str = "app.config.additional-location";

// Note the order is from least to most specific (last one wins).
pub const DEFAULT_SEARCH_LOCATIONS: &str = "classpath:/,classpath:/config/,file:./,file:./config/";

pub const DEFAULT_NAMES: &str = "application";

/// Name of the low-priority marker source. Loaded configuration is inserted
/// immediately before it when present.
pub const DEFAULT_PROPERTIES_SOURCE: &str = "default-properties";

/// Name of the command-line argument property source.
pub const COMMAND_LINE_SOURCE: &str = "command-line-args";

/// Name of the process-environment property source.
pub const SYSTEM_ENVIRONMENT_SOURCE: &str = "system-environment";
