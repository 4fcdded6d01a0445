//! Profile-aware configuration loading for confstack.
//!
//! This crate discovers candidate configuration documents across search
//! locations, names, formats, and profiles, and merges them into one
//! ordered property-source store: later-processed, more specific sources
//! override earlier, more generic ones.

pub mod cache;
pub mod constants;
pub mod document;
mod loader;
pub mod parser;
pub mod profile;
pub mod resolver;
pub mod resource;

pub use document::{Document, DocumentFilter, DocumentFilterFactory};
pub use loader::{LoadError, Loader};
pub use parser::{DocumentParser, JsonParser, PropertiesParser, YamlParser, default_parsers};
pub use profile::Profile;
pub use resolver::{ConfigResolver, ResolvedConfig};
pub use resource::{FsResourceLoader, Resource, ResourceLoader};
