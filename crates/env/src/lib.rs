//! Ordered property-source storage for confstack.
//!
//! This crate provides the environment store consumed by the loader: named
//! property sources held in precedence order, first-match-wins lookup,
//! `${...}` placeholder resolution, typed binding, and active/default
//! profile bookkeeping.

pub mod environment;
pub mod placeholder;
pub mod source;
pub mod sources;

pub use environment::Environment;
pub use source::{CommandLineSource, EnvSource, MapSource, PropertySource};
pub use sources::PropertySources;
