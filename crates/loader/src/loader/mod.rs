//! The loader engine.
//!
//! Responsibilities:
//! - Drive profile resolution, search-location/name expansion, document
//!   discovery and filtering, and the final merge into the environment.
//!
//! Does NOT handle:
//! - Parsing formats (see parser) or resolving locations (see resource).
//! - Assembling the surrounding environment (see resolver).

mod engine;
mod error;

pub use engine::Loader;
pub use error::LoadError;
