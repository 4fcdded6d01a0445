//! Profile identity.
//!
//! A profile is a named configuration variant (`dev`, `prod`, ...). The
//! "no profile" case is represented as `Option<Profile>::None` by callers,
//! never as a `Profile` with an empty name.

use std::fmt;
use std::hash::{Hash, Hasher};

/// A named configuration variant that can be loaded.
///
/// Equality and hashing consider the name only; the default flag is
/// processing metadata.
#[derive(Debug, Clone, Eq)]
pub struct Profile {
    name: String,
    default_profile: bool,
}

impl Profile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_profile: false,
        }
    }

    /// A profile synthesized from the environment's default profile names.
    /// Default profiles are dropped from the queue once anything else
    /// activates a profile.
    pub fn new_default(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_profile: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_default(&self) -> bool {
        self.default_profile
    }
}

impl PartialEq for Profile {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Hash for Profile {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_default_flag() {
        assert_eq!(Profile::new("dev"), Profile::new_default("dev"));
        assert_ne!(Profile::new("dev"), Profile::new("prod"));
    }

    #[test]
    fn displays_name() {
        assert_eq!(Profile::new("staging").to_string(), "staging");
    }
}
