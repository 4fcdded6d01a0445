//! Parsed configuration documents and the filters that select them.
//!
//! Responsibilities:
//! - Define `Document`: one parsed property set plus the profile metadata
//!   bound from its own content.
//! - Define the positive/negative document filters that decide whether a
//!   document applies to the profile currently being processed.
//!
//! Does NOT handle:
//! - Parsing (see parser) or profile queue management (see loader::engine).
//!
//! Invariants:
//! - Documents are immutable once constructed.
//! - The positive filter with no profile matches only unconditional
//!   documents; with a profile it requires the document's selector to name
//!   that profile and the environment to accept the selector.
//! - The negative filter matches documents whose selector matches none of
//!   the environment's effective profiles; it is only used for the trailing
//!   no-profile pass.

use confstack_env::{Environment, MapSource};

use crate::profile::Profile;

/// A single document produced by a document parser.
#[derive(Debug, Clone)]
pub struct Document {
    property_source: MapSource,
    profiles: Vec<String>,
    active_profiles: Vec<Profile>,
    include_profiles: Vec<Profile>,
}

impl Document {
    pub fn new(
        property_source: MapSource,
        profiles: Vec<String>,
        active_profiles: Vec<Profile>,
        include_profiles: Vec<Profile>,
    ) -> Self {
        Self {
            property_source,
            profiles,
            active_profiles,
            include_profiles,
        }
    }

    pub fn property_source(&self) -> &MapSource {
        &self.property_source
    }

    /// The profile selector this document declares for itself; empty means
    /// the document applies unconditionally.
    pub fn profiles(&self) -> &[String] {
        &self.profiles
    }

    /// Profiles this document activates via the active-profiles property.
    pub fn active_profiles(&self) -> &[Profile] {
        &self.active_profiles
    }

    /// Profiles this document pulls in via the include-profiles property.
    pub fn include_profiles(&self) -> &[Profile] {
        &self.include_profiles
    }
}

/// Factory creating a [`DocumentFilter`] for a given profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFilterFactory {
    /// Selects documents belonging to the profile being processed.
    Positive,
    /// Selects leftover documents whose selector matched no processed
    /// profile (trailing pass only).
    Negative,
}

impl DocumentFilterFactory {
    pub fn document_filter(self, profile: Option<&Profile>) -> DocumentFilter {
        DocumentFilter {
            factory: self,
            profile: profile.cloned(),
        }
    }
}

/// Predicate restricting which documents are loaded for one profile.
#[derive(Debug, Clone)]
pub struct DocumentFilter {
    factory: DocumentFilterFactory,
    profile: Option<Profile>,
}

impl DocumentFilter {
    pub fn matches(&self, environment: &Environment, document: &Document) -> bool {
        match self.factory {
            DocumentFilterFactory::Positive => match &self.profile {
                None => document.profiles().is_empty(),
                Some(profile) => {
                    document.profiles().iter().any(|p| p == profile.name())
                        && environment.accepts_profiles(document.profiles())
                }
            },
            DocumentFilterFactory::Negative => {
                self.profile.is_none()
                    && !document.profiles().is_empty()
                    && !environment.accepts_profiles(document.profiles())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(profiles: &[&str]) -> Document {
        Document::new(
            MapSource::empty("test"),
            profiles.iter().map(|p| p.to_string()).collect(),
            Vec::new(),
            Vec::new(),
        )
    }

    #[test]
    fn positive_filter_without_profile_wants_unconditional_documents() {
        let env = Environment::new();
        let filter = DocumentFilterFactory::Positive.document_filter(None);
        assert!(filter.matches(&env, &document(&[])));
        assert!(!filter.matches(&env, &document(&["dev"])));
    }

    #[test]
    fn positive_filter_requires_selector_and_acceptance() {
        let mut env = Environment::new();
        env.add_active_profile("dev");
        let dev = Profile::new("dev");
        let filter = DocumentFilterFactory::Positive.document_filter(Some(&dev));
        assert!(filter.matches(&env, &document(&["dev"])));
        assert!(!filter.matches(&env, &document(&["prod"])));
        assert!(!filter.matches(&env, &document(&[])));
    }

    #[test]
    fn negative_filter_picks_up_unmatched_selectors() {
        let mut env = Environment::new();
        env.add_active_profile("dev");
        let filter = DocumentFilterFactory::Negative.document_filter(None);
        assert!(filter.matches(&env, &document(&["staging"])));
        assert!(!filter.matches(&env, &document(&["dev"])));
        assert!(!filter.matches(&env, &document(&[])));
    }

    #[test]
    fn negative_filter_never_matches_under_a_profile() {
        let env = Environment::new();
        let staging = Profile::new("staging");
        let filter = DocumentFilterFactory::Negative.document_filter(Some(&staging));
        assert!(!filter.matches(&env, &document(&["other"])));
    }
}
