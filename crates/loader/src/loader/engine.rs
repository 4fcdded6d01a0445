//! Core loading algorithm.
//!
//! Responsibilities:
//! - Maintain the profile queue: seed it from externally-declared and
//!   pre-set profiles, grow it from document activations and includes.
//! - Expand search locations and names, discover and filter documents per
//!   profile, and feed accepted documents into per-profile groups.
//! - Merge the collected groups into the environment in precedence order
//!   and reset the environment's active-profile order to processing order.
//!
//! Invariants / Assumptions:
//! - One `Loader` serves exactly one `load()` call; queue and cache state
//!   are never reused across runs.
//! - Discovery order equals precedence order: location and name lists are
//!   reversed before iteration so later-declared entries are searched, and
//!   therefore merged, first.
//! - Once profiles were activated externally, document-declared activations
//!   are ignored (logged at debug, no error).
//! - Missing resources and extension-less filenames are skipped silently;
//!   read/parse failures abort the load.

use std::collections::{HashSet, VecDeque};

use confstack_env::environment::split_csv;
use confstack_env::{Environment, MapSource, PropertySource};

use crate::cache::{DocumentsCache, DocumentsCacheKey};
use crate::constants::{
    ACTIVE_PROFILES_PROPERTY, CONFIG_ADDITIONAL_LOCATION_PROPERTY, CONFIG_LOCATION_PROPERTY,
    CONFIG_NAME_PROPERTY, DEFAULT_NAMES, DEFAULT_PROPERTIES_SOURCE, DEFAULT_SEARCH_LOCATIONS,
    DOCUMENT_PROFILES_PROPERTY, INCLUDE_PROFILES_PROPERTY,
};
use crate::document::{Document, DocumentFilter, DocumentFilterFactory};
use crate::loader::error::LoadError;
use crate::parser::DocumentParser;
use crate::profile::Profile;
use crate::resource::{ResourceLoader, has_url_scheme};

/// How an accepted document is added to its profile group.
#[derive(Clone, Copy)]
enum DocumentConsumer {
    /// Append to the group (main pass).
    AppendLast,
    /// Prepend to the group unless any group already holds a source with
    /// the same name (trailing negative-filter pass).
    PrependFirstIfAbsent,
}

/// Documents collected for one profile, in discovery order.
struct ProfileGroup {
    profile: Option<Profile>,
    sources: Vec<MapSource>,
}

/// Loads candidate property sources and configures the active profiles.
///
/// All working state belongs to one in-flight `load()`; build a fresh
/// loader for every run.
pub struct Loader<'a> {
    environment: &'a mut Environment,
    resource_loader: &'a dyn ResourceLoader,
    parsers: &'a [Box<dyn DocumentParser>],
    search_locations: Option<String>,
    search_names: Option<String>,
    profiles: VecDeque<Option<Profile>>,
    processed_profiles: Vec<Option<Profile>>,
    activated_profiles: bool,
    loaded: Vec<ProfileGroup>,
    cache: DocumentsCache,
}

impl<'a> Loader<'a> {
    pub fn new(
        environment: &'a mut Environment,
        resource_loader: &'a dyn ResourceLoader,
        parsers: &'a [Box<dyn DocumentParser>],
    ) -> Self {
        Self {
            environment,
            resource_loader,
            parsers,
            search_locations: None,
            search_names: None,
            profiles: VecDeque::new(),
            processed_profiles: Vec::new(),
            activated_profiles: false,
            loaded: Vec::new(),
            cache: DocumentsCache::new(),
        }
    }

    /// Set the comma-separated search locations considered when the
    /// location override property is absent. Later entries take precedence.
    pub fn with_search_locations(mut self, locations: impl Into<String>) -> Self {
        self.search_locations = Some(locations.into());
        self
    }

    /// Set the comma-separated base filenames (without extension) searched
    /// when the name override property is absent.
    pub fn with_search_names(mut self, names: impl Into<String>) -> Self {
        self.search_names = Some(names.into());
        self
    }

    /// Run the load: resolve profiles, discover documents, merge the result
    /// into the environment.
    pub fn load(mut self) -> Result<(), LoadError> {
        self.initialize_profiles();
        while let Some(profile) = self.profiles.pop_front() {
            if let Some(p) = &profile
                && !p.is_default()
            {
                self.environment.add_active_profile(p.name());
            }
            self.discover(
                profile.as_ref(),
                DocumentFilterFactory::Positive,
                DocumentConsumer::AppendLast,
            )?;
            self.processed_profiles.push(profile);
        }
        self.reset_environment_profiles();
        self.discover(
            None,
            DocumentFilterFactory::Negative,
            DocumentConsumer::PrependFirstIfAbsent,
        )?;
        self.merge_into_environment();
        Ok(())
    }

    /// Seed the profile queue from the environment's active profiles and
    /// any externally-declared active/include properties.
    fn initialize_profiles(&mut self) {
        // The no-profile case is processed first so it has lowest priority.
        self.profiles.push_back(None);
        let activated_via_property = self.profiles_activated_via_property();
        for profile in self.other_active_profiles(&activated_via_property) {
            self.profiles.push_back(Some(profile));
        }
        // Pre-existing active profiles set via properties (e.g. environment
        // variables) take precedence over those added in config files.
        self.activate_profiles(activated_via_property);
        if self.profiles.len() == 1 {
            for name in self.environment.default_profiles().to_vec() {
                self.profiles.push_back(Some(Profile::new_default(name)));
            }
        }
    }

    fn profiles_activated_via_property(&self) -> Vec<Profile> {
        if !self.environment.contains_property(ACTIVE_PROFILES_PROPERTY)
            && !self.environment.contains_property(INCLUDE_PROFILES_PROPERTY)
        {
            return Vec::new();
        }
        let mut profiles = Vec::new();
        extend_unique(
            &mut profiles,
            self.environment
                .get_list(INCLUDE_PROFILES_PROPERTY)
                .into_iter()
                .map(Profile::new),
        );
        extend_unique(
            &mut profiles,
            self.environment
                .get_list(ACTIVE_PROFILES_PROPERTY)
                .into_iter()
                .map(Profile::new),
        );
        profiles
    }

    fn other_active_profiles(&self, activated_via_property: &[Profile]) -> Vec<Profile> {
        self.environment
            .active_profiles()
            .iter()
            .map(|name| Profile::new(name.as_str()))
            .filter(|profile| !activated_via_property.contains(profile))
            .collect()
    }

    /// Activate profiles, freezing further activation. Once frozen,
    /// document-declared activations are ignored.
    fn activate_profiles(&mut self, profiles: Vec<Profile>) {
        if profiles.is_empty() {
            return;
        }
        if self.activated_profiles {
            tracing::debug!(
                profiles = ?names_of(&profiles),
                "profiles already activated, these will not be applied"
            );
            return;
        }
        tracing::debug!(profiles = ?names_of(&profiles), "activated profiles");
        self.profiles.extend(profiles.into_iter().map(Some));
        self.activated_profiles = true;
        self.remove_unprocessed_default_profiles();
    }

    fn remove_unprocessed_default_profiles(&mut self) {
        self.profiles
            .retain(|profile| !matches!(profile, Some(p) if p.is_default()));
    }

    /// Splice included profiles to the front of the remaining queue,
    /// skipping any that were already processed.
    fn include_profiles(&mut self, include: &[Profile]) {
        if include.is_empty() {
            return;
        }
        let existing: Vec<Option<Profile>> = self.profiles.drain(..).collect();
        for profile in include {
            let processed = self
                .processed_profiles
                .iter()
                .any(|p| p.as_ref() == Some(profile));
            if !processed {
                self.profiles.push_back(Some(profile.clone()));
            }
        }
        self.profiles.extend(existing);
    }

    /// One discovery pass: every (location, name) combination for a profile.
    fn discover(
        &mut self,
        profile: Option<&Profile>,
        factory: DocumentFilterFactory,
        consumer: DocumentConsumer,
    ) -> Result<(), LoadError> {
        for location in self.resolved_search_locations() {
            if location.ends_with('/') {
                for name in self.resolved_search_names() {
                    self.discover_named(&location, Some(&name), profile, factory, consumer)?;
                }
            } else {
                // A literal file reference: match by extension, no names.
                self.discover_named(&location, None, profile, factory, consumer)?;
            }
        }
        Ok(())
    }

    fn discover_named(
        &mut self,
        location: &str,
        name: Option<&str>,
        profile: Option<&Profile>,
        factory: DocumentFilterFactory,
        consumer: DocumentConsumer,
    ) -> Result<(), LoadError> {
        let parsers = self.parsers;
        let Some(name) = name else {
            for (index, parser) in parsers.iter().enumerate() {
                if can_parse_extension(parser.as_ref(), location) {
                    let filter = factory.document_filter(profile);
                    return self.load_resource(index, location, profile, &filter, consumer);
                }
            }
            return Ok(());
        };
        let mut seen_extensions = HashSet::new();
        for index in 0..parsers.len() {
            for extension in parsers[index].file_extensions() {
                if seen_extensions.insert(*extension) {
                    self.load_for_extension(
                        index,
                        &format!("{location}{name}"),
                        &format!(".{extension}"),
                        profile,
                        factory,
                        consumer,
                    )?;
                }
            }
        }
        Ok(())
    }

    fn load_for_extension(
        &mut self,
        parser: usize,
        prefix: &str,
        extension: &str,
        profile: Option<&Profile>,
        factory: DocumentFilterFactory,
        consumer: DocumentConsumer,
    ) -> Result<(), LoadError> {
        let default_filter = factory.document_filter(None);
        let profile_filter = factory.document_filter(profile);
        if let Some(profile) = profile {
            // Try the profile-specific file both ways: as a plain file with
            // no internal selectors and as one carrying profile sections.
            let profile_specific = format!("{prefix}-{profile}{extension}");
            self.load_resource(parser, &profile_specific, Some(profile), &default_filter, consumer)?;
            self.load_resource(parser, &profile_specific, Some(profile), &profile_filter, consumer)?;
            // Sections for this profile left in files of already-processed
            // profiles.
            let previously_loaded: Vec<String> = self
                .processed_profiles
                .iter()
                .flatten()
                .map(|processed| format!("{prefix}-{processed}{extension}"))
                .collect();
            for location in previously_loaded {
                self.load_resource(parser, &location, Some(profile), &profile_filter, consumer)?;
            }
        }
        // Also try the profile-specific section (if any) of the normal file.
        self.load_resource(
            parser,
            &format!("{prefix}{extension}"),
            profile,
            &profile_filter,
            consumer,
        )
    }

    fn load_resource(
        &mut self,
        parser: usize,
        location: &str,
        profile: Option<&Profile>,
        filter: &DocumentFilter,
        consumer: DocumentConsumer,
    ) -> Result<(), LoadError> {
        let profile_name = profile.map(Profile::name);
        let Some(resource) = self.resource_loader.resolve(location) else {
            tracing::trace!(location, profile = ?profile_name, "skipped missing config");
            return Ok(());
        };
        if !resource.exists() {
            tracing::trace!(location, profile = ?profile_name, "skipped missing config");
            return Ok(());
        }
        if resource.extension().is_none() {
            tracing::trace!(location, profile = ?profile_name, "skipped config with empty extension");
            return Ok(());
        }
        let name = format!("applicationConfig: [{location}]");
        let documents = self
            .load_documents(parser, &name, &resource)
            .map_err(|source| LoadError::PropertySource {
                location: location.to_string(),
                source: Box::new(source),
            })?;
        if documents.is_empty() {
            tracing::trace!(location, profile = ?profile_name, "skipped unloaded config");
            return Ok(());
        }
        let mut accepted: Vec<Document> = Vec::new();
        for document in documents.iter() {
            if filter.matches(self.environment, document) {
                self.activate_profiles(document.active_profiles().to_vec());
                self.include_profiles(document.include_profiles());
                accepted.push(document.clone());
            }
        }
        // Later-declared documents within one file take precedence.
        accepted.reverse();
        if !accepted.is_empty() {
            for document in &accepted {
                self.consume(consumer, profile, document);
            }
            tracing::debug!(location, profile = ?profile_name, "loaded config file");
        }
        Ok(())
    }

    fn load_documents(
        &mut self,
        parser: usize,
        name: &str,
        resource: &crate::resource::Resource,
    ) -> Result<std::rc::Rc<Vec<Document>>, LoadError> {
        let key = DocumentsCacheKey::new(self.parsers[parser].name(), resource);
        if let Some(documents) = self.cache.get(&key) {
            return Ok(documents);
        }
        let sources = self.parsers[parser].parse(name, resource)?;
        let documents = self.as_documents(sources);
        Ok(self.cache.insert(key, documents))
    }

    /// Bind each parsed property set's profile metadata into a document.
    /// Placeholders in the bound values resolve against the environment.
    fn as_documents(&self, sources: Vec<MapSource>) -> Vec<Document> {
        sources
            .into_iter()
            .map(|source| {
                let profiles = self.bind_profile_names(&source, DOCUMENT_PROFILES_PROPERTY);
                let active = self
                    .bind_profile_names(&source, ACTIVE_PROFILES_PROPERTY)
                    .into_iter()
                    .map(Profile::new)
                    .collect();
                let include = self
                    .bind_profile_names(&source, INCLUDE_PROFILES_PROPERTY)
                    .into_iter()
                    .map(Profile::new)
                    .collect();
                Document::new(source, profiles, active, include)
            })
            .collect()
    }

    fn bind_profile_names(&self, source: &MapSource, key: &str) -> Vec<String> {
        match source.get(key) {
            Some(value) => split_csv(&self.environment.resolve_placeholders(&value)),
            None => Vec::new(),
        }
    }

    fn consume(&mut self, consumer: DocumentConsumer, profile: Option<&Profile>, document: &Document) {
        let source = document.property_source().clone();
        match consumer {
            DocumentConsumer::AppendLast => self.group_mut(profile).push(source),
            DocumentConsumer::PrependFirstIfAbsent => {
                let already_merged = self
                    .loaded
                    .iter()
                    .any(|group| group.sources.iter().any(|s| s.name() == source.name()));
                if !already_merged {
                    self.group_mut(profile).insert(0, source);
                }
            }
        }
    }

    fn group_mut(&mut self, profile: Option<&Profile>) -> &mut Vec<MapSource> {
        let position = self
            .loaded
            .iter()
            .position(|group| group.profile.as_ref() == profile);
        let index = match position {
            Some(index) => index,
            None => {
                self.loaded.push(ProfileGroup {
                    profile: profile.cloned(),
                    sources: Vec::new(),
                });
                self.loaded.len() - 1
            }
        };
        &mut self.loaded[index].sources
    }

    /// Make the environment's active-profile order match processing order.
    fn reset_environment_profiles(&mut self) {
        let names = self
            .processed_profiles
            .iter()
            .flatten()
            .filter(|profile| !profile.is_default())
            .map(|profile| profile.name().to_string())
            .collect();
        self.environment.set_active_profiles(names);
    }

    /// Merge collected groups into the environment: most recently processed
    /// profile first, so the destination's first-match-wins lookup sees the
    /// most specific sources first.
    fn merge_into_environment(&mut self) {
        let mut last_added: Option<String> = None;
        let mut added: HashSet<String> = HashSet::new();
        let groups: Vec<Vec<MapSource>> = self
            .loaded
            .iter()
            .rev()
            .map(|group| group.sources.clone())
            .collect();
        for sources in groups {
            for source in sources {
                if !added.insert(source.name().to_string()) {
                    continue;
                }
                let name = source.name().to_string();
                let destination = self.environment.property_sources_mut();
                match &last_added {
                    None => {
                        if destination.contains(DEFAULT_PROPERTIES_SOURCE) {
                            destination.add_before(DEFAULT_PROPERTIES_SOURCE, Box::new(source));
                        } else {
                            destination.add_last(Box::new(source));
                        }
                    }
                    Some(last) => destination.add_after(last, Box::new(source)),
                }
                last_added = Some(name);
            }
        }
    }

    /// Search locations, most specific first. The location override property
    /// replaces the list entirely; the additional-location property extends
    /// it with higher precedence.
    fn resolved_search_locations(&self) -> Vec<String> {
        if self.environment.contains_property(CONFIG_LOCATION_PROPERTY) {
            return self.locations_from_property(CONFIG_LOCATION_PROPERTY);
        }
        let mut locations = self.locations_from_property(CONFIG_ADDITIONAL_LOCATION_PROPERTY);
        extend_unique(
            &mut locations,
            self.as_resolved_set(self.search_locations.as_deref(), DEFAULT_SEARCH_LOCATIONS),
        );
        locations
    }

    fn locations_from_property(&self, key: &str) -> Vec<String> {
        let Some(value) = self.environment.get_raw(key) else {
            return Vec::new();
        };
        self.as_resolved_set(Some(&value), "")
            .into_iter()
            .map(|path| {
                if path.contains('$') {
                    return path;
                }
                let cleaned = clean_path(&path);
                if has_url_scheme(&cleaned) {
                    cleaned
                } else {
                    format!("file:{cleaned}")
                }
            })
            .collect()
    }

    fn resolved_search_names(&self) -> Vec<String> {
        if let Some(value) = self.environment.get_raw(CONFIG_NAME_PROPERTY) {
            return self.as_resolved_set(Some(&value), "");
        }
        self.as_resolved_set(self.search_names.as_deref(), DEFAULT_NAMES)
    }

    /// Split a comma-separated value into a reversed, deduplicated list.
    /// Reversal makes later-declared entries iterate first, which combined
    /// with first-added-wins merging yields last-declared-wins semantics.
    fn as_resolved_set(&self, value: Option<&str>, fallback: &str) -> Vec<String> {
        let raw = match value {
            Some(value) => self.environment.resolve_placeholders(value),
            None => fallback.to_string(),
        };
        let mut list = split_csv(&raw);
        list.reverse();
        let mut unique = Vec::new();
        extend_unique(&mut unique, list);
        unique
    }
}

fn can_parse_extension(parser: &dyn DocumentParser, location: &str) -> bool {
    let location = location.to_ascii_lowercase();
    parser
        .file_extensions()
        .iter()
        .any(|extension| location.ends_with(&format!(".{extension}")))
}

fn names_of(profiles: &[Profile]) -> Vec<&str> {
    profiles.iter().map(Profile::name).collect()
}

fn extend_unique<T: PartialEq>(target: &mut Vec<T>, additions: impl IntoIterator<Item = T>) {
    for addition in additions {
        if !target.contains(&addition) {
            target.push(addition);
        }
    }
}

/// Normalize a path: forward slashes, no `.` segments, `..` folded where
/// possible, URL scheme prefix and trailing slash preserved.
fn clean_path(path: &str) -> String {
    let normalized = path.replace('\\', "/");
    let (prefix, rest) = if has_url_scheme(&normalized) {
        match normalized.find(':') {
            Some(index) => normalized.split_at(index + 1),
            None => ("", normalized.as_str()),
        }
    } else {
        ("", normalized.as_str())
    };
    let leading_slash = rest.starts_with('/');
    let trailing_slash = rest.ends_with('/');
    let mut ups = 0usize;
    let mut segments: Vec<&str> = Vec::new();
    for segment in rest.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    ups += 1;
                }
            }
            other => segments.push(other),
        }
    }
    let mut parts: Vec<&str> = Vec::new();
    for _ in 0..ups {
        parts.push("..");
    }
    parts.extend(segments);
    let mut out = String::from(prefix);
    if leading_slash {
        out.push('/');
    }
    out.push_str(&parts.join("/"));
    if trailing_slash && !out.is_empty() && !out.ends_with('/') {
        out.push('/');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_path_normalizes_segments() {
        assert_eq!(clean_path("./config/"), "config/");
        assert_eq!(clean_path("a/b/../c"), "a/c");
        assert_eq!(clean_path("../shared"), "../shared");
        assert_eq!(clean_path("file:./custom.yaml"), "file:custom.yaml");
        assert_eq!(clean_path("a\\b\\"), "a/b/");
        assert_eq!(clean_path("/etc/app/"), "/etc/app/");
    }

    #[test]
    fn extend_unique_keeps_first_occurrence() {
        let mut list = vec!["a"];
        extend_unique(&mut list, ["b", "a", "c", "b"]);
        assert_eq!(list, vec!["a", "b", "c"]);
    }

    #[test]
    fn resolved_set_reverses_and_dedups() {
        let mut env = Environment::new();
        let resource_loader = crate::resource::FsResourceLoader::default();
        let parsers = crate::parser::default_parsers();
        let loader = Loader::new(&mut env, &resource_loader, &parsers);
        assert_eq!(
            loader.as_resolved_set(Some("a, b ,c,b"), ""),
            vec!["b", "c", "a"]
        );
        assert_eq!(loader.as_resolved_set(None, "application"), vec!["application"]);
    }

    #[test]
    fn default_locations_iterate_most_specific_first() {
        let mut env = Environment::new();
        let resource_loader = crate::resource::FsResourceLoader::default();
        let parsers = crate::parser::default_parsers();
        let loader = Loader::new(&mut env, &resource_loader, &parsers);
        assert_eq!(
            loader.resolved_search_locations(),
            vec!["file:./config/", "file:./", "classpath:/config/", "classpath:/"]
        );
    }

    #[test]
    fn location_override_replaces_defaults() {
        let mut env = Environment::new();
        let mut source = MapSource::empty("test");
        source.insert(CONFIG_LOCATION_PROPERTY, "./conf/,./custom.yaml");
        env.property_sources_mut().add_first(Box::new(source));
        let resource_loader = crate::resource::FsResourceLoader::default();
        let parsers = crate::parser::default_parsers();
        let loader = Loader::new(&mut env, &resource_loader, &parsers);
        assert_eq!(
            loader.resolved_search_locations(),
            vec!["file:custom.yaml", "file:conf/"]
        );
    }

    #[test]
    fn additional_locations_extend_defaults_with_higher_precedence() {
        let mut env = Environment::new();
        let mut source = MapSource::empty("test");
        source.insert(CONFIG_ADDITIONAL_LOCATION_PROPERTY, "file:./extra/");
        env.property_sources_mut().add_first(Box::new(source));
        let resource_loader = crate::resource::FsResourceLoader::default();
        let parsers = crate::parser::default_parsers();
        let loader = Loader::new(&mut env, &resource_loader, &parsers);
        let locations = loader.resolved_search_locations();
        assert_eq!(locations[0], "file:extra/");
        assert_eq!(locations.len(), 5);
    }

    #[test]
    fn name_override_wins() {
        let mut env = Environment::new();
        let mut source = MapSource::empty("test");
        source.insert(CONFIG_NAME_PROPERTY, "service,override");
        env.property_sources_mut().add_first(Box::new(source));
        let resource_loader = crate::resource::FsResourceLoader::default();
        let parsers = crate::parser::default_parsers();
        let loader = Loader::new(&mut env, &resource_loader, &parsers);
        assert_eq!(loader.resolved_search_names(), vec!["override", "service"]);
    }
}
