//! Resource resolution.
//!
//! Responsibilities:
//! - Turn a location string (`file:./config/`, `classpath:/`, bare path)
//!   into a readable `Resource` with existence/filename/extension queries.
//!
//! Does NOT handle:
//! - Choosing which locations to search (see loader::engine).
//! - Parsing resource contents (see parser).
//!
//! Invariants:
//! - Resolution never touches the filesystem beyond existence checks and
//!   reads; a missing file still resolves to a `Resource` whose `exists()`
//!   is false.
//! - `classpath:` locations resolve against explicitly configured roots;
//!   with no roots configured they are treated as missing.
//! - Unknown URL schemes resolve to missing.

use std::path::{Path, PathBuf};

const FILE_PREFIX: &str = "file:";
const CLASSPATH_PREFIX: &str = "classpath:";

/// A resolved, possibly missing, configuration resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    location: String,
    path: PathBuf,
}

impl Resource {
    pub fn new(location: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
            path: path.into(),
        }
    }

    /// The location string this resource was resolved from.
    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn filename(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }

    /// The filename extension, if the filename carries one.
    pub fn extension(&self) -> Option<&str> {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty())
    }

    pub fn read_to_string(&self) -> std::io::Result<String> {
        std::fs::read_to_string(&self.path)
    }

    /// A stable identity for cache keying: the canonical path when the file
    /// exists, the resolved path otherwise.
    pub fn identity(&self) -> PathBuf {
        self.path
            .canonicalize()
            .unwrap_or_else(|_| self.path.clone())
    }
}

/// Resolves location strings into resources.
pub trait ResourceLoader {
    /// Resolve a location, returning `None` when the location cannot map to
    /// a file at all (unknown scheme, no classpath roots configured).
    fn resolve(&self, location: &str) -> Option<Resource>;
}

/// Filesystem-backed resource loader.
///
/// `file:` locations and bare paths resolve relative to the base directory;
/// `classpath:` locations resolve against the configured roots in order,
/// preferring the first root where the file exists.
#[derive(Debug, Clone)]
pub struct FsResourceLoader {
    base_dir: PathBuf,
    classpath_roots: Vec<PathBuf>,
}

impl Default for FsResourceLoader {
    fn default() -> Self {
        Self::new(".")
    }
}

impl FsResourceLoader {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            classpath_roots: Vec::new(),
        }
    }

    pub fn add_classpath_root(&mut self, root: impl Into<PathBuf>) {
        self.classpath_roots.push(root.into());
    }

    pub fn with_classpath_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.add_classpath_root(root);
        self
    }

    fn join_base(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

impl ResourceLoader for FsResourceLoader {
    fn resolve(&self, location: &str) -> Option<Resource> {
        if let Some(rest) = location.strip_prefix(FILE_PREFIX) {
            let rest = rest.strip_prefix("//").unwrap_or(rest);
            return Some(Resource::new(location, self.join_base(rest)));
        }
        if let Some(rest) = location.strip_prefix(CLASSPATH_PREFIX) {
            let rest = rest.trim_start_matches('/');
            let candidates: Vec<PathBuf> =
                self.classpath_roots.iter().map(|r| r.join(rest)).collect();
            let path = candidates
                .iter()
                .find(|p| p.is_file())
                .or_else(|| candidates.first())?;
            return Some(Resource::new(location, path.clone()));
        }
        if has_url_scheme(location) {
            return None;
        }
        Some(Resource::new(location, self.join_base(location)))
    }
}

/// Whether a path carries a URL scheme prefix. Single-letter prefixes are
/// excluded so Windows drive paths stay plain paths.
pub fn has_url_scheme(path: &str) -> bool {
    match path.split_once(':') {
        Some((scheme, _)) => scheme.len() > 1 && scheme.chars().all(|c| c.is_ascii_alphabetic()),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn resolves_file_locations_relative_to_base() {
        let dir = TempDir::new().unwrap();
        std::fs::File::create(dir.path().join("application.yaml"))
            .unwrap()
            .write_all(b"a: 1\n")
            .unwrap();
        let loader = FsResourceLoader::new(dir.path());
        let resource = loader.resolve("file:./application.yaml").unwrap();
        assert!(resource.exists());
        assert_eq!(resource.location(), "file:./application.yaml");
        assert_eq!(resource.filename(), Some("application.yaml"));
        assert_eq!(resource.extension(), Some("yaml"));
    }

    #[test]
    fn missing_file_resolves_but_does_not_exist() {
        let dir = TempDir::new().unwrap();
        let loader = FsResourceLoader::new(dir.path());
        let resource = loader.resolve("file:./nope.yaml").unwrap();
        assert!(!resource.exists());
    }

    #[test]
    fn classpath_requires_roots() {
        let loader = FsResourceLoader::new(".");
        assert!(loader.resolve("classpath:/application.yaml").is_none());
    }

    #[test]
    fn classpath_prefers_first_existing_root() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        std::fs::write(second.path().join("application.properties"), "a=1\n").unwrap();
        let loader = FsResourceLoader::new(".")
            .with_classpath_root(first.path())
            .with_classpath_root(second.path());
        let resource = loader.resolve("classpath:/application.properties").unwrap();
        assert!(resource.exists());
        assert!(resource.path().starts_with(second.path()));
    }

    #[test]
    fn unknown_scheme_is_missing() {
        let loader = FsResourceLoader::new(".");
        assert!(loader.resolve("https://example.com/app.yaml").is_none());
    }

    #[test]
    fn url_scheme_detection() {
        assert!(has_url_scheme("classpath:/config/"));
        assert!(has_url_scheme("file:./config/"));
        assert!(!has_url_scheme("./config/"));
        assert!(!has_url_scheme("C:\\config"));
    }
}
