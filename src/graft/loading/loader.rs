//! The loader: name resolution, cache validity, and pipeline driving.
//!
//! `load_unit` is the autoload-time entry point: resolve the name, apply the
//! include/exclude policy, and hand the file to `load_file`'s machinery.
//! `load_file` decides between serving the cache and re-running
//! parse → patch → re-serialize, and persists the result with its mtime
//! pinned one second past the newest input, so the next validity check is a
//! single comparison.
//!
//! Failure shape: a name that cannot be resolved or loaded is "not found"
//! (`Ok(None)`), never an error, so outer resolvers keep trying. An explicitly
//! given path that does not exist is a usage error, and a cache write with
//! no cache root configured is a configuration error; both are fatal to the
//! caller. Parsing never fails.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use filetime::FileTime;
use tracing::{debug, warn};

use crate::graft::loading::cache::{self, CacheStore};
use crate::graft::loading::config::LoaderConfig;
use crate::graft::loading::policy::Policy;
use crate::graft::loading::resolver::Resolver;
use crate::graft::parsing::{parse, ParseOptions};
use crate::graft::patching::Patchers;

/// How a load produced its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Parsed, patched, re-serialized, and cached.
    Patched,
    /// Served from a still-valid cache entry.
    Cached,
    /// No patcher wanted the unit; the source was copied through the cache
    /// untouched.
    CopiedThrough,
    /// The name failed the include/exclude policy; the original file loads
    /// unmodified and no cache artifact exists.
    Excluded,
}

/// The result of loading a unit or file.
#[derive(Debug, Clone)]
pub struct Loaded {
    /// Unit name, when the load was name-driven.
    pub name: Option<String>,
    /// The original source path.
    pub source: PathBuf,
    /// The effective path to execute: the cache entry, or the source itself
    /// for excluded units.
    pub path: PathBuf,
    pub content: String,
    pub outcome: LoadOutcome,
}

/// Fatal loader errors. An unresolvable name is not one; it surfaces as
/// `Ok(None)` from [Loader::load_unit].
#[derive(Debug)]
pub enum LoadError {
    /// An explicitly given source path does not exist.
    MissingSource(PathBuf),
    /// A cache write was attempted with caching disabled.
    NoCacheConfigured,
    Io { path: PathBuf, message: String },
}

impl LoadError {
    fn io(path: &Path, error: std::io::Error) -> Self {
        LoadError::Io {
            path: path.to_path_buf(),
            message: error.to_string(),
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::MissingSource(path) => {
                write!(f, "source file does not exist: {}", path.display())
            }
            LoadError::NoCacheConfigured => {
                write!(f, "a cache path must be configured before loading units")
            }
            LoadError::Io { path, message } => {
                write!(f, "i/o failure on {}: {}", path.display(), message)
            }
        }
    }
}

impl std::error::Error for LoadError {}

/// The one context object of the subsystem: patcher pipeline, resolution
/// tables, name policy, cache store, and the watched-file set.
#[derive(Debug)]
pub struct Loader {
    patchers: Patchers,
    resolver: Resolver,
    policy: Policy,
    cache: Option<CacheStore>,
    watched: BTreeSet<PathBuf>,
}

impl Loader {
    pub fn builder() -> LoaderBuilder {
        LoaderBuilder::default()
    }

    /// Build a loader from a declarative [LoaderConfig].
    pub fn from_config(config: LoaderConfig) -> Self {
        let mut builder = Loader::builder();
        if let Some(cache) = config.cache {
            builder = builder.cache(cache);
        }
        for pattern in &config.include {
            builder = builder.include(pattern);
        }
        for pattern in &config.exclude {
            builder = builder.exclude(pattern);
        }
        for (prefix, dirs) in &config.prefixes {
            for dir in dirs {
                builder = builder.prefix(prefix, dir);
            }
        }
        for (prefix, dirs) in &config.legacy_prefixes {
            for dir in dirs {
                builder = builder.legacy_prefix(prefix, dir);
            }
        }
        for (name, path) in &config.classmap {
            builder = builder.map(name, path);
        }
        builder = builder.authoritative(config.authoritative);
        for path in &config.watch {
            builder = builder.watch(path);
        }
        builder.build()
    }

    pub fn patchers(&self) -> &Patchers {
        &self.patchers
    }

    pub fn patchers_mut(&mut self) -> &mut Patchers {
        &mut self.patchers
    }

    pub fn cache_root(&self) -> Option<&Path> {
        self.cache.as_ref().map(CacheStore::root)
    }

    /// Whether the include/exclude policy admits `name`.
    pub fn allowed(&self, name: &str) -> bool {
        self.policy.allows(name)
    }

    /// Add files to the invalidation set consulted by every future validity
    /// check.
    pub fn watch<I, P>(&mut self, paths: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        for path in paths {
            self.watched.insert(path.into());
        }
    }

    pub fn unwatch<I, P>(&mut self, paths: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        for path in paths {
            self.watched.remove(&path.into());
        }
    }

    pub fn watched(&self) -> impl Iterator<Item = &Path> {
        self.watched.iter().map(PathBuf::as_path)
    }

    /// Resolve a unit name to a source path: resolution tables first, then
    /// the pipeline's `find_file` overrides in registration order.
    pub fn find_file(&self, name: &str) -> Option<PathBuf> {
        let default = self.resolver.resolve(name);
        self.patchers.find_file(self, name, default)
    }

    /// Load the unit named `name`. `Ok(None)` means the name did not resolve
    /// (or an i/o failure made it unloadable) and outer resolvers should
    /// keep trying; a missing cache configuration is still fatal.
    pub fn load_unit(&mut self, name: &str) -> Result<Option<Loaded>, LoadError> {
        let Some(path) = self.find_file(name) else {
            debug!(name, "unit name did not resolve");
            return Ok(None);
        };
        if !self.policy.allows(name) {
            return match self.bypass(name, &path) {
                Ok(loaded) => Ok(Some(loaded)),
                Err(error) => {
                    warn!(name, error = %error, "excluded unit failed to load");
                    Ok(None)
                }
            };
        }
        match self.load_path(Some(name), &path) {
            Ok(loaded) => Ok(Some(loaded)),
            Err(LoadError::NoCacheConfigured) => Err(LoadError::NoCacheConfigured),
            Err(error) => {
                warn!(name, error = %error, "unit failed to load");
                Ok(None)
            }
        }
    }

    /// Load one explicitly named file through the cache and pipeline. A
    /// non-existent path here is fatal: by the time a caller commits to a
    /// path, the unit is supposed to exist.
    pub fn load_file(&mut self, path: &Path) -> Result<Loaded, LoadError> {
        self.load_path(None, path)
    }

    /// Excluded units load unmodified, bypassing parse, pipeline, and cache.
    fn bypass(&self, name: &str, path: &Path) -> Result<Loaded, LoadError> {
        let content = fs::read_to_string(path).map_err(|error| LoadError::io(path, error))?;
        debug!(name, path = %path.display(), "excluded by policy, loading unmodified");
        Ok(Loaded {
            name: Some(name.to_string()),
            source: path.to_path_buf(),
            path: path.to_path_buf(),
            content,
            outcome: LoadOutcome::Excluded,
        })
    }

    fn load_path(&mut self, name: Option<&str>, path: &Path) -> Result<Loaded, LoadError> {
        if !path.is_file() {
            return Err(LoadError::MissingSource(path.to_path_buf()));
        }
        let source_mtime =
            cache::mtime(path).ok_or_else(|| LoadError::Io {
                path: path.to_path_buf(),
                message: "cannot stat source file".to_string(),
            })?;
        let newest = self.newest_input(source_mtime);

        if let Some(store) = &self.cache {
            if let Some(entry) = store.lookup(path, newest) {
                let content =
                    fs::read_to_string(&entry).map_err(|error| LoadError::io(&entry, error))?;
                debug!(path = %path.display(), entry = %entry.display(), "cache valid");
                return Ok(Loaded {
                    name: name.map(str::to_string),
                    source: path.to_path_buf(),
                    path: entry,
                    content,
                    outcome: LoadOutcome::Cached,
                });
            }
        }

        let source = fs::read_to_string(path).map_err(|error| LoadError::io(path, error))?;
        let wants_patching = name.map_or(true, |n| self.patchers.patchable(n));
        let (content, outcome) = if wants_patching {
            let options = ParseOptions {
                rebase_path: Some(path.to_path_buf()),
                ..ParseOptions::default()
            };
            let mut tree = parse(&source, &options);
            self.patchers.process(&mut tree, path);
            debug!(path = %path.display(), "ran transform pipeline");
            (tree.unparse(), LoadOutcome::Patched)
        } else {
            debug!(path = %path.display(), "no patcher wants unit, copying through");
            (source, LoadOutcome::CopiedThrough)
        };

        let stamp = FileTime::from_unix_time(newest.unix_seconds() + 1, 0);
        let entry = self.persist(path, &content, Some(stamp))?;
        Ok(Loaded {
            name: name.map(str::to_string),
            source: path.to_path_buf(),
            path: entry,
            content,
            outcome,
        })
    }

    /// Max mtime over the source and every watched file; watched files that
    /// cannot be read are ignored.
    fn newest_input(&self, source_mtime: FileTime) -> FileTime {
        self.watched
            .iter()
            .filter_map(|path| cache::mtime(path))
            .fold(source_mtime, FileTime::max)
    }

    /// Persist content for `source` under the cache root, optionally pinning
    /// the entry's mtime. Fatal when no cache root is configured.
    pub fn cache_file(
        &self,
        source: &Path,
        content: &str,
        mtime: Option<FileTime>,
    ) -> Result<PathBuf, LoadError> {
        self.persist(source, content, mtime)
    }

    fn persist(
        &self,
        source: &Path,
        content: &str,
        stamp: Option<FileTime>,
    ) -> Result<PathBuf, LoadError> {
        let store = self.cache.as_ref().ok_or(LoadError::NoCacheConfigured)?;
        store
            .write(source, content, stamp)
            .map_err(|error| LoadError::io(store.root(), error))
    }

    /// Recursively empty the cache root. A loader without caching has
    /// nothing to clear and succeeds.
    pub fn clear_cache(&self) -> Result<(), LoadError> {
        match &self.cache {
            Some(store) => store
                .clear()
                .map_err(|error| LoadError::io(store.root(), error)),
            None => Ok(()),
        }
    }
}

/// Builder for [Loader]; the programmatic twin of [LoaderConfig].
#[derive(Debug, Default)]
pub struct LoaderBuilder {
    cache: Option<PathBuf>,
    resolver: Resolver,
    policy: Policy,
    watch: Vec<PathBuf>,
}

impl LoaderBuilder {
    pub fn cache(mut self, root: impl Into<PathBuf>) -> Self {
        self.cache = Some(root.into());
        self
    }

    pub fn include(mut self, pattern: &str) -> Self {
        self.policy.include(pattern);
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.policy.exclude(pattern);
        self
    }

    pub fn prefix(mut self, prefix: &str, dir: impl Into<PathBuf>) -> Self {
        self.resolver.add_prefix(prefix, dir);
        self
    }

    pub fn legacy_prefix(mut self, prefix: &str, dir: impl Into<PathBuf>) -> Self {
        self.resolver.add_legacy_prefix(prefix, dir);
        self
    }

    pub fn map(mut self, name: &str, path: impl Into<PathBuf>) -> Self {
        self.resolver.map(name, path);
        self
    }

    pub fn authoritative(mut self, authoritative: bool) -> Self {
        self.resolver.set_authoritative(authoritative);
        self
    }

    pub fn watch(mut self, path: impl Into<PathBuf>) -> Self {
        self.watch.push(path.into());
        self
    }

    pub fn build(self) -> Loader {
        Loader {
            patchers: Patchers::new(),
            resolver: self.resolver,
            policy: self.policy,
            cache: self.cache.map(CacheStore::new),
            watched: self.watch.into_iter().collect(),
        }
    }
}
