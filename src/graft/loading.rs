//! Autoload-time loading and caching of transformed sources.
//!
//! The [Loader](loader::Loader) is the subsystem's single context object: it
//! owns the patcher pipeline, the name-resolution tables
//! ([resolver](resolver)), the include/exclude policy ([policy](policy)),
//! the on-disk cache ([cache](cache)), and the watched-file invalidation
//! set. Embeddings call [load_unit](loader::Loader::load_unit) from their
//! autoload hook and execute whatever content comes back; everything else
//! (validity checks, pipeline runs, persistence) happens inline, on the
//! calling thread.
//!
//! [config](config) provides the serde-deserializable description of a
//! loader for JSON/YAML project configuration.

pub mod cache;
pub mod config;
pub mod loader;
pub mod policy;
pub mod resolver;

pub use cache::CacheStore;
pub use config::{ConfigError, LoaderConfig};
pub use loader::{LoadError, LoadOutcome, Loaded, Loader, LoaderBuilder};
pub use policy::{Glob, Policy};
pub use resolver::Resolver;
