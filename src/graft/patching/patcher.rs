//! The patcher plugin contract.
//!
//! A patcher is one independent transform stage. The registry offers every
//! patcher the parsed tree of each file about to load, plus two side hooks:
//! a path-resolution override consulted during unit resolution, and a
//! backtrace normalizer reporters use to hide instrumentation frames. All
//! hooks default to pass-through, so a patcher implements only what it cares
//! about.

use std::path::{Path, PathBuf};

use crate::graft::loading::loader::Loader;
use crate::graft::parsing::Tree;

/// One frame of a captured backtrace, as reporters hand it to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub file: Option<PathBuf>,
    pub line: Option<u32>,
    /// Function or method symbol, empty for top-level frames.
    pub symbol: String,
}

/// Options a reporter passes along when normalizing a backtrace.
#[derive(Debug, Clone, Copy, Default)]
pub struct BacktraceOptions {
    /// Keep frames that originate in instrumentation code.
    pub keep_internals: bool,
    /// Truncate the normalized trace to this many frames.
    pub limit: Option<usize>,
}

/// An independent transform stage applied to parsed trees before
/// re-serialization.
///
/// `Send` is required so a fully configured [Loader] can be parked behind
/// the process-boundary accessor; patchers themselves only ever run on the
/// loading thread.
pub trait Patcher: Send {
    /// Rewrite the tree of the file at `path` in place. The tree's brace
    /// structure must stay well formed; untouched nodes reproduce their
    /// original bytes.
    fn transform(&mut self, tree: &mut Tree, path: &Path) {
        let _ = (tree, path);
    }

    /// Whether this patcher wants the unit named `name` to go through the
    /// parse/transform/cache cycle. The registry ORs the answers; a unit
    /// nobody wants is copied through untouched.
    fn patchable(&self, name: &str) -> bool {
        let _ = name;
        true
    }

    /// Override where `name` resolves to. `default` is the path produced by
    /// the resolver and any earlier patchers; returning it unchanged opts
    /// out.
    fn find_file(&self, loader: &Loader, name: &str, default: Option<PathBuf>) -> Option<PathBuf> {
        let _ = (loader, name);
        default
    }

    /// Normalize a backtrace before reporting. Earlier patchers' output is
    /// this patcher's input.
    fn process_backtrace(&self, options: &BacktraceOptions, frames: Vec<Frame>) -> Vec<Frame> {
        let _ = options;
        frames
    }
}
