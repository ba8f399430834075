//! # graft
//!
//! A source-patching preprocessor and autoload cache for PHP test instrumentation.
//!
//! graft intercepts the loading of PHP source files and rewrites them before
//! execution, so a test framework can substitute behavior into code units the
//! language otherwise seals off (final classes, private methods, built-ins).
//! Any region a patcher does not intentionally alter is reproduced byte for
//! byte.
//!
//! The pipeline is: lossless tokenization ([graft::lexing]), a single-pass
//! structural parse into an exactly reconstructible node tree
//! ([graft::parsing]), an ordered patcher pipeline ([graft::patching]), and an
//! autoload-time cache that re-runs the pipeline only when a source or watched
//! file is newer than the cached rewrite ([graft::loading]).

pub mod graft;
