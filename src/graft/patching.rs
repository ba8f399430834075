//! The patcher pipeline: independent transform plugins over parsed trees.
//!
//! [Patchers](registry::Patchers) is an ordered, named registry. The loader
//! feeds every about-to-load tree through it ([process](registry::Patchers::process)),
//! asks it whether a unit is worth the parse/cache cycle at all
//! ([patchable](registry::Patchers::patchable)), and lets it override unit
//! resolution ([find_file](registry::Patchers::find_file)). Reporters use
//! [process_backtrace](registry::Patchers::process_backtrace) to hide
//! instrumentation frames.

pub mod patcher;
pub mod registry;

pub use patcher::{BacktraceOptions, Frame, Patcher};
pub use registry::Patchers;
