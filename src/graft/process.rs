//! Process-boundary access to the installed loader.
//!
//! The loader is one explicitly owned context object; core logic always
//! receives it as a parameter. This module exists only for the outermost
//! embedding layer (the autoload hook a host registers with its runtime),
//! which has nowhere to thread a `&mut Loader` through. Nothing inside the
//! crate calls it.

use std::sync::Mutex;

use once_cell::sync::Lazy;

use crate::graft::loading::Loader;

static CURRENT: Lazy<Mutex<Option<Loader>>> = Lazy::new(|| Mutex::new(None));

fn slot() -> std::sync::MutexGuard<'static, Option<Loader>> {
    CURRENT.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Install `loader` as the process-wide current loader, returning the
/// previous one if any.
pub fn install(loader: Loader) -> Option<Loader> {
    slot().replace(loader)
}

/// Remove and return the current loader.
pub fn uninstall() -> Option<Loader> {
    slot().take()
}

pub fn is_installed() -> bool {
    slot().is_some()
}

/// Run `f` against the current loader; `None` when none is installed.
pub fn with<R>(f: impl FnOnce(&mut Loader) -> R) -> Option<R> {
    slot().as_mut().map(f)
}
