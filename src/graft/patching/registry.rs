//! Ordered, named registry of patchers.
//!
//! Registration order is application order, for both tree transforms and the
//! fold-left side hooks. Re-adding a name replaces the patcher in place so
//! the position in the pipeline is stable.

use std::path::{Path, PathBuf};

use crate::graft::loading::loader::Loader;
use crate::graft::parsing::Tree;
use crate::graft::patching::patcher::{BacktraceOptions, Frame, Patcher};

struct Entry {
    name: String,
    patcher: Box<dyn Patcher>,
}

/// The patcher pipeline: an ordered collection of named [Patcher]s.
#[derive(Default)]
pub struct Patchers {
    entries: Vec<Entry>,
}

impl Patchers {
    pub fn new() -> Self {
        Patchers::default()
    }

    /// Register `patcher` under `name`, at the end of the pipeline. An
    /// existing entry with the same name is replaced in place, keeping its
    /// position.
    pub fn add(&mut self, name: &str, patcher: Box<dyn Patcher>) {
        match self.entries.iter_mut().find(|entry| entry.name == name) {
            Some(entry) => entry.patcher = patcher,
            None => self.entries.push(Entry {
                name: name.to_string(),
                patcher,
            }),
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Patcher> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.patcher.as_ref())
    }

    pub fn exists(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry.name == name)
    }

    /// Unregister and return the patcher under `name`.
    pub fn remove(&mut self, name: &str) -> Option<Box<dyn Patcher>> {
        let index = self.entries.iter().position(|entry| entry.name == name)?;
        Some(self.entries.remove(index).patcher)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Registered names, in pipeline order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.name.as_str()).collect()
    }

    /// Feed `tree` through every patcher in registration order. Returns
    /// whether any patcher ran; an empty registry or a blank tree
    /// short-circuits.
    pub fn process(&mut self, tree: &mut Tree, path: &Path) -> bool {
        if self.entries.is_empty() || tree.is_blank() {
            return false;
        }
        for entry in &mut self.entries {
            entry.patcher.transform(tree, path);
        }
        true
    }

    /// Whether any patcher wants the unit named `name` patched.
    pub fn patchable(&self, name: &str) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.patcher.patchable(name))
    }

    /// Fold the path-resolution override through the pipeline: each patcher
    /// sees the previous result and may replace it.
    pub fn find_file(
        &self,
        loader: &Loader,
        name: &str,
        default: Option<PathBuf>,
    ) -> Option<PathBuf> {
        let mut path = default;
        for entry in &self.entries {
            path = entry.patcher.find_file(loader, name, path);
        }
        path
    }

    /// Fold backtrace normalization through the pipeline in registration
    /// order.
    pub fn process_backtrace(
        &self,
        options: &BacktraceOptions,
        frames: Vec<Frame>,
    ) -> Vec<Frame> {
        let mut frames = frames;
        for entry in &self.entries {
            frames = entry.patcher.process_backtrace(options, frames);
        }
        frames
    }
}

impl std::fmt::Debug for Patchers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Patchers")
            .field("names", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graft::parsing::{parse, ParseOptions};

    struct Tag(char);

    impl Patcher for Tag {
        fn transform(&mut self, tree: &mut Tree, _path: &Path) {
            let root = tree.root();
            tree.get_mut(root).text.push(self.0);
        }

        fn find_file(
            &self,
            _loader: &Loader,
            _name: &str,
            default: Option<PathBuf>,
        ) -> Option<PathBuf> {
            default.map(|path| {
                let mut s = path.into_os_string();
                s.push(self.0.to_string());
                PathBuf::from(s)
            })
        }
    }

    struct Selective(&'static str);

    impl Patcher for Selective {
        fn patchable(&self, name: &str) -> bool {
            name == self.0
        }
    }

    #[test]
    fn test_add_get_exists_remove_clear() {
        let mut patchers = Patchers::new();
        assert!(patchers.is_empty());
        patchers.add("a", Box::new(Tag('a')));
        patchers.add("b", Box::new(Tag('b')));
        assert!(patchers.exists("a"));
        assert!(patchers.get("b").is_some());
        assert_eq!(patchers.names(), vec!["a", "b"]);
        assert!(patchers.remove("a").is_some());
        assert!(!patchers.exists("a"));
        patchers.clear();
        assert!(patchers.is_empty());
    }

    #[test]
    fn test_replacing_keeps_position() {
        let mut patchers = Patchers::new();
        patchers.add("first", Box::new(Tag('1')));
        patchers.add("second", Box::new(Tag('2')));
        patchers.add("first", Box::new(Tag('9')));
        assert_eq!(patchers.names(), vec!["first", "second"]);
        assert_eq!(patchers.len(), 2);
    }

    #[test]
    fn test_process_applies_in_registration_order() {
        let mut patchers = Patchers::new();
        patchers.add("one", Box::new(Tag('1')));
        patchers.add("two", Box::new(Tag('2')));
        let mut tree = parse("<?php echo 1;", &ParseOptions::default());
        assert!(patchers.process(&mut tree, Path::new("/x.php")));
        assert!(tree.unparse().starts_with("12"));
    }

    #[test]
    fn test_process_short_circuits_on_blank_tree() {
        let mut patchers = Patchers::new();
        patchers.add("one", Box::new(Tag('1')));
        let mut tree = parse("", &ParseOptions::default());
        assert!(!patchers.process(&mut tree, Path::new("/x.php")));
        assert_eq!(tree.unparse(), "");
    }

    #[test]
    fn test_patchable_is_an_or() {
        let mut patchers = Patchers::new();
        assert!(!patchers.patchable("Anything"));
        patchers.add("a", Box::new(Selective("Foo")));
        patchers.add("b", Box::new(Selective("Bar")));
        assert!(patchers.patchable("Foo"));
        assert!(patchers.patchable("Bar"));
        assert!(!patchers.patchable("Baz"));
    }

    #[test]
    fn test_find_file_folds_left() {
        let mut patchers = Patchers::new();
        patchers.add("p1", Box::new(Tag('1')));
        patchers.add("p2", Box::new(Tag('2')));
        let loader = Loader::builder().build();
        let found = patchers.find_file(&loader, "Foo", Some(PathBuf::from("/base.php")));
        assert_eq!(found, Some(PathBuf::from("/base.php12")));
    }

    #[test]
    fn test_find_file_defaults_to_pass_through() {
        let patchers = Patchers::new();
        let loader = Loader::builder().build();
        assert_eq!(
            patchers.find_file(&loader, "Foo", Some(PathBuf::from("/base.php"))),
            Some(PathBuf::from("/base.php"))
        );
        assert_eq!(patchers.find_file(&loader, "Foo", None), None);
    }

    #[test]
    fn test_process_backtrace_folds_in_order() {
        struct Dropper;
        impl Patcher for Dropper {
            fn process_backtrace(
                &self,
                options: &BacktraceOptions,
                mut frames: Vec<Frame>,
            ) -> Vec<Frame> {
                if !options.keep_internals {
                    frames.retain(|frame| !frame.symbol.starts_with("graft\\"));
                }
                frames
            }
        }
        struct Limiter;
        impl Patcher for Limiter {
            fn process_backtrace(
                &self,
                options: &BacktraceOptions,
                mut frames: Vec<Frame>,
            ) -> Vec<Frame> {
                if let Some(limit) = options.limit {
                    frames.truncate(limit);
                }
                frames
            }
        }
        let frame = |symbol: &str| Frame {
            file: None,
            line: None,
            symbol: symbol.to_string(),
        };
        let mut patchers = Patchers::new();
        patchers.add("dropper", Box::new(Dropper));
        patchers.add("limiter", Box::new(Limiter));
        let frames = vec![frame("graft\\internal"), frame("App\\a"), frame("App\\b")];
        let options = BacktraceOptions {
            keep_internals: false,
            limit: Some(1),
        };
        let out = patchers.process_backtrace(&options, frames);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].symbol, "App\\a");
    }
}
