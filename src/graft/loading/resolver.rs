//! Unit-name resolution tables.
//!
//! Three tables, consulted in order:
//!
//! 1. A flat exact-name → path map. When marked authoritative it is the only
//!    table: a miss there is a miss, full stop.
//! 2. An ordered prefix → directory-list map, longest prefix first. The
//!    prefix is stripped and the remainder of the name maps onto the
//!    directory structure.
//! 3. A parallel legacy-style map: the full name maps onto the directory
//!    structure, and underscores in the final segment act as further
//!    separators.
//!
//! Prefix and legacy candidates only resolve when the file exists; the flat
//! map is taken at its word. Resolution never errors; a name that maps to
//! nothing is simply not found.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct Resolver {
    flat: HashMap<String, PathBuf>,
    authoritative: bool,
    prefixes: Vec<(String, Vec<PathBuf>)>,
    legacy: Vec<(String, Vec<PathBuf>)>,
}

impl Resolver {
    pub fn new() -> Self {
        Resolver::default()
    }

    /// Map an exact unit name to a path.
    pub fn map(&mut self, name: &str, path: impl Into<PathBuf>) {
        self.flat
            .insert(name.trim_start_matches('\\').to_string(), path.into());
    }

    /// When authoritative, only the flat map resolves names.
    pub fn set_authoritative(&mut self, authoritative: bool) {
        self.authoritative = authoritative;
    }

    pub fn authoritative(&self) -> bool {
        self.authoritative
    }

    /// Register a directory for a name prefix (`App\` → `src/`). Longest
    /// prefixes win; equal-length prefixes keep registration order.
    pub fn add_prefix(&mut self, prefix: &str, dir: impl Into<PathBuf>) {
        Self::push(&mut self.prefixes, prefix, dir.into());
    }

    /// Register a directory for a legacy-style prefix, where the class
    /// segment's underscores map to directory separators.
    pub fn add_legacy_prefix(&mut self, prefix: &str, dir: impl Into<PathBuf>) {
        Self::push(&mut self.legacy, prefix, dir.into());
    }

    fn push(table: &mut Vec<(String, Vec<PathBuf>)>, prefix: &str, dir: PathBuf) {
        let prefix = prefix.trim_start_matches('\\');
        match table.iter_mut().find(|(p, _)| p == prefix) {
            Some((_, dirs)) => dirs.push(dir),
            None => {
                table.push((prefix.to_string(), vec![dir]));
                table.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
            }
        }
    }

    /// Resolve a unit name to a source path, or `None` when no table maps it.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        let name = name.trim_start_matches('\\');
        if let Some(path) = self.flat.get(name) {
            return Some(path.clone());
        }
        if self.authoritative {
            return None;
        }
        for (prefix, dirs) in &self.prefixes {
            if let Some(rest) = name.strip_prefix(prefix.as_str()) {
                let relative = format!("{}.php", rest.replace('\\', "/"));
                for dir in dirs {
                    let candidate = dir.join(&relative);
                    if candidate.is_file() {
                        return Some(candidate);
                    }
                }
            }
        }
        for (prefix, dirs) in &self.legacy {
            if !name.starts_with(prefix.as_str()) {
                continue;
            }
            let relative = legacy_relative(name);
            for dir in dirs {
                let candidate = dir.join(&relative);
                if candidate.is_file() {
                    return Some(candidate);
                }
            }
        }
        None
    }
}

/// Legacy layout: the whole name maps to directories, and underscores in the
/// final segment are further separators (`A\B_C` → `A/B/C.php`).
fn legacy_relative(name: &str) -> PathBuf {
    let (namespace, class) = match name.rfind('\\') {
        Some(at) => (&name[..at], &name[at + 1..]),
        None => ("", name),
    };
    let mut relative = String::new();
    if !namespace.is_empty() {
        relative.push_str(&namespace.replace('\\', "/"));
        relative.push('/');
    }
    relative.push_str(&class.replace('_', "/"));
    relative.push_str(".php");
    PathBuf::from(relative)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "<?php\n").unwrap();
    }

    #[test]
    fn test_flat_map_wins_and_skips_existence_check() {
        let mut resolver = Resolver::new();
        resolver.map("App\\Thing", "/nowhere/Thing.php");
        assert_eq!(
            resolver.resolve("App\\Thing"),
            Some(PathBuf::from("/nowhere/Thing.php"))
        );
        assert_eq!(resolver.resolve("\\App\\Thing"), resolver.resolve("App\\Thing"));
    }

    #[test]
    fn test_authoritative_blocks_prefix_fallback() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("Thing.php"));
        let mut resolver = Resolver::new();
        resolver.add_prefix("App\\", dir.path());
        resolver.set_authoritative(true);
        assert_eq!(resolver.resolve("App\\Thing"), None);
        resolver.set_authoritative(false);
        assert_eq!(
            resolver.resolve("App\\Thing"),
            Some(dir.path().join("Thing.php"))
        );
    }

    #[test]
    fn test_longest_prefix_wins() {
        let outer = tempfile::tempdir().unwrap();
        let inner = tempfile::tempdir().unwrap();
        touch(&outer.path().join("Sub/Thing.php"));
        touch(&inner.path().join("Thing.php"));
        let mut resolver = Resolver::new();
        resolver.add_prefix("App\\", outer.path());
        resolver.add_prefix("App\\Sub\\", inner.path());
        assert_eq!(
            resolver.resolve("App\\Sub\\Thing"),
            Some(inner.path().join("Thing.php"))
        );
    }

    #[test]
    fn test_prefix_falls_through_directory_list() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        touch(&second.path().join("Thing.php"));
        let mut resolver = Resolver::new();
        resolver.add_prefix("App\\", first.path());
        resolver.add_prefix("App\\", second.path());
        assert_eq!(
            resolver.resolve("App\\Thing"),
            Some(second.path().join("Thing.php"))
        );
    }

    #[test]
    fn test_legacy_underscores_map_to_directories() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("Lib/Sub/Deep/Thing.php"));
        let mut resolver = Resolver::new();
        resolver.add_legacy_prefix("Lib\\", dir.path());
        assert_eq!(
            resolver.resolve("Lib\\Sub\\Deep_Thing"),
            Some(dir.path().join("Lib/Sub/Deep/Thing.php"))
        );
    }

    #[test]
    fn test_unmapped_name_is_not_found() {
        let resolver = Resolver::new();
        assert_eq!(resolver.resolve("No\\Such\\Thing"), None);
    }
}
