//! Exclude-then-include glob policy over unit names.
//!
//! Patterns are shell-style globs over the namespaced name: `*` matches any
//! run of characters (separators included), `?` matches one. A name is
//! allowed when no exclude pattern matches and at least one include pattern
//! does; an empty include list admits everything. Excluded units load
//! unmodified and never touch the parse/cache cycle.

use regex::Regex;

/// One compiled glob pattern.
#[derive(Debug, Clone)]
pub struct Glob {
    pattern: String,
    matcher: Regex,
}

impl Glob {
    pub fn new(pattern: &str) -> Self {
        let mut translated = String::from("^");
        let mut buf = [0u8; 4];
        for ch in pattern.chars() {
            match ch {
                '*' => translated.push_str(".*"),
                '?' => translated.push('.'),
                other => translated.push_str(&regex::escape(other.encode_utf8(&mut buf))),
            }
        }
        translated.push('$');
        let matcher =
            Regex::new(&translated).expect("escaped glob pattern translates to a valid regex");
        Glob {
            pattern: pattern.to_string(),
            matcher,
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        self.matcher.is_match(name)
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

/// The loader's include/exclude filter.
#[derive(Debug, Clone, Default)]
pub struct Policy {
    include: Vec<Glob>,
    exclude: Vec<Glob>,
}

impl Policy {
    pub fn new() -> Self {
        Policy::default()
    }

    pub fn include(&mut self, pattern: &str) {
        self.include.push(Glob::new(pattern));
    }

    pub fn exclude(&mut self, pattern: &str) {
        self.exclude.push(Glob::new(pattern));
    }

    /// Exclude first, then include; an empty include list admits all.
    pub fn allows(&self, name: &str) -> bool {
        if self.exclude.iter().any(|glob| glob.matches(name)) {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(|glob| glob.matches(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_crosses_separators() {
        let glob = Glob::new("spec\\*");
        assert!(glob.matches("spec\\Deep\\Name"));
        assert!(!glob.matches("app\\spec\\Name"));
    }

    #[test]
    fn test_question_mark_matches_one_character() {
        let glob = Glob::new("A?C");
        assert!(glob.matches("ABC"));
        assert!(!glob.matches("AC"));
        assert!(!glob.matches("ABBC"));
    }

    #[test]
    fn test_literal_dots_are_not_wildcards() {
        let glob = Glob::new("a.b");
        assert!(glob.matches("a.b"));
        assert!(!glob.matches("axb"));
    }

    #[test]
    fn test_empty_include_admits_everything() {
        let policy = Policy::new();
        assert!(policy.allows("Any\\Name"));
    }

    #[test]
    fn test_exclude_beats_include() {
        let mut policy = Policy::new();
        policy.include("app\\*");
        policy.exclude("app\\vendor\\*");
        assert!(policy.allows("app\\Thing"));
        assert!(!policy.allows("app\\vendor\\Thing"));
        assert!(!policy.allows("lib\\Thing"));
    }
}
