//! `path[:line[:col]]` references, as printed by compilers and grep.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

static LOCATION: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^(?P<path>[^:]+?)(?::(?P<line>\d+))?(?::(?P<col>\d+))?:?$").ok()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: PathBuf,
    pub line: Option<usize>,
    pub col: Option<usize>,
}

impl Location {
    /// Parse `text`, trimming surrounding whitespace and quotes.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim().trim_matches(|c| c == '"' || c == '\'');
        let caps = LOCATION.as_ref()?.captures(text)?;
        let num = |name: &str| caps.name(name).and_then(|m| m.as_str().parse().ok());
        Some(Self {
            path: PathBuf::from(caps.name("path")?.as_str()),
            line: num("line"),
            col: num("col"),
        })
    }

    /// Absolute path, taking relative ones from `base`.
    pub fn resolve(&self, base: &Path) -> PathBuf {
        if self.path.is_absolute() {
            self.path.clone()
        } else {
            base.join(&self.path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_path_line_col() {
        let l = Location::parse("/tmp/aaa.go:23:7").unwrap();
        assert_eq!(l.path, PathBuf::from("/tmp/aaa.go"));
        assert_eq!((l.line, l.col), (Some(23), Some(7)));

        let l = Location::parse("aaa.go:23:").unwrap();
        assert_eq!((l.line, l.col), (Some(23), None));

        let l = Location::parse(" 'empty.txt' ").unwrap();
        assert_eq!(l.path, PathBuf::from("empty.txt"));
        assert_eq!(l.line, None);
    }

    #[test]
    fn rejects_empty_and_resolves_relative() {
        assert!(Location::parse("").is_none());
        assert!(Location::parse(":12").is_none());
        let l = Location::parse("src/lib.rs").unwrap();
        assert_eq!(l.resolve(Path::new("/work")), PathBuf::from("/work/src/lib.rs"));
    }
}
