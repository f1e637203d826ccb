//! In-memory rune-line storage.
//!
//! The free functions operate on a bare `Vec<Vec<char>>` so the file backend
//! and the command ring can share the exact same edit and slice rules.

use std::fs;
use std::path::{Path, PathBuf};

use core_text::{Position, Slice, runes_to_string, string_to_runes};
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::{Backend, BackendError};

/// Insert `text` at 1-based (`line`, `col`). The target line is split at
/// `col` and its tail re-threaded onto the last inserted line. Coordinates are
/// clamped to the buffer. Returns false when there was nothing to insert.
pub fn insert_lines(lines: &mut Vec<Vec<char>>, line: usize, col: usize, text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    if lines.is_empty() {
        lines.push(Vec::new());
    }
    let row = line.clamp(1, lines.len()) - 1;
    let at = col.clamp(1, lines[row].len() + 1) - 1;
    let mut parts = string_to_runes(text);
    let tail = lines[row].split_off(at);
    let last = parts.len() - 1;
    parts[last].extend(tail);
    let mut parts = parts.into_iter();
    if let Some(first) = parts.next() {
        lines[row].extend(first);
    }
    lines.splice(row + 1..row + 1, parts);
    true
}

/// Remove the inclusive range (`line1`, `col1`)..=(`line2`, `col2`).
///
/// The head of `line1` before `col1` is joined with the tail of `line2` after
/// `col2`. When `col2` is past the last rune of `line2` the line break is
/// removed as well, joining the following line. Ends are reordered and
/// clamped as needed.
pub fn remove_lines(
    lines: &mut Vec<Vec<char>>,
    line1: usize,
    col1: usize,
    line2: usize,
    col2: usize,
) -> bool {
    if lines.is_empty() {
        return false;
    }
    let a = Position::new(line1, col1);
    let b = Position::new(line2, col2);
    let (a, b) = if b < a { (b, a) } else { (a, b) };
    let r1 = a.line.clamp(1, lines.len()) - 1;
    let mut r2 = b.line.clamp(1, lines.len()) - 1;
    let start = a.col.clamp(1, lines[r1].len() + 1) - 1;
    let mut keep = b.col;
    if keep > lines[r2].len() {
        if r2 + 1 < lines.len() {
            r2 += 1;
            keep = 0;
        } else {
            keep = lines[r2].len();
        }
    }
    if r1 == r2 && keep <= start {
        return false;
    }
    let tail: Vec<char> = lines[r2][keep..].to_vec();
    lines[r1].truncate(start);
    lines[r1].extend(tail);
    lines.drain(r1 + 1..=r2);
    true
}

/// Rectangular read over `count` lines provided by `line_at` (0-based).
///
/// Lines `line1..=line2` are returned, each cut to `col1..=col2`; `None` ends
/// read to the last line / whole lines. Backward ranges are swapped and a
/// zero line or column yields an empty slice.
pub fn slice_lines<'a>(
    count: usize,
    line_at: impl Fn(usize) -> &'a [char],
    line1: usize,
    col1: usize,
    line2: Option<usize>,
    col2: Option<usize>,
) -> Slice {
    let mut slice = Slice::empty(line1, col1);
    slice.line2 = line2;
    slice.col2 = col2;
    if line1 < 1 || col1 < 1 {
        return slice;
    }
    let (mut l1, mut l2) = (line1, line2);
    if let Some(end) = l2
        && l1 > end
    {
        l2 = Some(l1);
        l1 = end.max(1);
    }
    let (mut c1, mut c2) = (col1, col2);
    if let Some(end) = c2
        && c1 > end
    {
        c2 = Some(c1);
        c1 = end.max(1);
    }
    slice.line1 = l1;
    slice.col1 = c1;
    slice.line2 = l2;
    slice.col2 = c2;

    let last = l2.unwrap_or(count).min(count);
    for r in l1..=last {
        let line = line_at(r - 1);
        match c2 {
            None => slice.text.push(line.to_vec()),
            Some(end) => {
                let from = (c1 - 1).min(line.len());
                let to = end.min(line.len()).max(from);
                slice.text.push(line[from..to].to_vec());
            }
        }
    }
    slice
}

/// Line count excluding a trailing empty line.
pub fn count_lines(lines: &[Vec<char>]) -> usize {
    match lines.last() {
        Some(last) if last.is_empty() => lines.len() - 1,
        _ => lines.len(),
    }
}

/// Plain in-memory backend.
#[derive(Debug)]
pub struct MemBackend {
    lines: Mutex<Vec<Vec<char>>>,
    loc: Mutex<Option<PathBuf>>,
}

impl Default for MemBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemBackend {
    pub fn new() -> Self {
        Self::from_text("")
    }

    pub fn from_text(text: &str) -> Self {
        Self {
            lines: Mutex::new(string_to_runes(text)),
            loc: Mutex::new(None),
        }
    }

    /// Whole content joined with `\n`.
    pub fn text(&self) -> String {
        runes_to_string(&self.lines.lock())
    }

    /// Replace the whole content.
    pub fn set_lines(&self, mut lines: Vec<Vec<char>>) {
        if lines.is_empty() {
            lines.push(Vec::new());
        }
        *self.lines.lock() = lines;
    }

    /// Run `f` against the locked lines.
    pub fn with_lines<R>(&self, f: impl FnOnce(&[Vec<char>]) -> R) -> R {
        f(&self.lines.lock())
    }

    pub(crate) fn set_loc(&self, loc: Option<PathBuf>) {
        *self.loc.lock() = loc;
    }
}

impl Backend for MemBackend {
    fn insert(&self, line: usize, col: usize, text: &str) -> Result<(), BackendError> {
        let mut lines = self.lines.lock();
        if insert_lines(&mut lines, line, col, text) {
            trace!(target: "backend.mem", line, col, len = text.len(), "insert");
        }
        Ok(())
    }

    fn remove(
        &self,
        line1: usize,
        col1: usize,
        line2: usize,
        col2: usize,
    ) -> Result<(), BackendError> {
        let mut lines = self.lines.lock();
        if remove_lines(&mut lines, line1, col1, line2, col2) {
            trace!(target: "backend.mem", line1, col1, line2, col2, "remove");
        }
        Ok(())
    }

    fn slice(&self, line1: usize, col1: usize, line2: Option<usize>, col2: Option<usize>) -> Slice {
        let lines = self.lines.lock();
        slice_lines(lines.len(), |i| lines[i].as_slice(), line1, col1, line2, col2)
    }

    fn append(&self, text: &str) -> Result<(), BackendError> {
        let mut lines = self.lines.lock();
        let line = lines.len().max(1);
        let col = lines.last().map_or(0, Vec::len) + 1;
        insert_lines(&mut lines, line, col, text);
        Ok(())
    }

    fn save(&self, loc: &Path) -> Result<(), BackendError> {
        if loc.as_os_str().is_empty() {
            return Err(BackendError::NoLocation);
        }
        let content = self.text();
        fs::write(loc, content).map_err(|e| BackendError::io("save", loc, e))?;
        debug!(target: "backend.mem", path = %loc.display(), "saved");
        self.set_loc(Some(loc.to_path_buf()));
        Ok(())
    }

    fn reload(&self) -> Result<(), BackendError> {
        let Some(loc) = self.src_loc() else {
            return Ok(());
        };
        let content = fs::read_to_string(&loc).map_err(|e| BackendError::io("reload", &loc, e))?;
        self.set_lines(string_to_runes(&content));
        Ok(())
    }

    fn line_count(&self) -> usize {
        count_lines(&self.lines.lock())
    }

    fn src_loc(&self) -> Option<PathBuf> {
        self.loc.lock().clone()
    }

    fn close(&self) -> Result<(), BackendError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn lines(s: &str) -> Vec<Vec<char>> {
        string_to_runes(s)
    }

    #[test]
    fn insert_single_line_text() {
        let mut l = lines("1234567890");
        insert_lines(&mut l, 1, 1, "XYZ");
        assert_eq!(runes_to_string(&l), "XYZ1234567890");
    }

    #[test]
    fn insert_multi_line_rethreads_tail() {
        let mut l = lines("a\nb\nabcdef\nz");
        insert_lines(&mut l, 3, 3, "123\n456");
        assert_eq!(runes_to_string(&l), "a\nb\nab123\n456cdef\nz");
        let mut l = lines("ab");
        insert_lines(&mut l, 1, 2, "\n");
        assert_eq!(runes_to_string(&l), "a\nb");
    }

    #[test]
    fn insert_clamps_out_of_range() {
        let mut l = lines("ab\ncd");
        insert_lines(&mut l, 9, 99, "!");
        assert_eq!(runes_to_string(&l), "ab\ncd!");
        let mut l: Vec<Vec<char>> = Vec::new();
        insert_lines(&mut l, 1, 1, "x");
        assert_eq!(runes_to_string(&l), "x");
    }

    #[test]
    fn remove_inclusive_end_joins_lines() {
        let mut l = lines("123456789\nabcdefghijk\nrest");
        remove_lines(&mut l, 1, 2, 2, 10);
        assert_eq!(runes_to_string(&l), "1k\nrest");
    }

    #[test]
    fn remove_at_end_of_line_swallows_break() {
        let mut l = lines("abc\ndef");
        remove_lines(&mut l, 1, 4, 1, 4);
        assert_eq!(runes_to_string(&l), "abcdef");
        let mut l = lines("abc\ndef");
        remove_lines(&mut l, 1, 1, 1, 3);
        assert_eq!(runes_to_string(&l), "\ndef");
        // last line has no break to swallow
        let mut l = lines("abc\ndef");
        remove_lines(&mut l, 2, 2, 2, 10);
        assert_eq!(runes_to_string(&l), "abc\nd");
    }

    #[test]
    fn slice_is_rectangular_and_clamped() {
        let l = lines("12345\nabc\nxyz");
        let s = slice_lines(l.len(), |i| l[i].as_slice(), 1, 2, Some(2), Some(4));
        assert_eq!(s.to_strings(), vec!["234", "bc"]);
        let s = slice_lines(l.len(), |i| l[i].as_slice(), 2, 1, None, None);
        assert_eq!(s.to_strings(), vec!["abc", "xyz"]);
        let s = slice_lines(l.len(), |i| l[i].as_slice(), 3, 4, Some(1), Some(2));
        assert_eq!((s.line1, s.col1), (1, 2));
        assert_eq!(s.to_strings(), vec!["234", "bc", "yz"]);
        let s = slice_lines(l.len(), |i| l[i].as_slice(), 0, 1, None, None);
        assert!(s.is_empty());
        let s = slice_lines(l.len(), |i| l[i].as_slice(), 2, 1, Some(99), Some(99));
        assert_eq!(s.to_strings(), vec!["abc", "xyz"]);
    }

    #[test]
    fn line_count_ignores_trailing_empty_line() {
        assert_eq!(count_lines(&lines("a\nb\n")), 2);
        assert_eq!(count_lines(&lines("a\nb")), 2);
        assert_eq!(count_lines(&lines("")), 0);
    }

    #[test]
    fn backend_append_and_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let b = MemBackend::from_text("one");
        b.append("\ntwo").unwrap();
        b.save(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "one\ntwo");
        assert_eq!(b.src_loc(), Some(path));
        assert!(matches!(b.save(Path::new("")), Err(BackendError::NoLocation)));
    }

    proptest! {
        #[test]
        fn remove_undoes_insert(
            base in proptest::collection::vec("[a-z]{0,6}", 1..5),
            text in "[a-z\n]{1,10}",
            line_seed in 0usize..100,
            col_seed in 0usize..100,
        ) {
            let original = base.join("\n");
            let mut l = string_to_runes(&original);
            let line = line_seed % l.len() + 1;
            let col = col_seed % (l[line - 1].len() + 1) + 1;
            insert_lines(&mut l, line, col, &text);

            let inserted = string_to_runes(&text);
            let k = inserted.len() - 1;
            let m = inserted[k].len();
            let (l2, c2) = if k == 0 {
                (line, col + m - 1)
            } else if m == 0 {
                (line + k - 1, l[line + k - 2].len() + 1)
            } else {
                (line + k, m)
            };
            remove_lines(&mut l, line, col, l2, c2);
            prop_assert_eq!(runes_to_string(&l), original);
        }
    }
}
