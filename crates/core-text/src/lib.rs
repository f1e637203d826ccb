//! Rune-line text primitives shared by backends and views.
//!
//! Text is modelled as a list of lines, each a list of runes (`char`). All
//! coordinates exposed here are 1-based, matching what the view layer and the
//! public action API speak.

pub mod width;

pub use width::Translator;

/// A 1-based (line, column) pair in rune coordinates.
///
/// Field order makes the derived `Ord` compare in reading order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }

    pub fn origin() -> Self {
        Self { line: 1, col: 1 }
    }
}

/// An inclusive text range. Always stored normalized: the `from` end never
/// follows the `to` end in reading order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Selection {
    pub line_from: usize,
    pub col_from: usize,
    pub line_to: usize,
    pub col_to: usize,
}

impl Selection {
    pub fn new(line_from: usize, col_from: usize, line_to: usize, col_to: usize) -> Self {
        let a = Position::new(line_from, col_from);
        let b = Position::new(line_to, col_to);
        let (from, to) = if b < a { (b, a) } else { (a, b) };
        Self {
            line_from: from.line,
            col_from: from.col,
            line_to: to.line,
            col_to: to.col,
        }
    }

    pub fn from_positions(a: Position, b: Position) -> Self {
        Self::new(a.line, a.col, b.line, b.col)
    }

    pub fn start(&self) -> Position {
        Position::new(self.line_from, self.col_from)
    }

    pub fn end(&self) -> Position {
        Position::new(self.line_to, self.col_to)
    }
}

impl std::fmt::Display for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.line_from, self.col_from, self.line_to, self.col_to
        )
    }
}

/// A rectangular-ish read of a backend: the text of lines `line1..=line2`,
/// where the first line starts at `col1` and the last ends at `col2`.
///
/// `None` for the end coordinates means "to the end" as requested by the
/// caller; the text is already truncated accordingly.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Slice {
    pub line1: usize,
    pub col1: usize,
    pub line2: Option<usize>,
    pub col2: Option<usize>,
    pub text: Vec<Vec<char>>,
}

impl Slice {
    pub fn empty(line1: usize, col1: usize) -> Self {
        Self {
            line1,
            col1,
            ..Self::default()
        }
    }

    /// Runes of absolute 1-based line `ln`, or an empty slice when the line
    /// is outside the captured range.
    pub fn line(&self, ln: usize) -> &[char] {
        if ln < self.line1 {
            return &[];
        }
        self.text.get(ln - self.line1).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Lines as strings, in order.
    pub fn to_strings(&self) -> Vec<String> {
        self.text.iter().map(|l| l.iter().collect()).collect()
    }
}

/// Split text into rune lines on `\n`. Always yields at least one line; a
/// trailing newline yields a final empty line.
pub fn string_to_runes(s: &str) -> Vec<Vec<char>> {
    s.split('\n').map(|l| l.chars().collect()).collect()
}

/// Inverse of [`string_to_runes`].
pub fn runes_to_string(lines: &[Vec<char>]) -> String {
    let mut out = String::new();
    for (i, l) in lines.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.extend(l.iter());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn selection_normalizes_backward_ranges() {
        let s = Selection::new(3, 7, 1, 2);
        assert_eq!(s, Selection::new(1, 2, 3, 7));
        let s = Selection::new(1, 6, 1, 2);
        assert_eq!((s.col_from, s.col_to), (2, 6));
    }

    #[test]
    fn runes_round_trip_keeps_trailing_line() {
        let lines = string_to_runes("ab\ncd\n");
        assert_eq!(lines.len(), 3);
        assert!(lines[2].is_empty());
        assert_eq!(runes_to_string(&lines), "ab\ncd\n");
        assert_eq!(string_to_runes(""), vec![Vec::<char>::new()]);
    }

    #[test]
    fn slice_line_lookup_is_absolute() {
        let sl = Slice {
            line1: 4,
            col1: 1,
            line2: Some(5),
            col2: None,
            text: string_to_runes("x\ny"),
        };
        assert_eq!(sl.line(4), &['x']);
        assert_eq!(sl.line(5), &['y']);
        assert!(sl.line(3).is_empty());
        assert!(sl.line(6).is_empty());
    }
}
