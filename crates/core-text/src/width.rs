//! Rune index <-> screen column translation.
//!
//! A tab occupies `tab_width` columns, East Asian wide and fullwidth runes two,
//! everything else one. Columns and indices here are 0-based offsets into a
//! single line; the view layer adds its own 1-based bias.

use unicode_width::UnicodeWidthChar;

pub const DEFAULT_TAB_WIDTH: usize = 4;

/// Columns occupied by `ch` when tabs are `tab_width` wide.
#[inline]
pub fn rune_width(ch: char, tab_width: usize) -> usize {
    if ch == '\t' {
        return tab_width;
    }
    match UnicodeWidthChar::width(ch) {
        Some(2) => 2,
        _ => 1,
    }
}

/// Width translator bound to a tab width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Translator {
    tab_width: usize,
}

impl Default for Translator {
    fn default() -> Self {
        Self::new(DEFAULT_TAB_WIDTH)
    }
}

impl Translator {
    pub fn new(tab_width: usize) -> Self {
        Self {
            tab_width: tab_width.max(1),
        }
    }

    pub fn tab_width(&self) -> usize {
        self.tab_width
    }

    #[inline]
    pub fn width(&self, ch: char) -> usize {
        rune_width(ch, self.tab_width)
    }

    /// Total columns used by `line`.
    pub fn line_width(&self, line: &[char]) -> usize {
        line.iter().map(|c| self.width(*c)).sum()
    }

    /// Columns occupied by the first `index` runes of `line`. `index` past the
    /// end counts the whole line.
    pub fn columns_up_to(&self, line: &[char], index: usize) -> usize {
        line.iter().take(index).map(|c| self.width(*c)).sum()
    }

    /// Index of the rune covering screen column `column`.
    ///
    /// Left-biased: a column that lands inside a wide rune or a tab maps to
    /// that rune. Columns past the end of the line map to `line.len()`.
    pub fn rune_index_at_column(&self, line: &[char], column: usize) -> usize {
        let mut acc = 0;
        for (i, c) in line.iter().enumerate() {
            let w = self.width(*c);
            if acc + w > column {
                return i;
            }
            acc += w;
        }
        line.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn runes(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn widths_by_class() {
        assert_eq!(rune_width('a', 4), 1);
        assert_eq!(rune_width('\t', 4), 4);
        assert_eq!(rune_width('\t', 8), 8);
        assert_eq!(rune_width('界', 4), 2);
        assert_eq!(rune_width('Ａ', 4), 2);
        assert_eq!(rune_width('\u{0301}', 4), 1);
    }

    #[test]
    fn columns_count_tabs_and_wide_runes() {
        let t = Translator::new(4);
        let line = runes("\ta界b");
        assert_eq!(t.columns_up_to(&line, 0), 0);
        assert_eq!(t.columns_up_to(&line, 1), 4);
        assert_eq!(t.columns_up_to(&line, 2), 5);
        assert_eq!(t.columns_up_to(&line, 3), 7);
        assert_eq!(t.columns_up_to(&line, 99), 8);
    }

    #[test]
    fn column_lookup_is_left_biased() {
        let t = Translator::new(4);
        let line = runes("\ta界b");
        assert_eq!(t.rune_index_at_column(&line, 0), 0);
        assert_eq!(t.rune_index_at_column(&line, 3), 0);
        assert_eq!(t.rune_index_at_column(&line, 4), 1);
        assert_eq!(t.rune_index_at_column(&line, 5), 2);
        assert_eq!(t.rune_index_at_column(&line, 6), 2);
        assert_eq!(t.rune_index_at_column(&line, 7), 3);
        assert_eq!(t.rune_index_at_column(&line, 8), 4);
        assert_eq!(t.rune_index_at_column(&line, 50), 4);
    }

    #[test]
    fn zero_tab_width_is_clamped() {
        assert_eq!(Translator::new(0).tab_width(), 1);
    }

    proptest! {
        #[test]
        fn index_column_round_trip(s in "[a-z\t界Ａ]{0,24}", tab in 1usize..9) {
            let t = Translator::new(tab);
            let line: Vec<char> = s.chars().collect();
            for i in 0..=line.len() {
                let col = t.columns_up_to(&line, i);
                prop_assert_eq!(t.rune_index_at_column(&line, col), i);
            }
        }
    }
}
