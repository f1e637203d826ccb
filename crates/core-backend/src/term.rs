//! Scrollback ring and terminal output interpreter for command views.
//!
//! [`Screen`] keeps at most `max_rows` rows. Logical row `r` lives in physical
//! row [`ring_row`]`(head, max_rows, r)`; once the ring is full each new line
//! advances `head` and clears the physical row it is about to reuse.
//!
//! [`Terminal`] drives a [`vte::Parser`] over raw pty output and applies the
//! small vt100 subset command-line tools need: printable overwrite with SGR
//! styling, CR/LF/BS/HT, erase in line / display and cursor positioning.

use bitflags::bitflags;
use core_text::Slice;
use tracing::trace;
use vte::{Params, Parser, Perform};

use crate::mem::slice_lines;

/// Tab stops for pty output are fixed at multiples of this.
pub const TAB_STOP: usize = 8;

/// Physical row holding logical row `logical`.
#[inline]
pub fn ring_row(head: usize, max_rows: usize, logical: usize) -> usize {
    (head + logical) % max_rows
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Color {
    #[default]
    Default,
    Indexed(u8),
    Rgb(u8, u8, u8),
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Attrs: u8 {
        const BOLD      = 0b0000_0001;
        const UNDERLINE = 0b0000_0010;
        const REVERSE   = 0b0000_0100;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CellStyle {
    pub fg: Color,
    pub bg: Color,
    pub attrs: Attrs,
}

/// Bounded row storage with a cursor, addressed in logical rows.
#[derive(Debug)]
pub struct Screen {
    text: Vec<Vec<char>>,
    styles: Vec<Vec<CellStyle>>,
    head: usize,
    max_rows: usize,
    cols: usize,
    rows: usize,
    // cursor, logical 0-based
    row: usize,
    col: usize,
}

impl Screen {
    pub fn new(max_rows: usize, rows: usize, cols: usize) -> Self {
        Self {
            text: Vec::new(),
            styles: Vec::new(),
            head: 0,
            max_rows: max_rows.max(2),
            cols: cols.max(1),
            rows: rows.max(1),
            row: 0,
            col: 0,
        }
    }

    pub fn head(&self) -> usize {
        self.head
    }

    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    /// Cursor as logical (row, col), 0-based.
    pub fn cursor(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    pub fn size(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Terminal dimensions; wrapping uses the new width from here on.
    pub fn set_size(&mut self, rows: usize, cols: usize) {
        self.rows = rows.max(1);
        self.cols = cols.max(1);
    }

    /// Drop all content and rewind the ring.
    pub fn wipe(&mut self) {
        self.text.clear();
        self.styles.clear();
        self.head = 0;
        self.row = 0;
        self.col = 0;
    }

    /// Logical rows currently stored.
    pub fn rows_used(&self) -> usize {
        self.text.len()
    }

    pub fn line_count(&self) -> usize {
        let used = self.rows_used();
        if used > 0 && self.logical(used - 1).is_empty() {
            used - 1
        } else {
            used
        }
    }

    fn phys(&self, logical: usize) -> usize {
        ring_row(self.head, self.max_rows, logical)
    }

    fn logical(&self, logical: usize) -> &[char] {
        self.text
            .get(self.phys(logical))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn ensure_row(&mut self, logical: usize) -> usize {
        let p = self.phys(logical);
        if self.text.len() <= p {
            self.text.resize_with(p + 1, Vec::new);
            self.styles.resize_with(p + 1, Vec::new);
        }
        p
    }

    fn clear_phys(&mut self, p: usize, from: usize) {
        if let Some(t) = self.text.get_mut(p) {
            t.truncate(from);
        }
        if let Some(s) = self.styles.get_mut(p) {
            s.truncate(from);
        }
    }

    /// Write `ch` at the cursor, wrapping at the terminal width.
    pub fn put(&mut self, ch: char, style: CellStyle) {
        if self.col >= self.cols {
            self.col = 0;
            self.line_feed();
        }
        let p = self.ensure_row(self.row);
        let col = self.col;
        let line = &mut self.text[p];
        if line.len() <= col {
            line.resize(col + 1, ' ');
        }
        line[col] = ch;
        let styles = &mut self.styles[p];
        if styles.len() <= col {
            styles.resize(col + 1, CellStyle::default());
        }
        styles[col] = style;
        self.col += 1;
    }

    /// Move to the next row. At the bottom of the ring the head advances and
    /// the reused row is cleared before anything is written to it.
    pub fn line_feed(&mut self) {
        if self.row + 1 < self.max_rows {
            self.row += 1;
        } else {
            self.head = (self.head + 1) % self.max_rows;
            let p = self.phys(self.row);
            self.clear_phys(p, 0);
            trace!(target: "backend.term", head = self.head, "ring_advance");
        }
        self.ensure_row(self.row);
    }

    pub fn carriage_return(&mut self) {
        self.col = 0;
    }

    pub fn backspace(&mut self) {
        self.col = self.col.saturating_sub(1);
    }

    pub fn tab(&mut self, style: CellStyle) {
        let next = (self.col / TAB_STOP + 1) * TAB_STOP;
        let target = next.min(self.cols);
        while self.col < target {
            self.put(' ', style);
        }
    }

    /// Erase in line. 0: cursor to end, 1: start to cursor, 2: whole line.
    pub fn clear_line(&mut self, mode: u16) {
        let p = self.phys(self.row);
        match mode {
            0 => self.clear_phys(p, self.col),
            1 => {
                let upto = self.col;
                if let Some(t) = self.text.get_mut(p) {
                    for c in t.iter_mut().take(upto + 1) {
                        *c = ' ';
                    }
                }
                if let Some(s) = self.styles.get_mut(p) {
                    for c in s.iter_mut().take(upto + 1) {
                        *c = CellStyle::default();
                    }
                }
            }
            _ => self.clear_phys(p, 0),
        }
    }

    /// Erase in display. 0: cursor to end of screen, 2 and 3: everything.
    pub fn clear_screen(&mut self, mode: u16) {
        let (from_row, from_col) = match mode {
            0 => (self.row, self.col),
            2 | 3 => (0, 0),
            _ => return,
        };
        let used = self.rows_used();
        if from_row < used {
            let p = self.phys(from_row);
            self.clear_phys(p, from_col);
        }
        for r in from_row + 1..used {
            let p = self.phys(r);
            self.clear_phys(p, 0);
        }
    }

    /// First logical row of the visible terminal window.
    fn screen_top(&self) -> usize {
        (self.row + 1).saturating_sub(self.rows)
    }

    pub fn cursor_up(&mut self, n: usize) {
        let top = self.screen_top();
        self.row = self.row.saturating_sub(n).max(top);
    }

    pub fn cursor_down(&mut self, n: usize) {
        self.row = (self.row + n).min(self.max_rows - 1);
        self.ensure_row(self.row);
    }

    pub fn cursor_forward(&mut self, n: usize) {
        self.col = (self.col + n).min(self.cols - 1);
    }

    pub fn cursor_back(&mut self, n: usize) {
        self.col = self.col.saturating_sub(n);
    }

    /// Absolute column, 1-based as sent by the application.
    pub fn cursor_to_col(&mut self, col: usize) {
        self.col = col.saturating_sub(1).min(self.cols - 1);
    }

    /// Absolute position inside the visible window, 1-based.
    pub fn cursor_to(&mut self, row: usize, col: usize) {
        let top = self.screen_top();
        self.row = (top + row.saturating_sub(1)).min(self.max_rows - 1);
        self.ensure_row(self.row);
        self.cursor_to_col(col);
    }

    /// Read logical rows, 1-based, with the same clamping rules as the
    /// memory backend.
    pub fn slice(&self, line1: usize, col1: usize, line2: Option<usize>, col2: Option<usize>) -> Slice {
        slice_lines(self.rows_used(), |i| self.logical(i), line1, col1, line2, col2)
    }

    /// Style of the 1-based logical cell.
    pub fn style_at(&self, line: usize, col: usize) -> Option<CellStyle> {
        if line < 1 || col < 1 || line > self.rows_used() {
            return None;
        }
        self.styles
            .get(self.phys(line - 1))
            .and_then(|row| row.get(col - 1))
            .copied()
    }
}

/// A [`Screen`] plus the escape-sequence parser feeding it.
pub struct Terminal {
    screen: Screen,
    parser: Parser,
    style: CellStyle,
}

impl std::fmt::Debug for Terminal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Terminal")
            .field("screen", &self.screen)
            .field("style", &self.style)
            .finish()
    }
}

impl Terminal {
    pub fn new(screen: Screen) -> Self {
        Self {
            screen,
            parser: Parser::new(),
            style: CellStyle::default(),
        }
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn screen_mut(&mut self) -> &mut Screen {
        &mut self.screen
    }

    /// Current SGR style.
    pub fn style(&self) -> CellStyle {
        self.style
    }

    pub fn reset(&mut self) {
        self.screen.wipe();
        self.parser = Parser::new();
        self.style = CellStyle::default();
    }

    pub fn advance(&mut self, bytes: &[u8]) {
        let mut performer = Performer {
            screen: &mut self.screen,
            style: &mut self.style,
        };
        for byte in bytes {
            self.parser.advance(&mut performer, *byte);
        }
    }
}

struct Performer<'a> {
    screen: &'a mut Screen,
    style: &'a mut CellStyle,
}

fn first_param(params: &Params, default: u16) -> u16 {
    params
        .iter()
        .next()
        .and_then(|p| p.first().copied())
        .filter(|v| *v != 0)
        .unwrap_or(default)
}

fn nth_param(params: &Params, n: usize, default: u16) -> u16 {
    params
        .iter()
        .nth(n)
        .and_then(|p| p.first().copied())
        .filter(|v| *v != 0)
        .unwrap_or(default)
}

fn basic_color(n: u16) -> Color {
    Color::Indexed(n as u8)
}

impl Performer<'_> {
    fn sgr(&mut self, params: &Params) {
        let flat: Vec<u16> = params.iter().flat_map(|p| p.iter().copied()).collect();
        if flat.is_empty() {
            *self.style = CellStyle::default();
            return;
        }
        let mut i = 0;
        while i < flat.len() {
            match flat[i] {
                0 => *self.style = CellStyle::default(),
                1 => self.style.attrs.insert(Attrs::BOLD),
                4 => self.style.attrs.insert(Attrs::UNDERLINE),
                7 => self.style.attrs.insert(Attrs::REVERSE),
                22 => self.style.attrs.remove(Attrs::BOLD),
                24 => self.style.attrs.remove(Attrs::UNDERLINE),
                27 => self.style.attrs.remove(Attrs::REVERSE),
                n @ 30..=37 => self.style.fg = basic_color(n - 30),
                39 => self.style.fg = Color::Default,
                n @ 40..=47 => self.style.bg = basic_color(n - 40),
                49 => self.style.bg = Color::Default,
                n @ 90..=97 => self.style.fg = basic_color(n - 90 + 8),
                n @ 100..=107 => self.style.bg = basic_color(n - 100 + 8),
                code @ (38 | 48) => {
                    let (color, used) = extended_color(&flat[i + 1..]);
                    if let Some(color) = color {
                        if code == 38 {
                            self.style.fg = color;
                        } else {
                            self.style.bg = color;
                        }
                    }
                    i += used;
                }
                other => trace!(target: "backend.term", code = other, "sgr_ignored"),
            }
            i += 1;
        }
    }
}

/// Parse `5;n` or `2;r;g;b` after a 38/48 code. Returns the color and how
/// many parameters it consumed.
fn extended_color(rest: &[u16]) -> (Option<Color>, usize) {
    match rest {
        [5, n, ..] => (Some(Color::Indexed(*n as u8)), 2),
        [2, r, g, b, ..] => (Some(Color::Rgb(*r as u8, *g as u8, *b as u8)), 4),
        _ => (None, rest.len()),
    }
}

impl Perform for Performer<'_> {
    fn print(&mut self, c: char) {
        self.screen.put(c, *self.style);
    }

    fn execute(&mut self, byte: u8) {
        match byte {
            b'\n' | 0x0b | 0x0c => self.screen.line_feed(),
            b'\r' => self.screen.carriage_return(),
            0x08 => self.screen.backspace(),
            b'\t' => self.screen.tab(*self.style),
            0x07 => {}
            other => trace!(target: "backend.term", byte = other, "control_ignored"),
        }
    }

    fn csi_dispatch(&mut self, params: &Params, intermediates: &[u8], ignore: bool, action: char) {
        if ignore || !intermediates.is_empty() {
            trace!(target: "backend.term", %action, "csi_ignored");
            return;
        }
        let n = first_param(params, 1) as usize;
        match action {
            'm' => self.sgr(params),
            'K' => self.screen.clear_line(first_param(params, 0)),
            'J' => self.screen.clear_screen(first_param(params, 0)),
            'A' => self.screen.cursor_up(n),
            'B' => self.screen.cursor_down(n),
            'C' => self.screen.cursor_forward(n),
            'D' => self.screen.cursor_back(n),
            'G' => self.screen.cursor_to_col(n),
            'H' | 'f' => {
                let row = first_param(params, 1) as usize;
                let col = nth_param(params, 1, 1) as usize;
                self.screen.cursor_to(row, col);
            }
            other => trace!(target: "backend.term", action = %other, "csi_ignored"),
        }
    }

    fn esc_dispatch(&mut self, _intermediates: &[u8], _ignore: bool, byte: u8) {
        trace!(target: "backend.term", byte, "esc_ignored");
    }
}
