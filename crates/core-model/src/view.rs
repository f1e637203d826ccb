//! Per-pane editing state over one backend.
//!
//! A `View` owns its backend exclusively and keeps the cursor, the selection
//! list, the viewport offset and the undo history of that pane. All positions
//! are 1-based rune coordinates; screen columns only appear when the view
//! translates between the two (tabs and wide runes).
//!
//! Every mutating entry point runs inside one history group: the interaction
//! state is captured first, each backend edit pushes its inverse, and the
//! group is committed as a single frame when the outermost call returns.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use core_backend::{Backend, BackendError};
use core_state::{Replay, UndoManager};
use core_text::{Position, Selection, Translator};
use tracing::{debug, trace, warn};

use crate::ViewId;

/// One content change, in backend coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    Insert {
        line: usize,
        col: usize,
        text: String,
    },
    Delete {
        line1: usize,
        col1: usize,
        line2: usize,
        col2: usize,
    },
}

/// Interaction state saved on both sides of an undo frame.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewState {
    pub cursor: Position,
    pub selections: Vec<Selection>,
}

/// Screen rectangle of a view (1-based, inclusive), owned by the layout.
///
/// The text area starts two rows below the top (title bar and separator) and
/// two columns right of the left edge; a scrollbar and padding take the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub y1: usize,
    pub x1: usize,
    pub y2: usize,
    pub x2: usize,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            y1: 1,
            x1: 1,
            y2: 24,
            x2: 80,
        }
    }
}

impl Bounds {
    pub fn new(y1: usize, x1: usize, y2: usize, x2: usize) -> Self {
        Self { y1, x1, y2, x2 }
    }

    pub fn text_rows(&self) -> usize {
        self.y2.saturating_sub(self.y1).saturating_sub(3).max(1)
    }

    pub fn text_cols(&self) -> usize {
        self.x2.saturating_sub(self.x1).saturating_sub(3).max(1)
    }

    /// Screen cell of the first text row and column.
    pub fn text_origin(&self) -> (usize, usize) {
        (self.y1 + 2, self.x1 + 2)
    }
}

/// Keyboard-style cursor movements. Numeric codes follow declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMvmt {
    Right,
    Left,
    Up,
    Down,
    Home,
    End,
    PgUp,
    PgDown,
    Top,
    Bottom,
}

impl CursorMvmt {
    pub fn from_code(code: u8) -> Option<Self> {
        use CursorMvmt::*;
        Some(match code {
            0 => Right,
            1 => Left,
            2 => Up,
            3 => Down,
            4 => Home,
            5 => End,
            6 => PgUp,
            7 => PgDown,
            8 => Top,
            9 => Bottom,
            _ => return None,
        })
    }
}

struct Recording {
    redo: Vec<Edit>,
    undo: Vec<Edit>,
    before: ViewState,
}

pub struct View {
    id: ViewId,
    backend: Box<dyn Backend>,
    translator: Translator,
    cursor: Position,
    selections: Vec<Selection>,
    offy: usize,
    offx: usize,
    bounds: Bounds,
    dirty: bool,
    work_dir: PathBuf,
    title: String,
    auto_scroll: (isize, isize),
    history: UndoManager<Edit, ViewState>,
    recording: Option<Recording>,
}

impl std::fmt::Debug for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("View")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("cursor", &self.cursor)
            .field("selections", &self.selections)
            .field("offset", &(self.offy, self.offx))
            .field("dirty", &self.dirty)
            .field("history", &self.history)
            .finish()
    }
}

impl View {
    pub fn new(
        id: ViewId,
        backend: Box<dyn Backend>,
        translator: Translator,
        undo_limit: usize,
    ) -> Self {
        Self {
            id,
            backend,
            translator,
            cursor: Position::origin(),
            selections: Vec::new(),
            offy: 0,
            offx: 0,
            bounds: Bounds::default(),
            dirty: false,
            work_dir: PathBuf::from("."),
            title: String::new(),
            auto_scroll: (0, 0),
            history: UndoManager::new(undo_limit),
            recording: None,
        }
    }

    pub fn id(&self) -> ViewId {
        self.id
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    pub fn is_command(&self) -> bool {
        self.backend.as_command().is_some()
    }

    /// Replace the backend (the old one is closed) and start from the top.
    pub fn set_backend(&mut self, backend: Box<dyn Backend>) {
        if let Err(e) = self.backend.close() {
            warn!(target: "view", view = %self.id, error = %e, "backend_close_failed");
        }
        self.backend = backend;
        self.reset();
    }

    /// Forget cursor, selections, scrolling and history.
    pub fn reset(&mut self) {
        self.cursor = Position::origin();
        self.selections.clear();
        self.offy = 0;
        self.offx = 0;
        self.dirty = false;
        self.auto_scroll = (0, 0);
        self.history.clear();
        self.recording = None;
    }

    pub fn close(&mut self) {
        if let Err(e) = self.backend.close() {
            warn!(target: "view", view = %self.id, error = %e, "backend_close_failed");
        }
    }

    // ---- attributes -------------------------------------------------------

    pub fn title(&self) -> &str {
        &self.title
    }
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }
    pub fn set_work_dir(&mut self, dir: impl Into<PathBuf>) {
        self.work_dir = dir.into();
    }
    pub fn dirty(&self) -> bool {
        self.dirty
    }
    pub fn set_dirty(&mut self, on: bool) {
        self.dirty = on;
    }
    /// A dirty view must be confirmed before closing.
    pub fn can_close(&self) -> bool {
        !self.dirty
    }
    pub fn src_loc(&self) -> Option<PathBuf> {
        self.backend.src_loc()
    }
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }
    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = bounds;
        self.follow_cursor();
    }
    pub fn rows(&self) -> usize {
        self.bounds.text_rows()
    }
    pub fn cols(&self) -> usize {
        self.bounds.text_cols()
    }
    /// First visible (line, screen column), 1-based.
    pub fn scroll_pos(&self) -> (usize, usize) {
        (self.offy + 1, self.offx + 1)
    }
    pub fn undo_depth(&self) -> usize {
        self.history.undo_depth()
    }
    pub fn redo_depth(&self) -> usize {
        self.history.redo_depth()
    }

    // ---- lines ------------------------------------------------------------

    pub fn line_count(&self) -> usize {
        self.backend.line_count()
    }

    /// Last line the cursor may sit on. Unlike `line_count` this includes an
    /// empty trailing line.
    pub fn last_line(&self) -> usize {
        let n = self.backend.line_count();
        if self.backend.slice(n + 1, 1, Some(n + 1), None).is_empty() {
            n.max(1)
        } else {
            n + 1
        }
    }

    pub fn line(&self, ln: usize) -> Vec<char> {
        self.backend
            .slice(ln, 1, Some(ln), None)
            .text
            .into_iter()
            .next()
            .unwrap_or_default()
    }

    fn line_len(&self, ln: usize) -> usize {
        self.line(ln).len()
    }

    /// Per-line text of the inclusive range; the first line starts at `col1`,
    /// the last stops after `col2`, lines in between are whole.
    fn range_lines(&self, line1: usize, col1: usize, line2: usize, col2: usize) -> Vec<String> {
        let slice = self.backend.slice(line1, 1, Some(line2), None);
        (line1..=line2)
            .map(|ln| {
                let text = slice.line(ln);
                let from = if ln == line1 { col1.saturating_sub(1) } else { 0 };
                let to = if ln == line2 { col2 } else { text.len() };
                let (from, to) = (from.min(text.len()), to.min(text.len()));
                if to > from {
                    text[from..to].iter().collect()
                } else {
                    String::new()
                }
            })
            .collect()
    }

    /// Text of the range (`line1`, `col1`)..=(`line2`, `col2`), one string
    /// per line. `None` ends mean the last line / end of line; ends are
    /// reordered when given backwards. Out-of-range starts yield nothing.
    pub fn text(
        &self,
        line1: usize,
        col1: usize,
        line2: Option<usize>,
        col2: Option<usize>,
    ) -> Vec<String> {
        let last = self.last_line();
        let s = Selection::new(
            line1,
            col1,
            line2.unwrap_or(last),
            col2.unwrap_or(usize::MAX),
        );
        if s.line_from == 0 || s.col_from == 0 || s.line_from > last {
            return Vec::new();
        }
        self.range_lines(s.line_from, s.col_from, s.line_to.min(last), s.col_to)
    }

    /// Exactly what `remove` takes out for the same coordinates, including
    /// the swallowed line break when `col2` is past the end of `line2`.
    fn removed_text(&self, start: Position, line2: usize, col2: usize) -> String {
        let len2 = self.line_len(line2);
        let mut col2 = col2;
        let mut newline = false;
        if col2 > len2 {
            newline = line2 < self.last_line();
            col2 = len2;
        }
        let mut out = self
            .range_lines(start.line, start.col, line2, col2)
            .join("\n");
        if newline {
            out.push('\n');
        }
        out
    }

    // ---- cursor -----------------------------------------------------------

    pub fn cursor(&self) -> Position {
        self.cursor
    }

    fn clamp_position(&self, pos: Position) -> Position {
        let line = pos.line.clamp(1, self.last_line());
        let col = pos.col.clamp(1, self.line_len(line) + 1);
        Position::new(line, col)
    }

    /// Screen column (0-based) of the cursor inside its line.
    fn cursor_column(&self) -> usize {
        self.translator
            .columns_up_to(&self.line(self.cursor.line), self.cursor.col - 1)
    }

    /// Place the cursor. Zero coordinates are rejected; positions past the
    /// end of a line or of the buffer are clamped.
    pub fn set_cursor_pos(&mut self, line: usize, col: usize) -> bool {
        if line == 0 || col == 0 {
            return false;
        }
        self.cursor = self.clamp_position(Position::new(line, col));
        self.follow_cursor();
        true
    }

    /// Relative motion, clamped at line boundaries.
    pub fn move_cursor(&mut self, dy: isize, dx: isize) {
        self.shift_cursor(dy, dx, false);
    }

    /// Relative motion that wraps onto the adjacent line at either end.
    pub fn move_cursor_roll(&mut self, dy: isize, dx: isize) {
        self.shift_cursor(dy, dx, true);
    }

    // Vertical moves keep the screen column; each horizontal step crosses one
    // rune whatever its width.
    fn shift_cursor(&mut self, dy: isize, dx: isize, roll: bool) {
        let last = self.last_line();
        let mut line = self.cursor.line.saturating_add_signed(dy).clamp(1, last);
        let mut text = self.line(line);
        let mut idx = if line == self.cursor.line {
            (self.cursor.col - 1).min(text.len())
        } else {
            self.translator
                .rune_index_at_column(&text, self.cursor_column())
        };
        let mut steps = dx.unsigned_abs();
        while steps > 0 {
            if dx > 0 {
                if idx < text.len() {
                    let n = (text.len() - idx).min(steps);
                    idx += n;
                    steps -= n;
                } else if roll && line < last {
                    line += 1;
                    text = self.line(line);
                    idx = 0;
                    steps -= 1;
                } else {
                    break;
                }
            } else if idx > 0 {
                let n = idx.min(steps);
                idx -= n;
                steps -= n;
            } else if roll && line > 1 {
                line -= 1;
                text = self.line(line);
                idx = text.len();
                steps -= 1;
            } else {
                break;
            }
        }
        self.cursor = Position::new(line, idx + 1);
        self.follow_cursor();
    }

    pub fn cursor_mvmt(&mut self, mvmt: CursorMvmt) {
        let rows = self.rows() as isize;
        match mvmt {
            CursorMvmt::Right => self.move_cursor_roll(0, 1),
            CursorMvmt::Left => self.move_cursor_roll(0, -1),
            CursorMvmt::Up => self.move_cursor(-1, 0),
            CursorMvmt::Down => self.move_cursor(1, 0),
            CursorMvmt::Home => {
                self.set_cursor_pos(self.cursor.line, 1);
            }
            CursorMvmt::End => {
                self.set_cursor_pos(self.cursor.line, usize::MAX);
            }
            CursorMvmt::PgUp => self.move_cursor(-rows, 0),
            CursorMvmt::PgDown => self.move_cursor(rows, 0),
            CursorMvmt::Top => {
                self.set_cursor_pos(1, 1);
            }
            CursorMvmt::Bottom => {
                self.set_cursor_pos(usize::MAX, usize::MAX);
            }
        }
    }

    /// Scroll so the cursor stays inside the text area.
    fn follow_cursor(&mut self) {
        let rows = self.rows();
        let cols = self.cols();
        let row = self.cursor.line - 1;
        if row < self.offy {
            self.offy = row;
        } else if row >= self.offy + rows {
            self.offy = row + 1 - rows;
        }
        let col = self.cursor_column();
        if col < self.offx {
            self.offx = col;
        } else if col >= self.offx + cols {
            self.offx = col + 1 - cols;
        }
    }

    /// Absolute screen cell of the cursor.
    pub fn cursor_coords(&self) -> (usize, usize) {
        let (oy, ox) = self.bounds.text_origin();
        let row = (self.cursor.line - 1).saturating_sub(self.offy);
        let col = self.cursor_column().saturating_sub(self.offx);
        (oy + row, ox + col)
    }

    /// Text position under absolute screen cell (`y`, `x`). Cells before the
    /// text area map to its first row/column, cells past the end of a line
    /// or of the buffer clamp to the end.
    pub fn text_pos(&self, y: usize, x: usize) -> Position {
        let (oy, ox) = self.bounds.text_origin();
        let line = (self.offy + y.saturating_sub(oy) + 1).min(self.last_line());
        let column = self.offx + x.saturating_sub(ox);
        let idx = self
            .translator
            .rune_index_at_column(&self.line(line), column);
        Position::new(line, idx + 1)
    }

    // ---- history ----------------------------------------------------------

    fn state(&self) -> ViewState {
        ViewState {
            cursor: self.cursor,
            selections: self.selections.clone(),
        }
    }

    /// Run `f` as one undo frame. Nested calls join the outer frame.
    fn grouped<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        if self.recording.is_some() {
            return f(self);
        }
        self.recording = Some(Recording {
            redo: Vec::new(),
            undo: Vec::new(),
            before: self.state(),
        });
        let out = f(self);
        if let Some(rec) = self.recording.take() {
            let mut undo = rec.undo;
            undo.reverse();
            let after = self.state();
            self.history.record(rec.redo, undo, rec.before, after);
        }
        out
    }

    fn push_edit(&mut self, redo: Edit, undo: Edit) {
        if let Some(rec) = self.recording.as_mut() {
            rec.redo.push(redo);
            rec.undo.push(undo);
        }
    }

    fn apply(&self, edit: &Edit) -> Result<(), BackendError> {
        match edit {
            Edit::Insert { line, col, text } => self.backend.insert(*line, *col, text),
            Edit::Delete {
                line1,
                col1,
                line2,
                col2,
            } => self.backend.remove(*line1, *col1, *line2, *col2),
        }
    }

    fn replay(&mut self, replay: Replay<Edit, ViewState>) -> Result<(), BackendError> {
        for edit in &replay.edits {
            self.apply(edit)?;
        }
        self.selections = replay.state.selections;
        self.cursor = self.clamp_position(replay.state.cursor);
        self.dirty = true;
        self.follow_cursor();
        Ok(())
    }

    /// Revert the latest frame. False when there is nothing to undo.
    pub fn undo(&mut self) -> Result<bool, BackendError> {
        let Some(replay) = self.history.undo() else {
            return Ok(false);
        };
        debug!(target: "view", view = %self.id, edits = replay.edits.len(), "undo");
        self.replay(replay)?;
        Ok(true)
    }

    pub fn redo(&mut self) -> Result<bool, BackendError> {
        let Some(replay) = self.history.redo() else {
            return Ok(false);
        };
        debug!(target: "view", view = %self.id, edits = replay.edits.len(), "redo");
        self.replay(replay)?;
        Ok(true)
    }

    // ---- edits ------------------------------------------------------------

    /// Insert `text` at (`line`, `col`) and move the cursor after it. A zero
    /// line or column is not a position and leaves the view untouched.
    pub fn insert(
        &mut self,
        line: usize,
        col: usize,
        text: &str,
        undoable: bool,
    ) -> Result<(), BackendError> {
        self.grouped(|v| v.insert_at(line, col, text, undoable))
    }

    fn insert_at(
        &mut self,
        line: usize,
        col: usize,
        text: &str,
        undoable: bool,
    ) -> Result<(), BackendError> {
        if text.is_empty() || line == 0 || col == 0 {
            return Ok(());
        }
        let at = self.clamp_position(Position::new(line, col));
        self.backend.insert(at.line, at.col, text)?;
        if self.is_command() {
            return Ok(());
        }
        let breaks = text.matches('\n').count();
        let tail = text.rsplit('\n').next().map_or(0, |t| t.chars().count());
        let end_line = at.line + breaks;
        if undoable {
            let inverse = if breaks == 0 {
                Edit::Delete {
                    line1: at.line,
                    col1: at.col,
                    line2: at.line,
                    col2: at.col + tail - 1,
                }
            } else if tail > 0 {
                Edit::Delete {
                    line1: at.line,
                    col1: at.col,
                    line2: end_line,
                    col2: tail,
                }
            } else {
                // text ends with a break: remove through the end of the line
                // before it, swallowing that break
                let prev = end_line - 1;
                Edit::Delete {
                    line1: at.line,
                    col1: at.col,
                    line2: prev,
                    col2: self.line_len(prev) + 1,
                }
            };
            let redo = Edit::Insert {
                line: at.line,
                col: at.col,
                text: text.to_string(),
            };
            self.push_edit(redo, inverse);
        }
        self.dirty = true;
        self.cursor = if breaks == 0 {
            Position::new(at.line, at.col + tail)
        } else {
            Position::new(end_line, tail + 1)
        };
        self.follow_cursor();
        trace!(target: "view", view = %self.id, line = at.line, col = at.col, breaks, "insert");
        Ok(())
    }

    /// Remove the inclusive range and put the cursor at its start.
    pub fn delete(
        &mut self,
        line1: usize,
        col1: usize,
        line2: usize,
        col2: usize,
        undoable: bool,
    ) -> Result<(), BackendError> {
        self.grouped(|v| v.delete_range(line1, col1, line2, col2, undoable))
    }

    fn delete_range(
        &mut self,
        line1: usize,
        col1: usize,
        line2: usize,
        col2: usize,
        undoable: bool,
    ) -> Result<(), BackendError> {
        if [line1, col1, line2, col2].contains(&0) {
            return Ok(());
        }
        let s = Selection::new(line1, col1, line2, col2);
        let start = self.clamp_position(s.start());
        let line2 = s.line_to.clamp(start.line, self.last_line());
        let col2 = s.col_to;
        let removed = if self.is_command() {
            String::new()
        } else {
            self.removed_text(start, line2, col2)
        };
        self.backend.remove(start.line, start.col, line2, col2)?;
        if !removed.is_empty() {
            if undoable {
                let redo = Edit::Delete {
                    line1: start.line,
                    col1: start.col,
                    line2,
                    col2,
                };
                let undo = Edit::Insert {
                    line: start.line,
                    col: start.col,
                    text: removed,
                };
                self.push_edit(redo, undo);
            }
            self.dirty = true;
        }
        self.cursor = self.clamp_position(start);
        self.follow_cursor();
        trace!(target: "view", view = %self.id, line1 = start.line, col1 = start.col, line2, col2, "delete");
        Ok(())
    }

    /// Delete the primary selection, leaving the cursor at its start.
    fn delete_primary_selection(&mut self) -> Result<bool, BackendError> {
        let Some(s) = self.selections.first().copied() else {
            return Ok(false);
        };
        self.delete_range(s.line_from, s.col_from, s.line_to, s.col_to, true)?;
        self.selections.clear();
        Ok(true)
    }

    fn indent_of(&self, ln: usize) -> String {
        self.line(ln)
            .into_iter()
            .take_while(|c| *c == ' ' || *c == '\t')
            .collect()
    }

    /// Type `text` at the cursor, replacing the primary selection. A lone
    /// line break at the end of a line carries that line's indentation.
    pub fn insert_cur(&mut self, text: &str) -> Result<(), BackendError> {
        self.grouped(|v| {
            v.delete_primary_selection()?;
            let at = v.cursor;
            let mut text = Cow::Borrowed(text);
            if text == "\n" && at.col > v.line_len(at.line) {
                text = Cow::Owned(format!("\n{}", v.indent_of(at.line)));
            }
            v.insert_at(at.line, at.col, &text, true)
        })
    }

    pub fn insert_new_line(&mut self) -> Result<(), BackendError> {
        self.insert_cur("\n")
    }

    /// Delete the primary selection, else the rune under the cursor (at the
    /// end of a line, the line break).
    pub fn delete_cur(&mut self) -> Result<(), BackendError> {
        self.grouped(|v| {
            if v.delete_primary_selection()? {
                return Ok(());
            }
            let at = v.cursor;
            v.delete_range(at.line, at.col, at.line, at.col, true)
        })
    }

    /// Delete the primary selection, else the rune before the cursor. A no-op
    /// at the very start of the buffer.
    pub fn backspace(&mut self) -> Result<(), BackendError> {
        if self.selections.is_empty() && self.cursor == Position::origin() {
            return Ok(());
        }
        self.grouped(|v| {
            if v.selections.is_empty() {
                v.move_cursor_roll(0, -1);
            }
            v.delete_cur()
        })
    }

    /// Text of the primary selection, else the cursor line with its break.
    pub fn copy_text(&self) -> String {
        match self.selections.first() {
            Some(s) => self
                .range_lines(s.line_from, s.col_from, s.line_to, s.col_to)
                .join("\n"),
            None => {
                let mut out: String = self.line(self.cursor.line).into_iter().collect();
                out.push('\n');
                out
            }
        }
    }

    /// Remove the primary selection, else the cursor line with its break,
    /// and hand back exactly what was removed.
    pub fn cut(&mut self) -> Result<String, BackendError> {
        let text = if self.selections.is_empty() {
            let ln = self.cursor.line;
            self.removed_text(Position::new(ln, 1), ln, self.line_len(ln) + 1)
        } else {
            self.copy_text()
        };
        self.grouped(|v| {
            if v.delete_primary_selection()? {
                return Ok(());
            }
            let ln = v.cursor.line;
            let len = v.line_len(ln);
            v.delete_range(ln, 1, ln, len + 1, true)
        })?;
        Ok(text)
    }

    pub fn paste(&mut self, text: &str) -> Result<(), BackendError> {
        self.insert_cur(text)
    }

    // ---- selections -------------------------------------------------------

    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    fn clamp_line_col(&self, line: usize, col: usize) -> (usize, usize) {
        let line = line.clamp(1, self.last_line());
        (line, col.clamp(1, self.line_len(line) + 1))
    }

    /// Append a selection; ends are clamped to the buffer and normalized.
    pub fn add_selection(&mut self, line1: usize, col1: usize, line2: usize, col2: usize) {
        let (l1, c1) = self.clamp_line_col(line1, col1);
        let (l2, c2) = self.clamp_line_col(line2, col2);
        self.selections.push(Selection::new(l1, c1, l2, c2));
    }

    pub fn clear_selections(&mut self) {
        self.selections.clear();
    }

    pub fn select_all(&mut self) {
        let last = self.line_count().max(1);
        let col = self.line_len(last).max(1);
        self.selections = vec![Selection::new(1, 1, last, col)];
    }

    /// Grow or shrink the primary selection from the previous cursor
    /// position to the current one; starts a new selection if none exists.
    pub fn stretch_selection(&mut self, prev_line: usize, prev_col: usize) {
        let (prev, cur) = (Position::new(prev_line, prev_col), self.cursor);
        let next = match self.selections.first() {
            None => Selection::from_positions(prev, cur),
            Some(s) if s.end() == prev => Selection::from_positions(s.start(), cur),
            Some(s) => Selection::from_positions(cur, s.end()),
        };
        match self.selections.first_mut() {
            Some(first) => *first = next,
            None => self.selections.push(next),
        }
    }

    /// Text naming a location to open: the primary selection, else the
    /// whitespace-delimited word under the cursor.
    pub fn selection_target(&self) -> Option<String> {
        if let Some(s) = self.selections.first() {
            let text = self
                .range_lines(s.line_from, s.col_from, s.line_to, s.col_to)
                .join("\n");
            let text = text.trim();
            return (!text.is_empty()).then(|| text.to_string());
        }
        let line = self.line(self.cursor.line);
        let at = (self.cursor.col - 1).min(line.len());
        let start = line[..at]
            .iter()
            .rposition(|c| c.is_whitespace())
            .map_or(0, |i| i + 1);
        let end = line[at..]
            .iter()
            .position(|c| c.is_whitespace())
            .map_or(line.len(), |i| at + i);
        (end > start).then(|| line[start..end].iter().collect())
    }

    // ---- persistence ------------------------------------------------------

    /// Save to the backend's source location.
    pub fn save(&mut self) -> Result<PathBuf, BackendError> {
        let loc = self.backend.src_loc().unwrap_or_default();
        self.backend.save(&loc)?;
        self.dirty = false;
        debug!(target: "view", view = %self.id, path = %loc.display(), "saved");
        Ok(loc)
    }

    /// Reload the backend. History no longer matches the content and is
    /// dropped.
    pub fn reload(&mut self) -> Result<(), BackendError> {
        self.backend.reload()?;
        self.history.clear();
        self.dirty = false;
        self.cursor = self.clamp_position(self.cursor);
        self.follow_cursor();
        debug!(target: "view", view = %self.id, "reloaded");
        Ok(())
    }

    // ---- auto-scroll ------------------------------------------------------

    pub fn auto_scroll(&self) -> (isize, isize) {
        self.auto_scroll
    }

    pub fn set_auto_scroll(&mut self, dy: isize, dx: isize, on: bool) {
        self.auto_scroll = if on { (dy, dx) } else { (0, 0) };
    }

    /// Shift the viewport by the auto-scroll vector and stretch the primary
    /// selection along. False when idle.
    pub fn auto_scroll_tick(&mut self) -> bool {
        let (dy, dx) = self.auto_scroll;
        if (dy, dx) == (0, 0) {
            return false;
        }
        let Some(s) = self.selections.first().copied() else {
            return false;
        };
        let lines = self.line_count().max(1);
        let len = self.line_len(self.cursor.line);
        self.offy = self
            .offy
            .saturating_add_signed(dy)
            .min(lines.saturating_sub(self.rows()));
        self.offx = self
            .offx
            .saturating_add_signed(dx)
            .min(len.saturating_sub(self.cols()));

        let (mut l1, mut c1, mut l2, mut c2) = (s.line_from, s.col_from, s.line_to, s.col_to);
        if dy > 0 {
            l2 = l2.saturating_add_signed(dy);
        } else {
            l1 = l1.saturating_add_signed(dy);
        }
        if dx > 0 {
            c2 = c2.saturating_add_signed(dx);
        } else {
            c1 = c1.saturating_add_signed(dx);
        }
        let (l1, l2) = (l1.clamp(1, lines), l2.clamp(1, lines));
        // each end stays inside its own line
        let c1 = c1.clamp(1, self.line_len(l1).max(1));
        let c2 = c2.clamp(1, self.line_len(l2).max(1));
        self.selections[0] = Selection::new(l1, c1, l2, c2);
        trace!(target: "view", view = %self.id, offy = self.offy, offx = self.offx, "auto_scroll");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_backend::MemBackend;
    use pretty_assertions::assert_eq;

    fn view(text: &str) -> View {
        View::new(
            ViewId(1),
            Box::new(MemBackend::from_text(text)),
            Translator::new(4),
            100,
        )
    }

    fn all(v: &View) -> Vec<String> {
        v.text(1, 1, None, None)
    }

    #[test]
    fn bounds_geometry() {
        let b = Bounds::default();
        assert_eq!((b.text_rows(), b.text_cols()), (20, 76));
        assert_eq!(b.text_origin(), (3, 3));
        let half = Bounds::new(13, 1, 24, 50);
        assert_eq!((half.text_rows(), half.text_cols()), (8, 46));
    }

    #[test]
    fn set_cursor_clamps_and_rejects_zero() {
        let mut v = view("1234567890\nab");
        assert!(v.set_cursor_pos(1, 99));
        assert_eq!(v.cursor(), Position::new(1, 11));
        assert!(!v.set_cursor_pos(0, 0));
        assert_eq!(v.cursor(), Position::new(1, 11));
        v.set_cursor_pos(50, 1);
        assert_eq!(v.cursor(), Position::new(2, 1));
    }

    #[test]
    fn horizontal_motion_clamps_or_rolls() {
        let mut v = view("1234567890\nab");
        v.set_cursor_pos(1, 10);
        v.move_cursor(0, 1);
        v.move_cursor(0, 1);
        assert_eq!(v.cursor(), Position::new(1, 11));
        v.move_cursor_roll(0, 1);
        assert_eq!(v.cursor(), Position::new(2, 1));
        v.move_cursor_roll(0, -1);
        assert_eq!(v.cursor(), Position::new(1, 11));
    }

    #[test]
    fn vertical_motion_keeps_screen_column_across_tabs() {
        let mut v = view("\t\tabc\nxyz\n\t\tabcdefgh");
        v.set_cursor_pos(1, 3);
        v.move_cursor(2, 3);
        assert_eq!(v.cursor(), Position::new(3, 6));
        v.move_cursor(-2, -3);
        assert_eq!(v.cursor(), Position::new(1, 3));
        // column 8 is past "xyz": clamps to its end
        v.move_cursor(1, 0);
        assert_eq!(v.cursor(), Position::new(2, 4));
    }

    #[test]
    fn insert_moves_cursor_and_undoes() {
        let mut v = view("1234567890");
        v.insert(1, 1, "XYZ", true).unwrap();
        assert_eq!(all(&v), vec!["XYZ1234567890"]);
        assert_eq!(v.cursor(), Position::new(1, 4));
        assert!(v.dirty());
        assert!(v.undo().unwrap());
        assert_eq!(all(&v), vec!["1234567890"]);
        assert_eq!(v.cursor(), Position::origin());
    }

    #[test]
    fn insert_ending_with_break_inverts_exactly() {
        let mut v = view("abc\ndef");
        v.insert(1, 2, "X\nY\n", true).unwrap();
        assert_eq!(all(&v), vec!["aX", "Y", "bc", "def"]);
        assert_eq!(v.cursor(), Position::new(3, 1));
        v.undo().unwrap();
        assert_eq!(all(&v), vec!["abc", "def"]);
        v.redo().unwrap();
        assert_eq!(all(&v), vec!["aX", "Y", "bc", "def"]);
        assert_eq!(v.cursor(), Position::new(3, 1));
    }

    #[test]
    fn delete_past_eol_joins_and_undo_restores_break() {
        let mut v = view("abc\ndef");
        v.delete(1, 3, 1, 4, true).unwrap();
        assert_eq!(all(&v), vec!["abdef"]);
        assert_eq!(v.cursor(), Position::new(1, 3));
        v.undo().unwrap();
        assert_eq!(all(&v), vec!["abc", "def"]);
    }

    #[test]
    fn non_undoable_edits_mark_dirty_without_history() {
        let mut v = view("abc");
        v.insert(1, 1, "ZZ", false).unwrap();
        assert!(v.dirty());
        assert_eq!(v.undo_depth(), 0);
    }

    #[test]
    fn backspace_walks_back_then_stops_at_origin() {
        let mut v = view("1234567890");
        v.set_cursor_pos(1, 3);
        v.backspace().unwrap();
        assert_eq!(all(&v), vec!["134567890"]);
        assert_eq!(v.cursor(), Position::new(1, 2));
        v.backspace().unwrap();
        assert_eq!(all(&v), vec!["34567890"]);
        assert_eq!(v.cursor(), Position::origin());
        let depth = v.undo_depth();
        v.backspace().unwrap();
        assert_eq!(all(&v), vec!["34567890"]);
        assert_eq!(v.undo_depth(), depth);
    }

    #[test]
    fn backspace_undo_restores_cursor_before_motion() {
        let mut v = view("abc\ndef");
        v.set_cursor_pos(2, 1);
        v.backspace().unwrap();
        assert_eq!(all(&v), vec!["abcdef"]);
        v.undo().unwrap();
        assert_eq!(all(&v), vec!["abc", "def"]);
        assert_eq!(v.cursor(), Position::new(2, 1));
    }

    #[test]
    fn insert_cur_over_selection_is_one_frame() {
        let mut v = view("abcdef\nghijkl");
        v.add_selection(1, 3, 2, 2);
        v.insert_cur("{\n}").unwrap();
        assert_eq!(all(&v), vec!["ab{", "}ijkl"]);
        assert_eq!(v.cursor(), Position::new(2, 2));
        assert!(v.selections().is_empty());
        assert_eq!(v.undo_depth(), 1);
        v.undo().unwrap();
        assert_eq!(all(&v), vec!["abcdef", "ghijkl"]);
        assert_eq!(v.selections(), &[Selection::new(1, 3, 2, 2)]);
    }

    #[test]
    fn new_line_at_end_keeps_indent() {
        let mut v = view("\t  foo\nbar");
        v.set_cursor_pos(1, 99);
        v.insert_new_line().unwrap();
        assert_eq!(all(&v), vec!["\t  foo", "\t  ", "bar"]);
        assert_eq!(v.cursor(), Position::new(2, 4));
        // mid-line split carries no indent
        v.set_cursor_pos(1, 5);
        v.insert_new_line().unwrap();
        assert_eq!(v.text(1, 1, Some(2), None), vec!["\t  f", "oo"]);
    }

    #[test]
    fn copy_and_cut_line_without_selection() {
        let mut v = view("one\ntwo\nthree");
        v.set_cursor_pos(2, 2);
        assert_eq!(v.copy_text(), "two\n");
        assert_eq!(v.cut().unwrap(), "two\n");
        assert_eq!(all(&v), vec!["one", "three"]);
        v.undo().unwrap();
        assert_eq!(all(&v), vec!["one", "two", "three"]);
    }

    #[test]
    fn cut_last_line_returns_only_what_was_removed() {
        let mut v = view("one\ntwo");
        v.set_cursor_pos(2, 2);
        assert_eq!(v.copy_text(), "two\n");
        assert_eq!(v.cut().unwrap(), "two");
        assert_eq!(v.text(1, 1, Some(1), None), vec!["one"]);
        v.undo().unwrap();
        assert_eq!(all(&v), vec!["one", "two"]);
    }

    #[test]
    fn zero_coordinates_are_not_positions() {
        let mut v = view("abc\ndef");
        v.insert(0, 1, "x", true).unwrap();
        v.insert(1, 0, "x", true).unwrap();
        v.delete(0, 1, 1, 2, true).unwrap();
        v.delete(1, 1, 2, 0, true).unwrap();
        assert_eq!(all(&v), vec!["abc", "def"]);
        assert_eq!(v.undo_depth(), 0);
        assert!(!v.dirty());
    }

    #[test]
    fn text_is_selection_shaped_and_reorders() {
        let v = view("1234567890\n\t\tabc\nxyz");
        assert_eq!(v.text(1, 6, Some(1), Some(2)), vec!["23456"]);
        assert_eq!(v.text(2, 3, Some(2), Some(4)), vec!["ab"]);
        assert_eq!(v.text(1, 9, Some(3), Some(1)), vec!["90", "\t\tabc", "x"]);
        assert!(v.text(0, 0, Some(0), Some(0)).is_empty());
        assert!(v.text(100, 100, Some(200), Some(200)).is_empty());
    }

    #[test]
    fn select_all_and_stretch() {
        let mut v = view("abc\ndefg");
        v.select_all();
        assert_eq!(v.selections(), &[Selection::new(1, 1, 2, 4)]);
        v.clear_selections();
        v.set_cursor_pos(1, 3);
        v.stretch_selection(1, 1);
        assert_eq!(v.selections(), &[Selection::new(1, 1, 1, 3)]);
        v.set_cursor_pos(2, 2);
        v.stretch_selection(1, 3);
        assert_eq!(v.selections(), &[Selection::new(1, 1, 2, 2)]);
    }

    #[test]
    fn text_pos_maps_screen_cells_through_tabs() {
        let v = view("1234567890\n\t\tabc");
        assert_eq!(v.text_pos(1, 1), Position::new(1, 1));
        assert_eq!(v.text_pos(3, 3), Position::new(1, 1));
        assert_eq!(v.text_pos(3, 333), Position::new(1, 11));
        assert_eq!(v.text_pos(4, 5), Position::new(2, 1));
        assert_eq!(v.text_pos(4, 11), Position::new(2, 3));
        assert_eq!(v.text_pos(100, 100), Position::new(2, 6));
    }

    #[test]
    fn viewport_follows_cursor() {
        let text = vec!["x"; 40].join("\n");
        let mut v = view(&text);
        v.set_bounds(Bounds::new(1, 1, 13, 40));
        assert_eq!(v.rows(), 9);
        v.set_cursor_pos(12, 1);
        assert_eq!(v.scroll_pos(), (4, 1));
        assert_eq!(v.cursor_coords(), (3 + 8, 3));
        v.set_cursor_pos(2, 1);
        assert_eq!(v.scroll_pos(), (2, 1));
    }

    #[test]
    fn auto_scroll_shifts_viewport_and_selection() {
        let text = vec!["line"; 40].join("\n");
        let mut v = view(&text);
        assert!(!v.auto_scroll_tick());
        v.set_auto_scroll(5, 0, true);
        assert!(!v.auto_scroll_tick());
        v.add_selection(1, 1, 2, 2);
        assert!(v.auto_scroll_tick());
        assert_eq!(v.scroll_pos(), (6, 1));
        assert_eq!(v.selections()[0], Selection::new(1, 1, 7, 2));
        v.set_auto_scroll(-50, 0, true);
        v.auto_scroll_tick();
        assert_eq!(v.scroll_pos(), (1, 1));
        v.set_auto_scroll(9, 9, false);
        assert_eq!(v.auto_scroll(), (0, 0));
    }

    #[test]
    fn auto_scroll_clamps_columns_to_each_selection_line() {
        let mut v = view("ab\nlonger line here\nxy");
        v.add_selection(2, 3, 2, 10);
        v.set_auto_scroll(0, 4, true);
        assert!(v.auto_scroll_tick());
        assert_eq!(v.selections()[0], Selection::new(2, 3, 2, 14));
        v.auto_scroll_tick();
        assert_eq!(v.selections()[0], Selection::new(2, 3, 2, 16));
    }

    #[test]
    fn selection_target_prefers_selection_then_word() {
        let mut v = view("open empty.txt:3 now");
        v.set_cursor_pos(1, 8);
        assert_eq!(v.selection_target().as_deref(), Some("empty.txt:3"));
        v.add_selection(1, 1, 1, 4);
        assert_eq!(v.selection_target().as_deref(), Some("open"));
    }

    #[test]
    fn cursor_mvmt_codes() {
        let mut v = view("abc\ndefgh\nij");
        v.set_cursor_pos(2, 2);
        v.cursor_mvmt(CursorMvmt::End);
        assert_eq!(v.cursor(), Position::new(2, 6));
        v.cursor_mvmt(CursorMvmt::Home);
        assert_eq!(v.cursor(), Position::new(2, 1));
        v.cursor_mvmt(CursorMvmt::Bottom);
        assert_eq!(v.cursor(), Position::new(3, 3));
        v.cursor_mvmt(CursorMvmt::Top);
        assert_eq!(v.cursor(), Position::origin());
        v.cursor_mvmt(CursorMvmt::PgDown);
        assert_eq!(v.cursor(), Position::new(3, 1));
        assert_eq!(CursorMvmt::from_code(9), Some(CursorMvmt::Bottom));
        assert_eq!(CursorMvmt::from_code(10), None);
    }
}
