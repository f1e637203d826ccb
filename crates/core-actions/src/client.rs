//! Typed calls over the bus.
//!
//! Mutations are fire-and-forget; queries block until the executor answers
//! and fall back to zero values when the view is unknown or the bus is gone.
//! Every call is observed in submission order relative to all other
//! producers.

use std::path::{Path, PathBuf};

use anyhow::anyhow;
use core_events::{BusHandle, Reply};
use core_model::{Bounds, CursorMvmt, RenderTarget, Status, ViewId};
use core_text::{Position, Selection};

use crate::{Action, EdAction, ViewAction, ViewQuery};

#[derive(Debug, Clone)]
pub struct Actions {
    bus: BusHandle<Action>,
}

impl Actions {
    pub fn new(bus: BusHandle<Action>) -> Self {
        Self { bus }
    }

    pub fn bus(&self) -> &BusHandle<Action> {
        &self.bus
    }

    fn ed(&self, action: EdAction) {
        self.bus.dispatch(Action::Ed(action));
    }

    fn view(&self, id: ViewId, action: ViewAction) {
        self.bus.dispatch(Action::View(id, action));
    }

    fn query<T: Default>(&self, id: ViewId, make: impl FnOnce(Reply<T>) -> ViewQuery) -> T {
        self.bus
            .query(|reply| Action::Query(id, make(reply)))
            .unwrap_or_default()
    }

    // ---- editor -----------------------------------------------------------

    /// Open `loc` into `view` (a new view when `None`).
    pub fn ed_open(
        &self,
        loc: &str,
        view: Option<ViewId>,
        rel: &Path,
        create: bool,
    ) -> anyhow::Result<ViewId> {
        self.bus
            .query(|reply| {
                Action::Ed(EdAction::Open {
                    loc: loc.to_string(),
                    view,
                    rel: rel.to_path_buf(),
                    create,
                    reply: Some(reply),
                })
            })
            .unwrap_or_else(|| Err(anyhow!("action bus stopped")))
    }

    pub fn ed_open_cmd(
        &self,
        args: Vec<String>,
        dir: &Path,
        title: Option<String>,
    ) -> anyhow::Result<ViewId> {
        self.bus
            .query(|reply| {
                Action::Ed(EdAction::OpenCmd {
                    args,
                    dir: dir.to_path_buf(),
                    title,
                    reply: Some(reply),
                })
            })
            .unwrap_or_else(|| Err(anyhow!("action bus stopped")))
    }

    pub fn ed_new_view(&self) -> Option<ViewId> {
        self.bus.query(|reply| Action::Ed(EdAction::NewView(reply)))
    }

    pub fn ed_del_view(&self, view: ViewId, check: bool) {
        self.ed(EdAction::DelView { view, check });
    }

    pub fn ed_quit_check(&self) -> bool {
        self.bus
            .query(|reply| Action::Ed(EdAction::QuitCheck(reply)))
            .unwrap_or(true)
    }

    pub fn ed_views(&self) -> Vec<ViewId> {
        self.bus
            .query(|reply| Action::Ed(EdAction::Views(reply)))
            .unwrap_or_default()
    }

    pub fn ed_cur_view(&self) -> Option<ViewId> {
        self.bus
            .query(|reply| Action::Ed(EdAction::CurView(reply)))
            .flatten()
    }

    pub fn ed_activate_view(&self, view: ViewId) {
        self.ed(EdAction::ActivateView(view));
    }

    pub fn ed_set_status(&self, msg: impl Into<String>) {
        self.ed(EdAction::SetStatus(msg.into()));
    }

    pub fn ed_set_status_err(&self, msg: impl Into<String>) {
        self.ed(EdAction::SetStatusErr(msg.into()));
    }

    pub fn ed_status(&self) -> Status {
        self.bus
            .query(|reply| Action::Ed(EdAction::Status(reply)))
            .unwrap_or_default()
    }

    pub fn ed_render(&self, target: RenderTarget) {
        self.ed(EdAction::Render(target));
    }

    /// Wait until everything submitted so far has run.
    pub fn ed_flush(&self) -> bool {
        self.bus.flush()
    }

    // ---- view mutations ---------------------------------------------------

    pub fn view_add_selection(&self, id: ViewId, line1: usize, col1: usize, line2: usize, col2: usize) {
        self.view(
            id,
            ViewAction::AddSelection {
                line1,
                col1,
                line2,
                col2,
            },
        );
    }

    pub fn view_auto_scroll(&self, id: ViewId, dy: isize, dx: isize, on: bool) {
        self.view(id, ViewAction::AutoScroll { dy, dx, on });
    }

    pub fn view_backspace(&self, id: ViewId) {
        self.view(id, ViewAction::Backspace);
    }

    pub fn view_clear_selections(&self, id: ViewId) {
        self.view(id, ViewAction::ClearSelections);
    }

    pub fn view_cmd_stop(&self, id: ViewId) {
        self.view(id, ViewAction::CmdStop);
    }

    pub fn view_copy(&self, id: ViewId) {
        self.view(id, ViewAction::Copy);
    }

    pub fn view_cut(&self, id: ViewId) {
        self.view(id, ViewAction::Cut);
    }

    pub fn view_cursor_mvmt(&self, id: ViewId, mvmt: CursorMvmt) {
        self.view(id, ViewAction::CursorMvmt(mvmt));
    }

    pub fn view_delete(
        &self,
        id: ViewId,
        line1: usize,
        col1: usize,
        line2: usize,
        col2: usize,
        undoable: bool,
    ) {
        self.view(
            id,
            ViewAction::Delete {
                line1,
                col1,
                line2,
                col2,
                undoable,
            },
        );
    }

    pub fn view_delete_cur(&self, id: ViewId) {
        self.view(id, ViewAction::DeleteCur);
    }

    pub fn view_insert(&self, id: ViewId, line: usize, col: usize, text: &str, undoable: bool) {
        self.view(
            id,
            ViewAction::Insert {
                line,
                col,
                text: text.to_string(),
                undoable,
            },
        );
    }

    pub fn view_insert_cur(&self, id: ViewId, text: &str) {
        self.view(id, ViewAction::InsertCur(text.to_string()));
    }

    pub fn view_insert_new_line(&self, id: ViewId) {
        self.view(id, ViewAction::InsertNewLine);
    }

    pub fn view_move_cursor(&self, id: ViewId, dy: isize, dx: isize) {
        self.view(id, ViewAction::MoveCursor { dy, dx });
    }

    pub fn view_move_cursor_roll(&self, id: ViewId, dy: isize, dx: isize) {
        self.view(id, ViewAction::MoveCursorRoll { dy, dx });
    }

    pub fn view_open_selection(&self, id: ViewId, new_view: bool) {
        self.view(id, ViewAction::OpenSelection { new_view });
    }

    pub fn view_paste(&self, id: ViewId) {
        self.view(id, ViewAction::Paste);
    }

    pub fn view_redo(&self, id: ViewId) {
        self.view(id, ViewAction::Redo);
    }

    pub fn view_reload(&self, id: ViewId) {
        self.view(id, ViewAction::Reload);
    }

    pub fn view_render(&self, id: ViewId) {
        self.view(id, ViewAction::Render);
    }

    pub fn view_save(&self, id: ViewId) {
        self.view(id, ViewAction::Save);
    }

    pub fn view_select_all(&self, id: ViewId) {
        self.view(id, ViewAction::SelectAll);
    }

    pub fn view_set_bounds(&self, id: ViewId, bounds: Bounds) {
        self.view(id, ViewAction::SetBounds(bounds));
    }

    pub fn view_set_cursor_pos(&self, id: ViewId, line: usize, col: usize) {
        self.view(id, ViewAction::SetCursorPos { line, col });
    }

    pub fn view_set_dirty(&self, id: ViewId, on: bool) {
        self.view(id, ViewAction::SetDirty(on));
    }

    pub fn view_set_title(&self, id: ViewId, title: &str) {
        self.view(id, ViewAction::SetTitle(title.to_string()));
    }

    pub fn view_set_work_dir(&self, id: ViewId, dir: impl Into<PathBuf>) {
        self.view(id, ViewAction::SetWorkDir(dir.into()));
    }

    pub fn view_stretch_selection(&self, id: ViewId, prev_line: usize, prev_col: usize) {
        self.view(
            id,
            ViewAction::StretchSelection {
                prev_line,
                prev_col,
            },
        );
    }

    pub fn view_undo(&self, id: ViewId) {
        self.view(id, ViewAction::Undo);
    }

    // ---- view queries -----------------------------------------------------

    pub fn view_bounds(&self, id: ViewId) -> Bounds {
        self.query(id, ViewQuery::Bounds)
    }

    pub fn view_cols(&self, id: ViewId) -> usize {
        self.query(id, ViewQuery::Cols)
    }

    pub fn view_cursor_coords(&self, id: ViewId) -> (usize, usize) {
        self.query(id, ViewQuery::CursorCoords)
    }

    pub fn view_cursor_pos(&self, id: ViewId) -> Position {
        self.query(id, ViewQuery::CursorPos)
    }

    pub fn view_dirty(&self, id: ViewId) -> bool {
        self.query(id, ViewQuery::Dirty)
    }

    pub fn view_line_count(&self, id: ViewId) -> usize {
        self.query(id, ViewQuery::LineCount)
    }

    pub fn view_rows(&self, id: ViewId) -> usize {
        self.query(id, ViewQuery::Rows)
    }

    pub fn view_scroll_pos(&self, id: ViewId) -> (usize, usize) {
        self.query(id, ViewQuery::ScrollPos)
    }

    pub fn view_selections(&self, id: ViewId) -> Vec<Selection> {
        self.query(id, ViewQuery::Selections)
    }

    pub fn view_src_loc(&self, id: ViewId) -> Option<PathBuf> {
        self.query(id, ViewQuery::SrcLoc)
    }

    /// Text of a range; `None` ends read to the last line / end of line.
    pub fn view_text(
        &self,
        id: ViewId,
        line1: usize,
        col1: usize,
        line2: Option<usize>,
        col2: Option<usize>,
    ) -> Vec<String> {
        self.query(id, |reply| ViewQuery::Text {
            line1,
            col1,
            line2,
            col2,
            reply,
        })
    }

    pub fn view_text_pos(&self, id: ViewId, y: usize, x: usize) -> Position {
        self.query(id, |reply| ViewQuery::TextPos { y, x, reply })
    }

    pub fn view_title(&self, id: ViewId) -> String {
        self.query(id, ViewQuery::Title)
    }

    /// (undo, redo) stack depths.
    pub fn view_undo_depth(&self, id: ViewId) -> (usize, usize) {
        self.query(id, ViewQuery::UndoDepth)
    }

    pub fn view_work_dir(&self, id: ViewId) -> PathBuf {
        self.query(id, ViewQuery::WorkDir)
    }
}
