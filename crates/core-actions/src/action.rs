//! The closed set of actions the bus executes.
//!
//! Three families share one enum so the executor stays monomorphic:
//! editor-wide operations ([`EdAction`]), view mutations ([`ViewAction`]) and
//! view queries ([`ViewQuery`]). Queries and a few editor operations carry a
//! [`Reply`] that the executor answers exactly once; a reply dropped without
//! an answer reads as "no value" on the caller side.

use std::path::PathBuf;

use core_events::Reply;
use core_model::{Bounds, CursorMvmt, RenderTarget, Status, ViewId};
use core_text::{Position, Selection};

#[derive(Debug)]
pub enum Action {
    Ed(EdAction),
    View(ViewId, ViewAction),
    Query(ViewId, ViewQuery),
}

#[derive(Debug)]
pub enum EdAction {
    /// Open `loc` (relative to `rel`) into `view`, or into a new view.
    Open {
        loc: String,
        view: Option<ViewId>,
        rel: PathBuf,
        create: bool,
        reply: Option<Reply<anyhow::Result<ViewId>>>,
    },
    /// Run `args` in `dir` inside a new command view.
    OpenCmd {
        args: Vec<String>,
        dir: PathBuf,
        title: Option<String>,
        reply: Option<Reply<anyhow::Result<ViewId>>>,
    },
    /// New scratch view.
    NewView(Reply<ViewId>),
    DelView {
        view: ViewId,
        check: bool,
    },
    QuitCheck(Reply<bool>),
    Views(Reply<Vec<ViewId>>),
    CurView(Reply<Option<ViewId>>),
    ActivateView(ViewId),
    SetStatus(String),
    SetStatusErr(String),
    Status(Reply<Status>),
    Render(RenderTarget),
    AutoScrollTick,
}

#[derive(Debug)]
pub enum ViewAction {
    /// Ends past the buffer are clamped; `usize::MAX` reads as "end".
    AddSelection {
        line1: usize,
        col1: usize,
        line2: usize,
        col2: usize,
    },
    AutoScroll {
        dy: isize,
        dx: isize,
        on: bool,
    },
    Backspace,
    ClearSelections,
    CmdStop,
    Copy,
    Cut,
    CursorMvmt(CursorMvmt),
    Delete {
        line1: usize,
        col1: usize,
        line2: usize,
        col2: usize,
        undoable: bool,
    },
    DeleteCur,
    Insert {
        line: usize,
        col: usize,
        text: String,
        undoable: bool,
    },
    InsertCur(String),
    InsertNewLine,
    MoveCursor {
        dy: isize,
        dx: isize,
    },
    MoveCursorRoll {
        dy: isize,
        dx: isize,
    },
    OpenSelection {
        new_view: bool,
    },
    Paste,
    Redo,
    Reload,
    Render,
    Save,
    SelectAll,
    SetBounds(Bounds),
    SetCursorPos {
        line: usize,
        col: usize,
    },
    SetDirty(bool),
    SetTitle(String),
    SetWorkDir(PathBuf),
    StretchSelection {
        prev_line: usize,
        prev_col: usize,
    },
    Undo,
}

#[derive(Debug)]
pub enum ViewQuery {
    Bounds(Reply<Bounds>),
    Cols(Reply<usize>),
    CursorCoords(Reply<(usize, usize)>),
    CursorPos(Reply<Position>),
    Dirty(Reply<bool>),
    LineCount(Reply<usize>),
    Rows(Reply<usize>),
    ScrollPos(Reply<(usize, usize)>),
    Selections(Reply<Vec<Selection>>),
    SrcLoc(Reply<Option<PathBuf>>),
    Text {
        line1: usize,
        col1: usize,
        line2: Option<usize>,
        col2: Option<usize>,
        reply: Reply<Vec<String>>,
    },
    /// Text area (rows, cols).
    TextSize(Reply<(usize, usize)>),
    TextPos {
        y: usize,
        x: usize,
        reply: Reply<Position>,
    },
    Title(Reply<String>),
    UndoDepth(Reply<(usize, usize)>),
    WorkDir(Reply<PathBuf>),
}

impl EdAction {
    pub fn name(&self) -> &'static str {
        match self {
            EdAction::Open { .. } => "ed_open",
            EdAction::OpenCmd { .. } => "ed_open_cmd",
            EdAction::NewView(_) => "ed_new_view",
            EdAction::DelView { .. } => "ed_del_view",
            EdAction::QuitCheck(_) => "ed_quit_check",
            EdAction::Views(_) => "ed_views",
            EdAction::CurView(_) => "ed_cur_view",
            EdAction::ActivateView(_) => "ed_activate_view",
            EdAction::SetStatus(_) => "ed_set_status",
            EdAction::SetStatusErr(_) => "ed_set_status_err",
            EdAction::Status(_) => "ed_status",
            EdAction::Render(_) => "ed_render",
            EdAction::AutoScrollTick => "ed_auto_scroll_tick",
        }
    }
}

impl ViewAction {
    pub fn name(&self) -> &'static str {
        match self {
            ViewAction::AddSelection { .. } => "view_add_selection",
            ViewAction::AutoScroll { .. } => "view_auto_scroll",
            ViewAction::Backspace => "view_backspace",
            ViewAction::ClearSelections => "view_clear_selections",
            ViewAction::CmdStop => "view_cmd_stop",
            ViewAction::Copy => "view_copy",
            ViewAction::Cut => "view_cut",
            ViewAction::CursorMvmt(_) => "view_cursor_mvmt",
            ViewAction::Delete { .. } => "view_delete",
            ViewAction::DeleteCur => "view_delete_cur",
            ViewAction::Insert { .. } => "view_insert",
            ViewAction::InsertCur(_) => "view_insert_cur",
            ViewAction::InsertNewLine => "view_insert_new_line",
            ViewAction::MoveCursor { .. } => "view_move_cursor",
            ViewAction::MoveCursorRoll { .. } => "view_move_cursor_roll",
            ViewAction::OpenSelection { .. } => "view_open_selection",
            ViewAction::Paste => "view_paste",
            ViewAction::Redo => "view_redo",
            ViewAction::Reload => "view_reload",
            ViewAction::Render => "view_render",
            ViewAction::Save => "view_save",
            ViewAction::SelectAll => "view_select_all",
            ViewAction::SetBounds(_) => "view_set_bounds",
            ViewAction::SetCursorPos { .. } => "view_set_cursor_pos",
            ViewAction::SetDirty(_) => "view_set_dirty",
            ViewAction::SetTitle(_) => "view_set_title",
            ViewAction::SetWorkDir(_) => "view_set_work_dir",
            ViewAction::StretchSelection { .. } => "view_stretch_selection",
            ViewAction::Undo => "view_undo",
        }
    }
}

impl ViewQuery {
    pub fn name(&self) -> &'static str {
        match self {
            ViewQuery::Bounds(_) => "view_bounds",
            ViewQuery::Cols(_) => "view_cols",
            ViewQuery::CursorCoords(_) => "view_cursor_coords",
            ViewQuery::CursorPos(_) => "view_cursor_pos",
            ViewQuery::Dirty(_) => "view_dirty",
            ViewQuery::LineCount(_) => "view_line_count",
            ViewQuery::Rows(_) => "view_rows",
            ViewQuery::ScrollPos(_) => "view_scroll_pos",
            ViewQuery::Selections(_) => "view_selections",
            ViewQuery::SrcLoc(_) => "view_src_loc",
            ViewQuery::Text { .. } => "view_text",
            ViewQuery::TextSize(_) => "view_text_size",
            ViewQuery::TextPos { .. } => "view_text_pos",
            ViewQuery::Title(_) => "view_title",
            ViewQuery::UndoDepth(_) => "view_undo_depth",
            ViewQuery::WorkDir(_) => "view_work_dir",
        }
    }
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Ed(a) => a.name(),
            Action::View(_, a) => a.name(),
            Action::Query(_, q) => q.name(),
        }
    }
}
