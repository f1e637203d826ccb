//! String surface over [`Actions`]: `call("view_insert", &["3", "1", "1",
//! "abc", "true"])`.
//!
//! Every argument is parsed before anything is submitted, so a malformed
//! call never mutates state. Numeric coordinates follow these rules:
//! a negative range end means "to the end" (of the line or the buffer).
//! Edits reject a start ≤ 0 as a bad argument; queries and motions pass it
//! through as 0, which the view answers with nothing. Operations on an
//! unknown view answer zero values.

use std::path::{Path, PathBuf};

use core_model::{Bounds, CursorMvmt, RenderTarget, ViewId};
use thiserror::Error;
use tracing::debug;

use crate::Actions;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("unknown action: {0}")]
    UnknownAction(String),
    #[error("{action}: missing argument {index}")]
    MissingArgument { action: String, index: usize },
    #[error("{action}: bad argument {index}: {value:?}")]
    BadArgument {
        action: String,
        index: usize,
        value: String,
    },
    #[error("{action} failed: {msg}")]
    Failed { action: String, msg: String },
}

struct Args<'a> {
    action: &'a str,
    args: &'a [&'a str],
}

impl<'a> Args<'a> {
    fn str(&self, index: usize) -> Result<&'a str, ApiError> {
        self.args
            .get(index)
            .copied()
            .ok_or_else(|| ApiError::MissingArgument {
                action: self.action.to_string(),
                index,
            })
    }

    fn opt_str(&self, index: usize) -> Option<&'a str> {
        self.args.get(index).copied()
    }

    fn bad(&self, index: usize, value: &str) -> ApiError {
        ApiError::BadArgument {
            action: self.action.to_string(),
            index,
            value: value.to_string(),
        }
    }

    fn int(&self, index: usize) -> Result<i64, ApiError> {
        let raw = self.str(index)?;
        raw.trim().parse().map_err(|_| self.bad(index, raw))
    }

    fn bool(&self, index: usize) -> Result<bool, ApiError> {
        let raw = self.str(index)?;
        raw.trim().parse().map_err(|_| self.bad(index, raw))
    }

    fn opt_bool(&self, index: usize, default: bool) -> Result<bool, ApiError> {
        match self.opt_str(index) {
            Some(_) => self.bool(index),
            None => Ok(default),
        }
    }

    fn view(&self, index: usize) -> Result<ViewId, ApiError> {
        let raw = self.str(index)?;
        raw.trim()
            .parse()
            .map(ViewId)
            .map_err(|_| self.bad(index, raw))
    }

    /// A view id, or `None` for a negative value.
    fn opt_view(&self, index: usize) -> Result<Option<ViewId>, ApiError> {
        let n = self.int(index)?;
        Ok(u64::try_from(n).ok().map(ViewId))
    }

    /// 1-based position; non-positive values become 0.
    fn pos(&self, index: usize) -> Result<usize, ApiError> {
        Ok(usize::try_from(self.int(index)?).unwrap_or(0))
    }

    /// Edit coordinate; must name a real line or column.
    fn at(&self, index: usize) -> Result<usize, ApiError> {
        let n = self.int(index)?;
        match usize::try_from(n) {
            Ok(v) if v > 0 => Ok(v),
            _ => Err(self.bad(index, &n.to_string())),
        }
    }

    /// Range end; negative means "to the end".
    fn end(&self, index: usize) -> Result<Option<usize>, ApiError> {
        Ok(usize::try_from(self.int(index)?).ok())
    }

    fn delta(&self, index: usize) -> Result<isize, ApiError> {
        let n = self.int(index)?;
        isize::try_from(n).map_err(|_| self.bad(index, &n.to_string()))
    }
}

fn none() -> Vec<String> {
    Vec::new()
}

fn one(value: impl ToString) -> Vec<String> {
    vec![value.to_string()]
}

fn pair(a: impl ToString, b: impl ToString) -> Vec<String> {
    vec![a.to_string(), b.to_string()]
}

fn failed(action: &str, err: anyhow::Error) -> ApiError {
    ApiError::Failed {
        action: action.to_string(),
        msg: format!("{err:#}"),
    }
}

/// Run action `name` with positional `args`, returning its string results.
pub fn call(actions: &Actions, name: &str, args: &[&str]) -> Result<Vec<String>, ApiError> {
    debug!(target: "api", action = name, argc = args.len(), "call");
    let a = Args { action: name, args };
    let out = match name {
        // ---- editor -------------------------------------------------------
        "ed_open" => {
            let loc = a.str(0)?;
            let view = match a.opt_str(1) {
                Some(_) => a.opt_view(1)?,
                None => None,
            };
            let rel = PathBuf::from(a.opt_str(2).unwrap_or(""));
            let create = a.opt_bool(3, false)?;
            let id = actions
                .ed_open(loc, view, &rel, create)
                .map_err(|e| failed(name, e))?;
            one(id)
        }
        "ed_open_cmd" => {
            let dir = a.str(0)?;
            a.str(1)?;
            let argv = args[1..].iter().map(|s| s.to_string()).collect();
            let id = actions
                .ed_open_cmd(argv, Path::new(dir), None)
                .map_err(|e| failed(name, e))?;
            one(id)
        }
        "ed_new_view" => actions.ed_new_view().map(one).unwrap_or_default(),
        "ed_del_view" => {
            let view = a.view(0)?;
            let check = a.opt_bool(1, true)?;
            actions.ed_del_view(view, check);
            none()
        }
        "ed_quit_check" => one(actions.ed_quit_check()),
        "ed_views" => actions.ed_views().iter().map(ToString::to_string).collect(),
        "ed_cur_view" => one(actions.ed_cur_view().map_or(0, |v| v.0)),
        "ed_activate_view" => {
            actions.ed_activate_view(a.view(0)?);
            none()
        }
        "ed_set_status" => {
            actions.ed_set_status(args.join(" "));
            none()
        }
        "ed_set_status_err" => {
            actions.ed_set_status_err(args.join(" "));
            none()
        }
        "ed_status" => {
            let status = actions.ed_status();
            pair(status.msg, status.is_err)
        }
        "ed_flush" => {
            actions.ed_flush();
            none()
        }
        "ed_render" => {
            actions.ed_render(RenderTarget::All);
            none()
        }

        // ---- view mutations -----------------------------------------------
        "view_add_selection" => {
            let (id, l1, c1) = (a.view(0)?, a.pos(1)?, a.pos(2)?);
            let (l2, c2) = (a.end(3)?, a.end(4)?);
            actions.view_add_selection(
                id,
                l1,
                c1,
                l2.unwrap_or(usize::MAX),
                c2.unwrap_or(usize::MAX),
            );
            none()
        }
        "view_auto_scroll" => {
            let (id, dy, dx) = (a.view(0)?, a.delta(1)?, a.delta(2)?);
            let on = a.opt_bool(3, dy != 0 || dx != 0)?;
            actions.view_auto_scroll(id, dy, dx, on);
            none()
        }
        "view_backspace" => {
            actions.view_backspace(a.view(0)?);
            none()
        }
        "view_clear_selections" => {
            actions.view_clear_selections(a.view(0)?);
            none()
        }
        "view_cmd_stop" => {
            actions.view_cmd_stop(a.view(0)?);
            none()
        }
        "view_copy" => {
            actions.view_copy(a.view(0)?);
            none()
        }
        "view_cut" => {
            actions.view_cut(a.view(0)?);
            none()
        }
        "view_cursor_mvmt" => {
            let id = a.view(0)?;
            let raw = a.str(1)?;
            let mvmt = raw
                .trim()
                .parse::<u8>()
                .ok()
                .and_then(CursorMvmt::from_code)
                .ok_or_else(|| a.bad(1, raw))?;
            actions.view_cursor_mvmt(id, mvmt);
            none()
        }
        "view_delete" => {
            let (id, l1, c1) = (a.view(0)?, a.at(1)?, a.at(2)?);
            let (l2, c2) = (a.end(3)?, a.end(4)?);
            let undoable = a.opt_bool(5, true)?;
            actions.view_delete(
                id,
                l1,
                c1,
                l2.unwrap_or(usize::MAX),
                c2.unwrap_or(usize::MAX),
                undoable,
            );
            none()
        }
        "view_delete_cur" => {
            actions.view_delete_cur(a.view(0)?);
            none()
        }
        "view_insert" => {
            let (id, line, col, text) = (a.view(0)?, a.at(1)?, a.at(2)?, a.str(3)?);
            let undoable = a.opt_bool(4, true)?;
            actions.view_insert(id, line, col, text, undoable);
            none()
        }
        "view_insert_cur" => {
            let (id, text) = (a.view(0)?, a.str(1)?);
            actions.view_insert_cur(id, text);
            none()
        }
        "view_insert_new_line" => {
            actions.view_insert_new_line(a.view(0)?);
            none()
        }
        "view_move_cursor" => {
            let (id, dy, dx) = (a.view(0)?, a.delta(1)?, a.delta(2)?);
            actions.view_move_cursor(id, dy, dx);
            none()
        }
        "view_move_cursor_roll" => {
            let (id, dy, dx) = (a.view(0)?, a.delta(1)?, a.delta(2)?);
            actions.view_move_cursor_roll(id, dy, dx);
            none()
        }
        "view_open_selection" => {
            let id = a.view(0)?;
            let new_view = a.opt_bool(1, false)?;
            actions.view_open_selection(id, new_view);
            none()
        }
        "view_paste" => {
            actions.view_paste(a.view(0)?);
            none()
        }
        "view_redo" => {
            actions.view_redo(a.view(0)?);
            none()
        }
        "view_reload" => {
            actions.view_reload(a.view(0)?);
            none()
        }
        "view_render" => {
            actions.view_render(a.view(0)?);
            none()
        }
        "view_save" => {
            actions.view_save(a.view(0)?);
            none()
        }
        "view_select_all" => {
            actions.view_select_all(a.view(0)?);
            none()
        }
        "view_set_bounds" => {
            let id = a.view(0)?;
            let bounds = Bounds::new(a.pos(1)?, a.pos(2)?, a.pos(3)?, a.pos(4)?);
            actions.view_set_bounds(id, bounds);
            none()
        }
        "view_set_cursor_pos" => {
            let (id, line, col) = (a.view(0)?, a.pos(1)?, a.pos(2)?);
            actions.view_set_cursor_pos(id, line, col);
            none()
        }
        "view_set_dirty" => {
            let (id, on) = (a.view(0)?, a.bool(1)?);
            actions.view_set_dirty(id, on);
            none()
        }
        "view_set_title" => {
            let (id, title) = (a.view(0)?, a.str(1)?);
            actions.view_set_title(id, title);
            none()
        }
        "view_set_work_dir" => {
            let (id, dir) = (a.view(0)?, a.str(1)?);
            actions.view_set_work_dir(id, dir);
            none()
        }
        "view_stretch_selection" => {
            let (id, line, col) = (a.view(0)?, a.pos(1)?, a.pos(2)?);
            actions.view_stretch_selection(id, line, col);
            none()
        }
        "view_undo" => {
            actions.view_undo(a.view(0)?);
            none()
        }

        // ---- view queries -------------------------------------------------
        "view_bounds" => {
            let b = actions.view_bounds(a.view(0)?);
            vec![b.y1, b.x1, b.y2, b.x2]
                .into_iter()
                .map(|n| n.to_string())
                .collect()
        }
        "view_cols" => one(actions.view_cols(a.view(0)?)),
        "view_cursor_coords" => {
            let (y, x) = actions.view_cursor_coords(a.view(0)?);
            pair(y, x)
        }
        "view_cursor_pos" => {
            let pos = actions.view_cursor_pos(a.view(0)?);
            pair(pos.line, pos.col)
        }
        "view_dirty" => one(actions.view_dirty(a.view(0)?)),
        "view_line_count" => one(actions.view_line_count(a.view(0)?)),
        "view_rows" => one(actions.view_rows(a.view(0)?)),
        "view_scroll_pos" => {
            let (line, col) = actions.view_scroll_pos(a.view(0)?);
            pair(line, col)
        }
        "view_selections" => actions
            .view_selections(a.view(0)?)
            .iter()
            .map(ToString::to_string)
            .collect(),
        "view_src_loc" => one(
            actions
                .view_src_loc(a.view(0)?)
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        ),
        "view_text" => {
            let (id, l1, c1) = (a.view(0)?, a.pos(1)?, a.pos(2)?);
            let (l2, c2) = (a.end(3)?, a.end(4)?);
            actions.view_text(id, l1, c1, l2, c2)
        }
        "view_text_pos" => {
            let (id, y, x) = (a.view(0)?, a.pos(1)?, a.pos(2)?);
            let pos = actions.view_text_pos(id, y, x);
            pair(pos.line, pos.col)
        }
        "view_title" => one(actions.view_title(a.view(0)?)),
        "view_work_dir" => one(actions.view_work_dir(a.view(0)?).display()),
        _ => return Err(ApiError::UnknownAction(name.to_string())),
    };
    Ok(out)
}
