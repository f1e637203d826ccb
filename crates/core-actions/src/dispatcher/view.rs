use anyhow::{Context, Result};
use core_model::{Editor, Location, RenderTarget, View, ViewId};
use tracing::{debug, info};

use crate::{Session, ViewAction};

pub(super) fn handle(id: ViewId, action: ViewAction, session: &mut Session) -> Result<()> {
    if session.editor().view(id).is_none() {
        debug!(target: "actions.dispatch", view = %id, action = action.name(), "unknown_view");
        return Ok(());
    }
    match action {
        ViewAction::OpenSelection { new_view } => open_selection(session, id, new_view),
        action => {
            let editor = session.editor_mut();
            apply(editor, id, action)?;
            editor.render(RenderTarget::View(id));
            Ok(())
        }
    }
}

fn view_mut(editor: &mut Editor, id: ViewId) -> Result<&mut View> {
    editor
        .view_mut(id)
        .with_context(|| format!("no such view: {id}"))
}

fn apply(editor: &mut Editor, id: ViewId, action: ViewAction) -> Result<()> {
    match action {
        ViewAction::Copy => {
            let text = view_mut(editor, id)?.copy_text();
            editor.clipboard_write(&text);
        }
        ViewAction::Cut => {
            let text = view_mut(editor, id)?.cut()?;
            editor.clipboard_write(&text);
        }
        ViewAction::Paste => {
            if let Some(text) = editor.clipboard_read() {
                view_mut(editor, id)?.paste(&text)?;
            }
        }
        ViewAction::Save => {
            let path = view_mut(editor, id)?.save().context("saving failed")?;
            info!(target: "io", view = %id, path = %path.display(), "view_saved");
            editor.set_status(format!("saved {}", path.display()));
        }
        ViewAction::Reload => {
            view_mut(editor, id)?.reload().context("reload failed")?;
        }
        action => apply_view(view_mut(editor, id)?, action)?,
    }
    Ok(())
}

fn apply_view(view: &mut View, action: ViewAction) -> Result<()> {
    match action {
        ViewAction::AddSelection {
            line1,
            col1,
            line2,
            col2,
        } => view.add_selection(line1, col1, line2, col2),
        ViewAction::AutoScroll { dy, dx, on } => view.set_auto_scroll(dy, dx, on),
        ViewAction::Backspace => view.backspace()?,
        ViewAction::ClearSelections => view.clear_selections(),
        ViewAction::CmdStop => {
            if let Some(cmd) = view.backend().as_command() {
                cmd.kill();
            }
        }
        ViewAction::CursorMvmt(mvmt) => view.cursor_mvmt(mvmt),
        ViewAction::Delete {
            line1,
            col1,
            line2,
            col2,
            undoable,
        } => view.delete(line1, col1, line2, col2, undoable)?,
        ViewAction::DeleteCur => view.delete_cur()?,
        ViewAction::Insert {
            line,
            col,
            text,
            undoable,
        } => view.insert(line, col, &text, undoable)?,
        ViewAction::InsertCur(text) => view.insert_cur(&text)?,
        ViewAction::InsertNewLine => view.insert_new_line()?,
        ViewAction::MoveCursor { dy, dx } => view.move_cursor(dy, dx),
        ViewAction::MoveCursorRoll { dy, dx } => view.move_cursor_roll(dy, dx),
        ViewAction::Redo => {
            view.redo()?;
        }
        ViewAction::Undo => {
            view.undo()?;
        }
        ViewAction::SelectAll => view.select_all(),
        ViewAction::SetBounds(bounds) => view.set_bounds(bounds),
        ViewAction::SetCursorPos { line, col } => {
            view.set_cursor_pos(line, col);
        }
        ViewAction::SetDirty(on) => view.set_dirty(on),
        ViewAction::SetTitle(title) => view.set_title(title),
        ViewAction::SetWorkDir(dir) => view.set_work_dir(dir),
        ViewAction::StretchSelection {
            prev_line,
            prev_col,
        } => view.stretch_selection(prev_line, prev_col),
        // editor-level variants are handled by the callers
        ViewAction::Copy
        | ViewAction::Cut
        | ViewAction::Paste
        | ViewAction::Save
        | ViewAction::Reload
        | ViewAction::Render
        | ViewAction::OpenSelection { .. } => {}
    }
    Ok(())
}

/// Open the `path[:line[:col]]` under the primary selection or the cursor.
fn open_selection(session: &mut Session, id: ViewId, new_view: bool) -> Result<()> {
    let Some((target, rel)) = session
        .editor()
        .view(id)
        .map(|v| (v.selection_target(), v.work_dir().to_path_buf()))
    else {
        return Ok(());
    };
    let Some(target) = target else {
        debug!(target: "actions.dispatch", view = %id, "nothing_to_open");
        return Ok(());
    };
    let Some(loc) = Location::parse(&target) else {
        session
            .editor_mut()
            .set_status_err(format!("not a location: {target}"));
        return Ok(());
    };
    let into = if new_view { None } else { Some(id) };
    let path = loc.resolve(&rel);
    let opened = super::editor::open(session, &path.to_string_lossy(), into, &rel, false)?;
    if let Some(line) = loc.line
        && let Some(view) = session.editor_mut().view_mut(opened)
    {
        view.set_cursor_pos(line, loc.col.unwrap_or(1));
    }
    session.editor_mut().activate_view(opened);
    Ok(())
}
