use core_model::{Editor, ViewId};
use tracing::trace;

use crate::ViewQuery;

/// Answer `query` about view `id`. Unknown views drop the reply.
pub(super) fn answer(id: ViewId, query: ViewQuery, editor: &Editor) {
    let Some(view) = editor.view(id) else {
        trace!(target: "actions.dispatch", view = %id, query = query.name(), "unknown_view");
        return;
    };
    // a caller that stopped waiting is not an error
    let _ = match query {
        ViewQuery::Bounds(reply) => reply.send(view.bounds()).is_ok(),
        ViewQuery::Cols(reply) => reply.send(view.cols()).is_ok(),
        ViewQuery::CursorCoords(reply) => reply.send(view.cursor_coords()).is_ok(),
        ViewQuery::CursorPos(reply) => reply.send(view.cursor()).is_ok(),
        ViewQuery::Dirty(reply) => reply.send(view.dirty()).is_ok(),
        ViewQuery::LineCount(reply) => reply.send(view.line_count()).is_ok(),
        ViewQuery::Rows(reply) => reply.send(view.rows()).is_ok(),
        ViewQuery::ScrollPos(reply) => reply.send(view.scroll_pos()).is_ok(),
        ViewQuery::Selections(reply) => reply.send(view.selections().to_vec()).is_ok(),
        ViewQuery::SrcLoc(reply) => reply.send(view.src_loc()).is_ok(),
        ViewQuery::Text {
            line1,
            col1,
            line2,
            col2,
            reply,
        } => reply.send(view.text(line1, col1, line2, col2)).is_ok(),
        ViewQuery::TextSize(reply) => reply.send((view.rows(), view.cols())).is_ok(),
        ViewQuery::TextPos { y, x, reply } => reply.send(view.text_pos(y, x)).is_ok(),
        ViewQuery::Title(reply) => reply.send(view.title().to_string()).is_ok(),
        ViewQuery::UndoDepth(reply) => reply.send((view.undo_depth(), view.redo_depth())).is_ok(),
        ViewQuery::WorkDir(reply) => reply.send(view.work_dir().to_path_buf()).is_ok(),
    };
}
