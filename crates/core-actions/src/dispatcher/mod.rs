//! Executor side of [`Action`]: the bus hands every action to
//! [`Runnable::run`], which routes it to one of the sub-modules:
//! * `editor` - editor-wide operations (open, views, status, auto-scroll)
//! * `view`   - mutations of a single view
//! * `query`  - read-only answers about a single view
//!
//! Operations naming a view that does not exist are dropped. Their reply path
//! goes with them, so query callers read zero values.

use anyhow::Result;
use core_events::Runnable;
use tracing::trace;

use crate::{Action, Session};

mod editor;
mod query;
mod view;

impl Runnable<Session> for Action {
    fn name(&self) -> &'static str {
        Action::name(self)
    }

    fn run(self, session: &mut Session) -> Result<()> {
        trace!(target: "actions.dispatch", action = self.name(), "run");
        match self {
            Action::Ed(action) => editor::handle(action, session),
            Action::View(id, action) => view::handle(id, action, session),
            Action::Query(id, query) => {
                query::answer(id, query, session.editor());
                Ok(())
            }
        }
    }
}
