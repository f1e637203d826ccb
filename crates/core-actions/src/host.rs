//! Command backends talk back to their view through the bus.

use std::path::PathBuf;

use core_backend::CmdHost;
use core_events::BusHandle;
use core_model::{RenderTarget, ViewId};
use tracing::trace;

use crate::{Action, EdAction, ViewAction, ViewQuery};

/// [`CmdHost`] bound to one view. Every callback becomes an ordinary action,
/// so command threads never touch editor state directly.
#[derive(Debug, Clone)]
pub struct BusCmdHost {
    bus: BusHandle<Action>,
    view: ViewId,
}

impl BusCmdHost {
    pub fn new(bus: BusHandle<Action>, view: ViewId) -> Self {
        Self { bus, view }
    }

    fn view_action(&self, action: ViewAction) {
        if !self.bus.dispatch(Action::View(self.view, action)) {
            trace!(target: "actions.host", view = %self.view, "bus_closed");
        }
    }
}

impl CmdHost for BusCmdHost {
    fn set_title(&self, title: String) {
        self.view_action(ViewAction::SetTitle(title));
    }

    fn set_work_dir(&self, dir: PathBuf) {
        self.view_action(ViewAction::SetWorkDir(dir));
    }

    fn status_err(&self, msg: String) {
        self.bus.dispatch(Action::Ed(EdAction::SetStatusErr(msg)));
    }

    fn cursor_to(&self, line: usize, col: usize) {
        self.view_action(ViewAction::SetCursorPos { line, col });
    }

    fn scroll_top(&self) {
        self.view_action(ViewAction::SetCursorPos { line: 1, col: 1 });
    }

    fn render(&self) {
        self.bus
            .dispatch(Action::Ed(EdAction::Render(RenderTarget::View(self.view))));
    }

    fn view_size(&self) -> Option<(usize, usize)> {
        self.bus
            .query(|reply| Action::Query(self.view, ViewQuery::TextSize(reply)))
    }

    fn is_current(&self) -> bool {
        self.bus
            .query(|reply| Action::Ed(EdAction::CurView(reply)))
            .flatten()
            == Some(self.view)
    }
}
