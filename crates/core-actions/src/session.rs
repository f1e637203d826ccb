use std::sync::Arc;
use std::time::Duration;

use core_backend::{CmdHost, CmdOptions};
use core_events::{BusContext, BusHandle};
use core_model::{Editor, ViewId};

use crate::Action;
use crate::host::BusCmdHost;

/// What actions run against: the editor plus a handle back into the bus for
/// the background producers an action may start.
#[derive(Debug)]
pub struct Session {
    editor: Editor,
    bus: BusHandle<Action>,
}

impl Session {
    pub fn new(editor: Editor, bus: BusHandle<Action>) -> Self {
        Self { editor, bus }
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut Editor {
        &mut self.editor
    }

    pub fn into_editor(self) -> Editor {
        self.editor
    }

    /// Host callbacks for a command running in view `id`.
    pub(crate) fn cmd_host(&self, id: ViewId) -> Arc<dyn CmdHost> {
        Arc::new(BusCmdHost::new(self.bus.clone(), id))
    }

    pub(crate) fn cmd_options(&self) -> CmdOptions {
        let cfg = self.editor.config().command();
        CmdOptions {
            max_rows: cfg.max_rows,
            refresh: Duration::from_millis(cfg.refresh_ms),
            term: cfg.term.clone(),
            env_prefix: cfg.env_prefix.clone(),
        }
    }
}

impl BusContext for Session {
    fn report_error(&mut self, action: &'static str, err: &anyhow::Error) {
        self.editor.report_error(action, err);
    }
}
