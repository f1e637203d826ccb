//! Running editor: the executor thread, the background event sources and
//! the client facade wired together.

use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use core_config::Config;
use core_events::{ActionBus, EventSourceRegistry, TickEventSource};
use core_model::Editor;
use tokio::runtime::Runtime;
use tracing::info;

use crate::{Action, Actions, EdAction, Session};

pub struct Workspace {
    actions: Actions,
    executor: JoinHandle<Session>,
    runtime: Runtime,
    sources: Vec<tokio::task::JoinHandle<()>>,
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("actions", &self.actions)
            .field("sources", &self.sources.len())
            .finish()
    }
}

impl Workspace {
    /// Start with a fresh editor built from `config`.
    pub fn start(config: Config) -> Result<Self> {
        Self::start_with(Editor::new(config))
    }

    /// Start the executor over `editor` plus the auto-scroll ticker.
    pub fn start_with(editor: Editor) -> Result<Self> {
        // a zero period would make the ticker panic
        let interval = Duration::from_millis(editor.config().autoscroll().interval_ms.max(1));
        let (bus, executor) = ActionBus::new::<Action>();
        let session = Session::new(editor, bus.clone());
        let executor = executor
            .spawn(session)
            .context("spawning action executor")?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("event-sources")
            .enable_time()
            .build()
            .context("building event source runtime")?;
        let mut registry = EventSourceRegistry::new();
        registry.register(TickEventSource::new("auto_scroll", interval, || {
            Action::Ed(EdAction::AutoScrollTick)
        }));
        let sources = {
            let _guard = runtime.enter();
            registry.spawn_all(&bus)
        };
        info!(target: "actions.workspace", interval_ms = interval.as_millis() as u64, "started");
        Ok(Self {
            actions: Actions::new(bus),
            executor,
            runtime,
            sources,
        })
    }

    pub fn actions(&self) -> &Actions {
        &self.actions
    }

    /// Stop after the queued actions, close every backend and hand the
    /// editor back.
    pub fn shutdown(self) -> Result<Editor> {
        let Workspace {
            actions,
            executor,
            runtime,
            sources,
        } = self;
        actions.bus().shutdown();
        for source in &sources {
            source.abort();
        }
        runtime.shutdown_background();
        let session = executor
            .join()
            .map_err(|_| anyhow!("action executor panicked"))?;
        let mut editor = session.into_editor();
        editor.close_all();
        info!(target: "actions.workspace", "stopped");
        Ok(editor)
    }
}
