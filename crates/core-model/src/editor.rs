//! The editor context every action runs against.
//!
//! `Editor` owns all views (keyed by id), the status line, the clipboard and
//! the render sink. It lives on the executor thread; nothing else touches it.

use std::collections::BTreeMap;

use core_backend::Backend;
use core_config::Config;
use core_events::BusContext;
use core_text::Translator;
use tracing::{debug, info, trace, warn};

use crate::{View, ViewId};

/// System clipboard seam.
pub trait Clipboard: Send {
    fn read(&mut self) -> Option<String>;
    fn write(&mut self, text: &str);
}

/// Process-local clipboard.
#[derive(Debug, Default)]
pub struct MemClipboard {
    text: Option<String>,
}

impl Clipboard for MemClipboard {
    fn read(&mut self) -> Option<String> {
        self.text.clone()
    }
    fn write(&mut self, text: &str) {
        self.text = Some(text.to_string());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderTarget {
    All,
    View(ViewId),
    Status,
}

/// Receives redraw requests. Drawing happens elsewhere; implementations read
/// what they need through queries.
pub trait RenderSink: Send {
    fn request(&mut self, target: RenderTarget);
}

#[derive(Debug, Default)]
pub struct NullRenderer;

impl RenderSink for NullRenderer {
    fn request(&mut self, target: RenderTarget) {
        trace!(target: "render", ?target, "render_requested");
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Status {
    pub msg: String,
    pub is_err: bool,
}

pub struct Editor {
    views: BTreeMap<ViewId, View>,
    current: Option<ViewId>,
    next_id: u64,
    status: Status,
    clipboard: Box<dyn Clipboard>,
    renderer: Box<dyn RenderSink>,
    config: Config,
    instance_id: u64,
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("views", &self.views.keys().collect::<Vec<_>>())
            .field("current", &self.current)
            .field("status", &self.status)
            .field("instance_id", &self.instance_id)
            .finish()
    }
}

impl Editor {
    pub fn new(config: Config) -> Self {
        Self {
            views: BTreeMap::new(),
            current: None,
            next_id: 1,
            status: Status::default(),
            clipboard: Box::new(MemClipboard::default()),
            renderer: Box::new(NullRenderer),
            config,
            instance_id: u64::from(std::process::id()),
        }
    }

    pub fn with_clipboard(mut self, clipboard: Box<dyn Clipboard>) -> Self {
        self.clipboard = clipboard;
        self
    }

    pub fn with_renderer(mut self, renderer: Box<dyn RenderSink>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_instance_id(mut self, id: u64) -> Self {
        self.instance_id = id;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn instance_id(&self) -> u64 {
        self.instance_id
    }

    pub fn translator(&self) -> Translator {
        Translator::new(self.config.editor().tab_width)
    }

    // ---- views ------------------------------------------------------------

    /// Hand out the next view id. Ids are never reused.
    pub fn reserve_id(&mut self) -> ViewId {
        let id = ViewId(self.next_id);
        self.next_id += 1;
        id
    }

    /// A detached view configured from the editor settings.
    pub fn build_view(&self, id: ViewId, backend: Box<dyn Backend>) -> View {
        View::new(
            id,
            backend,
            self.translator(),
            self.config.editor().undo_limit,
        )
    }

    /// Register `view`; the first view becomes current.
    pub fn insert_view(&mut self, view: View) -> ViewId {
        let id = view.id();
        self.views.insert(id, view);
        if self.current.is_none() {
            self.current = Some(id);
        }
        info!(target: "view", view = %id, count = self.views.len(), "view_added");
        id
    }

    pub fn new_view(&mut self, backend: Box<dyn Backend>) -> ViewId {
        let id = self.reserve_id();
        let view = self.build_view(id, backend);
        self.insert_view(view)
    }

    /// Remove a view and close its backend.
    pub fn remove_view(&mut self, id: ViewId) -> Option<View> {
        let mut view = self.views.remove(&id)?;
        view.close();
        if self.current == Some(id) {
            self.current = self.views.keys().next_back().copied();
        }
        info!(target: "view", view = %id, count = self.views.len(), "view_removed");
        Some(view)
    }

    pub fn view(&self, id: ViewId) -> Option<&View> {
        self.views.get(&id)
    }

    pub fn view_mut(&mut self, id: ViewId) -> Option<&mut View> {
        self.views.get_mut(&id)
    }

    pub fn view_ids(&self) -> Vec<ViewId> {
        self.views.keys().copied().collect()
    }

    pub fn cur_view(&self) -> Option<ViewId> {
        self.current
    }

    pub fn cur_view_mut(&mut self) -> Option<&mut View> {
        let id = self.current?;
        self.views.get_mut(&id)
    }

    /// Make `id` current. Unknown ids are ignored.
    pub fn activate_view(&mut self, id: ViewId) -> bool {
        let Some(view) = self.views.get(&id) else {
            return false;
        };
        view.backend().on_activate();
        self.current = Some(id);
        debug!(target: "view", view = %id, "view_activated");
        true
    }

    /// Whether every view may close without confirmation.
    pub fn quit_check(&self) -> bool {
        self.views.values().all(View::can_close)
    }

    /// Close every backend (subprocesses included).
    pub fn close_all(&mut self) {
        for view in self.views.values_mut() {
            view.close();
        }
    }

    // ---- status / clipboard / render -------------------------------------

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status = Status {
            msg: msg.into(),
            is_err: false,
        };
        self.renderer.request(RenderTarget::Status);
    }

    pub fn set_status_err(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        debug!(target: "view", %msg, "status_error");
        self.status = Status { msg, is_err: true };
        self.renderer.request(RenderTarget::Status);
    }

    pub fn clipboard_read(&mut self) -> Option<String> {
        self.clipboard.read()
    }

    pub fn clipboard_write(&mut self, text: &str) {
        self.clipboard.write(text);
    }

    pub fn render(&mut self, target: RenderTarget) {
        self.renderer.request(target);
    }
}

impl BusContext for Editor {
    fn report_error(&mut self, action: &'static str, err: &anyhow::Error) {
        warn!(target: "view", action, error = %err, "action_error");
        self.set_status_err(format!("{err:#}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_backend::MemBackend;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<RenderTarget>>>);

    impl RenderSink for Recorder {
        fn request(&mut self, target: RenderTarget) {
            self.0.lock().unwrap().push(target);
        }
    }

    fn mem(text: &str) -> Box<dyn Backend> {
        Box::new(MemBackend::from_text(text))
    }

    #[test]
    fn first_view_becomes_current_and_removal_moves_focus() {
        let mut ed = Editor::new(Config::default());
        let a = ed.new_view(mem("a"));
        let b = ed.new_view(mem("b"));
        assert_eq!(ed.cur_view(), Some(a));
        assert!(ed.activate_view(b));
        ed.remove_view(b);
        assert_eq!(ed.cur_view(), Some(a));
        assert_eq!(ed.view_ids(), vec![a]);
        assert!(!ed.activate_view(b));
    }

    #[test]
    fn ids_are_not_reused() {
        let mut ed = Editor::new(Config::default());
        let a = ed.new_view(mem(""));
        ed.remove_view(a);
        let b = ed.new_view(mem(""));
        assert!(b > a);
    }

    #[test]
    fn quit_check_sees_dirty_views() {
        let mut ed = Editor::new(Config::default());
        let a = ed.new_view(mem("x"));
        assert!(ed.quit_check());
        ed.view_mut(a).unwrap().set_dirty(true);
        assert!(!ed.quit_check());
    }

    #[test]
    fn report_error_lands_on_status_line() {
        let rec = Recorder::default();
        let mut ed = Editor::new(Config::default()).with_renderer(Box::new(rec.clone()));
        let err = anyhow::anyhow!("disk full").context("Saving Failed");
        ed.report_error("view_save", &err);
        assert!(ed.status().is_err);
        assert_eq!(ed.status().msg, "Saving Failed: disk full");
        assert_eq!(rec.0.lock().unwrap().as_slice(), &[RenderTarget::Status]);
    }

    #[test]
    fn clipboard_round_trip() {
        let mut ed = Editor::new(Config::default());
        assert_eq!(ed.clipboard_read(), None);
        ed.clipboard_write("FUZZ");
        assert_eq!(ed.clipboard_read().as_deref(), Some("FUZZ"));
    }
}
