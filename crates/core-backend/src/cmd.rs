//! Command output backend.
//!
//! A subprocess runs on a pseudo-terminal; its output is fed through the
//! [`Terminal`] interpreter into a bounded [`Screen`] ring. Three threads
//! belong to a running command:
//!
//! * the supervisor spawns the process, waits for it and reports lifecycle
//!   transitions to the [`CmdHost`];
//! * the reader copies pty output into the interpreter;
//! * the refresher wakes every `refresh` interval, turns pending output into a
//!   single cursor update plus render request, and resizes the pty when the
//!   pane size changed.
//!
//! The host is only ever called with the state lock released.

use std::io::{Read, Write};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use core_text::Slice;
use crossbeam_channel::{RecvTimeoutError, Sender, bounded};
use parking_lot::Mutex;
use portable_pty::{Child, ChildKiller, CommandBuilder, MasterPty, NativePtySystem, PtySize, PtySystem};
use tracing::{debug, error, info, trace, warn};

use crate::term::{CellStyle, Screen, Terminal};
use crate::{Backend, BackendError};

const WAIT_POLL: Duration = Duration::from_millis(10);
const DEFAULT_SIZE: (usize, usize) = (24, 80);

/// Callbacks into the editor owning the command view. Implementations are
/// bound to one view.
pub trait CmdHost: Send + Sync {
    fn set_title(&self, title: String);
    fn set_work_dir(&self, dir: PathBuf);
    fn status_err(&self, msg: String);
    /// Place the view cursor (1-based) when the view is the current one.
    fn cursor_to(&self, line: usize, col: usize);
    fn scroll_top(&self);
    fn render(&self);
    /// Text area (rows, cols) of the view, `None` when it is gone.
    fn view_size(&self) -> Option<(usize, usize)>;
    fn is_current(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Created,
    Starting,
    Running,
    Stopped,
    Failed,
}

/// What to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmdSpec {
    pub args: Vec<String>,
    pub dir: PathBuf,
    /// Shown as the view title; defaults to the joined arguments.
    pub title: Option<String>,
    /// Move the view cursor to the top once the command is done.
    pub scroll_top: bool,
    pub instance_id: u64,
    pub view_id: u64,
}

impl CmdSpec {
    pub fn new(args: Vec<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            args,
            dir: dir.into(),
            title: None,
            scroll_top: false,
            instance_id: 0,
            view_id: 0,
        }
    }

    pub fn title(&self) -> String {
        self.title.clone().unwrap_or_else(|| self.args.join(" "))
    }
}

/// Tunables, normally taken from the `[command]` config section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmdOptions {
    pub max_rows: usize,
    pub refresh: Duration,
    pub term: String,
    pub env_prefix: String,
}

impl Default for CmdOptions {
    fn default() -> Self {
        Self {
            max_rows: 10_000,
            refresh: Duration::from_millis(50),
            term: "vt100".to_string(),
            env_prefix: "PANED".to_string(),
        }
    }
}

struct CmdState {
    term: Terminal,
    lifecycle: Lifecycle,
    pid: Option<u32>,
    killer: Option<Box<dyn ChildKiller + Send + Sync>>,
    writer: Option<Box<dyn Write + Send>>,
    master: Option<Box<dyn MasterPty + Send>>,
}

struct Shared {
    state: Mutex<CmdState>,
    /// Bumped on every (re)start; threads of an older run stop touching state.
    generation: AtomicU64,
    dirty: AtomicU32,
    refresh_cursor: AtomicU32,
    spec: CmdSpec,
    opts: CmdOptions,
    host: Arc<dyn CmdHost>,
}

impl Shared {
    fn current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }
}

pub struct CmdBackend {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for CmdBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CmdBackend")
            .field("args", &self.shared.spec.args)
            .field("lifecycle", &self.lifecycle())
            .finish()
    }
}

impl CmdBackend {
    /// Create the backend and start the command in the background.
    pub fn start(spec: CmdSpec, opts: CmdOptions, host: Arc<dyn CmdHost>) -> Result<Self, BackendError> {
        if spec.args.is_empty() {
            return Err(BackendError::Spawn("empty command line".to_string()));
        }
        let screen = Screen::new(opts.max_rows, DEFAULT_SIZE.0, DEFAULT_SIZE.1);
        let shared = Arc::new(Shared {
            state: Mutex::new(CmdState {
                term: Terminal::new(screen),
                lifecycle: Lifecycle::Created,
                pid: None,
                killer: None,
                writer: None,
                master: None,
            }),
            generation: AtomicU64::new(0),
            dirty: AtomicU32::new(0),
            refresh_cursor: AtomicU32::new(0),
            spec,
            opts,
            host,
        });
        let backend = Self { shared };
        backend.launch()?;
        Ok(backend)
    }

    fn launch(&self) -> Result<(), BackendError> {
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let shared = Arc::clone(&self.shared);
        thread::Builder::new()
            .name("cmd-supervisor".into())
            .spawn(move || supervise(shared, generation))
            .map(|_| ())
            .map_err(|e| BackendError::Spawn(e.to_string()))
    }

    pub fn spec(&self) -> &CmdSpec {
        &self.shared.spec
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.shared.state.lock().lifecycle
    }

    pub fn running(&self) -> bool {
        self.lifecycle() == Lifecycle::Running
    }

    /// Current ring head.
    pub fn head(&self) -> usize {
        self.shared.state.lock().term.screen().head()
    }

    pub fn pid(&self) -> Option<u32> {
        self.shared.state.lock().pid
    }

    /// Poll every 10ms until the process has been spawned or `deadline`
    /// passes. True once the process started (it may already have exited).
    pub fn wait_running(&self, deadline: Duration) -> bool {
        let end = Instant::now() + deadline;
        loop {
            match self.lifecycle() {
                Lifecycle::Running | Lifecycle::Stopped => return true,
                Lifecycle::Failed => return false,
                Lifecycle::Created | Lifecycle::Starting => {}
            }
            if Instant::now() >= end {
                return false;
            }
            thread::sleep(WAIT_POLL);
        }
    }

    /// Poll until the process is no longer running or `deadline` passes.
    pub fn wait_stopped(&self, deadline: Duration) -> bool {
        let end = Instant::now() + deadline;
        loop {
            if matches!(self.lifecycle(), Lifecycle::Stopped | Lifecycle::Failed) {
                return true;
            }
            if Instant::now() >= end {
                return false;
            }
            thread::sleep(WAIT_POLL);
        }
    }

    /// Whether the process has children of its own (e.g. a shell running a
    /// job). Only answers on Unix, via `pgrep -P`.
    pub fn sub_cmd_running(&self) -> bool {
        sub_cmd_running(&self.shared)
    }

    /// Forward raw bytes to the process input.
    pub fn send_bytes(&self, data: &[u8]) -> Result<(), BackendError> {
        let mut st = self.shared.state.lock();
        let Some(writer) = st.writer.as_mut() else {
            return Err(BackendError::Pty("process is not running".to_string()));
        };
        writer
            .write_all(data)
            .and_then(|_| writer.flush())
            .map_err(|e| BackendError::Pty(e.to_string()))
    }

    /// Send a kill signal. Safe to repeat and never waits for the exit.
    pub fn kill(&self) {
        let mut st = self.shared.state.lock();
        if let Some(mut killer) = st.killer.take() {
            match killer.kill() {
                Ok(()) => info!(target: "backend.cmd", pid = ?st.pid, "killed"),
                Err(e) => debug!(target: "backend.cmd", pid = ?st.pid, error = %e, "kill_failed"),
            }
        }
    }

    /// Current cursor of the output, 1-based.
    pub fn output_cursor(&self) -> (usize, usize) {
        output_cursor(&self.shared)
    }
}

impl Drop for CmdBackend {
    fn drop(&mut self) {
        self.kill();
    }
}

fn output_cursor(shared: &Shared) -> (usize, usize) {
    let (row, col) = shared.state.lock().term.screen().cursor();
    (row + 1, col + 1)
}

fn sub_cmd_running(shared: &Shared) -> bool {
    let pid = {
        let st = shared.state.lock();
        if st.lifecycle != Lifecycle::Running {
            return false;
        }
        st.pid
    };
    let Some(pid) = pid else {
        return false;
    };
    if !cfg!(unix) {
        return false;
    }
    match std::process::Command::new("pgrep")
        .arg("-P")
        .arg(pid.to_string())
        .output()
    {
        Ok(out) => !out.stdout.is_empty(),
        Err(e) => {
            trace!(target: "backend.cmd", error = %e, "pgrep_failed");
            false
        }
    }
}

fn pty_size((rows, cols): (usize, usize)) -> PtySize {
    PtySize {
        rows: rows.clamp(1, u16::MAX as usize) as u16,
        cols: cols.clamp(1, u16::MAX as usize) as u16,
        pixel_width: 0,
        pixel_height: 0,
    }
}

struct Spawned {
    child: Box<dyn Child + Send + Sync>,
    reader: Box<dyn Read + Send>,
}

fn spawn(shared: &Shared, dir: &Path, size: (usize, usize)) -> Result<Spawned, BackendError> {
    let spec = &shared.spec;
    let opts = &shared.opts;
    let pair = NativePtySystem::default()
        .openpty(pty_size(size))
        .map_err(|e| BackendError::Pty(e.to_string()))?;

    let mut cmd = CommandBuilder::new(&spec.args[0]);
    cmd.args(&spec.args[1..]);
    cmd.cwd(dir);
    cmd.env("TERM", &opts.term);
    cmd.env(format!("{}_INSTANCE", opts.env_prefix), spec.instance_id.to_string());
    cmd.env(format!("{}_VIEW", opts.env_prefix), spec.view_id.to_string());

    let child = pair
        .slave
        .spawn_command(cmd)
        .map_err(|e| BackendError::Spawn(e.to_string()))?;
    // Output EOF depends on the slave side being closed here.
    drop(pair.slave);

    let reader = pair
        .master
        .try_clone_reader()
        .map_err(|e| BackendError::Pty(e.to_string()))?;
    let writer = pair
        .master
        .take_writer()
        .map_err(|e| BackendError::Pty(e.to_string()))?;

    let mut st = shared.state.lock();
    st.pid = child.process_id();
    st.killer = Some(child.clone_killer());
    st.writer = Some(writer);
    st.master = Some(pair.master);
    st.term.screen_mut().set_size(size.0, size.1);
    st.lifecycle = Lifecycle::Running;
    Ok(Spawned { child, reader })
}

fn supervise(shared: Arc<Shared>, generation: u64) {
    let title = shared.spec.title();
    let dir = std::path::absolute(&shared.spec.dir).unwrap_or_else(|_| shared.spec.dir.clone());
    {
        let mut st = shared.state.lock();
        st.term.reset();
        st.lifecycle = Lifecycle::Starting;
    }
    shared.host.set_work_dir(dir.clone());
    shared.host.set_title(format!("[RUNNING] {title}"));
    shared.host.render();

    let size = shared.host.view_size().unwrap_or(DEFAULT_SIZE);
    let result = spawn(&shared, &dir, size).and_then(|spawned| run(&shared, generation, spawned));

    if !shared.current(generation) {
        debug!(target: "backend.cmd", generation, "superseded");
        return;
    }
    {
        let mut st = shared.state.lock();
        st.killer = None;
        st.writer = None;
        st.master = None;
    }
    // a kill or a non-zero exit is still a stop
    let outcome = match result {
        Ok(code) => {
            info!(target: "backend.cmd", cmd = %title, code, "stopped");
            shared.host.set_title(title);
            Lifecycle::Stopped
        }
        Err(e) => {
            warn!(target: "backend.cmd", cmd = %title, error = %e, "failed");
            shared.host.status_err(e.to_string());
            shared.host.set_title(format!("[FAILED] {title}"));
            Lifecycle::Failed
        }
    };
    shared.host.set_work_dir(dir);
    if shared.spec.scroll_top {
        shared.host.scroll_top();
    }
    shared.host.render();
    // Published last so waiters observe the host updates above.
    if shared.current(generation) {
        shared.state.lock().lifecycle = outcome;
    }
}

/// Stream output until the process exits and hand back its exit code.
fn run(shared: &Arc<Shared>, generation: u64, spawned: Spawned) -> Result<u32, BackendError> {
    let Spawned { mut child, reader } = spawned;
    info!(target: "backend.cmd", pid = ?child.process_id(), args = ?shared.spec.args, "running");

    let reader_shared = Arc::clone(shared);
    let reader_thread = thread::Builder::new()
        .name("cmd-reader".into())
        .spawn(move || stream(reader_shared, generation, reader))
        .map_err(|e| BackendError::Spawn(e.to_string()))?;

    let (end_tx, end_rx) = bounded::<()>(1);
    let refresher_shared = Arc::clone(shared);
    let refresher = thread::Builder::new()
        .name("cmd-refresher".into())
        .spawn(move || {
            let mut last_size = refresher_shared.host.view_size();
            loop {
                match end_rx.recv_timeout(refresher_shared.opts.refresh) {
                    Err(RecvTimeoutError::Timeout) => {
                        refresh(&refresher_shared, &mut last_size);
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                        refresh(&refresher_shared, &mut last_size);
                        return;
                    }
                }
            }
        })
        .map_err(|e| BackendError::Spawn(e.to_string()));
    let refresher = match refresher {
        Ok(handle) => Some(handle),
        Err(e) => {
            error!(target: "backend.cmd", error = %e, "refresher_spawn_failed");
            None
        }
    };

    let waited = catch_unwind(AssertUnwindSafe(|| child.wait()));
    // Let the reader drain what the process wrote last.
    let drain_end = Instant::now() + shared.opts.refresh;
    while !reader_thread.is_finished() && Instant::now() < drain_end {
        thread::sleep(WAIT_POLL);
    }
    stop_refresher(end_tx, refresher);

    match waited {
        Ok(Ok(status)) => Ok(status.exit_code()),
        Ok(Err(e)) => Err(BackendError::Pty(format!("wait failed: {e}"))),
        Err(panic) => {
            let msg = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!(target: "backend.cmd", %msg, "wait_panicked");
            Err(BackendError::WaitPanicked(msg))
        }
    }
}

fn stop_refresher(end_tx: Sender<()>, refresher: Option<thread::JoinHandle<()>>) {
    let _ = end_tx.send(());
    if let Some(handle) = refresher
        && handle.join().is_err()
    {
        error!(target: "backend.cmd", "refresher_panicked");
    }
}

fn stream(shared: Arc<Shared>, generation: u64, mut reader: Box<dyn Read + Send>) {
    let mut buf = [0u8; 4096];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                if !shared.current(generation) {
                    break;
                }
                shared.state.lock().term.advance(&buf[..n]);
                shared.dirty.fetch_add(1, Ordering::SeqCst);
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                // EIO is the normal end of a pty once the child is gone.
                trace!(target: "backend.cmd", error = %e, "read_end");
                break;
            }
        }
    }
    debug!(target: "backend.cmd", generation, "stream_closed");
}

/// One refresher tick: coalesce pending output into a single render and
/// follow pane resizes.
fn refresh(shared: &Shared, last_size: &mut Option<(usize, usize)>) {
    let dirty = shared.dirty.swap(0, Ordering::SeqCst);
    let activated = shared.refresh_cursor.swap(0, Ordering::SeqCst);
    if dirty > 0 || activated > 0 {
        if shared.host.is_current() {
            let (line, col) = output_cursor(shared);
            shared.host.cursor_to(line, col);
        }
        shared.host.render();
    }

    let size = shared.host.view_size();
    if size != *last_size
        && let Some((rows, cols)) = size
    {
        // pgrep is comparatively expensive, only ask once a resize is seen
        if sub_cmd_running(shared) {
            return;
        }
        *last_size = size;
        let mut st = shared.state.lock();
        st.term.screen_mut().set_size(rows, cols);
        if let Some(master) = st.master.as_ref()
            && let Err(e) = master.resize(pty_size((rows, cols)))
        {
            warn!(target: "backend.cmd", error = %e, "resize_failed");
        }
        drop(st);
        debug!(target: "backend.cmd", rows, cols, "resized");
        shared.host.render();
    }
}

impl Backend for CmdBackend {
    /// Typed text goes to the process, not to the buffer.
    fn insert(&self, _line: usize, _col: usize, text: &str) -> Result<(), BackendError> {
        self.send_bytes(text.as_bytes())
    }

    fn remove(&self, _: usize, _: usize, _: usize, _: usize) -> Result<(), BackendError> {
        Err(BackendError::Unsupported("remove"))
    }

    fn slice(&self, line1: usize, col1: usize, line2: Option<usize>, col2: Option<usize>) -> Slice {
        self.shared.state.lock().term.screen().slice(line1, col1, line2, col2)
    }

    fn append(&self, _text: &str) -> Result<(), BackendError> {
        Err(BackendError::Unsupported("append"))
    }

    fn save(&self, _loc: &Path) -> Result<(), BackendError> {
        Err(BackendError::Unsupported("save"))
    }

    /// Restart the same command line on a wiped ring.
    fn reload(&self) -> Result<(), BackendError> {
        self.kill();
        {
            let mut st = self.shared.state.lock();
            st.term.reset();
            st.lifecycle = Lifecycle::Created;
            st.pid = None;
            st.writer = None;
            st.master = None;
        }
        self.launch()
    }

    fn line_count(&self) -> usize {
        self.shared.state.lock().term.screen().line_count()
    }

    fn src_loc(&self) -> Option<PathBuf> {
        None
    }

    fn close(&self) -> Result<(), BackendError> {
        self.kill();
        Ok(())
    }

    fn style_at(&self, line: usize, col: usize) -> Option<CellStyle> {
        self.shared.state.lock().term.screen().style_at(line, col)
    }

    fn on_activate(&self) {
        self.shared.refresh_cursor.fetch_add(1, Ordering::SeqCst);
    }

    fn as_command(&self) -> Option<&CmdBackend> {
        Some(self)
    }
}
