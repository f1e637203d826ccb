#![cfg(unix)]

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use core_backend::{Backend, BackendError, CmdBackend, CmdHost, CmdOptions, CmdSpec, Lifecycle};
use parking_lot::Mutex;

#[derive(Default)]
struct RecordingHost {
    titles: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
    work_dirs: Mutex<Vec<PathBuf>>,
    scroll_tops: AtomicUsize,
    renders: AtomicUsize,
}

impl CmdHost for RecordingHost {
    fn set_title(&self, title: String) {
        self.titles.lock().push(title);
    }
    fn set_work_dir(&self, dir: PathBuf) {
        self.work_dirs.lock().push(dir);
    }
    fn status_err(&self, msg: String) {
        self.errors.lock().push(msg);
    }
    fn cursor_to(&self, _line: usize, _col: usize) {}
    fn scroll_top(&self) {
        self.scroll_tops.fetch_add(1, Ordering::SeqCst);
    }
    fn render(&self) {
        self.renders.fetch_add(1, Ordering::SeqCst);
    }
    fn view_size(&self) -> Option<(usize, usize)> {
        Some((24, 80))
    }
    fn is_current(&self) -> bool {
        true
    }
}

const DEADLINE: Duration = Duration::from_secs(10);

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn start(list: &[&str], opts: CmdOptions) -> (CmdBackend, Arc<RecordingHost>) {
    let host = Arc::new(RecordingHost::default());
    let spec = CmdSpec::new(args(list), std::env::temp_dir());
    let b = CmdBackend::start(spec, opts, host.clone()).unwrap();
    (b, host)
}

fn lines(b: &CmdBackend) -> Vec<String> {
    b.slice(1, 1, None, None).to_strings()
}

fn wait_for_output(b: &CmdBackend, needle: &str) -> bool {
    let end = Instant::now() + DEADLINE;
    while Instant::now() < end {
        if lines(b).iter().any(|l| l.contains(needle)) {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    false
}

#[test]
fn echo_output_lands_in_buffer_and_title_reverts() {
    let (b, host) = start(&["echo", "hello"], CmdOptions::default());
    assert!(b.wait_stopped(DEADLINE));
    assert!(wait_for_output(&b, "hello"));
    assert_eq!(lines(&b)[0], "hello");
    assert_eq!(b.lifecycle(), Lifecycle::Stopped);
    assert!(!b.running());
    let titles = host.titles.lock().clone();
    assert_eq!(titles.first().map(String::as_str), Some("[RUNNING] echo hello"));
    assert_eq!(titles.last().map(String::as_str), Some("echo hello"));
    assert!(host.errors.lock().is_empty());
}

#[test]
fn child_sees_term_and_id_variables() {
    let host = Arc::new(RecordingHost::default());
    let mut spec = CmdSpec::new(
        args(&["sh", "-c", "printf '%s %s %s\\n' \"$TERM\" \"$PANED_VIEW\" \"$PANED_INSTANCE\""]),
        std::env::temp_dir(),
    );
    spec.view_id = 7;
    spec.instance_id = 3;
    let b = CmdBackend::start(spec, CmdOptions::default(), host).unwrap();
    assert!(wait_for_output(&b, "vt100 7 3"));
}

#[test]
fn kill_is_idempotent_and_stops_process() {
    let (b, host) = start(&["sleep", "30"], CmdOptions::default());
    assert!(b.wait_running(DEADLINE));
    assert!(b.running());
    assert!(b.pid().is_some());
    b.kill();
    b.kill();
    assert!(b.wait_stopped(DEADLINE));
    assert_eq!(b.lifecycle(), Lifecycle::Stopped);
    let last = host.titles.lock().last().cloned();
    assert_eq!(last.as_deref(), Some("sleep 30"));
    assert!(host.errors.lock().is_empty());
    b.close().unwrap();
}

#[test]
fn non_zero_exit_is_a_stop() {
    let (b, host) = start(&["sh", "-c", "echo hi; exit 3"], CmdOptions::default());
    assert!(b.wait_stopped(DEADLINE));
    assert_eq!(b.lifecycle(), Lifecycle::Stopped);
    assert!(b.wait_running(DEADLINE));
    assert!(wait_for_output(&b, "hi"));
    assert!(host.errors.lock().is_empty());
    let last = host.titles.lock().last().cloned();
    assert_eq!(last.as_deref(), Some("sh -c echo hi; exit 3"));
}

#[test]
fn output_cursor_follows_written_lines() {
    let (b, _host) = start(&["printf", "one\ntwo"], CmdOptions::default());
    assert!(b.wait_stopped(DEADLINE));
    assert!(wait_for_output(&b, "two"));
    assert_eq!(b.output_cursor(), (2, 4));
}

#[test]
fn spawn_failure_is_reported() {
    let (b, host) = start(&["/definitely/not/a/real/program"], CmdOptions::default());
    assert!(!b.wait_running(DEADLINE));
    assert_eq!(b.lifecycle(), Lifecycle::Failed);
    assert!(b.wait_stopped(DEADLINE));
    assert_eq!(host.errors.lock().len(), 1);
    let last = host.titles.lock().last().cloned();
    assert_eq!(last.as_deref(), Some("[FAILED] /definitely/not/a/real/program"));
}

#[test]
fn insert_forwards_to_process_input() {
    let (b, _host) = start(&["cat"], CmdOptions::default());
    assert!(b.wait_running(DEADLINE));
    b.insert(1, 1, "ping\n").unwrap();
    assert!(wait_for_output(&b, "ping"));
    b.send_bytes(&[0x04]).unwrap();
    assert!(b.wait_stopped(DEADLINE));
}

#[test]
fn buffer_mutations_are_unsupported() {
    let (b, _host) = start(&["true"], CmdOptions::default());
    assert!(matches!(b.remove(1, 1, 1, 1), Err(BackendError::Unsupported("remove"))));
    assert!(matches!(b.append("x"), Err(BackendError::Unsupported("append"))));
    assert!(matches!(
        b.save(&std::env::temp_dir().join("never-written")),
        Err(BackendError::Unsupported("save"))
    ));
    assert_eq!(b.src_loc(), None);
    assert!(b.wait_stopped(DEADLINE));
}

#[test]
fn long_output_is_capped_by_ring() {
    let opts = CmdOptions {
        max_rows: 10,
        ..CmdOptions::default()
    };
    let (b, _host) = start(
        &["sh", "-c", "i=0; while [ $i -lt 50 ]; do echo line$i; i=$((i+1)); done"],
        opts,
    );
    assert!(b.wait_stopped(DEADLINE));
    assert!(wait_for_output(&b, "line49"));
    let out = lines(&b);
    assert!(out.len() <= 10);
    assert!(!out.iter().any(|l| l == "line0"));
    assert!(b.head() > 0);
    assert!(b.line_count() <= 10);
}

#[test]
fn reload_wipes_and_restarts() {
    let (b, host) = start(&["echo", "again"], CmdOptions::default());
    assert!(b.wait_stopped(DEADLINE));
    assert!(wait_for_output(&b, "again"));
    b.reload().unwrap();
    assert!(b.wait_stopped(DEADLINE));
    assert!(wait_for_output(&b, "again"));
    let count = lines(&b).iter().filter(|l| l.contains("again")).count();
    assert_eq!(count, 1);
    let running = host
        .titles
        .lock()
        .iter()
        .filter(|t| t.starts_with("[RUNNING]"))
        .count();
    assert_eq!(running, 2);
}
