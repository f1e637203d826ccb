#![allow(dead_code)] // Shared across integration tests; each test binary uses a subset of helpers.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use core_actions::{Actions, Workspace, call};
use core_config::Config;
use core_model::ViewId;
use tempfile::TempDir;

pub const FILE1: &str = "1234567890\n\
\n\
abcdefghijklmnopqrstuvwxyz\n\
ABCDEFGHIJKLMNOPQRSTUVWXYZ\n\
\n\
ξδεφγηιςκλμνοπθρστυωωχψζ\n\
ΑΒΞΔΕΦΓΗΙςΚΛΜΝΟΠΘΡΣΤΥΩΩΧΨΖ\n\
\n\
\t\tabc\n\
aaa aaa.go /tmp/aaa.go aaa.go:23 /tmp/aaa.go:23:7\n\
\n\
zzz";

pub struct Fixture {
    pub ws: Workspace,
    pub dir: TempDir,
    pub file1: PathBuf,
}

impl Fixture {
    pub fn start() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let file1 = dir.path().join("file1.txt");
        std::fs::write(&file1, FILE1).unwrap();
        let ws = Workspace::start(config).unwrap();
        Self { ws, dir, file1 }
    }

    pub fn actions(&self) -> &Actions {
        self.ws.actions()
    }

    /// Open the shared fixture file in a new view.
    pub fn open_file1(&self) -> ViewId {
        self.actions()
            .ed_open(self.file1.to_str().unwrap(), None, self.dir.path(), false)
            .unwrap()
    }

    /// String-surface call that must succeed.
    pub fn call(&self, name: &str, args: &[&str]) -> Vec<String> {
        call(self.actions(), name, args).unwrap()
    }

    pub fn line(&self, id: ViewId, ln: usize) -> String {
        self.actions()
            .view_text(id, ln, 1, Some(ln), None)
            .concat()
    }

    pub fn finish(self) {
        self.ws.shutdown().unwrap();
    }
}

pub fn vid(id: ViewId) -> String {
    id.to_string()
}

/// Poll `cond` until it holds or `timeout` passes.
pub fn wait_for(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let end = Instant::now() + timeout;
    loop {
        if cond() {
            return true;
        }
        if Instant::now() >= end {
            return false;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
}
