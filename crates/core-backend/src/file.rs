//! File backed storage: memory lines loaded fully on open, written back with
//! the source's line terminator.

use std::fs;
use std::path::{Path, PathBuf};

use core_text::{Slice, string_to_runes};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::line_ending::{self, LineEnding};
use crate::{Backend, BackendError, MemBackend};

/// Bytes inspected by the text check.
const SNIFF_LEN: usize = 8000;

#[derive(Debug)]
pub struct FileBackend {
    mem: MemBackend,
    path: Mutex<PathBuf>,
    ending: Mutex<LineEnding>,
}

/// True when `bytes` look like text: valid UTF-8 without NUL bytes in the
/// leading window.
pub fn is_text(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(SNIFF_LEN)];
    if head.contains(&0) {
        return false;
    }
    std::str::from_utf8(bytes).is_ok()
}

impl FileBackend {
    /// Load `path`. Non-text content is rejected with [`BackendError::NotText`].
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, BackendError> {
        let path = path.into();
        let (lines, ending) = read_file(&path)?;
        info!(target: "backend.file", path = %path.display(), lines = lines.len(), ending = ?ending, "opened");
        let mem = MemBackend::new();
        mem.set_lines(lines);
        mem.set_loc(Some(path.clone()));
        Ok(Self {
            mem,
            path: Mutex::new(path),
            ending: Mutex::new(ending),
        })
    }

    /// Create `path` empty when it does not exist yet, then open it.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, BackendError> {
        let path = path.into();
        if !path.exists() {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent).map_err(|e| BackendError::io("create", parent, e))?;
            }
            fs::write(&path, "").map_err(|e| BackendError::io("create", &path, e))?;
            debug!(target: "backend.file", path = %path.display(), "created");
        }
        Self::open(path)
    }

    pub fn path(&self) -> PathBuf {
        self.path.lock().clone()
    }

    pub fn line_ending(&self) -> LineEnding {
        *self.ending.lock()
    }

    /// Whole content joined with `\n`.
    pub fn text(&self) -> String {
        self.mem.text()
    }
}

fn read_file(path: &Path) -> Result<(Vec<Vec<char>>, LineEnding), BackendError> {
    let bytes = fs::read(path).map_err(|e| BackendError::io("open", path, e))?;
    if !is_text(&bytes) {
        return Err(BackendError::NotText(path.to_path_buf()));
    }
    let content = String::from_utf8_lossy(&bytes);
    let detected = line_ending::detect(&content, LineEnding::platform());
    if detected.mixed {
        warn!(target: "backend.file", path = %path.display(), ending = ?detected.ending, "mixed_line_endings");
    }
    Ok((string_to_runes(&detected.text), detected.ending))
}

impl Backend for FileBackend {
    fn insert(&self, line: usize, col: usize, text: &str) -> Result<(), BackendError> {
        self.mem.insert(line, col, text)
    }

    fn remove(
        &self,
        line1: usize,
        col1: usize,
        line2: usize,
        col2: usize,
    ) -> Result<(), BackendError> {
        self.mem.remove(line1, col1, line2, col2)
    }

    fn slice(&self, line1: usize, col1: usize, line2: Option<usize>, col2: Option<usize>) -> Slice {
        self.mem.slice(line1, col1, line2, col2)
    }

    fn append(&self, text: &str) -> Result<(), BackendError> {
        self.mem.append(text)
    }

    fn save(&self, loc: &Path) -> Result<(), BackendError> {
        if loc.as_os_str().is_empty() {
            return Err(BackendError::NoLocation);
        }
        let ending = self.line_ending();
        let content = self.mem.with_lines(|lines| line_ending::join_lines(lines, ending));
        fs::write(loc, content).map_err(|e| BackendError::io("save", loc, e))?;
        info!(target: "backend.file", path = %loc.display(), "saved");
        *self.path.lock() = loc.to_path_buf();
        self.mem.set_loc(Some(loc.to_path_buf()));
        Ok(())
    }

    fn reload(&self) -> Result<(), BackendError> {
        let path = self.path();
        let (lines, ending) = read_file(&path)?;
        self.mem.set_lines(lines);
        *self.ending.lock() = ending;
        debug!(target: "backend.file", path = %path.display(), "reloaded");
        Ok(())
    }

    fn line_count(&self) -> usize {
        self.mem.line_count()
    }

    fn src_loc(&self) -> Option<PathBuf> {
        Some(self.path())
    }

    fn close(&self) -> Result<(), BackendError> {
        Ok(())
    }
}
