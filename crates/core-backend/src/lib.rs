//! Storage backends for views.
//!
//! A [`Backend`] owns the lines of one view exclusively. Three variants exist:
//! [`MemBackend`] (plain rune lines), [`FileBackend`] (memory lines loaded from
//! and persisted to disk) and [`CmdBackend`] (a bounded ring of rows fed by a
//! subprocess on a pseudo-terminal).
//!
//! Every backend guards its storage with an internal lock held for the
//! duration of a single call, so methods take `&self`.

use std::path::{Path, PathBuf};

use core_text::Slice;

pub mod cmd;
pub mod error;
pub mod file;
pub mod line_ending;
pub mod mem;
pub mod term;

pub use cmd::{CmdBackend, CmdHost, CmdOptions, CmdSpec, Lifecycle};
pub use error::BackendError;
pub use file::FileBackend;
pub use line_ending::LineEnding;
pub use mem::MemBackend;
pub use term::{Attrs, CellStyle, Color};

/// Capability set shared by all storage variants. Coordinates are 1-based;
/// `remove` treats `col2` as inclusive.
pub trait Backend: Send {
    fn insert(&self, line: usize, col: usize, text: &str) -> Result<(), BackendError>;

    fn remove(&self, line1: usize, col1: usize, line2: usize, col2: usize)
    -> Result<(), BackendError>;

    /// Copy of lines `line1..=line2`, each cut to columns `col1..=col2`.
    /// `None` ends mean "to the end". Out-of-range input is clamped.
    fn slice(&self, line1: usize, col1: usize, line2: Option<usize>, col2: Option<usize>)
    -> Slice;

    /// Append `text` after the last rune of the buffer.
    fn append(&self, text: &str) -> Result<(), BackendError>;

    fn save(&self, loc: &Path) -> Result<(), BackendError>;

    fn reload(&self) -> Result<(), BackendError>;

    /// Number of lines, not counting an empty trailing line.
    fn line_count(&self) -> usize;

    /// Location the content was loaded from / saves to, if any.
    fn src_loc(&self) -> Option<PathBuf>;

    fn close(&self) -> Result<(), BackendError>;

    /// Per-cell style, only tracked by command output.
    fn style_at(&self, _line: usize, _col: usize) -> Option<CellStyle> {
        None
    }

    /// Called when the owning view becomes the current view.
    fn on_activate(&self) {}

    fn as_command(&self) -> Option<&CmdBackend> {
        None
    }
}
