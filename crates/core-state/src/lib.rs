//! Per-view edit history.
//!
//! History is linear: a new frame clears the redo stack, undo moves the top
//! frame to the redo stack and redo moves it back. Frames are never merged.

pub mod undo;

pub use undo::{DEFAULT_UNDO_LIMIT, Frame, Replay, UndoManager};
