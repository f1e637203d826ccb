//! Editor model: views over backends and the context that owns them.
//!
//! * [`View`] is one pane: a backend plus cursor, selections, viewport and
//!   undo history. Edits go through the view so that every content change is
//!   paired with its inverse and the interaction state around it.
//! * [`Editor`] is the registry of views together with the status line,
//!   clipboard and render sink. Actions receive it as their context; views
//!   never point back at it.
//!
//! Invariants (after every public call):
//! * the cursor sits on an existing line, at most one past its last rune;
//! * selections are normalized (`from` never after `to`);
//! * the current view id, when set, names a registered view.

mod editor;
mod location;
mod view;

pub use editor::{Clipboard, Editor, MemClipboard, NullRenderer, RenderSink, RenderTarget, Status};
pub use location::Location;
pub use view::{Bounds, CursorMvmt, Edit, View, ViewState};

/// Stable identifier of a view, unique for the life of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ViewId(pub u64);

impl std::fmt::Display for ViewId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
