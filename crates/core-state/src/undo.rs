use tracing::trace;

/// Frames retained when no explicit limit is configured.
pub const DEFAULT_UNDO_LIMIT: usize = 500;

/// One reversible command: the edits that perform it, the edits that revert
/// it, and the interaction state (cursor, selections) on either side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame<E, S> {
    pub redo: Vec<E>,
    pub undo: Vec<E>,
    pub before: S,
    pub after: S,
}

/// Edits to replay and the state to restore once they are applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Replay<E, S> {
    pub edits: Vec<E>,
    pub state: S,
}

pub struct UndoManager<E, S> {
    undo_stack: Vec<Frame<E, S>>,
    redo_stack: Vec<Frame<E, S>>,
    limit: usize,
}

impl<E, S> Default for UndoManager<E, S> {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_LIMIT)
    }
}

impl<E, S> std::fmt::Debug for UndoManager<E, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UndoManager")
            .field("undo_depth", &self.undo_stack.len())
            .field("redo_depth", &self.redo_stack.len())
            .field("limit", &self.limit)
            .finish()
    }
}

impl<E, S> UndoManager<E, S> {
    pub fn new(limit: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            limit: limit.max(1),
        }
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Push a frame. Empty edit lists are ignored; the oldest frame is dropped
    /// once the limit is exceeded.
    pub fn record(&mut self, redo: Vec<E>, undo: Vec<E>, before: S, after: S) {
        if redo.is_empty() && undo.is_empty() {
            return;
        }
        self.undo_stack.push(Frame {
            redo,
            undo,
            before,
            after,
        });
        trace!(target: "undo", undo_depth = self.undo_stack.len(), redo_depth = self.redo_stack.len(), "frame_pushed");
        if self.undo_stack.len() > self.limit {
            let _ = self.undo_stack.remove(0);
            trace!(target: "undo", limit = self.limit, "undo_stack_trimmed");
        }
        if !self.redo_stack.is_empty() {
            self.redo_stack.clear();
            trace!(target: "undo", "redo_stack_cleared_on_new_edit");
        }
    }

    /// Drop both stacks.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        trace!(target: "undo", "history_cleared");
    }
}

impl<E: Clone, S: Clone> UndoManager<E, S> {
    /// Move the latest frame to the redo stack and hand back its revert edits
    /// with the state from before the command.
    pub fn undo(&mut self) -> Option<Replay<E, S>> {
        let frame = self.undo_stack.pop()?;
        let replay = Replay {
            edits: frame.undo.clone(),
            state: frame.before.clone(),
        };
        self.redo_stack.push(frame);
        trace!(target: "undo", undo_depth = self.undo_stack.len(), redo_depth = self.redo_stack.len(), "undo_pop");
        Some(replay)
    }

    /// Mirror of [`UndoManager::undo`].
    pub fn redo(&mut self) -> Option<Replay<E, S>> {
        let frame = self.redo_stack.pop()?;
        let replay = Replay {
            edits: frame.redo.clone(),
            state: frame.after.clone(),
        };
        self.undo_stack.push(frame);
        trace!(target: "undo", undo_depth = self.undo_stack.len(), redo_depth = self.redo_stack.len(), "redo_pop");
        Some(replay)
    }
}
