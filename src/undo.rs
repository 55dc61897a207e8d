//! Undo log.
//!
//! An append-only action list grouped into batches. Mutating handlers
//! record one action per primitive (lines added, lines deleted); the
//! top-level command loop opens a batch before dispatch and commits it
//! afterwards, so one command — including one whole global invocation —
//! is one undo unit. Actions are never mutated after commit; the most
//! recent batch can be popped and reversed.

use crate::buffer::LineBuffer;

/// What a single recorded action did to the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoKind {
    /// Lines were added; undoing removes them.
    Add,
    /// Lines were removed; undoing restores them.
    Delete,
}

/// One recorded primitive: the window it applied to and, for deletions,
/// the snapshotted lines.
#[derive(Debug, Clone, PartialEq)]
pub struct UndoAction {
    pub kind: UndoKind,
    pub first: usize,
    pub second: usize,
    pub lines: Vec<String>,
}

/// The actions of one committed top-level command, plus the `dot` to
/// restore when the batch is reversed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UndoBatch {
    pub actions: Vec<UndoAction>,
    pub dot: usize,
}

/// History of committed batches plus the batch currently being recorded.
#[derive(Debug, Default)]
pub struct UndoLog {
    history: Vec<UndoBatch>,
    open: Option<UndoBatch>,
}

impl UndoLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a batch capturing the pre-command `dot`. A batch already in
    /// flight (a nested dispatch inside a global) is left untouched.
    pub fn begin(&mut self, dot: usize) {
        if self.open.is_none() {
            self.open = Some(UndoBatch {
                actions: Vec::new(),
                dot,
            });
        }
    }

    /// Record lines added at the window `[first, second]`.
    pub fn record_add(&mut self, first: usize, second: usize) {
        if let Some(batch) = self.open.as_mut() {
            batch.actions.push(UndoAction {
                kind: UndoKind::Add,
                first,
                second,
                lines: Vec::new(),
            });
        }
    }

    /// Record lines removed from the window `[first, second]`.
    pub fn record_delete(&mut self, first: usize, second: usize, lines: Vec<String>) {
        if let Some(batch) = self.open.as_mut() {
            batch.actions.push(UndoAction {
                kind: UndoKind::Delete,
                first,
                second,
                lines,
            });
        }
    }

    /// Close the open batch, pushing it to history if it recorded
    /// anything. A batch that mutated nothing leaves no history entry.
    pub fn commit(&mut self) {
        if let Some(batch) = self.open.take() {
            if !batch.actions.is_empty() {
                self.history.push(batch);
            }
        }
    }

    /// Pop the most recent committed batch.
    pub fn pop(&mut self) -> Option<UndoBatch> {
        self.history.pop()
    }

    /// Number of committed batches.
    pub fn depth(&self) -> usize {
        self.history.len()
    }

    /// Drop all history, as when a new file replaces the buffer.
    pub fn clear(&mut self) {
        self.history.clear();
        self.open = None;
    }
}

/// Reverse a popped batch against the buffer: inverse actions applied in
/// reverse order. Returns the `dot` the caller should restore.
pub fn reverse(batch: &UndoBatch, buffer: &mut LineBuffer) -> usize {
    for action in batch.actions.iter().rev() {
        match action.kind {
            UndoKind::Add => {
                buffer.remove(action.first, action.second);
            }
            UndoKind::Delete => {
                buffer.insert(action.first - 1, action.lines.clone());
            }
        }
    }
    batch.dot
}
