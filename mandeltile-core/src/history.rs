use crate::error::CoreError;
use crate::view::View;

/// Last-in-first-out stack of previously active views.
///
/// The controller pushes the current view right before every zoom and pops
/// it on undo. Unbounded; emptied on reset.
#[derive(Debug, Clone, Default)]
pub struct ViewHistory {
    stack: Vec<View>,
}

impl ViewHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, view: View) {
        self.stack.push(view);
    }

    /// Remove and return the most recent view.
    pub fn pop(&mut self) -> crate::Result<View> {
        self.stack.pop().ok_or(CoreError::EmptyHistory)
    }

    pub fn peek(&self) -> Option<&View> {
        self.stack.last()
    }

    pub fn clear(&mut self) {
        self.stack.clear();
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}
