use crate::error::{TraceError, TraceResult};

/// Call indices of the frames currently open in a transaction.
///
/// The bottom entry is the transaction root, index `0`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallStack {
    frames: Vec<u64>,
}

impl CallStack {
    /// Opens a frame for call `index`.
    pub fn push(&mut self, index: u64) {
        self.frames.push(index);
    }

    /// Removes and returns the innermost frame.
    pub fn pop(&mut self) -> TraceResult<u64> {
        self.frames.pop().ok_or(TraceError::EmptyCallStack)
    }

    /// The innermost frame.
    pub fn peek(&self) -> TraceResult<u64> {
        self.frames.last().copied().ok_or(TraceError::EmptyCallStack)
    }

    /// Number of open frames, the root included.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether not even the root frame is open.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Drops every frame.
    pub fn clear(&mut self) {
        self.frames.clear();
    }
}
