//! Undo/redo stacks of recorded deltas

use super::Delta;
use crate::project::World;
use std::collections::VecDeque;

/// Default maximum number of undo steps
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Command history for undo/redo
#[derive(Debug, Clone)]
pub struct CommandHistory {
    /// Oldest first
    undo_stack: VecDeque<Delta>,
    redo_stack: Vec<Delta>,
    max_depth: usize,
    clear_redo_on_push: bool,
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH, true)
    }
}

impl CommandHistory {
    pub fn new(max_depth: usize, clear_redo_on_push: bool) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_depth: max_depth.max(1),
            clear_redo_on_push,
        }
    }

    /// Record a delta whose forward effect has already been applied
    pub fn push(&mut self, delta: Delta) {
        log::debug!("Recorded {}", delta.description());
        self.undo_stack.push_back(delta);
        if self.clear_redo_on_push {
            self.redo_stack.clear();
        }
        while self.undo_stack.len() > self.max_depth {
            self.undo_stack.pop_front();
        }
    }

    /// Undo the most recent delta. Returns false if there was nothing to undo.
    pub fn undo(&mut self, world: &mut World) -> bool {
        let Some(mut delta) = self.undo_stack.pop_back() else {
            return false;
        };
        log::debug!("Undo {}", delta.description());
        delta.undo(world);
        self.redo_stack.push(delta);
        true
    }

    /// Redo the most recently undone delta. Returns false if there was nothing to redo.
    pub fn redo(&mut self, world: &mut World) -> bool {
        let Some(mut delta) = self.redo_stack.pop() else {
            return false;
        };
        log::debug!("Redo {}", delta.description());
        delta.redo(world);
        self.undo_stack.push_back(delta);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_description(&self) -> Option<&'static str> {
        self.undo_stack.back().map(Delta::description)
    }

    pub fn redo_description(&self) -> Option<&'static str> {
        self.redo_stack.last().map(Delta::description)
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
