//! Bounded snapshot history with a cursor.
//!
//! Every entry is a full, immutable `CanvasState`. Pushing after an undo
//! discards the redo branch (linear history, no tree navigation). Each
//! cursor move is tagged with a [`Transition`] so observers can tell a fresh
//! edit (patch the scene incrementally) from time travel (rebuild it).

use crate::config::DEFAULT_HISTORY_CAPACITY;
use crate::model::CanvasState;

/// What kind of cursor move produced the current snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// A new snapshot was pushed.
    Edit,
    /// The cursor moved through existing snapshots, or the log was reset.
    TimeTravel,
}

#[derive(Debug, Clone)]
pub struct History {
    snapshots: Vec<CanvasState>,
    cursor: usize,
    capacity: usize,
    last: Transition,
    /// Bumped on every cursor move; lets pollers detect change cheaply.
    revision: u64,
}

impl History {
    /// A history holding `initial` as its only snapshot.
    pub fn new(initial: CanvasState) -> Self {
        Self::with_capacity(initial, DEFAULT_HISTORY_CAPACITY)
    }

    /// Like [`History::new`] with a custom capacity (minimum 1).
    pub fn with_capacity(initial: CanvasState, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut snapshots = Vec::with_capacity(capacity);
        snapshots.push(initial);
        Self {
            snapshots,
            cursor: 0,
            capacity,
            last: Transition::TimeTravel,
            revision: 0,
        }
    }

    /// Drop the redo branch, append `state`, evict the oldest snapshots past
    /// capacity and move the cursor to the new tail.
    pub fn push(&mut self, state: CanvasState) -> Transition {
        self.snapshots.truncate(self.cursor + 1);
        self.snapshots.push(state);
        if self.snapshots.len() > self.capacity {
            let excess = self.snapshots.len() - self.capacity;
            self.snapshots.drain(..excess);
        }
        self.cursor = self.snapshots.len() - 1;
        self.mark(Transition::Edit);
        log::debug!(
            "history push: {} snapshot(s), cursor {}",
            self.snapshots.len(),
            self.cursor
        );
        Transition::Edit
    }

    /// Step back one snapshot. `None` at the oldest snapshot.
    pub fn undo(&mut self) -> Option<Transition> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.mark(Transition::TimeTravel);
        log::debug!("history undo: cursor {}", self.cursor);
        Some(Transition::TimeTravel)
    }

    /// Step forward one snapshot. `None` at the newest snapshot.
    pub fn redo(&mut self) -> Option<Transition> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.mark(Transition::TimeTravel);
        log::debug!("history redo: cursor {}", self.cursor);
        Some(Transition::TimeTravel)
    }

    /// Replace the whole log with `state` at cursor 0.
    ///
    /// Tagged as time travel so consumers rebuild rather than diff.
    pub fn reset(&mut self, state: CanvasState) -> Transition {
        self.snapshots.clear();
        self.snapshots.push(state);
        self.cursor = 0;
        self.mark(Transition::TimeTravel);
        log::debug!("history reset");
        Transition::TimeTravel
    }

    /// The snapshot at the cursor. Read-only: edits go through `push`.
    pub fn current(&self) -> &CanvasState {
        &self.snapshots[self.cursor]
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Always false: a history holds at least one snapshot.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Tag of the most recent cursor move.
    pub fn last_transition(&self) -> Transition {
        self.last
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// All retained snapshots, oldest first.
    pub fn snapshots(&self) -> &[CanvasState] {
        &self.snapshots
    }

    fn mark(&mut self, transition: Transition) {
        self.last = transition;
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Snapshots distinguished by canvas width, which is easy to assert on.
    fn snap(tag: u32) -> CanvasState {
        CanvasState::empty(tag as f64, 1.0)
    }

    fn tags(h: &History) -> Vec<u32> {
        h.snapshots().iter().map(|s| s.canvas_width as u32).collect()
    }

    #[test]
    fn starts_with_single_snapshot() {
        let h = History::new(snap(0));
        assert_eq!(h.len(), 1);
        assert_eq!(h.cursor(), 0);
        assert!(!h.can_undo());
        assert!(!h.can_redo());
    }

    #[test]
    fn push_after_undo_discards_redo_branch() {
        let mut h = History::new(snap(1)); // A
        h.push(snap(2)); // B
        h.push(snap(3)); // C
        assert_eq!(tags(&h), vec![1, 2, 3]);

        h.undo();
        h.undo();
        assert_eq!(h.current().canvas_width, 1.0);

        h.push(snap(4)); // D
        assert_eq!(tags(&h), vec![1, 4]);
        assert_eq!(h.cursor(), 1);
        assert_eq!(h.redo(), None);
        assert_eq!(h.current().canvas_width, 4.0);
    }

    #[test]
    fn capacity_evicts_oldest_first() {
        let mut h = History::new(snap(0));
        for i in 1..=40 {
            h.push(snap(i));
            assert!(h.len() <= 25);
        }
        // 41 snapshots total (initial + 40); the oldest kept is the 17th.
        assert_eq!(h.len(), 25);
        assert_eq!(h.snapshots()[0].canvas_width, 16.0);
        assert_eq!(h.current().canvas_width, 40.0);
        assert_eq!(h.cursor(), 24);
    }

    #[test]
    fn undo_redo_are_noops_at_boundaries() {
        let mut h = History::new(snap(0));
        let rev = h.revision();
        assert_eq!(h.undo(), None);
        assert_eq!(h.redo(), None);
        assert_eq!(h.revision(), rev);

        h.push(snap(1));
        assert_eq!(h.redo(), None);
        assert_eq!(h.undo(), Some(Transition::TimeTravel));
        assert_eq!(h.undo(), None);
        assert_eq!(h.cursor(), 0);
    }

    #[test]
    fn transitions_are_tagged() {
        let mut h = History::new(snap(0));
        assert_eq!(h.push(snap(1)), Transition::Edit);
        assert_eq!(h.last_transition(), Transition::Edit);
        h.undo();
        assert_eq!(h.last_transition(), Transition::TimeTravel);
        h.redo();
        assert_eq!(h.last_transition(), Transition::TimeTravel);
        assert_eq!(h.reset(snap(9)), Transition::TimeTravel);
        assert_eq!(h.len(), 1);
        assert_eq!(h.cursor(), 0);
    }

    #[test]
    fn small_capacity_still_keeps_current() {
        let mut h = History::with_capacity(snap(0), 0);
        h.push(snap(1));
        assert_eq!(h.len(), 1);
        assert_eq!(h.current().canvas_width, 1.0);
        assert!(!h.can_undo());
    }
}
