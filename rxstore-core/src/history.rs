//! Snapshot history with a movable cursor

use crate::action::HistoryStep;
use std::fmt;
use std::rc::Rc;

/// Ordered state snapshots plus a cursor at the active one
///
/// Snapshots are shared `Rc`s: states are replaced, never mutated, so an
/// entry can be retained and compared by identity.
///
/// Recording always appends at the tail and moves the cursor there. Stepping
/// only moves the cursor, clamped to the recorded range. Only [`reset`](Self::reset)
/// removes entries.
pub struct History<S> {
    entries: Vec<Rc<S>>,
    cursor: Option<usize>,
}

impl<S> Default for History<S> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            cursor: None,
        }
    }
}

impl<S> History<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cursor position, `None` before the first snapshot
    pub fn index(&self) -> Option<usize> {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The snapshot under the cursor
    pub fn current(&self) -> Option<&Rc<S>> {
        self.cursor.and_then(|index| self.entries.get(index))
    }

    pub fn get(&self, index: usize) -> Option<&Rc<S>> {
        self.entries.get(index)
    }

    /// All snapshots, oldest first
    pub fn entries(&self) -> &[Rc<S>] {
        &self.entries
    }

    /// Append a snapshot and move the cursor to it
    pub fn record(&mut self, state: Rc<S>) {
        self.entries.push(state);
        self.cursor = Some(self.entries.len() - 1);
    }

    /// Move the cursor one entry back or forward
    ///
    /// Returns whether the cursor moved. At a boundary, or with no history,
    /// nothing happens.
    pub fn step(&mut self, step: HistoryStep) -> bool {
        let Some(index) = self.cursor else {
            return false;
        };
        let target = match step {
            HistoryStep::Undo if index > 0 => index - 1,
            HistoryStep::Redo if index + 1 < self.entries.len() => index + 1,
            _ => return false,
        };
        self.cursor = Some(target);
        true
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.is_some_and(|index| index > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.cursor
            .is_some_and(|index| index + 1 < self.entries.len())
    }

    /// The entry at index 0, the head a reset falls back to
    pub fn head(&self) -> Option<&Rc<S>> {
        self.entries.first()
    }

    /// Collapse the history to exactly `[head]` with the cursor at 0
    pub fn reset(&mut self, head: Rc<S>) {
        self.entries.clear();
        self.entries.push(head);
        self.cursor = Some(0);
    }
}

impl<S> fmt::Debug for History<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("History")
            .field("len", &self.entries.len())
            .field("cursor", &self.cursor)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(n: usize) -> History<usize> {
        let mut history = History::new();
        for i in 0..n {
            history.record(Rc::new(i));
        }
        history
    }

    #[test]
    fn test_empty_history() {
        let mut history: History<u8> = History::new();
        assert_eq!(history.index(), None);
        assert!(history.current().is_none());
        assert!(!history.step(HistoryStep::Undo));
        assert!(!history.step(HistoryStep::Redo));
        assert!(!history.can_undo());
    }

    #[test]
    fn test_record_moves_cursor_to_tail() {
        let history = filled(3);
        assert_eq!(history.index(), Some(2));
        assert_eq!(history.len(), 3);
        assert_eq!(**history.current().unwrap(), 2);
    }

    #[test]
    fn test_step_is_clamped() {
        let mut history = filled(3);

        assert!(history.step(HistoryStep::Undo));
        assert!(history.step(HistoryStep::Undo));
        assert!(!history.step(HistoryStep::Undo));
        assert_eq!(history.index(), Some(0));

        for _ in 0..5 {
            history.step(HistoryStep::Redo);
        }
        assert_eq!(history.index(), Some(2));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_record_after_undo_appends_without_truncating() {
        let mut history = filled(3);
        history.step(HistoryStep::Undo);
        history.step(HistoryStep::Undo);

        history.record(Rc::new(9));

        assert_eq!(history.len(), 4);
        assert_eq!(history.index(), Some(3));
        assert_eq!(**history.get(1).unwrap(), 1);
    }

    #[test]
    fn test_reset_collapses_to_head() {
        let mut history = filled(4);
        let head = Rc::clone(history.head().unwrap());

        history.reset(Rc::clone(&head));

        assert_eq!(history.len(), 1);
        assert_eq!(history.index(), Some(0));
        assert!(Rc::ptr_eq(history.current().unwrap(), &head));
    }
}
