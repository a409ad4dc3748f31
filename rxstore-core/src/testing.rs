//! Test utilities for rxstore applications
//!
//! - [`Recorder`]: captures every value a handler receives
//! - Assertion macros for verifying what a recorder saw
//!
//! # Example
//!
//! ```
//! use rxstore_core::testing::Recorder;
//! use rxstore_core::{ActionChannel, ActionEvent, ActionTypes};
//! use serde_json::{json, Value};
//!
//! let channel: ActionChannel = ActionChannel::new(ActionTypes::new([("SAVE", "SAVE")]));
//! let saves: Recorder<ActionEvent<Value>> = Recorder::new();
//! let _sub = channel.subscribe("SAVE", saves.handler());
//!
//! channel.dispatch("SAVE", json!({"id": 1}));
//!
//! assert_eq!(saves.len(), 1);
//! assert_eq!(saves.last().unwrap().data, json!({"id": 1}));
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Captures values passed to a handler
///
/// Clones share the same buffer, so one clone can be moved into a handler
/// while another is kept for assertions.
pub struct Recorder<T> {
    received: Rc<RefCell<Vec<T>>>,
}

impl<T> Clone for Recorder<T> {
    fn clone(&self) -> Self {
        Self {
            received: Rc::clone(&self.received),
        }
    }
}

impl<T> Default for Recorder<T> {
    fn default() -> Self {
        Self {
            received: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

impl<T: Clone + 'static> Recorder<T> {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// A handler that appends every value it is called with
    pub fn handler(&self) -> impl Fn(&T) + 'static {
        let received = Rc::clone(&self.received);
        move |value: &T| received.borrow_mut().push(value.clone())
    }

    /// Everything received so far
    pub fn received(&self) -> Vec<T> {
        self.received.borrow().clone()
    }

    /// Drain everything received so far
    pub fn take(&self) -> Vec<T> {
        std::mem::take(&mut *self.received.borrow_mut())
    }

    pub fn last(&self) -> Option<T> {
        self.received.borrow().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.received.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.received.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.received.borrow_mut().clear();
    }
}

impl<T: fmt::Debug> fmt::Debug for Recorder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recorder")
            .field("received", &*self.received.borrow())
            .finish()
    }
}

/// Assert that a recorder saw a value matching a pattern.
///
/// # Example
///
/// ```ignore
/// use rxstore::assert_received;
///
/// assert_received!(events, ActionEvent { action_type, .. } if action_type == "SAVE");
/// ```
#[macro_export]
macro_rules! assert_received {
    ($recorder:expr, $pattern:pat $(if $guard:expr)?) => {
        let received = $recorder.received();
        assert!(
            received.iter().any(|v| matches!(v, $pattern $(if $guard)?)),
            "Expected a value matching `{}` to be received, but got: {:?}",
            stringify!($pattern),
            received
        );
    };
}

/// Assert that a recorder saw NO value matching a pattern.
#[macro_export]
macro_rules! assert_not_received {
    ($recorder:expr, $pattern:pat $(if $guard:expr)?) => {
        let received = $recorder.received();
        assert!(
            !received.iter().any(|v| matches!(v, $pattern $(if $guard)?)),
            "Expected NO value matching `{}` to be received, but got: {:?}",
            stringify!($pattern),
            received
        );
    };
}

/// Count how many received values match a pattern.
#[macro_export]
macro_rules! count_received {
    ($recorder:expr, $pattern:pat $(if $guard:expr)?) => {
        $recorder
            .received()
            .iter()
            .filter(|v| matches!(v, $pattern $(if $guard)?))
            .count()
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_buffer() {
        let recorder: Recorder<u8> = Recorder::new();
        let handler = recorder.clone().handler();

        handler(&1);
        handler(&2);

        assert_eq!(recorder.received(), vec![1, 2]);
        assert_eq!(recorder.last(), Some(2));
    }

    #[test]
    fn test_take_drains() {
        let recorder: Recorder<&str> = Recorder::new();
        let handler = recorder.handler();
        handler(&"a");

        assert_eq!(recorder.take(), vec!["a"]);
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_macros() {
        let recorder: Recorder<Option<i32>> = Recorder::new();
        let handler = recorder.handler();
        handler(&Some(3));
        handler(&None);
        handler(&Some(5));

        assert_received!(recorder, Some(n) if *n > 4);
        assert_not_received!(recorder, Some(0));
        assert_eq!(count_received!(recorder, Some(_)), 2);
    }
}
