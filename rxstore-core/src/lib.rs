//! Core types for rxstore
//!
//! This crate provides the reactive core of a unidirectional data-flow
//! convention: components dispatch named actions, stores react to the
//! action types they registered for, update their state and broadcast it
//! to renderers.
//!
//! # Core Concepts
//!
//! - **Broadcast**: replay-latest publish/subscribe primitive
//! - **ActionChannel**: typed dispatcher over a fixed set of action types
//! - **Store**: one state value plus its undo/redo history
//! - **Middleware**: observes every dispatch (logging, auditing)
//! - **StoreExtension**: lifecycle hooks a store reports to
//! - **ActionQueue** (feature `queue`): brings results of async work back
//!   onto the owning thread
//!
//! # Basic Example
//!
//! ```
//! use rxstore_core::{ActionChannel, ActionTypes, Store};
//! use serde_json::json;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! #[derive(Debug)]
//! struct Todos {
//!     items: Vec<String>,
//! }
//!
//! let action: ActionChannel = ActionChannel::new(ActionTypes::new([
//!     ("ADD", "todos/ADD"),
//!     ("UNDO_REDO", "UNDO_REDO"),
//! ]));
//!
//! let store = Store::with_action(Todos { items: vec![] }, action.clone());
//! store.register_action(&action, "ADD", |store, event| {
//!     let title = event.data.as_str().unwrap_or_default().to_string();
//!     store.update(|s| {
//!         let mut items = s.items.clone();
//!         items.push(title);
//!         Todos { items }
//!     });
//! });
//! store.init();
//!
//! let rendered = Rc::new(RefCell::new(Vec::new()));
//! let view = Rc::clone(&rendered);
//! let _sub = store.subscribe(move |s: &Todos| view.borrow_mut().push(s.items.len()));
//!
//! action.dispatch("todos/ADD", json!("write docs"));
//! action.dispatch("UNDO_REDO", json!("--"));
//!
//! assert_eq!(*rendered.borrow(), vec![0, 1, 0]);
//! ```
//!
//! # Execution Model
//!
//! Everything is synchronous and single-threaded. A dispatch runs every
//! matching handler before it returns; a handler that dispatches again
//! nests on the same stack. Nothing guards against unbounded reentrant
//! dispatch loops. Nothing is queued or deferred unless the `queue` feature
//! is enabled and an `ActionQueue` is drained explicitly.
//!
//! # Failure Model
//!
//! Bad input never panics. Invalid dispatches, unknown action names and
//! missing channels or handles are logged through `tracing` and the call
//! becomes a no-op, reported through `bool` / `Option` return values.

pub mod action;
pub mod broadcast;
pub mod channel;
pub mod history;
pub mod middleware;
#[cfg(feature = "queue")]
pub mod queue;
pub mod store;
pub mod testing;

// Action exports
pub use action::{
    ActionEvent, ActionTypeSet, ActionTypes, ActionTypesBuilder, HistoryStep, UndoRedoPayload,
};

// Pub/sub exports
pub use broadcast::{Broadcast, Filtered, Subscription};
pub use channel::ActionChannel;

// Middleware exports
pub use middleware::{
    glob_match, ActionLoggerConfig, ComposedMiddleware, LoggingMiddleware, Middleware,
    NoopMiddleware,
};

// Store exports
pub use history::History;
pub use store::{Store, StoreConfig, StoreExtension, UNDO_REDO_ACTION};

// Async bridge exports
#[cfg(feature = "queue")]
pub use queue::{ActionQueue, ActionSender};

// Testing exports
pub use testing::Recorder;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::action::{ActionEvent, ActionTypeSet, ActionTypes, HistoryStep};
    pub use crate::broadcast::Subscription;
    pub use crate::channel::ActionChannel;
    pub use crate::middleware::{LoggingMiddleware, Middleware};
    #[cfg(feature = "queue")]
    pub use crate::queue::{ActionQueue, ActionSender};
    pub use crate::store::{Store, StoreConfig, StoreExtension};
}
