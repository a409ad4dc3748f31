//! rxstore: Typed action channels and undo/redo-capable stores
//!
//! Like Flux, but with explicit channels. Components dispatch named actions,
//! stores react to the action types they registered for and broadcast their
//! new state to whoever renders it.
//!
//! # Example
//! ```ignore
//! use rxstore::prelude::*;
//!
//! #[derive(ActionTypes, Clone, Copy, Debug, PartialEq)]
//! #[action_types(prefix = "counter/")]
//! enum CounterAction {
//!     Increment,
//!     #[action_type(value = "UNDO_REDO")]
//!     UndoRedo,
//! }
//!
//! let action: ActionChannel = ActionChannel::from_set::<CounterAction>();
//! let store = Store::with_action(0i64, action.clone());
//! store.register_action(&action, "INCREMENT", |store, _| store.update(|n| n + 1));
//! store.init();
//! ```

// Re-export everything from core
pub use rxstore_core::*;

// Re-export derive macros
pub use rxstore_macros::ActionTypes;

/// Prelude for convenient imports
pub mod prelude {
    // Actions
    pub use rxstore_core::{ActionEvent, ActionTypeSet, ActionTypes, HistoryStep, UndoRedoPayload};

    // Channels
    pub use rxstore_core::{ActionChannel, Subscription};

    // Store
    pub use rxstore_core::{History, Store, StoreConfig, StoreExtension};

    // Middleware
    pub use rxstore_core::{
        ActionLoggerConfig, ComposedMiddleware, LoggingMiddleware, Middleware, NoopMiddleware,
    };

    // Async bridge
    #[cfg(feature = "queue")]
    pub use rxstore_core::{ActionQueue, ActionSender};

    // Derive macros
    pub use rxstore_macros::ActionTypes;
}
