//! State store with undo/redo history
//!
//! A [`Store`] owns one opaque state value. Every transition replaces the
//! value (states are shared as `Rc<S>` and never mutated in place), then
//! [`Store::stream_change`] records it in the history and broadcasts it.
//!
//! Undo/redo is driven by a reserved action type (`"UNDO_REDO"` unless
//! configured otherwise) on the store's default [`ActionChannel`]. Payloads
//! decoding to [`HistoryStep::Undo`] (`"--"`) or [`HistoryStep::Redo`]
//! (`"++"`) move the history cursor.
//!
//! # Example
//! ```
//! use rxstore_core::{ActionChannel, ActionTypes, HistoryStep, Store};
//! use serde_json::json;
//!
//! #[derive(Debug, PartialEq)]
//! struct Counter {
//!     count: i64,
//! }
//!
//! let action: ActionChannel = ActionChannel::new(ActionTypes::new([
//!     ("INCREMENT", "INCREMENT"),
//!     ("UNDO_REDO", "UNDO_REDO"),
//! ]));
//!
//! let store = Store::with_action(Counter { count: 0 }, action.clone());
//! store.register_action(&action, "INCREMENT", |store, event| {
//!     let by = event.data.as_i64().unwrap_or(1);
//!     store.update(|s| Counter { count: s.count + by });
//! });
//! store.init();
//!
//! action.dispatch("INCREMENT", json!(2));
//! action.dispatch("INCREMENT", json!(3));
//! assert_eq!(store.state().count, 5);
//!
//! action.dispatch("UNDO_REDO", HistoryStep::Undo.into());
//! assert_eq!(store.state().count, 2);
//! assert_eq!(store.history_index(), Some(1));
//! ```

use crate::action::{ActionEvent, HistoryStep, UndoRedoPayload};
use crate::broadcast::{Broadcast, Subscription};
use crate::channel::ActionChannel;
use crate::history::History;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, trace, warn};

/// Reserved action type a store binds its undo/redo handler to
pub const UNDO_REDO_ACTION: &str = "UNDO_REDO";

/// Store configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Label attached to this store's log records
    pub name: String,
    /// Action type name bound to the undo/redo handler
    pub undo_redo_action: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: "store".to_string(),
            undo_redo_action: UNDO_REDO_ACTION.to_string(),
        }
    }
}

impl StoreConfig {
    /// Default configuration with a custom log label
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Capability object a store calls at fixed points of its lifecycle
///
/// Every hook defaults to doing nothing. Hooks run after the store has
/// settled, so reading or updating the store from inside one is allowed.
///
/// # Example
/// ```
/// use rxstore_core::{Store, StoreConfig, StoreExtension};
///
/// struct Greeter;
///
/// impl StoreExtension<String> for Greeter {
///     fn on_init(&self, store: &Store<String>) {
///         println!("{} ready with {:?}", store.config().name, store.state());
///     }
/// }
///
/// let store: Store<String> =
///     Store::with_extension("draft".to_string(), None, StoreConfig::named("doc"), Greeter);
/// store.init();
/// ```
pub trait StoreExtension<S, D = Value> {
    /// After `init` published the current state
    fn on_init(&self, _store: &Store<S, D>) {}

    /// After an undo/redo action moved the history cursor
    fn on_history_step(&self, _store: &Store<S, D>, _step: HistoryStep) {}

    /// After `reset_store_state` collapsed the history
    fn on_reset(&self, _store: &Store<S, D>) {}
}

/// Owner of one state value and its undo/redo history
///
/// Cloning yields another handle to the same store. Handlers registered
/// through [`register_action`](Self::register_action) hold the store weakly,
/// so a store and its channel never keep each other alive.
pub struct Store<S, D = Value> {
    inner: Rc<StoreInner<S, D>>,
}

struct StoreInner<S, D> {
    config: StoreConfig,
    /// Default channel for bindings made from outside the store
    action: Option<ActionChannel<D>>,
    subject: Broadcast<Rc<S>>,
    state: RefCell<Rc<S>>,
    history: RefCell<History<S>>,
    /// `register_action` subscriptions keyed by action type name
    subs: RefCell<HashMap<String, Subscription>>,
    undo_redo_sub: RefCell<Option<Subscription>>,
    extension: Option<Box<dyn StoreExtension<S, D>>>,
}

impl<S, D> Clone for Store<S, D> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S: 'static> Store<S> {
    /// Create a store with no default action channel
    ///
    /// Undo/redo cannot be enabled on such a store; `init` still records the
    /// initial state and broadcasts it.
    pub fn new(state: S) -> Self {
        Self::with_config(state, None, StoreConfig::default())
    }
}

impl<S, D> Store<S, D>
where
    S: 'static,
    D: UndoRedoPayload + Clone + 'static,
{
    /// Create a store whose default action channel is `action`
    pub fn with_action(state: S, action: ActionChannel<D>) -> Self {
        Self::with_config(state, Some(action), StoreConfig::default())
    }

    /// Create a store with explicit configuration
    pub fn with_config(state: S, action: Option<ActionChannel<D>>, config: StoreConfig) -> Self {
        Self::build(state, action, config, None)
    }

    /// Create a store that reports its lifecycle to `extension`
    pub fn with_extension<E>(
        state: S,
        action: Option<ActionChannel<D>>,
        config: StoreConfig,
        extension: E,
    ) -> Self
    where
        E: StoreExtension<S, D> + 'static,
    {
        Self::build(state, action, config, Some(Box::new(extension)))
    }

    fn build(
        state: S,
        action: Option<ActionChannel<D>>,
        config: StoreConfig,
        extension: Option<Box<dyn StoreExtension<S, D>>>,
    ) -> Self {
        let state = Rc::new(state);
        Self {
            inner: Rc::new(StoreInner {
                config,
                action,
                subject: Broadcast::new(Rc::clone(&state)),
                state: RefCell::new(state),
                history: RefCell::new(History::new()),
                subs: RefCell::new(HashMap::new()),
                undo_redo_sub: RefCell::new(None),
                extension,
            }),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// The default action channel, if one was configured
    pub fn action(&self) -> Option<&ActionChannel<D>> {
        self.inner.action.as_ref()
    }

    /// Current state
    pub fn state(&self) -> Rc<S> {
        Rc::clone(&self.inner.state.borrow())
    }

    /// Replace the current state without publishing it
    ///
    /// Call [`stream_change`](Self::stream_change) afterwards to record and
    /// broadcast the new value.
    pub fn set_state(&self, state: S) {
        self.replace_state(Rc::new(state));
    }

    /// Replace the current state with an already shared value
    pub fn replace_state(&self, state: Rc<S>) {
        *self.inner.state.borrow_mut() = state;
    }

    /// Derive the next state from the current one, then stream the change
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&S) -> S,
    {
        let next = f(&*self.state());
        self.set_state(next);
        self.stream_change();
    }

    /// Cursor into the history, `None` before anything was recorded
    pub fn history_index(&self) -> Option<usize> {
        self.inner.history.borrow().index()
    }

    pub fn history_len(&self) -> usize {
        self.inner.history.borrow().len()
    }

    /// Snapshot of every recorded state, oldest first
    pub fn history(&self) -> Vec<Rc<S>> {
        self.inner.history.borrow().entries().to_vec()
    }

    pub fn can_undo(&self) -> bool {
        self.inner.history.borrow().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.inner.history.borrow().can_redo()
    }

    /// Whether state changes are being recorded for undo/redo
    pub fn is_undo_redo_enabled(&self) -> bool {
        self.inner.undo_redo_sub.borrow().is_some()
    }

    /// Enable undo/redo and publish the current state
    ///
    /// Calling it again does not record the same state twice.
    pub fn init(&self) {
        self.enable_undo_redo(true);

        let already_recorded = {
            let history = self.inner.history.borrow();
            let state = self.inner.state.borrow();
            let recorded = history
                .current()
                .is_some_and(|current| Rc::ptr_eq(current, &state));
            recorded
        };

        if already_recorded {
            self.inner.subject.next(self.state());
        } else {
            self.stream_change();
        }

        if let Some(extension) = self.inner.extension.as_deref() {
            extension.on_init(self);
        }
    }

    /// Listen to the current state and every later one
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&S) + 'static,
    {
        self.inner
            .subject
            .subscribe(move |state: &Rc<S>| handler(&**state))
    }

    /// Like [`subscribe`](Self::subscribe), receiving the shared snapshot
    pub fn subscribe_shared<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&Rc<S>) + 'static,
    {
        self.inner.subject.subscribe(handler)
    }

    /// Dispose one state subscription, or with `None` all of them
    ///
    /// Passing `None` tears down the state broadcast for good; later changes
    /// are no longer published to anyone.
    pub fn dispose(&self, subscription: Option<Subscription>) {
        match subscription {
            Some(subscription) => {
                subscription.dispose();
            }
            None => {
                debug!(
                    store = %self.inner.config.name,
                    "Store: disposing all state subscriptions"
                );
                self.inner.subject.dispose_all();
            }
        }
    }

    /// Record the current state (when recording) and broadcast it
    ///
    /// The very first call always records, so the initial state survives
    /// for a later reset. The broadcast happens whether or not anything was
    /// recorded.
    pub fn stream_change(&self) {
        let state = self.state();

        let recording =
            self.is_undo_redo_enabled() || self.inner.history.borrow().index().is_none();
        if recording {
            let mut history = self.inner.history.borrow_mut();
            history.record(Rc::clone(&state));
            trace!(
                store = %self.inner.config.name,
                index = ?history.index(),
                len = history.len(),
                "Store: recorded state"
            );
        }

        self.inner.subject.next(state);
    }

    /// Bind `handler` to an action type on `channel`, at most once per type
    ///
    /// A second call with the same type name is ignored while the first
    /// registration is alive.
    pub fn register_action<F>(&self, channel: &ActionChannel<D>, name: &str, handler: F)
    where
        F: Fn(&Store<S, D>, &ActionEvent<D>) + 'static,
    {
        if self.inner.subs.borrow().contains_key(name) {
            trace!(
                store = %self.inner.config.name,
                action = name,
                "Store: action already registered"
            );
            return;
        }

        let store = Rc::downgrade(&self.inner);
        let subscription = channel.subscribe(name, move |event| {
            if let Some(inner) = store.upgrade() {
                handler(&Store { inner }, event);
            }
        });

        if let Some(subscription) = subscription {
            self.inner
                .subs
                .borrow_mut()
                .insert(name.to_string(), subscription);
        }
    }

    /// Dispose and forget the registration made for `name`, if any
    pub fn unregister_action(&self, channel: &ActionChannel<D>, name: &str) -> bool {
        let subscription = self.inner.subs.borrow_mut().remove(name);
        match subscription {
            Some(subscription) => {
                channel.dispose(Some(subscription));
                true
            }
            None => false,
        }
    }

    /// Whether `register_action` holds a registration for `name`
    pub fn is_registered(&self, name: &str) -> bool {
        self.inner.subs.borrow().contains_key(name)
    }

    /// Subscribe an outside handler to the default action channel
    ///
    /// Returns `None` (and warns) when the store has no default channel.
    /// Keep the handle to [`unbind_action`](Self::unbind_action) later.
    pub fn bind_action<F>(&self, name: &str, handler: F) -> Option<Subscription>
    where
        F: Fn(&ActionEvent<D>) + 'static,
    {
        let Some(action) = &self.inner.action else {
            warn!(
                store = %self.inner.config.name,
                action = name,
                "Store: missing default action, no call outside of the store"
            );
            return None;
        };
        action.subscribe(name, handler)
    }

    /// Dispose a handle returned by [`bind_action`](Self::bind_action)
    ///
    /// A missing handle is reported and ignored rather than tearing down
    /// every subscription on the channel.
    pub fn unbind_action(&self, subscription: Option<Subscription>) {
        match subscription {
            Some(subscription) => {
                subscription.dispose();
            }
            None => warn!(
                store = %self.inner.config.name,
                "Store: missing subscription argument"
            ),
        }
    }

    /// Start or stop recording history for undo/redo
    ///
    /// Enabling binds the reserved undo/redo action on the default channel;
    /// without one the binding fails and nothing is recorded.
    pub fn enable_undo_redo(&self, enable: bool) {
        if enable {
            if self.is_undo_redo_enabled() {
                return;
            }
            let store = Rc::downgrade(&self.inner);
            let subscription =
                self.bind_action(&self.inner.config.undo_redo_action, move |event| {
                    if let Some(inner) = store.upgrade() {
                        Store { inner }.on_undo_redo(event);
                    }
                });
            *self.inner.undo_redo_sub.borrow_mut() = subscription;
        } else {
            let subscription = self.inner.undo_redo_sub.borrow_mut().take();
            if subscription.is_some() {
                self.unbind_action(subscription);
            }
        }
    }

    /// Handler for the reserved undo/redo action
    ///
    /// Moves the cursor per the payload (anything other than undo/redo
    /// leaves it alone), then publishes the entry under the cursor if it is
    /// not already the current state.
    pub fn on_undo_redo(&self, event: &ActionEvent<D>) {
        let moved = event
            .data
            .history_step()
            .filter(|step| self.inner.history.borrow_mut().step(*step));

        let target = {
            let history = self.inner.history.borrow();
            match history.current() {
                Some(entry) => Rc::clone(entry),
                None => return,
            }
        };

        if Rc::ptr_eq(&target, &self.inner.state.borrow()) {
            trace!(
                store = %self.inner.config.name,
                index = ?self.history_index(),
                "Store: undo/redo left state unchanged"
            );
        } else {
            debug!(
                store = %self.inner.config.name,
                index = ?self.history_index(),
                "Store: undo/redo moved state"
            );
            self.replace_state(Rc::clone(&target));
            self.inner.subject.next(target);
        }

        if let (Some(step), Some(extension)) = (moved, self.inner.extension.as_deref()) {
            extension.on_history_step(self, step);
        }
    }

    /// Restart history as the single entry `head`, or the first recorded state
    ///
    /// Nothing is broadcast; call [`stream_change`](Self::stream_change) if
    /// subscribers should see the reset state.
    pub fn reset_store_state(&self, head: Option<S>) {
        let head = match head {
            Some(state) => Rc::new(state),
            None => self
                .inner
                .history
                .borrow()
                .head()
                .cloned()
                .unwrap_or_else(|| self.state()),
        };

        self.replace_state(Rc::clone(&head));
        self.inner.history.borrow_mut().reset(head);
        debug!(store = %self.inner.config.name, "Store: history reset");

        if let Some(extension) = self.inner.extension.as_deref() {
            extension.on_reset(self);
        }
    }
}

impl<S, D> fmt::Debug for Store<S, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registered: Vec<String> = self.inner.subs.borrow().keys().cloned().collect();
        f.debug_struct("Store")
            .field("name", &self.inner.config.name)
            .field("history", &*self.inner.history.borrow())
            .field("undo_redo", &self.inner.undo_redo_sub.borrow().is_some())
            .field("registered", &registered)
            .field("extension", &self.inner.extension.is_some())
            .finish()
    }
}
