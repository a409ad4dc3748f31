//! Type-checked, synchronous pub/sub for named actions

use crate::action::{ActionEvent, ActionTypeSet, ActionTypes};
use crate::broadcast::{Broadcast, Subscription};
use crate::middleware::{Middleware, NoopMiddleware};
use serde_json::Value;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, error, warn};

/// Dispatcher restricted to a fixed, named set of action types
///
/// Subscriptions are made by symbolic name and only receive events whose
/// type equals that name's canonical value. Bad input never panics: it is
/// logged and the call degrades to a no-op.
///
/// Cloning yields another handle to the same channel.
///
/// # Example
/// ```
/// use rxstore_core::{ActionChannel, ActionTypes};
/// use serde_json::json;
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let channel: ActionChannel = ActionChannel::new(ActionTypes::new([
///     ("SAVE", "SAVE"),
///     ("UNDO_REDO", "UNDO_REDO"),
/// ]));
///
/// let saved = Rc::new(Cell::new(0));
/// let counter = Rc::clone(&saved);
/// let sub = channel
///     .subscribe("SAVE", move |_| counter.set(counter.get() + 1))
///     .expect("SAVE is registered");
///
/// channel.dispatch("SAVE", json!({"id": 1}));
/// channel.dispatch("UNDO_REDO", json!("--"));
/// assert_eq!(saved.get(), 1);
///
/// channel.dispose(Some(sub));
/// channel.dispatch("SAVE", json!({"id": 2}));
/// assert_eq!(saved.get(), 1);
/// ```
pub struct ActionChannel<D = Value> {
    inner: Rc<ChannelInner<D>>,
}

struct ChannelInner<D> {
    types: ActionTypes,
    /// `None` is the unstarted state; it never matches a subscription.
    subject: Broadcast<Option<ActionEvent<D>>>,
    middleware: RefCell<Box<dyn Middleware<D>>>,
}

impl<D> Clone for ActionChannel<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<D: Clone + 'static> ActionChannel<D> {
    /// Create a channel recognizing exactly `types`
    pub fn new(types: ActionTypes) -> Self {
        Self::with_middleware(types, NoopMiddleware)
    }

    /// Create a channel whose dispatches pass through `middleware`
    pub fn with_middleware<M>(types: ActionTypes, middleware: M) -> Self
    where
        M: Middleware<D> + 'static,
    {
        Self {
            inner: Rc::new(ChannelInner {
                types,
                subject: Broadcast::new(None),
                middleware: RefCell::new(Box::new(middleware)),
            }),
        }
    }

    /// Create a channel from a type implementing [`ActionTypeSet`]
    pub fn from_set<T: ActionTypeSet>() -> Self {
        Self::new(ActionTypes::from_set::<T>())
    }

    /// The fixed registry this channel was built with
    pub fn types(&self) -> &ActionTypes {
        &self.inner.types
    }

    /// Canonical value for a symbolic name
    pub fn action_type(&self, name: &str) -> Option<&str> {
        self.inner.types.get(name)
    }

    /// Publish `{action_type, data}` to every matching subscriber
    ///
    /// Handlers run synchronously before this returns. Returns `false` if
    /// the dispatch was rejected.
    pub fn dispatch(&self, action_type: &str, data: D) -> bool {
        self.dispatch_optional(action_type, Some(data))
    }

    /// Like [`dispatch`](Self::dispatch) with an explicitly missing payload
    ///
    /// An empty `action_type` or a `None` payload is reported and dropped.
    pub fn dispatch_optional(&self, action_type: &str, data: Option<D>) -> bool {
        let data = match data {
            Some(data) if !action_type.is_empty() => data,
            data => {
                error!(
                    action = action_type,
                    has_data = data.is_some(),
                    "ActionChannel: missing arguments, dispatch dropped"
                );
                return false;
            }
        };

        if self.inner.subject.is_disposed() {
            warn!(
                action = action_type,
                "ActionChannel: dispatch on a disposed channel dropped"
            );
            return false;
        }

        if !self.inner.types.has_value(action_type) {
            debug!(
                action = action_type,
                "ActionChannel: dispatching a type no name maps to"
            );
        }

        let event = ActionEvent::new(action_type, data);
        self.run_middleware(&event, |middleware| middleware.before(&event));
        let notified = self.inner.subject.next(Some(event.clone()));
        self.run_middleware(&event, |middleware| middleware.after(&event, notified));
        true
    }

    /// Run a middleware hook unless one is already running on this channel
    ///
    /// A hook that dispatches on its own channel gets that nested dispatch
    /// delivered without middleware.
    fn run_middleware<F>(&self, event: &ActionEvent<D>, hook: F)
    where
        F: FnOnce(&mut Box<dyn Middleware<D>>),
    {
        match self.inner.middleware.try_borrow_mut() {
            Ok(mut middleware) => hook(&mut middleware),
            Err(_) => warn!(
                action = %event.action_type,
                "ActionChannel: dispatch from inside middleware, hooks skipped"
            ),
        }
    }

    /// Invoke `handler` for every future event of the named type
    ///
    /// Returns `None` (and logs) when `name` is not registered on this
    /// channel or the channel has been disposed.
    pub fn subscribe<F>(&self, name: &str, handler: F) -> Option<Subscription>
    where
        F: Fn(&ActionEvent<D>) + 'static,
    {
        let Some(canonical) = self.inner.types.get(name) else {
            error!(action = name, "ActionChannel: action type is not defined");
            return None;
        };

        if self.inner.subject.is_disposed() {
            warn!(
                action = name,
                "ActionChannel: subscribe on a disposed channel ignored"
            );
            return None;
        }

        let canonical = canonical.to_owned();
        let subscription = self
            .inner
            .subject
            .filter(move |event: &Option<ActionEvent<D>>| {
                event
                    .as_ref()
                    .is_some_and(|event| event.action_type == canonical)
            })
            .subscribe(move |event| {
                if let Some(event) = event {
                    handler(event);
                }
            });
        Some(subscription)
    }

    /// Dispose one subscription, or with `None` the whole channel
    ///
    /// Passing `None` is destructive: every subscription is torn down and
    /// the channel stops accepting dispatches. Use [`Subscription::dispose`]
    /// when only one listener should go.
    pub fn dispose(&self, subscription: Option<Subscription>) {
        match subscription {
            Some(subscription) => {
                subscription.dispose();
            }
            None => self.dispose_all(),
        }
    }

    /// Tear down every subscription on this channel
    pub fn dispose_all(&self) {
        debug!(
            subscribers = self.inner.subject.subscriber_count(),
            "ActionChannel: disposing all subscriptions"
        );
        self.inner.subject.dispose_all();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.subject.is_disposed()
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.inner.subject.subscriber_count()
    }
}

impl<D> fmt::Debug for ActionChannel<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionChannel")
            .field("types", &self.inner.types)
            .field("subject", &self.inner.subject)
            .finish()
    }
}
