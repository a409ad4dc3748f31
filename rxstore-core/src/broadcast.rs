//! Replay-latest broadcast primitive
//!
//! [`Broadcast`] remembers the most recent value and hands it to every new
//! subscriber before forwarding later values. It underlies both the action
//! channel and the store.
//!
//! # Semantics
//!
//! - `subscribe` invokes the handler once with the current value, then on
//!   every `next`.
//! - [`Filtered`] sub-channels only forward *future* values that pass their
//!   predicate; they never replay.
//! - Disposing one [`Subscription`] leaves every other one untouched.
//!   [`Broadcast::dispose_all`] tears down all listeners and the current value.
//!
//! Everything runs synchronously on the caller's stack. No borrow is held
//! while handlers run, so a handler may publish, subscribe or dispose on the
//! same broadcast. Unbounded reentrant publishing is the caller's problem.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::warn;

type Handler<T> = Rc<dyn Fn(&T)>;
type Predicate<T> = Rc<dyn Fn(&T) -> bool>;

struct Listener<T> {
    id: u64,
    /// Cleared on detach; a notification pass checks it before each call.
    alive: Rc<Cell<bool>>,
    predicate: Option<Predicate<T>>,
    handler: Handler<T>,
}

struct Shared<T> {
    current: Option<T>,
    listeners: Vec<Listener<T>>,
    next_id: u64,
    disposed: bool,
}

impl<T> Shared<T> {
    fn is_attached(&self, id: u64) -> bool {
        self.listeners.iter().any(|l| l.id == id)
    }
}

/// Type-erased access a [`Subscription`] needs to its source
trait Detach {
    fn detach(&self, id: u64) -> bool;
    fn is_attached(&self, id: u64) -> bool;
}

impl<T> Detach for RefCell<Shared<T>> {
    fn detach(&self, id: u64) -> bool {
        // The removed handler is dropped after the borrow is released.
        let removed = {
            let mut shared = self.borrow_mut();
            let index = shared.listeners.iter().position(|l| l.id == id);
            index.map(|index| shared.listeners.remove(index))
        };
        if let Some(listener) = &removed {
            listener.alive.set(false);
        }
        removed.is_some()
    }

    fn is_attached(&self, id: u64) -> bool {
        self.borrow().is_attached(id)
    }
}

/// Handle for one listener registration
///
/// `dispose` consumes the handle, so a subscription can be disposed at most
/// once. Dropping a handle does **not** unsubscribe.
#[must_use = "dropping a Subscription keeps the listener alive with no way to dispose it"]
pub struct Subscription {
    id: u64,
    source: Option<Weak<dyn Detach>>,
}

impl Subscription {
    /// A handle that was never attached to anything
    pub(crate) fn inert() -> Self {
        Self {
            id: 0,
            source: None,
        }
    }

    /// Remove this listener from its source
    ///
    /// Returns `false` if the listener was already gone (source dropped or
    /// torn down by `dispose_all`).
    pub fn dispose(self) -> bool {
        match self.source.and_then(|source| source.upgrade()) {
            Some(source) => source.detach(self.id),
            None => false,
        }
    }

    /// Whether the listener is still registered
    pub fn is_active(&self) -> bool {
        self.source
            .as_ref()
            .and_then(Weak::upgrade)
            .is_some_and(|source| source.is_attached(self.id))
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Publish/subscribe channel that replays its latest value
///
/// Cloning yields another handle to the same channel.
///
/// # Example
/// ```
/// use rxstore_core::Broadcast;
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// let seen = Rc::new(RefCell::new(Vec::new()));
/// let channel = Broadcast::new(0);
///
/// let sink = Rc::clone(&seen);
/// let sub = channel.subscribe(move |v: &i32| sink.borrow_mut().push(*v));
/// channel.next(1);
/// sub.dispose();
/// channel.next(2);
///
/// assert_eq!(*seen.borrow(), vec![0, 1]);
/// ```
pub struct Broadcast<T> {
    shared: Rc<RefCell<Shared<T>>>,
}

impl<T> Clone for Broadcast<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<T: Clone + 'static> Broadcast<T> {
    /// Create a channel whose current value is `seed`
    pub fn new(seed: T) -> Self {
        Self {
            shared: Rc::new(RefCell::new(Shared {
                current: Some(seed),
                listeners: Vec::new(),
                next_id: 1,
                disposed: false,
            })),
        }
    }

    /// The latest value; `None` once the channel has been disposed
    pub fn current(&self) -> Option<T> {
        self.shared.borrow().current.clone()
    }

    pub fn is_disposed(&self) -> bool {
        self.shared.borrow().disposed
    }

    /// Number of live listeners, filtered ones included
    pub fn subscriber_count(&self) -> usize {
        self.shared.borrow().listeners.len()
    }

    /// Replace the current value and notify every matching listener
    ///
    /// Returns the number of handlers invoked. Listeners added during the
    /// pass wait for the next value; listeners disposed during the pass are
    /// skipped.
    pub fn next(&self, value: T) -> usize {
        let targets: Vec<(Rc<Cell<bool>>, Option<Predicate<T>>, Handler<T>)> = {
            let mut shared = self.shared.borrow_mut();
            if shared.disposed {
                warn!("Broadcast: publish on a disposed channel ignored");
                return 0;
            }
            shared.current = Some(value.clone());
            shared
                .listeners
                .iter()
                .map(|l| (Rc::clone(&l.alive), l.predicate.clone(), Rc::clone(&l.handler)))
                .collect()
        };

        let mut notified = 0;
        for (alive, predicate, handler) in targets {
            if !alive.get() {
                continue;
            }
            if predicate.as_ref().map_or(true, |accepts| accepts(&value)) {
                handler(&value);
                notified += 1;
            }
        }
        notified
    }

    /// Listen to the current value and every later one
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&T) + 'static,
    {
        let handler: Handler<T> = Rc::new(handler);
        let Some(subscription) = self.attach(None, Rc::clone(&handler)) else {
            return Subscription::inert();
        };
        if let Some(current) = self.current() {
            handler(&current);
        }
        subscription
    }

    /// Derive a sub-channel forwarding only values that pass `predicate`
    pub fn filter<P>(&self, predicate: P) -> Filtered<T>
    where
        P: Fn(&T) -> bool + 'static,
    {
        Filtered {
            source: self.clone(),
            predicate: Rc::new(predicate),
        }
    }

    /// Tear down every listener and forget the current value
    ///
    /// This is not the same as disposing one subscription: afterwards the
    /// channel accepts neither values nor subscribers.
    pub fn dispose_all(&self) {
        let listeners = {
            let mut shared = self.shared.borrow_mut();
            shared.disposed = true;
            shared.current = None;
            std::mem::take(&mut shared.listeners)
        };
        for listener in &listeners {
            listener.alive.set(false);
        }
        drop(listeners);
    }

    fn attach(&self, predicate: Option<Predicate<T>>, handler: Handler<T>) -> Option<Subscription> {
        let id = {
            let mut shared = self.shared.borrow_mut();
            if shared.disposed {
                warn!("Broadcast: subscribe on a disposed channel ignored");
                return None;
            }
            let id = shared.next_id;
            shared.next_id += 1;
            shared.listeners.push(Listener {
                id,
                alive: Rc::new(Cell::new(true)),
                predicate,
                handler,
            });
            id
        };
        let weak = Rc::downgrade(&self.shared);
        let source: Weak<dyn Detach> = weak;
        Some(Subscription {
            id,
            source: Some(source),
        })
    }
}

impl<T> fmt::Debug for Broadcast<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shared = self.shared.borrow();
        f.debug_struct("Broadcast")
            .field("subscribers", &shared.listeners.len())
            .field("has_current", &shared.current.is_some())
            .field("disposed", &shared.disposed)
            .finish()
    }
}

/// Predicate view over a [`Broadcast`]
pub struct Filtered<T> {
    source: Broadcast<T>,
    predicate: Predicate<T>,
}

impl<T: Clone + 'static> Filtered<T> {
    /// Listen to future values that pass the predicate
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&T) + 'static,
    {
        self.source
            .attach(Some(Rc::clone(&self.predicate)), Rc::new(handler))
            .unwrap_or_else(Subscription::inert)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Recorder;
    use std::cell::Cell;

    #[test]
    fn test_subscribe_replays_current() {
        let channel = Broadcast::new("seed");
        channel.next("first");

        let recorder: Recorder<&str> = Recorder::new();
        let _sub = channel.subscribe(recorder.handler());

        assert_eq!(recorder.received(), vec!["first"]);
        channel.next("second");
        assert_eq!(recorder.received(), vec!["first", "second"]);
    }

    #[test]
    fn test_filtered_only_sees_future_matches() {
        let channel = Broadcast::new(10);
        let evens: Recorder<i32> = Recorder::new();
        let _sub = channel.filter(|v: &i32| v % 2 == 0).subscribe(evens.handler());

        for v in [1, 2, 3, 4] {
            channel.next(v);
        }

        assert_eq!(evens.received(), vec![2, 4]);
    }

    #[test]
    fn test_dispose_one_leaves_others() {
        let channel = Broadcast::new(0);
        let first: Recorder<i32> = Recorder::new();
        let second: Recorder<i32> = Recorder::new();
        let sub_first = channel.subscribe(first.handler());
        let _sub_second = channel.subscribe(second.handler());

        assert!(sub_first.dispose());
        channel.next(1);

        assert_eq!(first.received(), vec![0]);
        assert_eq!(second.received(), vec![0, 1]);
        assert_eq!(channel.subscriber_count(), 1);
    }

    #[test]
    fn test_dispose_all_drops_seed_and_listeners() {
        let channel = Broadcast::new(0);
        let recorder: Recorder<i32> = Recorder::new();
        let sub = channel.subscribe(recorder.handler());

        channel.dispose_all();

        assert!(channel.is_disposed());
        assert_eq!(channel.current(), None);
        assert!(!sub.is_active());
        assert_eq!(channel.next(5), 0);
        assert!(!channel.subscribe(recorder.handler()).is_active());
        assert_eq!(recorder.received(), vec![0]);
        assert!(!sub.dispose());
    }

    #[test]
    fn test_next_reports_notified_count() {
        let channel = Broadcast::new(0);
        let _a = channel.subscribe(|_| {});
        let _b = channel.filter(|v: &i32| *v > 5).subscribe(|_| {});

        assert_eq!(channel.next(1), 1);
        assert_eq!(channel.next(6), 2);
    }

    #[test]
    fn test_reentrant_publish_is_synchronous() {
        let channel = Broadcast::new(0);
        let recorder: Recorder<i32> = Recorder::new();
        let _log = channel.subscribe(recorder.handler());

        let inner = channel.clone();
        let _chain = channel
            .filter(|v: &i32| *v > 0 && *v < 3)
            .subscribe(move |v| {
                inner.next(v + 1);
            });

        channel.next(1);

        // 1 -> 2 -> 3, each nested publish completes before the outer returns
        assert_eq!(recorder.received(), vec![0, 1, 2, 3]);
        assert_eq!(channel.current(), Some(3));
    }

    #[test]
    fn test_listener_disposed_mid_pass_is_skipped() {
        let channel = Broadcast::new(0);
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let late_calls = Rc::new(Cell::new(0));

        let slot_in = Rc::clone(&slot);
        let _killer = channel.filter(|v: &i32| *v == 1).subscribe(move |_| {
            if let Some(sub) = slot_in.borrow_mut().take() {
                sub.dispose();
            }
        });

        let calls = Rc::clone(&late_calls);
        let victim = channel
            .filter(|_| true)
            .subscribe(move |_| calls.set(calls.get() + 1));
        *slot.borrow_mut() = Some(victim);

        channel.next(1);
        channel.next(2);

        assert_eq!(late_calls.get(), 0);
    }

    #[test]
    fn test_subscribe_inside_handler() {
        let channel = Broadcast::new(0);
        let late: Recorder<i32> = Recorder::new();
        let held: Rc<RefCell<Vec<Subscription>>> = Rc::new(RefCell::new(Vec::new()));

        let source = channel.clone();
        let late_handler = late.clone();
        let held_in = Rc::clone(&held);
        let _sub = channel.filter(|v: &i32| *v == 1).subscribe(move |_| {
            let sub = source.subscribe(late_handler.handler());
            held_in.borrow_mut().push(sub);
        });

        channel.next(1);
        channel.next(2);

        assert_eq!(late.received(), vec![1, 2]);
    }

    #[test]
    fn test_dispose_all_mid_pass_skips_remaining() {
        let channel = Broadcast::new(0);
        let later: Recorder<i32> = Recorder::new();

        let source = channel.clone();
        let _first = channel
            .filter(|v: &i32| *v == 1)
            .subscribe(move |_| source.dispose_all());
        let _second = channel.filter(|_| true).subscribe(later.handler());

        assert_eq!(channel.next(1), 1);
        assert!(later.is_empty());
        assert_eq!(channel.subscriber_count(), 0);
    }

    #[test]
    fn test_wide_fan_out_counts_every_listener() {
        let channel = Broadcast::new(0);
        let hits = Rc::new(Cell::new(0));
        let subs: Vec<Subscription> = (0..200)
            .map(|_| {
                let hits = Rc::clone(&hits);
                channel.subscribe(move |_| hits.set(hits.get() + 1))
            })
            .collect();
        hits.set(0);

        assert_eq!(channel.next(1), 200);
        assert_eq!(hits.get(), 200);

        for sub in subs.into_iter().step_by(2) {
            sub.dispose();
        }
        assert_eq!(channel.next(2), 100);
    }
}
