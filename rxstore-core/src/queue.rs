//! Bridge from async work back into the synchronous action flow
//!
//! Channels and stores are single-threaded. Work that finishes elsewhere
//! (a tokio task, a worker thread) sends its result through an
//! [`ActionSender`]; the thread owning the channel later drains the
//! [`ActionQueue`] and dispatches each action inline.
//!
//! # Example
//!
//! ```ignore
//! let mut queue = ActionQueue::new();
//! let sender = queue.sender();
//!
//! tokio::spawn(async move {
//!     let rows = fetch_rows().await;
//!     sender.send("ROWS_DID_LOAD", json!(rows));
//! });
//!
//! loop {
//!     queue.recv_into(&channel).await;
//! }
//! ```

use crate::action::ActionEvent;
use crate::channel::ActionChannel;
use tokio::sync::mpsc;
use tracing::debug;

/// Cloneable, `Send` handle for queueing actions from any thread
#[derive(Debug)]
pub struct ActionSender<D> {
    tx: mpsc::UnboundedSender<ActionEvent<D>>,
}

impl<D> Clone for ActionSender<D> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<D> ActionSender<D> {
    /// Queue an action; returns `false` once the queue is gone
    pub fn send(&self, action_type: impl Into<String>, data: D) -> bool {
        let event = ActionEvent::new(action_type, data);
        match self.tx.send(event) {
            Ok(()) => true,
            Err(err) => {
                debug!(
                    action = %err.0.action_type,
                    "ActionSender: queue closed, action dropped"
                );
                false
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving end owned by the thread that owns the [`ActionChannel`]
#[derive(Debug)]
pub struct ActionQueue<D> {
    tx: mpsc::UnboundedSender<ActionEvent<D>>,
    rx: mpsc::UnboundedReceiver<ActionEvent<D>>,
}

impl<D> Default for ActionQueue<D> {
    fn default() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }
}

impl<D: Clone + 'static> ActionQueue<D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a sender to hand to tasks or threads
    pub fn sender(&self) -> ActionSender<D> {
        ActionSender {
            tx: self.tx.clone(),
        }
    }

    /// Dispatch every queued action on `channel`, in arrival order
    ///
    /// Returns how many actions were taken off the queue.
    pub fn drain_into(&mut self, channel: &ActionChannel<D>) -> usize {
        let mut drained = 0;
        while let Ok(event) = self.rx.try_recv() {
            channel.dispatch(&event.action_type, event.data);
            drained += 1;
        }
        drained
    }

    /// Wait for the next queued action and dispatch it on `channel`
    ///
    /// The queue holds a sender of its own, so this waits until something
    /// arrives.
    pub async fn recv_into(&mut self, channel: &ActionChannel<D>) -> bool {
        match self.rx.recv().await {
            Some(event) => channel.dispatch(&event.action_type, event.data),
            None => false,
        }
    }
}
