//! # Event Emitter — Synchronous Publish/Subscribe
//!
//! `EventEmitter<E>` delivers every emitted event to its subscribers
//! in-line, in subscription order, before `emit` returns. There is no
//! queue and no deferred delivery.
//!
//! ## Re-entrancy
//!
//! Handlers may subscribe, unsubscribe, or emit again on the same emitter
//! while a dispatch is in progress. `emit` snapshots the handler list and
//! releases its borrow before calling any handler, so:
//!
//! - a handler subscribed during dispatch first runs on the next `emit`;
//! - a handler unsubscribed during dispatch still receives the event that
//!   is currently being delivered.
//!
//! ## Notifier
//!
//! `Notifier` is the capability models and collections implement directly:
//! they expose their emitter and inherit `on`/`off`/`emit`.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Handle returned by [`EventEmitter::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub:{}", self.0)
    }
}

type Handler<E> = Rc<dyn Fn(&E)>;

/// A synchronous, single-threaded event emitter.
pub struct EventEmitter<E> {
    next_id: Cell<u64>,
    handlers: RefCell<Vec<(SubscriptionId, Handler<E>)>>,
}

impl<E> EventEmitter<E> {
    /// Create an emitter with no subscribers.
    pub fn new() -> Self {
        Self {
            next_id: Cell::new(0),
            handlers: RefCell::new(Vec::new()),
        }
    }

    /// Register a handler. Handlers run in subscription order.
    pub fn subscribe(&self, handler: impl Fn(&E) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        let handler: Handler<E> = Rc::new(handler);
        self.handlers.borrow_mut().push((id, handler));
        id
    }

    /// Remove a handler. Returns `false` if the id was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        let before = handlers.len();
        handlers.retain(|(sub, _)| *sub != id);
        handlers.len() != before
    }

    /// Deliver `event` to every current subscriber and return how many
    /// handlers were invoked.
    pub fn emit(&self, event: &E) -> usize {
        let snapshot: Vec<Handler<E>> = self
            .handlers
            .borrow()
            .iter()
            .map(|(_, handler)| Rc::clone(handler))
            .collect();
        for handler in &snapshot {
            handler(event);
        }
        snapshot.len()
    }

    /// Number of active subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.handlers.borrow().len()
    }
}

impl<E> Default for EventEmitter<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for EventEmitter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Publish/subscribe capability over an owned [`EventEmitter`].
pub trait Notifier {
    /// The event type announced by this notifier.
    type Event;

    /// The emitter backing this notifier.
    fn emitter(&self) -> &EventEmitter<Self::Event>;

    /// Subscribe to every event announced by this notifier.
    fn on(&self, handler: impl Fn(&Self::Event) + 'static) -> SubscriptionId {
        self.emitter().subscribe(handler)
    }

    /// Cancel a subscription made with [`Notifier::on`].
    fn off(&self, id: SubscriptionId) -> bool {
        self.emitter().unsubscribe(id)
    }

    /// Announce an event to all subscribers.
    fn emit(&self, event: &Self::Event) -> usize {
        tracing::trace!(subscribers = self.emitter().subscriber_count(), "dispatching event");
        self.emitter().emit(event)
    }
}
