//! Crossbeam-backed plumbing between the engines and whoever is listening.

use crossbeam_channel::{Receiver, Sender};

use super::Event;

/// Handle the engines report through.
///
/// A detached handle has no channel behind it and drops every event, so
/// library callers that do not care about progress pay nothing for it.
/// Clones share the same channel and can be moved into rayon workers.
#[derive(Clone, Default)]
pub struct EventSender {
    target: Option<Sender<Event>>,
}

impl EventSender {
    pub fn new(sender: Sender<Event>) -> Self {
        Self {
            target: Some(sender),
        }
    }

    /// True unless this handle came from [`null_sender`]
    pub fn is_attached(&self) -> bool {
        self.target.is_some()
    }

    /// Deliver `event`. Returns false when no receiver is left to take it.
    pub fn send(&self, event: Event) -> bool {
        self.target
            .as_ref()
            .is_some_and(|target| target.send(event).is_ok())
    }
}

/// Listening end handed to the front end.
pub struct EventReceiver {
    source: Receiver<Event>,
}

impl EventReceiver {
    /// Wait for the next event; `None` once every sender is gone.
    pub fn recv(&self) -> Option<Event> {
        self.source.recv().ok()
    }

    pub fn try_recv(&self) -> Option<Event> {
        self.source.try_recv().ok()
    }

    /// Blocking iterator that ends when every sender is dropped.
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.source.iter()
    }
}

/// Constructors for connected sender/receiver pairs.
pub struct EventChannel;

impl EventChannel {
    /// Unbounded pair; senders never block.
    pub fn new() -> (EventSender, EventReceiver) {
        Self::wrap(crossbeam_channel::unbounded())
    }

    /// Pair whose queue holds at most `capacity` events. Senders block while
    /// it is full.
    pub fn bounded(capacity: usize) -> (EventSender, EventReceiver) {
        Self::wrap(crossbeam_channel::bounded(capacity))
    }

    fn wrap((sender, receiver): (Sender<Event>, Receiver<Event>)) -> (EventSender, EventReceiver) {
        (
            EventSender::new(sender),
            EventReceiver { source: receiver },
        )
    }
}

/// Detached sender: every event is discarded.
pub fn null_sender() -> EventSender {
    EventSender::default()
}
