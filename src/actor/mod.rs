//! Actors and the channels between them.
//!
//! Every message carries the span it was sent from, so work done on behalf of
//! an event shows up under the event in the log tree.

pub mod reactor;

use tokio::sync::mpsc::error::SendError;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::Span;

pub struct Sender<Event>(UnboundedSender<(Span, Event)>);

pub type Receiver<Event> = UnboundedReceiver<(Span, Event)>;

impl<Event> Clone for Sender<Event> {
    fn clone(&self) -> Self { Sender(self.0.clone()) }
}

impl<Event> Sender<Event> {
    /// Sends an event, dropping it if the receiver is gone.
    pub fn send(&self, event: Event) { _ = self.try_send(event) }

    pub fn try_send(&self, event: Event) -> Result<(), SendError<(Span, Event)>> {
        self.0.send((Span::current(), event))
    }
}

pub fn channel<Event>() -> (Sender<Event>, Receiver<Event>) {
    let (tx, rx) = unbounded_channel();
    (Sender(tx), rx)
}
