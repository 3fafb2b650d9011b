//! Channel-backed sink for runtimes that consume events asynchronously.

use tokio::sync::mpsc;
use twinlink_core::{AssetDescription, DomainEvent, EventNotification, PropertyUpdate, TwinSink};

/// A message forwarded by a [`ChannelSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum SinkMessage {
    /// The asset description snapshot, sent once on adapter start
    Description(AssetDescription),
    /// A translated domain event
    Event(DomainEvent),
}

/// Sink that forwards everything into an unbounded channel.
///
/// Keeps the dispatcher's event-loop task decoupled from however slowly the
/// runtime drains its side.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<SinkMessage>,
}

impl ChannelSink {
    /// Create a sink and the receiver draining it.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SinkMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, message: SinkMessage) {
        if self.tx.send(message).is_err() {
            tracing::warn!("sink receiver dropped, event discarded");
        }
    }
}

impl TwinSink for ChannelSink {
    fn on_asset_description(&self, description: &AssetDescription) {
        self.send(SinkMessage::Description(description.clone()));
    }

    fn on_property_update(&self, update: PropertyUpdate) {
        self.send(SinkMessage::Event(DomainEvent::PropertyUpdate(update)));
    }

    fn on_event_notification(&self, notification: EventNotification) {
        self.send(SinkMessage::Event(DomainEvent::EventNotification(notification)));
    }
}
