//! Sink contract implemented by the consuming runtime.

use crate::asset::AssetDescription;
use crate::event::{DomainEvent, EventNotification, PropertyUpdate};

/// Receiver for the adapter's typed output stream.
///
/// Implementations are invoked from the adapter's event-loop task, possibly
/// concurrently across topics, and must be fast and non-blocking. A slow sink
/// stalls delivery for the message that triggered it, nothing else.
pub trait TwinSink: Send + Sync {
    /// Called once on successful adapter start with the declared asset surface.
    fn on_asset_description(&self, description: &AssetDescription);

    /// Called for every property update produced by an incoming mapping.
    fn on_property_update(&self, update: PropertyUpdate);

    /// Called for every event notification produced by an incoming mapping.
    fn on_event_notification(&self, notification: EventNotification);

    /// Dispatch a domain event to the matching callback.
    fn forward(&self, event: DomainEvent) {
        match event {
            DomainEvent::PropertyUpdate(update) => self.on_property_update(update),
            DomainEvent::EventNotification(notification) => {
                self.on_event_notification(notification);
            }
        }
    }
}
